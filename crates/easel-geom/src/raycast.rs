//! Even-odd ray casting over mixed linear/arc edges.
//!
//! A horizontal ray from the query point toward +x is crossed with every
//! edge; a point is inside iff the total count is odd. Every tie-break
//! here exists to keep shared vertices from being counted twice: line
//! edges are half-open (the larger-y endpoint is excluded), arc edges
//! accept their endpoints asymmetrically by winding, and a vertex that
//! sits off its swept circle by a truncation unit gets a tangent-line
//! correction.

use crate::angle::DirAngle;
use crate::num::{compare_frac, Coord, CoordExt};
use crate::point::Point;
use crate::shape::{ArcSegment, ComplexPolygon, PolyEdge, Polygon, Segment};

/// Crossings (0 or 1) of the +x ray from `pt` with a straight edge.
///
/// Half-open rule: the endpoint with the smaller y is included, the one
/// with the larger y excluded; horizontal edges contribute nothing.
pub fn ray_cast_segment(pt: Point, seg: &Segment) -> usize {
    if seg.a.y == seg.b.y {
        return 0;
    }
    let alt = seg.a.y < seg.b.y;
    let ptmax = if alt { seg.b } else { seg.a };
    let ptmin = if alt { seg.a } else { seg.b };
    if pt.y >= ptmax.y || pt.y < ptmin.y {
        return 0;
    }

    if (ptmax - ptmin).cross(pt - ptmin) > 0 {
        1
    } else {
        0
    }
}

/// Crossings (0, 1 or 2) of the +x ray from `pt` with an arc edge.
///
/// The circle is cut at the query's y row; each candidate is kept iff its
/// angle lies in the arc's range, working in squared ("extended") angle
/// coordinates so nothing leaves the integers. Range endpoints are
/// accepted on exactly one side, mirroring the half-open line rule: the
/// winding decides which of `from`/`to` is the included end.
pub fn ray_cast_arc(pt: Point, arc: &ArcSegment) -> usize {
    if pt.y - arc.center.y >= arc.radius || arc.center.y - pt.y > arc.radius {
        return 0;
    }

    if pt.y + arc.radius == arc.center.y {
        // Bottom tangent row: the ray grazes the circle's lowest point.
        return if arc.range.contains(&DirAngle::angle_270()) {
            if arc.range.from == DirAngle::angle_270() || arc.range.to == DirAngle::angle_270() {
                1
            } else {
                2
            }
        } else {
            0
        };
    }

    let diffy = (pt.y - arc.center.y) as CoordExt;
    let adiffy2 = diffy * diffy;
    let r2 = arc.radius as CoordExt * arc.radius as CoordExt;
    let diffx2 = r2 - adiffy2;
    let diffy2 = if diffy > 0 { adiffy2 } else { -adiffy2 };
    let dn = (pt.x - arc.center.x) as CoordExt;
    let mut ans = 0;
    let ext_range = arc.extended_range();

    // Right-hand crossing: x = cx + sqrt(r² − dy²), kept while pt is left
    // of it. In extended coordinates the candidate angle is
    // (r² − dy², ±dy²).
    if arc.center.x > pt.x || diffx2 > dn * dn {
        let angle = DirAngle::new(diffx2, diffy2);
        if ext_range.contains(&angle) {
            if ext_range.from == angle {
                if ext_range.ccw {
                    ans += 1;
                } else if ext_range.to == angle {
                    ans += 1;
                }
            } else if ext_range.to == angle {
                if ext_range.ccw {
                    if ext_range.from == angle {
                        ans += 1;
                    }
                } else {
                    ans += 1;
                }
            } else {
                ans += 1;
            }
        }
    }
    // Left-hand crossing: x = cx − sqrt(r² − dy²). Endpoint acceptance is
    // mirrored, so a vertex shared by two arcs still counts once.
    if arc.center.x > pt.x && dn * dn > diffx2 {
        let angle = DirAngle::new(-diffx2, diffy2);
        if ext_range.contains(&angle) {
            if ext_range.from == angle {
                if ext_range.ccw {
                    if ext_range.to == angle {
                        ans += 1;
                    }
                } else {
                    ans += 1;
                }
            } else if ext_range.to == angle {
                if ext_range.ccw {
                    ans += 1;
                } else if ext_range.from == angle {
                    ans += 1;
                }
            } else {
                ans += 1;
            }
        }
    }

    ans
}

/// Exact `v1 < cx + r·xd/|(xd,yd)|`: compares a coordinate against the
/// x of the point where the direction `(xd,yd)` leaves the circle.
fn circle_pt_lt(v1: Coord, xc: Coord, r: Coord, xd: CoordExt, yd: CoordExt) -> bool {
    debug_assert!(r > 0);
    let a = (v1 - xc) as CoordExt * (v1 - xc) as CoordExt;
    let b = r as CoordExt * r as CoordExt;
    let c = xd * xd;
    let d = yd * yd + c;
    let s1 = (v1 - xc).signum() as CoordExt;
    let s2 = xd.signum();
    if s1 != s2 {
        return s1 < s2;
    }
    if s1 < 0 {
        compare_frac(c, d, a, b)
    } else if s1 == 0 {
        false
    } else {
        compare_frac(a, b, c, d)
    }
}

/// Exact mirror of [`circle_pt_lt`] for the `>` direction.
fn circle_pt_gt(v1: Coord, xc: Coord, r: Coord, xd: CoordExt, yd: CoordExt) -> bool {
    debug_assert!(r > 0);
    let a = (v1 - xc) as CoordExt * (v1 - xc) as CoordExt;
    let b = r as CoordExt * r as CoordExt;
    let c = xd * xd;
    let d = yd * yd + c;
    let s1 = (v1 - xc).signum() as CoordExt;
    let s2 = xd.signum();
    if s1 != s2 {
        return s1 > s2;
    }
    if s1 < 0 {
        compare_frac(a, b, c, d)
    } else if s1 == 0 {
        false
    } else {
        compare_frac(c, d, a, b)
    }
}

/// Crossings (0 or 1) with the implied segment between a stored arc
/// vertex and the exact point where the arc's range endpoint meets the
/// circle. Needed when truncation put the vertex a unit off the rim: the
/// polygon boundary runs through the vertex, not through the rim point,
/// and the gap segment must participate in the parity count.
pub fn ray_cast_arc_vertex(
    pt: Point,
    vertex: Point,
    radius: Coord,
    center: Point,
    angle: &DirAngle,
) -> usize {
    let in_left = || -> Option<bool> {
        if circle_pt_lt(pt.x, center.x, radius, angle.x, angle.y) && pt.x < vertex.x {
            Some(true)
        } else if circle_pt_gt(pt.x, center.x, radius, angle.x, angle.y) && pt.x > vertex.x {
            Some(false)
        } else {
            None
        }
    };
    let ptx = pt - vertex;
    let centerx = center - vertex;
    let vala = centerx.x as CoordExt * ptx.y as CoordExt - ptx.x as CoordExt * centerx.y as CoordExt;
    let valb = ptx.x as CoordExt * angle.y - angle.x * ptx.y as CoordExt;
    let s1 = vala.signum();
    let s2 = valb.signum();
    let vala2 = vala * vala;
    let valb2 = valb * valb;
    let r2 = radius as CoordExt * radius as CoordExt;
    let d2 = angle.x * angle.x + angle.y * angle.y;

    if circle_pt_lt(vertex.y, center.y, radius, angle.y, angle.x) {
        // Vertex below the rim point: the gap segment rises from it.
        if pt.y < vertex.y || !circle_pt_lt(pt.y, center.y, radius, angle.y, angle.x) {
            return 0;
        }
        if let Some(left) = in_left() {
            return if left { 1 } else { 0 };
        }
        if s1 != s2 {
            return (s1 > s2) as usize;
        }
        if s1 < 0 {
            compare_frac(vala2, r2, valb2, d2) as usize
        } else if s1 == 0 {
            0
        } else {
            compare_frac(valb2, d2, vala2, r2) as usize
        }
    } else if circle_pt_gt(vertex.y, center.y, radius, angle.y, angle.x) {
        if pt.y >= vertex.y || circle_pt_lt(pt.y, center.y, radius, angle.y, angle.x) {
            return 0;
        }
        if let Some(left) = in_left() {
            return if left { 1 } else { 0 };
        }
        if s1 < 0 {
            compare_frac(valb2, d2, vala2, r2) as usize
        } else if s1 == 0 {
            0
        } else {
            compare_frac(vala2, r2, valb2, d2) as usize
        }
    } else {
        0
    }
}

/// Arc crossings with the vertex corrections applied where the stored
/// endpoints are off the swept circle.
pub fn ray_cast_arc_fixed(pt: Point, arc: &ArcSegment) -> usize {
    let r2 = arc.radius as CoordExt * arc.radius as CoordExt;
    let mut count = ray_cast_arc(pt, arc);
    if r2 != (arc.from - arc.center).norm2() {
        count += ray_cast_arc_vertex(pt, arc.from, arc.radius, arc.center, &arc.range.from);
    }
    if r2 != (arc.to - arc.center).norm2() {
        count += ray_cast_arc_vertex(pt, arc.to, arc.radius, arc.center, &arc.range.to);
    }
    count
}

/// Even-odd point-in-polygon for straight-edged polygons.
pub fn point_inside(polygon: &Polygon, pt: Point) -> bool {
    debug_assert!(polygon.len() > 1);
    let mut count = 0;
    for i in 0..polygon.len() {
        count += ray_cast_segment(pt, &polygon.segment(i));
    }
    count % 2 == 1
}

/// Even-odd point-in-polygon over mixed line/arc edges.
pub fn point_inside_complex(polygon: &ComplexPolygon, pt: Point) -> bool {
    debug_assert!(polygon.len() > 1);
    let mut count = 0;
    for i in 0..polygon.len() {
        count += match polygon.edge(i) {
            PolyEdge::Line(seg) => ray_cast_segment(pt, &seg),
            PolyEdge::Arc(arc) => ray_cast_arc_fixed(pt, &arc),
        };
    }
    count % 2 == 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::PolyNode;

    fn pt(x: Coord, y: Coord) -> Point {
        Point::new(x, y)
    }

    fn unit_square() -> Polygon {
        Polygon::from_points([pt(0, 0), pt(10, 0), pt(10, 10), pt(0, 10)])
    }

    #[test]
    fn segment_ray_half_open_rule() {
        let rising = Segment::new(pt(5, 0), pt(5, 10));
        // Included at the low endpoint's row, excluded at the high one.
        assert_eq!(ray_cast_segment(pt(0, 0), &rising), 1);
        assert_eq!(ray_cast_segment(pt(0, 10), &rising), 0);
        assert_eq!(ray_cast_segment(pt(0, 5), &rising), 1);
        // Edge behind the point does not count.
        assert_eq!(ray_cast_segment(pt(6, 5), &rising), 0);
        // Horizontal edges contribute nothing.
        assert_eq!(
            ray_cast_segment(pt(0, 0), &Segment::new(pt(1, 0), pt(9, 0))),
            0
        );
    }

    #[test]
    fn square_containment() {
        let sq = unit_square();
        assert!(point_inside(&sq, pt(5, 5)));
        assert!(point_inside(&sq, pt(1, 9)));
        assert!(!point_inside(&sq, pt(11, 5)));
        assert!(!point_inside(&sq, pt(-1, 5)));
        assert!(!point_inside(&sq, pt(5, 11)));
    }

    #[test]
    fn square_boundary_follows_documented_rule() {
        let sq = unit_square();
        // Left boundary is inside (the ray crosses only the right edge),
        // the right boundary is outside (its own edge is behind the ray).
        assert!(point_inside(&sq, pt(0, 5)));
        assert!(!point_inside(&sq, pt(10, 5)));
        // Bottom-left corner in, top corners out (half-open vertically).
        assert!(point_inside(&sq, pt(0, 0)));
        assert!(!point_inside(&sq, pt(0, 10)));
        assert!(!point_inside(&sq, pt(10, 10)));
    }

    #[test]
    fn shared_vertices_are_not_double_counted() {
        // A diamond: rays through its vertices' rows cross cleanly.
        let diamond = Polygon::from_points([pt(5, 0), pt(10, 5), pt(5, 10), pt(0, 5)]);
        assert!(point_inside(&diamond, pt(5, 5)));
        // Row through the left/right vertices: the two edge pairs meeting
        // there must contribute exactly one crossing each side.
        assert!(point_inside(&diamond, pt(3, 5)));
        assert!(!point_inside(&diamond, pt(-1, 5)));
        assert!(!point_inside(&diamond, pt(11, 5)));
        // Row through top vertex: both upper edges exclude it.
        assert!(!point_inside(&diamond, pt(-1, 10)));
    }

    #[test]
    fn rotating_vertex_order_preserves_answers() {
        let base = [pt(0, 0), pt(10, 0), pt(10, 10), pt(0, 10)];
        let probes = [pt(5, 5), pt(0, 5), pt(10, 5), pt(5, 0), pt(5, 10), pt(-2, 3)];
        let reference: Vec<bool> = probes
            .iter()
            .map(|&q| point_inside(&Polygon::from_points(base), q))
            .collect();
        for rot in 1..base.len() {
            let mut pts = base.to_vec();
            pts.rotate_left(rot);
            let poly = Polygon::from_points(pts);
            for (i, &q) in probes.iter().enumerate() {
                assert_eq!(point_inside(&poly, q), reference[i], "rot {rot} probe {q:?}");
            }
        }
    }

    #[test]
    fn arc_ray_counts_circle_row_crossings() {
        // Full upper semicircle, radius 5 at origin: (5,0) → (-5,0) ccw.
        let arc = ArcSegment::new(pt(0, 0), pt(5, 0), pt(-5, 0), 5, true);
        // Row y=3 from far left crosses both sides of the dome.
        assert_eq!(ray_cast_arc(pt(-9, 3), &arc), 2);
        // From inside the dome, only the right side is ahead.
        assert_eq!(ray_cast_arc(pt(0, 3), &arc), 1);
        // From the right of it, nothing.
        assert_eq!(ray_cast_arc(pt(9, 3), &arc), 0);
        // Below the chord row or above the crown: no crossings.
        assert_eq!(ray_cast_arc(pt(-9, -1), &arc), 0);
        assert_eq!(ray_cast_arc(pt(-9, 5), &arc), 0);
    }

    #[test]
    fn disc_from_two_semicircles_counts_once_per_rim() {
        // Two semicircular arc edges closing into a full disc.
        let disc = ComplexPolygon::from_nodes([
            PolyNode::Arc {
                point: pt(5, 0),
                radius: 5,
                ccw: true,
            },
            PolyNode::Arc {
                point: pt(-5, 0),
                radius: 5,
                ccw: true,
            },
        ]);
        assert!(point_inside_complex(&disc, pt(0, 0)));
        assert!(point_inside_complex(&disc, pt(3, 3)));
        assert!(point_inside_complex(&disc, pt(0, -4)));
        assert!(!point_inside_complex(&disc, pt(6, 0)));
        assert!(!point_inside_complex(&disc, pt(0, 6)));
        assert!(!point_inside_complex(&disc, pt(-9, 3)));
        // The seam row passes through both arc endpoints; the asymmetric
        // endpoint acceptance keeps the parity right on both sides.
        assert!(point_inside_complex(&disc, pt(0, 0)));
        assert!(!point_inside_complex(&disc, pt(-9, 0)));
    }

    #[test]
    fn rounded_square_containment() {
        // Square with one arc edge bulging right past x = 10.
        let shape = ComplexPolygon::from_nodes([
            PolyNode::Corner(pt(0, 0)),
            PolyNode::Arc {
                point: pt(10, 0),
                radius: 7,
                ccw: true,
            },
            PolyNode::Corner(pt(10, 10)),
            PolyNode::Corner(pt(0, 10)),
        ]);
        assert!(point_inside_complex(&shape, pt(5, 5)));
        // The bulge extends past x=10 near mid-height.
        assert!(point_inside_complex(&shape, pt(12, 5)));
        assert!(!point_inside_complex(&shape, pt(15, 5)));
        assert!(!point_inside_complex(&shape, pt(-1, 5)));
    }
}
