//! Pairwise nearest-point and distance queries across all shape kinds.
//!
//! [`distance`] is a symmetric double dispatch: a pair that is only
//! implemented one way round is answered by the swapped case with the
//! nearest points swapped back. All interior decisions (which endpoint is
//! closer, does an intersection land on both shapes) are exact in the
//! extension type; only the final scalar goes through a square root.

use crate::angle::DirAngle;
use crate::num::{Coord, CoordExt};
use crate::point::Point;
use crate::raycast::{point_inside, point_inside_complex};
use crate::shape::{ArcSegment, Circle, ComplexPolygon, PolyEdge, Polygon, Segment, Shape};

/// The nearest point on each of the two queried shapes, in query order.
pub type Nearest = (Point, Point);

/// Strict "closer than" on squared distance. Ties are unspecified and
/// must not be relied on by callers.
pub fn closer_than(a: &Nearest, b: &Nearest) -> bool {
    (a.0 - a.1).norm2() < (b.0 - b.1).norm2()
}

fn swapped((d, (p, q)): (Coord, Nearest)) -> (Coord, Nearest) {
    (d, (q, p))
}

fn pick(best: &mut (Coord, Nearest), cand: (Coord, Nearest)) {
    if closer_than(&cand.1, &best.1) {
        *best = cand;
    }
}

/// Nearest point to `p` on the segment `a`..`b`: the clamped projection,
/// or the nearer endpoint when the projection falls outside.
pub fn nearest_point_segment(a: Point, b: Point, p: Point) -> Point {
    if a == b {
        return a;
    }
    let ab = b - a;
    let ap = p - a;

    let dot_ab_ap = ab.dot(ap);
    let len2_ab = ab.norm2();

    if dot_ab_ap >= 0 && dot_ab_ap <= len2_ab {
        let lambda = dot_ab_ap as f64 / len2_ab as f64;
        Point::new(
            a.x + (lambda * ab.x as f64) as Coord,
            a.y + (lambda * ab.y as f64) as Coord,
        )
    } else if (p - a).norm2() < (p - b).norm2() {
        a
    } else {
        b
    }
}

/// Intersection of segments `a`..`b` and `c`..`d` via their integer line
/// equations, if it lies on both.
pub fn segments_intersect(a: Point, b: Point, c: Point, d: Point) -> Option<Point> {
    // Line AB as a1 x + b1 y = c1, line CD as a2 x + b2 y = c2.
    let a1 = (b.y - a.y) as CoordExt;
    let b1 = (a.x - b.x) as CoordExt;
    let c1 = a1 * a.x as CoordExt + b1 * a.y as CoordExt;

    let a2 = (d.y - c.y) as CoordExt;
    let b2 = (c.x - d.x) as CoordExt;
    let c2 = a2 * c.x as CoordExt + b2 * c.y as CoordExt;

    let det = (a1 * b2 - a2 * b1) as f64;
    if det == 0.0 {
        return None;
    }

    let x = (b2 * c1 - b1 * c2) as f64 / det;
    let y = (a1 * c2 - a2 * c1) as f64 / det;

    if x < a.x.min(b.x) as f64
        || x > a.x.max(b.x) as f64
        || x < c.x.min(d.x) as f64
        || x > c.x.max(d.x) as f64
        || y < a.y.min(b.y) as f64
        || y > a.y.max(b.y) as f64
        || y < c.y.min(d.y) as f64
        || y > c.y.max(d.y) as f64
    {
        return None;
    }

    Some(Point::new(x as Coord, y as Coord))
}

/// Is `pt` (already known to lie on the carrier line) between `p1` and
/// `p2`? Decided on the dominant axis to dodge truncation on the other.
pub fn point_on_segment(p1: Point, p2: Point, pt: Point) -> bool {
    if p1 == p2 {
        return p1 == pt;
    }

    let vec = p2 - p1;
    if vec.x.abs() > vec.y.abs() {
        if p1.x < p2.x {
            p1.x <= pt.x && pt.x <= p2.x
        } else {
            p1.x >= pt.x && pt.x >= p2.x
        }
    } else if p1.y < p2.y {
        p1.y <= pt.y && pt.y <= p2.y
    } else {
        p1.y >= pt.y && pt.y >= p2.y
    }
}

// ── Point-level primitives ────────────────────────────────────────

pub fn dist_point_point(p1: Point, p2: Point) -> (Coord, Nearest) {
    ((p2 - p1).norm(), (p1, p2))
}

pub fn dist_segment_point(seg: &Segment, pt: Point) -> (Coord, Nearest) {
    let pn = nearest_point_segment(seg.a, seg.b, pt);
    ((pn - pt).norm(), (pn, pt))
}

pub fn dist_circle_point(circle: &Circle, pt: Point) -> (Coord, Nearest) {
    if (circle.center - pt).norm() <= circle.radius {
        return (0, (pt, pt));
    }
    let on_rim = circle.center + (pt - circle.center).resize(circle.radius);
    ((pt - circle.center).norm() - circle.radius, (on_rim, pt))
}

/// Circle treated as its rim only: a point inside still measures to the
/// rim. Used to reduce arc queries to circle queries.
fn dist_rim_point(circle: &Circle, pt: Point) -> (Coord, Nearest) {
    if circle.center == pt {
        return (circle.radius, (pt + Point::new(circle.radius, 0), pt));
    }
    let on_rim = circle.center + (pt - circle.center).resize(circle.radius);
    ((on_rim - pt).norm(), (on_rim, pt))
}

pub fn dist_arc_point(arc: &ArcSegment, pt: Point) -> (Coord, Nearest) {
    let circle = Circle::new(arc.center, arc.radius);
    let (num, pts) = dist_rim_point(&circle, pt);
    if arc
        .range
        .contains(&DirAngle::from_vector(pts.0 - arc.center))
    {
        return (num, pts);
    }

    if closer_than(&(arc.p1(), pt), &(arc.p2(), pt)) {
        ((arc.p1() - pt).norm(), (arc.p1(), pt))
    } else {
        ((arc.p2() - pt).norm(), (arc.p2(), pt))
    }
}

// ── Segment and circle pairs ──────────────────────────────────────

pub fn dist_segment_segment(sa: &Segment, sb: &Segment) -> (Coord, Nearest) {
    if let Some(pt) = segments_intersect(sa.a, sa.b, sb.a, sb.b) {
        return (0, (pt, pt));
    }

    let mut best = dist_segment_point(sa, sb.a);
    pick(&mut best, dist_segment_point(sa, sb.b));
    pick(&mut best, swapped(dist_segment_point(sb, sa.a)));
    pick(&mut best, swapped(dist_segment_point(sb, sa.b)));
    best
}

pub fn dist_circle_circle(ca: &Circle, cb: &Circle) -> (Coord, Nearest) {
    let rel = circle_relation(ca, cb);
    match rel.cond {
        CircleRelation::AInB => {
            let p = rel.p1.unwrap();
            (0, (p, p))
        }
        CircleRelation::BInA => {
            let p = rel.p2.unwrap();
            (0, (p, p))
        }
        CircleRelation::Intersected => {
            let p = rel.pi1.unwrap();
            (0, (p, p))
        }
        CircleRelation::Away => {
            let (p1, p2) = (rel.p1.unwrap(), rel.p2.unwrap());
            (
                (ca.center - cb.center).norm() - (ca.radius + cb.radius),
                (p1, p2),
            )
        }
    }
}

/// Foot of the perpendicular from the circle's center onto the carrier
/// line of `p1`..`p2`, plus the chord endpoints when the line cuts the
/// circle.
pub fn circle_line_intersection(
    circle: &Circle,
    p1: Point,
    p2: Point,
) -> (Point, Option<(Point, Point)>) {
    if p1 == p2 {
        return (p1, None);
    }

    let pa = p1 - circle.center;
    let v21 = p2 - p1;
    let vc1 = circle.center - p1;
    let d1 = v21.dot(v21);
    let d2 = v21.dot(vc1);
    let lambda = d2 as f64 / d1 as f64;
    let sp = pa
        + Point::new(
            (v21.x as f64 * lambda) as Coord,
            (v21.y as f64 * lambda) as Coord,
        );
    if sp.norm() > circle.radius {
        return (sp + circle.center, None);
    }

    let sr = sp.norm2();
    let len = ((circle.radius as CoordExt * circle.radius as CoordExt - sr) as f64).sqrt() as Coord;
    let vec = v21.resize(len);
    (
        sp + circle.center,
        Some((sp + circle.center + vec, sp + circle.center - vec)),
    )
}

pub fn dist_circle_segment(circle: &Circle, seg: &Segment) -> (Coord, Nearest) {
    let (sp, chord) = circle_line_intersection(circle, seg.a, seg.b);
    if let Some((q1, q2)) = chord {
        if point_on_segment(seg.a, seg.b, q1) {
            return (0, (q1, q1));
        }
        if point_on_segment(seg.a, seg.b, q2) {
            return (0, (q2, q2));
        }
    }

    if (circle.center - seg.a).norm() <= circle.radius {
        return (0, (seg.a, seg.a));
    }

    if point_on_segment(seg.a, seg.b, sp) {
        let on_rim = circle.center + (sp - circle.center).resize(circle.radius);
        return ((sp - on_rim).norm(), (on_rim, sp));
    }

    let best = dist_circle_point(circle, seg.a);
    let cand = dist_circle_point(circle, seg.b);
    if closer_than(&cand.1, &best.1) {
        cand
    } else {
        best
    }
}

// ── Arc pairs ─────────────────────────────────────────────────────

pub fn dist_arc_segment(arc: &ArcSegment, seg: &Segment) -> (Coord, Nearest) {
    let circle = Circle::new(arc.center, arc.radius);
    let (sp, chord) = circle_line_intersection(&circle, seg.a, seg.b);
    if let Some((q1, q2)) = chord {
        if point_on_segment(seg.a, seg.b, q1)
            && arc.range.contains(&DirAngle::from_vector(q1 - arc.center))
        {
            return (0, (q1, q1));
        }
        if point_on_segment(seg.a, seg.b, q2)
            && arc.range.contains(&DirAngle::from_vector(q2 - arc.center))
        {
            return (0, (q2, q2));
        }
    }

    if point_on_segment(seg.a, seg.b, sp)
        && arc.range.contains(&DirAngle::from_vector(sp - arc.center))
    {
        let on_rim = circle.center + (sp - circle.center).resize(circle.radius);
        return ((sp - on_rim).norm(), (on_rim, sp));
    }

    let mut best = dist_arc_point(arc, seg.a);
    pick(&mut best, dist_arc_point(arc, seg.b));
    pick(&mut best, swapped(dist_segment_point(seg, arc.p1())));
    pick(&mut best, swapped(dist_segment_point(seg, arc.p2())));
    best
}

/// How two circles relate, with the relevant witness points: nearest rim
/// points for the disjoint/nested cases, intersection points otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircleRelation {
    AInB,
    BInA,
    Intersected,
    Away,
}

#[derive(Debug, Clone)]
pub struct CircleRelationData {
    pub cond: CircleRelation,
    pub p1: Option<Point>,
    pub p2: Option<Point>,
    pub pi1: Option<Point>,
    pub pi2: Option<Point>,
}

pub fn circle_relation(c1: &Circle, c2: &Circle) -> CircleRelationData {
    let mut ans = CircleRelationData {
        cond: CircleRelation::Away,
        p1: None,
        p2: None,
        pi1: None,
        pi2: None,
    };
    if c1.center == c2.center {
        ans.p1 = Some(c1.center + Point::new(c1.radius, 0));
        ans.p2 = Some(c2.center + Point::new(c2.radius, 0));
        ans.cond = if c1.radius < c2.radius {
            CircleRelation::AInB
        } else {
            CircleRelation::BInA
        };
        return ans;
    }

    let center2 = c2.center - c1.center;
    let sn = center2.norm2();
    let rsum = c1.radius + c2.radius;
    let rsum2 = rsum as CoordExt * rsum as CoordExt;
    if sn > rsum2 {
        ans.p1 = Some(center2.resize(c1.radius) + c1.center);
        ans.p2 = Some(center2 + center2.resize(-c2.radius) + c1.center);
        return ans;
    }

    let rdiff = c1.radius - c2.radius;
    let rdiff2 = rdiff as CoordExt * rdiff as CoordExt;
    if rdiff2 >= sn {
        if c1.radius < c2.radius {
            ans.cond = CircleRelation::AInB;
            ans.p1 = Some(center2.resize(-c1.radius) + c1.center);
            ans.p2 = Some(center2 + center2.resize(-c2.radius) + c1.center);
        } else {
            ans.cond = CircleRelation::BInA;
            ans.p1 = Some(center2.resize(c1.radius) + c1.center);
            ans.p2 = Some(center2 + center2.resize(c2.radius) + c1.center);
        }
        return ans;
    }

    ans.cond = CircleRelation::Intersected;
    let r2 = center2.norm2();
    let a = c1.radius as CoordExt * c1.radius as CoordExt
        - c2.radius as CoordExt * c2.radius as CoordExt
        + r2;
    let m = ((4 * c1.radius as CoordExt * c1.radius as CoordExt * r2 - a * a) as f64).sqrt()
        as CoordExt;
    let valfunc =
        |k1: Coord, k2: Coord| -> Coord { ((a * k1 as CoordExt + m * k2 as CoordExt) / (2 * r2)) as Coord };
    ans.pi1 = Some(Point::new(valfunc(center2.x, center2.y), valfunc(center2.y, -center2.x)) + c1.center);
    ans.pi2 = Some(Point::new(valfunc(center2.x, -center2.y), valfunc(center2.y, center2.x)) + c1.center);
    ans
}

pub fn dist_arc_arc(a1: &ArcSegment, a2: &ArcSegment) -> (Coord, Nearest) {
    let c1 = Circle::new(a1.center, a1.radius);
    let c2 = Circle::new(a2.center, a2.radius);
    let relation = circle_relation(&c1, &c2);
    match relation.cond {
        CircleRelation::AInB | CircleRelation::BInA | CircleRelation::Away => {
            let (p1, p2) = (relation.p1.unwrap(), relation.p2.unwrap());
            if a1.range.contains(&DirAngle::from_vector(p1 - a1.center))
                && a2.range.contains(&DirAngle::from_vector(p2 - a2.center))
            {
                return ((p1 - p2).norm(), (p1, p2));
            }
        }
        CircleRelation::Intersected => {
            for pi in [relation.pi1.unwrap(), relation.pi2.unwrap()] {
                if a1.range.contains(&DirAngle::from_vector(pi - a1.center))
                    && a2.range.contains(&DirAngle::from_vector(pi - a2.center))
                {
                    return (0, (pi, pi));
                }
            }
        }
    }

    let mut best = swapped(dist_arc_point(a2, a1.p1()));
    pick(&mut best, swapped(dist_arc_point(a2, a1.p2())));
    pick(&mut best, dist_arc_point(a1, a2.p1()));
    pick(&mut best, dist_arc_point(a1, a2.p2()));
    best
}

pub fn dist_arc_circle(arc: &ArcSegment, circle: &Circle) -> (Coord, Nearest) {
    let arc_circle = Circle::new(arc.center, arc.radius);
    let relation = circle_relation(&arc_circle, circle);
    match relation.cond {
        CircleRelation::AInB => {
            return (0, (arc.p1(), arc.p1()));
        }
        CircleRelation::BInA | CircleRelation::Away => {
            let (p1, p2) = (relation.p1.unwrap(), relation.p2.unwrap());
            if arc.range.contains(&DirAngle::from_vector(p1 - arc.center)) {
                return ((p1 - p2).norm(), (p1, p2));
            }
        }
        CircleRelation::Intersected => {
            for pi in [relation.pi1.unwrap(), relation.pi2.unwrap()] {
                if arc.range.contains(&DirAngle::from_vector(pi - arc.center)) {
                    return (0, (pi, pi));
                }
            }
        }
    }

    let best = swapped(dist_circle_point(circle, arc.p1()));
    let cand = swapped(dist_circle_point(circle, arc.p2()));
    if closer_than(&cand.1, &best.1) {
        cand
    } else {
        best
    }
}

// ── Polygon dispatch ──────────────────────────────────────────────

fn dist_polygon_shape(poly: &Polygon, oth: &Shape) -> (Coord, Nearest) {
    let ap = oth.anchor();
    if point_inside(poly, ap) {
        return (0, (ap, ap));
    }

    let mut best: Option<(Coord, Nearest)> = None;
    for i in 0..poly.len() {
        let cand = dist_segment_shape(&poly.segment(i), oth);
        match &mut best {
            None => best = Some(cand),
            Some(b) => pick(b, cand),
        }
    }
    best.expect("polygon has no edges")
}

fn dist_complex_shape(poly: &ComplexPolygon, oth: &Shape) -> (Coord, Nearest) {
    let ap = oth.anchor();
    if point_inside_complex(poly, ap) {
        return (0, (ap, ap));
    }

    let mut best: Option<(Coord, Nearest)> = None;
    for i in 0..poly.len() {
        let cand = match poly.edge(i) {
            PolyEdge::Line(seg) => dist_segment_shape(&seg, oth),
            PolyEdge::Arc(arc) => dist_arc_shape(&arc, oth),
        };
        match &mut best {
            None => best = Some(cand),
            Some(b) => pick(b, cand),
        }
    }
    best.expect("complex polygon has no edges")
}

fn dist_segment_shape(seg: &Segment, oth: &Shape) -> (Coord, Nearest) {
    match oth {
        Shape::Segment(b) => dist_segment_segment(seg, b),
        Shape::Arc(b) => swapped(dist_arc_segment(b, seg)),
        Shape::Circle(b) => swapped(dist_circle_segment(b, seg)),
        Shape::Polygon(b) => swapped(dist_polygon_shape(b, &Shape::Segment(*seg))),
        Shape::Complex(b) => swapped(dist_complex_shape(b, &Shape::Segment(*seg))),
    }
}

fn dist_arc_shape(arc: &ArcSegment, oth: &Shape) -> (Coord, Nearest) {
    match oth {
        Shape::Segment(b) => dist_arc_segment(arc, b),
        Shape::Arc(b) => dist_arc_arc(arc, b),
        Shape::Circle(b) => dist_arc_circle(arc, b),
        Shape::Polygon(b) => swapped(dist_polygon_shape(b, &Shape::Arc(*arc))),
        Shape::Complex(b) => swapped(dist_complex_shape(b, &Shape::Arc(*arc))),
    }
}

fn dist_circle_shape(circle: &Circle, oth: &Shape) -> (Coord, Nearest) {
    match oth {
        Shape::Segment(b) => dist_circle_segment(circle, b),
        Shape::Arc(b) => swapped(dist_arc_circle(b, circle)),
        Shape::Circle(b) => dist_circle_circle(circle, b),
        Shape::Polygon(b) => swapped(dist_polygon_shape(b, &Shape::Circle(*circle))),
        Shape::Complex(b) => swapped(dist_complex_shape(b, &Shape::Circle(*circle))),
    }
}

/// Distance between two shapes: the Euclidean scalar and the nearest
/// point on each, in query order.
pub fn distance(a: &Shape, b: &Shape) -> (Coord, Nearest) {
    match a {
        Shape::Segment(s) => dist_segment_shape(s, b),
        Shape::Arc(s) => dist_arc_shape(s, b),
        Shape::Circle(s) => dist_circle_shape(s, b),
        Shape::Polygon(s) => dist_polygon_shape(s, b),
        Shape::Complex(s) => dist_complex_shape(s, b),
    }
}

/// Distance from a shape to a bare point (hit testing).
pub fn distance_to_point(shape: &Shape, pt: Point) -> (Coord, Nearest) {
    match shape {
        Shape::Segment(s) => dist_segment_point(s, pt),
        Shape::Arc(s) => dist_arc_point(s, pt),
        Shape::Circle(s) => dist_circle_point(s, pt),
        Shape::Polygon(s) => {
            if point_inside(s, pt) {
                return (0, (pt, pt));
            }
            let mut best: Option<(Coord, Nearest)> = None;
            for i in 0..s.len() {
                let cand = dist_segment_point(&s.segment(i), pt);
                match &mut best {
                    None => best = Some(cand),
                    Some(b) => pick(b, cand),
                }
            }
            best.expect("polygon has no edges")
        }
        Shape::Complex(s) => {
            if point_inside_complex(s, pt) {
                return (0, (pt, pt));
            }
            let mut best: Option<(Coord, Nearest)> = None;
            for i in 0..s.len() {
                let cand = match s.edge(i) {
                    PolyEdge::Line(seg) => dist_segment_point(&seg, pt),
                    PolyEdge::Arc(arc) => dist_arc_point(&arc, pt),
                };
                match &mut best {
                    None => best = Some(cand),
                    Some(b) => pick(b, cand),
                }
            }
            best.expect("complex polygon has no edges")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: Coord, y: Coord) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn segment_point_projection_and_clamp() {
        let seg = Segment::new(pt(0, 0), pt(10, 0));
        assert_eq!(dist_segment_point(&seg, pt(5, 3)), (3, (pt(5, 0), pt(5, 3))));
        assert_eq!(
            dist_segment_point(&seg, pt(14, 3)),
            (5, (pt(10, 0), pt(14, 3)))
        );
        assert_eq!(dist_segment_point(&seg, pt(-3, -4)), (5, (pt(0, 0), pt(-3, -4))));
    }

    #[test]
    fn crossing_segments_have_zero_distance() {
        let s1 = Segment::new(pt(-5, -5), pt(5, 5));
        let s2 = Segment::new(pt(-5, 5), pt(5, -5));
        let (d, (p, q)) = dist_segment_segment(&s1, &s2);
        assert_eq!(d, 0);
        assert_eq!(p, q);
        assert_eq!(p, pt(0, 0));
    }

    #[test]
    fn parallel_segments_measure_between_endpoints() {
        let s1 = Segment::new(pt(0, 0), pt(10, 0));
        let s2 = Segment::new(pt(0, 4), pt(10, 4));
        let (d, (p, q)) = dist_segment_segment(&s1, &s2);
        assert_eq!(d, 4);
        assert_eq!((p - q).norm2(), 16);
    }

    #[test]
    fn circle_point_inside_is_zero() {
        let c = Circle::new(pt(0, 0), 5);
        assert_eq!(dist_circle_point(&c, pt(1, 1)), (0, (pt(1, 1), pt(1, 1))));
        let (d, (on_rim, q)) = dist_circle_point(&c, pt(13, 0));
        assert_eq!(d, 8);
        assert_eq!(on_rim, pt(5, 0));
        assert_eq!(q, pt(13, 0));
    }

    #[test]
    fn circle_relation_classification() {
        let a = Circle::new(pt(0, 0), 5);
        assert_eq!(
            circle_relation(&a, &Circle::new(pt(20, 0), 5)).cond,
            CircleRelation::Away
        );
        assert_eq!(
            circle_relation(&a, &Circle::new(pt(1, 0), 2)).cond,
            CircleRelation::BInA
        );
        assert_eq!(
            circle_relation(&a, &Circle::new(pt(0, 1), 10)).cond,
            CircleRelation::AInB
        );
        let rel = circle_relation(&a, &Circle::new(pt(6, 0), 5));
        assert_eq!(rel.cond, CircleRelation::Intersected);
        let pi1 = rel.pi1.unwrap();
        // Intersection points sit on (or within truncation of) both rims.
        assert!(((pi1 - pt(0, 0)).norm2() - 25).abs() <= 8);
        assert!(((pi1 - pt(6, 0)).norm2() - 25).abs() <= 8);
    }

    #[test]
    fn away_circles_distance() {
        let a = Circle::new(pt(0, 0), 3);
        let b = Circle::new(pt(10, 0), 2);
        let (d, (p, q)) = dist_circle_circle(&a, &b);
        assert_eq!(d, 5);
        assert_eq!(p, pt(3, 0));
        assert_eq!(q, pt(8, 0));
    }

    #[test]
    fn circle_segment_chord_hits_zero() {
        let c = Circle::new(pt(0, 0), 5);
        let seg = Segment::new(pt(-10, 0), pt(10, 0));
        let (d, (p, q)) = dist_circle_segment(&c, &seg);
        assert_eq!(d, 0);
        assert_eq!(p, q);
    }

    #[test]
    fn circle_segment_offset_measures_gap() {
        let c = Circle::new(pt(0, 0), 5);
        let seg = Segment::new(pt(-10, 8), pt(10, 8));
        let (d, (p, q)) = dist_circle_segment(&c, &seg);
        assert_eq!(d, 3);
        assert_eq!(p, pt(0, 5));
        assert_eq!(q, pt(0, 8));
    }

    #[test]
    fn arc_segment_nearest_points() {
        // Quarter arc (5,0) → (0,5) ccw; vertical segment at x = 3 below it.
        let arc = ArcSegment::new(pt(0, 0), pt(5, 0), pt(0, 5), 5, true);
        let seg = Segment::new(pt(3, 4), pt(3, -4));
        let (d, (p, q)) = dist_arc_segment(&arc, &seg);
        // The chord (3,4)..(3,-4) cuts the circle at (3,4) and (3,-4);
        // (3,4) is on the arc and on the segment, so they touch.
        assert_eq!(d, 0);
        assert_eq!(p, q);
        assert_eq!(p, pt(3, 4));
    }

    #[test]
    fn arc_segment_projection_gap() {
        // Same quarter arc; the segment stops short of the rim, so the
        // nearest pair is the perpendicular foot (3,0) against (5,0).
        let arc = ArcSegment::new(pt(0, 0), pt(5, 0), pt(0, 5), 5, true);
        let seg = Segment::new(pt(3, 2), pt(3, -2));
        let (d, (p, q)) = dist_arc_segment(&arc, &seg);
        assert_eq!(d, 2);
        assert_eq!(p, pt(5, 0));
        assert_eq!(q, pt(3, 0));
    }

    #[test]
    fn arc_point_respects_angular_range() {
        // Quarter arc in the first quadrant; query from the opposite side.
        let arc = ArcSegment::new(pt(0, 0), pt(5, 0), pt(0, 5), 5, true);
        let (d, (p, _)) = dist_arc_point(&arc, pt(-9, 0));
        // Nearest rim point (-5,0) is off-arc; falls back to endpoint (0,5).
        assert_eq!(p, pt(0, 5));
        assert_eq!(d, ((9i64 * 9 + 5 * 5) as f64).sqrt() as Coord);

        let (d, (p, _)) = dist_arc_point(&arc, pt(9, 0));
        assert_eq!(d, 4);
        assert_eq!(p, pt(5, 0));
    }

    #[test]
    fn polygon_containment_short_circuits() {
        let poly = Shape::polygon([pt(0, 0), pt(10, 0), pt(10, 10), pt(0, 10)]);
        let inner = Shape::circle(pt(5, 5), 1);
        assert_eq!(distance(&poly, &inner).0, 0);

        let outer = Shape::circle(pt(20, 5), 2);
        let (d, (p, q)) = distance(&poly, &outer);
        assert_eq!(d, 8);
        assert_eq!(p, pt(10, 5));
        assert_eq!(q, pt(18, 5));
    }

    #[test]
    fn swapped_pair_keeps_query_order() {
        let seg = Shape::segment(pt(0, 10), pt(10, 10));
        let circle = Shape::circle(pt(5, 0), 5);
        let (d1, (p1, q1)) = distance(&seg, &circle);
        let (d2, (p2, q2)) = distance(&circle, &seg);
        assert_eq!(d1, d2);
        assert_eq!((p1, q1), (q2, p2));
        assert_eq!(d1, 5);
    }

    #[test]
    fn hit_test_distance_to_point() {
        let poly = Shape::polygon([pt(0, 0), pt(10, 0), pt(10, 10), pt(0, 10)]);
        assert_eq!(distance_to_point(&poly, pt(5, 5)).0, 0);
        assert_eq!(distance_to_point(&poly, pt(15, 5)).0, 5);
        let arc = Shape::arc(pt(5, 0), pt(0, 5), 5, true).unwrap();
        match &arc {
            Shape::Arc(a) => assert_eq!(a.center, pt(0, 0)),
            _ => unreachable!(),
        }
        assert_eq!(distance_to_point(&arc, pt(10, 0)).0, 5);
    }
}
