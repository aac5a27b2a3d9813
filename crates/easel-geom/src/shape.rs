use smallvec::SmallVec;

use crate::angle::{AngleRange, DirAngle};
use crate::num::{Coord, CoordExt};
use crate::point::{Box2D, Point};

/// A straight line segment between two points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub a: Point,
    pub b: Point,
}

impl Segment {
    pub const fn new(a: Point, b: Point) -> Self {
        Segment { a, b }
    }

    pub fn bounding_box(&self) -> Box2D {
        Box2D::from_point(self.a).merge(self.b)
    }
}

/// Center of the arc through chord `a`..`b` with the given radius, on the
/// side selected by the winding flag. `None` when the chord is longer
/// than the diameter (or degenerate).
pub fn arc_center(a: Point, b: Point, radius: Coord, ccw: bool) -> Option<Point> {
    if a == b {
        return None;
    }
    let m = Point::new((a.x + b.x) / 2, (a.y + b.y) / 2);
    let d = (b - a).norm();
    if d as CoordExt > radius as CoordExt * 2 {
        return None;
    }

    let h = ((radius as CoordExt * radius as CoordExt) as f64
        - (d as f64 / 2.0) * (d as f64 / 2.0))
        .sqrt() as Coord;
    let p = (b - a).perpendicular().resize(h);

    let c1 = Point::new(m.x + p.x, m.y + p.y);
    let c2 = Point::new(m.x - p.x, m.y - p.y);
    Some(if ((b - a).cross(c1 - a) > 0) == ccw { c1 } else { c2 })
}

/// A circular arc from `from` to `to` around `center`, swept in the
/// direction recorded by `range`.
///
/// The stored endpoints may sit one grid unit off the swept circle
/// (truncation); the ray caster compensates (see
/// [`crate::raycast::ray_cast_arc_fixed`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcSegment {
    pub center: Point,
    pub from: Point,
    pub to: Point,
    pub radius: Coord,
    pub range: AngleRange,
}

impl ArcSegment {
    pub fn new(center: Point, from: Point, to: Point, radius: Coord, ccw: bool) -> Self {
        ArcSegment {
            center,
            from,
            to,
            radius,
            range: AngleRange::new(
                DirAngle::from_vector(from - center),
                DirAngle::from_vector(to - center),
                ccw,
            ),
        }
    }

    /// Construct from a chord plus radius and winding.
    pub fn from_chord(a: Point, b: Point, radius: Coord, ccw: bool) -> Option<Self> {
        let center = arc_center(a, b, radius, ccw)?;
        Some(ArcSegment::new(center, a, b, radius, ccw))
    }

    pub fn extended_range(&self) -> AngleRange {
        self.range.extended()
    }

    /// First endpoint projected onto the swept circle.
    pub fn p1(&self) -> Point {
        self.center + dir_point(self.range.from).resize(self.radius)
    }

    /// Second endpoint projected onto the swept circle.
    pub fn p2(&self) -> Point {
        self.center + dir_point(self.range.to).resize(self.radius)
    }

    pub fn bounding_box(&self) -> Box2D {
        let mut ans = Box2D::from_point(self.from).merge(self.to);
        if self.range.contains(&DirAngle::angle_0()) {
            ans = ans.merge(self.center + Point::new(self.radius, 0));
        }
        if self.range.contains(&DirAngle::angle_90()) {
            ans = ans.merge(self.center + Point::new(0, self.radius));
        }
        if self.range.contains(&DirAngle::angle_180()) {
            ans = ans.merge(self.center + Point::new(-self.radius, 0));
        }
        if self.range.contains(&DirAngle::angle_270()) {
            ans = ans.merge(self.center + Point::new(0, -self.radius));
        }
        ans
    }
}

/// Direction-vector of a range endpoint as a grid point. Range endpoints
/// are built from point differences, so the narrowing cast is lossless.
fn dir_point(angle: DirAngle) -> Point {
    Point::new(angle.x as Coord, angle.y as Coord)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Circle {
    pub center: Point,
    pub radius: Coord,
}

impl Circle {
    pub const fn new(center: Point, radius: Coord) -> Self {
        Circle { center, radius }
    }

    pub fn bounding_box(&self) -> Box2D {
        Box2D::from_point(self.center + Point::new(self.radius, 0))
            .merge(self.center + Point::new(0, self.radius))
            .merge(self.center + Point::new(-self.radius, 0))
            .merge(self.center + Point::new(0, -self.radius))
    }
}

/// A simple polygon: straight edges between consecutive points, closed
/// back to the first. Most canvas polygons are quads, hence the inline
/// capacity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Polygon {
    pub points: SmallVec<[Point; 4]>,
}

impl Polygon {
    pub fn new() -> Self {
        Polygon::default()
    }

    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Self {
        Polygon {
            points: points.into_iter().collect(),
        }
    }

    pub fn push(&mut self, pt: Point) {
        self.points.push(pt);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The i-th edge, wrapping back to the first point.
    pub fn segment(&self, i: usize) -> Segment {
        debug_assert!(i < self.len());
        let next = (i + 1) % self.len();
        Segment::new(self.points[i], self.points[next])
    }

    pub fn bounding_box(&self) -> Box2D {
        self.points.iter().fold(Box2D::empty(), |b, &p| b.merge(p))
    }
}

/// One corner of a [`ComplexPolygon`]: either a straight corner or the
/// start of an arc edge carrying its radius and winding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolyNode {
    Corner(Point),
    Arc {
        point: Point,
        radius: Coord,
        ccw: bool,
    },
}

impl PolyNode {
    pub fn point(&self) -> Point {
        match *self {
            PolyNode::Corner(pt) => pt,
            PolyNode::Arc { point, .. } => point,
        }
    }
}

/// An edge of a complex polygon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PolyEdge {
    Line(Segment),
    Arc(ArcSegment),
}

/// A polygon whose edges may be straight or circular arcs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComplexPolygon {
    pub nodes: SmallVec<[PolyNode; 4]>,
}

impl ComplexPolygon {
    pub fn new() -> Self {
        ComplexPolygon::default()
    }

    pub fn from_nodes(nodes: impl IntoIterator<Item = PolyNode>) -> Self {
        ComplexPolygon {
            nodes: nodes.into_iter().collect(),
        }
    }

    pub fn push(&mut self, node: PolyNode) {
        self.nodes.push(node);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The i-th edge: a segment from node i to node i+1, or the arc
    /// described by node i's radius and winding over that chord.
    pub fn edge(&self, i: usize) -> PolyEdge {
        debug_assert!(i < self.len());
        let next = self.nodes[(i + 1) % self.len()].point();
        match self.nodes[i] {
            PolyNode::Corner(pt) => PolyEdge::Line(Segment::new(pt, next)),
            PolyNode::Arc { point, radius, ccw } => PolyEdge::Arc(
                ArcSegment::from_chord(point, next, radius, ccw)
                    .expect("arc edge chord exceeds its diameter"),
            ),
        }
    }

    pub fn bounding_box(&self) -> Box2D {
        let mut ans = Box2D::empty();
        for i in 0..self.len() {
            match self.edge(i) {
                PolyEdge::Line(seg) => ans = ans.merge(seg.a).merge(seg.b),
                PolyEdge::Arc(arc) => ans = ans.merge_box(arc.bounding_box()),
            }
        }
        ans
    }
}

/// The closed set of canvas shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Segment(Segment),
    Arc(ArcSegment),
    Circle(Circle),
    Polygon(Polygon),
    Complex(ComplexPolygon),
}

impl Shape {
    pub fn segment(a: Point, b: Point) -> Shape {
        Shape::Segment(Segment::new(a, b))
    }

    pub fn arc(a: Point, b: Point, radius: Coord, ccw: bool) -> Option<Shape> {
        ArcSegment::from_chord(a, b, radius, ccw).map(Shape::Arc)
    }

    pub fn circle(center: Point, radius: Coord) -> Shape {
        Shape::Circle(Circle::new(center, radius))
    }

    pub fn polygon(points: impl IntoIterator<Item = Point>) -> Shape {
        Shape::Polygon(Polygon::from_points(points))
    }

    pub fn complex_polygon(nodes: impl IntoIterator<Item = PolyNode>) -> Shape {
        Shape::Complex(ComplexPolygon::from_nodes(nodes))
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Shape::Segment(_) => "segment",
            Shape::Arc(_) => "arc",
            Shape::Circle(_) => "circle",
            Shape::Polygon(_) => "polygon",
            Shape::Complex(_) => "complex-polygon",
        }
    }

    pub fn bounding_box(&self) -> Box2D {
        match self {
            Shape::Segment(s) => s.bounding_box(),
            Shape::Arc(s) => s.bounding_box(),
            Shape::Circle(s) => s.bounding_box(),
            Shape::Polygon(s) => s.bounding_box(),
            Shape::Complex(s) => s.bounding_box(),
        }
    }

    /// A point guaranteed to lie on the shape, used by the polygon
    /// distance cases to short-circuit containment.
    pub fn anchor(&self) -> Point {
        match self {
            Shape::Segment(s) => s.a,
            Shape::Arc(s) => s.p1(),
            Shape::Circle(s) => s.center + Point::new(s.radius, 0),
            Shape::Polygon(s) => {
                debug_assert!(!s.is_empty());
                s.points[0]
            }
            Shape::Complex(s) => {
                debug_assert!(!s.is_empty());
                s.nodes[0].point()
            }
        }
    }
}
