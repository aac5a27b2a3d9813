//! Exact-arithmetic 2-D geometry kernel for the Easel canvas.
//!
//! Coordinates are 32-bit integers; dot/cross products, squared norms and
//! angle comparisons are carried out in a 64-bit extension type so shape
//! predicates (ordering, containment, crossing counts) are exact. Square
//! roots fall back to `f64` and truncate, matching the canvas grid.
//!
//! Everything here is pure: each operation is a function of its inputs.

pub mod angle;
pub mod distance;
pub mod num;
pub mod point;
pub mod raycast;
pub mod shape;

pub use angle::{AngleRange, DirAngle};
pub use distance::{circle_relation, distance, distance_to_point, CircleRelation, Nearest};
pub use num::{compare_frac, Coord, CoordExt};
pub use point::{Box2D, Point};
pub use raycast::{point_inside, point_inside_complex};
pub use shape::{ArcSegment, Circle, ComplexPolygon, PolyEdge, PolyNode, Polygon, Segment, Shape};
