use easel_geom::{distance_to_point, Box2D, Coord, Point, Shape};

pub type GObjectId = u64;

/// A named object placed on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct GObject {
    pub id: GObjectId,
    pub name: Option<String>,
    pub shape: Shape,
}

impl GObject {
    pub fn new(id: GObjectId, shape: Shape) -> Self {
        GObject {
            id,
            name: None,
            shape,
        }
    }

    pub fn named(id: GObjectId, name: impl Into<String>, shape: Shape) -> Self {
        GObject {
            id,
            name: Some(name.into()),
            shape,
        }
    }

    pub fn bounding_box(&self) -> Box2D {
        self.shape.bounding_box()
    }

    /// Distance from the canvas point to this object (0 when on or
    /// inside it).
    pub fn distance_to(&self, pt: Point) -> Coord {
        distance_to_point(&self.shape, pt).0
    }

    /// Hit test with a pick tolerance in grid units.
    pub fn hit(&self, pt: Point, tolerance: Coord) -> bool {
        self.distance_to(pt) <= tolerance
    }
}
