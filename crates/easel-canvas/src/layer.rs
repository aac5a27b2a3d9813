use easel_geom::{Box2D, Coord, Point, Shape};

use crate::gobject::{GObject, GObjectId};

/// An ordered set of canvas objects. Later objects sit on top, so hit
/// tests walk the list back to front.
#[derive(Debug, Default)]
pub struct CanvasLayer {
    objects: Vec<GObject>,
    next_id: GObjectId,
}

impl CanvasLayer {
    pub fn new() -> Self {
        CanvasLayer {
            objects: Vec::new(),
            next_id: 1,
        }
    }

    pub fn add(&mut self, shape: Shape, name: Option<String>) -> GObjectId {
        let id = self.next_id;
        self.next_id += 1;
        self.objects.push(GObject { id, name, shape });
        id
    }

    /// Re-insert a previously removed object, keeping its id.
    pub fn insert(&mut self, object: GObject) {
        self.next_id = self.next_id.max(object.id + 1);
        self.objects.push(object);
    }

    pub fn remove(&mut self, id: GObjectId) -> Option<GObject> {
        let at = self.objects.iter().position(|o| o.id == id)?;
        Some(self.objects.remove(at))
    }

    pub fn get(&self, id: GObjectId) -> Option<&GObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn get_mut(&mut self, id: GObjectId) -> Option<&mut GObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GObject> {
        self.objects.iter()
    }

    /// Topmost object within `tolerance` of the point.
    pub fn object_at(&self, pt: Point, tolerance: Coord) -> Option<&GObject> {
        self.objects.iter().rev().find(|o| o.hit(pt, tolerance))
    }

    pub fn bounding_box(&self) -> Box2D {
        self.objects
            .iter()
            .fold(Box2D::empty(), |b, o| b.merge_box(o.bounding_box()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_get_remove() {
        let mut layer = CanvasLayer::new();
        let a = layer.add(Shape::circle(Point::new(0, 0), 5), Some("a".into()));
        let b = layer.add(Shape::segment(Point::new(10, 0), Point::new(20, 0)), None);
        assert_ne!(a, b);
        assert_eq!(layer.len(), 2);
        assert_eq!(layer.get(a).unwrap().name.as_deref(), Some("a"));

        let removed = layer.remove(a).unwrap();
        assert_eq!(removed.id, a);
        assert_eq!(layer.len(), 1);
        assert!(layer.get(a).is_none());

        // Re-inserting keeps the id and fresh ids stay unique.
        layer.insert(removed);
        let c = layer.add(Shape::circle(Point::new(50, 50), 1), None);
        assert!(c > b && c > a);
    }

    #[test]
    fn hit_testing_prefers_topmost() {
        let mut layer = CanvasLayer::new();
        let below = layer.add(
            Shape::polygon([
                Point::new(0, 0),
                Point::new(10, 0),
                Point::new(10, 10),
                Point::new(0, 10),
            ]),
            None,
        );
        let above = layer.add(Shape::circle(Point::new(5, 5), 2), None);

        assert_eq!(layer.object_at(Point::new(5, 5), 0).unwrap().id, above);
        assert_eq!(layer.object_at(Point::new(1, 1), 0).unwrap().id, below);
        assert!(layer.object_at(Point::new(50, 50), 0).is_none());
        // Tolerance picks up a nearby miss.
        assert!(layer.object_at(Point::new(12, 5), 2).is_some());
    }

    #[test]
    fn layer_bounding_box() {
        let mut layer = CanvasLayer::new();
        layer.add(Shape::circle(Point::new(0, 0), 5), None);
        layer.add(Shape::segment(Point::new(10, 10), Point::new(20, 30)), None);
        let b = layer.bounding_box();
        assert_eq!(b.lb, Point::new(-5, -5));
        assert_eq!(b.rt, Point::new(20, 30));
    }
}
