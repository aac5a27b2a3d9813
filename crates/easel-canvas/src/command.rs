//! Command-pattern edits over a canvas layer, with a commit log driving
//! undo and redo.

use easel_core::EaselError;
use easel_geom::{Coord, Point, PolyNode, Shape};

use crate::gobject::{GObject, GObjectId};
use crate::layer::CanvasLayer;

pub trait ViewportCommand {
    fn apply(&mut self, layer: &mut CanvasLayer) -> Result<(), EaselError>;
    fn revert(&mut self, layer: &mut CanvasLayer) -> Result<(), EaselError>;
    fn describe(&self) -> String;
}

/// Place a shape on the layer. Remembers the assigned id so a revert
/// removes exactly what was added.
pub struct AddObject {
    shape: Shape,
    name: Option<String>,
    id: Option<GObjectId>,
}

impl AddObject {
    pub fn new(shape: Shape, name: Option<String>) -> Self {
        AddObject {
            shape,
            name,
            id: None,
        }
    }

    pub fn id(&self) -> Option<GObjectId> {
        self.id
    }
}

impl ViewportCommand for AddObject {
    fn apply(&mut self, layer: &mut CanvasLayer) -> Result<(), EaselError> {
        match self.id {
            // Redo after an undo restores the object under its old id.
            Some(id) => {
                layer.insert(GObject {
                    id,
                    name: self.name.clone(),
                    shape: self.shape.clone(),
                });
            }
            None => {
                self.id = Some(layer.add(self.shape.clone(), self.name.clone()));
            }
        }
        Ok(())
    }

    fn revert(&mut self, layer: &mut CanvasLayer) -> Result<(), EaselError> {
        let id = self
            .id
            .ok_or_else(|| EaselError::io("revert of an AddObject that never applied"))?;
        layer
            .remove(id)
            .ok_or_else(|| EaselError::io(format!("object {id} is gone")))?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("add {}", self.shape.kind_name())
    }
}

/// Remove an object, keeping it around for revert.
pub struct RemoveObject {
    id: GObjectId,
    removed: Option<GObject>,
}

impl RemoveObject {
    pub fn new(id: GObjectId) -> Self {
        RemoveObject { id, removed: None }
    }
}

impl ViewportCommand for RemoveObject {
    fn apply(&mut self, layer: &mut CanvasLayer) -> Result<(), EaselError> {
        self.removed = Some(
            layer
                .remove(self.id)
                .ok_or_else(|| EaselError::io(format!("object {} is gone", self.id)))?,
        );
        Ok(())
    }

    fn revert(&mut self, layer: &mut CanvasLayer) -> Result<(), EaselError> {
        let object = self
            .removed
            .take()
            .ok_or_else(|| EaselError::io("revert of a RemoveObject that never applied"))?;
        layer.insert(object);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("remove #{}", self.id)
    }
}

/// Shift an object by a grid vector.
pub struct Translate {
    id: GObjectId,
    dx: Coord,
    dy: Coord,
}

impl Translate {
    pub fn new(id: GObjectId, dx: Coord, dy: Coord) -> Self {
        Translate { id, dx, dy }
    }

    fn shift(&self, layer: &mut CanvasLayer, dx: Coord, dy: Coord) -> Result<(), EaselError> {
        let object = layer
            .get_mut(self.id)
            .ok_or_else(|| EaselError::io(format!("object {} is gone", self.id)))?;
        let d = Point::new(dx, dy);
        object.shape = translate_shape(&object.shape, d);
        Ok(())
    }
}

impl ViewportCommand for Translate {
    fn apply(&mut self, layer: &mut CanvasLayer) -> Result<(), EaselError> {
        self.shift(layer, self.dx, self.dy)
    }

    fn revert(&mut self, layer: &mut CanvasLayer) -> Result<(), EaselError> {
        self.shift(layer, -self.dx, -self.dy)
    }

    fn describe(&self) -> String {
        format!("move #{} by ({}, {})", self.id, self.dx, self.dy)
    }
}

fn translate_shape(shape: &Shape, d: Point) -> Shape {
    match shape {
        Shape::Segment(s) => Shape::segment(s.a + d, s.b + d),
        Shape::Arc(s) => Shape::Arc(easel_geom::ArcSegment::new(
            s.center + d,
            s.from + d,
            s.to + d,
            s.radius,
            s.range.ccw,
        )),
        Shape::Circle(s) => Shape::circle(s.center + d, s.radius),
        Shape::Polygon(s) => Shape::polygon(s.points.iter().map(|&p| p + d)),
        Shape::Complex(s) => Shape::complex_polygon(s.nodes.iter().map(|n| match *n {
            PolyNode::Corner(p) => PolyNode::Corner(p + d),
            PolyNode::Arc { point, radius, ccw } => PolyNode::Arc {
                point: point + d,
                radius,
                ccw,
            },
        })),
    }
}

/// Applied commands with an undo/redo cursor. Committing while undone
/// history exists discards the redo tail.
#[derive(Default)]
pub struct CommitLog {
    commands: Vec<Box<dyn ViewportCommand>>,
    cursor: usize,
}

impl CommitLog {
    pub fn new() -> Self {
        CommitLog::default()
    }

    pub fn commit(
        &mut self,
        mut command: Box<dyn ViewportCommand>,
        layer: &mut CanvasLayer,
    ) -> Result<(), EaselError> {
        command.apply(layer)?;
        self.push_applied(command);
        Ok(())
    }

    /// Record a command that the caller already applied (used when the
    /// caller needs state off the command, like an assigned id).
    pub fn push_applied(&mut self, command: Box<dyn ViewportCommand>) {
        self.commands.truncate(self.cursor);
        self.commands.push(command);
        self.cursor += 1;
    }

    pub fn undo(&mut self, layer: &mut CanvasLayer) -> Result<bool, EaselError> {
        if self.cursor == 0 {
            return Ok(false);
        }
        self.cursor -= 1;
        self.commands[self.cursor].revert(layer)?;
        Ok(true)
    }

    pub fn redo(&mut self, layer: &mut CanvasLayer) -> Result<bool, EaselError> {
        if self.cursor == self.commands.len() {
            return Ok(false);
        }
        self.commands[self.cursor].apply(layer)?;
        self.cursor += 1;
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn history(&self) -> Vec<String> {
        self.commands.iter().map(|c| c.describe()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_undo_redo_cycle() {
        let mut layer = CanvasLayer::new();
        let mut log = CommitLog::new();
        log.commit(
            Box::new(AddObject::new(Shape::circle(Point::new(0, 0), 5), None)),
            &mut layer,
        )
        .unwrap();
        assert_eq!(layer.len(), 1);

        assert!(log.undo(&mut layer).unwrap());
        assert_eq!(layer.len(), 0);
        assert!(!log.undo(&mut layer).unwrap());

        assert!(log.redo(&mut layer).unwrap());
        assert_eq!(layer.len(), 1);
        assert!(!log.redo(&mut layer).unwrap());
    }

    #[test]
    fn commit_discards_redo_tail() {
        let mut layer = CanvasLayer::new();
        let mut log = CommitLog::new();
        log.commit(
            Box::new(AddObject::new(Shape::circle(Point::new(0, 0), 1), None)),
            &mut layer,
        )
        .unwrap();
        log.commit(
            Box::new(AddObject::new(Shape::circle(Point::new(9, 9), 1), None)),
            &mut layer,
        )
        .unwrap();
        log.undo(&mut layer).unwrap();
        assert_eq!(layer.len(), 1);

        log.commit(
            Box::new(AddObject::new(Shape::circle(Point::new(5, 5), 1), None)),
            &mut layer,
        )
        .unwrap();
        assert_eq!(log.len(), 2);
        assert!(!log.redo(&mut layer).unwrap());
    }

    #[test]
    fn remove_and_translate_revert_exactly() {
        let mut layer = CanvasLayer::new();
        let mut log = CommitLog::new();
        let id = layer.add(Shape::segment(Point::new(0, 0), Point::new(10, 0)), None);

        log.commit(Box::new(Translate::new(id, 3, 4)), &mut layer)
            .unwrap();
        assert_eq!(
            layer.get(id).unwrap().shape,
            Shape::segment(Point::new(3, 4), Point::new(13, 4))
        );

        log.commit(Box::new(RemoveObject::new(id)), &mut layer)
            .unwrap();
        assert!(layer.get(id).is_none());

        log.undo(&mut layer).unwrap(); // un-remove
        assert!(layer.get(id).is_some());
        log.undo(&mut layer).unwrap(); // un-translate
        assert_eq!(
            layer.get(id).unwrap().shape,
            Shape::segment(Point::new(0, 0), Point::new(10, 0))
        );
    }
}
