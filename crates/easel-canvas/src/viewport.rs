//! The viewport: a layer plus its commit log, and the host-function
//! bindings that let VM scripts drive both.

use std::cell::RefCell;
use std::rc::Rc;

use easel_core::EaselError;
use easel_geom::{distance, Coord, Point, Shape};
use easel_vm::{Frame, VirtualMachine, VmObjectKind, VmRef};

use crate::command::{AddObject, CommitLog, RemoveObject, Translate, ViewportCommand};
use crate::gobject::GObjectId;
use crate::layer::CanvasLayer;

pub struct Viewport {
    pub layer: CanvasLayer,
    pub commits: CommitLog,
}

impl Viewport {
    pub fn new() -> Self {
        Viewport {
            layer: CanvasLayer::new(),
            commits: CommitLog::new(),
        }
    }

    /// Add a shape through the commit log; returns the assigned id.
    pub fn add_shape(
        &mut self,
        shape: Shape,
        name: Option<String>,
    ) -> Result<GObjectId, EaselError> {
        let mut command = AddObject::new(shape, name);
        command.apply(&mut self.layer)?;
        let id = command
            .id()
            .ok_or_else(|| EaselError::io("AddObject applied without an id"))?;
        self.commits.push_applied(Box::new(command));
        Ok(id)
    }

    pub fn remove_object(&mut self, id: GObjectId) -> Result<(), EaselError> {
        self.commits
            .commit(Box::new(RemoveObject::new(id)), &mut self.layer)
    }

    pub fn translate_object(
        &mut self,
        id: GObjectId,
        dx: Coord,
        dy: Coord,
    ) -> Result<(), EaselError> {
        self.commits
            .commit(Box::new(Translate::new(id, dx, dy)), &mut self.layer)
    }

    pub fn undo(&mut self) -> Result<bool, EaselError> {
        self.commits.undo(&mut self.layer)
    }

    pub fn redo(&mut self) -> Result<bool, EaselError> {
        self.commits.redo(&mut self.layer)
    }

    pub fn distance_between(&self, a: GObjectId, b: GObjectId) -> Result<Coord, EaselError> {
        let sa = &self
            .layer
            .get(a)
            .ok_or_else(|| EaselError::io(format!("object {a} is gone")))?
            .shape;
        let sb = &self
            .layer
            .get(b)
            .ok_or_else(|| EaselError::io(format!("object {b} is gone")))?
            .shape;
        Ok(distance(sa, sb).0)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport::new()
    }
}

// ── Script bindings ───────────────────────────────────────────────

fn coord(v: i64) -> Result<Coord, EaselError> {
    Coord::try_from(v).map_err(|_| EaselError::vm_panic(format!("coordinate {v} out of range")))
}

/// The top `N` stack values as integers, in argument order.
fn int_args<const N: usize>(frame: &Frame) -> Result<[i64; N], EaselError> {
    let values = frame.top_n(N)?;
    let mut out = [0i64; N];
    for (i, v) in values.iter().enumerate() {
        out[i] = v
            .as_integer()
            .ok_or_else(|| EaselError::type_error("integer", v.kind_name()))?;
    }
    Ok(out)
}

fn flat_points(array: &VmRef) -> Result<Vec<Point>, EaselError> {
    let items = match &array.kind {
        VmObjectKind::Array(items) => items.borrow().clone(),
        _ => return Err(EaselError::type_error("array", array.kind_name())),
    };
    if items.len() % 2 != 0 {
        return Err(EaselError::vm_panic(
            "point list needs an even number of coordinates",
        ));
    }
    items
        .chunks(2)
        .map(|pair| {
            let x = pair[0]
                .as_integer()
                .ok_or_else(|| EaselError::type_error("integer", pair[0].kind_name()))?;
            let y = pair[1]
                .as_integer()
                .ok_or_else(|| EaselError::type_error("integer", pair[1].kind_name()))?;
            Ok(Point::new(coord(x)?, coord(y)?))
        })
        .collect()
}

/// Bind the `canvas_*` host functions over a shared viewport. Each one
/// follows the host convention: arguments on the stack top, one value
/// pushed back.
pub fn install_bindings(viewport: &Rc<RefCell<Viewport>>, vm: &mut VirtualMachine) {
    let vp = viewport.clone();
    vm.bind_host_function("canvas_segment", move |heap, frame| {
        let [x1, y1, x2, y2] = int_args::<4>(frame)?;
        let shape = Shape::segment(
            Point::new(coord(x1)?, coord(y1)?),
            Point::new(coord(x2)?, coord(y2)?),
        );
        let id = vp.borrow_mut().add_shape(shape, None)?;
        let obj = heap.alloc_integer(id as i64);
        frame.push(obj);
        Ok(1)
    });

    let vp = viewport.clone();
    vm.bind_host_function("canvas_circle", move |heap, frame| {
        let [cx, cy, r] = int_args::<3>(frame)?;
        let shape = Shape::circle(Point::new(coord(cx)?, coord(cy)?), coord(r)?);
        let id = vp.borrow_mut().add_shape(shape, None)?;
        let obj = heap.alloc_integer(id as i64);
        frame.push(obj);
        Ok(1)
    });

    let vp = viewport.clone();
    vm.bind_host_function("canvas_arc", move |heap, frame| {
        let [x1, y1, x2, y2, r, ccw] = int_args::<6>(frame)?;
        let shape = Shape::arc(
            Point::new(coord(x1)?, coord(y1)?),
            Point::new(coord(x2)?, coord(y2)?),
            coord(r)?,
            ccw != 0,
        )
        .ok_or_else(|| EaselError::vm_panic("arc chord does not fit the radius"))?;
        let id = vp.borrow_mut().add_shape(shape, None)?;
        let obj = heap.alloc_integer(id as i64);
        frame.push(obj);
        Ok(1)
    });

    let vp = viewport.clone();
    vm.bind_host_function("canvas_polygon", move |heap, frame| {
        let array = frame.top_n(1)?.pop().unwrap();
        let points = flat_points(&array)?;
        if points.len() < 3 {
            return Err(EaselError::vm_panic("polygon needs at least 3 points"));
        }
        let id = vp.borrow_mut().add_shape(Shape::polygon(points), None)?;
        let obj = heap.alloc_integer(id as i64);
        frame.push(obj);
        Ok(1)
    });

    let vp = viewport.clone();
    vm.bind_host_function("canvas_remove", move |heap, frame| {
        let [id] = int_args::<1>(frame)?;
        vp.borrow_mut().remove_object(id as GObjectId)?;
        let t = heap.bool_value(true);
        frame.push(t);
        Ok(1)
    });

    let vp = viewport.clone();
    vm.bind_host_function("canvas_move", move |heap, frame| {
        let [id, dx, dy] = int_args::<3>(frame)?;
        vp.borrow_mut()
            .translate_object(id as GObjectId, coord(dx)?, coord(dy)?)?;
        let t = heap.bool_value(true);
        frame.push(t);
        Ok(1)
    });

    let vp = viewport.clone();
    vm.bind_host_function("canvas_distance", move |heap, frame| {
        let [a, b] = int_args::<2>(frame)?;
        let d = vp
            .borrow()
            .distance_between(a as GObjectId, b as GObjectId)?;
        let obj = heap.alloc_integer(d as i64);
        frame.push(obj);
        Ok(1)
    });

    let vp = viewport.clone();
    vm.bind_host_function("canvas_inside", move |heap, frame| {
        let [id, x, y] = int_args::<3>(frame)?;
        let vp = vp.borrow();
        let object = vp
            .layer
            .get(id as GObjectId)
            .ok_or_else(|| EaselError::vm_panic(format!("object {id} is gone")))?;
        let hit = object.distance_to(Point::new(coord(x)?, coord(y)?)) == 0;
        let obj = heap.bool_value(hit);
        frame.push(obj);
        Ok(1)
    });

    let vp = viewport.clone();
    vm.bind_host_function("canvas_object_at", move |heap, frame| {
        let [x, y, tolerance] = int_args::<3>(frame)?;
        let vp = vp.borrow();
        let found = vp
            .layer
            .object_at(Point::new(coord(x)?, coord(y)?), coord(tolerance)?);
        let obj = match found {
            Some(o) => heap.alloc_integer(o.id as i64),
            None => heap.null(),
        };
        frame.push(obj);
        Ok(1)
    });

    let vp = viewport.clone();
    vm.bind_host_function("canvas_count", move |heap, frame| {
        let n = vp.borrow().layer.len() as i64;
        let obj = heap.alloc_integer(n);
        frame.push(obj);
        Ok(1)
    });

    let vp = viewport.clone();
    vm.bind_host_function("canvas_undo", move |heap, frame| {
        let undone = vp.borrow_mut().undo()?;
        let obj = heap.bool_value(undone);
        frame.push(obj);
        Ok(1)
    });

    let vp = viewport.clone();
    vm.bind_host_function("canvas_redo", move |heap, frame| {
        let redone = vp.borrow_mut().redo()?;
        let obj = heap.bool_value(redone);
        frame.push(obj);
        Ok(1)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use easel_reader::read_module;
    use easel_vm::lower_module;

    fn run_script(source: &str) -> (i64, Rc<RefCell<Viewport>>) {
        let ast = read_module("script", source).unwrap();
        let module = lower_module(&ast).unwrap();
        let viewport = Rc::new(RefCell::new(Viewport::new()));
        let mut vm = VirtualMachine::new();
        install_bindings(&viewport, &mut vm);
        let status = vm.execute_module(module).expect("script panicked");
        (status, viewport)
    }

    #[test]
    fn script_draws_and_measures() {
        let (status, viewport) = run_script(
            "(let a (canvas_circle 0 0 3))\n\
             (let b (canvas_circle 10 0 2))\n\
             (canvas_distance a b)",
        );
        assert_eq!(status, 5);
        assert_eq!(viewport.borrow().layer.len(), 2);
    }

    #[test]
    fn script_segment_arc_and_hit_test() {
        let (status, viewport) = run_script(
            "(canvas_segment 0 0 10 0)\n\
             (let arc (canvas_arc 5 0 0 5 5 1))\n\
             (canvas_inside arc 5 0)",
        );
        // (5,0) is the arc's own from-endpoint.
        assert_eq!(status, 0); // booleans are not an Integer exit status
        let vp = viewport.borrow();
        assert_eq!(vp.layer.len(), 2);
        assert!(vp.layer.object_at(Point::new(5, 0), 0).is_some());
    }

    #[test]
    fn script_undo_redo_through_commits() {
        let (_, viewport) = run_script(
            "(canvas_circle 0 0 5)\n\
             (canvas_circle 20 0 5)\n\
             (canvas_undo)",
        );
        let vp = viewport.borrow();
        assert_eq!(vp.layer.len(), 1);
        assert_eq!(vp.commits.len(), 2);
    }

    #[test]
    fn script_move_then_measure() {
        let (status, viewport) = run_script(
            "(let a (canvas_circle 0 0 2))\n\
             (let b (canvas_circle 20 0 3))\n\
             (canvas_move b 0 (- 15))\n\
             (canvas_distance a b)",
        );
        // b's center moves to (20,-15), 25 away from a's center.
        assert_eq!(status, 20);
        assert_eq!(viewport.borrow().layer.len(), 2);
        // Undo restores the original distance.
        let mut vp = viewport.borrow_mut();
        vp.undo().unwrap();
        assert_eq!(vp.distance_between(1, 2).unwrap(), 15);
    }
}
