//! Easel: a scriptable canvas viewer prototype.
//!
//! Embedding API over the whole stack: reader → lowering → VM, with the
//! canvas bindings installed.
//!
//! ```no_run
//! use easel::Runtime;
//!
//! let runtime = Runtime::new();
//! let status = runtime.eval_source("demo", "(+ 40 2)").unwrap();
//! assert_eq!(status, 42);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use easel_canvas::Viewport;
use easel_core::EaselError;
use easel_vm::{ExecutionModule, VirtualMachine, VmObjectKind};

pub use easel_canvas::{CanvasLayer, GObject};
pub use easel_core::{EaselError as Error, Expr, ModuleAst};
pub use easel_geom::{Point, Shape};
pub use easel_reader::read_module;
pub use easel_vm::{disassemble, lower_module, read_module as read_module_bytes, write_module};

/// Compile source text into an execution module.
pub fn compile_source(name: &str, source: &str) -> Result<ExecutionModule, EaselError> {
    let ast = easel_reader::read_module(name, source)?;
    easel_vm::lower_module(&ast)
}

/// Generic host builtins every Easel VM carries: array construction and
/// access (the instruction set only creates empty containers) and
/// `print`.
pub fn install_builtins(vm: &mut VirtualMachine) {
    vm.bind_host_function("array", |heap, frame| {
        let array = heap.alloc_array();
        frame.push(array);
        Ok(1)
    });

    vm.bind_host_function("array_push", |_, frame| {
        let [array, value] = two_args(frame)?;
        match &array.kind {
            VmObjectKind::Array(items) => items.borrow_mut().push(value),
            _ => return Err(EaselError::type_error("array", array.kind_name())),
        }
        frame.push(array);
        Ok(1)
    });

    vm.bind_host_function("array_get", |_, frame| {
        let [array, index] = two_args(frame)?;
        let idx = index
            .as_integer()
            .ok_or_else(|| EaselError::type_error("integer", index.kind_name()))?;
        let item = match &array.kind {
            VmObjectKind::Array(items) => usize::try_from(idx)
                .ok()
                .and_then(|i| items.borrow().get(i).cloned()),
            _ => return Err(EaselError::type_error("array", array.kind_name())),
        }
        .ok_or_else(|| EaselError::vm_panic(format!("array index {idx} out of range")))?;
        frame.push(item);
        Ok(1)
    });

    vm.bind_host_function("array_len", |heap, frame| {
        let array = frame.top_n(1)?.pop().unwrap();
        let len = match &array.kind {
            VmObjectKind::Array(items) => items.borrow().len() as i64,
            _ => return Err(EaselError::type_error("array", array.kind_name())),
        };
        let obj = heap.alloc_integer(len);
        frame.push(obj);
        Ok(1)
    });

    vm.bind_host_function("object", |heap, frame| {
        let map = heap.alloc_map();
        frame.push(map);
        Ok(1)
    });

    vm.bind_host_function("object_set", |_, frame| {
        let values = frame.top_n(3)?;
        let (map, key, value) = (&values[0], &values[1], &values[2]);
        let key = key
            .as_str()
            .ok_or_else(|| EaselError::type_error("string key", key.kind_name()))?
            .to_owned();
        match &map.kind {
            VmObjectKind::Map(entries) => {
                entries.borrow_mut().insert(key, value.clone());
            }
            _ => return Err(EaselError::type_error("map", map.kind_name())),
        }
        let map = map.clone();
        frame.push(map);
        Ok(1)
    });

    vm.bind_host_function("object_get", |_, frame| {
        let [map, key] = two_args(frame)?;
        let key = key
            .as_str()
            .ok_or_else(|| EaselError::type_error("string key", key.kind_name()))?;
        let value = match &map.kind {
            VmObjectKind::Map(entries) => entries.borrow().get(key).cloned(),
            _ => return Err(EaselError::type_error("map", map.kind_name())),
        }
        .ok_or_else(|| EaselError::unbound(key))?;
        frame.push(value);
        Ok(1)
    });

    vm.bind_host_function("print", |heap, frame| {
        let value = frame.top_n(1)?.pop().unwrap();
        println!("{value}");
        let null = heap.null();
        frame.push(null);
        Ok(1)
    });
}

fn two_args(frame: &easel_vm::Frame) -> Result<[easel_vm::VmRef; 2], EaselError> {
    let mut values = frame.top_n(2)?;
    let b = values.pop().unwrap();
    let a = values.pop().unwrap();
    Ok([a, b])
}

/// A ready-to-use runtime: one shared viewport, one VM per evaluation
/// (the VM's life cycle is single-shot).
pub struct Runtime {
    viewport: Rc<RefCell<Viewport>>,
}

impl Runtime {
    pub fn new() -> Self {
        Runtime {
            viewport: Rc::new(RefCell::new(Viewport::new())),
        }
    }

    pub fn viewport(&self) -> Rc<RefCell<Viewport>> {
        self.viewport.clone()
    }

    fn fresh_vm(&self) -> VirtualMachine {
        let mut vm = VirtualMachine::new();
        install_builtins(&mut vm);
        easel_canvas::install_bindings(&self.viewport, &mut vm);
        vm
    }

    /// Parse, lower and execute source text; returns the exit status.
    pub fn eval_source(&self, name: &str, source: &str) -> Result<i64, EaselError> {
        let module = compile_source(name, source)?;
        self.eval_module(module)
    }

    /// Execute an already-compiled module against the shared canvas.
    pub fn eval_module(&self, module: ExecutionModule) -> Result<i64, EaselError> {
        self.fresh_vm().execute_module(module)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Runtime::new()
    }
}
