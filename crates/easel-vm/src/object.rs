//! The heap value model.
//!
//! Every VM value is a heap object with a stable identity and a
//! generation stamp; references are `Rc` clones into the heap registry.
//! The kind set is closed (one match arm per operator in the VM dispatch
//! table), so it is a plain enum rather than open inheritance.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use easel_core::EaselError;
use hashbrown::HashMap;

use crate::heap::Heap;
use crate::module::ExecutionModule;

/// Monotonically increasing object identity, unique per VM lifetime.
pub type ObjectId = u64;

/// A shared reference to a heap object.
pub type VmRef = Rc<VmObject>;

/// A host-function hook: reads its arguments off the top of the caller's
/// stack and leaves its single return value there. Returns the number of
/// values it pushed.
pub type HostFn = Rc<dyn Fn(&mut Heap, &mut crate::frame::Frame) -> Result<usize, EaselError>>;

/// A user bytecode function, possibly a closure.
pub struct UserFunction {
    /// Non-owning back-reference to the owning module (the module owns
    /// the function, not vice versa).
    pub module: ObjectId,
    pub base: usize,
    pub len: usize,
    pub variadic: bool,
    /// Captured values, populated at closure creation, immutable after.
    pub captured: Vec<VmRef>,
}

pub struct HostFunction {
    pub name: String,
    pub hook: HostFn,
}

pub enum FunctionObject {
    User(UserFunction),
    Host(HostFunction),
}

impl fmt::Debug for FunctionObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionObject::User(u) => write!(
                f,
                "<fn base={} len={}{}>",
                u.base,
                u.len,
                if u.variadic { " variadic" } else { "" }
            ),
            FunctionObject::Host(h) => write!(f, "<host-fn {}>", h.name),
        }
    }
}

/// The runtime face of a loaded module: the compiled unit, module-local
/// variables, and one function object per function-table entry.
#[derive(Debug)]
pub struct ModuleObject {
    pub exec: Rc<ExecutionModule>,
    pub vars: RefCell<HashMap<String, VmRef>>,
    pub functions: RefCell<Vec<VmRef>>,
    pub initializer: Option<usize>,
}

#[derive(Debug)]
pub enum VmObjectKind {
    Integer(i64),
    Boolean(bool),
    Float(f64),
    Str(String),
    Null,
    Array(RefCell<Vec<VmRef>>),
    Map(RefCell<HashMap<String, VmRef>>),
    Function(FunctionObject),
    Module(ModuleObject),
}

#[derive(Debug)]
pub struct VmObject {
    id: ObjectId,
    gen: Cell<u64>,
    pub kind: VmObjectKind,
}

impl VmObject {
    pub fn new(id: ObjectId, kind: VmObjectKind) -> Self {
        VmObject {
            id,
            gen: Cell::new(0),
            kind,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn generation(&self) -> u64 {
        self.gen.get()
    }

    /// Stamp this object (and, for compound kinds, everything reachable
    /// from it) with the given generation. Children already carrying the
    /// stamp are skipped, so the recursion terminates on cycles and the
    /// walk is idempotent within one collection.
    pub fn mark(&self, gen: u64) {
        if self.gen.get() == gen {
            return;
        }
        debug_assert!(gen > self.gen.get());
        self.gen.set(gen);
        match &self.kind {
            VmObjectKind::Array(items) => {
                for o in items.borrow().iter() {
                    o.mark(gen);
                }
            }
            VmObjectKind::Map(map) => {
                for o in map.borrow().values() {
                    o.mark(gen);
                }
            }
            VmObjectKind::Function(FunctionObject::User(func)) => {
                // The module back-reference is an id; the module itself
                // is rooted through the module registry.
                for o in &func.captured {
                    o.mark(gen);
                }
            }
            VmObjectKind::Function(FunctionObject::Host(_)) => {}
            VmObjectKind::Module(module) => {
                for o in module.vars.borrow().values() {
                    o.mark(gen);
                }
                for o in module.functions.borrow().iter() {
                    o.mark(gen);
                }
            }
            _ => {}
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            VmObjectKind::Integer(_) => "integer",
            VmObjectKind::Boolean(_) => "boolean",
            VmObjectKind::Float(_) => "float",
            VmObjectKind::Str(_) => "string",
            VmObjectKind::Null => "null",
            VmObjectKind::Array(_) => "array",
            VmObjectKind::Map(_) => "map",
            VmObjectKind::Function(_) => "function",
            VmObjectKind::Module(_) => "module",
        }
    }

    /// Boolean coercion: Null, integer 0, float 0.0 and false are
    /// falsy; every other value (including empty strings and
    /// containers) is truthy.
    pub fn truthy(&self) -> bool {
        match &self.kind {
            VmObjectKind::Null => false,
            VmObjectKind::Integer(v) => *v != 0,
            VmObjectKind::Boolean(b) => *b,
            VmObjectKind::Float(f) => *f != 0.0,
            _ => true,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match &self.kind {
            VmObjectKind::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match &self.kind {
            VmObjectKind::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            VmObjectKind::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_module(&self) -> Option<&ModuleObject> {
        match &self.kind {
            VmObjectKind::Module(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionObject> {
        match &self.kind {
            VmObjectKind::Function(f) => Some(f),
            _ => None,
        }
    }
}

impl fmt::Display for VmObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn shallow(v: &VmObject) -> String {
            match &v.kind {
                VmObjectKind::Array(_) => "<array>".to_string(),
                VmObjectKind::Map(_) => "<map>".to_string(),
                VmObjectKind::Str(s) => format!("{s:?}"),
                _ => v.to_string(),
            }
        }
        match &self.kind {
            VmObjectKind::Integer(v) => write!(f, "{v}"),
            VmObjectKind::Boolean(b) => write!(f, "{b}"),
            VmObjectKind::Float(v) => write!(f, "{v}"),
            VmObjectKind::Str(s) => write!(f, "{s}"),
            VmObjectKind::Null => write!(f, "null"),
            VmObjectKind::Array(items) => {
                write!(f, "[")?;
                for (i, v) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", shallow(v))?;
                }
                write!(f, "]")
            }
            VmObjectKind::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {}", shallow(v))?;
                }
                write!(f, "}}")
            }
            VmObjectKind::Function(func) => write!(f, "{func:?}"),
            VmObjectKind::Module(m) => write!(f, "<module {}>", m.exec.name),
        }
    }
}
