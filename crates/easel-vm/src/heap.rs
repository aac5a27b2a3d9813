//! Heap registry: object allocation, the per-VM singletons, and the
//! sweep half of the collector.

use std::cell::RefCell;
use std::rc::Rc;

use hashbrown::HashMap;

use crate::module::ExecutionModule;
use crate::object::{
    FunctionObject, HostFn, HostFunction, ModuleObject, ObjectId, UserFunction, VmObject,
    VmObjectKind, VmRef,
};

/// Owns every allocated object by id. Null, True and False are per-VM
/// singletons kept outside the sweepable registry.
pub struct Heap {
    next_id: ObjectId,
    generation: u64,
    objects: HashMap<ObjectId, VmRef>,
    null_value: VmRef,
    true_value: VmRef,
    false_value: VmRef,
}

impl Heap {
    pub fn new() -> Self {
        let mut next_id: ObjectId = 1;
        let mut singleton = |kind| {
            let id = next_id;
            next_id += 1;
            Rc::new(VmObject::new(id, kind))
        };
        let null_value = singleton(VmObjectKind::Null);
        let true_value = singleton(VmObjectKind::Boolean(true));
        let false_value = singleton(VmObjectKind::Boolean(false));
        Heap {
            next_id,
            generation: 0,
            objects: HashMap::new(),
            null_value,
            true_value,
            false_value,
        }
    }

    fn register(&mut self, kind: VmObjectKind) -> VmRef {
        let id = self.next_id;
        self.next_id += 1;
        let obj = Rc::new(VmObject::new(id, kind));
        self.objects.insert(id, obj.clone());
        obj
    }

    pub fn null(&self) -> VmRef {
        self.null_value.clone()
    }

    pub fn bool_value(&self, b: bool) -> VmRef {
        if b {
            self.true_value.clone()
        } else {
            self.false_value.clone()
        }
    }

    pub fn alloc_integer(&mut self, v: i64) -> VmRef {
        self.register(VmObjectKind::Integer(v))
    }

    pub fn alloc_float(&mut self, v: f64) -> VmRef {
        self.register(VmObjectKind::Float(v))
    }

    pub fn alloc_string(&mut self, v: impl Into<String>) -> VmRef {
        self.register(VmObjectKind::Str(v.into()))
    }

    pub fn alloc_array(&mut self) -> VmRef {
        self.register(VmObjectKind::Array(RefCell::new(Vec::new())))
    }

    pub fn alloc_map(&mut self) -> VmRef {
        self.register(VmObjectKind::Map(RefCell::new(HashMap::new())))
    }

    pub fn alloc_user_function(&mut self, func: UserFunction) -> VmRef {
        self.register(VmObjectKind::Function(FunctionObject::User(func)))
    }

    pub fn alloc_host_function(&mut self, name: impl Into<String>, hook: HostFn) -> VmRef {
        self.register(VmObjectKind::Function(FunctionObject::Host(HostFunction {
            name: name.into(),
            hook,
        })))
    }

    /// Allocate the module object and one user function per entry in its
    /// function table. The functions back-reference the module by id.
    pub fn alloc_module(&mut self, exec: Rc<ExecutionModule>) -> VmRef {
        let initializer = exec.initializer;
        let module = self.register(VmObjectKind::Module(ModuleObject {
            exec: exec.clone(),
            vars: RefCell::new(HashMap::new()),
            functions: RefCell::new(Vec::new()),
            initializer,
        }));
        let module_id = module.id();
        let functions: Vec<VmRef> = exec
            .functions
            .iter()
            .map(|info| {
                self.alloc_user_function(UserFunction {
                    module: module_id,
                    base: info.begin,
                    len: info.len,
                    variadic: info.variadic,
                    captured: Vec::new(),
                })
            })
            .collect();
        if let VmObjectKind::Module(m) = &module.kind {
            *m.functions.borrow_mut() = functions;
        }
        module
    }

    pub fn get(&self, id: ObjectId) -> Option<VmRef> {
        self.objects.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a collection cycle: the bumped generation is the new "live"
    /// stamp that marking will apply.
    pub fn bump_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Drop every object whose stamp lags the current generation.
    /// Returns the number of objects freed.
    pub fn sweep(&mut self) -> usize {
        let live = self.generation;
        let before = self.objects.len();
        self.objects
            .retain(|_, obj| obj.generation() == live);
        before - self.objects.len()
    }
}

impl Default for Heap {
    fn default() -> Self {
        Heap::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_monotonic() {
        let mut heap = Heap::new();
        let a = heap.alloc_integer(1);
        let b = heap.alloc_integer(1);
        assert!(b.id() > a.id());
        assert!(a.id() > heap.bool_value(false).id());
    }

    #[test]
    fn sweep_frees_unmarked_objects() {
        let mut heap = Heap::new();
        let keep = heap.alloc_integer(1);
        let _drop = heap.alloc_integer(2);
        assert_eq!(heap.len(), 2);

        let gen = heap.bump_generation();
        keep.mark(gen);
        assert_eq!(heap.sweep(), 1);
        assert_eq!(heap.len(), 1);
        assert!(heap.get(keep.id()).is_some());
    }

    #[test]
    fn singletons_survive_sweep_unmarked() {
        let mut heap = Heap::new();
        heap.bump_generation();
        heap.sweep();
        assert!(!heap.null().truthy());
        assert!(heap.bool_value(true).truthy());
    }

    #[test]
    fn module_functions_back_reference_module() {
        use crate::module::FunctionInfo;

        let mut exec = ExecutionModule::new("m");
        exec.functions.push(FunctionInfo {
            name: "f".into(),
            begin: 0,
            len: 1,
            variadic: true,
        });
        let mut heap = Heap::new();
        let module = heap.alloc_module(Rc::new(exec));
        let m = module.as_module().unwrap();
        let funcs = m.functions.borrow();
        assert_eq!(funcs.len(), 1);
        match funcs[0].as_function().unwrap() {
            FunctionObject::User(u) => {
                assert_eq!(u.module, module.id());
                assert!(u.variadic);
                assert!(u.captured.is_empty());
            }
            FunctionObject::Host(_) => panic!("expected user function"),
        }
    }
}
