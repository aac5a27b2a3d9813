//! Instruction dispatch, the main loop, and the collector.

use std::rc::Rc;

use easel_core::EaselError;
use hashbrown::HashMap;

use crate::frame::Frame;
use crate::heap::Heap;
use crate::module::{ExecutionModule, Instruction};
use crate::object::{FunctionObject, UserFunction, VmObjectKind, VmRef};
use crate::opcodes::Opcode;

/// Instructions between garbage-collection pauses.
pub const GC_INTERVAL: u64 = 10_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmStatus {
    Initialized,
    Running,
    Gc,
    Exited,
    Panic,
}

/// Host hook resolving a module name for `LOAD_MODULE`.
pub type ModuleLoader = Box<dyn Fn(&str) -> Result<ExecutionModule, EaselError>>;

/// Whether the active frame's instruction pointer should advance after
/// an instruction. `Stay` is used when a new frame was pushed: the
/// deferred advance lands on the caller when the matching return
/// executes.
enum Flow {
    Advance,
    Stay,
}

pub struct VirtualMachine {
    heap: Heap,
    status: VmStatus,
    globals: HashMap<String, VmRef>,
    modules: HashMap<String, VmRef>,
    frames: Vec<Frame>,
    loader: Option<ModuleLoader>,
    exit_status: Option<i64>,
    instructions_retired: u64,
    panic_message: Option<String>,
}

fn unsigned_operand(value: i16, what: &str) -> Result<usize, EaselError> {
    usize::try_from(value).map_err(|_| {
        EaselError::vm_panic(format!("{what} operand must be nonnegative, got {value}"))
    })
}

/// `EQUAL` semantics: different kinds are unequal; numbers and strings
/// compare by value (strings shortcut on identity); everything else,
/// including the Boolean singletons, compares by identity.
fn values_equal(a: &VmRef, b: &VmRef) -> bool {
    use VmObjectKind::*;
    match (&a.kind, &b.kind) {
        (Integer(x), Integer(y)) => x == y,
        (Float(x), Float(y)) => x == y,
        (Str(x), Str(y)) => a.id() == b.id() || x == y,
        (Boolean(_), Boolean(_))
        | (Null, Null)
        | (Array(_), Array(_))
        | (Map(_), Map(_))
        | (Function(_), Function(_))
        | (Module(_), Module(_)) => a.id() == b.id(),
        _ => false,
    }
}

impl VirtualMachine {
    /// A fresh VM in `Initialized` state with the Null/True/False
    /// singletons pre-allocated.
    pub fn new() -> Self {
        VirtualMachine {
            heap: Heap::new(),
            status: VmStatus::Initialized,
            globals: HashMap::new(),
            modules: HashMap::new(),
            frames: Vec::new(),
            loader: None,
            exit_status: None,
            instructions_retired: 0,
            panic_message: None,
        }
    }

    pub fn status(&self) -> VmStatus {
        self.status
    }

    pub fn exit_status(&self) -> Option<i64> {
        self.exit_status
    }

    pub fn panic_message(&self) -> Option<&str> {
        self.panic_message.as_deref()
    }

    pub fn instructions_retired(&self) -> u64 {
        self.instructions_retired
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    pub fn call_depth(&self) -> usize {
        self.frames.len()
    }

    pub fn set_module_loader(&mut self, loader: ModuleLoader) {
        self.loader = Some(loader);
    }

    pub fn global(&self, name: &str) -> Option<VmRef> {
        self.globals.get(name).cloned()
    }

    pub fn set_global(&mut self, name: impl Into<String>, value: VmRef) {
        self.globals.insert(name.into(), value);
    }

    pub fn module(&self, name: &str) -> Option<VmRef> {
        self.modules.get(name).cloned()
    }

    /// Bind a host function into the globals map. By convention the hook
    /// reads its arguments off the top of the caller's stack and pushes
    /// its single return value.
    pub fn bind_host_function<F>(&mut self, name: &str, hook: F)
    where
        F: Fn(&mut Heap, &mut Frame) -> Result<usize, EaselError> + 'static,
    {
        let obj = self.heap.alloc_host_function(name, Rc::new(hook));
        self.globals.insert(name.to_string(), obj);
    }

    /// Load `module` and run its initializer to completion. Returns the
    /// exit status: the last returned value when it is an Integer, 0
    /// otherwise.
    pub fn execute_module(&mut self, module: ExecutionModule) -> Result<i64, EaselError> {
        if self.status != VmStatus::Initialized {
            return Err(self.fail(EaselError::vm_panic(
                "execute_module requires a freshly initialized VM",
            )));
        }
        let (_module, initializer) = self.install_module(module)?;
        self.status = VmStatus::Running;
        match initializer {
            Some(init) => {
                let frame = self.make_frame(init, Vec::new())?;
                self.frames.push(frame);
                self.run()?;
            }
            None => self.status = VmStatus::Exited,
        }
        Ok(self.exit_status.unwrap_or(0))
    }

    fn run(&mut self) -> Result<(), EaselError> {
        while self.status == VmStatus::Running {
            if let Err(err) = self.step() {
                return Err(self.fail(err));
            }
            self.instructions_retired += 1;

            if self.instructions_retired % GC_INTERVAL == 0 && self.status == VmStatus::Running {
                self.status = VmStatus::Gc;
                self.collect_garbage();
                self.status = VmStatus::Running;
            }
        }
        Ok(())
    }

    fn fail(&mut self, err: EaselError) -> EaselError {
        self.status = VmStatus::Panic;
        self.panic_message = Some(err.to_string());
        err
    }

    fn step(&mut self) -> Result<(), EaselError> {
        let instruction = self.active_frame()?.fetch()?;
        self.execute_instruction(instruction)
    }

    fn execute_instruction(&mut self, instruction: Instruction) -> Result<(), EaselError> {
        match self.dispatch(instruction)? {
            Flow::Advance => {
                if let Some(frame) = self.frames.last_mut() {
                    frame.advance();
                }
            }
            Flow::Stay => {}
        }
        Ok(())
    }

    fn active_frame(&self) -> Result<&Frame, EaselError> {
        self.frames
            .last()
            .ok_or_else(|| EaselError::vm_panic("no active call frame"))
    }

    fn active_frame_mut(&mut self) -> Result<&mut Frame, EaselError> {
        self.frames
            .last_mut()
            .ok_or_else(|| EaselError::vm_panic("no active call frame"))
    }

    fn active_module(&self) -> Result<VmRef, EaselError> {
        let id = self.active_frame()?.module_id();
        self.heap
            .get(id)
            .ok_or_else(|| EaselError::vm_panic("active frame's module is gone"))
    }

    fn make_frame(&self, function: VmRef, args: Vec<VmRef>) -> Result<Frame, EaselError> {
        let module_id = match function.as_function() {
            Some(FunctionObject::User(u)) => u.module,
            _ => {
                return Err(EaselError::vm_panic(
                    "cannot push a frame for a non-user function",
                ))
            }
        };
        let module = self
            .heap
            .get(module_id)
            .ok_or_else(|| EaselError::vm_panic("function's module is gone"))?;
        let exec = module
            .as_module()
            .ok_or_else(|| EaselError::vm_panic("function's module id is not a module"))?
            .exec
            .clone();
        Frame::new(function, exec, args)
    }

    /// Install an execution module, creating its runtime module object
    /// and function objects. Idempotent per module name.
    fn install_module(
        &mut self,
        exec: ExecutionModule,
    ) -> Result<(VmRef, Option<VmRef>), EaselError> {
        if let Some(existing) = self.modules.get(&exec.name).cloned() {
            return Ok((existing, None));
        }
        let initializer_idx = exec.initializer;
        if let Some(idx) = initializer_idx {
            if idx >= exec.functions.len() {
                return Err(EaselError::module(format!(
                    "module '{}' initializer index {idx} out of range",
                    exec.name
                )));
            }
        }
        let exec = Rc::new(exec);
        let module = self.heap.alloc_module(exec.clone());
        self.modules.insert(exec.name.clone(), module.clone());
        let initializer = initializer_idx.and_then(|idx| {
            module
                .as_module()
                .and_then(|m| m.functions.borrow().get(idx).cloned())
        });
        Ok((module, initializer))
    }

    /// Mark from all roots, then sweep objects whose stamp lags. Returns
    /// the number of objects freed.
    pub fn collect_garbage(&mut self) -> usize {
        let gen = self.heap.bump_generation();
        for value in self.globals.values() {
            value.mark(gen);
        }
        for module in self.modules.values() {
            module.mark(gen);
        }
        for frame in &self.frames {
            frame.mark(gen);
        }
        self.heap.sweep()
    }

    fn dispatch(&mut self, instruction: Instruction) -> Result<Flow, EaselError> {
        let Instruction {
            opcode,
            operand1,
            operand2,
        } = instruction;

        match opcode {
            Opcode::Nop | Opcode::BeginFunction | Opcode::EndFunction => {}

            Opcode::PopN => {
                let n = unsigned_operand(operand1, "POPN")?;
                self.active_frame_mut()?.pop_n(n)?;
            }

            Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Div
            | Opcode::Mod
            | Opcode::Equal
            | Opcode::Inequal
            | Opcode::Greater
            | Opcode::Less
            | Opcode::GreaterEq
            | Opcode::LessEq
            | Opcode::LogicalAnd
            | Opcode::LogicalOr => {
                let (a, b) = {
                    let frame = self.active_frame()?;
                    (frame.get(operand1)?, frame.get(operand2)?)
                };
                let result = self.binary_operator(opcode, &a, &b)?;
                self.active_frame_mut()?.push(result);
            }

            Opcode::Call => return self.op_call(operand1, operand2),

            Opcode::CallModuleFunc => {
                let module = self.active_module()?;
                let func = module
                    .as_module()
                    .and_then(|m| {
                        let idx = usize::try_from(operand1).ok()?;
                        m.functions.borrow().get(idx).cloned()
                    })
                    .ok_or_else(|| {
                        EaselError::vm_panic(format!(
                            "module function index {operand1} out of range"
                        ))
                    })?;
                // Seat the function beneath its n arguments so they stay
                // the top n values `CALL` reads.
                let n = unsigned_operand(operand2, "CALL_MODULEFUNC")?;
                let frame = self.active_frame_mut()?;
                let at = frame.insert_below_top(n, func)?;
                let idx = i16::try_from(at)
                    .map_err(|_| EaselError::vm_panic("stack too deep for CALL_MODULEFUNC"))?;
                return self.dispatch(Instruction::new(Opcode::Call, idx, operand2));
            }

            Opcode::Dup => self.active_frame_mut()?.dup(operand1)?,

            Opcode::Ret => {
                let value = self.active_frame()?.get(operand1)?;
                self.frames.pop();
                if self.frames.is_empty() {
                    self.status = VmStatus::Exited;
                    if let Some(v) = value.as_integer() {
                        self.exit_status = Some(v);
                    }
                } else {
                    self.frames.last_mut().unwrap().push(value);
                }
            }

            Opcode::RetNull => {
                self.active_frame()?;
                self.frames.pop();
                if self.frames.is_empty() {
                    self.status = VmStatus::Exited;
                } else {
                    let null = self.heap.null();
                    self.frames.last_mut().unwrap().push(null);
                }
            }

            Opcode::PushStr => {
                let idx = unsigned_operand(operand1, "PUSHSTR")?;
                let value = self
                    .active_frame()?
                    .exec()
                    .string_at(idx)
                    .map(str::to_owned)
                    .ok_or_else(|| {
                        EaselError::vm_panic(format!("string literal index {idx} out of range"))
                    })?;
                let obj = self.heap.alloc_string(value);
                self.active_frame_mut()?.push(obj);
            }

            Opcode::PushInt => {
                let idx = unsigned_operand(operand1, "PUSHINT")?;
                let value = self.active_frame()?.exec().integer_at(idx).ok_or_else(|| {
                    EaselError::vm_panic(format!("integer literal index {idx} out of range"))
                })?;
                let obj = self.heap.alloc_integer(value);
                self.active_frame_mut()?.push(obj);
            }

            Opcode::PushFlt => {
                let idx = unsigned_operand(operand1, "PUSHFLT")?;
                let value = self.active_frame()?.exec().float_at(idx).ok_or_else(|| {
                    EaselError::vm_panic(format!("float literal index {idx} out of range"))
                })?;
                let obj = self.heap.alloc_float(value);
                self.active_frame_mut()?.push(obj);
            }

            Opcode::PushNull => {
                let null = self.heap.null();
                self.active_frame_mut()?.push(null);
            }
            Opcode::PushTrue => {
                let v = self.heap.bool_value(true);
                self.active_frame_mut()?.push(v);
            }
            Opcode::PushFalse => {
                let v = self.heap.bool_value(false);
                self.active_frame_mut()?.push(v);
            }
            Opcode::PushArray => {
                let v = self.heap.alloc_array();
                self.active_frame_mut()?.push(v);
            }
            Opcode::PushObject => {
                let v = self.heap.alloc_map();
                self.active_frame_mut()?.push(v);
            }

            Opcode::CreateClosure => {
                let n = unsigned_operand(operand1, "CREATE_CLOSURE")?;
                let items = self.active_frame()?.top_n(n + 1)?;
                let closure = match items[0].as_function() {
                    Some(FunctionObject::User(proto)) => UserFunction {
                        module: proto.module,
                        base: proto.base,
                        len: proto.len,
                        variadic: proto.variadic,
                        captured: items[1..].to_vec(),
                    },
                    _ => {
                        return Err(EaselError::vm_panic(
                            "closure base is not a user function",
                        ))
                    }
                };
                let obj = self.heap.alloc_user_function(closure);
                let frame = self.active_frame_mut()?;
                frame.pop_n(n + 1)?;
                frame.push(obj);
            }

            Opcode::GlobalGetVar => {
                let key = self.variable_key(operand1)?;
                let value = self
                    .globals
                    .get(&key)
                    .cloned()
                    .ok_or_else(|| EaselError::unbound(&key))?;
                self.active_frame_mut()?.push(value);
            }

            Opcode::GlobalSetVar => {
                let key = self.variable_key(operand1)?;
                let value = self.active_frame()?.get(operand2)?;
                self.globals.insert(key, value);
            }

            Opcode::ModuleGetVar => {
                let key = self.variable_key(operand1)?;
                let module = self.active_module()?;
                let value = module
                    .as_module()
                    .and_then(|m| m.vars.borrow().get(&key).cloned())
                    .ok_or_else(|| EaselError::unbound(&key))?;
                self.active_frame_mut()?.push(value);
            }

            Opcode::ModuleSetVar => {
                let key = self.variable_key(operand1)?;
                let value = self.active_frame()?.get(operand2)?;
                let module = self.active_module()?;
                if let Some(m) = module.as_module() {
                    m.vars.borrow_mut().insert(key, value);
                }
            }

            Opcode::LoadModule => return self.op_load_module(operand1),

            Opcode::JmpTrue | Opcode::JmpFalse => {
                let value = self.active_frame()?.get(operand1)?;
                if value.truthy() == (opcode == Opcode::JmpTrue) {
                    self.active_frame_mut()?.jump(operand2)?;
                }
            }
        }

        Ok(Flow::Advance)
    }

    /// Read the string value addressed by a variable-name operand.
    fn variable_key(&self, operand: i16) -> Result<String, EaselError> {
        let obj = self.active_frame()?.get(operand)?;
        obj.as_str().map(str::to_owned).ok_or_else(|| {
            EaselError::type_error("string variable name", obj.kind_name())
        })
    }

    fn op_call(&mut self, operand1: i16, operand2: i16) -> Result<Flow, EaselError> {
        let callee = self.active_frame()?.get(operand1)?;
        let func = callee
            .as_function()
            .ok_or_else(|| EaselError::type_error("function", callee.kind_name()))?;
        match func {
            FunctionObject::Host(host) => {
                let hook = host.hook.clone();
                let heap = &mut self.heap;
                let frame = self
                    .frames
                    .last_mut()
                    .ok_or_else(|| EaselError::vm_panic("no active call frame"))?;
                hook(heap, frame)?;
                Ok(Flow::Advance)
            }
            FunctionObject::User(user) => {
                let n = unsigned_operand(operand2, "CALL")?;
                let variadic = user.variadic;
                let args = self.active_frame()?.top_n(n)?;
                let args = if variadic {
                    let array = self.heap.alloc_array();
                    if let VmObjectKind::Array(items) = &array.kind {
                        items.borrow_mut().extend(args);
                    }
                    vec![array]
                } else {
                    args
                };
                let frame = self.make_frame(callee.clone(), args)?;
                self.frames.push(frame);
                Ok(Flow::Stay)
            }
        }
    }

    fn op_load_module(&mut self, operand1: i16) -> Result<Flow, EaselError> {
        let name_obj = self.active_frame()?.get(operand1)?;
        let name = name_obj
            .as_str()
            .ok_or_else(|| EaselError::type_error("string module name", name_obj.kind_name()))?
            .to_owned();

        if let Some(module) = self.modules.get(&name).cloned() {
            let null = self.heap.null();
            let frame = self.active_frame_mut()?;
            frame.push(module);
            frame.push(null.clone());
            frame.push(null);
            return Ok(Flow::Advance);
        }

        let exec = match &self.loader {
            Some(loader) => loader(&name)
                .map_err(|err| EaselError::module(format!("cannot load module '{name}': {err}")))?,
            None => {
                return Err(EaselError::module(format!(
                    "cannot load module '{name}': no module loader installed"
                )))
            }
        };
        let (module, initializer) = self.install_module(exec)?;
        let frame = self.active_frame_mut()?;
        frame.push(module);
        match initializer {
            Some(init) => {
                // Run the fresh module's initializer in a nested frame;
                // its return value becomes the third pushed slot, giving
                // both load paths the same stack shape.
                let idx = i16::try_from(frame.stack_len())
                    .map_err(|_| EaselError::vm_panic("stack too deep for LOAD_MODULE"))?;
                frame.push(init);
                self.dispatch(Instruction::new(Opcode::Call, idx, 0))
            }
            None => {
                let null = self.heap.null();
                let frame = self.active_frame_mut()?;
                frame.push(null.clone());
                frame.push(null);
                Ok(Flow::Advance)
            }
        }
    }

    fn binary_operator(
        &mut self,
        opcode: Opcode,
        a: &VmRef,
        b: &VmRef,
    ) -> Result<VmRef, EaselError> {
        match opcode {
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div | Opcode::Mod => {
                self.arithmetic(opcode, a, b)
            }
            Opcode::LogicalAnd => Ok(self.heap.bool_value(a.truthy() && b.truthy())),
            Opcode::LogicalOr => Ok(self.heap.bool_value(a.truthy() || b.truthy())),
            Opcode::Equal => Ok(self.heap.bool_value(values_equal(a, b))),
            Opcode::Inequal => Ok(self.heap.bool_value(!values_equal(a, b))),
            Opcode::Greater | Opcode::Less | Opcode::GreaterEq | Opcode::LessEq => {
                self.compare(opcode, a, b)
            }
            _ => Err(EaselError::vm_panic(format!(
                "{} is not a binary operator",
                opcode.mnemonic()
            ))),
        }
    }

    fn arithmetic(&mut self, opcode: Opcode, a: &VmRef, b: &VmRef) -> Result<VmRef, EaselError> {
        use VmObjectKind::{Float, Integer};

        if opcode == Opcode::Mod {
            return match (&a.kind, &b.kind) {
                (Integer(_), Integer(0)) => Err(EaselError::vm_panic("modulo by zero")),
                (Integer(x), Integer(y)) => Ok(self.heap.alloc_integer(x.wrapping_rem(*y))),
                (Integer(_), _) => Err(EaselError::type_error("integer", b.kind_name())),
                _ => Err(EaselError::type_error("integer", a.kind_name())),
            };
        }

        match (&a.kind, &b.kind) {
            (Integer(x), Integer(y)) => {
                let (x, y) = (*x, *y);
                let value = match opcode {
                    Opcode::Add => x.wrapping_add(y),
                    Opcode::Sub => x.wrapping_sub(y),
                    Opcode::Mul => x.wrapping_mul(y),
                    Opcode::Div => {
                        if y == 0 {
                            return Err(EaselError::vm_panic("division by zero"));
                        }
                        x.wrapping_div(y)
                    }
                    _ => unreachable!(),
                };
                Ok(self.heap.alloc_integer(value))
            }
            (Integer(_) | Float(_), Integer(_) | Float(_)) => {
                let x = a.as_float().unwrap_or_else(|| a.as_integer().unwrap() as f64);
                let y = b.as_float().unwrap_or_else(|| b.as_integer().unwrap() as f64);
                let value = match opcode {
                    Opcode::Add => x + y,
                    Opcode::Sub => x - y,
                    Opcode::Mul => x * y,
                    Opcode::Div => x / y,
                    _ => unreachable!(),
                };
                Ok(self.heap.alloc_float(value))
            }
            (Integer(_) | Float(_), _) => Err(EaselError::type_error("number", b.kind_name())),
            _ => Err(EaselError::type_error("number", a.kind_name())),
        }
    }

    fn compare(&mut self, opcode: Opcode, a: &VmRef, b: &VmRef) -> Result<VmRef, EaselError> {
        use VmObjectKind::{Float, Integer};

        let result = match (&a.kind, &b.kind) {
            (Integer(x), Integer(y)) => match opcode {
                Opcode::Greater => x > y,
                Opcode::Less => x < y,
                Opcode::GreaterEq => x >= y,
                Opcode::LessEq => x <= y,
                _ => unreachable!(),
            },
            (Integer(_) | Float(_), Integer(_) | Float(_)) => {
                let x = a.as_float().unwrap_or_else(|| a.as_integer().unwrap() as f64);
                let y = b.as_float().unwrap_or_else(|| b.as_integer().unwrap() as f64);
                match opcode {
                    Opcode::Greater => x > y,
                    Opcode::Less => x < y,
                    Opcode::GreaterEq => x >= y,
                    Opcode::LessEq => x <= y,
                    _ => unreachable!(),
                }
            }
            (Integer(_) | Float(_), _) => {
                return Err(EaselError::type_error("number", b.kind_name()))
            }
            _ => return Err(EaselError::type_error("number", a.kind_name())),
        };
        Ok(self.heap.bool_value(result))
    }
}

impl Default for VirtualMachine {
    fn default() -> Self {
        VirtualMachine::new()
    }
}
