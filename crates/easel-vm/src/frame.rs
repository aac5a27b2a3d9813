//! One activation of a user function on the call stack.

use std::rc::Rc;

use easel_core::EaselError;

use crate::module::{ExecutionModule, Instruction};
use crate::object::{FunctionObject, ObjectId, VmRef};

/// A call-stack entry: the executing function, a function-relative
/// instruction pointer, the bottom region (captured values followed by
/// arguments, addressed by negative indices) and the value stack
/// (addressed by nonnegative indices). Frames compose by position in the
/// VM's frame list; there is no link field.
pub struct Frame {
    function: VmRef,
    exec: Rc<ExecutionModule>,
    module: ObjectId,
    base: usize,
    len: usize,
    ip: usize,
    bottom: Vec<VmRef>,
    stack: Vec<VmRef>,
}

impl Frame {
    /// Build a frame for a user function. The bottom region is the
    /// function's captured list followed by the call arguments.
    pub fn new(function: VmRef, exec: Rc<ExecutionModule>, args: Vec<VmRef>) -> Result<Self, EaselError> {
        let (module, base, len, mut bottom) = match function.as_function() {
            Some(FunctionObject::User(u)) => {
                (u.module, u.base, u.len, u.captured.clone())
            }
            _ => {
                return Err(EaselError::vm_panic(
                    "cannot push a frame for a non-user function",
                ))
            }
        };
        bottom.extend(args);
        Ok(Frame {
            function,
            exec,
            module,
            base,
            len,
            ip: 0,
            bottom,
            stack: Vec::new(),
        })
    }

    pub fn function(&self) -> &VmRef {
        &self.function
    }

    pub fn exec(&self) -> &Rc<ExecutionModule> {
        &self.exec
    }

    pub fn module_id(&self) -> ObjectId {
        self.module
    }

    /// Read a slot: `i >= 0` is the value stack, `i < 0` is bottom slot
    /// `-i - 1` (captured values first, then arguments).
    pub fn get(&self, index: i16) -> Result<VmRef, EaselError> {
        if index >= 0 {
            self.stack.get(index as usize).cloned().ok_or_else(|| {
                EaselError::vm_panic(format!(
                    "stack index {index} out of range (stack size {})",
                    self.stack.len()
                ))
            })
        } else {
            let slot = (-(index as i32) - 1) as usize;
            self.bottom.get(slot).cloned().ok_or_else(|| {
                EaselError::vm_panic(format!(
                    "bottom index {index} out of range ({} captured/args)",
                    self.bottom.len()
                ))
            })
        }
    }

    pub fn push(&mut self, value: VmRef) {
        self.stack.push(value);
    }

    pub fn pop_n(&mut self, n: usize) -> Result<(), EaselError> {
        if n > self.stack.len() {
            return Err(EaselError::vm_panic(format!(
                "cannot pop {n} values from a stack of {}",
                self.stack.len()
            )));
        }
        self.stack.truncate(self.stack.len() - n);
        Ok(())
    }

    /// Clone the top n values, in stack order. Does not pop.
    pub fn top_n(&self, n: usize) -> Result<Vec<VmRef>, EaselError> {
        if n > self.stack.len() {
            return Err(EaselError::vm_panic(format!(
                "cannot read top {n} values of a stack of {}",
                self.stack.len()
            )));
        }
        Ok(self.stack[self.stack.len() - n..].to_vec())
    }

    /// Seat a value beneath the top n slots, returning its index. The
    /// top n values (a call's arguments) shift up by one and stay the
    /// top n.
    pub fn insert_below_top(&mut self, n: usize, value: VmRef) -> Result<usize, EaselError> {
        if n > self.stack.len() {
            return Err(EaselError::vm_panic(format!(
                "cannot seat a value under the top {n} of a stack of {}",
                self.stack.len()
            )));
        }
        let at = self.stack.len() - n;
        self.stack.insert(at, value);
        Ok(at)
    }

    pub fn dup(&mut self, index: i16) -> Result<(), EaselError> {
        let value = self.get(index)?;
        self.stack.push(value);
        Ok(())
    }

    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    pub fn ip(&self) -> usize {
        self.ip
    }

    /// Fetch the instruction under the instruction pointer.
    pub fn fetch(&self) -> Result<Instruction, EaselError> {
        if self.ip >= self.len {
            return Err(EaselError::vm_panic(format!(
                "instruction pointer {} out of function bounds (len {})",
                self.ip, self.len
            )));
        }
        self.exec.instruction_at(self.base + self.ip).ok_or_else(|| {
            EaselError::vm_panic(format!(
                "instruction {} out of module bounds",
                self.base + self.ip
            ))
        })
    }

    /// Advance past the current instruction.
    pub fn advance(&mut self) {
        self.ip += 1;
    }

    /// Add a signed offset to the instruction pointer. The target must
    /// stay inside the function's code range.
    pub fn jump(&mut self, offset: i16) -> Result<(), EaselError> {
        let target = self.ip as i64 + offset as i64;
        if target < 0 || target as usize >= self.len {
            return Err(EaselError::vm_panic(format!(
                "jump target {target} out of function bounds (len {})",
                self.len
            )));
        }
        self.ip = target as usize;
        Ok(())
    }

    /// Mark every slot plus the frame's function as live.
    pub fn mark(&self, gen: u64) {
        for v in &self.stack {
            v.mark(gen);
        }
        for v in &self.bottom {
            v.mark(gen);
        }
        self.function.mark(gen);
    }
}
