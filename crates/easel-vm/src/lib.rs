//! The Easel bytecode virtual machine.
//!
//! An [`ExecutionModule`] (literal pools + function table + instruction
//! stream) is handed to the [`VirtualMachine`], which installs a module
//! object, pushes a frame for the module initializer and runs the main
//! loop: one instruction per iteration, with a stop-the-world
//! mark-by-generation garbage collection pause every few million
//! instructions. The VM is single-threaded and cooperative; host
//! functions run to completion inside `CALL`.

pub mod disasm;
pub mod emit;
pub mod frame;
pub mod heap;
pub mod lower;
pub mod module;
pub mod object;
pub mod opcodes;
pub mod serialize;
pub mod vm;

pub use disasm::disassemble;
pub use emit::ModuleBuilder;
pub use frame::Frame;
pub use heap::Heap;
pub use lower::lower_module;
pub use module::{ExecutionModule, FunctionInfo, Instruction};
pub use object::{FunctionObject, HostFn, ObjectId, UserFunction, VmObject, VmObjectKind, VmRef};
pub use opcodes::Opcode;
pub use serialize::{read_module, write_module};
pub use vm::{VirtualMachine, VmStatus};
