//! Human-readable rendering of an [`ExecutionModule`].

use std::fmt::Write;

use crate::module::ExecutionModule;
use crate::opcodes::Opcode;

/// Render pools, function table and the instruction stream, one line per
/// instruction, with literal operands resolved inline.
pub fn disassemble(module: &ExecutionModule) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "module {}", module.name);

    if !module.strings.is_empty() {
        let _ = writeln!(out, "  strings:");
        for (i, s) in module.strings.iter().enumerate() {
            let _ = writeln!(out, "    [{i}] {s:?}");
        }
    }
    if !module.integers.is_empty() {
        let _ = writeln!(out, "  integers:");
        for (i, v) in module.integers.iter().enumerate() {
            let _ = writeln!(out, "    [{i}] {v}");
        }
    }
    if !module.floats.is_empty() {
        let _ = writeln!(out, "  floats:");
        for (i, v) in module.floats.iter().enumerate() {
            let _ = writeln!(out, "    [{i}] {v}");
        }
    }

    for (fi, func) in module.functions.iter().enumerate() {
        let init = if module.initializer == Some(fi) {
            " (initializer)"
        } else {
            ""
        };
        let variadic = if func.variadic { " variadic" } else { "" };
        let _ = writeln!(out, "  fn [{fi}] {}{variadic}{init}:", func.name);
        for k in 0..func.len {
            let at = func.begin + k;
            let Some(ins) = module.instruction_at(at) else {
                let _ = writeln!(out, "    {at:4}  <out of range>");
                continue;
            };
            let mut line = format!("    {at:4}  {}", ins.opcode.mnemonic());
            match ins.opcode {
                Opcode::Nop
                | Opcode::RetNull
                | Opcode::PushNull
                | Opcode::PushTrue
                | Opcode::PushFalse
                | Opcode::PushArray
                | Opcode::PushObject
                | Opcode::BeginFunction
                | Opcode::EndFunction => {}
                Opcode::PushStr => {
                    let lit = module
                        .string_at(ins.operand1 as usize)
                        .map(|s| format!(" {s:?}"))
                        .unwrap_or_default();
                    let _ = write!(line, " {}{lit}", ins.operand1);
                }
                Opcode::PushInt => {
                    let lit = module
                        .integer_at(ins.operand1 as usize)
                        .map(|v| format!(" ; {v}"))
                        .unwrap_or_default();
                    let _ = write!(line, " {}{lit}", ins.operand1);
                }
                Opcode::PushFlt => {
                    let lit = module
                        .float_at(ins.operand1 as usize)
                        .map(|v| format!(" ; {v}"))
                        .unwrap_or_default();
                    let _ = write!(line, " {}{lit}", ins.operand1);
                }
                Opcode::PopN
                | Opcode::Dup
                | Opcode::Ret
                | Opcode::CreateClosure
                | Opcode::GlobalGetVar
                | Opcode::ModuleGetVar
                | Opcode::LoadModule => {
                    let _ = write!(line, " {}", ins.operand1);
                }
                _ => {
                    let _ = write!(line, " {}, {}", ins.operand1, ins.operand2);
                }
            }
            let _ = writeln!(out, "{line}");
        }
    }
    out
}
