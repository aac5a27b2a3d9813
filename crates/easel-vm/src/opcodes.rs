/// Bytecode opcodes for the Easel VM.
///
/// Stack-addressed: most operands are signed indices into the active
/// frame (nonnegative → value stack, negative → captured/argument
/// region); pushes land on top of the value stack.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Nop = 0,
    /// `POPN n`: drop the top n values.
    PopN,
    /// Arithmetic and comparison: operands are stack indices, result is
    /// pushed.
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Equal,
    Inequal,
    Greater,
    Less,
    GreaterEq,
    LessEq,
    LogicalAnd,
    LogicalOr,
    /// `CALL f, n`: call the function at index f with the top n values
    /// as arguments.
    Call,
    /// `CALL_MODULEFUNC k, n`: seat the k-th function of the active
    /// module beneath the top n arguments, then behave as `CALL`
    /// addressing it.
    CallModuleFunc,
    /// `DUP i`: push a copy of the value at index i.
    Dup,
    /// `RET i`: pop the frame, propagate the value at i to the caller.
    Ret,
    /// `RETNULL`: pop the frame, propagate the Null singleton.
    RetNull,
    /// `PUSHSTR k` / `PUSHINT k` / `PUSHFLT k`: push the literal at
    /// pool index k of the active module.
    PushStr,
    PushInt,
    PushFlt,
    PushNull,
    PushTrue,
    PushFalse,
    PushArray,
    PushObject,
    /// `CREATE_CLOSURE n`: consume a base function plus n captured
    /// values, push a closure sharing the base's code.
    CreateClosure,
    GlobalGetVar,
    GlobalSetVar,
    ModuleGetVar,
    ModuleSetVar,
    /// `LOAD_MODULE i`: resolve the module named by the string at i.
    LoadModule,
    /// Markers with no effect.
    BeginFunction,
    EndFunction,
    /// `JMP_TRUE i, off` / `JMP_FALSE i, off`: branch by signed offset
    /// when the value at i coerces to the matching boolean.
    JmpTrue,
    JmpFalse,
}

impl Opcode {
    /// Convert a raw u16 to an Opcode. Valid because the enum is
    /// `#[repr(u16)]` with dense variants from 0 through `JmpFalse`.
    pub fn from_u16(raw: u16) -> Option<Opcode> {
        if raw <= Opcode::JmpFalse as u16 {
            // SAFETY: Opcode is #[repr(u16)] with dense, contiguous
            // variants 0..=JmpFalse.
            Some(unsafe { std::mem::transmute::<u16, Opcode>(raw) })
        } else {
            None
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Nop => "NOP",
            Opcode::PopN => "POPN",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Mod => "MOD",
            Opcode::Equal => "EQ",
            Opcode::Inequal => "NEQ",
            Opcode::Greater => "GT",
            Opcode::Less => "LT",
            Opcode::GreaterEq => "GE",
            Opcode::LessEq => "LE",
            Opcode::LogicalAnd => "LAND",
            Opcode::LogicalOr => "LOR",
            Opcode::Call => "CALL",
            Opcode::CallModuleFunc => "CALL_MODULEFUNC",
            Opcode::Dup => "DUP",
            Opcode::Ret => "RET",
            Opcode::RetNull => "RETNULL",
            Opcode::PushStr => "PUSHSTR",
            Opcode::PushInt => "PUSHINT",
            Opcode::PushFlt => "PUSHFLT",
            Opcode::PushNull => "PUSHNULL",
            Opcode::PushTrue => "PUSHTRUE",
            Opcode::PushFalse => "PUSHFALSE",
            Opcode::PushArray => "PUSHARRAY",
            Opcode::PushObject => "PUSHOBJECT",
            Opcode::CreateClosure => "CREATE_CLOSURE",
            Opcode::GlobalGetVar => "GLOBAL_GETVAR",
            Opcode::GlobalSetVar => "GLOBAL_SETVAR",
            Opcode::ModuleGetVar => "MODULE_GETVAR",
            Opcode::ModuleSetVar => "MODULE_SETVAR",
            Opcode::LoadModule => "LOAD_MODULE",
            Opcode::BeginFunction => "BEGIN_FUNCTION",
            Opcode::EndFunction => "END_FUNCTION",
            Opcode::JmpTrue => "JMP_TRUE",
            Opcode::JmpFalse => "JMP_FALSE",
        }
    }
}
