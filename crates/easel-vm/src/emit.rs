//! Incremental construction of an [`ExecutionModule`]: pooled literals
//! (deduplicated), function-table management and instruction emission.

use easel_core::EaselError;
use hashbrown::HashMap;

use crate::module::{ExecutionModule, FunctionInfo, Instruction};
use crate::opcodes::Opcode;

pub struct ModuleBuilder {
    name: String,
    strings: Vec<String>,
    string_index: HashMap<String, usize>,
    integers: Vec<i64>,
    integer_index: HashMap<i64, usize>,
    floats: Vec<f64>,
    float_index: HashMap<u64, usize>,
    functions: Vec<FunctionInfo>,
    initializer: Option<usize>,
    instructions: Vec<Instruction>,
}

impl ModuleBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        ModuleBuilder {
            name: name.into(),
            strings: Vec::new(),
            string_index: HashMap::new(),
            integers: Vec::new(),
            integer_index: HashMap::new(),
            floats: Vec::new(),
            float_index: HashMap::new(),
            functions: Vec::new(),
            initializer: None,
            instructions: Vec::new(),
        }
    }

    fn pool_operand(idx: usize) -> Result<i16, EaselError> {
        i16::try_from(idx).map_err(|_| EaselError::lower("literal pool overflows operand width"))
    }

    pub fn intern_string(&mut self, s: &str) -> Result<i16, EaselError> {
        if let Some(&idx) = self.string_index.get(s) {
            return Self::pool_operand(idx);
        }
        let idx = self.strings.len();
        self.strings.push(s.to_string());
        self.string_index.insert(s.to_string(), idx);
        Self::pool_operand(idx)
    }

    pub fn intern_integer(&mut self, v: i64) -> Result<i16, EaselError> {
        if let Some(&idx) = self.integer_index.get(&v) {
            return Self::pool_operand(idx);
        }
        let idx = self.integers.len();
        self.integers.push(v);
        self.integer_index.insert(v, idx);
        Self::pool_operand(idx)
    }

    pub fn intern_float(&mut self, v: f64) -> Result<i16, EaselError> {
        if let Some(&idx) = self.float_index.get(&v.to_bits()) {
            return Self::pool_operand(idx);
        }
        let idx = self.floats.len();
        self.floats.push(v);
        self.float_index.insert(v.to_bits(), idx);
        Self::pool_operand(idx)
    }

    /// Append an instruction, returning its index in the stream.
    pub fn emit(&mut self, opcode: Opcode, operand1: i16, operand2: i16) -> usize {
        let at = self.instructions.len();
        self.instructions
            .push(Instruction::new(opcode, operand1, operand2));
        at
    }

    pub fn next_offset(&self) -> usize {
        self.instructions.len()
    }

    /// Rewrite an emitted instruction's second operand (jump patching).
    pub fn patch_operand2(&mut self, at: usize, value: i16) {
        self.instructions[at].operand2 = value;
    }

    /// Record a function covering the instruction range emitted between
    /// `begin` and now. Returns the function-table index.
    pub fn add_function(
        &mut self,
        name: impl Into<String>,
        begin: usize,
        variadic: bool,
    ) -> usize {
        let idx = self.functions.len();
        self.functions.push(FunctionInfo {
            name: name.into(),
            begin,
            len: self.instructions.len() - begin,
            variadic,
        });
        idx
    }

    pub fn set_initializer(&mut self, function_index: usize) {
        self.initializer = Some(function_index);
    }

    pub fn finish(self) -> ExecutionModule {
        ExecutionModule {
            name: self.name,
            strings: self.strings,
            integers: self.integers,
            floats: self.floats,
            functions: self.functions,
            initializer: self.initializer,
            instructions: self.instructions,
        }
    }
}
