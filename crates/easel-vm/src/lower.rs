//! AST → bytecode lowering.
//!
//! Operands of this instruction set are absolute stack indices and
//! binary operators do not consume their inputs, so the lowering tracks
//! the compile-time stack depth: every expression leaves exactly one
//! result at a known index (plus dead intermediates below it), call
//! arguments are re-`DUP`ed to the stack top to make them contiguous,
//! and each statement ends with a `POPN` back to its entry depth.
//!
//! Name resolution order: parameter, module function, `let`-bound module
//! variable, global (which is where host bindings live).

use easel_core::{BinaryOp, EaselError, Expr, ModuleAst};
use hashbrown::{HashMap, HashSet};

use crate::emit::ModuleBuilder;
use crate::module::ExecutionModule;
use crate::opcodes::Opcode;

pub fn lower_module(ast: &ModuleAst) -> Result<ExecutionModule, EaselError> {
    Lowering::new(ast)?.lower(ast)
}

struct Lowering {
    builder: ModuleBuilder,
    module_vars: HashSet<String>,
    functions: HashMap<String, usize>,
    params: HashMap<String, i16>,
    depth: usize,
}

impl Lowering {
    fn new(ast: &ModuleAst) -> Result<Self, EaselError> {
        let mut functions = HashMap::new();
        let mut module_vars = HashSet::new();
        for expr in &ast.exprs {
            if let Expr::Def { name, .. } = expr {
                if functions.insert(name.clone(), functions.len()).is_some() {
                    return Err(EaselError::lower(format!(
                        "function '{name}' is defined twice"
                    )));
                }
            }
        }
        for expr in &ast.exprs {
            collect_let_names(expr, &mut module_vars);
        }
        Ok(Lowering {
            builder: ModuleBuilder::new(ast.name.clone()),
            module_vars,
            functions,
            params: HashMap::new(),
            depth: 0,
        })
    }

    fn lower(mut self, ast: &ModuleAst) -> Result<ExecutionModule, EaselError> {
        for expr in &ast.exprs {
            if let Expr::Def {
                name,
                params,
                variadic,
                body,
            } = expr
            {
                self.lower_function(name, params, *variadic, body)?;
            }
        }

        let top_level: Vec<&Expr> = ast
            .exprs
            .iter()
            .filter(|e| !matches!(e, Expr::Def { .. }))
            .collect();
        let begin = self.builder.next_offset();
        self.builder.emit(Opcode::BeginFunction, 0, 0);
        self.params.clear();
        self.depth = 0;
        self.lower_body(&top_level)?;
        self.builder.emit(Opcode::EndFunction, 0, 0);
        let idx = self.builder.add_function("__init__", begin, false);
        self.builder.set_initializer(idx);

        Ok(self.builder.finish())
    }

    fn lower_function(
        &mut self,
        name: &str,
        params: &[String],
        variadic: bool,
        body: &[Expr],
    ) -> Result<(), EaselError> {
        if variadic && params.len() != 1 {
            return Err(EaselError::lower(format!(
                "variadic function '{name}' must take exactly one rest parameter"
            )));
        }
        self.params.clear();
        for (i, p) in params.iter().enumerate() {
            let idx = -(i as i16) - 1;
            if self.params.insert(p.clone(), idx).is_some() {
                return Err(EaselError::lower(format!(
                    "duplicate parameter '{p}' in function '{name}'"
                )));
            }
        }
        self.depth = 0;

        let begin = self.builder.next_offset();
        self.builder.emit(Opcode::BeginFunction, 0, 0);
        let body_refs: Vec<&Expr> = body.iter().collect();
        self.lower_body(&body_refs)?;
        self.builder.emit(Opcode::EndFunction, 0, 0);
        self.builder.add_function(name, begin, variadic);
        Ok(())
    }

    /// Lower a statement sequence ending with `RET` of the last value
    /// (or `RETNULL` for an empty body).
    fn lower_body(&mut self, body: &[&Expr]) -> Result<(), EaselError> {
        if body.is_empty() {
            self.builder.emit(Opcode::RetNull, 0, 0);
            return Ok(());
        }
        let last = body.len() - 1;
        for (i, stmt) in body.iter().enumerate() {
            if i == last {
                let result = self.lower_expr(stmt)?;
                self.builder.emit(Opcode::Ret, result, 0);
            } else {
                let mark = self.depth;
                self.lower_expr(stmt)?;
                let garbage = self.depth - mark;
                if garbage > 0 {
                    self.builder
                        .emit(Opcode::PopN, operand(garbage)?, 0);
                    self.depth = mark;
                }
            }
        }
        Ok(())
    }

    /// Lower one expression; returns the stack index of its result.
    fn lower_expr(&mut self, expr: &Expr) -> Result<i16, EaselError> {
        match expr {
            Expr::Int(v) => {
                let k = self.builder.intern_integer(*v)?;
                self.builder.emit(Opcode::PushInt, k, 0);
                self.push_one()
            }
            Expr::Float(v) => {
                let k = self.builder.intern_float(*v)?;
                self.builder.emit(Opcode::PushFlt, k, 0);
                self.push_one()
            }
            Expr::Str(s) => {
                let k = self.builder.intern_string(s)?;
                self.builder.emit(Opcode::PushStr, k, 0);
                self.push_one()
            }

            Expr::Ident(name) => self.lower_name_load(name),

            Expr::Neg(inner) => {
                let k = self.builder.intern_integer(0)?;
                self.builder.emit(Opcode::PushInt, k, 0);
                let zero = self.push_one()?;
                let value = self.lower_expr(inner)?;
                self.builder.emit(Opcode::Sub, zero, value);
                self.push_one()
            }

            Expr::Binary { op, lhs, rhs } => {
                let opcode = binary_opcode(*op).ok_or_else(|| {
                    EaselError::lower(format!(
                        "operator '{}' has no bytecode equivalent",
                        op.symbol()
                    ))
                })?;
                let l = self.lower_expr(lhs)?;
                let r = self.lower_expr(rhs)?;
                self.builder.emit(opcode, l, r);
                self.push_one()
            }

            Expr::Let { name, value } => {
                let k = self.builder.intern_string(name)?;
                self.builder.emit(Opcode::PushStr, k, 0);
                let name_idx = self.push_one()?;
                let value_idx = self.lower_expr(value)?;
                self.builder
                    .emit(Opcode::ModuleSetVar, name_idx, value_idx);
                Ok(value_idx)
            }

            Expr::Call { callee, args } => self.lower_call(callee, args),

            Expr::Def { name, .. } => Err(EaselError::lower(format!(
                "nested definition of '{name}' is not supported"
            ))),
        }
    }

    fn lower_name_load(&mut self, name: &str) -> Result<i16, EaselError> {
        if let Some(&param) = self.params.get(name) {
            self.builder.emit(Opcode::Dup, param, 0);
            return self.push_one();
        }
        if self.functions.contains_key(name) {
            return Err(EaselError::lower(format!(
                "function '{name}' can only be called, not used as a value"
            )));
        }
        let k = self.builder.intern_string(name)?;
        self.builder.emit(Opcode::PushStr, k, 0);
        let name_idx = self.push_one()?;
        let op = if self.module_vars.contains(name) {
            Opcode::ModuleGetVar
        } else {
            Opcode::GlobalGetVar
        };
        self.builder.emit(op, name_idx, 0);
        self.push_one()
    }

    fn lower_call(&mut self, callee: &str, args: &[Expr]) -> Result<i16, EaselError> {
        let argc = operand(args.len())?;

        // Callee resolved through a parameter or a variable: evaluate it
        // before the arguments, CALL through its stack index.
        let callee_idx = if self.params.contains_key(callee) || !self.functions.contains_key(callee)
        {
            Some(self.lower_name_load(callee)?)
        } else {
            None
        };

        let mut results = Vec::with_capacity(args.len());
        for arg in args {
            results.push(self.lower_expr(arg)?);
        }
        // Re-dup the argument results so they are the top n values.
        for r in results {
            self.builder.emit(Opcode::Dup, r, 0);
            self.push_one()?;
        }

        match callee_idx {
            Some(idx) => {
                self.builder.emit(Opcode::Call, idx, argc);
                self.push_one()
            }
            None => {
                let fidx = operand(self.functions[callee])?;
                self.builder.emit(Opcode::CallModuleFunc, fidx, argc);
                self.push_one()?; // the function, seated under the arguments
                self.push_one() // the return value, on top
            }
        }
    }

    /// Account for one pushed value; returns its stack index.
    fn push_one(&mut self) -> Result<i16, EaselError> {
        let idx = operand(self.depth)?;
        self.depth += 1;
        Ok(idx)
    }
}

fn operand(value: usize) -> Result<i16, EaselError> {
    i16::try_from(value).map_err(|_| EaselError::lower("expression too deep for operand width"))
}

fn collect_let_names(expr: &Expr, vars: &mut HashSet<String>) {
    match expr {
        Expr::Let { name, value } => {
            vars.insert(name.clone());
            collect_let_names(value, vars);
        }
        Expr::Neg(inner) => collect_let_names(inner, vars),
        Expr::Binary { lhs, rhs, .. } => {
            collect_let_names(lhs, vars);
            collect_let_names(rhs, vars);
        }
        Expr::Call { args, .. } => {
            for a in args {
                collect_let_names(a, vars);
            }
        }
        Expr::Def { body, .. } => {
            for e in body {
                collect_let_names(e, vars);
            }
        }
        _ => {}
    }
}

fn binary_opcode(op: BinaryOp) -> Option<Opcode> {
    Some(match op {
        BinaryOp::Add => Opcode::Add,
        BinaryOp::Sub => Opcode::Sub,
        BinaryOp::Mul => Opcode::Mul,
        BinaryOp::Div => Opcode::Div,
        BinaryOp::Mod => Opcode::Mod,
        BinaryOp::Lt => Opcode::Less,
        BinaryOp::Gt => Opcode::Greater,
        BinaryOp::Le => Opcode::LessEq,
        BinaryOp::Ge => Opcode::GreaterEq,
        BinaryOp::Eq => Opcode::Equal,
        BinaryOp::Ne => Opcode::Inequal,
        BinaryOp::And => Opcode::LogicalAnd,
        BinaryOp::Or => Opcode::LogicalOr,
        BinaryOp::Shl
        | BinaryOp::Shr
        | BinaryOp::BitXor
        | BinaryOp::BitOr
        | BinaryOp::BitNot
        | BinaryOp::BitAnd => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::VirtualMachine;

    fn run(ast: &ModuleAst) -> i64 {
        let module = lower_module(ast).expect("lowering failed");
        let mut vm = VirtualMachine::new();
        vm.execute_module(module).expect("execution failed")
    }

    #[test]
    fn literal_exit_status() {
        let mut ast = ModuleAst::new("m");
        ast.exprs.push(Expr::Int(42));
        assert_eq!(run(&ast), 42);
    }

    #[test]
    fn arithmetic_tree() {
        // (2 + 3) * 7 = 35
        let mut ast = ModuleAst::new("m");
        ast.exprs.push(Expr::binary(
            BinaryOp::Mul,
            Expr::binary(BinaryOp::Add, Expr::Int(2), Expr::Int(3)),
            Expr::Int(7),
        ));
        assert_eq!(run(&ast), 35);
    }

    #[test]
    fn let_binding_and_reuse() {
        // (let x 6) then x * x
        let mut ast = ModuleAst::new("m");
        ast.exprs.push(Expr::Let {
            name: "x".into(),
            value: Box::new(Expr::Int(6)),
        });
        ast.exprs.push(Expr::binary(
            BinaryOp::Mul,
            Expr::Ident("x".into()),
            Expr::Ident("x".into()),
        ));
        assert_eq!(run(&ast), 36);
    }

    #[test]
    fn function_call_with_arguments() {
        // (def add2 (a b) (+ a b)) ; (add2 19 23)
        let mut ast = ModuleAst::new("m");
        ast.exprs.push(Expr::Def {
            name: "add2".into(),
            params: vec!["a".into(), "b".into()],
            variadic: false,
            body: vec![Expr::binary(
                BinaryOp::Add,
                Expr::Ident("a".into()),
                Expr::Ident("b".into()),
            )],
        });
        ast.exprs.push(Expr::Call {
            callee: "add2".into(),
            args: vec![Expr::Int(19), Expr::Int(23)],
        });
        assert_eq!(run(&ast), 42);
    }

    #[test]
    fn nested_calls_keep_arguments_contiguous() {
        // (def add2 (a b) (+ a b)) ; (add2 (add2 1 2) (add2 3 4)) = 10
        let def = Expr::Def {
            name: "add2".into(),
            params: vec!["a".into(), "b".into()],
            variadic: false,
            body: vec![Expr::binary(
                BinaryOp::Add,
                Expr::Ident("a".into()),
                Expr::Ident("b".into()),
            )],
        };
        let inner1 = Expr::Call {
            callee: "add2".into(),
            args: vec![Expr::Int(1), Expr::Int(2)],
        };
        let inner2 = Expr::Call {
            callee: "add2".into(),
            args: vec![Expr::Int(3), Expr::Int(4)],
        };
        let mut ast = ModuleAst::new("m");
        ast.exprs.push(def);
        ast.exprs.push(Expr::Call {
            callee: "add2".into(),
            args: vec![inner1, inner2],
        });
        assert_eq!(run(&ast), 10);
    }

    #[test]
    fn unary_minus() {
        let mut ast = ModuleAst::new("m");
        ast.exprs.push(Expr::binary(
            BinaryOp::Sub,
            Expr::Int(2),
            Expr::Neg(Box::new(Expr::Int(40))),
        ));
        assert_eq!(run(&ast), 42);
    }

    #[test]
    fn bitwise_operator_is_rejected() {
        let mut ast = ModuleAst::new("m");
        ast.exprs.push(Expr::binary(BinaryOp::Shl, Expr::Int(1), Expr::Int(3)));
        assert!(lower_module(&ast).is_err());
    }

    #[test]
    fn host_function_call_through_globals() {
        let mut ast = ModuleAst::new("m");
        ast.exprs.push(Expr::Call {
            callee: "seven".into(),
            args: vec![],
        });
        let module = lower_module(&ast).unwrap();
        let mut vm = VirtualMachine::new();
        vm.bind_host_function("seven", |heap, frame| {
            let v = heap.alloc_integer(7);
            frame.push(v);
            Ok(1)
        });
        assert_eq!(vm.execute_module(module).unwrap(), 7);
    }
}
