//! The tree handed from the reader to the bytecode lowering pass.
//!
//! One node kind per surface form: `let`, `def`, applications, binary
//! operators, unary minus, and the literal/identifier leaves.

use std::fmt;

/// Binary operators of the surface language.
///
/// The lexer accepts the whole set; the bitwise group has no bytecode
/// counterpart and is rejected during lowering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    BitXor,
    BitOr,
    BitNot,
    BitAnd,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::BitXor => "^",
            BinaryOp::BitOr => "|",
            BinaryOp::BitNot => "~",
            BinaryOp::BitAnd => "&",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    pub fn from_symbol(s: &str) -> Option<Self> {
        Some(match s {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Mod,
            "<<" => BinaryOp::Shl,
            ">>" => BinaryOp::Shr,
            "<" => BinaryOp::Lt,
            ">" => BinaryOp::Gt,
            "<=" => BinaryOp::Le,
            ">=" => BinaryOp::Ge,
            "==" => BinaryOp::Eq,
            "!=" => BinaryOp::Ne,
            "^" => BinaryOp::BitXor,
            "|" => BinaryOp::BitOr,
            "~" => BinaryOp::BitNot,
            "&" => BinaryOp::BitAnd,
            "&&" => BinaryOp::And,
            "||" => BinaryOp::Or,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    /// Unary minus.
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `(let name value)`: bind a module-level variable.
    Let {
        name: String,
        value: Box<Expr>,
    },
    /// `(f arg...)`: application of a named function or bound value.
    Call {
        callee: String,
        args: Vec<Expr>,
    },
    /// `(def name (params...) body...)`: function definition.
    Def {
        name: String,
        params: Vec<String>,
        variadic: bool,
        body: Vec<Expr>,
    },
}

impl Expr {
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Int(v) => write!(f, "{v}"),
            Expr::Float(v) => write!(f, "{v}"),
            Expr::Str(s) => write!(f, "{s:?}"),
            Expr::Ident(id) => write!(f, "{id}"),
            Expr::Neg(e) => write!(f, "-{e}"),
            Expr::Binary { op, lhs, rhs } => write!(f, "({} {lhs} {rhs})", op.symbol()),
            Expr::Let { name, value } => write!(f, "(let {name} {value})"),
            Expr::Call { callee, args } => {
                write!(f, "({callee}")?;
                for a in args {
                    write!(f, " {a}")?;
                }
                write!(f, ")")
            }
            Expr::Def {
                name,
                params,
                variadic,
                body,
            } => {
                write!(f, "(def {name} (")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{p}")?;
                }
                if *variadic {
                    write!(f, " ...")?;
                }
                write!(f, ")")?;
                for e in body {
                    write!(f, " {e}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A parsed source module: a name plus its top-level expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleAst {
    pub name: String,
    pub exprs: Vec<Expr>,
}

impl ModuleAst {
    pub fn new(name: impl Into<String>) -> Self {
        ModuleAst {
            name: name.into(),
            exprs: Vec::new(),
        }
    }
}
