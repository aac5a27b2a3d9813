pub mod ast;
pub mod error;

pub use ast::{BinaryOp, Expr, ModuleAst};
pub use error::{EaselError, Span};
