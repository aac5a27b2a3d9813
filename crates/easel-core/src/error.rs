use std::fmt;

/// A source location (1-based line and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub col: usize,
}

impl Span {
    pub fn point(line: usize, col: usize) -> Self {
        Span { line, col }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum EaselError {
    #[error("Lex error at {span}: {message}")]
    Lex { message: String, span: Span },

    #[error("Parse error at {span}: {message}")]
    Parse { message: String, span: Span },

    #[error("Lower error: {0}")]
    Lower(String),

    #[error("Type error: expected {expected}, got {got}")]
    Type { expected: String, got: String },

    #[error("Arity error: {name} expects {expected} args, got {got}")]
    Arity {
        name: String,
        expected: String,
        got: usize,
    },

    #[error("Unbound variable: {0}")]
    Unbound(String),

    #[error("Module error: {0}")]
    Module(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("VM panic: {0}")]
    VmPanic(String),
}

impl EaselError {
    pub fn lex(message: impl Into<String>, span: Span) -> Self {
        EaselError::Lex {
            message: message.into(),
            span,
        }
    }

    pub fn parse(message: impl Into<String>, span: Span) -> Self {
        EaselError::Parse {
            message: message.into(),
            span,
        }
    }

    pub fn lower(msg: impl Into<String>) -> Self {
        EaselError::Lower(msg.into())
    }

    pub fn type_error(expected: impl Into<String>, got: impl Into<String>) -> Self {
        EaselError::Type {
            expected: expected.into(),
            got: got.into(),
        }
    }

    pub fn arity(name: impl Into<String>, expected: impl Into<String>, got: usize) -> Self {
        EaselError::Arity {
            name: name.into(),
            expected: expected.into(),
            got,
        }
    }

    pub fn unbound(name: impl Into<String>) -> Self {
        EaselError::Unbound(name.into())
    }

    pub fn module(msg: impl Into<String>) -> Self {
        EaselError::Module(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        EaselError::Decode(msg.into())
    }

    pub fn io(msg: impl Into<String>) -> Self {
        EaselError::Io(msg.into())
    }

    pub fn vm_panic(msg: impl Into<String>) -> Self {
        EaselError::VmPanic(msg.into())
    }
}
