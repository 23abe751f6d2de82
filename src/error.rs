//! Centralised error taxonomy shared by every phase of the pipeline.

/// A source position: 1-based line number.
pub type LineNo = usize;

/// Root error type. Every fallible operation in this crate returns
/// `Result<T, ThriftError>` so callers can catch generically without
/// caring which phase produced the failure.
#[derive(Debug, thiserror::Error)]
pub enum ThriftError {
    #[error(transparent)]
    Parser(#[from] ParserError),

    #[error(transparent)]
    Compiler(#[from] CompilerError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Value(#[from] ValueError),
}

/// Lexing and parsing failures.
#[derive(Debug)]
pub struct ParserError {
    pub message: String,
    pub lineno: Option<LineNo>,
}

impl std::error::Error for ParserError {}

impl std::fmt::Display for ParserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.lineno {
            Some(l) => write!(f, "{} (line {l})", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl ParserError {
    pub fn new(message: impl Into<String>, lineno: Option<LineNo>) -> Self {
        Self {
            message: message.into(),
            lineno,
        }
    }

    pub fn eof() -> Self {
        Self::new("unexpected end of input", None)
    }
}

/// Failures raised while generating or linking the schema from an AST.
#[derive(Debug)]
pub struct CompilerError {
    pub message: String,
    pub lineno: Option<LineNo>,
}

impl std::error::Error for CompilerError {}

impl std::fmt::Display for CompilerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.lineno {
            Some(l) => write!(f, "{} (line {l})", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl CompilerError {
    pub fn new(message: impl Into<String>, lineno: Option<LineNo>) -> Self {
        Self {
            message: message.into(),
            lineno,
        }
    }
}

/// Failures while decoding or encoding Thrift Binary Protocol bytes.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("expected {expected} bytes but got {observed} bytes")]
    EndOfInput { expected: usize, observed: usize },

    #[error("unknown ttype {0:#x}")]
    UnknownTType(u8),

    #[error("unsupported version {0}")]
    UnsupportedVersion(i16),

    #[error("invalid UTF-8 in string field: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("{message}")]
    Other { message: String },

    /// A reply whose exception id is not declared in the function's
    /// `throws` clause. The raw wire struct is preserved for forensic
    /// use by the caller.
    #[error("unknown exception in reply")]
    UnknownException {
        thrift_response: crate::wire::WireValue,
    },
}

impl ProtocolError {
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

/// Value-layer failures raised by `TypeSpec::validate`/`from_wire` when the
/// *shape* of a value is wrong (wrong ttype, wrong element type, ...).
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct TypeError(pub String);

impl TypeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Value-layer failures raised when a value's *content* is invalid
/// (missing required field, union with zero or multiple fields set, ...).
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ValueError(pub String);

impl ValueError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub type Result<T> = std::result::Result<T, ThriftError>;
