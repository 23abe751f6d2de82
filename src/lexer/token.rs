/// A single lexed token together with the 1-based source line it started
/// on, matching the `Position` bookkeeping every AST node also carries.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lineno: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lineno: usize) -> Self {
        Self { kind, lineno }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    Namespace,
    Include,
    Void,
    BoolType,
    Byte,
    I16,
    I32,
    I64,
    Double,
    StringType,
    Binary,
    Map,
    List,
    Set,
    Oneway,
    Typedef,
    Struct,
    Union,
    Exception,
    Extends,
    Throws,
    Service,
    Enum,
    Const,
    Required,
    Optional,

    // Literals
    BoolConst(bool),
    IntConst(i64),
    DubConst(f64),
    StringLiteral(String),
    Identifier(String),

    // Punctuation
    Colon,
    Semicolon,
    Comma,
    Equals,
    Star,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LAngle,
    RAngle,
    LBracket,
    RBracket,
}

impl TokenKind {
    /// Human-readable name used in parser error messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Identifier(s) => format!("identifier '{s}'"),
            TokenKind::StringLiteral(s) => format!("string literal \"{s}\""),
            TokenKind::IntConst(v) => format!("integer {v}"),
            TokenKind::DubConst(v) => format!("double {v}"),
            TokenKind::BoolConst(v) => format!("bool {v}"),
            other => format!("{other:?}"),
        }
    }
}
