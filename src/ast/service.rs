use super::{Annotation, Field, LineNo, TypeNode};

/// One function declared inside a `service`. `return_type` is `None` for
/// `void` and `Some` oneway functions too (oneway functions must be
/// `void`; the compiler rejects a oneway function with a non-void return
/// at generate time rather than the parser refusing to parse it).
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub oneway: bool,
    pub return_type: Option<TypeNode>,
    pub params: Vec<Field>,
    pub throws: Vec<Field>,
    pub annotations: Annotation,
    pub lineno: LineNo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDef {
    pub name: String,
    pub extends: Option<String>,
    pub functions: Vec<FunctionDef>,
    pub annotations: Annotation,
    pub lineno: LineNo,
}
