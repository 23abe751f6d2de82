use super::{Annotation, ConstValue, Field, LineNo, ServiceDef, TypeNode};

#[derive(Debug, Clone, PartialEq)]
pub struct ConstDef {
    pub name: String,
    pub ty: TypeNode,
    pub value: ConstValue,
    pub lineno: LineNo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedefDef {
    pub name: String,
    pub target: TypeNode,
    pub annotations: Annotation,
    pub lineno: LineNo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumItem {
    pub name: String,
    /// Explicit value, if written. Items without one take the previous
    /// item's value plus one (or `0` for the first item), matching the
    /// Thrift IDL rule.
    pub value: Option<i32>,
    pub annotations: Annotation,
    pub lineno: LineNo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    pub name: String,
    pub items: Vec<EnumItem>,
    pub annotations: Annotation,
    pub lineno: LineNo,
}

/// `struct`, `union`, and `exception` share one grammar production and
/// one AST shape; [`StructKind`] records which keyword introduced it so
/// the compiler can apply the right generate-time rules (unions reject
/// `required`/defaults, exceptions are flagged for host error
/// integration).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructKind {
    Struct,
    Union,
    Exception,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
    pub kind: StructKind,
    pub name: String,
    pub fields: Vec<Field>,
    pub annotations: Annotation,
    pub lineno: LineNo,
}

/// Re-exported for call sites that only care about the exception
/// variant; structurally identical to [`StructDef`] with `kind ==
/// StructKind::Exception`.
pub type ExceptionDef = StructDef;

#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    Const(ConstDef),
    Typedef(TypedefDef),
    Enum(EnumDef),
    Struct(StructDef),
    Service(ServiceDef),
}
