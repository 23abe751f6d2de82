use super::{Annotation, ConstValue, LineNo, TypeNode};

/// Whether a struct/exception field must be present. Field-id `0` is
/// rejected by the parser before a [`Field`] is ever constructed; id `0`
/// is reserved on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requiredness {
    Required,
    Optional,
    /// The IDL left requiredness unstated. Only legal when the loader
    /// was constructed non-strict; the compiler rejects this at generate
    /// time otherwise.
    Default,
}

/// One field within a struct, union, exception, or a synthesized
/// request/response. Unions never carry a default (rejected at generate
/// time) and are never `Required` (also rejected).
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub id: i16,
    pub name: String,
    pub ty: TypeNode,
    pub requiredness: Requiredness,
    pub default: Option<ConstValue>,
    pub annotations: Annotation,
    pub lineno: LineNo,
}
