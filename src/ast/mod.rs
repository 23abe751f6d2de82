//! Concrete syntax tree produced by the parser.
//!
//! Every node carries the 1-based source line it started on so that
//! compiler diagnostics can point back at the original `.thrift` text.

mod annotation;
mod constant;
mod definition;
mod field;
mod header;
mod program;
mod service;
mod ty;

pub use annotation::Annotation;
pub use constant::ConstValue;
pub use definition::{
    ConstDef, Definition, EnumDef, EnumItem, ExceptionDef, StructDef, StructKind, TypedefDef,
};
pub use field::{Field, Requiredness};
pub use header::{Header, IncludeHeader, NamespaceHeader};
pub use program::Program;
pub use service::{FunctionDef, ServiceDef};
pub use ty::TypeNode;

pub type LineNo = usize;
