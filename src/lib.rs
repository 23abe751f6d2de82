//! Thrift IDL parser, schema compiler, and Binary Protocol codec.
//!
//! Compile a `.thrift` source into a linked [`schema::Module`] via
//! [`loader::Loader`] (or [`compiler::compile`] directly, for callers who
//! already have their own parsed [`ast::Program`]), then move values
//! across the wire with [`runtime::dumps`]/[`runtime::loads`].

pub mod ast;
pub mod compiler;
pub mod constant;
pub mod error;
pub mod lexer;
pub mod loader;
pub mod parser;
pub mod protocol;
pub mod runtime;
pub mod schema;
pub mod wire;

pub use error::{Result, ThriftError};
pub use loader::Loader;
pub use schema::Module;
