use super::{Definition, Header};

/// The top-level syntax tree for one `.thrift` source file: an ordered
/// list of headers followed by an ordered list of definitions, exactly
/// as they appeared in the source.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub headers: Vec<Header>,
    pub definitions: Vec<Definition>,
}
