//! Protocol-independent wire values: the hand-off point between a
//! [`crate::schema::TypeSpec`]-driven value and a concrete byte encoding.

mod ttype;
mod value;
mod visitor;

pub use ttype::TType;
pub use value::{FieldValue, StructValue, WireValue};
pub use visitor::ValueVisitor;
