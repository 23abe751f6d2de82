use std::rc::Rc;

use super::struct_spec::StructSpec;

/// A host-side value constructed against a [`super::TypeSpec`]. Because
/// this crate does not generate static per-type Rust structs (§9 of the
/// design doc — there is no code generation step), every declared
/// struct/union/exception surfaces as the same dynamically-typed
/// [`Instance`], keyed by the [`StructSpec`] it was built from.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Byte(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Double(f64),
    Binary(Vec<u8>),
    String(String),
    List(Vec<Value>),
    Set(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Instance(Instance),
}

/// A constructed struct/union/exception value: an ordered list of
/// `(field_id, value)` pairs plus a handle back to the spec that shaped
/// it, so callers can look fields up by name.
#[derive(Debug, Clone)]
pub struct Instance {
    pub spec: Rc<StructSpec>,
    fields: Vec<(i16, Value)>,
}

impl Instance {
    pub fn new(spec: Rc<StructSpec>, fields: Vec<(i16, Value)>) -> Self {
        Self { spec, fields }
    }

    pub fn fields(&self) -> &[(i16, Value)] {
        &self.fields
    }

    pub fn get(&self, id: i16) -> Option<&Value> {
        self.fields.iter().find(|(fid, _)| *fid == id).map(|(_, v)| v)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        let field = self.spec.field_by_name(name)?;
        self.get(field.id)
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.spec, &other.spec) && self.fields == other.fields
    }
}
