use std::collections::HashMap;

use super::ttype::TType;
use super::visitor::ValueVisitor;

/// A single field within a [`StructValue`]: `(field_id, ttype, value)`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
    pub id: i16,
    pub ttype: TType,
    pub value: WireValue,
}

impl FieldValue {
    pub fn new(id: i16, ttype: TType, value: WireValue) -> Self {
        Self { id, ttype, value }
    }
}

/// An ordered collection of [`FieldValue`]s, indexed by `(id, ttype)` for
/// O(1) lookup while preserving declaration/arrival order for iteration
/// and re-encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct StructValue {
    fields: Vec<FieldValue>,
    index: HashMap<(i16, i8), usize>,
}

impl StructValue {
    pub fn new(fields: Vec<FieldValue>) -> Self {
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, f)| ((f.id, f.ttype.code()), i))
            .collect();
        Self { fields, index }
    }

    pub fn fields(&self) -> &[FieldValue] {
        &self.fields
    }

    pub fn get(&self, id: i16, ttype: TType) -> Option<&WireValue> {
        self.index
            .get(&(id, ttype.code()))
            .map(|&i| &self.fields[i].value)
    }

    pub fn get_by_id(&self, id: i16) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.id == id)
    }
}

/// Tagged union of the 11 Thrift wire types.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Bool(bool),
    Byte(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Double(f64),
    Binary(Vec<u8>),
    Struct(StructValue),
    Map {
        key_ttype: TType,
        value_ttype: TType,
        pairs: Vec<(WireValue, WireValue)>,
    },
    Set {
        value_ttype: TType,
        values: Vec<WireValue>,
    },
    List {
        value_ttype: TType,
        values: Vec<WireValue>,
    },
}

impl WireValue {
    pub fn ttype_code(&self) -> TType {
        match self {
            WireValue::Bool(_) => TType::Bool,
            WireValue::Byte(_) => TType::Byte,
            WireValue::I16(_) => TType::I16,
            WireValue::I32(_) => TType::I32,
            WireValue::I64(_) => TType::I64,
            WireValue::Double(_) => TType::Double,
            WireValue::Binary(_) => TType::Binary,
            WireValue::Struct(_) => TType::Struct,
            WireValue::Map { .. } => TType::Map,
            WireValue::Set { .. } => TType::Set,
            WireValue::List { .. } => TType::List,
        }
    }

    /// Dispatches to the matching `visit_*` method on `visitor`. This is
    /// the only sanctioned way to walk a `WireValue` generically; callers
    /// should not match on the variants directly outside of this module.
    pub fn apply<R>(&self, visitor: &mut dyn ValueVisitor<R>) -> R {
        match self {
            WireValue::Bool(v) => visitor.visit_bool(*v),
            WireValue::Byte(v) => visitor.visit_byte(*v),
            WireValue::I16(v) => visitor.visit_i16(*v),
            WireValue::I32(v) => visitor.visit_i32(*v),
            WireValue::I64(v) => visitor.visit_i64(*v),
            WireValue::Double(v) => visitor.visit_double(*v),
            WireValue::Binary(v) => visitor.visit_binary(v),
            WireValue::Struct(s) => visitor.visit_struct(s.fields()),
            WireValue::Map {
                key_ttype,
                value_ttype,
                pairs,
            } => visitor.visit_map(*key_ttype, *value_ttype, pairs),
            WireValue::Set {
                value_ttype,
                values,
            } => visitor.visit_set(*value_ttype, values),
            WireValue::List {
                value_ttype,
                values,
            } => visitor.visit_list(*value_ttype, values),
        }
    }
}
