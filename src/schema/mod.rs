//! The `TypeSpec` graph: the linked, in-memory representation of a
//! compiled Thrift schema, and the operations that drive runtime values
//! through it.

mod enum_spec;
mod field;
mod module;
mod primitive;
mod service_spec;
mod struct_spec;
mod typedef;
pub mod value;

pub use enum_spec::EnumSpec;
pub use field::{FieldSpec, Requiredness};
pub use module::Module;
pub use primitive::Primitive;
pub use service_spec::{FunctionSpec, ServiceSpec};
pub use struct_spec::{StructKind, StructSpec};
pub use typedef::TypedefSpec;
pub use value::{Instance, Value};

use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::LineNo;
use crate::error::{ThriftError, TypeError, ValueError};
use crate::wire::{FieldValue, StructValue, TType, WireValue};

/// A mutable slot holding a `TypeSpec`. Containers (`list<T>`, `set<T>`,
/// `map<K,V>`) hold their element type(s) behind this so that a forward
/// reference inside a container can be resolved in place during linking.
pub type TypeSlot = Rc<RefCell<TypeSpec>>;

pub fn slot(spec: TypeSpec) -> TypeSlot {
    Rc::new(RefCell::new(spec))
}

/// Anything that can resolve a (possibly qualified) type name to a
/// concrete `TypeSpec`. Implemented by the compiler's scope table;
/// kept as a trait here so the schema layer does not depend on the
/// compiler layer.
pub trait Scope {
    fn resolve_type(&self, name: &str, lineno: LineNo) -> Result<TypeSpec, ThriftError>;

    /// Resolves a (possibly qualified) service name, for `extends`
    /// clauses. Separate from `resolve_type` because services live in
    /// their own namespace, disjoint from types and constants.
    fn resolve_service(&self, name: &str, lineno: LineNo) -> Result<Rc<ServiceSpec>, ThriftError>;
}

/// A node in the schema graph. Cheap to `Clone`: every variant but
/// `Primitive`/`Reference` wraps an `Rc`, so cloning shares the
/// underlying spec rather than copying it.
#[derive(Debug, Clone)]
pub enum TypeSpec {
    Primitive(Primitive),
    List(TypeSlot),
    Set(TypeSlot),
    Map(TypeSlot, TypeSlot),
    Enum(Rc<EnumSpec>),
    /// Covers `struct`, `union`, and `exception`; `StructSpec::kind`
    /// distinguishes them for `validate`.
    Struct(Rc<StructSpec>),
    Typedef(Rc<TypedefSpec>),
    /// Transient: only ever appears before linking. A fully linked graph
    /// never contains this variant.
    Reference(String, LineNo),
}

impl TypeSpec {
    pub fn name(&self) -> String {
        match self {
            TypeSpec::Primitive(p) => p.name().to_string(),
            TypeSpec::List(inner) => format!("list<{}>", inner.borrow().name()),
            TypeSpec::Set(inner) => format!("set<{}>", inner.borrow().name()),
            TypeSpec::Map(k, v) => format!("map<{},{}>", k.borrow().name(), v.borrow().name()),
            TypeSpec::Enum(e) => e.name.clone(),
            TypeSpec::Struct(s) => s.name.clone(),
            TypeSpec::Typedef(t) => t.name.clone(),
            TypeSpec::Reference(name, _) => name.clone(),
        }
    }

    pub fn ttype_code(&self) -> TType {
        match self {
            TypeSpec::Primitive(p) => p.ttype_code(),
            TypeSpec::List(_) => TType::List,
            TypeSpec::Set(_) => TType::Set,
            TypeSpec::Map(_, _) => TType::Map,
            TypeSpec::Enum(_) => TType::I32,
            TypeSpec::Struct(_) => TType::Struct,
            TypeSpec::Typedef(t) => t.target().ttype_code(),
            TypeSpec::Reference(name, _) => {
                unreachable!("ttype_code() called on unresolved reference '{name}'")
            }
        }
    }

    /// Resolves every embedded `TypeSpec::Reference` against `scope`,
    /// recursing into children. Idempotent and safe on cyclic graphs: a
    /// struct/union/exception spec marks itself "linking in progress"
    /// before recursing into its own fields so a field that points back
    /// at an ancestor does not recurse forever.
    pub fn link(&self, scope: &dyn Scope) -> Result<(), ThriftError> {
        match self {
            TypeSpec::Primitive(_) | TypeSpec::Enum(_) => Ok(()),
            TypeSpec::List(inner) | TypeSpec::Set(inner) => link_slot(inner, scope),
            TypeSpec::Map(k, v) => {
                link_slot(k, scope)?;
                link_slot(v, scope)
            }
            TypeSpec::Struct(s) => s.link(scope),
            TypeSpec::Typedef(t) => t.link(scope),
            TypeSpec::Reference(name, lineno) => Err(ThriftError::from(
                crate::error::CompilerError::new(
                    format!("unresolved type reference '{name}'"),
                    Some(*lineno),
                ),
            )),
        }
    }

    pub fn validate(&self, value: &Value) -> Result<(), ThriftError> {
        match self {
            TypeSpec::Primitive(p) => validate_primitive(*p, value),
            TypeSpec::List(inner) => validate_seq("list", &inner.borrow(), value),
            TypeSpec::Set(inner) => validate_seq("set", &inner.borrow(), value),
            TypeSpec::Map(k, v) => {
                let Value::Map(pairs) = value else {
                    return Err(type_error(self, value));
                };
                for (mk, mv) in pairs {
                    k.borrow().validate(mk)?;
                    v.borrow().validate(mv)?;
                }
                Ok(())
            }
            TypeSpec::Enum(e) => {
                let Value::I32(v) = value else {
                    return Err(type_error(self, value));
                };
                if e.name_of(*v).is_none() {
                    return Err(ThriftError::from(ValueError::new(format!(
                        "{} is not a valid value of enum {}",
                        v, e.name
                    ))));
                }
                Ok(())
            }
            TypeSpec::Struct(s) => {
                let Value::Instance(instance) = value else {
                    return Err(type_error(self, value));
                };
                s.validate(instance)
            }
            TypeSpec::Typedef(t) => t.target().validate(value),
            TypeSpec::Reference(name, _) => {
                unreachable!("validate() called on unresolved reference '{name}'")
            }
        }
    }

    pub fn to_wire(&self, value: &Value) -> Result<WireValue, ThriftError> {
        self.validate(value)?;
        Ok(match self {
            TypeSpec::Primitive(p) => to_wire_primitive(*p, value),
            TypeSpec::List(inner) => {
                let Value::List(items) = value else {
                    unreachable!("validated above")
                };
                let inner_spec = inner.borrow();
                let values = items
                    .iter()
                    .map(|v| inner_spec.to_wire(v))
                    .collect::<Result<Vec<_>, _>>()?;
                WireValue::List {
                    value_ttype: inner_spec.ttype_code(),
                    values,
                }
            }
            TypeSpec::Set(inner) => {
                let Value::Set(items) = value else {
                    unreachable!("validated above")
                };
                let inner_spec = inner.borrow();
                let values = items
                    .iter()
                    .map(|v| inner_spec.to_wire(v))
                    .collect::<Result<Vec<_>, _>>()?;
                WireValue::Set {
                    value_ttype: inner_spec.ttype_code(),
                    values,
                }
            }
            TypeSpec::Map(k, v) => {
                let Value::Map(pairs) = value else {
                    unreachable!("validated above")
                };
                let key_spec = k.borrow();
                let value_spec = v.borrow();
                let wire_pairs = pairs
                    .iter()
                    .map(|(mk, mv)| Ok((key_spec.to_wire(mk)?, value_spec.to_wire(mv)?)))
                    .collect::<Result<Vec<_>, ThriftError>>()?;
                WireValue::Map {
                    key_ttype: key_spec.ttype_code(),
                    value_ttype: value_spec.ttype_code(),
                    pairs: wire_pairs,
                }
            }
            TypeSpec::Enum(_) => {
                let Value::I32(v) = value else {
                    unreachable!("validated above")
                };
                WireValue::I32(*v)
            }
            TypeSpec::Struct(s) => {
                let Value::Instance(instance) = value else {
                    unreachable!("validated above")
                };
                s.to_wire(instance)?
            }
            TypeSpec::Typedef(t) => return t.target().to_wire(value),
            TypeSpec::Reference(name, _) => {
                unreachable!("to_wire() called on unresolved reference '{name}'")
            }
        })
    }

    pub fn from_wire(&self, wire: &WireValue) -> Result<Value, ThriftError> {
        if wire.ttype_code() != self.ttype_code() {
            return Err(ThriftError::from(ValueError::new(format!(
                "expected wire type for {}, found {:?}",
                self.name(),
                wire.ttype_code()
            ))));
        }

        Ok(match self {
            TypeSpec::Primitive(p) => from_wire_primitive(*p, wire)?,
            TypeSpec::List(inner) => {
                let WireValue::List { values, .. } = wire else {
                    unreachable!("ttype checked above")
                };
                let inner_spec = inner.borrow();
                Value::List(
                    values
                        .iter()
                        .map(|v| inner_spec.from_wire(v))
                        .collect::<Result<Vec<_>, _>>()?,
                )
            }
            TypeSpec::Set(inner) => {
                let WireValue::Set { values, .. } = wire else {
                    unreachable!("ttype checked above")
                };
                let inner_spec = inner.borrow();
                Value::Set(
                    values
                        .iter()
                        .map(|v| inner_spec.from_wire(v))
                        .collect::<Result<Vec<_>, _>>()?,
                )
            }
            TypeSpec::Map(k, v) => {
                let WireValue::Map { pairs, .. } = wire else {
                    unreachable!("ttype checked above")
                };
                let key_spec = k.borrow();
                let value_spec = v.borrow();
                // Duplicate keys resolve last-write-wins, matching the
                // protocol layer's documented decode behavior.
                let mut decoded: Vec<(Value, Value)> = Vec::with_capacity(pairs.len());
                for (wk, wv) in pairs {
                    let key = key_spec.from_wire(wk)?;
                    let val = value_spec.from_wire(wv)?;
                    if let Some(slot) = decoded.iter_mut().find(|(k, _)| *k == key) {
                        slot.1 = val;
                    } else {
                        decoded.push((key, val));
                    }
                }
                Value::Map(decoded)
            }
            TypeSpec::Enum(e) => {
                let WireValue::I32(v) = wire else {
                    unreachable!("ttype checked above")
                };
                if e.name_of(*v).is_none() {
                    return Err(ThriftError::from(ValueError::new(format!(
                        "{} is not a valid value of enum {}",
                        v, e.name
                    ))));
                }
                Value::I32(*v)
            }
            TypeSpec::Struct(s) => {
                let WireValue::Struct(sv) = wire else {
                    unreachable!("ttype checked above")
                };
                Value::Instance(s.from_wire(sv)?)
            }
            TypeSpec::Typedef(t) => return t.target().from_wire(wire),
            TypeSpec::Reference(name, _) => {
                unreachable!("from_wire() called on unresolved reference '{name}'")
            }
        })
    }

    pub fn to_primitive(&self, value: &Value) -> Result<serde_json::Value, ThriftError> {
        self.validate(value)?;
        use serde_json::Value as Json;
        Ok(match self {
            TypeSpec::Primitive(Primitive::Bool) => {
                let Value::Bool(b) = value else { unreachable!() };
                Json::Bool(*b)
            }
            TypeSpec::Primitive(Primitive::Byte) => num_json(value_as_i64(value)),
            TypeSpec::Primitive(Primitive::I16) => num_json(value_as_i64(value)),
            TypeSpec::Primitive(Primitive::I32) => num_json(value_as_i64(value)),
            TypeSpec::Primitive(Primitive::I64) => num_json(value_as_i64(value)),
            TypeSpec::Primitive(Primitive::Double) => {
                let Value::Double(d) = value else { unreachable!() };
                serde_json::Number::from_f64(*d)
                    .map(Json::Number)
                    .unwrap_or(Json::Null)
            }
            TypeSpec::Primitive(Primitive::String) => {
                let Value::String(s) = value else { unreachable!() };
                Json::String(s.clone())
            }
            TypeSpec::Primitive(Primitive::Binary) => {
                let Value::Binary(b) = value else { unreachable!() };
                Json::Array(b.iter().map(|byte| Json::Number((*byte).into())).collect())
            }
            TypeSpec::List(inner) => {
                let Value::List(items) = value else { unreachable!() };
                let inner_spec = inner.borrow();
                Json::Array(
                    items
                        .iter()
                        .map(|v| inner_spec.to_primitive(v))
                        .collect::<Result<Vec<_>, _>>()?,
                )
            }
            TypeSpec::Set(inner) => {
                let Value::Set(items) = value else { unreachable!() };
                let inner_spec = inner.borrow();
                Json::Array(
                    items
                        .iter()
                        .map(|v| inner_spec.to_primitive(v))
                        .collect::<Result<Vec<_>, _>>()?,
                )
            }
            TypeSpec::Map(k, v) => {
                let Value::Map(pairs) = value else { unreachable!() };
                let key_spec = k.borrow();
                let value_spec = v.borrow();
                Json::Array(
                    pairs
                        .iter()
                        .map(|(mk, mv)| {
                            Ok(Json::Array(vec![
                                key_spec.to_primitive(mk)?,
                                value_spec.to_primitive(mv)?,
                            ]))
                        })
                        .collect::<Result<Vec<_>, ThriftError>>()?,
                )
            }
            TypeSpec::Enum(_) => {
                let Value::I32(v) = value else { unreachable!() };
                Json::Number((*v).into())
            }
            TypeSpec::Struct(s) => {
                let Value::Instance(instance) = value else { unreachable!() };
                s.to_primitive(instance)?
            }
            TypeSpec::Typedef(t) => return t.target().to_primitive(value),
            TypeSpec::Reference(name, _) => {
                unreachable!("to_primitive() called on unresolved reference '{name}'")
            }
        })
    }

    pub fn from_primitive(&self, json: &serde_json::Value) -> Result<Value, ThriftError> {
        use serde_json::Value as Json;
        let value = match self {
            TypeSpec::Primitive(Primitive::Bool) => {
                Value::Bool(json.as_bool().ok_or_else(|| primitive_shape_error(self, json))?)
            }
            TypeSpec::Primitive(Primitive::Byte) => {
                Value::Byte(json_i64(json, self)? as i8)
            }
            TypeSpec::Primitive(Primitive::I16) => Value::I16(json_i64(json, self)? as i16),
            TypeSpec::Primitive(Primitive::I32) => Value::I32(json_i64(json, self)? as i32),
            TypeSpec::Primitive(Primitive::I64) => Value::I64(json_i64(json, self)?),
            TypeSpec::Primitive(Primitive::Double) => Value::Double(
                json.as_f64().ok_or_else(|| primitive_shape_error(self, json))?,
            ),
            TypeSpec::Primitive(Primitive::String) => Value::String(
                json.as_str()
                    .ok_or_else(|| primitive_shape_error(self, json))?
                    .to_string(),
            ),
            TypeSpec::Primitive(Primitive::Binary) => {
                let Json::Array(items) = json else {
                    return Err(primitive_shape_error(self, json));
                };
                let mut bytes = Vec::with_capacity(items.len());
                for item in items {
                    bytes.push(item.as_i64().ok_or_else(|| primitive_shape_error(self, json))? as u8);
                }
                Value::Binary(bytes)
            }
            TypeSpec::List(inner) => {
                let Json::Array(items) = json else {
                    return Err(primitive_shape_error(self, json));
                };
                let inner_spec = inner.borrow();
                Value::List(
                    items
                        .iter()
                        .map(|v| inner_spec.from_primitive(v))
                        .collect::<Result<Vec<_>, _>>()?,
                )
            }
            TypeSpec::Set(inner) => {
                let Json::Array(items) = json else {
                    return Err(primitive_shape_error(self, json));
                };
                let inner_spec = inner.borrow();
                Value::Set(
                    items
                        .iter()
                        .map(|v| inner_spec.from_primitive(v))
                        .collect::<Result<Vec<_>, _>>()?,
                )
            }
            TypeSpec::Map(k, v) => {
                let Json::Array(items) = json else {
                    return Err(primitive_shape_error(self, json));
                };
                let key_spec = k.borrow();
                let value_spec = v.borrow();
                let mut pairs = Vec::with_capacity(items.len());
                for item in items {
                    let Json::Array(kv) = item else {
                        return Err(primitive_shape_error(self, json));
                    };
                    let [jk, jv] = kv.as_slice() else {
                        return Err(primitive_shape_error(self, json));
                    };
                    pairs.push((key_spec.from_primitive(jk)?, value_spec.from_primitive(jv)?));
                }
                Value::Map(pairs)
            }
            TypeSpec::Enum(e) => {
                let v = json_i64(json, self)? as i32;
                if e.name_of(v).is_none() {
                    return Err(ThriftError::from(ValueError::new(format!(
                        "{v} is not a valid value of enum {}",
                        e.name
                    ))));
                }
                Value::I32(v)
            }
            TypeSpec::Struct(s) => Value::Instance(s.from_primitive(json)?),
            TypeSpec::Typedef(t) => return t.target().from_primitive(json),
            TypeSpec::Reference(name, _) => {
                unreachable!("from_primitive() called on unresolved reference '{name}'")
            }
        };
        self.validate(&value)?;
        Ok(value)
    }
}

fn link_slot(slot: &TypeSlot, scope: &dyn Scope) -> Result<(), ThriftError> {
    let needs_resolve = matches!(&*slot.borrow(), TypeSpec::Reference(_, _));
    if needs_resolve {
        let (name, lineno) = match &*slot.borrow() {
            TypeSpec::Reference(name, lineno) => (name.clone(), *lineno),
            _ => unreachable!(),
        };
        let resolved = scope.resolve_type(&name, lineno)?;
        *slot.borrow_mut() = resolved;
    }
    slot.borrow().link(scope)
}

fn type_error(spec: &TypeSpec, value: &Value) -> ThriftError {
    ThriftError::from(TypeError::new(format!(
        "expected a value of type {}, found {value:?}",
        spec.name()
    )))
}

fn primitive_shape_error(spec: &TypeSpec, json: &serde_json::Value) -> ThriftError {
    ThriftError::from(TypeError::new(format!(
        "primitive tree does not match type {}: {json:?}",
        spec.name()
    )))
}

fn json_i64(json: &serde_json::Value, spec: &TypeSpec) -> Result<i64, ThriftError> {
    json.as_i64().ok_or_else(|| primitive_shape_error(spec, json))
}

fn num_json(value: i64) -> serde_json::Value {
    serde_json::Value::Number(value.into())
}

fn value_as_i64(value: &Value) -> i64 {
    match value {
        Value::Byte(v) => *v as i64,
        Value::I16(v) => *v as i64,
        Value::I32(v) => *v as i64,
        Value::I64(v) => *v,
        other => unreachable!("value_as_i64 called on non-integer value {other:?}"),
    }
}

fn validate_primitive(primitive: Primitive, value: &Value) -> Result<(), ThriftError> {
    let ok = matches!(
        (primitive, value),
        (Primitive::Bool, Value::Bool(_))
            | (Primitive::Byte, Value::Byte(_))
            | (Primitive::I16, Value::I16(_))
            | (Primitive::I32, Value::I32(_))
            | (Primitive::I64, Value::I64(_))
            | (Primitive::Double, Value::Double(_))
            | (Primitive::Binary, Value::Binary(_))
            | (Primitive::String, Value::String(_))
    );
    if ok {
        Ok(())
    } else {
        Err(ThriftError::from(TypeError::new(format!(
            "expected a {} value, found {value:?}",
            primitive.name()
        ))))
    }
}

fn validate_seq(kind: &str, element: &TypeSpec, value: &Value) -> Result<(), ThriftError> {
    let items: &[Value] = match value {
        Value::List(items) if kind == "list" => items,
        Value::Set(items) if kind == "set" => items,
        _ => {
            return Err(ThriftError::from(TypeError::new(format!(
                "expected a {kind}<{}> value, found {value:?}",
                element.name()
            ))))
        }
    };
    for item in items {
        element.validate(item)?;
    }
    Ok(())
}

fn to_wire_primitive(primitive: Primitive, value: &Value) -> WireValue {
    match (primitive, value) {
        (Primitive::Bool, Value::Bool(b)) => WireValue::Bool(*b),
        (Primitive::Byte, Value::Byte(b)) => WireValue::Byte(*b),
        (Primitive::I16, Value::I16(v)) => WireValue::I16(*v),
        (Primitive::I32, Value::I32(v)) => WireValue::I32(*v),
        (Primitive::I64, Value::I64(v)) => WireValue::I64(*v),
        (Primitive::Double, Value::Double(v)) => WireValue::Double(*v),
        (Primitive::Binary, Value::Binary(b)) => WireValue::Binary(b.clone()),
        (Primitive::String, Value::String(s)) => WireValue::Binary(s.as_bytes().to_vec()),
        _ => unreachable!("validated before to_wire_primitive is called"),
    }
}

fn from_wire_primitive(primitive: Primitive, wire: &WireValue) -> Result<Value, ThriftError> {
    Ok(match (primitive, wire) {
        (Primitive::Bool, WireValue::Bool(b)) => Value::Bool(*b),
        (Primitive::Byte, WireValue::Byte(b)) => Value::Byte(*b),
        (Primitive::I16, WireValue::I16(v)) => Value::I16(*v),
        (Primitive::I32, WireValue::I32(v)) => Value::I32(*v),
        (Primitive::I64, WireValue::I64(v)) => Value::I64(*v),
        (Primitive::Double, WireValue::Double(v)) => Value::Double(*v),
        (Primitive::Binary, WireValue::Binary(b)) => Value::Binary(b.clone()),
        (Primitive::String, WireValue::Binary(b)) => Value::String(
            std::str::from_utf8(b)
                .map_err(crate::error::ProtocolError::from)?
                .to_string(),
        ),
        _ => unreachable!("ttype checked by caller"),
    })
}

/// Builds a [`WireValue::Struct`]/[`Instance`] field-value helper shared
/// by [`struct_spec`].
pub(crate) fn field_value(id: i16, ty: &TypeSpec, value: &Value) -> Result<FieldValue, ThriftError> {
    Ok(FieldValue::new(id, ty.ttype_code(), ty.to_wire(value)?))
}

pub(crate) fn struct_value_of(fields: Vec<FieldValue>) -> WireValue {
    WireValue::Struct(StructValue::new(fields))
}
