use std::cell::Cell;

use crate::error::{ThriftError, TypeError, ValueError};
use crate::wire::{FieldValue, StructValue, WireValue};

use super::field::{FieldSpec, Requiredness};
use super::value::{Instance, Value};
use super::{field_value, struct_value_of, Scope, TypeSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructKind {
    Struct,
    Union,
    /// Behaves identically to `Struct` on the wire; flagged so host
    /// bindings can integrate it with their error-handling surface.
    Exception,
}

/// Backs `struct`, `union`, and `exception` declarations, as well as the
/// synthesized request/response specs a service function carries.
#[derive(Debug)]
pub struct StructSpec {
    pub kind: StructKind,
    pub name: String,
    fields: Vec<FieldSpec>,
    /// Function-result unions must tolerate zero fields set (a void
    /// reply); every other union requires exactly one.
    allow_empty_union: bool,
    linking: Cell<bool>,
}

impl StructSpec {
    pub fn new(kind: StructKind, name: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            kind,
            name: name.into(),
            fields,
            allow_empty_union: false,
            linking: Cell::new(false),
        }
    }

    pub fn new_union_result(name: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            kind: StructKind::Union,
            name: name.into(),
            fields,
            allow_empty_union: true,
            linking: Cell::new(false),
        }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field_by_id(&self, id: i16) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn link(&self, scope: &dyn Scope) -> Result<(), ThriftError> {
        if self.linking.get() {
            return Ok(());
        }
        self.linking.set(true);
        for field in &self.fields {
            field.link(scope)?;
        }
        self.linking.set(false);
        Ok(())
    }

    /// Builds an instance from positional arguments (in declaration
    /// order, for required fields without defaults) and named arguments
    /// (any field). Unions take no positional arguments.
    pub fn construct(
        &self,
        positional: Vec<Value>,
        named: Vec<(String, Value)>,
    ) -> Result<Vec<(i16, Value)>, ThriftError> {
        match self.kind {
            StructKind::Union => self.construct_union(positional, named),
            StructKind::Struct | StructKind::Exception => {
                self.construct_struct(positional, named)
            }
        }
    }

    fn positional_slots(&self) -> Vec<&FieldSpec> {
        self.fields
            .iter()
            .filter(|f| f.requiredness == Requiredness::Required && !f.has_default())
            .collect()
    }

    fn construct_struct(
        &self,
        positional: Vec<Value>,
        named: Vec<(String, Value)>,
    ) -> Result<Vec<(i16, Value)>, ThriftError> {
        let slots = self.positional_slots();
        if positional.len() > slots.len() {
            return Err(ThriftError::from(TypeError::new(format!(
                "{} takes at most {} positional argument(s), got {}",
                self.name,
                slots.len(),
                positional.len()
            ))));
        }

        let mut set_ids = std::collections::HashSet::new();
        let mut out = Vec::new();

        for (field, value) in slots.into_iter().zip(positional) {
            field.ty().validate(&value)?;
            set_ids.insert(field.id);
            out.push((field.id, value));
        }

        for (name, value) in named {
            let Some(field) = self.field_by_name(&name) else {
                return Err(ThriftError::from(TypeError::new(format!(
                    "{} has no field named '{name}'",
                    self.name
                ))));
            };
            if !set_ids.insert(field.id) {
                return Err(ThriftError::from(TypeError::new(format!(
                    "field '{name}' of {} was supplied both positionally and by name",
                    self.name
                ))));
            }
            field.ty().validate(&value)?;
            out.push((field.id, value));
        }

        for field in &self.fields {
            if set_ids.contains(&field.id) {
                continue;
            }
            if let Some(default) = field.default() {
                out.push((field.id, default));
            } else if field.requiredness == Requiredness::Required {
                return Err(ThriftError::from(ValueError::new(format!(
                    "missing required field '{}' of {}",
                    field.name, self.name
                ))));
            }
        }

        Ok(out)
    }

    fn construct_union(
        &self,
        positional: Vec<Value>,
        named: Vec<(String, Value)>,
    ) -> Result<Vec<(i16, Value)>, ThriftError> {
        if !positional.is_empty() {
            return Err(ThriftError::from(TypeError::new(format!(
                "{} is a union and takes no positional arguments",
                self.name
            ))));
        }

        let non_null: Vec<(String, Value)> = named;
        if non_null.len() > 1 {
            return Err(ThriftError::from(ValueError::new(format!(
                "{} is a union; at most one field may be set, got {}",
                self.name,
                non_null.len()
            ))));
        }
        if non_null.is_empty() && !self.allow_empty_union {
            return Err(ThriftError::from(ValueError::new(format!(
                "{} is a union; exactly one field must be set",
                self.name
            ))));
        }

        let mut out = Vec::new();
        for (name, value) in non_null {
            let Some(field) = self.field_by_name(&name) else {
                return Err(ThriftError::from(TypeError::new(format!(
                    "{} has no field named '{name}'",
                    self.name
                ))));
            };
            field.ty().validate(&value)?;
            out.push((field.id, value));
        }
        Ok(out)
    }

    pub fn validate(&self, instance: &Instance) -> Result<(), ThriftError> {
        match self.kind {
            StructKind::Struct | StructKind::Exception => {
                for field in &self.fields {
                    match instance.get(field.id) {
                        Some(value) => field.ty().validate(value)?,
                        None if field.requiredness == Requiredness::Required => {
                            return Err(ThriftError::from(ValueError::new(format!(
                                "missing required field '{}' of {}",
                                field.name, self.name
                            ))))
                        }
                        None => {}
                    }
                }
            }
            StructKind::Union => {
                let set = instance.fields().len();
                if set > 1 {
                    return Err(ThriftError::from(ValueError::new(format!(
                        "{} is a union but {set} fields are set",
                        self.name
                    ))));
                }
                if set == 0 && !self.allow_empty_union {
                    return Err(ThriftError::from(ValueError::new(format!(
                        "{} is a union; exactly one field must be set",
                        self.name
                    ))));
                }
                for (id, value) in instance.fields() {
                    let field = self.field_by_id(*id).ok_or_else(|| {
                        ThriftError::from(TypeError::new(format!(
                            "{} has no field with id {id}",
                            self.name
                        )))
                    })?;
                    field.ty().validate(value)?;
                }
            }
        }
        Ok(())
    }

    pub fn to_wire(&self, instance: &Instance) -> Result<WireValue, ThriftError> {
        let mut wire_fields = Vec::new();
        for field in &self.fields {
            if let Some(value) = instance.get(field.id) {
                wire_fields.push(field_value(field.id, &field.ty(), value)?);
            }
        }
        Ok(struct_value_of(wire_fields))
    }

    pub fn from_wire(self: &std::rc::Rc<Self>, wire: &StructValue) -> Result<Instance, ThriftError> {
        let mut out = Vec::new();
        for FieldValue { id, value, .. } in wire.fields() {
            let Some(field) = self.field_by_id(*id) else {
                continue; // unknown field: forward-compatible, ignore
            };
            out.push((*id, field.ty().from_wire(value)?));
        }
        let instance = Instance::new(self.clone(), out);
        self.validate(&instance)?;
        Ok(instance)
    }

    pub fn to_primitive(&self, instance: &Instance) -> Result<serde_json::Value, ThriftError> {
        let mut map = serde_json::Map::new();
        for field in &self.fields {
            if let Some(value) = instance.get(field.id) {
                map.insert(field.name.clone(), field.ty().to_primitive(value)?);
            }
        }
        Ok(serde_json::Value::Object(map))
    }

    pub fn from_primitive(
        self: &std::rc::Rc<Self>,
        json: &serde_json::Value,
    ) -> Result<Instance, ThriftError> {
        let serde_json::Value::Object(map) = json else {
            return Err(ThriftError::from(TypeError::new(format!(
                "expected an object for {}, found {json:?}",
                self.name
            ))));
        };

        let mut out = Vec::new();
        for (name, value) in map {
            let Some(field) = self.field_by_name(name) else {
                return Err(ThriftError::from(TypeError::new(format!(
                    "{} has no field named '{name}'",
                    self.name
                ))));
            };
            out.push((field.id, field.ty().from_primitive(value)?));
        }

        let instance = Instance::new(self.clone(), out);
        self.validate(&instance)?;
        Ok(instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Primitive;

    fn string_field(id: i16, name: &str, requiredness: Requiredness) -> FieldSpec {
        FieldSpec::new(
            id,
            name,
            TypeSpec::Primitive(Primitive::String),
            requiredness,
            None,
        )
    }

    #[test]
    fn struct_construct_accepts_positional_and_named() {
        let spec = StructSpec::new(
            StructKind::Struct,
            "Item",
            vec![
                string_field(1, "key", Requiredness::Required),
                string_field(2, "value", Requiredness::Required),
            ],
        );
        let fields = spec
            .construct(
                vec![Value::String("foo".into())],
                vec![("value".to_string(), Value::String("bar".into()))],
            )
            .unwrap();
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn struct_construct_rejects_double_supplied_field() {
        let spec = StructSpec::new(
            StructKind::Struct,
            "Item",
            vec![string_field(1, "key", Requiredness::Required)],
        );
        let err = spec
            .construct(
                vec![Value::String("foo".into())],
                vec![("key".to_string(), Value::String("bar".into()))],
            )
            .unwrap_err();
        assert!(matches!(err, ThriftError::Type(_)));
    }

    #[test]
    fn struct_construct_rejects_missing_required_field() {
        let spec = StructSpec::new(
            StructKind::Struct,
            "Item",
            vec![string_field(1, "key", Requiredness::Required)],
        );
        let err = spec.construct(vec![], vec![]).unwrap_err();
        assert!(matches!(err, ThriftError::Value(_)));
    }

    #[test]
    fn union_rejects_zero_and_multiple_fields() {
        let spec = StructSpec::new(
            StructKind::Union,
            "U",
            vec![
                string_field(1, "a", Requiredness::Optional),
                string_field(2, "b", Requiredness::Optional),
            ],
        );
        assert!(spec.construct(vec![], vec![]).is_err());
        assert!(spec
            .construct(
                vec![],
                vec![
                    ("a".to_string(), Value::String("x".into())),
                    ("b".to_string(), Value::String("y".into())),
                ],
            )
            .is_err());
        assert!(spec
            .construct(vec![], vec![("a".to_string(), Value::String("x".into()))])
            .is_ok());
    }

    #[test]
    fn function_result_union_permits_empty() {
        let spec = StructSpec::new_union_result(
            "getFoo_result",
            vec![FieldSpec::new(
                0,
                "success",
                TypeSpec::Primitive(Primitive::I32),
                Requiredness::Optional,
                None,
            )],
        );
        assert!(spec.construct(vec![], vec![]).is_ok());
    }
}
