//! Evaluates a [`ConstValue`] expression tree into a concrete
//! [`Value`], driven by the declared [`TypeSpec`] it is assigned to.
//! Runs once per constant/default during the link phase; the compiler
//! calls [`evaluate`] and stores the result on the owning `ConstSpec` or
//! `FieldSpec`.

use crate::ast::ConstValue;
use crate::error::{CompilerError, ThriftError};
use crate::schema::{Primitive, TypeSpec, Value};

/// Evaluates `expr` against `target`, coercing primitives and resolving
/// identifier references through `scope`.
pub fn evaluate(expr: &ConstValue, target: &TypeSpec, scope: &dyn ConstScope) -> Result<Value, ThriftError> {
    match (expr, target) {
        (ConstValue::Reference(name, lineno), _) => {
            let value = scope.resolve_constant(name, *lineno)?;
            target.validate(&value).map_err(|_| {
                compiler_error(
                    format!("value for reference '{name}' does not match its type {}", target.name()),
                    *lineno,
                )
            })?;
            Ok(value)
        }

        (ConstValue::Bool(b, _), TypeSpec::Primitive(Primitive::Bool)) => Ok(Value::Bool(*b)),
        (ConstValue::Int(v, lineno), TypeSpec::Primitive(Primitive::Bool)) => match v {
            0 => Ok(Value::Bool(false)),
            1 => Ok(Value::Bool(true)),
            other => Err(type_mismatch(target, *other, *lineno)),
        },

        (ConstValue::Int(v, lineno), TypeSpec::Primitive(Primitive::Byte)) => {
            Ok(Value::Byte(fit::<i8>(*v, target, *lineno)?))
        }
        (ConstValue::Int(v, lineno), TypeSpec::Primitive(Primitive::I16)) => {
            Ok(Value::I16(fit::<i16>(*v, target, *lineno)?))
        }
        (ConstValue::Int(v, lineno), TypeSpec::Primitive(Primitive::I32)) => {
            Ok(Value::I32(fit::<i32>(*v, target, *lineno)?))
        }
        (ConstValue::Int(v, _), TypeSpec::Primitive(Primitive::I64)) => Ok(Value::I64(*v)),
        (ConstValue::Int(v, _), TypeSpec::Primitive(Primitive::Double)) => Ok(Value::Double(*v as f64)),
        (ConstValue::Int(v, lineno), TypeSpec::Enum(e)) => {
            let v = *v as i32;
            if e.name_of(v).is_none() {
                return Err(compiler_error(
                    format!("{v} is not a valid value of enum {}", e.name),
                    *lineno,
                ));
            }
            Ok(Value::I32(v))
        }

        (ConstValue::Double(v, _), TypeSpec::Primitive(Primitive::Double)) => Ok(Value::Double(*v)),

        (ConstValue::String(s, _), TypeSpec::Primitive(Primitive::String)) => {
            Ok(Value::String(s.clone()))
        }
        (ConstValue::String(s, _), TypeSpec::Primitive(Primitive::Binary)) => {
            Ok(Value::Binary(s.as_bytes().to_vec()))
        }

        (ConstValue::List(items, _), TypeSpec::List(inner)) => {
            let inner_spec = inner.borrow();
            let values = items
                .iter()
                .map(|item| evaluate(item, &inner_spec, scope))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::List(values))
        }
        (ConstValue::List(items, _), TypeSpec::Set(inner)) => {
            let inner_spec = inner.borrow();
            let mut values: Vec<Value> = Vec::new();
            for item in items {
                let v = evaluate(item, &inner_spec, scope)?;
                if !values.contains(&v) {
                    values.push(v);
                }
            }
            Ok(Value::Set(values))
        }

        (ConstValue::Map(entries, _), TypeSpec::Map(k, v)) => {
            let key_spec = k.borrow();
            let value_spec = v.borrow();
            let pairs = entries
                .iter()
                .map(|(key, value)| {
                    Ok((
                        evaluate(key, &key_spec, scope)?,
                        evaluate(value, &value_spec, scope)?,
                    ))
                })
                .collect::<Result<Vec<_>, ThriftError>>()?;
            Ok(Value::Map(pairs))
        }

        (ConstValue::Map(entries, lineno), TypeSpec::Struct(spec)) => {
            let mut named = Vec::with_capacity(entries.len());
            for (key, value) in entries {
                let ConstValue::String(field_name, _) = key else {
                    return Err(compiler_error(
                        "struct/union constant keys must be string field names".to_string(),
                        *lineno,
                    ));
                };
                let field = spec.field_by_name(field_name).ok_or_else(|| {
                    compiler_error(
                        format!("{} has no field named '{field_name}'", spec.name),
                        *lineno,
                    )
                })?;
                named.push((field_name.clone(), evaluate(value, &field.ty(), scope)?));
            }
            let fields = spec.construct(Vec::new(), named).map_err(|_| {
                compiler_error(
                    format!("value for constant does not match its type {}", spec.name),
                    *lineno,
                )
            })?;
            Ok(Value::Instance(crate::schema::Instance::new(spec.clone(), fields)))
        }

        (_, TypeSpec::Typedef(t)) => evaluate(expr, &t.target(), scope),

        (_, _) => Err(compiler_error(
            format!("value for constant does not match its type {}", target.name()),
            expr.lineno(),
        )),
    }
}

fn fit<T>(v: i64, target: &TypeSpec, lineno: usize) -> Result<T, ThriftError>
where
    T: TryFrom<i64>,
{
    T::try_from(v).map_err(|_| type_mismatch(target, v, lineno))
}

fn type_mismatch(target: &TypeSpec, v: i64, lineno: usize) -> ThriftError {
    compiler_error(
        format!("value {v} does not fit in the target type {}", target.name()),
        lineno,
    )
}

fn compiler_error(message: String, lineno: usize) -> ThriftError {
    ThriftError::from(CompilerError::new(message, Some(lineno)))
}

/// What the constant evaluator needs from its enclosing compiler scope:
/// resolving a (possibly qualified, possibly `Enum.Item`) identifier to
/// a concrete value.
pub trait ConstScope {
    fn resolve_constant(&self, name: &str, lineno: usize) -> Result<Value, ThriftError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::slot;

    struct EmptyScope;
    impl ConstScope for EmptyScope {
        fn resolve_constant(&self, name: &str, lineno: usize) -> Result<Value, ThriftError> {
            Err(compiler_error(format!("no such constant '{name}'"), lineno))
        }
    }

    #[test]
    fn coerces_int_literal_to_double() {
        let target = TypeSpec::Primitive(Primitive::Double);
        let value = evaluate(&ConstValue::Int(4, 1), &target, &EmptyScope).unwrap();
        assert_eq!(value, Value::Double(4.0));
    }

    #[test]
    fn rejects_oversized_literal_for_narrow_target() {
        let target = TypeSpec::Primitive(Primitive::I32);
        let err = evaluate(&ConstValue::Int(1 << 40, 1), &target, &EmptyScope).unwrap_err();
        assert!(matches!(err, ThriftError::Compiler(_)));
    }

    #[test]
    fn deduplicates_list_literal_assigned_to_set() {
        let target = TypeSpec::Set(slot(TypeSpec::Primitive(Primitive::I32)));
        let list = ConstValue::List(
            vec![
                ConstValue::Int(1, 1),
                ConstValue::Int(1, 1),
                ConstValue::Int(2, 1),
            ],
            1,
        );
        let Value::Set(values) = evaluate(&list, &target, &EmptyScope).unwrap() else {
            panic!("expected a set");
        };
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn coerces_zero_and_one_to_bool() {
        let target = TypeSpec::Primitive(Primitive::Bool);
        assert_eq!(
            evaluate(&ConstValue::Int(0, 1), &target, &EmptyScope).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            evaluate(&ConstValue::Int(1, 1), &target, &EmptyScope).unwrap(),
            Value::Bool(true)
        );
        assert!(evaluate(&ConstValue::Int(2, 1), &target, &EmptyScope).is_err());
    }
}
