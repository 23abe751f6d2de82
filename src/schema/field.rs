use std::cell::RefCell;

use crate::ast::ConstValue;
use crate::error::ThriftError;

use super::value::Value;
use super::{Scope, TypeSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requiredness {
    Required,
    Optional,
}

/// One field within a struct/union/exception spec, or within a
/// synthesized request/response spec.
///
/// `ty` is mutated exactly once, during linking, to replace a
/// `TypeSpec::Reference` placeholder with the resolved spec; `default`
/// is populated by the constant evaluator at the same time.
#[derive(Debug)]
pub struct FieldSpec {
    pub id: i16,
    pub name: String,
    ty: RefCell<TypeSpec>,
    pub requiredness: Requiredness,
    pub default_expr: Option<ConstValue>,
    default: RefCell<Option<Value>>,
}

impl FieldSpec {
    pub fn new(
        id: i16,
        name: impl Into<String>,
        ty: TypeSpec,
        requiredness: Requiredness,
        default_expr: Option<ConstValue>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            ty: RefCell::new(ty),
            requiredness,
            default_expr,
            default: RefCell::new(None),
        }
    }

    pub fn ty(&self) -> TypeSpec {
        self.ty.borrow().clone()
    }

    pub fn set_ty(&self, ty: TypeSpec) {
        *self.ty.borrow_mut() = ty;
    }

    pub fn default(&self) -> Option<Value> {
        self.default.borrow().clone()
    }

    pub fn set_default(&self, value: Value) {
        *self.default.borrow_mut() = Some(value);
    }

    pub fn has_default(&self) -> bool {
        self.default_expr.is_some()
    }

    /// Resolves `ty` against `scope` if it is still an unresolved
    /// reference, then recurses into the (possibly just-resolved) type.
    pub fn link(&self, scope: &dyn Scope) -> Result<(), ThriftError> {
        let pending = match &*self.ty.borrow() {
            TypeSpec::Reference(name, lineno) => Some((name.clone(), *lineno)),
            _ => None,
        };
        if let Some((name, lineno)) = pending {
            let resolved = scope.resolve_type(&name, lineno)?;
            self.set_ty(resolved);
        }
        self.ty().link(scope)
    }
}
