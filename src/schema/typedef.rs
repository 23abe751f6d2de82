use std::cell::{Cell, RefCell};

use crate::error::{CompilerError, ThriftError};

use super::{Scope, TypeSpec};

/// A named alias. After linking, fully transparent: every operation on
/// the owning [`TypeSpec::Typedef`] forwards straight to `target`. The
/// spec still exists as its own handle so that references to the
/// typedef's name keep resolving to one shared node.
#[derive(Debug)]
pub struct TypedefSpec {
    pub name: String,
    target: RefCell<TypeSpec>,
    linking: Cell<bool>,
}

impl TypedefSpec {
    pub fn new(name: impl Into<String>, target: TypeSpec) -> Self {
        Self {
            name: name.into(),
            target: RefCell::new(target),
            linking: Cell::new(false),
        }
    }

    pub fn target(&self) -> TypeSpec {
        self.target.borrow().clone()
    }

    pub fn set_target(&self, target: TypeSpec) {
        *self.target.borrow_mut() = target;
    }

    /// Unlike a struct, a typedef that refers back to itself (directly or
    /// through a chain of other typedefs) can never bottom out in a
    /// concrete type, so re-entry here is a compile error rather than a
    /// tolerated cycle.
    pub fn link(&self, scope: &dyn Scope) -> Result<(), ThriftError> {
        if self.linking.get() {
            return Err(ThriftError::from(CompilerError::new(
                format!("typedef '{}' is defined in terms of itself", self.name),
                None,
            )));
        }
        self.linking.set(true);
        let pending = match &*self.target.borrow() {
            TypeSpec::Reference(name, lineno) => Some((name.clone(), *lineno)),
            _ => None,
        };
        if let Some((name, lineno)) = pending {
            let resolved = scope.resolve_type(&name, lineno)?;
            self.set_target(resolved);
        }
        let result = self.target().link(scope);
        self.linking.set(false);
        result
    }
}
