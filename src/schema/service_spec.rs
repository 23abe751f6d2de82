use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::ast::LineNo;
use crate::error::{CompilerError, ThriftError};

use super::struct_spec::{StructKind, StructSpec};
use super::Scope;

/// One RPC function declared inside a service. `request`/`response` are
/// ordinary `StructSpec`s synthesized by the compiler at generate time:
/// a struct of the declared parameters, and (for non-oneway functions) a
/// union with field 0 `success` plus one field per `throws` entry.
#[derive(Debug)]
pub struct FunctionSpec {
    pub name: String,
    pub oneway: bool,
    pub request: Rc<StructSpec>,
    /// `None` for oneway functions: there is no reply to encode at all.
    pub response: Option<Rc<StructSpec>>,
}

impl FunctionSpec {
    pub fn new(name: impl Into<String>, oneway: bool, request: Rc<StructSpec>, response: Option<Rc<StructSpec>>) -> Self {
        debug_assert!(
            request.kind == StructKind::Struct,
            "function request spec must be a plain struct"
        );
        if let Some(r) = &response {
            debug_assert!(r.kind == StructKind::Union, "function response spec must be a union");
        }
        Self {
            name: name.into(),
            oneway,
            request,
            response,
        }
    }
}

/// A declared service. `extends` is resolved to a concrete parent during
/// linking; until then `parent_name` records the unresolved reference.
#[derive(Debug)]
pub struct ServiceSpec {
    pub name: String,
    parent_name: Option<(String, LineNo)>,
    parent: RefCell<Option<Rc<ServiceSpec>>>,
    functions: Vec<Rc<FunctionSpec>>,
    linking: Cell<bool>,
}

impl ServiceSpec {
    pub fn new(
        name: impl Into<String>,
        parent_name: Option<(String, LineNo)>,
        functions: Vec<Rc<FunctionSpec>>,
    ) -> Self {
        Self {
            name: name.into(),
            parent_name,
            parent: RefCell::new(None),
            functions,
            linking: Cell::new(false),
        }
    }

    pub fn parent(&self) -> Option<Rc<ServiceSpec>> {
        self.parent.borrow().clone()
    }

    /// Functions declared directly on this service, in declaration order
    /// (does not include inherited functions; see [`Self::all_functions`]).
    pub fn own_functions(&self) -> &[Rc<FunctionSpec>] {
        &self.functions
    }

    pub fn own_function(&self, name: &str) -> Option<&Rc<FunctionSpec>> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Own functions plus every function inherited from ancestor
    /// services, with a function defined locally shadowing one of the
    /// same name from an ancestor.
    pub fn all_functions(&self) -> Vec<Rc<FunctionSpec>> {
        let mut seen: std::collections::HashSet<String> =
            self.functions.iter().map(|f| f.name.clone()).collect();
        let mut out: Vec<Rc<FunctionSpec>> = self.functions.clone();
        let mut current = self.parent();
        while let Some(parent) = current {
            for f in parent.own_functions() {
                if seen.insert(f.name.clone()) {
                    out.push(f.clone());
                }
            }
            current = parent.parent();
        }
        out
    }

    pub fn function(&self, name: &str) -> Option<Rc<FunctionSpec>> {
        if let Some(f) = self.own_function(name) {
            return Some(f.clone());
        }
        self.parent().and_then(|p| p.function(name))
    }

    /// Resolves `extends`, detects inheritance cycles, and links every
    /// function's request/response structs.
    pub fn link(&self, scope: &dyn Scope) -> Result<(), ThriftError> {
        if self.linking.get() {
            return Err(ThriftError::from(CompilerError::new(
                format!("service '{}' extends itself through a cycle", self.name),
                None,
            )));
        }
        self.linking.set(true);

        if self.parent().is_none() {
            if let Some((name, lineno)) = &self.parent_name {
                let parent = scope.resolve_service(name, *lineno)?;
                *self.parent.borrow_mut() = Some(parent.clone());
                parent.link(scope)?;
            }
        }

        for function in &self.functions {
            function.request.link(scope)?;
            if let Some(response) = &function.response {
                response.link(scope)?;
            }
        }

        if let Some(parent) = self.parent() {
            for local in &self.functions {
                if let Some(inherited) = parent.function(&local.name) {
                    if !signatures_match(local, &inherited) {
                        self.linking.set(false);
                        return Err(ThriftError::from(CompilerError::new(
                            format!(
                                "service '{}' redefines function '{}' with a different signature than '{}'",
                                self.name, local.name, parent.name
                            ),
                            None,
                        )));
                    }
                }
            }
        }

        self.linking.set(false);
        Ok(())
    }
}

/// Two functions have the same signature when they agree on oneway-ness
/// and on the field shape (id, name, type name, requiredness) of both
/// the synthesized request struct and response union. Used to reject a
/// service that redefines an inherited function under an incompatible
/// shape (`SPEC_FULL.md` §4.6).
fn signatures_match(a: &FunctionSpec, b: &FunctionSpec) -> bool {
    if a.oneway != b.oneway {
        return false;
    }
    if !fields_match(a.request.fields(), b.request.fields()) {
        return false;
    }
    match (&a.response, &b.response) {
        (None, None) => true,
        (Some(ar), Some(br)) => fields_match(ar.fields(), br.fields()),
        _ => false,
    }
}

fn fields_match(a: &[super::field::FieldSpec], b: &[super::field::FieldSpec]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).all(|(af, bf)| {
        af.id == bf.id
            && af.name == bf.name
            && af.requiredness == bf.requiredness
            && af.ty().name() == bf.ty().name()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSpec, Primitive, Requiredness, TypeSpec};

    fn void_function(name: &str) -> Rc<FunctionSpec> {
        Rc::new(FunctionSpec::new(
            name,
            false,
            Rc::new(StructSpec::new(StructKind::Struct, format!("{name}_args"), vec![])),
            Some(Rc::new(StructSpec::new_union_result(
                format!("{name}_result"),
                vec![],
            ))),
        ))
    }

    #[test]
    fn inherited_functions_are_visible_and_shadowable() {
        let base = Rc::new(ServiceSpec::new("Base", None, vec![void_function("ping")]));
        let mut child_fns = vec![void_function("pong")];
        // override "ping" locally
        child_fns.push(Rc::new(FunctionSpec::new(
            "ping",
            false,
            Rc::new(StructSpec::new(
                StructKind::Struct,
                "ping_args",
                vec![FieldSpec::new(
                    1,
                    "flag",
                    TypeSpec::Primitive(Primitive::Bool),
                    Requiredness::Required,
                    None,
                )],
            )),
            Some(Rc::new(StructSpec::new_union_result("ping_result", vec![]))),
        )));
        let child = ServiceSpec::new("Child", None, child_fns);
        *child.parent.borrow_mut() = Some(base);

        let all = child.all_functions();
        assert_eq!(all.len(), 2);
        let overridden = child.function("ping").unwrap();
        assert_eq!(overridden.request.fields().len(), 1);
    }
}
