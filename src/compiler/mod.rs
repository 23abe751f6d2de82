//! Three-phase compiler: turns a parsed [`Program`] into a linked
//! [`Module`]. Phases run in order and are not interleaved: header
//! resolution (includes) completes before generate, which completes
//! before link, matching the control-flow description of the pipeline
//! this crate implements.

mod scope;

pub use scope::ModuleScope;

use std::rc::Rc;

use crate::ast::{Header, Program};
use crate::error::{CompilerError, ThriftError};
use crate::schema::Module;

/// Supplies included modules to the compiler. Implemented by the
/// loader, which owns path resolution and the compiled-module cache;
/// kept as a trait here so the compiler does not depend on filesystem
/// access directly (`loads(name, text)` compiles with a resolver that
/// always rejects includes).
pub trait IncludeResolver {
    fn resolve_include(
        &mut self,
        path: &str,
        alias: Option<&str>,
        lineno: crate::ast::LineNo,
    ) -> Result<(String, Rc<Module>), ThriftError>;
}

/// A resolver for `loads(name, text)`: any `include` in the source is a
/// compile error, since there is no path to resolve it against.
pub struct NoIncludes;

impl IncludeResolver for NoIncludes {
    fn resolve_include(
        &mut self,
        path: &str,
        _alias: Option<&str>,
        lineno: crate::ast::LineNo,
    ) -> Result<(String, Rc<Module>), ThriftError> {
        Err(ThriftError::from(CompilerError::new(
            format!("include '{path}' is not supported when compiling from a string"),
            Some(lineno),
        )))
    }
}

/// Compiles `program` into `module` in place.
///
/// Split out from [`compile`] so a loader can hand out the `Rc<Module>`
/// for a file before this call returns — that `Rc` is what a cyclic
/// `include` resolves back to, and `Module`'s interior mutability means
/// it ends up fully populated once the whole load completes. `strict`
/// requires every field to state `required`/`optional` explicitly; when
/// false, an unstated requiredness defaults to `optional` (the
/// historical Thrift default) instead of raising a `CompilerError`.
pub fn compile_into(
    module: &Module,
    program: &Program,
    resolver: &mut dyn IncludeResolver,
    strict: bool,
) -> Result<(), ThriftError> {
    log::debug!("compiling module '{}'", module.name);

    // Phase 1: headers. Namespaces are accepted and ignored; includes
    // are resolved recursively through `resolver`, which is responsible
    // for cycle-safety via its own path cache.
    for header in &program.headers {
        match header {
            Header::Namespace(_) => {}
            Header::Include(include) => {
                log::trace!("resolving include '{}'", include.path);
                let (registered_name, included) =
                    resolver.resolve_include(&include.path, include.alias.as_deref(), include.lineno)?;
                module.add_include(registered_name, included);
            }
        }
    }

    // Phase 2: generate. Build every spec object (unresolved references
    // left as `TypeSpec::Reference`) and register it in scope.
    let mut gen = scope::Generator::new(strict);
    for definition in &program.definitions {
        gen.generate(definition)?;
    }

    // Phase 3: link. Resolve every reference against the accumulated
    // scope (including the just-loaded included modules), attach
    // service parents, evaluate constants and field defaults.
    let scope = ModuleScope::new(gen, module.includes().into_iter().collect());
    scope.link_all()?;
    scope.evaluate_defaults()?;
    scope.populate(module)?;

    log::debug!("module '{}' compiled: {} definitions", module.name, program.definitions.len());
    Ok(())
}

/// Compiles one parsed program into a freshly allocated, linked module.
/// Use this when there is no loader/include graph to share a module
/// handle with (e.g. `loads(name, text)`); see [`compile_into`] for the
/// in-place form a loader uses instead.
pub fn compile(
    name: impl Into<String>,
    source: impl Into<String>,
    program: &Program,
    resolver: &mut dyn IncludeResolver,
    strict: bool,
) -> Result<Rc<Module>, ThriftError> {
    let module = Rc::new(Module::new(name, source));
    compile_into(&module, program, resolver, strict)?;
    Ok(module)
}
