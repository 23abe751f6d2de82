//! Loads `.thrift` files from disk, resolving `include`s recursively and
//! caching compiled modules by absolute path so that the same file is
//! never parsed and linked twice, and so that an include cycle resolves
//! back to the same `Module` handle instead of looping forever.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::ast::LineNo;
use crate::compiler::{self, IncludeResolver, NoIncludes};
use crate::error::{CompilerError, ThriftError};
use crate::parser::parse;
use crate::schema::Module;

/// Compiles `.thrift` files, with configurable strictness and alias
/// handling. Holds an absolute-path keyed cache of every `Module` it has
/// compiled; construct one per independent schema namespace (there is no
/// cross-`Loader` sharing).
pub struct Loader {
    strict: bool,
    include_as: bool,
    cache: RefCell<HashMap<PathBuf, Rc<Module>>>,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader {
    /// A loader in strict mode (`required`/`optional` must be explicit)
    /// with the `include <alias> "path"` form disabled, matching Thrift's
    /// conservative defaults.
    pub fn new() -> Self {
        Self {
            strict: true,
            include_as: false,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Builder method: when `strict` is false, a field with no stated
    /// `required`/`optional` defaults to optional instead of raising a
    /// `CompilerError`.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Builder method: enables the `include <alias> "path"` form. When
    /// disabled (the default), any aliased include is a `CompilerError`.
    pub fn include_as(mut self, include_as: bool) -> Self {
        self.include_as = include_as;
        self
    }

    /// Reads, parses, and compiles the `.thrift` file at `path`,
    /// recursively resolving its `include`s. Returns the cached module if
    /// this absolute path has already been compiled by this loader.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Rc<Module>, ThriftError> {
        let absolute = canonicalize(path.as_ref())?;
        self.load_absolute(&absolute)
    }

    /// Compiles `source` under `name` without touching the filesystem.
    /// Any `include` in `source` is a compile error, since there is no
    /// base path to resolve it against.
    pub fn loads(
        &self,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<Rc<Module>, ThriftError> {
        let name = name.into();
        let source = source.into();
        log::debug!("compiling in-memory module '{name}'");
        let program = parse(&source)?;
        compiler::compile(name, source, &program, &mut NoIncludes, self.strict)
    }

    fn load_absolute(&self, absolute: &Path) -> Result<Rc<Module>, ThriftError> {
        if let Some(cached) = self.cache.borrow().get(absolute) {
            log::trace!("cache hit for '{}'", absolute.display());
            return Ok(cached.clone());
        }

        log::debug!("loading module from '{}'", absolute.display());
        let source = std::fs::read_to_string(absolute).map_err(|err| {
            ThriftError::from(CompilerError::new(
                format!("could not read '{}': {err}", absolute.display()),
                None,
            ))
        })?;
        let name = module_name(absolute);
        let program = parse(&source)?;

        // Register the (still-empty) module before compiling its body: a
        // sibling file reached through an include cycle must see this
        // exact `Rc`, not a second one, so that `a.b.a is a` holds and so
        // that the cycle terminates instead of recursing forever.
        let module = Rc::new(Module::new(name, source));
        self.cache
            .borrow_mut()
            .insert(absolute.to_path_buf(), module.clone());

        let dir = absolute
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let mut resolver = LoaderResolver { loader: self, dir: &dir };
        compiler::compile_into(&module, &program, &mut resolver, self.strict)?;

        Ok(module)
    }
}

fn module_name(absolute: &Path) -> String {
    absolute
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or("module")
        .to_string()
}

fn canonicalize(path: &Path) -> Result<PathBuf, ThriftError> {
    std::fs::canonicalize(path).map_err(|err| {
        ThriftError::from(CompilerError::new(
            format!("could not resolve path '{}': {err}", path.display()),
            None,
        ))
    })
}

/// Resolves one `include` relative to the directory of the including
/// file, delegating the actual load (and its cache lookup) back to the
/// owning `Loader`.
struct LoaderResolver<'a> {
    loader: &'a Loader,
    dir: &'a Path,
}

impl<'a> IncludeResolver for LoaderResolver<'a> {
    fn resolve_include(
        &mut self,
        path: &str,
        alias: Option<&str>,
        lineno: LineNo,
    ) -> Result<(String, Rc<Module>), ThriftError> {
        if alias.is_some() && !self.loader.include_as {
            return Err(ThriftError::from(CompilerError::new(
                format!("include alias form is disabled: '{path}'"),
                Some(lineno),
            )));
        }
        if !(path.starts_with("./") || path.starts_with("../")) {
            return Err(ThriftError::from(CompilerError::new(
                format!("include path '{path}' must start with './' or '../'"),
                Some(lineno),
            )));
        }

        let target = self.dir.join(path);
        let module = self.loader.load(&target)?;
        let registered_name = alias.map(str::to_string).unwrap_or_else(|| module.name.clone());

        log::trace!("include '{path}' resolved to module '{registered_name}'");
        Ok((registered_name, module))
    }
}

thread_local! {
    static DEFAULT_LOADER: RefCell<Loader> = RefCell::new(Loader::new());
}

/// Loads `path` through a lazily-initialized, per-thread default
/// `Loader`, for callers who just want a one-shot compile without
/// managing their own cache. `Module` is `!Send`, so this default is
/// kept thread-local rather than process-global (see the concurrency
/// notes on why an `Rc`-based schema graph cannot back a `Mutex`-guarded
/// static).
pub fn load(path: impl AsRef<Path>) -> Result<Rc<Module>, ThriftError> {
    DEFAULT_LOADER.with(|loader| loader.borrow().load(path))
}

/// Compiles `source` under `name` through the default per-thread loader.
pub fn loads(name: impl Into<String>, source: impl Into<String>) -> Result<Rc<Module>, ThriftError> {
    DEFAULT_LOADER.with(|loader| loader.borrow().loads(name, source))
}
