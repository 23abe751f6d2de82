use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::{ServiceSpec, TypeSpec, Value};

/// The output of compiling one `.thrift` source: every declared type,
/// constant, and service, plus enough bookkeeping to support `include`
/// and introspection.
///
/// Fields live behind `RefCell` rather than requiring `&mut Module`
/// during compilation. This lets the loader hand out the `Rc<Module>`
/// for a file *before* that file has finished compiling: a module at
/// the far end of an include cycle gets back the same (still-filling-in)
/// `Rc`, which is populated in place by the time the whole load
/// completes. Once a load finishes no one mutates the module again, so
/// this is the same "mutable during link, frozen after" lifecycle as
/// every `TypeSpec`, just implemented with interior mutability instead
/// of ownership transfer.
#[derive(Debug)]
pub struct Module {
    pub name: String,
    pub source: String,
    types: RefCell<HashMap<String, TypeSpec>>,
    constants: RefCell<HashMap<String, Value>>,
    services: RefCell<HashMap<String, Rc<ServiceSpec>>>,
    /// Modules reached through `include`, in declaration order, keyed by
    /// the name (or alias) they were registered under.
    includes: RefCell<Vec<(String, Rc<Module>)>>,
}

impl Module {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            types: RefCell::new(HashMap::new()),
            constants: RefCell::new(HashMap::new()),
            services: RefCell::new(HashMap::new()),
            includes: RefCell::new(Vec::new()),
        }
    }

    pub fn add_type(&self, name: impl Into<String>, spec: TypeSpec) {
        self.types.borrow_mut().insert(name.into(), spec);
    }

    pub fn add_constant(&self, name: impl Into<String>, value: Value) {
        self.constants.borrow_mut().insert(name.into(), value);
    }

    pub fn add_service(&self, name: impl Into<String>, spec: Rc<ServiceSpec>) {
        self.services.borrow_mut().insert(name.into(), spec);
    }

    pub fn add_include(&self, name: impl Into<String>, module: Rc<Module>) {
        self.includes.borrow_mut().push((name.into(), module));
    }

    pub fn ty(&self, name: &str) -> Option<TypeSpec> {
        self.types.borrow().get(name).cloned()
    }

    pub fn types(&self) -> Vec<(String, TypeSpec)> {
        self.types.borrow().iter().map(|(n, t)| (n.clone(), t.clone())).collect()
    }

    pub fn constant(&self, name: &str) -> Option<Value> {
        self.constants.borrow().get(name).cloned()
    }

    pub fn constants(&self) -> Vec<(String, Value)> {
        self.constants.borrow().iter().map(|(n, v)| (n.clone(), v.clone())).collect()
    }

    pub fn service(&self, name: &str) -> Option<Rc<ServiceSpec>> {
        self.services.borrow().get(name).cloned()
    }

    pub fn services(&self) -> Vec<(String, Rc<ServiceSpec>)> {
        self.services.borrow().iter().map(|(n, s)| (n.clone(), s.clone())).collect()
    }

    pub fn include(&self, name: &str) -> Option<Rc<Module>> {
        self.includes.borrow().iter().find(|(n, _)| n == name).map(|(_, m)| m.clone())
    }

    pub fn includes(&self) -> Vec<(String, Rc<Module>)> {
        self.includes.borrow().clone()
    }
}
