use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::ast::{
    self, ConstValue, Definition, EnumDef, FunctionDef, Requiredness as AstRequiredness, ServiceDef,
    StructDef, StructKind as AstStructKind, TypeNode, TypedefDef,
};
use crate::constant::{self, ConstScope};
use crate::error::{CompilerError, ThriftError};
use crate::schema::{
    self, EnumSpec, FieldSpec, FunctionSpec, Module, Primitive, Requiredness, Scope, ServiceSpec,
    StructKind, StructSpec, TypeSpec, Value,
};

fn compiler_error(message: impl Into<String>, lineno: Option<ast::LineNo>) -> ThriftError {
    ThriftError::from(CompilerError::new(message, lineno))
}

fn type_node_to_spec(node: &TypeNode) -> Result<TypeSpec, ThriftError> {
    Ok(match node {
        TypeNode::Void => {
            return Err(compiler_error("'void' is not a valid type in this position", None))
        }
        TypeNode::Bool => TypeSpec::Primitive(Primitive::Bool),
        TypeNode::Byte => TypeSpec::Primitive(Primitive::Byte),
        TypeNode::I16 => TypeSpec::Primitive(Primitive::I16),
        TypeNode::I32 => TypeSpec::Primitive(Primitive::I32),
        TypeNode::I64 => TypeSpec::Primitive(Primitive::I64),
        TypeNode::Double => TypeSpec::Primitive(Primitive::Double),
        TypeNode::String => TypeSpec::Primitive(Primitive::String),
        TypeNode::Binary => TypeSpec::Primitive(Primitive::Binary),
        TypeNode::List(inner, _) => TypeSpec::List(schema::slot(type_node_to_spec(inner)?)),
        TypeNode::Set(inner, _) => TypeSpec::Set(schema::slot(type_node_to_spec(inner)?)),
        TypeNode::Map(k, v, _) => TypeSpec::Map(
            schema::slot(type_node_to_spec(k)?),
            schema::slot(type_node_to_spec(v)?),
        ),
        TypeNode::Reference(name, lineno) => TypeSpec::Reference(name.clone(), *lineno),
    })
}

fn requiredness_from_ast(r: AstRequiredness, strict: bool, lineno: ast::LineNo) -> Result<Requiredness, ThriftError> {
    match r {
        AstRequiredness::Required => Ok(Requiredness::Required),
        AstRequiredness::Optional => Ok(Requiredness::Optional),
        AstRequiredness::Default if strict => Err(compiler_error(
            "field requiredness must be stated explicitly in strict mode",
            Some(lineno),
        )),
        AstRequiredness::Default => Ok(Requiredness::Optional),
    }
}

fn field_spec_from_ast(
    field: &ast::Field,
    strict: bool,
    is_union: bool,
) -> Result<FieldSpec, ThriftError> {
    if is_union && field.requiredness == AstRequiredness::Required {
        return Err(compiler_error(
            format!("union field '{}' may not be required", field.name),
            Some(field.lineno),
        ));
    }
    if is_union && field.default.is_some() {
        return Err(compiler_error(
            format!("union field '{}' may not have a default value", field.name),
            Some(field.lineno),
        ));
    }
    let requiredness = requiredness_from_ast(field.requiredness, strict, field.lineno)?;
    Ok(FieldSpec::new(
        field.id,
        field.name.clone(),
        type_node_to_spec(&field.ty)?,
        requiredness,
        field.default.clone(),
    ))
}

fn check_duplicate_ids(fields: &[FieldSpec], owner: &str) -> Result<(), ThriftError> {
    let mut seen = HashSet::new();
    for field in fields {
        if !seen.insert(field.id) {
            return Err(compiler_error(
                format!("{owner} declares field id {} more than once", field.id),
                None,
            ));
        }
    }
    Ok(())
}

/// Resolves `ty` if it is itself an unresolved top-level reference
/// (e.g. `const SomeEnum e = ...`), then links whatever it resolved to.
/// Mirrors the resolve-then-recurse pattern `FieldSpec::link` and
/// `TypedefSpec::link` apply to their own `RefCell`-held type slots.
fn resolve_top_level(ty: &TypeSpec, scope: &dyn Scope) -> Result<TypeSpec, ThriftError> {
    let resolved = match ty {
        TypeSpec::Reference(name, lineno) => scope.resolve_type(name, *lineno)?,
        other => other.clone(),
    };
    resolved.link(scope)?;
    Ok(resolved)
}

struct PendingConst {
    name: String,
    ty: TypeSpec,
    value: ConstValue,
}

/// Phase 2: builds spec objects for every definition, leaving embedded
/// type references unresolved (`TypeSpec::Reference`) and service
/// `extends` clauses unresolved by name. Enforces every generate-time
/// rule from the compiler's duplicate/shape checks.
pub(super) struct Generator {
    strict: bool,
    names: HashSet<String>,
    types: HashMap<String, TypeSpec>,
    services: HashMap<String, Rc<ServiceSpec>>,
    pending_consts: Vec<PendingConst>,
}

impl Generator {
    pub(super) fn new(strict: bool) -> Self {
        Self {
            strict,
            names: HashSet::new(),
            types: HashMap::new(),
            services: HashMap::new(),
            pending_consts: Vec::new(),
        }
    }

    fn claim_name(&mut self, name: &str) -> Result<(), ThriftError> {
        if !self.names.insert(name.to_string()) {
            return Err(compiler_error(
                format!("'{name}' is already declared in this module"),
                None,
            ));
        }
        Ok(())
    }

    pub(super) fn generate(&mut self, def: &Definition) -> Result<(), ThriftError> {
        match def {
            Definition::Const(c) => self.generate_const(c),
            Definition::Typedef(t) => self.generate_typedef(t),
            Definition::Enum(e) => self.generate_enum(e),
            Definition::Struct(s) => self.generate_struct(s),
            Definition::Service(s) => self.generate_service(s),
        }
    }

    fn generate_const(&mut self, c: &ast::ConstDef) -> Result<(), ThriftError> {
        self.claim_name(&c.name)?;
        let ty = type_node_to_spec(&c.ty)?;
        self.pending_consts.push(PendingConst {
            name: c.name.clone(),
            ty,
            value: c.value.clone(),
        });
        Ok(())
    }

    fn generate_typedef(&mut self, t: &TypedefDef) -> Result<(), ThriftError> {
        self.claim_name(&t.name)?;
        let target = type_node_to_spec(&t.target)?;
        let spec = Rc::new(schema::TypedefSpec::new(t.name.clone(), target));
        self.types.insert(t.name.clone(), TypeSpec::Typedef(spec));
        Ok(())
    }

    fn generate_enum(&mut self, e: &EnumDef) -> Result<(), ThriftError> {
        self.claim_name(&e.name)?;
        let mut items = Vec::with_capacity(e.items.len());
        let mut seen = HashSet::new();
        let mut next_value = 0i32;
        for item in &e.items {
            if !seen.insert(item.name.clone()) {
                return Err(compiler_error(
                    format!("enum {} declares item '{}' more than once", e.name, item.name),
                    Some(item.lineno),
                ));
            }
            let value = item.value.unwrap_or(next_value);
            next_value = value.checked_add(1).ok_or_else(|| {
                compiler_error(
                    format!("enum {} item '{}' overflows a 32-bit value", e.name, item.name),
                    Some(item.lineno),
                )
            })?;
            items.push((item.name.clone(), value));
        }
        let spec = Rc::new(EnumSpec::new(e.name.clone(), items));
        self.types.insert(e.name.clone(), TypeSpec::Enum(spec));
        Ok(())
    }

    fn generate_struct(&mut self, s: &StructDef) -> Result<(), ThriftError> {
        self.claim_name(&s.name)?;
        let kind = match s.kind {
            AstStructKind::Struct => StructKind::Struct,
            AstStructKind::Union => StructKind::Union,
            AstStructKind::Exception => StructKind::Exception,
        };
        let is_union = kind == StructKind::Union;
        let fields = s
            .fields
            .iter()
            .map(|f| field_spec_from_ast(f, self.strict, is_union))
            .collect::<Result<Vec<_>, _>>()?;
        check_duplicate_ids(&fields, &s.name)?;
        let spec = Rc::new(StructSpec::new(kind, s.name.clone(), fields));
        self.types.insert(s.name.clone(), TypeSpec::Struct(spec));
        Ok(())
    }

    fn generate_service(&mut self, s: &ServiceDef) -> Result<(), ThriftError> {
        self.claim_name(&s.name)?;
        let functions = s
            .functions
            .iter()
            .map(|f| self.generate_function(s, f))
            .collect::<Result<Vec<_>, _>>()?;
        let parent_name = s.extends.clone().map(|name| (name, s.lineno));
        let spec = Rc::new(ServiceSpec::new(s.name.clone(), parent_name, functions));
        self.services.insert(s.name.clone(), spec);
        Ok(())
    }

    fn generate_function(&self, service: &ServiceDef, f: &FunctionDef) -> Result<Rc<FunctionSpec>, ThriftError> {
        if f.oneway && f.return_type.is_some() {
            return Err(compiler_error(
                format!("oneway function '{}.{}' must return void", service.name, f.name),
                Some(f.lineno),
            ));
        }
        if f.oneway && !f.throws.is_empty() {
            return Err(compiler_error(
                format!("oneway function '{}.{}' may not declare throws", service.name, f.name),
                Some(f.lineno),
            ));
        }

        let params = f
            .params
            .iter()
            .map(|field| field_spec_from_ast(field, self.strict, false))
            .collect::<Result<Vec<_>, _>>()?;
        check_duplicate_ids(&params, &format!("{}.{}", service.name, f.name))?;
        let request = Rc::new(StructSpec::new(
            StructKind::Struct,
            format!("{}_{}_args", service.name, f.name),
            params,
        ));

        let response = if f.oneway {
            None
        } else {
            let mut fields = Vec::with_capacity(f.throws.len() + 1);
            if let Some(return_type) = &f.return_type {
                fields.push(FieldSpec::new(
                    0,
                    "success",
                    type_node_to_spec(return_type)?,
                    Requiredness::Optional,
                    None,
                ));
            }
            for throw in &f.throws {
                if throw.requiredness == AstRequiredness::Required {
                    return Err(compiler_error(
                        format!("throws field '{}' may not be required", throw.name),
                        Some(throw.lineno),
                    ));
                }
                fields.push(FieldSpec::new(
                    throw.id,
                    throw.name.clone(),
                    type_node_to_spec(&throw.ty)?,
                    Requiredness::Optional,
                    None,
                ));
            }
            check_duplicate_ids(&fields, &format!("{}.{} response", service.name, f.name))?;
            Some(Rc::new(StructSpec::new_union_result(
                format!("{}_{}_result", service.name, f.name),
                fields,
            )))
        };

        Ok(Rc::new(FunctionSpec::new(f.name.clone(), f.oneway, request, response)))
    }
}

/// Phase 3: resolves every reference accumulated during generate,
/// against local specs first and then included modules, and evaluates
/// every constant/default expression.
pub struct ModuleScope {
    types: HashMap<String, TypeSpec>,
    services: HashMap<String, Rc<ServiceSpec>>,
    pending_consts: Vec<PendingConst>,
    includes: HashMap<String, Rc<Module>>,
    const_cache: RefCell<HashMap<String, Value>>,
    evaluating: RefCell<HashSet<String>>,
}

impl ModuleScope {
    pub(super) fn new(gen: Generator, includes: HashMap<String, Rc<Module>>) -> Self {
        Self {
            types: gen.types,
            services: gen.services,
            pending_consts: gen.pending_consts,
            includes,
            const_cache: RefCell::new(HashMap::new()),
            evaluating: RefCell::new(HashSet::new()),
        }
    }

    pub(super) fn link_all(&self) -> Result<(), ThriftError> {
        for ty in self.types.values() {
            ty.link(self)?;
        }
        for svc in self.services.values() {
            svc.link(self)?;
        }
        Ok(())
    }

    /// Evaluates every field's default-value expression (struct/union
    /// fields, plus the synthesized request/response fields of every
    /// service function) now that every type is fully linked.
    pub(super) fn evaluate_defaults(&self) -> Result<(), ThriftError> {
        for ty in self.types.values() {
            if let TypeSpec::Struct(s) = ty {
                self.evaluate_struct_defaults(s)?;
            }
        }
        for svc in self.services.values() {
            for f in svc.own_functions() {
                self.evaluate_struct_defaults(&f.request)?;
                if let Some(response) = &f.response {
                    self.evaluate_struct_defaults(response)?;
                }
            }
        }
        Ok(())
    }

    fn evaluate_struct_defaults(&self, spec: &StructSpec) -> Result<(), ThriftError> {
        for field in spec.fields() {
            if let Some(expr) = &field.default_expr {
                let value = constant::evaluate(expr, &field.ty(), self)?;
                field.set_default(value);
            }
        }
        Ok(())
    }

    pub(super) fn populate(&self, module: &Module) -> Result<(), ThriftError> {
        for (name, ty) in &self.types {
            module.add_type(name.clone(), ty.clone());
        }
        for (name, svc) in &self.services {
            module.add_service(name.clone(), svc.clone());
        }
        for pc in &self.pending_consts {
            let value = self.evaluate_const(&pc.name)?;
            module.add_constant(pc.name.clone(), value);
        }
        Ok(())
    }

    fn evaluate_const(&self, name: &str) -> Result<Value, ThriftError> {
        if let Some(value) = self.const_cache.borrow().get(name) {
            return Ok(value.clone());
        }
        if !self.evaluating.borrow_mut().insert(name.to_string()) {
            return Err(compiler_error(
                format!("constant '{name}' is defined in terms of itself"),
                None,
            ));
        }
        let pc = self
            .pending_consts
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| compiler_error(format!("unknown constant '{name}'"), None))?;
        let ty = resolve_top_level(&pc.ty, self)?;
        let value = constant::evaluate(&pc.value, &ty, self)?;
        self.evaluating.borrow_mut().remove(name);
        self.const_cache.borrow_mut().insert(name.to_string(), value.clone());
        Ok(value)
    }
}

impl Scope for ModuleScope {
    fn resolve_type(&self, name: &str, lineno: ast::LineNo) -> Result<TypeSpec, ThriftError> {
        if let Some(ty) = self.types.get(name) {
            return Ok(ty.clone());
        }
        if let Some((head, tail)) = name.split_once('.') {
            if let Some(module) = self.includes.get(head) {
                if let Some(ty) = module.ty(tail) {
                    return Ok(ty);
                }
            }
        }
        Err(compiler_error(format!("unknown type reference '{name}'"), Some(lineno)))
    }

    fn resolve_service(&self, name: &str, lineno: ast::LineNo) -> Result<Rc<ServiceSpec>, ThriftError> {
        if let Some(svc) = self.services.get(name) {
            return Ok(svc.clone());
        }
        if let Some((head, tail)) = name.split_once('.') {
            if let Some(module) = self.includes.get(head) {
                if let Some(svc) = module.service(tail) {
                    return Ok(svc);
                }
            }
        }
        Err(compiler_error(format!("unknown service reference '{name}'"), Some(lineno)))
    }
}

impl ConstScope for ModuleScope {
    fn resolve_constant(&self, name: &str, lineno: ast::LineNo) -> Result<Value, ThriftError> {
        if !name.contains('.') {
            if self.pending_consts.iter().any(|p| p.name == name) {
                return self.evaluate_const(name);
            }
            return Err(compiler_error(format!("unknown reference '{name}'"), Some(lineno)));
        }

        let (head, rest) = name.split_once('.').expect("checked above");

        if let Some(TypeSpec::Enum(e)) = self.types.get(head) {
            if let Some(v) = e.value_of(rest) {
                return Ok(Value::I32(v));
            }
        }

        if let Some(module) = self.includes.get(head) {
            if let Some(value) = module.constant(rest) {
                return Ok(value);
            }
            if let Some((enum_name, item)) = rest.split_once('.') {
                if let Some(TypeSpec::Enum(e)) = module.ty(enum_name) {
                    if let Some(v) = e.value_of(item) {
                        return Ok(Value::I32(v));
                    }
                }
            }
        }

        Err(compiler_error(format!("unknown reference '{name}'"), Some(lineno)))
    }
}
