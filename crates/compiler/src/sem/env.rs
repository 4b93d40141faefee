//! The type environment: everything the type checker threads through a
//! module's passes. Owned by the checker's driver, not a global, so
//! multiple modules can be checked concurrently without shared state.

use std::collections::HashMap;
use std::rc::Rc;

use crate::source::Span;

use super::module::ModuleRegistry;
use super::ty::{Type, TypeRef, TypeVarId};

/// One lexical scope's worth of value bindings.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub bindings: HashMap<String, Binding>,
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub ty: TypeRef,
    pub mutable: bool,
    pub span: Span,
}

/// How a name was brought into scope by a `use` declaration, recorded per
/// module.
#[derive(Debug, Clone)]
pub struct ImportedSymbol {
    pub module_path: Vec<String>,
    pub original_name: String,
    pub visibility: crate::ast::decls::Visibility,
}

/// The substitution produced by unification: `TypeVarId -> TypeRef`.
/// Resolution walks this table and is idempotent once a variable is
/// bound.
#[derive(Debug, Default)]
pub struct Substitution {
    bindings: HashMap<u32, TypeRef>,
}

impl Substitution {
    pub fn bind(&mut self, var: TypeVarId, ty: TypeRef) {
        self.bindings.insert(var.0, ty);
    }

    /// Follow the chain of bindings until reaching an unbound variable or
    /// a concrete type. Path-compresses nothing (the map is append-only
    /// within one checker run) but is idempotent: resolving an already
    /// resolved type is a no-op.
    pub fn resolve(&self, ty: &TypeRef) -> TypeRef {
        let mut current = ty.clone();
        loop {
            match current.as_ref() {
                Type::Var(id) => match self.bindings.get(&id.0) {
                    Some(next) => current = next.clone(),
                    None => return current,
                },
                _ => return current,
            }
        }
    }
}

pub struct TypeEnv {
    pub registry: ModuleRegistry,
    scopes: Vec<Scope>,
    pub generic_params: HashMap<String, TypeRef>,
    pub const_params: HashMap<String, TypeRef>,
    pub const_values: HashMap<String, super::ty::ConstValue>,
    pub builtins: HashMap<String, TypeRef>,
    /// type-name -> behavior names it implements.
    pub behavior_impls: HashMap<String, Vec<String>>,
    pub imports: HashMap<String, ImportedSymbol>,
    pub substitution: Substitution,
    next_type_var: u32,
}

impl TypeEnv {
    pub fn new(registry: ModuleRegistry) -> Self {
        let mut env = TypeEnv {
            registry,
            scopes: vec![Scope::default()],
            generic_params: HashMap::new(),
            const_params: HashMap::new(),
            const_values: HashMap::new(),
            builtins: HashMap::new(),
            behavior_impls: HashMap::new(),
            imports: HashMap::new(),
            substitution: Substitution::default(),
            next_type_var: 0,
        };
        super::builtins::install_builtins(&mut env);
        env
    }

    pub fn fresh_type_var(&mut self) -> TypeRef {
        let id = TypeVarId(self.next_type_var);
        self.next_type_var += 1;
        Rc::new(Type::Var(id))
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn pop_scope(&mut self) -> Scope {
        self.scopes
            .pop()
            .expect("pop_scope called with no open scope")
    }

    pub fn bind(&mut self, name: impl Into<String>, ty: TypeRef, mutable: bool, span: Span) {
        self.scopes
            .last_mut()
            .expect("at least one scope always open")
            .bindings
            .insert(name.into(), Binding { ty, mutable, span });
    }

    /// Local scope -> current module -> imported symbols -> registry, in
    /// that order.
    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        for scope in self.scopes.iter().rev() {
            if let Some(b) = scope.bindings.get(name) {
                return Some(b);
            }
        }
        None
    }

    pub fn all_in_scope_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for scope in &self.scopes {
            names.extend(scope.bindings.keys().cloned());
        }
        names
    }

    pub fn implements(&self, type_name: &str, behavior: &str) -> bool {
        self.behavior_impls
            .get(type_name)
            .map(|v| v.iter().any(|b| b == behavior))
            .unwrap_or(false)
    }

    pub fn register_impl(&mut self, type_name: impl Into<String>, behavior: impl Into<String>) {
        self.behavior_impls
            .entry(type_name.into())
            .or_default()
            .push(behavior.into());
    }

    /// Resolve a type through the current substitution, recursively so
    /// that nested type variables inside compounds are also resolved.
    pub fn resolve(&self, ty: &TypeRef) -> TypeRef {
        let resolved = self.substitution.resolve(ty);
        match resolved.as_ref() {
            Type::Reference {
                mutable,
                lifetime,
                inner,
            } => Rc::new(Type::Reference {
                mutable: *mutable,
                lifetime: lifetime.clone(),
                inner: self.resolve(inner),
            }),
            Type::Pointer { mutable, inner } => Rc::new(Type::Pointer {
                mutable: *mutable,
                inner: self.resolve(inner),
            }),
            Type::Array(elem, n) => Rc::new(Type::Array(self.resolve(elem), *n)),
            Type::Slice(elem) => Rc::new(Type::Slice(self.resolve(elem))),
            Type::Tuple(elems) => {
                Rc::new(Type::Tuple(elems.iter().map(|e| self.resolve(e)).collect()))
            }
            Type::Named {
                name,
                module_path,
                args,
            } => Rc::new(Type::Named {
                name: name.clone(),
                module_path: module_path.clone(),
                args: args.iter().map(|a| self.resolve(a)).collect(),
            }),
            _ => resolved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_shadowing_finds_innermost() {
        let mut env = TypeEnv::new(ModuleRegistry::new());
        env.bind("x", Rc::new(Type::SInt(super::super::ty::IntWidth::W32)), false, Span::at(0));
        env.push_scope();
        env.bind("x", Rc::new(Type::Bool), true, Span::at(1));
        assert_eq!(env.lookup("x").unwrap().ty.as_ref(), &Type::Bool);
        env.pop_scope();
        assert_eq!(
            env.lookup("x").unwrap().ty.as_ref(),
            &Type::SInt(super::super::ty::IntWidth::W32)
        );
    }

    #[test]
    fn substitution_resolves_idempotently() {
        let mut env = TypeEnv::new(ModuleRegistry::new());
        let v = env.fresh_type_var();
        let bool_ty = Rc::new(Type::Bool);
        if let Type::Var(id) = v.as_ref() {
            env.substitution.bind(*id, bool_ty.clone());
        }
        let resolved_once = env.resolve(&v);
        let resolved_twice = env.resolve(&resolved_once);
        assert_eq!(resolved_once.as_ref(), &Type::Bool);
        assert_eq!(resolved_once, resolved_twice);
    }
}
