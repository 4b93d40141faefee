//! Pass 1 — declaration registration.
//!
//! Walk top-level declarations and install symbols into the module
//! registry without checking bodies: every struct, enum, behavior, class,
//! interface, type alias, const, and function signature becomes visible.
//! Classes/interfaces are registered but inheritance is not yet resolved
//! (that's Pass 3, `impls.rs`). Type aliases are resolved lazily (when a
//! type node actually names one, in Pass 4).

use std::path::PathBuf;

use crate::ast::decls::{Decl, DeclKind, ModuleAst};
use crate::sem::error::{TypeError, TypeErrorKind};
use crate::sem::module::ModuleRecord;
use crate::sem::TypeEnv;

pub fn register_declarations(
    ast: &ModuleAst,
    module_path: Vec<String>,
    source_text: String,
    source_file: PathBuf,
    env: &mut TypeEnv,
) -> Vec<TypeError> {
    let mut errors = Vec::new();
    let mut record = ModuleRecord::new(module_path, source_text, source_file);
    for decl in &ast.decls {
        register_one(decl, &mut record, &mut errors);
    }
    env.registry.insert(record);
    errors
}

fn register_one(decl: &Decl, record: &mut ModuleRecord, errors: &mut Vec<TypeError>) {
    match &decl.kind {
        DeclKind::Func(f) => {
            record
                .functions
                .entry(f.sig.name.clone())
                .or_default()
                .push(f.clone());
        }
        DeclKind::Struct(s) => {
            if record.structs.contains_key(&s.name) {
                errors.push(duplicate(&s.name, decl.span));
            }
            record.structs.insert(s.name.clone(), s.clone());
        }
        DeclKind::Union(u) => {
            record.unions.insert(u.name.clone(), u.clone());
        }
        DeclKind::Enum(e) => {
            if record.enums.contains_key(&e.name) {
                errors.push(duplicate(&e.name, decl.span));
            }
            record.enums.insert(e.name.clone(), e.clone());
        }
        DeclKind::Behavior(b) => {
            record.behaviors.insert(b.name.clone(), b.clone());
        }
        DeclKind::Impl(_) => {
            // Impl blocks carry no top-level name of their own; Pass 3
            // (`impls.rs`) associates them with their self type.
        }
        DeclKind::TypeAlias(a) => {
            record.type_aliases.insert(a.name.clone(), a.clone());
        }
        DeclKind::Const(c) => {
            record.constants.insert(c.name.clone(), c.clone());
        }
        DeclKind::Use(_) => {
            // Handled by Pass 2 (`uses.rs`).
        }
        DeclKind::Mod(m) => {
            record.submodules.push(m.name.clone());
            if let Some(items) = &m.items {
                for inner in items {
                    register_one(inner, record, errors);
                }
            }
        }
        DeclKind::DecoratorDef(_) => {
            // Decorator *definitions* carry no checked semantics in this
            // core; `@derive(...)` consumption happens in Pass 4/codegen.
        }
        DeclKind::Class(c) => {
            if record.classes.contains_key(&c.name) {
                errors.push(duplicate(&c.name, decl.span));
            }
            record.classes.insert(c.name.clone(), c.clone());
        }
        DeclKind::Interface(i) => {
            record.interfaces.insert(i.name.clone(), i.clone());
        }
    }
}

fn duplicate(name: &str, span: crate::source::Span) -> TypeError {
    TypeError::new(
        TypeErrorKind::TypeMismatch,
        format!("`{}` is already defined in this module", name),
        span,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::decls::{StructDecl, Visibility};
    use crate::sem::module::ModuleRegistry;
    use crate::source::Span;

    fn struct_decl(name: &str) -> Decl {
        Decl::new(
            DeclKind::Struct(StructDecl {
                name: name.to_string(),
                generics: vec![],
                const_generics: vec![],
                fields: vec![],
                visibility: Visibility::Public,
                decorators: vec![],
                span: Span::at(0),
            }),
            Span::at(0),
        )
    }

    #[test]
    fn registers_struct_into_registry() {
        let mut env = TypeEnv::new(ModuleRegistry::new());
        let ast = ModuleAst {
            module_doc: vec![],
            decls: vec![struct_decl("Point")],
        };
        let errors = register_declarations(
            &ast,
            vec!["main".into()],
            String::new(),
            PathBuf::from("main.tml"),
            &mut env,
        );
        assert!(errors.is_empty());
        assert!(env
            .registry
            .get(&["main".to_string()])
            .unwrap()
            .structs
            .contains_key("Point"));
    }

    #[test]
    fn duplicate_struct_name_is_diagnostic() {
        let mut env = TypeEnv::new(ModuleRegistry::new());
        let ast = ModuleAst {
            module_doc: vec![],
            decls: vec![struct_decl("Point"), struct_decl("Point")],
        };
        let errors = register_declarations(
            &ast,
            vec!["main".into()],
            String::new(),
            PathBuf::from("main.tml"),
            &mut env,
        );
        assert_eq!(errors.len(), 1);
    }
}
