//! Pass 2 — use resolution.
//!
//! Processes `use` declarations, recording imported-symbol mappings with
//! visibility. Glob imports and `as` aliases are expanded into the
//! per-module imported-symbol table (`TypeEnv::imports`).

use crate::ast::decls::{Decl, DeclKind, FuncDecl, ModuleAst, UseTree, Visibility};
use crate::sem::env::ImportedSymbol;
use crate::sem::error::{TypeError, TypeErrorKind};
use crate::sem::TypeEnv;

pub fn resolve_uses(ast: &ModuleAst, env: &mut TypeEnv) -> Vec<TypeError> {
    let mut errors = Vec::new();
    for decl in &ast.decls {
        if let DeclKind::Use(use_decl) = &decl.kind {
            resolve_tree(&use_decl.tree, &[], use_decl.visibility, env, &mut errors, decl.span);
        }
    }
    errors
}

fn resolve_tree(
    tree: &UseTree,
    prefix: &[String],
    visibility: Visibility,
    env: &mut TypeEnv,
    errors: &mut Vec<TypeError>,
    span: crate::source::Span,
) {
    match tree {
        UseTree::Single { path, alias } => {
            let mut full = prefix.to_vec();
            full.extend(path.iter().cloned());
            let (module_path, original_name) = split_module_and_name(&full);
            let local_name = alias.clone().unwrap_or_else(|| original_name.clone());
            if env
                .registry
                .get(&module_path)
                .map(|m| m.has_symbol(&original_name))
                .unwrap_or(false)
                || module_path.is_empty()
            {
                env.imports.insert(
                    local_name,
                    ImportedSymbol {
                        module_path,
                        original_name,
                        visibility,
                    },
                );
            } else {
                errors.push(TypeError::new(
                    TypeErrorKind::UnknownIdentifier,
                    format!("unresolved import `{}`", full.join("::")),
                    span,
                ));
            }
        }
        UseTree::Glob { path } => {
            let mut full = prefix.to_vec();
            full.extend(path.iter().cloned());
            if let Some(module) = env.registry.get(&full) {
                for name in module.all_symbol_names() {
                    env.imports.insert(
                        name.clone(),
                        ImportedSymbol {
                            module_path: full.clone(),
                            original_name: name,
                            visibility,
                        },
                    );
                }
            } else {
                errors.push(TypeError::new(
                    TypeErrorKind::UnknownIdentifier,
                    format!("unresolved module in glob import `{}::*`", full.join("::")),
                    span,
                ));
            }
        }
        UseTree::Group { prefix: group_prefix, items } => {
            let mut full = prefix.to_vec();
            full.extend(group_prefix.iter().cloned());
            for item in items {
                resolve_tree(item, &full, visibility, env, errors, span);
            }
        }
    }
}

fn split_module_and_name(full: &[String]) -> (Vec<String>, String) {
    if full.len() <= 1 {
        (vec![], full.first().cloned().unwrap_or_default())
    } else {
        let (module, name) = full.split_at(full.len() - 1);
        (module.to_vec(), name[0].clone())
    }
}

/// Resolution order for an unknown name: local
/// scope, then current module, then imported symbols, then the registry.
/// Returns the resolved (module_path, name) if found anywhere.
pub fn resolve_name(name: &str, current_module: &[String], env: &TypeEnv) -> Option<(Vec<String>, String)> {
    if env.lookup(name).is_some() {
        return Some((vec![], name.to_string()));
    }
    if let Some(m) = env.registry.get(current_module) {
        if m.has_symbol(name) {
            return Some((current_module.to_vec(), name.to_string()));
        }
    }
    if let Some(import) = env.imports.get(name) {
        return Some((import.module_path.clone(), import.original_name.clone()));
    }
    if env.builtins.contains_key(name) {
        return Some((vec![], name.to_string()));
    }
    None
}

/// Looks up a free function's declared overload set (current module, then
/// imports) so a call site can perform spec.md §4.4's "first signature
/// whose parameter types match" resolution against real signatures rather
/// than the plain existence check `resolve_name` does. Local bindings
/// (a variable holding a closure) are not module-level functions and are
/// resolved separately by the caller.
pub fn resolve_function_overloads(
    name: &str,
    current_module: &[String],
    env: &TypeEnv,
) -> Option<Vec<FuncDecl>> {
    if let Some(m) = env.registry.get(current_module) {
        if let Some(overloads) = m.functions.get(name) {
            return Some(overloads.clone());
        }
    }
    if let Some(import) = env.imports.get(name) {
        if let Some(m) = env.registry.get(&import.module_path) {
            if let Some(overloads) = m.functions.get(&import.original_name) {
                return Some(overloads.clone());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::decls::{StructDecl, UseDecl};
    use crate::sem::module::ModuleRegistry;
    use crate::source::Span;

    #[test]
    fn glob_import_populates_imports_table() {
        let mut env = TypeEnv::new(ModuleRegistry::new());
        let mut m = crate::sem::module::ModuleRecord::new(
            vec!["geo".into()],
            String::new(),
            std::path::PathBuf::from("geo.tml"),
        );
        m.structs.insert(
            "Point".into(),
            StructDecl {
                name: "Point".into(),
                generics: vec![],
                const_generics: vec![],
                fields: vec![],
                visibility: Visibility::Public,
                decorators: vec![],
                span: Span::at(0),
            },
        );
        env.registry.insert(m);

        let ast = ModuleAst {
            module_doc: vec![],
            decls: vec![Decl::new(
                DeclKind::Use(UseDecl {
                    tree: UseTree::Glob {
                        path: vec!["geo".into()],
                    },
                    visibility: Visibility::Private,
                    span: Span::at(0),
                }),
                Span::at(0),
            )],
        };
        let errors = resolve_uses(&ast, &mut env);
        assert!(errors.is_empty());
        assert!(env.imports.contains_key("Point"));
    }

    #[test]
    fn unresolved_import_is_diagnostic() {
        let mut env = TypeEnv::new(ModuleRegistry::new());
        let ast = ModuleAst {
            module_doc: vec![],
            decls: vec![Decl::new(
                DeclKind::Use(UseDecl {
                    tree: UseTree::Single {
                        path: vec!["nope".into(), "Thing".into()],
                        alias: None,
                    },
                    visibility: Visibility::Private,
                    span: Span::at(0),
                }),
                Span::at(0),
            )],
        };
        let errors = resolve_uses(&ast, &mut env);
        assert_eq!(errors.len(), 1);
    }
}
