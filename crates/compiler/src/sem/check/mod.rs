//! The four-pass type checker: declarations, uses, impls,
//! bodies, run strictly in order. A pass that produces any blocking
//! diagnostic halts the pipeline before the next pass runs — only `T011`
//! (missing `let`/`var` annotation) is non-blocking.

pub mod bodies;
pub mod const_eval;
pub mod decls;
pub mod impls;
pub mod suggest;
pub mod uses;

use std::path::PathBuf;

use crate::ast::decls::{Decl, DeclKind, ModuleAst};
use crate::sem::env::TypeEnv;
use crate::sem::error::TypeError;
use crate::sem::module::ModuleRegistry;

/// One compiled module's worth of declaration checking, run against an
/// already-populated [`TypeEnv`] (so multi-file crates can register every
/// module's declarations before resolving any module's uses).
pub struct CheckedModule {
    pub module_path: Vec<String>,
    pub errors: Vec<TypeError>,
}

fn has_blocking_error(errors: &[TypeError]) -> bool {
    errors.iter().any(|e| !e.kind.is_warning())
}

/// Run Pass 1 (declaration registration) for every module ahead of Pass
/// 2-4, so cross-module `use` resolution always sees a complete registry:
/// Pass 1 runs for every module in a crate before Pass 2 begins for any
/// of them.
pub fn register_all_declarations(
    modules: &[(Vec<String>, PathBuf, String, ModuleAst)],
    env: &mut TypeEnv,
) -> Vec<TypeError> {
    let mut errors = Vec::new();
    for (module_path, source_file, source_text, ast) in modules {
        let mut e = decls::register_declarations(
            ast,
            module_path.clone(),
            source_text.clone(),
            source_file.clone(),
            env,
        );
        errors.append(&mut e);
    }
    env.registry.resolve_re_exports();
    errors
}

/// Run Pass 2 (use resolution), Pass 3 (impl/OOP registration), and Pass 4
/// (body checking) for one module, in order, stopping early if an earlier
/// pass in this module produced a blocking error.
pub fn check_module(ast: &ModuleAst, module_path: &[String], env: &mut TypeEnv) -> CheckedModule {
    let mut errors = uses::resolve_uses(ast, env);
    if has_blocking_error(&errors) {
        return CheckedModule {
            module_path: module_path.to_vec(),
            errors,
        };
    }

    let mut impl_errors = impls::register_impls(ast, module_path, env);
    errors.append(&mut impl_errors);
    if has_blocking_error(&errors) {
        return CheckedModule {
            module_path: module_path.to_vec(),
            errors,
        };
    }

    let mut body_errors = check_bodies(ast, module_path, env);
    errors.append(&mut body_errors);
    CheckedModule {
        module_path: module_path.to_vec(),
        errors,
    }
}

fn check_bodies(ast: &ModuleAst, module_path: &[String], env: &mut TypeEnv) -> Vec<TypeError> {
    let mut errors = Vec::new();
    for decl in &ast.decls {
        check_decl_bodies(decl, module_path, env, &mut errors);
    }
    errors
}

fn check_decl_bodies(decl: &Decl, module_path: &[String], env: &mut TypeEnv, errors: &mut Vec<TypeError>) {
    match &decl.kind {
        DeclKind::Func(f) => {
            let mut checker = bodies::BodyChecker::new(module_path.to_vec());
            errors.extend(checker.check_function(f, env));
        }
        DeclKind::Impl(impl_decl) => {
            for m in &impl_decl.methods {
                let mut checker = bodies::BodyChecker::new(module_path.to_vec());
                checker.current_self_type_ = Some(checker.resolve_type_node(&impl_decl.self_ty, env));
                errors.extend(checker.check_function(m, env));
            }
        }
        DeclKind::Class(class) => {
            for m in &class.methods {
                if let Some(body) = &m.body {
                    let synthetic = crate::ast::decls::FuncDecl {
                        sig: m.sig.clone(),
                        body: Some(body.clone()),
                        visibility: m.visibility,
                        decorators: m.decorators.clone(),
                        span: m.span,
                    };
                    let mut checker = bodies::BodyChecker::new(module_path.to_vec());
                    errors.extend(checker.check_function(&synthetic, env));
                }
            }
        }
        DeclKind::Behavior(behavior) => {
            for m in &behavior.methods {
                if m.body.is_some() {
                    let mut checker = bodies::BodyChecker::new(module_path.to_vec());
                    errors.extend(checker.check_function(m, env));
                }
            }
        }
        DeclKind::Mod(m) => {
            if let Some(items) = &m.items {
                for inner in items {
                    check_decl_bodies(inner, module_path, env, errors);
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::decls::{FuncParam, FuncSignature, Visibility};
    use crate::ast::exprs::{Expr, ExprKind, LiteralPattern};
    use crate::ast::types::{TypeKind, TypeNode};
    use crate::source::Span;

    fn int_ty() -> TypeNode {
        TypeNode::new(
            TypeKind::Named {
                path: vec!["I32".into()],
                generics: vec![],
                const_args: vec![],
            },
            Span::at(0),
        )
    }

    #[test]
    fn full_pipeline_checks_a_simple_function() {
        let mut env = TypeEnv::new(ModuleRegistry::new());
        let func = Decl::new(
            DeclKind::Func(crate::ast::decls::FuncDecl {
                sig: FuncSignature {
                    name: "answer".into(),
                    generics: vec![],
                    const_generics: vec![],
                    params: vec![],
                    ret: Some(int_ty()),
                    where_clauses: vec![],
                    is_async: false,
                    is_lowlevel: false,
                },
                body: Some(Expr::new(
                    ExprKind::Literal(LiteralPattern::Int {
                        value: 42,
                        base: crate::lexer::IntBase::Decimal,
                        suffix: None,
                    }),
                    Span::at(0),
                )),
                visibility: Visibility::Public,
                decorators: vec![],
                span: Span::at(0),
            }),
            Span::at(0),
        );
        let ast = ModuleAst {
            module_doc: vec![],
            decls: vec![func],
        };
        let modules = vec![(
            vec!["main".to_string()],
            PathBuf::from("main.tml"),
            String::new(),
            ast.clone(),
        )];
        let decl_errors = register_all_declarations(&modules, &mut env);
        assert!(decl_errors.is_empty());
        let checked = check_module(&ast, &["main".to_string()], &mut env);
        assert!(checked.errors.is_empty());
    }

    #[test]
    fn unused_param_helper_type_is_well_formed() {
        let _ = FuncParam {
            name: "x".into(),
            ty: int_ty(),
            span: Span::at(0),
        };
    }
}
