//! The borrow checker. Runs after type checking succeeds
//! for a module, walking each function/method body independently.

pub mod checker;
pub mod error;
pub mod place;

pub use checker::BorrowChecker;
pub use error::{BorrowError, BorrowErrorKind};

use crate::ast::decls::{Decl, DeclKind};

/// Runs the borrow checker over every function and method body reachable
/// from `decls`, collecting diagnostics across all of them rather than
/// stopping at the first offending function ( runs
/// independently per function, so one function's errors never block
/// another's).
pub fn check_decls(decls: &[Decl]) -> Vec<BorrowError> {
    let mut errors = Vec::new();
    for decl in decls {
        check_decl(decl, &mut errors);
    }
    errors
}

fn check_decl(decl: &Decl, errors: &mut Vec<BorrowError>) {
    match &decl.kind {
        DeclKind::Func(f) => {
            if f.body.is_some() {
                let mut checker = BorrowChecker::new();
                errors.extend(checker.check_function(f));
            }
        }
        DeclKind::Impl(impl_decl) => {
            for m in &impl_decl.methods {
                if m.body.is_some() {
                    let mut checker = BorrowChecker::new();
                    errors.extend(checker.check_function(m));
                }
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
                    let mut checker = BorrowChecker::new();
                    errors.extend(checker.check_function(&synthetic));
                }
            }
        }
        DeclKind::Behavior(behavior) => {
            for m in &behavior.methods {
                if m.body.is_some() {
                    let mut checker = BorrowChecker::new();
                    errors.extend(checker.check_function(m));
                }
            }
        }
        DeclKind::Mod(m) => {
            if let Some(items) = &m.items {
                for inner in items {
                    check_decl(inner, errors);
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::decls::{FuncDecl, FuncSignature, Visibility};
    use crate::ast::exprs::{Expr, ExprKind, LiteralPattern};
    use crate::ast::types::{TypeKind, TypeNode};
    use crate::source::Span;

    #[test]
    fn check_decls_walks_free_functions() {
        let func = Decl::new(
            DeclKind::Func(FuncDecl {
                sig: FuncSignature {
                    name: "answer".into(),
                    generics: vec![],
                    const_generics: vec![],
                    params: vec![],
                    ret: Some(TypeNode::new(
                        TypeKind::Named {
                            path: vec!["I32".into()],
                            generics: vec![],
                            const_args: vec![],
                        },
                        Span::at(0),
                    )),
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
        let errors = check_decls(&[func]);
        assert!(errors.is_empty());
    }
}
