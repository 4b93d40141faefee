//! Statement nodes.

use super::decls::Decl;
use super::exprs::Expr;
use super::types::TypeNode;
use crate::source::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `let name: Type = expr`. The type annotation is required by the
    /// grammar; its absence is recorded as `None` here and flagged as a
    /// (non-fatal) diagnostic by the type checker (`T011`).
    Let {
        name: String,
        ty: Option<TypeNode>,
        value: Expr,
    },
    /// `var name: Type = expr` — sugar for `let mut name: Type = expr`,
    /// kept as its own statement kind so later passes can tell which
    /// surface form produced the binding.
    Var {
        name: String,
        ty: Option<TypeNode>,
        value: Expr,
    },
    Expr {
        expr: Expr,
        has_semi: bool,
    },
    Decl(Box<Decl>),
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Stmt { kind, span }
    }
}
