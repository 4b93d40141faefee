//! Pattern nodes, used in `let`/`var` bindings, `when` arms, closure
//! parameters, and `for` loop targets.

use super::types::TypeNode;
use crate::source::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub kind: PatternKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatternKind {
    Wildcard,
    Ident {
        name: String,
        mutable: bool,
        sub_pattern: Option<Box<Pattern>>,
    },
    Literal(super::exprs::LiteralPattern),
    Tuple(Vec<Pattern>),
    Struct {
        path: Vec<String>,
        fields: Vec<(String, Pattern)>,
        has_rest: bool,
    },
    EnumVariant {
        path: Vec<String>,
        variant: String,
        payload: Vec<Pattern>,
    },
    Or(Vec<Pattern>),
    /// `a to b` (exclusive) or `a through b` (inclusive).
    Range {
        lo: Box<Pattern>,
        hi: Box<Pattern>,
        inclusive: bool,
    },
    Array {
        elements: Vec<Pattern>,
        rest: Option<RestBinding>,
    },
    /// Type-annotated binding pattern used where the grammar requires an
    /// explicit `: Type` alongside the bound name (closure params).
    Typed {
        inner: Box<Pattern>,
        ty: TypeNode,
    },
}

/// An optional named binding for an array pattern's `..` rest element,
/// e.g. `[first, ..rest]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RestBinding {
    pub name: Option<String>,
}

impl Pattern {
    pub fn new(kind: PatternKind, span: Span) -> Self {
        Pattern { kind, span }
    }
}
