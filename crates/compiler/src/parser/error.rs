//! Parser diagnostics: expected-token/expression/pattern/type mismatches.

use crate::diagnostics::Diagnostic;
use crate::source::Span;

#[derive(Debug, Clone)]
pub enum ParseErrorKind {
    ExpectedToken(&'static str),
    ExpectedExpression,
    ExpectedPattern,
    ExpectedType,
    ExpectedDeclaration,
    DanglingOperator,
    InvalidPatternInContext(&'static str),
}

#[derive(Debug, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub span: Span,
    pub recovery_hint: Option<String>,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, message: impl Into<String>, span: Span) -> Self {
        ParseError {
            kind,
            message: message.into(),
            span,
            recovery_hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.recovery_hint = Some(hint.into());
        self
    }

    pub fn into_diagnostic(self) -> Diagnostic {
        let mut diag = Diagnostic::error("P001", self.message, self.span);
        if let Some(hint) = self.recovery_hint {
            diag = diag.with_note(hint);
        }
        diag
    }
}
