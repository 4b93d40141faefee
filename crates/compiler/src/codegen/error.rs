//! Codegen diagnostics, codes `C001`... Unlike the earlier
//! passes, an unsupported construct does not usually halt generation of
//! the rest of the module — the generator records the error and keeps
//! emitting IR for everything it does understand, to maximize the
//! diagnostic batch.

use crate::diagnostics::Diagnostic;
use crate::source::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeGenErrorKind {
    UnsupportedConstruct,
    UnresolvedMonomorphization,
    MissingRuntimeFunction,
    NoMainFunction,
}

impl CodeGenErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            CodeGenErrorKind::UnsupportedConstruct => "C001",
            CodeGenErrorKind::UnresolvedMonomorphization => "C002",
            CodeGenErrorKind::MissingRuntimeFunction => "C003",
            CodeGenErrorKind::NoMainFunction => "C004",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CodeGenError {
    pub kind: CodeGenErrorKind,
    pub message: String,
    pub span: Span,
    pub notes: Vec<String>,
}

impl CodeGenError {
    pub fn new(kind: CodeGenErrorKind, message: impl Into<String>, span: Span) -> Self {
        CodeGenError {
            kind,
            message: message.into(),
            span,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn into_diagnostic(self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.kind.code(), self.message, self.span);
        for note in self.notes {
            diag = diag.with_note(note);
        }
        diag
    }
}

impl std::fmt::Display for CodeGenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.code(), self.message)
    }
}

impl std::error::Error for CodeGenError {}
