//! Type-checker diagnostics, codes `T001`..`T040`+.

use crate::diagnostics::Diagnostic;
use crate::source::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeErrorKind {
    TypeMismatch,
    UnknownIdentifier,
    UnknownType,
    UnknownField,
    UnknownVariant,
    AmbiguousOverload,
    MissingReturnType,
    MissingLetAnnotation,
    ArityMismatch,
    BehaviorNotImplemented,
    VisibilityViolation,
    MutabilityViolation,
    DivisionByZero,
    MetaprogrammingUnsupported,
    InheritanceError,
    AwaitOutsideAsync,
}

impl TypeErrorKind {
    pub fn code(self) -> &'static str {
        use TypeErrorKind::*;
        match self {
            TypeMismatch => "T001",
            UnknownIdentifier => "T002",
            UnknownType => "T003",
            UnknownField => "T004",
            UnknownVariant => "T005",
            AmbiguousOverload => "T006",
            MissingReturnType => "T007",
            ArityMismatch => "T008",
            BehaviorNotImplemented => "T009",
            VisibilityViolation => "T010",
            MissingLetAnnotation => "T011",
            MutabilityViolation => "T012",
            DivisionByZero => "T013",
            MetaprogrammingUnsupported => "T014",
            InheritanceError => "T015",
            AwaitOutsideAsync => "T016",
        }
    }

    /// `T011` (missing `let`/`var` annotation) is the one lenient
    /// diagnostic in the taxonomy: it is recorded but does not itself
    /// block the pipeline.
    pub fn is_warning(self) -> bool {
        matches!(self, TypeErrorKind::MissingLetAnnotation)
    }
}

#[derive(Debug, Clone)]
pub struct TypeError {
    pub kind: TypeErrorKind,
    pub message: String,
    pub span: Span,
    pub notes: Vec<String>,
    pub related: Option<(String, Span)>,
}

impl TypeError {
    pub fn new(kind: TypeErrorKind, message: impl Into<String>, span: Span) -> Self {
        TypeError {
            kind,
            message: message.into(),
            span,
            notes: Vec::new(),
            related: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_suggestions(mut self, names: &[String]) -> Self {
        if !names.is_empty() {
            self.notes
                .push(format!("did you mean: {}?", names.join(", ")));
        }
        self
    }

    pub fn with_related(mut self, message: impl Into<String>, span: Span) -> Self {
        self.related = Some((message.into(), span));
        self
    }

    pub fn into_diagnostic(self) -> Diagnostic {
        let mut diag = if self.kind.is_warning() {
            Diagnostic::warning(self.kind.code(), self.message, self.span)
        } else {
            Diagnostic::error(self.kind.code(), self.message, self.span)
        };
        for note in self.notes {
            diag = diag.with_note(note);
        }
        if let Some((msg, span)) = self.related {
            diag = diag.with_related(msg, span);
        }
        diag
    }
}
