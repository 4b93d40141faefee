//! Borrow-checker diagnostics, codes `B001`..`B008`.

use crate::diagnostics::Diagnostic;
use crate::source::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowErrorKind {
    MoveAfterMove,
    UseOfMoved,
    UseAfterDrop,
    BorrowedDuringMove,
    MutateWhileBorrowed,
    ConflictingMutableBorrow,
    SharedWhileMutablyBorrowed,
    ReborrowFromImmutableAsMutable,
}

impl BorrowErrorKind {
    pub fn code(self) -> &'static str {
        use BorrowErrorKind::*;
        match self {
            MoveAfterMove => "B001",
            UseOfMoved => "B002",
            UseAfterDrop => "B003",
            BorrowedDuringMove => "B004",
            MutateWhileBorrowed => "B005",
            ConflictingMutableBorrow => "B006",
            SharedWhileMutablyBorrowed => "B007",
            ReborrowFromImmutableAsMutable => "B008",
        }
    }
}

#[derive(Debug, Clone)]
pub struct BorrowError {
    pub kind: BorrowErrorKind,
    pub message: String,
    pub span: Span,
    pub notes: Vec<String>,
    pub related: Option<(String, Span)>,
}

impl BorrowError {
    pub fn new(kind: BorrowErrorKind, message: impl Into<String>, span: Span) -> Self {
        BorrowError {
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

    pub fn with_related(mut self, message: impl Into<String>, span: Span) -> Self {
        self.related = Some((message.into(), span));
        self
    }

    pub fn into_diagnostic(self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.kind.code(), self.message, self.span);
        for note in self.notes {
            diag = diag.with_note(note);
        }
        if let Some((msg, span)) = self.related {
            diag = diag.with_related(msg, span);
        }
        diag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_taxonomy_order() {
        assert_eq!(BorrowErrorKind::MoveAfterMove.code(), "B001");
        assert_eq!(BorrowErrorKind::UseOfMoved.code(), "B002");
        assert_eq!(BorrowErrorKind::ReborrowFromImmutableAsMutable.code(), "B008");
    }

    #[test]
    fn related_span_survives_into_diagnostic() {
        let err = BorrowError::new(BorrowErrorKind::UseOfMoved, "use of moved value", Span::at(10))
            .with_related("moved here", Span::at(0));
        let diag = err.into_diagnostic();
        assert!(diag.related.is_some());
    }
}
