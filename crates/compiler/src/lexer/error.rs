//! Lexer error codes `L001`..`L013`.

use crate::diagnostics::Diagnostic;
use crate::source::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexErrorKind {
    UnexpectedChar,
    UnterminatedString,
    InvalidNumber,
    InvalidEscape,
    UnterminatedChar,
    EmptyChar,
    UnterminatedUnicodeEscape,
    InvalidNumberSuffix,
    InvalidHexDigits,
    InvalidBinaryDigits,
    InvalidOctalDigits,
    UnterminatedBlockComment,
    UnterminatedRawString,
}

impl LexErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            LexErrorKind::UnexpectedChar => "L001",
            LexErrorKind::UnterminatedString => "L002",
            LexErrorKind::InvalidNumber => "L003",
            LexErrorKind::InvalidEscape => "L004",
            LexErrorKind::UnterminatedChar => "L005",
            LexErrorKind::EmptyChar => "L006",
            LexErrorKind::UnterminatedUnicodeEscape => "L007",
            LexErrorKind::InvalidNumberSuffix => "L008",
            LexErrorKind::InvalidHexDigits => "L009",
            LexErrorKind::InvalidBinaryDigits => "L010",
            LexErrorKind::InvalidOctalDigits => "L011",
            LexErrorKind::UnterminatedBlockComment => "L012",
            LexErrorKind::UnterminatedRawString => "L013",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub message: String,
    pub span: Span,
}

impl LexError {
    pub fn new(kind: LexErrorKind, message: impl Into<String>, span: Span) -> Self {
        LexError {
            kind,
            message: message.into(),
            span,
        }
    }

    pub fn into_diagnostic(self) -> Diagnostic {
        Diagnostic::error(self.kind.code(), self.message, self.span)
    }
}
