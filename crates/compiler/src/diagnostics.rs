//! Shared diagnostic rendering.
//!
//! Every pass accumulates its own typed error (`LexError`, `ParseError`,
//! `TypeError`, `BorrowError`, `CodeGenError`), but they all render the same
//! way: `file:line:col: kind: message`, the offending source line with a
//! caret underline, zero or more indented notes, and an optional second
//! "related" location with its own underline.

use crate::source::{Source, Span};
use std::fmt;

/// Severity of a rendered diagnostic. The core only ever emits `Error`
/// (warnings, where they exist, are still hard-accumulated as errors that
/// block the next pass) except for a small set of deliberately-lenient
/// diagnostics (`T011` missing `let`/`var` annotation) that are recorded but
/// do not themselves block a pass from completing — see
/// [`Diagnostic::blocks_pipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A single rendered diagnostic, shared shape for every pass.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
    pub span: Span,
    pub notes: Vec<String>,
    pub related: Option<(String, Span)>,
}

impl Diagnostic {
    pub fn error(code: &'static str, message: impl Into<String>, span: Span) -> Self {
        Diagnostic {
            severity: Severity::Error,
            code,
            message: message.into(),
            span,
            notes: Vec::new(),
            related: None,
        }
    }

    pub fn warning(code: &'static str, message: impl Into<String>, span: Span) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            code,
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

    /// A `Warning`-severity diagnostic still accumulates but does not by
    /// itself prevent the pipeline from advancing to the next pass (used
    /// for `T011`: a missing `let`/`var` type annotation).
    pub fn blocks_pipeline(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Render this diagnostic against `source` in the standard format.
    pub fn render(&self, source: &Source) -> String {
        let mut out = String::new();
        self.render_one(source, &mut out);
        if let Some((msg, span)) = &self.related {
            out.push('\n');
            render_location(source, *span, "related", msg, &mut out);
        }
        out
    }

    fn render_one(&self, source: &Source, out: &mut String) {
        let kind = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        let lc = source.line_col(self.span.start.byte);
        let _ = writeln!(
            out,
            "{}:{}:{}: {} {}: {}",
            source.path().display(),
            lc.line,
            lc.column,
            kind,
            self.code,
            self.message
        );
        render_caret(source, self.span, out);
        for note in &self.notes {
            let _ = writeln!(out, "  note: {}", note);
        }
    }
}

fn render_location(source: &Source, span: Span, label: &str, message: &str, out: &mut String) {
    let lc = source.line_col(span.start.byte);
    let _ = writeln!(
        out,
        "{}:{}:{}: {}: {}",
        source.path().display(),
        lc.line,
        lc.column,
        label,
        message
    );
    render_caret(source, span, out);
}

fn render_caret(source: &Source, span: Span, out: &mut String) {
    let line = source.line_text(span.start.byte);
    let lc = source.line_col(span.start.byte);
    let _ = writeln!(out, "  {}", line);
    let underline_len = span.len().max(1) as usize;
    let pad = " ".repeat(lc.column.saturating_sub(1) as usize);
    let carets = "^".repeat(underline_len);
    let _ = writeln!(out, "  {}{}", pad, carets);
}

use std::fmt::Write;

/// A bag of diagnostics accumulated by one pass. Passes never stop at the
/// first error — they keep going to produce a maximal batch — but the
/// driver refuses to start the next pass if `has_errors()` is true.
#[derive(Debug, Default, Clone)]
pub struct DiagnosticBag {
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diag: Diagnostic) {
        self.diagnostics.push(diag);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.blocks_pipeline())
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn extend(&mut self, other: DiagnosticBag) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn render_all(&self, source: &Source) -> String {
        self.diagnostics
            .iter()
            .map(|d| d.render(source))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for DiagnosticBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in &self.diagnostics {
            writeln!(f, "{}:{}: {}", d.code, d.span.start.byte, d.message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_caret_line() {
        let source = Source::new("t.tml", "let x = 42\n".to_string());
        let diag = Diagnostic::error("T011", "missing type annotation", Span::new(4, 5));
        let rendered = diag.render(&source);
        assert!(rendered.contains("t.tml:1:5"));
        assert!(rendered.contains("let x = 42"));
        assert!(rendered.contains('^'));
    }

    #[test]
    fn warning_does_not_block_pipeline() {
        let mut bag = DiagnosticBag::new();
        bag.push(Diagnostic::warning("T011", "missing annotation", Span::at(0)));
        assert!(!bag.has_errors());
    }

    #[test]
    fn error_blocks_pipeline() {
        let mut bag = DiagnosticBag::new();
        bag.push(Diagnostic::error("T001", "type mismatch", Span::at(0)));
        assert!(bag.has_errors());
    }
}
