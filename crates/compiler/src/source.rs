//! Source buffers and spans.
//!
//! A [`Source`] owns the immutable UTF-8 text of one input file along with a
//! precomputed line-start index, so any byte offset can be turned into a
//! `(line, column)` pair in `O(log N)` without rescanning the file. Every
//! downstream artifact (tokens, AST nodes, diagnostics) carries a [`Span`]
//! rather than a copy of the text it covers.

use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// A single byte position within a [`Source`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Loc {
    pub byte: u32,
}

impl Loc {
    pub fn new(byte: u32) -> Self {
        Loc { byte }
    }
}

/// A half-open byte range `[start, end)` over one [`Source`].
///
/// Spans propagate through every downstream artifact: tokens, AST nodes,
/// semantic types (where relevant), and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Loc,
    pub end: Loc,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Span {
            start: Loc::new(start),
            end: Loc::new(end),
        }
    }

    /// A zero-width span at a single position, used for synthetic nodes.
    pub fn at(pos: u32) -> Self {
        Span::new(pos, pos)
    }

    /// Merge two spans into the smallest span containing both.
    pub fn to(self, other: Span) -> Span {
        Span::new(
            self.start.byte.min(other.start.byte),
            self.end.byte.max(other.end.byte),
        )
    }

    pub fn len(&self) -> u32 {
        self.end.byte - self.start.byte
    }

    pub fn is_empty(&self) -> bool {
        self.end.byte == self.start.byte
    }
}

/// A resolved `(line, column, length)` triple for rendering diagnostics.
/// Lines and columns are 1-indexed for user-facing output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCol {
    pub line: u32,
    pub column: u32,
}

/// Immutable UTF-8 source buffer with a filename and a line-start index.
///
/// Cheap to clone (wraps an `Rc`): every pass that needs to resolve a span
/// back to source text holds its own `Source` handle rather than threading
/// a borrow through the whole pipeline.
#[derive(Clone)]
pub struct Source {
    inner: Rc<SourceInner>,
}

struct SourceInner {
    path: PathBuf,
    text: String,
    /// Byte offset of the start of each line; `line_starts[0] == 0`.
    line_starts: Vec<u32>,
}

impl Source {
    pub fn new(path: impl Into<PathBuf>, text: String) -> Self {
        let line_starts = compute_line_starts(&text);
        Source {
            inner: Rc::new(SourceInner {
                path: path.into(),
                text,
                line_starts,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn text(&self) -> &str {
        &self.inner.text
    }

    pub fn slice(&self, span: Span) -> &str {
        &self.inner.text[span.start.byte as usize..span.end.byte as usize]
    }

    /// Resolve a byte offset to `(line, column)` via binary search over the
    /// line-start index. Both are 1-indexed.
    pub fn line_col(&self, byte: u32) -> LineCol {
        let starts = &self.inner.line_starts;
        let line_idx = match starts.binary_search(&byte) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let line_start = starts[line_idx];
        let column = byte_to_char_column(&self.inner.text, line_start, byte);
        LineCol {
            line: line_idx as u32 + 1,
            column,
        }
    }

    /// The full text of the line containing `byte`, without its trailing
    /// newline. Used when rendering a diagnostic's source-line + caret.
    pub fn line_text(&self, byte: u32) -> &str {
        let starts = &self.inner.line_starts;
        let line_idx = match starts.binary_search(&byte) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let start = starts[line_idx] as usize;
        let end = starts
            .get(line_idx + 1)
            .map(|&n| n as usize)
            .unwrap_or(self.inner.text.len());
        self.inner.text[start..end].trim_end_matches(['\n', '\r'])
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("path", &self.inner.path)
            .field("len", &self.inner.text.len())
            .finish()
    }
}

fn compute_line_starts(text: &str) -> Vec<u32> {
    let mut starts = vec![0u32];
    for (i, b) in text.bytes().enumerate() {
        if b == b'\n' {
            starts.push(i as u32 + 1);
        }
    }
    starts
}

/// Count UTF-8 scalar values between `line_start` and `byte` to produce a
/// 1-indexed character column (not a byte column — TML identifiers may
/// contain multi-byte Unicode).
fn byte_to_char_column(text: &str, line_start: u32, byte: u32) -> u32 {
    let slice = &text[line_start as usize..byte as usize];
    slice.chars().count() as u32 + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_first_line() {
        let src = Source::new("t.tml", "let x = 1\nlet y = 2\n".to_string());
        let lc = src.line_col(4);
        assert_eq!(lc.line, 1);
        assert_eq!(lc.column, 5);
    }

    #[test]
    fn line_col_second_line() {
        let src = Source::new("t.tml", "let x = 1\nlet y = 2\n".to_string());
        let lc = src.line_col(10);
        assert_eq!(lc.line, 2);
        assert_eq!(lc.column, 1);
    }

    #[test]
    fn line_text_strips_newline() {
        let src = Source::new("t.tml", "abc\ndef\n".to_string());
        assert_eq!(src.line_text(5), "def");
    }

    #[test]
    fn unicode_column_counts_chars_not_bytes() {
        let src = Source::new("t.tml", "let café = 1\n".to_string());
        // 'é' is 2 bytes in UTF-8; the '=' sits after it.
        let eq_byte = src.text().find('=').unwrap() as u32;
        let lc = src.line_col(eq_byte);
        // "let café " -> 9 characters before '=', so column 10.
        assert_eq!(lc.column, 10);
    }
}
