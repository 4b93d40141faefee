//! String, char and interpolation literal scanning.
//!
//! Three related literal forms share escape-processing logic:
//!   - plain `"..."` strings (and interpolated `"...{expr}..."` strings,
//!     which the lexer splits into `InterpStringStart/Middle/End` tokens
//!     around the braces, leaving the interior to be re-lexed as normal
//!     tokens by the driving loop in `mod.rs`),
//!   - raw strings (`r"..."`, no escape processing),
//!   - `'c'` char literals (exactly one scalar value after escaping).

use super::error::{LexError, LexErrorKind};
use crate::source::Span;

/// Outcome of scanning the escape-processed content of a `"`- or `'`-quoted
/// literal up to (but not including) the closing delimiter, an unescaped
/// `{`, or an unescaped `` ` `` continuation boundary.
pub struct ScannedText {
    pub value: String,
    /// Byte length consumed from the *start* of the content (i.e. not
    /// including the opening quote/brace).
    pub len: usize,
    /// True if scanning stopped at an unescaped `{` (interpolation site)
    /// rather than the closing delimiter.
    pub hit_brace: bool,
}

/// Scan plain string content starting just after the opening `"`, stopping
/// at an unescaped `"` or an unescaped `{`. `start` is the byte offset of
/// the first content byte (i.e. one past the opening quote).
pub fn scan_string_content(
    text: &str,
    start: usize,
    closing: char,
) -> Result<ScannedText, LexError> {
    let bytes = text.as_bytes();
    let mut value = String::new();
    let mut i = start;

    loop {
        if i >= bytes.len() {
            return Err(LexError::new(
                LexErrorKind::UnterminatedString,
                "unterminated string literal",
                Span::new(start as u32, i as u32),
            ));
        }
        let c = text[i..].chars().next().unwrap();
        if c == closing {
            return Ok(ScannedText {
                value,
                len: i - start,
                hit_brace: false,
            });
        }
        if c == '{' {
            return Ok(ScannedText {
                value,
                len: i - start,
                hit_brace: true,
            });
        }
        if c == '\n' {
            return Err(LexError::new(
                LexErrorKind::UnterminatedString,
                "unterminated string literal (newline before closing quote)",
                Span::new(start as u32, i as u32),
            ));
        }
        if c == '\\' {
            let esc_start = i;
            i += 1;
            if i >= bytes.len() {
                return Err(LexError::new(
                    LexErrorKind::InvalidEscape,
                    "unterminated escape sequence",
                    Span::new(esc_start as u32, i as u32),
                ));
            }
            let (decoded, consumed) = decode_escape(text, i)?;
            value.push(decoded);
            i += consumed;
            continue;
        }
        value.push(c);
        i += c.len_utf8();
    }
}

/// Scan a raw string `r"..."`: no escape processing, runs until the closing
/// quote (raw strings cannot contain the closing quote at all).
pub fn scan_raw_string_content(text: &str, start: usize) -> Result<ScannedText, LexError> {
    let bytes = text.as_bytes();
    let mut i = start;
    while i < bytes.len() && bytes[i] != b'"' {
        if bytes[i] == b'\n' {
            return Err(LexError::new(
                LexErrorKind::UnterminatedRawString,
                "unterminated raw string literal",
                Span::new(start as u32, i as u32),
            ));
        }
        i += 1;
    }
    if i >= bytes.len() {
        return Err(LexError::new(
            LexErrorKind::UnterminatedRawString,
            "unterminated raw string literal",
            Span::new(start as u32, i as u32),
        ));
    }
    Ok(ScannedText {
        value: text[start..i].to_string(),
        len: i - start,
        hit_brace: false,
    })
}

/// Scan a `'c'` char literal's content, starting just after the opening `'`.
/// Returns the single decoded scalar and the byte length consumed,
/// including the closing `'`.
pub fn scan_char_content(text: &str, start: usize) -> Result<(char, usize), LexError> {
    let bytes = text.as_bytes();
    if start >= bytes.len() {
        return Err(LexError::new(
            LexErrorKind::UnterminatedChar,
            "unterminated char literal",
            Span::new(start as u32, start as u32),
        ));
    }
    if bytes[start] == b'\'' {
        return Err(LexError::new(
            LexErrorKind::EmptyChar,
            "empty char literal",
            Span::new(start as u32, (start + 1) as u32),
        ));
    }

    let mut i = start;
    let c = text[i..].chars().next().unwrap();
    let value = if c == '\\' {
        i += 1;
        let (decoded, consumed) = decode_escape(text, i)?;
        i += consumed;
        decoded
    } else {
        i += c.len_utf8();
        c
    };

    if i >= bytes.len() || bytes[i] != b'\'' {
        return Err(LexError::new(
            LexErrorKind::UnterminatedChar,
            "char literal must contain exactly one character",
            Span::new(start as u32, i as u32),
        ));
    }
    Ok((value, i + 1 - start))
}

/// Decode a single escape sequence whose backslash has already been
/// consumed; `i` points at the character immediately following `\`. Returns
/// the decoded scalar and the number of bytes consumed starting at `i`.
fn decode_escape(text: &str, i: usize) -> Result<(char, usize), LexError> {
    let bytes = text.as_bytes();
    let c = text[i..].chars().next().ok_or_else(|| {
        LexError::new(
            LexErrorKind::InvalidEscape,
            "unterminated escape sequence",
            Span::new(i as u32, i as u32),
        )
    })?;
    match c {
        'n' => Ok(('\n', 1)),
        't' => Ok(('\t', 1)),
        'r' => Ok(('\r', 1)),
        '0' => Ok(('\0', 1)),
        '\\' => Ok(('\\', 1)),
        '\'' => Ok(('\'', 1)),
        '"' => Ok(('"', 1)),
        '{' => Ok(('{', 1)),
        '`' => Ok(('`', 1)),
        'u' => {
            if bytes.get(i + 1) != Some(&b'{') {
                return Err(LexError::new(
                    LexErrorKind::UnterminatedUnicodeEscape,
                    "expected '{' after \\u",
                    Span::new(i as u32, (i + 1) as u32),
                ));
            }
            let digits_start = i + 2;
            let mut j = digits_start;
            while j < bytes.len() && bytes[j] != b'}' {
                j += 1;
            }
            if j >= bytes.len() {
                return Err(LexError::new(
                    LexErrorKind::UnterminatedUnicodeEscape,
                    "unterminated unicode escape",
                    Span::new(i as u32, j as u32),
                ));
            }
            let hex = &text[digits_start..j];
            let code = u32::from_str_radix(hex, 16).map_err(|_| {
                LexError::new(
                    LexErrorKind::UnterminatedUnicodeEscape,
                    format!("invalid hex digits in unicode escape '{}'", hex),
                    Span::new(digits_start as u32, j as u32),
                )
            })?;
            let decoded = char::from_u32(code).ok_or_else(|| {
                LexError::new(
                    LexErrorKind::UnterminatedUnicodeEscape,
                    format!("'{:x}' is not a valid unicode scalar value", code),
                    Span::new(digits_start as u32, j as u32),
                )
            })?;
            Ok((decoded, j + 1 - i))
        }
        other => Err(LexError::new(
            LexErrorKind::InvalidEscape,
            format!("unknown escape sequence '\\{}'", other),
            Span::new(i as u32, (i + other.len_utf8()) as u32),
        )),
    }
}

/// Scan template literal content (backtick-delimited `` `...` ``), stopping
/// at an unescaped closing backtick or the two-character interpolation
/// opener `${`.
pub fn scan_template_content(text: &str, start: usize) -> Result<ScannedText, LexError> {
    let bytes = text.as_bytes();
    let mut value = String::new();
    let mut i = start;

    loop {
        if i >= bytes.len() {
            return Err(LexError::new(
                LexErrorKind::UnterminatedString,
                "unterminated template literal",
                Span::new(start as u32, i as u32),
            ));
        }
        let c = text[i..].chars().next().unwrap();
        if c == '`' {
            return Ok(ScannedText {
                value,
                len: i - start,
                hit_brace: false,
            });
        }
        if c == '$' && bytes.get(i + 1) == Some(&b'{') {
            return Ok(ScannedText {
                value,
                len: i - start,
                hit_brace: true,
            });
        }
        if c == '\\' {
            let esc_start = i;
            i += 1;
            if i >= bytes.len() {
                return Err(LexError::new(
                    LexErrorKind::InvalidEscape,
                    "unterminated escape sequence",
                    Span::new(esc_start as u32, i as u32),
                ));
            }
            let (decoded, consumed) = decode_escape(text, i)?;
            value.push(decoded);
            i += consumed;
            continue;
        }
        value.push(c);
        i += c.len_utf8();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_string_with_escapes() {
        let s = scan_string_content("hi\\n\"", 0, '"').unwrap();
        assert_eq!(s.value, "hi\n");
        assert!(!s.hit_brace);
    }

    #[test]
    fn string_stops_at_brace_for_interpolation() {
        let s = scan_string_content("total: {", 0, '"').unwrap();
        assert_eq!(s.value, "total: ");
        assert!(s.hit_brace);
    }

    #[test]
    fn unterminated_string_errors() {
        let err = scan_string_content("oops", 0, '"').unwrap_err();
        assert_eq!(err.kind.code(), "L002");
    }

    #[test]
    fn char_literal_simple() {
        let (c, len) = scan_char_content("a'", 0).unwrap();
        assert_eq!(c, 'a');
        assert_eq!(len, 2);
    }

    #[test]
    fn char_literal_escaped_newline() {
        let (c, len) = scan_char_content("\\n'", 0).unwrap();
        assert_eq!(c, '\n');
        assert_eq!(len, 3);
    }

    #[test]
    fn empty_char_literal_errors() {
        let err = scan_char_content("'", 0).unwrap_err();
        assert_eq!(err.kind.code(), "L006");
    }

    #[test]
    fn unicode_escape() {
        let s = scan_string_content("\\u{1F600}\"", 0, '"').unwrap();
        assert_eq!(s.value.chars().next().unwrap() as u32, 0x1F600);
    }

    #[test]
    fn raw_string_ignores_escapes() {
        let s = scan_raw_string_content("a\\nb\"", 0).unwrap();
        assert_eq!(s.value, "a\\nb");
    }
}
