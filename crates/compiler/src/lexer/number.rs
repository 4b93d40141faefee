//! Numeric literal scanning: four bases, underscore separators, explicit
//! width suffixes, `strtod`-equivalent float parsing.

use super::error::{LexError, LexErrorKind};
use super::token::{IntBase, LiteralValue};
use crate::source::Span;

const INT_SUFFIXES: &[&str] = &[
    "i8", "i16", "i32", "i64", "i128", "u8", "u16", "u32", "u64", "u128",
];
const FLOAT_SUFFIXES: &[&str] = &["f32", "f64"];

/// Result of scanning a numeric literal starting at `start` in `text`.
pub struct ScannedNumber {
    pub value: LiteralValue,
    /// Number of bytes consumed, including any suffix.
    pub len: usize,
}

/// Scan a numeric literal beginning at byte offset `start` (which must be
/// an ASCII digit). `text` is the full source buffer.
pub fn scan_number(text: &str, start: usize) -> Result<ScannedNumber, LexError> {
    let bytes = text.as_bytes();
    let mut i = start;

    let base = if bytes[i] == b'0' && i + 1 < bytes.len() {
        match bytes[i + 1] {
            b'x' | b'X' => {
                i += 2;
                IntBase::Hex
            }
            b'b' | b'B' => {
                i += 2;
                IntBase::Binary
            }
            b'o' | b'O' => {
                i += 2;
                IntBase::Octal
            }
            _ => IntBase::Decimal,
        }
    } else {
        IntBase::Decimal
    };

    let digit_start = i;
    let is_digit_for_base = |b: u8| -> bool {
        match base {
            IntBase::Decimal => b.is_ascii_digit(),
            IntBase::Hex => b.is_ascii_hexdigit(),
            IntBase::Binary => b == b'0' || b == b'1',
            IntBase::Octal => (b'0'..=b'7').contains(&b),
        }
    };

    while i < bytes.len() && (is_digit_for_base(bytes[i]) || bytes[i] == b'_') {
        i += 1;
    }

    let mut digits: String = text[digit_start..i].chars().filter(|c| *c != '_').collect();
    if digits.is_empty() {
        let code = match base {
            IntBase::Hex => LexErrorKind::InvalidHexDigits,
            IntBase::Binary => LexErrorKind::InvalidBinaryDigits,
            IntBase::Octal => LexErrorKind::InvalidOctalDigits,
            IntBase::Decimal => LexErrorKind::InvalidNumber,
        };
        return Err(LexError::new(
            code,
            "expected at least one digit in numeric literal",
            Span::new(start as u32, i as u32),
        ));
    }

    // Float detection only applies to decimal literals: `.` followed by a
    // digit (not `..`), or an exponent `e`/`E`.
    let mut is_float = false;
    if base == IntBase::Decimal {
        if i < bytes.len()
            && bytes[i] == b'.'
            && i + 1 < bytes.len()
            && bytes[i + 1].is_ascii_digit()
        {
            is_float = true;
            i += 1; // consume '.'
            let frac_start = i;
            while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'_') {
                i += 1;
            }
            digits.push('.');
            digits.push_str(&text[frac_start..i].chars().filter(|c| *c != '_').collect::<String>());
        }
        if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
            let exp_marker = i;
            let mut j = i + 1;
            if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
                j += 1;
            }
            if j < bytes.len() && bytes[j].is_ascii_digit() {
                is_float = true;
                while j < bytes.len() && bytes[j].is_ascii_digit() {
                    j += 1;
                }
                digits.push_str(&text[exp_marker..j]);
                i = j;
            }
        }
    }

    // Suffix: only recognized directly after digits, longest match first.
    let suffix_start = i;
    let mut suffix: Option<String> = None;
    for s in FLOAT_SUFFIXES {
        if text[suffix_start..].starts_with(s) && !is_ident_continue_after(text, suffix_start + s.len()) {
            suffix = Some((*s).to_string());
            is_float = true; // f32/f64 suffix on an int literal yields a float token
            i += s.len();
            break;
        }
    }
    if suffix.is_none() && !is_float {
        for s in INT_SUFFIXES {
            if text[suffix_start..].starts_with(s) && !is_ident_continue_after(text, suffix_start + s.len()) {
                suffix = Some((*s).to_string());
                i += s.len();
                break;
            }
        }
    }
    if suffix.is_none() && is_float {
        // A bare float with no suffix is fine; but reject a dangling integer
        // suffix on a float literal (e.g. `1.5i32` is invalid).
        for s in INT_SUFFIXES {
            if text[suffix_start..].starts_with(s) && !is_ident_continue_after(text, suffix_start + s.len()) {
                return Err(LexError::new(
                    LexErrorKind::InvalidNumberSuffix,
                    format!("integer suffix '{}' is not valid on a float literal", s),
                    Span::new(suffix_start as u32, (suffix_start + s.len()) as u32),
                ));
            }
        }
    }

    let value = if is_float {
        let f: f64 = digits.parse().map_err(|_| {
            LexError::new(
                LexErrorKind::InvalidNumber,
                format!("invalid float literal '{}'", digits),
                Span::new(start as u32, i as u32),
            )
        })?;
        LiteralValue::Float { value: f, suffix }
    } else {
        let radix = match base {
            IntBase::Decimal => 10,
            IntBase::Hex => 16,
            IntBase::Binary => 2,
            IntBase::Octal => 8,
        };
        let v = i128::from_str_radix(&digits, radix).map_err(|_| {
            LexError::new(
                LexErrorKind::InvalidNumber,
                format!("integer literal '{}' is out of range or contains invalid digits", digits),
                Span::new(start as u32, i as u32),
            )
        })?;
        LiteralValue::Int {
            value: v,
            base,
            suffix,
        }
    };

    Ok(ScannedNumber {
        value,
        len: i - start,
    })
}

fn is_ident_continue_after(text: &str, byte: usize) -> bool {
    text[byte..]
        .chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_literal_with_suffix() {
        let n = scan_number("0xFFi32", 0).unwrap();
        assert_eq!(
            n.value,
            LiteralValue::Int {
                value: 255,
                base: IntBase::Hex,
                suffix: Some("i32".to_string())
            }
        );
        assert_eq!(n.len, "0xFFi32".len());
    }

    #[test]
    fn decimal_with_underscores() {
        let n = scan_number("1_000_000", 0).unwrap();
        assert_eq!(
            n.value,
            LiteralValue::Int {
                value: 1_000_000,
                base: IntBase::Decimal,
                suffix: None
            }
        );
    }

    #[test]
    fn float_with_exponent() {
        let n = scan_number("2.5e-3", 0).unwrap();
        match n.value {
            LiteralValue::Float { value, .. } => assert!((value - 2.5e-3).abs() < 1e-12),
            _ => panic!("expected float"),
        }
    }

    #[test]
    fn dot_dot_is_not_a_float() {
        // "1..5" should scan only "1" as an integer; the caller handles `..`.
        let n = scan_number("1..5", 0).unwrap();
        assert_eq!(n.len, 1);
    }

    #[test]
    fn f32_suffix_on_int_yields_float() {
        let n = scan_number("2f32", 0).unwrap();
        assert!(matches!(n.value, LiteralValue::Float { .. }));
    }

    #[test]
    fn binary_literal() {
        let n = scan_number("0b1010", 0).unwrap();
        assert_eq!(
            n.value,
            LiteralValue::Int {
                value: 10,
                base: IntBase::Binary,
                suffix: None
            }
        );
    }

    #[test]
    fn invalid_binary_digit_errors() {
        let err = scan_number("0b", 0).unwrap_err();
        assert_eq!(err.kind.code(), "L010");
    }
}
