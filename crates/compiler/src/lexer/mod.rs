//! Tokenizer: turns a [`Source`] into a stream of [`Token`]s.
//!
//! The lexer never stops at the first error — it records each [`LexError`]
//! and emits an `Error` token in its place so the parser (and any later
//! diagnostics) still see a well-formed token stream. The pass as a whole
//! is still considered to have failed if any errors were recorded; see
//! [`crate::diagnostics::DiagnosticBag::has_errors`].

mod error;
mod number;
mod string;
mod token;

pub use error::{LexError, LexErrorKind};
pub use token::{IntBase, LiteralValue, Token, TokenKind};

use crate::source::{Source, Span};

/// Tracks one level of `"..{ expr }.."` or `` `..${ expr }..` `` nesting:
/// how many ordinary `{`/`}` pairs have been opened *inside* the
/// interpolation expression, and which delimiter resumes literal scanning
/// once the matching `}` is reached.
struct InterpFrame {
    brace_depth: u32,
    kind: InterpKind,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum InterpKind {
    String,
    Template,
}

pub struct Lexer<'a> {
    text: &'a str,
    pos: usize,
    errors: Vec<LexError>,
    interp_stack: Vec<InterpFrame>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a Source) -> Self {
        Lexer {
            text: source.text(),
            pos: 0,
            errors: Vec::new(),
            interp_stack: Vec::new(),
        }
    }

    /// Scan the entire source into a token stream, accumulating lex errors
    /// along the way rather than stopping at the first one.
    pub fn tokenize(mut self) -> (Vec<Token>, Vec<LexError>) {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let is_eof = tok.is_eof();
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        (tokens, self.errors)
    }

    fn bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes().get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn matches(&mut self, expected: u8) -> bool {
        if self.peek_at(0) == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn make_token(&self, kind: TokenKind, start: usize) -> Token {
        let span = Span::new(start as u32, self.pos as u32);
        Token::new(kind, span, &self.text[start..self.pos])
    }

    /// Produce the next token, skipping whitespace (except newlines, which
    /// are significant) and comments first.
    pub fn next_token(&mut self) -> Token {
        // If we're inside an interpolation's braced expression, ordinary
        // tokenization resumes until the matching `}` — handled below by
        // the Newline/LBrace/RBrace cases falling through to normal
        // scanning. Literal resumption is triggered explicitly by the
        // closing-brace branch.
        self.skip_whitespace_and_comments();

        if self.is_at_end() {
            return Token::new(TokenKind::Eof, Span::at(self.pos as u32), "");
        }

        let start = self.pos;
        let c = self.peek().unwrap();

        if c == '\n' {
            self.pos += 1;
            return self.make_token(TokenKind::Newline, start);
        }

        if c.is_ascii_digit() {
            return self.scan_number(start);
        }

        if c == 'r' && self.peek_at(1) == Some(b'"') {
            return self.scan_raw_string(start);
        }

        if is_ident_start(c) {
            return self.scan_identifier(start);
        }

        match c {
            '"' => self.scan_string_start(start),
            '`' => self.scan_template_start(start),
            '\'' => self.scan_char(start),
            '{' => {
                self.pos += 1;
                if let Some(frame) = self.interp_stack.last_mut() {
                    frame.brace_depth += 1;
                }
                self.make_token(TokenKind::LBrace, start)
            }
            '}' => self.scan_close_brace(start),
            _ => self.scan_operator(start),
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') => {
                    self.pos += 1;
                }
                Some('/') if self.peek_at(1) == Some(b'/') => {
                    if self.peek_at(2) == Some(b'/') && self.peek_at(3) != Some(b'/') {
                        // `///` doc comment: stop here, let the caller pick
                        // it up as a token instead of silently discarding
                        // it.
                        return;
                    }
                    if self.peek_at(2) == Some(b'!') {
                        return;
                    }
                    self.skip_line_comment();
                }
                Some('/') if self.peek_at(1) == Some(b'*') => {
                    if let Err(e) = self.skip_block_comment() {
                        self.errors.push(e);
                    }
                }
                _ => return,
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        self.pos += 2; // consume "/*"
        let mut depth = 1u32;
        while depth > 0 {
            if self.is_at_end() {
                return Err(LexError::new(
                    LexErrorKind::UnterminatedBlockComment,
                    "unterminated block comment",
                    Span::new(start as u32, self.pos as u32),
                ));
            }
            if self.peek_at(0) == Some(b'/') && self.peek_at(1) == Some(b'*') {
                self.pos += 2;
                depth += 1;
            } else if self.peek_at(0) == Some(b'*') && self.peek_at(1) == Some(b'/') {
                self.pos += 2;
                depth -= 1;
            } else {
                let c = self.advance().unwrap();
                let _ = c;
            }
        }
        Ok(())
    }

    fn scan_number(&mut self, start: usize) -> Token {
        match number::scan_number(self.text, start) {
            Ok(n) => {
                self.pos = start + n.len;
                let kind = match &n.value {
                    LiteralValue::Int { .. } => TokenKind::IntLiteral,
                    LiteralValue::Float { .. } => TokenKind::FloatLiteral,
                    _ => unreachable!("scan_number only returns Int/Float"),
                };
                self.make_token(kind, start).with_value(n.value)
            }
            Err(e) => {
                self.pos = (e.span.end.byte as usize).max(start + 1);
                self.errors.push(e);
                self.make_token(TokenKind::Error, start)
            }
        }
    }

    fn scan_identifier(&mut self, start: usize) -> Token {
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        let lexeme = &self.text[start..self.pos];
        if let Some(kind) = TokenKind::keyword_from_str(lexeme) {
            let mut tok = self.make_token(kind, start);
            if kind == TokenKind::BoolLiteral {
                tok = tok.with_value(LiteralValue::Bool(lexeme == "true"));
            }
            tok
        } else {
            self.make_token(TokenKind::Identifier, start)
        }
    }

    fn scan_string_start(&mut self, start: usize) -> Token {
        self.pos += 1; // consume opening quote
        self.continue_string_literal(start, TokenKind::StringLiteral, TokenKind::InterpStringStart)
    }

    fn continue_string_literal(
        &mut self,
        start: usize,
        plain_kind: TokenKind,
        interp_start_kind: TokenKind,
    ) -> Token {
        match string::scan_string_content(self.text, self.pos, '"') {
            Ok(scanned) => {
                self.pos += scanned.len;
                if scanned.hit_brace {
                    self.pos += 1; // consume '{'
                    self.interp_stack.push(InterpFrame {
                        brace_depth: 0,
                        kind: InterpKind::String,
                    });
                    self.make_token(interp_start_kind, start)
                        .with_value(LiteralValue::Str(scanned.value))
                } else {
                    self.pos += 1; // consume closing quote
                    self.make_token(plain_kind, start)
                        .with_value(LiteralValue::Str(scanned.value))
                }
            }
            Err(e) => {
                self.pos = e.span.end.byte as usize;
                self.errors.push(e);
                self.make_token(TokenKind::Error, start)
            }
        }
    }

    fn scan_raw_string(&mut self, start: usize) -> Token {
        self.pos += 2; // consume "r\""
        match string::scan_raw_string_content(self.text, self.pos) {
            Ok(scanned) => {
                self.pos += scanned.len;
                self.pos += 1; // consume closing quote
                self.make_token(TokenKind::RawStringLiteral, start)
                    .with_value(LiteralValue::Str(scanned.value))
            }
            Err(e) => {
                self.pos = e.span.end.byte as usize;
                self.errors.push(e);
                self.make_token(TokenKind::Error, start)
            }
        }
    }

    fn scan_template_start(&mut self, start: usize) -> Token {
        self.pos += 1; // consume opening backtick
        self.continue_template_literal(start)
    }

    fn scan_char(&mut self, start: usize) -> Token {
        self.pos += 1; // consume opening quote
        match string::scan_char_content(self.text, self.pos) {
            Ok((value, len)) => {
                self.pos += len;
                self.make_token(TokenKind::CharLiteral, start)
                    .with_value(LiteralValue::Char(value))
            }
            Err(e) => {
                self.pos = e.span.end.byte as usize;
                self.errors.push(e);
                self.make_token(TokenKind::Error, start)
            }
        }
    }

    /// `}` either closes an ordinary brace-delimited block, closes a nested
    /// brace inside an interpolation expression, or — when it's the brace
    /// that matches an interpolation's opening `{`/`${` at depth zero —
    /// resumes literal scanning for the next `Middle`/`End` segment.
    fn scan_close_brace(&mut self, start: usize) -> Token {
        if let Some(frame) = self.interp_stack.last_mut() {
            if frame.brace_depth > 0 {
                frame.brace_depth -= 1;
                self.pos += 1;
                return self.make_token(TokenKind::RBrace, start);
            }
            let kind = frame.kind;
            self.interp_stack.pop();
            self.pos += 1; // consume '}'
            return match kind {
                InterpKind::String => {
                    self.resume_string_segment(start, TokenKind::InterpStringMiddle, TokenKind::InterpStringEnd)
                }
                InterpKind::Template => {
                    self.resume_template_segment(start)
                }
            };
        }
        self.pos += 1;
        self.make_token(TokenKind::RBrace, start)
    }

    fn resume_string_segment(
        &mut self,
        start: usize,
        middle_kind: TokenKind,
        end_kind: TokenKind,
    ) -> Token {
        match string::scan_string_content(self.text, self.pos, '"') {
            Ok(scanned) => {
                self.pos += scanned.len;
                if scanned.hit_brace {
                    self.pos += 1;
                    self.interp_stack.push(InterpFrame {
                        brace_depth: 0,
                        kind: InterpKind::String,
                    });
                    self.make_token(middle_kind, start)
                        .with_value(LiteralValue::Str(scanned.value))
                } else {
                    self.pos += 1;
                    self.make_token(end_kind, start)
                        .with_value(LiteralValue::Str(scanned.value))
                }
            }
            Err(e) => {
                self.pos = e.span.end.byte as usize;
                self.errors.push(e);
                self.make_token(TokenKind::Error, start)
            }
        }
    }

    fn continue_template_literal(&mut self, start: usize) -> Token {
        match string::scan_template_content(self.text, self.pos) {
            Ok(scanned) => {
                self.pos += scanned.len;
                if scanned.hit_brace {
                    self.pos += 2; // consume '${'
                    self.interp_stack.push(InterpFrame {
                        brace_depth: 0,
                        kind: InterpKind::Template,
                    });
                    self.make_token(TokenKind::TemplateLiteralStart, start)
                        .with_value(LiteralValue::Str(scanned.value))
                } else {
                    self.pos += 1; // consume closing backtick
                    self.make_token(TokenKind::TemplateLiteralStart, start)
                        .with_value(LiteralValue::Str(scanned.value))
                }
            }
            Err(e) => {
                self.pos = e.span.end.byte as usize;
                self.errors.push(e);
                self.make_token(TokenKind::Error, start)
            }
        }
    }

    fn resume_template_segment(&mut self, start: usize) -> Token {
        match string::scan_template_content(self.text, self.pos) {
            Ok(scanned) => {
                self.pos += scanned.len;
                if scanned.hit_brace {
                    self.pos += 2;
                    self.interp_stack.push(InterpFrame {
                        brace_depth: 0,
                        kind: InterpKind::Template,
                    });
                    self.make_token(TokenKind::TemplateLiteralMiddle, start)
                        .with_value(LiteralValue::Str(scanned.value))
                } else {
                    self.pos += 1;
                    self.make_token(TokenKind::TemplateLiteralEnd, start)
                        .with_value(LiteralValue::Str(scanned.value))
                }
            }
            Err(e) => {
                self.pos = e.span.end.byte as usize;
                self.errors.push(e);
                self.make_token(TokenKind::Error, start)
            }
        }
    }

    fn scan_operator(&mut self, start: usize) -> Token {
        use TokenKind::*;
        let c = self.advance().unwrap();
        let kind = match c {
            '+' => {
                if self.matches(b'+') {
                    PlusPlus
                } else if self.matches(b'=') {
                    PlusAssign
                } else {
                    Plus
                }
            }
            '-' => {
                if self.matches(b'-') {
                    MinusMinus
                } else if self.matches(b'=') {
                    MinusAssign
                } else if self.matches(b'>') {
                    Arrow
                } else {
                    Minus
                }
            }
            '*' => {
                if self.matches(b'*') {
                    StarStar
                } else if self.matches(b'=') {
                    StarAssign
                } else {
                    Star
                }
            }
            '/' => {
                if self.matches(b'=') {
                    SlashAssign
                } else {
                    Slash
                }
            }
            '%' => {
                if self.matches(b'=') {
                    PercentAssign
                } else {
                    Percent
                }
            }
            '=' => {
                if self.matches(b'=') {
                    EqEq
                } else if self.matches(b'>') {
                    FatArrow
                } else {
                    Assign
                }
            }
            '!' => {
                if self.matches(b'=') {
                    Ne
                } else {
                    Bang
                }
            }
            '<' => {
                if self.matches(b'=') {
                    Le
                } else if self.matches(b'<') {
                    if self.matches(b'=') {
                        ShlAssign
                    } else {
                        Shl
                    }
                } else {
                    Lt
                }
            }
            '>' => {
                if self.matches(b'=') {
                    Ge
                } else if self.matches(b'>') {
                    if self.matches(b'=') {
                        ShrAssign
                    } else {
                        Shr
                    }
                } else {
                    Gt
                }
            }
            '&' => {
                if self.matches(b'&') {
                    AndAnd
                } else if self.matches(b'=') {
                    BitAndAssign
                } else {
                    BitAnd
                }
            }
            '|' => {
                if self.matches(b'|') {
                    OrOr
                } else if self.matches(b'=') {
                    BitOrAssign
                } else {
                    Pipe
                }
            }
            '^' => {
                if self.matches(b'=') {
                    BitXorAssign
                } else {
                    BitXor
                }
            }
            '~' => BitNot,
            '.' => {
                if self.matches(b'.') {
                    if self.matches(b'=') {
                        DotDotEq
                    } else {
                        DotDot
                    }
                } else {
                    Dot
                }
            }
            ':' => {
                if self.matches(b':') {
                    ColonColon
                } else {
                    Colon
                }
            }
            '?' => Question,
            '@' => At,
            '$' => {
                if self.matches(b'{') {
                    DollarBrace
                } else {
                    Dollar
                }
            }
            '(' => LParen,
            ')' => RParen,
            '[' => LBracket,
            ']' => RBracket,
            ',' => Comma,
            ';' => Semi,
            other => {
                let e = LexError::new(
                    LexErrorKind::UnexpectedChar,
                    format!("unexpected character '{}'", other),
                    Span::new(start as u32, self.pos as u32),
                );
                self.errors.push(e);
                Error
            }
        };
        self.make_token(kind, start)
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// Convenience entry point: tokenize `source` end to end.
pub fn tokenize(source: &Source) -> (Vec<Token>, Vec<LexError>) {
    Lexer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let source = Source::new("t.tml", src.to_string());
        let (tokens, errors) = tokenize(&source);
        assert!(errors.is_empty(), "unexpected lex errors: {:?}", errors.iter().map(|e| &e.message).collect::<Vec<_>>());
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn simple_let_binding() {
        assert_eq!(
            kinds("let x = 42"),
            vec![
                TokenKind::KwLet,
                TokenKind::Identifier,
                TokenKind::Assign,
                TokenKind::IntLiteral,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn hex_literal_with_suffix() {
        let source = Source::new("t.tml", "0xFFu8".to_string());
        let (tokens, errors) = tokenize(&source);
        assert!(errors.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::IntLiteral);
        match &tokens[0].value {
            LiteralValue::Int { value, base, suffix } => {
                assert_eq!(*value, 255);
                assert_eq!(*base, IntBase::Hex);
                assert_eq!(suffix.as_deref(), Some("u8"));
            }
            other => panic!("expected Int literal, got {:?}", other),
        }
    }

    #[test]
    fn interpolated_string_splits_into_three_tokens() {
        let kinds = kinds(r#""total: {amount}!""#);
        assert_eq!(
            kinds,
            vec![
                TokenKind::InterpStringStart,
                TokenKind::Identifier,
                TokenKind::InterpStringEnd,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn interpolation_with_nested_braces_in_expr() {
        // `{ {1, 2}.len() }` — an inner brace-delimited block expression
        // nested inside the interpolation slot must not be mistaken for the
        // closing brace of the interpolation itself.
        let kinds = kinds(r#""n={ {1}.len() }""#);
        assert!(kinds.contains(&TokenKind::InterpStringStart));
        assert!(kinds.contains(&TokenKind::InterpStringEnd));
        // Exactly one LBrace/RBrace pair from the nested block survives as
        // ordinary delimiters (not interpolation boundaries).
        assert_eq!(kinds.iter().filter(|k| **k == TokenKind::LBrace).count(), 1);
        assert_eq!(kinds.iter().filter(|k| **k == TokenKind::RBrace).count(), 1);
    }

    #[test]
    fn double_equals_is_not_two_assigns() {
        assert_eq!(
            kinds("a == b"),
            vec![
                TokenKind::Identifier,
                TokenKind::EqEq,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn range_operators() {
        assert_eq!(
            kinds("0..5"),
            vec![
                TokenKind::IntLiteral,
                TokenKind::DotDot,
                TokenKind::IntLiteral,
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds("0..=5"),
            vec![
                TokenKind::IntLiteral,
                TokenKind::DotDotEq,
                TokenKind::IntLiteral,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keywords_recognized() {
        assert_eq!(
            kinds("class Foo extends Bar"),
            vec![
                TokenKind::KwClass,
                TokenKind::Identifier,
                TokenKind::KwExtends,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_string_reports_l002() {
        let source = Source::new("t.tml", "\"abc".to_string());
        let (_tokens, errors) = tokenize(&source);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind.code(), "L002");
    }
}
