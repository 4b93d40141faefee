//! Pattern grammar: `let`/`var` targets, `when` arms, closure parameters,
//! `for` loop targets.

use super::error::{ParseError, ParseErrorKind};
use super::Parser;
use crate::ast::exprs::LiteralPattern;
use crate::ast::patterns::{Pattern, PatternKind, RestBinding};
use crate::lexer::{IntBase, LiteralValue, TokenKind};
use crate::source::Span;

impl Parser {
    /// Full pattern grammar, including top-level `|` alternation (valid in
    /// `when` arms and `let-else` targets, not inside nested positions).
    pub(super) fn parse_pattern(&mut self) -> Result<Pattern, ParseError> {
        let start = self.peek().span;
        let first = self.parse_pattern_range()?;
        if self.check(TokenKind::Pipe) {
            let mut alts = vec![first];
            while self.match_kind(TokenKind::Pipe) {
                alts.push(self.parse_pattern_range()?);
            }
            let end = self.prev_span();
            return Ok(Pattern::new(PatternKind::Or(alts), start.to(end)));
        }
        Ok(first)
    }

    /// A pattern allowing `to`/`through` ranges but not top-level `|`;
    /// used inside tuples, arrays, struct fields and variant payloads
    /// where `|` would be ambiguous with a following element.
    fn parse_pattern_range(&mut self) -> Result<Pattern, ParseError> {
        let start = self.peek().span;
        let lo = self.parse_pattern_primary()?;
        if self.check(TokenKind::KwTo) || self.check(TokenKind::KwThrough) {
            let inclusive = self.check(TokenKind::KwThrough);
            self.advance();
            let hi = self.parse_pattern_primary()?;
            let end = self.prev_span();
            return Ok(Pattern::new(
                PatternKind::Range {
                    lo: Box::new(lo),
                    hi: Box::new(hi),
                    inclusive,
                },
                start.to(end),
            ));
        }
        Ok(lo)
    }

    fn parse_pattern_primary(&mut self) -> Result<Pattern, ParseError> {
        let start = self.peek().span;
        match self.peek().kind {
            TokenKind::Identifier if self.peek().lexeme == "_" => {
                self.advance();
                Ok(Pattern::new(PatternKind::Wildcard, start))
            }
            TokenKind::KwMut => {
                self.advance();
                let name = self.expect_ident()?;
                let sub_pattern = if self.match_kind(TokenKind::At) {
                    Some(Box::new(self.parse_pattern_primary()?))
                } else {
                    None
                };
                let end = self.prev_span();
                Ok(Pattern::new(
                    PatternKind::Ident {
                        name,
                        mutable: true,
                        sub_pattern,
                    },
                    start.to(end),
                ))
            }
            TokenKind::Identifier => self.parse_ident_or_path_pattern(),
            TokenKind::Minus => {
                self.advance();
                self.parse_numeric_literal_pattern(start, true)
            }
            TokenKind::IntLiteral | TokenKind::FloatLiteral => {
                self.parse_numeric_literal_pattern(start, false)
            }
            TokenKind::StringLiteral | TokenKind::RawStringLiteral => {
                let tok = self.advance();
                let text = match tok.value {
                    LiteralValue::Str(s) => s,
                    _ => tok.lexeme,
                };
                Ok(Pattern::new(
                    PatternKind::Literal(LiteralPattern::Str(text)),
                    start,
                ))
            }
            TokenKind::CharLiteral => {
                let tok = self.advance();
                let c = match tok.value {
                    LiteralValue::Char(c) => c,
                    _ => '\0',
                };
                Ok(Pattern::new(PatternKind::Literal(LiteralPattern::Char(c)), start))
            }
            TokenKind::BoolLiteral => {
                let tok = self.advance();
                let b = matches!(tok.value, LiteralValue::Bool(true)) || tok.lexeme == "true";
                Ok(Pattern::new(PatternKind::Literal(LiteralPattern::Bool(b)), start))
            }
            TokenKind::NullLiteral => {
                self.advance();
                Ok(Pattern::new(PatternKind::Literal(LiteralPattern::Null), start))
            }
            TokenKind::LParen => {
                self.advance();
                let mut elements = Vec::new();
                if !self.check(TokenKind::RParen) {
                    loop {
                        elements.push(self.parse_pattern_range()?);
                        if !self.match_kind(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RParen, "')'")?;
                let end = self.prev_span();
                Ok(Pattern::new(PatternKind::Tuple(elements), start.to(end)))
            }
            TokenKind::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                let mut rest = None;
                if !self.check(TokenKind::RBracket) {
                    loop {
                        if self.match_kind(TokenKind::DotDot) {
                            let name = if self.check(TokenKind::Identifier) {
                                Some(self.advance().lexeme)
                            } else {
                                None
                            };
                            rest = Some(RestBinding { name });
                            break;
                        }
                        elements.push(self.parse_pattern_range()?);
                        if !self.match_kind(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RBracket, "']'")?;
                let end = self.prev_span();
                Ok(Pattern::new(PatternKind::Array { elements, rest }, start.to(end)))
            }
            _ => {
                let tok = self.peek().clone();
                Err(ParseError::new(
                    ParseErrorKind::ExpectedPattern,
                    format!("expected a pattern, found '{}'", tok.lexeme),
                    tok.span,
                ))
            }
        }
    }

    fn parse_numeric_literal_pattern(
        &mut self,
        start: Span,
        negate: bool,
    ) -> Result<Pattern, ParseError> {
        let tok = self.advance();
        let lit = match tok.value {
            LiteralValue::Int { value, base, suffix } => LiteralPattern::Int {
                value: if negate { -value } else { value },
                base,
                suffix,
            },
            LiteralValue::Float { value, suffix } => LiteralPattern::Float {
                value: if negate { -value } else { value },
                suffix,
            },
            _ => LiteralPattern::Int {
                value: 0,
                base: IntBase::Decimal,
                suffix: None,
            },
        };
        let end = self.prev_span();
        Ok(Pattern::new(PatternKind::Literal(lit), start.to(end)))
    }

    /// An identifier in pattern position is a type/variant path when it
    /// starts with an uppercase letter or is immediately followed by
    /// `::`; otherwise it is a plain binding, optionally with an `@`
    /// sub-pattern.
    fn parse_ident_or_path_pattern(&mut self) -> Result<Pattern, ParseError> {
        let start = self.peek().span;
        let name = self.advance().lexeme;
        if self.check(TokenKind::ColonColon) {
            let mut segments = vec![name];
            while self.match_kind(TokenKind::ColonColon) {
                segments.push(self.expect_ident()?);
            }
            return self.parse_path_pattern_tail(segments, start);
        }
        let starts_upper = name.chars().next().map(|c| c.is_uppercase()).unwrap_or(false);
        if starts_upper {
            if self.check(TokenKind::LBrace) || self.check(TokenKind::LParen) {
                return self.parse_path_pattern_tail(vec![name], start);
            }
            let end = self.prev_span();
            return Ok(Pattern::new(
                PatternKind::EnumVariant {
                    path: Vec::new(),
                    variant: name,
                    payload: Vec::new(),
                },
                start.to(end),
            ));
        }
        let sub_pattern = if self.match_kind(TokenKind::At) {
            Some(Box::new(self.parse_pattern_primary()?))
        } else {
            None
        };
        let end = self.prev_span();
        Ok(Pattern::new(
            PatternKind::Ident {
                name,
                mutable: false,
                sub_pattern,
            },
            start.to(end),
        ))
    }

    fn parse_path_pattern_tail(
        &mut self,
        segments: Vec<String>,
        start: Span,
    ) -> Result<Pattern, ParseError> {
        if self.check(TokenKind::LBrace) {
            return self.parse_struct_pattern_tail(segments, start);
        }
        let mut segments = segments;
        let variant = segments.pop().expect("at least one path segment");
        let mut payload = Vec::new();
        if self.match_kind(TokenKind::LParen) {
            if !self.check(TokenKind::RParen) {
                loop {
                    payload.push(self.parse_pattern_range()?);
                    if !self.match_kind(TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RParen, "')'")?;
        }
        let end = self.prev_span();
        Ok(Pattern::new(
            PatternKind::EnumVariant {
                path: segments,
                variant,
                payload,
            },
            start.to(end),
        ))
    }

    fn parse_struct_pattern_tail(
        &mut self,
        path: Vec<String>,
        start: Span,
    ) -> Result<Pattern, ParseError> {
        self.expect(TokenKind::LBrace, "'{'")?;
        self.skip_newlines();
        let mut fields = Vec::new();
        let mut has_rest = false;
        if !self.check(TokenKind::RBrace) {
            loop {
                if self.match_kind(TokenKind::DotDot) {
                    has_rest = true;
                    break;
                }
                let fname = self.expect_ident()?;
                let pat = if self.match_kind(TokenKind::Colon) {
                    self.parse_pattern_range()?
                } else {
                    let span = self.prev_span();
                    Pattern::new(
                        PatternKind::Ident {
                            name: fname.clone(),
                            mutable: false,
                            sub_pattern: None,
                        },
                        span,
                    )
                };
                fields.push((fname, pat));
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
                self.skip_newlines();
            }
        }
        self.skip_newlines();
        self.expect(TokenKind::RBrace, "'}'")?;
        let end = self.prev_span();
        Ok(Pattern::new(
            PatternKind::Struct {
                path,
                fields,
                has_rest,
            },
            start.to(end),
        ))
    }
}
