//! Type annotation grammar.

use super::error::{ParseError, ParseErrorKind};
use super::Parser;
use crate::ast::types::{TypeKind, TypeNode};
use crate::lexer::TokenKind;

impl Parser {
    pub(super) fn parse_type(&mut self) -> Result<TypeNode, ParseError> {
        let start = self.peek().span;
        let kind = match self.peek().kind {
            TokenKind::Identifier if self.peek().lexeme == "_" => {
                self.advance();
                TypeKind::Infer
            }
            TokenKind::KwRef => {
                self.advance();
                let mutable = self.match_kind(TokenKind::KwMut);
                let lifetime = if self.match_kind(TokenKind::LBracket) {
                    let name = self.expect_ident()?;
                    self.expect(TokenKind::RBracket, "']'")?;
                    Some(name)
                } else {
                    None
                };
                let inner = Box::new(self.parse_type()?);
                TypeKind::Reference {
                    mutable,
                    lifetime,
                    inner,
                }
            }
            TokenKind::KwMut if self.peek_at(1).kind == TokenKind::KwRef => {
                self.advance(); // `mut`
                self.advance(); // `ref`
                let lifetime = if self.match_kind(TokenKind::LBracket) {
                    let name = self.expect_ident()?;
                    self.expect(TokenKind::RBracket, "']'")?;
                    Some(name)
                } else {
                    None
                };
                let inner = Box::new(self.parse_type()?);
                TypeKind::Reference {
                    mutable: true,
                    lifetime,
                    inner,
                }
            }
            TokenKind::Star => {
                self.advance();
                let mutable = self.match_kind(TokenKind::KwMut);
                let inner = Box::new(self.parse_type()?);
                TypeKind::Pointer { mutable, inner }
            }
            TokenKind::LBracket => {
                self.advance();
                let element = Box::new(self.parse_type()?);
                if self.match_kind(TokenKind::Semi) {
                    let size = Box::new(self.parse_expr()?);
                    self.expect(TokenKind::RBracket, "']'")?;
                    TypeKind::FixedArray { element, size }
                } else {
                    self.expect(TokenKind::RBracket, "']'")?;
                    TypeKind::Slice { element }
                }
            }
            TokenKind::LParen => {
                self.advance();
                let mut elements = Vec::new();
                if !self.check(TokenKind::RParen) {
                    loop {
                        elements.push(self.parse_type()?);
                        if !self.match_kind(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RParen, "')'")?;
                TypeKind::Tuple { elements }
            }
            TokenKind::KwFunc => {
                self.advance();
                self.expect(TokenKind::LParen, "'('")?;
                let mut params = Vec::new();
                if !self.check(TokenKind::RParen) {
                    loop {
                        params.push(self.parse_type()?);
                        if !self.match_kind(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RParen, "')'")?;
                let ret = if self.match_kind(TokenKind::Arrow) {
                    Box::new(self.parse_type()?)
                } else {
                    Box::new(TypeNode::new(TypeKind::Tuple { elements: vec![] }, self.peek().span))
                };
                TypeKind::FuncSig { params, ret }
            }
            TokenKind::KwDyn => {
                self.advance();
                let (path, generics) = self.parse_path_with_generics()?;
                let mutable = self.match_kind(TokenKind::KwMut);
                TypeKind::DynBehavior {
                    path,
                    generics,
                    mutable,
                }
            }
            TokenKind::KwImpl => {
                self.advance();
                let (path, generics) = self.parse_path_with_generics()?;
                TypeKind::ImplBehavior { path, generics }
            }
            TokenKind::Identifier | TokenKind::KwThisType | TokenKind::KwCrate | TokenKind::KwSuper => {
                let (path, generics) = self.parse_path_with_generics()?;
                let const_args = Vec::new();
                TypeKind::Named {
                    path,
                    generics,
                    const_args,
                }
            }
            _ => {
                let tok = self.peek().clone();
                return Err(ParseError::new(
                    ParseErrorKind::ExpectedType,
                    format!("expected a type, found '{}'", tok.lexeme),
                    tok.span,
                ));
            }
        };
        let end = self.prev_span();
        Ok(TypeNode::new(kind, start.to(end)))
    }

    fn parse_path_with_generics(&mut self) -> Result<(Vec<String>, Vec<TypeNode>), ParseError> {
        let mut path = Vec::new();
        loop {
            path.push(self.expect_path_segment()?);
            if self.match_kind(TokenKind::ColonColon) {
                continue;
            }
            break;
        }
        let mut generics = Vec::new();
        if self.match_kind(TokenKind::LBracket) {
            if !self.check(TokenKind::RBracket) {
                loop {
                    generics.push(self.parse_type()?);
                    if !self.match_kind(TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RBracket, "']'")?;
        }
        Ok((path, generics))
    }

    fn expect_path_segment(&mut self) -> Result<String, ParseError> {
        match self.peek().kind {
            TokenKind::Identifier | TokenKind::KwThisType | TokenKind::KwCrate | TokenKind::KwSuper => {
                Ok(self.advance().lexeme)
            }
            _ => {
                let tok = self.peek().clone();
                Err(ParseError::new(
                    ParseErrorKind::ExpectedToken("type path segment"),
                    format!("expected a type name, found '{}'", tok.lexeme),
                    tok.span,
                ))
            }
        }
    }
}
