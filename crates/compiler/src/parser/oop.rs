//! Class and interface grammar (the C#-style OOP overlay).
//!
//! `class Name[Generics] extends Base implements I1, I2 { .. }` bodies mix
//! fields, methods, properties, and at most one constructor, each with its
//! own per-member visibility and modifier. `interface Name extends I1 { .. }`
//! bodies are method signatures with optional default bodies.

use super::error::{ParseError, ParseErrorKind};
use super::Parser;
use crate::ast::decls::{Decorator, FuncParam, Visibility};
use crate::ast::oop::{
    ClassConstructor, ClassDecl, ClassField, ClassMethod, ClassProperty, InterfaceDecl,
    InterfaceMethod, MemberModifier,
};
use crate::lexer::TokenKind;

impl Parser {
    pub(super) fn parse_class_decl(
        &mut self,
        visibility: Visibility,
        decorators: Vec<Decorator>,
    ) -> Result<ClassDecl, ParseError> {
        let start = self.peek().span;
        let mut is_abstract = self.class_had_abstract_modifier();
        let mut is_sealed = self.class_had_sealed_modifier();
        self.expect(TokenKind::KwClass, "'class'")?;
        is_abstract = is_abstract || self.class_had_abstract_modifier();
        is_sealed = is_sealed || self.class_had_sealed_modifier();
        let name = self.expect_ident()?;
        let (generics, const_generics) = self.parse_generics()?;

        let extends = if self.match_kind(TokenKind::KwExtends) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let mut implements = Vec::new();
        if self.match_kind(TokenKind::KwImplements) {
            loop {
                implements.push(self.parse_type()?);
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect(TokenKind::LBrace, "'{'")?;
        self.skip_newlines();

        let mut fields = Vec::new();
        let mut methods = Vec::new();
        let mut properties = Vec::new();
        let mut constructor = None;

        while !self.check(TokenKind::RBrace) {
            let member_decorators = self.parse_decorators()?;
            let m_start = self.peek().span;
            let member_visibility = self.parse_visibility();
            let modifier = self.parse_member_modifier();

            if self.check(TokenKind::KwNew) {
                let ctor = self.parse_class_constructor(member_visibility, m_start)?;
                if constructor.is_some() {
                    return Err(ParseError::new(
                        ParseErrorKind::InvalidPatternInContext("class"),
                        "a class may declare at most one constructor",
                        ctor.span,
                    ));
                }
                constructor = Some(ctor);
            } else if self.check(TokenKind::KwProp) {
                properties.push(self.parse_class_property(
                    member_visibility,
                    modifier,
                    m_start,
                )?);
            } else if self.check(TokenKind::KwFunc) {
                methods.push(self.parse_class_method(
                    member_visibility,
                    modifier,
                    member_decorators,
                    m_start,
                )?);
            } else {
                fields.push(self.parse_class_field(member_visibility, modifier, m_start)?);
            }
            self.skip_newlines();
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        let end = self.prev_span();
        Ok(ClassDecl {
            name,
            generics,
            const_generics,
            extends,
            implements,
            fields,
            methods,
            properties,
            constructor,
            is_abstract,
            is_sealed,
            visibility,
            decorators,
            span: start.to(end),
        })
    }

    fn class_had_abstract_modifier(&mut self) -> bool {
        self.match_kind(TokenKind::KwAbstract)
    }

    fn class_had_sealed_modifier(&mut self) -> bool {
        self.match_kind(TokenKind::KwSealed)
    }

    /// Parses a member's leading `virtual`/`override`/`abstract`/`sealed`/
    /// `static` modifier, if present; plain members get [`MemberModifier::None`].
    fn parse_member_modifier(&mut self) -> MemberModifier {
        if self.match_kind(TokenKind::KwVirtual) {
            MemberModifier::Virtual
        } else if self.match_kind(TokenKind::KwOverride) {
            MemberModifier::Override
        } else if self.match_kind(TokenKind::KwAbstract) {
            MemberModifier::Abstract
        } else if self.match_kind(TokenKind::KwSealed) {
            MemberModifier::Sealed
        } else if self.match_kind(TokenKind::KwStatic) {
            MemberModifier::Static
        } else {
            MemberModifier::None
        }
    }

    fn parse_class_field(
        &mut self,
        visibility: Visibility,
        modifier: MemberModifier,
        start: crate::source::Span,
    ) -> Result<ClassField, ParseError> {
        let name = self.expect_ident()?;
        self.expect(TokenKind::Colon, "':'")?;
        let ty = self.parse_type()?;
        let default = if self.match_kind(TokenKind::Assign) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        let end = self.prev_span();
        Ok(ClassField {
            name,
            ty,
            visibility,
            modifier,
            default,
            span: start.to(end),
        })
    }

    fn parse_class_method(
        &mut self,
        visibility: Visibility,
        modifier: MemberModifier,
        decorators: Vec<Decorator>,
        start: crate::source::Span,
    ) -> Result<ClassMethod, ParseError> {
        let sig = self.parse_func_signature()?;
        self.skip_newlines();
        let body = if self.check(TokenKind::LBrace) {
            Some(self.parse_block_expr()?)
        } else {
            None
        };
        let end = self.prev_span();
        Ok(ClassMethod {
            sig,
            body,
            visibility,
            modifier,
            decorators,
            span: start.to(end),
        })
    }

    /// `prop name: Type { get expr [set(param) expr] }`. `get`/`set` are
    /// contextual keywords recognized by lexeme inside a property body, not
    /// reserved words, since they only mean something here.
    fn parse_class_property(
        &mut self,
        visibility: Visibility,
        modifier: MemberModifier,
        start: crate::source::Span,
    ) -> Result<ClassProperty, ParseError> {
        self.expect(TokenKind::KwProp, "'prop'")?;
        let name = self.expect_ident()?;
        self.expect(TokenKind::Colon, "':'")?;
        let ty = self.parse_type()?;
        self.expect(TokenKind::LBrace, "'{'")?;
        self.skip_newlines();
        let mut getter = None;
        let mut setter = None;
        while !self.check(TokenKind::RBrace) {
            if self.check_contextual_ident("get") {
                self.advance();
                getter = Some(self.parse_property_accessor_body()?);
            } else if self.check_contextual_ident("set") {
                self.advance();
                self.expect(TokenKind::LParen, "'('")?;
                let param = self.expect_ident()?;
                self.expect(TokenKind::RParen, "')'")?;
                let body = self.parse_property_accessor_body()?;
                setter = Some((param, body));
            } else {
                let tok = self.peek().clone();
                return Err(ParseError::new(
                    ParseErrorKind::ExpectedToken("'get' or 'set'"),
                    format!("expected 'get' or 'set', found '{}'", tok.lexeme),
                    tok.span,
                ));
            }
            self.skip_newlines();
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        let end = self.prev_span();
        Ok(ClassProperty {
            name,
            ty,
            getter,
            setter,
            visibility,
            modifier,
            span: start.to(end),
        })
    }

    /// An accessor body is either a block or a single tail expression
    /// terminated by a newline/`}`.
    fn parse_property_accessor_body(&mut self) -> Result<crate::ast::exprs::Expr, ParseError> {
        if self.check(TokenKind::LBrace) {
            self.parse_block_expr()
        } else {
            self.parse_expr()
        }
    }

    fn check_contextual_ident(&self, lexeme: &str) -> bool {
        self.check(TokenKind::Identifier) && self.peek().lexeme == lexeme
    }

    /// `new(params) [: base(args)] { body }`.
    fn parse_class_constructor(
        &mut self,
        visibility: Visibility,
        start: crate::source::Span,
    ) -> Result<ClassConstructor, ParseError> {
        self.expect(TokenKind::KwNew, "'new'")?;
        self.expect(TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let p_start = self.peek().span;
                let pname = self.expect_ident()?;
                self.expect(TokenKind::Colon, "':'")?;
                let ty = self.parse_type()?;
                let p_end = self.prev_span();
                params.push(FuncParam {
                    name: pname,
                    ty,
                    span: p_start.to(p_end),
                });
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        let mut base_args = Vec::new();
        if self.match_kind(TokenKind::Colon) {
            self.expect(TokenKind::KwBase, "'base'")?;
            self.expect(TokenKind::LParen, "'('")?;
            if !self.check(TokenKind::RParen) {
                loop {
                    base_args.push(self.parse_expr()?);
                    if !self.match_kind(TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RParen, "')'")?;
        }
        self.skip_newlines();
        let body = self.parse_block_expr()?;
        let end = self.prev_span();
        Ok(ClassConstructor {
            params,
            base_args,
            body,
            visibility,
            span: start.to(end),
        })
    }

    pub(super) fn parse_interface_decl(
        &mut self,
        visibility: Visibility,
    ) -> Result<InterfaceDecl, ParseError> {
        let start = self.peek().span;
        self.expect(TokenKind::KwInterface, "'interface'")?;
        let name = self.expect_ident()?;
        let (generics, _) = self.parse_generics()?;
        let mut extends = Vec::new();
        if self.match_kind(TokenKind::KwExtends) {
            loop {
                extends.push(self.parse_type()?);
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::LBrace, "'{'")?;
        self.skip_newlines();
        let mut methods = Vec::new();
        while !self.check(TokenKind::RBrace) {
            let m_start = self.peek().span;
            let sig = self.parse_func_signature()?;
            self.skip_newlines();
            let default_body = if self.check(TokenKind::LBrace) {
                Some(self.parse_block_expr()?)
            } else {
                None
            };
            let m_end = self.prev_span();
            methods.push(InterfaceMethod {
                sig,
                default_body,
                span: m_start.to(m_end),
            });
            self.skip_newlines();
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        let end = self.prev_span();
        Ok(InterfaceDecl {
            name,
            generics,
            extends,
            methods,
            visibility,
            span: start.to(end),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::decls::{DeclKind, ModuleAst};
    use crate::lexer::tokenize;
    use crate::source::Source;

    fn parse(src: &str) -> (ModuleAst, Vec<ParseError>) {
        let source = Source::new("t.tml", src.to_string());
        let (tokens, lex_errors) = tokenize(&source);
        assert!(lex_errors.is_empty(), "unexpected lex errors");
        Parser::new(tokens).parse_module()
    }

    #[test]
    fn parses_class_with_field_method_and_constructor() {
        let (module, errors) = parse(
            "class Counter {\n\
             private count: I32\n\
             new(start: I32) {\n\
             count = start\n\
             }\n\
             func increment() -> Unit {\n\
             count = count + 1\n\
             }\n\
             }",
        );
        assert!(errors.is_empty(), "{:?}", errors);
        match &module.decls[0].kind {
            DeclKind::Class(c) => {
                assert_eq!(c.name, "Counter");
                assert_eq!(c.fields.len(), 1);
                assert_eq!(c.methods.len(), 1);
                assert!(c.constructor.is_some());
            }
            other => panic!("expected class, got {:?}", other),
        }
    }

    #[test]
    fn parses_class_with_extends_and_implements() {
        let (module, errors) = parse("class Square extends Shape implements Drawable {\n}");
        assert!(errors.is_empty(), "{:?}", errors);
        match &module.decls[0].kind {
            DeclKind::Class(c) => {
                assert!(c.extends.is_some());
                assert_eq!(c.implements.len(), 1);
            }
            other => panic!("expected class, got {:?}", other),
        }
    }

    #[test]
    fn parses_class_property_with_getter_and_setter() {
        let (module, errors) = parse(
            "class Box {\n\
             prop value: I32 {\n\
             get value\n\
             set(v) value = v\n\
             }\n\
             }",
        );
        assert!(errors.is_empty(), "{:?}", errors);
        match &module.decls[0].kind {
            DeclKind::Class(c) => {
                assert_eq!(c.properties.len(), 1);
                assert!(c.properties[0].getter.is_some());
                assert!(c.properties[0].setter.is_some());
            }
            other => panic!("expected class, got {:?}", other),
        }
    }

    #[test]
    fn parses_abstract_class_with_virtual_method() {
        let (module, errors) = parse("abstract class Shape {\nvirtual func area() -> F64\n}");
        assert!(errors.is_empty(), "{:?}", errors);
        match &module.decls[0].kind {
            DeclKind::Class(c) => {
                assert!(c.is_abstract);
                assert_eq!(c.methods.len(), 1);
                assert!(c.methods[0].body.is_none());
            }
            other => panic!("expected class, got {:?}", other),
        }
    }

    #[test]
    fn parses_interface_with_default_method() {
        let (module, errors) = parse(
            "interface Greeter {\n\
             func greet() -> Str { \"hi\" }\n\
             }",
        );
        assert!(errors.is_empty(), "{:?}", errors);
        match &module.decls[0].kind {
            DeclKind::Interface(i) => {
                assert_eq!(i.name, "Greeter");
                assert_eq!(i.methods.len(), 1);
                assert!(i.methods[0].default_body.is_some());
            }
            other => panic!("expected interface, got {:?}", other),
        }
    }
}
