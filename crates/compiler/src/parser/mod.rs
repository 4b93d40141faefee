//! Recursive-descent parser with Pratt-style expression precedence.
//!
//! Produces a [`ModuleAst`]: an ordered list of top-level declarations plus
//! module-level doc comments. Errors are accumulated and the parser
//! resynchronizes at declaration and statement boundaries so one source
//! file can report many errors in a single pass.

mod error;
mod expr;
mod oop;
mod pattern;
mod ty;

pub use error::{ParseError, ParseErrorKind};

use crate::ast::decls::*;
use crate::ast::*;
use crate::lexer::{Token, TokenKind};
use crate::source::Span;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<ParseError>,
    /// Disallows bare `Name { .. }` struct-literal syntax while parsing the
    /// condition of `if`/`while`/`for`/`when`, so `if x { .. }` parses `x`
    /// as the condition and `{ .. }` as the block rather than attempting a
    /// struct literal.
    no_struct_literal: u32,
}

/// Strip `Newline` tokens that occur while nested inside `(...)`/`[...]`,
/// where they are not statement separators. Braces do not suppress
/// newlines: block bodies still use them to separate statements.
fn preprocess_newlines(tokens: Vec<Token>) -> Vec<Token> {
    let mut depth: i32 = 0;
    tokens
        .into_iter()
        .filter(|t| match t.kind {
            TokenKind::LParen | TokenKind::LBracket => {
                depth += 1;
                true
            }
            TokenKind::RParen | TokenKind::RBracket => {
                depth -= 1;
                true
            }
            TokenKind::Newline => depth <= 0,
            _ => true,
        })
        .collect()
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens: preprocess_newlines(tokens),
            pos: 0,
            errors: Vec::new(),
            no_struct_literal: 0,
        }
    }

    pub fn parse_module(mut self) -> (ModuleAst, Vec<ParseError>) {
        let mut module = ModuleAst::default();
        self.skip_newlines();
        while !self.is_at_end() {
            if self.check(TokenKind::ModuleDocComment) {
                let tok = self.advance();
                module.module_doc.push(tok.lexeme);
                self.skip_newlines();
                continue;
            }
            match self.parse_decl() {
                Ok(decl) => module.decls.push(decl),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize_to_decl();
                }
            }
            self.skip_newlines();
        }
        (module, self.errors)
    }

    // -- token stream helpers -------------------------------------------

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let i = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[i]
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &'static str) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let tok = self.peek().clone();
            Err(ParseError::new(
                ParseErrorKind::ExpectedToken(what),
                format!("expected {}, found '{}'", what, tok.lexeme),
                tok.span,
            ))
        }
    }

    /// Span of the most recently consumed token; used to close out a span
    /// that started before a `self.peek()` of the token after the node.
    fn prev_span(&self) -> Span {
        self.tokens[self.pos.saturating_sub(1)].span
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        if self.check(TokenKind::Identifier) {
            Ok(self.advance().lexeme)
        } else {
            let tok = self.peek().clone();
            Err(ParseError::new(
                ParseErrorKind::ExpectedToken("identifier"),
                format!("expected identifier, found '{}'", tok.lexeme),
                tok.span,
            ))
        }
    }

    fn synchronize_to_decl(&mut self) {
        while !self.is_at_end() {
            if matches!(
                self.peek().kind,
                TokenKind::KwFunc
                    | TokenKind::KwType
                    | TokenKind::KwUnion
                    | TokenKind::KwBehavior
                    | TokenKind::KwImpl
                    | TokenKind::KwMod
                    | TokenKind::KwNamespace
                    | TokenKind::KwUse
                    | TokenKind::KwConst
                    | TokenKind::KwClass
                    | TokenKind::KwInterface
                    | TokenKind::KwDecorator
                    | TokenKind::At
                    | TokenKind::KwPub
            ) {
                return;
            }
            self.advance();
        }
    }

    pub(crate) fn synchronize_to_stmt(&mut self) {
        while !self.is_at_end() {
            if matches!(self.peek().kind, TokenKind::Newline | TokenKind::RBrace) {
                return;
            }
            self.advance();
        }
    }

    // -- declarations -----------------------------------------------------

    fn parse_decorators(&mut self) -> Result<Vec<Decorator>, ParseError> {
        let mut decorators = Vec::new();
        while self.check(TokenKind::At) {
            let start = self.peek().span;
            self.advance();
            let name = self.expect_ident()?;
            let mut args = Vec::new();
            if self.match_kind(TokenKind::LParen) {
                if !self.check(TokenKind::RParen) {
                    loop {
                        args.push(self.parse_expr()?);
                        if !self.match_kind(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RParen, "')'")?;
            }
            let end = self.tokens[self.pos.saturating_sub(1)].span;
            decorators.push(Decorator {
                name,
                args,
                span: start.to(end),
            });
            self.skip_newlines();
        }
        Ok(decorators)
    }

    fn parse_visibility(&mut self) -> Visibility {
        if self.match_kind(TokenKind::KwPub) {
            Visibility::Public
        } else if self.match_kind(TokenKind::KwProtected) {
            Visibility::Protected
        } else if self.match_kind(TokenKind::KwPrivate) {
            Visibility::Private
        } else {
            Visibility::Private
        }
    }

    fn parse_decl(&mut self) -> Result<Decl, ParseError> {
        let decorators = self.parse_decorators()?;
        let start = self.peek().span;
        let visibility = self.parse_visibility();

        let kind = match self.peek().kind {
            TokenKind::KwFunc => DeclKind::Func(self.parse_func_decl(visibility, decorators)?),
            TokenKind::KwType => self.parse_struct_or_enum_decl(visibility, decorators)?,
            TokenKind::KwUnion => {
                DeclKind::Union(self.parse_union_decl(visibility, decorators)?)
            }
            TokenKind::KwBehavior => DeclKind::Behavior(self.parse_behavior_decl(visibility)?),
            TokenKind::KwImpl => DeclKind::Impl(self.parse_impl_decl()?),
            TokenKind::KwConst => DeclKind::Const(self.parse_const_decl(visibility)?),
            TokenKind::KwUse => DeclKind::Use(self.parse_use_decl(visibility)?),
            TokenKind::KwMod | TokenKind::KwNamespace => {
                DeclKind::Mod(self.parse_mod_decl(visibility)?)
            }
            TokenKind::KwDecorator => DeclKind::DecoratorDef(self.parse_decorator_def()?),
            TokenKind::KwClass | TokenKind::KwAbstract | TokenKind::KwSealed => {
                DeclKind::Class(self.parse_class_decl(visibility, decorators)?)
            }
            TokenKind::KwInterface => DeclKind::Interface(self.parse_interface_decl(visibility)?),
            _ => {
                let tok = self.peek().clone();
                return Err(ParseError::new(
                    ParseErrorKind::ExpectedDeclaration,
                    format!("expected a declaration, found '{}'", tok.lexeme),
                    tok.span,
                ));
            }
        };
        let end = self.tokens[self.pos.saturating_sub(1)].span;
        Ok(Decl::new(kind, start.to(end)))
    }

    fn parse_generics(&mut self) -> Result<(Vec<GenericParam>, Vec<ConstParam>), ParseError> {
        let mut generics = Vec::new();
        let mut const_generics = Vec::new();
        if self.match_kind(TokenKind::LBracket) {
            loop {
                if self.match_kind(TokenKind::KwConst) {
                    let name = self.expect_ident()?;
                    self.expect(TokenKind::Colon, "':'")?;
                    let ty = self.parse_type()?;
                    const_generics.push(ConstParam { name, ty });
                } else if self.match_kind(TokenKind::KwLife) {
                    // `[life a]` introduces a lifetime parameter, referenced
                    // later in the parameter list as `ref[a] T`. Lifetimes
                    // carry no bounds of their own.
                    let name = self.expect_ident()?;
                    generics.push(GenericParam { name, bounds: Vec::new() });
                } else {
                    let name = self.expect_ident()?;
                    let mut bounds = Vec::new();
                    if self.match_kind(TokenKind::Colon) {
                        loop {
                            bounds.push(self.parse_type()?);
                            if !self.match_kind(TokenKind::Plus) {
                                break;
                            }
                        }
                    }
                    generics.push(GenericParam { name, bounds });
                }
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RBracket, "']'")?;
        }
        Ok((generics, const_generics))
    }

    fn parse_where_clauses(&mut self) -> Result<Vec<WhereClause>, ParseError> {
        let mut clauses = Vec::new();
        if self.match_kind(TokenKind::KwWhere) {
            loop {
                let type_param = self.expect_ident()?;
                self.expect(TokenKind::Colon, "':'")?;
                loop {
                    let bound = self.parse_type()?;
                    clauses.push(WhereClause {
                        type_param: type_param.clone(),
                        bound,
                    });
                    if !self.match_kind(TokenKind::Plus) {
                        break;
                    }
                }
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        Ok(clauses)
    }

    fn parse_func_signature(&mut self) -> Result<FuncSignature, ParseError> {
        let is_async = self.match_kind(TokenKind::KwAsync);
        let is_lowlevel = self.match_kind(TokenKind::KwLowlevel);
        self.expect(TokenKind::KwFunc, "'func'")?;
        let name = self.expect_ident()?;
        let (generics, const_generics) = self.parse_generics()?;
        self.expect(TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let p_start = self.peek().span;
                let pname = self.expect_ident()?;
                self.expect(TokenKind::Colon, "':'")?;
                let ty = self.parse_type()?;
                let p_end = self.tokens[self.pos.saturating_sub(1)].span;
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
        let ret = if self.match_kind(TokenKind::Arrow) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let where_clauses = self.parse_where_clauses()?;
        Ok(FuncSignature {
            name,
            generics,
            const_generics,
            params,
            ret,
            where_clauses,
            is_async,
            is_lowlevel,
        })
    }

    fn parse_func_decl(
        &mut self,
        visibility: Visibility,
        decorators: Vec<Decorator>,
    ) -> Result<FuncDecl, ParseError> {
        let start = self.peek().span;
        let sig = self.parse_func_signature()?;
        self.skip_newlines();
        let body = if self.check(TokenKind::LBrace) {
            Some(self.parse_block_expr()?)
        } else {
            None
        };
        let end = self.tokens[self.pos.saturating_sub(1)].span;
        Ok(FuncDecl {
            sig,
            body,
            visibility,
            decorators,
            span: start.to(end),
        })
    }

    /// True if the member starting at the current position has the shape
    /// of a struct field (`[visibility] name : Type`) rather than an enum
    /// variant (`name` or `name(Type, ...)`).
    fn peek_is_struct_field(&self) -> bool {
        let mut i = self.pos;
        while matches!(
            self.tokens[i].kind,
            TokenKind::KwPub | TokenKind::KwPrivate | TokenKind::KwProtected
        ) {
            i += 1;
        }
        if self.tokens[i].kind != TokenKind::Identifier {
            return false;
        }
        i += 1;
        self.tokens
            .get(i)
            .map(|t| t.kind == TokenKind::Colon)
            .unwrap_or(false)
    }

    /// `type Name { .. }` — disambiguates a struct body (named, typed
    /// fields) from an enum body (bare or tuple-payload variants) by
    /// inspecting the shape of its first member.
    fn parse_struct_or_enum_decl(
        &mut self,
        visibility: Visibility,
        decorators: Vec<Decorator>,
    ) -> Result<DeclKind, ParseError> {
        let start = self.peek().span;
        self.expect(TokenKind::KwType, "'type'")?;
        let name = self.expect_ident()?;
        let (generics, const_generics) = self.parse_generics()?;
        self.expect(TokenKind::LBrace, "'{'")?;
        self.skip_newlines();

        if self.check(TokenKind::RBrace) || self.peek_is_struct_field() {
            let fields = self.parse_struct_fields()?;
            self.expect(TokenKind::RBrace, "'}'")?;
            let end = self.tokens[self.pos.saturating_sub(1)].span;
            return Ok(DeclKind::Struct(StructDecl {
                name,
                generics,
                const_generics,
                fields,
                visibility,
                decorators,
                span: start.to(end),
            }));
        }

        let mut variants = Vec::new();
        while !self.check(TokenKind::RBrace) {
            let v_start = self.peek().span;
            let vname = self.expect_ident()?;
            let mut payload = Vec::new();
            if self.match_kind(TokenKind::LParen) {
                if !self.check(TokenKind::RParen) {
                    loop {
                        payload.push(self.parse_type()?);
                        if !self.match_kind(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RParen, "')'")?;
            }
            let v_end = self.tokens[self.pos.saturating_sub(1)].span;
            variants.push(EnumVariant {
                name: vname,
                payload,
                span: v_start.to(v_end),
            });
            if !self.match_kind(TokenKind::Comma) {
                self.skip_newlines();
            }
            self.skip_newlines();
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        let end = self.tokens[self.pos.saturating_sub(1)].span;
        Ok(DeclKind::Enum(EnumDecl {
            name,
            generics,
            const_generics,
            variants,
            visibility,
            decorators,
            span: start.to(end),
        }))
    }

    fn parse_struct_fields(&mut self) -> Result<Vec<StructField>, ParseError> {
        let mut fields = Vec::new();
        while !self.check(TokenKind::RBrace) {
            let f_start = self.peek().span;
            let visibility = self.parse_visibility();
            let fname = self.expect_ident()?;
            self.expect(TokenKind::Colon, "':'")?;
            let ty = self.parse_type()?;
            let f_end = self.tokens[self.pos.saturating_sub(1)].span;
            fields.push(StructField {
                name: fname,
                ty,
                visibility,
                span: f_start.to(f_end),
            });
            if !self.match_kind(TokenKind::Comma) {
                self.skip_newlines();
            }
            self.skip_newlines();
        }
        Ok(fields)
    }

    /// `union Name { Variant { field: Type, .. }, UnitVariant, .. }` — a
    /// closed sum type whose variants carry named fields, distinct from
    /// `enum`'s positional payload tuples.
    fn parse_union_decl(
        &mut self,
        visibility: Visibility,
        decorators: Vec<Decorator>,
    ) -> Result<UnionDecl, ParseError> {
        let start = self.peek().span;
        self.expect(TokenKind::KwUnion, "'union'")?;
        let name = self.expect_ident()?;
        let (generics, const_generics) = self.parse_generics()?;
        self.expect(TokenKind::LBrace, "'{'")?;
        self.skip_newlines();
        let mut variants = Vec::new();
        while !self.check(TokenKind::RBrace) {
            let v_start = self.peek().span;
            let vname = self.expect_ident()?;
            let fields = if self.match_kind(TokenKind::LBrace) {
                self.skip_newlines();
                let fields = self.parse_struct_fields()?;
                self.expect(TokenKind::RBrace, "'}'")?;
                fields
            } else {
                Vec::new()
            };
            let v_end = self.tokens[self.pos.saturating_sub(1)].span;
            variants.push(UnionVariant {
                name: vname,
                fields,
                span: v_start.to(v_end),
            });
            if !self.match_kind(TokenKind::Comma) {
                self.skip_newlines();
            }
            self.skip_newlines();
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        let end = self.tokens[self.pos.saturating_sub(1)].span;
        Ok(UnionDecl {
            name,
            generics,
            const_generics,
            variants,
            visibility,
            decorators,
            span: start.to(end),
        })
    }

    fn parse_behavior_decl(&mut self, visibility: Visibility) -> Result<BehaviorDecl, ParseError> {
        let start = self.peek().span;
        self.expect(TokenKind::KwBehavior, "'behavior'")?;
        let name = self.expect_ident()?;
        let (generics, _) = self.parse_generics()?;
        self.expect(TokenKind::LBrace, "'{'")?;
        self.skip_newlines();
        let mut associated_types = Vec::new();
        let mut methods = Vec::new();
        while !self.check(TokenKind::RBrace) {
            if self.match_kind(TokenKind::KwType) {
                let name = self.expect_ident()?;
                let bound = if self.match_kind(TokenKind::Colon) {
                    Some(self.parse_type()?)
                } else {
                    None
                };
                associated_types.push(AssociatedTypeDecl { name, bound });
            } else {
                let decorators = self.parse_decorators()?;
                let m_start = self.peek().span;
                let sig = self.parse_func_signature()?;
                self.skip_newlines();
                let body = if self.check(TokenKind::LBrace) {
                    Some(self.parse_block_expr()?)
                } else {
                    None
                };
                let m_end = self.tokens[self.pos.saturating_sub(1)].span;
                methods.push(FuncDecl {
                    sig,
                    body,
                    visibility: Visibility::Public,
                    decorators,
                    span: m_start.to(m_end),
                });
            }
            self.skip_newlines();
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        let end = self.tokens[self.pos.saturating_sub(1)].span;
        Ok(BehaviorDecl {
            name,
            generics,
            associated_types,
            methods,
            visibility,
            span: start.to(end),
        })
    }

    fn parse_impl_decl(&mut self) -> Result<ImplDecl, ParseError> {
        let start = self.peek().span;
        self.expect(TokenKind::KwImpl, "'impl'")?;
        let (generics, _) = self.parse_generics()?;
        let first_ty = self.parse_type()?;
        let (behavior, self_ty) = if self.match_kind(TokenKind::KwFor) {
            (Some(first_ty), self.parse_type()?)
        } else {
            (None, first_ty)
        };
        let where_clauses = self.parse_where_clauses()?;
        self.expect(TokenKind::LBrace, "'{'")?;
        self.skip_newlines();
        let mut methods = Vec::new();
        let mut assoc_type_bindings = Vec::new();
        while !self.check(TokenKind::RBrace) {
            if self.match_kind(TokenKind::KwType) {
                let name = self.expect_ident()?;
                self.expect(TokenKind::Assign, "'='")?;
                let ty = self.parse_type()?;
                assoc_type_bindings.push((name, ty));
            } else {
                let decorators = self.parse_decorators()?;
                let m_start = self.peek().span;
                let sig = self.parse_func_signature()?;
                self.skip_newlines();
                let body = Some(self.parse_block_expr()?);
                let m_end = self.tokens[self.pos.saturating_sub(1)].span;
                methods.push(FuncDecl {
                    sig,
                    body,
                    visibility: Visibility::Public,
                    decorators,
                    span: m_start.to(m_end),
                });
            }
            self.skip_newlines();
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        let end = self.tokens[self.pos.saturating_sub(1)].span;
        Ok(ImplDecl {
            generics,
            behavior,
            self_ty,
            where_clauses,
            methods,
            assoc_type_bindings,
            span: start.to(end),
        })
    }

    fn parse_const_decl(&mut self, visibility: Visibility) -> Result<ConstDecl, ParseError> {
        let start = self.peek().span;
        self.expect(TokenKind::KwConst, "'const'")?;
        let name = self.expect_ident()?;
        self.expect(TokenKind::Colon, "':'")?;
        let ty = self.parse_type()?;
        self.expect(TokenKind::Assign, "'='")?;
        let value = self.parse_expr()?;
        let end = self.tokens[self.pos.saturating_sub(1)].span;
        Ok(ConstDecl {
            name,
            ty,
            value,
            visibility,
            span: start.to(end),
        })
    }

    fn parse_use_tree(&mut self) -> Result<UseTree, ParseError> {
        let mut path = Vec::new();
        loop {
            if self.match_kind(TokenKind::Star) {
                return Ok(UseTree::Glob { path });
            }
            if self.check(TokenKind::LBrace) {
                self.advance();
                let mut items = Vec::new();
                self.skip_newlines();
                if !self.check(TokenKind::RBrace) {
                    loop {
                        items.push(self.parse_use_tree()?);
                        if !self.match_kind(TokenKind::Comma) {
                            break;
                        }
                        self.skip_newlines();
                    }
                }
                self.skip_newlines();
                self.expect(TokenKind::RBrace, "'}'")?;
                return Ok(UseTree::Group { prefix: path, items });
            }
            let seg = self.expect_ident()?;
            path.push(seg);
            if self.match_kind(TokenKind::ColonColon) {
                continue;
            }
            break;
        }
        let alias = if self.match_kind(TokenKind::KwAs) {
            Some(self.expect_ident()?)
        } else {
            None
        };
        Ok(UseTree::Single { path, alias })
    }

    fn parse_use_decl(&mut self, visibility: Visibility) -> Result<UseDecl, ParseError> {
        let start = self.peek().span;
        self.expect(TokenKind::KwUse, "'use'")?;
        let tree = self.parse_use_tree()?;
        let end = self.tokens[self.pos.saturating_sub(1)].span;
        Ok(UseDecl {
            tree,
            visibility,
            span: start.to(end),
        })
    }

    fn parse_mod_decl(&mut self, visibility: Visibility) -> Result<ModDecl, ParseError> {
        let start = self.peek().span;
        self.advance(); // `mod` or `namespace`
        let name = self.expect_ident()?;
        let items = if self.match_kind(TokenKind::LBrace) {
            self.skip_newlines();
            let mut decls = Vec::new();
            while !self.check(TokenKind::RBrace) {
                match self.parse_decl() {
                    Ok(d) => decls.push(d),
                    Err(e) => {
                        self.errors.push(e);
                        self.synchronize_to_decl();
                    }
                }
                self.skip_newlines();
            }
            self.expect(TokenKind::RBrace, "'}'")?;
            Some(decls)
        } else {
            None
        };
        let end = self.tokens[self.pos.saturating_sub(1)].span;
        Ok(ModDecl {
            name,
            items,
            visibility,
            span: start.to(end),
        })
    }

    fn parse_decorator_def(&mut self) -> Result<DecoratorDecl, ParseError> {
        let start = self.peek().span;
        self.expect(TokenKind::KwDecorator, "'decorator'")?;
        let name = self.expect_ident()?;
        self.expect(TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let p_start = self.peek().span;
                let pname = self.expect_ident()?;
                self.expect(TokenKind::Colon, "':'")?;
                let ty = self.parse_type()?;
                let p_end = self.tokens[self.pos.saturating_sub(1)].span;
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
        let end = self.tokens[self.pos.saturating_sub(1)].span;
        Ok(DecoratorDecl {
            name,
            params,
            span: start.to(end),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::source::Source;

    fn parse(src: &str) -> (ModuleAst, Vec<ParseError>) {
        let source = Source::new("t.tml", src.to_string());
        let (tokens, lex_errors) = tokenize(&source);
        assert!(lex_errors.is_empty(), "unexpected lex errors");
        Parser::new(tokens).parse_module()
    }

    #[test]
    fn parses_simple_function() {
        let (module, errors) = parse("func add(a: I32, b: I32) -> I32 { a + b }");
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(module.decls.len(), 1);
        assert!(matches!(module.decls[0].kind, DeclKind::Func(_)));
    }

    #[test]
    fn parses_struct_with_generics() {
        let (module, errors) = parse("type Pair[T] { first: T, second: T }");
        assert!(errors.is_empty(), "{:?}", errors);
        match &module.decls[0].kind {
            DeclKind::Struct(s) => {
                assert_eq!(s.name, "Pair");
                assert_eq!(s.fields.len(), 2);
            }
            other => panic!("expected struct, got {:?}", other),
        }
    }

    #[test]
    fn recovers_after_bad_declaration() {
        let (module, errors) = parse("!!! garbage\nfunc ok() -> I32 { 1 }");
        assert!(!errors.is_empty());
        assert_eq!(module.decls.len(), 1);
    }

    #[test]
    fn disambiguates_enum_from_struct() {
        let (module, errors) = parse("type Maybe[T] { Just(T), Nothing }");
        assert!(errors.is_empty(), "{:?}", errors);
        match &module.decls[0].kind {
            DeclKind::Enum(e) => {
                assert_eq!(e.name, "Maybe");
                assert_eq!(e.variants.len(), 2);
                assert_eq!(e.variants[0].payload.len(), 1);
                assert!(e.variants[1].payload.is_empty());
            }
            other => panic!("expected enum, got {:?}", other),
        }
    }

    #[test]
    fn parses_use_group() {
        let (module, errors) = parse("use std::{io, collections::List}");
        assert!(errors.is_empty(), "{:?}", errors);
        assert!(matches!(module.decls[0].kind, DeclKind::Use(_)));
    }
}
