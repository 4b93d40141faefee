//! Expression, statement, and block grammar: Pratt-style binary/unary
//! precedence climbing over the primary forms (literals, calls, control
//! flow, closures, interpolation).
//!
//! Precedence (low -> high): assignment -> ternary -> range -> `or` ->
//! `and` -> comparison -> bitwise-or -> bitwise-xor -> bitwise-and ->
//! shift -> additive -> multiplicative -> unary prefix -> postfix ->
//! primary. Keyword operators (`and`/`or`/`not`, `xor`/`shl`/`shr`) are
//! accepted anywhere their symbolic form is.

use super::error::{ParseError, ParseErrorKind};
use super::Parser;
use crate::ast::exprs::{
    AssignOp, BinaryOp, ClosureParam, Expr, ExprKind, InterpSegment, LiteralPattern, MatchArm,
    PostfixIncrOp, StructFieldInit, UnaryOp,
};
use crate::ast::stmts::{Stmt, StmtKind};
use crate::lexer::{LiteralValue, TokenKind};
use crate::source::Span;

impl Parser {
    pub(super) fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_assignment()
    }

    // -- statements & blocks ----------------------------------------------

    pub(super) fn parse_block_expr(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek().span;
        self.expect(TokenKind::LBrace, "'{'")?;
        self.skip_newlines();
        let mut stmts = Vec::new();
        let mut tail = None;
        while !self.check(TokenKind::RBrace) {
            match self.parse_stmt_or_tail()? {
                StmtOrTail::Stmt(s) => stmts.push(s),
                StmtOrTail::Tail(e) => {
                    tail = Some(Box::new(e));
                    self.skip_newlines();
                    break;
                }
            }
            self.skip_newlines();
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        let end = self.prev_span();
        Ok(Expr::new(ExprKind::Block { stmts, tail }, start.to(end)))
    }

    /// A `let`/`var`/nested-declaration statement, or a trailing expression
    /// (with or without a terminating semicolon). The last entry in a block
    /// with no semicolon and immediately followed by `}` is the block's
    /// tail value.
    fn parse_stmt_or_tail(&mut self) -> Result<StmtOrTail, ParseError> {
        let start = self.peek().span;
        if self.check(TokenKind::KwLet) || self.check(TokenKind::KwVar) {
            return Ok(StmtOrTail::Stmt(self.parse_let_or_var_stmt()?));
        }
        if matches!(
            self.peek().kind,
            TokenKind::KwFunc
                | TokenKind::KwType
                | TokenKind::KwUnion
                | TokenKind::KwBehavior
                | TokenKind::KwImpl
                | TokenKind::KwConst
                | TokenKind::KwUse
                | TokenKind::KwMod
                | TokenKind::KwNamespace
                | TokenKind::KwClass
                | TokenKind::KwInterface
        ) {
            let decl = self.parse_decl()?;
            let end = self.prev_span();
            return Ok(StmtOrTail::Stmt(Stmt::new(
                StmtKind::Decl(Box::new(decl)),
                start.to(end),
            )));
        }

        let expr = self.parse_expr()?;
        let has_semi = self.match_kind(TokenKind::Semi);
        let end = self.prev_span();
        if !has_semi && (self.check(TokenKind::RBrace) || self.is_at_end()) {
            Ok(StmtOrTail::Tail(expr))
        } else {
            Ok(StmtOrTail::Stmt(Stmt::new(
                StmtKind::Expr { expr, has_semi },
                start.to(end),
            )))
        }
    }

    fn parse_let_or_var_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.peek().span;
        let is_var = self.check(TokenKind::KwVar);
        self.advance(); // `let` or `var`
        let name = self.expect_ident()?;
        let ty = if self.match_kind(TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };
        self.expect(TokenKind::Assign, "'='")?;
        let value = self.parse_expr()?;
        let end = self.prev_span();
        let kind = if is_var {
            StmtKind::Var { name, ty, value }
        } else {
            StmtKind::Let { name, ty, value }
        };
        Ok(Stmt::new(kind, start.to(end)))
    }

    // -- precedence climbing -----------------------------------------------

    fn parse_assignment(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek().span;
        let target = self.parse_ternary()?;
        let op = match self.peek().kind {
            TokenKind::Assign => Some(AssignOp::Assign),
            TokenKind::PlusAssign => Some(AssignOp::Add),
            TokenKind::MinusAssign => Some(AssignOp::Sub),
            TokenKind::StarAssign => Some(AssignOp::Mul),
            TokenKind::SlashAssign => Some(AssignOp::Div),
            TokenKind::PercentAssign => Some(AssignOp::Rem),
            TokenKind::BitAndAssign => Some(AssignOp::BitAnd),
            TokenKind::BitOrAssign => Some(AssignOp::BitOr),
            TokenKind::BitXorAssign => Some(AssignOp::BitXor),
            TokenKind::ShlAssign => Some(AssignOp::Shl),
            TokenKind::ShrAssign => Some(AssignOp::Shr),
            _ => None,
        };
        let Some(op) = op else { return Ok(target) };
        self.advance();
        let value = Box::new(self.parse_assignment()?);
        let end = self.prev_span();
        Ok(Expr::new(
            ExprKind::Assign {
                op,
                target: Box::new(target),
                value,
            },
            start.to(end),
        ))
    }

    /// `cond ? then : else`.
    fn parse_ternary(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek().span;
        let cond = self.parse_range()?;
        if !self.match_kind(TokenKind::Question) {
            return Ok(cond);
        }
        let then_value = Box::new(self.parse_assignment()?);
        self.expect(TokenKind::Colon, "':'")?;
        let else_value = Box::new(self.parse_assignment()?);
        let end = self.prev_span();
        Ok(Expr::new(
            ExprKind::Ternary {
                cond: Box::new(cond),
                then_value,
                else_value,
            },
            start.to(end),
        ))
    }

    /// `lo to hi` / `lo through hi` (or symbolic `..`/`..=`), either bound
    /// optional.
    fn parse_range(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek().span;
        if matches!(
            self.peek().kind,
            TokenKind::KwTo | TokenKind::KwThrough | TokenKind::DotDot | TokenKind::DotDotEq
        ) {
            let inclusive = matches!(self.peek().kind, TokenKind::KwThrough | TokenKind::DotDotEq);
            self.advance();
            let hi = Some(Box::new(self.parse_or()?));
            let end = self.prev_span();
            return Ok(Expr::new(
                ExprKind::Range { lo: None, hi, inclusive },
                start.to(end),
            ));
        }
        let lo = self.parse_or()?;
        if matches!(
            self.peek().kind,
            TokenKind::KwTo | TokenKind::KwThrough | TokenKind::DotDot | TokenKind::DotDotEq
        ) {
            let inclusive = matches!(self.peek().kind, TokenKind::KwThrough | TokenKind::DotDotEq);
            self.advance();
            let hi = if self.at_range_end() {
                None
            } else {
                Some(Box::new(self.parse_or()?))
            };
            let end = self.prev_span();
            return Ok(Expr::new(
                ExprKind::Range {
                    lo: Some(Box::new(lo)),
                    hi,
                    inclusive,
                },
                start.to(end),
            ));
        }
        Ok(lo)
    }

    /// True at a token that can never start an expression, so an open-ended
    /// range (`lo to`) is recognized instead of erroring out looking for a
    /// missing upper bound.
    fn at_range_end(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::RBrace
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::Comma
                | TokenKind::Newline
                | TokenKind::Semi
                | TokenKind::Eof
                | TokenKind::LBrace
        )
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek().span;
        let mut lhs = self.parse_and()?;
        while self.check(TokenKind::KwOr) || self.check(TokenKind::OrOr) {
            self.advance();
            let rhs = self.parse_and()?;
            let end = self.prev_span();
            lhs = Expr::new(
                ExprKind::Binary {
                    op: BinaryOp::Or,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                start.to(end),
            );
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek().span;
        let mut lhs = self.parse_comparison()?;
        while self.check(TokenKind::KwAnd) || self.check(TokenKind::AndAnd) {
            self.advance();
            let rhs = self.parse_comparison()?;
            let end = self.prev_span();
            lhs = Expr::new(
                ExprKind::Binary {
                    op: BinaryOp::And,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                start.to(end),
            );
        }
        Ok(lhs)
    }

    /// Non-associative: at most one comparison operator per expression, so
    /// `a < b < c` is a parse error rather than `(a < b) < c`.
    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek().span;
        let lhs = self.parse_bitor()?;
        let op = match self.peek().kind {
            TokenKind::EqEq => Some(BinaryOp::Eq),
            TokenKind::Ne => Some(BinaryOp::Ne),
            TokenKind::Lt => Some(BinaryOp::Lt),
            TokenKind::Le => Some(BinaryOp::Le),
            TokenKind::Gt => Some(BinaryOp::Gt),
            TokenKind::Ge => Some(BinaryOp::Ge),
            _ => None,
        };
        let Some(op) = op else { return Ok(lhs) };
        self.advance();
        let rhs = self.parse_bitor()?;
        let end = self.prev_span();
        Ok(Expr::new(
            ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            start.to(end),
        ))
    }

    fn parse_bitor(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek().span;
        let mut lhs = self.parse_bitxor()?;
        while self.check(TokenKind::Pipe) {
            self.advance();
            let rhs = self.parse_bitxor()?;
            let end = self.prev_span();
            lhs = Expr::new(
                ExprKind::Binary {
                    op: BinaryOp::BitOr,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                start.to(end),
            );
        }
        Ok(lhs)
    }

    fn parse_bitxor(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek().span;
        let mut lhs = self.parse_bitand()?;
        while self.check(TokenKind::KwXor) || self.check(TokenKind::BitXor) {
            self.advance();
            let rhs = self.parse_bitand()?;
            let end = self.prev_span();
            lhs = Expr::new(
                ExprKind::Binary {
                    op: BinaryOp::BitXor,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                start.to(end),
            );
        }
        Ok(lhs)
    }

    fn parse_bitand(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek().span;
        let mut lhs = self.parse_shift()?;
        while self.check(TokenKind::BitAnd) {
            self.advance();
            let rhs = self.parse_shift()?;
            let end = self.prev_span();
            lhs = Expr::new(
                ExprKind::Binary {
                    op: BinaryOp::BitAnd,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                start.to(end),
            );
        }
        Ok(lhs)
    }

    fn parse_shift(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek().span;
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Shl | TokenKind::KwShl => BinaryOp::Shl,
                TokenKind::Shr | TokenKind::KwShr => BinaryOp::Shr,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_additive()?;
            let end = self.prev_span();
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                start.to(end),
            );
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek().span;
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            let end = self.prev_span();
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                start.to(end),
            );
        }
        Ok(lhs)
    }

    /// `**` (power) has no dedicated [`BinaryOp`] variant; it desugars to a
    /// call of the `pow` builtin so the existing `llvm.pow.f64` intrinsic
    /// wiring in `codegen::builtins::math` covers it without a new opcode.
    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek().span;
        let mut lhs = self.parse_unary()?;
        loop {
            match self.peek().kind {
                TokenKind::Star => {
                    self.advance();
                    let rhs = self.parse_unary()?;
                    let end = self.prev_span();
                    lhs = Expr::new(
                        ExprKind::Binary {
                            op: BinaryOp::Mul,
                            lhs: Box::new(lhs),
                            rhs: Box::new(rhs),
                        },
                        start.to(end),
                    );
                }
                TokenKind::Slash => {
                    self.advance();
                    let rhs = self.parse_unary()?;
                    let end = self.prev_span();
                    lhs = Expr::new(
                        ExprKind::Binary {
                            op: BinaryOp::Div,
                            lhs: Box::new(lhs),
                            rhs: Box::new(rhs),
                        },
                        start.to(end),
                    );
                }
                TokenKind::Percent => {
                    self.advance();
                    let rhs = self.parse_unary()?;
                    let end = self.prev_span();
                    lhs = Expr::new(
                        ExprKind::Binary {
                            op: BinaryOp::Rem,
                            lhs: Box::new(lhs),
                            rhs: Box::new(rhs),
                        },
                        start.to(end),
                    );
                }
                TokenKind::StarStar => {
                    self.advance();
                    let rhs = self.parse_unary()?;
                    let end = self.prev_span();
                    lhs = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(Expr::new(
                                ExprKind::Identifier("pow".to_string()),
                                start,
                            )),
                            args: vec![lhs, rhs],
                        },
                        start.to(end),
                    );
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek().span;
        let op = match self.peek().kind {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::KwNot | TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::BitNot => Some(UnaryOp::BitNot),
            TokenKind::Star => Some(UnaryOp::Deref),
            TokenKind::PlusPlus => Some(UnaryOp::PreIncr),
            TokenKind::MinusMinus => Some(UnaryOp::PreDecr),
            TokenKind::BitAnd if self.peek_at(1).kind == TokenKind::KwMut => Some(UnaryOp::RefMut),
            TokenKind::BitAnd => Some(UnaryOp::Ref),
            TokenKind::KwRef => Some(UnaryOp::Ref),
            _ => None,
        };
        let Some(op) = op else { return self.parse_postfix() };
        self.advance();
        if op == UnaryOp::RefMut {
            self.advance(); // `mut`
        }
        let operand = Box::new(self.parse_unary()?);
        let end = self.prev_span();
        Ok(Expr::new(ExprKind::Unary { op, operand }, start.to(end)))
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek().span;
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek().kind {
                TokenKind::Dot => {
                    self.advance();
                    if self.match_kind(TokenKind::KwAwait) {
                        let end = self.prev_span();
                        expr = Expr::new(ExprKind::Await(Box::new(expr)), start.to(end));
                        continue;
                    }
                    let name = self.expect_ident()?;
                    if self.check(TokenKind::LParen) || self.check(TokenKind::LBracket) {
                        let mut type_args = Vec::new();
                        if self.match_kind(TokenKind::LBracket) {
                            if !self.check(TokenKind::RBracket) {
                                loop {
                                    type_args.push(self.parse_type()?);
                                    if !self.match_kind(TokenKind::Comma) {
                                        break;
                                    }
                                }
                            }
                            self.expect(TokenKind::RBracket, "']'")?;
                        }
                        self.expect(TokenKind::LParen, "'('")?;
                        let args = self.parse_call_args()?;
                        let end = self.prev_span();
                        expr = Expr::new(
                            ExprKind::MethodCall {
                                receiver: Box::new(expr),
                                method: name,
                                type_args,
                                args,
                            },
                            start.to(end),
                        );
                    } else {
                        let end = self.prev_span();
                        expr = Expr::new(
                            ExprKind::Field {
                                receiver: Box::new(expr),
                                name,
                            },
                            start.to(end),
                        );
                    }
                }
                TokenKind::LParen => {
                    self.advance();
                    let args = self.parse_call_args()?;
                    let end = self.prev_span();
                    expr = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        start.to(end),
                    );
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(TokenKind::RBracket, "']'")?;
                    let end = self.prev_span();
                    expr = Expr::new(
                        ExprKind::Index {
                            receiver: Box::new(expr),
                            index: Box::new(index),
                        },
                        start.to(end),
                    );
                }
                TokenKind::Bang => {
                    self.advance();
                    let end = self.prev_span();
                    expr = Expr::new(ExprKind::Try(Box::new(expr)), start.to(end));
                }
                TokenKind::PlusPlus => {
                    self.advance();
                    let end = self.prev_span();
                    expr = Expr::new(
                        ExprKind::PostfixIncr {
                            op: PostfixIncrOp::Incr,
                            operand: Box::new(expr),
                        },
                        start.to(end),
                    );
                }
                TokenKind::MinusMinus => {
                    self.advance();
                    let end = self.prev_span();
                    expr = Expr::new(
                        ExprKind::PostfixIncr {
                            op: PostfixIncrOp::Decr,
                            operand: Box::new(expr),
                        },
                        start.to(end),
                    );
                }
                TokenKind::KwAs => {
                    self.advance();
                    let ty = self.parse_type()?;
                    let end = self.prev_span();
                    expr = Expr::new(
                        ExprKind::Cast {
                            expr: Box::new(expr),
                            ty,
                        },
                        start.to(end),
                    );
                }
                TokenKind::KwIs => {
                    self.advance();
                    let ty = self.parse_type()?;
                    let end = self.prev_span();
                    expr = Expr::new(
                        ExprKind::TypeCheck {
                            expr: Box::new(expr),
                            ty,
                        },
                        start.to(end),
                    );
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_call_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        self.skip_newlines();
        if !self.check(TokenKind::RParen) {
            loop {
                self.skip_newlines();
                args.push(self.parse_expr()?);
                self.skip_newlines();
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.skip_newlines();
        self.expect(TokenKind::RParen, "')'")?;
        Ok(args)
    }

    // -- primary ------------------------------------------------------------

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek().span;
        match self.peek().kind {
            TokenKind::IntLiteral | TokenKind::FloatLiteral => self.parse_literal_token(),
            TokenKind::StringLiteral | TokenKind::RawStringLiteral => self.parse_literal_token(),
            TokenKind::CharLiteral | TokenKind::BoolLiteral | TokenKind::NullLiteral => {
                self.parse_literal_token()
            }
            TokenKind::InterpStringStart => self.parse_interp_string(),
            TokenKind::TemplateLiteralStart => self.parse_template_literal(),

            TokenKind::Identifier | TokenKind::KwCrate | TokenKind::KwSuper | TokenKind::KwThis => {
                self.parse_ident_or_path_expr()
            }

            TokenKind::LParen => self.parse_paren_or_tuple(),
            TokenKind::LBracket => self.parse_array_expr(),
            TokenKind::LBrace => self.parse_block_expr(),

            TokenKind::KwIf => self.parse_if_expr(),
            TokenKind::KwWhen => self.parse_when_expr(),
            TokenKind::KwLoop => self.parse_loop_expr(None),
            TokenKind::KwWhile => self.parse_while_expr(None),
            TokenKind::KwFor => self.parse_for_expr(None),

            TokenKind::KwReturn => {
                self.advance();
                let value = if self.at_expr_end() {
                    None
                } else {
                    Some(Box::new(self.parse_expr()?))
                };
                let end = self.prev_span();
                Ok(Expr::new(ExprKind::Return(value), start.to(end)))
            }
            TokenKind::KwBreak => {
                self.advance();
                let label = if self.check(TokenKind::At) {
                    self.advance();
                    Some(self.expect_ident()?)
                } else {
                    None
                };
                let value = if self.at_expr_end() {
                    None
                } else {
                    Some(Box::new(self.parse_expr()?))
                };
                let end = self.prev_span();
                Ok(Expr::new(ExprKind::Break { label, value }, start.to(end)))
            }
            TokenKind::KwContinue => {
                self.advance();
                let label = if self.check(TokenKind::At) {
                    self.advance();
                    Some(self.expect_ident()?)
                } else {
                    None
                };
                let end = self.prev_span();
                Ok(Expr::new(ExprKind::Continue { label }, start.to(end)))
            }
            TokenKind::KwThrow => {
                self.advance();
                let value = Box::new(self.parse_expr()?);
                let end = self.prev_span();
                Ok(Expr::new(ExprKind::Throw(value), start.to(end)))
            }
            TokenKind::KwNew => self.parse_new_expr(),
            TokenKind::KwBase => {
                self.advance();
                self.expect(TokenKind::LParen, "'('")?;
                let args = self.parse_call_args()?;
                let end = self.prev_span();
                Ok(Expr::new(ExprKind::BaseCall { args }, start.to(end)))
            }
            TokenKind::KwDo => self.parse_closure_expr(false),
            TokenKind::KwMove => {
                self.advance();
                self.expect(TokenKind::KwDo, "'do'")?;
                self.parse_closure_body(start, true)
            }
            TokenKind::KwLowlevel => self.parse_lowlevel_expr(),
            TokenKind::KwQuote => {
                self.advance();
                let body = Box::new(self.parse_block_expr()?);
                let end = self.prev_span();
                Ok(Expr::new(ExprKind::Quote(body), start.to(end)))
            }
            // `with { .. }` introduces an effect-handler block; no handler
            // semantics are implemented, so it is accepted syntactically
            // and type-checked as a plain block.
            TokenKind::KwWith => {
                self.advance();
                self.parse_block_expr()
            }
            TokenKind::Dollar => {
                self.advance();
                let name = self.expect_ident()?;
                let end = self.prev_span();
                Ok(Expr::new(
                    ExprKind::Splice(Box::new(Expr::new(ExprKind::Identifier(name), start.to(end)))),
                    start.to(end),
                ))
            }
            TokenKind::DollarBrace => {
                self.advance();
                let inner = Box::new(self.parse_expr()?);
                self.expect(TokenKind::RBrace, "'}'")?;
                let end = self.prev_span();
                Ok(Expr::new(ExprKind::Splice(inner), start.to(end)))
            }
            TokenKind::At => {
                let decorators = self.parse_decorators()?;
                let dec = decorators.into_iter().next().expect("parse_decorators checked '@'");
                let target = Box::new(self.parse_assignment()?);
                let end = self.prev_span();
                Ok(Expr::new(
                    ExprKind::Decorated {
                        name: dec.name,
                        args: dec.args,
                        target,
                    },
                    start.to(end),
                ))
            }

            _ => {
                let tok = self.peek().clone();
                Err(ParseError::new(
                    ParseErrorKind::ExpectedExpression,
                    format!("expected an expression, found '{}'", tok.lexeme),
                    tok.span,
                ))
            }
        }
    }

    /// True at a token that cannot start an expression, used to recognize
    /// the value-less forms of `return`/`break`.
    fn at_expr_end(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Newline
                | TokenKind::RBrace
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::Comma
                | TokenKind::Semi
                | TokenKind::Eof
        )
    }

    fn parse_literal_token(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek().span;
        let tok = self.advance();
        let lit = match tok.value {
            LiteralValue::Int { value, base, suffix } => LiteralPattern::Int { value, base, suffix },
            LiteralValue::Float { value, suffix } => LiteralPattern::Float { value, suffix },
            LiteralValue::Str(s) => LiteralPattern::Str(s),
            LiteralValue::Char(c) => LiteralPattern::Char(c),
            LiteralValue::Bool(b) => LiteralPattern::Bool(b),
            LiteralValue::Null | LiteralValue::None => LiteralPattern::Null,
        };
        Ok(Expr::new(ExprKind::Literal(lit), start))
    }

    fn parse_interp_string(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek().span;
        self.parse_interp_segments(
            TokenKind::InterpStringStart,
            TokenKind::InterpStringMiddle,
            TokenKind::InterpStringEnd,
            start,
            ExprKind::InterpString,
        )
    }

    fn parse_template_literal(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek().span;
        self.parse_interp_segments(
            TokenKind::TemplateLiteralStart,
            TokenKind::TemplateLiteralMiddle,
            TokenKind::TemplateLiteralEnd,
            start,
            ExprKind::TemplateLiteral,
        )
    }

    /// Shared machinery for interpolated strings and template literals: the
    /// lexer already splits the literal into `Start`/`Middle`*/`End` tokens
    /// around each embedded expression, so parsing is a loop consuming one
    /// literal-text token, one expression, one literal-text token, ...
    /// until an `End` token closes it.
    fn parse_interp_segments(
        &mut self,
        start_kind: TokenKind,
        middle_kind: TokenKind,
        end_kind: TokenKind,
        start: Span,
        build: fn(Vec<InterpSegment>) -> ExprKind,
    ) -> Result<Expr, ParseError> {
        let first = self.expect(start_kind, "interpolated literal")?;
        let first_text = match first.value {
            LiteralValue::Str(s) => s,
            _ => String::new(),
        };
        let mut segments = Vec::new();
        let mut pending_text = first_text;
        loop {
            let expr = self.parse_expr()?;
            if self.check(middle_kind) {
                let tok = self.advance();
                let text = match tok.value {
                    LiteralValue::Str(s) => s,
                    _ => String::new(),
                };
                segments.push(InterpSegment {
                    text: pending_text,
                    expr: Some(Box::new(expr)),
                });
                pending_text = text;
            } else {
                self.expect(end_kind, "end of interpolated literal")?;
                segments.push(InterpSegment {
                    text: pending_text,
                    expr: Some(Box::new(expr)),
                });
                break;
            }
        }
        let end = self.prev_span();
        Ok(Expr::new(build(segments), start.to(end)))
    }

    /// Disambiguates a bare identifier/path from a struct literal: `Name {
    /// .. }` is a struct literal unless the parser is inside a position
    /// that forbids it (an `if`/`while`/`for`/`when` condition).
    fn parse_ident_or_path_expr(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek().span;
        let mut path = vec![self.advance().lexeme];
        while self.check(TokenKind::ColonColon) {
            self.advance();
            path.push(self.expect_ident()?);
        }
        if self.check(TokenKind::LBrace) && self.no_struct_literal == 0 {
            return self.parse_struct_literal_tail(path, start);
        }
        let end = self.prev_span();
        if path.len() == 1 {
            Ok(Expr::new(ExprKind::Identifier(path.into_iter().next().unwrap()), start.to(end)))
        } else {
            Ok(Expr::new(ExprKind::Path(path), start.to(end)))
        }
    }

    fn parse_struct_literal_tail(&mut self, path: Vec<String>, start: Span) -> Result<Expr, ParseError> {
        self.expect(TokenKind::LBrace, "'{'")?;
        self.skip_newlines();
        let mut fields = Vec::new();
        let mut rest = None;
        if !self.check(TokenKind::RBrace) {
            loop {
                if self.match_kind(TokenKind::DotDot) {
                    rest = Some(Box::new(self.parse_expr()?));
                    break;
                }
                let fname = self.expect_ident()?;
                let value = if self.match_kind(TokenKind::Colon) {
                    self.parse_expr()?
                } else {
                    let span = self.prev_span();
                    Expr::new(ExprKind::Identifier(fname.clone()), span)
                };
                fields.push(StructFieldInit { name: fname, value });
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
                self.skip_newlines();
            }
        }
        self.skip_newlines();
        self.expect(TokenKind::RBrace, "'}'")?;
        let end = self.prev_span();
        Ok(Expr::new(
            ExprKind::StructLiteral { path, fields, rest },
            start.to(end),
        ))
    }

    fn parse_paren_or_tuple(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek().span;
        self.advance();
        self.skip_newlines();
        if self.match_kind(TokenKind::RParen) {
            let end = self.prev_span();
            return Ok(Expr::new(ExprKind::TupleLiteral(Vec::new()), start.to(end)));
        }
        let first = self.parse_expr()?;
        self.skip_newlines();
        if self.check(TokenKind::Comma) {
            let mut elements = vec![first];
            while self.match_kind(TokenKind::Comma) {
                self.skip_newlines();
                if self.check(TokenKind::RParen) {
                    break;
                }
                elements.push(self.parse_expr()?);
                self.skip_newlines();
            }
            self.expect(TokenKind::RParen, "')'")?;
            let end = self.prev_span();
            return Ok(Expr::new(ExprKind::TupleLiteral(elements), start.to(end)));
        }
        self.skip_newlines();
        self.expect(TokenKind::RParen, "')'")?;
        Ok(first)
    }

    fn parse_array_expr(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek().span;
        self.advance();
        self.skip_newlines();
        if self.match_kind(TokenKind::RBracket) {
            let end = self.prev_span();
            return Ok(Expr::new(ExprKind::ArrayLiteral(Vec::new()), start.to(end)));
        }
        let first = self.parse_expr()?;
        self.skip_newlines();
        if self.match_kind(TokenKind::Semi) {
            let count = Box::new(self.parse_expr()?);
            self.skip_newlines();
            self.expect(TokenKind::RBracket, "']'")?;
            let end = self.prev_span();
            return Ok(Expr::new(
                ExprKind::ArrayRepeat {
                    value: Box::new(first),
                    count,
                },
                start.to(end),
            ));
        }
        let mut elements = vec![first];
        while self.match_kind(TokenKind::Comma) {
            self.skip_newlines();
            if self.check(TokenKind::RBracket) {
                break;
            }
            elements.push(self.parse_expr()?);
            self.skip_newlines();
        }
        self.expect(TokenKind::RBracket, "']'")?;
        let end = self.prev_span();
        Ok(Expr::new(ExprKind::ArrayLiteral(elements), start.to(end)))
    }

    fn parse_if_expr(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek().span;
        self.expect(TokenKind::KwIf, "'if'")?;
        if self.check(TokenKind::KwLet) {
            return self.parse_if_let_tail(start);
        }
        self.no_struct_literal += 1;
        let cond = self.parse_expr();
        self.no_struct_literal -= 1;
        let cond = Box::new(cond?);
        self.skip_newlines();
        self.match_kind(TokenKind::KwThen);
        self.skip_newlines();
        let then_branch = Box::new(self.parse_block_expr()?);
        self.skip_newlines();
        let else_branch = if self.check(TokenKind::KwElse) {
            self.advance();
            self.skip_newlines();
            if self.check(TokenKind::KwIf) {
                Some(Box::new(self.parse_if_expr()?))
            } else {
                Some(Box::new(self.parse_block_expr()?))
            }
        } else {
            None
        };
        let end = self.prev_span();
        Ok(Expr::new(
            ExprKind::If { cond, then_branch, else_branch },
            start.to(end),
        ))
    }

    fn parse_if_let_tail(&mut self, start: Span) -> Result<Expr, ParseError> {
        self.expect(TokenKind::KwLet, "'let'")?;
        let pattern = self.parse_pattern()?;
        self.expect(TokenKind::Assign, "'='")?;
        self.no_struct_literal += 1;
        let scrutinee = self.parse_expr();
        self.no_struct_literal -= 1;
        let scrutinee = Box::new(scrutinee?);
        self.skip_newlines();
        let then_branch = Box::new(self.parse_block_expr()?);
        self.skip_newlines();
        let else_branch = if self.check(TokenKind::KwElse) {
            self.advance();
            self.skip_newlines();
            Some(Box::new(self.parse_block_expr()?))
        } else {
            None
        };
        let end = self.prev_span();
        Ok(Expr::new(
            ExprKind::IfLet {
                pattern,
                scrutinee,
                then_branch,
                else_branch,
            },
            start.to(end),
        ))
    }

    fn parse_when_expr(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek().span;
        self.expect(TokenKind::KwWhen, "'when'")?;
        self.no_struct_literal += 1;
        let scrutinee = self.parse_expr();
        self.no_struct_literal -= 1;
        let scrutinee = Box::new(scrutinee?);
        self.skip_newlines();
        self.expect(TokenKind::LBrace, "'{'")?;
        self.skip_newlines();
        let mut arms = Vec::new();
        while !self.check(TokenKind::RBrace) {
            let pattern = self.parse_pattern()?;
            let guard = if self.match_kind(TokenKind::KwIf) {
                Some(Box::new(self.parse_expr()?))
            } else {
                None
            };
            self.expect(TokenKind::FatArrow, "'=>'")?;
            self.skip_newlines();
            let body = Box::new(self.parse_expr()?);
            arms.push(MatchArm { pattern, guard, body });
            if !self.match_kind(TokenKind::Comma) {
                self.skip_newlines();
            }
            self.skip_newlines();
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        let end = self.prev_span();
        Ok(Expr::new(ExprKind::When { scrutinee, arms }, start.to(end)))
    }

    fn parse_loop_label(&mut self) -> Option<String> {
        if self.check(TokenKind::At) {
            self.advance();
            self.expect_ident().ok()
        } else {
            None
        }
    }

    fn parse_loop_expr(&mut self, label: Option<String>) -> Result<Expr, ParseError> {
        let start = self.peek().span;
        self.expect(TokenKind::KwLoop, "'loop'")?;
        let label = label.or_else(|| self.parse_loop_label());
        self.skip_newlines();
        let body = Box::new(self.parse_block_expr()?);
        let end = self.prev_span();
        Ok(Expr::new(ExprKind::Loop { body, label }, start.to(end)))
    }

    fn parse_while_expr(&mut self, label: Option<String>) -> Result<Expr, ParseError> {
        let start = self.peek().span;
        self.expect(TokenKind::KwWhile, "'while'")?;
        let label = label.or_else(|| self.parse_loop_label());
        self.no_struct_literal += 1;
        let cond = self.parse_expr();
        self.no_struct_literal -= 1;
        let cond = Box::new(cond?);
        self.skip_newlines();
        let body = Box::new(self.parse_block_expr()?);
        let end = self.prev_span();
        Ok(Expr::new(ExprKind::While { cond, body, label }, start.to(end)))
    }

    fn parse_for_expr(&mut self, label: Option<String>) -> Result<Expr, ParseError> {
        let start = self.peek().span;
        self.expect(TokenKind::KwFor, "'for'")?;
        let label = label.or_else(|| self.parse_loop_label());
        let pattern = self.parse_pattern()?;
        self.expect(TokenKind::KwIn, "'in'")?;
        self.no_struct_literal += 1;
        let iterable = self.parse_expr();
        self.no_struct_literal -= 1;
        let iterable = Box::new(iterable?);
        self.skip_newlines();
        let body = Box::new(self.parse_block_expr()?);
        let end = self.prev_span();
        Ok(Expr::new(
            ExprKind::For { pattern, iterable, body, label },
            start.to(end),
        ))
    }

    fn parse_new_expr(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek().span;
        self.expect(TokenKind::KwNew, "'new'")?;
        let ty = self.parse_type()?;
        self.expect(TokenKind::LParen, "'('")?;
        let args = self.parse_call_args()?;
        let end = self.prev_span();
        Ok(Expr::new(ExprKind::New { ty, args }, start.to(end)))
    }

    /// `do(params) [-> Type] expr`; `move` has already been consumed by the
    /// caller when present.
    fn parse_closure_expr(&mut self, is_move: bool) -> Result<Expr, ParseError> {
        let start = self.peek().span;
        self.parse_closure_body(start, is_move)
    }

    fn parse_closure_body(&mut self, start: Span, is_move: bool) -> Result<Expr, ParseError> {
        self.expect(TokenKind::KwDo, "'do'")?;
        let is_async = self.match_kind(TokenKind::KwAsync);
        self.expect(TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let pattern = self.parse_pattern()?;
                let ty = if self.match_kind(TokenKind::Colon) {
                    Some(self.parse_type()?)
                } else {
                    None
                };
                params.push(ClosureParam { pattern, ty });
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
        self.skip_newlines();
        let body = Box::new(self.parse_expr()?);
        let end = self.prev_span();
        Ok(Expr::new(
            ExprKind::Closure {
                params,
                ret,
                body,
                is_move,
                is_async,
            },
            start.to(end),
        ))
    }

    /// `lowlevel { .. }` (alias `unsafe { .. }`): both surface spellings
    /// lex to the same [`TokenKind::KwLowlevel`].
    fn parse_lowlevel_expr(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek().span;
        self.expect(TokenKind::KwLowlevel, "'lowlevel'")?;
        self.skip_newlines();
        self.expect(TokenKind::LBrace, "'{'")?;
        self.skip_newlines();
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) {
            match self.parse_stmt_or_tail()? {
                StmtOrTail::Stmt(s) => stmts.push(s),
                StmtOrTail::Tail(e) => {
                    let span = e.span;
                    stmts.push(Stmt::new(StmtKind::Expr { expr: e, has_semi: false }, span));
                    break;
                }
            }
            self.skip_newlines();
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        let end = self.prev_span();
        Ok(Expr::new(ExprKind::Lowlevel(stmts), start.to(end)))
    }
}

enum StmtOrTail {
    Stmt(Stmt),
    Tail(Expr),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::exprs::ExprKind;
    use crate::lexer::tokenize;
    use crate::source::Source;

    fn parse_expr(src: &str) -> Expr {
        let source = Source::new("t.tml", src.to_string());
        let (tokens, lex_errors) = tokenize(&source);
        assert!(lex_errors.is_empty(), "unexpected lex errors: {:?}", lex_errors);
        let mut parser = Parser::new(tokens);
        let expr = parser.parse_expr().expect("expression should parse");
        assert!(parser.is_at_end() || parser.check(TokenKind::Newline) || parser.check(TokenKind::Eof));
        expr
    }

    #[test]
    fn precedence_climbs_multiplicative_over_additive() {
        let expr = parse_expr("1 + 2 * 3");
        match expr.kind {
            ExprKind::Binary { op: BinaryOp::Add, rhs, .. } => {
                assert!(matches!(rhs.kind, ExprKind::Binary { op: BinaryOp::Mul, .. }));
            }
            other => panic!("expected addition at the top, got {:?}", other),
        }
    }

    #[test]
    fn assignment_is_right_associative() {
        let expr = parse_expr("a = b = 1");
        match expr.kind {
            ExprKind::Assign { value, .. } => {
                assert!(matches!(value.kind, ExprKind::Assign { .. }));
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn method_call_chains_with_field_access() {
        let expr = parse_expr("a.b.c(1, 2)");
        match expr.kind {
            ExprKind::MethodCall { method, args, .. } => {
                assert_eq!(method, "c");
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected a method call, got {:?}", other),
        }
    }

    #[test]
    fn interpolated_string_pairs_segments_with_embedded_exprs() {
        let expr = parse_expr("\"total: {n}!\"");
        match expr.kind {
            ExprKind::InterpString(segs) => {
                assert_eq!(segs.len(), 1);
                assert_eq!(segs[0].text, "total: ");
                assert!(matches!(
                    segs[0].expr.as_deref().unwrap().kind,
                    ExprKind::Identifier(ref n) if n == "n"
                ));
            }
            other => panic!("expected an interpolated string, got {:?}", other),
        }
    }

    #[test]
    fn try_operator_wraps_its_operand() {
        let expr = parse_expr("might_fail()!");
        assert!(matches!(expr.kind, ExprKind::Try(_)));
    }

    #[test]
    fn closure_parses_params_and_body() {
        let expr = parse_expr("do(x, y) x + y");
        match expr.kind {
            ExprKind::Closure { params, is_move, .. } => {
                assert_eq!(params.len(), 2);
                assert!(!is_move);
            }
            other => panic!("expected a closure, got {:?}", other),
        }
    }

    #[test]
    fn range_accepts_keyword_and_symbolic_forms() {
        let kw = parse_expr("0 to 10");
        let sym = parse_expr("0..10");
        assert!(matches!(kw.kind, ExprKind::Range { inclusive: false, .. }));
        assert!(matches!(sym.kind, ExprKind::Range { inclusive: false, .. }));
    }
}
