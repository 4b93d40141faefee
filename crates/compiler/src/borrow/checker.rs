//! The borrow checker. Runs once per function body, after
//! type checking, walking statements and expressions in program order and
//! threading a [`PlaceEnv`] that tracks each local's ownership state.
//!
//! Move/borrow analysis here works directly off the AST rather than a
//! fully resolved, typed tree: whether a place is `Copy` is decided from
//! its syntactic type annotation (see [`is_copy_type_node`]) rather than
//! the semantic `Type` the checker resolves, since annotations are
//! required at every binding this pass needs to reason about (`T011`
//! already flags the omissions). Places with no annotation default to
//! `Move`, the conservative choice describes for "everything
//! else".

use crate::ast::decls::FuncDecl;
use crate::ast::exprs::{Expr, ExprKind, UnaryOp};
use crate::ast::patterns::{Pattern, PatternKind};
use crate::ast::stmts::{Stmt, StmtKind};
use crate::ast::types::{TypeKind, TypeNode};
use crate::source::Span;

use super::error::{BorrowError, BorrowErrorKind};
use super::place::{BorrowKind, Location, OwnershipState, PlaceEnv, PlaceId};

fn is_copy_type_node(ty: &TypeNode) -> bool {
    match &ty.kind {
        TypeKind::Reference { .. } | TypeKind::Pointer { .. } => true,
        TypeKind::Named { path, .. } => matches!(
            path.last().map(String::as_str),
            Some(
                "I8" | "I16"
                    | "I32"
                    | "I64"
                    | "I128"
                    | "U8"
                    | "U16"
                    | "U32"
                    | "U64"
                    | "U128"
                    | "F32"
                    | "F64"
                    | "Bool"
                    | "Char"
                    | "Unit"
            )
        ),
        _ => false,
    }
}

pub struct BorrowChecker {
    env: PlaceEnv,
    errors: Vec<BorrowError>,
    current_stmt: usize,
    loop_depth: u32,
    two_phase_borrow_active: bool,
    /// Whether the expression currently being visited is in a
    /// value-consuming position (moves a bare identifier) or a
    /// place-context position (field/index base, method receiver, borrow
    /// operand, assignment target — used but not moved).
    consuming: bool,
}

impl BorrowChecker {
    pub fn new() -> Self {
        BorrowChecker {
            env: PlaceEnv::new(),
            errors: Vec::new(),
            current_stmt: 0,
            loop_depth: 0,
            two_phase_borrow_active: false,
            consuming: true,
        }
    }

    pub fn check_function(&mut self, func: &FuncDecl) -> Vec<BorrowError> {
        self.env.push_scope();
        for param in &func.sig.params {
            let loc = self.loc(param.span);
            let is_copy = is_copy_type_node(&param.ty);
            self.env.define(&param.name, false, is_copy, loc);
        }
        if let Some(body) = &func.body {
            self.check_expr(body);
        }
        self.drop_scope_places(func.span);
        self.env.pop_scope();
        std::mem::take(&mut self.errors)
    }

    fn loc(&self, span: Span) -> Location {
        Location {
            statement_index: self.current_stmt,
            span,
        }
    }

    fn error(&mut self, kind: BorrowErrorKind, message: impl Into<String>, span: Span) {
        self.errors.push(BorrowError::new(kind, message, span));
    }

    fn error_with_related(
        &mut self,
        kind: BorrowErrorKind,
        message: impl Into<String>,
        span: Span,
        related_message: impl Into<String>,
        related_span: Span,
    ) {
        self.errors.push(
            BorrowError::new(kind, message, span).with_related(related_message, related_span),
        );
    }

    // --- statements -----------------------------------------------------

    fn check_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Let { name, ty, value } => self.check_let(name, ty.as_ref(), value, false, stmt.span),
            StmtKind::Var { name, ty, value } => self.check_let(name, ty.as_ref(), value, true, stmt.span),
            StmtKind::Expr { expr, .. } => self.check_expr(expr),
            StmtKind::Decl(_) => {}
        }
        self.current_stmt += 1;
    }

    /// `let`/`var name[: Type] = value`: the initializer is checked (and,
    /// if it is a bare identifier, moved) before the new place is defined
    /// — so `let x = x` on a shadowed name still resolves against the
    /// *previous* binding.
    fn check_let(&mut self, name: &str, ty: Option<&TypeNode>, value: &Expr, is_mutable: bool, span: Span) {
        self.consume(value);
        let is_copy = ty.map(is_copy_type_node).unwrap_or(false);
        let loc = self.loc(span);
        self.env.define(name, is_mutable, is_copy, loc);
    }

    // --- expressions ------------------------------------------------------

    /// Visits `expr` in a value-consuming position: saves/restores the
    /// `consuming` flag around the recursive walk so callers that visit a
    /// mix of consuming and place-context subexpressions (e.g. a method
    /// call's receiver vs. its arguments) compose correctly.
    fn consume(&mut self, expr: &Expr) {
        let prev = self.consuming;
        self.consuming = true;
        self.check_expr(expr);
        self.consuming = prev;
    }

    fn use_only(&mut self, expr: &Expr) {
        let prev = self.consuming;
        self.consuming = false;
        self.check_expr(expr);
        self.consuming = prev;
    }

    fn check_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Literal(_) => {}
            ExprKind::Identifier(name) => self.visit_identifier(name, expr.span),
            ExprKind::Path(_) => {}

            ExprKind::Unary { op, operand } => self.check_unary(*op, operand, expr.span),
            ExprKind::PostfixIncr { operand, .. } => self.check_mutating_operand(operand),
            ExprKind::Binary { lhs, rhs, .. } => {
                self.consume(lhs);
                self.consume(rhs);
            }
            ExprKind::Assign { target, value, .. } => {
                self.check_assign_target(target);
                self.consume(value);
            }

            ExprKind::Call { callee, args } => {
                self.use_only(callee);
                for arg in args {
                    self.consume(arg);
                }
            }
            ExprKind::MethodCall { receiver, args, .. } => {
                self.two_phase_borrow_active = true;
                self.use_only(receiver);
                for arg in args {
                    self.consume(arg);
                }
                self.two_phase_borrow_active = false;
            }
            ExprKind::New { args, .. } => {
                for arg in args {
                    self.consume(arg);
                }
            }
            ExprKind::BaseCall { args } => {
                for arg in args {
                    self.consume(arg);
                }
            }

            ExprKind::Field { receiver, .. } => self.use_only(receiver),
            ExprKind::Index { receiver, index } => {
                self.use_only(receiver);
                self.consume(index);
            }

            ExprKind::StructLiteral { fields, rest, .. } => {
                for field in fields {
                    self.consume(&field.value);
                }
                if let Some(rest) = rest {
                    self.consume(rest);
                }
            }
            ExprKind::TupleLiteral(elements) | ExprKind::ArrayLiteral(elements) => {
                for e in elements {
                    self.consume(e);
                }
            }
            ExprKind::ArrayRepeat { value, count } => {
                self.consume(value);
                self.consume(count);
            }

            ExprKind::Block { stmts, tail } => self.check_block(stmts, tail.as_deref(), expr.span),

            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.consume(cond);
                self.check_branches(
                    std::iter::once(then_branch.as_ref()).chain(else_branch.as_deref()),
                );
            }
            ExprKind::IfLet {
                pattern,
                scrutinee,
                then_branch,
                else_branch,
            } => {
                self.use_only(scrutinee);
                self.env.push_scope();
                self.define_pattern(pattern);
                self.check_expr(then_branch);
                self.drop_scope_places(expr.span);
                self.env.pop_scope();
                if let Some(else_branch) = else_branch {
                    self.check_expr(else_branch);
                }
            }
            ExprKind::Ternary {
                cond,
                then_value,
                else_value,
            } => {
                self.consume(cond);
                self.check_branches([then_value.as_ref(), else_value.as_ref()].into_iter());
            }
            ExprKind::When { scrutinee, arms } => {
                self.use_only(scrutinee);
                let mut branch_states = Vec::with_capacity(arms.len());
                for arm in arms {
                    let snapshot = self.env.snapshot_states();
                    self.env.push_scope();
                    self.define_pattern(&arm.pattern);
                    if let Some(guard) = &arm.guard {
                        self.consume(guard);
                    }
                    self.check_expr(&arm.body);
                    self.drop_scope_places(expr.span);
                    self.env.pop_scope();
                    branch_states.push(self.env.snapshot_states());
                    self.env.restore_states(&snapshot);
                }
                self.env.merge_branch_states(&branch_states);
            }

            ExprKind::Loop { body, .. } => self.check_loop_body(body, expr.span),
            ExprKind::While { cond, body, .. } => {
                self.consume(cond);
                self.check_loop_body(body, expr.span);
            }
            ExprKind::For {
                pattern,
                iterable,
                body,
                ..
            } => {
                self.consume(iterable);
                self.loop_depth += 1;
                self.env.push_scope();
                self.define_pattern(pattern);
                self.check_expr(body);
                self.drop_scope_places(expr.span);
                self.env.pop_scope();
                self.loop_depth -= 1;
            }

            ExprKind::Return(value) => {
                if let Some(value) = value {
                    self.consume(value);
                }
            }
            ExprKind::Break { value, .. } => {
                if let Some(value) = value {
                    self.consume(value);
                }
            }
            ExprKind::Continue { .. } => {}
            ExprKind::Throw(value) => self.consume(value),

            ExprKind::Closure { params, body, .. } => {
                self.env.push_scope();
                for param in params {
                    self.define_pattern(&param.pattern);
                }
                self.check_expr(body);
                self.drop_scope_places(expr.span);
                self.env.pop_scope();
            }

            ExprKind::Cast { expr: inner, .. } | ExprKind::TypeCheck { expr: inner, .. } => {
                self.consume(inner);
            }

            ExprKind::Range { lo, hi, .. } => {
                if let Some(lo) = lo {
                    self.consume(lo);
                }
                if let Some(hi) = hi {
                    self.consume(hi);
                }
            }

            ExprKind::Try(inner) => self.consume(inner),

            ExprKind::InterpString(segments) | ExprKind::TemplateLiteral(segments) => {
                for seg in segments {
                    if let Some(e) = &seg.expr {
                        self.consume(e);
                    }
                }
            }

            ExprKind::Lowlevel(stmts) => {
                self.env.push_scope();
                for stmt in stmts {
                    self.check_stmt(stmt);
                }
                self.drop_scope_places(expr.span);
                self.env.pop_scope();
            }

            ExprKind::Await(inner) => self.consume(inner),

            ExprKind::Decorated { args, target, .. } => {
                for arg in args {
                    self.consume(arg);
                }
                self.consume(target);
            }
        }
    }

    fn visit_identifier(&mut self, name: &str, span: Span) {
        let Some(id) = self.env.lookup(name) else {
            // Not a tracked local (function name, constant, unknown — left
            // to the type checker).
            return;
        };
        let loc = self.loc(span);
        self.check_can_use(id, loc);
        self.env.mark_used(id, loc);
        if self.consuming && !self.env.get(id).is_copy {
            self.move_value(id, loc);
        }
    }

    fn check_unary(&mut self, op: UnaryOp, operand: &Expr, span: Span) {
        match op {
            UnaryOp::Ref | UnaryOp::RefMut => {
                if let ExprKind::Identifier(name) = &operand.kind {
                    if let Some(id) = self.env.lookup(name) {
                        let kind = if op == UnaryOp::RefMut {
                            BorrowKind::Mutable
                        } else {
                            BorrowKind::Shared
                        };
                        let loc = self.loc(span);
                        self.check_can_borrow(id, kind, loc);
                        self.create_borrow(id, kind, loc);
                    }
                } else {
                    self.use_only(operand);
                }
            }
            UnaryOp::PreIncr | UnaryOp::PreDecr => self.check_mutating_operand(operand),
            UnaryOp::Neg | UnaryOp::Not | UnaryOp::BitNot | UnaryOp::Deref => self.consume(operand),
        }
    }

    fn check_mutating_operand(&mut self, operand: &Expr) {
        if let ExprKind::Identifier(name) = &operand.kind {
            if let Some(id) = self.env.lookup(name) {
                let loc = self.loc(operand.span);
                self.check_can_mutate(id, loc);
                self.env.mark_used(id, loc);
            }
        } else {
            self.use_only(operand);
        }
    }

    fn check_assign_target(&mut self, target: &Expr) {
        match &target.kind {
            ExprKind::Identifier(name) => {
                if let Some(id) = self.env.lookup(name) {
                    let loc = self.loc(target.span);
                    self.check_can_mutate(id, loc);
                    self.env.mark_used(id, loc);
                }
            }
            ExprKind::Field { receiver, .. } | ExprKind::Index { receiver, .. } => {
                self.use_only(receiver);
            }
            _ => self.use_only(target),
        }
    }

    fn check_block(&mut self, stmts: &[Stmt], tail: Option<&Expr>, span: Span) {
        self.env.push_scope();
        for stmt in stmts {
            self.check_stmt(stmt);
        }
        if let Some(tail) = tail {
            self.check_expr(tail);
        }
        self.drop_scope_places(span);
        self.env.pop_scope();
    }

    /// Checks each branch from an identical starting snapshot, then merges
    /// their resulting ownership states: a place moved on some branch must
    /// be moved on all branches.
    fn check_branches<'a>(&mut self, branches: impl Iterator<Item = &'a Expr>) {
        let entry = self.env.snapshot_states();
        let mut branch_states = Vec::new();
        for branch in branches {
            self.env.restore_states(&entry);
            self.check_expr(branch);
            branch_states.push(self.env.snapshot_states());
        }
        self.env.restore_states(&entry);
        self.env.merge_branch_states(&branch_states);
    }

    /// A loop body is checked once in program order; full fixpoint
    /// analysis across iterations and break-point join states is not
    /// attempted, matching the single-pass
    /// traversal depth this pass otherwise maintains.
    fn check_loop_body(&mut self, body: &Expr, span: Span) {
        self.loop_depth += 1;
        self.env.push_scope();
        self.check_expr(body);
        self.drop_scope_places(span);
        self.env.pop_scope();
        self.loop_depth -= 1;
    }

    fn define_pattern(&mut self, pattern: &Pattern) {
        match &pattern.kind {
            PatternKind::Wildcard | PatternKind::Literal(_) => {}
            PatternKind::Ident {
                name,
                mutable,
                sub_pattern,
            } => {
                let loc = self.loc(pattern.span);
                self.env.define(name, *mutable, false, loc);
                if let Some(sub) = sub_pattern {
                    self.define_pattern(sub);
                }
            }
            PatternKind::Tuple(elements) | PatternKind::Or(elements) => {
                for p in elements {
                    self.define_pattern(p);
                }
            }
            PatternKind::Struct { fields, .. } => {
                for (_, p) in fields {
                    self.define_pattern(p);
                }
            }
            PatternKind::EnumVariant { payload, .. } => {
                for p in payload {
                    self.define_pattern(p);
                }
            }
            PatternKind::Range { lo, hi, .. } => {
                self.define_pattern(lo);
                self.define_pattern(hi);
            }
            PatternKind::Array { elements, rest } => {
                for p in elements {
                    self.define_pattern(p);
                }
                if let Some(rest) = rest {
                    if let Some(name) = &rest.name {
                        let loc = self.loc(pattern.span);
                        self.env.define(name, false, false, loc);
                    }
                }
            }
            PatternKind::Typed { inner, ty } => {
                if let PatternKind::Ident { name, mutable, .. } = &inner.kind {
                    let loc = self.loc(pattern.span);
                    self.env.define(name, *mutable, is_copy_type_node(ty), loc);
                } else {
                    self.define_pattern(inner);
                }
            }
        }
    }

    // --- ownership/borrow operations -------------------------------------

    fn create_borrow(&mut self, id: PlaceId, kind: BorrowKind, loc: Location) {
        let lifetime_id = self.env.next_lifetime_id();
        let scope_depth = self.env.scope_depth();
        let place = self.env.get_mut(id);
        place.active_borrows.push(super::place::Borrow {
            kind,
            start: loc,
            end: None,
            scope_depth,
            lifetime_id,
        });
        place.state = if kind == BorrowKind::Mutable {
            OwnershipState::MutBorrowed
        } else if place.state == OwnershipState::Owned {
            OwnershipState::Borrowed
        } else {
            place.state
        };
    }

    fn move_value(&mut self, id: PlaceId, loc: Location) {
        let place = self.env.get(id);
        let name = place.name.clone();
        let def_span = place.definition.span;
        match place.state {
            OwnershipState::Moved => {
                self.error_with_related(
                    BorrowErrorKind::MoveAfterMove,
                    format!("use of moved value: `{name}`"),
                    loc.span,
                    "value moved here",
                    def_span,
                );
                return;
            }
            OwnershipState::Borrowed | OwnershipState::MutBorrowed => {
                self.error(
                    BorrowErrorKind::BorrowedDuringMove,
                    format!("cannot move out of `{name}` because it is borrowed"),
                    loc.span,
                );
                return;
            }
            _ => {}
        }
        self.env.get_mut(id).state = OwnershipState::Moved;
    }

    fn check_can_use(&mut self, id: PlaceId, loc: Location) {
        let place = self.env.get(id);
        let name = place.name.clone();
        match place.state {
            OwnershipState::Moved => self.error(
                BorrowErrorKind::UseOfMoved,
                format!("use of moved value: `{name}`"),
                loc.span,
            ),
            OwnershipState::Dropped => self.error(
                BorrowErrorKind::UseAfterDrop,
                format!("use of dropped value: `{name}`"),
                loc.span,
            ),
            _ => {}
        }
    }

    fn check_can_mutate(&mut self, id: PlaceId, loc: Location) {
        let place = self.env.get(id);
        let name = place.name.clone();
        if !place.is_mutable {
            self.error(
                BorrowErrorKind::MutateWhileBorrowed,
                format!("cannot assign to `{name}` because it is not mutable"),
                loc.span,
            );
            return;
        }
        match place.state {
            OwnershipState::Moved => self.error(
                BorrowErrorKind::UseOfMoved,
                format!("cannot assign to moved value: `{name}`"),
                loc.span,
            ),
            OwnershipState::Borrowed => self.error(
                BorrowErrorKind::MutateWhileBorrowed,
                format!("cannot assign to `{name}` because it is borrowed"),
                loc.span,
            ),
            OwnershipState::MutBorrowed => self.error(
                BorrowErrorKind::MutateWhileBorrowed,
                format!("cannot assign to `{name}` because it is mutably borrowed"),
                loc.span,
            ),
            _ => {}
        }
    }

    fn check_can_borrow(&mut self, id: PlaceId, kind: BorrowKind, loc: Location) {
        let place = self.env.get(id);
        let name = place.name.clone();
        if place.state == OwnershipState::Moved {
            self.error(
                BorrowErrorKind::UseOfMoved,
                format!("cannot borrow moved value: `{name}`"),
                loc.span,
            );
            return;
        }
        let is_reborrow = place.is_reborrow();
        match kind {
            BorrowKind::Mutable => {
                if !place.is_mutable && !is_reborrow {
                    self.error(
                        BorrowErrorKind::ConflictingMutableBorrow,
                        format!("cannot borrow `{name}` as mutable because it is not declared as mutable"),
                        loc.span,
                    );
                    return;
                }
                if is_reborrow && place.borrowed_from.map(|(_, k)| k) == Some(BorrowKind::Shared) {
                    self.error(
                        BorrowErrorKind::ReborrowFromImmutableAsMutable,
                        format!("cannot reborrow `{name}` as mutable because it was borrowed as immutable"),
                        loc.span,
                    );
                    return;
                }
                if place.state == OwnershipState::Borrowed && !is_reborrow {
                    self.error(
                        BorrowErrorKind::SharedWhileMutablyBorrowed,
                        format!("cannot borrow `{name}` as mutable because it is also borrowed as immutable"),
                        loc.span,
                    );
                    return;
                }
                if place.state == OwnershipState::MutBorrowed && !self.two_phase_borrow_active {
                    self.error(
                        BorrowErrorKind::ConflictingMutableBorrow,
                        format!("cannot borrow `{name}` as mutable more than once at a time"),
                        loc.span,
                    );
                }
            }
            BorrowKind::Shared => {
                if place.state == OwnershipState::MutBorrowed && !is_reborrow && !self.two_phase_borrow_active {
                    self.error(
                        BorrowErrorKind::SharedWhileMutablyBorrowed,
                        format!("cannot borrow `{name}` as immutable because it is also borrowed as mutable"),
                        loc.span,
                    );
                }
            }
        }
    }

    /// Releases borrows created at the current scope depth, then drops
    /// every place defined directly in it.
    fn drop_scope_places(&mut self, span: Span) {
        let loc = self.loc(span);
        self.env.release_borrows_at_depth(self.env.scope_depth(), loc);
        for id in self.env.pop_scope() {
            self.env.get_mut(id).state = OwnershipState::Dropped;
        }
        self.env.push_scope();
    }
}

impl Default for BorrowChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::decls::{FuncParam, FuncSignature, Visibility};
    use crate::ast::exprs::LiteralPattern;
    use crate::lexer::IntBase;

    fn int_ty() -> TypeNode {
        TypeNode::new(
            TypeKind::Named {
                path: vec!["I32".into()],
                generics: vec![],
                const_args: vec![],
            },
            Span::at(0),
        )
    }

    fn string_ty() -> TypeNode {
        TypeNode::new(
            TypeKind::Named {
                path: vec!["Str".into()],
                generics: vec![],
                const_args: vec![],
            },
            Span::at(0),
        )
    }

    fn ident(name: &str) -> Expr {
        Expr::new(ExprKind::Identifier(name.into()), Span::at(0))
    }

    fn int_lit(n: i128) -> Expr {
        Expr::new(
            ExprKind::Literal(LiteralPattern::Int {
                value: n,
                base: IntBase::Decimal,
                suffix: None,
            }),
            Span::at(0),
        )
    }

    fn func_with_body(body: Expr) -> FuncDecl {
        FuncDecl {
            sig: FuncSignature {
                name: "f".into(),
                generics: vec![],
                const_generics: vec![],
                params: vec![],
                ret: None,
                where_clauses: vec![],
                is_async: false,
                is_lowlevel: false,
            },
            body: Some(body),
            visibility: Visibility::Public,
            decorators: vec![],
            span: Span::at(0),
        }
    }

    #[test]
    fn use_after_move_is_reported() {
        let block = Expr::new(
            ExprKind::Block {
                stmts: vec![
                    Stmt::new(
                        StmtKind::Let {
                            name: "a".into(),
                            ty: Some(string_ty()),
                            value: Expr::new(ExprKind::Literal(LiteralPattern::Str("hi".into())), Span::at(0)),
                        },
                        Span::at(0),
                    ),
                    Stmt::new(
                        StmtKind::Let {
                            name: "b".into(),
                            ty: Some(string_ty()),
                            value: ident("a"),
                        },
                        Span::at(1),
                    ),
                    Stmt::new(
                        StmtKind::Expr {
                            expr: ident("a"),
                            has_semi: true,
                        },
                        Span::at(2),
                    ),
                ],
                tail: None,
            },
            Span::at(0),
        );
        let func = func_with_body(block);
        let mut checker = BorrowChecker::new();
        let errors = checker.check_function(&func);
        assert!(errors.iter().any(|e| e.kind.code() == "B002"));
    }

    #[test]
    fn copy_types_are_never_moved() {
        let block = Expr::new(
            ExprKind::Block {
                stmts: vec![
                    Stmt::new(
                        StmtKind::Let {
                            name: "a".into(),
                            ty: Some(int_ty()),
                            value: int_lit(1),
                        },
                        Span::at(0),
                    ),
                    Stmt::new(
                        StmtKind::Let {
                            name: "b".into(),
                            ty: Some(int_ty()),
                            value: ident("a"),
                        },
                        Span::at(1),
                    ),
                ],
                tail: Some(Box::new(ident("a"))),
            },
            Span::at(0),
        );
        let func = func_with_body(block);
        let mut checker = BorrowChecker::new();
        let errors = checker.check_function(&func);
        assert!(errors.is_empty());
    }

    #[test]
    fn assigning_to_immutable_let_is_an_error() {
        let block = Expr::new(
            ExprKind::Block {
                stmts: vec![
                    Stmt::new(
                        StmtKind::Let {
                            name: "a".into(),
                            ty: Some(int_ty()),
                            value: int_lit(1),
                        },
                        Span::at(0),
                    ),
                    Stmt::new(
                        StmtKind::Expr {
                            expr: Expr::new(
                                ExprKind::Assign {
                                    op: crate::ast::exprs::AssignOp::Assign,
                                    target: Box::new(ident("a")),
                                    value: Box::new(int_lit(2)),
                                },
                                Span::at(1),
                            ),
                            has_semi: true,
                        },
                        Span::at(1),
                    ),
                ],
                tail: None,
            },
            Span::at(0),
        );
        let func = func_with_body(block);
        let mut checker = BorrowChecker::new();
        let errors = checker.check_function(&func);
        assert!(errors.iter().any(|e| e.kind.code() == "B005"));
    }

    #[test]
    fn double_mutable_borrow_conflicts() {
        let block = Expr::new(
            ExprKind::Block {
                stmts: vec![
                    Stmt::new(
                        StmtKind::Var {
                            name: "a".into(),
                            ty: Some(int_ty()),
                            value: int_lit(1),
                        },
                        Span::at(0),
                    ),
                    Stmt::new(
                        StmtKind::Let {
                            name: "r1".into(),
                            ty: None,
                            value: Expr::new(
                                ExprKind::Unary {
                                    op: UnaryOp::RefMut,
                                    operand: Box::new(ident("a")),
                                },
                                Span::at(1),
                            ),
                        },
                        Span::at(1),
                    ),
                    Stmt::new(
                        StmtKind::Let {
                            name: "r2".into(),
                            ty: None,
                            value: Expr::new(
                                ExprKind::Unary {
                                    op: UnaryOp::RefMut,
                                    operand: Box::new(ident("a")),
                                },
                                Span::at(2),
                            ),
                        },
                        Span::at(2),
                    ),
                ],
                tail: None,
            },
            Span::at(0),
        );
        let func = func_with_body(block);
        let mut checker = BorrowChecker::new();
        let errors = checker.check_function(&func);
        assert!(errors.iter().any(|e| e.kind.code() == "B006"));
    }

    #[test]
    fn param_unused_helper_is_well_formed() {
        let _ = FuncParam {
            name: "x".into(),
            ty: int_ty(),
            span: Span::at(0),
        };
    }

    fn list_ty() -> TypeNode {
        TypeNode::new(
            TypeKind::Named {
                path: vec!["List".into()],
                generics: vec![int_ty()],
                const_args: vec![],
            },
            Span::at(0),
        )
    }

    /// `v.push(v.len())` -- the two-phase-borrow flag set around a method
    /// call's receiver/argument evaluation must let the implicit mutable
    /// borrow `push` takes on `v` coexist with the shared use `v.len()`
    /// makes in the argument list.
    #[test]
    fn two_phase_borrow_allows_push_of_own_len() {
        let push_call = Expr::new(
            ExprKind::MethodCall {
                receiver: Box::new(ident("v")),
                method: "push".into(),
                type_args: vec![],
                args: vec![Expr::new(
                    ExprKind::MethodCall {
                        receiver: Box::new(ident("v")),
                        method: "len".into(),
                        type_args: vec![],
                        args: vec![],
                    },
                    Span::at(1),
                )],
            },
            Span::at(1),
        );
        let block = Expr::new(
            ExprKind::Block {
                stmts: vec![
                    Stmt::new(
                        StmtKind::Var {
                            name: "v".into(),
                            ty: Some(list_ty()),
                            value: ident("empty_list"),
                        },
                        Span::at(0),
                    ),
                    Stmt::new(
                        StmtKind::Expr {
                            expr: push_call,
                            has_semi: true,
                        },
                        Span::at(1),
                    ),
                ],
                tail: None,
            },
            Span::at(0),
        );
        let func = func_with_body(block);
        let mut checker = BorrowChecker::new();
        let errors = checker.check_function(&func);
        assert!(errors.is_empty(), "expected no borrow errors, got {:?}", errors);
    }
}
