//! Constant-expression evaluator.
//!
//! Handles integer/float/bool/char literals, unary `-`/`not`/`~`, binary
//! arithmetic/logical/comparison operators, references to `const`
//! bindings, and references to const-generic parameters (left opaque
//! until monomorphization substitutes them).

use crate::ast::exprs::{BinaryOp, Expr, ExprKind, LiteralPattern, UnaryOp};
use crate::source::Span;

use super::super::error::{TypeError, TypeErrorKind};

#[derive(Debug, Clone, PartialEq)]
pub enum ConstVal {
    Int(i128),
    Float(f64),
    Bool(bool),
    Char(char),
    /// A const-generic parameter not yet substituted; opaque until
    /// monomorphization binds it to a concrete value.
    Unresolved(String),
}

pub struct ConstEvaluator<'a> {
    pub const_bindings: &'a std::collections::HashMap<String, ConstVal>,
    pub const_params: &'a std::collections::HashSet<String>,
}

impl<'a> ConstEvaluator<'a> {
    pub fn eval(&self, expr: &Expr) -> Result<ConstVal, TypeError> {
        match &expr.kind {
            ExprKind::Literal(lit) => Ok(match lit {
                LiteralPattern::Int { value, .. } => ConstVal::Int(*value),
                LiteralPattern::Float { value, .. } => ConstVal::Float(*value),
                LiteralPattern::Bool(b) => ConstVal::Bool(*b),
                LiteralPattern::Char(c) => ConstVal::Char(*c),
                LiteralPattern::Str(_) | LiteralPattern::Null => {
                    return Err(TypeError::new(
                        TypeErrorKind::TypeMismatch,
                        "string and null literals are not valid constant expressions",
                        expr.span,
                    ));
                }
            }),
            ExprKind::Identifier(name) => {
                if let Some(v) = self.const_bindings.get(name) {
                    Ok(v.clone())
                } else if self.const_params.contains(name) {
                    Ok(ConstVal::Unresolved(name.clone()))
                } else {
                    Err(TypeError::new(
                        TypeErrorKind::UnknownIdentifier,
                        format!("`{}` is not a constant", name),
                        expr.span,
                    ))
                }
            }
            ExprKind::Unary { op, operand } => {
                let v = self.eval(operand)?;
                self.eval_unary(*op, v, expr.span)
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let l = self.eval(lhs)?;
                let r = self.eval(rhs)?;
                self.eval_binary(*op, l, r, expr.span)
            }
            _ => Err(TypeError::new(
                TypeErrorKind::TypeMismatch,
                "expression is not a constant",
                expr.span,
            )),
        }
    }

    fn eval_unary(&self, op: UnaryOp, v: ConstVal, span: Span) -> Result<ConstVal, TypeError> {
        match (op, v) {
            (UnaryOp::Neg, ConstVal::Int(i)) => Ok(ConstVal::Int(-i)),
            (UnaryOp::Neg, ConstVal::Float(f)) => Ok(ConstVal::Float(-f)),
            (UnaryOp::Not, ConstVal::Bool(b)) => Ok(ConstVal::Bool(!b)),
            (UnaryOp::BitNot, ConstVal::Int(i)) => Ok(ConstVal::Int(!i)),
            (_, ConstVal::Unresolved(name)) => Ok(ConstVal::Unresolved(name)),
            _ => Err(TypeError::new(
                TypeErrorKind::TypeMismatch,
                "invalid operand for unary operator in constant expression",
                span,
            )),
        }
    }

    fn eval_binary(
        &self,
        op: BinaryOp,
        l: ConstVal,
        r: ConstVal,
        span: Span,
    ) -> Result<ConstVal, TypeError> {
        if matches!(l, ConstVal::Unresolved(_)) || matches!(r, ConstVal::Unresolved(_)) {
            return Ok(ConstVal::Unresolved("<dependent>".to_string()));
        }
        use BinaryOp::*;
        match (op, l, r) {
            (Add, ConstVal::Int(a), ConstVal::Int(b)) => Ok(ConstVal::Int(a + b)),
            (Sub, ConstVal::Int(a), ConstVal::Int(b)) => Ok(ConstVal::Int(a - b)),
            (Mul, ConstVal::Int(a), ConstVal::Int(b)) => Ok(ConstVal::Int(a * b)),
            (Div, ConstVal::Int(a), ConstVal::Int(b)) => {
                if b == 0 {
                    Err(TypeError::new(
                        TypeErrorKind::DivisionByZero,
                        "division by zero in constant expression",
                        span,
                    ))
                } else {
                    Ok(ConstVal::Int(a / b))
                }
            }
            (Rem, ConstVal::Int(a), ConstVal::Int(b)) => {
                if b == 0 {
                    Err(TypeError::new(
                        TypeErrorKind::DivisionByZero,
                        "modulo by zero in constant expression",
                        span,
                    ))
                } else {
                    Ok(ConstVal::Int(a % b))
                }
            }
            (Eq, a, b) => Ok(ConstVal::Bool(a == b)),
            (Ne, a, b) => Ok(ConstVal::Bool(a != b)),
            (Lt, ConstVal::Int(a), ConstVal::Int(b)) => Ok(ConstVal::Bool(a < b)),
            (Le, ConstVal::Int(a), ConstVal::Int(b)) => Ok(ConstVal::Bool(a <= b)),
            (Gt, ConstVal::Int(a), ConstVal::Int(b)) => Ok(ConstVal::Bool(a > b)),
            (Ge, ConstVal::Int(a), ConstVal::Int(b)) => Ok(ConstVal::Bool(a >= b)),
            (And, ConstVal::Bool(a), ConstVal::Bool(b)) => Ok(ConstVal::Bool(a && b)),
            (Or, ConstVal::Bool(a), ConstVal::Bool(b)) => Ok(ConstVal::Bool(a || b)),
            (BitAnd, ConstVal::Int(a), ConstVal::Int(b)) => Ok(ConstVal::Int(a & b)),
            (BitOr, ConstVal::Int(a), ConstVal::Int(b)) => Ok(ConstVal::Int(a | b)),
            (BitXor, ConstVal::Int(a), ConstVal::Int(b)) => Ok(ConstVal::Int(a ^ b)),
            (Shl, ConstVal::Int(a), ConstVal::Int(b)) => Ok(ConstVal::Int(a << b)),
            (Shr, ConstVal::Int(a), ConstVal::Int(b)) => Ok(ConstVal::Int(a >> b)),
            _ => Err(TypeError::new(
                TypeErrorKind::TypeMismatch,
                "invalid operands for binary operator in constant expression",
                span,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::exprs::Expr;

    fn lit_int(v: i128) -> Expr {
        Expr::new(
            ExprKind::Literal(LiteralPattern::Int {
                value: v,
                base: crate::lexer::IntBase::Decimal,
                suffix: None,
            }),
            Span::at(0),
        )
    }

    #[test]
    fn evaluates_arithmetic() {
        let bindings = std::collections::HashMap::new();
        let params = std::collections::HashSet::new();
        let ev = ConstEvaluator {
            const_bindings: &bindings,
            const_params: &params,
        };
        let expr = Expr::new(
            ExprKind::Binary {
                op: BinaryOp::Add,
                lhs: Box::new(lit_int(2)),
                rhs: Box::new(lit_int(3)),
            },
            Span::at(0),
        );
        assert_eq!(ev.eval(&expr).unwrap(), ConstVal::Int(5));
    }

    #[test]
    fn division_by_zero_is_diagnostic() {
        let bindings = std::collections::HashMap::new();
        let params = std::collections::HashSet::new();
        let ev = ConstEvaluator {
            const_bindings: &bindings,
            const_params: &params,
        };
        let expr = Expr::new(
            ExprKind::Binary {
                op: BinaryOp::Div,
                lhs: Box::new(lit_int(1)),
                rhs: Box::new(lit_int(0)),
            },
            Span::at(0),
        );
        let err = ev.eval(&expr).unwrap_err();
        assert_eq!(err.kind.code(), "T013");
    }

    #[test]
    fn const_generic_param_stays_unresolved() {
        let bindings = std::collections::HashMap::new();
        let mut params = std::collections::HashSet::new();
        params.insert("N".to_string());
        let ev = ConstEvaluator {
            const_bindings: &bindings,
            const_params: &params,
        };
        let expr = Expr::new(ExprKind::Identifier("N".to_string()), Span::at(0));
        assert_eq!(ev.eval(&expr).unwrap(), ConstVal::Unresolved("N".to_string()));
    }
}
