//! Centralized mathematical function registry
//!
//! Single source of truth for the supported elementary functions: their
//! arity, numeric evaluation, derivative formula and LaTeX command.

use crate::{Expr, ExprKind};

pub(crate) mod definitions;
pub(crate) mod registry;

pub use registry::is_known_function;

// ===== Helper functions for building derivative expressions =====

pub(crate) fn func(name: &str, arg: Expr) -> Expr {
    Expr::func(name, arg)
}

/// Multiply, optimizing for common cases (0 and 1)
pub(crate) fn mul_opt(a: Expr, b: Expr) -> Expr {
    match (&a.kind, &b.kind) {
        (ExprKind::Number(x), _) if *x == 0.0 => Expr::number(0.0),
        (_, ExprKind::Number(x)) if *x == 0.0 => Expr::number(0.0),
        (ExprKind::Number(x), _) if *x == 1.0 => b,
        (_, ExprKind::Number(x)) if *x == 1.0 => a,
        _ => Expr::mul_expr(a, b),
    }
}

/// Divide, dropping a zero numerator and a unit denominator
pub(crate) fn div_opt(a: Expr, b: Expr) -> Expr {
    if a.is_zero_num() {
        return Expr::number(0.0);
    }
    if b.is_one_num() {
        return a;
    }
    Expr::div_expr(a, b)
}

pub(crate) fn neg(e: Expr) -> Expr {
    Expr::mul_expr(Expr::number(-1.0), e)
}

pub(crate) fn square(e: Expr) -> Expr {
    Expr::pow(e, Expr::number(2.0))
}
