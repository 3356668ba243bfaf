use crate::display::strip_negation;
use crate::simplification::helpers::{is_even_integer, single_arg};
use crate::simplification::rules::{ExprKind, RuleContext};
use crate::{Expr, ExprKind as AstKind};

rule!(
    AbsAbsRule,
    "abs_abs",
    90,
    Algebraic,
    &[ExprKind::Function],
    |expr: &Expr, _context: &RuleContext| {
        let inner = single_arg(expr, "abs")?;
        single_arg(inner, "abs").map(|_| inner.clone())
    }
);

rule!(
    AbsNegRule,
    "abs_neg",
    90,
    Algebraic,
    &[ExprKind::Function],
    |expr: &Expr, _context: &RuleContext| {
        // abs(-x) -> abs(x); numbers are folded elsewhere
        let inner = single_arg(expr, "abs")?;
        if inner.as_number().is_some() {
            return None;
        }
        strip_negation(inner).map(|positive| Expr::func("abs", positive))
    }
);

rule!(
    AbsPowEvenRule,
    "abs_pow_even",
    85,
    Algebraic,
    &[ExprKind::Pow],
    |expr: &Expr, _context: &RuleContext| {
        // abs(x)^n where n is an even integer -> x^n
        if let AstKind::Pow(base, exp) = &expr.kind
            && let Some(inner) = single_arg(base, "abs")
            && exp.as_number().is_some_and(is_even_integer)
        {
            return Some(Expr::pow(inner.clone(), exp.as_ref().clone()));
        }
        None
    }
);

rule!(
    AbsPositiveRule,
    "abs_positive",
    85,
    Algebraic,
    &[ExprKind::Function],
    alters_domain: true,
    |expr: &Expr, context: &RuleContext| {
        if !context.assume_positive {
            return None;
        }
        single_arg(expr, "abs").cloned()
    }
);

rule!(
    SignPositiveRule,
    "sign_positive",
    85,
    Algebraic,
    &[ExprKind::Function],
    alters_domain: true,
    |expr: &Expr, context: &RuleContext| {
        if !context.assume_positive {
            return None;
        }
        single_arg(expr, "sign")
            .filter(|arg| arg.as_number().is_none())
            .map(|_| Expr::number(1.0))
    }
);
