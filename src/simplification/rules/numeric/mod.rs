use std::sync::Arc;

use crate::functions::registry::Registry;
use crate::helpers::is_integer;
use crate::simplification::rules::{ExprKind, Rule, RuleContext};
use crate::{Expr, ExprKind as AstKind};

fn numbers(a: &Expr, b: &Expr) -> Option<(f64, f64)> {
    Some((a.as_number()?, b.as_number()?))
}

rule!(
    AddZeroRule,
    "add_zero",
    100,
    Numeric,
    &[ExprKind::Add],
    |expr: &Expr, _context: &RuleContext| {
        if let AstKind::Add(u, v) = &expr.kind {
            if u.is_zero_num() {
                return Some(v.as_ref().clone());
            }
            if v.is_zero_num() {
                return Some(u.as_ref().clone());
            }
        }
        None
    }
);

rule!(
    SubZeroRule,
    "sub_zero",
    100,
    Numeric,
    &[ExprKind::Sub],
    |expr: &Expr, _context: &RuleContext| {
        if let AstKind::Sub(u, v) = &expr.kind {
            if v.is_zero_num() {
                return Some(u.as_ref().clone());
            }
            if u.is_zero_num() {
                return Some(Expr::mul_expr(Expr::number(-1.0), v.as_ref().clone()));
            }
        }
        None
    }
);

rule!(
    MulZeroRule,
    "mul_zero",
    100,
    Numeric,
    &[ExprKind::Mul],
    |expr: &Expr, _context: &RuleContext| {
        if let AstKind::Mul(u, v) = &expr.kind
            && (u.is_zero_num() || v.is_zero_num())
        {
            return Some(Expr::number(0.0));
        }
        None
    }
);

rule!(
    MulOneRule,
    "mul_one",
    100,
    Numeric,
    &[ExprKind::Mul],
    |expr: &Expr, _context: &RuleContext| {
        if let AstKind::Mul(u, v) = &expr.kind {
            if u.is_one_num() {
                return Some(v.as_ref().clone());
            }
            if v.is_one_num() {
                return Some(u.as_ref().clone());
            }
        }
        None
    }
);

rule!(
    DivOneRule,
    "div_one",
    100,
    Numeric,
    &[ExprKind::Div],
    |expr: &Expr, _context: &RuleContext| {
        if let AstKind::Div(u, v) = &expr.kind
            && v.is_one_num()
        {
            return Some(u.as_ref().clone());
        }
        None
    }
);

rule!(
    ZeroDivRule,
    "zero_div",
    100,
    Numeric,
    &[ExprKind::Div],
    |expr: &Expr, _context: &RuleContext| {
        // 0/0 stays put so evaluation still reports NaN
        if let AstKind::Div(u, v) = &expr.kind
            && u.is_zero_num()
            && !v.is_zero_num()
        {
            return Some(Expr::number(0.0));
        }
        None
    }
);

rule!(
    PowZeroRule,
    "pow_zero",
    100,
    Numeric,
    &[ExprKind::Pow],
    |expr: &Expr, _context: &RuleContext| {
        if let AstKind::Pow(_, v) = &expr.kind
            && v.is_zero_num()
        {
            return Some(Expr::number(1.0));
        }
        None
    }
);

rule!(
    PowOneRule,
    "pow_one",
    100,
    Numeric,
    &[ExprKind::Pow],
    |expr: &Expr, _context: &RuleContext| {
        if let AstKind::Pow(u, v) = &expr.kind {
            if v.is_one_num() {
                return Some(u.as_ref().clone());
            }
            if u.is_one_num() {
                return Some(Expr::number(1.0));
            }
        }
        None
    }
);

rule!(
    ConstantFoldRule,
    "constant_fold",
    95,
    Numeric,
    &[ExprKind::Add, ExprKind::Sub, ExprKind::Mul, ExprKind::Div, ExprKind::Pow],
    |expr: &Expr, _context: &RuleContext| {
        match &expr.kind {
            AstKind::Add(u, v) => numbers(u, v).map(|(a, b)| Expr::number(a + b)),
            AstKind::Sub(u, v) => numbers(u, v).map(|(a, b)| Expr::number(a - b)),
            AstKind::Mul(u, v) => numbers(u, v).map(|(a, b)| Expr::number(a * b)),
            AstKind::Div(u, v) => {
                let (a, b) = numbers(u, v)?;
                if b == 0.0 {
                    return None;
                }
                // Integer ratios that don't divide evenly stay as exact fractions
                let result = a / b;
                (is_integer(result) || !is_integer(a) || !is_integer(b))
                    .then(|| Expr::number(result))
            }
            AstKind::Pow(u, v) => {
                let (base, exp) = numbers(u, v)?;
                let result = base.powf(exp);
                if !result.is_finite() {
                    return None;
                }
                if is_integer(exp) && exp < 0.0 && is_integer(base) {
                    return Some(Expr::div_expr(
                        Expr::number(1.0),
                        Expr::number(base.powf(-exp)),
                    ));
                }
                (is_integer(exp) || is_integer(result)).then(|| Expr::number(result))
            }
            _ => None,
        }
    }
);

rule!(
    FunctionOfNumberRule,
    "function_of_number",
    95,
    Numeric,
    &[ExprKind::Function],
    |expr: &Expr, _context: &RuleContext| {
        // Only exact results fold: sqrt(4) -> 2, ln(1) -> 0, but exp(1) stays
        if let AstKind::FunctionCall { name, args } = &expr.kind {
            let values: Vec<f64> = args.iter().map(Expr::as_number).collect::<Option<_>>()?;
            let def = Registry::get(name)?;
            let result = (def.eval)(&values)?;
            if result.is_finite() && is_integer(result) {
                return Some(Expr::number(result.round()));
            }
        }
        None
    }
);

/// Get all numeric rules in priority order
pub(crate) fn get_numeric_rules() -> Vec<Arc<dyn Rule + Send + Sync>> {
    vec![
        Arc::new(AddZeroRule),
        Arc::new(SubZeroRule),
        Arc::new(MulZeroRule),
        Arc::new(MulOneRule),
        Arc::new(DivOneRule),
        Arc::new(ZeroDivRule),
        Arc::new(PowZeroRule),
        Arc::new(PowOneRule),
        Arc::new(ConstantFoldRule),
        Arc::new(FunctionOfNumberRule),
    ]
}
