use std::sync::Arc;

use crate::simplification::helpers::{
    Coeff, Factor, build_product, is_even_integer, rational_value, single_arg, split_term,
};
use crate::simplification::rules::{ExprKind, Rule, RuleContext};
use crate::{Expr, ExprKind as AstKind};

rule!(
    SqrtPowerRule,
    "sqrt_power",
    85,
    Root,
    &[ExprKind::Function],
    |expr: &Expr, context: &RuleContext| {
        if let AstKind::Pow(base, exp) = &single_arg(expr, "sqrt")?.kind
            && let Some(e) = rational_value(exp)
        {
            let half = e.mul(Coeff::HALF).to_expr();
            if context.assume_positive {
                return Some(Expr::pow(base.as_ref().clone(), half));
            }
            // sqrt(x^2) = |x|
            let n = e.value();
            if is_even_integer(n) && n > 0.0 {
                let abs = Expr::func("abs", base.as_ref().clone());
                return Some(if n == 2.0 { abs } else { Expr::pow(abs, half) });
            }
        }
        None
    }
);

rule!(
    SqrtProductRule,
    "sqrt_product",
    80,
    Root,
    &[ExprKind::Function],
    |expr: &Expr, context: &RuleContext| {
        // sqrt(9*x^2*y) -> 3*abs(x)*sqrt(y); for positive symbols every
        // numeric exponent is halved: sqrt(y/(4*x)) -> y^(1/2)/(2*x^(1/2))
        let arg = single_arg(expr, "sqrt")?;
        if !matches!(arg.kind, AstKind::Mul(_, _) | AstKind::Div(_, _)) {
            return None;
        }
        let (coeff, factors) = split_term(arg);

        let (outer_coeff, inner_coeff) = match coeff.sqrt() {
            Some(root) => (root, Coeff::ONE),
            None => (Coeff::ONE, coeff),
        };

        let mut outer: Vec<Factor> = Vec::new();
        let mut inner: Vec<Factor> = Vec::new();
        for (base, exp) in factors {
            match rational_value(&exp) {
                Some(e) if context.assume_positive => {
                    outer.push((base, e.mul(Coeff::HALF).to_expr()));
                }
                Some(e) if is_even_integer(e.value()) => {
                    outer.push((Expr::func("abs", base), e.mul(Coeff::HALF).to_expr()));
                }
                _ => inner.push((base, exp)),
            }
        }

        if outer.is_empty() && outer_coeff.is_one() {
            return None;
        }

        let outer = build_product(outer_coeff, outer);
        let inner = build_product(inner_coeff, inner);
        if inner.is_one_num() {
            return Some(outer);
        }
        Some(Expr::mul_expr(outer, Expr::func("sqrt", inner)))
    }
);

rule!(
    SqrtSquaredRule,
    "sqrt_squared",
    85,
    Root,
    &[ExprKind::Pow],
    |expr: &Expr, _context: &RuleContext| {
        // sqrt(x)^2 -> x wherever sqrt(x) is defined
        if let AstKind::Pow(base, exp) = &expr.kind
            && let Some(inner) = single_arg(base, "sqrt")
            && let Some(n) = exp.as_number()
            && is_even_integer(n)
        {
            return Some(Expr::pow(inner.clone(), Expr::number(n / 2.0)));
        }
        None
    }
);

/// Get all root simplification rules in priority order
pub(crate) fn get_root_rules() -> Vec<Arc<dyn Rule + Send + Sync>> {
    vec![
        Arc::new(SqrtPowerRule),
        Arc::new(SqrtSquaredRule),
        Arc::new(SqrtProductRule),
    ]
}
