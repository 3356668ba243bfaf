use crate::helpers::is_integer;
use crate::simplification::helpers::{
    Coeff, Factor, build_product, is_even_integer, rational_value, split_term,
};
use crate::simplification::rules::{ExprKind, RuleContext};
use crate::{Expr, ExprKind as AstKind};

fn scale_exponent(exp: &Expr, by: Coeff) -> Expr {
    match rational_value(exp) {
        Some(e) => e.mul(by).to_expr(),
        None => Expr::mul_expr(by.to_expr(), exp.clone()),
    }
}

rule!(
    PowerPowerRule,
    "power_power",
    75,
    Algebraic,
    &[ExprKind::Pow],
    |expr: &Expr, context: &RuleContext| {
        // (x^a)^b -> x^(a*b), valid for integer b or positive x
        if let AstKind::Pow(inner, outer_exp) = &expr.kind
            && let AstKind::Pow(base, inner_exp) = &inner.kind
        {
            let outer = rational_value(outer_exp);
            let inner_n = rational_value(inner_exp);

            if let (Some(a), Some(b)) = (inner_n, outer) {
                let product = a.mul(b);
                // (x^2)^(1/2) = |x| without a sign assumption
                if !context.assume_positive
                    && is_even_integer(a.value())
                    && a.value() > 0.0
                    && product.is_one()
                {
                    return Some(Expr::func("abs", base.as_ref().clone()));
                }
                if is_integer(b.value()) || context.assume_positive {
                    return Some(Expr::pow(base.as_ref().clone(), product.to_expr()));
                }
                return None;
            }

            if context.assume_positive || outer.is_some_and(|b| is_integer(b.value())) {
                let exp = Expr::mul_expr(inner_exp.as_ref().clone(), outer_exp.as_ref().clone());
                return Some(Expr::pow(base.as_ref().clone(), exp));
            }
        }
        None
    }
);

rule!(
    PowerOfProductRule,
    "power_of_product",
    70,
    Algebraic,
    &[ExprKind::Pow],
    |expr: &Expr, context: &RuleContext| {
        // (a*b)^n -> a^n*b^n and (a/b)^n -> a^n/b^n
        if let AstKind::Pow(base, exp) = &expr.kind
            && matches!(base.kind, AstKind::Mul(_, _) | AstKind::Div(_, _))
            && let Some(n) = rational_value(exp)
            && (is_integer(n.value()) || context.assume_positive)
        {
            let (coeff, factors) = split_term(base);
            let mut factors: Vec<Factor> = factors
                .into_iter()
                .map(|(b, e)| (b, scale_exponent(&e, n)))
                .collect();

            let coeff = match coeff.pow(n.value()) {
                Some(c) => c,
                None => {
                    // Irrational coefficient power stays symbolic: 2^(1/2)
                    factors.push((Expr::number(coeff.num), n.to_expr()));
                    if coeff.den != 1.0 {
                        factors.push((Expr::number(coeff.den), n.neg().to_expr()));
                    }
                    Coeff::ONE
                }
            };
            return Some(build_product(coeff, factors));
        }
        None
    }
);
