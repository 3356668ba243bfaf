use std::cmp::Ordering;

use crate::Expr;
use crate::simplification::helpers::{
    Coeff, Factor, build_product, compare_factors, flatten_sum, split_term,
};
use crate::simplification::rules::{ExprKind, RuleContext};

rule!(
    CombineFactorsRule,
    "combine_factors",
    40,
    Algebraic,
    &[ExprKind::Mul, ExprKind::Div, ExprKind::Pow],
    |expr: &Expr, _context: &RuleContext| {
        // x*x^2 -> x^3, 2*x/(4*y) -> x/(2*y), x^-1 -> 1/x
        let (coeff, factors) = split_term(expr);
        let rebuilt = build_product(coeff, factors);
        (rebuilt != *expr).then_some(rebuilt)
    }
);

rule!(
    CombineTermsRule,
    "combine_terms",
    40,
    Algebraic,
    &[ExprKind::Add, ExprKind::Sub],
    |expr: &Expr, _context: &RuleContext| {
        // 2*x + 3*x -> 5*x, a - a -> 0, terms sorted with constants last
        let mut terms = Vec::new();
        flatten_sum(expr, false, &mut terms);

        let mut groups: Vec<(Coeff, Vec<Factor>)> = Vec::with_capacity(terms.len());
        for (coeff, factors) in terms {
            match groups.iter_mut().find(|(_, f)| *f == factors) {
                Some(group) => group.0 = group.0.add(coeff),
                None => groups.push((coeff, factors)),
            }
        }
        groups.retain(|(coeff, _)| !coeff.is_zero());
        groups.sort_by(|a, b| match (a.1.is_empty(), b.1.is_empty()) {
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            _ => compare_factors(&a.1, &b.1),
        });

        let rebuilt = groups
            .into_iter()
            .map(|(coeff, factors)| build_product(coeff, factors))
            .reduce(Expr::add_expr)
            .unwrap_or_else(|| Expr::number(0.0));
        (rebuilt != *expr).then_some(rebuilt)
    }
);
