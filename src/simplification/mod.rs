//! Simplification framework - reduces expressions
pub(crate) mod engine;
pub(crate) mod helpers;
mod rules;

use crate::Expr;

/// Simplify an expression with the default engine settings
pub(crate) fn simplify_expr(expr: Expr) -> Expr {
    run(engine::Simplifier::new(), expr)
}

/// Simplify treating every symbol as positive, so roots of squares collapse
pub(crate) fn simplify_positive(expr: Expr) -> Expr {
    run(engine::Simplifier::new().with_assume_positive(true), expr)
}

/// Run a configured simplifier, then prettify roots (x^0.5 -> sqrt(x)) for display
///
/// Prettifying happens after the rule pass so it doesn't fight the power rules.
pub(crate) fn run(mut simplifier: engine::Simplifier, expr: Expr) -> Expr {
    let simplified = simplifier.simplify(expr);
    helpers::prettify_roots(&simplified)
}
