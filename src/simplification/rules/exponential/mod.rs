use std::sync::Arc;

use crate::simplification::helpers::single_arg;
use crate::simplification::rules::{ExprKind, Rule, RuleContext};
use crate::{Expr, ExprKind as AstKind};

rule!(
    LnExpRule,
    "ln_exp",
    80,
    Exponential,
    &[ExprKind::Function],
    |expr: &Expr, _context: &RuleContext| {
        // ln(exp(x)) = x holds for every real x
        let inner = single_arg(expr, "ln")?;
        single_arg(inner, "exp").cloned()
    }
);

rule!(
    ExpLnRule,
    "exp_ln",
    80,
    Exponential,
    &[ExprKind::Function],
    alters_domain: true,
    |expr: &Expr, _context: &RuleContext| {
        // exp(ln(x)) = x only for x > 0
        let inner = single_arg(expr, "exp")?;
        single_arg(inner, "ln").cloned()
    }
);

rule!(
    LnPowerRule,
    "ln_power",
    75,
    Exponential,
    &[ExprKind::Function],
    alters_domain: true,
    |expr: &Expr, context: &RuleContext| {
        // ln(x^n) -> n*ln(x) under the positive assumption
        if !context.assume_positive {
            return None;
        }
        if let AstKind::Pow(base, exp) = &single_arg(expr, "ln")?.kind {
            return Some(Expr::mul_expr(
                exp.as_ref().clone(),
                Expr::func("ln", base.as_ref().clone()),
            ));
        }
        None
    }
);

/// Get all exponential and logarithmic rules in priority order
pub(crate) fn get_exponential_rules() -> Vec<Arc<dyn Rule + Send + Sync>> {
    vec![
        Arc::new(LnExpRule),
        Arc::new(ExpLnRule),
        Arc::new(LnPowerRule),
    ]
}
