//! Uncertainty propagation for symbolic expressions
//!
//! Computes the propagated standard deviation of `f(x₁, …, xₙ)` for
//! uncorrelated inputs:
//!
//! σ_f = sqrt(Σᵢ (∂f/∂xᵢ · σᵢ)²)
//!
//! Each σᵢ is a fresh symbol named `sigma_<xᵢ>`. The result is simplified
//! under a positivity assumption so equivalent radicals share one shape:
//! `sqrt(x^6*sigma_a^2)` becomes `sigma_a*x^3`.

use crate::functions::square;
use crate::{Diff, DiffError, Expr, simplification};

/// Prefix of the error symbol paired with each variable
pub const SIGMA_PREFIX: &str = "sigma_";

/// Name of the error symbol for a variable (`x` → `sigma_x`)
pub fn sigma_name(var: &str) -> String {
    format!("{SIGMA_PREFIX}{var}")
}

/// Compute the uncertainty propagation expression
///
/// Returns σ_f = sqrt(Σᵢ (∂f/∂xᵢ · sigma_xᵢ)²). Variables that do not occur
/// in `expr` contribute nothing; an empty list gives `0`.
///
/// # Example
/// ```
/// use maabara::{parse_formula, uncertainty_propagation};
///
/// let f = parse_formula("a*x**3").unwrap();
/// let sigma = uncertainty_propagation(&f, &["a"]).unwrap();
/// assert_eq!(sigma.to_string(), "sigma_a*x^3");
/// ```
///
/// # Errors
/// Fails when a partial derivative cannot be formed (unknown function or
/// wrong arity in `expr`).
pub fn uncertainty_propagation(expr: &Expr, variables: &[&str]) -> Result<Expr, DiffError> {
    let diff = Diff::new();
    let mut terms: Vec<Expr> = Vec::with_capacity(variables.len());

    for var in variables {
        let partial = diff.differentiate_by_name(expr.clone(), var)?;
        if partial.is_zero_num() {
            continue;
        }
        let sigma = Expr::symbol(sigma_name(var));
        terms.push(square(Expr::mul_expr(partial, sigma)));
    }

    let Some(sum) = terms.into_iter().reduce(Expr::add_expr) else {
        return Ok(Expr::number(0.0));
    };

    let variance = simplification::simplify_expr(sum);
    let root = Expr::func("sqrt", variance);
    Ok(simplification::simplify_positive(root))
}

/// Compute the relative uncertainty σ_f / |f|
pub fn relative_uncertainty(expr: &Expr, variables: &[&str]) -> Result<Expr, DiffError> {
    let sigma = uncertainty_propagation(expr, variables)?;
    if sigma.is_zero_num() {
        return Ok(sigma);
    }
    let magnitude = Expr::func("abs", expr.clone());
    Ok(simplification::simplify_expr(Expr::div_expr(sigma, magnitude)))
}
