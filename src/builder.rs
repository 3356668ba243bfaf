//! Builder pattern API for differentiation and simplification
//!
//! Provides a fluent interface for configuring and executing differentiation/simplification.
//!
//! # Example
//! ```
//! use maabara::{sym, Diff};
//!
//! let x = sym("x");
//! let a = sym("a");
//! let expr = a.clone() * x.clone().pow(3.0);
//!
//! let derivative = Diff::new().fixed_var(&a).differentiate(expr, &x).unwrap();
//! assert_eq!(derivative.to_string(), "3*a*x^2");
//! ```

use rustc_hash::FxHashSet;

use crate::parser::{self, ParseOptions};
use crate::simplification::{self, engine::Simplifier};
use crate::{DiffError, Expr, Symbol};

fn check_limits(expr: &Expr, max_depth: Option<usize>, max_nodes: Option<usize>) -> Result<(), DiffError> {
    if let Some(max_d) = max_depth
        && expr.max_depth() > max_d
    {
        return Err(DiffError::MaxDepthExceeded);
    }
    if let Some(max_n) = max_nodes
        && expr.node_count() > max_n
    {
        return Err(DiffError::MaxNodesExceeded);
    }
    Ok(())
}

fn parse_options(max_depth: Option<usize>, max_nodes: Option<usize>) -> ParseOptions {
    let defaults = ParseOptions::default();
    ParseOptions {
        max_depth: max_depth.unwrap_or(defaults.max_depth),
        max_nodes: max_nodes.unwrap_or(defaults.max_nodes),
    }
}

/// Builder for differentiation operations
#[derive(Debug, Clone)]
pub struct Diff {
    domain_safe: bool,
    simplify: bool,
    fixed_vars: FxHashSet<String>,
    max_depth: Option<usize>,
    max_nodes: Option<usize>,
}

impl Default for Diff {
    fn default() -> Self {
        Self {
            domain_safe: false,
            simplify: true,
            fixed_vars: FxHashSet::default(),
            max_depth: None,
            max_nodes: None,
        }
    }
}

impl Diff {
    /// Create a new differentiation builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable domain-safe mode (skips domain-altering rules)
    pub fn domain_safe(mut self, safe: bool) -> Self {
        self.domain_safe = safe;
        self
    }

    /// Simplify the derivative (on by default)
    pub fn simplify(mut self, simplify: bool) -> Self {
        self.simplify = simplify;
        self
    }

    /// Add a single fixed variable (treated as constant during differentiation)
    pub fn fixed_var(mut self, var: &Symbol) -> Self {
        self.fixed_vars.insert(var.name().to_string());
        self
    }

    /// Add multiple fixed variables
    pub fn fixed_vars(mut self, vars: &[&Symbol]) -> Self {
        for v in vars {
            self.fixed_vars.insert(v.name().to_string());
        }
        self
    }

    /// Set maximum AST depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set maximum AST node count
    pub fn max_nodes(mut self, nodes: usize) -> Self {
        self.max_nodes = Some(nodes);
        self
    }

    /// Differentiate an expression with respect to a variable
    pub fn differentiate(&self, expr: Expr, var: &Symbol) -> Result<Expr, DiffError> {
        self.differentiate_by_name(expr, var.name())
    }

    /// Differentiate an expression with respect to a variable name
    ///
    /// # Errors
    /// - `VariableInBothFixedAndDiff` if `var` was declared fixed
    /// - `MaxDepthExceeded` / `MaxNodesExceeded` when the input breaks a limit
    /// - `UnknownFunction` / `InvalidArity` for calls outside the registry
    pub fn differentiate_by_name(&self, expr: Expr, var: &str) -> Result<Expr, DiffError> {
        if self.fixed_vars.contains(var) {
            return Err(DiffError::VariableInBothFixedAndDiff {
                var: var.to_string(),
            });
        }
        check_limits(&expr, self.max_depth, self.max_nodes)?;

        let derivative = expr.derive(var, &self.fixed_vars)?;
        if !self.simplify {
            return Ok(derivative);
        }

        let simplifier = Simplifier::new().with_domain_safe(self.domain_safe);
        Ok(simplification::run(simplifier, derivative))
    }

    /// Parse and differentiate a string formula
    pub fn diff_str(&self, formula: &str, var: &str) -> Result<String, DiffError> {
        let ast = parser::parse(formula, &parse_options(self.max_depth, self.max_nodes))?;
        let result = self.differentiate_by_name(ast, var)?;
        Ok(result.to_string())
    }
}

/// Builder for simplification operations
#[derive(Debug, Clone, Default)]
pub struct Simplify {
    domain_safe: bool,
    force_roots: bool,
    max_iterations: Option<usize>,
    max_depth: Option<usize>,
    max_nodes: Option<usize>,
}

impl Simplify {
    /// Create a new simplification builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable domain-safe mode
    pub fn domain_safe(mut self, safe: bool) -> Self {
        self.domain_safe = safe;
        self
    }

    /// Treat every symbol as positive, so `sqrt(x^2)` becomes `x` instead of `abs(x)`
    pub fn force_roots(mut self, force: bool) -> Self {
        self.force_roots = force;
        self
    }

    /// Cap the number of full rule passes
    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = Some(iterations);
        self
    }

    /// Set maximum AST depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set maximum AST node count
    pub fn max_nodes(mut self, nodes: usize) -> Self {
        self.max_nodes = Some(nodes);
        self
    }

    /// Simplify an expression
    pub fn simplify(&self, expr: Expr) -> Result<Expr, DiffError> {
        check_limits(&expr, self.max_depth, self.max_nodes)?;

        let mut simplifier = Simplifier::new()
            .with_domain_safe(self.domain_safe)
            .with_assume_positive(self.force_roots);
        if let Some(iterations) = self.max_iterations {
            simplifier = simplifier.with_max_iterations(iterations);
        }
        Ok(simplification::run(simplifier, expr))
    }

    /// Parse and simplify a string formula
    pub fn simplify_str(&self, formula: &str) -> Result<String, DiffError> {
        let ast = parser::parse(formula, &parse_options(self.max_depth, self.max_nodes))?;
        let result = self.simplify(ast)?;
        Ok(result.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::sym;

    #[test]
    fn test_diff_builder_basic() {
        let result = Diff::new().diff_str("x^2", "x").unwrap();
        assert_eq!(result, "2*x");
    }

    #[test]
    fn test_diff_with_fixed_var() {
        let a = sym("a");
        let result = Diff::new().fixed_var(&a).diff_str("a*x", "x").unwrap();
        assert_eq!(result, "a");

        let err = Diff::new().fixed_var(&a).diff_str("a*x", "a").unwrap_err();
        assert_eq!(
            err,
            DiffError::VariableInBothFixedAndDiff {
                var: "a".to_string()
            }
        );
    }

    #[test]
    fn test_diff_without_simplification() {
        let x = sym("x");
        let expr = x.clone() * x.clone();
        let raw = Diff::new().simplify(false).differentiate(expr.clone(), &x).unwrap();
        let simplified = Diff::new().differentiate(expr, &x).unwrap();
        assert_eq!(raw.to_string(), "x + x");
        assert_eq!(simplified.to_string(), "2*x");
    }

    #[test]
    fn test_diff_limits() {
        let x = sym("x");
        let expr = x.clone().pow(2.0) + x.clone().sin();
        assert_eq!(
            Diff::new().max_nodes(3).differentiate(expr, &x),
            Err(DiffError::MaxNodesExceeded)
        );
    }

    #[test]
    fn test_simplify_builder() {
        assert_eq!(Simplify::new().simplify_str("x + x").unwrap(), "2*x");
        assert_eq!(Simplify::new().simplify_str("sqrt(x^2)").unwrap(), "abs(x)");
        assert_eq!(
            Simplify::new().force_roots(true).simplify_str("sqrt(x^2)").unwrap(),
            "x"
        );
    }
}
