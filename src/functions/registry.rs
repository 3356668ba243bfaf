use std::ops::RangeInclusive;
use std::sync::OnceLock;

use rustc_hash::FxHashMap;

use crate::Expr;

/// Definition of a mathematical function including its evaluation and differentiation logic
#[derive(Clone)]
pub(crate) struct FunctionDefinition {
    /// Canonical name of the function (e.g., "sin", "log10")
    pub name: &'static str,

    /// Acceptable argument count (arity)
    pub arity: RangeInclusive<usize>,

    /// Numerical evaluation; domain errors yield NaN like the underlying f64 method
    pub eval: fn(&[f64]) -> Option<f64>,

    /// Symbolic differentiation
    /// Arguments: (args of the function call, derivatives of the arguments)
    /// Returns the total derivative dA/dx = sum( (dA/d_arg_i) * (d_arg_i/dx) )
    pub derivative: fn(&[Expr], &[Expr]) -> Expr,

    /// LaTeX command used when rendering the call
    pub latex: &'static str,
}

impl FunctionDefinition {
    pub(crate) fn validate_arity(&self, args: usize) -> bool {
        self.arity.contains(&args)
    }

    pub(crate) fn arity_description(&self) -> String {
        let (lo, hi) = (*self.arity.start(), *self.arity.end());
        if lo == hi {
            lo.to_string()
        } else {
            format!("{lo} to {hi}")
        }
    }
}

static REGISTRY: OnceLock<FxHashMap<&'static str, FunctionDefinition>> = OnceLock::new();

fn init_registry() -> FxHashMap<&'static str, FunctionDefinition> {
    crate::functions::definitions::all_definitions()
        .into_iter()
        .map(|def| (def.name, def))
        .collect()
}

/// Central registry for getting function definitions
pub(crate) struct Registry;

impl Registry {
    pub(crate) fn get(name: &str) -> Option<&'static FunctionDefinition> {
        REGISTRY.get_or_init(init_registry).get(name)
    }
}

/// Whether `name` is a function the parser and differentiator understand
pub fn is_known_function(name: &str) -> bool {
    Registry::get(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_and_arity() {
        let log = Registry::get("log").expect("log is registered");
        assert!(log.validate_arity(1));
        assert!(log.validate_arity(2));
        assert!(!log.validate_arity(3));
        assert_eq!(log.arity_description(), "1 to 2");
        assert!(is_known_function("sqrt"));
        assert!(!is_known_function("besselj"));
    }

    #[test]
    fn test_numeric_eval() {
        let sqrt = Registry::get("sqrt").expect("sqrt is registered");
        assert_eq!((sqrt.eval)(&[9.0]), Some(3.0));
        let atan2 = Registry::get("atan2").expect("atan2 is registered");
        assert_eq!((atan2.eval)(&[1.0, 1.0]), Some(std::f64::consts::FRAC_PI_4));
    }
}
