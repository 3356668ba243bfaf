//! Substitution of registered values into the value and error expressions

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use super::messages::MessageLog;
use super::registry::Registry;
use super::report::Measurement;
use crate::{Expr, Quantity, SheetError};

/// What to do when symbols remain after substitution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnresolvedPolicy {
    /// Warn once and use `0` for the unresolved quantity
    #[default]
    DegradeToZero,
    /// Fail with [`SheetError::Unresolved`]
    Strict,
}

/// Numeric outcome of one sheet run
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub nominal: f64,
    pub uncertainty: f64,
    /// Symbols left over in either expression
    pub unresolved: BTreeSet<String>,
    /// Variables excluded from propagation
    pub no_deviation: Vec<String>,
}

impl Evaluation {
    pub fn pair(&self) -> (f64, f64) {
        (self.nominal, self.uncertainty)
    }

    pub fn measurement(&self) -> Measurement {
        Measurement::new(self.nominal, self.uncertainty)
    }

    pub fn is_resolved(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Named constants resolved when no variable of the same name is bound
const CONSTANTS: &[(&str, f64)] = &[("pi", std::f64::consts::PI), ("E", std::f64::consts::E)];

/// Values for the value expression: nominal values plus unbound constants
fn nominal_values(registry: &Registry) -> FxHashMap<&str, f64> {
    let mut values: FxHashMap<&str, f64> = CONSTANTS.iter().copied().collect();
    for binding in registry.iter() {
        match binding.value() {
            Some(value) => {
                values.insert(binding.name(), value);
            }
            // A bound name shadows the constant even without a value
            None => {
                values.remove(binding.name());
            }
        }
    }
    values
}

/// Values for the error expression: nominal values plus known deviations
fn error_values<'a>(
    registry: &'a Registry,
    nominal: &FxHashMap<&'a str, f64>,
) -> FxHashMap<&'a str, f64> {
    let mut values = nominal.clone();
    for binding in registry.iter() {
        if let Some(sigma) = binding.deviation().known() {
            values.insert(binding.sigma().name(), sigma);
        }
    }
    values
}

fn coerce(
    expr: &Expr,
    values: &FxHashMap<&str, f64>,
    quantity: Quantity,
    policy: UnresolvedPolicy,
    messages: &mut MessageLog,
    unresolved: &mut BTreeSet<String>,
) -> Result<f64, SheetError> {
    let reduced = expr.evaluate(values);
    if let Some(n) = reduced.as_number() {
        return Ok(n);
    }

    let symbols = reduced.variables();
    if policy == UnresolvedPolicy::Strict {
        return Err(SheetError::Unresolved { quantity, symbols });
    }
    // One warning per quantity and set of missing names
    let names: Vec<&str> = symbols.iter().map(String::as_str).collect();
    let key = format!("unresolved {quantity}: {}", names.join(", "));
    let text = format!(
        "Could not finish {quantity} evaluation due to missing values, stopped at \n{reduced}"
    );
    messages.warn_keyed(key, text);
    unresolved.extend(symbols);
    Ok(0.0)
}

/// Substitute the registry into both expressions and reduce them to numbers
///
/// The uncertainty is reported as an absolute value, since the error
/// expression is canonicalised under a positivity assumption.
pub(crate) fn evaluate(
    value_expr: &Expr,
    error_expr: &Expr,
    registry: &Registry,
    policy: UnresolvedPolicy,
    messages: &mut MessageLog,
) -> Result<Evaluation, SheetError> {
    let nominal_vals = nominal_values(registry);
    let error_vals = error_values(registry, &nominal_vals);
    let mut unresolved = BTreeSet::new();

    let nominal = coerce(
        value_expr,
        &nominal_vals,
        Quantity::Nominal,
        policy,
        messages,
        &mut unresolved,
    )?;
    let deviation = coerce(
        error_expr,
        &error_vals,
        Quantity::Deviation,
        policy,
        messages,
        &mut unresolved,
    )?;

    Ok(Evaluation {
        nominal,
        uncertainty: deviation.abs(),
        unresolved,
        no_deviation: registry.no_deviation(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::registry::{Deviation, Variable};
    use crate::{parse_formula, uncertainty_propagation};

    fn setup(formula: &str, tracked: &[&str]) -> (Expr, Expr) {
        let value = parse_formula(formula).unwrap();
        let error = uncertainty_propagation(&value, tracked).unwrap();
        (value, error)
    }

    #[test]
    fn test_full_substitution() {
        let (value, error) = setup("a*x**3", &["a"]);
        let mut registry = Registry::new();
        registry.set("a", Variable::new().value(0.5).deviation(0.05)).unwrap();
        registry.set("x", Variable::new().value(2.0)).unwrap();

        let mut messages = MessageLog::new();
        let result = evaluate(
            &value,
            &error,
            &registry,
            UnresolvedPolicy::default(),
            &mut messages,
        )
        .unwrap();
        assert_eq!(result.nominal, 4.0);
        assert!((result.uncertainty - 0.4).abs() < 1e-12);
        assert!(result.is_resolved());
        assert_eq!(result.no_deviation, vec!["x"]);
        assert!(messages.is_empty());
    }

    #[test]
    fn test_constants_resolve_unless_bound() {
        let (value, error) = setup("2*pi*r", &["r"]);
        let mut registry = Registry::new();
        registry.set("r", Variable::new().value(1.0).deviation(0.5)).unwrap();
        let mut messages = MessageLog::new();
        let result = evaluate(&value, &error, &registry, UnresolvedPolicy::Strict, &mut messages)
            .unwrap();
        assert!((result.nominal - 2.0 * std::f64::consts::PI).abs() < 1e-12);
        assert!((result.uncertainty - std::f64::consts::PI).abs() < 1e-12);

        registry.set("pi", Variable::new().value(3.0)).unwrap();
        let result = evaluate(&value, &error, &registry, UnresolvedPolicy::Strict, &mut messages)
            .unwrap();
        assert_eq!(result.nominal, 6.0);
    }

    #[test]
    fn test_degrade_to_zero_warns_once() {
        let (value, error) = setup("a*x", &["a"]);
        let mut registry = Registry::new();
        registry
            .set("a", Variable::new().value(2.0).deviation(Deviation::Symbolic))
            .unwrap();

        let mut messages = MessageLog::new();
        for _ in 0..2 {
            let result = evaluate(
                &value,
                &error,
                &registry,
                UnresolvedPolicy::DegradeToZero,
                &mut messages,
            )
            .unwrap();
            assert_eq!(result.pair(), (0.0, 0.0));
            let expected: BTreeSet<String> =
                ["sigma_a", "x"].iter().map(|s| s.to_string()).collect();
            assert_eq!(result.unresolved, expected);
        }
        assert_eq!(messages.len(), 2);
        assert!(messages.contains(
            "Could not finish nominal evaluation due to missing values, stopped at \n2*x"
        ));
    }

    #[test]
    fn test_same_missing_symbols_warn_once_across_values() {
        let (value, error) = setup("a*x", &["x"]);
        let mut registry = Registry::new();
        let mut messages = MessageLog::new();
        for x in [1.0, 2.0, 3.0] {
            registry.set("x", Variable::new().value(x).deviation(0.1)).unwrap();
            let result = evaluate(
                &value,
                &error,
                &registry,
                UnresolvedPolicy::DegradeToZero,
                &mut messages,
            )
            .unwrap();
            assert_eq!(result.unresolved, ["a".to_string()].into_iter().collect());
        }
        assert_eq!(messages.warnings().count(), 2);
    }

    #[test]
    fn test_strict_policy_fails() {
        let (value, error) = setup("a + b", &["a"]);
        let mut registry = Registry::new();
        registry.set("a", Variable::new().value(1.0).deviation(0.1)).unwrap();
        let mut messages = MessageLog::new();
        let err = evaluate(&value, &error, &registry, UnresolvedPolicy::Strict, &mut messages)
            .unwrap_err();
        assert_eq!(
            err,
            SheetError::Unresolved {
                quantity: Quantity::Nominal,
                symbols: ["b".to_string()].into_iter().collect(),
            }
        );
    }

    #[test]
    fn test_uncertainty_is_absolute() {
        let value = parse_formula("x").unwrap();
        let error = Expr::mul_expr(Expr::number(-3.0), Expr::symbol("sigma_x"));
        let mut registry = Registry::new();
        registry.set("x", Variable::new().value(1.0).deviation(0.1)).unwrap();
        let mut messages = MessageLog::new();
        let result = evaluate(&value, &error, &registry, UnresolvedPolicy::Strict, &mut messages)
            .unwrap();
        assert!((result.uncertainty - 0.3).abs() < 1e-12);
    }
}
