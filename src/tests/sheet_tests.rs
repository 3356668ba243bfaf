use std::collections::BTreeSet;

use crate::{
    Deviation, Field, FieldValue, Quantity, Sheet, SheetConfig, SheetError, SheetState,
    UnresolvedPolicy, Variable,
};

fn cubic_sheet() -> Sheet {
    let mut sheet = Sheet::with_equation("a*x**3").unwrap();
    sheet.set_value("a", 0.5, 0.05).unwrap();
    sheet.set_value("x", 2.0, Deviation::Exact).unwrap();
    sheet
}

#[test]
fn test_names_are_validated() {
    let mut sheet = Sheet::new();
    assert!(sheet.set_value("x_max", 1.0, 0.1).is_ok());
    assert!(sheet.set_value("T0", 1.0, 0.1).is_ok());
    for bad in ["x-1", "a b", "", "_", "µ"] {
        assert_eq!(
            sheet.set_value(bad, 1.0, 0.1),
            Err(SheetError::InvalidName {
                name: bad.to_string()
            })
        );
    }
}

#[test]
fn test_derivative_based_propagation() {
    let mut sheet = cubic_sheet();
    let result = sheet.run().unwrap();
    assert_eq!(result.nominal, 4.0);
    assert!((result.uncertainty - 0.4).abs() < 1e-12);
    assert_eq!(sheet.error_expr().unwrap().to_string(), "sigma_a*x^3");
}

#[test]
fn test_both_variables_tracked() {
    let mut sheet = cubic_sheet();
    sheet.set_value("x", 1.0, 0.1).unwrap();
    let result = sheet.run().unwrap();
    assert_eq!(
        sheet.error_expr().unwrap().to_string(),
        "sqrt(9*a^2*sigma_x^2*x^4 + sigma_a^2*x^6)"
    );
    assert!((result.uncertainty - 0.025f64.sqrt()).abs() < 1e-12);
}

#[test]
fn test_value_changes_reuse_error_formula() {
    let mut sheet = cubic_sheet();
    sheet.run().unwrap();
    let id = sheet.error_expr().unwrap().id;

    sheet.set_value("x", 3.0, Deviation::Exact).unwrap();
    sheet.set_value("a", 1.0, 0.5).unwrap();
    let result = sheet.run().unwrap();

    assert_eq!(sheet.error_expr().unwrap().id, id);
    assert_eq!(result.nominal, 27.0);
    assert!((result.uncertainty - 13.5).abs() < 1e-12);
}

#[test]
fn test_equation_change_invalidates_cache() {
    let mut sheet = cubic_sheet();
    sheet.run().unwrap();
    let id = sheet.error_expr().unwrap().id;

    sheet.set_equation("a*x**2").unwrap();
    assert_eq!(sheet.state(), SheetState::Configured);
    let result = sheet.run().unwrap();

    assert_ne!(sheet.error_expr().unwrap().id, id);
    assert_eq!(result.nominal, 2.0);
    assert!((result.uncertainty - 0.2).abs() < 1e-12);
}

#[test]
fn test_exact_variable_reported_once() {
    let mut sheet = cubic_sheet();
    sheet.set_value("b", 1.0, Deviation::Exact).unwrap();
    sheet.run().unwrap();
    sheet.run().unwrap();

    let texts: Vec<&str> = sheet.messages().iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["No deviation for x, b"]);
    assert_eq!(sheet.no_deviation(), vec!["x", "b"]);

    sheet.reset();
    assert!(sheet.messages().is_empty());
}

#[test]
fn test_repeated_runs_are_bit_identical() {
    let mut sheet = Sheet::with_equation("sin(a)*exp(x)/sqrt(a + x)").unwrap();
    sheet.set_value("a", 0.7, 0.01).unwrap();
    sheet.set_value("x", 1.3, 0.02).unwrap();
    let first = sheet.run().unwrap();
    let second = sheet.run().unwrap();
    assert_eq!(first.nominal.to_bits(), second.nominal.to_bits());
    assert_eq!(first.uncertainty.to_bits(), second.uncertainty.to_bits());
}

#[test]
fn test_missing_values_degrade_to_zero() {
    let mut sheet = Sheet::with_equation("a*x").unwrap();
    sheet.set_value("a", 2.0, Deviation::Symbolic).unwrap();
    let result = sheet.run().unwrap();

    assert_eq!(result.pair(), (0.0, 0.0));
    let expected: BTreeSet<String> = ["sigma_a", "x"].iter().map(|s| s.to_string()).collect();
    assert_eq!(result.unresolved, expected);
    assert_eq!(sheet.messages().warnings().count(), 2);
}

#[test]
fn test_strict_policy_surfaces_symbols() {
    let config = SheetConfig::new().unresolved(UnresolvedPolicy::Strict);
    let mut sheet = Sheet::with_config(config);
    sheet.set_equation("a*x").unwrap();
    sheet.set_value("x", 2.0, Deviation::Exact).unwrap();
    sheet.set_error("a", 0.1).unwrap();

    assert_eq!(
        sheet.run(),
        Err(SheetError::Unresolved {
            quantity: Quantity::Nominal,
            symbols: ["a".to_string()].into_iter().collect(),
        })
    );
    assert!(sheet.last_result().is_none());
}

#[test]
fn test_constants() {
    let mut sheet = Sheet::with_equation("pi*r**2").unwrap();
    sheet.set_value("r", 2.0, 0.1).unwrap();
    let result = sheet.run().unwrap();
    assert!((result.nominal - 4.0 * std::f64::consts::PI).abs() < 1e-12);
    assert!((result.uncertainty - 0.4 * std::f64::consts::PI).abs() < 1e-12);

    let mut sheet = Sheet::with_equation("E**k").unwrap();
    sheet.set_value("k", 1.0, Deviation::Exact).unwrap();
    assert_eq!(sheet.run().unwrap().nominal, std::f64::consts::E);
}

#[test]
fn test_field_access_and_set_data() {
    let mut sheet = cubic_sheet();
    assert_eq!(sheet.get("a", Field::Value), Some(FieldValue::Value(0.5)));
    assert_eq!(
        sheet.get("x", Field::Deviation),
        Some(FieldValue::Deviation(Deviation::Exact))
    );
    assert_eq!(sheet.get("missing", Field::Value), None);

    sheet.run().unwrap();
    sheet
        .set_data([
            ("a", Variable::new().value(1.0).deviation(0.1)),
            ("x", Variable::new().value(1.0).deviation(0.1)),
        ])
        .unwrap();
    // x became tracked
    assert_eq!(sheet.state(), SheetState::Configured);
    assert_eq!(sheet.run().unwrap().nominal, 1.0);
}

#[test]
fn test_underscore_names_share_symbols() {
    let mut sheet = Sheet::with_equation("a_1 * x").unwrap();
    sheet.set_value("a_1", 3.0, Deviation::Exact).unwrap();
    sheet.set_value("x", 2.0, 0.5).unwrap();
    let result = sheet.run().unwrap();
    assert_eq!(result.pair(), (6.0, 1.5));
    assert_eq!(
        sheet.get("a1", Field::Label),
        Some(FieldValue::Label("a_{1}".to_string()))
    );
}

#[test]
fn test_malformed_equation_is_rejected() {
    let mut sheet = Sheet::new();
    assert!(matches!(
        sheet.set_equation("a**"),
        Err(SheetError::Equation { .. })
    ));
    assert!(matches!(
        sheet.set_equation("foo(x)"),
        Err(SheetError::Equation { .. })
    ));
    assert_eq!(sheet.run(), Err(SheetError::NoEquation));
}
