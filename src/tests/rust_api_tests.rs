use crate::{
    Diff, DiffError, Expr, ParseOptions, Simplify, diff, parse, parse_formula, relative_uncertainty,
    simplify, sym, uncertainty_propagation,
};

#[test]
fn test_builder_configuration() {
    let x = sym("x");
    let res = Diff::new().differentiate(x.clone().pow(2.0), &x).unwrap();
    assert_eq!(format!("{}", res), "2*x");

    let a = sym("a");
    let res = Diff::new().fixed_var(&a).diff_str("a*x", "x").unwrap();
    assert_eq!(res, "a");

    let res = Diff::new().fixed_vars(&[&a]).diff_str("a*x^3", "x").unwrap();
    assert_eq!(res, "3*a*x^2");
}

#[test]
fn test_string_api() {
    assert_eq!(diff("x^2 + sin(x)", "x").unwrap(), "2*x + cos(x)");
    assert_eq!(diff("a*x", "y").unwrap(), "0");
    assert_eq!(simplify("x*x + 2*x*x").unwrap(), "3*x^2");
    assert!(matches!(diff("foo(x)", "x"), Err(DiffError::UnknownFunction { .. })));
    assert_eq!(simplify("   "), Err(DiffError::EmptyFormula));
}

#[test]
fn test_underscores_are_stripped() {
    assert_eq!(parse_formula("a_1*x").unwrap(), parse_formula("a1*x").unwrap());
    assert_eq!(diff("a_1*x_2", "x2").unwrap(), "a1");
}

#[test]
fn test_recursion_limits() {
    let mut nested = "x".to_string();
    for _ in 0..20 {
        nested = format!("sin({nested})");
    }
    let tight = ParseOptions {
        max_depth: 10,
        max_nodes: 1000,
    };
    assert_eq!(parse(&nested, &tight), Err(DiffError::MaxDepthExceeded));
    assert!(parse(&nested, &ParseOptions::default()).is_ok());

    let x = sym("x");
    let expr = parse_formula(&nested).unwrap();
    assert_eq!(
        Diff::new().max_depth(5).differentiate(expr, &x),
        Err(DiffError::MaxDepthExceeded)
    );
}

#[test]
fn test_expression_building() {
    let (a, x) = (sym("a"), sym("x"));
    let expr = a * x.clone().pow(3.0) + 1.0;
    assert_eq!(expr.to_string(), "a*x^3 + 1");
    assert_eq!(expr.variables().into_iter().collect::<Vec<_>>(), vec!["a", "x"]);

    let derivative = expr.diff("x").unwrap();
    assert_eq!(derivative.to_string(), "3*a*x^2");
    assert!(Simplify::new().simplify(Expr::number(2.0) * x).is_ok());
}

#[test]
fn test_propagation_entry_points() {
    let f = parse_formula("a*x**3").unwrap();
    let sigma = uncertainty_propagation(&f, &["a", "x"]).unwrap();
    let vars = [("a", 0.5), ("x", 1.0), ("sigma_a", 0.05), ("sigma_x", 0.1)]
        .into_iter()
        .collect();
    let value = sigma.evaluate(&vars).as_number().unwrap();
    assert!((value - 0.158113883).abs() < 1e-9);

    let rel = relative_uncertainty(&f, &["a"]).unwrap();
    let vars = [("a", 0.5), ("x", 2.0), ("sigma_a", 0.05)].into_iter().collect();
    let value = rel.evaluate(&vars).as_number().unwrap();
    assert!((value - 0.1).abs() < 1e-12);
}
