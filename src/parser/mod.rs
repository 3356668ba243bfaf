//! Parser module - converts formula strings to AST
mod implicit_mul;
mod lexer;
mod pratt;
mod tokens;

use crate::helpers::normalize_name;
use crate::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_NODES, DiffError, Expr};

/// Safety limits applied while parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    pub max_depth: usize,
    pub max_nodes: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            max_depth: DEFAULT_MAX_DEPTH,
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

/// Parse a formula string into an expression AST
///
/// Underscores are stripped before tokenizing, so `a_1*x` and `a1*x`
/// produce the same tree. Power may be written `**` or `^`.
///
/// # Example
/// ```
/// use maabara::{parse, ParseOptions};
///
/// let expr = parse("a_1 * x**3", &ParseOptions::default()).unwrap();
/// assert_eq!(expr.to_string(), "a1*x^3");
/// ```
///
/// # Errors
/// Returns `DiffError` if:
/// - The input is empty
/// - The input contains invalid syntax or unknown functions
/// - Parentheses are unbalanced
/// - The tree exceeds the configured depth or node limits
pub fn parse(input: &str, options: &ParseOptions) -> Result<Expr, DiffError> {
    // Pipeline: validate -> normalize -> balance check -> lex -> implicit_mul -> parse

    if input.trim().is_empty() {
        return Err(DiffError::EmptyFormula);
    }

    let normalized = normalize_name(input);
    if normalized.trim().is_empty() {
        return Err(DiffError::EmptyFormula);
    }

    lexer::check_parentheses(&normalized)?;

    let tokens = lexer::lex(&normalized)?;
    let tokens = implicit_mul::insert_implicit_multiplication(tokens);
    let expr = pratt::parse_expression(&tokens, options.max_depth)?;

    if expr.max_depth() > options.max_depth {
        return Err(DiffError::MaxDepthExceeded);
    }
    if expr.node_count() > options.max_nodes {
        return Err(DiffError::MaxNodesExceeded);
    }

    Ok(expr)
}

/// Parse with default limits
pub fn parse_formula(input: &str) -> Result<Expr, DiffError> {
    parse(input, &ParseOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExprKind;

    #[test]
    fn test_underscores_are_stripped() {
        assert_eq!(parse_formula("a_1*x").unwrap(), parse_formula("a1*x").unwrap());
    }

    #[test]
    fn test_implicit_multiplication() {
        assert_eq!(parse_formula("2x").unwrap(), parse_formula("2*x").unwrap());
        assert_eq!(
            parse_formula("2 sin(x)").unwrap(),
            parse_formula("2*sin(x)").unwrap()
        );
        assert_eq!(parse_formula("(a)(b)").unwrap(), parse_formula("a*b").unwrap());
    }

    #[test]
    fn test_unary_minus_binds_looser_than_power() {
        let expr = parse_formula("-x**2").unwrap();
        match &expr.kind {
            ExprKind::Mul(coeff, rest) => {
                assert_eq!(coeff.as_number(), Some(-1.0));
                assert!(matches!(rest.kind, ExprKind::Pow(_, _)));
            }
            _ => panic!("Expected -1 * x^2, got {expr:?}"),
        }
    }

    #[test]
    fn test_rational() {
        let expr = parse_formula("Rational(1, 2)*x").unwrap();
        assert_eq!(expr.to_string(), "1/2*x");
        assert!(matches!(
            parse_formula("Rational(x, 2)"),
            Err(DiffError::InvalidSyntax { .. })
        ));
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse_formula("   "), Err(DiffError::EmptyFormula));
        assert_eq!(parse_formula("___"), Err(DiffError::EmptyFormula));
        assert!(parse_formula("a +").is_err());
        assert!(parse_formula("(a + b").is_err());
        assert!(parse_formula("a ** * b").is_err());
        assert!(matches!(
            parse_formula("sin(x, y)"),
            Err(DiffError::InvalidArity { .. })
        ));
        assert!(matches!(
            parse_formula("g(x)"),
            Err(DiffError::UnknownFunction { .. })
        ));
    }

    #[test]
    fn test_node_limit() {
        let options = ParseOptions {
            max_depth: DEFAULT_MAX_DEPTH,
            max_nodes: 5,
        };
        assert_eq!(
            parse("a + b + c + d", &options),
            Err(DiffError::MaxNodesExceeded)
        );
    }
}
