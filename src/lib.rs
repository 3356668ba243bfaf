//! Symbolic propagation of measurement uncertainty
//!
//! Give a formula and named measured quantities; the crate derives the
//! propagated error formula with partial derivatives, substitutes the
//! numbers and typesets both formulas as LaTeX.
//!
//! # Features
//! - Formula parser (`**` or `^`, implicit multiplication, `Rational(a, b)`)
//! - Symbolic differentiation with a rule-based simplifier
//! - Gaussian error propagation σ_f = sqrt(Σ (∂f/∂xᵢ · σᵢ)²)
//! - [`Sheet`]: cached error formula, batch evaluation over tables, LaTeX reports
//!
//! # Usage Examples
//!
//! ## Sheet
//! ```
//! use maabara::{BatchMode, Dataset, Sheet};
//!
//! let mut sheet = Sheet::with_equation("a*x**3").unwrap();
//! sheet.set_error("a", 0.05).unwrap();
//!
//! let data = Dataset::from_rows(&[[0.5, 1.0, 0.1], [0.3, 2.0, 0.15]]).unwrap();
//! let rows = sheet.batch(&data, "a|x|x%", BatchMode::Default).unwrap().pairs();
//! assert_eq!(rows[1].0, 2.4);
//! assert!((rows[0].1 - 0.158113883).abs() < 1e-9);
//! ```
//!
//! ## String API
//! ```
//! use maabara::diff;
//! assert_eq!(diff("a*x^3", "x").unwrap(), "3*a*x^2");
//! ```
//!
//! ## Type-safe API
//! ```
//! use maabara::{sym, uncertainty_propagation};
//! let (a, x) = (sym("a"), sym("x"));
//! let f = a * x.pow(3.0);
//! let sigma = uncertainty_propagation(&f, &["a"]).unwrap();
//! assert_eq!(sigma.to_string(), "sigma_a*x^3");
//! ```

mod ast;
mod builder;
mod differentiation;
mod display;
mod error;
mod functions;
mod helpers;
mod parser;
mod sheet;
mod simplification;
mod symbol;
mod uncertainty;

#[cfg(test)]
mod tests;

// Re-export key types for easier usage
pub use ast::{Expr, ExprKind};
pub use builder::{Diff, Simplify};
pub use display::{LatexOptions, MulSymbol, symbol_to_latex};
pub use error::{DiffError, Quantity, SheetError, Span};
pub use helpers::{is_valid_name, normalize_name};
pub use parser::{ParseOptions, parse, parse_formula};
pub use sheet::{
    BatchMode, BatchOutput, Binding, ColumnBinding, Dataset, Deviation, Evaluation, Field,
    FieldMap, FieldToken, FieldValue, Measurement, Message, MessageLevel, MessageLog,
    PrintMode, Registry, Renderer, Report, ResultMode, ResultValue, Sheet, SheetConfig,
    SheetState, UnresolvedPolicy, Variable,
};
pub use symbol::{InternedSymbol, Symbol, sym};
pub use uncertainty::{SIGMA_PREFIX, relative_uncertainty, sigma_name, uncertainty_propagation};

/// Default maximum AST depth
pub const DEFAULT_MAX_DEPTH: usize = 100;
/// Default maximum AST node count
pub const DEFAULT_MAX_NODES: usize = 10_000;

/// Differentiate a formula string
///
/// # Example
/// ```
/// let result = maabara::diff("x^2 + sin(x)", "x").unwrap();
/// assert_eq!(result, "2*x + cos(x)");
/// ```
///
/// # Note
/// For more control (fixed variables, limits), use the [`Diff`] builder.
pub fn diff(formula: &str, var_to_diff: &str) -> Result<String, DiffError> {
    Diff::new()
        .max_depth(DEFAULT_MAX_DEPTH)
        .max_nodes(DEFAULT_MAX_NODES)
        .diff_str(formula, var_to_diff)
}

/// Simplify a formula string
///
/// # Example
/// ```
/// assert_eq!(maabara::simplify("x*x + 2*x*x").unwrap(), "3*x^2");
/// ```
pub fn simplify(formula: &str) -> Result<String, DiffError> {
    Simplify::new()
        .max_depth(DEFAULT_MAX_DEPTH)
        .max_nodes(DEFAULT_MAX_NODES)
        .simplify_str(formula)
}
