//! Uncertainty sheets: one formula, its variables and the propagated error
//!
//! A [`Sheet`] parses a formula once, derives the error formula only when the
//! formula or the set of deviation-tracked variables changes, and substitutes
//! the current variable values on every run.
//!
//! ```
//! use maabara::{Deviation, Sheet};
//!
//! let mut sheet = Sheet::with_equation("a*x**3").unwrap();
//! sheet.set_value("a", 0.5, 0.05).unwrap();
//! sheet.set_value("x", 2.0, Deviation::Exact).unwrap();
//!
//! let result = sheet.run().unwrap();
//! assert_eq!(result.nominal, 4.0);
//! assert!((result.uncertainty - 0.4).abs() < 1e-12);
//! ```

mod batch;
mod eval;
mod messages;
mod registry;
mod report;

pub use batch::{BatchMode, BatchOutput, ColumnBinding, Dataset, FieldMap, FieldToken};
pub use eval::{Evaluation, UnresolvedPolicy};
pub use messages::{Message, MessageLevel, MessageLog};
pub use registry::{Binding, Deviation, Field, FieldValue, Registry, Variable};
pub use report::{Measurement, PrintMode, Renderer, Report, ResultMode, ResultValue};

use crate::display::{LatexOptions, MulSymbol};
use crate::parser::{self, ParseOptions};
use crate::{
    DEFAULT_MAX_DEPTH, DEFAULT_MAX_NODES, Expr, SheetError, simplification,
    uncertainty_propagation,
};

/// Lifecycle of a sheet's cached error formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetState {
    /// No equation yet
    #[default]
    Created,
    /// Equation set, error formula not (or no longer) derived
    Configured,
    /// Error formula cached and valid for the current tracked variables
    Evaluated,
}

/// Sheet-wide settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetConfig {
    unresolved: UnresolvedPolicy,
    mul_symbol: MulSymbol,
    max_depth: usize,
    max_nodes: usize,
}

impl Default for SheetConfig {
    fn default() -> Self {
        SheetConfig {
            unresolved: UnresolvedPolicy::default(),
            mul_symbol: MulSymbol::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

impl SheetConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// How to treat symbols left over after substitution
    pub fn unresolved(mut self, policy: UnresolvedPolicy) -> Self {
        self.unresolved = policy;
        self
    }

    /// Multiplication sign used in reports
    pub fn mul_symbol(mut self, symbol: MulSymbol) -> Self {
        self.mul_symbol = symbol;
        self
    }

    /// Maximum AST depth accepted for an equation
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Maximum AST node count accepted for an equation
    pub fn max_nodes(mut self, nodes: usize) -> Self {
        self.max_nodes = nodes;
        self
    }
}

#[derive(Debug, Clone)]
struct Equation {
    text: String,
    expr: Expr,
}

#[derive(Debug, Clone)]
struct ErrorCache {
    expr: Expr,
    tracked: Vec<String>,
}

/// One formula bound to a set of named variables
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    config: SheetConfig,
    name: String,
    equation: Option<Equation>,
    error_cache: Option<ErrorCache>,
    registry: Registry,
    messages: MessageLog,
    state: SheetState,
    last_result: Option<Evaluation>,
}

impl Sheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SheetConfig) -> Self {
        Sheet {
            config,
            ..Self::default()
        }
    }

    /// Create a sheet and set its equation
    pub fn with_equation(equation: &str) -> Result<Self, SheetError> {
        let mut sheet = Self::new();
        sheet.set_equation(equation)?;
        Ok(sheet)
    }

    /// Forget name, equation, variables, cached formulas, messages and results
    pub fn reset(&mut self) {
        self.name.clear();
        self.equation = None;
        self.error_cache = None;
        self.registry.clear();
        self.messages.clear();
        self.state = SheetState::Created;
        self.last_result = None;
    }

    /// LaTeX name of the computed quantity, used as prefix in reports
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parse and store the formula; the error formula is rebuilt on the next run
    ///
    /// Setting the same text again keeps the cached error formula.
    ///
    /// # Errors
    /// `SheetError::Equation` when the text does not parse.
    pub fn set_equation(&mut self, text: &str) -> Result<(), SheetError> {
        if self.equation.as_ref().is_some_and(|eq| eq.text == text) {
            return Ok(());
        }

        let options = ParseOptions {
            max_depth: self.config.max_depth,
            max_nodes: self.config.max_nodes,
        };
        let parsed = parser::parse(text, &options).map_err(|source| SheetError::Equation {
            equation: text.to_string(),
            source,
        })?;
        log::debug!("equation set: {parsed}");

        self.equation = Some(Equation {
            text: text.to_string(),
            expr: simplification::simplify_expr(parsed),
        });
        self.invalidate();
        Ok(())
    }

    /// Insert or replace a variable
    pub fn set_variable(&mut self, name: &str, variable: Variable) -> Result<(), SheetError> {
        self.registry.set(name, variable)?;
        self.refresh_state();
        Ok(())
    }

    /// Set a nominal value with an optional deviation
    ///
    /// ```
    /// # use maabara::{Deviation, Sheet};
    /// let mut sheet = Sheet::new();
    /// sheet.set_value("a", 0.5, 0.05).unwrap();
    /// sheet.set_value("x_1", 2.0, Deviation::Exact).unwrap();
    /// assert_eq!(sheet.no_deviation(), vec!["x1"]);
    /// ```
    pub fn set_value(
        &mut self,
        name: &str,
        value: f64,
        deviation: impl Into<Deviation>,
    ) -> Result<(), SheetError> {
        self.set_variable(name, Variable::new().value(value).deviation(deviation))
    }

    /// Set only a deviation, leaving the value unset (e.g. for batch rows)
    pub fn set_error(
        &mut self,
        name: &str,
        deviation: impl Into<Deviation>,
    ) -> Result<(), SheetError> {
        self.set_variable(name, Variable::new().deviation(deviation))
    }

    /// Replace all variables at once; an empty input changes nothing
    pub fn set_data<I, S>(&mut self, data: I) -> Result<(), SheetError>
    where
        I: IntoIterator<Item = (S, Variable)>,
        S: AsRef<str>,
    {
        self.registry.set_data(data)?;
        self.refresh_state();
        Ok(())
    }

    /// Read a field of a variable
    pub fn get(&self, name: &str, field: Field) -> Option<FieldValue> {
        self.registry.get(name, field)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn state(&self) -> SheetState {
        self.state
    }

    /// The parsed (and simplified) formula
    pub fn equation_expr(&self) -> Option<&Expr> {
        self.equation.as_ref().map(|eq| &eq.expr)
    }

    /// The cached error formula, valid once the sheet has been run
    pub fn error_expr(&self) -> Option<&Expr> {
        self.error_cache.as_ref().map(|cache| &cache.expr)
    }

    pub fn last_result(&self) -> Option<&Evaluation> {
        self.last_result.as_ref()
    }

    pub fn messages(&self) -> &MessageLog {
        &self.messages
    }

    /// Variables explicitly marked exact
    pub fn no_deviation(&self) -> Vec<String> {
        self.registry.no_deviation()
    }

    fn invalidate(&mut self) {
        self.error_cache = None;
        self.state = if self.equation.is_some() {
            SheetState::Configured
        } else {
            SheetState::Created
        };
    }

    /// Drop the error formula if the tracked variables no longer match it
    fn refresh_state(&mut self) {
        if let Some(cache) = &self.error_cache
            && cache.tracked != self.registry.tracked()
        {
            log::debug!("tracked variables changed, error formula invalidated");
            self.invalidate();
        }
    }

    /// Derive the error formula (if needed) and evaluate both formulas
    ///
    /// # Errors
    /// - `NoEquation` before an equation is set
    /// - `Diff` when a partial derivative cannot be formed
    /// - `Unresolved` under [`UnresolvedPolicy::Strict`]
    pub fn run(&mut self) -> Result<Evaluation, SheetError> {
        let equation = self.equation.as_ref().ok_or(SheetError::NoEquation)?;

        let tracked = self.registry.tracked();
        let cache = match self.error_cache.take() {
            Some(cache) if cache.tracked == tracked => cache,
            _ => {
                let names: Vec<&str> = tracked.iter().map(String::as_str).collect();
                let expr = uncertainty_propagation(&equation.expr, &names)?;
                log::debug!("error formula: {expr}");
                ErrorCache { expr, tracked }
            }
        };
        let cache = self.error_cache.insert(cache);

        let no_deviation = self.registry.no_deviation();
        if !no_deviation.is_empty() {
            self.messages
                .info(format!("No deviation for {}", no_deviation.join(", ")));
        }

        let evaluation = eval::evaluate(
            &equation.expr,
            &cache.expr,
            &self.registry,
            self.config.unresolved,
            &mut self.messages,
        )?;

        self.state = SheetState::Evaluated;
        self.last_result = Some(evaluation.clone());
        Ok(evaluation)
    }

    /// Run the sheet and shape the result
    pub fn get_result(&mut self, mode: ResultMode) -> Result<ResultValue, SheetError> {
        let evaluation = self.run()?;
        let measurement = evaluation.measurement();
        Ok(match mode {
            ResultMode::Default => ResultValue::Pair(evaluation.nominal, evaluation.uncertainty),
            ResultMode::Exact => {
                let rounded = measurement.rounded(2);
                ResultValue::Pair(rounded.nominal, rounded.uncertainty)
            }
            ResultMode::Measurement => ResultValue::Measurement(measurement),
            ResultMode::Tex(name) => {
                let tex = measurement.to_latex(1);
                ResultValue::Tex(match name {
                    Some(name) => format!("{name}={tex}"),
                    None => tex,
                })
            }
            ResultMode::Print => {
                log::info!("{}\t{}", evaluation.nominal, evaluation.uncertainty);
                ResultValue::Pair(evaluation.nominal, evaluation.uncertainty)
            }
        })
    }

    /// Run the sheet and build the three LaTeX report lines
    ///
    /// Variable labels replace symbol names; `sigma_x` renders as
    /// `\sigma_{label}`.
    pub fn report(&mut self) -> Result<Report, SheetError> {
        let evaluation = self.run()?;
        let labels = self.registry.labels();
        let options = LatexOptions {
            mul_symbol: self.config.mul_symbol,
            labels: Some(&labels),
        };

        let equation = self.equation_expr().map(|e| e.to_latex_with(options));
        let error = self.error_expr().map(|e| e.to_latex_with(options));
        let (Some(equation), Some(error)) = (equation, error) else {
            return Err(SheetError::NoEquation);
        };
        let result = evaluation.measurement().to_latex(1);

        Ok(if self.name.is_empty() {
            Report {
                equation,
                result,
                error,
            }
        } else {
            let name = &self.name;
            Report {
                equation: format!("{name}={equation}"),
                result: format!("{name}={result}"),
                error: format!(r"\sigma_{{{name}}}={error}"),
            }
        })
    }

    /// Send the report to a renderer and return the measurement
    ///
    /// Without a renderer, `Short` writes the lines to the log and `Default`
    /// records a warning.
    pub fn print_result(
        &mut self,
        mode: PrintMode,
        renderer: Option<&mut dyn Renderer>,
    ) -> Result<Measurement, SheetError> {
        let report = self.report()?;
        match (mode, renderer) {
            (PrintMode::Short, Some(renderer)) => {
                report.lines().iter().for_each(|line| renderer.render_text(line));
            }
            (PrintMode::Default, Some(renderer)) => {
                report.lines().iter().for_each(|line| renderer.render_math(line));
            }
            (PrintMode::Short, None) => {
                report.lines().iter().for_each(|line| log::info!("{line}"));
            }
            (PrintMode::Default, None) => {
                self.messages
                    .warn("No renderer available to display LaTeX output");
            }
        }
        self.last_result
            .as_ref()
            .map(Evaluation::measurement)
            .ok_or(SheetError::NoEquation)
    }

    /// Evaluate the sheet once per data row
    ///
    /// Columns are assigned by `fields` (`"a|x|x%"`, `*` skips a column). A
    /// variable missing from the row keeps its registered value or deviation;
    /// registered labels are kept.
    ///
    /// # Errors
    /// - `Shape` if the column count differs from the number of fields; an
    ///   empty dataset yields an empty output instead
    /// - `FieldMapping` / `InvalidName` for a malformed mapping
    /// - any error of [`Sheet::run`]
    pub fn batch(
        &mut self,
        data: &Dataset,
        fields: &str,
        mode: BatchMode,
    ) -> Result<BatchOutput, SheetError> {
        let map = FieldMap::parse(fields)?;
        // A dataset without rows carries no column count to check
        if !data.is_empty() && map.len() != data.columns() {
            return Err(SheetError::Shape {
                columns: data.columns(),
                fields: map.len(),
            });
        }
        if self.equation.is_none() {
            return Err(SheetError::NoEquation);
        }

        let mut output = BatchOutput::with_capacity(mode, data.len());
        for row in data.rows() {
            for column in map.bindings() {
                let existing = self.registry.binding(&column.name);
                let value = column
                    .value
                    .map(|i| row[i])
                    .or_else(|| existing.and_then(Binding::value));
                let deviation = match column.deviation {
                    Some(i) => Deviation::Known(row[i]),
                    None => existing.map(Binding::deviation).unwrap_or_default(),
                };
                let label = existing.and_then(|b| b.label().map(str::to_string));

                self.set_variable(
                    &column.name,
                    Variable {
                        value,
                        deviation,
                        label,
                    },
                )?;
            }
            output.push(mode, self.run()?.measurement());
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> Sheet {
        let mut sheet = Sheet::with_equation("a*x**3").unwrap();
        sheet.set_value("a", 0.5, 0.05).unwrap();
        sheet.set_value("x", 2.0, Deviation::Exact).unwrap();
        sheet
    }

    #[test]
    fn test_state_transitions() {
        let mut sheet = Sheet::new();
        assert_eq!(sheet.state(), SheetState::Created);
        assert_eq!(sheet.run(), Err(SheetError::NoEquation));

        sheet.set_equation("a*x").unwrap();
        assert_eq!(sheet.state(), SheetState::Configured);
        sheet.set_value("a", 1.0, 0.1).unwrap();
        sheet.set_value("x", 1.0, Deviation::Exact).unwrap();
        sheet.run().unwrap();
        assert_eq!(sheet.state(), SheetState::Evaluated);

        // value-only change keeps the cache
        sheet.set_value("a", 2.0, 0.2).unwrap();
        assert_eq!(sheet.state(), SheetState::Evaluated);

        // tracking x changes the tracked set
        sheet.set_value("x", 1.0, 0.1).unwrap();
        assert_eq!(sheet.state(), SheetState::Configured);
        assert!(sheet.error_expr().is_none());

        sheet.reset();
        assert_eq!(sheet.state(), SheetState::Created);
        assert!(sheet.registry().is_empty());
    }

    #[test]
    fn test_same_equation_keeps_cache() {
        let mut sheet = sheet();
        sheet.run().unwrap();
        let id = sheet.error_expr().unwrap().id;
        sheet.set_equation("a*x**3").unwrap();
        assert_eq!(sheet.state(), SheetState::Evaluated);
        assert_eq!(sheet.error_expr().unwrap().id, id);
    }

    #[test]
    fn test_invalid_equation() {
        let mut sheet = Sheet::new();
        let err = sheet.set_equation("a*(x").unwrap_err();
        assert!(matches!(err, SheetError::Equation { ref equation, .. } if equation == "a*(x"));
        assert_eq!(sheet.state(), SheetState::Created);
    }

    #[test]
    fn test_config_limits_apply_to_equation() {
        let mut sheet = Sheet::with_config(SheetConfig::new().max_nodes(3));
        let err = sheet.set_equation("a*x**3").unwrap_err();
        assert!(matches!(
            err,
            SheetError::Equation {
                source: crate::DiffError::MaxNodesExceeded,
                ..
            }
        ));
    }

    #[test]
    fn test_get_result_modes() {
        let mut sheet = sheet();
        let (nominal, uncertainty) = sheet
            .get_result(ResultMode::Default)
            .unwrap()
            .as_pair()
            .unwrap();
        assert_eq!(nominal, 4.0);
        assert!((uncertainty - 0.4).abs() < 1e-12);
        assert_eq!(
            sheet.get_result(ResultMode::Exact).unwrap(),
            ResultValue::Pair(4.0, 0.4)
        );
        assert_eq!(
            sheet.get_result("tex:V".parse().unwrap()).unwrap(),
            ResultValue::Tex(r"V=4.0 \pm 0.4".to_string())
        );
        assert!(matches!(
            sheet.get_result(ResultMode::Measurement).unwrap(),
            ResultValue::Measurement(m) if m.nominal == 4.0
        ));
    }

    #[test]
    fn test_no_deviation_message_once() {
        let mut sheet = sheet();
        sheet.run().unwrap();
        sheet.run().unwrap();
        let notes: Vec<&str> = sheet.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(notes, vec!["No deviation for x"]);
        assert_eq!(sheet.last_result().unwrap().no_deviation, vec!["x"]);
    }
}
