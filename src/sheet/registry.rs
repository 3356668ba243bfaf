//! Variable registry: named bindings of nominal value, deviation and label

use rustc_hash::FxHashMap;

use crate::display::symbol_to_latex;
use crate::helpers::{is_valid_name, normalize_name};
use crate::uncertainty::sigma_name;
use crate::{SheetError, Symbol};

/// Standard deviation attached to a variable
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Deviation {
    /// No deviation: the variable is treated as exact and left out of propagation
    #[default]
    Exact,
    /// Tracked, but `sigma_<name>` stays symbolic
    Symbolic,
    /// Tracked with a numeric standard deviation
    Known(f64),
}

impl Deviation {
    /// Whether the variable takes part in error propagation
    pub fn is_tracked(&self) -> bool {
        !matches!(self, Deviation::Exact)
    }

    pub fn known(&self) -> Option<f64> {
        match self {
            Deviation::Known(sigma) => Some(*sigma),
            _ => None,
        }
    }
}

impl From<f64> for Deviation {
    fn from(sigma: f64) -> Self {
        Deviation::Known(sigma)
    }
}

impl From<Option<f64>> for Deviation {
    fn from(sigma: Option<f64>) -> Self {
        sigma.map_or(Deviation::Exact, Deviation::Known)
    }
}

/// Input for one variable, built fluently
///
/// ```
/// use maabara::{Deviation, Variable};
///
/// let a = Variable::new().value(0.5).deviation(0.05);
/// assert_eq!(a.deviation, Deviation::Known(0.05));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Variable {
    pub value: Option<f64>,
    pub deviation: Deviation,
    pub label: Option<String>,
}

impl Variable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn deviation(mut self, deviation: impl Into<Deviation>) -> Self {
        self.deviation = deviation.into();
        self
    }

    /// LaTeX label used instead of the symbol name in reports
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// A registered variable
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub(crate) name: String,
    pub(crate) symbol: Symbol,
    pub(crate) sigma: Symbol,
    pub(crate) value: Option<f64>,
    pub(crate) deviation: Deviation,
    pub(crate) label: Option<String>,
}

impl Binding {
    /// Normalized name (underscores stripped)
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// The paired error symbol `sigma_<name>`
    pub fn sigma(&self) -> &Symbol {
        &self.sigma
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn deviation(&self) -> Deviation {
        self.deviation
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

/// Field selector for [`Registry::get`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Value,
    Deviation,
    Label,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Value(f64),
    Deviation(Deviation),
    Label(String),
}

/// Ordered set of bindings with a name index
#[derive(Debug, Clone, Default)]
pub struct Registry {
    bindings: Vec<Binding>,
    index: FxHashMap<String, usize>,
}

fn make_binding(name: &str, variable: Variable) -> Result<Binding, SheetError> {
    if !is_valid_name(name) {
        return Err(SheetError::InvalidName {
            name: name.to_string(),
        });
    }
    let normalized = normalize_name(name);
    // a_1 keeps its subscript in reports even though the symbol is a1
    let label = variable
        .label
        .or_else(|| name.contains('_').then(|| symbol_to_latex(name)));

    Ok(Binding {
        symbol: Symbol::new(&normalized),
        sigma: Symbol::new(&sigma_name(&normalized)),
        name: normalized,
        value: variable.value,
        deviation: variable.deviation,
        label,
    })
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or fully replace the binding for `name`
    ///
    /// # Errors
    /// `InvalidName` unless the name is alphanumeric once underscores are removed.
    pub fn set(&mut self, name: &str, variable: Variable) -> Result<(), SheetError> {
        let binding = make_binding(name, variable)?;
        self.upsert(binding);
        Ok(())
    }

    fn upsert(&mut self, binding: Binding) {
        match self.index.get(&binding.name) {
            Some(&i) => self.bindings[i] = binding,
            None => {
                self.index.insert(binding.name.clone(), self.bindings.len());
                self.bindings.push(binding);
            }
        }
    }

    /// Replace every binding at once; an empty input leaves the registry untouched
    ///
    /// All names are validated before anything is replaced.
    pub fn set_data<I, S>(&mut self, data: I) -> Result<(), SheetError>
    where
        I: IntoIterator<Item = (S, Variable)>,
        S: AsRef<str>,
    {
        let bindings = data
            .into_iter()
            .map(|(name, variable)| make_binding(name.as_ref(), variable))
            .collect::<Result<Vec<_>, _>>()?;
        if bindings.is_empty() {
            return Ok(());
        }
        self.clear();
        for binding in bindings {
            self.upsert(binding);
        }
        Ok(())
    }

    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.index
            .get(&normalize_name(name))
            .map(|&i| &self.bindings[i])
    }

    /// Read one field of a binding by user-visible name
    pub fn get(&self, name: &str, field: Field) -> Option<FieldValue> {
        let binding = self.binding(name)?;
        match field {
            Field::Value => binding.value.map(FieldValue::Value),
            Field::Deviation => Some(FieldValue::Deviation(binding.deviation)),
            Field::Label => binding.label.clone().map(FieldValue::Label),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
        self.index.clear();
    }

    /// Names taking part in propagation, in insertion order
    pub fn tracked(&self) -> Vec<String> {
        self.bindings
            .iter()
            .filter(|b| b.deviation.is_tracked())
            .map(|b| b.name.clone())
            .collect()
    }

    /// Names explicitly marked exact, in insertion order
    pub fn no_deviation(&self) -> Vec<String> {
        self.bindings
            .iter()
            .filter(|b| !b.deviation.is_tracked())
            .map(|b| b.name.clone())
            .collect()
    }

    /// Display labels keyed by normalized name
    pub fn labels(&self) -> FxHashMap<String, String> {
        self.bindings
            .iter()
            .filter_map(|b| Some((b.name.clone(), b.label.clone()?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut registry = Registry::new();
        registry
            .set("a", Variable::new().value(0.5).deviation(0.05))
            .unwrap();
        assert_eq!(registry.get("a", Field::Value), Some(FieldValue::Value(0.5)));
        assert_eq!(
            registry.get("a", Field::Deviation),
            Some(FieldValue::Deviation(Deviation::Known(0.05)))
        );
        assert_eq!(registry.get("a", Field::Label), None);
        assert_eq!(registry.get("b", Field::Value), None);
    }

    #[test]
    fn test_invalid_names_rejected() {
        let mut registry = Registry::new();
        for name in ["", "x-1", "a b", "__", "x.y"] {
            assert_eq!(
                registry.set(name, Variable::new()),
                Err(SheetError::InvalidName {
                    name: name.to_string()
                })
            );
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_underscore_names_get_labels() {
        let mut registry = Registry::new();
        registry.set("a_1", Variable::new().value(1.0)).unwrap();
        registry.set("x_max", Variable::new()).unwrap();
        registry.set("alpha_0", Variable::new()).unwrap();
        registry
            .set("T_r", Variable::new().label(r"T_{\mathrm{room}}"))
            .unwrap();

        let binding = registry.binding("a1").unwrap();
        assert_eq!(binding.name(), "a1");
        assert_eq!(binding.sigma().name(), "sigma_a1");
        assert_eq!(binding.label(), Some("a_{1}"));
        assert_eq!(registry.binding("xmax").unwrap().label(), Some("x_{max}"));
        assert_eq!(registry.binding("alpha0").unwrap().label(), Some(r"\alpha_{0}"));
        assert_eq!(
            registry.get("T_r", Field::Label),
            Some(FieldValue::Label(r"T_{\mathrm{room}}".to_string()))
        );
    }

    #[test]
    fn test_upsert_replaces_fully() {
        let mut registry = Registry::new();
        registry
            .set("x", Variable::new().value(2.0).deviation(0.1).label("X"))
            .unwrap();
        registry.set("x", Variable::new().value(3.0)).unwrap();
        assert_eq!(registry.len(), 1);
        let x = registry.binding("x").unwrap();
        assert_eq!(x.value(), Some(3.0));
        assert_eq!(x.deviation(), Deviation::Exact);
        assert_eq!(x.label(), None);
    }

    #[test]
    fn test_tracked_and_exact_lists() {
        let mut registry = Registry::new();
        registry.set("a", Variable::new().deviation(0.1)).unwrap();
        registry.set("b", Variable::new().value(1.0)).unwrap();
        registry
            .set("c", Variable::new().deviation(Deviation::Symbolic))
            .unwrap();
        registry.set("d", Variable::new()).unwrap();
        assert_eq!(registry.tracked(), vec!["a", "c"]);
        assert_eq!(registry.no_deviation(), vec!["b", "d"]);
    }

    #[test]
    fn test_set_data_replaces_when_non_empty() {
        let mut registry = Registry::new();
        registry.set("a", Variable::new().value(1.0)).unwrap();

        registry.set_data(Vec::<(&str, Variable)>::new()).unwrap();
        assert_eq!(registry.len(), 1);

        registry
            .set_data([("x", Variable::new().value(2.0)), ("y", Variable::new())])
            .unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.binding("a").is_none());

        // A bad name leaves the registry as it was
        assert!(registry.set_data([("b-2", Variable::new())]).is_err());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_deviation_conversions() {
        assert_eq!(Deviation::from(0.2), Deviation::Known(0.2));
        assert_eq!(Deviation::from(None), Deviation::Exact);
        assert!(Deviation::Symbolic.is_tracked());
        assert_eq!(Deviation::Symbolic.known(), None);
    }
}
