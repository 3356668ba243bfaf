//! Abstract Syntax Tree for mathematical expressions

use std::collections::BTreeSet;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashMap;

use crate::functions::registry::Registry;
use crate::helpers;
use crate::symbol::{InternedSymbol, get_or_intern};

/// Global counter for expression IDs
static EXPR_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_id() -> u64 {
    EXPR_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone)]
pub struct Expr {
    /// Unique per constructed node, not part of equality.
    /// Clones keep the id, so it identifies a cached expression object.
    pub id: u64,
    pub kind: ExprKind,
}

impl Deref for Expr {
    type Target = ExprKind;

    fn deref(&self) -> &Self::Target {
        &self.kind
    }
}

// Structural equality on KIND only
impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Eq for Expr {}

impl std::hash::Hash for Expr {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Constant number (e.g., 3.14, 1e10)
    Number(f64),

    /// Variable or constant symbol (e.g., "x", "sigma_x", "pi")
    Symbol(InternedSymbol),

    /// Call of a registry function
    FunctionCall { name: String, args: Vec<Expr> },

    Add(Arc<Expr>, Arc<Expr>),
    Sub(Arc<Expr>, Arc<Expr>),
    Mul(Arc<Expr>, Arc<Expr>),
    Div(Arc<Expr>, Arc<Expr>),
    Pow(Arc<Expr>, Arc<Expr>),
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Expr {
            id: next_id(),
            kind,
        }
    }

    /// Return the value if this is a constant number
    pub fn as_number(&self) -> Option<f64> {
        match &self.kind {
            ExprKind::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Return the symbol name if this is a bare symbol
    pub fn as_symbol(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Symbol(s) => Some(s.as_str()),
            _ => None,
        }
    }

    #[inline]
    pub fn is_zero_num(&self) -> bool {
        self.as_number().is_some_and(helpers::is_zero)
    }

    #[inline]
    pub fn is_one_num(&self) -> bool {
        self.as_number().is_some_and(helpers::is_one)
    }

    #[inline]
    pub fn is_neg_one_num(&self) -> bool {
        self.as_number().is_some_and(helpers::is_neg_one)
    }

    // Convenience constructors

    pub fn number(n: f64) -> Self {
        Expr::new(ExprKind::Number(n))
    }

    /// Create a symbol expression, interning the name
    pub fn symbol(s: impl AsRef<str>) -> Self {
        Expr::new(ExprKind::Symbol(get_or_intern(s.as_ref())))
    }

    pub(crate) fn from_interned(interned: InternedSymbol) -> Self {
        Expr::new(ExprKind::Symbol(interned))
    }

    pub fn add_expr(left: Expr, right: Expr) -> Self {
        Expr::new(ExprKind::Add(Arc::new(left), Arc::new(right)))
    }

    pub fn sub_expr(left: Expr, right: Expr) -> Self {
        Expr::new(ExprKind::Sub(Arc::new(left), Arc::new(right)))
    }

    pub fn mul_expr(left: Expr, right: Expr) -> Self {
        Expr::new(ExprKind::Mul(Arc::new(left), Arc::new(right)))
    }

    pub fn div_expr(left: Expr, right: Expr) -> Self {
        Expr::new(ExprKind::Div(Arc::new(left), Arc::new(right)))
    }

    pub fn pow(base: Expr, exponent: Expr) -> Self {
        Expr::new(ExprKind::Pow(Arc::new(base), Arc::new(exponent)))
    }

    /// Create a single-argument function call
    pub fn func(name: impl Into<String>, content: Expr) -> Self {
        Expr::new(ExprKind::FunctionCall {
            name: name.into(),
            args: vec![content],
        })
    }

    pub fn func_multi(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::new(ExprKind::FunctionCall {
            name: name.into(),
            args,
        })
    }

    // Analysis methods

    /// Count the total number of nodes in the AST
    pub fn node_count(&self) -> usize {
        match &self.kind {
            ExprKind::Number(_) | ExprKind::Symbol(_) => 1,
            ExprKind::FunctionCall { args, .. } => {
                1 + args.iter().map(|a| a.node_count()).sum::<usize>()
            }
            ExprKind::Add(l, r)
            | ExprKind::Sub(l, r)
            | ExprKind::Mul(l, r)
            | ExprKind::Div(l, r)
            | ExprKind::Pow(l, r) => 1 + l.node_count() + r.node_count(),
        }
    }

    /// Get the maximum nesting depth of the AST
    pub fn max_depth(&self) -> usize {
        match &self.kind {
            ExprKind::Number(_) | ExprKind::Symbol(_) => 1,
            ExprKind::FunctionCall { args, .. } => {
                1 + args.iter().map(|a| a.max_depth()).max().unwrap_or(0)
            }
            ExprKind::Add(l, r)
            | ExprKind::Sub(l, r)
            | ExprKind::Mul(l, r)
            | ExprKind::Div(l, r)
            | ExprKind::Pow(l, r) => 1 + l.max_depth().max(r.max_depth()),
        }
    }

    /// Check if the expression contains a specific variable
    pub fn contains_var(&self, var: &str) -> bool {
        match &self.kind {
            ExprKind::Number(_) => false,
            ExprKind::Symbol(s) => s == var,
            ExprKind::FunctionCall { args, .. } => args.iter().any(|a| a.contains_var(var)),
            ExprKind::Add(l, r)
            | ExprKind::Sub(l, r)
            | ExprKind::Mul(l, r)
            | ExprKind::Div(l, r)
            | ExprKind::Pow(l, r) => l.contains_var(var) || r.contains_var(var),
        }
    }

    /// Collect all symbol names in the expression, sorted
    pub fn variables(&self) -> BTreeSet<String> {
        self.fold(BTreeSet::new(), |mut vars, node| {
            if let ExprKind::Symbol(s) = &node.kind {
                vars.insert(s.as_str().to_string());
            }
            vars
        })
    }

    /// Fold over the expression tree in pre-order (parent before children)
    pub fn fold<T, F>(&self, init: T, f: F) -> T
    where
        F: Fn(T, &Expr) -> T + Copy,
    {
        let acc = f(init, self);
        match &self.kind {
            ExprKind::Number(_) | ExprKind::Symbol(_) => acc,
            ExprKind::FunctionCall { args, .. } => args.iter().fold(acc, |a, arg| arg.fold(a, f)),
            ExprKind::Add(l, r)
            | ExprKind::Sub(l, r)
            | ExprKind::Mul(l, r)
            | ExprKind::Div(l, r)
            | ExprKind::Pow(l, r) => {
                let acc = l.fold(acc, f);
                r.fold(acc, f)
            }
        }
    }

    /// Transform the tree in post-order (children before parent)
    pub fn map<F>(&self, f: F) -> Expr
    where
        F: Fn(&Expr) -> Expr + Copy,
    {
        let transformed = match &self.kind {
            ExprKind::Number(_) | ExprKind::Symbol(_) => self.clone(),
            ExprKind::FunctionCall { name, args } => Expr::new(ExprKind::FunctionCall {
                name: name.clone(),
                args: args.iter().map(|arg| arg.map(f)).collect(),
            }),
            ExprKind::Add(a, b) => Expr::add_expr(a.map(f), b.map(f)),
            ExprKind::Sub(a, b) => Expr::sub_expr(a.map(f), b.map(f)),
            ExprKind::Mul(a, b) => Expr::mul_expr(a.map(f), b.map(f)),
            ExprKind::Div(a, b) => Expr::div_expr(a.map(f), b.map(f)),
            ExprKind::Pow(a, b) => Expr::pow(a.map(f), b.map(f)),
        };
        f(&transformed)
    }

    /// Substitute a variable with another expression
    pub fn substitute(&self, var: &str, replacement: &Expr) -> Expr {
        self.map(|node| {
            if let ExprKind::Symbol(s) = &node.kind
                && s == var
            {
                return replacement.clone();
            }
            node.clone()
        })
    }

    /// Substitute several symbols at once
    ///
    /// Replacements are not substituted into each other.
    pub fn substitute_all(&self, replacements: &FxHashMap<&str, Expr>) -> Expr {
        if replacements.is_empty() {
            return self.clone();
        }
        self.substitute_with(replacements)
    }

    fn substitute_with(&self, replacements: &FxHashMap<&str, Expr>) -> Expr {
        match &self.kind {
            ExprKind::Number(_) => self.clone(),
            ExprKind::Symbol(s) => replacements
                .get(s.as_str())
                .cloned()
                .unwrap_or_else(|| self.clone()),
            ExprKind::FunctionCall { name, args } => Expr::new(ExprKind::FunctionCall {
                name: name.clone(),
                args: args.iter().map(|a| a.substitute_with(replacements)).collect(),
            }),
            ExprKind::Add(a, b) => {
                Expr::add_expr(a.substitute_with(replacements), b.substitute_with(replacements))
            }
            ExprKind::Sub(a, b) => {
                Expr::sub_expr(a.substitute_with(replacements), b.substitute_with(replacements))
            }
            ExprKind::Mul(a, b) => {
                Expr::mul_expr(a.substitute_with(replacements), b.substitute_with(replacements))
            }
            ExprKind::Div(a, b) => {
                Expr::div_expr(a.substitute_with(replacements), b.substitute_with(replacements))
            }
            ExprKind::Pow(a, b) => {
                Expr::pow(a.substitute_with(replacements), b.substitute_with(replacements))
            }
        }
    }

    /// Evaluate expression with given variable values
    ///
    /// Performs partial evaluation: known values are substituted and numeric
    /// subtrees folded. Returns a Number if every symbol is defined, otherwise
    /// an expression over the remaining symbols. Division follows IEEE 754, so
    /// a zero denominator yields an infinite or NaN number rather than an
    /// unevaluated quotient.
    pub fn evaluate(&self, vars: &FxHashMap<&str, f64>) -> Expr {
        match &self.kind {
            ExprKind::Number(n) => Expr::number(*n),
            ExprKind::Symbol(s) => match vars.get(s.as_str()) {
                Some(&val) => Expr::number(val),
                None => self.clone(),
            },
            ExprKind::FunctionCall { name, args } => {
                let eval_args: Vec<Expr> = args.iter().map(|a| a.evaluate(vars)).collect();
                let numeric_args: Option<Vec<f64>> =
                    eval_args.iter().map(Expr::as_number).collect();

                if let Some(values) = numeric_args
                    && let Some(def) = Registry::get(name)
                    && let Some(result) = (def.eval)(&values)
                {
                    return Expr::number(result);
                }
                Expr::new(ExprKind::FunctionCall {
                    name: name.clone(),
                    args: eval_args,
                })
            }
            ExprKind::Add(a, b) => {
                let (ea, eb) = (a.evaluate(vars), b.evaluate(vars));
                match (&ea.kind, &eb.kind) {
                    (ExprKind::Number(x), ExprKind::Number(y)) => Expr::number(x + y),
                    _ => Expr::add_expr(ea, eb),
                }
            }
            ExprKind::Sub(a, b) => {
                let (ea, eb) = (a.evaluate(vars), b.evaluate(vars));
                match (&ea.kind, &eb.kind) {
                    (ExprKind::Number(x), ExprKind::Number(y)) => Expr::number(x - y),
                    _ => Expr::sub_expr(ea, eb),
                }
            }
            ExprKind::Mul(a, b) => {
                let (ea, eb) = (a.evaluate(vars), b.evaluate(vars));
                match (&ea.kind, &eb.kind) {
                    (ExprKind::Number(x), ExprKind::Number(y)) => Expr::number(x * y),
                    _ => Expr::mul_expr(ea, eb),
                }
            }
            ExprKind::Div(a, b) => {
                let (ea, eb) = (a.evaluate(vars), b.evaluate(vars));
                match (&ea.kind, &eb.kind) {
                    (ExprKind::Number(x), ExprKind::Number(y)) => Expr::number(x / y),
                    _ => Expr::div_expr(ea, eb),
                }
            }
            // 0^0 evaluates to 1.0 following IEEE 754 powf behavior
            ExprKind::Pow(a, b) => {
                let (ea, eb) = (a.evaluate(vars), b.evaluate(vars));
                match (&ea.kind, &eb.kind) {
                    (ExprKind::Number(x), ExprKind::Number(y)) => Expr::number(x.powf(*y)),
                    _ => Expr::pow(ea, eb),
                }
            }
        }
    }

    /// Differentiate with default options (shorthand for the [`Diff`](crate::Diff) builder)
    pub fn diff(&self, var: &str) -> Result<Expr, crate::DiffError> {
        crate::Diff::new().differentiate_by_name(self.clone(), var)
    }

    /// Simplify with default options (shorthand for the [`Simplify`](crate::Simplify) builder)
    pub fn simplified(&self) -> Result<Expr, crate::DiffError> {
        crate::Simplify::new().simplify(self.clone())
    }
}

// Manual Hash implementation for ExprKind, needed for cycle detection
impl std::hash::Hash for ExprKind {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            ExprKind::Number(n) => n.to_bits().hash(state),
            ExprKind::Symbol(s) => s.hash(state),
            ExprKind::FunctionCall { name, args } => {
                name.hash(state);
                args.hash(state);
            }
            ExprKind::Add(l, r)
            | ExprKind::Sub(l, r)
            | ExprKind::Mul(l, r)
            | ExprKind::Div(l, r)
            | ExprKind::Pow(l, r) => {
                l.hash(state);
                r.hash(state);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids() {
        let e1 = Expr::number(1.0);
        let e2 = Expr::number(1.0);
        let e3 = Expr::number(2.0);

        assert_ne!(e1.id, e2.id);
        assert_eq!(e1, e2);
        assert_ne!(e1, e3);
        assert_eq!(e1.clone().id, e1.id);
    }

    #[test]
    fn test_node_count_and_depth() {
        let complex = Expr::mul_expr(
            Expr::add_expr(Expr::symbol("x"), Expr::number(1.0)),
            Expr::symbol("y"),
        );
        assert_eq!(complex.node_count(), 5);
        assert_eq!(complex.max_depth(), 3);
    }

    #[test]
    fn test_variables_sorted() {
        let expr = Expr::add_expr(
            Expr::mul_expr(Expr::symbol("y"), Expr::symbol("x")),
            Expr::func("sin", Expr::symbol("a")),
        );
        let vars: Vec<String> = expr.variables().into_iter().collect();
        assert_eq!(vars, vec!["a", "x", "y"]);
        assert!(expr.contains_var("a"));
        assert!(!expr.contains_var("z"));
    }

    #[test]
    fn test_substitute_all_is_simultaneous() {
        let expr = Expr::add_expr(Expr::symbol("x"), Expr::symbol("y"));
        let mut map = FxHashMap::default();
        map.insert("x", Expr::symbol("y"));
        map.insert("y", Expr::number(2.0));
        let result = expr.substitute_all(&map);
        assert_eq!(result, Expr::add_expr(Expr::symbol("y"), Expr::number(2.0)));
    }

    #[test]
    fn test_partial_evaluation() {
        let expr = Expr::add_expr(
            Expr::mul_expr(Expr::symbol("x"), Expr::symbol("y")),
            Expr::number(1.0),
        );
        let mut vars = FxHashMap::default();
        vars.insert("x", 3.0);
        let partial = expr.evaluate(&vars);
        assert!(partial.as_number().is_none());
        assert!(partial.contains_var("y"));

        vars.insert("y", 2.0);
        assert_eq!(expr.evaluate(&vars).as_number(), Some(7.0));
    }

    #[test]
    fn test_evaluate_functions_and_division_by_zero() {
        let mut vars = FxHashMap::default();
        vars.insert("x", 0.0);
        let expr = Expr::func("cos", Expr::symbol("x"));
        assert_eq!(expr.evaluate(&vars).as_number(), Some(1.0));

        let expr = Expr::div_expr(Expr::number(1.0), Expr::symbol("x"));
        assert_eq!(expr.evaluate(&vars).as_number(), Some(f64::INFINITY));
    }
}
