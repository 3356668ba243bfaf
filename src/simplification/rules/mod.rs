use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::Expr;

/// Expression kind for fast rule filtering
/// Rules declare which expression kinds they can apply to
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) enum ExprKind {
    Number,
    Symbol,
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Function, // Any function call
}

impl ExprKind {
    const ALL: [ExprKind; 8] = [
        ExprKind::Number,
        ExprKind::Symbol,
        ExprKind::Add,
        ExprKind::Sub,
        ExprKind::Mul,
        ExprKind::Div,
        ExprKind::Pow,
        ExprKind::Function,
    ];

    /// Get the kind of an expression (cheap O(1) operation)
    #[inline]
    pub(crate) fn of(expr: &Expr) -> Self {
        use crate::ExprKind as AstKind;
        match &expr.kind {
            AstKind::Number(_) => ExprKind::Number,
            AstKind::Symbol(_) => ExprKind::Symbol,
            AstKind::Add(_, _) => ExprKind::Add,
            AstKind::Sub(_, _) => ExprKind::Sub,
            AstKind::Mul(_, _) => ExprKind::Mul,
            AstKind::Div(_, _) => ExprKind::Div,
            AstKind::Pow(_, _) => ExprKind::Pow,
            AstKind::FunctionCall { .. } => ExprKind::Function,
        }
    }
}

/// Core trait for all simplification rules
pub(crate) trait Rule {
    fn name(&self) -> &'static str;
    fn priority(&self) -> i32;
    fn category(&self) -> RuleCategory;

    /// Rules that only hold on part of the real domain (e.g. `exp(ln(x)) = x`)
    fn alters_domain(&self) -> bool {
        false
    }

    /// Which expression kinds this rule can apply to.
    /// Rules will ONLY be checked against expressions matching these kinds.
    fn applies_to(&self) -> &'static [ExprKind];

    fn apply(&self, expr: &Expr, context: &RuleContext) -> Option<Expr>;
}

/// Categories of simplification rules
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum RuleCategory {
    Numeric,   // Constant folding, identities
    Algebraic, // Term and factor collection, powers
    Exponential,
    Root,
}

/// Context passed to rules during application
#[derive(Clone, Debug, Default)]
pub(crate) struct RuleContext {
    pub depth: usize,
    pub domain_safe: bool,
    /// Treat every symbol as positive: `sqrt(x^2) = x`, `(x^2)^(1/2) = x`
    pub assume_positive: bool,
}

impl RuleContext {
    pub(crate) fn with_domain_safe(mut self, domain_safe: bool) -> Self {
        self.domain_safe = domain_safe;
        self
    }

    pub(crate) fn with_assume_positive(mut self, assume_positive: bool) -> Self {
        self.assume_positive = assume_positive;
        self
    }

    #[inline]
    pub(crate) fn set_depth(&mut self, depth: usize) {
        self.depth = depth;
    }
}

/// Declare a unit struct implementing [`Rule`] from a closure body
macro_rules! rule {
    ($name:ident, $rule_name:literal, $priority:expr, $category:ident, $kinds:expr, alters_domain: $alters:expr, $body:expr) => {
        pub(crate) struct $name;

        impl $crate::simplification::rules::Rule for $name {
            fn name(&self) -> &'static str {
                $rule_name
            }

            fn priority(&self) -> i32 {
                $priority
            }

            fn category(&self) -> $crate::simplification::rules::RuleCategory {
                $crate::simplification::rules::RuleCategory::$category
            }

            fn alters_domain(&self) -> bool {
                $alters
            }

            fn applies_to(&self) -> &'static [$crate::simplification::rules::ExprKind] {
                $kinds
            }

            fn apply(
                &self,
                expr: &$crate::Expr,
                context: &$crate::simplification::rules::RuleContext,
            ) -> Option<$crate::Expr> {
                ($body)(expr, context)
            }
        }
    };
    ($name:ident, $rule_name:literal, $priority:expr, $category:ident, $kinds:expr, $body:expr) => {
        rule!($name, $rule_name, $priority, $category, $kinds, alters_domain: false, $body);
    };
}

/// Numeric simplification rules
pub(crate) mod numeric;

/// Algebraic simplification rules
pub(crate) mod algebraic;

/// Exponential and logarithmic simplification rules
pub(crate) mod exponential;

/// Root simplification rules
pub(crate) mod root;

pub(crate) type SharedRule = Arc<dyn Rule + Send + Sync>;

/// Rule Registry for dynamic loading and dependency management
pub(crate) struct RuleRegistry {
    pub(crate) rules: Vec<SharedRule>,
    /// Rules indexed by expression kind for fast lookup
    rules_by_kind: FxHashMap<ExprKind, Vec<SharedRule>>,
}

impl RuleRegistry {
    pub(crate) fn new() -> Self {
        Self {
            rules: Vec::new(),
            rules_by_kind: FxHashMap::default(),
        }
    }

    pub(crate) fn load_all_rules(&mut self) {
        self.rules.extend(numeric::get_numeric_rules());
        self.rules.extend(algebraic::get_algebraic_rules());
        self.rules.extend(exponential::get_exponential_rules());
        self.rules.extend(root::get_root_rules());
    }

    /// Sort by priority (higher first) and build the kind index
    pub(crate) fn order_by_dependencies(&mut self) {
        // Stable sort keeps category order among equal priorities
        self.rules.sort_by_key(|r| std::cmp::Reverse(r.priority()));
        self.build_kind_index();
    }

    fn build_kind_index(&mut self) {
        self.rules_by_kind.clear();
        for kind in ExprKind::ALL {
            self.rules_by_kind.insert(kind, Vec::new());
        }

        for rule in &self.rules {
            for &kind in rule.applies_to() {
                if let Some(rules) = self.rules_by_kind.get_mut(&kind) {
                    rules.push(Arc::clone(rule));
                }
            }
        }
    }

    /// Get only rules that apply to a specific expression kind
    #[inline]
    pub(crate) fn get_rules_for_kind(&self, kind: ExprKind) -> &[SharedRule] {
        self.rules_by_kind
            .get(&kind)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}
