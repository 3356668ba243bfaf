//! Core simplification engine with rule-based architecture
//!
//! Implements bottom-up tree traversal, rule application with memoization,
//! cycle detection, and configurable limits (iterations, depth).

use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use rustc_hash::{FxHashMap, FxHashSet, FxHasher};

use super::rules::{ExprKind, RuleContext, RuleRegistry};
use crate::{Expr, ExprKind as AstKind};

/// Default cache capacity per rule before clearing (10K entries)
const DEFAULT_CACHE_CAPACITY: usize = 10_000;

pub(crate) const DEFAULT_MAX_ITERATIONS: usize = 1000;
pub(crate) const DEFAULT_SIMPLIFY_DEPTH: usize = 50;

/// Global rule registry singleton - built once, reused across all simplifications
fn global_registry() -> &'static RuleRegistry {
    static REGISTRY: OnceLock<RuleRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut registry = RuleRegistry::new();
        registry.load_all_rules();
        registry.order_by_dependencies();
        registry
    })
}

fn fingerprint(expr: &Expr) -> u64 {
    let mut hasher = FxHasher::default();
    expr.hash(&mut hasher);
    hasher.finish()
}

/// Main simplification engine with rule-based architecture
pub(crate) struct Simplifier {
    /// Per-rule caches keyed by expression id, cleared when exceeding capacity
    rule_caches: FxHashMap<&'static str, FxHashMap<u64, Option<Arc<Expr>>>>,
    cache_capacity: usize,
    max_iterations: usize,
    max_depth: usize,
    context: RuleContext,
}

impl Default for Simplifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Simplifier {
    pub(crate) fn new() -> Self {
        Self {
            rule_caches: FxHashMap::default(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_depth: DEFAULT_SIMPLIFY_DEPTH,
            context: RuleContext::default(),
        }
    }

    pub(crate) fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub(crate) fn with_domain_safe(mut self, domain_safe: bool) -> Self {
        self.context = self.context.with_domain_safe(domain_safe);
        self
    }

    pub(crate) fn with_assume_positive(mut self, assume_positive: bool) -> Self {
        self.context = self.context.with_assume_positive(assume_positive);
        self
    }

    /// Main simplification entry point
    pub(crate) fn simplify(&mut self, expr: Expr) -> Expr {
        let mut current = Arc::new(expr);
        let mut iterations = 0;
        let mut seen: FxHashSet<u64> = FxHashSet::default();

        loop {
            if iterations >= self.max_iterations {
                log::warn!(
                    "simplification exceeded maximum iterations ({})",
                    self.max_iterations
                );
                break;
            }

            let original = Arc::clone(&current);
            current = self.apply_rules_bottom_up(current, 0);
            log::trace!("iteration {iterations}: {original} -> {current}");

            if *current == *original {
                break;
            }

            // Structural fingerprint: seeing one twice means the rules cycle
            if !seen.insert(fingerprint(&current)) {
                log::trace!("cycle detected, stopping at {current}");
                break;
            }

            iterations += 1;
        }

        Arc::try_unwrap(current).unwrap_or_else(|rc| (*rc).clone())
    }

    fn rebuild_binary(
        &mut self,
        expr: &Arc<Expr>,
        u: &Arc<Expr>,
        v: &Arc<Expr>,
        depth: usize,
        make: fn(Arc<Expr>, Arc<Expr>) -> AstKind,
    ) -> Arc<Expr> {
        let u_simplified = self.apply_rules_bottom_up(Arc::clone(u), depth + 1);
        let v_simplified = self.apply_rules_bottom_up(Arc::clone(v), depth + 1);

        if Arc::ptr_eq(&u_simplified, u) && Arc::ptr_eq(&v_simplified, v) {
            self.apply_rules_to_node(Arc::clone(expr), depth)
        } else {
            let new_expr = Arc::new(Expr::new(make(u_simplified, v_simplified)));
            self.apply_rules_to_node(new_expr, depth)
        }
    }

    /// Apply rules bottom-up through the expression tree
    fn apply_rules_bottom_up(&mut self, expr: Arc<Expr>, depth: usize) -> Arc<Expr> {
        if depth > self.max_depth {
            return expr;
        }

        match &expr.kind {
            AstKind::Add(u, v) => self.rebuild_binary(&expr, u, v, depth, AstKind::Add),
            AstKind::Sub(u, v) => self.rebuild_binary(&expr, u, v, depth, AstKind::Sub),
            AstKind::Mul(u, v) => self.rebuild_binary(&expr, u, v, depth, AstKind::Mul),
            AstKind::Div(u, v) => self.rebuild_binary(&expr, u, v, depth, AstKind::Div),
            AstKind::Pow(u, v) => self.rebuild_binary(&expr, u, v, depth, AstKind::Pow),
            AstKind::FunctionCall { name, args } => {
                let args_simplified: Vec<Arc<Expr>> = args
                    .iter()
                    .map(|arg| self.apply_rules_bottom_up(Arc::new(arg.clone()), depth + 1))
                    .collect();

                let changed = args_simplified
                    .iter()
                    .zip(args.iter())
                    .any(|(new, old)| new.id != old.id);

                if !changed {
                    self.apply_rules_to_node(expr, depth)
                } else {
                    let args = args_simplified
                        .into_iter()
                        .map(|a| Arc::try_unwrap(a).unwrap_or_else(|rc| (*rc).clone()))
                        .collect();
                    let new_expr = Arc::new(Expr::func_multi(name.clone(), args));
                    self.apply_rules_to_node(new_expr, depth)
                }
            }
            _ => self.apply_rules_to_node(expr, depth),
        }
    }

    /// Apply all applicable rules to a single node in priority order
    fn apply_rules_to_node(&mut self, mut current: Arc<Expr>, depth: usize) -> Arc<Expr> {
        self.context.set_depth(depth);

        let kind = ExprKind::of(current.as_ref());
        let applicable_rules = global_registry().get_rules_for_kind(kind);

        for rule in applicable_rules {
            if self.context.domain_safe && rule.alters_domain() {
                continue;
            }

            let rule_name = rule.name();
            let cache_key = current.id;

            if let Some(cached) = self
                .rule_caches
                .get(rule_name)
                .and_then(|cache| cache.get(&cache_key))
            {
                if let Some(new_expr) = cached {
                    current = Arc::clone(new_expr);
                }
                continue;
            }

            let result = rule.apply(&current, &self.context).map(Arc::new);
            if let Some(new_expr) = &result {
                log::trace!("{rule_name}: {current} => {new_expr}");
            }

            let cache = self.rule_caches.entry(rule_name).or_default();
            if cache.len() >= self.cache_capacity {
                cache.clear();
            }
            cache.insert(cache_key, result.clone());

            if let Some(new_expr) = result {
                current = new_expr;
            }
        }

        current
    }
}
