//! Canonical term handling shared by the simplification rules
//!
//! A term is a rational coefficient times a product of `base^exponent`
//! factors. Rules split expressions into that shape, manipulate it, and
//! rebuild with [`build_product`], so every rule produces the same layout:
//! coefficient first, factors sorted, negative exponents in a denominator.

use std::cmp::Ordering;

use crate::helpers::{gcd, is_integer};
use crate::{Expr, ExprKind};

/// Largest magnitude for which f64 integers are exact
const EXACT_INT_LIMIT: f64 = 9_007_199_254_740_992.0;

/// Decimal places tried when reading a float as a terminating decimal
const MAX_DECIMALS: i32 = 6;

/// Rational coefficient kept as a numerator/denominator pair of floats
///
/// Integer pairs are reduced by their gcd; anything else collapses to a plain
/// decimal with denominator one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Coeff {
    pub num: f64,
    pub den: f64,
}

impl Coeff {
    pub(crate) const ONE: Coeff = Coeff { num: 1.0, den: 1.0 };
    pub(crate) const HALF: Coeff = Coeff { num: 1.0, den: 2.0 };

    pub(crate) fn new(num: f64, den: f64) -> Self {
        let (mut num, mut den) = (num, den);
        if den < 0.0 {
            num = -num;
            den = -den;
        }
        let exact = is_integer(num)
            && is_integer(den)
            && num.abs() < EXACT_INT_LIMIT
            && den.abs() < EXACT_INT_LIMIT;
        if exact && den != 0.0 {
            let g = gcd(num as i64, den as i64);
            if g > 1 {
                let g = g as f64;
                return Coeff {
                    num: num / g,
                    den: den / g,
                };
            }
            return Coeff { num, den };
        }
        if den == 0.0 {
            return Coeff { num, den };
        }
        Coeff {
            num: num / den,
            den: 1.0,
        }
    }

    pub(crate) fn integer(n: f64) -> Self {
        Coeff::new(n, 1.0)
    }

    pub(crate) fn mul(self, other: Coeff) -> Coeff {
        Coeff::new(self.num * other.num, self.den * other.den)
    }

    pub(crate) fn add(self, other: Coeff) -> Coeff {
        Coeff::new(
            self.num * other.den + other.num * self.den,
            self.den * other.den,
        )
    }

    pub(crate) fn neg(self) -> Coeff {
        Coeff {
            num: -self.num,
            den: self.den,
        }
    }

    /// Raise to a power when the result stays an exact rational
    pub(crate) fn pow(self, exp: f64) -> Option<Coeff> {
        if is_integer(exp) {
            let (num, den) = if exp < 0.0 {
                (self.den, self.num)
            } else {
                (self.num, self.den)
            };
            let e = exp.abs();
            return Some(Coeff::new(num.powf(e), den.powf(e)));
        }
        if self.num < 0.0 {
            return None;
        }
        let (num, den) = (self.num.powf(exp), self.den.powf(exp));
        (is_integer(num) && is_integer(den)).then(|| Coeff::new(num, den))
    }

    /// Exact square root, including terminating decimals (`2.25 -> 1.5`)
    pub(crate) fn sqrt(self) -> Option<Coeff> {
        if self.num < 0.0 {
            return None;
        }
        if let Some(root) = self.pow(0.5) {
            return Some(root);
        }
        if self.den != 1.0 || is_integer(self.num) {
            return None;
        }
        let (num, den) = decimal_fraction(self.num)?;
        let root = Coeff::new(num, den).pow(0.5)?;
        Some(Coeff {
            num: root.num / root.den,
            den: 1.0,
        })
    }

    pub(crate) fn value(self) -> f64 {
        self.num / self.den
    }

    /// `n` for whole coefficients and decimals, `n/d` otherwise
    pub(crate) fn to_expr(self) -> Expr {
        if self.den == 1.0 {
            Expr::number(self.num)
        } else {
            Expr::div_expr(Expr::number(self.num), Expr::number(self.den))
        }
    }

    pub(crate) fn is_zero(self) -> bool {
        self.num == 0.0
    }

    pub(crate) fn is_one(self) -> bool {
        self.num == 1.0 && self.den == 1.0
    }
}

/// Integer pair `(n, 10^k)` equal to a terminating decimal
fn decimal_fraction(x: f64) -> Option<(f64, f64)> {
    (1..=MAX_DECIMALS).find_map(|k| {
        let scale = 10f64.powi(k);
        let n = (x * scale).round();
        (n / scale == x && n.abs() < EXACT_INT_LIMIT).then_some((n, scale))
    })
}

/// A `base^exponent` factor of a term
pub(crate) type Factor = (Expr, Expr);

fn collect_factors(expr: &Expr, positive: bool, coeff: &mut Coeff, factors: &mut Vec<Factor>) {
    match &expr.kind {
        ExprKind::Number(n) if positive => *coeff = coeff.mul(Coeff::integer(*n)),
        ExprKind::Number(n) if *n != 0.0 => *coeff = coeff.mul(Coeff::new(1.0, *n)),
        ExprKind::Mul(a, b) => {
            collect_factors(a, positive, coeff, factors);
            collect_factors(b, positive, coeff, factors);
        }
        ExprKind::Div(a, b) => {
            collect_factors(a, positive, coeff, factors);
            collect_factors(b, !positive, coeff, factors);
        }
        ExprKind::Pow(base, exp)
            if !matches!(base.kind, ExprKind::Number(_)) || exp.as_number().is_some() =>
        {
            let exp = exp.as_ref().clone();
            let exp = if positive { exp } else { negate_exponent(exp) };
            factors.push((base.as_ref().clone(), exp));
        }
        _ => {
            let exp = Expr::number(if positive { 1.0 } else { -1.0 });
            factors.push((expr.clone(), exp));
        }
    }
}

fn negate_exponent(exp: Expr) -> Expr {
    match rational_value(&exp) {
        Some(c) => c.neg().to_expr(),
        None => Expr::mul_expr(Expr::number(-1.0), exp),
    }
}

fn add_exponents(a: &Expr, b: &Expr) -> Expr {
    match (rational_value(a), rational_value(b)) {
        (Some(x), Some(y)) => x.add(y).to_expr(),
        _ => Expr::add_expr(a.clone(), b.clone()),
    }
}

/// Split a product/quotient into its coefficient and merged, sorted factors
pub(crate) fn split_term(expr: &Expr) -> (Coeff, Vec<Factor>) {
    let mut coeff = Coeff::ONE;
    let mut raw = Vec::new();
    collect_factors(expr, true, &mut coeff, &mut raw);

    let mut merged: Vec<Factor> = Vec::with_capacity(raw.len());
    for (base, exp) in raw {
        match merged.iter_mut().find(|(b, _)| *b == base) {
            Some(entry) => entry.1 = add_exponents(&entry.1, &exp),
            None => merged.push((base, exp)),
        }
    }
    merged.retain(|(_, exp)| !exp.is_zero_num());
    merged.sort_by(|a, b| compare_expr(&a.0, &b.0).then_with(|| compare_expr(&a.1, &b.1)));
    (coeff, merged)
}

fn pow_of(base: Expr, exp: Expr) -> Expr {
    if exp.is_one_num() {
        base
    } else {
        Expr::pow(base, exp)
    }
}

fn product(parts: Vec<Expr>) -> Option<Expr> {
    parts.into_iter().reduce(Expr::mul_expr)
}

/// Rebuild a term from its coefficient and factors in canonical layout
pub(crate) fn build_product(coeff: Coeff, factors: Vec<Factor>) -> Expr {
    if coeff.is_zero() {
        return Expr::number(0.0);
    }

    let mut numerator = Vec::with_capacity(factors.len() + 1);
    let mut denominator = Vec::new();

    if coeff.num != 1.0 {
        numerator.push(Expr::number(coeff.num));
    }
    if coeff.den != 1.0 {
        denominator.push(Expr::number(coeff.den));
    }

    for (base, exp) in factors {
        match rational_value(&exp) {
            Some(c) if c.is_zero() => {}
            Some(c) if c.num < 0.0 => denominator.push(pow_of(base, c.neg().to_expr())),
            _ => numerator.push(pow_of(base, exp)),
        }
    }

    let numerator = product(numerator).unwrap_or_else(|| Expr::number(1.0));
    match product(denominator) {
        Some(den) => Expr::div_expr(numerator, den),
        None => numerator,
    }
}

/// Flatten a sum into signed terms
pub(crate) fn flatten_sum(expr: &Expr, negate: bool, terms: &mut Vec<(Coeff, Vec<Factor>)>) {
    match &expr.kind {
        ExprKind::Add(a, b) => {
            flatten_sum(a, negate, terms);
            flatten_sum(b, negate, terms);
        }
        ExprKind::Sub(a, b) => {
            flatten_sum(a, negate, terms);
            flatten_sum(b, !negate, terms);
        }
        _ => {
            let (coeff, factors) = split_term(expr);
            terms.push((if negate { coeff.neg() } else { coeff }, factors));
        }
    }
}

fn kind_rank(expr: &Expr) -> u8 {
    match &expr.kind {
        ExprKind::Number(_) => 0,
        ExprKind::Symbol(_) => 1,
        ExprKind::FunctionCall { .. } => 2,
        ExprKind::Pow(_, _) => 3,
        ExprKind::Mul(_, _) => 4,
        ExprKind::Div(_, _) => 5,
        ExprKind::Add(_, _) | ExprKind::Sub(_, _) => 6,
    }
}

/// Deterministic total order used to sort factors and terms
pub(crate) fn compare_expr(a: &Expr, b: &Expr) -> Ordering {
    match (&a.kind, &b.kind) {
        (ExprKind::Number(x), ExprKind::Number(y)) => x.total_cmp(y),
        (ExprKind::Symbol(x), ExprKind::Symbol(y)) => x.as_str().cmp(y.as_str()),
        (ExprKind::Pow(b1, e1), ExprKind::Pow(b2, e2)) => {
            compare_expr(b1, b2).then_with(|| compare_expr(e1, e2))
        }
        (
            ExprKind::FunctionCall { name: n1, args: a1 },
            ExprKind::FunctionCall { name: n2, args: a2 },
        ) => n1.cmp(n2).then_with(|| {
            a1.iter()
                .zip(a2.iter())
                .map(|(x, y)| compare_expr(x, y))
                .find(|o| o.is_ne())
                .unwrap_or_else(|| a1.len().cmp(&a2.len()))
        }),
        _ => kind_rank(a)
            .cmp(&kind_rank(b))
            .then_with(|| a.to_string().cmp(&b.to_string())),
    }
}

/// Order two factor lists by their bases, then exponents
pub(crate) fn compare_factors(a: &[Factor], b: &[Factor]) -> Ordering {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| compare_expr(&x.0, &y.0).then_with(|| compare_expr(&x.1, &y.1)))
        .find(|o| o.is_ne())
        .unwrap_or_else(|| a.len().cmp(&b.len()))
}

/// A number or a number ratio such as `-4/3` as a coefficient
pub(crate) fn rational_value(expr: &Expr) -> Option<Coeff> {
    match &expr.kind {
        ExprKind::Number(n) => Some(Coeff::integer(*n)),
        ExprKind::Div(num, den) => {
            let (num, den) = (num.as_number()?, den.as_number()?);
            (den != 0.0).then(|| Coeff::new(num, den))
        }
        _ => None,
    }
}

/// The argument of a one-argument call to `name`
pub(crate) fn single_arg<'a>(expr: &'a Expr, name: &str) -> Option<&'a Expr> {
    match &expr.kind {
        ExprKind::FunctionCall { name: n, args } if n == name && args.len() == 1 => args.first(),
        _ => None,
    }
}

pub(crate) fn is_even_integer(n: f64) -> bool {
    is_integer(n) && (n / 2.0).fract() == 0.0
}

fn is_half(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Number(n) => *n == 0.5,
        ExprKind::Div(num, den) => num.is_one_num() && den.as_number() == Some(2.0),
        _ => false,
    }
}

/// Rewrite `u^(1/2)` as `sqrt(u)` for display
pub(crate) fn prettify_roots(expr: &Expr) -> Expr {
    expr.map(|node| {
        if let ExprKind::Pow(base, exp) = &node.kind
            && is_half(exp)
        {
            return Expr::func("sqrt", base.as_ref().clone());
        }
        node.clone()
    })
}
