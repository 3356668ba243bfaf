//! Small numeric and naming helpers shared across the crate

/// Default tolerance for floating-point comparisons
pub(crate) const FLOAT_TOLERANCE: f64 = 1e-10;

/// Check if a float is approximately zero (within tolerance)
#[inline]
pub(crate) fn is_zero(n: f64) -> bool {
    n.abs() < FLOAT_TOLERANCE
}

#[inline]
pub(crate) fn is_one(n: f64) -> bool {
    (n - 1.0).abs() < FLOAT_TOLERANCE
}

#[inline]
pub(crate) fn is_neg_one(n: f64) -> bool {
    (n + 1.0).abs() < FLOAT_TOLERANCE
}

/// Check if a float holds an integer value exactly
#[inline]
pub(crate) fn is_integer(n: f64) -> bool {
    n.is_finite() && n.fract() == 0.0
}

/// Integer square root for perfect squares, `None` otherwise
pub(crate) fn exact_sqrt(n: f64) -> Option<f64> {
    if !is_integer(n) || n < 0.0 {
        return None;
    }
    let root = n.sqrt().round();
    (root * root == n).then_some(root)
}

pub(crate) fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Strip underscores from a user-visible name or formula
///
/// `a_1` and `a1` denote the same symbol afterwards.
pub fn normalize_name(name: &str) -> String {
    name.chars().filter(|&c| c != '_').collect()
}

/// A name is valid when it is non-empty and alphanumeric once underscores are removed
pub fn is_valid_name(name: &str) -> bool {
    let stripped = normalize_name(name);
    !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_alphanumeric())
}
