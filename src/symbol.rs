//! Interned symbols and the type-safe `Symbol` builder
//!
//! Every symbol name is interned once in a global registry so equality checks
//! between expression nodes are integer comparisons.
//!
//! # Example
//! ```
//! use maabara::sym;
//!
//! let a = sym("a");
//! let x = sym("x");
//! let expr = a * x.pow(3.0);
//! assert_eq!(expr.to_string(), "a*x^3");
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, Mutex};

use rustc_hash::FxHashMap;

use crate::Expr;

/// A symbol name registered in the global interner
///
/// Equality and hashing use the interned id only.
#[derive(Clone)]
pub struct InternedSymbol {
    id: u64,
    name: Arc<str>,
}

impl InternedSymbol {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl PartialEq for InternedSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for InternedSymbol {}

impl Hash for InternedSymbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialEq<str> for InternedSymbol {
    fn eq(&self, other: &str) -> bool {
        &*self.name == other
    }
}

impl PartialEq<&str> for InternedSymbol {
    fn eq(&self, other: &&str) -> bool {
        &*self.name == *other
    }
}

impl AsRef<str> for InternedSymbol {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for InternedSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}

impl fmt::Display for InternedSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(1);

/// Global name -> symbol registry
static INTERNER: LazyLock<Mutex<FxHashMap<Arc<str>, InternedSymbol>>> =
    LazyLock::new(|| Mutex::new(FxHashMap::default()));

/// Look up a symbol by name, registering it on first use
pub(crate) fn get_or_intern(name: &str) -> InternedSymbol {
    let mut table = INTERNER.lock().expect("Symbol interner poisoned");
    if let Some(existing) = table.get(name) {
        return existing.clone();
    }
    let name: Arc<str> = Arc::from(name);
    let symbol = InternedSymbol {
        id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed),
        name: Arc::clone(&name),
    };
    table.insert(name, symbol.clone());
    symbol
}

/// Type-safe symbol for building expressions ergonomically
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Symbol(InternedSymbol);

impl Symbol {
    pub fn new(name: &str) -> Self {
        Symbol(get_or_intern(name))
    }

    pub fn name(&self) -> &str {
        self.0.as_str()
    }

    pub fn to_expr(&self) -> Expr {
        Expr::from_interned(self.0.clone())
    }

    /// Raise to a power
    pub fn pow(self, exp: impl Into<Expr>) -> Expr {
        Expr::pow(self.to_expr(), exp.into())
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        self.name()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Generate math function methods for a type
macro_rules! impl_math_functions {
    ($type:ty, $converter:expr, $($fn_name:ident => $func_str:literal),* $(,)?) => {
        impl $type {
            $(
                pub fn $fn_name(self) -> Expr {
                    Expr::func($func_str, $converter(self))
                }
            )*
        }
    };
}

macro_rules! math_function_list {
    ($macro_name:ident, $type:ty, $converter:expr) => {
        $macro_name!($type, $converter,
            sin => "sin", cos => "cos", tan => "tan",
            asin => "asin", acos => "acos", atan => "atan",
            sinh => "sinh", cosh => "cosh", tanh => "tanh",
            exp => "exp", ln => "ln", log10 => "log10",
            sqrt => "sqrt", cbrt => "cbrt", abs => "abs",
        );
    };
}

math_function_list!(impl_math_functions, Symbol, |s: Symbol| s.to_expr());
math_function_list!(impl_math_functions, Expr, |e: Expr| e);

impl From<Symbol> for Expr {
    fn from(s: Symbol) -> Self {
        s.to_expr()
    }
}

impl From<f64> for Expr {
    fn from(n: f64) -> Self {
        Expr::number(n)
    }
}

impl From<i32> for Expr {
    fn from(n: i32) -> Self {
        Expr::number(n as f64)
    }
}

macro_rules! impl_binary_ops {
    ($lhs:ty, $rhs:ty, $to_lhs:expr, $to_rhs:expr) => {
        impl Add<$rhs> for $lhs {
            type Output = Expr;
            fn add(self, rhs: $rhs) -> Expr {
                Expr::add_expr($to_lhs(self), $to_rhs(rhs))
            }
        }
        impl Sub<$rhs> for $lhs {
            type Output = Expr;
            fn sub(self, rhs: $rhs) -> Expr {
                Expr::sub_expr($to_lhs(self), $to_rhs(rhs))
            }
        }
        impl Mul<$rhs> for $lhs {
            type Output = Expr;
            fn mul(self, rhs: $rhs) -> Expr {
                Expr::mul_expr($to_lhs(self), $to_rhs(rhs))
            }
        }
        impl Div<$rhs> for $lhs {
            type Output = Expr;
            fn div(self, rhs: $rhs) -> Expr {
                Expr::div_expr($to_lhs(self), $to_rhs(rhs))
            }
        }
    };
}

impl_binary_ops!(Symbol, Symbol, |s: Symbol| s.to_expr(), |r: Symbol| r.to_expr());
impl_binary_ops!(Symbol, Expr, |s: Symbol| s.to_expr(), |r: Expr| r);
impl_binary_ops!(Symbol, f64, |s: Symbol| s.to_expr(), |r: f64| Expr::number(r));
impl_binary_ops!(Expr, Expr, |s: Expr| s, |r: Expr| r);
impl_binary_ops!(Expr, Symbol, |s: Expr| s, |r: Symbol| r.to_expr());
impl_binary_ops!(Expr, f64, |s: Expr| s, |r: f64| Expr::number(r));
impl_binary_ops!(f64, Expr, |s: f64| Expr::number(s), |r: Expr| r);
impl_binary_ops!(f64, Symbol, |s: f64| Expr::number(s), |r: Symbol| r.to_expr());

impl Neg for Symbol {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::mul_expr(Expr::number(-1.0), self.to_expr())
    }
}

impl Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::mul_expr(Expr::number(-1.0), self)
    }
}

impl Expr {
    /// Raise to a power (Rust's `^` is XOR)
    pub fn pow_of(self, exp: impl Into<Expr>) -> Expr {
        Expr::pow(self, exp.into())
    }
}

/// Convenience function to create a Symbol
pub fn sym(name: &str) -> Symbol {
    Symbol::new(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning_is_stable() {
        let a = get_or_intern("velocity");
        let b = get_or_intern("velocity");
        let c = get_or_intern("mass");
        assert_eq!(a, b);
        assert_eq!(a.id(), b.id());
        assert_ne!(a, c);
        assert!(a == "velocity");
    }

    #[test]
    fn test_symbol_arithmetic() {
        let x = sym("x");
        let y = sym("y");
        assert_eq!((x.clone() + y.clone()).to_string(), "x + y");
        assert_eq!((2.0 * x.clone()).to_string(), "2*x");
        assert_eq!((x.clone() / y).to_string(), "x/y");
        assert_eq!((-x).to_string(), "-x");
    }

    #[test]
    fn test_symbol_functions() {
        let x = sym("x");
        assert_eq!(x.clone().sin().to_string(), "sin(x)");
        assert_eq!(x.clone().sqrt().to_string(), "sqrt(x)");
        assert_eq!(x.pow(2.0).to_string(), "x^2");
    }
}
