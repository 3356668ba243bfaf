//! Display implementations for expressions.
//!
//! ## Standard Display (`to_string()` / `{}`)
//! Plain notation close to what the parser accepts:
//! - `3*a*x^2 + 1`
//! - `sqrt(x^6*sigma_a^2)`
//!
//! ## LaTeX Format (`to_latex()` / `to_latex_with()`)
//! For typesetting in documents:
//! - `3 \cdot a \cdot x^{2} + 1`
//! - `\frac{x}{\sigma_{x}}`, `\sqrt{x}`, `\sin\left(x\right)`
//!
//! LaTeX rendering accepts a label map so symbols can be replaced by their
//! display labels without touching the expression itself.

use std::fmt;
use std::str::FromStr;

use rustc_hash::FxHashMap;

use crate::functions::registry::Registry;
use crate::uncertainty::SIGMA_PREFIX;
use crate::{Expr, ExprKind, SheetError};

#[derive(Clone, Copy)]
enum FormatMode {
    Standard,
    Latex,
}

/// Multiplication sign used in LaTeX output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MulSymbol {
    /// `a \cdot b`
    #[default]
    Dot,
    /// `a \times b`
    Times,
    /// `a b` (falls back to `\cdot` before a number)
    Space,
}

impl MulSymbol {
    fn separator(self) -> &'static str {
        match self {
            MulSymbol::Dot => r" \cdot ",
            MulSymbol::Times => r" \times ",
            MulSymbol::Space => " ",
        }
    }
}

impl FromStr for MulSymbol {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dot" => Ok(MulSymbol::Dot),
            "times" => Ok(MulSymbol::Times),
            "space" | "none" | "" => Ok(MulSymbol::Space),
            other => Err(SheetError::UnsupportedMode {
                mode: other.to_string(),
            }),
        }
    }
}

/// Options for LaTeX rendering
#[derive(Debug, Clone, Copy, Default)]
pub struct LatexOptions<'a> {
    pub mul_symbol: MulSymbol,
    /// Display labels keyed by symbol name
    pub labels: Option<&'a FxHashMap<String, String>>,
}

/// Greek letter names mapped to their LaTeX commands
static GREEK_LETTERS: &[(&str, &str)] = &[
    ("pi", r"\pi"),
    ("alpha", r"\alpha"),
    ("beta", r"\beta"),
    ("gamma", r"\gamma"),
    ("delta", r"\delta"),
    ("epsilon", r"\epsilon"),
    ("zeta", r"\zeta"),
    ("eta", r"\eta"),
    ("theta", r"\theta"),
    ("iota", r"\iota"),
    ("kappa", r"\kappa"),
    ("lambda", r"\lambda"),
    ("mu", r"\mu"),
    ("nu", r"\nu"),
    ("xi", r"\xi"),
    ("omicron", r"\omicron"),
    ("rho", r"\rho"),
    ("sigma", r"\sigma"),
    ("tau", r"\tau"),
    ("upsilon", r"\upsilon"),
    ("phi", r"\phi"),
    ("chi", r"\chi"),
    ("psi", r"\psi"),
    ("omega", r"\omega"),
    ("Gamma", r"\Gamma"),
    ("Delta", r"\Delta"),
    ("Theta", r"\Theta"),
    ("Lambda", r"\Lambda"),
    ("Sigma", r"\Sigma"),
    ("Phi", r"\Phi"),
    ("Psi", r"\Psi"),
    ("Omega", r"\Omega"),
    ("varepsilon", r"\varepsilon"),
    ("vartheta", r"\vartheta"),
    ("varphi", r"\varphi"),
];

fn greek_to_latex(name: &str) -> Option<&'static str> {
    GREEK_LETTERS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, latex)| *latex)
}

fn base_to_latex(base: &str) -> String {
    greek_to_latex(base).map_or_else(|| base.to_string(), str::to_string)
}

/// Default LaTeX rendering of a symbol name
///
/// - `alpha` → `\alpha`
/// - `a1` → `a_{1}`, `x_max` → `x_{max}`
/// - `sigma_x` → `\sigma_{x}`
pub fn symbol_to_latex(name: &str) -> String {
    if let Some(var) = name.strip_prefix(SIGMA_PREFIX) {
        return format!(r"\sigma_{{{}}}", symbol_to_latex(var));
    }
    if let Some((base, sub)) = name.split_once('_')
        && !base.is_empty()
    {
        return format!("{}_{{{}}}", base_to_latex(base), sub.replace('_', ""));
    }
    let split = name.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if split > 0 && split < name.len() {
        format!("{}_{{{}}}", base_to_latex(&name[..split]), &name[split..])
    } else {
        base_to_latex(name)
    }
}

fn format_number(f: &mut fmt::Formatter<'_>, n: f64, mode: FormatMode) -> fmt::Result {
    if n.is_nan() {
        return match mode {
            FormatMode::Standard => write!(f, "NaN"),
            FormatMode::Latex => write!(f, r"\text{{NaN}}"),
        };
    }
    if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        return match mode {
            FormatMode::Standard => write!(f, "{sign}Infinity"),
            FormatMode::Latex => write!(f, r"{sign}\infty"),
        };
    }

    if n.trunc() == n && n.abs() < 1e15 {
        return write!(f, "{}", n as i64);
    }
    let magnitude = n.abs();
    if matches!(mode, FormatMode::Latex) && !(1e-4..1e15).contains(&magnitude) {
        let formatted = format!("{n:e}");
        if let Some((mantissa, exponent)) = formatted.split_once('e') {
            return write!(f, r"{mantissa} \cdot 10^{{{exponent}}}");
        }
    }
    write!(f, "{n}")
}

/// If the term carries a leading minus sign, return its positive counterpart
pub(crate) fn strip_negation(expr: &Expr) -> Option<Expr> {
    match &expr.kind {
        ExprKind::Number(n) if *n < 0.0 => Some(Expr::number(-*n)),
        ExprKind::Mul(coeff, rest) => match coeff.as_number() {
            Some(n) if n == -1.0 => Some(rest.as_ref().clone()),
            Some(n) if n < 0.0 => Some(Expr::mul_expr(Expr::number(-n), rest.as_ref().clone())),
            _ => None,
        },
        ExprKind::Div(num, den) => {
            strip_negation(num).map(|pos| Expr::div_expr(pos, den.as_ref().clone()))
        }
        _ => None,
    }
}

fn is_sum(expr: &Expr) -> bool {
    matches!(expr.kind, ExprKind::Add(_, _) | ExprKind::Sub(_, _))
}

/// Atoms never need parentheses as a power base or exponent
fn is_atom(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Number(n) => *n >= 0.0,
        ExprKind::Symbol(_) | ExprKind::FunctionCall { .. } => true,
        _ => false,
    }
}

fn is_half(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Number(n) => *n == 0.5,
        ExprKind::Div(num, den) => num.is_one_num() && den.as_number() == Some(2.0),
        _ => false,
    }
}

/// Render inside parentheses when `wrap` holds
struct Wrapped<'a, 'o> {
    expr: &'a Expr,
    wrap: bool,
    mode: FormatMode,
    options: &'o LatexOptions<'o>,
}

impl fmt::Display for Wrapped<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.wrap, self.mode) {
            (false, _) => format_expr(f, self.expr, self.mode, self.options),
            (true, FormatMode::Standard) => {
                write!(f, "(")?;
                format_expr(f, self.expr, self.mode, self.options)?;
                write!(f, ")")
            }
            (true, FormatMode::Latex) => {
                write!(f, r"\left(")?;
                format_expr(f, self.expr, self.mode, self.options)?;
                write!(f, r"\right)")
            }
        }
    }
}

fn wrapped<'a, 'o>(
    expr: &'a Expr,
    wrap: bool,
    mode: FormatMode,
    options: &'o LatexOptions<'o>,
) -> Wrapped<'a, 'o> {
    Wrapped {
        expr,
        wrap,
        mode,
        options,
    }
}

fn format_symbol(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    mode: FormatMode,
    options: &LatexOptions<'_>,
) -> fmt::Result {
    match mode {
        FormatMode::Standard => f.write_str(name),
        FormatMode::Latex => {
            let labels = options.labels;
            if let Some(label) = labels.and_then(|l| l.get(name)) {
                return f.write_str(label);
            }
            if let Some(var) = name.strip_prefix(SIGMA_PREFIX)
                && let Some(label) = labels.and_then(|l| l.get(var))
            {
                return write!(f, r"\sigma_{{{label}}}");
            }
            f.write_str(&symbol_to_latex(name))
        }
    }
}

fn format_args_list(
    f: &mut fmt::Formatter<'_>,
    args: &[Expr],
    mode: FormatMode,
    options: &LatexOptions<'_>,
) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        format_expr(f, arg, mode, options)?;
    }
    Ok(())
}

fn format_function(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    args: &[Expr],
    mode: FormatMode,
    options: &LatexOptions<'_>,
) -> fmt::Result {
    if let FormatMode::Standard = mode {
        write!(f, "{name}(")?;
        format_args_list(f, args, mode, options)?;
        return write!(f, ")");
    }

    match (name, args) {
        ("sqrt", [arg]) => {
            write!(f, r"\sqrt{{")?;
            format_expr(f, arg, mode, options)?;
            write!(f, "}}")
        }
        ("cbrt", [arg]) => {
            write!(f, r"\sqrt[3]{{")?;
            format_expr(f, arg, mode, options)?;
            write!(f, "}}")
        }
        ("abs", [arg]) => {
            write!(f, r"\left|")?;
            format_expr(f, arg, mode, options)?;
            write!(f, r"\right|")
        }
        ("exp", [arg]) => {
            write!(f, "e^{{")?;
            format_expr(f, arg, mode, options)?;
            write!(f, "}}")
        }
        ("log", [arg, base]) => {
            write!(f, r"\log_{{")?;
            format_expr(f, base, mode, options)?;
            write!(f, r"}}\left(")?;
            format_expr(f, arg, mode, options)?;
            write!(f, r"\right)")
        }
        _ => {
            match Registry::get(name) {
                Some(def) => f.write_str(def.latex)?,
                None => write!(f, r"\operatorname{{{name}}}")?,
            }
            write!(f, r"\left(")?;
            format_args_list(f, args, mode, options)?;
            write!(f, r"\right)")
        }
    }
}

fn format_mul(
    f: &mut fmt::Formatter<'_>,
    left: &Expr,
    right: &Expr,
    mode: FormatMode,
    options: &LatexOptions<'_>,
) -> fmt::Result {
    if left.is_neg_one_num() {
        write!(f, "-")?;
        let wrap = is_sum(right) || strip_negation(right).is_some();
        return write!(f, "{}", wrapped(right, wrap, mode, options));
    }

    write!(f, "{}", wrapped(left, is_sum(left), mode, options))?;
    let wrap_right = is_sum(right) || strip_negation(right).is_some();
    match mode {
        FormatMode::Standard => write!(f, "*")?,
        FormatMode::Latex => {
            let numeric_next = !wrap_right && starts_with_number(right);
            if options.mul_symbol == MulSymbol::Space && numeric_next {
                write!(f, r" \cdot ")?;
            } else {
                f.write_str(options.mul_symbol.separator())?;
            }
        }
    }
    write!(f, "{}", wrapped(right, wrap_right, mode, options))
}

fn starts_with_number(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Number(_) => true,
        ExprKind::Mul(l, _) | ExprKind::Pow(l, _) => starts_with_number(l),
        _ => false,
    }
}

fn format_div(
    f: &mut fmt::Formatter<'_>,
    num: &Expr,
    den: &Expr,
    mode: FormatMode,
    options: &LatexOptions<'_>,
) -> fmt::Result {
    match mode {
        FormatMode::Standard => {
            let wrap_den = !is_atom(den) && !matches!(den.kind, ExprKind::Pow(_, _));
            write!(
                f,
                "{}/{}",
                wrapped(num, is_sum(num), mode, options),
                wrapped(den, wrap_den, mode, options)
            )
        }
        FormatMode::Latex => {
            if let Some(positive) = strip_negation(num) {
                write!(f, "- ")?;
                return format_div(f, &positive, den, mode, options);
            }
            write!(f, r"\frac{{")?;
            format_expr(f, num, mode, options)?;
            write!(f, "}}{{")?;
            format_expr(f, den, mode, options)?;
            write!(f, "}}")
        }
    }
}

fn format_pow(
    f: &mut fmt::Formatter<'_>,
    base: &Expr,
    exp: &Expr,
    mode: FormatMode,
    options: &LatexOptions<'_>,
) -> fmt::Result {
    match mode {
        FormatMode::Standard => write!(
            f,
            "{}^{}",
            wrapped(base, !is_atom(base), mode, options),
            wrapped(exp, !is_atom(exp), mode, options)
        ),
        FormatMode::Latex => {
            if is_half(exp) {
                write!(f, r"\sqrt{{")?;
                format_expr(f, base, mode, options)?;
                return write!(f, "}}");
            }
            if exp.is_neg_one_num() {
                write!(f, r"\frac{{1}}{{")?;
                format_expr(f, base, mode, options)?;
                return write!(f, "}}");
            }
            let wrap_base = !matches!(base.kind, ExprKind::Symbol(_))
                && !matches!(base.kind, ExprKind::Number(n) if n >= 0.0);
            write!(f, "{}^{{", wrapped(base, wrap_base, mode, options))?;
            format_expr(f, exp, mode, options)?;
            write!(f, "}}")
        }
    }
}

fn format_expr(
    f: &mut fmt::Formatter<'_>,
    expr: &Expr,
    mode: FormatMode,
    options: &LatexOptions<'_>,
) -> fmt::Result {
    match &expr.kind {
        ExprKind::Number(n) => format_number(f, *n, mode),
        ExprKind::Symbol(s) => format_symbol(f, s.as_str(), mode, options),
        ExprKind::FunctionCall { name, args } => format_function(f, name, args, mode, options),
        ExprKind::Add(l, r) => {
            format_expr(f, l, mode, options)?;
            match strip_negation(r) {
                Some(positive) => {
                    write!(f, " - {}", wrapped(&positive, is_sum(&positive), mode, options))
                }
                None => {
                    write!(f, " + ")?;
                    format_expr(f, r, mode, options)
                }
            }
        }
        ExprKind::Sub(l, r) => {
            format_expr(f, l, mode, options)?;
            let wrap = is_sum(r) || strip_negation(r).is_some();
            write!(f, " - {}", wrapped(r, wrap, mode, options))
        }
        ExprKind::Mul(l, r) => format_mul(f, l, r, mode, options),
        ExprKind::Div(l, r) => format_div(f, l, r, mode, options),
        ExprKind::Pow(l, r) => format_pow(f, l, r, mode, options),
    }
}

static PLAIN: LatexOptions<'static> = LatexOptions {
    mul_symbol: MulSymbol::Dot,
    labels: None,
};

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_expr(f, self, FormatMode::Standard, &PLAIN)
    }
}

/// Display adapter rendering an expression as LaTeX
pub struct LatexFormatter<'a> {
    pub(crate) expr: &'a Expr,
    pub(crate) options: LatexOptions<'a>,
}

impl fmt::Display for LatexFormatter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_expr(f, self.expr, FormatMode::Latex, &self.options)
    }
}

impl Expr {
    /// Convert the expression to LaTeX with default options
    pub fn to_latex(&self) -> String {
        self.to_latex_with(LatexOptions::default())
    }

    /// Convert the expression to LaTeX, applying display labels and the chosen
    /// multiplication sign
    pub fn to_latex_with(&self, options: LatexOptions<'_>) -> String {
        LatexFormatter {
            expr: self,
            options,
        }
        .to_string()
    }
}
