//! Result values, measurement formatting and LaTeX reports

use std::fmt;
use std::str::FromStr;

use crate::SheetError;

/// A nominal value with its standard deviation
///
/// ```
/// use maabara::Measurement;
///
/// let m = Measurement::new(2.4, 0.6720119);
/// assert_eq!(m.rounded(2).to_string(), "2.4+/-0.67");
/// assert_eq!(m.to_latex(1), r"2.4 \pm 0.7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub nominal: f64,
    pub uncertainty: f64,
}

fn round_to(x: f64, decimals: i32) -> f64 {
    if decimals >= 0 {
        let factor = 10f64.powi(decimals);
        (x * factor).round() / factor
    } else {
        let factor = 10f64.powi(-decimals);
        (x / factor).round() * factor
    }
}

/// Magnitudes written with a factored power of ten
fn needs_scaling(exponent: i32) -> bool {
    exponent >= 5 || exponent <= -4
}

fn decimal_exponent(x: f64) -> i32 {
    if x == 0.0 || !x.is_finite() {
        0
    } else {
        x.abs().log10().floor() as i32
    }
}

impl Measurement {
    pub fn new(nominal: f64, uncertainty: f64) -> Self {
        Measurement {
            nominal,
            uncertainty: uncertainty.abs(),
        }
    }

    /// Number of decimals that keep `sig` significant digits of the uncertainty
    fn decimals(&self, sig: u32) -> Option<i32> {
        if self.uncertainty == 0.0 || !self.uncertainty.is_finite() {
            return None;
        }
        Some(sig.max(1) as i32 - 1 - decimal_exponent(self.uncertainty))
    }

    /// Round to `sig` significant digits of the uncertainty; the nominal value
    /// is rounded to the same decimal place
    pub fn rounded(&self, sig: u32) -> Measurement {
        match self.decimals(sig) {
            Some(d) => Measurement {
                nominal: round_to(self.nominal, d),
                uncertainty: round_to(self.uncertainty, d),
            },
            None => *self,
        }
    }

    /// Uncertainty relative to the nominal magnitude
    pub fn relative(&self) -> f64 {
        self.uncertainty / self.nominal.abs()
    }

    /// LaTeX form `n \pm u` with `sig` significant uncertainty digits
    ///
    /// Very large or small magnitudes share a factored power of ten:
    /// `\left(1.23 \pm 0.01\right) \times 10^{-4}`.
    pub fn to_latex(&self, sig: u32) -> String {
        let Some(decimals) = self.decimals(sig) else {
            return self.unrounded_latex();
        };
        let rounded = self.rounded(sig);
        let exponent = decimal_exponent(rounded.nominal.abs().max(rounded.uncertainty));

        if needs_scaling(exponent) {
            let scale = 10f64.powi(exponent);
            let d = (decimals + exponent).max(0) as usize;
            format!(
                r"\left({:.d$} \pm {:.d$}\right) \times 10^{{{exponent}}}",
                rounded.nominal / scale,
                rounded.uncertainty / scale
            )
        } else {
            let d = decimals.max(0) as usize;
            format!(r"{:.d$} \pm {:.d$}", rounded.nominal, rounded.uncertainty)
        }
    }

    /// Exact or non-finite uncertainty: no digit to round to, so the nominal
    /// value alone picks the power of ten
    fn unrounded_latex(&self) -> String {
        let exponent = decimal_exponent(self.nominal);
        if self.uncertainty.is_finite() && needs_scaling(exponent) {
            let scale = 10f64.powi(exponent);
            return format!(
                r"\left({} \pm {}\right) \times 10^{{{exponent}}}",
                self.nominal / scale,
                self.uncertainty / scale
            );
        }
        format!(r"{} \pm {}", self.nominal, self.uncertainty)
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+/-{}", self.nominal, self.uncertainty)
    }
}

impl From<(f64, f64)> for Measurement {
    fn from((nominal, uncertainty): (f64, f64)) -> Self {
        Measurement::new(nominal, uncertainty)
    }
}

/// Output shape of [`Sheet::get_result`](crate::Sheet::get_result)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResultMode {
    /// `(nominal, uncertainty)`
    #[default]
    Default,
    /// Pair rounded to two significant uncertainty digits
    Exact,
    /// Packed [`Measurement`]
    Measurement,
    /// LaTeX string, optionally prefixed with `name=`
    Tex(Option<String>),
    /// Pair, also written to the log as `nominal\tdeviation`
    Print,
}

impl FromStr for ResultMode {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(ResultMode::Default),
            "exact" => Ok(ResultMode::Exact),
            "ufloat" | "measurement" => Ok(ResultMode::Measurement),
            "tex" => Ok(ResultMode::Tex(None)),
            "print" => Ok(ResultMode::Print),
            other => match other.strip_prefix("tex:") {
                Some(name) => Ok(ResultMode::Tex(Some(name.to_string()))),
                None => Err(SheetError::UnsupportedMode {
                    mode: other.to_string(),
                }),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResultValue {
    Pair(f64, f64),
    Measurement(Measurement),
    Tex(String),
}

impl ResultValue {
    pub fn as_pair(&self) -> Option<(f64, f64)> {
        match self {
            ResultValue::Pair(n, u) => Some((*n, *u)),
            ResultValue::Measurement(m) => Some((m.nominal, m.uncertainty)),
            ResultValue::Tex(_) => None,
        }
    }
}

/// How [`Sheet::print_result`](crate::Sheet::print_result) emits the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrintMode {
    /// Lines rendered as math
    #[default]
    Default,
    /// Lines sent as plain text
    Short,
}

impl FromStr for PrintMode {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(PrintMode::Default),
            "short" => Ok(PrintMode::Short),
            other => Err(SheetError::UnsupportedMode {
                mode: other.to_string(),
            }),
        }
    }
}

/// Display surface a report is sent to (a notebook, a terminal, a file)
pub trait Renderer {
    /// Show a LaTeX line typeset as math
    fn render_math(&mut self, latex: &str);

    /// Show a line as plain text
    fn render_text(&mut self, text: &str);
}

/// The three LaTeX lines describing a sheet result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// `name=` followed by the value expression
    pub equation: String,
    /// `name=` followed by the measurement
    pub result: String,
    /// `\sigma_{name}=` followed by the error expression
    pub error: String,
}

impl Report {
    pub fn lines(&self) -> [&str; 3] {
        [&self.equation, &self.result, &self.error]
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.equation)?;
        writeln!(f, "{}", self.result)?;
        write!(f, "{}", self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding() {
        let m = Measurement::new(0.5, 0.158113883);
        assert_eq!(m.rounded(2), Measurement::new(0.5, 0.16));
        assert_eq!(m.rounded(1), Measurement::new(0.5, 0.2));

        let m = Measurement::new(1234.0, 31.0);
        assert_eq!(m.rounded(1), Measurement::new(1230.0, 30.0));

        let exact = Measurement::new(3.14159, 0.0);
        assert_eq!(exact.rounded(2), exact);
    }

    #[test]
    fn test_latex_plain() {
        assert_eq!(Measurement::new(4.0, 0.4).to_latex(1), r"4.0 \pm 0.4");
        assert_eq!(Measurement::new(1234.0, 31.0).to_latex(1), r"1230 \pm 30");
        assert_eq!(Measurement::new(2.0, 0.0).to_latex(1), r"2 \pm 0");
    }

    #[test]
    fn test_latex_exact_values_are_scaled() {
        assert_eq!(
            Measurement::new(3e7, 0.0).to_latex(1),
            r"\left(3 \pm 0\right) \times 10^{7}"
        );
        assert_eq!(
            Measurement::new(-4e8, 0.0).to_latex(2),
            r"\left(-4 \pm 0\right) \times 10^{8}"
        );
        assert_eq!(Measurement::new(1.0, f64::INFINITY).to_latex(1), r"1 \pm inf");
    }

    #[test]
    fn test_latex_factors_power_of_ten() {
        assert_eq!(
            Measurement::new(123456.0, 12.0).to_latex(1),
            r"\left(1.2346 \pm 0.0001\right) \times 10^{5}"
        );
        assert_eq!(
            Measurement::new(0.00012345, 0.0000012).to_latex(1),
            r"\left(1.23 \pm 0.01\right) \times 10^{-4}"
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Measurement::new(4.0, -0.4).to_string(), "4+/-0.4");
        assert_eq!(Measurement::from((1.5, 0.25)).relative(), 0.25 / 1.5);
    }

    #[test]
    fn test_modes_from_str() {
        assert_eq!("ufloat".parse::<ResultMode>().unwrap(), ResultMode::Measurement);
        assert_eq!(
            "tex:E_{kin}".parse::<ResultMode>().unwrap(),
            ResultMode::Tex(Some("E_{kin}".to_string()))
        );
        assert_eq!("tex".parse::<ResultMode>().unwrap(), ResultMode::Tex(None));
        assert!(matches!(
            "fancy".parse::<ResultMode>(),
            Err(SheetError::UnsupportedMode { .. })
        ));
        assert_eq!("short".parse::<PrintMode>().unwrap(), PrintMode::Short);
        assert!("long".parse::<PrintMode>().is_err());
    }

    #[test]
    fn test_report_lines() {
        let report = Report {
            equation: "E=m".to_string(),
            result: r"E=1 \pm 0".to_string(),
            error: r"\sigma_{E}=0".to_string(),
        };
        assert_eq!(report.lines()[2], r"\sigma_{E}=0");
        assert_eq!(report.to_string(), "E=m\nE=1 \\pm 0\n\\sigma_{E}=0");
    }
}
