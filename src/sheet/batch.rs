//! Row-by-row evaluation of tabular data

use std::str::FromStr;

use crate::helpers::{is_valid_name, normalize_name};
use crate::{Measurement, SheetError};

/// Rectangular numeric data, one row per evaluation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: usize,
    rows: Vec<Vec<f64>>,
}

impl Dataset {
    /// Build from rows; every row must have the length of the first one
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self, SheetError> {
        let columns = rows.first().map_or(0, |r| r.as_ref().len());
        let mut out = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != columns {
                return Err(SheetError::RaggedRow {
                    row: i,
                    len: row.len(),
                    expected: columns,
                });
            }
            out.push(row.to_vec());
        }
        Ok(Dataset { columns, rows: out })
    }

    /// Stack equally long columns side by side
    pub fn from_columns<C: AsRef<[f64]>>(columns: &[C]) -> Result<Self, SheetError> {
        let expected = columns.len();
        let height = columns.iter().map(|c| c.as_ref().len()).max().unwrap_or(0);
        let mut rows = Vec::with_capacity(height);
        for i in 0..height {
            let row: Vec<f64> = columns
                .iter()
                .filter_map(|c| c.as_ref().get(i).copied())
                .collect();
            if row.len() != expected {
                return Err(SheetError::RaggedRow {
                    row: i,
                    len: row.len(),
                    expected,
                });
            }
            rows.push(row);
        }
        Ok(Dataset {
            columns: expected,
            rows,
        })
    }

    /// One-dimensional data becomes a single column
    pub fn from_column(values: &[f64]) -> Self {
        Dataset {
            columns: 1,
            rows: values.iter().map(|&v| vec![v]).collect(),
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.rows.iter().map(Vec::as_slice)
    }
}

/// Meaning of one column in a field mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldToken {
    /// Nominal values of a variable
    Value(String),
    /// Standard deviations of a variable (`name%`)
    Deviation(String),
    /// Ignored column (`*`)
    Skip,
}

/// Where a variable's value and deviation come from within a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnBinding {
    /// Name as written in the mapping
    pub name: String,
    pub value: Option<usize>,
    pub deviation: Option<usize>,
}

/// Parsed `a|x|x%|*` column mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMap {
    tokens: Vec<FieldToken>,
    bindings: Vec<ColumnBinding>,
}

impl FieldMap {
    /// Parse a pipe-delimited mapping, one token per column
    ///
    /// # Errors
    /// - `FieldMapping` for an empty token or a column given twice
    /// - `InvalidName` for a token that is not a valid variable name
    pub fn parse(mapping: &str) -> Result<Self, SheetError> {
        let mapping_error = |reason: String| SheetError::FieldMapping {
            mapping: mapping.to_string(),
            reason,
        };

        let mut tokens = Vec::new();
        let mut bindings: Vec<ColumnBinding> = Vec::new();

        for (column, raw) in mapping.trim().split('|').enumerate() {
            let raw = raw.trim();
            if raw.is_empty() {
                return Err(mapping_error(format!("column {} has an empty token", column + 1)));
            }
            if raw == "*" {
                tokens.push(FieldToken::Skip);
                continue;
            }

            let (name, is_deviation) = match raw.strip_suffix('%') {
                Some(name) => (name.trim(), true),
                None => (raw, false),
            };
            if !is_valid_name(name) {
                return Err(SheetError::InvalidName {
                    name: name.to_string(),
                });
            }

            let key = normalize_name(name);
            let index = match bindings.iter().position(|b| normalize_name(&b.name) == key) {
                Some(i) => i,
                None => {
                    bindings.push(ColumnBinding {
                        name: name.to_string(),
                        value: None,
                        deviation: None,
                    });
                    bindings.len() - 1
                }
            };
            let slot = if is_deviation {
                &mut bindings[index].deviation
            } else {
                &mut bindings[index].value
            };
            if slot.is_some() {
                return Err(mapping_error(format!("'{raw}' is mapped twice")));
            }
            *slot = Some(column);

            tokens.push(if is_deviation {
                FieldToken::Deviation(name.to_string())
            } else {
                FieldToken::Value(name.to_string())
            });
        }

        Ok(FieldMap { tokens, bindings })
    }

    /// Number of columns the mapping describes
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[FieldToken] {
        &self.tokens
    }

    /// Mapped variables in order of first appearance
    pub fn bindings(&self) -> &[ColumnBinding] {
        &self.bindings
    }
}

impl FromStr for FieldMap {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldMap::parse(s)
    }
}

/// Shape of the batch output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchMode {
    #[default]
    Default,
    /// Pairs rounded to two significant uncertainty digits
    Exact,
    Measurement,
}

impl FromStr for BatchMode {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(BatchMode::Default),
            "exact" => Ok(BatchMode::Exact),
            "ufloat" | "measurement" => Ok(BatchMode::Measurement),
            other => Err(SheetError::UnsupportedMode {
                mode: other.to_string(),
            }),
        }
    }
}

/// One result per input row, in input order
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutput {
    Pairs(Vec<(f64, f64)>),
    Measurements(Vec<Measurement>),
}

impl BatchOutput {
    pub(crate) fn with_capacity(mode: BatchMode, rows: usize) -> Self {
        match mode {
            BatchMode::Measurement => BatchOutput::Measurements(Vec::with_capacity(rows)),
            BatchMode::Default | BatchMode::Exact => BatchOutput::Pairs(Vec::with_capacity(rows)),
        }
    }

    pub(crate) fn push(&mut self, mode: BatchMode, result: Measurement) {
        match self {
            BatchOutput::Pairs(pairs) => {
                let m = match mode {
                    BatchMode::Exact => result.rounded(2),
                    _ => result,
                };
                pairs.push((m.nominal, m.uncertainty));
            }
            BatchOutput::Measurements(values) => values.push(result),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            BatchOutput::Pairs(p) => p.len(),
            BatchOutput::Measurements(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Results as `(nominal, uncertainty)` pairs regardless of mode
    pub fn pairs(&self) -> Vec<(f64, f64)> {
        match self {
            BatchOutput::Pairs(p) => p.clone(),
            BatchOutput::Measurements(m) => m.iter().map(|m| (m.nominal, m.uncertainty)).collect(),
        }
    }
}
