use std::collections::BTreeSet;

use thiserror::Error;

/// Source location span for error reporting
/// Represents a range of characters in the input string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Start position (0-indexed byte offset)
    pub start: usize,
    /// End position (exclusive, 0-indexed byte offset)
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// Create a span for a single position
    pub fn at(pos: usize) -> Self {
        Span {
            start: pos,
            end: pos + 1,
        }
    }

    /// Check if this span has valid location info
    pub fn is_valid(&self) -> bool {
        self.end > self.start
    }

    /// Format the span for display (1-indexed for users)
    pub fn display(&self) -> String {
        if !self.is_valid() {
            String::new()
        } else if self.end - self.start == 1 {
            format!(" at position {}", self.start + 1)
        } else {
            format!(" at positions {}-{}", self.start + 1, self.end)
        }
    }
}

fn span_suffix(span: &Option<Span>) -> String {
    span.map_or(String::new(), |s| s.display())
}

/// Errors that can occur during parsing, differentiation and simplification
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiffError {
    // Input validation errors
    #[error("Formula cannot be empty")]
    EmptyFormula,
    #[error("Invalid syntax: {msg}{}", span_suffix(.span))]
    InvalidSyntax { msg: String, span: Option<Span> },

    // Parsing errors
    #[error("Invalid number format: '{value}'{}", span_suffix(.span))]
    InvalidNumber { value: String, span: Option<Span> },
    #[error("Invalid token: '{token}'{}", span_suffix(.span))]
    InvalidToken { token: String, span: Option<Span> },
    #[error("Expected '{expected}', but got '{got}'{}", span_suffix(.span))]
    UnexpectedToken {
        expected: String,
        got: String,
        span: Option<Span>,
    },
    #[error("Unexpected end of input")]
    UnexpectedEndOfInput,
    #[error("Unknown function '{name}'{}", span_suffix(.span))]
    UnknownFunction { name: String, span: Option<Span> },
    #[error("Function '{name}' expects {expected} argument(s), got {got}")]
    InvalidArity {
        name: String,
        expected: String,
        got: usize,
    },

    // Semantic errors
    #[error(
        "Variable '{var}' cannot be both the differentiation variable and a fixed constant"
    )]
    VariableInBothFixedAndDiff { var: String },

    // Safety limits
    #[error("Expression nesting depth exceeds maximum limit")]
    MaxDepthExceeded,
    #[error("Expression size exceeds maximum node count limit")]
    MaxNodesExceeded,
}

impl DiffError {
    pub fn invalid_syntax(msg: impl Into<String>) -> Self {
        DiffError::InvalidSyntax {
            msg: msg.into(),
            span: None,
        }
    }

    pub fn invalid_syntax_at(msg: impl Into<String>, span: Span) -> Self {
        DiffError::InvalidSyntax {
            msg: msg.into(),
            span: Some(span),
        }
    }

    pub fn invalid_number_at(value: impl Into<String>, span: Span) -> Self {
        DiffError::InvalidNumber {
            value: value.into(),
            span: Some(span),
        }
    }

    pub fn invalid_token_at(token: impl Into<String>, span: Span) -> Self {
        DiffError::InvalidToken {
            token: token.into(),
            span: Some(span),
        }
    }
}

/// Which of the two evaluated quantities a failure refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Nominal,
    Deviation,
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Quantity::Nominal => write!(f, "nominal"),
            Quantity::Deviation => write!(f, "deviation"),
        }
    }
}

/// Errors raised by a [`Sheet`](crate::Sheet) and its batch runner
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SheetError {
    #[error("Invalid variable name '{name}': only alphanumeric characters and '_' are allowed")]
    InvalidName { name: String },

    #[error("No equation has been set")]
    NoEquation,

    #[error("Invalid equation '{equation}': {source}")]
    Equation {
        equation: String,
        #[source]
        source: DiffError,
    },

    #[error(transparent)]
    Diff(#[from] DiffError),

    #[error("Dataset has {columns} column(s) but the field mapping names {fields}")]
    Shape { columns: usize, fields: usize },

    #[error("Ragged dataset: row {row} has {len} value(s), expected {expected}")]
    RaggedRow {
        row: usize,
        len: usize,
        expected: usize,
    },

    #[error("Invalid field mapping '{mapping}': {reason}")]
    FieldMapping { mapping: String, reason: String },

    #[error("Unsupported mode '{mode}'")]
    UnsupportedMode { mode: String },

    #[error("Could not finish {quantity} evaluation, unresolved symbols: {}", join_names(.symbols))]
    Unresolved {
        quantity: Quantity,
        symbols: BTreeSet<String>,
    },
}

fn join_names(names: &BTreeSet<String>) -> String {
    names.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_display() {
        assert_eq!(Span::at(0).display(), " at position 1");
        assert_eq!(Span::new(2, 5).display(), " at positions 3-5");
        assert_eq!(Span::default().display(), "");
    }

    #[test]
    fn test_error_messages_carry_span() {
        let err = DiffError::invalid_token_at("$", Span::at(3));
        assert_eq!(err.to_string(), "Invalid token: '$' at position 4");

        let err = DiffError::invalid_syntax("dangling operator");
        assert_eq!(err.to_string(), "Invalid syntax: dangling operator");
    }

    #[test]
    fn test_unresolved_lists_symbols() {
        let err = SheetError::Unresolved {
            quantity: Quantity::Deviation,
            symbols: ["sigma_x".to_string(), "y".to_string()].into_iter().collect(),
        };
        assert_eq!(
            err.to_string(),
            "Could not finish deviation evaluation, unresolved symbols: sigma_x, y"
        );
    }

    #[test]
    fn test_diff_error_converts() {
        let err: SheetError = DiffError::EmptyFormula.into();
        assert!(matches!(err, SheetError::Diff(DiffError::EmptyFormula)));
    }
}
