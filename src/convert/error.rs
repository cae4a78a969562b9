//! Error types for row conversion
//!
//! Every embedded rendering of row data goes through [`snippet`], so a
//! diagnostic never carries more than [`MAX_SNIPPET_LEN`] characters of data
//! regardless of how large the offending row is.

use std::fmt;

use thiserror::Error;

use crate::models::GenericValue;

/// Maximum number of characters of data embedded in a diagnostic
pub const MAX_SNIPPET_LEN: usize = 250;

/// Render a value for a diagnostic, truncated to [`MAX_SNIPPET_LEN`] characters
pub fn snippet(value: impl fmt::Display) -> String {
    let rendered = value.to_string();
    match rendered.char_indices().nth(MAX_SNIPPET_LEN) {
        Some((cut, _)) => format!("{}...", &rendered[..cut]),
        None => rendered,
    }
}

/// Render a generic value with its shape, e.g. `text "abc"`
pub(crate) fn describe(value: &GenericValue) -> String {
    snippet(format_args!("{} {}", value.type_name(), value.to_json_value()))
}

/// Coarse classification of a [`ConversionError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionErrorKind {
    /// A single value could not be coerced to its declared type
    Cell,
    /// A record field failed to convert
    Row,
    /// Input has more fields than the schema declares (strict mode)
    StrictSchema,
    /// The row as a whole could not be converted
    IllegalRow,
}

/// Errors raised by the structural converter, coercer and logical codecs
#[derive(Error, Debug)]
pub enum ConversionError {
    /// A scalar or logical value could not be coerced to its declared type
    #[error("Cannot convert {value} to {schema} at '{path}': {reason}")]
    Cell {
        path: String,
        schema: String,
        value: String,
        reason: String,
    },

    /// No union alternative accepted the value
    #[error(
        "No alternative of {schema} accepts {value} at '{path}' ({} alternatives failed)",
        failures.len()
    )]
    UnionMismatch {
        path: String,
        schema: String,
        value: String,
        failures: Vec<ConversionError>,
    },

    /// A record field failed; wraps the underlying error
    #[error("Field '{field}': {source}")]
    Row {
        field: String,
        #[source]
        source: Box<ConversionError>,
    },

    /// Input row has more fields than the schema declares
    #[error(
        "Strict schema violation at '{path}': schema declares {} fields {declared:?} but input has {actual}: {values}",
        declared.len()
    )]
    StrictSchema {
        path: String,
        declared: Vec<String>,
        actual: usize,
        values: String,
    },

    /// A row that is not a list or map, or whose conversion failed
    #[error("Illegal row {value}: {reason}")]
    IllegalRow {
        value: String,
        reason: String,
        #[source]
        source: Option<Box<ConversionError>>,
    },
}

impl ConversionError {
    /// Create a cell error; the path is filled in by the caller via [`ConversionError::at`]
    pub fn cell(target: impl fmt::Display, value: &GenericValue, reason: impl Into<String>) -> Self {
        ConversionError::Cell {
            path: String::new(),
            schema: snippet(target),
            value: describe(value),
            reason: snippet(reason.into()),
        }
    }

    /// Wrap a field failure
    pub fn row(field: impl Into<String>, source: ConversionError) -> Self {
        ConversionError::Row {
            field: field.into(),
            source: Box::new(source),
        }
    }

    /// Wrap a row-level failure, optionally with its cause
    pub fn illegal_row(value: &GenericValue, source: Option<ConversionError>) -> Self {
        let reason = match &source {
            Some(e) => e.to_string(),
            None => format!("expected a list or a map, found {}", value.type_name()),
        };
        ConversionError::IllegalRow {
            value: describe(value),
            reason: snippet(reason),
            source: source.map(Box::new),
        }
    }

    /// Attach a field path to a cell-level error that has none yet
    pub fn at(mut self, location: &str) -> Self {
        match &mut self {
            ConversionError::Cell { path, .. } | ConversionError::UnionMismatch { path, .. }
                if path.is_empty() =>
            {
                *path = location.to_string();
            }
            _ => {}
        }
        self
    }

    /// Get the error classification
    pub fn kind(&self) -> ConversionErrorKind {
        match self {
            ConversionError::Cell { .. } | ConversionError::UnionMismatch { .. } => {
                ConversionErrorKind::Cell
            }
            ConversionError::Row { .. } => ConversionErrorKind::Row,
            ConversionError::StrictSchema { .. } => ConversionErrorKind::StrictSchema,
            ConversionError::IllegalRow { .. } => ConversionErrorKind::IllegalRow,
        }
    }

    /// Follow `Row`/`IllegalRow` wrappers down to the innermost error
    pub fn root_cause(&self) -> &ConversionError {
        match self {
            ConversionError::Row { source, .. } => source.root_cause(),
            ConversionError::IllegalRow {
                source: Some(source),
                ..
            } => source.root_cause(),
            other => other,
        }
    }
}

/// Errors raised while resolving [`ConversionOptions`](super::ConversionOptions)
#[derive(Error, Debug)]
pub enum ContextError {
    /// Time zone name is not a known IANA zone
    #[error("Unknown time zone '{0}'")]
    InvalidTimeZone(String),

    /// Bad-row policy name is not recognised
    #[error("Invalid bad-row policy '{0}': expected one of fail, warn, skip")]
    InvalidPolicy(String),

    /// Date/time format string is not a valid pattern
    #[error("Invalid {kind} format '{format}'")]
    InvalidFormat { kind: &'static str, format: String },

    /// Decimal separator that would make numbers ambiguous
    #[error("Invalid decimal separator '{0}'")]
    InvalidDecimalSeparator(char),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_truncates() {
        let long = "x".repeat(1000);
        let rendered = snippet(&long);
        assert_eq!(rendered.chars().count(), MAX_SNIPPET_LEN + 3);
        assert!(rendered.ends_with("..."));
        assert_eq!(snippet("short"), "short");
    }

    #[test]
    fn test_snippet_is_char_safe() {
        let long = "é".repeat(400);
        let rendered = snippet(&long);
        assert!(rendered.starts_with('é'));
        assert_eq!(rendered.chars().count(), MAX_SNIPPET_LEN + 3);
    }

    #[test]
    fn test_cell_error_path_and_kind() {
        let error = ConversionError::cell("int", &GenericValue::text("bad"), "invalid digit")
            .at("$.age");
        assert_eq!(error.kind(), ConversionErrorKind::Cell);
        let message = error.to_string();
        assert!(message.contains("$.age"));
        assert!(message.contains("\"bad\""));

        // An existing path is kept
        let error = error.at("$.other");
        assert!(error.to_string().contains("$.age"));
    }

    #[test]
    fn test_row_error_root_cause() {
        let cell = ConversionError::cell("int", &GenericValue::text("x"), "nope");
        let row = ConversionError::row("age", cell);
        assert_eq!(row.kind(), ConversionErrorKind::Row);
        assert_eq!(row.root_cause().kind(), ConversionErrorKind::Cell);

        let illegal = ConversionError::illegal_row(&GenericValue::Null, Some(row));
        assert_eq!(illegal.kind(), ConversionErrorKind::IllegalRow);
        assert_eq!(illegal.root_cause().kind(), ConversionErrorKind::Cell);
    }

    #[test]
    fn test_cell_reason_is_truncated() {
        let reason = format!("unexpected trailing input '{}'", "x".repeat(10_000));
        let error = ConversionError::cell("date", &GenericValue::text("2024-01-15"), reason);
        match &error {
            ConversionError::Cell { reason, .. } => {
                assert_eq!(reason.chars().count(), MAX_SNIPPET_LEN + 3);
            }
            other => panic!("Expected cell error, got {:?}", other),
        }
        assert!(error.to_string().len() < 3 * MAX_SNIPPET_LEN);
    }

    #[test]
    fn test_illegal_row_truncates_data() {
        let huge = GenericValue::text("y".repeat(10_000));
        let error = ConversionError::illegal_row(&huge, None);
        assert!(error.to_string().len() < 2 * MAX_SNIPPET_LEN);
    }
}
