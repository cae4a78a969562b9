//! Error types for schema parsing

use thiserror::Error;

/// Errors raised while parsing schema text.
///
/// These are configuration errors: they are surfaced immediately and never
/// go through the bad-row policy.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Schema text is not valid JSON
    #[error("Invalid schema JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Structurally invalid schema
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// Reference to a type that was never defined
    #[error("Unknown type: {0}")]
    UnknownType(String),

    /// Name does not follow the naming rules
    #[error("Invalid name '{0}': must start with a letter or '_' and contain only letters, digits and '_'")]
    InvalidName(String),

    /// A name was declared twice where names must be unique
    #[error("Duplicate {kind} '{name}'")]
    Duplicate { kind: &'static str, name: String },
}

impl SchemaError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        SchemaError::InvalidSchema(message.into())
    }
}
