//! Export functionality
//!
//! Row sinks that serialize converted rows:
//! - JSON lines, for both typed and schema-less rows

pub mod jsonl;

pub use jsonl::JsonLinesExporter;

/// Error during export
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("IO error: {0}")]
    IoError(String),
}
