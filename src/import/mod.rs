//! Import functionality
//!
//! Row sources that deserialize external formats into generic rows:
//! - JSON lines (one JSON document per line)

pub mod jsonl;

pub use jsonl::JsonLinesImporter;

/// Error during import
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },
    #[error("IO error: {0}")]
    IoError(String),
}
