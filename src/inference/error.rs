//! Error types for schema inference

use thiserror::Error;

use crate::import::ImportError;

/// Errors that can occur during schema inference
#[derive(Error, Debug)]
pub enum InferenceError {
    /// No rows were available to sample
    #[error("No rows provided for inference")]
    EmptyInput,

    /// A sampled value has no inference rule
    #[error("Cannot infer a schema for {shape} at '{path}'")]
    UnhandledShape { path: String, shape: String },

    /// The row source failed
    #[error("Failed to read sample row: {0}")]
    Import(#[from] ImportError),
}
