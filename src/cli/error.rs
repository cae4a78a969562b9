//! CLI error type

use std::path::PathBuf;

use thiserror::Error;

use crate::convert::ContextError;
use crate::export::ExportError;
use crate::import::ImportError;
use crate::inference::InferenceError;
use crate::schema::SchemaError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read {}: {1}", .0.display())]
    FileReadError(PathBuf, String),

    #[error("Failed to write {}: {1}", .0.display())]
    FileWriteError(PathBuf, String),

    #[error("Invalid config file {}: {1}", .0.display())]
    ConfigError(PathBuf, String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Conversion failed: {0}")]
    ConversionError(String),
}
