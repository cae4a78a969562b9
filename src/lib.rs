//! Schema Convert - Schema-driven row conversion and schema inference
//!
//! Provides unified interfaces for:
//! - Schema model and Avro-style schema text
//! - Primitive coercion and logical-type decoding
//! - Structural conversion of untyped rows with a bad-row policy
//! - Schema inference from sampled rows
//! - JSON-lines import/export of rows

pub mod convert;
pub mod export;
pub mod import;
pub mod inference;
pub mod models;
pub mod schema;

#[cfg(feature = "cli")]
pub mod cli;

// Re-export commonly used types
pub use convert::{
    BadRowPolicy, ConversionContext, ConversionError, ConversionOptions, ConversionStats,
    LogicalCodec, LogicalCodecs, RowConverter, StreamError, convert,
};
pub use export::{ExportError, JsonLinesExporter};
pub use import::{ImportError, JsonLinesImporter};
pub use inference::{
    InferenceConfig, InferenceError, SchemaInferrer, infer, infer_with_config, merge_types,
};
pub use models::{GenericRow, GenericValue, TypedValue};
pub use schema::{FieldSchema, LogicalKind, PrimitiveKind, RecordSchema, Schema, SchemaError, parse_schema};
