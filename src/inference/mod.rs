//! Schema inference from sampled rows
//!
//! Derives a schema from untyped rows when none is declared. Each sampled row
//! is inferred on its own and the results are unified into one schema.
//!
//! ## Rules
//!
//! - **Maps** become records; nested records are nullable
//! - **Lists** become arrays of the union of their element types; empty lists
//!   become nullable arrays of strings
//! - **Scalars** map to the matching primitive or logical type, nullable
//! - **Conflicts** across rows become unions; records and arrays merge
//!   structurally instead
//!
//! ## Example
//!
//! ```rust
//! use schema_convert::inference::{InferenceConfig, SchemaInferrer};
//! use schema_convert::models::GenericValue;
//! use serde_json::json;
//!
//! let mut inferrer = SchemaInferrer::with_config(InferenceConfig::builder().sample_limit(10).build());
//! inferrer.add_row(&GenericValue::from_json(json!({"name": "Alice", "age": 30}))).unwrap();
//! inferrer.add_row(&GenericValue::from_json(json!({"name": "Bob", "email": "bob@example.com"}))).unwrap();
//!
//! let schema = inferrer.finalize().unwrap();
//! assert_eq!(schema.as_record().unwrap().field_names(), vec!["name", "age", "email"]);
//! ```

mod config;
mod error;
mod inferrer;
mod merge;
mod names;

pub use config::{InferenceConfig, InferenceConfigBuilder};
pub use error::InferenceError;
pub use inferrer::{InferenceState, InferenceStats, SchemaInferrer, infer, infer_with_config};
pub use merge::{merge_records, merge_types};
pub use names::sanitize_name;
