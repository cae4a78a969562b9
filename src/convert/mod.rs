//! Schema-driven row conversion
//!
//! Converts untyped rows ([`GenericValue`](crate::models::GenericValue)) into
//! schema-conformant rows ([`TypedValue`](crate::models::TypedValue)).
//!
//! # Layers
//!
//! - [`primitive`]: scalar coercion to the seven primitive kinds
//! - [`logical`]: decimal, uuid and temporal decoding via a [`LogicalCodecs`] table
//! - [`structural`]: records, arrays, maps, unions, enums and fixed values,
//!   with the [`BadRowPolicy`] applied per field
//! - stream adapters for row sources and batches
//!
//! # Example
//!
//! ```
//! use schema_convert::convert::{ConversionContext, ConversionOptions, RowConverter};
//! use schema_convert::models::GenericValue;
//! use schema_convert::schema::parse_schema;
//! use serde_json::json;
//!
//! let schema = parse_schema(
//!     r#"{"type": "record", "name": "R", "fields": [{"name": "id", "type": "long"}]}"#,
//! ).unwrap();
//! let converter = RowConverter::new(schema, ConversionContext::new(ConversionOptions::default()).unwrap());
//! let typed = converter.convert_row(&GenericValue::from_json(json!({"id": "42"}))).unwrap();
//! assert_eq!(typed.to_json_value(), json!({"id": 42}));
//! ```

mod context;
mod error;
pub mod logical;
pub mod primitive;
mod stream;
pub mod structural;

pub use context::{BadRowPolicy, ConversionContext, ConversionOptions, ConversionOptionsBuilder};
pub use error::{ContextError, ConversionError, ConversionErrorKind, MAX_SNIPPET_LEN, snippet};
pub use logical::{BuiltinCodec, LogicalCodec, LogicalCodecs};
pub use stream::{ConversionStats, ConvertedRows, StreamError};
pub use structural::{ROOT_PATH, RowConverter, convert};
