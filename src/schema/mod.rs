//! Schema model
//!
//! The schema tree (records, unions, arrays, maps, enums, fixed, logical
//! annotations) together with its textual form. Schema text follows the Avro
//! JSON layout so that inferred schemas can be written out and reused.

mod error;
mod parser;
mod types;

pub use error::SchemaError;
pub use parser::{SchemaParser, is_valid_name, parse_schema};
pub use types::{
    EnumSchema, FieldSchema, FixedSchema, LogicalKind, LogicalType, PrimitiveKind, RecordSchema,
    Schema,
};
