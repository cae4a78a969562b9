//! Row value models
//!
//! - [`GenericValue`]: untyped rows as produced by format deserializers
//! - [`TypedValue`]: schema-conformant rows as consumed by typed writers

mod generic;
mod typed;

pub use generic::{GenericRow, GenericValue};
pub use typed::TypedValue;
