//! Schema inference engine

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::InferenceConfig;
use super::error::InferenceError;
use super::merge::merge_types;
use super::names::{NameTable, sanitize_name};
use crate::models::GenericValue;
use crate::schema::{FieldSchema, LogicalKind, PrimitiveKind, RecordSchema, Schema};

/// Precision given to decimals observed in sampled rows
const INFERRED_DECIMAL_PRECISION: u32 = 28;

/// Statistics from schema inference
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceStats {
    /// Rows sampled
    pub rows_sampled: usize,
    /// Distinct structural paths seen
    pub paths_discovered: usize,
    /// Whether sampling stopped at the sample limit
    pub sample_limit_reached: bool,
}

/// Path-keyed memo of the most-merged schema seen so far
///
/// Lives for one inference pass. Every time a path is observed, its schema is
/// merged into the memo entry, so repeated appearances converge.
#[derive(Debug, Default)]
pub struct InferenceState {
    memo: HashMap<String, Schema>,
}

impl InferenceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `schema` into the entry for `path` and return the merged schema
    pub fn converge(&mut self, path: &str, schema: Schema) -> Schema {
        let merged = match self.memo.get(path) {
            Some(existing) => merge_types(existing, &schema),
            None => schema,
        };
        self.memo.insert(path.to_string(), merged.clone());
        merged
    }

    pub fn get(&self, path: &str) -> Option<&Schema> {
        self.memo.get(path)
    }

    pub fn len(&self) -> usize {
        self.memo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }
}

/// Schema inference engine
///
/// Infers a schema for each sampled row and folds the row schemas together
/// with [`merge_types`]. Rows beyond the sample limit are ignored.
pub struct SchemaInferrer {
    config: InferenceConfig,
    root_name: String,
    state: InferenceState,
    /// Field names per record path
    names: HashMap<String, NameTable>,
    schema: Option<Schema>,
    rows_sampled: usize,
}

impl SchemaInferrer {
    /// Create a new schema inferrer with default configuration
    pub fn new() -> Self {
        Self::with_config(InferenceConfig::default())
    }

    /// Create a new schema inferrer with custom configuration
    pub fn with_config(config: InferenceConfig) -> Self {
        let root_name = sanitize_name(&config.root_name);
        Self {
            config,
            root_name,
            state: InferenceState::new(),
            names: HashMap::new(),
            schema: None,
            rows_sampled: 0,
        }
    }

    /// Whether the sample limit has been reached
    pub fn is_full(&self) -> bool {
        self.rows_sampled >= self.config.effective_sample_limit()
    }

    /// Add one sampled row
    ///
    /// Returns `false` without inspecting the row once the sample limit is
    /// reached.
    pub fn add_row(&mut self, row: &GenericValue) -> Result<bool, InferenceError> {
        if self.is_full() {
            return Ok(false);
        }

        let map = match row {
            GenericValue::Map(map) => map,
            other => {
                return Err(InferenceError::UnhandledShape {
                    path: self.root_name.clone(),
                    shape: other.type_name().to_string(),
                });
            }
        };

        let root_path = self.root_name.clone();
        let mut record = self.infer_record(&root_path, map)?;
        record.namespace = self.config.namespace.clone();
        let row_schema = self.state.converge(&root_path, Schema::Record(record));

        self.schema = Some(match self.schema.take() {
            Some(accumulated) => merge_types(&accumulated, &row_schema),
            None => row_schema,
        });
        self.rows_sampled += 1;
        debug!(
            row = self.rows_sampled,
            paths = self.state.len(),
            "Merged sample row"
        );
        Ok(true)
    }

    /// Sample rows from a fallible source, stopping at the sample limit
    pub fn add_rows<I, E>(&mut self, rows: I) -> Result<(), InferenceError>
    where
        I: IntoIterator<Item = Result<GenericValue, E>>,
        E: Into<InferenceError>,
    {
        let remaining = self
            .config
            .effective_sample_limit()
            .saturating_sub(self.rows_sampled);
        for row in rows.into_iter().take(remaining) {
            let row = row.map_err(Into::into)?;
            self.add_row(&row)?;
        }
        if self.is_full() {
            debug!(
                sample_limit = self.config.effective_sample_limit(),
                "Sample limit reached"
            );
        }
        Ok(())
    }

    /// Get the inferred schema
    pub fn finalize(self) -> Result<Schema, InferenceError> {
        self.schema.ok_or(InferenceError::EmptyInput)
    }

    /// Get inference statistics
    pub fn stats(&self) -> InferenceStats {
        InferenceStats {
            rows_sampled: self.rows_sampled,
            paths_discovered: self.state.len(),
            sample_limit_reached: self.is_full(),
        }
    }

    /// Get the number of rows sampled
    pub fn rows_sampled(&self) -> usize {
        self.rows_sampled
    }

    fn infer_record(
        &mut self,
        path: &str,
        map: &IndexMap<String, GenericValue>,
    ) -> Result<RecordSchema, InferenceError> {
        let mut fields = Vec::with_capacity(map.len());
        for (key, value) in map {
            let name = self
                .names
                .entry(path.to_string())
                .or_default()
                .assign(key);
            let schema = self.infer_value(&format!("{path}.{name}"), value)?;
            let field = if name == *key {
                FieldSchema::new(name, schema)
            } else {
                FieldSchema::new(name, schema).with_aliases([key.clone()])
            };
            fields.push(field);
        }

        let (namespace, name) = split_path(path);
        let mut record = RecordSchema::new(name, fields);
        if let Some(parent) = namespace {
            record.namespace = Some(match &self.config.namespace {
                Some(ns) => format!("{ns}.{parent}"),
                None => parent.to_string(),
            });
        }
        Ok(record)
    }

    fn infer_value(&mut self, path: &str, value: &GenericValue) -> Result<Schema, InferenceError> {
        let schema = match value {
            GenericValue::Null => Schema::Null,
            GenericValue::Map(map) => Schema::nullable(Schema::Record(self.infer_record(path, map)?)),
            GenericValue::List(items) if items.is_empty() => {
                Schema::nullable(Schema::array(Schema::string()))
            }
            GenericValue::List(items) => {
                let items_path = format!("{path}_items");
                let sampled = if self.config.shallow_arrays {
                    &items[..1]
                } else {
                    &items[..]
                };
                let mut element: Option<Schema> = None;
                for item in sampled {
                    let observed = self.infer_value(&items_path, item)?;
                    element = Some(match element {
                        Some(previous) => merge_types(&previous, &observed),
                        None => observed,
                    });
                }
                let element = element.unwrap_or_else(Schema::string);
                Schema::nullable(Schema::array(element))
            }
            scalar => Schema::nullable(scalar_schema(scalar, path)?),
        };
        Ok(self.state.converge(path, schema))
    }
}

impl Default for SchemaInferrer {
    fn default() -> Self {
        Self::new()
    }
}

/// Infer a schema from at most `sample_limit` rows
pub fn infer<I>(rows: I, sample_limit: usize) -> Result<Schema, InferenceError>
where
    I: IntoIterator<Item = GenericValue>,
{
    let config = InferenceConfig::builder().sample_limit(sample_limit).build();
    infer_with_config(rows.into_iter().map(Ok::<_, InferenceError>), config)
}

/// Infer a schema from a fallible row source
pub fn infer_with_config<I, E>(rows: I, config: InferenceConfig) -> Result<Schema, InferenceError>
where
    I: IntoIterator<Item = Result<GenericValue, E>>,
    E: Into<InferenceError>,
{
    let mut inferrer = SchemaInferrer::with_config(config);
    inferrer.add_rows(rows)?;
    inferrer.finalize()
}

fn scalar_schema(value: &GenericValue, path: &str) -> Result<Schema, InferenceError> {
    let schema = match value {
        GenericValue::Boolean(_) => Schema::Primitive(PrimitiveKind::Boolean),
        GenericValue::Int(_) => Schema::Primitive(PrimitiveKind::Int),
        GenericValue::Long(_) | GenericValue::BigInt(_) => Schema::Primitive(PrimitiveKind::Long),
        GenericValue::Float(_) => Schema::Primitive(PrimitiveKind::Float),
        GenericValue::Double(_) => Schema::Primitive(PrimitiveKind::Double),
        GenericValue::Text(_) => Schema::string(),
        GenericValue::Bytes(_) => Schema::Primitive(PrimitiveKind::Bytes),
        GenericValue::Decimal(d) => Schema::logical(LogicalKind::Decimal {
            precision: INFERRED_DECIMAL_PRECISION,
            scale: d.scale(),
        }),
        GenericValue::Uuid(_) => Schema::logical(LogicalKind::Uuid),
        GenericValue::Date(_) => Schema::logical(LogicalKind::Date),
        GenericValue::Time(_) | GenericValue::OffsetTime(..) => {
            Schema::logical(LogicalKind::TimeMicros)
        }
        GenericValue::LocalDateTime(_) => Schema::logical(LogicalKind::LocalTimestampMicros),
        GenericValue::DateTime(_) => Schema::logical(LogicalKind::TimestampMicros),
        other => {
            return Err(InferenceError::UnhandledShape {
                path: path.to_string(),
                shape: other.type_name().to_string(),
            });
        }
    };
    Ok(schema)
}

/// Split `a.b.c` into (`Some("a.b")`, `"c"`)
fn split_path(path: &str) -> (Option<&str>, &str) {
    match path.rsplit_once('.') {
        Some((parent, name)) => (Some(parent), name),
        None => (None, path),
    }
}
