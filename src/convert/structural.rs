//! Structural conversion
//!
//! Walks a schema tree and a generic row in lockstep, producing a
//! [`TypedValue`] whose shape matches the schema exactly. Records are matched
//! by field name (or alias) for keyed rows and by position for list rows.
//!
//! Failure handling follows the [`BadRowPolicy`]:
//! - `fail`: the first failing field aborts the row with a [`ConversionError::Row`]
//! - `warn`: the failing field becomes null and a warning is logged
//! - `skip`: the failing field becomes null silently
//!
//! Union alternatives are first tried with `fail`, so an alternative that
//! only partially matches never wins. When none matches and the policy is
//! `warn` or `skip`, the first alternative of the input's shape (a record for
//! a map, an array for a list) is converted under that policy, so bad cells
//! inside a nullable nested record are nulled one by one.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, warn};

use super::context::{BadRowPolicy, ConversionContext};
use super::error::{ConversionError, describe, snippet};
use super::primitive;
use crate::models::{GenericValue, TypedValue};
use crate::schema::{FieldSchema, PrimitiveKind, RecordSchema, Schema};

/// Path of the row itself in diagnostics
pub const ROOT_PATH: &str = "$";

/// Convert a whole row against `schema`
///
/// The row must be a list or a map. Any failure that escapes the field-level
/// policy is reported as [`ConversionError::IllegalRow`].
pub fn convert(
    schema: &Schema,
    row: &GenericValue,
    ctx: &ConversionContext,
) -> Result<TypedValue, ConversionError> {
    if !matches!(row, GenericValue::List(_) | GenericValue::Map(_)) {
        return Err(ConversionError::illegal_row(row, None));
    }
    Walker { ctx }
        .value(schema, row, ROOT_PATH, ctx.on_bad_row())
        .map_err(|e| ConversionError::illegal_row(row, Some(e)))
}

/// Converts rows against a fixed schema and context
///
/// Cheap to clone; the schema and context are shared.
#[derive(Debug, Clone)]
pub struct RowConverter {
    schema: Arc<Schema>,
    context: Arc<ConversionContext>,
}

impl RowConverter {
    pub fn new(schema: Schema, context: ConversionContext) -> Self {
        Self::from_shared(Arc::new(schema), Arc::new(context))
    }

    pub fn from_shared(schema: Arc<Schema>, context: Arc<ConversionContext>) -> Self {
        Self { schema, context }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn context(&self) -> &ConversionContext {
        &self.context
    }

    /// Convert one row
    pub fn convert_row(&self, row: &GenericValue) -> Result<TypedValue, ConversionError> {
        convert(&self.schema, row, &self.context)
    }

    /// Convert a single value against any schema node, without row checks
    pub fn convert_value(
        &self,
        schema: &Schema,
        value: &GenericValue,
    ) -> Result<TypedValue, ConversionError> {
        Walker { ctx: &self.context }.value(schema, value, ROOT_PATH, self.context.on_bad_row())
    }
}

/// Record input, either keyed or positional
enum RecordInput<'v> {
    Keyed(&'v IndexMap<String, GenericValue>),
    Positional(&'v [GenericValue]),
}

impl<'v> RecordInput<'v> {
    fn len(&self) -> usize {
        match self {
            RecordInput::Keyed(map) => map.len(),
            RecordInput::Positional(items) => items.len(),
        }
    }

    /// Find the input for the field at `index`; aliases are tried in order
    fn lookup(&self, index: usize, field: &FieldSchema) -> Option<&'v GenericValue> {
        match self {
            RecordInput::Keyed(map) => map.get(&field.name).or_else(|| {
                field
                    .aliases
                    .iter()
                    .find_map(|alias| map.get(alias.as_str()))
            }),
            RecordInput::Positional(items) => items.get(index),
        }
    }
}

struct Walker<'c> {
    ctx: &'c ConversionContext,
}

impl Walker<'_> {
    fn value(
        &self,
        schema: &Schema,
        value: &GenericValue,
        path: &str,
        policy: BadRowPolicy,
    ) -> Result<TypedValue, ConversionError> {
        if self.ctx.infer_all_fields() {
            if let Some(token) = self.token_override(schema, value) {
                return Ok(token);
            }
        }

        if value.is_null() && !matches!(schema, Schema::Null | Schema::Union(_)) {
            return Err(ConversionError::cell(schema, value, "null is not allowed").at(path));
        }

        match schema {
            Schema::Null => {
                if self.ctx.is_null(value) {
                    Ok(TypedValue::Null)
                } else {
                    Err(ConversionError::cell(schema, value, "expected null").at(path))
                }
            }
            Schema::Primitive(kind) => {
                primitive::coerce(*kind, value, self.ctx).map_err(|e| e.at(path))
            }
            Schema::Logical(logical) => match self.ctx.codecs().get(logical.kind.name()) {
                Some(codec) => codec
                    .decode(&logical.kind, value, self.ctx)
                    .map_err(|e| e.at(path)),
                None => {
                    debug!(
                        logical_type = logical.kind.name(),
                        path, "No codec registered, converting against physical type"
                    );
                    self.value(&logical.physical, value, path, policy)
                }
            },
            Schema::Record(record) => self.record(record, value, path, policy),
            Schema::Array(items) => match value {
                GenericValue::List(elements) => elements
                    .iter()
                    .enumerate()
                    .map(|(i, element)| self.value(items, element, &format!("{path}[{i}]"), policy))
                    .collect::<Result<Vec<_>, _>>()
                    .map(TypedValue::Array),
                other => Err(ConversionError::cell(schema, other, "expected a list").at(path)),
            },
            Schema::Map(values) => match value {
                GenericValue::Map(entries) => entries
                    .iter()
                    .map(|(key, entry)| {
                        self.value(values, entry, &child_path(path, key), policy)
                            .map(|typed| (key.clone(), typed))
                    })
                    .collect::<Result<IndexMap<_, _>, _>>()
                    .map(TypedValue::Map),
                other => Err(ConversionError::cell(schema, other, "expected a map").at(path)),
            },
            Schema::Union(alternatives) => self.union(schema, alternatives, value, path, policy),
            Schema::Enum(enumeration) => {
                let symbol = match value {
                    GenericValue::Text(s) => s.clone(),
                    other => other.to_string(),
                };
                match enumeration.symbol_index(&symbol) {
                    Some(index) => Ok(TypedValue::Enum { index, symbol }),
                    None => Err(ConversionError::cell(
                        &enumeration.name,
                        value,
                        format!("not one of {:?}", enumeration.symbols),
                    )
                    .at(path)),
                }
            }
            Schema::Fixed(fixed) => {
                let bytes = match value {
                    GenericValue::Bytes(b) => b.clone(),
                    other => other.to_string().into_bytes(),
                };
                if bytes.len() == fixed.size {
                    Ok(TypedValue::Fixed(bytes))
                } else {
                    Err(ConversionError::cell(
                        &fixed.name,
                        value,
                        format!("expected {} bytes, found {}", fixed.size, bytes.len()),
                    )
                    .at(path))
                }
            }
        }
    }

    fn record(
        &self,
        record: &RecordSchema,
        value: &GenericValue,
        path: &str,
        policy: BadRowPolicy,
    ) -> Result<TypedValue, ConversionError> {
        let input = match value {
            GenericValue::Map(map) => RecordInput::Keyed(map),
            GenericValue::List(items) => RecordInput::Positional(items),
            other => {
                return Err(ConversionError::cell(
                    record.fullname(),
                    other,
                    "expected a map or a list",
                )
                .at(path));
            }
        };

        if self.ctx.strict_schema() && input.len() > record.fields.len() {
            let violation = ConversionError::StrictSchema {
                path: path.to_string(),
                declared: record.field_names(),
                actual: input.len(),
                values: snippet(value),
            };
            match policy {
                BadRowPolicy::Fail => return Err(violation),
                BadRowPolicy::Warn => {
                    warn!(path, error = %violation, "Ignoring undeclared input fields")
                }
                BadRowPolicy::Skip => {}
            }
        }

        let mut fields = IndexMap::with_capacity(record.fields.len());
        for (index, field) in record.fields.iter().enumerate() {
            let field_path = child_path(path, &field.name);
            let converted = match input.lookup(index, field) {
                Some(v) => self.value(&field.schema, v, &field_path, policy),
                None => self.missing(field, &field_path, policy),
            };
            let typed = match converted {
                Ok(typed) => typed,
                Err(source) => match policy {
                    BadRowPolicy::Fail => return Err(ConversionError::row(&field.name, source)),
                    BadRowPolicy::Warn => {
                        warn!(
                            path = %field_path,
                            error = %source,
                            "Replacing unconvertible value with null"
                        );
                        null_for(&field.schema)
                    }
                    BadRowPolicy::Skip => null_for(&field.schema),
                },
            };
            fields.insert(field.name.clone(), typed);
        }
        Ok(TypedValue::Record(fields))
    }

    /// Value for a field absent from the input: its default, else null
    fn missing(
        &self,
        field: &FieldSchema,
        path: &str,
        policy: BadRowPolicy,
    ) -> Result<TypedValue, ConversionError> {
        match &field.default {
            Some(default) => {
                let default = GenericValue::from_json(default.clone());
                self.value(&field.schema, &default, path, policy)
            }
            None => self.value(&field.schema, &GenericValue::Null, path, policy),
        }
    }

    fn union(
        &self,
        schema: &Schema,
        alternatives: &[Schema],
        value: &GenericValue,
        path: &str,
        policy: BadRowPolicy,
    ) -> Result<TypedValue, ConversionError> {
        let failures = match first_success(alternatives, |alternative| {
            self.value(alternative, value, path, BadRowPolicy::Fail)
        }) {
            Ok((branch, typed)) => return Ok(tagged(branch, typed)),
            Err(failures) => failures,
        };

        if policy != BadRowPolicy::Fail {
            if let Some(branch) = alternatives
                .iter()
                .position(|alternative| same_shape(alternative, value))
            {
                if let Ok(typed) = self.value(&alternatives[branch], value, path, policy) {
                    return Ok(tagged(branch, typed));
                }
            }
        }

        Err(ConversionError::UnionMismatch {
            path: path.to_string(),
            schema: snippet(schema),
            value: describe(value),
            failures,
        })
    }

    /// With `infer_all_fields`, null and boolean text tokens win over the
    /// declared type. Inside a union the token takes the first alternative of
    /// matching kind; if there is none, normal union matching applies.
    fn token_override(&self, schema: &Schema, value: &GenericValue) -> Option<TypedValue> {
        let text = value.as_text()?;
        let token = if self.ctx.is_null_token(text) {
            TypedValue::Null
        } else if self.ctx.is_true_token(text) {
            TypedValue::Boolean(true)
        } else if self.ctx.is_false_token(text) {
            TypedValue::Boolean(false)
        } else {
            return None;
        };

        match schema {
            Schema::Union(alternatives) => {
                let branch = alternatives.iter().position(|alternative| {
                    matches!(
                        (alternative, &token),
                        (Schema::Null, TypedValue::Null)
                            | (Schema::Primitive(PrimitiveKind::Boolean), TypedValue::Boolean(_))
                    )
                })?;
                Some(TypedValue::Union {
                    branch,
                    value: Box::new(token),
                })
            }
            _ => Some(token),
        }
    }
}

/// Apply `attempt` to each alternative in order, returning the index and
/// result of the first success, or every failure.
fn first_success<S, T, E>(
    alternatives: &[S],
    mut attempt: impl FnMut(&S) -> Result<T, E>,
) -> Result<(usize, T), Vec<E>> {
    let mut failures = Vec::with_capacity(alternatives.len());
    for (index, alternative) in alternatives.iter().enumerate() {
        match attempt(alternative) {
            Ok(value) => return Ok((index, value)),
            Err(e) => failures.push(e),
        }
    }
    Err(failures)
}

fn tagged(branch: usize, typed: TypedValue) -> TypedValue {
    TypedValue::Union {
        branch,
        value: Box::new(typed),
    }
}

/// Whether `schema` is the container kind that `value` has
fn same_shape(schema: &Schema, value: &GenericValue) -> bool {
    matches!(
        (schema, value),
        (Schema::Record(_), GenericValue::Map(_) | GenericValue::List(_))
            | (Schema::Array(_), GenericValue::List(_))
            | (Schema::Map(_), GenericValue::Map(_))
    )
}

/// Null placeholder for a failed field; tagged when the schema is a nullable union
fn null_for(schema: &Schema) -> TypedValue {
    match schema {
        Schema::Union(alternatives) => match alternatives.iter().position(|a| *a == Schema::Null) {
            Some(branch) => TypedValue::Union {
                branch,
                value: Box::new(TypedValue::Null),
            },
            None => TypedValue::Null,
        },
        _ => TypedValue::Null,
    }
}

fn child_path(parent: &str, name: &str) -> String {
    format!("{parent}.{name}")
}
