//! Schema-conformant values
//!
//! [`TypedValue`] is the output of the structural converter. Each value
//! corresponds to exactly one schema node; unions carry the index of the
//! alternative that accepted the value.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde_json::{Number, Value};
use uuid::Uuid;

use super::generic::GenericValue;

/// A typed value
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bytes(Vec<u8>),
    String(String),
    /// Decimal normalized to its declared scale
    Decimal(Decimal),
    Uuid(Uuid),
    Date(NaiveDate),
    TimeMillis(NaiveTime),
    TimeMicros(NaiveTime),
    TimestampMillis(DateTime<Utc>),
    TimestampMicros(DateTime<Utc>),
    LocalTimestampMillis(NaiveDateTime),
    LocalTimestampMicros(NaiveDateTime),
    /// Fields in declared order
    Record(IndexMap<String, TypedValue>),
    Array(Vec<TypedValue>),
    Map(IndexMap<String, TypedValue>),
    Union {
        branch: usize,
        value: Box<TypedValue>,
    },
    Enum {
        index: usize,
        symbol: String,
    },
    Fixed(Vec<u8>),
}

impl TypedValue {
    pub fn is_null(&self) -> bool {
        match self {
            TypedValue::Null => true,
            TypedValue::Union { value, .. } => value.is_null(),
            _ => false,
        }
    }

    /// Strip union tagging
    pub fn unwrap_union(&self) -> &TypedValue {
        match self {
            TypedValue::Union { value, .. } => value.unwrap_union(),
            other => other,
        }
    }

    /// Look up a record field or map entry, looking through unions
    pub fn get(&self, name: &str) -> Option<&TypedValue> {
        match self.unwrap_union() {
            TypedValue::Record(fields) | TypedValue::Map(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Short kind name used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            TypedValue::Null => "null",
            TypedValue::Boolean(_) => "boolean",
            TypedValue::Int(_) => "int",
            TypedValue::Long(_) => "long",
            TypedValue::Float(_) => "float",
            TypedValue::Double(_) => "double",
            TypedValue::Bytes(_) => "bytes",
            TypedValue::String(_) => "string",
            TypedValue::Decimal(_) => "decimal",
            TypedValue::Uuid(_) => "uuid",
            TypedValue::Date(_) => "date",
            TypedValue::TimeMillis(_) => "time-millis",
            TypedValue::TimeMicros(_) => "time-micros",
            TypedValue::TimestampMillis(_) => "timestamp-millis",
            TypedValue::TimestampMicros(_) => "timestamp-micros",
            TypedValue::LocalTimestampMillis(_) => "local-timestamp-millis",
            TypedValue::LocalTimestampMicros(_) => "local-timestamp-micros",
            TypedValue::Record(_) => "record",
            TypedValue::Array(_) => "array",
            TypedValue::Map(_) => "map",
            TypedValue::Union { .. } => "union",
            TypedValue::Enum { .. } => "enum",
            TypedValue::Fixed(_) => "fixed",
        }
    }

    /// Convert back into an untyped value (typed format to schema-less output).
    pub fn to_generic(&self) -> GenericValue {
        match self {
            TypedValue::Null => GenericValue::Null,
            TypedValue::Boolean(b) => GenericValue::Boolean(*b),
            TypedValue::Int(i) => GenericValue::Int(*i),
            TypedValue::Long(i) => GenericValue::Long(*i),
            TypedValue::Float(f) => GenericValue::Float(*f),
            TypedValue::Double(f) => GenericValue::Double(*f),
            TypedValue::Bytes(b) | TypedValue::Fixed(b) => GenericValue::Bytes(b.clone()),
            TypedValue::String(s) => GenericValue::Text(s.clone()),
            TypedValue::Decimal(d) => GenericValue::Decimal(*d),
            TypedValue::Uuid(u) => GenericValue::Uuid(*u),
            TypedValue::Date(d) => GenericValue::Date(*d),
            TypedValue::TimeMillis(t) | TypedValue::TimeMicros(t) => GenericValue::Time(*t),
            TypedValue::TimestampMillis(ts) | TypedValue::TimestampMicros(ts) => {
                GenericValue::DateTime(ts.fixed_offset())
            }
            TypedValue::LocalTimestampMillis(ts) | TypedValue::LocalTimestampMicros(ts) => {
                GenericValue::LocalDateTime(*ts)
            }
            TypedValue::Record(fields) | TypedValue::Map(fields) => GenericValue::Map(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_generic()))
                    .collect(),
            ),
            TypedValue::Array(items) => {
                GenericValue::List(items.iter().map(TypedValue::to_generic).collect())
            }
            TypedValue::Union { value, .. } => value.to_generic(),
            TypedValue::Enum { symbol, .. } => GenericValue::Text(symbol.clone()),
        }
    }

    /// Render as plain JSON (union tags dropped, bytes base64-encoded)
    pub fn to_json_value(&self) -> Value {
        match self {
            TypedValue::Null => Value::Null,
            TypedValue::Boolean(b) => Value::Bool(*b),
            TypedValue::Int(i) => Value::from(*i),
            TypedValue::Long(i) => Value::from(*i),
            TypedValue::Float(f) => float_json(f64::from(*f)),
            TypedValue::Double(f) => float_json(*f),
            TypedValue::Bytes(b) | TypedValue::Fixed(b) => Value::String(BASE64.encode(b)),
            TypedValue::String(s) => Value::String(s.clone()),
            TypedValue::Decimal(d) => Value::String(d.to_string()),
            TypedValue::Uuid(u) => Value::String(u.hyphenated().to_string()),
            TypedValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            TypedValue::TimeMillis(t) => Value::String(t.format("%H:%M:%S%.3f").to_string()),
            TypedValue::TimeMicros(t) => Value::String(t.format("%H:%M:%S%.6f").to_string()),
            TypedValue::TimestampMillis(ts) => {
                Value::String(ts.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            TypedValue::TimestampMicros(ts) => {
                Value::String(ts.to_rfc3339_opts(SecondsFormat::Micros, true))
            }
            TypedValue::LocalTimestampMillis(ts) => {
                Value::String(ts.format("%Y-%m-%dT%H:%M:%S%.3f").to_string())
            }
            TypedValue::LocalTimestampMicros(ts) => {
                Value::String(ts.format("%Y-%m-%dT%H:%M:%S%.6f").to_string())
            }
            TypedValue::Record(fields) | TypedValue::Map(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json_value()))
                    .collect(),
            ),
            TypedValue::Array(items) => {
                Value::Array(items.iter().map(TypedValue::to_json_value).collect())
            }
            TypedValue::Union { value, .. } => value.to_json_value(),
            TypedValue::Enum { symbol, .. } => Value::String(symbol.clone()),
        }
    }
}

fn float_json(f: f64) -> Value {
    Number::from_f64(f)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(f.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_get_looks_through_union() {
        let mut fields = IndexMap::new();
        fields.insert("a".to_string(), TypedValue::Long(1));
        let value = TypedValue::Union {
            branch: 1,
            value: Box::new(TypedValue::Record(fields)),
        };
        assert_eq!(value.get("a"), Some(&TypedValue::Long(1)));
        assert_eq!(value.get("b"), None);
    }

    #[test]
    fn test_to_generic_record() {
        let mut fields = IndexMap::new();
        fields.insert(
            "color".to_string(),
            TypedValue::Enum {
                index: 0,
                symbol: "RED".to_string(),
            },
        );
        fields.insert(
            "n".to_string(),
            TypedValue::Union {
                branch: 1,
                value: Box::new(TypedValue::Int(3)),
            },
        );
        let generic = TypedValue::Record(fields).to_generic();
        assert_eq!(generic.get("color"), Some(&GenericValue::text("RED")));
        assert_eq!(generic.get("n"), Some(&GenericValue::Int(3)));
    }

    #[test]
    fn test_timestamp_json_precision() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(
            TypedValue::TimestampMillis(ts).to_json_value(),
            json!("2024-01-15T10:30:00.000Z")
        );
        assert_eq!(
            TypedValue::TimestampMicros(ts).to_json_value(),
            json!("2024-01-15T10:30:00.000000Z")
        );
    }
}
