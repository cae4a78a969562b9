//! Untyped row values
//!
//! [`GenericValue`] is what upstream deserializers hand over: scalars,
//! positional lists and keyed maps with no schema attached.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde_json::{Number, Value};
use uuid::Uuid;

/// A row is a generic value that is either a [`GenericValue::List`]
/// (positional) or a [`GenericValue::Map`] (keyed).
pub type GenericRow = GenericValue;

/// An untyped value
#[derive(Debug, Clone, PartialEq)]
pub enum GenericValue {
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    /// Integer wider than 64 bits
    BigInt(i128),
    Float(f32),
    Double(f64),
    Decimal(Decimal),
    Text(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    Date(NaiveDate),
    Time(NaiveTime),
    /// Time of day with a UTC offset
    OffsetTime(NaiveTime, FixedOffset),
    /// Date-time with no zone
    LocalDateTime(NaiveDateTime),
    /// Date-time with a zone offset (zoned, offset and instant values)
    DateTime(DateTime<FixedOffset>),
    List(Vec<GenericValue>),
    Map(IndexMap<String, GenericValue>),
}

impl GenericValue {
    /// Build a text value
    pub fn text(s: impl Into<String>) -> Self {
        GenericValue::Text(s.into())
    }

    /// Short shape name used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            GenericValue::Null => "null",
            GenericValue::Boolean(_) => "boolean",
            GenericValue::Int(_) => "int",
            GenericValue::Long(_) => "long",
            GenericValue::BigInt(_) => "big-integer",
            GenericValue::Float(_) => "float",
            GenericValue::Double(_) => "double",
            GenericValue::Decimal(_) => "decimal",
            GenericValue::Text(_) => "text",
            GenericValue::Bytes(_) => "bytes",
            GenericValue::Uuid(_) => "uuid",
            GenericValue::Date(_) => "date",
            GenericValue::Time(_) => "time",
            GenericValue::OffsetTime(..) => "offset-time",
            GenericValue::LocalDateTime(_) => "local-datetime",
            GenericValue::DateTime(_) => "datetime",
            GenericValue::List(_) => "list",
            GenericValue::Map(_) => "map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, GenericValue::Null)
    }

    /// The text content, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            GenericValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a key, if this is a map
    pub fn get(&self, key: &str) -> Option<&GenericValue> {
        match self {
            GenericValue::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Convert a parsed JSON document into a generic value
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => GenericValue::Null,
            Value::Bool(b) => GenericValue::Boolean(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    GenericValue::Long(i)
                } else if let Some(u) = n.as_u64() {
                    GenericValue::BigInt(u as i128)
                } else {
                    GenericValue::Double(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => GenericValue::Text(s),
            Value::Array(items) => {
                GenericValue::List(items.into_iter().map(GenericValue::from_json).collect())
            }
            Value::Object(obj) => GenericValue::Map(
                obj.into_iter()
                    .map(|(k, v)| (k, GenericValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Render as JSON. Values JSON cannot carry natively (decimals,
    /// temporals, uuids) become strings and bytes are base64-encoded.
    pub fn to_json_value(&self) -> Value {
        match self {
            GenericValue::Null => Value::Null,
            GenericValue::Boolean(b) => Value::Bool(*b),
            GenericValue::Int(i) => Value::from(*i),
            GenericValue::Long(i) => Value::from(*i),
            GenericValue::BigInt(i) => {
                if let Ok(v) = i64::try_from(*i) {
                    Value::from(v)
                } else if let Ok(v) = u64::try_from(*i) {
                    Value::from(v)
                } else {
                    Value::String(i.to_string())
                }
            }
            GenericValue::Float(f) => float_json(f64::from(*f)),
            GenericValue::Double(f) => float_json(*f),
            GenericValue::Bytes(b) => Value::String(BASE64.encode(b)),
            GenericValue::List(items) => {
                Value::Array(items.iter().map(GenericValue::to_json_value).collect())
            }
            GenericValue::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json_value()))
                    .collect(),
            ),
            other => Value::String(other.to_string()),
        }
    }
}

fn float_json(f: f64) -> Value {
    Number::from_f64(f)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(f.to_string()))
}

/// Default text rendering, used by string coercion
impl fmt::Display for GenericValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenericValue::Null => f.write_str("null"),
            GenericValue::Boolean(b) => write!(f, "{}", b),
            GenericValue::Int(i) => write!(f, "{}", i),
            GenericValue::Long(i) => write!(f, "{}", i),
            GenericValue::BigInt(i) => write!(f, "{}", i),
            GenericValue::Float(v) => write!(f, "{}", v),
            GenericValue::Double(v) => write!(f, "{}", v),
            GenericValue::Decimal(d) => write!(f, "{}", d),
            GenericValue::Text(s) => f.write_str(s),
            GenericValue::Bytes(b) => f.write_str(&String::from_utf8_lossy(b)),
            GenericValue::Uuid(u) => write!(f, "{}", u.hyphenated()),
            GenericValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            GenericValue::Time(t) => write!(f, "{}", t.format("%H:%M:%S%.f")),
            GenericValue::OffsetTime(t, offset) => {
                write!(f, "{}{}", t.format("%H:%M:%S%.f"), offset)
            }
            GenericValue::LocalDateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            GenericValue::DateTime(dt) => f.write_str(&dt.to_rfc3339()),
            GenericValue::List(_) | GenericValue::Map(_) => {
                write!(f, "{}", self.to_json_value())
            }
        }
    }
}

impl From<Value> for GenericValue {
    fn from(value: Value) -> Self {
        GenericValue::from_json(value)
    }
}

impl From<&str> for GenericValue {
    fn from(s: &str) -> Self {
        GenericValue::Text(s.to_string())
    }
}

impl From<String> for GenericValue {
    fn from(s: String) -> Self {
        GenericValue::Text(s)
    }
}

impl From<i64> for GenericValue {
    fn from(i: i64) -> Self {
        GenericValue::Long(i)
    }
}

impl From<bool> for GenericValue {
    fn from(b: bool) -> Self {
        GenericValue::Boolean(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_keeps_key_order() {
        let value = GenericValue::from_json(json!({"zeta": 1, "alpha": "a", "mid": [true, null]}));
        match &value {
            GenericValue::Map(map) => {
                let keys: Vec<&str> = map.keys().map(String::as_str).collect();
                assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
            }
            other => panic!("Expected map, got {:?}", other),
        }
        assert_eq!(value.get("zeta"), Some(&GenericValue::Long(1)));
    }

    #[test]
    fn test_from_json_numbers() {
        assert_eq!(GenericValue::from_json(json!(5)), GenericValue::Long(5));
        assert_eq!(GenericValue::from_json(json!(1.5)), GenericValue::Double(1.5));
        assert_eq!(
            GenericValue::from_json(json!(u64::MAX)),
            GenericValue::BigInt(u64::MAX as i128)
        );
    }

    #[test]
    fn test_display_rendering() {
        assert_eq!(GenericValue::Boolean(true).to_string(), "true");
        assert_eq!(GenericValue::text("abc").to_string(), "abc");
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(GenericValue::Date(date).to_string(), "2024-01-15");
    }

    #[test]
    fn test_to_json_bytes_are_base64() {
        let value = GenericValue::Bytes(b"hi".to_vec());
        assert_eq!(value.to_json_value(), json!("aGk="));
    }
}
