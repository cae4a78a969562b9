//! Schema text parser
//!
//! Parses Avro-style JSON schema text into the [`Schema`] tree. Named types
//! (records, enums, fixed) are registered as they are defined and later
//! references to them resolve to a copy of the definition.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use super::error::SchemaError;
use super::types::{
    EnumSchema, FieldSchema, FixedSchema, LogicalKind, LogicalType, PrimitiveKind, RecordSchema,
    Schema,
};

static NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Parse schema text into a [`Schema`].
///
/// # Example
///
/// ```
/// use schema_convert::schema::parse_schema;
///
/// let schema = parse_schema(r#"{"type": "array", "items": "string"}"#).unwrap();
/// assert_eq!(schema.type_name(), "array");
/// ```
pub fn parse_schema(text: &str) -> Result<Schema, SchemaError> {
    let value: Value = serde_json::from_str(text)?;
    SchemaParser::new().parse(&value)
}

/// Check a simple (unqualified) name against the naming rules
pub fn is_valid_name(name: &str) -> bool {
    NAME_REGEX.is_match(name)
}

/// Schema parser with a registry of named types.
#[derive(Debug, Default)]
pub struct SchemaParser {
    /// Named types by fully qualified name
    named_types: HashMap<String, Schema>,
    /// Namespace inherited by unqualified names
    current_namespace: Option<String>,
    /// Records whose fields are being parsed
    defining: HashSet<String>,
}

impl SchemaParser {
    /// Create a new parser with an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON value into a schema
    pub fn parse(&mut self, value: &Value) -> Result<Schema, SchemaError> {
        match value {
            Value::String(s) => self.parse_name(s),
            Value::Array(alternatives) => self.parse_union(alternatives),
            Value::Object(obj) => self.parse_object(obj),
            other => Err(SchemaError::invalid(format!(
                "expected a type name, object or array, found {}",
                other
            ))),
        }
    }

    fn parse_name(&self, name: &str) -> Result<Schema, SchemaError> {
        if name == "null" {
            return Ok(Schema::Null);
        }
        if let Some(kind) = PrimitiveKind::from_name(name) {
            return Ok(Schema::Primitive(kind));
        }
        let fullname = self.qualify(name);
        if self.defining.contains(&fullname) || self.defining.contains(name) {
            return Err(SchemaError::invalid(format!(
                "recursive reference to record '{}' is not supported",
                fullname
            )));
        }
        self.named_types
            .get(&fullname)
            .or_else(|| self.named_types.get(name))
            .cloned()
            .ok_or(SchemaError::UnknownType(fullname))
    }

    fn parse_union(&mut self, alternatives: &[Value]) -> Result<Schema, SchemaError> {
        let mut parsed: Vec<Schema> = Vec::with_capacity(alternatives.len());
        for value in alternatives {
            let schema = self.parse(value)?;
            if matches!(schema, Schema::Union(_)) {
                return Err(SchemaError::invalid("unions may not directly contain unions"));
            }
            if parsed.contains(&schema) {
                return Err(SchemaError::Duplicate {
                    kind: "union alternative",
                    name: schema.to_json(),
                });
            }
            parsed.push(schema);
        }
        Ok(Schema::Union(parsed))
    }

    fn parse_object(&mut self, obj: &Map<String, Value>) -> Result<Schema, SchemaError> {
        let type_value = obj
            .get("type")
            .ok_or_else(|| SchemaError::invalid("missing 'type' attribute"))?;

        let base = match type_value {
            Value::String(type_name) => match type_name.as_str() {
                "record" | "error" => self.parse_record(obj)?,
                "enum" => self.parse_enum(obj)?,
                "fixed" => self.parse_fixed(obj)?,
                "array" => {
                    let items = obj
                        .get("items")
                        .ok_or_else(|| SchemaError::invalid("array is missing 'items'"))?;
                    Schema::array(self.parse(items)?)
                }
                "map" => {
                    let values = obj
                        .get("values")
                        .ok_or_else(|| SchemaError::invalid("map is missing 'values'"))?;
                    Schema::map(self.parse(values)?)
                }
                other => self.parse_name(other)?,
            },
            nested => self.parse(nested)?,
        };

        match obj.get("logicalType").and_then(Value::as_str) {
            Some(logical) => self.wrap_logical(obj, logical, base),
            None => Ok(base),
        }
    }

    fn wrap_logical(
        &self,
        obj: &Map<String, Value>,
        logical: &str,
        base: Schema,
    ) -> Result<Schema, SchemaError> {
        let kind = match logical {
            "decimal" => {
                let precision = obj
                    .get("precision")
                    .and_then(Value::as_u64)
                    .filter(|p| *p > 0)
                    .ok_or_else(|| {
                        SchemaError::invalid("decimal requires a positive 'precision'")
                    })?;
                let scale = obj.get("scale").and_then(Value::as_u64).unwrap_or(0);
                if scale > precision {
                    return Err(SchemaError::invalid(format!(
                        "decimal scale {} exceeds precision {}",
                        scale, precision
                    )));
                }
                LogicalKind::Decimal {
                    precision: precision as u32,
                    scale: scale as u32,
                }
            }
            "uuid" => LogicalKind::Uuid,
            "date" => LogicalKind::Date,
            "time-millis" => LogicalKind::TimeMillis,
            "time-micros" => LogicalKind::TimeMicros,
            "timestamp-millis" => LogicalKind::TimestampMillis,
            "timestamp-micros" => LogicalKind::TimestampMicros,
            "local-timestamp-millis" => LogicalKind::LocalTimestampMillis,
            "local-timestamp-micros" => LogicalKind::LocalTimestampMicros,
            other => {
                tracing::debug!(logical_type = other, "Ignoring unknown logical type");
                return Ok(base);
            }
        };

        if !physical_matches(&kind, &base) {
            tracing::warn!(
                logical_type = kind.name(),
                physical = base.type_name(),
                "Logical type does not fit its physical type, ignoring annotation"
            );
            return Ok(base);
        }
        Ok(Schema::Logical(LogicalType::new(kind, base)))
    }

    /// Records are plain trees, so a record may not refer to itself from
    /// within its own fields.
    fn parse_record(&mut self, obj: &Map<String, Value>) -> Result<Schema, SchemaError> {
        let (name, namespace) = self.declared_name(obj)?;
        let fullname = qualify_declared(&name, namespace.as_deref());

        let saved_namespace = self.current_namespace.clone();
        self.current_namespace = namespace.clone();

        let raw_fields = obj
            .get("fields")
            .and_then(Value::as_array)
            .ok_or_else(|| SchemaError::invalid(format!("record '{}' has no 'fields'", name)));
        self.defining.insert(fullname.clone());
        let fields = raw_fields.and_then(|raw| self.parse_fields(raw));
        self.defining.remove(&fullname);

        self.current_namespace = saved_namespace;
        let fields = fields?;

        let record = RecordSchema {
            name,
            namespace,
            doc: string_attr(obj, "doc"),
            aliases: string_list(obj, "aliases"),
            fields,
        };
        let schema = Schema::Record(record);
        self.register(fullname, schema.clone())?;
        Ok(schema)
    }

    fn parse_fields(&mut self, raw: &[Value]) -> Result<Vec<FieldSchema>, SchemaError> {
        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(raw.len());
        for value in raw {
            let obj = value
                .as_object()
                .ok_or_else(|| SchemaError::invalid("record field must be an object"))?;
            let name = obj
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| SchemaError::invalid("record field is missing 'name'"))?;
            if !is_valid_name(name) {
                return Err(SchemaError::InvalidName(name.to_string()));
            }
            if !seen.insert(name.to_string()) {
                return Err(SchemaError::Duplicate {
                    kind: "field",
                    name: name.to_string(),
                });
            }
            let type_value = obj
                .get("type")
                .ok_or_else(|| SchemaError::invalid(format!("field '{}' has no 'type'", name)))?;

            fields.push(FieldSchema {
                name: name.to_string(),
                schema: self.parse(type_value)?,
                aliases: string_list(obj, "aliases"),
                default: obj.get("default").cloned(),
                doc: string_attr(obj, "doc"),
            });
        }
        Ok(fields)
    }

    fn parse_enum(&mut self, obj: &Map<String, Value>) -> Result<Schema, SchemaError> {
        let (name, namespace) = self.declared_name(obj)?;
        let raw = obj
            .get("symbols")
            .and_then(Value::as_array)
            .ok_or_else(|| SchemaError::invalid(format!("enum '{}' has no 'symbols'", name)))?;

        let mut symbols: Vec<String> = Vec::with_capacity(raw.len());
        for symbol in raw {
            let symbol = symbol
                .as_str()
                .ok_or_else(|| SchemaError::invalid("enum symbols must be strings"))?;
            if !is_valid_name(symbol) {
                return Err(SchemaError::InvalidName(symbol.to_string()));
            }
            if symbols.iter().any(|s| s == symbol) {
                return Err(SchemaError::Duplicate {
                    kind: "enum symbol",
                    name: symbol.to_string(),
                });
            }
            symbols.push(symbol.to_string());
        }

        let enum_schema = EnumSchema {
            name,
            namespace,
            doc: string_attr(obj, "doc"),
            aliases: string_list(obj, "aliases"),
            symbols,
        };
        let schema = Schema::Enum(enum_schema.clone());
        self.register(enum_schema.fullname(), schema.clone())?;
        Ok(schema)
    }

    fn parse_fixed(&mut self, obj: &Map<String, Value>) -> Result<Schema, SchemaError> {
        let (name, namespace) = self.declared_name(obj)?;
        let size = obj
            .get("size")
            .and_then(Value::as_u64)
            .ok_or_else(|| SchemaError::invalid(format!("fixed '{}' has no 'size'", name)))?;

        let fixed = FixedSchema {
            name,
            namespace,
            aliases: string_list(obj, "aliases"),
            size: size as usize,
        };
        let schema = Schema::Fixed(fixed.clone());
        self.register(fixed.fullname(), schema.clone())?;
        Ok(schema)
    }

    /// Read `name`/`namespace`, splitting dotted names
    fn declared_name(
        &self,
        obj: &Map<String, Value>,
    ) -> Result<(String, Option<String>), SchemaError> {
        let raw = obj
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| SchemaError::invalid("named type is missing 'name'"))?;

        let (namespace, name) = match raw.rsplit_once('.') {
            Some((ns, simple)) => (Some(ns.to_string()), simple.to_string()),
            None => (
                string_attr(obj, "namespace").or_else(|| self.current_namespace.clone()),
                raw.to_string(),
            ),
        };
        if !is_valid_name(&name) {
            return Err(SchemaError::InvalidName(name));
        }
        let namespace = namespace.filter(|ns| !ns.is_empty());
        Ok((name, namespace))
    }

    fn register(&mut self, fullname: String, schema: Schema) -> Result<(), SchemaError> {
        if self.named_types.contains_key(&fullname) {
            return Err(SchemaError::Duplicate {
                kind: "named type",
                name: fullname,
            });
        }
        self.named_types.insert(fullname, schema);
        Ok(())
    }

    fn qualify(&self, name: &str) -> String {
        match &self.current_namespace {
            Some(ns) if !name.contains('.') => format!("{}.{}", ns, name),
            _ => name.to_string(),
        }
    }
}

fn qualify_declared(name: &str, namespace: Option<&str>) -> String {
    match namespace {
        Some(ns) => format!("{}.{}", ns, name),
        None => name.to_string(),
    }
}

fn physical_matches(kind: &LogicalKind, base: &Schema) -> bool {
    use PrimitiveKind as P;
    match (kind, base) {
        (LogicalKind::Decimal { .. }, Schema::Primitive(P::Bytes) | Schema::Fixed(_)) => true,
        (LogicalKind::Uuid, Schema::Primitive(P::String)) => true,
        (LogicalKind::Uuid, Schema::Fixed(f)) => f.size == 16,
        (LogicalKind::Date | LogicalKind::TimeMillis, Schema::Primitive(P::Int)) => true,
        (
            LogicalKind::TimeMicros
            | LogicalKind::TimestampMillis
            | LogicalKind::TimestampMicros
            | LogicalKind::LocalTimestampMillis
            | LogicalKind::LocalTimestampMicros,
            Schema::Primitive(P::Long),
        ) => true,
        _ => false,
    }
}

fn string_attr(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

fn string_list(obj: &Map<String, Value>, key: &str) -> Vec<String> {
    obj.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_primitives() {
        assert_eq!(parse_schema(r#""null""#).unwrap(), Schema::Null);
        assert_eq!(
            parse_schema(r#""long""#).unwrap(),
            Schema::Primitive(PrimitiveKind::Long)
        );
        assert_eq!(
            parse_schema(r#"{"type": "string"}"#).unwrap(),
            Schema::string()
        );
    }

    #[test]
    fn test_parse_record_with_aliases_and_default() {
        let schema = parse_schema(
            r#"{
                "type": "record",
                "name": "person",
                "namespace": "io.test",
                "fields": [
                    {"name": "id", "type": "string"},
                    {"name": "age", "type": ["null", "int"], "default": null, "aliases": ["years"]}
                ]
            }"#,
        )
        .unwrap();

        let record = schema.as_record().unwrap();
        assert_eq!(record.fullname(), "io.test.person");
        assert_eq!(record.fields.len(), 2);
        assert_eq!(record.fields[1].aliases, vec!["years".to_string()]);
        assert_eq!(record.fields[1].default, Some(Value::Null));
        assert!(record.fields[1].schema.is_nullable());
    }

    #[test]
    fn test_parse_logical_types() {
        let schema = parse_schema(
            r#"{"type": "bytes", "logicalType": "decimal", "precision": 5, "scale": 2}"#,
        )
        .unwrap();
        assert_eq!(
            schema,
            Schema::logical(LogicalKind::Decimal {
                precision: 5,
                scale: 2
            })
        );

        let ts = parse_schema(r#"{"type": "long", "logicalType": "timestamp-micros"}"#).unwrap();
        assert_eq!(ts, Schema::logical(LogicalKind::TimestampMicros));
    }

    #[test]
    fn test_unknown_logical_type_falls_back() {
        let schema = parse_schema(r#"{"type": "string", "logicalType": "ip-address"}"#).unwrap();
        assert_eq!(schema, Schema::string());

        let mismatched = parse_schema(r#"{"type": "string", "logicalType": "date"}"#).unwrap();
        assert_eq!(mismatched, Schema::string());
    }

    #[test]
    fn test_decimal_requires_precision() {
        let result = parse_schema(r#"{"type": "bytes", "logicalType": "decimal"}"#);
        assert!(matches!(result, Err(SchemaError::InvalidSchema(_))));
    }

    #[test]
    fn test_named_reference() {
        let schema = parse_schema(
            r#"{
                "type": "record",
                "name": "pair",
                "fields": [
                    {"name": "left", "type": {"type": "fixed", "name": "md5", "size": 16}},
                    {"name": "right", "type": "md5"}
                ]
            }"#,
        )
        .unwrap();
        let record = schema.as_record().unwrap();
        assert_eq!(record.fields[0].schema, record.fields[1].schema);
    }

    #[test]
    fn test_rejects_duplicate_fields() {
        let result = parse_schema(
            r#"{"type": "record", "name": "r", "fields": [
                {"name": "a", "type": "int"}, {"name": "a", "type": "long"}
            ]}"#,
        );
        assert!(matches!(
            result,
            Err(SchemaError::Duplicate { kind: "field", .. })
        ));
    }

    #[test]
    fn test_rejects_duplicate_union_branches() {
        assert!(parse_schema(r#"["int", "int"]"#).is_err());
        assert!(parse_schema(r#"["int", ["null", "string"]]"#).is_err());
    }

    #[test]
    fn test_rejects_unknown_type() {
        assert!(matches!(
            parse_schema(r#""money""#),
            Err(SchemaError::UnknownType(_))
        ));
    }

    #[test]
    fn test_invalid_names() {
        assert!(is_valid_name("_valid1"));
        assert!(!is_valid_name("1invalid"));
        assert!(!is_valid_name("has space"));
    }
}
