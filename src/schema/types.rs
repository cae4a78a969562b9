//! Schema tree types
//!
//! A schema is an immutable tree of typed nodes. It is built once per run
//! (parsed from schema text or produced by inference) and shared by reference
//! between all conversion calls of that run.

use std::collections::HashSet;
use std::fmt;

use serde_json::{Map, Value, json};

/// Physical primitive kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
}

impl PrimitiveKind {
    /// Get the schema-text name of this kind
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::Bytes => "bytes",
            PrimitiveKind::String => "string",
        }
    }

    /// Look up a kind by its schema-text name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "boolean" => Some(PrimitiveKind::Boolean),
            "int" => Some(PrimitiveKind::Int),
            "long" => Some(PrimitiveKind::Long),
            "float" => Some(PrimitiveKind::Float),
            "double" => Some(PrimitiveKind::Double),
            "bytes" => Some(PrimitiveKind::Bytes),
            "string" => Some(PrimitiveKind::String),
            _ => None,
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Logical kinds with their parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalKind {
    /// Arbitrary-precision decimal
    Decimal { precision: u32, scale: u32 },
    Uuid,
    /// Calendar date (days since epoch)
    Date,
    TimeMillis,
    TimeMicros,
    TimestampMillis,
    TimestampMicros,
    /// Wall-clock timestamp with no zone attached
    LocalTimestampMillis,
    LocalTimestampMicros,
}

impl LogicalKind {
    /// Get the `logicalType` name used in schema text
    pub fn name(&self) -> &'static str {
        match self {
            LogicalKind::Decimal { .. } => "decimal",
            LogicalKind::Uuid => "uuid",
            LogicalKind::Date => "date",
            LogicalKind::TimeMillis => "time-millis",
            LogicalKind::TimeMicros => "time-micros",
            LogicalKind::TimestampMillis => "timestamp-millis",
            LogicalKind::TimestampMicros => "timestamp-micros",
            LogicalKind::LocalTimestampMillis => "local-timestamp-millis",
            LogicalKind::LocalTimestampMicros => "local-timestamp-micros",
        }
    }

    /// The physical type this logical kind is normally carried by
    pub fn default_physical(&self) -> Schema {
        match self {
            LogicalKind::Decimal { .. } => Schema::Primitive(PrimitiveKind::Bytes),
            LogicalKind::Uuid => Schema::Primitive(PrimitiveKind::String),
            LogicalKind::Date | LogicalKind::TimeMillis => Schema::Primitive(PrimitiveKind::Int),
            LogicalKind::TimeMicros
            | LogicalKind::TimestampMillis
            | LogicalKind::TimestampMicros
            | LogicalKind::LocalTimestampMillis
            | LogicalKind::LocalTimestampMicros => Schema::Primitive(PrimitiveKind::Long),
        }
    }
}

/// A logical annotation over a physical schema
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalType {
    pub kind: LogicalKind,
    pub physical: Box<Schema>,
}

impl LogicalType {
    /// Create a logical type over an explicit physical schema
    pub fn new(kind: LogicalKind, physical: Schema) -> Self {
        Self {
            kind,
            physical: Box::new(physical),
        }
    }

    /// Create a logical type over its usual physical schema
    pub fn standard(kind: LogicalKind) -> Self {
        Self::new(kind, kind.default_physical())
    }

    /// Serialize as the physical type object plus `logicalType` attributes
    pub fn to_json_value(&self) -> Value {
        self.json_with(&mut HashSet::new())
    }

    fn json_with(&self, emitted: &mut HashSet<String>) -> Value {
        let mut obj = match self.physical.json_with(emitted) {
            Value::Object(m) => m,
            other => {
                let mut m = Map::new();
                m.insert("type".to_string(), other);
                m
            }
        };
        obj.insert("logicalType".to_string(), json!(self.kind.name()));
        if let LogicalKind::Decimal { precision, scale } = self.kind {
            obj.insert("precision".to_string(), json!(precision));
            obj.insert("scale".to_string(), json!(scale));
        }
        Value::Object(obj)
    }
}

/// A record field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    pub name: String,
    pub schema: Schema,
    /// Alternative input names, tried in order when `name` is absent
    pub aliases: Vec<String>,
    pub default: Option<Value>,
    pub doc: Option<String>,
}

impl FieldSchema {
    /// Create a new field
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            aliases: Vec::new(),
            default: None,
            doc: None,
        }
    }

    /// Set the aliases
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    /// Set the default value
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Serialize the field to a JSON value
    pub fn to_json_value(&self) -> Value {
        self.json_with(&mut HashSet::new())
    }

    fn json_with(&self, emitted: &mut HashSet<String>) -> Value {
        let mut obj = Map::new();
        obj.insert("name".to_string(), json!(&self.name));
        obj.insert("type".to_string(), self.schema.json_with(emitted));
        if let Some(doc) = &self.doc {
            obj.insert("doc".to_string(), json!(doc));
        }
        if let Some(default) = &self.default {
            obj.insert("default".to_string(), default.clone());
        }
        if !self.aliases.is_empty() {
            obj.insert("aliases".to_string(), json!(&self.aliases));
        }
        Value::Object(obj)
    }
}

/// A named record with ordered fields
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    pub name: String,
    pub namespace: Option<String>,
    pub doc: Option<String>,
    pub aliases: Vec<String>,
    pub fields: Vec<FieldSchema>,
}

impl RecordSchema {
    /// Create a new record
    pub fn new(name: impl Into<String>, fields: Vec<FieldSchema>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            doc: None,
            aliases: Vec::new(),
            fields,
        }
    }

    /// Set the namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Get the fully qualified name
    pub fn fullname(&self) -> String {
        qualify(&self.name, self.namespace.as_deref())
    }

    /// Find a field by its declared name
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Declared field names in order
    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    /// Serialize the record to a JSON value
    pub fn to_json_value(&self) -> Value {
        self.json_with(&mut HashSet::new())
    }

    fn json_with(&self, emitted: &mut HashSet<String>) -> Value {
        emitted.insert(self.fullname());
        let mut obj = Map::new();
        obj.insert("type".to_string(), json!("record"));
        obj.insert("name".to_string(), json!(&self.name));
        if let Some(ns) = &self.namespace {
            obj.insert("namespace".to_string(), json!(ns));
        }
        if let Some(doc) = &self.doc {
            obj.insert("doc".to_string(), json!(doc));
        }
        if !self.aliases.is_empty() {
            obj.insert("aliases".to_string(), json!(&self.aliases));
        }
        let fields: Vec<Value> = self.fields.iter().map(|f| f.json_with(emitted)).collect();
        obj.insert("fields".to_string(), Value::Array(fields));
        Value::Object(obj)
    }
}

/// An enumeration of symbols
#[derive(Debug, Clone, PartialEq)]
pub struct EnumSchema {
    pub name: String,
    pub namespace: Option<String>,
    pub doc: Option<String>,
    pub aliases: Vec<String>,
    pub symbols: Vec<String>,
}

impl EnumSchema {
    /// Create a new enum
    pub fn new(name: impl Into<String>, symbols: Vec<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            doc: None,
            aliases: Vec::new(),
            symbols,
        }
    }

    /// Get the fully qualified name
    pub fn fullname(&self) -> String {
        qualify(&self.name, self.namespace.as_deref())
    }

    /// Get the index of a symbol
    pub fn symbol_index(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }

    /// Serialize the enum to a JSON value
    pub fn to_json_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".to_string(), json!("enum"));
        obj.insert("name".to_string(), json!(&self.name));
        if let Some(ns) = &self.namespace {
            obj.insert("namespace".to_string(), json!(ns));
        }
        if let Some(doc) = &self.doc {
            obj.insert("doc".to_string(), json!(doc));
        }
        if !self.aliases.is_empty() {
            obj.insert("aliases".to_string(), json!(&self.aliases));
        }
        obj.insert("symbols".to_string(), json!(&self.symbols));
        Value::Object(obj)
    }
}

/// A fixed-size byte block
#[derive(Debug, Clone, PartialEq)]
pub struct FixedSchema {
    pub name: String,
    pub namespace: Option<String>,
    pub aliases: Vec<String>,
    pub size: usize,
}

impl FixedSchema {
    /// Create a new fixed type
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            aliases: Vec::new(),
            size,
        }
    }

    /// Get the fully qualified name
    pub fn fullname(&self) -> String {
        qualify(&self.name, self.namespace.as_deref())
    }

    /// Serialize the fixed type to a JSON value
    pub fn to_json_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".to_string(), json!("fixed"));
        obj.insert("name".to_string(), json!(&self.name));
        if let Some(ns) = &self.namespace {
            obj.insert("namespace".to_string(), json!(ns));
        }
        if !self.aliases.is_empty() {
            obj.insert("aliases".to_string(), json!(&self.aliases));
        }
        obj.insert("size".to_string(), json!(self.size));
        Value::Object(obj)
    }
}

/// A schema node
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    Null,
    Primitive(PrimitiveKind),
    Logical(LogicalType),
    Record(RecordSchema),
    Array(Box<Schema>),
    Map(Box<Schema>),
    /// Ordered, deduplicated alternatives; never directly nested
    Union(Vec<Schema>),
    Enum(EnumSchema),
    Fixed(FixedSchema),
}

impl Schema {
    pub fn string() -> Self {
        Schema::Primitive(PrimitiveKind::String)
    }

    pub fn logical(kind: LogicalKind) -> Self {
        Schema::Logical(LogicalType::standard(kind))
    }

    pub fn array(items: Schema) -> Self {
        Schema::Array(Box::new(items))
    }

    pub fn map(values: Schema) -> Self {
        Schema::Map(Box::new(values))
    }

    /// Build a union, flattening nested unions and dropping structural duplicates.
    ///
    /// A single surviving alternative is returned unwrapped.
    pub fn union(alternatives: impl IntoIterator<Item = Schema>) -> Self {
        let mut flat: Vec<Schema> = Vec::new();
        for alternative in alternatives {
            match alternative {
                Schema::Union(inner) => {
                    for s in inner {
                        if !flat.contains(&s) {
                            flat.push(s);
                        }
                    }
                }
                s => {
                    if !flat.contains(&s) {
                        flat.push(s);
                    }
                }
            }
        }
        if flat.len() == 1 {
            flat.pop().unwrap_or(Schema::Null)
        } else {
            Schema::Union(flat)
        }
    }

    /// Wrap in a `[null, schema]` union
    pub fn nullable(schema: Schema) -> Self {
        Schema::union([Schema::Null, schema])
    }

    /// Check if this schema accepts null (is null or a union containing null)
    pub fn is_nullable(&self) -> bool {
        match self {
            Schema::Null => true,
            Schema::Union(alternatives) => alternatives.iter().any(|a| matches!(a, Schema::Null)),
            _ => false,
        }
    }

    /// Short kind name used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Schema::Null => "null",
            Schema::Primitive(kind) => kind.name(),
            Schema::Logical(lt) => lt.kind.name(),
            Schema::Record(_) => "record",
            Schema::Array(_) => "array",
            Schema::Map(_) => "map",
            Schema::Union(_) => "union",
            Schema::Enum(_) => "enum",
            Schema::Fixed(_) => "fixed",
        }
    }

    /// The record schema, if this is a record
    pub fn as_record(&self) -> Option<&RecordSchema> {
        match self {
            Schema::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Serialize the schema to canonical schema text
    pub fn to_json(&self) -> String {
        self.to_json_value().to_string()
    }

    /// Serialize the schema to pretty-printed schema text
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.to_json_value()).unwrap_or_else(|_| self.to_json())
    }

    /// Serialize the schema to a JSON value
    ///
    /// A named type (record, enum, fixed) is written out in full the first
    /// time it appears and as a reference to its full name afterwards.
    pub fn to_json_value(&self) -> Value {
        self.json_with(&mut HashSet::new())
    }

    fn json_with(&self, emitted: &mut HashSet<String>) -> Value {
        if let Some(fullname) = self.fullname() {
            if emitted.contains(&fullname) {
                return json!(fullname);
            }
        }
        match self {
            Schema::Null => json!("null"),
            Schema::Primitive(kind) => json!(kind.name()),
            Schema::Logical(lt) => lt.json_with(emitted),
            Schema::Record(r) => r.json_with(emitted),
            Schema::Array(items) => json!({ "type": "array", "items": items.json_with(emitted) }),
            Schema::Map(values) => json!({ "type": "map", "values": values.json_with(emitted) }),
            Schema::Union(alternatives) => {
                Value::Array(alternatives.iter().map(|a| a.json_with(emitted)).collect())
            }
            Schema::Enum(e) => {
                emitted.insert(e.fullname());
                e.to_json_value()
            }
            Schema::Fixed(f) => {
                emitted.insert(f.fullname());
                f.to_json_value()
            }
        }
    }

    /// Full name of a record, enum or fixed schema
    pub fn fullname(&self) -> Option<String> {
        match self {
            Schema::Record(r) => Some(r.fullname()),
            Schema::Enum(e) => Some(e.fullname()),
            Schema::Fixed(f) => Some(f.fullname()),
            _ => None,
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

fn qualify(name: &str, namespace: Option<&str>) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() && !name.contains('.') => format!("{}.{}", ns, name),
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_flattens_and_dedups() {
        let inner = Schema::union([Schema::Null, Schema::string()]);
        let merged = Schema::union([
            inner,
            Schema::Primitive(PrimitiveKind::Long),
            Schema::string(),
        ]);
        assert_eq!(
            merged,
            Schema::Union(vec![
                Schema::Null,
                Schema::string(),
                Schema::Primitive(PrimitiveKind::Long)
            ])
        );
    }

    #[test]
    fn test_union_of_one_is_unwrapped() {
        assert_eq!(
            Schema::union([Schema::string(), Schema::string()]),
            Schema::string()
        );
    }

    #[test]
    fn test_nullable() {
        let schema = Schema::nullable(Schema::string());
        assert!(schema.is_nullable());
        assert!(!Schema::string().is_nullable());
        // Already nullable stays as-is
        assert_eq!(Schema::nullable(schema.clone()), schema);
    }

    #[test]
    fn test_decimal_to_json() {
        let schema = Schema::logical(LogicalKind::Decimal {
            precision: 10,
            scale: 2,
        });
        let value = schema.to_json_value();
        assert_eq!(value["type"], "bytes");
        assert_eq!(value["logicalType"], "decimal");
        assert_eq!(value["precision"], 10);
        assert_eq!(value["scale"], 2);
    }

    #[test]
    fn test_record_fullname() {
        let record = RecordSchema::new("address", vec![]).with_namespace("root");
        assert_eq!(record.fullname(), "root.address");
    }
}
