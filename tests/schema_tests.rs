//! Schema module tests

use schema_convert::schema::{LogicalKind, PrimitiveKind, Schema, SchemaError, parse_schema};

mod parse_tests {
    use super::*;

    #[test]
    fn test_parse_order_schema() {
        let text = r#"{
            "type": "record",
            "name": "order",
            "namespace": "shop",
            "fields": [
                {"name": "id", "type": {"type": "string", "logicalType": "uuid"}},
                {"name": "placed", "type": {"type": "long", "logicalType": "timestamp-millis"}},
                {"name": "total", "type": {"type": "bytes", "logicalType": "decimal", "precision": 12, "scale": 2}},
                {"name": "lines", "type": {"type": "array", "items": {
                    "type": "record",
                    "name": "line",
                    "fields": [
                        {"name": "sku", "type": "string"},
                        {"name": "quantity", "type": "int", "default": 1}
                    ]
                }}},
                {"name": "note", "type": ["null", "string"], "default": null}
            ]
        }"#;
        let schema = parse_schema(text).unwrap();
        let order = schema.as_record().unwrap();
        assert_eq!(order.fullname(), "shop.order");
        assert_eq!(
            order.field_names(),
            vec!["id", "placed", "total", "lines", "note"]
        );

        match &order.field("total").unwrap().schema {
            Schema::Logical(lt) => {
                assert_eq!(lt.kind, LogicalKind::Decimal { precision: 12, scale: 2 })
            }
            other => panic!("Expected decimal, got {:?}", other),
        }
        match &order.field("lines").unwrap().schema {
            Schema::Array(items) => {
                let line = items.as_record().unwrap();
                assert_eq!(line.namespace.as_deref(), Some("shop"));
            }
            other => panic!("Expected array, got {:?}", other),
        }
        assert!(order.field("note").unwrap().schema.is_nullable());
    }

    #[test]
    fn test_schema_text_round_trips() {
        let schema = Schema::nullable(Schema::array(Schema::map(Schema::Primitive(
            PrimitiveKind::Double,
        ))));
        assert_eq!(parse_schema(&schema.to_json()).unwrap(), schema);
        assert_eq!(parse_schema(&schema.to_json_pretty()).unwrap(), schema);
    }

    #[test]
    fn test_reused_named_types_round_trip() {
        let text = r#"{
            "type": "record",
            "name": "pair",
            "namespace": "hash",
            "fields": [
                {"name": "left", "type": {"type": "fixed", "name": "md5", "size": 16}},
                {"name": "right", "type": "md5"},
                {"name": "origin", "type": {
                    "type": "record",
                    "name": "point",
                    "fields": [{"name": "x", "type": "int"}]
                }},
                {"name": "target", "type": ["null", "point"]}
            ]
        }"#;
        let schema = parse_schema(text).unwrap();
        let rendered = schema.to_json();
        assert_eq!(parse_schema(&rendered).unwrap(), schema);
        assert!(rendered.contains("\"hash.md5\""));
        assert_eq!(rendered.matches("\"size\"").count(), 1);
        assert_eq!(rendered.matches("\"fields\"").count(), 2);
    }

    #[test]
    fn test_recursive_record_is_rejected() {
        let text = r#"{
            "type": "record",
            "name": "node",
            "fields": [{"name": "next", "type": ["null", "node"]}]
        }"#;
        match parse_schema(text) {
            Err(SchemaError::InvalidSchema(message)) => assert!(message.contains("recursive")),
            other => panic!("Expected invalid schema, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_schema_is_a_configuration_error() {
        match parse_schema("{\"type\": \"record\"") {
            Err(SchemaError::Json(_)) => {}
            other => panic!("Expected JSON error, got {:?}", other),
        }
        match parse_schema("\"not_a_type\"") {
            Err(SchemaError::UnknownType(name)) => assert_eq!(name, "not_a_type"),
            other => panic!("Expected UnknownType, got {:?}", other),
        }
    }
}
