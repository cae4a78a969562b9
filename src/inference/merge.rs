//! Schema unification
//!
//! [`merge_types`] combines two observed schemas into one that accepts both:
//! - unions are flattened; record and array alternatives within them are
//!   merged into a single record or array
//! - records merge field-by-field, in first-seen order
//! - arrays and maps merge their element types
//! - decimals widen to the larger precision and scale
//! - any other pair of differing kinds becomes a two-element union

use crate::schema::{FieldSchema, LogicalKind, LogicalType, RecordSchema, Schema};

/// Merge two schemas into one that accepts values of either
pub fn merge_types(a: &Schema, b: &Schema) -> Schema {
    if a == b {
        return a.clone();
    }
    match (a, b) {
        (Schema::Union(_), _) | (_, Schema::Union(_)) => merge_alternatives(a, b),
        (Schema::Record(ra), Schema::Record(rb)) => Schema::Record(merge_records(ra, rb)),
        (Schema::Array(ia), Schema::Array(ib)) => Schema::array(merge_types(ia, ib)),
        (Schema::Map(va), Schema::Map(vb)) => Schema::map(merge_types(va, vb)),
        (Schema::Logical(la), Schema::Logical(lb)) => match merge_decimals(la, lb) {
            Some(widened) => Schema::Logical(widened),
            None => Schema::union([a.clone(), b.clone()]),
        },
        _ => Schema::union([a.clone(), b.clone()]),
    }
}

/// Merge two records; fields of `a` come first, then fields only `b` has
pub fn merge_records(a: &RecordSchema, b: &RecordSchema) -> RecordSchema {
    let mut fields: Vec<FieldSchema> = a
        .fields
        .iter()
        .map(|fa| match b.field(&fa.name) {
            Some(fb) => merge_fields(fa, fb),
            None => fa.clone(),
        })
        .collect();
    fields.extend(
        b.fields
            .iter()
            .filter(|fb| a.field(&fb.name).is_none())
            .cloned(),
    );

    RecordSchema {
        name: a.name.clone(),
        namespace: a.namespace.clone(),
        doc: a.doc.clone().or_else(|| b.doc.clone()),
        aliases: merge_aliases(&a.aliases, &b.aliases),
        fields,
    }
}

fn merge_fields(a: &FieldSchema, b: &FieldSchema) -> FieldSchema {
    FieldSchema {
        name: a.name.clone(),
        schema: merge_types(&a.schema, &b.schema),
        aliases: merge_aliases(&a.aliases, &b.aliases),
        default: a.default.clone().or_else(|| b.default.clone()),
        doc: a.doc.clone().or_else(|| b.doc.clone()),
    }
}

fn merge_aliases(a: &[String], b: &[String]) -> Vec<String> {
    let mut aliases = a.to_vec();
    for alias in b {
        if !aliases.contains(alias) {
            aliases.push(alias.clone());
        }
    }
    aliases
}

/// Flatten both sides into one ordered alternative list; records, arrays and
/// maps each collapse into a single merged alternative at the position of the
/// first one seen.
fn merge_alternatives(a: &Schema, b: &Schema) -> Schema {
    let mut merged: Vec<Schema> = Vec::new();
    for alternative in alternatives(a).chain(alternatives(b)) {
        let existing = merged
            .iter()
            .position(|m| same_composite(m, alternative) || same_decimal(m, alternative));
        match existing {
            Some(i) => {
                let combined = merge_types(&merged[i], alternative);
                merged[i] = combined;
            }
            None if merged.contains(alternative) => {}
            None => merged.push(alternative.clone()),
        }
    }
    Schema::union(merged)
}

fn alternatives(schema: &Schema) -> impl Iterator<Item = &Schema> {
    match schema {
        Schema::Union(alternatives) => alternatives.iter(),
        other => std::slice::from_ref(other).iter(),
    }
}

fn same_composite(a: &Schema, b: &Schema) -> bool {
    matches!(
        (a, b),
        (Schema::Record(_), Schema::Record(_))
            | (Schema::Array(_), Schema::Array(_))
            | (Schema::Map(_), Schema::Map(_))
    )
}

fn same_decimal(a: &Schema, b: &Schema) -> bool {
    match (a, b) {
        (Schema::Logical(la), Schema::Logical(lb)) => merge_decimals(la, lb).is_some(),
        _ => false,
    }
}

fn merge_decimals(a: &LogicalType, b: &LogicalType) -> Option<LogicalType> {
    match (a.kind, b.kind) {
        (
            LogicalKind::Decimal {
                precision: pa,
                scale: sa,
            },
            LogicalKind::Decimal {
                precision: pb,
                scale: sb,
            },
        ) if a.physical == b.physical => Some(LogicalType::new(
            LogicalKind::Decimal {
                precision: pa.max(pb),
                scale: sa.max(sb),
            },
            (*a.physical).clone(),
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PrimitiveKind;

    fn long() -> Schema {
        Schema::Primitive(PrimitiveKind::Long)
    }

    fn record(name: &str, fields: Vec<(&str, Schema)>) -> Schema {
        Schema::Record(RecordSchema::new(
            name,
            fields
                .into_iter()
                .map(|(n, s)| FieldSchema::new(n, s))
                .collect(),
        ))
    }

    #[test]
    fn test_merge_is_idempotent() {
        let schema = record(
            "root",
            vec![
                ("a", Schema::nullable(long())),
                ("b", Schema::nullable(Schema::array(Schema::string()))),
            ],
        );
        assert_eq!(merge_types(&schema, &schema), schema);
    }

    #[test]
    fn test_differing_primitives_become_union() {
        assert_eq!(
            merge_types(&Schema::string(), &long()),
            Schema::Union(vec![Schema::string(), long()])
        );
    }

    #[test]
    fn test_union_growth_keeps_order_and_dedups() {
        let a = Schema::nullable(Schema::string());
        let b = Schema::nullable(long());
        assert_eq!(
            merge_types(&a, &b),
            Schema::Union(vec![Schema::Null, Schema::string(), long()])
        );
        // Merging again adds nothing
        let merged = merge_types(&a, &b);
        assert_eq!(merge_types(&merged, &b), merged);
    }

    #[test]
    fn test_records_merge_fields_in_first_seen_order() {
        let a = record("r", vec![("x", long()), ("y", long())]);
        let b = record("r", vec![("z", Schema::string()), ("x", Schema::string())]);
        let merged = merge_types(&a, &b);
        let merged = merged.as_record().unwrap();
        assert_eq!(merged.field_names(), vec!["x", "y", "z"]);
        assert_eq!(
            merged.field("x").unwrap().schema,
            Schema::Union(vec![long(), Schema::string()])
        );
        assert_eq!(merged.field("y").unwrap().schema, long());
        assert_eq!(merged.field("z").unwrap().schema, Schema::string());
    }

    #[test]
    fn test_records_inside_unions_collapse() {
        let a = Schema::nullable(record("r", vec![("x", long())]));
        let b = Schema::union([Schema::string(), record("r", vec![("y", long())])]);
        match merge_types(&a, &b) {
            Schema::Union(alternatives) => {
                assert_eq!(alternatives.len(), 3);
                assert_eq!(alternatives[0], Schema::Null);
                let merged = alternatives[1].as_record().unwrap();
                assert_eq!(merged.field_names(), vec!["x", "y"]);
                assert_eq!(alternatives[2], Schema::string());
            }
            other => panic!("Expected union, got {:?}", other),
        }
    }

    #[test]
    fn test_arrays_merge_element_types() {
        let a = Schema::nullable(Schema::array(long()));
        let b = Schema::nullable(Schema::array(Schema::string()));
        assert_eq!(
            merge_types(&a, &b),
            Schema::nullable(Schema::array(Schema::Union(vec![long(), Schema::string()])))
        );
    }

    #[test]
    fn test_decimals_widen() {
        let a = Schema::logical(LogicalKind::Decimal {
            precision: 28,
            scale: 2,
        });
        let b = Schema::logical(LogicalKind::Decimal {
            precision: 28,
            scale: 4,
        });
        assert_eq!(merge_types(&a, &b), b);
        assert_eq!(
            merge_types(&Schema::nullable(a), &Schema::nullable(b.clone())),
            Schema::nullable(b)
        );
    }
}
