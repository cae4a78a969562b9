//! Benchmarks for schema inference and row conversion
//!
//! Run with: cargo bench --features parallel

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use schema_convert::convert::{ConversionContext, ConversionOptions, RowConverter};
use schema_convert::inference::{InferenceConfig, SchemaInferrer};
use schema_convert::models::GenericValue;
use serde_json::json;

/// Generate text-valued sample rows, as a CSV or spreadsheet source would
fn generate_sample_rows(count: usize) -> Vec<GenericValue> {
    (0..count)
        .map(|i| {
            GenericValue::from_json(json!({
                "id": format!("user-{}", i),
                "age": (20 + i % 60).to_string(),
                "is_active": if i % 2 == 0 { "true" } else { "no" },
                "balance": format!("{:.2}", 1000.0 + i as f64 * 10.5),
                "created_at": "2024-01-15T10:30:00Z",
                "address": {"city": "Berlin", "zip": format!("{:05}", i)},
                "tags": ["a", "b"]
            }))
        })
        .collect()
}

const SCHEMA: &str = r#"{
    "type": "record",
    "name": "user",
    "fields": [
        {"name": "id", "type": "string"},
        {"name": "age", "type": "int"},
        {"name": "is_active", "type": "boolean"},
        {"name": "balance", "type": {"type": "bytes", "logicalType": "decimal", "precision": 12, "scale": 2}},
        {"name": "created_at", "type": {"type": "long", "logicalType": "timestamp-micros"}},
        {"name": "address", "type": ["null", {
            "type": "record",
            "name": "address",
            "fields": [
                {"name": "city", "type": "string"},
                {"name": "zip", "type": "string"}
            ]
        }]},
        {"name": "tags", "type": {"type": "array", "items": "string"}}
    ]
}"#;

/// Benchmark schema inference with varying row counts
fn bench_schema_inference(c: &mut Criterion) {
    let mut group = c.benchmark_group("schema_inference");

    for count in [10, 100, 500].iter() {
        let rows = generate_sample_rows(*count);
        group.throughput(Throughput::Elements(*count as u64));

        group.bench_with_input(BenchmarkId::new("infer_schema", count), &rows, |b, rows| {
            b.iter(|| {
                let config = InferenceConfig::builder().sample_limit(rows.len()).build();
                let mut inferrer = SchemaInferrer::with_config(config);
                for row in rows {
                    let _ = inferrer.add_row(row);
                }
                black_box(inferrer.finalize())
            });
        });
    }

    group.finish();
}

/// Benchmark streaming and batch conversion with varying row counts
fn bench_row_conversion(c: &mut Criterion) {
    let mut group = c.benchmark_group("row_conversion");

    let schema = match schema_convert::schema::parse_schema(SCHEMA) {
        Ok(schema) => schema,
        Err(err) => panic!("benchmark schema: {err}"),
    };
    let context = match ConversionContext::new(ConversionOptions::default()) {
        Ok(context) => context,
        Err(err) => panic!("conversion context: {err}"),
    };
    let converter = RowConverter::new(schema, context);

    for count in [100, 1000].iter() {
        let rows = generate_sample_rows(*count);
        group.throughput(Throughput::Elements(*count as u64));

        group.bench_with_input(BenchmarkId::new("stream", count), &rows, |b, rows| {
            b.iter(|| {
                black_box(
                    converter
                        .convert_rows(rows.iter().cloned())
                        .filter(Result::is_ok)
                        .count(),
                )
            });
        });

        group.bench_with_input(BenchmarkId::new("batch", count), &rows, |b, rows| {
            b.iter(|| black_box(converter.convert_batch(rows).is_ok()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_schema_inference, bench_row_conversion);
criterion_main!(benches);
