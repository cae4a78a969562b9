//! JSON-lines row sink

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde_json::Value;

use super::ExportError;
use crate::models::{GenericValue, TypedValue};

/// Writes one JSON document per row
pub struct JsonLinesExporter<W: Write> {
    writer: BufWriter<W>,
    rows_written: u64,
}

impl<W: Write> JsonLinesExporter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            rows_written: 0,
        }
    }

    /// Write a schema-conformant row
    pub fn write_typed(&mut self, row: &TypedValue) -> Result<(), ExportError> {
        self.write_value(&row.to_json_value())
    }

    /// Write a schema-less row
    pub fn write_generic(&mut self, row: &GenericValue) -> Result<(), ExportError> {
        self.write_value(&row.to_json_value())
    }

    fn write_value(&mut self, value: &Value) -> Result<(), ExportError> {
        serde_json::to_writer(&mut self.writer, value)
            .map_err(|e| ExportError::SerializationError(e.to_string()))?;
        self.writer
            .write_all(b"\n")
            .map_err(|e| ExportError::IoError(e.to_string()))?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Flush buffered output and return the underlying writer
    pub fn finish(self) -> Result<W, ExportError> {
        self.writer
            .into_inner()
            .map_err(|e| ExportError::IoError(e.error().to_string()))
    }
}

impl JsonLinesExporter<File> {
    /// Create (or truncate) a JSON-lines file
    pub fn create(path: impl AsRef<Path>) -> Result<Self, ExportError> {
        let path = path.as_ref();
        let file = File::create(path)
            .map_err(|e| ExportError::IoError(format!("{}: {}", path.display(), e)))?;
        Ok(Self::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::JsonLinesImporter;
    use indexmap::IndexMap;

    #[test]
    fn test_write_typed_rows() {
        let mut fields = IndexMap::new();
        fields.insert("id".to_string(), TypedValue::Long(1));
        fields.insert(
            "tag".to_string(),
            TypedValue::Union {
                branch: 1,
                value: Box::new(TypedValue::String("x".to_string())),
            },
        );
        let mut exporter = JsonLinesExporter::new(Vec::new());
        exporter.write_typed(&TypedValue::Record(fields)).unwrap();
        exporter
            .write_generic(&GenericValue::text("plain"))
            .unwrap();
        assert_eq!(exporter.rows_written(), 2);

        let output = String::from_utf8(exporter.finish().unwrap()).unwrap();
        assert_eq!(output, "{\"id\":1,\"tag\":\"x\"}\n\"plain\"\n");
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.jsonl");

        let mut exporter = JsonLinesExporter::create(&path).unwrap();
        exporter
            .write_generic(&GenericValue::from_json(serde_json::json!({"a": [1, 2]})))
            .unwrap();
        exporter.finish().unwrap();

        let rows: Vec<GenericValue> = JsonLinesImporter::open(&path)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            rows,
            vec![GenericValue::from_json(serde_json::json!({"a": [1, 2]}))]
        );
    }
}
