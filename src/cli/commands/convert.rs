//! Convert command implementation

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use super::{open_input, open_output};
use crate::cli::error::CliError;
use crate::convert::{ConversionContext, ConversionOptions, ConversionStats, RowConverter, StreamError};
use crate::export::JsonLinesExporter;
use crate::import::JsonLinesImporter;
use crate::schema::parse_schema;

/// Load conversion options from a TOML, YAML or JSON file
///
/// The format is chosen by file extension. Missing keys take their defaults.
pub fn load_options(path: &Path) -> Result<ConversionOptions, CliError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| CliError::FileReadError(path.to_path_buf(), e.to_string()))?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let config_error = |message: String| CliError::ConfigError(path.to_path_buf(), message);
    match extension.as_str() {
        "toml" => toml::from_str(&content).map_err(|e| config_error(e.to_string())),
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| config_error(e.to_string())),
        "json" => serde_json::from_str(&content).map_err(|e| config_error(e.to_string())),
        other => Err(config_error(format!(
            "unsupported config format '{}', expected toml, yaml or json",
            other
        ))),
    }
}

/// Handle the convert command
///
/// Reads the schema file, converts every JSON-lines row from `input` and
/// writes the typed rows to `output` (stdout when absent).
pub fn handle_convert(
    schema_path: &Path,
    input: &str,
    output: Option<&Path>,
    options: ConversionOptions,
) -> Result<ConversionStats, CliError> {
    let schema_text = std::fs::read_to_string(schema_path)
        .map_err(|e| CliError::FileReadError(schema_path.to_path_buf(), e.to_string()))?;
    let schema = parse_schema(&schema_text)?;
    let context = ConversionContext::new(options)?;
    let converter = RowConverter::new(schema, context);

    let rows = JsonLinesImporter::new(open_input(input)?);
    let mut exporter = JsonLinesExporter::new(open_output(output)?);

    let mut converted = converter.convert_stream(rows);
    for result in converted.by_ref() {
        match result {
            Ok(row) => exporter.write_typed(&row)?,
            Err(StreamError::Source { source, .. }) => return Err(source.into()),
            Err(StreamError::Conversion { index, source }) => {
                return Err(CliError::ConversionError(format!("row {}: {}", index, source)));
            }
        }
    }
    let stats = converted.stats();
    exporter.finish()?.flush().map_err(|e| {
        let target = output.map_or_else(|| PathBuf::from("-"), Path::to_path_buf);
        CliError::FileWriteError(target, e.to_string())
    })?;

    info!(
        rows_read = stats.rows_read,
        rows_converted = stats.rows_converted,
        rows_dropped = stats.rows_dropped,
        "Conversion finished"
    );
    Ok(stats)
}
