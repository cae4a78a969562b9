//! Infer command implementation

use std::io::Write;
use std::path::Path;

use tracing::info;

use super::{open_input, open_output};
use crate::cli::error::CliError;
use crate::import::JsonLinesImporter;
use crate::inference::{InferenceConfig, InferenceStats, SchemaInferrer};

/// Handle the infer command
///
/// Samples JSON-lines rows from `input` and writes the inferred schema to
/// `output` (stdout when absent).
pub fn handle_infer(
    input: &str,
    config: InferenceConfig,
    output: Option<&Path>,
    pretty: bool,
) -> Result<InferenceStats, CliError> {
    let rows = JsonLinesImporter::new(open_input(input)?);

    let mut inferrer = SchemaInferrer::with_config(config);
    inferrer.add_rows(rows)?;
    let stats = inferrer.stats();
    let schema = inferrer.finalize()?;
    info!(
        rows_sampled = stats.rows_sampled,
        paths = stats.paths_discovered,
        "Schema inferred"
    );

    let text = if pretty {
        schema.to_json_pretty()
    } else {
        schema.to_json()
    };
    let mut writer = open_output(output)?;
    let target = output.map(Path::to_path_buf).unwrap_or_else(|| "-".into());
    writeln!(writer, "{}", text)
        .and_then(|_| writer.flush())
        .map_err(|e| CliError::FileWriteError(target, e.to_string()))?;

    Ok(stats)
}
