//! Command implementations

pub mod convert;
pub mod infer;

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::cli::error::CliError;

pub use convert::{handle_convert, load_options};
pub use infer::handle_infer;

/// Open an input file, or stdin for `-`
pub(crate) fn open_input(input: &str) -> Result<Box<dyn Read>, CliError> {
    if input == "-" {
        return Ok(Box::new(std::io::stdin()));
    }
    let path = PathBuf::from(input);
    let file = File::open(&path).map_err(|e| CliError::FileReadError(path, e.to_string()))?;
    Ok(Box::new(file))
}

/// Open an output file, or stdout when none is given
pub(crate) fn open_output(output: Option<&Path>) -> Result<Box<dyn Write>, CliError> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| CliError::FileWriteError(path.to_path_buf(), e.to_string()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(std::io::stdout())),
    }
}
