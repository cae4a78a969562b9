//! JSON-lines row source

use std::fs::File;
use std::io::{BufRead, BufReader, Lines, Read};
use std::path::Path;

use serde_json::Value;

use super::ImportError;
use crate::models::GenericValue;

/// Reads one generic row per line of JSON
///
/// Blank lines are skipped. The reader is lazy and forward-only: each call to
/// `next` reads and parses exactly one line.
pub struct JsonLinesImporter<R> {
    lines: Lines<BufReader<R>>,
    line_number: usize,
}

impl<R: Read> JsonLinesImporter<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
            line_number: 0,
        }
    }

    /// Number of lines consumed so far
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

impl JsonLinesImporter<File> {
    /// Open a JSON-lines file
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ImportError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| ImportError::IoError(format!("{}: {}", path.display(), e)))?;
        Ok(Self::new(file))
    }
}

impl<R: Read> Iterator for JsonLinesImporter<R> {
    type Item = Result<GenericValue, ImportError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(ImportError::IoError(e.to_string()))),
            };
            self.line_number += 1;
            if line.trim().is_empty() {
                continue;
            }
            return Some(
                serde_json::from_str::<Value>(&line)
                    .map(GenericValue::from_json)
                    .map_err(|e| ImportError::ParseError {
                        line: self.line_number,
                        message: e.to_string(),
                    }),
            );
        }
    }
}
