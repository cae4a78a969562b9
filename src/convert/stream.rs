//! Row streams and batches
//!
//! [`ConvertedRows`] adapts a fallible row source into a lazy stream of typed
//! rows. Under `fail` the stream ends after the first error; under `warn`
//! and `skip` rows that cannot be converted at all are dropped and counted.

use std::convert::Infallible;
use std::error::Error as StdError;

use thiserror::Error;
use tracing::{debug, warn};

use super::context::BadRowPolicy;
use super::error::ConversionError;
use super::structural::RowConverter;
use crate::models::{GenericValue, TypedValue};

/// Error yielded by a converted row stream
#[derive(Error, Debug)]
pub enum StreamError<E>
where
    E: StdError + 'static,
{
    /// The upstream row source failed
    #[error("Failed to read row {index}: {source}")]
    Source {
        index: u64,
        #[source]
        source: E,
    },

    /// A row could not be converted under the `fail` policy
    #[error("Row {index}: {source}")]
    Conversion {
        index: u64,
        #[source]
        source: ConversionError,
    },
}

/// Row counters for a conversion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionStats {
    /// Rows pulled from the source
    pub rows_read: u64,
    /// Rows converted and emitted
    pub rows_converted: u64,
    /// Rows dropped under the `warn` or `skip` policy
    pub rows_dropped: u64,
    /// Rows that ended the run under the `fail` policy
    pub rows_failed: u64,
}

/// Apply the bad-row policy to a failed row, returning the error if it must propagate
fn settle(
    policy: BadRowPolicy,
    index: u64,
    error: ConversionError,
    stats: &mut ConversionStats,
) -> Option<ConversionError> {
    match policy {
        BadRowPolicy::Fail => {
            stats.rows_failed += 1;
            Some(error)
        }
        BadRowPolicy::Warn => {
            warn!(row = index, error = %error, "Dropping row that could not be converted");
            stats.rows_dropped += 1;
            None
        }
        BadRowPolicy::Skip => {
            stats.rows_dropped += 1;
            None
        }
    }
}

/// Lazy stream of converted rows
pub struct ConvertedRows<'c, I> {
    converter: &'c RowConverter,
    rows: I,
    stats: ConversionStats,
    finished: bool,
}

impl<I> ConvertedRows<'_, I> {
    /// Counters so far
    pub fn stats(&self) -> ConversionStats {
        self.stats
    }
}

impl<I, E> Iterator for ConvertedRows<'_, I>
where
    I: Iterator<Item = Result<GenericValue, E>>,
    E: StdError + 'static,
{
    type Item = Result<TypedValue, StreamError<E>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            let next = match self.rows.next() {
                Some(next) => next,
                None => {
                    self.finished = true;
                    debug!(
                        rows_read = self.stats.rows_read,
                        rows_converted = self.stats.rows_converted,
                        rows_dropped = self.stats.rows_dropped,
                        "Row stream exhausted"
                    );
                    return None;
                }
            };
            let index = self.stats.rows_read;
            self.stats.rows_read += 1;

            let row = match next {
                Ok(row) => row,
                Err(source) => {
                    self.finished = true;
                    return Some(Err(StreamError::Source { index, source }));
                }
            };

            match self.converter.convert_row(&row) {
                Ok(typed) => {
                    self.stats.rows_converted += 1;
                    return Some(Ok(typed));
                }
                Err(error) => {
                    let policy = self.converter.context().on_bad_row();
                    if let Some(source) = settle(policy, index, error, &mut self.stats) {
                        self.finished = true;
                        return Some(Err(StreamError::Conversion { index, source }));
                    }
                }
            }
        }
    }
}

impl RowConverter {
    /// Convert a fallible row source lazily
    pub fn convert_stream<I, E>(&self, rows: I) -> ConvertedRows<'_, I::IntoIter>
    where
        I: IntoIterator<Item = Result<GenericValue, E>>,
        E: StdError + 'static,
    {
        ConvertedRows {
            converter: self,
            rows: rows.into_iter(),
            stats: ConversionStats::default(),
            finished: false,
        }
    }

    /// Convert an infallible row source lazily
    #[allow(clippy::type_complexity)]
    pub fn convert_rows<I>(
        &self,
        rows: I,
    ) -> ConvertedRows<
        '_,
        std::iter::Map<I::IntoIter, fn(GenericValue) -> Result<GenericValue, Infallible>>,
    >
    where
        I: IntoIterator<Item = GenericValue>,
    {
        let ok: fn(GenericValue) -> Result<GenericValue, Infallible> = Ok;
        self.convert_stream(rows.into_iter().map(ok))
    }

    /// Convert a batch of rows, preserving input order
    ///
    /// With the `parallel` feature rows are converted on the rayon pool.
    /// Under `fail` the error of the lowest-index failing row is returned and
    /// no output is produced.
    pub fn convert_batch(
        &self,
        rows: &[GenericValue],
    ) -> Result<(Vec<TypedValue>, ConversionStats), StreamError<Infallible>> {
        #[cfg(feature = "parallel")]
        let results: Vec<Result<TypedValue, ConversionError>> = {
            use rayon::prelude::*;
            rows.par_iter().map(|row| self.convert_row(row)).collect()
        };
        #[cfg(not(feature = "parallel"))]
        let results: Vec<Result<TypedValue, ConversionError>> =
            rows.iter().map(|row| self.convert_row(row)).collect();

        let policy = self.context().on_bad_row();
        let mut stats = ConversionStats::default();
        let mut converted = Vec::with_capacity(results.len());
        for (index, result) in results.into_iter().enumerate() {
            let index = index as u64;
            stats.rows_read += 1;
            match result {
                Ok(typed) => {
                    stats.rows_converted += 1;
                    converted.push(typed);
                }
                Err(error) => {
                    if let Some(source) = settle(policy, index, error, &mut stats) {
                        return Err(StreamError::Conversion { index, source });
                    }
                }
            }
        }
        Ok((converted, stats))
    }
}
