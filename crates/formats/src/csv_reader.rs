//! Streaming CSV reader for customer exports
//!
//! Columns are matched by header name, so the column order of the input does
//! not matter. Rows that fail to deserialize are skipped with a warning.

use crate::{Error, Result};
use cpfdedup_core::Customer;
use csv::{DeserializeRecordsIntoIter, ReaderBuilder};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// CSV reader yielding [`Customer`] rows
pub struct CsvReader<R: Read> {
    rows: DeserializeRecordsIntoIter<R, Customer>,
    rows_read: usize,
    total_bytes: Option<u64>,
}

impl CsvReader<File> {
    /// Open a CSV file with a header row
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let total_bytes = file.metadata()?.len();
        debug!("Opening CSV file: {:?}", path);

        let mut reader = Self::new(file);
        reader.total_bytes = Some(total_bytes);
        Ok(reader)
    }
}

impl<R: Read> CsvReader<R> {
    pub fn new(inner: R) -> Self {
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(inner);

        Self {
            rows: reader.into_deserialize(),
            rows_read: 0,
            total_bytes: None,
        }
    }

    /// Number of data rows consumed, skipped rows included
    pub fn rows_processed(&self) -> usize {
        self.rows_read
    }

    pub fn bytes_processed(&self) -> u64 {
        self.rows.reader().position().byte()
    }

    pub fn total_bytes(&self) -> Option<u64> {
        self.total_bytes
    }
}

impl<R: Read> Iterator for CsvReader<R> {
    type Item = Result<Customer>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let row = self.rows.next()?;
            self.rows_read += 1;

            match row {
                Ok(customer) => return Some(Ok(customer)),
                Err(e) if e.is_io_error() => return Some(Err(Error::Csv(e))),
                Err(e) => {
                    warn!("Skipping malformed CSV row {}: {}", self.rows_read, e);
                    continue;
                }
            }
        }
    }
}
