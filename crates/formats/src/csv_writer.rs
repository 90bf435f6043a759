//! CSV export of customer records
//!
//! Output is UTF-8 with a header row followed by one row per record, columns
//! in [`Customer::COLUMNS`] order. The header is written even when there are
//! no records.

use crate::Result;
use cpfdedup_core::Customer;
use csv::WriterBuilder;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Streaming CSV writer
pub struct CsvWriter<W: Write> {
    writer: csv::Writer<W>,
    rows_written: usize,
}

impl CsvWriter<File> {
    /// Create (or truncate) a CSV file at `path`
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        debug!("Creating CSV file: {:?}", path.as_ref());
        Self::new(File::create(path)?)
    }
}

impl<W: Write> CsvWriter<W> {
    /// Wrap `inner` and write the header row
    pub fn new(inner: W) -> Result<Self> {
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(inner);
        writer.write_record(Customer::COLUMNS)?;
        Ok(Self {
            writer,
            rows_written: 0,
        })
    }

    pub fn write_record(&mut self, customer: &Customer) -> Result<()> {
        self.writer.serialize(customer)?;
        self.rows_written += 1;
        Ok(())
    }

    /// Number of data rows written, header excluded
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Flush buffered rows and hand back the inner writer
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| crate::Error::Io(e.into_error()))
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Write `records` to a new CSV file, returning the row count
pub fn write_csv<'a, P, I>(path: P, records: I) -> Result<usize>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = &'a Customer>,
{
    let mut writer = CsvWriter::create(path)?;
    for record in records {
        writer.write_record(record)?;
    }
    writer.flush()?;
    Ok(writer.rows_written())
}
