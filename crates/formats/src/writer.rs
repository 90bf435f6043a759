//! Record writers with format detection from the output path

use crate::{csv_writer::CsvWriter, jsonl::JsonlWriter, Error, Result};
use cpfdedup_core::Customer;
use flate2::write::GzEncoder;
use std::fs::File;
use std::path::Path;
use tracing::info;

/// Sink for exported records
pub trait RecordWriter {
    fn write_record(&mut self, customer: &Customer) -> Result<()>;

    /// Flush everything written so far
    fn finish(&mut self) -> Result<()>;

    fn rows_written(&self) -> usize;
}

impl RecordWriter for CsvWriter<File> {
    fn write_record(&mut self, customer: &Customer) -> Result<()> {
        CsvWriter::write_record(self, customer)
    }

    fn finish(&mut self) -> Result<()> {
        self.flush()
    }

    fn rows_written(&self) -> usize {
        CsvWriter::rows_written(self)
    }
}

impl RecordWriter for JsonlWriter<File> {
    fn write_record(&mut self, customer: &Customer) -> Result<()> {
        JsonlWriter::write_record(self, customer)
    }

    fn finish(&mut self) -> Result<()> {
        self.flush()
    }

    fn rows_written(&self) -> usize {
        JsonlWriter::rows_written(self)
    }
}

impl RecordWriter for JsonlWriter<GzEncoder<File>> {
    fn write_record(&mut self, customer: &Customer) -> Result<()> {
        JsonlWriter::write_record(self, customer)
    }

    fn finish(&mut self) -> Result<()> {
        self.finish_gz()
    }

    fn rows_written(&self) -> usize {
        JsonlWriter::rows_written(self)
    }
}

/// Create a writer for `path`, choosing CSV, JSONL or gzipped JSONL by extension
pub fn create_writer<P: AsRef<Path>>(path: P) -> Result<Box<dyn RecordWriter>> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => Ok(Box::new(CsvWriter::create(path)?)),
        Some("jsonl") | Some("json") => Ok(Box::new(JsonlWriter::create(path)?)),
        Some("gz") => Ok(Box::new(JsonlWriter::create_gz(path)?)),
        other => Err(Error::UnsupportedFormat(format!(
            "Cannot write {:?}: expected .csv, .jsonl or .jsonl.gz",
            other.unwrap_or("")
        ))),
    }
}

/// Write `records` to `path` in the format implied by its extension
pub fn write_records<'a, P, I>(path: P, records: I) -> Result<usize>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = &'a Customer>,
{
    let path = path.as_ref();
    let mut writer = create_writer(path)?;
    for record in records {
        writer.write_record(record)?;
    }
    writer.finish()?;

    info!("Wrote {} records to {:?}", writer.rows_written(), path);
    Ok(writer.rows_written())
}
