//! Unified dataset reader abstraction
//!
//! Provides a common interface for reading customer datasets with automatic
//! format detection based on file extensions.

use crate::{csv_reader::CsvReader, jsonl::JsonlReader, Error, Result};
use cpfdedup_core::Customer;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Trait for dataset readers providing unified interface
pub trait DatasetReader: Iterator<Item = Result<Customer>> {
    /// Get total file size in bytes if known
    fn total_bytes(&self) -> Option<u64>;

    /// Get number of bytes processed so far
    fn bytes_processed(&self) -> u64;

    /// Get the number of records processed
    fn records_processed(&self) -> usize;
}

impl DatasetReader for JsonlReader<Box<dyn Read>> {
    fn total_bytes(&self) -> Option<u64> {
        JsonlReader::total_bytes(self)
    }

    fn bytes_processed(&self) -> u64 {
        JsonlReader::bytes_processed(self)
    }

    fn records_processed(&self) -> usize {
        self.lines_processed()
    }
}

impl DatasetReader for CsvReader<File> {
    fn total_bytes(&self) -> Option<u64> {
        CsvReader::total_bytes(self)
    }

    fn bytes_processed(&self) -> u64 {
        CsvReader::bytes_processed(self)
    }

    fn records_processed(&self) -> usize {
        self.rows_processed()
    }
}

/// Factory function to open a dataset with automatic format detection
///
/// Supported formats:
/// - `.csv` - CSV with a `cpf,name,age,city` header
/// - `.jsonl`, `.json` - JSON Lines format
/// - `.gz` - Gzip-compressed JSON Lines
pub fn open_dataset<P: AsRef<Path>>(path: P) -> Result<Box<dyn DatasetReader>> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| Error::UnsupportedFormat("No file extension found".to_string()))?;

    info!("Opening dataset: {:?} (format: {})", path, extension);

    match extension {
        "csv" => Ok(Box::new(CsvReader::open(path)?)),
        "jsonl" | "json" | "gz" => Ok(Box::new(JsonlReader::open(path)?)),
        other => Err(Error::UnsupportedFormat(format!(
            "Unsupported file extension: .{}. Supported: .csv, .jsonl, .json, .gz",
            other
        ))),
    }
}

/// Read every record of a dataset into memory
pub fn read_all<P: AsRef<Path>>(path: P) -> Result<Vec<Customer>> {
    open_dataset(path)?.collect()
}
