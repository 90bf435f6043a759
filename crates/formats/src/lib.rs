//! File formats for customer datasets
//!
//! Streaming readers and writers for CSV (the export format) and JSON Lines,
//! with format detection from the file extension.

pub mod csv_reader;
pub mod csv_writer;
pub mod error;
pub mod jsonl;
pub mod reader;
pub mod writer;

pub use csv_reader::CsvReader;
pub use csv_writer::{write_csv, CsvWriter};
pub use error::{Error, Result};
pub use jsonl::{JsonlReader, JsonlWriter};
pub use reader::{open_dataset, read_all, DatasetReader};
pub use writer::{create_writer, write_records, RecordWriter};
