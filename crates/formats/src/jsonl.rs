//! Streaming JSONL (JSON Lines) reader and writer
//!
//! One customer object per line. Reading auto-detects gzip compression from
//! the `.gz` extension and skips blank or malformed lines; writing can produce
//! gzip output for the same extension.

use crate::{Error, Result};
use cpfdedup_core::Customer;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Buffer size for JSONL readers
const BUFFER_SIZE: usize = 64 * 1024;

/// Streaming JSONL reader that processes files line-by-line
pub struct JsonlReader<R: Read> {
    reader: BufReader<R>,
    line_number: usize,
    bytes_read: u64,
    total_bytes: Option<u64>,
}

impl JsonlReader<Box<dyn Read>> {
    /// Open a JSONL file, auto-detecting gzip compression
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let total_bytes = file.metadata()?.len();

        match path.extension().and_then(|e| e.to_str()) {
            Some("gz") => {
                debug!("Opening gzip-compressed JSONL file: {:?}", path);
                let reader: Box<dyn Read> = Box::new(GzDecoder::new(file));
                // Compressed size says nothing about decoded progress
                Ok(Self::with_total(reader, None))
            }
            _ => {
                debug!("Opening plain JSONL file: {:?}", path);
                let reader: Box<dyn Read> = Box::new(file);
                Ok(Self::with_total(reader, Some(total_bytes)))
            }
        }
    }
}

impl<R: Read> JsonlReader<R> {
    /// Create a new JSONL reader from any Read source
    pub fn new(reader: R) -> Self {
        Self::with_total(reader, None)
    }

    fn with_total(reader: R, total_bytes: Option<u64>) -> Self {
        Self {
            reader: BufReader::with_capacity(BUFFER_SIZE, reader),
            line_number: 0,
            bytes_read: 0,
            total_bytes,
        }
    }

    /// Get the number of lines processed
    pub fn lines_processed(&self) -> usize {
        self.line_number
    }

    /// Get the number of bytes read
    pub fn bytes_processed(&self) -> u64 {
        self.bytes_read
    }

    /// Get total file size if known
    pub fn total_bytes(&self) -> Option<u64> {
        self.total_bytes
    }
}

impl<R: Read> Iterator for JsonlReader<R> {
    type Item = Result<Customer>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = String::new();

        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => return None,
                Ok(n) => {
                    self.bytes_read += n as u64;
                    self.line_number += 1;

                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    match serde_json::from_str::<Customer>(trimmed) {
                        Ok(customer) => return Some(Ok(customer)),
                        Err(e) => {
                            warn!(
                                "Failed to parse JSON at line {}: {} - Error: {}",
                                self.line_number, trimmed, e
                            );
                            continue;
                        }
                    }
                }
                Err(e) => return Some(Err(Error::Io(e))),
            }
        }
    }
}

/// JSONL writer, one compact object per line
pub struct JsonlWriter<W: Write> {
    writer: BufWriter<W>,
    rows_written: usize,
}

impl JsonlWriter<File> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        debug!("Creating JSONL file: {:?}", path.as_ref());
        Ok(Self::new(File::create(path)?))
    }
}

impl JsonlWriter<GzEncoder<File>> {
    pub fn create_gz<P: AsRef<Path>>(path: P) -> Result<Self> {
        debug!("Creating gzip-compressed JSONL file: {:?}", path.as_ref());
        Ok(Self::new(GzEncoder::new(File::create(path)?, Compression::default())))
    }

    /// Flush pending lines and write the gzip trailer
    pub fn finish_gz(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_mut().try_finish()?;
        Ok(())
    }
}

impl<W: Write> JsonlWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: BufWriter::new(inner),
            rows_written: 0,
        }
    }

    pub fn write_record(&mut self, customer: &Customer) -> Result<()> {
        serde_json::to_writer(&mut self.writer, customer)?;
        self.writer.write_all(b"\n")?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flush and hand back the inner writer
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_jsonl_reader_basic() {
        let data = r#"{"cpf": "111.444.777-35", "name": "Ana", "age": 30, "city": "São Paulo"}
{"cpf": "52998224725", "name": "Bia", "age": 41, "city": "Porto Alegre"}"#;

        let reader = JsonlReader::new(data.as_bytes());
        let records: Vec<_> = reader.collect::<Result<Vec<_>>>().unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Ana");
        assert_eq!(records[1].cpf, "52998224725");
    }

    #[test]
    fn test_jsonl_reader_skips_blank_and_malformed_lines() {
        let data = r#"{"cpf": "11144477735", "name": "Ana", "age": 30, "city": "São Paulo"}

{invalid json}
{"cpf": "52998224725", "name": "missing fields"}
{"cpf": "52998224725", "name": "Bia", "age": 41, "city": "Porto Alegre"}
"#;

        let mut reader = JsonlReader::new(data.as_bytes());
        let records: Vec<_> = reader.by_ref().collect::<Result<Vec<_>>>().unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].name, "Bia");
        assert_eq!(reader.lines_processed(), 5);
    }

    #[test]
    fn test_jsonl_reader_progress_tracking() {
        let data = r#"{"cpf": "11144477735", "name": "Ana", "age": 30, "city": "São Paulo"}
{"cpf": "52998224725", "name": "Bia", "age": 41, "city": "Porto Alegre"}"#;

        let mut reader = JsonlReader::new(data.as_bytes());
        assert_eq!(reader.bytes_processed(), 0);

        let _ = reader.next();
        assert_eq!(reader.lines_processed(), 1);
        assert!(reader.bytes_processed() > 0);

        let _ = reader.next();
        assert_eq!(reader.bytes_processed(), data.len() as u64);
    }

    #[test]
    fn test_jsonl_writer() {
        let mut writer = JsonlWriter::new(Vec::new());
        writer
            .write_record(&Customer::new("11144477735", "Ana", 30, "São Paulo"))
            .unwrap();
        assert_eq!(writer.rows_written(), 1);

        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(
            out,
            "{\"cpf\":\"11144477735\",\"name\":\"Ana\",\"age\":30,\"city\":\"São Paulo\"}\n"
        );
    }

    #[test]
    fn test_jsonl_reader_gzip() {
        let temp_file = NamedTempFile::new().unwrap();
        let temp_path = temp_file.path().with_extension("jsonl.gz");

        {
            let file = File::create(&temp_path).unwrap();
            let mut encoder = GzEncoder::new(file, Compression::default());
            writeln!(encoder, r#"{{"cpf": "11144477735", "name": "Ana", "age": 30, "city": "Rio de Janeiro"}}"#).unwrap();
            encoder.finish().unwrap();
        }

        let reader = JsonlReader::open(&temp_path).unwrap();
        assert!(reader.total_bytes().is_none());
        let records: Vec<_> = reader.collect::<Result<Vec<_>>>().unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].city, "Rio de Janeiro");

        std::fs::remove_file(temp_path).unwrap();
    }

    #[test]
    fn test_jsonl_writer_gzip() {
        let temp_file = NamedTempFile::new().unwrap();
        let temp_path = temp_file.path().with_extension("jsonl.gz");

        let mut writer = JsonlWriter::create_gz(&temp_path).unwrap();
        writer
            .write_record(&Customer::new("52998224725", "Bia", 41, "Porto Alegre"))
            .unwrap();
        writer.finish_gz().unwrap();
        drop(writer);

        let records: Vec<_> = JsonlReader::open(&temp_path)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(records, vec![Customer::new("52998224725", "Bia", 41, "Porto Alegre")]);

        std::fs::remove_file(temp_path).unwrap();
    }
}
