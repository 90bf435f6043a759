//! Frontend controller state
//!
//! A [`Session`] owns the active table and the exported unique-record list.
//! Every frontend action (command-line or shell) goes through it, so nothing
//! about the current dataset lives in global state.

use cpfdedup_core::dataset::{create_dataset, DatasetConfig};
use cpfdedup_core::pipeline::{process_dataset, ProcessingStats};
use cpfdedup_core::{Customer, KeyedHashTable, TableStats};
use rand::seq::SliceRandom;
use rand::Rng;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Errors surfaced to the user by frontend actions
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("no data loaded: generate or load a dataset first")]
    NoData,

    #[error(transparent)]
    Key(#[from] cpfdedup_core::Error),

    #[error(transparent)]
    Format(#[from] cpfdedup_formats::Error),
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Owns the active table and keeps the export file in sync with it
#[derive(Debug)]
pub struct Session {
    table: Option<KeyedHashTable<Customer>>,
    unique: Vec<Customer>,
    export_path: Option<PathBuf>,
    capacity: usize,
}

impl Session {
    /// `export_path = None` keeps everything in memory
    pub fn new(export_path: Option<PathBuf>, capacity: usize) -> Self {
        Self {
            table: None,
            unique: Vec::new(),
            export_path,
            capacity,
        }
    }

    pub fn export_path(&self) -> Option<&Path> {
        self.export_path.as_deref()
    }

    /// Takes effect on the next export; nothing is written here
    pub fn set_export_path(&mut self, path: Option<PathBuf>) {
        self.export_path = path;
    }

    pub fn has_data(&self) -> bool {
        self.table.is_some()
    }

    /// Synthesize a dataset, deduplicate it and export the unique records
    pub fn generate_and_process(&mut self, config: &DatasetConfig) -> SessionResult<ProcessingStats> {
        let dataset = create_dataset(config)?;
        let stats = self.ingest(dataset);
        self.export()?;
        Ok(stats)
    }

    /// Deduplicate the records of an existing file and make them the active set.
    /// The export is left alone until a removal changes the set.
    pub fn load(&mut self, path: &Path) -> SessionResult<ProcessingStats> {
        let records = cpfdedup_formats::read_all(path)?;
        info!("Loaded {} records from {:?}", records.len(), path);
        Ok(self.ingest(records))
    }

    fn ingest(&mut self, records: Vec<Customer>) -> ProcessingStats {
        let outcome = process_dataset(records, self.capacity);
        self.unique = outcome.unique_records().cloned().collect();
        self.table = Some(outcome.table);
        outcome.stats
    }

    pub fn lookup(&self, cpf: &str) -> SessionResult<Option<&Customer>> {
        let table = self.table.as_ref().ok_or(SessionError::NoData)?;
        Ok(table.get(cpf)?)
    }

    /// Remove a customer and rewrite the export when something was removed
    pub fn remove(&mut self, cpf: &str) -> SessionResult<Option<Customer>> {
        let table = self.table.as_mut().ok_or(SessionError::NoData)?;
        let removed = table.remove(cpf)?;

        if removed.is_some() {
            self.unique = table.records().cloned().collect();
            self.export()?;
        }
        Ok(removed)
    }

    /// Up to `n` distinct unique customers picked at random
    pub fn sample<G: Rng + ?Sized>(&self, n: usize, rng: &mut G) -> SessionResult<Vec<&Customer>> {
        if self.unique.is_empty() {
            return Err(SessionError::NoData);
        }
        Ok(self.unique.choose_multiple(rng, n).collect())
    }

    pub fn table_stats(&self) -> SessionResult<TableStats> {
        self.table
            .as_ref()
            .map(KeyedHashTable::stats)
            .ok_or(SessionError::NoData)
    }

    pub fn unique_records(&self) -> &[Customer] {
        &self.unique
    }

    fn export(&self) -> SessionResult<()> {
        if let Some(path) = &self.export_path {
            cpfdedup_formats::write_records(path, &self.unique)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::Builder;

    fn config(records: usize) -> DatasetConfig {
        DatasetConfig {
            records,
            duplicate_ratio: 0.1,
            seed: Some(5),
        }
    }

    #[test]
    fn test_actions_before_data() {
        let mut session = Session::new(None, 1000);
        let mut rng = StdRng::seed_from_u64(0);

        assert!(matches!(session.lookup("11144477735"), Err(SessionError::NoData)));
        assert!(matches!(session.remove("11144477735"), Err(SessionError::NoData)));
        assert!(matches!(session.sample(10, &mut rng), Err(SessionError::NoData)));
        assert!(matches!(session.table_stats(), Err(SessionError::NoData)));
    }

    #[test]
    fn test_generate_lookup_remove() {
        let export = Builder::new().suffix(".csv").tempfile().unwrap();
        let mut session = Session::new(Some(export.path().to_path_buf()), 1000);

        let stats = session.generate_and_process(&config(200)).unwrap();
        assert_eq!(stats.total_records, 200);
        assert_eq!(stats.unique_records, 180);
        assert_eq!(cpfdedup_formats::read_all(export.path()).unwrap().len(), 180);

        let cpf = session.unique_records()[0].cpf.clone();
        assert!(session.lookup(&cpf).unwrap().is_some());

        let removed = session.remove(&cpf).unwrap().unwrap();
        assert_eq!(removed.cpf, cpf);
        assert!(session.lookup(&cpf).unwrap().is_none());
        assert_eq!(session.unique_records().len(), 179);
        assert_eq!(cpfdedup_formats::read_all(export.path()).unwrap().len(), 179);

        assert!(session.remove(&cpf).unwrap().is_none());
    }

    #[test]
    fn test_malformed_key_is_reported() {
        let mut session = Session::new(None, 1000);
        session.generate_and_process(&config(10)).unwrap();

        let err = session.lookup("123").unwrap_err();
        assert!(matches!(err, SessionError::Key(ref e) if e.is_malformed_key()));
        assert!(err.to_string().contains("malformed key"));
        assert!(matches!(session.remove("123.456.789-000"), Err(SessionError::Key(_))));
    }

    #[test]
    fn test_sample() {
        let mut session = Session::new(None, 1000);
        session.generate_and_process(&config(100)).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let sample = session.sample(10, &mut rng).unwrap();
        assert_eq!(sample.len(), 10);

        let everything = session.sample(1_000, &mut rng).unwrap();
        assert_eq!(everything.len(), 90);
    }

    #[test]
    fn test_load_existing_file() {
        let input = Builder::new().suffix(".jsonl").tempfile().unwrap();
        let records = vec![
            Customer::new("111.444.777-35", "Ana", 30, "São Paulo"),
            Customer::new("11144477735", "Duplicata_Ana", 30, "São Paulo"),
            Customer::new("529.982.247-25", "Bia", 41, "Porto Alegre"),
        ];
        cpfdedup_formats::write_records(input.path(), &records).unwrap();

        let mut session = Session::new(None, 1000);
        let stats = session.load(input.path()).unwrap();
        assert_eq!(stats.duplicates_removed, 1);
        assert_eq!(session.lookup("11144477735").unwrap().unwrap().name, "Ana");
        assert_eq!(session.table_stats().unwrap().count, 2);
    }

    #[test]
    fn test_load_does_not_touch_export() {
        let input = Builder::new().suffix(".jsonl").tempfile().unwrap();
        let records = vec![
            Customer::new("111.444.777-35", "Ana", 30, "São Paulo"),
            Customer::new("11144477735", "Duplicata_Ana", 30, "São Paulo"),
        ];
        cpfdedup_formats::write_records(input.path(), &records).unwrap();
        let before = std::fs::read(input.path()).unwrap();

        let mut session = Session::new(Some(input.path().to_path_buf()), 1000);
        session.load(input.path()).unwrap();
        assert!(session.remove("52998224725").unwrap().is_none());

        assert_eq!(std::fs::read(input.path()).unwrap(), before);
    }

    #[test]
    fn test_remove_rewrites_loaded_file_in_place() {
        let input = Builder::new().suffix(".jsonl.gz").tempfile().unwrap();
        let records = vec![
            Customer::new("111.444.777-35", "Ana", 30, "São Paulo"),
            Customer::new("11144477735", "Duplicata_Ana", 30, "São Paulo"),
            Customer::new("529.982.247-25", "Bia", 41, "Porto Alegre"),
        ];
        cpfdedup_formats::write_records(input.path(), &records).unwrap();

        let mut session = Session::new(None, 1000);
        session.load(input.path()).unwrap();
        session.set_export_path(Some(input.path().to_path_buf()));

        let removed = session.remove("52998224725").unwrap().unwrap();
        assert_eq!(removed.name, "Bia");

        let remaining = cpfdedup_formats::read_all(input.path()).unwrap();
        assert_eq!(remaining, vec![Customer::new("111.444.777-35", "Ana", 30, "São Paulo")]);
    }
}
