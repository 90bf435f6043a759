//! Batch processing: load a record stream into a keyed table
//!
//! Each record goes through [`KeyedHashTable::insert`]. Records whose key is
//! already present are dropped as duplicates; records with a malformed key
//! are logged, counted and skipped so one bad row cannot abort a batch.

use crate::record::Keyed;
use crate::table::{KeyedHashTable, TableStats, DEFAULT_CAPACITY};
use serde::Serialize;
use tracing::{info, warn};

/// Counters for one processing run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingStats {
    pub total_records: usize,
    pub unique_records: usize,
    pub duplicates_removed: usize,
    pub malformed_records: usize,
    pub table: TableStats,
}

impl ProcessingStats {
    /// Share of input records dropped as duplicates, in percent
    pub fn dedup_rate(&self) -> f64 {
        if self.total_records == 0 {
            0.0
        } else {
            (self.duplicates_removed as f64 / self.total_records as f64) * 100.0
        }
    }
}

/// What happened to one record fed to a [`Deduplicator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Unique,
    Duplicate,
    Malformed,
}

/// Incremental deduplication over a keyed table
#[derive(Debug)]
pub struct Deduplicator<R> {
    table: KeyedHashTable<R>,
    total: usize,
    duplicates: usize,
    malformed: usize,
}

impl<R: Keyed> Deduplicator<R> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: KeyedHashTable::with_capacity(capacity),
            total: 0,
            duplicates: 0,
            malformed: 0,
        }
    }

    /// Feed one record; malformed keys are logged and counted, never fatal
    pub fn push(&mut self, record: R) -> InsertOutcome {
        self.total += 1;
        match self.table.insert(record) {
            Ok(true) => InsertOutcome::Unique,
            Ok(false) => {
                self.duplicates += 1;
                InsertOutcome::Duplicate
            }
            Err(e) => {
                warn!("Skipping record #{}: {}", self.total, e);
                self.malformed += 1;
                InsertOutcome::Malformed
            }
        }
    }

    pub fn table(&self) -> &KeyedHashTable<R> {
        &self.table
    }

    /// Records pushed so far
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn malformed(&self) -> usize {
        self.malformed
    }

    pub fn stats(&self) -> ProcessingStats {
        ProcessingStats {
            total_records: self.total,
            unique_records: self.table.len(),
            duplicates_removed: self.duplicates,
            malformed_records: self.malformed,
            table: self.table.stats(),
        }
    }

    pub fn finish(self) -> ProcessOutcome<R> {
        let stats = self.stats();
        info!(
            "Processed {} records: {} unique, {} duplicates, {} malformed",
            stats.total_records, stats.unique_records, stats.duplicates_removed, stats.malformed_records
        );
        ProcessOutcome {
            table: self.table,
            stats,
        }
    }
}

impl<R: Keyed> Default for Deduplicator<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a finished deduplication run
#[derive(Debug)]
pub struct ProcessOutcome<R> {
    pub table: KeyedHashTable<R>,
    pub stats: ProcessingStats,
}

impl<R> ProcessOutcome<R> {
    /// Unique records in bucket order
    pub fn unique_records(&self) -> impl Iterator<Item = &R> + '_ {
        self.table.records()
    }
}

/// Deduplicate `records` with a table of the given initial capacity
pub fn process_dataset<R, I>(records: I, capacity: usize) -> ProcessOutcome<R>
where
    R: Keyed,
    I: IntoIterator<Item = R>,
{
    let mut dedup = Deduplicator::with_capacity(capacity);
    for record in records {
        dedup.push(record);
    }
    dedup.finish()
}

/// [`process_dataset`] with the default capacity
pub fn process_default<R, I>(records: I) -> ProcessOutcome<R>
where
    R: Keyed,
    I: IntoIterator<Item = R>,
{
    process_dataset(records, DEFAULT_CAPACITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{create_dataset, DatasetConfig};
    use crate::record::Customer;

    #[test]
    fn test_process_generated_dataset() {
        let config = DatasetConfig {
            records: 10_000,
            duplicate_ratio: 0.1,
            seed: Some(42),
        };
        let dataset = create_dataset(&config).unwrap();
        let outcome = process_default(dataset);

        assert_eq!(outcome.stats.total_records, 10_000);
        assert_eq!(outcome.stats.unique_records, 9_000);
        assert_eq!(outcome.stats.duplicates_removed, 1_000);
        assert_eq!(outcome.stats.malformed_records, 0);
        assert!((outcome.stats.dedup_rate() - 10.0).abs() < 1e-9);

        // 9000 records force 1009 -> 2027 -> 4057 -> 8117 -> next_prime(16234)
        assert_eq!(outcome.stats.table.resizes, 4);
        assert_eq!(outcome.stats.table.size, crate::hash::next_prime(16_234));
        assert_eq!(outcome.unique_records().count(), 9_000);
        for customer in outcome.unique_records() {
            assert_eq!(outcome.table.get(&customer.cpf).unwrap(), Some(customer));
        }
    }

    #[test]
    fn test_malformed_records_are_skipped() {
        let records = vec![
            Customer::new("11144477735", "A", 20, "São Paulo"),
            Customer::new("123", "Bad", 20, "São Paulo"),
            Customer::new("111.444.777-35", "Dup", 20, "São Paulo"),
            Customer::new("529.982.247-25", "B", 20, "São Paulo"),
        ];

        let outcome = process_dataset(records, 10);
        assert_eq!(outcome.stats.total_records, 4);
        assert_eq!(outcome.stats.unique_records, 2);
        assert_eq!(outcome.stats.duplicates_removed, 1);
        assert_eq!(outcome.stats.malformed_records, 1);
    }

    #[test]
    fn test_deduplicator_outcomes() {
        let mut dedup = Deduplicator::new();
        assert_eq!(dedup.push(Customer::new("11144477735", "A", 1, "X")), InsertOutcome::Unique);
        assert_eq!(dedup.push(Customer::new("111.444.777-35", "B", 1, "X")), InsertOutcome::Duplicate);
        assert_eq!(dedup.push(Customer::new("1", "C", 1, "X")), InsertOutcome::Malformed);
        assert_eq!((dedup.total(), dedup.duplicates(), dedup.malformed()), (3, 1, 1));

        let stats = dedup.stats();
        assert_eq!(stats.total_records, 3);
        assert_eq!(stats.unique_records, 1);
        assert_eq!(dedup.table().get("11144477735").unwrap().unwrap().name, "A");
    }

    #[test]
    fn test_empty_input() {
        let outcome = process_default(Vec::<Customer>::new());
        assert_eq!(outcome.stats.total_records, 0);
        assert_eq!(outcome.stats.dedup_rate(), 0.0);
        assert_eq!(outcome.stats.table.size, 1009);
    }
}
