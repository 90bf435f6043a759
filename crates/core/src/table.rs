//! Keyed hash table with separate chaining
//!
//! Records are filed under the normalized form of their key. Each bucket is
//! an insertion-ordered chain; a key appears at most once in the whole table,
//! so inserting a record whose key is already present is rejected rather than
//! overwriting. The bucket count is always prime and the table doubles (to the
//! next prime) once `count / size` exceeds [`LOAD_FACTOR_THRESHOLD`].
//!
//! The table is single-threaded. Callers sharing one across threads must wrap
//! it in a lock, since a resize replaces every bucket at once.

use crate::hash::{next_prime, GoldenRatioHasher, KeyHasher};
use crate::key::CpfKey;
use crate::record::Keyed;
use crate::Result;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Requested capacity when none is given
pub const DEFAULT_CAPACITY: usize = 1000;

/// Resize once the load factor is strictly greater than this
pub const LOAD_FACTOR_THRESHOLD: f64 = 0.7;

struct Entry<R> {
    key: CpfKey,
    record: R,
}

/// Snapshot of table diagnostics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableStats {
    /// Number of buckets (always prime)
    pub size: usize,
    /// Number of stored records
    pub count: usize,
    /// Inserts that landed in a non-empty bucket since the last rebuild
    pub collisions: usize,
    pub load_factor: f64,
    /// Mean records per bucket; equals the load factor
    pub mean_per_bucket: f64,
    /// Number of rebuilds so far
    pub resizes: usize,
    /// Length of the longest chain
    pub max_bucket_len: usize,
    pub empty_buckets: usize,
}

/// Separate-chaining hash table keyed by 11-digit identifiers
pub struct KeyedHashTable<R, H = GoldenRatioHasher> {
    buckets: Vec<Vec<Entry<R>>>,
    size: usize,
    count: usize,
    collisions: usize,
    resizes: usize,
    hasher: H,
}

impl<R: Keyed> KeyedHashTable<R> {
    /// Create an empty table with the default capacity (1009 buckets)
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty table with at least `capacity` buckets
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_hasher(capacity, GoldenRatioHasher)
    }
}

impl<R: Keyed> Default for KeyedHashTable<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Keyed, H: KeyHasher + Clone> KeyedHashTable<R, H> {
    /// Create an empty table using a custom bucket hasher.
    ///
    /// The bucket count is the smallest prime `>= capacity`. The hasher is kept
    /// for the lifetime of the table, including across resizes.
    pub fn with_hasher(capacity: usize, hasher: H) -> Self {
        let size = next_prime(capacity);
        let mut buckets = Vec::with_capacity(size);
        buckets.resize_with(size, Vec::new);

        Self {
            buckets,
            size,
            count: 0,
            collisions: 0,
            resizes: 0,
            hasher,
        }
    }

    /// Insert a record unless its key is already present.
    ///
    /// Returns `Ok(false)` for a duplicate key, leaving the stored record
    /// untouched. Fails only when the record's key is malformed.
    pub fn insert(&mut self, record: R) -> Result<bool> {
        let key = CpfKey::parse(record.key())?;
        Ok(self.insert_entry(key, record))
    }

    /// Look up the record stored under `raw_key`
    pub fn get(&self, raw_key: &str) -> Result<Option<&R>> {
        let key = CpfKey::parse(raw_key)?;
        let idx = self.index_of(&key);

        Ok(self.buckets[idx]
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| &entry.record))
    }

    /// Whether a record is stored under `raw_key`
    pub fn contains(&self, raw_key: &str) -> Result<bool> {
        Ok(self.get(raw_key)?.is_some())
    }

    /// Remove and return the record stored under `raw_key`.
    ///
    /// The remaining entries of the bucket keep their relative order. The
    /// table never shrinks.
    pub fn remove(&mut self, raw_key: &str) -> Result<Option<R>> {
        let key = CpfKey::parse(raw_key)?;
        let idx = self.index_of(&key);
        let bucket = &mut self.buckets[idx];

        match bucket.iter().position(|entry| entry.key == key) {
            Some(pos) => {
                let entry = bucket.remove(pos);
                self.count -= 1;
                Ok(Some(entry.record))
            }
            None => Ok(None),
        }
    }

    fn insert_entry(&mut self, key: CpfKey, record: R) -> bool {
        let idx = self.index_of(&key);
        let bucket = &mut self.buckets[idx];

        if bucket.iter().any(|entry| entry.key == key) {
            return false;
        }

        if !bucket.is_empty() {
            self.collisions += 1;
        }
        bucket.push(Entry { key, record });
        self.count += 1;

        if self.load_factor() > LOAD_FACTOR_THRESHOLD {
            self.resize();
        }
        true
    }

    /// Rebuild into `next_prime(2 * size)` buckets by reinserting every record
    fn resize(&mut self) {
        let old_size = self.size;
        let new_size = next_prime(old_size * 2);
        let mut rebuilt = Self::with_hasher(new_size, self.hasher.clone());

        for bucket in std::mem::take(&mut self.buckets) {
            for entry in bucket {
                rebuilt.insert_entry(entry.key, entry.record);
            }
        }

        debug!(
            "Resized table from {} to {} buckets ({} records, {} collisions)",
            old_size, rebuilt.size, rebuilt.count, rebuilt.collisions
        );

        self.buckets = rebuilt.buckets;
        self.size = rebuilt.size;
        self.collisions = rebuilt.collisions;
        self.resizes += 1;
    }

    fn index_of(&self, key: &CpfKey) -> usize {
        let idx = self.hasher.bucket_index(key, self.size);
        debug_assert!(idx < self.size, "hasher returned {} for size {}", idx, self.size);
        // A misbehaving custom hasher is folded back into range
        idx % self.size
    }
}

impl<R, H> KeyedHashTable<R, H> {
    /// Number of stored records
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of buckets
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn collisions(&self) -> usize {
        self.collisions
    }

    pub fn resize_count(&self) -> usize {
        self.resizes
    }

    pub fn load_factor(&self) -> f64 {
        self.count as f64 / self.size as f64
    }

    /// Records of one bucket, in insertion order
    pub fn bucket(&self, idx: usize) -> Option<impl Iterator<Item = &R> + '_> {
        self.buckets
            .get(idx)
            .map(|bucket| bucket.iter().map(|entry| &entry.record))
    }

    /// All records, bucket by bucket
    pub fn records(&self) -> impl Iterator<Item = &R> + '_ {
        self.buckets
            .iter()
            .flat_map(|bucket| bucket.iter().map(|entry| &entry.record))
    }

    /// Consume the table, returning its records in bucket order
    pub fn into_records(self) -> Vec<R> {
        self.buckets
            .into_iter()
            .flat_map(|bucket| bucket.into_iter().map(|entry| entry.record))
            .collect()
    }

    pub fn stats(&self) -> TableStats {
        TableStats {
            size: self.size,
            count: self.count,
            collisions: self.collisions,
            load_factor: self.load_factor(),
            mean_per_bucket: self.count as f64 / self.size as f64,
            resizes: self.resizes,
            max_bucket_len: self.buckets.iter().map(Vec::len).max().unwrap_or(0),
            empty_buckets: self.buckets.iter().filter(|b| b.is_empty()).count(),
        }
    }
}

impl<R, H> fmt::Debug for KeyedHashTable<R, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedHashTable")
            .field("size", &self.size)
            .field("count", &self.count)
            .field("collisions", &self.collisions)
            .field("resizes", &self.resizes)
            .finish()
    }
}
