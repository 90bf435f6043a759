//! Core deduplication logic for CPF-keyed records
//!
//! The centre of this crate is [`KeyedHashTable`], a separate-chaining hash
//! table that normalizes 11-digit identifiers, rejects duplicate keys on
//! insert and grows to the next prime once its load factor passes 0.7.

pub mod error;
pub mod key;
pub mod hash;
pub mod record;
pub mod table;
pub mod dataset;
pub mod pipeline;

pub use error::{Error, Result};
pub use hash::{next_prime, GoldenRatioHasher, KeyHasher};
pub use key::CpfKey;
pub use record::{Customer, Keyed};
pub use table::{KeyedHashTable, TableStats};
