//! Error types for the keyed hash table and dataset tooling

use thiserror::Error;

/// Core errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The key does not contain exactly 11 digits once formatting is stripped
    #[error("malformed key {key:?}: expected 11 digits, found {digits}")]
    MalformedKey { key: String, digits: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// True when the error came from key normalization
    pub fn is_malformed_key(&self) -> bool {
        matches!(self, Error::MalformedKey { .. })
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;
