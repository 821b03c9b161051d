//! Data module error types.

use thiserror::Error;

/// Universe discovery and persistence errors.
#[derive(Debug, Error)]
pub enum DataError {
    /// Cache read/write I/O failure
    #[error("cache io error: {0}")]
    CacheIo(String),

    /// Cache file exists but cannot be decoded
    #[error("cache corrupt: {0}")]
    CacheCorrupt(String),

    /// Upstream listing fetch failure
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Upstream response could not be decoded
    #[error("parse error: {0}")]
    Parse(String),

    /// Live fetch and fallback cache both unavailable
    #[error("universe scan failed: {cause}")]
    ScanFailed { cause: String },
}

impl From<std::io::Error> for DataError {
    fn from(err: std::io::Error) -> Self {
        Self::CacheIo(err.to_string())
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        Self::CacheCorrupt(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
