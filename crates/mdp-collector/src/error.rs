//! Collector error types.

use mdp_data::DataError;
use thiserror::Error;

/// Top-level collector error.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Universe discovery / persistence error
    #[error(transparent)]
    Data(#[from] DataError),

    /// Local I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CollectorError>;
