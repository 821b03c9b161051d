//! Per-symbol extraction error taxonomy.

use thiserror::Error;

/// Error raised while extracting data for a single symbol.
///
/// The scheduler retries transient errors and fails fast on the rest; the
/// split is owned here so every caller classifies identically.
#[derive(Debug, Clone, Error)]
pub enum ExtractionError {
    /// Request exceeded its deadline
    #[error("request timeout: {0}")]
    Timeout(String),

    /// Upstream rejected the call for rate limiting
    #[error("rate limited")]
    RateLimited,

    /// Connection-level failure or upstream 5xx
    #[error("network error: {0}")]
    Network(String),

    /// Transient local I/O failure
    #[error("io error: {0}")]
    Io(String),

    /// Symbol unknown to the upstream source
    #[error("symbol not found: {0}")]
    NotFound(String),

    /// Response arrived but could not be decoded
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Query succeeded but returned no rows for the requested range
    #[error("no data returned for {0}")]
    NoData(String),

    /// Persisting the extracted data failed
    #[error("storage error: {0}")]
    Storage(String),
}

impl ExtractionError {
    /// Whether a retry is expected to help.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::RateLimited | Self::Network(_) | Self::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_retryable() {
        assert!(ExtractionError::Timeout("10s".into()).is_retryable());
        assert!(ExtractionError::RateLimited.is_retryable());
        assert!(ExtractionError::Network("reset".into()).is_retryable());
    }

    #[test]
    fn permanent_errors_are_not_retryable() {
        assert!(!ExtractionError::NotFound("XYZ".into()).is_retryable());
        assert!(!ExtractionError::Malformed("bad json".into()).is_retryable());
        assert!(!ExtractionError::NoData("ABC".into()).is_retryable());
        assert!(!ExtractionError::Storage("disk full".into()).is_retryable());
    }
}
