//! Upstream data source providers.
//!
//! The pipeline treats the upstream as a black box behind
//! [`MarketDataSource`]: one bulk listing call for universe discovery and
//! one per-symbol history call for extraction. `VciClient` is the concrete
//! HTTP implementation against the VCI endpoints.

pub mod vci;

use crate::error::{DataError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use mdp_core::{DailyBar, Exchange, ExtractionError, InstrumentRecord};

pub use vci::VciClient;

/// Remote market data capability consumed by the pipeline.
///
/// Both calls may be slow and may fail transiently or permanently; the
/// caller owns retry policy (none for the bulk listing, per-symbol retry in
/// the extraction scheduler).
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Full instrument listing across the given exchanges.
    async fn list_instruments(&self, exchanges: &[Exchange]) -> Result<Vec<InstrumentRecord>>;

    /// Daily history for one symbol over a closed date range.
    async fn fetch_daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> std::result::Result<Vec<DailyBar>, ExtractionError>;
}

/// Map a reqwest failure on the per-symbol path onto the extraction
/// taxonomy so the scheduler can classify it.
pub(crate) fn classify_reqwest_error(err: reqwest::Error) -> ExtractionError {
    if err.is_timeout() {
        ExtractionError::Timeout(err.to_string())
    } else if err.is_decode() {
        ExtractionError::Malformed(err.to_string())
    } else {
        ExtractionError::Network(err.to_string())
    }
}

/// Map an HTTP status on the per-symbol path onto the extraction taxonomy.
pub(crate) fn classify_status(symbol: &str, status: reqwest::StatusCode) -> ExtractionError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        ExtractionError::RateLimited
    } else if status == reqwest::StatusCode::NOT_FOUND {
        ExtractionError::NotFound(symbol.to_string())
    } else if status.is_server_error() {
        ExtractionError::Network(format!("upstream returned {status}"))
    } else {
        ExtractionError::Malformed(format!("unexpected status {status}"))
    }
}

/// Listing-path failures are not retried, so they stay in the data error
/// space rather than the per-symbol taxonomy.
pub(crate) fn listing_error(err: reqwest::Error) -> DataError {
    if err.is_decode() {
        DataError::Parse(err.to_string())
    } else {
        DataError::Fetch(err.to_string())
    }
}
