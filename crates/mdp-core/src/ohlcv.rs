//! Daily OHLCV bars, the per-symbol payload the pipeline extracts.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily candle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}
