//! Run summary aggregation.

use serde::Serialize;
use std::time::Duration;

/// One symbol that exhausted its retry budget or hit a permanent error.
#[derive(Debug, Clone, Serialize)]
pub struct SymbolFailure {
    pub symbol: String,
    pub error: String,
    /// Retries spent before giving up (zero for permanent errors)
    pub retries: u32,
}

/// Full accounting of one extraction run.
///
/// Invariant: every requested symbol lands in exactly one of `succeeded`,
/// `failures` or `cancelled`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Symbols handed to the scheduler
    pub total_requested: usize,
    /// Symbols that reached a successful terminal state
    pub succeeded: Vec<String>,
    /// Symbols that failed permanently, with their last error
    pub failures: Vec<SymbolFailure>,
    /// Symbols cut off by cancellation (not extraction errors)
    pub cancelled: Vec<String>,
    /// Total retry attempts across all symbols
    pub retried_count: usize,
    /// Wall-clock duration of the run
    #[serde(skip)]
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn new(total_requested: usize) -> Self {
        Self {
            total_requested,
            ..Self::default()
        }
    }

    /// Symbols accounted for so far.
    pub fn accounted(&self) -> usize {
        self.succeeded.len() + self.failures.len() + self.cancelled.len()
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_requested == 0 {
            0.0
        } else {
            (self.succeeded.len() as f64 / self.total_requested as f64) * 100.0
        }
    }

    /// Structured one-line accounting for operators.
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total_requested,
            succeeded = self.succeeded.len(),
            failed = self.failures.len(),
            cancelled = self.cancelled.len(),
            retries = self.retried_count,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "run complete"
        );
        for failure in &self.failures {
            tracing::warn!(
                symbol = %failure.symbol,
                retries = failure.retries,
                error = %failure.error,
                "symbol failed permanently"
            );
        }
    }
}
