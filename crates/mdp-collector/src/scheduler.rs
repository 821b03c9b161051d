//! Bounded-concurrency extraction scheduler.
//!
//! Fans one extraction function out across a symbol list under a semaphore
//! cap, retries transient failures with backoff, isolates permanent
//! failures and aggregates everything into a [`RunSummary`]. The run as a
//! whole never aborts because of an individual symbol.
//!
//! Per-symbol lifecycle:
//!
//! ```text
//! Pending -> InFlight -> Succeeded
//!                     -> RetryScheduled -> InFlight (transient, budget left)
//!                     -> FailedPermanently
//!                     -> Cancelled
//! ```
//!
//! Cancellation stops admitting pending symbols immediately; an in-flight
//! attempt gets a grace period to finish before it is abandoned. Cancelled
//! symbols are a distinct terminal state, not failures.

use crate::backoff::BackoffPolicy;
use crate::summary::{RunSummary, SymbolFailure};
use mdp_core::ExtractionError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Drives one extraction run.
pub struct ExtractionScheduler {
    concurrency_limit: usize,
    max_retries: u32,
    backoff: BackoffPolicy,
    grace: Duration,
    cancel: CancellationToken,
}

impl ExtractionScheduler {
    pub fn new(concurrency_limit: usize, max_retries: u32, backoff: BackoffPolicy) -> Self {
        Self {
            concurrency_limit: concurrency_limit.max(1),
            max_retries,
            backoff,
            grace: Duration::from_secs(5),
            cancel: CancellationToken::new(),
        }
    }

    /// Wire an external cancellation token (deadline, Ctrl-C).
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// How long an in-flight attempt may keep running after cancellation.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Run `extract` for every symbol and return the full accounting.
    ///
    /// At most `concurrency_limit` symbols are in flight at once; the
    /// semaphore here is the sole admission point and a retrying symbol
    /// keeps its permit, so retries cannot exceed the cap either.
    pub async fn run<F, Fut, T>(&self, symbols: Vec<String>, extract: F) -> RunSummary
    where
        F: Fn(String) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ExtractionError>> + Send + 'static,
        T: Send + 'static,
    {
        let started = std::time::Instant::now();
        let mut summary = RunSummary::new(symbols.len());
        let semaphore = Arc::new(Semaphore::new(self.concurrency_limit));
        let mut workers = JoinSet::new();

        for symbol in symbols {
            let semaphore = Arc::clone(&semaphore);
            let extract = extract.clone();
            let cancel = self.cancel.clone();
            let backoff = self.backoff.clone();
            let max_retries = self.max_retries;
            let grace = self.grace;
            workers.spawn(async move {
                run_symbol(symbol, semaphore, extract, cancel, backoff, max_retries, grace).await
            });
        }

        // Single-point merge: outcomes arrive in completion order and each
        // symbol is recorded exactly once.
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(outcome) => {
                    summary.retried_count += outcome.retries as usize;
                    match outcome.state {
                        TerminalState::Succeeded => summary.succeeded.push(outcome.symbol),
                        TerminalState::Failed(error) => summary.failures.push(SymbolFailure {
                            symbol: outcome.symbol,
                            error: error.to_string(),
                            retries: outcome.retries,
                        }),
                        TerminalState::Cancelled => summary.cancelled.push(outcome.symbol),
                    }
                }
                Err(join_err) => {
                    // Only reachable if an extraction future panics.
                    tracing::error!(error = %join_err, "extraction worker aborted");
                }
            }
        }

        summary.elapsed = started.elapsed();
        summary
    }
}

enum TerminalState {
    Succeeded,
    Failed(ExtractionError),
    Cancelled,
}

struct SymbolOutcome {
    symbol: String,
    state: TerminalState,
    retries: u32,
}

async fn run_symbol<F, Fut, T>(
    symbol: String,
    semaphore: Arc<Semaphore>,
    extract: F,
    cancel: CancellationToken,
    backoff: BackoffPolicy,
    max_retries: u32,
    grace: Duration,
) -> SymbolOutcome
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<T, ExtractionError>>,
{
    let outcome = |state, retries| SymbolOutcome {
        symbol: symbol.clone(),
        state,
        retries,
    };

    // Pending: admission. Cancellation wins over a free permit so no new
    // symbol starts once the token fires.
    let _permit = tokio::select! {
        biased;
        _ = cancel.cancelled() => return outcome(TerminalState::Cancelled, 0),
        permit = semaphore.acquire_owned() => match permit {
            Ok(permit) => permit,
            Err(_) => return outcome(TerminalState::Cancelled, 0),
        },
    };

    let mut retries = 0u32;
    loop {
        // InFlight. On cancellation the attempt keeps running for the
        // grace period; finishing inside it still counts.
        let attempt = extract(symbol.clone());
        tokio::pin!(attempt);
        let result = tokio::select! {
            biased;
            result = &mut attempt => result,
            _ = cancelled_plus_grace(&cancel, grace) => {
                tracing::debug!(symbol = %symbol, "in-flight attempt abandoned after grace period");
                return outcome(TerminalState::Cancelled, retries);
            }
        };

        match result {
            Ok(_) => return outcome(TerminalState::Succeeded, retries),
            Err(error) if error.is_retryable() && retries < max_retries => {
                let delay = backoff.delay(retries + 1);
                tracing::warn!(
                    symbol = %symbol,
                    retry = retries + 1,
                    max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "transient extraction failure, retrying"
                );
                // RetryScheduled: the backoff sleep is abandoned outright on
                // cancellation, no retry starts after the token fires.
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return outcome(TerminalState::Cancelled, retries),
                    _ = tokio::time::sleep(delay) => {}
                }
                retries += 1;
            }
            Err(error) => {
                tracing::error!(
                    symbol = %symbol,
                    retries,
                    error = %error,
                    "extraction failed permanently"
                );
                return outcome(TerminalState::Failed(error), retries);
            }
        }
    }
}

async fn cancelled_plus_grace(cancel: &CancellationToken, grace: Duration) {
    cancel.cancelled().await;
    tokio::time::sleep(grace).await;
}
