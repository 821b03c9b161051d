//! Extraction scheduling for the market data pipeline.
//!
//! This crate provides the binary and the pieces it is built from:
//! - Bounded-concurrency extraction scheduler with per-symbol retry,
//!   failure isolation and cancellation
//! - Backoff policy (exponential, capped, jittered)
//! - Run summary aggregation
//! - Symbol resolution (manual list or dynamic market scan)
//! - Per-symbol CSV export
//! - Environment-driven configuration

pub mod backoff;
pub mod config;
pub mod error;
pub mod export;
pub mod modules;
pub mod scheduler;
pub mod summary;

pub use backoff::BackoffPolicy;
pub use config::{PipelineConfig, RunMode};
pub use error::{CollectorError, Result};
pub use scheduler::ExtractionScheduler;
pub use summary::{RunSummary, SymbolFailure};
