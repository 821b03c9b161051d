//! Universe discovery for the market data pipeline.
//!
//! This crate provides:
//! - The upstream data source seam (`MarketDataSource`) and its VCI
//!   implementation
//! - A day-keyed persistent universe cache with atomic writes
//! - The market scanner (live fetch, filters, stale-cache fallback)
//! - The deterministic scope filter

pub mod cache;
pub mod error;
pub mod provider;
pub mod scanner;
pub mod scope;

pub use cache::UniverseCache;
pub use error::{DataError, Result};
pub use provider::{MarketDataSource, VciClient};
pub use scanner::{MarketScanner, ScanFilters, ScannedUniverse, UniverseOrigin};
pub use scope::apply_scope;
