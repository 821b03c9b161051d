//! Core domain types for the market data pipeline.
//!
//! This crate defines the vocabulary shared by universe discovery and
//! per-symbol extraction:
//! - Instruments, exchanges and dated universe snapshots
//! - Market scope policies (ALL / CORE / HSX_ONLY / HSX_HNX)
//! - The per-symbol extraction error taxonomy
//! - Symbol normalization and validation

pub mod error;
pub mod instrument;
pub mod ohlcv;
pub mod scope;
pub mod snapshot;
pub mod symbol;
pub mod time;

pub use error::ExtractionError;
pub use instrument::{Exchange, InstrumentRecord};
pub use ohlcv::DailyBar;
pub use scope::{MarketScope, ScopeSettings};
pub use snapshot::UniverseSnapshot;
pub use symbol::{normalize_symbols, RejectedSymbol};
pub use time::today_vn;
