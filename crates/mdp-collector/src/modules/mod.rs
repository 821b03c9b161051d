//! Pipeline modules.

pub mod ohlcv;
pub mod universe;

pub use ohlcv::collect_ohlcv;
pub use universe::{build_scanner, resolve_symbols, SymbolSource};
