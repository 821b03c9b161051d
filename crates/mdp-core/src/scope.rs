//! Market scope policies.
//!
//! A scope reduces the discovered universe to a bounded working set. The
//! exchange mapping is fixed per scope; CORE additionally caps the number of
//! UPCOM names kept (ranked by liquidity, see `mdp-data::scope`).

use crate::instrument::Exchange;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named universe-reduction policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketScope {
    /// Every configured exchange, uncapped
    All,
    /// Every exchange, UPCOM capped to the most liquid names
    Core,
    /// HSX only
    HsxOnly,
    /// HSX and HNX
    HsxHnx,
}

impl MarketScope {
    /// Exchanges included by this scope.
    pub fn exchanges(&self) -> &'static [Exchange] {
        match self {
            Self::All | Self::Core => &[Exchange::Hsx, Exchange::Hnx, Exchange::Upcom],
            Self::HsxOnly => &[Exchange::Hsx],
            Self::HsxHnx => &[Exchange::Hsx, Exchange::Hnx],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Core => "core",
            Self::HsxOnly => "hsx_only",
            Self::HsxHnx => "hsx_hnx",
        }
    }
}

impl fmt::Display for MarketScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "core" => Ok(Self::Core),
            "hsx_only" => Ok(Self::HsxOnly),
            "hsx_hnx" => Ok(Self::HsxHnx),
            other => Err(format!("unknown market scope: {other}")),
        }
    }
}

/// Tunables for scope filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeSettings {
    /// Maximum UPCOM names kept under CORE scope
    pub upcom_max_symbols: usize,
    /// Explicit exchange override; `None` uses the scope's fixed mapping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_exchanges: Option<Vec<Exchange>>,
}

impl Default for ScopeSettings {
    fn default() -> Self {
        Self {
            upcom_max_symbols: 50,
            include_exchanges: None,
        }
    }
}
