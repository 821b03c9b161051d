//! Instruments and the venues they trade on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trading venue of the Vietnamese equity market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Exchange {
    /// Ho Chi Minh Stock Exchange (primary board)
    Hsx,
    /// Hanoi Stock Exchange (secondary board)
    Hnx,
    /// Unlisted Public Company Market
    Upcom,
}

impl Exchange {
    /// Canonical upper-case venue code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hsx => "HSX",
            Self::Hnx => "HNX",
            Self::Upcom => "UPCOM",
        }
    }

    /// All configured venues, in board order.
    pub fn all() -> &'static [Exchange] {
        &[Exchange::Hsx, Exchange::Hnx, Exchange::Upcom]
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exchange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // HOSE is the legacy name some upstream listings still use for HSX.
        match s.trim().to_ascii_uppercase().as_str() {
            "HSX" | "HOSE" => Ok(Self::Hsx),
            "HNX" => Ok(Self::Hnx),
            "UPCOM" => Ok(Self::Upcom),
            other => Err(format!("unknown exchange: {other}")),
        }
    }
}

/// One listed instrument as observed from the upstream source.
///
/// The discriminating fields (`is_etf`, `is_suspended`) default to `false`
/// when the upstream payload omits them: missing metadata never excludes an
/// instrument, filters fail open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentRecord {
    /// Ticker code (e.g. VNM, FPT)
    pub symbol: String,
    /// Venue the instrument was listed on at observation time
    pub exchange: Exchange,
    /// Exchange-traded fund flag
    #[serde(default)]
    pub is_etf: bool,
    /// Suspended / delisted / halted flag
    #[serde(default)]
    pub is_suspended: bool,
    /// Liquidity proxy (average traded value); absent for thin names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liquidity: Option<f64>,
}

impl InstrumentRecord {
    /// Plain listed instrument with no flags set.
    pub fn new(symbol: impl Into<String>, exchange: Exchange) -> Self {
        Self {
            symbol: symbol.into(),
            exchange,
            is_etf: false,
            is_suspended: false,
            liquidity: None,
        }
    }
}
