//! Dated universe snapshots.

use crate::instrument::InstrumentRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An immutable record of the universe discovered on one calendar date.
///
/// At most one snapshot exists per date; a rescan of the same date replaces
/// the previous snapshot wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniverseSnapshot {
    /// Calendar date the universe was discovered on (market-local)
    pub as_of: NaiveDate,
    /// Instruments that survived the scan filters
    pub instruments: Vec<InstrumentRecord>,
}

impl UniverseSnapshot {
    pub fn new(as_of: NaiveDate, instruments: Vec<InstrumentRecord>) -> Self {
        Self { as_of, instruments }
    }

    /// Ticker codes in snapshot order.
    pub fn symbols(&self) -> Vec<String> {
        self.instruments.iter().map(|i| i.symbol.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Whether this snapshot predates the given run date.
    pub fn is_stale(&self, today: NaiveDate) -> bool {
        self.as_of < today
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::Exchange;

    #[test]
    fn staleness_is_strict_before() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let snap = UniverseSnapshot::new(date, vec![InstrumentRecord::new("VNM", Exchange::Hsx)]);
        assert!(!snap.is_stale(date));
        assert!(snap.is_stale(date.succ_opt().unwrap()));
    }
}
