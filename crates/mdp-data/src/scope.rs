//! Deterministic scope filtering.
//!
//! Pure function over a snapshot: exchange inclusion plus, under CORE, a
//! bounded UPCOM subset ranked by the liquidity proxy. No I/O, identical
//! inputs always produce identical output ordering.

use mdp_core::{Exchange, InstrumentRecord, MarketScope, ScopeSettings, UniverseSnapshot};

/// Reduce a snapshot to the ordered symbol list for the requested scope.
///
/// Listed-board instruments keep their input order. Under [`MarketScope::Core`]
/// the UPCOM contingent is ranked by liquidity descending (stable, so
/// instruments without a liquidity value keep their relative input order at
/// the tail) and truncated to `settings.upcom_max_symbols`, then appended.
/// Duplicate symbols are dropped, first occurrence wins.
pub fn apply_scope(
    snapshot: &UniverseSnapshot,
    scope: MarketScope,
    settings: &ScopeSettings,
) -> Vec<String> {
    let included: &[Exchange] = settings
        .include_exchanges
        .as_deref()
        .unwrap_or_else(|| scope.exchanges());

    let mut listed: Vec<&InstrumentRecord> = Vec::new();
    let mut upcom: Vec<&InstrumentRecord> = Vec::new();
    for instrument in &snapshot.instruments {
        if !included.contains(&instrument.exchange) {
            continue;
        }
        if instrument.exchange == Exchange::Upcom {
            upcom.push(instrument);
        } else {
            listed.push(instrument);
        }
    }

    if scope == MarketScope::Core && !upcom.is_empty() {
        let before = upcom.len();
        // Stable sort: absent liquidity ranks below every present value and
        // keeps input order among itself, so the cap degrades to
        // first-N-in-input-order when no instrument carries the metric.
        upcom.sort_by(|a, b| match (a.liquidity, b.liquidity) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        upcom.truncate(settings.upcom_max_symbols);
        if upcom.len() < before {
            tracing::info!(
                kept = upcom.len(),
                dropped = before - upcom.len(),
                cap = settings.upcom_max_symbols,
                "UPCOM contingent truncated"
            );
        }
    }

    let mut seen = std::collections::HashSet::new();
    listed
        .into_iter()
        .chain(upcom)
        .filter_map(|i| seen.insert(i.symbol.clone()).then(|| i.symbol.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(symbol: &str, exchange: Exchange, liquidity: Option<f64>) -> InstrumentRecord {
        InstrumentRecord {
            symbol: symbol.to_string(),
            exchange,
            is_etf: false,
            is_suspended: false,
            liquidity,
        }
    }

    fn snapshot(instruments: Vec<InstrumentRecord>) -> UniverseSnapshot {
        UniverseSnapshot::new(NaiveDate::from_ymd_opt(2026, 8, 7).unwrap(), instruments)
    }

    fn settings(cap: usize) -> ScopeSettings {
        ScopeSettings {
            upcom_max_symbols: cap,
            include_exchanges: None,
        }
    }

    #[test]
    fn hsx_only_keeps_primary_board_in_input_order() {
        let snap = snapshot(vec![
            record("BBB", Exchange::Hsx, None),
            record("SHS", Exchange::Hnx, None),
            record("AAA", Exchange::Hsx, None),
            record("UPC", Exchange::Upcom, None),
        ]);
        let result = apply_scope(&snap, MarketScope::HsxOnly, &settings(50));
        assert_eq!(result, vec!["BBB", "AAA"]);
    }

    #[test]
    fn core_ranks_upcom_by_liquidity_descending() {
        let snap = snapshot(vec![
            record("VNM", Exchange::Hsx, Some(9.0)),
            record("UP1", Exchange::Upcom, Some(10.0)),
            record("UP2", Exchange::Upcom, Some(30.0)),
            record("UP3", Exchange::Upcom, None),
            record("UP4", Exchange::Upcom, Some(20.0)),
        ]);
        let result = apply_scope(&snap, MarketScope::Core, &settings(3));
        assert_eq!(result, vec!["VNM", "UP2", "UP4", "UP1"]);
    }

    #[test]
    fn core_never_exceeds_upcom_cap() {
        let instruments: Vec<InstrumentRecord> = (0..500)
            .map(|i| record(&format!("U{i:03}"), Exchange::Upcom, Some(i as f64)))
            .collect();
        let result = apply_scope(&snapshot(instruments), MarketScope::Core, &settings(50));
        assert_eq!(result.len(), 50);
        // Highest liquidity first.
        assert_eq!(result[0], "U499");
    }

    #[test]
    fn missing_liquidity_everywhere_degrades_to_first_n_input_order() {
        let snap = snapshot(vec![
            record("UP1", Exchange::Upcom, None),
            record("UP2", Exchange::Upcom, None),
            record("UP3", Exchange::Upcom, None),
            record("UP4", Exchange::Upcom, None),
        ]);
        let result = apply_scope(&snap, MarketScope::Core, &settings(2));
        assert_eq!(result, vec!["UP1", "UP2"]);
    }

    #[test]
    fn all_scope_applies_no_cap() {
        let instruments: Vec<InstrumentRecord> = (0..100)
            .map(|i| record(&format!("U{i:03}"), Exchange::Upcom, None))
            .collect();
        let result = apply_scope(&snapshot(instruments), MarketScope::All, &settings(10));
        assert_eq!(result.len(), 100);
    }

    #[test]
    fn repeated_calls_are_deterministic() {
        let snap = snapshot(vec![
            record("UP1", Exchange::Upcom, Some(5.0)),
            record("UP2", Exchange::Upcom, Some(5.0)),
            record("UP3", Exchange::Upcom, None),
            record("VNM", Exchange::Hsx, None),
        ]);
        let first = apply_scope(&snap, MarketScope::Core, &settings(2));
        for _ in 0..10 {
            assert_eq!(apply_scope(&snap, MarketScope::Core, &settings(2)), first);
        }
        // Equal liquidity keeps input order (stable sort).
        assert_eq!(first, vec!["VNM", "UP1", "UP2"]);
    }

    #[test]
    fn empty_exchange_override_yields_empty_run() {
        let snap = snapshot(vec![record("VNM", Exchange::Hsx, None)]);
        let s = ScopeSettings {
            upcom_max_symbols: 50,
            include_exchanges: Some(vec![]),
        };
        assert!(apply_scope(&snap, MarketScope::All, &s).is_empty());
    }

    #[test]
    fn duplicate_symbols_keep_first_occurrence() {
        let snap = snapshot(vec![
            record("VNM", Exchange::Hsx, None),
            record("VNM", Exchange::Hsx, None),
            record("SHS", Exchange::Hnx, None),
        ]);
        let result = apply_scope(&snap, MarketScope::All, &settings(50));
        assert_eq!(result, vec!["VNM", "SHS"]);
    }
}
