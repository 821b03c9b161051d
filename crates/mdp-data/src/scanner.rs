//! Market scanner: universe discovery with cache fallback.
//!
//! Resolution order for a run date:
//! 1. same-day cache snapshot (unless force refresh)
//! 2. live listing fetch, filtered and cached
//! 3. most recent prior snapshot, served stale
//!
//! Only when all three are unavailable does discovery fail; there is no
//! safe default universe.

use crate::cache::UniverseCache;
use crate::error::{DataError, Result};
use crate::provider::MarketDataSource;
use chrono::NaiveDate;
use mdp_core::{Exchange, InstrumentRecord, UniverseSnapshot};
use std::sync::Arc;

/// Inclusion filters applied to a live listing, in fixed order.
#[derive(Debug, Clone, Copy)]
pub struct ScanFilters {
    pub exclude_etf: bool,
    pub exclude_suspended: bool,
}

impl Default for ScanFilters {
    fn default() -> Self {
        Self {
            exclude_etf: true,
            exclude_suspended: true,
        }
    }
}

/// Where a resolved universe came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniverseOrigin {
    /// Same-day cache snapshot, no network call made
    CacheHit,
    /// Fresh upstream listing
    LiveFetch,
    /// Prior-day snapshot served because the live fetch failed
    StaleCache,
}

/// A resolved universe with its provenance.
#[derive(Debug, Clone)]
pub struct ScannedUniverse {
    pub snapshot: UniverseSnapshot,
    pub origin: UniverseOrigin,
}

impl ScannedUniverse {
    /// Whether the snapshot predates the run date.
    pub fn is_stale(&self, today: NaiveDate) -> bool {
        self.snapshot.is_stale(today)
    }
}

/// Discovers the tradeable universe across the configured exchanges.
pub struct MarketScanner {
    source: Arc<dyn MarketDataSource>,
    cache: UniverseCache,
    exchanges: Vec<Exchange>,
    filters: ScanFilters,
}

impl MarketScanner {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        cache: UniverseCache,
        exchanges: Vec<Exchange>,
        filters: ScanFilters,
    ) -> Self {
        Self {
            source,
            cache,
            exchanges,
            filters,
        }
    }

    /// Resolve the universe for the given run date.
    ///
    /// Fails with [`DataError::ScanFailed`] only when the live fetch and
    /// the fallback cache are both unavailable.
    pub async fn get_universe(&self, force_refresh: bool, today: NaiveDate) -> Result<ScannedUniverse> {
        if !force_refresh {
            // A broken cache read is recoverable: log and fall through to
            // the live fetch.
            match self.cache.read(today) {
                Ok(Some(snapshot)) => {
                    tracing::info!(as_of = %snapshot.as_of, count = snapshot.len(), "universe cache hit");
                    return Ok(ScannedUniverse {
                        snapshot,
                        origin: UniverseOrigin::CacheHit,
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "universe cache read failed, fetching live");
                }
            }
        }

        match self.fetch_live(today).await {
            Ok(snapshot) => Ok(ScannedUniverse {
                snapshot,
                origin: UniverseOrigin::LiveFetch,
            }),
            Err(fetch_err) => {
                tracing::warn!(error = %fetch_err, "live universe fetch failed, trying cache fallback");
                match self.cache.read_latest_before_or_on(today) {
                    Ok(Some(snapshot)) => {
                        tracing::warn!(
                            as_of = %snapshot.as_of,
                            count = snapshot.len(),
                            "serving stale universe snapshot"
                        );
                        Ok(ScannedUniverse {
                            snapshot,
                            origin: UniverseOrigin::StaleCache,
                        })
                    }
                    Ok(None) => Err(DataError::ScanFailed {
                        cause: format!("live fetch failed ({fetch_err}) and no cached snapshot exists"),
                    }),
                    Err(cache_err) => Err(DataError::ScanFailed {
                        cause: format!(
                            "live fetch failed ({fetch_err}) and cache fallback failed ({cache_err})"
                        ),
                    }),
                }
            }
        }
    }

    async fn fetch_live(&self, today: NaiveDate) -> Result<UniverseSnapshot> {
        let raw = self.source.list_instruments(&self.exchanges).await?;
        let total = raw.len();
        let instruments = self.apply_filters(raw);
        if instruments.is_empty() {
            return Err(DataError::Fetch(format!(
                "listing returned no instruments after filters ({total} raw rows)"
            )));
        }
        tracing::info!(
            raw = total,
            kept = instruments.len(),
            exchanges = ?self.exchanges,
            "live universe fetched"
        );

        let snapshot = UniverseSnapshot::new(today, instruments);
        // The live result is still good if caching it fails.
        if let Err(e) = self.cache.write(&snapshot) {
            tracing::warn!(error = %e, "failed to cache universe snapshot");
        }
        Ok(snapshot)
    }

    fn apply_filters(&self, raw: Vec<InstrumentRecord>) -> Vec<InstrumentRecord> {
        raw.into_iter()
            .filter(|i| !(self.filters.exclude_etf && i.is_etf))
            .filter(|i| !(self.filters.exclude_suspended && i.is_suspended))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mdp_core::{DailyBar, ExtractionError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted source: serves a fixed listing or a fixed failure, and
    /// counts calls so tests can assert the cache short-circuits.
    struct ScriptedSource {
        listing: std::result::Result<Vec<InstrumentRecord>, String>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn ok(listing: Vec<InstrumentRecord>) -> Self {
            Self {
                listing: Ok(listing),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                listing: Err(message.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MarketDataSource for ScriptedSource {
        async fn list_instruments(&self, _exchanges: &[Exchange]) -> Result<Vec<InstrumentRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.listing
                .clone()
                .map_err(DataError::Fetch)
        }

        async fn fetch_daily_bars(
            &self,
            symbol: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> std::result::Result<Vec<DailyBar>, ExtractionError> {
            Err(ExtractionError::NotFound(symbol.to_string()))
        }
    }

    fn instrument(symbol: &str, exchange: Exchange) -> InstrumentRecord {
        InstrumentRecord::new(symbol, exchange)
    }

    fn today() -> NaiveDate {
        "2026-08-07".parse().unwrap()
    }

    fn scanner_with(
        source: Arc<ScriptedSource>,
        dir: &tempfile::TempDir,
        filters: ScanFilters,
    ) -> MarketScanner {
        MarketScanner::new(
            source,
            UniverseCache::new(dir.path()),
            Exchange::all().to_vec(),
            filters,
        )
    }

    #[tokio::test]
    async fn same_day_cache_hit_skips_network() {
        let dir = tempfile::tempdir().unwrap();
        let cache = UniverseCache::new(dir.path());
        cache
            .write(&UniverseSnapshot::new(
                today(),
                vec![instrument("VNM", Exchange::Hsx)],
            ))
            .unwrap();

        let source = Arc::new(ScriptedSource::ok(vec![instrument("FPT", Exchange::Hsx)]));
        let scanner = scanner_with(source.clone(), &dir, ScanFilters::default());

        let scanned = scanner.get_universe(false, today()).await.unwrap();
        assert_eq!(scanned.origin, UniverseOrigin::CacheHit);
        assert_eq!(scanned.snapshot.symbols(), vec!["VNM"]);
        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test]
    async fn force_refresh_bypasses_same_day_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = UniverseCache::new(dir.path());
        cache
            .write(&UniverseSnapshot::new(
                today(),
                vec![instrument("VNM", Exchange::Hsx)],
            ))
            .unwrap();

        let source = Arc::new(ScriptedSource::ok(vec![instrument("FPT", Exchange::Hsx)]));
        let scanner = scanner_with(source.clone(), &dir, ScanFilters::default());

        let scanned = scanner.get_universe(true, today()).await.unwrap();
        assert_eq!(scanned.origin, UniverseOrigin::LiveFetch);
        assert_eq!(scanned.snapshot.symbols(), vec!["FPT"]);
        assert_eq!(source.call_count(), 1);

        // The refresh replaced the same-day snapshot.
        let reread = cache.read(today()).unwrap().unwrap();
        assert_eq!(reread.symbols(), vec!["FPT"]);
    }

    #[tokio::test]
    async fn live_fetch_applies_filters_and_caches() {
        let dir = tempfile::tempdir().unwrap();
        let mut etf = instrument("FUEVFVND", Exchange::Hsx);
        etf.is_etf = true;
        let mut halted = instrument("HAG", Exchange::Hsx);
        halted.is_suspended = true;

        let source = Arc::new(ScriptedSource::ok(vec![
            instrument("VNM", Exchange::Hsx),
            etf,
            halted,
            instrument("SHS", Exchange::Hnx),
        ]));
        let scanner = scanner_with(source, &dir, ScanFilters::default());

        let scanned = scanner.get_universe(false, today()).await.unwrap();
        assert_eq!(scanned.snapshot.symbols(), vec!["VNM", "SHS"]);

        let cached = UniverseCache::new(dir.path()).read(today()).unwrap().unwrap();
        assert_eq!(cached, scanned.snapshot);
    }

    #[tokio::test]
    async fn filters_can_be_disabled_independently() {
        let dir = tempfile::tempdir().unwrap();
        let mut etf = instrument("FUEVFVND", Exchange::Hsx);
        etf.is_etf = true;
        let mut halted = instrument("HAG", Exchange::Hsx);
        halted.is_suspended = true;

        let source = Arc::new(ScriptedSource::ok(vec![etf, halted]));
        let scanner = scanner_with(
            source,
            &dir,
            ScanFilters {
                exclude_etf: false,
                exclude_suspended: true,
            },
        );

        let scanned = scanner.get_universe(false, today()).await.unwrap();
        assert_eq!(scanned.snapshot.symbols(), vec!["FUEVFVND"]);
    }

    #[tokio::test]
    async fn fetch_failure_with_no_cache_is_scan_failed() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(ScriptedSource::failing("connection refused"));
        let scanner = scanner_with(source, &dir, ScanFilters::default());

        let err = scanner.get_universe(false, today()).await.unwrap_err();
        assert!(matches!(err, DataError::ScanFailed { .. }));
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn fetch_failure_falls_back_to_stale_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let cache = UniverseCache::new(dir.path());
        let yesterday: NaiveDate = "2026-08-06".parse().unwrap();
        let instruments: Vec<InstrumentRecord> = (0..1500)
            .map(|i| instrument(&format!("S{i:03}"), Exchange::Hsx))
            .collect();
        cache
            .write(&UniverseSnapshot::new(yesterday, instruments))
            .unwrap();

        let source = Arc::new(ScriptedSource::failing("timeout"));
        let scanner = scanner_with(source, &dir, ScanFilters::default());

        let scanned = scanner.get_universe(false, today()).await.unwrap();
        assert_eq!(scanned.origin, UniverseOrigin::StaleCache);
        assert_eq!(scanned.snapshot.len(), 1500);
        assert!(scanned.is_stale(today()));
    }

    #[tokio::test]
    async fn empty_post_filter_listing_falls_back_like_a_fetch_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut etf = instrument("FUEVFVND", Exchange::Hsx);
        etf.is_etf = true;

        let source = Arc::new(ScriptedSource::ok(vec![etf]));
        let scanner = scanner_with(source, &dir, ScanFilters::default());

        let err = scanner.get_universe(false, today()).await.unwrap_err();
        assert!(matches!(err, DataError::ScanFailed { .. }));
    }
}
