//! Daily OHLCV collection.
//!
//! The concrete per-symbol extraction the scheduler fans out: fetch the
//! daily history, clean it, export it as CSV. Failures stay per-symbol and
//! land in the run summary.

use crate::backoff::BackoffPolicy;
use crate::config::PipelineConfig;
use crate::export::CsvExporter;
use crate::scheduler::ExtractionScheduler;
use crate::summary::RunSummary;
use chrono::NaiveDate;
use mdp_core::{DailyBar, ExtractionError};
use mdp_data::MarketDataSource;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Run daily-bar extraction for the resolved symbol list.
pub async fn collect_ohlcv(
    config: &PipelineConfig,
    source: Arc<dyn MarketDataSource>,
    symbols: Vec<String>,
    cancel: CancellationToken,
    today: NaiveDate,
) -> RunSummary {
    let (start, end) = date_range(config, today);
    tracing::info!(
        symbols = symbols.len(),
        start = %start,
        end = %end,
        concurrency = config.extraction.concurrency_limit,
        "starting OHLCV collection"
    );

    let exporter = Arc::new(CsvExporter::new(&config.output_dir));
    let scheduler = ExtractionScheduler::new(
        config.extraction.concurrency_limit,
        config.extraction.max_retries,
        BackoffPolicy {
            base: config.extraction.retry_base_delay,
            max: config.extraction.retry_max_delay,
            ..BackoffPolicy::default()
        },
    )
    .with_cancellation(cancel)
    .with_grace(config.extraction.cancel_grace);

    let summary = scheduler
        .run(symbols, move |symbol| {
            let source = Arc::clone(&source);
            let exporter = Arc::clone(&exporter);
            async move {
                let bars = source.fetch_daily_bars(&symbol, start, end).await?;
                let cleaned = clean_bars(bars);
                if cleaned.is_empty() {
                    return Err(ExtractionError::NoData(symbol));
                }
                let path = exporter
                    .write_symbol(&symbol, &cleaned)
                    .map_err(|e| ExtractionError::Storage(e.to_string()))?;
                tracing::debug!(symbol = %symbol, rows = cleaned.len(), path = %path.display(), "symbol exported");
                Ok(cleaned.len())
            }
        })
        .await;

    summary.log_summary("ohlcv collection");
    summary
}

/// Extraction date range: configured bounds, defaulting to the year up to
/// the run date.
fn date_range(config: &PipelineConfig, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let end = config.end_date.unwrap_or(today);
    let start = config
        .start_date
        .unwrap_or_else(|| end - chrono::Duration::days(365));
    (start, end)
}

/// Normalize fetched bars: drop non-positive closes, dedupe by date keeping
/// the last observation, sort ascending.
fn clean_bars(mut bars: Vec<DailyBar>) -> Vec<DailyBar> {
    bars.retain(|b| b.close > 0.0);
    // Keep the last row per date: later rows win, as upstream corrections
    // are appended.
    bars.sort_by_key(|b| b.date);
    let mut cleaned: Vec<DailyBar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match cleaned.last_mut() {
            Some(last) if last.date == bar.date => *last = bar,
            _ => cleaned.push(bar),
        }
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExtractionConfig, RunMode};
    use async_trait::async_trait;
    use mdp_core::{Exchange, InstrumentRecord, MarketScope, ScopeSettings};
    use mdp_data::{DataError, ScanFilters};
    use std::time::Duration;

    fn bar(date: &str, close: f64) -> DailyBar {
        DailyBar {
            date: date.parse().unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 100,
        }
    }

    #[test]
    fn clean_bars_drops_dedupes_and_sorts() {
        let cleaned = clean_bars(vec![
            bar("2026-08-07", 10.0),
            bar("2026-08-05", 0.0),
            bar("2026-08-06", 9.0),
            bar("2026-08-06", 9.5),
        ]);
        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned[0].date, "2026-08-06".parse().unwrap());
        assert_eq!(cleaned[0].close, 9.5);
        assert_eq!(cleaned[1].date, "2026-08-07".parse().unwrap());
    }

    struct BarsSource;

    #[async_trait]
    impl MarketDataSource for BarsSource {
        async fn list_instruments(
            &self,
            _exchanges: &[Exchange],
        ) -> Result<Vec<InstrumentRecord>, DataError> {
            Ok(vec![])
        }

        async fn fetch_daily_bars(
            &self,
            symbol: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<DailyBar>, ExtractionError> {
            match symbol {
                "EMPTY" => Ok(vec![]),
                _ => Ok(vec![bar("2026-08-06", 10.0), bar("2026-08-07", 10.5)]),
            }
        }
    }

    fn config(dir: &tempfile::TempDir) -> PipelineConfig {
        PipelineConfig {
            mode: RunMode::Manual,
            scope: MarketScope::All,
            manual_symbols: vec![],
            fallback_symbols: vec![],
            exchanges: Exchange::all().to_vec(),
            filters: ScanFilters::default(),
            scope_settings: ScopeSettings::default(),
            force_refresh: false,
            cache_dir: dir.path().join("cache"),
            output_dir: dir.path().join("out"),
            start_date: None,
            end_date: None,
            extraction: ExtractionConfig {
                concurrency_limit: 2,
                max_retries: 1,
                request_timeout: Duration::from_secs(5),
                retry_base_delay: Duration::ZERO,
                retry_max_delay: Duration::ZERO,
                cancel_grace: Duration::ZERO,
            },
            vci_base_url: None,
            rejected_log_limit: 10,
        }
    }

    #[tokio::test]
    async fn collection_exports_and_accounts_every_symbol() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&dir);
        let symbols = vec!["VNM".to_string(), "EMPTY".to_string(), "FPT".to_string()];

        let summary = collect_ohlcv(
            &cfg,
            Arc::new(BarsSource),
            symbols,
            CancellationToken::new(),
            "2026-08-07".parse().unwrap(),
        )
        .await;

        assert_eq!(summary.total_requested, 3);
        assert_eq!(summary.succeeded.len(), 2);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].symbol, "EMPTY");
        assert!(summary.failures[0].error.contains("no data"));

        assert!(dir.path().join("out/VNM.csv").exists());
        assert!(dir.path().join("out/FPT.csv").exists());
        assert!(!dir.path().join("out/EMPTY.csv").exists());
    }

    #[test]
    fn date_range_defaults_to_trailing_year() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&dir);
        let today: NaiveDate = "2026-08-07".parse().unwrap();
        let (start, end) = date_range(&cfg, today);
        assert_eq!(end, today);
        assert_eq!(end - start, chrono::Duration::days(365));
    }
}
