//! Symbol resolution.
//!
//! Resolves the configured symbol source into the concrete ordered list the
//! scheduler will run. The scheduler itself never knows whether the list
//! came from a manual config entry or a live market scan.

use crate::config::{PipelineConfig, RunMode};
use crate::error::{CollectorError, Result};
use chrono::NaiveDate;
use mdp_core::symbol::{normalize_symbols, RejectedSymbol};
use mdp_data::{apply_scope, MarketDataSource, MarketScanner, UniverseCache, UniverseOrigin};
use std::sync::Arc;

/// Where a run's symbol list comes from.
#[derive(Debug, Clone)]
pub enum SymbolSource {
    /// Fixed list from configuration
    Manual(Vec<String>),
    /// Market scan plus scope filter
    Dynamic,
}

impl SymbolSource {
    pub fn from_config(config: &PipelineConfig) -> Self {
        match config.mode {
            RunMode::Manual => Self::Manual(config.manual_symbols.clone()),
            RunMode::Dynamic => Self::Dynamic,
        }
    }
}

/// Build the market scanner from configuration.
pub fn build_scanner(config: &PipelineConfig, source: Arc<dyn MarketDataSource>) -> MarketScanner {
    MarketScanner::new(
        source,
        UniverseCache::new(&config.cache_dir),
        config.exchanges.clone(),
        config.filters,
    )
}

/// Resolve the final symbol list for one run.
///
/// A dynamic-scan failure is fatal unless `fallback_symbols` is configured,
/// in which case the fallback is taken on an explicit, logged branch.
pub async fn resolve_symbols(
    config: &PipelineConfig,
    scanner: &MarketScanner,
    today: NaiveDate,
) -> Result<Vec<String>> {
    match SymbolSource::from_config(config) {
        SymbolSource::Manual(raw) => {
            let symbols = validated(raw, config.rejected_log_limit, "manual list")?;
            tracing::info!(count = symbols.len(), "MANUAL mode - using configured symbol list");
            Ok(symbols)
        }
        SymbolSource::Dynamic => match scanner.get_universe(config.force_refresh, today).await {
            Ok(scanned) => {
                if scanned.origin == UniverseOrigin::StaleCache {
                    tracing::warn!(
                        as_of = %scanned.snapshot.as_of,
                        "running against a stale universe snapshot"
                    );
                }
                let scoped = apply_scope(&scanned.snapshot, config.scope, &config.scope_settings);
                tracing::info!(
                    universe = scanned.snapshot.len(),
                    scoped = scoped.len(),
                    scope = %config.scope,
                    "DYNAMIC mode - universe resolved"
                );
                // A scope mapping to zero exchanges is an allowed degenerate
                // run, distinct from a scan producing only invalid symbols.
                if scoped.is_empty() {
                    tracing::warn!(scope = %config.scope, "scope resolved to an empty symbol set");
                    return Ok(Vec::new());
                }
                match validated(scoped, config.rejected_log_limit, "dynamic scan") {
                    Ok(symbols) => Ok(symbols),
                    Err(err) => manual_fallback(config, &err.to_string()),
                }
            }
            // Without a configured fallback list the scan failure itself
            // propagates; a run must never invent a universe.
            Err(err) if config.fallback_symbols.is_empty() => Err(CollectorError::Data(err)),
            Err(err) => manual_fallback(config, &err.to_string()),
        },
    }
}

/// The explicit manual-fallback branch for a failed dynamic resolution.
fn manual_fallback(config: &PipelineConfig, cause: &str) -> Result<Vec<String>> {
    if config.fallback_symbols.is_empty() {
        return Err(CollectorError::Config(format!(
            "dynamic resolution failed and no fallback symbols configured: {cause}"
        )));
    }
    tracing::warn!(
        cause = cause,
        count = config.fallback_symbols.len(),
        "dynamic resolution failed, falling back to configured manual list"
    );
    validated(
        config.fallback_symbols.clone(),
        config.rejected_log_limit,
        "fallback list",
    )
}

fn validated(raw: Vec<String>, log_limit: usize, origin: &str) -> Result<Vec<String>> {
    let (valid, rejected) = normalize_symbols(raw);
    log_rejected(&rejected, log_limit);
    if valid.is_empty() {
        return Err(CollectorError::Config(format!(
            "no valid symbols in {origin} ({} rejected)",
            rejected.len()
        )));
    }
    Ok(valid)
}

fn log_rejected(rejected: &[RejectedSymbol], limit: usize) {
    for item in rejected.iter().take(limit) {
        tracing::warn!(symbol = %item.symbol, reason = %item.reason, "symbol rejected");
    }
    if rejected.len() > limit {
        tracing::warn!(
            suppressed = rejected.len() - limit,
            "further symbol rejections suppressed"
        );
    }
}
