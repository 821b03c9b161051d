//! Environment-driven pipeline configuration.
//!
//! All keys use the `MDP_` prefix. Values with a safe default fall back to
//! it on parse failure; enum-valued keys (mode, scope, exchanges) are
//! validated strictly so a typo fails the run instead of silently changing
//! the universe.

use crate::error::{CollectorError, Result};
use chrono::NaiveDate;
use mdp_core::{Exchange, MarketScope, ScopeSettings};
use mdp_data::ScanFilters;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// How the symbol list is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Scan the market and apply the configured scope
    Dynamic,
    /// Use the configured manual symbol list
    Manual,
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dynamic" => Ok(Self::Dynamic),
            "manual" => Ok(Self::Manual),
            other => Err(format!("unknown run mode: {other}")),
        }
    }
}

/// Extraction scheduler tunables.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Maximum symbols in flight at once
    pub concurrency_limit: usize,
    /// Retry budget per symbol for transient errors
    pub max_retries: u32,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Delay before the first retry
    pub retry_base_delay: Duration,
    /// Upper bound on any retry delay
    pub retry_max_delay: Duration,
    /// Grace given to in-flight attempts on cancellation
    pub cancel_grace: Duration,
}

/// Full pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Symbol source mode
    pub mode: RunMode,
    /// Scope applied in dynamic mode
    pub scope: MarketScope,
    /// Symbol list used in manual mode
    pub manual_symbols: Vec<String>,
    /// Explicit fallback list used when a dynamic scan fails; empty means
    /// scan failure is fatal
    pub fallback_symbols: Vec<String>,
    /// Exchanges covered by universe discovery
    pub exchanges: Vec<Exchange>,
    /// Universe scan filters
    pub filters: ScanFilters,
    /// Scope filter tunables
    pub scope_settings: ScopeSettings,
    /// Skip the same-day cache and fetch live
    pub force_refresh: bool,
    /// Universe cache directory
    pub cache_dir: PathBuf,
    /// Per-symbol output directory
    pub output_dir: PathBuf,
    /// Extraction range start; defaults to one year before the end
    pub start_date: Option<NaiveDate>,
    /// Extraction range end; defaults to the market-local today
    pub end_date: Option<NaiveDate>,
    /// Scheduler tunables
    pub extraction: ExtractionConfig,
    /// Override for the upstream base URL
    pub vci_base_url: Option<String>,
    /// Cap on per-symbol rejection log lines
    pub rejected_log_limit: usize,
}

impl PipelineConfig {
    /// Load configuration from the environment (and `.env` if present).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mode = parse_env("MDP_MODE", RunMode::Dynamic)?;
        let scope = parse_env("MDP_SCOPE", MarketScope::Core)?;
        let exchanges = match std::env::var("MDP_EXCHANGES") {
            Ok(raw) => raw
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| {
                    s.parse::<Exchange>()
                        .map_err(CollectorError::Config)
                })
                .collect::<Result<Vec<_>>>()?,
            Err(_) => Exchange::all().to_vec(),
        };

        Ok(Self {
            mode,
            scope,
            manual_symbols: env_var_list("MDP_SYMBOLS"),
            fallback_symbols: env_var_list("MDP_FALLBACK_SYMBOLS"),
            exchanges,
            filters: ScanFilters {
                exclude_etf: env_var_bool("MDP_EXCLUDE_ETF", true),
                exclude_suspended: env_var_bool("MDP_EXCLUDE_SUSPENDED", true),
            },
            scope_settings: ScopeSettings {
                upcom_max_symbols: env_var_parse("MDP_UPCOM_MAX_SYMBOLS", 50),
                include_exchanges: None,
            },
            force_refresh: env_var_bool("MDP_FORCE_REFRESH", false),
            cache_dir: PathBuf::from(env_var_or("MDP_CACHE_DIR", "data/cache")),
            output_dir: PathBuf::from(env_var_or("MDP_OUTPUT_DIR", "data/processed")),
            start_date: env_var_date("MDP_START_DATE")?,
            end_date: env_var_date("MDP_END_DATE")?,
            extraction: ExtractionConfig {
                concurrency_limit: env_var_parse("MDP_CONCURRENCY", 8),
                max_retries: env_var_parse("MDP_MAX_RETRIES", 3),
                request_timeout: Duration::from_millis(env_var_parse(
                    "MDP_REQUEST_TIMEOUT_MS",
                    10_000,
                )),
                retry_base_delay: Duration::from_millis(env_var_parse(
                    "MDP_RETRY_BASE_DELAY_MS",
                    1_000,
                )),
                retry_max_delay: Duration::from_millis(env_var_parse(
                    "MDP_RETRY_MAX_DELAY_MS",
                    30_000,
                )),
                cancel_grace: Duration::from_millis(env_var_parse("MDP_CANCEL_GRACE_MS", 5_000)),
            },
            vci_base_url: std::env::var("MDP_VCI_BASE_URL").ok(),
            rejected_log_limit: env_var_parse("MDP_REJECTED_LOG_LIMIT", 200),
        })
    }
}

/// Strictly parse an enum-valued key; absence takes the default, garbage is
/// a configuration error.
fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr<Err = String>,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e: String| CollectorError::Config(format!("{key}: {e}"))),
        Err(_) => Ok(default),
    }
}

fn env_var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse with a default on absence or parse failure.
fn env_var_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_var_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

/// Comma-separated list; empty entries dropped.
fn env_var_list(key: &str) -> Vec<String> {
    std::env::var(key)
        .map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn env_var_date(key: &str) -> Result<Option<NaiveDate>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| CollectorError::Config(format!("{key}: expected YYYY-MM-DD, got {raw}"))),
        Err(_) => Ok(None),
    }
}
