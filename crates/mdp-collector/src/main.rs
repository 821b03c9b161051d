//! Market data pipeline CLI.

use clap::{Parser, Subcommand};
use mdp_collector::modules::{build_scanner, collect_ohlcv, resolve_symbols};
use mdp_collector::PipelineConfig;
use mdp_core::today_vn;
use mdp_data::{MarketDataSource, VciClient};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mdp-collector")]
#[command(about = "Vietnam market data pipeline", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the universe only and print where it came from
    Scan {
        /// Skip the same-day cache and fetch live
        #[arg(long)]
        force_refresh: bool,
    },

    /// Extract daily bars for specific symbols or the configured source
    Collect {
        /// Only these symbols (comma-separated, e.g. "VNM,FPT")
        #[arg(long)]
        symbols: Option<String>,

        /// Skip the same-day cache and fetch live
        #[arg(long)]
        force_refresh: bool,
    },

    /// Full pipeline: resolve symbols, then extract
    Run {
        /// Skip the same-day cache and fetch live
        #[arg(long)]
        force_refresh: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "mdp_collector={0},mdp_data={0},mdp_core={0}",
                    cli.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = PipelineConfig::from_env()?;
    let today = today_vn();

    let source: Arc<dyn MarketDataSource> = Arc::new(match &config.vci_base_url {
        Some(base) => VciClient::with_base_url(base.as_str(), config.extraction.request_timeout)?,
        None => VciClient::new(config.extraction.request_timeout)?,
    });

    // Ctrl-C stops admitting new symbols; in-flight extractions get the
    // configured grace, and the summary still covers what completed.
    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("shutdown signal received, cancelling run");
            shutdown.cancel();
        }
    });

    match cli.command {
        Commands::Scan { force_refresh } => {
            config.force_refresh |= force_refresh;
            let scanner = build_scanner(&config, Arc::clone(&source));
            let scanned = scanner.get_universe(config.force_refresh, today).await?;
            tracing::info!(
                as_of = %scanned.snapshot.as_of,
                count = scanned.snapshot.len(),
                origin = ?scanned.origin,
                stale = scanned.is_stale(today),
                "universe resolved"
            );
        }
        Commands::Collect {
            symbols,
            force_refresh,
        } => {
            config.force_refresh |= force_refresh;
            if let Some(list) = symbols {
                config.mode = mdp_collector::RunMode::Manual;
                config.manual_symbols = list.split(',').map(|s| s.to_string()).collect();
            }
            run_pipeline(&config, source, cancel, today).await?;
        }
        Commands::Run { force_refresh } => {
            config.force_refresh |= force_refresh;
            run_pipeline(&config, source, cancel, today).await?;
        }
    }

    Ok(())
}

async fn run_pipeline(
    config: &PipelineConfig,
    source: Arc<dyn MarketDataSource>,
    cancel: CancellationToken,
    today: chrono::NaiveDate,
) -> anyhow::Result<()> {
    let scanner = build_scanner(config, Arc::clone(&source));
    let symbols = resolve_symbols(config, &scanner, today).await?;
    let summary = collect_ohlcv(config, source, symbols, cancel, today).await;

    if !summary.failures.is_empty() {
        tracing::warn!(
            failed = summary.failures.len(),
            "run finished with permanent failures"
        );
    }
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
