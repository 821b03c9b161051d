//! VCI market data client.
//!
//! Covers the two endpoints the pipeline needs:
//! - `GET /api/price/symbols/getByGroup?group={board}` - instrument listing
//!   per board
//! - `GET /api/chart/OHLCChart/gap-chart` - daily candles as parallel
//!   arrays

use crate::error::{DataError, Result};
use crate::provider::{classify_reqwest_error, classify_status, listing_error, MarketDataSource};
use async_trait::async_trait;
use chrono::NaiveDate;
use mdp_core::{DailyBar, Exchange, ExtractionError, InstrumentRecord};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://trading.vietcap.com.vn";
const USER_AGENT: &str = "Mozilla/5.0";

/// Ticker prefixes the boards assign to fund certificates; used when the
/// listing omits the instrument type.
const ETF_PREFIXES: [&str; 4] = ["VF", "FUE", "E1VF", "SSV"];

/// Status values that mark an instrument as not tradeable.
const INACTIVE_KEYWORDS: [&str; 5] = ["delist", "inactive", "suspended", "halt", "stop"];

/// HTTP client for the VCI endpoints.
pub struct VciClient {
    client: reqwest::Client,
    base_url: String,
}

impl VciClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout)
    }

    /// Client against a non-default base URL (tests point this at a local
    /// mock server).
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DataError::Fetch(format!("build http client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Listing for one board.
    async fn fetch_board(&self, exchange: Exchange) -> Result<Vec<InstrumentRecord>> {
        #[derive(Deserialize)]
        struct ListingRow {
            symbol: String,
            #[serde(default)]
            board: Option<String>,
            #[serde(rename = "type", default)]
            instrument_type: Option<String>,
            #[serde(default)]
            status: Option<String>,
            #[serde(rename = "avgMatchValue", default)]
            avg_match_value: Option<f64>,
        }

        // VCI still keys HSX by its legacy board name.
        let group = match exchange {
            Exchange::Hsx => "HOSE",
            Exchange::Hnx => "HNX",
            Exchange::Upcom => "UPCOM",
        };

        let response = self
            .client
            .get(format!("{}/api/price/symbols/getByGroup", self.base_url))
            .query(&[("group", group)])
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(listing_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DataError::Fetch(format!(
                "listing for {group} returned {status}"
            )));
        }

        let rows: Vec<ListingRow> = response.json().await.map_err(listing_error)?;

        let instruments = rows
            .into_iter()
            .filter_map(|row| {
                let symbol = row.symbol.trim().to_ascii_uppercase();
                if symbol.is_empty() {
                    return None;
                }
                // Rows may carry their own board name; trust it over the
                // query group when it parses, skip instrument classes the
                // pipeline does not extract (warrants, bonds).
                let exchange = row
                    .board
                    .as_deref()
                    .and_then(|b| b.parse().ok())
                    .unwrap_or(exchange);
                let instrument_type = row
                    .instrument_type
                    .as_deref()
                    .map(|t| t.trim().to_ascii_uppercase());
                match instrument_type.as_deref() {
                    None | Some("STOCK") | Some("ETF") => {}
                    Some(_) => return None,
                }

                // Trust the declared type; fall back to the fund-certificate
                // prefix heuristic only when the listing omits it.
                let is_etf = match instrument_type.as_deref() {
                    Some(t) => t == "ETF",
                    None => ETF_PREFIXES.iter().any(|p| symbol.starts_with(p)),
                };
                let is_suspended = row
                    .status
                    .as_deref()
                    .map(|s| {
                        let s = s.to_ascii_lowercase();
                        INACTIVE_KEYWORDS.iter().any(|k| s.contains(k))
                    })
                    .unwrap_or(false);

                Some(InstrumentRecord {
                    symbol,
                    exchange,
                    is_etf,
                    is_suspended,
                    liquidity: row.avg_match_value,
                })
            })
            .collect();

        Ok(instruments)
    }
}

#[async_trait]
impl MarketDataSource for VciClient {
    async fn list_instruments(&self, exchanges: &[Exchange]) -> Result<Vec<InstrumentRecord>> {
        let mut all = Vec::new();
        for exchange in exchanges {
            let instruments = self.fetch_board(*exchange).await?;
            tracing::debug!(exchange = %exchange, count = instruments.len(), "board listing fetched");
            all.extend(instruments);
        }
        Ok(all)
    }

    async fn fetch_daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> std::result::Result<Vec<DailyBar>, ExtractionError> {
        #[derive(Deserialize)]
        struct ChartResponse {
            t: Vec<i64>,
            o: Vec<f64>,
            h: Vec<f64>,
            l: Vec<f64>,
            c: Vec<f64>,
            v: Vec<u64>,
        }

        let from = start.format("%Y-%m-%d").to_string();
        let to = end.format("%Y-%m-%d").to_string();
        let response = self
            .client
            .get(format!("{}/api/chart/OHLCChart/gap-chart", self.base_url))
            .query(&[
                ("symbol", symbol),
                ("timeFrame", "ONE_DAY"),
                ("from", from.as_str()),
                ("to", to.as_str()),
            ])
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(symbol, status));
        }

        let chart: ChartResponse = response
            .json()
            .await
            .map_err(|e| ExtractionError::Malformed(e.to_string()))?;

        let n = chart.t.len();
        if chart.o.len() != n || chart.h.len() != n || chart.l.len() != n || chart.c.len() != n {
            return Err(ExtractionError::Malformed(format!(
                "ragged candle arrays for {symbol}"
            )));
        }

        let mut bars = Vec::with_capacity(n);
        for i in 0..n {
            let Some(date) = chrono::DateTime::from_timestamp(chart.t[i], 0) else {
                return Err(ExtractionError::Malformed(format!(
                    "bad timestamp {} for {symbol}",
                    chart.t[i]
                )));
            };
            bars.push(DailyBar {
                date: date.date_naive(),
                open: chart.o[i],
                high: chart.h[i],
                low: chart.l[i],
                close: chart.c[i],
                volume: chart.v.get(i).copied().unwrap_or(0),
            });
        }
        Ok(bars)
    }
}
