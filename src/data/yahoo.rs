//! Yahoo Finance chart adapter for daily bars.
//!
//! Uses the public `v8/finance/chart` endpoint. Rows with a missing OHLC value
//! are dropped; a trailing duplicate date (the live session bar) replaces the
//! earlier row.
//!
//! When the payload carries an `adjclose` series, every bar's OHLC is scaled
//! by `adjclose / close` so splits and dividends do not show up as returns.
//! Volume is left as traded.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::debug;

use super::provider::{FetchError, PriceSeriesStore};
use super::rate_limiter::RateLimiter;
use super::{Bar, PriceSeries};
use crate::config::DataSourceConfig;

// ============================================================================
// Constants
// ============================================================================

const CHART_ENDPOINT: &str = "/v8/finance/chart";

const USER_AGENT: &str = concat!("zero-screener/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
    #[serde(default)]
    adjclose: Vec<ChartAdjClose>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartAdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

// ============================================================================
// Store
// ============================================================================

/// Daily price history over HTTP.
pub struct YahooChartStore {
    client: reqwest::Client,
    base_url: String,
    rate_limiter: Arc<RateLimiter>,
}

impl YahooChartStore {
    pub fn new(config: &DataSourceConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Transient(format!("Failed to build HTTP client: {}", e)))?;

        let rate_limiter = Arc::new(RateLimiter::new("yahoo", config.rate_limit_rpm));
        debug!(
            rpm = config.rate_limit_rpm,
            burst = rate_limiter.capacity(),
            "Chart store rate limiter ready"
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            rate_limiter,
        })
    }

    fn chart_url(&self, ticker: &str, lookback_days: u32) -> String {
        let now = Utc::now();
        let start = now - chrono::Duration::days(i64::from(lookback_days));
        // Yahoo spells share classes with a dash (BRK.B -> BRK-B).
        format!(
            "{}{}/{}?period1={}&period2={}&interval=1d",
            self.base_url,
            CHART_ENDPOINT,
            ticker.replace('.', "-"),
            start.timestamp(),
            now.timestamp()
        )
    }
}

#[async_trait]
impl PriceSeriesStore for YahooChartStore {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch(&self, ticker: &str, lookback_days: u32) -> Result<PriceSeries, FetchError> {
        let url = self.chart_url(ticker, lookback_days);

        self.rate_limiter.acquire().await;
        debug!(url = %url, ticker, "Fetching daily chart");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Transient("Request timeout".into())
            } else if e.is_connect() {
                FetchError::Transient("Connection failed".into())
            } else {
                FetchError::Transient(e.to_string())
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(ticker.to_string()));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(FetchError::Transient(format!("HTTP {}", status)));
        }
        if !status.is_success() {
            return Err(FetchError::Malformed(format!("HTTP {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transient(format!("Failed to read body: {}", e)))?;

        parse_chart(ticker, &body)
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Turn a chart payload into a validated series.
fn parse_chart(ticker: &str, body: &str) -> Result<PriceSeries, FetchError> {
    let response: ChartResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::Malformed(format!("Failed to parse chart: {}", e)))?;

    if let Some(err) = response.chart.error {
        if err.code.eq_ignore_ascii_case("not found")
            || err.description.contains("No data found")
        {
            return Err(FetchError::NotFound(ticker.to_string()));
        }
        return Err(FetchError::Transient(format!("{}: {}", err.code, err.description)));
    }

    let result = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| FetchError::NotFound(ticker.to_string()))?;
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let adjusted = result.indicators.adjclose.into_iter().next().map(|a| a.adjclose);

    let mut bars: Vec<Bar> = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let Some(date) = to_date(*ts) else {
            continue;
        };
        let (Some(Some(open)), Some(Some(high)), Some(Some(low)), Some(Some(close))) = (
            quote.open.get(i),
            quote.high.get(i),
            quote.low.get(i),
            quote.close.get(i),
        ) else {
            continue;
        };

        let factor = match &adjusted {
            Some(adj) => match adj.get(i) {
                Some(Some(adj_close)) => adj_close / close,
                _ => continue,
            },
            None => 1.0,
        };

        let bar = Bar {
            date,
            open: open * factor,
            high: high * factor,
            low: low * factor,
            close: close * factor,
            volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
        };

        match bars.last_mut() {
            Some(last) if last.date == date => *last = bar,
            _ => bars.push(bar),
        }
    }

    if bars.is_empty() {
        return Err(FetchError::NotFound(ticker.to_string()));
    }

    PriceSeries::new(ticker, bars).map_err(|e| FetchError::Malformed(e.to_string()))
}

fn to_date(ts: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp(ts, 0).map(|dt| dt.date_naive())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-01-02, 2024-01-03, 2024-01-04 at 14:30 UTC
    const SAMPLE: &str = r#"{
        "chart": {
            "result": [{
                "timestamp": [1704205800, 1704292200, 1704378600],
                "indicators": {
                    "quote": [{
                        "open":   [100.0, null, 102.0],
                        "high":   [101.0, 103.0, 104.0],
                        "low":    [99.0, 100.5, 101.0],
                        "close":  [100.5, 102.5, 103.0],
                        "volume": [1000, 1500, null]
                    }]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_parse_chart_drops_incomplete_rows() {
        let series = parse_chart("AAA", SAMPLE).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.bars()[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(series.bars()[1].close, 103.0);
        assert_eq!(series.bars()[1].volume, 0);
    }

    #[test]
    fn test_parse_chart_not_found() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        assert_eq!(
            parse_chart("GONE", body).unwrap_err(),
            FetchError::NotFound("GONE".into())
        );
    }

    #[test]
    fn test_parse_chart_other_api_error_is_transient() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Internal","description":"try later"}}}"#;
        assert!(parse_chart("AAA", body).unwrap_err().is_recoverable());
    }

    #[test]
    fn test_parse_chart_malformed() {
        assert!(matches!(
            parse_chart("AAA", "<html>").unwrap_err(),
            FetchError::Malformed(_)
        ));
    }

    #[test]
    fn test_parse_chart_collapses_duplicate_dates() {
        let body = r#"{"chart":{"result":[{
            "timestamp": [1704205800, 1704222000],
            "indicators": {"quote": [{
                "open": [1.0, 1.0], "high": [1.0, 2.0], "low": [1.0, 1.0],
                "close": [1.0, 1.5], "volume": [10, 20]
            }]}
        }],"error":null}}"#;
        let series = parse_chart("AAA", body).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.bars()[0].close, 1.5);
    }

    #[test]
    fn test_parse_chart_applies_split_adjustment() {
        // 2:1 split between the two sessions; adjclose restates the first day
        let body = r#"{"chart":{"result":[{
            "timestamp": [1704205800, 1704292200],
            "indicators": {
                "quote": [{
                    "open": [198.0, 100.0], "high": [202.0, 101.0], "low": [196.0, 99.0],
                    "close": [200.0, 100.0], "volume": [500, 1000]
                }],
                "adjclose": [{"adjclose": [100.0, 100.0]}]
            }
        }],"error":null}}"#;
        let series = parse_chart("SPLT", body).unwrap();
        let bars = series.bars();

        assert_eq!(bars[0].close, 100.0);
        assert_eq!(bars[0].open, 99.0);
        assert_eq!(bars[0].high, 101.0);
        assert_eq!(bars[0].volume, 500);
        assert_eq!(bars[1].change_from(&bars[0]), 0.0);
    }

    #[test]
    fn test_parse_chart_drops_rows_without_adjclose() {
        let body = r#"{"chart":{"result":[{
            "timestamp": [1704205800, 1704292200],
            "indicators": {
                "quote": [{
                    "open": [10.0, 10.0], "high": [10.0, 10.0], "low": [10.0, 10.0],
                    "close": [10.0, 10.0], "volume": [1, 1]
                }],
                "adjclose": [{"adjclose": [9.5, null]}]
            }
        }],"error":null}}"#;
        let series = parse_chart("AAA", body).unwrap();
        assert_eq!(series.len(), 1);
        assert!((series.bars()[0].close - 9.5).abs() < 1e-12);
    }

    #[test]
    fn test_chart_url_uses_dash_share_class() {
        let store = YahooChartStore::new(&DataSourceConfig::default()).unwrap();
        let url = store.chart_url("BRK.B", 90);
        assert!(url.starts_with("https://query1.finance.yahoo.com/v8/finance/chart/BRK-B?"));
        assert!(url.ends_with("&interval=1d"));
    }
}
