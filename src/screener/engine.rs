//! Screener engine module.
//!
//! The central orchestrator for a daily screening run.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use futures::{FutureExt, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ScreenerConfig;
use crate::data::{FetchError, PriceSeriesStore, UniverseSource};
use crate::error::{ScreenError, SkipReason};

use super::indicators::IndicatorEngine;
use super::ranker::{RankedResult, Ranker};
use super::scoring::{ScoredTicker, Scorer};

// ============================================================================
// Screener Run
// ============================================================================

/// A ticker left out of the ranking, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedTicker {
    pub ticker: String,
    pub reason: SkipReason,
}

/// Outcome of one completed run.
#[derive(Debug, Clone, Serialize)]
pub struct ScreenerRun {
    /// Run ID (date-based)
    pub id: String,
    pub run_date: NaiveDate,
    /// Top-N tickers in ranking order
    pub ranked: RankedResult,
    /// Tickers in the universe
    pub universe_size: usize,
    /// Tickers that produced a score
    pub scored_count: usize,
    /// Tickers excluded, in universe order
    pub skipped: Vec<SkippedTicker>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_secs: f64,
}

impl ScreenerRun {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Summary string for logging.
    pub fn summary(&self) -> String {
        format!(
            "Screened {} tickers in {:.1}s: {} scored, {} skipped, top {} kept",
            self.universe_size,
            self.duration_secs,
            self.scored_count,
            self.skipped_count(),
            self.ranked.len()
        )
    }
}

// ============================================================================
// Screener Engine
// ============================================================================

/// The daily screener engine.
///
/// Pipeline:
/// 1. Load the universe (fatal on failure)
/// 2. For each ticker, with bounded concurrency: fetch → indicators → score
/// 3. Rank the scored tickers and keep the top N
pub struct ScreenerEngine<U: UniverseSource + ?Sized, S: PriceSeriesStore + ?Sized> {
    universe: Arc<U>,
    store: Arc<S>,
    indicators: IndicatorEngine,
    scorer: Scorer,
    ranker: Ranker,
    lookback_days: u32,
    fetch_timeout: Duration,
    concurrency: usize,
}

impl<U: UniverseSource + ?Sized, S: PriceSeriesStore + ?Sized> ScreenerEngine<U, S> {
    pub fn new(config: &ScreenerConfig, universe: Arc<U>, store: Arc<S>) -> Self {
        Self {
            universe,
            store,
            indicators: IndicatorEngine::new(config.windows),
            scorer: Scorer::new(&config.scoring),
            ranker: Ranker::new(config.top_n),
            lookback_days: config.lookback_days,
            fetch_timeout: Duration::from_secs(config.data_source.timeout_secs),
            concurrency: config.data_source.concurrency.max(1),
        }
    }

    /// Run one screen for `run_date`.
    ///
    /// Only a universe failure is an error; per-ticker failures end up in
    /// [`ScreenerRun::skipped`].
    pub async fn run(&self, run_date: NaiveDate) -> Result<ScreenerRun, ScreenError> {
        let started_at = Utc::now();
        let id = format!("screen_{}", run_date.format("%Y%m%d"));

        info!(
            run_id = %id,
            universe = self.universe.name(),
            store = self.store.name(),
            strategy = %self.scorer.strategy(),
            "Starting daily screen"
        );

        let tickers = self
            .universe
            .load()
            .await
            .map_err(|e| ScreenError::UniverseUnavailable(format!("{:#}", e)))?;
        if tickers.is_empty() {
            return Err(ScreenError::UniverseUnavailable("universe is empty".into()));
        }
        info!(count = tickers.len(), "Universe loaded");

        // `buffered` keeps universe order, so full ties rank deterministically.
        let outcomes: Vec<(String, Result<ScoredTicker, SkipReason>)> =
            futures::stream::iter(tickers.iter().cloned())
                .map(|ticker| async move {
                    let outcome = self.evaluate_isolated(&ticker).await;
                    (ticker, outcome)
                })
                .buffered(self.concurrency)
                .collect()
                .await;

        let mut scored = Vec::with_capacity(outcomes.len());
        let mut skipped = Vec::new();
        for (ticker, outcome) in outcomes {
            match outcome {
                Ok(s) => scored.push(s),
                Err(reason) => {
                    if matches!(reason, SkipReason::InsufficientHistory { .. }) {
                        debug!(ticker = %ticker, reason = %reason, "Skipping ticker");
                    } else {
                        warn!(ticker = %ticker, reason = %reason, "Skipping ticker");
                    }
                    skipped.push(SkippedTicker { ticker, reason });
                }
            }
        }

        let scored_count = scored.len();
        let ranked = self.ranker.rank(run_date, scored);

        let completed_at = Utc::now();
        let duration_secs = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;

        let run = ScreenerRun {
            id,
            run_date,
            ranked,
            universe_size: tickers.len(),
            scored_count,
            skipped,
            started_at,
            completed_at,
            duration_secs,
        };

        info!(
            run_id = %run.id,
            scored = run.scored_count,
            skipped = run.skipped_count(),
            kept = run.ranked.len(),
            duration = format!("{:.1}s", duration_secs),
            "Daily screen complete"
        );

        Ok(run)
    }

    /// Evaluate one ticker, turning a panic into a processing skip.
    async fn evaluate_isolated(&self, ticker: &str) -> Result<ScoredTicker, SkipReason> {
        AssertUnwindSafe(self.evaluate(ticker))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(SkipReason::Processing("indicator computation panicked".into())))
    }

    /// Fetch, compute and score a single ticker.
    pub async fn evaluate(&self, ticker: &str) -> Result<ScoredTicker, SkipReason> {
        let series = tokio::time::timeout(
            self.fetch_timeout,
            self.store.fetch(ticker, self.lookback_days),
        )
        .await
        .unwrap_or_else(|_| Err(FetchError::Timeout(self.fetch_timeout.as_secs())))
        .map_err(|e| {
            debug!(ticker, retryable = e.is_recoverable(), error = %e, "Fetch failed");
            e
        })?;

        let indicators = self.indicators.compute(&series)?;
        if !indicators.is_finite() {
            return Err(SkipReason::Processing("non-finite indicator value".into()));
        }

        let scored = self.scorer.score_ticker(ticker, indicators);
        if !scored.score.is_finite() {
            return Err(SkipReason::Processing(format!("non-finite score {}", scored.score)));
        }

        debug!(ticker, score = scored.score, bars = series.len(), "Ticker scored");
        Ok(scored)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Bar, PriceSeries, StaticUniverse};
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use std::collections::HashMap;

    struct MapStore {
        series: HashMap<String, Vec<f64>>,
    }

    #[async_trait]
    impl PriceSeriesStore for MapStore {
        fn name(&self) -> &'static str {
            "map"
        }

        async fn fetch(&self, ticker: &str, _lookback_days: u32) -> Result<PriceSeries, FetchError> {
            let closes = self
                .series
                .get(ticker)
                .ok_or_else(|| FetchError::NotFound(ticker.to_string()))?;
            let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
            let bars = closes
                .iter()
                .enumerate()
                .map(|(i, &close)| Bar {
                    date: start + ChronoDuration::days(i as i64),
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: 1_000,
                })
                .collect();
            PriceSeries::new(ticker, bars).map_err(|e| FetchError::Malformed(e.to_string()))
        }
    }

    fn engine(series: &[(&str, Vec<f64>)]) -> ScreenerEngine<StaticUniverse, MapStore> {
        let universe = StaticUniverse::new(series.iter().map(|(t, _)| *t).chain(["MISSING"]));
        let store = MapStore {
            series: series
                .iter()
                .map(|(t, c)| (t.to_string(), c.clone()))
                .collect(),
        };
        ScreenerEngine::new(&ScreenerConfig::default(), Arc::new(universe), Arc::new(store))
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    #[tokio::test]
    async fn test_run_scores_and_skips() {
        let engine = engine(&[
            ("UP", vec![100.0, 110.0]),
            ("FLAT", vec![100.0, 100.0]),
            ("SHORT", vec![100.0]),
        ]);
        let run = engine.run(date()).await.unwrap();

        assert_eq!(run.universe_size, 4);
        assert_eq!(run.scored_count, 2);
        assert_eq!(run.skipped_count(), 2);
        assert_eq!(run.ranked.entries[0].ticker, "UP");
        assert_eq!(run.skipped[0].ticker, "SHORT");
        assert!(matches!(run.skipped[0].reason, SkipReason::InsufficientHistory { .. }));
        assert!(matches!(run.skipped[1].reason, SkipReason::DataUnavailable(_)));
        assert!(run.summary().contains("2 scored, 2 skipped"));
    }

    #[tokio::test]
    async fn test_empty_universe_is_fatal() {
        let engine = ScreenerEngine::new(
            &ScreenerConfig::default(),
            Arc::new(StaticUniverse::new(Vec::<String>::new())),
            Arc::new(MapStore {
                series: HashMap::new(),
            }),
        );
        let err = engine.run(date()).await.unwrap_err();
        assert!(matches!(err, ScreenError::UniverseUnavailable(_)));
    }

    #[tokio::test]
    async fn test_evaluate_single_ticker() {
        let engine = engine(&[("UP", vec![100.0, 104.0])]);
        let scored = engine.evaluate("UP").await.unwrap();
        // 0.4*4 plus 0.2 * raw volume of 1000 on a two-bar history
        assert!((scored.score - 201.6).abs() < 1e-9);
    }
}
