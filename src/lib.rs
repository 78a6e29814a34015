//! Zero Screener Library
//!
//! Screens a fixed equity universe once a day: computes technical indicators
//! from recent daily bars, scores each ticker, ranks them and writes the
//! top N plus a summary.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    zero-screener (run once)                         │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────┐     │
//! │  │  Market Data    │  │  Screener       │  │  Report         │     │
//! │  │  (universe,     │─▶│  (indicators,   │─▶│  (CSV table,    │     │
//! │  │   daily bars)   │  │   score, rank)  │  │   summary)      │     │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Concepts
//!
//! ## Indicators
//! - Short-term return, 20/60-bar moving averages, 20-bar volume average
//! - 30-bar volatility, 5-bar momentum, volume ratio vs the prior 5 bars
//! - Each value carries an availability flag instead of a silent zero
//!
//! ## Scoring
//! - Weighted composite (default) or a 0-4 boolean rule count
//! - Pure per ticker: no cross-sectional normalization
//!
//! ## Failure Model
//! - Universe failure aborts the run
//! - Per-ticker failures are skipped and counted
//! - Report artifacts are written independently

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod screener;

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::config::ScreenerConfig;
use crate::data::{PriceSeriesStore, UniverseSource, YahooChartStore};
use crate::error::ScreenError;
use crate::screener::{publish, FileReportSink, ReportOutcome, ScreenerEngine, ScreenerRun};

/// Run a complete daily screen with the configured sources and sink.
pub async fn run_daily(config: &ScreenerConfig, run_date: NaiveDate) -> Result<(ScreenerRun, ReportOutcome)> {
    let universe: Arc<dyn UniverseSource> = Arc::from(data::universe::from_config(&config.universe));
    let store: Arc<dyn PriceSeriesStore> =
        Arc::new(YahooChartStore::new(&config.data_source).context("Failed to create price store")?);
    let sink = FileReportSink::new(config.report_dir(), config.top_n);

    run_with(config, run_date, universe, store, &sink).await
}

/// Run a daily screen against explicit collaborators.
///
/// Nothing is written when the universe cannot be loaded.
pub async fn run_with(
    config: &ScreenerConfig,
    run_date: NaiveDate,
    universe: Arc<dyn UniverseSource>,
    store: Arc<dyn PriceSeriesStore>,
    sink: &dyn screener::ReportSink,
) -> Result<(ScreenerRun, ReportOutcome)> {
    let engine = ScreenerEngine::new(config, universe, store);
    let run = engine.run(run_date).await?;
    info!("{}", run.summary());

    let outcome = publish(sink, &run);
    for failure in outcome.failures() {
        warn!(artifact = %failure.artifact, "Report artifact not persisted");
    }

    Ok((run, outcome))
}

/// Drive `work` to completion unless `cancel` resolves first.
///
/// On cancellation `work` is dropped and [`ScreenError::Cancelled`] is
/// returned, so callers exit non-zero without writing anything.
pub async fn run_until_cancelled<T, W, C>(work: W, cancel: C) -> Result<T>
where
    W: Future<Output = Result<T>>,
    C: Future,
{
    tokio::select! {
        result = work => result,
        _ = cancel => {
            warn!("Screen cancelled, no report written");
            Err(ScreenError::Cancelled.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancel_returns_cancelled_error() {
        let result: Result<u32> =
            run_until_cancelled(std::future::pending(), std::future::ready(())).await;

        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScreenError>(),
            Some(ScreenError::Cancelled)
        ));
    }

    #[tokio::test]
    async fn test_completed_work_is_returned() {
        let result = run_until_cancelled(async { Ok(7) }, std::future::pending::<()>()).await;
        assert_eq!(result.unwrap(), 7);
    }
}
