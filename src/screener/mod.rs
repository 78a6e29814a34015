//! Daily Technical Screener Module.
//!
//! Scores every ticker of a universe from its recent daily bars and keeps
//! the top N.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Daily screen pipeline                          │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │                                                                     │
//! │  ┌─────────────┐     ┌─────────────┐     ┌─────────────┐           │
//! │  │  Universe   │────▶│ PriceSeries │────▶│  Indicator  │           │
//! │  │  Source     │     │   Store     │     │   Engine    │           │
//! │  └─────────────┘     └─────────────┘     └──────┬──────┘           │
//! │                        (per ticker, bounded     │                   │
//! │                         concurrency)            ▼                   │
//! │  ┌─────────────┐     ┌─────────────┐     ┌─────────────┐           │
//! │  │   Report    │◀────│   Ranker    │◀────│   Scorer    │           │
//! │  │   Sink      │     │  (top N)    │     │             │           │
//! │  └─────────────┘     └─────────────┘     └─────────────┘           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use zero_screener::screener::{publish, FileReportSink, ScreenerEngine};
//!
//! let engine = ScreenerEngine::new(&config, universe, store);
//! let run = engine.run(run_date).await?;
//!
//! let sink = FileReportSink::new(config.report_dir(), config.top_n);
//! let outcome = publish(&sink, &run);
//! ```

pub mod engine;
pub mod indicators;
pub mod ranker;
pub mod report;
pub mod scoring;

pub use engine::{ScreenerEngine, ScreenerRun, SkippedTicker};
pub use indicators::{IndicatorEngine, IndicatorSet, Reading};
pub use ranker::{RankedResult, Ranker};
pub use report::{publish, FileReportSink, ReportOutcome, ReportSink, RunSummary};
pub use scoring::{ScoreBreakdown, ScoreComponent, ScoreLabel, ScoredTicker, Scorer};
