//! Report generation module for screener results.
//!
//! Two artifacts per run, both named by the run date:
//! - `top{N}_{YYYY-MM-DD}.csv`: one row per ranked ticker
//! - `summary_{YYYY-MM-DD}.txt`: date, count, mean score, mean return
//!
//! Re-running on the same date overwrites both files.

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{error, info};

use super::engine::ScreenerRun;
use super::indicators::Reading;
use super::ranker::RankedResult;
use super::scoring::{ScoreLabel, ScoredTicker};
use crate::config::ScoringStrategy;
use crate::error::{Artifact, SinkWriteError};

// ============================================================================
// Run Summary
// ============================================================================

/// Aggregate figures written to the summary artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub run_date: NaiveDate,
    pub count: usize,
    pub mean_score: Option<f64>,
    pub mean_return_pct: Option<f64>,
    pub scored: usize,
    pub skipped: usize,
    /// Skips caused by missing or short price history
    pub skipped_data: usize,
    /// Skips caused by malformed data or failed computation
    pub skipped_processing: usize,
    pub universe_size: usize,
    pub strategy: ScoringStrategy,
}

impl RunSummary {
    pub fn from_run(run: &ScreenerRun) -> Self {
        let skipped_data = run.skipped.iter().filter(|s| s.reason.is_data_issue()).count();
        Self {
            run_date: run.run_date,
            count: run.ranked.len(),
            mean_score: run.ranked.mean_score(),
            mean_return_pct: run.ranked.mean_return(),
            scored: run.scored_count,
            skipped: run.skipped_count(),
            skipped_data,
            skipped_processing: run.skipped_count() - skipped_data,
            universe_size: run.universe_size,
            strategy: run
                .ranked
                .entries
                .first()
                .map(|e| e.breakdown.strategy)
                .unwrap_or_default(),
        }
    }

    /// Plain-text rendering, one `key: value` per line.
    pub fn render(&self) -> String {
        let fmt_mean = |m: Option<f64>| m.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}", v));

        let mut out = String::new();
        let _ = writeln!(out, "date: {}", self.run_date.format("%Y-%m-%d"));
        let _ = writeln!(out, "count: {}", self.count);
        let _ = writeln!(out, "avg_score: {}", fmt_mean(self.mean_score));
        let _ = writeln!(out, "avg_return_pct: {}", fmt_mean(self.mean_return_pct));
        let _ = writeln!(out, "scored: {}", self.scored);
        let _ = writeln!(out, "skipped: {}", self.skipped);
        let _ = writeln!(out, "skipped_data: {}", self.skipped_data);
        let _ = writeln!(out, "skipped_processing: {}", self.skipped_processing);
        let _ = writeln!(out, "universe: {}", self.universe_size);
        let _ = writeln!(out, "strategy: {}", self.strategy);
        out
    }
}

// ============================================================================
// Table Rendering
// ============================================================================

/// One row of the ranked CSV table. `None` renders as an empty cell.
#[derive(Debug, Serialize)]
struct TableRow<'a> {
    rank: usize,
    ticker: &'a str,
    score: f64,
    return_pct: Option<f64>,
    momentum_pct: Option<f64>,
    volatility_pct: Option<f64>,
    volume_ratio: Option<f64>,
    ma_short: Option<f64>,
    ma_long: Option<f64>,
    volume_ma_short: Option<f64>,
    last_close: f64,
    last_volume: u64,
    label: ScoreLabel,
}

impl<'a> TableRow<'a> {
    fn new(rank: usize, entry: &'a ScoredTicker) -> Self {
        let ind = &entry.indicators;
        Self {
            rank,
            ticker: &entry.ticker,
            score: round(entry.score, 4),
            return_pct: cell(ind.short_term_return_pct, 2),
            momentum_pct: cell(ind.momentum_pct, 2),
            volatility_pct: cell(ind.volatility_pct, 2),
            volume_ratio: cell(ind.volume_ratio, 2),
            ma_short: cell(ind.ma_short, 2),
            ma_long: cell(ind.ma_long, 2),
            volume_ma_short: cell(ind.volume_ma_short, 0),
            last_close: round(ind.last_close, 4),
            last_volume: ind.last_volume,
            label: entry.breakdown.label,
        }
    }
}

fn round(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn cell(reading: Reading, decimals: i32) -> Option<f64> {
    reading.get().map(|v| round(v, decimals))
}

/// Write the ranked result as CSV, header first.
pub fn write_table<W: std::io::Write>(ranked: &RankedResult, out: W) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for (i, entry) in ranked.entries.iter().enumerate() {
        writer.serialize(TableRow::new(i + 1, entry))?;
    }
    // serde-driven headers are only emitted with the first row
    if ranked.is_empty() {
        writer.write_record(TABLE_COLUMNS)?;
    }
    writer.flush()?;
    Ok(())
}

const TABLE_COLUMNS: [&str; 13] = [
    "rank",
    "ticker",
    "score",
    "return_pct",
    "momentum_pct",
    "volatility_pct",
    "volume_ratio",
    "ma_short",
    "ma_long",
    "volume_ma_short",
    "last_close",
    "last_volume",
    "label",
];

// ============================================================================
// Report Sink
// ============================================================================

/// Destination for the two run artifacts. The run date is passed explicitly
/// and is the only input to artifact naming.
pub trait ReportSink: Send + Sync {
    fn write_table(
        &self,
        run_date: NaiveDate,
        ranked: &RankedResult,
    ) -> Result<PathBuf, SinkWriteError>;

    fn write_summary(
        &self,
        run_date: NaiveDate,
        summary: &RunSummary,
    ) -> Result<PathBuf, SinkWriteError>;
}

/// Writes artifacts into a directory.
pub struct FileReportSink {
    dir: PathBuf,
    top_n: usize,
}

impl FileReportSink {
    pub fn new(dir: impl Into<PathBuf>, top_n: usize) -> Self {
        Self {
            dir: dir.into(),
            top_n,
        }
    }

    pub fn table_path(&self, run_date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("top{}_{}.csv", self.top_n, run_date.format("%Y-%m-%d")))
    }

    pub fn summary_path(&self, run_date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("summary_{}.txt", run_date.format("%Y-%m-%d")))
    }

    fn write<F>(&self, artifact: Artifact, path: PathBuf, write: F) -> Result<PathBuf, SinkWriteError>
    where
        F: FnOnce(std::fs::File) -> std::io::Result<()>,
    {
        let result = ensure_parent(&path)
            .and_then(|_| std::fs::File::create(&path))
            .and_then(write);
        match result {
            Ok(()) => Ok(path),
            Err(source) => Err(SinkWriteError {
                artifact,
                path,
                source,
            }),
        }
    }
}

fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

impl ReportSink for FileReportSink {
    fn write_table(
        &self,
        run_date: NaiveDate,
        ranked: &RankedResult,
    ) -> Result<PathBuf, SinkWriteError> {
        self.write(Artifact::Table, self.table_path(run_date), |file| {
            write_table(ranked, file).map_err(std::io::Error::from)
        })
    }

    fn write_summary(
        &self,
        run_date: NaiveDate,
        summary: &RunSummary,
    ) -> Result<PathBuf, SinkWriteError> {
        self.write(Artifact::Summary, self.summary_path(run_date), |mut file| {
            file.write_all(summary.render().as_bytes())
        })
    }
}

// ============================================================================
// Publishing
// ============================================================================

/// Result of writing both artifacts.
#[derive(Debug)]
pub struct ReportOutcome {
    pub table: Result<PathBuf, SinkWriteError>,
    pub summary: Result<PathBuf, SinkWriteError>,
}

impl ReportOutcome {
    pub fn is_complete(&self) -> bool {
        self.table.is_ok() && self.summary.is_ok()
    }

    /// Artifacts that failed to persist.
    pub fn failures(&self) -> Vec<&SinkWriteError> {
        [&self.table, &self.summary]
            .into_iter()
            .filter_map(|r| r.as_ref().err())
            .collect()
    }
}

/// Write both artifacts. A failure on one does not stop the other.
pub fn publish(sink: &dyn ReportSink, run: &ScreenerRun) -> ReportOutcome {
    let summary = RunSummary::from_run(run);

    let outcome = ReportOutcome {
        table: sink.write_table(run.run_date, &run.ranked),
        summary: sink.write_summary(run.run_date, &summary),
    };

    for (artifact, result) in [(Artifact::Table, &outcome.table), (Artifact::Summary, &outcome.summary)] {
        match result {
            Ok(path) => info!(%artifact, path = %path.display(), "Report written"),
            Err(e) => error!(%artifact, error = %e, "Failed to write report"),
        }
    }

    outcome
}

// ============================================================================
// Tests
// ============================================================================
