//! Zero Screener - daily technical screen of an equity universe.
//!
//! Runs once: loads the universe, scores every ticker, writes the top N and
//! a summary into the report directory, then exits.

use anyhow::{bail, Result};
use zero_screener::config::ScreenerConfig;
use zero_screener::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let startup = std::time::Instant::now();

    let config = ScreenerConfig::load()?;

    init_logging(
        &config.observability.log_level,
        &config.observability.log_format,
    );

    config.validate()?;

    tracing::info!("Zero Screener v{}", env!("CARGO_PKG_VERSION"));

    let run_date = chrono::Local::now().date_naive();

    let (run, outcome) = zero_screener::run_until_cancelled(
        zero_screener::run_daily(&config, run_date),
        tokio::signal::ctrl_c(),
    )
    .await?;

    tracing::info!(
        scored = run.scored_count,
        skipped = run.skipped_count(),
        kept = run.ranked.len(),
        duration_ms = startup.elapsed().as_millis() as u64,
        "Daily analysis complete"
    );

    if !outcome.is_complete() {
        bail!(
            "{} of 2 report artifacts failed to persist",
            outcome.failures().len()
        );
    }

    Ok(())
}
