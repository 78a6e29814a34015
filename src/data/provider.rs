//! Data source abstractions consumed by the screener.
//!
//! The screener never talks to a vendor directly: the universe comes from a
//! [`UniverseSource`] and price history from a [`PriceSeriesStore`].

use async_trait::async_trait;
use thiserror::Error;

use super::PriceSeries;

// ============================================================================
// Errors
// ============================================================================

/// Per-ticker fetch failures. None of these abort a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The source has no data for this ticker (delisted, unknown symbol).
    #[error("no data for {0}")]
    NotFound(String),

    /// Network failure, rate limiting or a server-side error.
    #[error("transient error: {0}")]
    Transient(String),

    /// The fetch exceeded its time budget.
    #[error("timed out after {0}s")]
    Timeout(u64),

    /// The payload could not be turned into a valid series.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl FetchError {
    /// Whether retrying later could succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::Timeout(_))
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Supplies the ordered ticker universe for a run.
#[async_trait]
pub trait UniverseSource: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> &str;

    /// Load the universe. Any error here is fatal for the run.
    async fn load(&self) -> anyhow::Result<Vec<String>>;
}

/// Supplies daily bars per ticker.
#[async_trait]
pub trait PriceSeriesStore: Send + Sync {
    /// Store name for logging.
    fn name(&self) -> &'static str;

    /// Fetch the daily series for `ticker` covering the last `lookback_days`
    /// calendar days. The series may be shorter than requested.
    async fn fetch(&self, ticker: &str, lookback_days: u32) -> Result<PriceSeries, FetchError>;
}
