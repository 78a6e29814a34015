//! Universe sources.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use super::provider::UniverseSource;
use crate::config::UniverseConfig;

/// Large-cap US tickers used when no universe is configured.
pub const DEFAULT_SYMBOLS: &[&str] = &[
    // Technology
    "AAPL", "MSFT", "GOOGL", "NVDA", "META", "AVGO", "ORCL", "CRM", "AMD", "ADBE",
    "INTC", "CSCO", "QCOM", "TXN", "IBM",
    // Healthcare
    "JNJ", "UNH", "PFE", "ABBV", "MRK", "LLY", "TMO", "ABT", "AMGN", "GILD",
    // Financials
    "JPM", "BAC", "GS", "V", "MA", "WFC", "MS", "AXP", "BLK", "C",
    // Energy
    "XOM", "CVX", "COP", "SLB", "EOG",
    // Consumer
    "AMZN", "TSLA", "HD", "NKE", "SBUX", "MCD", "LOW", "COST", "WMT", "PG",
    // Industrials
    "CAT", "BA", "HON", "UPS", "GE", "RTX", "DE", "LMT", "UNP", "ETN",
];

/// Normalize raw entries: trim, uppercase, drop blanks and duplicates, keep order.
fn normalize<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = std::collections::HashSet::new();
    raw.into_iter()
        .map(|s| s.as_ref().trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

// ============================================================================
// Static Universe
// ============================================================================

/// A fixed ticker list.
pub struct StaticUniverse {
    symbols: Vec<String>,
}

impl StaticUniverse {
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            symbols: normalize(symbols),
        }
    }

    /// The built-in large-cap list.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_SYMBOLS.iter().copied())
    }
}

#[async_trait]
impl UniverseSource for StaticUniverse {
    fn name(&self) -> &str {
        "static"
    }

    async fn load(&self) -> Result<Vec<String>> {
        if self.symbols.is_empty() {
            bail!("static universe is empty");
        }
        Ok(self.symbols.clone())
    }
}

// ============================================================================
// File Universe
// ============================================================================

/// One ticker per line; blank lines and `#` comments are ignored.
pub struct FileUniverse {
    path: PathBuf,
}

impl FileUniverse {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl UniverseSource for FileUniverse {
    fn name(&self) -> &str {
        "file"
    }

    async fn load(&self) -> Result<Vec<String>> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read universe file {}", self.path.display()))?;

        let symbols = normalize(
            raw.lines()
                .map(|line| line.split('#').next().unwrap_or_default()),
        );

        if symbols.is_empty() {
            bail!("universe file {} lists no tickers", self.path.display());
        }
        Ok(symbols)
    }
}

/// Pick the universe source described by the config.
pub fn from_config(config: &UniverseConfig) -> Box<dyn UniverseSource> {
    if !config.symbols.is_empty() {
        Box::new(StaticUniverse::new(&config.symbols))
    } else if let Some(file) = &config.file {
        Box::new(FileUniverse::new(file))
    } else {
        Box::new(StaticUniverse::with_defaults())
    }
}
