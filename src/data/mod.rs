//! Market data module.
//!
//! Daily bars, the per-ticker price series, and the sources the screener
//! pulls them from.
//!
//! # Data Sources
//! - **Universe**: inline config list or a ticker file ([`StaticUniverse`], [`FileUniverse`])
//! - **Price history**: Yahoo chart endpoint ([`YahooChartStore`])

mod provider;
mod rate_limiter;
pub mod universe;
pub mod yahoo;

pub use provider::{FetchError, PriceSeriesStore, UniverseSource};
pub use rate_limiter::RateLimiter;
pub use universe::{FileUniverse, StaticUniverse};
pub use yahoo::YahooChartStore;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Core Data Types
// ============================================================================

/// One daily OHLCV bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Day-over-day fractional change from `prev` to this bar's close,
    /// computed as a ratio minus one.
    pub fn change_from(&self, prev: &Bar) -> f64 {
        self.close / prev.close - 1.0
    }

    fn has_positive_prices(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_finite() && *p > 0.0)
    }
}

/// Invalid bar sequences rejected by [`PriceSeries::new`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("bar dates not strictly ascending at {0}")]
    OutOfOrder(NaiveDate),

    #[error("non-positive price on {0}")]
    NonPositivePrice(NaiveDate),
}

/// Daily bars of one ticker, ascending by date with no duplicate dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    ticker: String,
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Build a series, enforcing date order and positive prices.
    pub fn new(ticker: impl Into<String>, bars: Vec<Bar>) -> Result<Self, SeriesError> {
        for (i, bar) in bars.iter().enumerate() {
            if !bar.has_positive_prices() {
                return Err(SeriesError::NonPositivePrice(bar.date));
            }
            if i > 0 && bars[i - 1].date >= bar.date {
                return Err(SeriesError::OutOfOrder(bar.date));
            }
        }
        Ok(Self {
            ticker: ticker.into(),
            bars,
        })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Most recent bar.
    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// The trailing `n` bars, or `None` when fewer exist.
    pub fn tail(&self, n: usize) -> Option<&[Bar]> {
        (self.bars.len() >= n).then(|| &self.bars[self.bars.len() - n..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000,
        }
    }

    #[test]
    fn test_series_accepts_ascending_bars() {
        let series = PriceSeries::new("AAA", vec![bar(1, 10.0), bar(4, 11.0)]).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.ticker(), "AAA");
        assert_eq!(series.last().unwrap().close, 11.0);
    }

    #[test]
    fn test_series_rejects_duplicate_dates() {
        let err = PriceSeries::new("AAA", vec![bar(1, 10.0), bar(1, 11.0)]).unwrap_err();
        assert!(matches!(err, SeriesError::OutOfOrder(_)));
    }

    #[test]
    fn test_series_rejects_non_positive_close() {
        let err = PriceSeries::new("AAA", vec![bar(1, 10.0), bar(2, 0.0)]).unwrap_err();
        assert!(matches!(err, SeriesError::NonPositivePrice(_)));
    }

    #[test]
    fn test_tail() {
        let series =
            PriceSeries::new("AAA", vec![bar(1, 10.0), bar(2, 11.0), bar(3, 12.0)]).unwrap();
        assert_eq!(series.tail(2).unwrap()[0].close, 11.0);
        assert_eq!(series.tail(3).unwrap().len(), 3);
        assert!(series.tail(4).is_none());
    }

    #[test]
    fn test_change_from() {
        let change = bar(2, 11.0).change_from(&bar(1, 10.0));
        assert!((change - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_change_from_matches_ratio_minus_one() {
        // 103 / 100 - 1 lands just above 0.03, unlike (103 - 100) / 100.
        let change = bar(2, 103.0).change_from(&bar(1, 100.0));
        assert_eq!(change, 103.0 / 100.0 - 1.0);
        assert!(change * 100.0 > 3.0);
    }
}
