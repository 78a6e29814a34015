//! Indicator engine.
//!
//! Computes the per-ticker indicator set from the trailing window of a
//! [`PriceSeries`]. Pure: no I/O, no shared state.
//!
//! Every field is a [`Reading`]. When the series is shorter than a field's
//! window the reading is flagged unavailable and carries its documented
//! default, so a genuine zero is never confused with missing data.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::config::IndicatorWindows;
use crate::data::{Bar, PriceSeries};
use crate::error::SkipReason;

// ============================================================================
// Reading
// ============================================================================

/// A numeric indicator value tagged with whether enough history existed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub value: f64,
    pub available: bool,
}

impl Reading {
    pub fn available(value: f64) -> Self {
        Self {
            value,
            available: true,
        }
    }

    /// Insufficient data, reported as zero.
    pub fn unavailable() -> Self {
        Self::degenerate(0.0)
    }

    /// Insufficient data with a fallback value kept for diagnostics.
    pub fn degenerate(value: f64) -> Self {
        Self {
            value,
            available: false,
        }
    }

    pub fn get(&self) -> Option<f64> {
        self.available.then_some(self.value)
    }

    /// The value when available, otherwise zero.
    pub fn or_zero(&self) -> f64 {
        self.get().unwrap_or(0.0)
    }
}

// ============================================================================
// Indicator Set
// ============================================================================

/// Indicators derived from one ticker's trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    /// Last close vs previous close (%)
    pub short_term_return_pct: Reading,
    /// Std dev of daily changes over the volatility window (%)
    pub volatility_pct: Reading,
    /// Today's volume over the mean of the preceding base window
    pub volume_ratio: Reading,
    /// Sum of daily changes over the momentum window (%)
    pub momentum_pct: Reading,
    pub ma_short: Reading,
    pub ma_long: Reading,
    pub volume_ma_short: Reading,
    /// Mean volume of up to `volume_ratio_base` bars before today
    pub prior_volume_mean: Reading,
    pub last_close: f64,
    pub last_volume: u64,
}

impl IndicatorSet {
    /// Whether every value is finite.
    pub fn is_finite(&self) -> bool {
        [
            self.short_term_return_pct,
            self.volatility_pct,
            self.volume_ratio,
            self.momentum_pct,
            self.ma_short,
            self.ma_long,
            self.volume_ma_short,
            self.prior_volume_mean,
        ]
        .iter()
        .all(|r| r.value.is_finite())
            && self.last_close.is_finite()
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Computes [`IndicatorSet`]s with a fixed window configuration.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    windows: IndicatorWindows,
}

impl IndicatorEngine {
    pub fn new(windows: IndicatorWindows) -> Self {
        Self { windows }
    }

    pub fn with_defaults() -> Self {
        Self::new(IndicatorWindows::default())
    }

    pub fn windows(&self) -> &IndicatorWindows {
        &self.windows
    }

    /// Compute all indicators for `series`.
    ///
    /// Series shorter than `min_bars` cannot be scored and are rejected with
    /// [`SkipReason::InsufficientHistory`].
    pub fn compute(&self, series: &PriceSeries) -> Result<IndicatorSet, SkipReason> {
        let w = &self.windows;
        let required = std::cmp::max(w.min_bars, 2);
        let bars = series.bars();
        let (Some(last), true) = (bars.last(), bars.len() >= required) else {
            return Err(SkipReason::InsufficientHistory {
                bars: bars.len(),
                required,
            });
        };

        let prior_volumes = prior_volumes(bars, w.volume_ratio_base);
        let prior_volume_mean = if prior_volumes.is_empty() {
            Reading::unavailable()
        } else {
            Reading::available(prior_volumes.iter().mean())
        };

        Ok(IndicatorSet {
            short_term_return_pct: short_term_return(bars),
            volatility_pct: volatility(series, w.volatility),
            volume_ratio: volume_ratio(last, &prior_volumes, w.volume_ratio_base),
            momentum_pct: momentum(series, w.momentum),
            ma_short: close_ma(series, w.ma_short),
            ma_long: close_ma(series, w.ma_long),
            volume_ma_short: volume_ma(series, w.volume_ma),
            prior_volume_mean,
            last_close: last.close,
            last_volume: last.volume,
        })
    }
}

/// (close[-1] - close[-2]) / close[-2] * 100
fn short_term_return(bars: &[Bar]) -> Reading {
    match bars {
        [.., prev, last] => Reading::available(last.change_from(prev) * 100.0),
        _ => Reading::unavailable(),
    }
}

fn close_ma(series: &PriceSeries, window: usize) -> Reading {
    match series.tail(window) {
        Some(tail) => Reading::available(tail.iter().map(|b| b.close).mean()),
        None => Reading::unavailable(),
    }
}

fn volume_ma(series: &PriceSeries, window: usize) -> Reading {
    match series.tail(window) {
        Some(tail) => Reading::available(tail.iter().map(|b| b.volume as f64).mean()),
        None => Reading::unavailable(),
    }
}

/// Daily fractional close changes inside the trailing `window` bars.
fn daily_changes(tail: &[Bar]) -> Vec<f64> {
    tail.windows(2).map(|pair| pair[1].change_from(&pair[0])).collect()
}

/// Sample standard deviation of daily changes, as a percentage.
fn volatility(series: &PriceSeries, window: usize) -> Reading {
    let Some(tail) = series.tail(window) else {
        return Reading::unavailable();
    };
    let changes = daily_changes(tail);
    // A sample deviation needs two observations.
    if changes.len() < 2 {
        return Reading::unavailable();
    }
    Reading::available(changes.std_dev() * 100.0)
}

/// Sum of daily changes over the momentum window, as a percentage.
fn momentum(series: &PriceSeries, window: usize) -> Reading {
    match series.tail(window) {
        Some(tail) if tail.len() >= 2 => {
            Reading::available(daily_changes(tail).iter().sum::<f64>() * 100.0)
        }
        _ => Reading::unavailable(),
    }
}

/// Volumes of up to `base` bars immediately before the last bar.
fn prior_volumes(bars: &[Bar], base: usize) -> Vec<f64> {
    let end = bars.len().saturating_sub(1);
    let start = end.saturating_sub(base);
    bars[start..end].iter().map(|b| b.volume as f64).collect()
}

/// volume[-1] / mean(volume[-base-1 .. -1]).
///
/// Known low-data edge case: with fewer than `base` preceding bars the
/// denominator is 1 and the ratio is today's raw share volume. It is reported
/// as available, so on short histories it dominates the weighted score.
/// A zero-volume baseline is unavailable.
fn volume_ratio(last: &Bar, prior: &[f64], base: usize) -> Reading {
    let today = last.volume as f64;
    if prior.len() < base {
        return Reading::available(today);
    }
    let baseline = prior.iter().mean();
    if baseline > 0.0 {
        Reading::available(today / baseline)
    } else {
        Reading::degenerate(today)
    }
}

// ============================================================================
// Tests
// ============================================================================
