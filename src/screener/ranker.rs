//! Ranker: orders scored tickers and keeps the top N.
//!
//! Ordering is score descending, then short-term return descending. The sort
//! is stable, so tickers equal on both keys keep their input order.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::Serialize;

use super::scoring::ScoredTicker;

/// Final ordered top-N list of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult {
    pub run_date: NaiveDate,
    pub entries: Vec<ScoredTicker>,
}

impl RankedResult {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mean score, `None` when empty.
    pub fn mean_score(&self) -> Option<f64> {
        mean(self.entries.iter().map(|e| e.score))
    }

    /// Mean short-term return (%), `None` when empty.
    pub fn mean_return(&self) -> Option<f64> {
        mean(self.entries.iter().map(|e| e.short_term_return()))
    }
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> Option<f64> {
    let n = values.len();
    (n > 0).then(|| values.sum::<f64>() / n as f64)
}

/// Sorts and truncates scored tickers.
#[derive(Debug, Clone, Copy)]
pub struct Ranker {
    top_n: usize,
}

impl Ranker {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Keep `min(top_n, scored.len())` entries in ranking order.
    pub fn rank(&self, run_date: NaiveDate, mut scored: Vec<ScoredTicker>) -> RankedResult {
        scored.sort_by(compare);
        scored.truncate(self.top_n);
        RankedResult {
            run_date,
            entries: scored,
        }
    }
}

/// Ranking order: higher score first, then higher short-term return.
/// NaN compares equal so it cannot poison the sort.
pub fn compare(a: &ScoredTicker, b: &ScoredTicker) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| {
            b.short_term_return()
                .partial_cmp(&a.short_term_return())
                .unwrap_or(Ordering::Equal)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screener::indicators::{IndicatorSet, Reading};
    use crate::screener::scoring::Scorer;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()
    }

    fn scored(ticker: &str, score: f64, ret: f64) -> ScoredTicker {
        let indicators = IndicatorSet {
            short_term_return_pct: Reading::available(ret),
            volatility_pct: Reading::unavailable(),
            volume_ratio: Reading::unavailable(),
            momentum_pct: Reading::unavailable(),
            ma_short: Reading::unavailable(),
            ma_long: Reading::unavailable(),
            volume_ma_short: Reading::unavailable(),
            prior_volume_mean: Reading::unavailable(),
            last_close: 10.0,
            last_volume: 100,
        };
        let mut t = Scorer::with_defaults().score_ticker(ticker, indicators);
        t.score = score;
        t
    }

    fn tickers(result: &RankedResult) -> Vec<&str> {
        result.entries.iter().map(|e| e.ticker.as_str()).collect()
    }

    #[test]
    fn test_orders_by_score_then_return() {
        let ranker = Ranker::new(30);
        let result = ranker.rank(
            date(),
            vec![
                scored("LOW", 1.0, 9.0),
                scored("TIE_SMALL", 2.0, 1.0),
                scored("HIGH", 5.0, -3.0),
                scored("TIE_BIG", 2.0, 4.0),
            ],
        );
        assert_eq!(tickers(&result), vec!["HIGH", "TIE_BIG", "TIE_SMALL", "LOW"]);
    }

    #[test]
    fn test_full_ties_keep_insertion_order() {
        let ranker = Ranker::new(30);
        let result = ranker.rank(
            date(),
            vec![
                scored("FIRST", 1.0, 2.0),
                scored("TOP", 3.0, 0.0),
                scored("SECOND", 1.0, 2.0),
                scored("THIRD", 1.0, 2.0),
            ],
        );
        assert_eq!(tickers(&result), vec!["TOP", "FIRST", "SECOND", "THIRD"]);
    }

    #[test]
    fn test_truncates_to_top_n() {
        let ranker = Ranker::new(3);
        let input: Vec<_> = (0..10)
            .map(|i| scored(&format!("T{}", i), i as f64, 0.0))
            .collect();
        let result = ranker.rank(date(), input);
        assert_eq!(result.len(), 3);
        assert_eq!(tickers(&result), vec!["T9", "T8", "T7"]);
    }

    #[test]
    fn test_small_universe_keeps_negative_scores() {
        let ranker = Ranker::new(30);
        let result = ranker.rank(date(), vec![scored("A", -4.0, -2.0), scored("B", -1.0, 0.0)]);
        assert_eq!(result.len(), 2);
        assert_eq!(tickers(&result), vec!["B", "A"]);
    }

    #[test]
    fn test_rank_is_idempotent() {
        let ranker = Ranker::new(4);
        let input: Vec<_> = [3.0, 1.0, 3.0, 7.0, 2.0, 2.0]
            .iter()
            .enumerate()
            .map(|(i, s)| scored(&format!("T{}", i), *s, (i % 3) as f64))
            .collect();

        let once = ranker.rank(date(), input);
        let twice = ranker.rank(date(), once.entries.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_ordering_invariant_holds() {
        let ranker = Ranker::new(50);
        let input: Vec<_> = (0..40)
            .map(|i| scored(&format!("T{}", i), ((i * 7) % 5) as f64, ((i * 3) % 4) as f64))
            .collect();
        let result = ranker.rank(date(), input);

        for pair in result.entries.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(
                a.score > b.score
                    || (a.score == b.score && a.short_term_return() >= b.short_term_return())
            );
        }
    }

    #[test]
    fn test_nan_score_does_not_panic() {
        let ranker = Ranker::new(5);
        let result = ranker.rank(date(), vec![scored("A", f64::NAN, 0.0), scored("B", 1.0, 0.0)]);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_means() {
        let ranker = Ranker::new(5);
        let result = ranker.rank(date(), vec![scored("A", 2.0, 4.0), scored("B", 1.0, 1.0)]);
        assert_eq!(result.mean_score(), Some(1.5));
        assert_eq!(result.mean_return(), Some(2.5));

        let empty = ranker.rank(date(), Vec::new());
        assert!(empty.is_empty());
        assert_eq!(empty.mean_score(), None);
    }
}
