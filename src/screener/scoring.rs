//! Scoring functions.
//!
//! Maps one [`IndicatorSet`] to a score and a breakdown. Scores never look at
//! other tickers: there is no cross-sectional normalization.
//!
//! Two strategies:
//! - **Weighted** (default): `0.4·return + 0.3·momentum + 0.2·volume_ratio − 0.1·volatility`.
//!   Unavailable readings contribute zero.
//! - **Boolean rules**: one point per satisfied condition, 0-4. A condition
//!   whose inputs are unavailable is not counted.

use serde::{Deserialize, Serialize};

use super::indicators::{IndicatorSet, Reading};
use crate::config::{RuleThresholds, ScoreWeights, ScoringConfig, ScoringStrategy};

// ============================================================================
// Breakdown
// ============================================================================

/// Coarse label attached to a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreLabel {
    Strong,
    Positive,
    Neutral,
    Negative,
}

impl std::fmt::Display for ScoreLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strong => write!(f, "strong"),
            Self::Positive => write!(f, "positive"),
            Self::Neutral => write!(f, "neutral"),
            Self::Negative => write!(f, "negative"),
        }
    }
}

/// One term of a score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreComponent {
    pub name: &'static str,
    /// Input reading (or rule outcome as 0/1)
    pub input: Reading,
    /// Amount added to the score
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub strategy: ScoringStrategy,
    pub components: Vec<ScoreComponent>,
    pub label: ScoreLabel,
}

impl ScoreBreakdown {
    /// Names of components that added a positive amount.
    pub fn contributors(&self) -> Vec<&'static str> {
        self.components
            .iter()
            .filter(|c| c.contribution > 0.0)
            .map(|c| c.name)
            .collect()
    }
}

/// A scored ticker, ready for ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredTicker {
    pub ticker: String,
    pub score: f64,
    pub indicators: IndicatorSet,
    pub breakdown: ScoreBreakdown,
}

impl ScoredTicker {
    /// Short-term return used as the ranking tie-break (0 when unavailable).
    pub fn short_term_return(&self) -> f64 {
        self.indicators.short_term_return_pct.or_zero()
    }
}

// ============================================================================
// Scorer
// ============================================================================

/// Stateless scorer configured with one strategy.
#[derive(Debug, Clone)]
pub struct Scorer {
    strategy: ScoringStrategy,
    weights: ScoreWeights,
    rules: RuleThresholds,
}

impl Scorer {
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            strategy: config.strategy,
            weights: config.weights,
            rules: config.rules,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(&ScoringConfig::default())
    }

    pub fn strategy(&self) -> ScoringStrategy {
        self.strategy
    }

    /// Score one indicator set.
    pub fn score(&self, indicators: &IndicatorSet) -> (f64, ScoreBreakdown) {
        let components = match self.strategy {
            ScoringStrategy::Weighted => self.weighted_components(indicators),
            ScoringStrategy::BooleanRules => self.rule_components(indicators),
        };
        let score: f64 = components.iter().map(|c| c.contribution).sum();
        let label = self.label(score);

        (
            score,
            ScoreBreakdown {
                strategy: self.strategy,
                components,
                label,
            },
        )
    }

    /// Score `indicators` and wrap the result for ranking.
    pub fn score_ticker(&self, ticker: impl Into<String>, indicators: IndicatorSet) -> ScoredTicker {
        let (score, breakdown) = self.score(&indicators);
        ScoredTicker {
            ticker: ticker.into(),
            score,
            indicators,
            breakdown,
        }
    }

    fn weighted_components(&self, ind: &IndicatorSet) -> Vec<ScoreComponent> {
        let w = &self.weights;
        let term = |name, input: Reading, weight: f64| ScoreComponent {
            name,
            input,
            contribution: weight * input.or_zero(),
        };

        vec![
            term("short_term_return", ind.short_term_return_pct, w.short_term_return),
            term("momentum", ind.momentum_pct, w.momentum),
            term("volume_ratio", ind.volume_ratio, w.volume_ratio),
            term("volatility", ind.volatility_pct, -w.volatility_penalty),
        ]
    }

    fn rule_components(&self, ind: &IndicatorSet) -> Vec<ScoreComponent> {
        let r = &self.rules;
        let close = ind.last_close;
        let volume = ind.last_volume as f64;
        // The 20-bar average is the baseline; short histories fall back to
        // the bars preceding today.
        let volume_baseline = ind.volume_ma_short.get().or(ind.prior_volume_mean.get());

        let rules = [
            (
                "return_above_threshold",
                ind.short_term_return_pct.get().map(|ret| ret > r.min_return_pct),
            ),
            (
                "volume_surge",
                volume_baseline.map(|base| volume > r.volume_surge * base),
            ),
            (
                "short_ma_above_long_ma",
                ind.ma_short.get().zip(ind.ma_long.get()).map(|(s, l)| s > l),
            ),
            (
                "close_above_short_ma",
                ind.ma_short.get().map(|ma| close > ma),
            ),
        ];

        rules
            .into_iter()
            .map(|(name, outcome)| {
                let hit = outcome == Some(true);
                ScoreComponent {
                    name,
                    input: match outcome {
                        Some(met) => Reading::available(if met { 1.0 } else { 0.0 }),
                        None => Reading::unavailable(),
                    },
                    contribution: if hit { 1.0 } else { 0.0 },
                }
            })
            .collect()
    }

    fn label(&self, score: f64) -> ScoreLabel {
        match self.strategy {
            ScoringStrategy::Weighted => {
                if score >= 3.0 {
                    ScoreLabel::Strong
                } else if score > 0.5 {
                    ScoreLabel::Positive
                } else if score >= -0.5 {
                    ScoreLabel::Neutral
                } else {
                    ScoreLabel::Negative
                }
            }
            ScoringStrategy::BooleanRules => match score as u32 {
                3..=4 => ScoreLabel::Strong,
                2 => ScoreLabel::Positive,
                1 => ScoreLabel::Neutral,
                _ => ScoreLabel::Negative,
            },
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
