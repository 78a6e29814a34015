//! Screener configuration module.
//!
//! Every field carries a serde default so a partial (or missing) config file
//! still yields a complete configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ScreenError;

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV_VAR: &str = "ZERO_SCREENER_CONFIG";

// ============================================================================
// Main Screener Configuration
// ============================================================================

/// Configuration for the daily screener run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenerConfig {
    /// Number of tickers kept in the ranked result
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Calendar days of history requested per ticker
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Indicator window lengths (in bars)
    #[serde(default)]
    pub windows: IndicatorWindows,

    /// Scoring strategy and weights
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Where the ticker universe comes from
    #[serde(default)]
    pub universe: UniverseConfig,

    /// Price history source settings
    #[serde(default)]
    pub data_source: DataSourceConfig,

    /// Report output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging settings
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            lookback_days: default_lookback_days(),
            windows: IndicatorWindows::default(),
            scoring: ScoringConfig::default(),
            universe: UniverseConfig::default(),
            data_source: DataSourceConfig::default(),
            output: OutputConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl ScreenerConfig {
    /// Load configuration from `$ZERO_SCREENER_CONFIG` or `~/.codecoder/screener.json`.
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load() -> Result<Self> {
        let path = std::env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .or_else(default_config_path);

        match path {
            Some(p) if p.exists() => Self::load_from(&p),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit JSON file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ScreenError> {
        if self.top_n == 0 {
            return Err(ScreenError::InvalidConfig("top_n must be at least 1".into()));
        }
        self.windows.validate()?;
        if self.data_source.concurrency == 0 {
            return Err(ScreenError::InvalidConfig(
                "data_source.concurrency must be at least 1".into(),
            ));
        }
        if self.data_source.timeout_secs == 0 {
            return Err(ScreenError::InvalidConfig(
                "data_source.timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Report directory with a leading `~` expanded.
    pub fn report_dir(&self) -> PathBuf {
        expand_home(&self.output.report_dir)
    }
}

fn default_top_n() -> usize {
    30
}

fn default_lookback_days() -> u32 {
    90 // ~3 months of daily bars
}

fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".codecoder").join("screener.json"))
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|h| h.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

// ============================================================================
// Indicator Windows
// ============================================================================

/// Rolling window lengths used by the indicator engine, in bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorWindows {
    #[serde(default = "default_ma_short")]
    pub ma_short: usize,

    #[serde(default = "default_ma_long")]
    pub ma_long: usize,

    #[serde(default = "default_volume_ma")]
    pub volume_ma: usize,

    #[serde(default = "default_volatility")]
    pub volatility: usize,

    #[serde(default = "default_momentum")]
    pub momentum: usize,

    /// Bars preceding today that form the volume ratio denominator
    #[serde(default = "default_volume_ratio_base")]
    pub volume_ratio_base: usize,

    /// Series shorter than this are excluded from the run
    #[serde(default = "default_min_bars")]
    pub min_bars: usize,
}

impl Default for IndicatorWindows {
    fn default() -> Self {
        Self {
            ma_short: default_ma_short(),
            ma_long: default_ma_long(),
            volume_ma: default_volume_ma(),
            volatility: default_volatility(),
            momentum: default_momentum(),
            volume_ratio_base: default_volume_ratio_base(),
            min_bars: default_min_bars(),
        }
    }
}

impl IndicatorWindows {
    pub fn validate(&self) -> Result<(), ScreenError> {
        let windows = [
            ("ma_short", self.ma_short),
            ("ma_long", self.ma_long),
            ("volume_ma", self.volume_ma),
            ("volatility", self.volatility),
            ("momentum", self.momentum),
            ("volume_ratio_base", self.volume_ratio_base),
        ];
        if let Some((name, _)) = windows.iter().find(|(_, w)| *w == 0) {
            return Err(ScreenError::InvalidConfig(format!(
                "windows.{} must be at least 1",
                name
            )));
        }
        if self.ma_short > self.ma_long {
            return Err(ScreenError::InvalidConfig(
                "windows.ma_short must not exceed windows.ma_long".into(),
            ));
        }
        // Short-term return needs today and yesterday.
        if self.min_bars < 2 {
            return Err(ScreenError::InvalidConfig(
                "windows.min_bars must be at least 2".into(),
            ));
        }
        Ok(())
    }
}

fn default_ma_short() -> usize {
    20
}

fn default_ma_long() -> usize {
    60
}

fn default_volume_ma() -> usize {
    20
}

fn default_volatility() -> usize {
    30
}

fn default_momentum() -> usize {
    5
}

fn default_volume_ratio_base() -> usize {
    5
}

fn default_min_bars() -> usize {
    2
}

// ============================================================================
// Scoring Configuration
// ============================================================================

/// Which scoring function ranks the universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringStrategy {
    /// Weighted sum of indicators (fine ranking)
    #[default]
    Weighted,
    /// Count of satisfied rules, 0-4 (coarse ranking)
    BooleanRules,
}

impl std::fmt::Display for ScoringStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Weighted => write!(f, "weighted"),
            Self::BooleanRules => write!(f, "boolean_rules"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub strategy: ScoringStrategy,

    #[serde(default)]
    pub weights: ScoreWeights,

    #[serde(default)]
    pub rules: RuleThresholds,
}

/// Weights of the composite score. Volatility is subtracted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    #[serde(default = "default_return_weight")]
    pub short_term_return: f64,

    #[serde(default = "default_momentum_weight")]
    pub momentum: f64,

    #[serde(default = "default_volume_ratio_weight")]
    pub volume_ratio: f64,

    #[serde(default = "default_volatility_penalty")]
    pub volatility_penalty: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            short_term_return: default_return_weight(),
            momentum: default_momentum_weight(),
            volume_ratio: default_volume_ratio_weight(),
            volatility_penalty: default_volatility_penalty(),
        }
    }
}

fn default_return_weight() -> f64 {
    0.4
}

fn default_momentum_weight() -> f64 {
    0.3
}

fn default_volume_ratio_weight() -> f64 {
    0.2
}

fn default_volatility_penalty() -> f64 {
    0.1
}

/// Thresholds of the boolean rule score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleThresholds {
    /// Minimum short-term return (%), exclusive
    #[serde(default = "default_min_return_pct")]
    pub min_return_pct: f64,

    /// Today's volume must exceed this multiple of the volume baseline
    #[serde(default = "default_volume_surge")]
    pub volume_surge: f64,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            min_return_pct: default_min_return_pct(),
            volume_surge: default_volume_surge(),
        }
    }
}

fn default_min_return_pct() -> f64 {
    3.0
}

fn default_volume_surge() -> f64 {
    1.5
}

// ============================================================================
// Universe Configuration
// ============================================================================

/// Ticker universe source. `symbols` wins over `file` when both are set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UniverseConfig {
    /// Inline ticker list
    #[serde(default)]
    pub symbols: Vec<String>,

    /// File with one ticker per line (`#` starts a comment)
    #[serde(default)]
    pub file: Option<String>,
}

// ============================================================================
// Data Source Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSourceConfig {
    /// Chart API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-ticker fetch timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum tickers fetched at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Outbound request budget
    #[serde(default = "default_rate_limit_rpm")]
    pub rate_limit_rpm: u32,
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            concurrency: default_concurrency(),
            rate_limit_rpm: default_rate_limit_rpm(),
        }
    }
}

fn default_base_url() -> String {
    "https://query1.finance.yahoo.com".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_concurrency() -> usize {
    8
}

fn default_rate_limit_rpm() -> u32 {
    120
}

// ============================================================================
// Output Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for the daily table and summary
    #[serde(default = "default_report_dir")]
    pub report_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_dir: default_report_dir(),
        }
    }
}

fn default_report_dir() -> String {
    "~/.codecoder/reports/screener".to_string()
}

// ============================================================================
// Observability Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

// ============================================================================
// Tests
// ============================================================================
