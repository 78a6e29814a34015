//! Error taxonomy for a screener run.
//!
//! Only [`ScreenError`] aborts a run. [`SkipReason`] is caught at the ticker
//! boundary and [`SinkWriteError`] is reported per artifact.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::FetchError;

/// Batch-fatal errors.
#[derive(Debug, Error)]
pub enum ScreenError {
    /// The universe could not be retrieved; nothing is written.
    #[error("universe unavailable: {0}")]
    UniverseUnavailable(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The run was interrupted before reports were written.
    #[error("screen cancelled before completion")]
    Cancelled,
}

/// Why a ticker was left out of the run.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// Fetch failed: not found, transient error or timeout.
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    /// Series too short to score.
    #[error("insufficient history: {bars} bar(s), need {required}")]
    InsufficientHistory { bars: usize, required: usize },

    /// Malformed data or a non-finite computation result.
    #[error("processing error: {0}")]
    Processing(String),
}

impl SkipReason {
    /// Whether the skip came from the data source rather than computation.
    pub fn is_data_issue(&self) -> bool {
        matches!(
            self,
            Self::DataUnavailable(_) | Self::InsufficientHistory { .. }
        )
    }
}

impl From<FetchError> for SkipReason {
    fn from(err: FetchError) -> Self {
        Self::DataUnavailable(err.to_string())
    }
}

/// Report artifacts written per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Artifact {
    Table,
    Summary,
}

impl std::fmt::Display for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Summary => write!(f, "summary"),
        }
    }
}

/// Persisting one report artifact failed.
#[derive(Debug, Error)]
#[error("failed to write {artifact} to {}: {source}", path.display())]
pub struct SinkWriteError {
    pub artifact: Artifact,
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}
