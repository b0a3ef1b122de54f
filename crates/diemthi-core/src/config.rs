//! Configuration types for diemthi components.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

/// Default number of records written per upsert statement.
pub const DEFAULT_BATCH_SIZE: usize = 5000;

/// Default upper bound on a single batch write.
pub const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_secs(30);

/// What the normalizer does with a score outside `[0, 10]`.
///
/// Exported result files have never been range checked, so the default keeps
/// every parsed value as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreRangePolicy {
    /// Store the parsed value unchanged.
    #[default]
    PassThrough,
    /// Skip the whole row.
    Reject,
    /// Clamp the value into `[0, 10]`.
    Clamp,
}

impl fmt::Display for ScoreRangePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PassThrough => write!(f, "passthrough"),
            Self::Reject => write!(f, "reject"),
            Self::Clamp => write!(f, "clamp"),
        }
    }
}

impl FromStr for ScoreRangePolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "passthrough" | "pass-through" | "pass_through" => Ok(Self::PassThrough),
            "reject" => Ok(Self::Reject),
            "clamp" => Ok(Self::Clamp),
            _ => Err(AppError::ConfigError(format!(
                "Unknown score policy: '{}'. Valid options: passthrough, reject, clamp",
                s
            ))),
        }
    }
}

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub max_connections: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
        }
    }
}

/// CSV import configuration.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Records per upsert statement.
    pub batch_size: NonZeroUsize,
    /// Upper bound on one batch write; exceeding it aborts the import.
    pub batch_timeout: Duration,
    /// Handling of out-of-range scores.
    pub score_policy: ScoreRangePolicy,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            batch_size: NonZeroUsize::new(DEFAULT_BATCH_SIZE).unwrap_or(NonZeroUsize::MIN),
            batch_timeout: DEFAULT_BATCH_TIMEOUT,
            score_policy: ScoreRangePolicy::default(),
        }
    }
}

impl ImportConfig {
    /// Sets the batch size. Zero is raised to one.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = NonZeroUsize::new(size).unwrap_or(NonZeroUsize::MIN);
        self
    }

    pub fn with_batch_timeout(mut self, timeout: Duration) -> Self {
        self.batch_timeout = timeout;
        self
    }

    pub fn with_score_policy(mut self, policy: ScoreRangePolicy) -> Self {
        self.score_policy = policy;
        self
    }
}
