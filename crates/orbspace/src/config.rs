//! Runtime configuration for transforms.
//!
//! ```text
//! ORBSPACE_NUM_THREADS   GEMM threads (0 or 1: sequential)
//! ORBSPACE_SCHEDULE      "greedy" or a comma-separated mode priority, e.g. "2,0"
//! ```

use faer::Par;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::transform::Schedule;

pub const THREADS_ENV: &str = "ORBSPACE_NUM_THREADS";
pub const SCHEDULE_ENV: &str = "ORBSPACE_SCHEDULE";

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

/// How transforms are executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Threads for faer's matmul; 0 and 1 mean sequential.
    pub threads: usize,

    /// Order in which hops of different modes are applied.
    pub schedule: Schedule,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            schedule: Schedule::SmallestIntermediate,
        }
    }
}

impl TransformConfig {
    /// Defaults overridden by `ORBSPACE_NUM_THREADS` and `ORBSPACE_SCHEDULE`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a variable is set but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = lookup(THREADS_ENV) {
            config.threads = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: THREADS_ENV,
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup(SCHEDULE_ENV) {
            config.schedule = parse_schedule(&value).ok_or(ConfigError::InvalidValue {
                key: SCHEDULE_ENV,
                value,
            })?;
        }
        Ok(config)
    }

    /// faer parallelism for the configured thread count.
    pub fn par(&self) -> Par {
        match self.threads {
            0 | 1 => Par::Seq,
            n => Par::rayon(n),
        }
    }
}

fn parse_schedule(value: &str) -> Option<Schedule> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("greedy") || value.is_empty() {
        return Some(Schedule::SmallestIntermediate);
    }
    value
        .split(',')
        .map(|m| m.trim().parse().ok())
        .collect::<Option<Vec<usize>>>()
        .map(Schedule::ModeOrder)
}
