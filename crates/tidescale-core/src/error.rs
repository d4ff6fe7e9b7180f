//! Configuration error types.

use thiserror::Error;

use crate::types::Direction;

/// Result type alias for configuration loading and validation.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Operator mistakes in the scaler configuration or the group bounds it
/// acts on. Never coerced into a default.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("failed to read config {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("metric `{metric}` has no query")]
    MissingQuery { metric: String },

    #[error("metric `{metric}` scale {direction} threshold {threshold} is not a finite number")]
    NonFiniteThreshold {
        metric: String,
        direction: Direction,
        threshold: f64,
    },

    #[error("metric `{metric}` scale {direction} has more than one rule at threshold {threshold}")]
    DuplicateThreshold {
        metric: String,
        direction: Direction,
        threshold: f64,
    },

    #[error("group {group} has min capacity {min} above max capacity {max}")]
    InvertedBounds { group: String, min: i64, max: i64 },

    #[error("invalid timeout `{0}`")]
    Timeout(String),
}
