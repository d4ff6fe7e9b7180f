//! Engine error types.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use tidescale_core::{ConfigError, TimeWindow};

/// Violated input preconditions of the pure components.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("cannot reduce an empty series")]
    EmptySeries,

    #[error("min capacity {min} exceeds max capacity {max}")]
    InvertedBounds { min: i64, max: i64 },
}

/// The external step a pass was waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FetchSeries,
    DescribeGroup,
    Apply,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::FetchSeries => "series fetch",
            Stage::DescribeGroup => "group describe",
            Stage::Apply => "capacity apply",
        })
    }
}

/// Coarse classification of a failed pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operator mistake; fix the config, retrying will not help.
    Configuration,
    /// Upstream read failed; the next pass may succeed.
    TransientSource,
    /// The capacity change was not applied.
    Apply,
}

/// Why an evaluation pass ended in failure.
#[derive(Debug, Error)]
pub enum EvaluateError {
    /// `source` already names the metric or group at fault.
    #[error("{source}")]
    Config {
        metric: String,
        #[source]
        source: ConfigError,
    },

    #[error("metric `{metric}`: query `{query}` over {window} failed: {source}")]
    Source {
        metric: String,
        query: String,
        window: TimeWindow,
        #[source]
        source: anyhow::Error,
    },

    #[error("metric `{metric}`: query `{query}` over {window} returned no data points")]
    EmptySeries {
        metric: String,
        query: String,
        window: TimeWindow,
    },

    #[error("metric `{metric}`: describing group {group} failed: {source}")]
    Describe {
        metric: String,
        group: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("metric `{metric}`: setting group {group} desired capacity to {desired} failed: {source}")]
    Apply {
        metric: String,
        group: String,
        desired: i64,
        #[source]
        source: anyhow::Error,
    },

    #[error("metric `{metric}`: pass exceeded its {budget:?} budget during {stage}")]
    Timeout {
        metric: String,
        stage: Stage,
        budget: Duration,
    },

    #[error("metric `{metric}`: evaluation task aborted: {reason}")]
    Aborted { metric: String, reason: String },
}

impl EvaluateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EvaluateError::Config { .. } => ErrorKind::Configuration,
            EvaluateError::Apply { .. } => ErrorKind::Apply,
            EvaluateError::Timeout {
                stage: Stage::Apply,
                ..
            } => ErrorKind::Apply,
            EvaluateError::Source { .. }
            | EvaluateError::EmptySeries { .. }
            | EvaluateError::Describe { .. }
            | EvaluateError::Timeout { .. }
            | EvaluateError::Aborted { .. } => ErrorKind::TransientSource,
        }
    }

    /// Name of the metric whose pass failed.
    pub fn metric(&self) -> &str {
        match self {
            EvaluateError::Config { metric, .. }
            | EvaluateError::Source { metric, .. }
            | EvaluateError::EmptySeries { metric, .. }
            | EvaluateError::Describe { metric, .. }
            | EvaluateError::Apply { metric, .. }
            | EvaluateError::Timeout { metric, .. }
            | EvaluateError::Aborted { metric, .. } => metric,
        }
    }
}

pub type EvaluateResult<T> = Result<T, EvaluateError>;
