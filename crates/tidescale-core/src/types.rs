//! Shared types used across tidescale crates.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A single sample of a metric time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Unix timestamp (seconds).
    pub timestamp: u64,
    pub value: f64,
}

impl DataPoint {
    pub fn new(timestamp: u64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Inclusive query window `[start, end]` in unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: u64,
    pub end: u64,
}

impl TimeWindow {
    /// Window of `lookback_secs` ending at `end`.
    pub fn ending_at(end: u64, lookback_secs: u64) -> Self {
        Self {
            start: end.saturating_sub(lookback_secs),
            end,
        }
    }

    /// Window covering `lookback` before `end`. Sub-second remainders round
    /// up to a whole second so a non-zero lookback never yields an empty span.
    pub fn trailing(end: u64, lookback: Duration) -> Self {
        let secs = lookback.as_secs() + u64::from(lookback.subsec_nanos() > 0);
        Self::ending_at(end, secs)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Reference to a scalable resource group and the domain it lives in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetGroup {
    pub name: String,
    /// Scaling domain, e.g. a cloud region.
    #[serde(default)]
    pub region: String,
}

impl TargetGroup {
    pub fn new(name: &str, region: &str) -> Self {
        Self {
            name: name.to_string(),
            region: region.to_string(),
        }
    }

    /// Composite `{region}/{name}` key.
    pub fn key(&self) -> String {
        format!("{}/{}", self.region, self.name)
    }
}

impl fmt::Display for TargetGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Capacity snapshot of a resource group, fetched fresh on every pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupState {
    pub current: i64,
    pub min: i64,
    pub max: i64,
}

/// Which rule set a value is being matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Named reduction applied to a series before threshold matching.
///
/// Names outside the known set are kept verbatim as `Unrecognized` so they
/// can be reported by validation; reducing with one yields `0.0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Transform {
    Last,
    Avg,
    Min,
    Max,
    Sum,
    Count,
    Unrecognized(String),
}

impl Transform {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "last" => Transform::Last,
            "avg" => Transform::Avg,
            "min" => Transform::Min,
            "max" => Transform::Max,
            "sum" => Transform::Sum,
            "count" => Transform::Count,
            _ => Transform::Unrecognized(name.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Transform::Last => "last",
            Transform::Avg => "avg",
            Transform::Min => "min",
            Transform::Max => "max",
            Transform::Sum => "sum",
            Transform::Count => "count",
            Transform::Unrecognized(name) => name,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Transform::Unrecognized(_))
    }
}

impl From<String> for Transform {
    fn from(name: String) -> Self {
        Transform::parse(&name)
    }
}

impl From<Transform> for String {
    fn from(transform: Transform) -> Self {
        transform.name().to_string()
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
