//! tidescale-core — shared types and configuration for tidescale.
//!
//! Defines the metric definitions and threshold rules the engine evaluates,
//! the group and series types exchanged with collaborators, and the
//! `scaler.toml` loader with its validation rules.

pub mod config;
pub mod duration;
pub mod error;
pub mod types;

pub use config::{MetricSpec, ScaleRule, ScalerConfig};
pub use duration::{DEFAULT_LOOKBACK, parse_duration};
pub use error::{ConfigError, ConfigResult};
pub use types::*;
