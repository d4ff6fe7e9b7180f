//! Interfaces to the systems a pass reads from and writes to.
//!
//! The engine never talks to a metrics backend or a cloud API directly;
//! callers hand it implementations of these traits.

use async_trait::async_trait;

use tidescale_core::{DataPoint, GroupState, TargetGroup, TimeWindow};

/// Fetches a metric time series.
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Points for `query` inside `window`, ascending by timestamp.
    ///
    /// A query that is valid but has no data returns `Ok(vec![])`;
    /// transport, auth, or query errors return `Err`.
    async fn query(&self, window: TimeWindow, query: &str) -> anyhow::Result<Vec<DataPoint>>;
}

/// Reads and changes the capacity of a resource group.
#[async_trait]
pub trait GroupController: Send + Sync {
    async fn describe(&self, group: &TargetGroup) -> anyhow::Result<GroupState>;

    /// Request `desired` capacity for `group`.
    ///
    /// With `dry_run` set, implementations validate and log the request
    /// but leave the group untouched.
    async fn set_desired_capacity(
        &self,
        group: &TargetGroup,
        desired: i64,
        honor_cooldown: bool,
        dry_run: bool,
    ) -> anyhow::Result<()>;
}
