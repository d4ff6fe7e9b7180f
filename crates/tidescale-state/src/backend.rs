//! Engine collaborators served from the local store.

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tracing::info;

use tidescale_core::{DataPoint, GroupState, TargetGroup, TimeWindow};
use tidescale_engine::{GroupController, MetricSource};

use crate::error::StateError;
use crate::store::StateStore;

/// Serves metric series and group capacity out of a [`StateStore`].
#[derive(Clone)]
pub struct LocalBackend {
    store: StateStore,
}

impl LocalBackend {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }
}

#[async_trait]
impl MetricSource for LocalBackend {
    async fn query(&self, window: TimeWindow, query: &str) -> anyhow::Result<Vec<DataPoint>> {
        Ok(self.store.query_points(query, window)?)
    }
}

#[async_trait]
impl GroupController for LocalBackend {
    async fn describe(&self, group: &TargetGroup) -> anyhow::Result<GroupState> {
        match self.store.get_group(group)? {
            Some(record) => Ok(record.state()),
            None => Err(StateError::NotFound(group.key()).into()),
        }
    }

    async fn set_desired_capacity(
        &self,
        group: &TargetGroup,
        desired: i64,
        honor_cooldown: bool,
        dry_run: bool,
    ) -> anyhow::Result<()> {
        let now_millis = epoch_millis();

        if dry_run {
            let record = self
                .store
                .get_group(group)?
                .ok_or_else(|| StateError::NotFound(group.key()))?;
            record.check_change(desired, honor_cooldown, now_millis / 1000)?;
            info!(
                group = %group,
                from = record.desired_capacity,
                to = desired,
                honor_cooldown,
                "would set desired capacity"
            );
            return Ok(());
        }

        match self
            .store
            .set_desired_capacity(group, desired, honor_cooldown, now_millis)?
        {
            Some(activity) => info!(
                group = %group,
                from = activity.from,
                to = activity.to,
                honor_cooldown,
                "desired capacity set"
            ),
            None => info!(group = %group, desired, "group already at desired capacity"),
        }
        Ok(())
    }
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
