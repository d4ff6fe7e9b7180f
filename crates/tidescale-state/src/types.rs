//! Records persisted by the local state store.

use serde::{Deserialize, Serialize};

use tidescale_core::{GroupState, TargetGroup};

use crate::error::{StateError, StateResult};

/// A locally managed resource group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub name: String,
    pub region: String,
    pub desired_capacity: i64,
    pub min_size: i64,
    pub max_size: i64,
    /// Seconds after a change during which cooldown-honoring requests are refused.
    #[serde(default)]
    pub cooldown_secs: u64,
    /// Unix timestamp (seconds) of the last applied change.
    #[serde(default)]
    pub last_scaled_at: Option<u64>,
}

impl GroupRecord {
    pub fn new(group: &TargetGroup, desired_capacity: i64, min_size: i64, max_size: i64) -> Self {
        Self {
            name: group.name.clone(),
            region: group.region.clone(),
            desired_capacity,
            min_size,
            max_size,
            cooldown_secs: 0,
            last_scaled_at: None,
        }
    }

    pub fn with_cooldown(mut self, secs: u64) -> Self {
        self.cooldown_secs = secs;
        self
    }

    pub fn target(&self) -> TargetGroup {
        TargetGroup::new(&self.name, &self.region)
    }

    /// Composite key: `{region}/{name}`.
    pub fn table_key(&self) -> String {
        self.target().key()
    }

    pub fn state(&self) -> GroupState {
        GroupState {
            current: self.desired_capacity,
            min: self.min_size,
            max: self.max_size,
        }
    }

    /// Seconds left in the cooldown window at `now`, if any.
    pub fn cooldown_remaining(&self, now: u64) -> Option<u64> {
        let last = self.last_scaled_at?;
        let ends = last.saturating_add(self.cooldown_secs);
        (now < ends).then(|| ends - now)
    }

    /// Reject records a cloud controller would refuse to create.
    pub fn check(&self) -> StateResult<()> {
        let reason = if self.name.is_empty() {
            Some("name is empty".to_string())
        } else if self.min_size < 0 {
            Some(format!("min size {} is negative", self.min_size))
        } else if self.min_size > self.max_size {
            Some(format!(
                "min size {} exceeds max size {}",
                self.min_size, self.max_size
            ))
        } else if !(self.min_size..=self.max_size).contains(&self.desired_capacity) {
            Some(format!(
                "desired capacity {} is outside [{}, {}]",
                self.desired_capacity, self.min_size, self.max_size
            ))
        } else {
            None
        };
        match reason {
            Some(reason) => Err(StateError::InvalidGroup {
                group: self.table_key(),
                reason,
            }),
            None => Ok(()),
        }
    }

    /// Whether a change to `desired` would be accepted at `now`.
    pub fn check_change(&self, desired: i64, honor_cooldown: bool, now: u64) -> StateResult<()> {
        if desired < self.min_size || desired > self.max_size {
            return Err(StateError::OutOfBounds {
                group: self.table_key(),
                desired,
                min: self.min_size,
                max: self.max_size,
            });
        }
        if honor_cooldown && let Some(remaining_secs) = self.cooldown_remaining(now) {
            return Err(StateError::CooldownActive {
                group: self.table_key(),
                remaining_secs,
            });
        }
        Ok(())
    }
}

/// One applied capacity change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalingActivity {
    /// `{region}/{name}` of the changed group.
    pub group: String,
    pub from: i64,
    pub to: i64,
    pub honor_cooldown: bool,
    /// Unix timestamp (milliseconds).
    pub at_millis: u64,
}

/// Series key: `{query}@{timestamp:020}`.
pub fn series_key(query: &str, timestamp: u64) -> String {
    format!("{query}@{timestamp:020}")
}

/// Activity key: `{group_key}@{millis:020}`.
pub fn activity_key(group_key: &str, millis: u64) -> String {
    format!("{group_key}@{millis:020}")
}
