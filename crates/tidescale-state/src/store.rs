//! StateStore — redb-backed persistence for local groups and series.
//!
//! Values are JSON-serialized into redb's `&[u8]` value columns. The store
//! supports both on-disk and in-memory backends (the latter for testing).

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use tidescale_core::{DataPoint, TargetGroup, TimeWindow};

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(GROUPS).map_err(map_err!(Table))?;
        txn.open_table(SERIES).map_err(map_err!(Table))?;
        txn.open_table(ACTIVITIES).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Groups ─────────────────────────────────────────────────────

    /// Insert or replace a group record.
    pub fn put_group(&self, record: &GroupRecord) -> StateResult<()> {
        record.check()?;
        let key = record.table_key();
        let value = serde_json::to_vec(record).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(GROUPS).map_err(map_err!(Table))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, desired = record.desired_capacity, "group stored");
        Ok(())
    }

    pub fn get_group(&self, group: &TargetGroup) -> StateResult<Option<GroupRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(GROUPS).map_err(map_err!(Table))?;
        match table.get(group.key().as_str()).map_err(map_err!(Read))? {
            Some(guard) => {
                let record: GroupRecord =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// All group records, ordered by key.
    pub fn list_groups(&self) -> StateResult<Vec<GroupRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(GROUPS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let record: GroupRecord =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(record);
        }
        Ok(results)
    }

    /// Change a group's desired capacity and record the activity.
    ///
    /// Fails when the group is unknown, the target is outside the group's
    /// bounds, or `honor_cooldown` is set and the last change is still
    /// inside the cooldown window. Returns `None` when the group is
    /// already at `desired`.
    pub fn set_desired_capacity(
        &self,
        group: &TargetGroup,
        desired: i64,
        honor_cooldown: bool,
        now_millis: u64,
    ) -> StateResult<Option<ScalingActivity>> {
        let key = group.key();
        let now = now_millis / 1000;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let activity;
        {
            let mut groups = txn.open_table(GROUPS).map_err(map_err!(Table))?;
            let mut record: GroupRecord = match groups.get(key.as_str()).map_err(map_err!(Read))? {
                Some(guard) => serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?,
                None => return Err(StateError::NotFound(key)),
            };
            record.check_change(desired, honor_cooldown, now)?;
            if record.desired_capacity == desired {
                return Ok(None);
            }

            let from = record.desired_capacity;
            record.desired_capacity = desired;
            record.last_scaled_at = Some(now);
            let value = serde_json::to_vec(&record).map_err(map_err!(Serialize))?;
            groups
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;

            let mut activities = txn.open_table(ACTIVITIES).map_err(map_err!(Table))?;
            // Two changes inside the same millisecond get consecutive keys.
            let mut at_millis = now_millis;
            while activities
                .get(activity_key(&key, at_millis).as_str())
                .map_err(map_err!(Read))?
                .is_some()
            {
                at_millis += 1;
            }
            let entry = ScalingActivity {
                group: key.clone(),
                from,
                to: desired,
                honor_cooldown,
                at_millis,
            };
            let value = serde_json::to_vec(&entry).map_err(map_err!(Serialize))?;
            activities
                .insert(activity_key(&key, at_millis).as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
            activity = entry;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, from = activity.from, to = desired, "desired capacity changed");
        Ok(Some(activity))
    }

    /// Applied changes for a group, oldest first.
    pub fn list_activities(&self, group: &TargetGroup) -> StateResult<Vec<ScalingActivity>> {
        let key = group.key();
        let start = activity_key(&key, 0);
        let end = activity_key(&key, u64::MAX);
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(ACTIVITIES).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table
            .range(start.as_str()..=end.as_str())
            .map_err(map_err!(Read))?
        {
            let (k, value) = entry.map_err(map_err!(Read))?;
            if k.value().len() != start.len() {
                continue;
            }
            let activity: ScalingActivity =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(activity);
        }
        Ok(results)
    }

    // ── Series ─────────────────────────────────────────────────────

    /// Append (or overwrite) the sample of `query` at `point.timestamp`.
    pub fn push_point(&self, query: &str, point: DataPoint) -> StateResult<()> {
        let key = series_key(query, point.timestamp);
        let value = serde_json::to_vec(&point).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(SERIES).map_err(map_err!(Table))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(query, timestamp = point.timestamp, value = point.value, "point stored");
        Ok(())
    }

    /// Samples of `query` inside `window`, ascending by timestamp.
    pub fn query_points(&self, query: &str, window: TimeWindow) -> StateResult<Vec<DataPoint>> {
        let start = series_key(query, window.start);
        let end = series_key(query, window.end);
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(SERIES).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table
            .range(start.as_str()..=end.as_str())
            .map_err(map_err!(Read))?
        {
            let (k, value) = entry.map_err(map_err!(Read))?;
            // Skip keys of other queries that share this one as a prefix.
            if k.value().len() != start.len() {
                continue;
            }
            let point: DataPoint =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(point);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workers() -> TargetGroup {
        TargetGroup::new("workers", "us-east-1")
    }

    fn seeded() -> StateStore {
        let store = StateStore::open_in_memory().unwrap();
        store
            .put_group(&GroupRecord::new(&workers(), 4, 2, 8))
            .unwrap();
        store
    }

    // ── Group records ──────────────────────────────────────────────

    #[test]
    fn group_put_and_get() {
        let store = seeded();
        let record = store.get_group(&workers()).unwrap().unwrap();
        assert_eq!(record.desired_capacity, 4);
        assert_eq!(record.table_key(), "us-east-1/workers");
    }

    #[test]
    fn group_get_nonexistent_returns_none() {
        let store = StateStore::open_in_memory().unwrap();
        assert!(store.get_group(&workers()).unwrap().is_none());
    }

    #[test]
    fn group_put_rejects_inverted_bounds() {
        let store = StateStore::open_in_memory().unwrap();
        let err = store
            .put_group(&GroupRecord::new(&workers(), 4, 8, 2))
            .unwrap_err();
        assert!(matches!(err, StateError::InvalidGroup { .. }));
        assert!(store.list_groups().unwrap().is_empty());
    }

    #[test]
    fn group_list_is_key_ordered() {
        let store = seeded();
        store
            .put_group(&GroupRecord::new(&TargetGroup::new("api", "eu-west-1"), 1, 1, 3))
            .unwrap();
        let keys: Vec<String> = store
            .list_groups()
            .unwrap()
            .iter()
            .map(GroupRecord::table_key)
            .collect();
        assert_eq!(keys, vec!["eu-west-1/api", "us-east-1/workers"]);
    }

    // ── Capacity changes ───────────────────────────────────────────

    #[test]
    fn set_desired_capacity_updates_record_and_logs_activity() {
        let store = seeded();
        let activity = store
            .set_desired_capacity(&workers(), 6, true, 1_000_000)
            .unwrap()
            .unwrap();
        assert_eq!((activity.from, activity.to), (4, 6));

        let record = store.get_group(&workers()).unwrap().unwrap();
        assert_eq!(record.desired_capacity, 6);
        assert_eq!(record.last_scaled_at, Some(1_000));
        assert_eq!(store.list_activities(&workers()).unwrap(), vec![activity]);
    }

    #[test]
    fn set_desired_capacity_to_current_is_noop() {
        let store = seeded();
        assert!(
            store
                .set_desired_capacity(&workers(), 4, true, 1_000_000)
                .unwrap()
                .is_none()
        );
        assert!(store.list_activities(&workers()).unwrap().is_empty());
    }

    #[test]
    fn set_desired_capacity_rejects_unknown_and_out_of_bounds() {
        let store = seeded();
        let unknown = TargetGroup::new("ghost", "us-east-1");
        assert!(matches!(
            store.set_desired_capacity(&unknown, 3, false, 0),
            Err(StateError::NotFound(_))
        ));
        assert!(matches!(
            store.set_desired_capacity(&workers(), 1, false, 0),
            Err(StateError::OutOfBounds { desired: 1, .. })
        ));
        assert_eq!(store.get_group(&workers()).unwrap().unwrap().desired_capacity, 4);
    }

    #[test]
    fn cooldown_blocks_only_honoring_requests() {
        let store = StateStore::open_in_memory().unwrap();
        store
            .put_group(&GroupRecord::new(&workers(), 4, 2, 8).with_cooldown(300))
            .unwrap();
        store
            .set_desired_capacity(&workers(), 5, true, 1_000_000)
            .unwrap();

        let err = store
            .set_desired_capacity(&workers(), 6, true, 1_100_000)
            .unwrap_err();
        assert!(matches!(
            err,
            StateError::CooldownActive {
                remaining_secs: 200,
                ..
            }
        ));

        store
            .set_desired_capacity(&workers(), 6, false, 1_100_000)
            .unwrap();
        assert_eq!(store.list_activities(&workers()).unwrap().len(), 2);
    }

    #[test]
    fn same_millisecond_activities_are_kept() {
        let store = seeded();
        store.set_desired_capacity(&workers(), 5, false, 500).unwrap();
        store.set_desired_capacity(&workers(), 6, false, 500).unwrap();
        let log = store.list_activities(&workers()).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].to, 5);
        assert_eq!(log[1].at_millis, 501);
    }

    #[test]
    fn activities_are_scoped_to_group() {
        let store = seeded();
        let other = TargetGroup::new("workers-batch", "us-east-1");
        store
            .put_group(&GroupRecord::new(&other, 1, 1, 4))
            .unwrap();
        store.set_desired_capacity(&other, 2, false, 10).unwrap();
        store.set_desired_capacity(&workers(), 5, false, 20).unwrap();

        let log = store.list_activities(&workers()).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].group, "us-east-1/workers");
    }

    // ── Series ─────────────────────────────────────────────────────

    #[test]
    fn query_points_returns_window_in_order() {
        let store = StateStore::open_in_memory().unwrap();
        for (ts, v) in [(300, 3.0), (100, 1.0), (200, 2.0), (400, 4.0)] {
            store.push_point("cpu", DataPoint::new(ts, v)).unwrap();
        }
        let points = store
            .query_points("cpu", TimeWindow { start: 100, end: 300 })
            .unwrap();
        let values: Vec<f64> = points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn query_points_ignores_other_queries() {
        let store = StateStore::open_in_memory().unwrap();
        store.push_point("cpu", DataPoint::new(100, 1.0)).unwrap();
        store.push_point("cpu.user", DataPoint::new(100, 9.0)).unwrap();
        store.push_point("mem", DataPoint::new(100, 7.0)).unwrap();

        let points = store
            .query_points("cpu", TimeWindow { start: 0, end: 1_000 })
            .unwrap();
        assert_eq!(points, vec![DataPoint::new(100, 1.0)]);
    }

    #[test]
    fn query_points_empty_window() {
        let store = StateStore::open_in_memory().unwrap();
        store.push_point("cpu", DataPoint::new(100, 1.0)).unwrap();
        assert!(
            store
                .query_points("cpu", TimeWindow { start: 200, end: 300 })
                .unwrap()
                .is_empty()
        );
    }

    // ── Persistence ────────────────────────────────────────────────

    #[test]
    fn persistent_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.redb");

        {
            let store = StateStore::open(&path).unwrap();
            store
                .put_group(&GroupRecord::new(&workers(), 4, 2, 8))
                .unwrap();
            store.push_point("cpu", DataPoint::new(100, 42.0)).unwrap();
        }

        let store = StateStore::open(&path).unwrap();
        assert_eq!(store.list_groups().unwrap().len(), 1);
        assert_eq!(
            store
                .query_points("cpu", TimeWindow { start: 0, end: 200 })
                .unwrap(),
            vec![DataPoint::new(100, 42.0)]
        );
    }
}
