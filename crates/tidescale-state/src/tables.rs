//! redb table definitions for the local state store.
//!
//! Every table uses `&str` keys and `&[u8]` values (JSON-serialized).
//! Timestamps inside keys are zero-padded to 20 digits so lexical order
//! matches numeric order and range scans come back sorted.

use redb::TableDefinition;

/// Group records keyed by `{region}/{name}`.
pub const GROUPS: TableDefinition<&str, &[u8]> = TableDefinition::new("groups");

/// Metric samples keyed by `{query}@{timestamp:020}`.
pub const SERIES: TableDefinition<&str, &[u8]> = TableDefinition::new("series");

/// Applied capacity changes keyed by `{region}/{name}@{millis:020}`.
pub const ACTIVITIES: TableDefinition<&str, &[u8]> = TableDefinition::new("activities");
