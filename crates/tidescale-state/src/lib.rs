//! tidescale-state — local groups and metric series for tidescale.
//!
//! Backed by [redb](https://docs.rs/redb). Stands in for a hosted metrics
//! API and a cloud auto-scaling API so passes can run against a single
//! file (or an in-memory database in tests).
//!
//! # Layout
//!
//! All records are JSON-serialized into redb's `&[u8]` value columns.
//! Keys embed zero-padded timestamps (`{query}@{timestamp:020}`,
//! `{region}/{name}@{millis:020}`) so range scans return points and
//! activities in time order.
//!
//! [`LocalBackend`] implements both engine collaborators on top of a
//! [`StateStore`].

pub mod backend;
pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use backend::LocalBackend;
pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
