//! tidescale-engine — threshold-band autoscaling decisions.
//!
//! Turns a metric time series into a bounded, idempotent capacity change
//! for one resource group. The pure pieces (reducer, selector, planner)
//! are composed by the [`Evaluator`] with two collaborators supplied by
//! the caller: a [`MetricSource`] and a [`GroupController`].
//!
//! # Evaluation Pass
//!
//! ```text
//! validate spec            (fatal on missing query / malformed bands)
//! window = now - lookback  (lookback defaults to 5m)
//! series = source.query(window, query)
//! value  = reduce(transform, series)   (no transform -> 0)
//!
//! rule = highest up band with value > threshold
//!     ?? lowest down band with value < threshold
//! none -> NoMatch
//!
//! state   = groups.describe(group)
//! desired = clamp(current + rule.count, min, max)
//! desired == current -> Unchanged
//! else groups.set_desired_capacity(group, desired, honor_cooldown, dry_run)
//! ```
//!
//! The engine does not schedule itself, keeps no state between passes,
//! and never retries a failed collaborator call.

pub mod collaborator;
pub mod error;
pub mod evaluator;
pub mod planner;
pub mod reducer;
pub mod selector;

pub use collaborator::{GroupController, MetricSource};
pub use error::{ErrorKind, EvaluateError, EvaluateResult, PreconditionError, Stage};
pub use evaluator::{Evaluator, PassOutcome, PassReport};
pub use planner::{CapacityPlan, plan, plan_for};
pub use reducer::{reduce, reduce_configured};
pub use selector::{Selection, select_action, select_rule};
