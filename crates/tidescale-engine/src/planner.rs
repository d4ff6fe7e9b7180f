//! Capacity planning: clamps a requested delta into the group bounds.

use tidescale_core::GroupState;

use crate::error::PreconditionError;

/// Outcome of applying a delta to the current capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityPlan {
    pub current: i64,
    pub desired: i64,
    /// False when the clamped target equals the current capacity.
    pub changed: bool,
}

/// Compute `current + delta` clamped into `[min, max]`.
///
/// Bounds win over the delta: an overshooting request is capped, not
/// rejected. `min > max` is an error.
pub fn plan(current: i64, min: i64, max: i64, delta: i64) -> Result<CapacityPlan, PreconditionError> {
    if min > max {
        return Err(PreconditionError::InvertedBounds { min, max });
    }
    let desired = current.saturating_add(delta).clamp(min, max);
    Ok(CapacityPlan {
        current,
        desired,
        changed: desired != current,
    })
}

/// [`plan`] against a fetched group state.
pub fn plan_for(state: &GroupState, delta: i64) -> Result<CapacityPlan, PreconditionError> {
    plan(state.current, state.min, state.max, delta)
}
