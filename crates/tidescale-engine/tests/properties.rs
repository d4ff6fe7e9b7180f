//! Property tests for the pure decision components.

use proptest::prelude::*;
use tidescale_core::{DataPoint, Direction, ScaleRule, Transform};
use tidescale_engine::{plan, reduce, select_rule};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Non-empty series with ascending timestamps.
fn arb_series() -> impl Strategy<Value = Vec<DataPoint>> {
    prop::collection::vec(-1.0e6f64..1.0e6, 1..64).prop_map(|vals| {
        vals.into_iter()
            .enumerate()
            .map(|(i, v)| DataPoint::new(i as u64 * 15, v))
            .collect()
    })
}

/// Distinct thresholds as integers, so boundary values are reachable.
fn arb_bands() -> impl Strategy<Value = Vec<ScaleRule>> {
    prop::collection::btree_set(-50i32..50, 1..8).prop_map(|set| {
        set.into_iter()
            .enumerate()
            .map(|(i, t)| ScaleRule::new(t as f64, i as i64 + 1))
            .collect()
    })
}

// ---------------------------------------------------------------------------
// Reducer
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn count_equals_length(series in arb_series()) {
        prop_assert_eq!(reduce(&Transform::Count, &series).unwrap(), series.len() as f64);
    }

    #[test]
    fn min_and_max_bound_every_value(series in arb_series()) {
        let min = reduce(&Transform::Min, &series).unwrap();
        let max = reduce(&Transform::Max, &series).unwrap();
        for p in &series {
            prop_assert!(min <= p.value && p.value <= max);
        }
        prop_assert!(series.iter().any(|p| p.value == min));
        prop_assert!(series.iter().any(|p| p.value == max));
    }

    #[test]
    fn avg_lies_between_min_and_max(series in arb_series()) {
        let avg = reduce(&Transform::Avg, &series).unwrap();
        let min = reduce(&Transform::Min, &series).unwrap();
        let max = reduce(&Transform::Max, &series).unwrap();
        let slack = 1e-6 * max.abs().max(min.abs()).max(1.0);
        prop_assert!(avg >= min - slack && avg <= max + slack);
    }

    #[test]
    fn last_is_final_point(series in arb_series()) {
        prop_assert_eq!(
            reduce(&Transform::Last, &series).unwrap(),
            series[series.len() - 1].value
        );
    }
}

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn up_selects_highest_threshold_below_value(bands in arb_bands(), value in -60i32..60) {
        let value = value as f64;
        let expected = bands
            .iter()
            .filter(|r| value > r.threshold)
            .max_by(|a, b| a.threshold.total_cmp(&b.threshold));
        prop_assert_eq!(select_rule(&bands, value, Direction::Up), expected);
    }

    #[test]
    fn down_selects_lowest_threshold_above_value(bands in arb_bands(), value in -60i32..60) {
        let value = value as f64;
        let expected = bands
            .iter()
            .filter(|r| value < r.threshold)
            .min_by(|a, b| a.threshold.total_cmp(&b.threshold));
        prop_assert_eq!(select_rule(&bands, value, Direction::Down), expected);
    }

    #[test]
    fn threshold_value_never_matches_its_own_band(bands in arb_bands(), pick in any::<prop::sample::Index>()) {
        let rule = &bands[pick.index(bands.len())];
        for direction in [Direction::Up, Direction::Down] {
            if let Some(selected) = select_rule(&bands, rule.threshold, direction) {
                prop_assert_ne!(selected.threshold, rule.threshold);
            }
        }
    }

    #[test]
    fn selection_ignores_listing_order(bands in arb_bands(), value in -60i32..60) {
        let mut reversed = bands.clone();
        reversed.reverse();
        for direction in [Direction::Up, Direction::Down] {
            prop_assert_eq!(
                select_rule(&bands, value as f64, direction),
                select_rule(&reversed, value as f64, direction)
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Planner
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn plan_stays_in_bounds_and_is_idempotent(
        current in -5i64..40,
        min in 0i64..10,
        span in 0i64..20,
        delta in -30i64..30,
    ) {
        let max = min + span;
        let first = plan(current, min, max, delta).unwrap();
        prop_assert!(first.desired >= min && first.desired <= max);
        prop_assert_eq!(first.changed, first.desired != current);

        // Re-applying the same delta from the clamped target moves further
        // only while there is room; at a bound it is a no-op.
        let at_bound = (first.desired == max && delta >= 0) || (first.desired == min && delta <= 0);
        let second = plan(first.desired, min, max, delta).unwrap();
        if at_bound {
            prop_assert!(!second.changed);
        }
    }
}
