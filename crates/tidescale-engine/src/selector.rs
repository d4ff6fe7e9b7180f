//! Interval selection: picks the threshold band a value falls into.

use tidescale_core::{Direction, MetricSpec, ScaleRule};

/// A matched rule and the direction it was matched in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection<'a> {
    pub direction: Direction,
    pub rule: &'a ScaleRule,
}

/// Select the band `value` falls into.
///
/// Rules are visited in threshold order (ascending for `Up`, descending
/// for `Down`) regardless of how they are listed. Each rule the value
/// strictly passes replaces the previous match, and the scan stops at the
/// first rule it does not pass. A value equal to a threshold never
/// matches that rule.
pub fn select_rule(rules: &[ScaleRule], value: f64, direction: Direction) -> Option<&ScaleRule> {
    let mut ordered: Vec<&ScaleRule> = rules.iter().collect();
    ordered.sort_by(|a, b| a.threshold.total_cmp(&b.threshold));
    if direction == Direction::Down {
        ordered.reverse();
    }

    let mut selected = None;
    for rule in ordered {
        let passes = match direction {
            Direction::Up => value > rule.threshold,
            Direction::Down => value < rule.threshold,
        };
        if !passes {
            break;
        }
        selected = Some(rule);
    }
    selected
}

/// Try the up rules first, then the down rules.
pub fn select_action(spec: &MetricSpec, value: f64) -> Option<Selection<'_>> {
    [Direction::Up, Direction::Down]
        .into_iter()
        .find_map(|direction| {
            select_rule(spec.rules(direction), value, direction)
                .map(|rule| Selection { direction, rule })
        })
}
