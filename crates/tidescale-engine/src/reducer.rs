//! Series reduction: collapses a time series into one scalar.

use tracing::{debug, warn};

use tidescale_core::{DataPoint, Transform};

use crate::error::PreconditionError;

/// Point values in timestamp order, ignoring timestamps.
pub fn values(points: &[DataPoint]) -> impl Iterator<Item = f64> + Clone + '_ {
    points.iter().map(|p| p.value)
}

/// Reduce `points` with `transform`.
///
/// `points` must be non-empty and ordered by ascending timestamp.
/// `min`/`max` fold from the first value, so an all-negative series
/// reduces correctly. An unrecognized transform reduces to `0.0`.
pub fn reduce(transform: &Transform, points: &[DataPoint]) -> Result<f64, PreconditionError> {
    let (first, last) = match (points.first(), points.last()) {
        (Some(first), Some(last)) => (first.value, last.value),
        _ => return Err(PreconditionError::EmptySeries),
    };
    let rest = values(&points[1..]);

    let value = match transform {
        Transform::Last => last,
        Transform::Avg => values(points).sum::<f64>() / points.len() as f64,
        Transform::Min => rest.fold(first, f64::min),
        Transform::Max => rest.fold(first, f64::max),
        Transform::Sum => values(points).sum(),
        Transform::Count => points.len() as f64,
        Transform::Unrecognized(name) => {
            warn!(transform = %name, "unrecognized transform, reducing to 0");
            0.0
        }
    };

    debug!(%transform, points = points.len(), value, "series reduced");
    Ok(value)
}

/// Reduce with the transform a metric is configured with, if any.
///
/// Without a transform the series still has to be non-empty; it then
/// reduces to `0.0`.
pub fn reduce_configured(
    transform: Option<&Transform>,
    points: &[DataPoint],
) -> Result<f64, PreconditionError> {
    match transform {
        Some(transform) => reduce(transform, points),
        None if points.is_empty() => Err(PreconditionError::EmptySeries),
        None => {
            warn!(points = points.len(), "no transform configured, reducing to 0");
            Ok(0.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(vals: &[f64]) -> Vec<DataPoint> {
        vals.iter()
            .enumerate()
            .map(|(i, v)| DataPoint::new(1000 + i as u64 * 60, *v))
            .collect()
    }

    #[test]
    fn averages_data_points() {
        let s = series(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(reduce(&Transform::Avg, &s), Ok(3.0));
    }

    #[test]
    fn max_of_data_points() {
        let s = series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(reduce(&Transform::Max, &s), Ok(6.0));
    }

    #[test]
    fn min_of_data_points() {
        let s = series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(reduce(&Transform::Min, &s), Ok(1.0));
    }

    #[test]
    fn last_of_data_points() {
        let s = series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(reduce(&Transform::Last, &s), Ok(7.0));
    }

    #[test]
    fn count_of_data_points() {
        let s = series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        assert_eq!(reduce(&Transform::Count, &s), Ok(8.0));
    }

    #[test]
    fn sum_of_data_points() {
        let s = series(&[1.5, 2.5, -1.0]);
        assert_eq!(reduce(&Transform::Sum, &s), Ok(3.0));
    }

    #[test]
    fn min_max_of_all_negative_series() {
        let s = series(&[-4.0, -2.5, -9.0]);
        assert_eq!(reduce(&Transform::Min, &s), Ok(-9.0));
        assert_eq!(reduce(&Transform::Max, &s), Ok(-2.5));
    }

    #[test]
    fn single_point_series() {
        let s = series(&[42.0]);
        for t in [
            Transform::Last,
            Transform::Avg,
            Transform::Min,
            Transform::Max,
            Transform::Sum,
        ] {
            assert_eq!(reduce(&t, &s), Ok(42.0), "transform {t}");
        }
        assert_eq!(reduce(&Transform::Count, &s), Ok(1.0));
    }

    #[test]
    fn unrecognized_transform_reduces_to_zero() {
        let s = series(&[5.0, 6.0]);
        assert_eq!(reduce(&Transform::parse("p99"), &s), Ok(0.0));
    }

    #[test]
    fn missing_transform_reduces_to_zero() {
        let s = series(&[5.0, 6.0]);
        assert_eq!(reduce_configured(None, &s), Ok(0.0));
        assert_eq!(reduce_configured(Some(&Transform::Avg), &s), Ok(5.5));
        assert_eq!(
            reduce_configured(None, &[]),
            Err(PreconditionError::EmptySeries)
        );
    }

    #[test]
    fn empty_series_is_rejected() {
        assert_eq!(
            reduce(&Transform::Last, &[]),
            Err(PreconditionError::EmptySeries)
        );
        assert_eq!(
            reduce(&Transform::parse("bogus"), &[]),
            Err(PreconditionError::EmptySeries)
        );
    }

    #[test]
    fn values_is_restartable() {
        let s = series(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let it = values(&s);
        let collected: Vec<f64> = it.clone().collect();
        assert_eq!(collected.len(), 5);
        assert_eq!(collected[2], 3.0);
        assert_eq!(it.count(), 5);
    }
}
