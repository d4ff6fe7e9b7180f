//! Evaluator: runs one evaluation pass per metric.
//!
//! A pass fetches the metric's series, reduces it, matches the result
//! against the up and down bands, and when a band matches, plans and
//! applies a clamped capacity change through the group controller.
//! Group state is fetched fresh on every pass and never cached.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use tidescale_core::config::DEFAULT_TIMEOUT;
use tidescale_core::{
    ConfigError, DEFAULT_LOOKBACK, Direction, MetricSpec, TargetGroup, TimeWindow,
};

use crate::collaborator::{GroupController, MetricSource};
use crate::error::{EvaluateError, EvaluateResult, Stage};
use crate::planner::plan_for;
use crate::reducer::reduce_configured;
use crate::selector::select_action;

/// What a successful pass decided.
#[derive(Debug, Clone, PartialEq)]
pub enum PassOutcome {
    /// The value fell outside every band.
    NoMatch,
    /// A band matched but the clamped target equals current capacity.
    Unchanged {
        direction: Direction,
        threshold: f64,
        capacity: i64,
    },
    /// Capacity was changed, or would have been in dry-run mode.
    Scaled {
        direction: Direction,
        threshold: f64,
        from: i64,
        to: i64,
        dry_run: bool,
    },
}

/// Result of one successful pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PassReport {
    pub metric: String,
    pub group: TargetGroup,
    /// The reduced series value.
    pub value: f64,
    pub outcome: PassOutcome,
}

impl PassReport {
    /// True if the pass asked the controller for a new capacity.
    pub fn changed(&self) -> bool {
        matches!(self.outcome, PassOutcome::Scaled { .. })
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        match &self.outcome {
            PassOutcome::NoMatch => format!(
                "{}: value {} matches no threshold, no action",
                self.metric, self.value
            ),
            PassOutcome::Unchanged {
                direction,
                threshold,
                capacity,
            } => format!(
                "{}: value {} crosses {direction} threshold {threshold}, {} already at {capacity}",
                self.metric, self.value, self.group
            ),
            PassOutcome::Scaled {
                direction,
                threshold,
                from,
                to,
                dry_run,
            } => format!(
                "{}: value {} crosses {direction} threshold {threshold}, {} {from} -> {to}{}",
                self.metric,
                self.value,
                self.group,
                if *dry_run { " (dry run)" } else { "" }
            ),
        }
    }
}

/// Runs evaluation passes against a metric source and a group controller.
///
/// Cheap to clone; clones share the collaborators.
#[derive(Clone)]
pub struct Evaluator {
    source: Arc<dyn MetricSource>,
    groups: Arc<dyn GroupController>,
    dry_run: bool,
    /// Budget for all external calls of one pass.
    timeout: Duration,
}

impl Evaluator {
    pub fn new(source: Arc<dyn MetricSource>, groups: Arc<dyn GroupController>) -> Self {
        Self {
            source,
            groups,
            dry_run: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Compute and log actions without changing any group.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Bound each pass; a pass still waiting on a collaborator after
    /// `timeout` fails with [`EvaluateError::Timeout`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Run one pass for `spec` ending now.
    pub async fn evaluate(&self, spec: &MetricSpec) -> EvaluateResult<PassReport> {
        self.evaluate_at(spec, epoch_secs()).await
    }

    /// Run one pass for `spec` with the query window ending at `now`
    /// (unix seconds).
    pub async fn evaluate_at(&self, spec: &MetricSpec, now: u64) -> EvaluateResult<PassReport> {
        let deadline = Instant::now() + self.timeout;
        let metric = spec.name.as_str();

        spec.validate().map_err(|source| EvaluateError::Config {
            metric: metric.to_string(),
            source,
        })?;

        let lookback = match spec.parsed_lookback() {
            Some(lookback) => lookback,
            None => {
                match &spec.lookback {
                    Some(raw) => warn!(
                        %metric,
                        lookback = %raw,
                        default_secs = DEFAULT_LOOKBACK.as_secs(),
                        "unparsable lookback, using default"
                    ),
                    None => debug!(
                        %metric,
                        default_secs = DEFAULT_LOOKBACK.as_secs(),
                        "no lookback configured, using default"
                    ),
                }
                DEFAULT_LOOKBACK
            }
        };
        let window = TimeWindow::trailing(now, lookback);

        debug!(%metric, query = %spec.query, %window, "querying metric");
        let points = self
            .bounded(metric, Stage::FetchSeries, deadline, self.source.query(window, &spec.query))
            .await?
            .map_err(|source| EvaluateError::Source {
                metric: metric.to_string(),
                query: spec.query.clone(),
                window,
                source,
            })?;

        let value = reduce_configured(spec.transform.as_ref(), &points).map_err(|_| {
            EvaluateError::EmptySeries {
                metric: metric.to_string(),
                query: spec.query.clone(),
                window,
            }
        })?;

        let Some(selection) = select_action(spec, value) else {
            info!(%metric, value, "value does not match any scale threshold interval");
            return Ok(self.report(spec, value, PassOutcome::NoMatch));
        };
        let rule = selection.rule;
        let direction = selection.direction;
        info!(
            %metric,
            value,
            threshold = rule.threshold,
            %direction,
            count = rule.count,
            "value matches scale threshold"
        );

        let group = &spec.group;
        let state = self
            .bounded(metric, Stage::DescribeGroup, deadline, self.groups.describe(group))
            .await?
            .map_err(|source| EvaluateError::Describe {
                metric: metric.to_string(),
                group: group.key(),
                source,
            })?;

        let plan = plan_for(&state, rule.count).map_err(|_| EvaluateError::Config {
            metric: metric.to_string(),
            source: ConfigError::InvertedBounds {
                group: group.key(),
                min: state.min,
                max: state.max,
            },
        })?;

        if !plan.changed {
            info!(
                %metric,
                %group,
                capacity = state.current,
                min = state.min,
                max = state.max,
                "already at target capacity"
            );
            return Ok(self.report(
                spec,
                value,
                PassOutcome::Unchanged {
                    direction,
                    threshold: rule.threshold,
                    capacity: state.current,
                },
            ));
        }

        if self.dry_run {
            info!(
                %metric,
                %group,
                from = plan.current,
                to = plan.desired,
                honor_cooldown = rule.honor_cooldown,
                "dry run: would set desired capacity"
            );
        }

        self.bounded(
            metric,
            Stage::Apply,
            deadline,
            self.groups
                .set_desired_capacity(group, plan.desired, rule.honor_cooldown, self.dry_run),
        )
        .await?
        .map_err(|source| EvaluateError::Apply {
            metric: metric.to_string(),
            group: group.key(),
            desired: plan.desired,
            source,
        })?;

        if !self.dry_run {
            info!(
                %metric,
                %group,
                from = plan.current,
                to = plan.desired,
                "desired capacity set"
            );
        }

        Ok(self.report(
            spec,
            value,
            PassOutcome::Scaled {
                direction,
                threshold: rule.threshold,
                from: plan.current,
                to: plan.desired,
                dry_run: self.dry_run,
            },
        ))
    }

    /// Evaluate every metric concurrently, one task per metric.
    ///
    /// Results come back in input order. A failed or panicked pass is
    /// reported in place and never affects the others.
    pub async fn evaluate_all(
        &self,
        specs: &[MetricSpec],
    ) -> Vec<(String, EvaluateResult<PassReport>)> {
        let now = epoch_secs();
        let handles: Vec<_> = specs
            .iter()
            .cloned()
            .map(|spec| {
                let evaluator = self.clone();
                let metric = spec.name.clone();
                let handle = tokio::spawn(async move { evaluator.evaluate_at(&spec, now).await });
                (metric, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (metric, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(EvaluateError::Aborted {
                    metric: metric.clone(),
                    reason: e.to_string(),
                }),
            };
            if let Err(e) = &result {
                error!(%metric, kind = ?e.kind(), error = %e, "evaluation pass failed");
            }
            results.push((metric, result));
        }

        debug!(passes = results.len(), "evaluation round complete");
        results
    }

    async fn bounded<T>(
        &self,
        metric: &str,
        stage: Stage,
        deadline: Instant,
        call: impl Future<Output = T>,
    ) -> EvaluateResult<T> {
        tokio::time::timeout_at(deadline, call)
            .await
            .map_err(|_| EvaluateError::Timeout {
                metric: metric.to_string(),
                stage,
                budget: self.timeout,
            })
    }

    fn report(&self, spec: &MetricSpec, value: f64, outcome: PassOutcome) -> PassReport {
        PassReport {
            metric: spec.name.clone(),
            group: spec.group.clone(),
            value,
            outcome,
        }
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
