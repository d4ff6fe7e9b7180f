//! Subcommand implementations.

pub mod evaluate;
pub mod group;
pub mod series;
pub mod validate;
pub mod watch;

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use tidescale_core::{MetricSpec, ScalerConfig};
use tidescale_engine::Evaluator;
use tidescale_state::{LocalBackend, StateStore};

/// Flags shared by `evaluate` and `watch`.
pub struct PassOptions {
    pub dry_run: bool,
    /// Seconds; overrides the config file's `timeout`.
    pub timeout: Option<u64>,
    /// Metric names to keep; empty means all.
    pub metrics: Vec<String>,
}

pub(crate) fn open_store(path: &Path) -> Result<StateStore> {
    StateStore::open(path).with_context(|| format!("opening state at {}", path.display()))
}

/// Load the config and build an evaluator over the local backend.
///
/// Returns the metrics selected by `options`, with their non-fatal
/// findings already logged.
pub(crate) fn prepare(
    state: &Path,
    config_path: &Path,
    options: &PassOptions,
) -> Result<(Evaluator, Vec<MetricSpec>)> {
    let config = ScalerConfig::from_file(config_path)?;
    let timeout = match options.timeout {
        Some(0) => bail!("--timeout must be at least one second"),
        Some(secs) => Duration::from_secs(secs),
        None => config.pass_timeout()?,
    };
    let dry_run = options.dry_run || config.dry_run;

    let specs = select_metrics(config.metrics, &options.metrics)?;
    for spec in &specs {
        for warning in spec.warnings() {
            warn!(metric = %spec.name, "{warning}");
        }
    }

    let backend = Arc::new(LocalBackend::new(open_store(state)?));
    let evaluator = Evaluator::new(backend.clone(), backend)
        .with_dry_run(dry_run)
        .with_timeout(timeout);
    info!(
        metrics = specs.len(),
        dry_run,
        timeout_secs = timeout.as_secs_f64(),
        "evaluator ready"
    );
    Ok((evaluator, specs))
}

fn select_metrics(all: Vec<MetricSpec>, wanted: &[String]) -> Result<Vec<MetricSpec>> {
    if let Some(unknown) = wanted.iter().find(|w| !all.iter().any(|m| &m.name == *w)) {
        bail!("no metric named `{unknown}` in config");
    }
    if wanted.is_empty() {
        return Ok(all);
    }
    Ok(all.into_iter().filter(|m| wanted.contains(&m.name)).collect())
}

/// Run every pass once and print one line per metric. Returns the number
/// of failed passes.
pub(crate) async fn run_round(evaluator: &Evaluator, specs: &[MetricSpec]) -> usize {
    let mut failed = 0;
    for (metric, result) in evaluator.evaluate_all(specs).await {
        match result {
            Ok(report) => println!("{}", report.summary()),
            Err(e) => {
                failed += 1;
                println!("{metric}: failed ({:?}): {e}", e.kind());
            }
        }
    }
    failed
}

pub(crate) fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
