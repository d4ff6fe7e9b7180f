//! scaler.toml configuration parser.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::duration::{DEFAULT_LOOKBACK, parse_duration};
use crate::error::{ConfigError, ConfigResult};
use crate::types::{Direction, TargetGroup, Transform};

/// Pass budget used when the config does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerConfig {
    /// Compute and log scaling actions without applying them.
    #[serde(default)]
    pub dry_run: bool,
    /// Upper bound on one evaluation pass (e.g. "30s").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    #[serde(default)]
    pub metrics: Vec<MetricSpec>,
}

/// One metric to watch and the group it scales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSpec {
    #[serde(default)]
    pub name: String,
    /// Passed verbatim to the metric source.
    #[serde(default)]
    pub query: String,
    /// How far back to query, e.g. "10m". Defaults to five minutes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookback: Option<String>,
    /// Reduction applied to the series. Without one the series reduces to 0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
    pub group: TargetGroup,
    #[serde(default)]
    pub scale_up: Vec<ScaleRule>,
    #[serde(default)]
    pub scale_down: Vec<ScaleRule>,
}

/// One threshold band and the capacity delta it requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleRule {
    pub threshold: f64,
    #[serde(alias = "count_delta")]
    pub count: i64,
    #[serde(default = "default_honor_cooldown")]
    pub honor_cooldown: bool,
}

fn default_honor_cooldown() -> bool {
    true
}

impl ScaleRule {
    pub fn new(threshold: f64, count: i64) -> Self {
        Self {
            threshold,
            count,
            honor_cooldown: true,
        }
    }
}

impl ScalerConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config = Self::from_toml(&content)?;
        debug!(?path, metrics = config.metrics.len(), "scaler config loaded");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// The per-pass budget. An unparsable value is an error, not a default.
    pub fn pass_timeout(&self) -> ConfigResult<Duration> {
        match &self.timeout {
            None => Ok(DEFAULT_TIMEOUT),
            Some(raw) => parse_duration(raw)
                .filter(|d| !d.is_zero())
                .ok_or_else(|| ConfigError::Timeout(raw.clone())),
        }
    }

    /// Every fatal finding across the whole file.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut findings = Vec::new();
        if let Err(e) = self.pass_timeout() {
            findings.push(e);
        }
        for metric in &self.metrics {
            findings.extend(metric.findings());
        }
        findings
    }
}

impl MetricSpec {
    pub fn rules(&self, direction: Direction) -> &[ScaleRule] {
        match direction {
            Direction::Up => &self.scale_up,
            Direction::Down => &self.scale_down,
        }
    }

    /// The configured lookback if present, parsable and non-zero.
    pub fn parsed_lookback(&self) -> Option<Duration> {
        self.lookback
            .as_deref()
            .and_then(parse_duration)
            .filter(|d| !d.is_zero())
    }

    /// The lookback window, falling back to [`DEFAULT_LOOKBACK`].
    pub fn lookback_window(&self) -> Duration {
        self.parsed_lookback().unwrap_or(DEFAULT_LOOKBACK)
    }

    /// Checks that must pass before a pass makes any external call.
    pub fn validate(&self) -> ConfigResult<()> {
        match self.findings().into_iter().next() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Non-fatal findings: things that silently degrade at evaluation time.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        match &self.transform {
            None => warnings.push(format!(
                "metric `{}` has no transform; it will reduce to 0",
                self.name
            )),
            Some(transform) if !transform.is_recognized() => warnings.push(format!(
                "metric `{}` uses unrecognized transform `{transform}`; it will reduce to 0",
                self.name
            )),
            Some(_) => {}
        }
        if let Some(raw) = &self.lookback
            && self.parsed_lookback().is_none()
        {
            warnings.push(format!(
                "metric `{}` lookback `{raw}` is not a duration; using {}s",
                self.name,
                DEFAULT_LOOKBACK.as_secs()
            ));
        }
        if self.scale_up.is_empty() && self.scale_down.is_empty() {
            warnings.push(format!("metric `{}` has no scale rules", self.name));
        }
        for direction in [Direction::Up, Direction::Down] {
            for rule in self.rules(direction).iter().filter(|r| r.count == 0) {
                warnings.push(format!(
                    "metric `{}` scale {direction} rule at threshold {} has count 0 and never changes capacity",
                    self.name, rule.threshold
                ));
            }
        }
        warnings
    }

    fn findings(&self) -> Vec<ConfigError> {
        let mut findings = Vec::new();
        if self.query.trim().is_empty() {
            findings.push(ConfigError::MissingQuery {
                metric: self.name.clone(),
            });
        }
        for direction in [Direction::Up, Direction::Down] {
            findings.extend(self.rule_findings(direction));
        }
        findings
    }

    /// Bands must be finite and distinct within a direction. The delta is a
    /// plain signed count; a down band may raise capacity.
    fn rule_findings(&self, direction: Direction) -> Vec<ConfigError> {
        let rules = self.rules(direction);
        let mut findings = Vec::new();

        for rule in rules {
            if !rule.threshold.is_finite() {
                findings.push(ConfigError::NonFiniteThreshold {
                    metric: self.name.clone(),
                    direction,
                    threshold: rule.threshold,
                });
            }
        }

        let mut thresholds: Vec<f64> = rules.iter().map(|r| r.threshold).collect();
        thresholds.sort_by(f64::total_cmp);
        for pair in thresholds.windows(2) {
            if pair[0] == pair[1] {
                findings.push(ConfigError::DuplicateThreshold {
                    metric: self.name.clone(),
                    direction,
                    threshold: pair[0],
                });
            }
        }
        findings
    }
}
