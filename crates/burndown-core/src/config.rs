//! burndown.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{BudgetError, BudgetResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BurndownConfig {
    pub query: QueryConfig,
    pub projection: ProjectionConfig,
    pub dashboard: DashboardConfig,
}

/// Where and how to fetch the budget and error series.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// GraphQL endpoint, `http://host:port/path`.
    pub endpoint: String,
    pub account_id: u64,
    /// SLO success target, e.g. 0.993 for 99.3%.
    pub target_success_rate: f64,
    pub event_type: String,
    /// NRQL `SINCE` clause, e.g. "1 month ago".
    pub window: String,
    pub timeout: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:4000/graphql".to_string(),
            account_id: 2230556,
            target_success_rate: 0.993,
            event_type: "Transaction".to_string(),
            window: "1 month ago".to_string(),
            timeout: "10s".to_string(),
        }
    }
}

impl QueryConfig {
    pub fn timeout(&self) -> BudgetResult<Duration> {
        let timeout = parse_duration(&self.timeout)
            .ok_or_else(|| BudgetError::Config(format!("invalid query timeout '{}'", self.timeout)))?;
        if timeout.is_zero() {
            return Err(BudgetError::Config("query timeout must be non-zero".to_string()));
        }
        Ok(timeout)
    }
}

/// Longest forecast accepted from config.
pub const MAX_STEPS: u32 = 366;

/// Shape of the linear forecast.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Number of forecast points.
    pub steps: u32,
    /// Spacing between forecast points.
    pub step: String,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            steps: 20,
            step: "1d".to_string(),
        }
    }
}

impl ProjectionConfig {
    /// Number of forecast points, within `1..=MAX_STEPS`.
    pub fn forecast_steps(&self) -> BudgetResult<u32> {
        if !(1..=MAX_STEPS).contains(&self.steps) {
            return Err(BudgetError::Config(format!(
                "projection steps must be between 1 and {MAX_STEPS}, got {}",
                self.steps
            )));
        }
        Ok(self.steps)
    }

    pub fn step_secs(&self) -> BudgetResult<i64> {
        let step = parse_duration(&self.step)
            .ok_or_else(|| BudgetError::Config(format!("invalid projection step '{}'", self.step)))?;
        if step.as_secs() == 0 {
            return Err(BudgetError::Config(
                "projection step must be at least one second".to_string(),
            ));
        }
        i64::try_from(step.as_secs())
            .map_err(|_| BudgetError::Config(format!("projection step '{}' is too large", self.step)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub title: String,
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: "Error budget forecast".to_string(),
            port: 8080,
        }
    }
}

impl BurndownConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: BurndownConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values that would make every load fail.
    pub fn validate(&self) -> BudgetResult<()> {
        let rate = self.query.target_success_rate;
        if !(0.0..=1.0).contains(&rate) {
            return Err(BudgetError::Config(format!(
                "target_success_rate {rate} is outside [0, 1]"
            )));
        }
        self.query.timeout()?;
        self.projection.forecast_steps()?;
        self.projection.step_secs()?;
        Ok(())
    }
}

/// Parse a duration string like "500ms", "5s", "2m", "1h", "1d".
///
/// A bare number is read as seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        ms.parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        scaled(mins, 60)
    } else if let Some(hours) = s.strip_suffix('h') {
        scaled(hours, 3600)
    } else if let Some(days) = s.strip_suffix('d') {
        scaled(days, 86_400)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}

fn scaled(n: &str, unit_secs: u64) -> Option<Duration> {
    n.parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(unit_secs))
        .map(Duration::from_secs)
}
