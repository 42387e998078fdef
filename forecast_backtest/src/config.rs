//! Backtest configuration

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Default number of periods between two backtest windows
pub const DEFAULT_STRIDE: u32 = 7;

/// Calendar stepping derived from a frequency code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    /// Calendar days
    Daily,
    /// Month ends
    Monthly,
}

impl FromStr for Frequency {
    type Err = ForecastError;

    /// Only the first letter of the code matters, so `"D"`, `"d"` and
    /// `"MS"`/`"ME"`/`"M"` are all accepted.
    fn from_str(code: &str) -> Result<Self> {
        match code.trim().chars().next().map(|c| c.to_ascii_uppercase()) {
            Some('M') => Ok(Frequency::Monthly),
            Some('D') => Ok(Frequency::Daily),
            _ => Err(ForecastError::ConfigError(format!(
                "Unsupported frequency: {:?}",
                code
            ))),
        }
    }
}

/// Accuracy metric used to score each window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Smape,
    Mape,
    Mae,
    Mse,
    Rmse,
}

impl MetricKind {
    /// Name written into result records
    pub fn name(&self) -> &'static str {
        match self {
            MetricKind::Smape => "smape",
            MetricKind::Mape => "mape",
            MetricKind::Mae => "mae",
            MetricKind::Mse => "mse",
            MetricKind::Rmse => "rmse",
        }
    }
}

impl FromStr for MetricKind {
    type Err = ForecastError;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "smape" => Ok(MetricKind::Smape),
            "mape" => Ok(MetricKind::Mape),
            "mae" => Ok(MetricKind::Mae),
            "mse" => Ok(MetricKind::Mse),
            "rmse" => Ok(MetricKind::Rmse),
            other => Err(ForecastError::ConfigError(format!(
                "Metric {} not supported",
                other
            ))),
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What to do when a single window cannot be scored.
///
/// Applies to alignment and serialization failures. Failures of the model
/// capability itself always abort the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the run and return the error
    #[default]
    Abort,
    /// Log, remember the window as skipped and continue
    Skip,
}

fn default_date_col() -> String {
    "ds".to_string()
}

fn default_group_id() -> String {
    "unique_id".to_string()
}

fn default_target() -> String {
    "y".to_string()
}

fn default_metric() -> String {
    "smape".to_string()
}

fn default_stride() -> u32 {
    DEFAULT_STRIDE
}

/// Configuration of a backtesting run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Frequency code, e.g. `"D"` or `"M"`
    pub freq: String,
    /// Number of periods each forecast covers
    pub prediction_length: u32,
    /// Name of the date column
    #[serde(default = "default_date_col")]
    pub date_col: String,
    /// Name of the column identifying the series
    #[serde(default = "default_group_id")]
    pub group_id: String,
    /// Name of the column being forecast
    #[serde(default = "default_target")]
    pub target: String,
    /// One of smape, mape, mae, mse, rmse
    #[serde(default = "default_metric")]
    pub metric: String,
    /// Default number of periods between windows
    #[serde(default = "default_stride")]
    pub stride: u32,
    /// Policy for window-local failures
    #[serde(default)]
    pub on_window_error: FailurePolicy,
}

impl BacktestConfig {
    /// Create a configuration with the default column names, metric and stride
    pub fn new(freq: impl Into<String>, prediction_length: u32) -> Self {
        Self {
            freq: freq.into(),
            prediction_length,
            date_col: default_date_col(),
            group_id: default_group_id(),
            target: default_target(),
            metric: default_metric(),
            stride: DEFAULT_STRIDE,
            on_window_error: FailurePolicy::default(),
        }
    }

    pub fn with_metric(mut self, metric: impl Into<String>) -> Self {
        self.metric = metric.into();
        self
    }

    pub fn with_stride(mut self, stride: u32) -> Self {
        self.stride = stride;
        self
    }

    pub fn with_columns(
        mut self,
        date_col: impl Into<String>,
        group_id: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        self.date_col = date_col.into();
        self.group_id = group_id.into();
        self.target = target.into();
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.on_window_error = policy;
        self
    }

    /// Parse a configuration from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parsed frequency
    pub fn frequency(&self) -> Result<Frequency> {
        self.freq.parse()
    }

    /// Parsed metric kind
    pub fn metric_kind(&self) -> Result<MetricKind> {
        self.metric.parse()
    }

    /// Check every option before any data is touched
    pub fn validate(&self) -> Result<()> {
        self.frequency()?;
        self.metric_kind()?;

        if self.prediction_length == 0 {
            return Err(ForecastError::ConfigError(
                "prediction_length must be positive".to_string(),
            ));
        }
        validate_stride(self.stride)?;

        for (option, column) in [
            ("date_col", &self.date_col),
            ("group_id", &self.group_id),
            ("target", &self.target),
        ] {
            if column.trim().is_empty() {
                return Err(ForecastError::ConfigError(format!(
                    "{} must name a column",
                    option
                )));
            }
        }

        Ok(())
    }
}

pub(crate) fn validate_stride(stride: u32) -> Result<()> {
    if stride == 0 {
        return Err(ForecastError::ConfigError(
            "stride must be positive".to_string(),
        ));
    }
    Ok(())
}
