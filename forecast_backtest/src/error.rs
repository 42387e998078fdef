//! Error types for the forecast_backtest crate

use chrono::NaiveDate;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the forecast_backtest crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Unsupported or inconsistent configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Forecast and actual values do not line up
    #[error("Alignment error: {0}")]
    AlignmentError(String),

    /// The model capability failed to fit or predict
    #[error("Model error: {0}")]
    ModelError(String),

    /// A fitted model could not be turned into bytes
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A backtest window failed; carries which series and cutoff
    #[error("Backtest window failed for group {group} at {cutoff}: {source}")]
    WindowFailed {
        group: String,
        cutoff: NaiveDate,
        #[source]
        source: Box<ForecastError>,
    },

    /// Error reported by a registry or serving collaborator
    #[error("Platform error: {0}")]
    PlatformError(String),

    /// Error from invalid model parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from metric or smoothing kernels
    #[error("Math error: {0}")]
    MathError(#[from] forecast_math::MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error writing CSV output
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Error reading or writing JSON
    #[error("JSON error: {0}")]
    JsonError(String),
}

impl ForecastError {
    /// Attach the failing group and cutoff to a window-local error
    pub fn in_window(self, group: Option<&str>, cutoff: NaiveDate) -> Self {
        ForecastError::WindowFailed {
            group: group.unwrap_or("<all>").to_string(),
            cutoff,
            source: Box::new(self),
        }
    }

    /// Whether the error comes from the model capability itself
    pub fn is_model_failure(&self) -> bool {
        match self {
            ForecastError::ModelError(_) => true,
            ForecastError::WindowFailed { source, .. } => source.is_model_failure(),
            _ => false,
        }
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::CsvError(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::JsonError(err.to_string())
    }
}
