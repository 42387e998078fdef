//! # Forecast Math
//!
//! Numeric kernels shared by the forecasting crates.
//! This crate provides the point-forecast accuracy metrics used to score
//! backtest windows and the smoothing kernels behind the built-in models.

use thiserror::Error;

pub mod accuracy;
pub mod smoothing;

pub use accuracy::{
    mean_absolute_error, mean_absolute_percentage_error, mean_squared_error,
    root_mean_squared_error, symmetric_mean_absolute_percentage_error,
};

/// Errors that can occur in forecasting calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Length mismatch: actual has {actual} values, forecast has {forecast}")]
    LengthMismatch { actual: usize, forecast: usize },
}

/// Result type for forecasting math operations
pub type Result<T> = std::result::Result<T, MathError>;
