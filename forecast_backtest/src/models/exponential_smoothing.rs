//! Exponential smoothing models for time series forecasting

use crate::error::{ForecastError, Result};
use crate::models::UnivariateModel;
use forecast_math::smoothing::exponential_level;
use serde::{Deserialize, Serialize};

/// Simple exponential smoothing model
#[derive(Debug, Clone)]
pub struct ExponentialSmoothing {
    /// Name of the model
    name: String,
    /// Smoothing parameter
    alpha: f64,
}

/// Trained exponential smoothing model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExponentialSmoothingState {
    /// Smoothing parameter
    pub alpha: f64,
    /// Current level
    pub level: f64,
    /// Last observed value
    pub last_value: f64,
}

impl ExponentialSmoothing {
    /// Create a new exponential smoothing model
    pub fn new(alpha: f64) -> Result<Self> {
        if alpha <= 0.0 || alpha >= 1.0 {
            return Err(ForecastError::InvalidParameter(
                "Alpha must be between 0 and 1".to_string(),
            ));
        }

        Ok(Self {
            name: format!("ExponentialSmoothing(alpha={})", alpha),
            alpha,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl UnivariateModel for ExponentialSmoothing {
    type State = ExponentialSmoothingState;

    fn model_name(&self) -> &str {
        &self.name
    }

    fn train(&self, values: &[f64]) -> Result<Self::State> {
        let Some(&last_value) = values.last() else {
            return Err(ForecastError::DataError(
                "Empty time series data".to_string(),
            ));
        };

        Ok(ExponentialSmoothingState {
            alpha: self.alpha,
            level: exponential_level(values, self.alpha)?,
            last_value,
        })
    }

    fn project(&self, state: &Self::State, horizon: usize) -> Result<Vec<f64>> {
        // In simple exponential smoothing, the forecast is constant at the last level
        Ok(vec![state.level; horizon])
    }
}
