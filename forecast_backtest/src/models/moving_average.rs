//! Moving average forecasting model

use crate::error::{ForecastError, Result};
use crate::models::UnivariateModel;
use forecast_math::smoothing::trailing_mean;
use serde::{Deserialize, Serialize};

/// Flat forecast at the mean of the last `window` observations
#[derive(Debug, Clone)]
pub struct MovingAverage {
    /// Name of the model
    name: String,
    /// Window size
    window: usize,
}

/// Trained moving average
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingAverageState {
    /// Window size
    pub window: usize,
    /// Mean of the trailing window
    pub average: f64,
}

impl MovingAverage {
    /// Create a new moving average model
    pub fn new(window: usize) -> Result<Self> {
        if window == 0 {
            return Err(ForecastError::InvalidParameter(
                "Window size must be positive".to_string(),
            ));
        }

        Ok(Self {
            name: format!("MovingAverage(window={})", window),
            window,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl UnivariateModel for MovingAverage {
    type State = MovingAverageState;

    fn model_name(&self) -> &str {
        &self.name
    }

    fn train(&self, values: &[f64]) -> Result<Self::State> {
        if values.is_empty() {
            return Err(ForecastError::DataError(
                "Empty time series data".to_string(),
            ));
        }

        Ok(MovingAverageState {
            window: self.window,
            average: trailing_mean(values, self.window)?,
        })
    }

    fn project(&self, state: &Self::State, horizon: usize) -> Result<Vec<f64>> {
        Ok(vec![state.average; horizon])
    }
}
