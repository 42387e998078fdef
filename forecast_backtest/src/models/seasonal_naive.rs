//! Seasonal naive forecasting model

use crate::error::{ForecastError, Result};
use crate::models::UnivariateModel;
use forecast_math::smoothing::seasonal_naive;
use serde::{Deserialize, Serialize};

/// Repeats the last observed season
#[derive(Debug, Clone)]
pub struct SeasonalNaive {
    name: String,
    season_length: usize,
}

/// Trained seasonal naive model: the last full season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalNaiveState {
    pub season: Vec<f64>,
}

impl SeasonalNaive {
    pub fn new(season_length: usize) -> Result<Self> {
        if season_length == 0 {
            return Err(ForecastError::InvalidParameter(
                "Season length must be positive".to_string(),
            ));
        }

        Ok(Self {
            name: format!("SeasonalNaive(season_length={})", season_length),
            season_length,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl UnivariateModel for SeasonalNaive {
    type State = SeasonalNaiveState;

    fn model_name(&self) -> &str {
        &self.name
    }

    fn train(&self, values: &[f64]) -> Result<Self::State> {
        let season = seasonal_naive(values, self.season_length, self.season_length)?;
        Ok(SeasonalNaiveState { season })
    }

    fn project(&self, state: &Self::State, horizon: usize) -> Result<Vec<f64>> {
        Ok(seasonal_naive(&state.season, state.season.len(), horizon)?)
    }
}
