//! Smoothing kernels behind the built-in forecasting models
//!
//! Contains:
//! - Trailing mean over a fixed window
//! - Simple exponential smoothing level
//! - Seasonal naive projection

use crate::{MathError, Result};
use std::collections::VecDeque;

/// Running mean over the most recent `period` observations
#[derive(Debug, Clone)]
pub struct TrailingMean {
    period: usize,
    values: VecDeque<f64>,
    sum: f64,
}

impl TrailingMean {
    /// Create a new trailing mean with the specified period
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(MathError::InvalidInput(
                "Period must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            period,
            values: VecDeque::with_capacity(period),
            sum: 0.0,
        })
    }

    /// Push a new observation, evicting the oldest once the window is full
    pub fn update(&mut self, value: f64) {
        self.values.push_back(value);
        self.sum += value;

        if self.values.len() > self.period {
            if let Some(old_value) = self.values.pop_front() {
                self.sum -= old_value;
            }
        }
    }

    /// Mean of the observations currently in the window.
    ///
    /// A partially filled window averages what it has.
    pub fn value(&self) -> Result<f64> {
        if self.values.is_empty() {
            return Err(MathError::InsufficientData(
                "No observations for trailing mean".to_string(),
            ));
        }

        Ok(self.sum / self.values.len() as f64)
    }
}

/// Simple exponential smoothing level
#[derive(Debug, Clone)]
pub struct SmoothedLevel {
    alpha: f64,
    level: Option<f64>,
}

impl SmoothedLevel {
    /// Create a new smoother with the given alpha (smoothing factor)
    pub fn new(alpha: f64) -> Result<Self> {
        if alpha <= 0.0 || alpha >= 1.0 {
            return Err(MathError::InvalidInput(
                "Alpha must be between 0 and 1 (exclusive)".to_string(),
            ));
        }

        Ok(Self { alpha, level: None })
    }

    /// Fold one observation into the level
    pub fn update(&mut self, value: f64) {
        self.level = Some(match self.level {
            None => value,
            Some(level) => self.alpha * value + (1.0 - self.alpha) * level,
        });
    }

    /// Current level
    pub fn value(&self) -> Result<f64> {
        self.level.ok_or_else(|| {
            MathError::InsufficientData("No data available for exponential smoothing".to_string())
        })
    }
}

/// Smooth a whole history and return the final level
pub fn exponential_level(values: &[f64], alpha: f64) -> Result<f64> {
    let mut smoother = SmoothedLevel::new(alpha)?;
    for &v in values {
        smoother.update(v);
    }
    smoother.value()
}

/// Mean of the last `period` values (or of all values if fewer)
pub fn trailing_mean(values: &[f64], period: usize) -> Result<f64> {
    let mut mean = TrailingMean::new(period)?;
    let start = values.len().saturating_sub(period);
    for &v in &values[start..] {
        mean.update(v);
    }
    mean.value()
}

/// Repeat the last full season of `values` over `horizon` steps
pub fn seasonal_naive(values: &[f64], season_length: usize, horizon: usize) -> Result<Vec<f64>> {
    if season_length == 0 {
        return Err(MathError::InvalidInput(
            "Season length must be greater than zero".to_string(),
        ));
    }
    if values.len() < season_length {
        return Err(MathError::InsufficientData(format!(
            "Need at least {} observations for a seasonal naive forecast, have {}",
            season_length,
            values.len()
        )));
    }

    let last_season = &values[values.len() - season_length..];
    Ok((0..horizon).map(|h| last_season[h % season_length]).collect())
}
