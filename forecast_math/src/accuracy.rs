//! Point-forecast accuracy metrics
//!
//! Contains the metrics used to score a forecast against the observed values:
//! - Symmetric Mean Absolute Percentage Error (SMAPE)
//! - Mean Absolute Percentage Error (MAPE)
//! - Mean Absolute Error (MAE)
//! - Mean Squared Error (MSE) and its root (RMSE)
//!
//! Percentage errors are returned as fractions, so `0.1` reads as 10%.
//! Denominators are clamped to the type's machine epsilon so a zero actual
//! produces a large but finite error instead of a division by zero.

use crate::{MathError, Result};
use num_traits::Float;

fn check_aligned<T: Float>(actual: &[T], forecast: &[T]) -> Result<T> {
    if actual.len() != forecast.len() {
        return Err(MathError::LengthMismatch {
            actual: actual.len(),
            forecast: forecast.len(),
        });
    }
    if actual.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot score an empty forecast".to_string(),
        ));
    }

    T::from(actual.len()).ok_or_else(|| {
        MathError::InvalidInput("Series length is not representable".to_string())
    })
}

/// Mean absolute error between observed and forecast values
pub fn mean_absolute_error<T: Float>(actual: &[T], forecast: &[T]) -> Result<T> {
    let n = check_aligned(actual, forecast)?;
    let sum = actual
        .iter()
        .zip(forecast)
        .fold(T::zero(), |acc, (&a, &f)| acc + (a - f).abs());

    Ok(sum / n)
}

/// Mean squared error between observed and forecast values
pub fn mean_squared_error<T: Float>(actual: &[T], forecast: &[T]) -> Result<T> {
    let n = check_aligned(actual, forecast)?;
    let sum = actual.iter().zip(forecast).fold(T::zero(), |acc, (&a, &f)| {
        let e = a - f;
        acc + e * e
    });

    Ok(sum / n)
}

/// Root of the mean squared error
pub fn root_mean_squared_error<T: Float>(actual: &[T], forecast: &[T]) -> Result<T> {
    mean_squared_error(actual, forecast).map(Float::sqrt)
}

/// Mean absolute percentage error, relative to the observed values
pub fn mean_absolute_percentage_error<T: Float>(actual: &[T], forecast: &[T]) -> Result<T> {
    let n = check_aligned(actual, forecast)?;
    let eps = T::epsilon();
    let sum = actual.iter().zip(forecast).fold(T::zero(), |acc, (&a, &f)| {
        acc + (a - f).abs() / a.abs().max(eps)
    });

    Ok(sum / n)
}

/// Symmetric mean absolute percentage error
///
/// Each term is `2 |a - f| / (|a| + |f|)`, so the result lies in `[0, 2]`.
pub fn symmetric_mean_absolute_percentage_error<T: Float>(
    actual: &[T],
    forecast: &[T],
) -> Result<T> {
    let n = check_aligned(actual, forecast)?;
    let eps = T::epsilon();
    let two = T::one() + T::one();
    let sum = actual.iter().zip(forecast).fold(T::zero(), |acc, (&a, &f)| {
        acc + two * (a - f).abs() / (a.abs() + f.abs()).max(eps)
    });

    Ok(sum / n)
}
