//! Scoring backtest windows

use crate::config::MetricKind;
use crate::data::SeriesTable;
use crate::error::{ForecastError, Result};
use crate::models::ForecastModel;
use crate::results::MetricRecord;
use crate::serializer::ModelSerializer;
use chrono::NaiveDate;
use forecast_math::{
    mean_absolute_error, mean_absolute_percentage_error, mean_squared_error,
    root_mean_squared_error, symmetric_mean_absolute_percentage_error, MathError,
};
use std::collections::HashMap;

/// Score a forecast against the observed values
pub fn score(kind: MetricKind, actual: &[f64], forecast: &[f64]) -> Result<f64> {
    let value = match kind {
        MetricKind::Smape => symmetric_mean_absolute_percentage_error(actual, forecast),
        MetricKind::Mape => mean_absolute_percentage_error(actual, forecast),
        MetricKind::Mae => mean_absolute_error(actual, forecast),
        MetricKind::Mse => mean_squared_error(actual, forecast),
        MetricKind::Rmse => root_mean_squared_error(actual, forecast),
    };

    value.map_err(|e| match e {
        MathError::LengthMismatch { actual, forecast } => ForecastError::AlignmentError(format!(
            "{} actual values but {} forecast values",
            actual, forecast
        )),
        MathError::InsufficientData(_) => {
            ForecastError::AlignmentError("No actual values in the window".to_string())
        }
        other => ForecastError::MathError(other),
    })
}

/// Runs the model on one window and turns the outcome into metric records
#[derive(Debug, Clone, Copy)]
pub struct MetricEvaluator {
    kind: MetricKind,
}

impl MetricEvaluator {
    pub fn new(kind: MetricKind) -> Self {
        Self { kind }
    }

    /// Build an evaluator from a metric name, rejecting unknown names
    pub fn from_name(name: &str) -> Result<Self> {
        Ok(Self::new(name.parse()?))
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    /// Fit/predict on `history`, score against `actual` and package records.
    ///
    /// When `actual` spans several groups one record per group is produced,
    /// in order of first appearance, all sharing the same model blob.
    /// Otherwise a single record is labelled with `group_label`, falling
    /// back to the group found in the data.
    pub fn evaluate<M, S>(
        &self,
        model: &M,
        serializer: &S,
        history: &SeriesTable,
        actual: &SeriesTable,
        cutoff: NaiveDate,
        group_label: Option<&str>,
    ) -> Result<Vec<MetricRecord>>
    where
        M: ForecastModel,
        S: ModelSerializer,
    {
        let (forecast, fitted) = model.predict(history, actual).map_err(|e| match e {
            ForecastError::ModelError(_) => e,
            other => ForecastError::ModelError(format!("{} failed: {}", model.name(), other)),
        })?;
        let blob = serializer.serialize(&fitted)?;

        let actual_values = actual.target_values()?;
        let row_groups = actual.group_values()?;
        let distinct = actual.group_ids()?;

        if let (Some(row_groups), true) = (row_groups, distinct.len() > 1) {
            let mut observed_by_group: HashMap<String, Vec<f64>> = HashMap::new();
            for (group, value) in row_groups.into_iter().zip(actual_values) {
                observed_by_group.entry(group).or_default().push(value);
            }
            let mut predicted_by_group = forecast.values_by_group();

            return distinct
                .into_iter()
                .map(|group| {
                    let observed = observed_by_group.remove(&group).unwrap_or_default();
                    let predicted = predicted_by_group.remove(&group).unwrap_or_default();
                    let value = score(self.kind, &observed, &predicted).map_err(|e| {
                        ForecastError::AlignmentError(format!("group {}: {}", group, e))
                    })?;

                    Ok(self.record(Some(group), cutoff, value, predicted, observed, blob.clone()))
                })
                .collect();
        }

        let predicted = forecast.values();
        let value = score(self.kind, &actual_values, &predicted)?;
        let group = group_label
            .map(str::to_string)
            .or_else(|| distinct.into_iter().next());

        Ok(vec![self.record(group, cutoff, value, predicted, actual_values, blob)])
    }

    fn record(
        &self,
        group_id: Option<String>,
        cutoff: NaiveDate,
        metric_value: f64,
        forecast: Vec<f64>,
        actual: Vec<f64>,
        fitted_model_blob: Vec<u8>,
    ) -> MetricRecord {
        MetricRecord {
            group_id,
            window_start_date: cutoff,
            metric_name: self.kind.name().to_string(),
            metric_value,
            forecast,
            actual,
            fitted_model_blob,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(MetricKind::Smape)]
    #[case(MetricKind::Mape)]
    #[case(MetricKind::Mae)]
    #[case(MetricKind::Mse)]
    #[case(MetricKind::Rmse)]
    fn test_perfect_forecast(#[case] kind: MetricKind) {
        let actual = [10.0, 20.0, 30.0];
        assert_eq!(score(kind, &actual, &actual).unwrap(), 0.0);
    }

    #[rstest]
    #[case(MetricKind::Mae, 10.0)]
    #[case(MetricKind::Mse, 100.0)]
    #[case(MetricKind::Rmse, 10.0)]
    #[case(MetricKind::Mape, 0.1)]
    fn test_single_point(#[case] kind: MetricKind, #[case] expected: f64) {
        assert_relative_eq!(score(kind, &[100.0], &[110.0]).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_mismatch_is_alignment_error() {
        assert!(matches!(
            score(MetricKind::Mae, &[1.0, 2.0], &[1.0]),
            Err(ForecastError::AlignmentError(_))
        ));
        assert!(matches!(
            score(MetricKind::Mae, &[], &[]),
            Err(ForecastError::AlignmentError(_))
        ));
    }

    #[test]
    fn test_unknown_metric_name() {
        assert!(matches!(
            MetricEvaluator::from_name("foo"),
            Err(ForecastError::ConfigError(_))
        ));
        assert_eq!(
            MetricEvaluator::from_name("rmse").unwrap().kind(),
            MetricKind::Rmse
        );
    }
}
