//! Forecasting model capabilities
//!
//! The backtester only talks to [`ForecastModel`]. Simple per-series models
//! implement the smaller [`UnivariateModel`] trait and get a
//! `ForecastModel` implementation that trains one state per group.

use crate::data::SeriesTable;
use crate::error::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;

/// One forecast value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Series the value belongs to, if the forecast covers several
    pub group: Option<String>,
    /// Date being forecast
    pub date: NaiveDate,
    /// Forecast value
    pub value: f64,
}

/// Forecast rows returned by a model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastTable {
    points: Vec<ForecastPoint>,
}

impl ForecastTable {
    /// Create a forecast table from rows
    pub fn new(points: Vec<ForecastPoint>) -> Self {
        Self { points }
    }

    /// Create an ungrouped forecast table from dates and values
    pub fn from_values(dates: &[NaiveDate], values: &[f64]) -> Result<Self> {
        let mut table = Self::default();
        table.extend_series(None, dates, values)?;
        Ok(table)
    }

    /// Append the forecast of one series
    pub fn extend_series(
        &mut self,
        group: Option<String>,
        dates: &[NaiveDate],
        values: &[f64],
    ) -> Result<()> {
        if dates.len() != values.len() {
            return Err(crate::error::ForecastError::AlignmentError(format!(
                "Forecast has {} values for {} dates",
                values.len(),
                dates.len()
            )));
        }

        self.points
            .extend(dates.iter().zip(values).map(|(&date, &value)| ForecastPoint {
                group: group.clone(),
                date,
                value,
            }));
        Ok(())
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All forecast values in row order
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Forecast values keyed by group, each in row order. Untagged rows
    /// are left out.
    pub fn values_by_group(&self) -> HashMap<String, Vec<f64>> {
        let mut by_group: HashMap<String, Vec<f64>> = HashMap::new();
        for point in &self.points {
            if let Some(group) = &point.group {
                by_group.entry(group.clone()).or_default().push(point.value);
            }
        }
        by_group
    }

    /// Forecast values tagged with `group`, in row order
    pub fn values_for_group(&self, group: &str) -> Vec<f64> {
        self.points
            .iter()
            .filter(|p| p.group.as_deref() == Some(group))
            .map(|p| p.value)
            .collect()
    }
}

/// The capability the backtester requires from a forecasting technique
pub trait ForecastModel: Debug {
    /// State produced by fitting; serialized into backtest results
    type Fitted: Serialize + Debug;

    /// Name of the model
    fn name(&self) -> &str;

    /// Normalise a series before use. The default sorts it by date.
    fn prepare_data(&self, series: &SeriesTable) -> Result<SeriesTable> {
        series.sorted_by_date()
    }

    /// Fit the model on a history
    fn fit(&self, history: &SeriesTable) -> Result<Self::Fitted>;

    /// Forecast the rows of `actual` from `history`.
    ///
    /// The returned forecast must be aligned row for row with `actual`
    /// (per group when `actual` holds several groups).
    fn predict(
        &self,
        history: &SeriesTable,
        actual: &SeriesTable,
    ) -> Result<(ForecastTable, Self::Fitted)>;

    /// Out-of-sample forecast for the given future dates
    fn forecast(&self, history: &SeriesTable, dates: &[NaiveDate]) -> Result<ForecastTable>;
}

/// A model fitted independently on each series' target values
pub trait UnivariateModel: Debug {
    /// Fitted state of one series
    type State: Serialize + Debug + Clone;

    fn model_name(&self) -> &str;

    /// Fit on the target values of one series, oldest first
    fn train(&self, values: &[f64]) -> Result<Self::State>;

    /// Forecast `horizon` steps past the end of the training values
    fn project(&self, state: &Self::State, horizon: usize) -> Result<Vec<f64>>;
}

/// Fitted state of one series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupFit<S> {
    pub group: Option<String>,
    pub state: S,
}

/// Fitted states of every series a univariate model was trained on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedGroups<S> {
    pub model: String,
    pub fits: Vec<GroupFit<S>>,
}

impl<U: UnivariateModel> ForecastModel for U {
    type Fitted = FittedGroups<U::State>;

    fn name(&self) -> &str {
        self.model_name()
    }

    fn fit(&self, history: &SeriesTable) -> Result<Self::Fitted> {
        let fits = history
            .group_slices()?
            .into_iter()
            .map(|(group, slice)| {
                let state = self.train(&slice.target_values()?)?;
                Ok(GroupFit { group, state })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(FittedGroups {
            model: self.model_name().to_string(),
            fits,
        })
    }

    fn predict(
        &self,
        history: &SeriesTable,
        actual: &SeriesTable,
    ) -> Result<(ForecastTable, Self::Fitted)> {
        let mut forecast = ForecastTable::default();
        let mut fits = Vec::new();

        // Split the history once; groups absent from it train on no rows
        let history_groups: Option<HashMap<String, SeriesTable>> =
            match (history.group_column(), actual.group_column()) {
                (Some(_), Some(_)) => Some(
                    history
                        .group_slices()?
                        .into_iter()
                        .filter_map(|(group, slice)| group.map(|id| (id, slice)))
                        .collect(),
                ),
                _ => None,
            };
        let no_rows = history.slice(0, 0);

        for (group, actual_slice) in actual.group_slices()? {
            let past = match (&history_groups, &group) {
                (Some(slices), Some(id)) => slices.get(id).unwrap_or(&no_rows),
                _ => history,
            };
            let state = self.train(&past.target_values()?)?;
            let dates = actual_slice.dates()?;
            let values = self.project(&state, dates.len())?;

            forecast.extend_series(group.clone(), &dates, &values)?;
            fits.push(GroupFit { group, state });
        }

        Ok((
            forecast,
            FittedGroups {
                model: self.model_name().to_string(),
                fits,
            },
        ))
    }

    fn forecast(&self, history: &SeriesTable, dates: &[NaiveDate]) -> Result<ForecastTable> {
        let mut forecast = ForecastTable::default();

        for (group, slice) in history.group_slices()? {
            let state = self.train(&slice.target_values()?)?;
            let values = self.project(&state, dates.len())?;
            forecast.extend_series(group, dates, &values)?;
        }

        Ok(forecast)
    }
}

pub mod exponential_smoothing;
pub mod moving_average;
pub mod remote;
pub mod seasonal_naive;

pub use exponential_smoothing::ExponentialSmoothing;
pub use moving_average::MovingAverage;
pub use remote::{InferenceClient, RemoteModel};
pub use seasonal_naive::SeasonalNaive;
