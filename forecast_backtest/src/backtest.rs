//! Walk-forward backtesting of forecast models

use crate::config::{validate_stride, BacktestConfig, FailurePolicy};
use crate::data::SeriesTable;
use crate::error::{ForecastError, Result};
use crate::metrics::MetricEvaluator;
use crate::models::{ForecastModel, ForecastTable};
use crate::offsets::{future_dates, resolve_offsets, Offsets};
use crate::results::{ResultAggregator, ResultTable, SkippedWindow};
use crate::serializer::{JsonSerializer, ModelSerializer};
use crate::walker::WindowWalker;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

/// Runs walk-forward evaluations with a validated configuration
#[derive(Debug, Clone)]
pub struct Backtester<S = JsonSerializer> {
    config: BacktestConfig,
    offsets: Offsets,
    evaluator: MetricEvaluator,
    serializer: S,
}

impl Backtester<JsonSerializer> {
    /// Validate the configuration and resolve its offsets.
    ///
    /// Fails with a configuration error for an unknown metric or frequency
    /// and for a zero horizon or stride.
    pub fn new(config: BacktestConfig) -> Result<Self> {
        Self::with_serializer(config, JsonSerializer)
    }
}

impl<S: ModelSerializer> Backtester<S> {
    /// Like [`Backtester::new`] with a custom model serializer
    pub fn with_serializer(config: BacktestConfig, serializer: S) -> Result<Self> {
        config.validate()?;
        let offsets = resolve_offsets(config.frequency()?, config.prediction_length, config.stride);
        let evaluator = MetricEvaluator::new(config.metric_kind()?);

        Ok(Self {
            config,
            offsets,
            evaluator,
            serializer,
        })
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    pub fn offsets(&self) -> &Offsets {
        &self.offsets
    }

    /// Evaluate `model` on every window of `series` after `start`.
    ///
    /// `group_id` labels records when the actual slice holds a single
    /// series; `stride` overrides the configured stride. A table without a
    /// group column must not repeat a date.
    pub fn backtest<M: ForecastModel>(
        &self,
        model: &M,
        series: &SeriesTable,
        start: NaiveDate,
        group_id: Option<&str>,
        stride: Option<u32>,
    ) -> Result<ResultTable> {
        let offsets = match stride {
            Some(stride) => {
                validate_stride(stride)?;
                resolve_offsets(self.config.frequency()?, self.config.prediction_length, stride)
            }
            None => self.offsets,
        };

        info!(
            model = model.name(),
            group = group_id.unwrap_or("<all>"),
            %start,
            metric = self.evaluator.kind().name(),
            "Starting backtest"
        );

        let prepared = model.prepare_data(series)?;
        if prepared.group_column().is_none() {
            prepared.ensure_unique_dates()?;
        }
        let mut aggregator = ResultAggregator::new();

        for window in WindowWalker::with_offsets(&prepared, start, &offsets)? {
            let window = window?;
            debug!(
                cutoff = %window.cutoff,
                history = window.history.len(),
                actual = window.actual.len(),
                "Evaluating window"
            );

            let outcome = self.evaluator.evaluate(
                model,
                &self.serializer,
                &window.history,
                &window.actual,
                window.cutoff,
                group_id,
            );

            match outcome {
                Ok(records) => aggregator.accumulate(records),
                Err(e) if e.is_model_failure() => {
                    return Err(e.in_window(group_id, window.cutoff));
                }
                Err(e) => match self.config.on_window_error {
                    FailurePolicy::Abort => return Err(e.in_window(group_id, window.cutoff)),
                    FailurePolicy::Skip => {
                        warn!(
                            cutoff = %window.cutoff,
                            group = group_id.unwrap_or("<all>"),
                            error = %e,
                            "Skipping window"
                        );
                        aggregator.skip(SkippedWindow {
                            group_id: group_id.map(str::to_string),
                            window_start_date: window.cutoff,
                            reason: e.to_string(),
                        });
                    }
                },
            }
        }

        let table = aggregator.finalize(&self.config.group_id);
        info!(
            model = model.name(),
            records = table.len(),
            skipped = table.skipped_windows().len(),
            "Backtest finished"
        );
        Ok(table)
    }

    /// Backtest every series of a multi-series table on its own and
    /// concatenate the results in order of first appearance
    pub fn backtest_groups<M: ForecastModel>(
        &self,
        model: &M,
        series: &SeriesTable,
        start: NaiveDate,
        stride: Option<u32>,
    ) -> Result<ResultTable> {
        let tables = series
            .group_slices()?
            .into_iter()
            .map(|(group, slice)| self.backtest(model, &slice, start, group.as_deref(), stride))
            .collect::<Result<Vec<_>>>()?;

        Ok(ResultTable::concat(&self.config.group_id, tables))
    }

    /// Forecast `prediction_length` periods past the last date of `history`
    pub fn forecast<M: ForecastModel>(
        &self,
        model: &M,
        history: &SeriesTable,
    ) -> Result<ForecastTable> {
        let prepared = model.prepare_data(history)?;
        let last = prepared
            .max_date()?
            .ok_or_else(|| ForecastError::DataError("Cannot forecast an empty series".to_string()))?;
        let dates = future_dates(
            last,
            self.offsets.one_period,
            self.config.prediction_length as usize,
        )?;

        debug!(model = model.name(), %last, periods = dates.len(), "Forecasting");
        model.forecast(&prepared, &dates)
    }
}
