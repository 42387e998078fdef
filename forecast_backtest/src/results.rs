//! Backtest result records and tables

use crate::data::date_series;
use crate::error::Result;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::HashMap;
use std::io::Write;

/// Column holding the window cutoff
pub const WINDOW_START_COLUMN: &str = "window_start_date";
/// Column holding the metric name
pub const METRIC_NAME_COLUMN: &str = "metric_name";
/// Column holding the metric value
pub const METRIC_VALUE_COLUMN: &str = "metric_value";
/// Column holding the forecast values
pub const FORECAST_COLUMN: &str = "forecast";
/// Column holding the observed values
pub const ACTUAL_COLUMN: &str = "actual";
/// Column holding the serialized fitted model
pub const MODEL_BLOB_COLUMN: &str = "fitted_model_blob";

/// Score of one window (of one group)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub group_id: Option<String>,
    pub window_start_date: NaiveDate,
    pub metric_name: String,
    pub metric_value: f64,
    pub forecast: Vec<f64>,
    pub actual: Vec<f64>,
    pub fitted_model_blob: Vec<u8>,
}

/// A window that was not scored under the skip policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedWindow {
    pub group_id: Option<String>,
    pub window_start_date: NaiveDate,
    pub reason: String,
}

/// One or several records produced by a single evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum RecordBatch {
    One(MetricRecord),
    Many(Vec<MetricRecord>),
}

impl From<MetricRecord> for RecordBatch {
    fn from(record: MetricRecord) -> Self {
        RecordBatch::One(record)
    }
}

impl From<Vec<MetricRecord>> for RecordBatch {
    fn from(records: Vec<MetricRecord>) -> Self {
        RecordBatch::Many(records)
    }
}

/// Collects records window by window
#[derive(Debug, Default)]
pub struct ResultAggregator {
    records: Vec<MetricRecord>,
    skipped: Vec<SkippedWindow>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append records in the order they arrive
    pub fn accumulate(&mut self, batch: impl Into<RecordBatch>) {
        match batch.into() {
            RecordBatch::One(record) => self.records.push(record),
            RecordBatch::Many(records) => self.records.extend(records),
        }
    }

    pub fn skip(&mut self, window: SkippedWindow) {
        self.skipped.push(window);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Materialize the table; the first column is named `group_column`
    pub fn finalize(self, group_column: &str) -> ResultTable {
        ResultTable {
            group_column: group_column.to_string(),
            records: self.records,
            skipped: self.skipped,
        }
    }
}

/// Metric statistics of one group across its windows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub group_id: Option<String>,
    pub metric_name: String,
    pub windows: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl std::fmt::Display for MetricSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:<16} {:<6} windows={:<4} mean={:.4} std={:.4} min={:.4} max={:.4}",
            self.group_id.as_deref().unwrap_or("-"),
            self.metric_name,
            self.windows,
            self.mean,
            self.std_dev,
            self.min,
            self.max
        )
    }
}

/// Ordered records of a backtest run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    group_column: String,
    records: Vec<MetricRecord>,
    skipped: Vec<SkippedWindow>,
}

impl ResultTable {
    /// An empty table with the standard schema
    pub fn empty(group_column: &str) -> Self {
        ResultAggregator::new().finalize(group_column)
    }

    /// Concatenate tables in order. The group column of the first table wins.
    pub fn concat(group_column: &str, tables: impl IntoIterator<Item = ResultTable>) -> Self {
        let mut aggregator = ResultAggregator::new();
        for table in tables {
            aggregator.accumulate(table.records);
            aggregator.skipped.extend(table.skipped);
        }
        aggregator.finalize(group_column)
    }

    /// Column names, in order
    pub fn columns(&self) -> [&str; 7] {
        [
            self.group_column.as_str(),
            WINDOW_START_COLUMN,
            METRIC_NAME_COLUMN,
            METRIC_VALUE_COLUMN,
            FORECAST_COLUMN,
            ACTUAL_COLUMN,
            MODEL_BLOB_COLUMN,
        ]
    }

    pub fn group_column(&self) -> &str {
        &self.group_column
    }

    pub fn records(&self) -> &[MetricRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<MetricRecord> {
        self.records
    }

    pub fn skipped_windows(&self) -> &[SkippedWindow] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Metric statistics per group, groups in order of first appearance
    pub fn summary(&self) -> Vec<MetricSummary> {
        let mut order: Vec<(Option<&str>, &str)> = Vec::new();
        let mut by_key: HashMap<(Option<&str>, &str), Vec<f64>> = HashMap::new();
        for record in &self.records {
            let key = (record.group_id.as_deref(), record.metric_name.as_str());
            by_key
                .entry(key)
                .or_insert_with(|| {
                    order.push(key);
                    Vec::new()
                })
                .push(record.metric_value);
        }

        order
            .into_iter()
            .map(|(group, metric)| {
                let values = by_key.remove(&(group, metric)).unwrap_or_default();
                let std_dev = if values.len() > 1 {
                    values.iter().std_dev()
                } else {
                    0.0
                };

                MetricSummary {
                    group_id: group.map(str::to_string),
                    metric_name: metric.to_string(),
                    windows: values.len(),
                    mean: values.iter().mean(),
                    std_dev,
                    min: Statistics::min(values.iter()),
                    max: Statistics::max(values.iter()),
                }
            })
            .collect()
    }

    /// Convert to a DataFrame with the standard column order
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let records = &self.records;

        let groups: Vec<Option<&str>> = records.iter().map(|r| r.group_id.as_deref()).collect();
        let dates: Vec<NaiveDate> = records.iter().map(|r| r.window_start_date).collect();
        let names: Vec<&str> = records.iter().map(|r| r.metric_name.as_str()).collect();
        let values: Vec<f64> = records.iter().map(|r| r.metric_value).collect();
        let blobs: Vec<&[u8]> = records
            .iter()
            .map(|r| r.fitted_model_blob.as_slice())
            .collect();

        let blob_column = if records.is_empty() {
            Series::new_empty(MODEL_BLOB_COLUMN, &DataType::Binary)
        } else {
            Series::new(MODEL_BLOB_COLUMN, blobs)
        };

        let df = DataFrame::new(vec![
            Series::new(&self.group_column, groups),
            date_series(WINDOW_START_COLUMN, &dates)?,
            Series::new(METRIC_NAME_COLUMN, names),
            Series::new(METRIC_VALUE_COLUMN, values),
            list_series(FORECAST_COLUMN, records.iter().map(|r| r.forecast.as_slice())),
            list_series(ACTUAL_COLUMN, records.iter().map(|r| r.actual.as_slice())),
            blob_column,
        ])?;

        Ok(df)
    }

    /// Write the table as CSV. Forecast and actual values are JSON arrays,
    /// the model blob is reported by its size in bytes.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        let mut header = self.columns().map(str::to_string);
        header[6] = format!("{}_bytes", MODEL_BLOB_COLUMN);
        csv.write_record(&header)?;

        for record in &self.records {
            csv.write_record([
                record.group_id.clone().unwrap_or_default(),
                record.window_start_date.to_string(),
                record.metric_name.clone(),
                record.metric_value.to_string(),
                serde_json::to_string(&record.forecast)?,
                serde_json::to_string(&record.actual)?,
                record.fitted_model_blob.len().to_string(),
            ])?;
        }

        csv.flush()?;
        Ok(())
    }

    /// Serialize the whole table, blobs included, as JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Inverse of [`ResultTable::to_json`]
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

fn list_series<'a>(name: &str, rows: impl Iterator<Item = &'a [f64]>) -> Series {
    let rows: Vec<Series> = rows.map(|values| Series::new("", values)).collect();
    if rows.is_empty() {
        return Series::new_empty(name, &DataType::List(Box::new(DataType::Float64)));
    }
    Series::new(name, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(group: &str, day: u32, value: f64) -> MetricRecord {
        MetricRecord {
            group_id: Some(group.to_string()),
            window_start_date: NaiveDate::from_ymd_opt(2020, 1, day).unwrap(),
            metric_name: "mae".to_string(),
            metric_value: value,
            forecast: vec![1.0, 2.0],
            actual: vec![1.0, 3.0],
            fitted_model_blob: b"{}".to_vec(),
        }
    }

    #[test]
    fn test_accumulate_one_or_many() {
        let mut aggregator = ResultAggregator::new();
        aggregator.accumulate(record("a", 1, 1.0));
        aggregator.accumulate(vec![record("a", 2, 2.0), record("b", 2, 3.0)]);
        aggregator.accumulate(Vec::new());

        let table = aggregator.finalize("unique_id");
        let days: Vec<f64> = table.records().iter().map(|r| r.metric_value).collect();
        assert_eq!(days, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_no_deduplication() {
        let mut aggregator = ResultAggregator::new();
        aggregator.accumulate(record("a", 1, 1.0));
        aggregator.accumulate(record("a", 1, 1.0));
        assert_eq!(aggregator.finalize("unique_id").len(), 2);
    }

    #[test]
    fn test_empty_table_keeps_schema() {
        let table = ResultTable::empty("store");
        assert!(table.is_empty());
        assert_eq!(
            table.columns(),
            [
                "store",
                "window_start_date",
                "metric_name",
                "metric_value",
                "forecast",
                "actual",
                "fitted_model_blob"
            ]
        );

        let df = table.to_dataframe().unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.get_column_names(), table.columns().to_vec());
    }

    #[test]
    fn test_dataframe_columns() {
        let mut aggregator = ResultAggregator::new();
        aggregator.accumulate(vec![record("a", 1, 1.0), record("b", 2, 3.0)]);
        let table = aggregator.finalize("unique_id");

        let df = table.to_dataframe().unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.get_column_names(), table.columns().to_vec());
        assert_eq!(
            df.column(WINDOW_START_COLUMN).unwrap().dtype(),
            &DataType::Date
        );
    }

    #[test]
    fn test_summary_per_group() {
        let mut aggregator = ResultAggregator::new();
        aggregator.accumulate(vec![record("a", 1, 1.0), record("a", 2, 3.0), record("b", 1, 5.0)]);
        let summary = aggregator.finalize("unique_id").summary();

        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].group_id.as_deref(), Some("a"));
        assert_eq!(summary[0].windows, 2);
        assert_eq!(summary[0].mean, 2.0);
        assert_eq!(summary[0].min, 1.0);
        assert_eq!(summary[0].max, 3.0);
        assert_eq!(summary[1].std_dev, 0.0);
    }

    #[test]
    fn test_csv_output() {
        let mut aggregator = ResultAggregator::new();
        aggregator.accumulate(record("a", 3, 0.5));
        let table = aggregator.finalize("unique_id");

        let mut out = Vec::new();
        table.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next(),
            Some("unique_id,window_start_date,metric_name,metric_value,forecast,actual,fitted_model_blob_bytes")
        );
        assert_eq!(
            lines.next(),
            Some("a,2020-01-03,mae,0.5,\"[1.0,2.0]\",\"[1.0,3.0]\",2")
        );
    }

    #[test]
    fn test_json_round_trip() {
        let mut aggregator = ResultAggregator::new();
        aggregator.accumulate(record("a", 3, 0.5));
        let table = aggregator.finalize("unique_id");

        let restored = ResultTable::from_json(&table.to_json().unwrap()).unwrap();
        assert_eq!(restored, table);
    }

    #[test]
    fn test_json_parse_error() {
        assert!(matches!(
            ResultTable::from_json("{\"columns\": ["),
            Err(crate::error::ForecastError::JsonError(_))
        ));
    }
}
