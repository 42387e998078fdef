//! Series tables for backtesting

use crate::config::BacktestConfig;
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Days, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

/// Rows of one or more time series: a date column, a target column and an
/// optional column naming the series each row belongs to.
#[derive(Debug, Clone)]
pub struct SeriesTable {
    /// Data frame containing the rows
    df: DataFrame,
    /// Name of the date column
    date_column: String,
    /// Name of the target column
    target_column: String,
    /// Name of the group-id column, if the table carries one
    group_column: Option<String>,
}

/// Loader for series tables stored on disk
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load a series table from a CSV file with a header row
    pub fn from_csv<P: AsRef<Path>>(path: P, config: &BacktestConfig) -> Result<SeriesTable> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        SeriesTable::from_config(df, config)
    }

    /// Load a series table from a Parquet file
    pub fn from_parquet<P: AsRef<Path>>(path: P, config: &BacktestConfig) -> Result<SeriesTable> {
        let file = File::open(path)?;
        let df = ParquetReader::new(file).finish()?;

        SeriesTable::from_config(df, config)
    }
}

impl SeriesTable {
    /// Wrap a DataFrame, checking that the named columns exist
    pub fn new(
        df: DataFrame,
        date_column: &str,
        target_column: &str,
        group_column: Option<&str>,
    ) -> Result<Self> {
        for column in [Some(date_column), Some(target_column), group_column]
            .into_iter()
            .flatten()
        {
            if df.column(column).is_err() {
                return Err(ForecastError::DataError(format!(
                    "Column '{}' not found",
                    column
                )));
            }
        }

        Ok(Self {
            df,
            date_column: date_column.to_string(),
            target_column: target_column.to_string(),
            group_column: group_column.map(str::to_string),
        })
    }

    /// Wrap a DataFrame using the configured column names.
    ///
    /// The group column is optional: a frame without it is a single series,
    /// so its dates must not repeat.
    pub fn from_config(df: DataFrame, config: &BacktestConfig) -> Result<Self> {
        let has_group = df
            .get_column_names()
            .iter()
            .any(|name| *name == config.group_id);
        if has_group {
            return Self::new(df, &config.date_col, &config.target, Some(config.group_id.as_str()));
        }

        let table = Self::new(df, &config.date_col, &config.target, None)?;
        if let Some(date) = table.repeated_date()? {
            return Err(ForecastError::DataError(format!(
                "Column '{}' not found and date {} appears more than once, so the rows \
                 cannot be treated as a single series",
                config.group_id, date
            )));
        }
        Ok(table)
    }

    /// Build a single-series table from dates and values (`ds`, `y`)
    pub fn from_values(dates: &[NaiveDate], values: &[f64]) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(ForecastError::DataError(format!(
                "Got {} dates but {} values",
                dates.len(),
                values.len()
            )));
        }

        let df = DataFrame::new(vec![date_series("ds", dates)?, Series::new("y", values)])?;
        Self::new(df, "ds", "y", None)
    }

    /// Build a multi-series table from group ids, dates and values
    /// (`unique_id`, `ds`, `y`)
    pub fn from_grouped_values(groups: &[&str], dates: &[NaiveDate], values: &[f64]) -> Result<Self> {
        if groups.len() != dates.len() || dates.len() != values.len() {
            return Err(ForecastError::DataError(format!(
                "Got {} group ids, {} dates and {} values",
                groups.len(),
                dates.len(),
                values.len()
            )));
        }

        let df = DataFrame::new(vec![
            Series::new("unique_id", groups),
            date_series("ds", dates)?,
            Series::new("y", values),
        ])?;
        Self::new(df, "ds", "y", Some("unique_id"))
    }

    /// Get the DataFrame
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn date_column(&self) -> &str {
        &self.date_column
    }

    pub fn target_column(&self) -> &str {
        &self.target_column
    }

    pub fn group_column(&self) -> Option<&str> {
        self.group_column.as_deref()
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.df.height()
    }

    fn with_frame(&self, df: DataFrame) -> Self {
        Self {
            df,
            date_column: self.date_column.clone(),
            target_column: self.target_column.clone(),
            group_column: self.group_column.clone(),
        }
    }

    /// Dates of every row, normalised to calendar days
    pub fn dates(&self) -> Result<Vec<NaiveDate>> {
        let col = self.df.column(&self.date_column)?;

        match col.dtype() {
            DataType::Date => {
                let days = col.cast(&DataType::Int32)?;
                days.i32()?
                    .into_iter()
                    .map(|opt| {
                        opt.ok_or_else(|| self.null_error(&self.date_column))
                            .and_then(date_from_epoch_days)
                    })
                    .collect()
            }
            DataType::Datetime(unit, _) => {
                let unit = *unit;
                let ticks = col.cast(&DataType::Int64)?;
                ticks
                    .i64()?
                    .into_iter()
                    .map(|opt| {
                        opt.ok_or_else(|| self.null_error(&self.date_column))
                            .and_then(|t| date_from_ticks(t, unit))
                    })
                    .collect()
            }
            DataType::Utf8 => col
                .utf8()?
                .into_iter()
                .map(|opt| {
                    opt.ok_or_else(|| self.null_error(&self.date_column))
                        .and_then(parse_date)
                })
                .collect(),
            other => Err(ForecastError::DataError(format!(
                "Column '{}' has type {} which is not a date",
                self.date_column, other
            ))),
        }
    }

    /// Target values of every row
    pub fn target_values(&self) -> Result<Vec<f64>> {
        let col = self.df.column(&self.target_column)?;
        let values = col.cast(&DataType::Float64).map_err(|e| {
            ForecastError::DataError(format!(
                "Column '{}' cannot be converted to f64: {}",
                self.target_column, e
            ))
        })?;

        values
            .f64()?
            .into_iter()
            .map(|opt| opt.ok_or_else(|| self.null_error(&self.target_column)))
            .collect()
    }

    /// Group id of every row, or `None` when the table has no group column
    pub fn group_values(&self) -> Result<Option<Vec<String>>> {
        let Some(group_column) = &self.group_column else {
            return Ok(None);
        };

        let col = self.df.column(group_column)?.cast(&DataType::Utf8)?;
        let ids = col
            .utf8()?
            .into_iter()
            .map(|opt| {
                opt.map(str::to_string)
                    .ok_or_else(|| self.null_error(group_column))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(ids))
    }

    /// Distinct group ids in order of first appearance
    pub fn group_ids(&self) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        let ids = self.group_values()?.unwrap_or_default();
        Ok(ids.into_iter().filter(|id| seen.insert(id.clone())).collect())
    }

    /// Latest date in the table
    pub fn max_date(&self) -> Result<Option<NaiveDate>> {
        Ok(self.dates()?.into_iter().max())
    }

    /// Copy of the table sorted ascending by date, keeping the relative
    /// order of rows that share a date
    pub fn sorted_by_date(&self) -> Result<Self> {
        let sorted = self.df.sort(vec![self.date_column.clone()], false, true)?;
        Ok(self.with_frame(sorted))
    }

    /// Rows `offset..offset + len`
    pub fn slice(&self, offset: usize, len: usize) -> Self {
        self.with_frame(self.df.slice(offset as i64, len))
    }

    /// Keep only the rows whose flag is set
    pub fn filter_rows(&self, keep: &[bool]) -> Result<Self> {
        if keep.len() != self.len() {
            return Err(ForecastError::DataError(format!(
                "Row mask has {} entries for {} rows",
                keep.len(),
                self.len()
            )));
        }

        let mask = BooleanChunked::from_slice("mask", keep);
        Ok(self.with_frame(self.df.filter(&mask)?))
    }

    /// Split the table into one slice per group (first-appearance order).
    /// A table without a group column yields a single unnamed slice.
    pub fn group_slices(&self) -> Result<Vec<(Option<String>, SeriesTable)>> {
        let Some(group_column) = &self.group_column else {
            return Ok(vec![(None, self.clone())]);
        };

        self.df
            .partition_by_stable([group_column.as_str()], true)?
            .into_iter()
            .map(|part| {
                let ids = part.column(group_column)?.cast(&DataType::Utf8)?;
                let id = ids
                    .utf8()?
                    .get(0)
                    .map(str::to_string)
                    .ok_or_else(|| self.null_error(group_column))?;
                Ok((Some(id), self.with_frame(part)))
            })
            .collect()
    }

    /// First date carried by more than one row
    pub fn repeated_date(&self) -> Result<Option<NaiveDate>> {
        let mut seen = HashSet::new();
        Ok(self.dates()?.into_iter().find(|date| !seen.insert(*date)))
    }

    /// Fail when two rows share a date, which means several series are
    /// mixed in a table that has no group column to tell them apart
    pub fn ensure_unique_dates(&self) -> Result<()> {
        match self.repeated_date()? {
            Some(date) => Err(ForecastError::DataError(format!(
                "Date {} appears more than once in a table without a group column",
                date
            ))),
            None => Ok(()),
        }
    }

    fn null_error(&self, column: &str) -> ForecastError {
        ForecastError::DataError(format!("Column '{}' contains null values", column))
    }
}

/// Days since 1970-01-01 for a date
pub(crate) fn epoch_days(date: NaiveDate) -> i32 {
    (date - NaiveDate::default()).num_days() as i32
}

fn date_from_epoch_days(days: i32) -> Result<NaiveDate> {
    let epoch = NaiveDate::default();
    let magnitude = Days::new(u64::from(days.unsigned_abs()));
    let date = if days >= 0 {
        epoch.checked_add_days(magnitude)
    } else {
        epoch.checked_sub_days(magnitude)
    };

    date.ok_or_else(|| ForecastError::DataError(format!("Day number {} is out of range", days)))
}

fn date_from_ticks(ticks: i64, unit: TimeUnit) -> Result<NaiveDate> {
    let per_second: i64 = match unit {
        TimeUnit::Nanoseconds => 1_000_000_000,
        TimeUnit::Microseconds => 1_000_000,
        TimeUnit::Milliseconds => 1_000,
    };

    DateTime::from_timestamp(ticks.div_euclid(per_second), 0)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| ForecastError::DataError(format!("Timestamp {} is out of range", ticks)))
}

fn parse_date(text: &str) -> Result<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.date()))
        .map_err(|_| ForecastError::DataError(format!("Cannot parse '{}' as a date", text)))
}

/// Build a Date series from calendar days
pub(crate) fn date_series(name: &str, dates: &[NaiveDate]) -> Result<Series> {
    let days: Vec<i32> = dates.iter().map(|d| epoch_days(*d)).collect();
    Ok(Series::new(name, days).cast(&DataType::Date)?)
}
