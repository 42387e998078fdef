//! # Forecast Backtest
//!
//! Walk-forward backtesting of time series forecasting models.
//!
//! ## Features
//!
//! - Series tables backed by polars, loaded from CSV or Parquet
//! - Daily and month-end calendar stepping
//! - A model capability trait with local and hosted-inference variants
//! - Per-window accuracy scoring (sMAPE, MAPE, MAE, MSE, RMSE)
//! - Result tables with DataFrame, CSV and JSON output
//! - Registry and serving interfaces for deploying a chosen model
//!
//! ## Quick Start
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use forecast_backtest::{BacktestConfig, Backtester, DataLoader, MovingAverage};
//!
//! # fn main() -> forecast_backtest::error::Result<()> {
//! let config = BacktestConfig::new("D", 14).with_metric("mae");
//! let series = DataLoader::from_csv("sales.csv", &config)?;
//!
//! let backtester = Backtester::new(config)?;
//! let model = MovingAverage::new(7)?;
//! let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
//!
//! let results = backtester.backtest_groups(&model, &series, start, None)?;
//! for row in results.summary() {
//!     println!("{}", row);
//! }
//! # Ok(())
//! # }
//! ```

pub mod backtest;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod models;
pub mod offsets;
pub mod platform;
pub mod results;
pub mod serializer;
pub mod walker;

// Re-export commonly used types
pub use crate::backtest::Backtester;
pub use crate::config::{BacktestConfig, FailurePolicy, Frequency, MetricKind};
pub use crate::data::{DataLoader, SeriesTable};
pub use crate::error::ForecastError;
pub use crate::metrics::MetricEvaluator;
pub use crate::models::{
    ExponentialSmoothing, ForecastModel, ForecastTable, MovingAverage, RemoteModel,
    SeasonalNaive, UnivariateModel,
};
pub use crate::results::{MetricRecord, MetricSummary, ResultAggregator, ResultTable};
pub use crate::serializer::{JsonSerializer, ModelSerializer};
pub use crate::walker::{Window, WindowWalker};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
