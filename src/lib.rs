//! # MMF Workspace
//!
//! Many-model forecasting: fit, backtest and compare forecasting models
//! across many time series.
//!
//! - [`forecast_math`]: accuracy metrics and smoothing kernels
//! - [`forecast_backtest`]: walk-forward backtesting engine, models and
//!   result tables
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use mmf_workspace::prelude::*;
//!
//! let dates: Vec<NaiveDate> = (1..=20)
//!     .map(|d| NaiveDate::from_ymd_opt(2020, 1, d).unwrap())
//!     .collect();
//! let series = SeriesTable::from_values(&dates, &[5.0; 20]).unwrap();
//!
//! let backtester = Backtester::new(BacktestConfig::new("D", 3).with_stride(5)).unwrap();
//! let start = NaiveDate::from_ymd_opt(2020, 1, 5).unwrap();
//! let results = backtester
//!     .backtest(&MovingAverage::new(3).unwrap(), &series, start, Some("flat"), None)
//!     .unwrap();
//!
//! assert_eq!(results.len(), 3);
//! ```

pub use forecast_backtest;
pub use forecast_math;

/// Types needed to run a backtest
pub mod prelude {
    pub use forecast_backtest::{
        BacktestConfig, Backtester, DataLoader, ExponentialSmoothing, FailurePolicy,
        ForecastError, ForecastModel, ForecastTable, MetricKind, MetricRecord, MovingAverage,
        ResultTable, SeasonalNaive, SeriesTable,
    };
}
