use chrono::NaiveDate;
use forecast_backtest::platform::{
    deploy_model, wait_for_endpoint, Deployment, EndpointState, InMemoryRegistry, ModelRegistry,
    PollPolicy, ServingClient,
};
use forecast_backtest::{
    BacktestConfig, Backtester, DataLoader, ExponentialSmoothing, ForecastError, MovingAverage,
    ResultTable, SeasonalNaive,
};
use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

// Two stores, 2023-01-01 ..= 2023-02-09, weekly pattern
fn create_sample_data() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    let first = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();

    writeln!(file, "store,day,sales").unwrap();
    for offset in 0..40u64 {
        let day = first.checked_add_days(chrono::Days::new(offset)).unwrap();
        let weekly = [0.0, 1.0, 2.0, 3.0, 2.0, 1.0, 5.0][(offset % 7) as usize];
        writeln!(file, "north,{},{}", day, 100.0 + weekly).unwrap();
        writeln!(file, "south,{},{}", day, 40.0 + 2.0 * weekly).unwrap();
    }

    file
}

#[derive(Debug, Default)]
struct FakeServing {
    endpoints: HashMap<String, (String, u32)>,
}

impl ServingClient for FakeServing {
    fn create_endpoint(&mut self, name: &str, model: &str, version: u32) -> forecast_backtest::error::Result<()> {
        self.endpoints
            .insert(name.to_string(), (model.to_string(), version));
        Ok(())
    }

    fn update_endpoint(&mut self, name: &str, model: &str, version: u32) -> forecast_backtest::error::Result<()> {
        let served = self
            .endpoints
            .get_mut(name)
            .ok_or_else(|| ForecastError::PlatformError(format!("{} not found", name)))?;
        *served = (model.to_string(), version);
        Ok(())
    }

    fn has_endpoint(&self, name: &str) -> forecast_backtest::error::Result<bool> {
        Ok(self.endpoints.contains_key(name))
    }

    fn endpoint_state(&self, name: &str) -> forecast_backtest::error::Result<EndpointState> {
        Ok(if self.endpoints.contains_key(name) {
            EndpointState::Ready
        } else {
            EndpointState::Failed("no such endpoint".to_string())
        })
    }

    fn delete_endpoint(&mut self, name: &str) -> forecast_backtest::error::Result<()> {
        self.endpoints
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| ForecastError::PlatformError(format!("{} not found", name)))
    }
}

#[test]
fn test_full_backtest_workflow() {
    // 1. Load data with custom column names
    let data_file = create_sample_data();
    let config = BacktestConfig::from_json_str(
        r#"{"freq": "D", "prediction_length": 7, "date_col": "day",
            "group_id": "store", "target": "sales", "metric": "mae"}"#,
    )
    .unwrap();
    let series = DataLoader::from_csv(data_file.path(), &config).unwrap();
    assert_eq!(series.len(), 80);

    // 2. Backtest three models on both stores
    let backtester = Backtester::new(config).unwrap();
    let start = NaiveDate::from_ymd_opt(2023, 1, 14).unwrap();

    let naive = backtester
        .backtest_groups(&SeasonalNaive::new(7).unwrap(), &series, start, None)
        .unwrap();
    let average = backtester
        .backtest_groups(&MovingAverage::new(7).unwrap(), &series, start, None)
        .unwrap();
    let smoothing = backtester
        .backtest_groups(&ExponentialSmoothing::new(0.3).unwrap(), &series, start, None)
        .unwrap();

    // cutoffs 01-15, 01-22, 01-29 per store
    assert_eq!(naive.len(), 6);
    assert_eq!(naive.columns()[0], "store");
    assert!(naive.records().iter().all(|r| r.metric_value.abs() < 1e-9));
    assert!(average.summary()[0].mean > 0.0);
    assert_eq!(smoothing.len(), naive.len());

    // 3. Export
    let combined = ResultTable::concat("store", vec![naive.clone(), average]);
    assert_eq!(combined.len(), 12);
    let df = combined.to_dataframe().unwrap();
    assert_eq!(df.height(), 12);

    let mut csv_out = Vec::new();
    combined.write_csv(&mut csv_out).unwrap();
    assert_eq!(String::from_utf8(csv_out).unwrap().lines().count(), 13);

    // 4. Register the best model and serve it
    let best = &naive.records()[0];
    let mut registry = InMemoryRegistry::new();
    let tags = HashMap::from([("metric".to_string(), best.metric_name.clone())]);
    let version = registry
        .register("seasonal_naive", best.fitted_model_blob.clone(), tags)
        .unwrap();
    assert_eq!(version, 1);

    let mut serving = FakeServing::default();
    let policy = PollPolicy {
        interval: Duration::from_millis(1),
        max_attempts: 3,
    };
    assert_eq!(
        deploy_model(&mut serving, "sales-forecast", "seasonal_naive", version, policy).unwrap(),
        Deployment::Created
    );
    assert_eq!(wait_for_endpoint(&serving, "sales-forecast", policy).unwrap(), 1);

    // A retrained version replaces the served one
    let version = registry
        .register("seasonal_naive", best.fitted_model_blob.clone(), HashMap::new())
        .unwrap();
    assert_eq!(
        deploy_model(&mut serving, "sales-forecast", "seasonal_naive", version, policy).unwrap(),
        Deployment::Updated
    );
    assert_eq!(
        serving.endpoints["sales-forecast"],
        ("seasonal_naive".to_string(), 2)
    );

    serving.delete_endpoint("sales-forecast").unwrap();
    assert!(wait_for_endpoint(&serving, "sales-forecast", policy).is_err());

    // 5. Forecast ahead
    let forecast = backtester
        .forecast(&SeasonalNaive::new(7).unwrap(), &series)
        .unwrap();
    assert_eq!(forecast.len(), 14);
    assert_eq!(
        forecast.points()[0].date,
        NaiveDate::from_ymd_opt(2023, 2, 10).unwrap()
    );
}

#[test]
fn test_config_file_errors() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, r#"{{"freq": "W", "prediction_length": 4}}"#).unwrap();

    let config = BacktestConfig::from_json_file(file.path()).unwrap();
    assert!(matches!(
        Backtester::new(config),
        Err(ForecastError::ConfigError(_))
    ));

    assert!(matches!(
        BacktestConfig::from_json_file("/nonexistent/config.json"),
        Err(ForecastError::IoError(_))
    ));
}
