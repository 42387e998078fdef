use chrono::NaiveDate;
use forecast_backtest::{BacktestConfig, DataLoader, ForecastError, SeriesTable};
use polars::prelude::*;
use std::fs::File;
use std::io::Write;
use tempfile::NamedTempFile;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn create_sample_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();

    writeln!(file, "unique_id,ds,y").unwrap();
    writeln!(file, "store_2,2023-01-02,21.0").unwrap();
    writeln!(file, "store_1,2023-01-01,10.0").unwrap();
    writeln!(file, "store_2,2023-01-01,20.0").unwrap();
    writeln!(file, "store_1,2023-01-02,11").unwrap();
    writeln!(file, "store_1,2023-01-03,12.5").unwrap();

    file
}

#[test]
fn test_load_csv() {
    let file = create_sample_csv();
    let config = BacktestConfig::new("D", 2);

    let series = DataLoader::from_csv(file.path(), &config).unwrap();

    assert_eq!(series.len(), 5);
    assert_eq!(series.group_column(), Some("unique_id"));
    assert_eq!(series.group_ids().unwrap(), vec!["store_2", "store_1"]);
    assert_eq!(series.max_date().unwrap(), Some(date(2023, 1, 3)));
    assert_eq!(series.target_values().unwrap(), vec![21.0, 10.0, 20.0, 11.0, 12.5]);
}

#[test]
fn test_sorted_by_date_is_stable() {
    let file = create_sample_csv();
    let series = DataLoader::from_csv(file.path(), &BacktestConfig::new("D", 2)).unwrap();

    let sorted = series.sorted_by_date().unwrap();
    assert_eq!(sorted.target_values().unwrap(), vec![10.0, 20.0, 21.0, 11.0, 12.5]);
    assert_eq!(
        sorted.group_values().unwrap().unwrap(),
        vec!["store_1", "store_2", "store_2", "store_1", "store_1"]
    );
}

#[test]
fn test_group_slices() {
    let file = create_sample_csv();
    let series = DataLoader::from_csv(file.path(), &BacktestConfig::new("D", 2)).unwrap();

    let slices = series.group_slices().unwrap();
    assert_eq!(slices.len(), 2);
    assert_eq!(slices[0].0.as_deref(), Some("store_2"));
    assert_eq!(slices[0].1.len(), 2);
    assert_eq!(slices[1].1.target_values().unwrap(), vec![10.0, 11.0, 12.5]);
}

#[test]
fn test_custom_column_names() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "date,sales").unwrap();
    writeln!(file, "2023-01-01,5").unwrap();
    writeln!(file, "2023-01-02,6").unwrap();

    let config = BacktestConfig::new("D", 1).with_columns("date", "store", "sales");
    let series = DataLoader::from_csv(file.path(), &config).unwrap();

    assert_eq!(series.group_column(), None);
    assert!(series.group_ids().unwrap().is_empty());
    assert_eq!(series.dates().unwrap(), vec![date(2023, 1, 1), date(2023, 1, 2)]);
    assert_eq!(series.group_slices().unwrap().len(), 1);
}

#[test]
fn test_missing_column() {
    let file = create_sample_csv();
    let config = BacktestConfig::new("D", 1).with_columns("ds", "unique_id", "sales");

    let result = DataLoader::from_csv(file.path(), &config);
    assert!(matches!(result, Err(ForecastError::DataError(_))));
}

#[test]
fn test_missing_file() {
    let result = DataLoader::from_csv("/nonexistent/path.csv", &BacktestConfig::new("D", 1));
    assert!(matches!(result, Err(ForecastError::IoError(_))));
}

#[test]
fn test_bad_date_value() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "ds,y").unwrap();
    writeln!(file, "yesterday,5").unwrap();

    let result = DataLoader::from_csv(file.path(), &BacktestConfig::new("D", 1));
    assert!(matches!(result, Err(ForecastError::DataError(ref msg)) if msg.contains("yesterday")));
}

#[test]
fn test_missing_group_column_with_repeated_dates() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "store,ds,y").unwrap();
    writeln!(file, "a,2023-01-01,10").unwrap();
    writeln!(file, "b,2023-01-01,100").unwrap();
    writeln!(file, "a,2023-01-02,11").unwrap();
    writeln!(file, "b,2023-01-02,101").unwrap();

    let err = DataLoader::from_csv(file.path(), &BacktestConfig::new("D", 1)).unwrap_err();
    match err {
        ForecastError::DataError(msg) => {
            assert!(msg.contains("'unique_id'"));
            assert!(msg.contains("2023-01-01"));
        }
        other => panic!("Expected DataError, got {:?}", other),
    }

    let config = BacktestConfig::new("D", 1).with_columns("ds", "store", "y");
    let series = DataLoader::from_csv(file.path(), &config).unwrap();
    assert_eq!(series.group_ids().unwrap(), vec!["a", "b"]);
}

#[test]
fn test_repeated_dates_without_group_column() {
    let series = SeriesTable::from_values(
        &[date(2023, 1, 1), date(2023, 1, 2), date(2023, 1, 2)],
        &[1.0, 2.0, 3.0],
    )
    .unwrap();

    assert_eq!(series.repeated_date().unwrap(), Some(date(2023, 1, 2)));
    assert!(matches!(
        series.ensure_unique_dates(),
        Err(ForecastError::DataError(_))
    ));
    assert!(series.slice(0, 2).ensure_unique_dates().is_ok());
}

#[test]
fn test_group_slices_many_groups() {
    let ids: Vec<String> = (0..3000).rev().map(|i| format!("g{}", i)).collect();
    let mut groups = Vec::new();
    let mut dates = Vec::new();
    let mut values = Vec::new();
    for day in 1..=10 {
        for (i, id) in ids.iter().enumerate() {
            groups.push(id.as_str());
            dates.push(date(2023, 1, day));
            values.push(i as f64);
        }
    }
    let series = SeriesTable::from_grouped_values(&groups, &dates, &values).unwrap();

    assert_eq!(series.group_ids().unwrap(), ids);

    let slices = series.group_slices().unwrap();
    assert_eq!(slices.len(), 3000);
    let order: Vec<&str> = slices.iter().map(|(g, _)| g.as_deref().unwrap()).collect();
    assert_eq!(order, ids.iter().map(String::as_str).collect::<Vec<_>>());

    let (id, last) = &slices[2999];
    assert_eq!(id.as_deref(), Some("g0"));
    assert_eq!(last.target_values().unwrap(), vec![2999.0; 10]);
    assert_eq!(last.dates().unwrap()[9], date(2023, 1, 10));
}

#[test]
fn test_load_parquet() {
    let source = SeriesTable::from_grouped_values(
        &["a", "a", "b"],
        &[date(2023, 1, 1), date(2023, 1, 2), date(2023, 1, 1)],
        &[1.0, 2.0, 3.0],
    )
    .unwrap();
    let mut df = source.dataframe().clone();

    let file = NamedTempFile::new().unwrap();
    ParquetWriter::new(File::create(file.path()).unwrap())
        .finish(&mut df)
        .unwrap();

    let series = DataLoader::from_parquet(file.path(), &BacktestConfig::new("D", 1)).unwrap();
    assert_eq!(series.len(), 3);
    assert_eq!(series.dates().unwrap(), source.dates().unwrap());
    assert_eq!(series.group_ids().unwrap(), vec!["a", "b"]);
}

#[test]
fn test_datetime_column() {
    let millis: Vec<i64> = vec![1_672_531_200_000, 1_672_617_600_000]; // 2023-01-01, 2023-01-02
    let ds = Series::new("ds", millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        .unwrap();
    let df = DataFrame::new(vec![ds, Series::new("y", &[1.0, 2.0])]).unwrap();

    let series = SeriesTable::new(df, "ds", "y", None).unwrap();
    assert_eq!(series.dates().unwrap(), vec![date(2023, 1, 1), date(2023, 1, 2)]);
}

#[test]
fn test_mismatched_lengths() {
    assert!(matches!(
        SeriesTable::from_values(&[date(2023, 1, 1)], &[1.0, 2.0]),
        Err(ForecastError::DataError(_))
    ));
}
