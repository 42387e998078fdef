use chrono::{Days, NaiveDate};
use forecast_backtest::{
    BacktestConfig, Backtester, ExponentialSmoothing, MovingAverage, ResultTable, SeasonalNaive,
    SeriesTable,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Forecast Backtest: Model Comparison Example");
    println!("===========================================\n");

    let series = create_sample_data()?;
    println!("Sample data created: {} rows\n", series.len());

    let config = BacktestConfig::new("D", 7).with_metric("smape");
    let backtester = Backtester::new(config)?;
    let start = NaiveDate::from_ymd_opt(2023, 1, 28).ok_or("invalid date")?;

    let runs = [
        ("moving average", backtester.backtest_groups(&MovingAverage::new(7)?, &series, start, None)?),
        ("smoothing", backtester.backtest_groups(&ExponentialSmoothing::new(0.3)?, &series, start, None)?),
        ("seasonal naive", backtester.backtest_groups(&SeasonalNaive::new(7)?, &series, start, None)?),
    ];

    for (label, results) in &runs {
        print_summary(label, results);
    }

    // Forecast the next week with the seasonal model
    let forecast = backtester.forecast(&SeasonalNaive::new(7)?, &series)?;
    println!("\nNext week:");
    for point in forecast.points() {
        println!(
            "  {} {}: {:.2}",
            point.group.as_deref().unwrap_or("-"),
            point.date,
            point.value
        );
    }

    Ok(())
}

fn print_summary(label: &str, results: &ResultTable) {
    println!("{} ({} windows)", label, results.len());
    for row in results.summary() {
        println!("  {}", row);
    }
}

// Two products with weekly seasonality and opposite trends
fn create_sample_data() -> Result<SeriesTable, Box<dyn std::error::Error>> {
    let first = NaiveDate::from_ymd_opt(2023, 1, 1).ok_or("invalid date")?;
    let mut groups = Vec::new();
    let mut dates = Vec::new();
    let mut values = Vec::new();

    for day in 0..90u64 {
        let date = first.checked_add_days(Days::new(day)).ok_or("date out of range")?;
        let weekday = (day % 7) as f64;

        groups.push("coffee");
        dates.push(date);
        values.push(50.0 + weekday * 3.0 + day as f64 * 0.2);

        groups.push("tea");
        dates.push(date);
        values.push(30.0 + (6.0 - weekday) * 2.0 - day as f64 * 0.1);
    }

    Ok(SeriesTable::from_grouped_values(&groups, &dates, &values)?)
}
