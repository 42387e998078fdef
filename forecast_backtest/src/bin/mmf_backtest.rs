use chrono::{Days, NaiveDate};
use forecast_backtest::{
    BacktestConfig, Backtester, DataLoader, ExponentialSmoothing, ForecastModel, MovingAverage,
    ResultTable, SeasonalNaive, SeriesTable,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::env;
use std::fs::File;
use std::io::BufWriter;
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: mmf_backtest <config.json> <data.csv|--demo> <start-date> \
                     [--model ma|es|snaive] [--out results.csv]";

struct Args {
    config: String,
    data: String,
    start: NaiveDate,
    model: String,
    out: Option<String>,
}

fn parse_args() -> Result<Args, String> {
    let mut positional = Vec::new();
    let mut model = "ma".to_string();
    let mut out = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--model" => model = args.next().ok_or("--model needs a value")?,
            "--out" => out = Some(args.next().ok_or("--out needs a value")?),
            "-h" | "--help" => return Err(USAGE.to_string()),
            _ => positional.push(arg),
        }
    }

    if positional.len() != 3 {
        return Err(USAGE.to_string());
    }
    let start = NaiveDate::parse_from_str(&positional[2], "%Y-%m-%d")
        .map_err(|e| format!("invalid start date {}: {}", positional[2], e))?;

    Ok(Args {
        config: positional[0].clone(),
        data: positional[1].clone(),
        start,
        model,
        out,
    })
}

// Daily sales of a few stores: weekly pattern, slow trend and noise
fn demo_series() -> Result<SeriesTable, Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(42);
    let noise = Normal::new(0.0, 4.0)?;
    let first = NaiveDate::from_ymd_opt(2020, 1, 1).ok_or("invalid demo date")?;

    let mut groups = Vec::new();
    let mut dates = Vec::new();
    let mut values = Vec::new();

    for (store, level) in [("store_1", 120.0), ("store_2", 80.0), ("store_3", 200.0)] {
        for day in 0..180u64 {
            let date = first
                .checked_add_days(Days::new(day))
                .ok_or("demo date out of range")?;
            let weekly = ((day % 7) as f64 / 7.0 * std::f64::consts::TAU).sin() * level * 0.1;
            let trend = day as f64 * 0.05;

            groups.push(store);
            dates.push(date);
            values.push(level + weekly + trend + noise.sample(&mut rng));
        }
    }

    Ok(SeriesTable::from_grouped_values(&groups, &dates, &values)?)
}

fn run<M: ForecastModel>(
    backtester: &Backtester,
    model: &M,
    series: &SeriesTable,
    start: NaiveDate,
) -> Result<ResultTable, Box<dyn std::error::Error>> {
    info!(model = model.name(), rows = series.len(), "Running backtest");
    Ok(backtester.backtest_groups(model, series, start, None)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            process::exit(2);
        }
    };

    let config = BacktestConfig::from_json_file(&args.config)?;
    let series = if args.data == "--demo" {
        demo_series()?
    } else {
        DataLoader::from_csv(&args.data, &config)?
    };
    let backtester = Backtester::new(config)?;

    let results = match args.model.as_str() {
        "ma" => run(&backtester, &MovingAverage::new(7)?, &series, args.start)?,
        "es" => run(&backtester, &ExponentialSmoothing::new(0.3)?, &series, args.start)?,
        "snaive" => run(&backtester, &SeasonalNaive::new(7)?, &series, args.start)?,
        other => {
            eprintln!("unknown model {}; expected ma, es or snaive", other);
            process::exit(2);
        }
    };

    println!("{} windows scored", results.len());
    for row in results.summary() {
        println!("{}", row);
    }
    for skipped in results.skipped_windows() {
        println!(
            "skipped {} {}: {}",
            skipped.group_id.as_deref().unwrap_or("-"),
            skipped.window_start_date,
            skipped.reason
        );
    }

    if let Some(path) = args.out {
        results.write_csv(BufWriter::new(File::create(&path)?))?;
        info!(path = %path, "Wrote results");
    }

    Ok(())
}
