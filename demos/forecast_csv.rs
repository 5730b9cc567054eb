//! Forecast one store/department from a weekly sales CSV.
//!
//! ```text
//! cargo run --example forecast_csv -- train.csv 1 1 30 > forecast.csv
//! RUST_LOG=weekly_sales_forecast=debug cargo run --example forecast_csv
//! ```
//!
//! Arguments: `[path] [store] [dept] [horizon]`. Without a path a synthetic
//! three-year history is used.

use chrono::{Duration, NaiveDate};
use std::error::Error;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use weekly_sales_forecast::core::{department_ids, store_ids};
use weekly_sales_forecast::io::{read_sales_csv_path, write_forecast_csv};
use weekly_sales_forecast::prelude::*;

fn synthetic_rows() -> Vec<RawObservation> {
    let start = NaiveDate::from_ymd_opt(2010, 2, 5).unwrap_or_default();
    (0..143)
        .flat_map(|t: i64| {
            let season = (2.0 * std::f64::consts::PI * (t % 52) as f64 / 52.0).sin();
            let holiday = matches!(t % 52, 42 | 46 | 47);
            [1u32, 2].map(|dept| {
                let sales = 15_000.0 * dept as f64 + 12.0 * t as f64 + 2_500.0 * season;
                RawObservation::on_date(1, start + Duration::weeks(t), sales)
                    .with_dept(dept)
                    .with_holiday(holiday)
            })
        })
        .collect()
}

fn main() -> std::result::Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weekly_sales_forecast=info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let rows = match args.first() {
        Some(path) => read_sales_csv_path(path)?,
        None => synthetic_rows(),
    };

    let stores = store_ids(&rows);
    let store = match args.get(1) {
        Some(s) => s.parse()?,
        None => *stores.first().ok_or("no stores in input")?,
    };
    let dept = match args.get(2) {
        Some(d) => d.parse()?,
        None => *department_ids(&rows, store)
            .first()
            .ok_or("no departments for store")?,
    };
    let horizon: usize = match args.get(3) {
        Some(h) => h.parse()?,
        None => 30,
    };
    info!(stores = stores.len(), store, dept, horizon, "selected series");

    let request = ForecastRequest::new(SeriesFilter::store_dept(store, dept), horizon);
    let report = run(&rows, &request)?;

    eprintln!("{}", report.summary());
    write_forecast_csv(&report.forecast, std::io::stdout().lock())?;
    Ok(())
}
