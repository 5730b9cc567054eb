//! End-to-end scenarios: sales rows in, weekly forecast out.

use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;
use weekly_sales_forecast::core::{department_ids, store_ids};
use weekly_sales_forecast::io::{read_sales_csv, write_forecast_csv};
use weekly_sales_forecast::prelude::*;

const PERIOD: usize = 52;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2010, 2, 5).unwrap()
}

fn seasonal_offset(week: usize, amplitude: f64) -> f64 {
    amplitude * (2.0 * PI * (week % PERIOD) as f64 / PERIOD as f64).sin()
}

/// Truth for a store: level + slope*t + seasonal offset.
fn truth(t: usize, level: f64, slope: f64, amplitude: f64) -> f64 {
    level + slope * t as f64 + seasonal_offset(t, amplitude)
}

fn make_rows(weeks: usize, store: u32, level: f64, slope: f64, amplitude: f64) -> Vec<RawObservation> {
    (0..weeks)
        .map(|t| {
            RawObservation::on_date(
                store,
                start() + Duration::weeks(t as i64),
                truth(t, level, slope, amplitude),
            )
            .with_dept(1)
        })
        .collect()
}

#[test]
fn three_year_trend_and_season_forecast_at_horizon_one() {
    let (level, slope, amplitude) = (1000.0, 2.0, 100.0);
    let rows = make_rows(156, 1, level, slope, amplitude);

    let series = build_series(&rows, &SeriesFilter::store(1)).unwrap();
    let result = forecast(&series, 1).unwrap();

    assert_eq!(result.points().len(), 1);
    assert_eq!(result.points()[0].date, series.end() + Duration::days(7));
    assert_relative_eq!(
        result.points()[0].value,
        truth(156, level, slope, amplitude),
        epsilon = 1e-6
    );
}

#[test]
fn noisy_sales_forecast_tracks_truth() {
    let mut rng = StdRng::seed_from_u64(42);
    let (level, slope, amplitude) = (20_000.0, 15.0, 3_000.0);
    let rows: Vec<RawObservation> = (0..156)
        .map(|t| {
            let noise: f64 = rng.gen_range(-300.0..300.0);
            RawObservation::on_date(
                1,
                start() + Duration::weeks(t as i64),
                truth(t, level, slope, amplitude) + noise,
            )
        })
        .collect();

    let series = build_series(&rows, &SeriesFilter::store(1)).unwrap();
    let result = forecast(&series, 26).unwrap();

    let miss: f64 = result
        .values()
        .iter()
        .enumerate()
        .map(|(h, v)| (v - truth(156 + h, level, slope, amplitude)).abs())
        .sum::<f64>()
        / 26.0;
    assert!(miss < 1_000.0, "mean miss {miss} too large");
    assert!(result.error_metric() > 0.0);
    assert!(result.error_metric() < 1_000.0);
}

#[test]
fn single_missing_week_is_interpolated() {
    let mut rows = make_rows(120, 1, 500.0, 3.0, 0.0);
    let missing = rows.remove(60);
    assert_eq!(missing.parsed_date(), Some(start() + Duration::weeks(60)));

    let series = build_series(&rows, &SeriesFilter::store(1)).unwrap();
    assert_eq!(series.len(), 120);
    assert_eq!(series.filled_weeks(), 1);

    let values = series.values();
    assert_relative_eq!(values[60], (values[59] + values[61]) / 2.0, epsilon = 1e-9);
    assert_relative_eq!(values[60], 500.0 + 3.0 * 60.0, epsilon = 1e-9);
}

#[test]
fn minimum_length_boundary() {
    let rows = make_rows(104, 1, 800.0, 1.0, 50.0);
    let series = build_series(&rows, &SeriesFilter::store(1)).unwrap();
    assert!(forecast(&series, 1).is_ok());

    let rows = make_rows(103, 1, 800.0, 1.0, 50.0);
    let err = build_series(&rows, &SeriesFilter::store(1)).unwrap_err();
    assert_eq!(
        err,
        ForecastError::InsufficientData {
            needed: 104,
            got: 103
        }
    );
}

#[test]
fn horizon_boundaries() {
    let rows = make_rows(110, 1, 800.0, 1.0, 50.0);
    let series = build_series(&rows, &SeriesFilter::store(1)).unwrap();

    assert_eq!(
        forecast(&series, 0).unwrap_err(),
        ForecastError::InvalidHorizon(0)
    );
    assert_eq!(forecast(&series, 1).unwrap().points().len(), 1);
}

#[test]
fn requested_range_past_data_is_a_boundary_gap() {
    let rows = make_rows(110, 1, 800.0, 1.0, 50.0);
    let config = SeriesConfig {
        end: Some(start() + Duration::weeks(115)),
        ..Default::default()
    };

    let err = build_series_with(&rows, &SeriesFilter::store(1), &config).unwrap_err();
    assert!(err.is_insufficient_data());
    assert!(matches!(err, ForecastError::BoundaryGap { .. }));
}

#[test]
fn stores_aggregate_without_filter() {
    let mut rows = make_rows(110, 1, 1000.0, 1.0, 100.0);
    rows.extend(make_rows(110, 2, 3000.0, 2.0, 200.0));

    let combined = build_series(&rows, &SeriesFilter::all()).unwrap();
    let store_one = build_series(&rows, &SeriesFilter::store(1)).unwrap();
    let store_two = build_series(&rows, &SeriesFilter::store(2)).unwrap();

    for i in 0..combined.len() {
        assert_relative_eq!(
            combined.values()[i],
            store_one.values()[i] + store_two.values()[i],
            epsilon = 1e-9
        );
    }
}

#[test]
fn multiplicative_model_on_positive_sales() {
    let rows: Vec<RawObservation> = (0..156)
        .map(|t| {
            let base = 5_000.0 + 10.0 * t as f64;
            let factor = 1.0 + 0.3 * (2.0 * PI * (t % PERIOD) as f64 / PERIOD as f64).sin();
            RawObservation::on_date(1, start() + Duration::weeks(t as i64), base * factor)
        })
        .collect();

    let request = ForecastRequest::new(SeriesFilter::store(1), 12).with_model(ModelConfig {
        seasonal: SeasonalType::Multiplicative,
        ..Default::default()
    });
    let report = run(&rows, &request).unwrap();

    assert_eq!(report.forecast.model_name(), "HoltWinters(add,mul,52)");
    assert!(report.forecast.values().iter().all(|v| *v > 0.0));
}

#[test]
fn csv_round_trip_through_pipeline() {
    let mut csv = String::from("Store,Dept,Date,Weekly_Sales,IsHoliday\n");
    for t in 0..130 {
        let date = start() + Duration::weeks(t as i64);
        for dept in 1..=2 {
            let sales = truth(t, 15_000.0 * dept as f64, 5.0, 1_200.0);
            let holiday = if t % PERIOD == 30 { "TRUE" } else { "FALSE" };
            csv.push_str(&format!("1,{},{},{:.2},{}\n", dept, date, sales, holiday));
        }
    }
    // A corrupt duplicate row the builder must drop.
    csv.push_str("1,1,2010-02-05,oops,FALSE\n");

    let rows = read_sales_csv(csv.as_bytes()).unwrap();
    assert_eq!(store_ids(&rows), vec![1]);
    assert_eq!(department_ids(&rows, 1), vec![1, 2]);

    let report = run(&rows, &ForecastRequest::new(SeriesFilter::store_dept(1, 2), 30)).unwrap();
    assert_eq!(report.series.len(), 130);
    assert!(report.series.is_holiday_week(30));
    assert!(report
        .summary()
        .starts_with("Generated a 30-week forecast for Store 1, Dept 2"));

    let mut out = Vec::new();
    write_forecast_csv(&report.forecast, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().count(), 31);
    assert!(text.starts_with("Date,Forecast_Weekly_Sales\n"));
    let first_date = (report.series.end() + Duration::weeks(1)).to_string();
    assert!(text.lines().nth(1).unwrap().starts_with(&first_date));
}
