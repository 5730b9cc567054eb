//! CSV boundary: read the weekly sales table, write forecasts.
//!
//! Expected input columns:
//!   Store, Dept, Date, Weekly_Sales, IsHoliday
//!
//! `Dept` and `IsHoliday` may be absent. A `Weekly_Sales` cell that is not a
//! number is kept as a missing value so the series builder can drop and
//! count it with the other invalid rows.

use crate::core::{ForecastResult, RawObservation};
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

/// One row of the transactional sales table.
#[derive(Debug, Clone, Deserialize)]
struct SalesRecord {
    #[serde(rename = "Store")]
    store: u32,
    #[serde(rename = "Dept", default)]
    dept: Option<u32>,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Weekly_Sales", deserialize_with = "csv::invalid_option")]
    weekly_sales: Option<f64>,
    #[serde(rename = "IsHoliday", default, deserialize_with = "deserialize_holiday")]
    is_holiday: Option<bool>,
}

impl SalesRecord {
    fn into_observation(self) -> RawObservation {
        RawObservation {
            store_id: self.store,
            dept_id: self.dept,
            week_start: self.date,
            sales_amount: self.weekly_sales.unwrap_or(f64::NAN),
            is_holiday: self.is_holiday,
        }
    }
}

#[derive(Debug, Serialize)]
struct ForecastRow {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Forecast_Weekly_Sales")]
    value: f64,
}

/// Read sales rows from any CSV source with a header line.
///
/// # Errors
/// `Csv` with the line number when a row cannot be decoded (for example a
/// non-numeric store id).
pub fn read_sales_csv<R: Read>(reader: R) -> Result<Vec<RawObservation>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (line_num, result) in csv_reader.deserialize().enumerate() {
        let record: SalesRecord = result.map_err(|e| {
            ForecastError::Csv(format!("parse error at line {}: {}", line_num + 2, e))
        })?;
        rows.push(record.into_observation());
    }

    debug!(rows = rows.len(), "read sales table");
    Ok(rows)
}

/// Read sales rows from a CSV file.
pub fn read_sales_csv_path<P: AsRef<Path>>(path: P) -> Result<Vec<RawObservation>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .map_err(|e| ForecastError::Csv(format!("failed to open '{}': {}", path.display(), e)))?;
    read_sales_csv(file)
}

/// Write the forecast as `Date,Forecast_Weekly_Sales` with ISO dates.
pub fn write_forecast_csv<W: Write>(result: &ForecastResult, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for point in result.points() {
        csv_writer.serialize(ForecastRow {
            date: point.date,
            value: point.value,
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Lenient holiday flag: "TRUE"/"False", "1"/"0", "yes"/"no". Empty is missing.
fn deserialize_holiday<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    match s.trim().to_lowercase().as_str() {
        "" => Ok(None),
        "true" | "1" | "yes" | "y" => Ok(Some(true)),
        "false" | "0" | "no" | "n" => Ok(Some(false)),
        other => Err(serde::de::Error::custom(format!(
            "expected holiday flag, got '{}'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{build_series_with, SeriesConfig, SeriesFilter, WeeklySeries};
    use crate::engine::forecast;

    const SAMPLE_CSV: &str = "\
Store,Dept,Date,Weekly_Sales,IsHoliday
1,1,2010-02-05,24924.50,FALSE
1,1,2010-02-12,46039.49,TRUE
1,2,2010-02-05,50605.27,FALSE
2,1,2010-02-05,35034.06,False
1,1,2010-02-19,n/a,FALSE
";

    #[test]
    fn read_sample_csv() {
        let rows = read_sales_csv(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(rows.len(), 5);

        assert_eq!(rows[0].store_id, 1);
        assert_eq!(rows[0].dept_id, Some(1));
        assert_eq!(rows[0].week_start, "2010-02-05");
        assert!((rows[0].sales_amount - 24924.50).abs() < 1e-9);
        assert_eq!(rows[0].is_holiday, Some(false));
        assert_eq!(rows[1].is_holiday, Some(true));
        assert_eq!(rows[3].store_id, 2);
    }

    #[test]
    fn unparseable_sales_become_invalid_rows() {
        let rows = read_sales_csv(SAMPLE_CSV.as_bytes()).unwrap();
        assert!(rows[4].sales_amount.is_nan());
        assert!(!rows[4].has_valid_sales());

        // The builder drops it: only two valid weeks remain for Store 1, Dept 1.
        let config = SeriesConfig {
            min_weeks: 1,
            ..Default::default()
        };
        let series = build_series_with(&rows, &SeriesFilter::store_dept(1, 1), &config).unwrap();
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn optional_columns_may_be_absent() {
        let data = "Store,Date,Weekly_Sales\n3,02/05/2010,100.0\n";
        let rows = read_sales_csv(data.as_bytes()).unwrap();
        assert_eq!(rows[0].dept_id, None);
        assert_eq!(rows[0].is_holiday, None);
        assert_eq!(
            rows[0].parsed_date(),
            NaiveDate::from_ymd_opt(2010, 2, 5)
        );
    }

    #[test]
    fn bad_store_id_reports_line() {
        let data = "Store,Dept,Date,Weekly_Sales,IsHoliday\n1,1,2010-02-05,1.0,FALSE\nx,1,2010-02-12,2.0,FALSE\n";
        let err = read_sales_csv(data.as_bytes()).unwrap_err();
        match err {
            ForecastError::Csv(msg) => assert!(msg.contains("line 3")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn bad_holiday_flag_is_an_error() {
        let data = "Store,Dept,Date,Weekly_Sales,IsHoliday\n1,1,2010-02-05,1.0,maybe\n";
        assert!(matches!(
            read_sales_csv(data.as_bytes()),
            Err(ForecastError::Csv(_))
        ));
    }

    #[test]
    fn missing_file_is_csv_error() {
        assert!(matches!(
            read_sales_csv_path("/definitely/not/here.csv"),
            Err(ForecastError::Csv(_))
        ));
    }

    #[test]
    fn write_forecast_with_iso_dates() {
        let start = NaiveDate::from_ymd_opt(2010, 2, 5).unwrap();
        let values: Vec<f64> = (0..104)
            .map(|i| 100.0 + i as f64 + if i % 52 == 0 { 20.0 } else { 0.0 })
            .collect();
        let series = WeeklySeries::new(start, values).unwrap();
        let result = forecast(&series, 3).unwrap();

        let mut out = Vec::new();
        write_forecast_csv(&result, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Date,Forecast_Weekly_Sales");
        assert!(lines[1].starts_with("2012-02-03,"));
        assert!(lines[3].starts_with("2012-02-17,"));
    }
}
