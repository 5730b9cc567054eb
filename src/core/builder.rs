//! Series builder: raw sales rows to a regular weekly series.
//!
//! Rows are validated, filtered, bucketed into weeks, summed per week and
//! regularized so that every week between the first and last one has a
//! value. Interior gaps are filled according to [`GapFill`]; a requested
//! boundary week without data is an error, never an extrapolation.

use super::observation::{RawObservation, SeriesFilter};
use super::weekly_series::WeeklySeries;
use crate::error::{ForecastError, Result};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Two full yearly cycles of weekly data.
pub const DEFAULT_MIN_WEEKS: usize = 104;

/// Fifty years of weeks. A longer span usually means a mistyped year.
pub const DEFAULT_MAX_WEEKS: usize = 2600;

/// Policy for interior weeks that no row reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapFill {
    /// Linear interpolation between the nearest reported neighbours.
    #[default]
    Linear,
    /// Treat the week as zero sales.
    Zero,
}

/// Which weekday a week starts on.
///
/// `Weekday(Weekday::Mon)` groups rows into the same Monday to Sunday bins
/// as pandas `resample("W")`. The week is labelled by its Monday here, where
/// pandas labels it by the closing Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekAnchor {
    /// Weeks start on the weekday of the earliest valid observation.
    #[default]
    FirstObservation,
    /// Weeks start on a fixed weekday.
    Weekday(Weekday),
}

/// Configuration for [`build_series_with`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesConfig {
    /// How interior gaps are filled.
    pub gap_fill: GapFill,
    /// How dates are assigned to weeks.
    pub anchor: WeekAnchor,
    /// Minimum number of weeks the regular series must have.
    pub min_weeks: usize,
    /// First week of the requested range. Defaults to the first observed week.
    pub start: Option<NaiveDate>,
    /// Last week of the requested range. Defaults to the last observed week.
    pub end: Option<NaiveDate>,
    /// Longest span the series may cover, in weeks. `None` disables the cap.
    pub max_weeks: Option<usize>,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            gap_fill: GapFill::Linear,
            anchor: WeekAnchor::FirstObservation,
            min_weeks: DEFAULT_MIN_WEEKS,
            start: None,
            end: None,
            max_weeks: Some(DEFAULT_MAX_WEEKS),
        }
    }
}

impl SeriesConfig {
    /// Config whose minimum length matches what the model needs.
    pub fn for_model(model: &crate::models::ModelConfig) -> Self {
        Self {
            min_weeks: model.min_observations(),
            ..Default::default()
        }
    }
}

/// One week after validation and aggregation.
#[derive(Debug, Clone, Copy, Default)]
struct WeekBucket {
    total: f64,
    holiday: bool,
}

/// Build a weekly series with the default configuration.
pub fn build_series(rows: &[RawObservation], filter: &SeriesFilter) -> Result<WeeklySeries> {
    build_series_with(rows, filter, &SeriesConfig::default())
}

/// Build a weekly series from raw rows.
///
/// # Errors
/// - [`ForecastError::EmptyInput`] if no row survives validation and filtering.
/// - [`ForecastError::BoundaryGap`] if a requested start or end week has no data.
/// - [`ForecastError::InsufficientData`] if fewer than `config.min_weeks` remain.
/// - [`ForecastError::InvalidParameter`] if the span exceeds `config.max_weeks`.
pub fn build_series_with(
    rows: &[RawObservation],
    filter: &SeriesFilter,
    config: &SeriesConfig,
) -> Result<WeeklySeries> {
    if rows.is_empty() {
        return Err(ForecastError::EmptyInput("no rows supplied".to_string()));
    }

    let mut bad_dates = 0usize;
    let mut bad_sales = 0usize;
    let mut valid: Vec<(NaiveDate, &RawObservation)> = Vec::with_capacity(rows.len());

    for row in rows.iter().filter(|r| filter.matches(r)) {
        let Some(date) = row.parsed_date() else {
            bad_dates += 1;
            continue;
        };
        if !row.has_valid_sales() {
            bad_sales += 1;
            continue;
        }
        valid.push((date, row));
    }

    if bad_dates > 0 || bad_sales > 0 {
        warn!(
            bad_dates,
            bad_sales,
            kept = valid.len(),
            "dropped invalid sales rows"
        );
    }

    let first_date = valid
        .iter()
        .map(|(d, _)| *d)
        .min()
        .ok_or_else(|| {
            ForecastError::EmptyInput(format!("no valid rows for {}", filter.describe()))
        })?;

    let anchor = match config.anchor {
        WeekAnchor::FirstObservation => first_date.weekday(),
        WeekAnchor::Weekday(day) => day,
    };

    let range_start = config.start.map(|d| week_start(d, anchor));
    let range_end = config.end.map(|d| week_start(d, anchor));
    if let (Some(s), Some(e)) = (range_start, range_end) {
        if s > e {
            return Err(ForecastError::InvalidParameter(format!(
                "requested range starts at {} after it ends at {}",
                s, e
            )));
        }
    }

    let mut weeks: BTreeMap<NaiveDate, WeekBucket> = BTreeMap::new();
    for (date, row) in &valid {
        let key = week_start(*date, anchor);
        if range_start.is_some_and(|s| key < s) || range_end.is_some_and(|e| key > e) {
            continue;
        }
        let bucket = weeks.entry(key).or_default();
        bucket.total += row.sales_amount;
        bucket.holiday |= row.is_holiday.unwrap_or(false);
    }

    let (&observed_first, _) = weeks.first_key_value().ok_or_else(|| {
        ForecastError::EmptyInput(format!(
            "no rows for {} inside the requested range",
            filter.describe()
        ))
    })?;
    let (&observed_last, _) = weeks.last_key_value().ok_or_else(|| {
        ForecastError::EmptyInput(format!("no rows for {}", filter.describe()))
    })?;

    let start = range_start.unwrap_or(observed_first);
    let end = range_end.unwrap_or(observed_last);
    if start < observed_first {
        return Err(ForecastError::BoundaryGap { date: start });
    }
    if end > observed_last {
        return Err(ForecastError::BoundaryGap { date: end });
    }

    let n_weeks = ((end - start).num_days() / 7) as usize + 1;
    if let Some(max_weeks) = config.max_weeks {
        if n_weeks > max_weeks {
            return Err(ForecastError::InvalidParameter(format!(
                "{} spans {} weeks from {} to {}, more than the limit of {}",
                filter.describe(),
                n_weeks,
                start,
                end,
                max_weeks
            )));
        }
    }
    let mut raw = Vec::with_capacity(n_weeks);
    let mut holidays = Vec::with_capacity(n_weeks);
    for i in 0..n_weeks {
        let date = start + Duration::weeks(i as i64);
        match weeks.get(&date) {
            Some(bucket) => {
                raw.push(Some(bucket.total));
                holidays.push(bucket.holiday);
            }
            None => {
                raw.push(None);
                holidays.push(false);
            }
        }
    }

    let filled: Vec<bool> = raw.iter().map(Option::is_none).collect();
    let n_filled = filled.iter().filter(|&&f| f).count();
    if n_filled > n_weeks - n_filled {
        warn!(
            filled = n_filled,
            observed = n_weeks - n_filled,
            start = %start,
            end = %end,
            "most weeks are interpolated; check for stray dates"
        );
    } else if n_filled > 0 {
        debug!(
            weeks = n_filled,
            policy = ?config.gap_fill,
            "filling missing interior weeks"
        );
    }

    let values = fill_gaps(&raw, config.gap_fill);

    if values.len() < config.min_weeks {
        return Err(ForecastError::InsufficientData {
            needed: config.min_weeks,
            got: values.len(),
        });
    }

    debug!(
        weeks = values.len(),
        start = %start,
        end = %end,
        "built weekly series for {}",
        filter.describe()
    );

    Ok(WeeklySeries::new(start, values)?.with_flags(filled, holidays))
}

/// Start of the week containing `date`, for weeks beginning on `anchor`.
pub fn week_start(date: NaiveDate, anchor: Weekday) -> NaiveDate {
    let offset = (date.weekday().num_days_from_monday() + 7
        - anchor.num_days_from_monday())
        % 7;
    date - Duration::days(offset as i64)
}

/// Fill interior `None` runs. Both ends are known to be `Some`.
fn fill_gaps(raw: &[Option<f64>], policy: GapFill) -> Vec<f64> {
    let mut result: Vec<f64> = raw.iter().map(|v| v.unwrap_or(f64::NAN)).collect();
    let n = result.len();

    let mut i = 0;
    while i < n {
        if !result[i].is_nan() {
            i += 1;
            continue;
        }

        let start = i;
        while i < n && result[i].is_nan() {
            i += 1;
        }
        let end = i;

        match policy {
            GapFill::Zero => result[start..end].fill(0.0),
            GapFill::Linear => {
                // Callers guarantee observed values at both ends.
                let left = result[start - 1];
                let right = result[end];
                let segments = (end - start + 1) as f64;
                for (j, idx) in (start..end).enumerate() {
                    let t = (j + 1) as f64 / segments;
                    result[idx] = left + t * (right - left);
                }
            }
        }
    }

    result
}
