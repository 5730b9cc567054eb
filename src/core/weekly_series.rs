//! Regular weekly series: one value per week, no gaps, no duplicates.

use crate::error::{ForecastError, Result};
use chrono::{Duration, NaiveDate};
use serde::Serialize;

/// Length of one step in a weekly series.
pub fn week() -> Duration {
    Duration::days(7)
}

/// A strictly weekly series.
///
/// Every consecutive pair of dates differs by exactly seven days. The dates
/// are implied by `start` and the position of each value, so the invariant
/// cannot be broken after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklySeries {
    start: NaiveDate,
    values: Vec<f64>,
    /// Whether each week was produced by the gap-fill policy.
    filled: Vec<bool>,
    /// Whether any row contributing to each week was a holiday week.
    holidays: Vec<bool>,
}

impl WeeklySeries {
    /// Create a series from its first week and consecutive weekly values.
    pub fn new(start: NaiveDate, values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(ForecastError::EmptyInput(
                "weekly series needs at least one value".to_string(),
            ));
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidParameter(format!(
                "non-finite value at week {}",
                pos
            )));
        }
        let n = values.len();
        Ok(Self {
            start,
            values,
            filled: vec![false; n],
            holidays: vec![false; n],
        })
    }

    /// Create a series from explicit (date, value) pairs.
    ///
    /// Pairs must already be ordered with an exact seven-day step.
    pub fn from_pairs(pairs: &[(NaiveDate, f64)]) -> Result<Self> {
        let (start, _) = pairs.first().ok_or_else(|| {
            ForecastError::EmptyInput("weekly series needs at least one value".to_string())
        })?;

        for (i, w) in pairs.windows(2).enumerate() {
            if w[1].0 - w[0].0 != week() {
                return Err(ForecastError::InvalidParameter(format!(
                    "dates {} and {} at position {} are not one week apart",
                    w[0].0,
                    w[1].0,
                    i + 1
                )));
            }
        }

        Self::new(*start, pairs.iter().map(|(_, v)| *v).collect())
    }

    /// Attach per-week gap-fill and holiday flags.
    pub(crate) fn with_flags(mut self, filled: Vec<bool>, holidays: Vec<bool>) -> Self {
        debug_assert_eq!(filled.len(), self.values.len());
        debug_assert_eq!(holidays.len(), self.values.len());
        self.filled = filled;
        self.holidays = holidays;
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// First week of the series.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last week of the series.
    pub fn end(&self) -> NaiveDate {
        self.date_at(self.len().saturating_sub(1))
    }

    /// Date of the week at `index`.
    pub fn date_at(&self, index: usize) -> NaiveDate {
        self.start + Duration::weeks(index as i64)
    }

    /// All dates in order.
    pub fn dates(&self) -> Vec<NaiveDate> {
        (0..self.len()).map(|i| self.date_at(i)).collect()
    }

    /// Iterate over (date, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(move |(i, &v)| (self.date_at(i), v))
    }

    /// The `count` weekly dates immediately following the last week.
    pub fn future_dates(&self, count: usize) -> Vec<NaiveDate> {
        let end = self.end();
        (1..=count)
            .map(|h| end + Duration::weeks(h as i64))
            .collect()
    }

    /// Last `count` values (or all of them if the series is shorter).
    pub fn tail(&self, count: usize) -> &[f64] {
        let from = self.len().saturating_sub(count);
        &self.values[from..]
    }

    pub fn filled_flags(&self) -> &[bool] {
        &self.filled
    }

    /// Number of weeks produced by the gap-fill policy.
    pub fn filled_weeks(&self) -> usize {
        self.filled.iter().filter(|&&f| f).count()
    }

    pub fn holiday_flags(&self) -> &[bool] {
        &self.holidays
    }

    pub fn is_holiday_week(&self, index: usize) -> bool {
        self.holidays.get(index).copied().unwrap_or(false)
    }
}
