//! Raw weekly sales observations and row selection.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Date formats accepted when coercing the raw date field.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// A single reported week of sales, as read from the transactional table.
///
/// The date is kept as text: coercion happens in the series builder, which
/// drops rows whose date cannot be parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    /// Reporting store.
    pub store_id: u32,
    /// Department within the store, if the source has one.
    pub dept_id: Option<u32>,
    /// Start of the reported week, unparsed.
    pub week_start: String,
    /// Sales amount. Negative or non-finite amounts are rejected downstream.
    pub sales_amount: f64,
    /// Whether the week contains a holiday.
    pub is_holiday: Option<bool>,
}

impl RawObservation {
    /// Create an observation from a raw date string.
    pub fn new(store_id: u32, week_start: impl Into<String>, sales_amount: f64) -> Self {
        Self {
            store_id,
            dept_id: None,
            week_start: week_start.into(),
            sales_amount,
            is_holiday: None,
        }
    }

    /// Create an observation from an already-parsed date.
    pub fn on_date(store_id: u32, date: NaiveDate, sales_amount: f64) -> Self {
        Self::new(store_id, date.format("%Y-%m-%d").to_string(), sales_amount)
    }

    pub fn with_dept(mut self, dept_id: u32) -> Self {
        self.dept_id = Some(dept_id);
        self
    }

    pub fn with_holiday(mut self, is_holiday: bool) -> Self {
        self.is_holiday = Some(is_holiday);
        self
    }

    /// Coerce the raw date field into a calendar date.
    ///
    /// Returns `None` when no accepted format matches.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_date(&self.week_start)
    }

    /// True when the sales amount is finite and non-negative.
    pub fn has_valid_sales(&self) -> bool {
        self.sales_amount.is_finite() && self.sales_amount >= 0.0
    }
}

/// Parse a date in any of the accepted formats.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Selects which rows contribute to a series.
///
/// An empty filter aggregates across every store and department.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesFilter {
    pub store: Option<u32>,
    pub dept: Option<u32>,
}

impl SeriesFilter {
    /// Aggregate across all stores and departments.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to one store, summing its departments.
    pub fn store(store_id: u32) -> Self {
        Self {
            store: Some(store_id),
            dept: None,
        }
    }

    /// Restrict to one department of one store.
    pub fn store_dept(store_id: u32, dept_id: u32) -> Self {
        Self {
            store: Some(store_id),
            dept: Some(dept_id),
        }
    }

    pub fn matches(&self, row: &RawObservation) -> bool {
        let store_ok = self.store.map_or(true, |s| row.store_id == s);
        let dept_ok = self.dept.map_or(true, |d| row.dept_id == Some(d));
        store_ok && dept_ok
    }

    /// Human-readable label, e.g. "Store 1, Dept 3" or "all stores".
    pub fn describe(&self) -> String {
        match (self.store, self.dept) {
            (Some(s), Some(d)) => format!("Store {}, Dept {}", s, d),
            (Some(s), None) => format!("Store {}", s),
            (None, Some(d)) => format!("Dept {} across all stores", d),
            (None, None) => "all stores".to_string(),
        }
    }
}

/// Sorted unique store ids present in the rows.
pub fn store_ids(rows: &[RawObservation]) -> Vec<u32> {
    let mut ids: Vec<u32> = rows.iter().map(|r| r.store_id).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Sorted unique department ids reported by one store.
pub fn department_ids(rows: &[RawObservation], store_id: u32) -> Vec<u32> {
    let mut ids: Vec<u32> = rows
        .iter()
        .filter(|r| r.store_id == store_id)
        .filter_map(|r| r.dept_id)
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}
