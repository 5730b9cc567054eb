//! Core data structures: raw rows, the weekly series and forecast results.

mod builder;
mod forecast;
mod observation;
mod weekly_series;

pub use builder::{
    build_series, build_series_with, week_start, GapFill, SeriesConfig, WeekAnchor,
    DEFAULT_MAX_WEEKS, DEFAULT_MIN_WEEKS,
};
pub use forecast::{ForecastPoint, ForecastResult};
pub use observation::{department_ids, parse_date, store_ids, RawObservation, SeriesFilter};
pub use weekly_series::{week, WeeklySeries};
