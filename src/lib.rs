//! # weekly-sales-forecast
//!
//! Weekly retail sales forecasting with Holt-Winters exponential smoothing.
//!
//! Raw per-store sales rows are turned into a regular weekly series by
//! [`core::build_series`], then fitted and projected forward by
//! [`engine::forecast`]. [`pipeline::run`] does both for one request and
//! [`io`] reads and writes the CSV tables at the edges.
//!
//! ```
//! use chrono::{Duration, NaiveDate};
//! use weekly_sales_forecast::prelude::*;
//!
//! let start = NaiveDate::from_ymd_opt(2010, 2, 5).unwrap();
//! let rows: Vec<RawObservation> = (0..110)
//!     .map(|i| {
//!         let sales = 2000.0 + 5.0 * i as f64 + if i % 52 == 45 { 800.0 } else { 0.0 };
//!         RawObservation::on_date(1, start + Duration::weeks(i), sales).with_dept(1)
//!     })
//!     .collect();
//!
//! let series = build_series(&rows, &SeriesFilter::store(1)).unwrap();
//! let result = forecast(&series, 8).unwrap();
//! assert_eq!(result.horizon_weeks(), 8);
//! ```

#![allow(clippy::needless_range_loop)]

pub mod core;
pub mod engine;
pub mod error;
pub mod io;
pub mod models;
pub mod pipeline;
pub mod utils;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::core::{
        build_series, build_series_with, ForecastPoint, ForecastResult, GapFill, RawObservation,
        SeriesConfig, SeriesFilter, WeekAnchor, WeeklySeries,
    };
    pub use crate::engine::{forecast, forecast_with};
    pub use crate::error::{ForecastError, Result};
    pub use crate::models::{ModelConfig, SeasonalType, Smoothing, SmoothingParameters, TrendType};
    pub use crate::pipeline::{run, ForecastReport, ForecastRequest};
    pub use crate::utils::AccuracyMetrics;
}
