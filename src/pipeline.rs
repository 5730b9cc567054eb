//! One forecast request end to end: raw rows in, series and forecast out.

use crate::core::{
    build_series_with, ForecastResult, RawObservation, SeriesConfig, SeriesFilter, WeeklySeries,
};
use crate::engine::forecast_with;
use crate::error::{ForecastError, Result};
use crate::models::ModelConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

/// What to forecast and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastRequest {
    pub filter: SeriesFilter,
    pub horizon_weeks: usize,
    pub series: SeriesConfig,
    pub model: ModelConfig,
}

impl Default for ForecastRequest {
    fn default() -> Self {
        Self::new(SeriesFilter::all(), 52)
    }
}

impl ForecastRequest {
    pub fn new(filter: SeriesFilter, horizon_weeks: usize) -> Self {
        let model = ModelConfig::default();
        Self {
            filter,
            horizon_weeks,
            series: SeriesConfig::for_model(&model),
            model,
        }
    }

    /// Replace the model; the series minimum follows the model's needs.
    pub fn with_model(mut self, model: ModelConfig) -> Self {
        self.series.min_weeks = model.min_observations();
        self.model = model;
        self
    }

    pub fn with_series(mut self, series: SeriesConfig) -> Self {
        self.series = series;
        self
    }
}

/// The regular history plus its forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastReport {
    pub filter: SeriesFilter,
    pub series: WeeklySeries,
    pub forecast: ForecastResult,
}

impl ForecastReport {
    /// One-line status message for the request.
    pub fn summary(&self) -> String {
        format!(
            "Generated a {}-week forecast for {} from {} weeks of history ({} to {}); \
             in-sample MAE over the last {} weeks: {:.2}",
            self.forecast.horizon_weeks(),
            self.filter.describe(),
            self.series.len(),
            self.series.start(),
            self.series.end(),
            self.forecast.diagnostics().n,
            self.forecast.error_metric()
        )
    }
}

/// Build the weekly series for `request.filter` and forecast it.
///
/// Errors from either stage are returned unchanged; there are no partial
/// results.
pub fn run(rows: &[RawObservation], request: &ForecastRequest) -> Result<ForecastReport> {
    if request.horizon_weeks == 0 {
        return Err(ForecastError::InvalidHorizon(request.horizon_weeks));
    }

    info!(
        rows = rows.len(),
        selection = %request.filter.describe(),
        horizon_weeks = request.horizon_weeks,
        model = %request.model.name(),
        "starting forecast"
    );

    let series = build_series_with(rows, &request.filter, &request.series)?;
    let forecast = forecast_with(&series, request.horizon_weeks, &request.model)?;

    let report = ForecastReport {
        filter: request.filter,
        series,
        forecast,
    };
    info!(
        weeks = report.series.len(),
        filled = report.series.filled_weeks(),
        error_metric = report.forecast.error_metric(),
        "{}",
        report.summary()
    );

    Ok(report)
}
