//! Forecast result returned to callers.

use crate::models::SmoothingParameters;
use crate::utils::AccuracyMetrics;
use chrono::NaiveDate;
use serde::Serialize;

/// One predicted week.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Forecast for one weekly series.
///
/// `points` holds exactly `horizon_weeks` consecutive weeks starting one
/// week after the last observed week. `error_metric` is the in-sample mean
/// absolute error over the last seasonal cycle; it describes fit quality,
/// not out-of-sample accuracy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    horizon_weeks: usize,
    points: Vec<ForecastPoint>,
    error_metric: f64,
    diagnostics: AccuracyMetrics,
    fitted: Vec<f64>,
    parameters: SmoothingParameters,
    model: String,
}

impl ForecastResult {
    pub(crate) fn new(
        points: Vec<ForecastPoint>,
        diagnostics: AccuracyMetrics,
        fitted: Vec<f64>,
        parameters: SmoothingParameters,
        model: String,
    ) -> Self {
        Self {
            horizon_weeks: points.len(),
            error_metric: diagnostics.mae,
            points,
            diagnostics,
            fitted,
            parameters,
            model,
        }
    }

    /// Number of forecast weeks.
    pub fn horizon_weeks(&self) -> usize {
        self.horizon_weeks
    }

    /// Forecast weeks in order.
    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    /// Predicted values without dates.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    /// First forecast week, if any.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    /// Mean absolute error of the fitted values over the last cycle.
    pub fn error_metric(&self) -> f64 {
        self.error_metric
    }

    /// Full accuracy metrics over the same window as `error_metric`.
    pub fn diagnostics(&self) -> &AccuracyMetrics {
        &self.diagnostics
    }

    /// In-sample one-step-ahead fitted values, aligned with the input series.
    pub fn fitted_values(&self) -> &[f64] {
        &self.fitted
    }

    /// Smoothing parameters the model was fitted with.
    pub fn parameters(&self) -> &SmoothingParameters {
        &self.parameters
    }

    /// Model name, e.g. `HoltWinters(add,add,52)`.
    pub fn model_name(&self) -> &str {
        &self.model
    }
}
