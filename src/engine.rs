//! Forecast engine: fit Holt-Winters to a weekly series and project it.

use crate::core::{ForecastResult, WeeklySeries};
use crate::error::{ForecastError, Result};
use crate::models::{HoltWinters, ModelConfig};
use crate::utils::calculate_metrics;
use tracing::debug;

/// Forecast `horizon_weeks` weeks with the default weekly model
/// (additive trend, additive seasonality, period 52, optimized smoothing).
///
/// # Errors
/// - `InvalidHorizon` if `horizon_weeks` is zero.
/// - `InsufficientData` if the series is shorter than two seasonal cycles.
/// - `ModelFit` if the smoothing optimizer fails or yields non-finite state.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use weekly_sales_forecast::core::WeeklySeries;
/// use weekly_sales_forecast::engine::forecast;
///
/// let start = NaiveDate::from_ymd_opt(2010, 2, 5).unwrap();
/// let values: Vec<f64> = (0..104)
///     .map(|i| 1000.0 + 2.0 * i as f64 + if i % 52 < 6 { 150.0 } else { 0.0 })
///     .collect();
/// let series = WeeklySeries::new(start, values).unwrap();
///
/// let result = forecast(&series, 4).unwrap();
/// assert_eq!(result.horizon_weeks(), 4);
/// assert_eq!(result.first_date(), Some(series.end() + chrono::Duration::weeks(1)));
/// ```
pub fn forecast(series: &WeeklySeries, horizon_weeks: usize) -> Result<ForecastResult> {
    forecast_with(series, horizon_weeks, &ModelConfig::default())
}

/// Forecast with an explicit model configuration.
pub fn forecast_with(
    series: &WeeklySeries,
    horizon_weeks: usize,
    config: &ModelConfig,
) -> Result<ForecastResult> {
    if horizon_weeks == 0 {
        return Err(ForecastError::InvalidHorizon(horizon_weeks));
    }

    let model = HoltWinters::new(config.clone())?;
    let fit = model.fit(series)?;
    let points = fit.forecast(horizon_weeks)?;

    // In-sample fit quality over the last observed cycle.
    let window = config.diagnostic_window().min(series.len());
    let start = series.len() - window;
    let diagnostics = calculate_metrics(series.tail(window), &fit.fitted_values()[start..])?;

    debug!(
        model = %fit.name(),
        horizon_weeks,
        window,
        mae = diagnostics.mae,
        rmse = diagnostics.rmse,
        "forecast complete"
    );

    Ok(ForecastResult::new(
        points,
        diagnostics,
        fit.fitted_values().to_vec(),
        *fit.parameters(),
        fit.name(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SeasonalType, SmoothingParameters};
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};
    use std::f64::consts::PI;

    fn make_series(n: usize, slope: f64, amplitude: f64, noise: f64) -> WeeklySeries {
        let start = NaiveDate::from_ymd_opt(2010, 2, 5).unwrap();
        let values = (0..n)
            .map(|i| {
                let season = amplitude * (2.0 * PI * (i % 52) as f64 / 52.0).sin();
                let jitter = noise * (((i * 7919) % 17) as f64 - 8.0);
                1000.0 + slope * i as f64 + season + jitter
            })
            .collect();
        WeeklySeries::new(start, values).unwrap()
    }

    #[test]
    fn forecast_length_and_dates() {
        let series = make_series(156, 2.0, 100.0, 1.0);
        let result = forecast(&series, 30).unwrap();

        assert_eq!(result.horizon_weeks(), 30);
        assert_eq!(result.points().len(), 30);
        assert_eq!(result.first_date(), Some(series.end() + Duration::weeks(1)));
        for pair in result.points().windows(2) {
            assert_eq!(pair[1].date - pair[0].date, Duration::days(7));
        }
        assert!(result.points()[0].date > series.end());
    }

    #[test]
    fn forecast_horizon_one() {
        let series = make_series(104, 1.0, 50.0, 1.0);
        let result = forecast(&series, 1).unwrap();
        assert_eq!(result.points().len(), 1);
    }

    #[test]
    fn forecast_zero_horizon_fails_before_fitting() {
        // Too short to fit, but the horizon is checked first.
        let series = make_series(10, 1.0, 0.0, 0.0);
        assert_eq!(
            forecast(&series, 0).unwrap_err(),
            ForecastError::InvalidHorizon(0)
        );
    }

    #[test]
    fn forecast_boundary_lengths() {
        assert!(forecast(&make_series(104, 1.0, 50.0, 1.0), 4).is_ok());

        let err = forecast(&make_series(103, 1.0, 50.0, 1.0), 4).unwrap_err();
        assert!(err.is_insufficient_data());
    }

    #[test]
    fn error_metric_is_mae_over_last_cycle() {
        let series = make_series(130, 1.5, 80.0, 2.0);
        let result = forecast(&series, 8).unwrap();

        let fitted = result.fitted_values();
        assert_eq!(fitted.len(), series.len());
        let expected: f64 = series
            .tail(52)
            .iter()
            .zip(&fitted[130 - 52..])
            .map(|(a, f)| (a - f).abs())
            .sum::<f64>()
            / 52.0;

        assert_relative_eq!(result.error_metric(), expected, epsilon = 1e-9);
        assert_eq!(result.diagnostics().n, 52);
        assert!(result.error_metric() >= 0.0);
        assert_relative_eq!(result.diagnostics().mae, result.error_metric());
    }

    #[test]
    fn exact_series_has_near_zero_error() {
        let series = make_series(156, 2.0, 100.0, 0.0);
        let result = forecast(&series, 1).unwrap();

        assert!(result.error_metric() < 1e-6);
        // level + slope + seasonal offset of the next week
        let expected = 1000.0 + 2.0 * 156.0 + 100.0 * (2.0 * PI * 0.0 / 52.0).sin();
        assert_relative_eq!(result.values()[0], expected, epsilon = 1e-6);
    }

    #[test]
    fn forecast_is_deterministic() {
        let series = make_series(120, 0.5, 60.0, 3.0);
        let a = forecast(&series, 12).unwrap();
        let b = forecast(&series, 12).unwrap();

        assert_eq!(a.dates(), b.dates());
        assert_eq!(a.values(), b.values());
        assert_eq!(a.parameters(), b.parameters());
    }

    #[test]
    fn forecast_with_custom_period() {
        let start = NaiveDate::from_ymd_opt(2012, 1, 6).unwrap();
        let values: Vec<f64> = (0..40)
            .map(|i| 200.0 + [10.0, -5.0, 0.0, -5.0][i % 4] + ((i * 13) % 5) as f64)
            .collect();
        let series = WeeklySeries::new(start, values).unwrap();

        let config = ModelConfig::additive(4);
        let result = forecast_with(&series, 8, &config).unwrap();
        assert_eq!(result.model_name(), "HoltWinters(add,add,4)");
        assert_eq!(result.diagnostics().n, 4);
    }

    #[test]
    fn forecast_with_fixed_parameters_reports_them() {
        let series = make_series(104, 1.0, 40.0, 1.0);
        let params = SmoothingParameters::new(0.2, 0.2, 0.2);
        let config = ModelConfig::fixed_damped(52, params);

        let result = forecast_with(&series, 6, &config).unwrap();
        assert_eq!(*result.parameters(), params);
        assert_eq!(result.model_name(), "HoltWinters(add_damped,add,52)");
    }

    #[test]
    fn forecast_with_invalid_config() {
        let series = make_series(104, 1.0, 40.0, 1.0);
        let config = ModelConfig {
            seasonal_period: 0,
            seasonal: SeasonalType::Additive,
            ..Default::default()
        };
        assert!(matches!(
            forecast_with(&series, 6, &config),
            Err(ForecastError::InvalidParameter(_))
        ));
    }
}
