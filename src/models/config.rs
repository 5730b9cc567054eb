//! Model configuration: component types and smoothing parameters.

use crate::error::{ForecastError, Result};
use crate::utils::NelderMeadConfig;
use serde::{Deserialize, Serialize};

/// Weeks in one seasonal cycle of weekly retail data.
pub const DEFAULT_SEASONAL_PERIOD: usize = 52;

/// Damping used when a damped trend is fixed without an explicit `phi`.
pub const DEFAULT_PHI: f64 = 0.98;

/// Trend component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendType {
    /// No trend: forecasts are flat apart from seasonality.
    None,
    /// Additive trend: `l_t + h*b_t`
    #[default]
    Additive,
    /// Multiplicative trend: `l_t * b_t^h`
    Multiplicative,
}

/// Seasonal component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonalType {
    /// No seasonality
    None,
    /// Additive seasonality: `y_t = l_t + b_t + s_t + e_t`
    #[default]
    Additive,
    /// Multiplicative seasonality: `y_t = (l_t + b_t) * s_t + e_t`
    Multiplicative,
}

impl TrendType {
    fn label(self) -> &'static str {
        match self {
            TrendType::None => "none",
            TrendType::Additive => "add",
            TrendType::Multiplicative => "mul",
        }
    }
}

impl SeasonalType {
    fn label(self) -> &'static str {
        match self {
            SeasonalType::None => "none",
            SeasonalType::Additive => "add",
            SeasonalType::Multiplicative => "mul",
        }
    }
}

/// Smoothing coefficients of a fitted model.
///
/// `beta` is present only with a trend, `gamma` only with seasonality and
/// `phi` only with a damped trend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothingParameters {
    /// Level smoothing (0 < alpha < 1).
    pub alpha: f64,
    /// Trend smoothing (0 < beta < 1).
    pub beta: Option<f64>,
    /// Seasonal smoothing (0 < gamma < 1).
    pub gamma: Option<f64>,
    /// Trend damping (0 < phi <= 1).
    pub phi: Option<f64>,
}

impl SmoothingParameters {
    /// Fixed level, trend and seasonal coefficients without damping.
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self {
            alpha,
            beta: Some(beta),
            gamma: Some(gamma),
            phi: None,
        }
    }

    pub fn with_phi(mut self, phi: f64) -> Self {
        self.phi = Some(phi);
        self
    }

    fn all_finite(&self) -> bool {
        self.alpha.is_finite()
            && self.beta.map_or(true, f64::is_finite)
            && self.gamma.map_or(true, f64::is_finite)
            && self.phi.map_or(true, f64::is_finite)
    }
}

/// How smoothing coefficients are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Smoothing {
    /// Minimize in-sample one-step-ahead squared error.
    #[default]
    Optimized,
    /// Use the given coefficients as-is.
    Fixed(SmoothingParameters),
}

/// Exponential smoothing model configuration.
///
/// The default is the weekly retail model: additive trend, additive
/// seasonality with period 52, coefficients optimized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub seasonal_period: usize,
    pub trend: TrendType,
    pub seasonal: SeasonalType,
    /// Damp the trend towards flat over the horizon.
    pub damped: bool,
    pub smoothing: Smoothing,
    pub optimizer: NelderMeadConfig,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            seasonal_period: DEFAULT_SEASONAL_PERIOD,
            trend: TrendType::Additive,
            seasonal: SeasonalType::Additive,
            damped: false,
            smoothing: Smoothing::Optimized,
            optimizer: NelderMeadConfig::default(),
        }
    }
}

impl ModelConfig {
    /// Additive trend and seasonality with the given period.
    pub fn additive(seasonal_period: usize) -> Self {
        Self {
            seasonal_period,
            ..Default::default()
        }
    }

    /// Damped additive trend with fixed coefficients, no optimization.
    pub fn fixed_damped(seasonal_period: usize, params: SmoothingParameters) -> Self {
        Self {
            seasonal_period,
            damped: true,
            smoothing: Smoothing::Fixed(params),
            ..Default::default()
        }
    }

    pub fn has_trend(&self) -> bool {
        self.trend != TrendType::None
    }

    pub fn has_seasonal(&self) -> bool {
        self.seasonal != SeasonalType::None
    }

    /// Damping only applies when there is a trend to damp.
    pub fn is_damped(&self) -> bool {
        self.damped && self.has_trend()
    }

    pub fn is_multiplicative(&self) -> bool {
        self.trend == TrendType::Multiplicative || self.seasonal == SeasonalType::Multiplicative
    }

    /// Fewest observations the model accepts: two full cycles, and at least
    /// five points past the first cycle.
    pub fn min_observations(&self) -> usize {
        (2 * self.seasonal_period).max(self.seasonal_period + 5)
    }

    /// Window, in weeks, over which fit diagnostics are computed.
    pub fn diagnostic_window(&self) -> usize {
        self.seasonal_period
    }

    pub fn name(&self) -> String {
        let trend = if self.is_damped() {
            format!("{}_damped", self.trend.label())
        } else {
            self.trend.label().to_string()
        };
        format!(
            "HoltWinters({},{},{})",
            trend,
            self.seasonal.label(),
            self.seasonal_period
        )
    }

    /// Reject configurations the fitter cannot run.
    pub fn validate(&self) -> Result<()> {
        if self.seasonal_period == 0 {
            return Err(ForecastError::InvalidParameter(
                "seasonal period must be positive".to_string(),
            ));
        }
        if self.has_seasonal() && self.seasonal_period < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "seasonal period must be at least 2 for a seasonal model, got {}",
                self.seasonal_period
            )));
        }

        if let Smoothing::Fixed(params) = &self.smoothing {
            if !params.all_finite() {
                return Err(ForecastError::InvalidParameter(
                    "smoothing parameters must be finite".to_string(),
                ));
            }
            check_unit("alpha", Some(params.alpha))?;
            if self.has_trend() {
                check_unit("beta", Some(params.beta.ok_or_else(|| missing("beta"))?))?;
            }
            if self.has_seasonal() {
                check_unit("gamma", Some(params.gamma.ok_or_else(|| missing("gamma"))?))?;
            }
            if self.is_damped() {
                check_unit("phi", params.phi)?;
            }
        }

        Ok(())
    }
}

fn missing(name: &str) -> ForecastError {
    ForecastError::InvalidParameter(format!("fixed smoothing needs {}", name))
}

fn check_unit(name: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) if !(0.0..=1.0).contains(&v) => Err(ForecastError::InvalidParameter(format!(
            "{} must be within [0, 1], got {}",
            name, v
        ))),
        _ => Ok(()),
    }
}
