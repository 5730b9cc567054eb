//! Holt-Winters exponential smoothing.
//!
//! Triple exponential smoothing with configurable trend and seasonal
//! components. For the default additive/additive model:
//! - Level: `l_t = α(y_t - s_{t-m}) + (1-α)(l_{t-1} + φb_{t-1})`
//! - Trend: `b_t = β(l_t - l_{t-1}) + (1-β)φb_{t-1}`
//! - Seasonal: `s_t = γ(y_t - l_t) + (1-γ)s_{t-m}`
//! - Forecast: `ŷ_{t+h} = l_t + (φ + … + φ^h)b_t + s_{t+h-m}`
//!
//! With no damping φ = 1, so the trend term is simply `h*b_t`.
//! Multiplicative variants replace the corresponding `+`/`-` with `*`/`/`.

use super::config::{
    ModelConfig, SeasonalType, Smoothing, SmoothingParameters, TrendType, DEFAULT_PHI,
};
use crate::core::{ForecastPoint, WeeklySeries};
use crate::error::{ForecastError, Result};
use crate::utils::optimization::{nelder_mead, NelderMeadResult};
use chrono::{Duration, NaiveDate};
use tracing::debug;

const SMOOTHING_BOUNDS: (f64, f64) = (0.0001, 0.9999);
const PHI_BOUNDS: (f64, f64) = (0.8, 0.98);
const INITIAL_GUESS: [f64; 4] = [0.3, 0.1, 0.1, 0.9];
/// Coarse levels screened for each smoothing coefficient before the search.
const SCREEN_LEVELS: [f64; 5] = [0.05, 0.25, 0.5, 0.75, 0.95];
/// Number of best screened points the search starts from.
const SEARCH_STARTS: usize = 3;
const EPS: f64 = 1e-10;

/// Holt-Winters model, ready to fit.
#[derive(Debug, Clone, Default)]
pub struct HoltWinters {
    config: ModelConfig,
}

/// Level, trend and seasonal state at one point in time.
#[derive(Debug, Clone)]
struct State {
    level: f64,
    trend: f64,
    /// Indexed by `t % period`.
    seasonals: Vec<f64>,
}

impl State {
    fn is_finite(&self) -> bool {
        self.level.is_finite()
            && self.trend.is_finite()
            && self.seasonals.iter().all(|s| s.is_finite())
    }
}

/// Output of one pass of the smoothing recursion.
struct Filtered {
    state: State,
    fitted: Vec<f64>,
    sse: f64,
}

/// Which optional coefficients are free during optimization.
#[derive(Debug, Clone, Copy)]
struct ParamLayout {
    trend: bool,
    seasonal: bool,
    damped: bool,
}

impl ParamLayout {
    fn of(config: &ModelConfig) -> Self {
        Self {
            trend: config.has_trend(),
            seasonal: config.has_seasonal(),
            damped: config.is_damped(),
        }
    }

    fn flags(&self) -> [bool; 4] {
        [true, self.trend, self.seasonal, self.damped]
    }

    fn initial(&self) -> Vec<f64> {
        self.flags()
            .iter()
            .zip(INITIAL_GUESS)
            .filter(|(on, _)| **on)
            .map(|(_, v)| v)
            .collect()
    }

    fn bounds(&self) -> Vec<(f64, f64)> {
        let all = [SMOOTHING_BOUNDS, SMOOTHING_BOUNDS, SMOOTHING_BOUNDS, PHI_BOUNDS];
        self.flags()
            .iter()
            .zip(all)
            .filter(|(on, _)| **on)
            .map(|(_, b)| b)
            .collect()
    }

    /// Cartesian grid of [`SCREEN_LEVELS`] over the smoothing coefficients;
    /// `phi` stays at its initial guess.
    fn screen_grid(&self) -> Vec<Vec<f64>> {
        let mut grid = vec![Vec::new()];
        for (i, on) in self.flags().iter().enumerate() {
            if !on {
                continue;
            }
            let levels: &[f64] = if i == 3 {
                &INITIAL_GUESS[3..]
            } else {
                &SCREEN_LEVELS
            };
            grid = grid
                .into_iter()
                .flat_map(|prefix| {
                    levels.iter().map(move |&level| {
                        let mut point = prefix.clone();
                        point.push(level);
                        point
                    })
                })
                .collect();
        }
        grid
    }

    fn unpack(&self, point: &[f64]) -> SmoothingParameters {
        let mut values = point.iter().copied();
        let alpha = values.next().unwrap_or(INITIAL_GUESS[0]);
        let beta = if self.trend { values.next() } else { None };
        let gamma = if self.seasonal { values.next() } else { None };
        let phi = if self.damped { values.next() } else { None };
        SmoothingParameters {
            alpha,
            beta,
            gamma,
            phi,
        }
    }
}

impl HoltWinters {
    /// Create a model from a validated configuration.
    pub fn new(config: ModelConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Additive trend and seasonality with optimized coefficients.
    pub fn additive(seasonal_period: usize) -> Result<Self> {
        Self::new(ModelConfig::additive(seasonal_period))
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Fit the model to a weekly series.
    ///
    /// # Errors
    /// - `InsufficientData` when the series is shorter than
    ///   [`ModelConfig::min_observations`].
    /// - `InvalidParameter` for multiplicative components over
    ///   non-positive data.
    /// - `ModelFit` when the optimizer does not converge or any state is
    ///   non-finite.
    pub fn fit(&self, series: &WeeklySeries) -> Result<ModelFit> {
        let values = series.values();
        let needed = self.config.min_observations();
        if values.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: values.len(),
            });
        }

        if self.config.is_multiplicative() && values.iter().any(|&v| v <= 0.0) {
            return Err(ForecastError::InvalidParameter(
                "multiplicative components need strictly positive sales".to_string(),
            ));
        }

        let parameters = match self.config.smoothing {
            Smoothing::Fixed(params) => params,
            Smoothing::Optimized => self.optimize(values)?,
        };

        let filtered = self.filter(values, &parameters);
        if !filtered.sse.is_finite()
            || !filtered.state.is_finite()
            || filtered.fitted.iter().any(|f| !f.is_finite())
        {
            return Err(ForecastError::ModelFit(format!(
                "{} produced non-finite state with {:?}",
                self.config.name(),
                parameters
            )));
        }

        let residuals = values
            .iter()
            .zip(&filtered.fitted)
            .map(|(y, f)| y - f)
            .collect();

        Ok(ModelFit {
            config: self.config.clone(),
            parameters,
            state: filtered.state,
            fitted: filtered.fitted,
            residuals,
            sse: filtered.sse,
            last_date: series.end(),
        })
    }

    /// Minimize in-sample SSE over the free coefficients.
    ///
    /// The default guess and a coarse grid are scored first; Nelder-Mead then
    /// runs from the best few of them, and once more from the best result.
    fn optimize(&self, values: &[f64]) -> Result<SmoothingParameters> {
        let layout = ParamLayout::of(&self.config);
        let bounds = layout.bounds();
        let optimizer = &self.config.optimizer;
        // Score SSE relative to the data's mean square so tolerances do not
        // depend on the sales magnitude.
        let scale = (values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64).max(EPS);
        let objective = |point: &[f64]| {
            let sse = self.filter(values, &layout.unpack(point)).sse / scale;
            if sse.is_finite() {
                sse
            } else {
                f64::MAX
            }
        };

        let mut screened: Vec<(f64, Vec<f64>)> = std::iter::once(layout.initial())
            .chain(layout.screen_grid())
            .map(|point| (objective(&point), point))
            .collect();
        screened.sort_by(|a, b| a.0.total_cmp(&b.0));

        // SSE cannot go below zero, so an exact fit needs no search.
        if let Some((value, point)) = screened.first() {
            if *value <= optimizer.f_abs_tolerance {
                debug!(model = %self.config.name(), scaled_sse = *value, "exact fit at screened point");
                return Ok(layout.unpack(point));
            }
        }

        let mut best: Option<NelderMeadResult> = None;
        let mut iterations = 0;
        for (_, start) in screened.iter().take(SEARCH_STARTS) {
            let result = nelder_mead(&objective, start, Some(&bounds), optimizer);
            iterations += result.iterations;
            best = pick_better(best, result);
        }
        // Restart from the best point with a fresh simplex.
        if let Some(current) = best.clone() {
            let result = nelder_mead(&objective, &current.optimal_point, Some(&bounds), optimizer);
            iterations += result.iterations;
            best = pick_better(best, result);
        }

        let result = best.ok_or_else(|| {
            ForecastError::ModelFit(format!(
                "optimizer did not converge after {} iterations",
                iterations
            ))
        })?;

        let params = layout.unpack(&result.optimal_point);
        debug!(
            model = %self.config.name(),
            alpha = params.alpha,
            beta = ?params.beta,
            gamma = ?params.gamma,
            phi = ?params.phi,
            scaled_sse = result.optimal_value,
            iterations,
            "optimized smoothing parameters"
        );

        if !result.optimal_value.is_finite()
            || result.optimal_value == f64::MAX
            || result.optimal_point.iter().any(|p| !p.is_finite())
        {
            return Err(ForecastError::ModelFit(
                "optimizer produced non-finite parameters".to_string(),
            ));
        }

        Ok(params)
    }

    /// Index of the first observation that gets a genuine one-step forecast.
    fn start_index(&self) -> usize {
        if self.config.has_seasonal() {
            self.config.seasonal_period
        } else {
            1
        }
    }

    /// Heuristic starting state from the first one or two cycles.
    ///
    /// The level is placed at the end of the first cycle and the initial
    /// seasonal offsets are taken against the trend line, so a series that
    /// is exactly trend plus a repeating pattern is reproduced without error.
    fn initial_state(&self, values: &[f64]) -> State {
        let trend_type = self.config.trend;

        if !self.config.has_seasonal() {
            let trend = match trend_type {
                TrendType::None => 0.0,
                TrendType::Additive => values[1] - values[0],
                TrendType::Multiplicative => values[1] / values[0],
            };
            return State {
                level: values[0],
                trend,
                seasonals: Vec::new(),
            };
        }

        let period = self.config.seasonal_period;
        let first = mean(&values[..period]);
        let second = mean(&values[period..2 * period]);
        let trend = match trend_type {
            TrendType::None => 0.0,
            TrendType::Additive => (second - first) / period as f64,
            TrendType::Multiplicative => (second / first).powf(1.0 / period as f64),
        };

        // Trend line through the middle of the first cycle.
        let centre = (period as f64 - 1.0) / 2.0;
        let baseline = |i: usize| {
            let offset = i as f64 - centre;
            match trend_type {
                TrendType::None => first,
                TrendType::Additive => first + trend * offset,
                TrendType::Multiplicative => first * trend.powf(offset),
            }
        };

        let mut seasonals: Vec<f64> = (0..period)
            .map(|i| match self.config.seasonal {
                SeasonalType::Multiplicative => values[i] / baseline(i),
                _ => values[i] - baseline(i),
            })
            .collect();
        normalize_seasonals(&mut seasonals, self.config.seasonal);

        State {
            level: baseline(period - 1),
            trend,
            seasonals,
        }
    }

    /// Run the smoothing recursion over `values`.
    fn filter(&self, values: &[f64], params: &SmoothingParameters) -> Filtered {
        let period = self.config.seasonal_period;
        let seasonal_type = self.config.seasonal;
        let trend_type = self.config.trend;

        let alpha = params.alpha;
        let beta = params.beta.unwrap_or(0.0);
        let gamma = params.gamma.unwrap_or(0.0);
        let phi = if self.config.is_damped() {
            params.phi.unwrap_or(DEFAULT_PHI)
        } else {
            1.0
        };

        let mut state = self.initial_state(values);
        let start = self.start_index();

        // Observations consumed by initialization are their own fit.
        let mut fitted = Vec::with_capacity(values.len());
        fitted.extend_from_slice(&values[..start]);
        let mut sse = 0.0;

        for (t, &y) in values.iter().enumerate().skip(start) {
            let season_idx = t % period;
            let s = match seasonal_type {
                SeasonalType::None => 0.0,
                _ => state.seasonals[season_idx],
            };

            let base = project(trend_type, state.level, state.trend, phi);
            let forecast = apply_season(seasonal_type, base, s);
            fitted.push(forecast);
            let error = y - forecast;
            sse += error * error;

            let level_prev = state.level;

            let deseasonalized = match seasonal_type {
                SeasonalType::None => y,
                SeasonalType::Additive => y - s,
                SeasonalType::Multiplicative if s.abs() > EPS => y / s,
                SeasonalType::Multiplicative => y,
            };
            state.level = alpha * deseasonalized + (1.0 - alpha) * base;

            state.trend = match trend_type {
                TrendType::None => 0.0,
                TrendType::Additive => {
                    beta * (state.level - level_prev) + (1.0 - beta) * phi * state.trend
                }
                TrendType::Multiplicative if level_prev.abs() > EPS => {
                    beta * (state.level / level_prev) + (1.0 - beta) * state.trend.powf(phi)
                }
                TrendType::Multiplicative => state.trend,
            };

            match seasonal_type {
                SeasonalType::None => {}
                SeasonalType::Additive => {
                    state.seasonals[season_idx] = gamma * (y - state.level) + (1.0 - gamma) * s;
                }
                SeasonalType::Multiplicative => {
                    if state.level.abs() > EPS {
                        state.seasonals[season_idx] =
                            gamma * (y / state.level) + (1.0 - gamma) * s;
                    }
                }
            }
        }

        Filtered { state, fitted, sse }
    }
}

/// A fitted model: final state plus in-sample diagnostics.
///
/// Holds everything needed to project forward; it is not persisted.
#[derive(Debug, Clone)]
pub struct ModelFit {
    config: ModelConfig,
    parameters: SmoothingParameters,
    state: State,
    fitted: Vec<f64>,
    residuals: Vec<f64>,
    sse: f64,
    last_date: NaiveDate,
}

impl ModelFit {
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn seasonal_period(&self) -> usize {
        self.config.seasonal_period
    }

    pub fn trend_type(&self) -> TrendType {
        self.config.trend
    }

    pub fn seasonal_type(&self) -> SeasonalType {
        self.config.seasonal
    }

    pub fn parameters(&self) -> &SmoothingParameters {
        &self.parameters
    }

    /// Final level.
    pub fn level(&self) -> f64 {
        self.state.level
    }

    /// Final trend (slope, or growth factor for a multiplicative trend).
    pub fn trend(&self) -> f64 {
        self.state.trend
    }

    /// Seasonal offsets indexed by position in the cycle.
    pub fn seasonals(&self) -> &[f64] {
        &self.state.seasonals
    }

    /// One-step-ahead fitted values, aligned with the input series.
    pub fn fitted_values(&self) -> &[f64] {
        &self.fitted
    }

    /// Actual minus fitted.
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// In-sample sum of squared one-step errors.
    pub fn sse(&self) -> f64 {
        self.sse
    }

    pub fn name(&self) -> String {
        self.config.name()
    }

    /// Projected values for the next `horizon` weeks.
    pub fn forecast_values(&self, horizon: usize) -> Vec<f64> {
        let n = self.fitted.len();
        let period = self.config.seasonal_period;
        let phi = if self.config.is_damped() {
            self.parameters.phi.unwrap_or(DEFAULT_PHI)
        } else {
            1.0
        };

        let mut damped_steps = 0.0;
        (1..=horizon)
            .map(|h| {
                damped_steps += phi.powi(h as i32);
                let base = project(
                    self.config.trend,
                    self.state.level,
                    self.state.trend,
                    damped_steps,
                );
                let s = match self.config.seasonal {
                    SeasonalType::None => 0.0,
                    _ => self.state.seasonals[(n + h - 1) % period],
                };
                apply_season(self.config.seasonal, base, s)
            })
            .collect()
    }

    /// Dated forecast for the `horizon` weeks after the last observation.
    ///
    /// # Errors
    /// `InvalidHorizon` for a zero horizon, `ModelFit` if the projection
    /// is non-finite.
    pub fn forecast(&self, horizon: usize) -> Result<Vec<ForecastPoint>> {
        if horizon == 0 {
            return Err(ForecastError::InvalidHorizon(horizon));
        }

        let values = self.forecast_values(horizon);
        if let Some(h) = values.iter().position(|v| !v.is_finite()) {
            return Err(ForecastError::ModelFit(format!(
                "projection is non-finite at step {}",
                h + 1
            )));
        }

        Ok(values
            .into_iter()
            .enumerate()
            .map(|(i, value)| ForecastPoint {
                date: self.last_date + Duration::weeks(i as i64 + 1),
                value,
            })
            .collect())
    }
}

/// Level plus `steps` of trend.
fn project(trend: TrendType, level: f64, slope: f64, steps: f64) -> f64 {
    match trend {
        TrendType::None => level,
        TrendType::Additive => level + steps * slope,
        TrendType::Multiplicative => level * slope.powf(steps),
    }
}

fn apply_season(seasonal: SeasonalType, base: f64, s: f64) -> f64 {
    match seasonal {
        SeasonalType::None => base,
        SeasonalType::Additive => base + s,
        SeasonalType::Multiplicative => base * s,
    }
}

/// Keep the lower of two converged runs; unconverged runs never win.
fn pick_better(current: Option<NelderMeadResult>, candidate: NelderMeadResult) -> Option<NelderMeadResult> {
    if !candidate.converged {
        return current;
    }
    match current {
        Some(c) if c.optimal_value <= candidate.optimal_value => Some(c),
        _ => Some(candidate),
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Additive offsets sum to 0; multiplicative factors average to 1.
fn normalize_seasonals(seasonals: &mut [f64], seasonal_type: SeasonalType) {
    let period = seasonals.len();
    if period == 0 {
        return;
    }

    let avg = seasonals.iter().sum::<f64>() / period as f64;
    match seasonal_type {
        SeasonalType::None => {}
        SeasonalType::Additive => seasonals.iter_mut().for_each(|s| *s -= avg),
        SeasonalType::Multiplicative => {
            if avg.abs() > EPS {
                seasonals.iter_mut().for_each(|s| *s /= avg);
            }
        }
    }
}
