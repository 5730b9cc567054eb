//! Exponential smoothing models for weekly sales.

mod config;
mod holt_winters;

pub use config::{
    ModelConfig, SeasonalType, Smoothing, SmoothingParameters, TrendType, DEFAULT_PHI,
    DEFAULT_SEASONAL_PERIOD,
};
pub use holt_winters::{HoltWinters, ModelFit};
