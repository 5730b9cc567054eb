//! Utility functions for fitting and scoring models.

pub mod metrics;
pub mod optimization;

pub use metrics::{calculate_metrics, mae, AccuracyMetrics};
pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
