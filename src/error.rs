//! Error types for the weekly-sales-forecast library.

use chrono::NaiveDate;
use thiserror::Error;

/// Result type alias for forecasting operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while building a series or forecasting it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// No usable rows remain after validation and filtering.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// Fewer weekly observations than the model needs.
    #[error("insufficient data: need at least {needed} weeks, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// A requested week at the edge of the series has no observation to
    /// interpolate from.
    #[error("insufficient data: no observation for boundary week {date}")]
    BoundaryGap { date: NaiveDate },

    /// Forecast horizon must be at least one week.
    #[error("invalid horizon: {0} weeks (must be at least 1)")]
    InvalidHorizon(usize),

    /// The smoothing optimizer failed or produced non-finite state.
    #[error("model fit failed: {0}")]
    ModelFit(String),

    /// Invalid configuration or input shape.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Reading or writing CSV failed.
    #[error("csv error: {0}")]
    Csv(String),
}

impl ForecastError {
    /// True for both flavours of insufficient data (too short, or a gap
    /// at a boundary that cannot be interpolated).
    pub fn is_insufficient_data(&self) -> bool {
        matches!(
            self,
            ForecastError::InsufficientData { .. } | ForecastError::BoundaryGap { .. }
        )
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::Csv(err.to_string())
    }
}

impl From<std::io::Error> for ForecastError {
    fn from(err: std::io::Error) -> Self {
        ForecastError::Csv(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = ForecastError::EmptyInput("no rows for store 3".to_string());
        assert_eq!(err.to_string(), "empty input: no rows for store 3");

        let err = ForecastError::InsufficientData {
            needed: 104,
            got: 103,
        };
        assert_eq!(
            err.to_string(),
            "insufficient data: need at least 104 weeks, got 103"
        );

        let err = ForecastError::BoundaryGap {
            date: NaiveDate::from_ymd_opt(2010, 2, 5).unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "insufficient data: no observation for boundary week 2010-02-05"
        );

        let err = ForecastError::InvalidHorizon(0);
        assert_eq!(
            err.to_string(),
            "invalid horizon: 0 weeks (must be at least 1)"
        );

        let err = ForecastError::ModelFit("optimizer did not converge".to_string());
        assert_eq!(
            err.to_string(),
            "model fit failed: optimizer did not converge"
        );
    }

    #[test]
    fn boundary_gap_counts_as_insufficient_data() {
        let gap = ForecastError::BoundaryGap {
            date: NaiveDate::from_ymd_opt(2012, 1, 6).unwrap(),
        };
        assert!(gap.is_insufficient_data());
        assert!(ForecastError::InsufficientData { needed: 2, got: 1 }.is_insufficient_data());
        assert!(!ForecastError::InvalidHorizon(0).is_insufficient_data());
    }

    #[test]
    fn errors_are_clonable_and_comparable() {
        let err1 = ForecastError::InvalidHorizon(0);
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }
}
