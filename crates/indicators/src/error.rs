//! Indicator error types.

use ridgeline_types::SeriesError;
use thiserror::Error;

/// Errors that can occur while configuring indicators or storing cached values.
#[derive(Debug, Error)]
pub enum IndicatorError {
    /// Invalid parameters for the indicator
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// Parameter out of valid range
    #[error("parameter out of range: {param} = {value} (valid: {min}..{max})")]
    ParamOutOfRange {
        /// Parameter name.
        param: String,
        /// Parameter value.
        value: f64,
        /// Minimum allowed value.
        min: f64,
        /// Maximum allowed value.
        max: f64,
    },

    /// Composed indicators read from different series
    #[error("series mismatch: {0}")]
    SeriesMismatch(String),

    /// Unbounded cache would have to grow past its hard ceiling
    #[error("cache capacity exceeded: {required} slots required, maximum is {maximum}")]
    CapacityExceeded {
        /// Slots needed to hold the resident window.
        required: usize,
        /// Hard ceiling of the cache.
        maximum: usize,
    },

    /// Cache configuration could not be parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// Underlying series rejected an operation
    #[error("series error: {0}")]
    Series(#[from] SeriesError),
}

impl IndicatorError {
    /// Creates an `InvalidParams` error with a message.
    #[must_use]
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        IndicatorError::InvalidParams(msg.into())
    }

    /// Creates a `ParamOutOfRange` error.
    #[must_use]
    pub fn param_out_of_range(param: impl Into<String>, value: f64, min: f64, max: f64) -> Self {
        IndicatorError::ParamOutOfRange {
            param: param.into(),
            value,
            min,
            max,
        }
    }

    /// Returns `true` for errors raised while constructing an indicator.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            IndicatorError::InvalidParams(_)
                | IndicatorError::ParamOutOfRange { .. }
                | IndicatorError::SeriesMismatch(_)
                | IndicatorError::Config(_)
        )
    }
}

impl From<serde_json::Error> for IndicatorError {
    fn from(err: serde_json::Error) -> Self {
        IndicatorError::Config(err.to_string())
    }
}
