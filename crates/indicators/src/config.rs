//! Cache and evaluator configuration.

use crate::error::IndicatorError;

/// Initial slot count of an unbounded cache.
pub const DEFAULT_UNBOUNDED_CAPACITY: usize = 512;
/// Hard ceiling for any single cache.
pub const MAX_CACHE_CAPACITY: usize = 1_000_000;
/// Gap above which recursive indicators backfill iteratively.
pub const DEFAULT_RECURSION_THRESHOLD: usize = 100;

/// Sizing and recursion settings shared by the cached indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CacheConfig {
    /// Starting capacity when the series is unbounded
    #[serde(default = "default_initial_unbounded_capacity")]
    pub initial_unbounded_capacity: usize,
    /// Upper bound for capacity growth
    #[serde(default = "default_max_capacity")]
    pub max_capacity: usize,
    /// Maximum uncached gap evaluated through plain recursion
    #[serde(default = "default_recursion_threshold")]
    pub recursion_threshold: usize,
}

fn default_initial_unbounded_capacity() -> usize {
    DEFAULT_UNBOUNDED_CAPACITY
}
fn default_max_capacity() -> usize {
    MAX_CACHE_CAPACITY
}
fn default_recursion_threshold() -> usize {
    DEFAULT_RECURSION_THRESHOLD
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            initial_unbounded_capacity: default_initial_unbounded_capacity(),
            max_capacity: default_max_capacity(),
            recursion_threshold: default_recursion_threshold(),
        }
    }
}

impl CacheConfig {
    /// Parses a config from JSON; missing fields take their defaults.
    ///
    /// # Errors
    /// Returns `IndicatorError::Config` on malformed JSON and any error of
    /// [`CacheConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self, IndicatorError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that all sizes are usable.
    ///
    /// # Errors
    /// Returns `IndicatorError::InvalidParams` if a value is zero or the
    /// initial capacity exceeds the ceiling.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        if self.initial_unbounded_capacity == 0 {
            return Err(IndicatorError::invalid_params(
                "initial_unbounded_capacity must be at least 1",
            ));
        }
        if self.max_capacity == 0 {
            return Err(IndicatorError::invalid_params(
                "max_capacity must be at least 1",
            ));
        }
        if self.initial_unbounded_capacity > self.max_capacity {
            return Err(IndicatorError::invalid_params(format!(
                "initial_unbounded_capacity {} exceeds max_capacity {}",
                self.initial_unbounded_capacity, self.max_capacity
            )));
        }
        if self.recursion_threshold == 0 {
            return Err(IndicatorError::invalid_params(
                "recursion_threshold must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.initial_unbounded_capacity, 512);
        assert_eq!(config.max_capacity, 1_000_000);
        assert_eq!(config.recursion_threshold, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_fills_missing_fields() {
        let config = CacheConfig::from_json(r#"{"recursion_threshold": 10}"#).unwrap();
        assert_eq!(config.recursion_threshold, 10);
        assert_eq!(config.initial_unbounded_capacity, DEFAULT_UNBOUNDED_CAPACITY);
        assert_eq!(config.max_capacity, MAX_CACHE_CAPACITY);
    }

    #[test]
    fn test_from_json_rejects_malformed() {
        let err = CacheConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, IndicatorError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_initial_above_max() {
        let config = CacheConfig {
            initial_unbounded_capacity: 2048,
            max_capacity: 1024,
            ..CacheConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(IndicatorError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_threshold() {
        let err = CacheConfig::from_json(r#"{"recursion_threshold": 0}"#).unwrap_err();
        assert!(err.is_config_error());
    }
}
