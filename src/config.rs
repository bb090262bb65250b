//! Configuration Module
//!
//! Handles loading and validating cache configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold
    pub capacity: usize,
    /// Longest time the expiration task sleeps between sweeps
    pub expiration_interval: Duration,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum cache entries (default: 1000)
    /// - `CACHE_EXPIRATION_INTERVAL_MS` - Expiration sweep bound in milliseconds (default: 1000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            capacity: env::var("CACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.capacity),
            expiration_interval: env::var("CACHE_EXPIRATION_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.expiration_interval),
        }
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(CacheError::InvalidCapacity(self.capacity));
        }
        if self.expiration_interval.is_zero() {
            return Err(CacheError::InvalidConfig(
                "expiration interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            expiration_interval: Duration::from_secs(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.capacity, 1000);
        assert_eq!(config.expiration_interval, Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_env() {
        // Single test touches the env vars so parallel tests don't race.
        env::remove_var("CACHE_CAPACITY");
        env::remove_var("CACHE_EXPIRATION_INTERVAL_MS");
        assert_eq!(CacheConfig::from_env(), CacheConfig::default());

        env::set_var("CACHE_CAPACITY", "42");
        env::set_var("CACHE_EXPIRATION_INTERVAL_MS", "250");
        let config = CacheConfig::from_env();
        assert_eq!(config.capacity, 42);
        assert_eq!(config.expiration_interval, Duration::from_millis(250));

        env::set_var("CACHE_CAPACITY", "not a number");
        assert_eq!(CacheConfig::from_env().capacity, 1000);

        env::remove_var("CACHE_CAPACITY");
        env::remove_var("CACHE_EXPIRATION_INTERVAL_MS");
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let config = CacheConfig {
            capacity: 0,
            ..CacheConfig::default()
        };
        assert_eq!(config.validate(), Err(CacheError::InvalidCapacity(0)));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let config = CacheConfig {
            expiration_interval: Duration::ZERO,
            ..CacheConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CacheError::InvalidConfig(_))
        ));
    }
}
