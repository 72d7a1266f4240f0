//! # CLI Configuration
//!
//! Environment-based configuration for `categoryctl`.

use std::env;

use category_persistence::RedisStoreConfig;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis document store configuration
    pub redis: RedisStoreConfig,

    /// Logging level, used when `RUST_LOG` is unset
    pub log_level: String,

    /// Log line format
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = RedisStoreConfig::default();

        Self {
            redis: RedisStoreConfig {
                url: lookup("REDIS_URL").unwrap_or(defaults.url),
                key_prefix: lookup("CATEGORY_KEY_PREFIX").unwrap_or(defaults.key_prefix),
            },

            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),

            log_format: lookup("LOG_FORMAT")
                .map(|v| {
                    if v.eq_ignore_ascii_case("json") {
                        LogFormat::Json
                    } else {
                        LogFormat::Pretty
                    }
                })
                .unwrap_or_default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);

        assert_eq!(config.redis.url, "redis://127.0.0.1:6379");
        assert_eq!(config.redis.key_prefix, "category_store");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("REDIS_URL", "redis://cache:6380/2"),
            ("CATEGORY_KEY_PREFIX", "staging"),
            ("LOG_LEVEL", "debug"),
            ("LOG_FORMAT", "JSON"),
        ]);

        assert_eq!(config.redis.url, "redis://cache:6380/2");
        assert_eq!(config.redis.key_prefix, "staging");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_unknown_log_format_falls_back_to_pretty() {
        let config = config_from(&[("LOG_FORMAT", "xml")]);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }
}
