//! Configuration for the monitor agent

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the status service
    pub service_url: String,

    /// Path to the persisted monitoring state file
    pub state_path: String,

    /// HTTP timeout for status service requests
    pub http_timeout: Duration,

    /// Ask the host for its open tabs when monitoring starts
    pub scan_tabs_on_start: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_url: "http://localhost:5000".to_string(),
            state_path: "monitor_state.json".to_string(),
            http_timeout: Duration::from_secs(10),
            scan_tabs_on_start: true,
        }
    }
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.service_url.is_empty() {
            return Err("service_url cannot be empty".to_string());
        }

        if !self.service_url.starts_with("http://") && !self.service_url.starts_with("https://") {
            return Err("service_url must be an http(s) URL".to_string());
        }

        if self.state_path.is_empty() {
            return Err("state_path cannot be empty".to_string());
        }

        if self.http_timeout.is_zero() {
            return Err("http_timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.service_url, "http://localhost:5000");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.service_url = String::new();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.service_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.http_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }
}
