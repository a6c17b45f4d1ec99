//! Application configuration
//!
//! Environment-driven settings with local-development fallbacks.

use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Durable registry CSV path
    pub registry_csv: PathBuf,
    /// Barrier controller base URL (no trailing slash)
    pub actuator_url: String,
    /// Actuator request timeout
    pub actuator_timeout: Duration,
    /// Optional MySQL mirror DSN; mirror disabled when unset
    pub mirror_database_url: Option<String>,
    /// Minimum normalized plate length considered a candidate
    pub min_plate_len: usize,
    /// Per-plate duplicate suppression window
    pub cooldown: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            registry_csv: std::env::var("REGISTRY_CSV")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("registro.csv")),
            actuator_url: std::env::var("ACTUATOR_URL")
                .unwrap_or_else(|_| "http://10.239.134.124".to_string()),
            actuator_timeout: Duration::from_secs(
                std::env::var("ACTUATOR_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(5),
            ),
            mirror_database_url: std::env::var("MIRROR_DATABASE_URL").ok(),
            min_plate_len: std::env::var("MIN_PLATE_LEN")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            cooldown: Duration::from_secs(
                std::env::var("COOLDOWN_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(5),
            ),
        }
    }
}

impl AppConfig {
    /// Actuator base URL without a trailing slash
    pub fn actuator_base(&self) -> &str {
        self.actuator_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let config = AppConfig::default();
        assert_eq!(config.min_plate_len, 5);
        assert_eq!(config.cooldown, Duration::from_secs(5));
        assert_eq!(config.actuator_timeout, Duration::from_secs(5));
    }
}
