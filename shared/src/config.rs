use serde::{Deserialize, Serialize};

use crate::capabilities::{HttpError, ValidatedUrl, MAX_TIMEOUT_MS};
use crate::error::{AppError, ErrorKind};
use crate::{
    DEFAULT_API_BASE_URL, DEFAULT_LOCATION_TIMEOUT_MS, DEFAULT_RADIUS_KM,
    DEFAULT_REFRESH_INTERVAL_MS, DEFAULT_TIMEOUT_MS, MAX_RADIUS_KM, MIN_RADIUS_KM,
    MIN_REFRESH_INTERVAL_MS,
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid API base URL: {0}")]
    BaseUrl(#[from] HttpError),
    #[error("radius must be within [{min}, {max}] km, got {value}")]
    Radius { value: f64, min: f64, max: f64 },
    #[error("refresh interval must be at least {min}ms, got {value}ms")]
    RefreshInterval { value: u64, min: u64 },
    #[error("{name} must be 1..={max}ms, got {value}ms")]
    Timeout { name: &'static str, value: u64, max: u64 },
    #[error("malformed config JSON: {0}")]
    Json(String),
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::new(ErrorKind::Validation, e.to_string())
    }
}

/// Runtime settings for the discovery core. Any field left out of the JSON
/// falls back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub api_base_url: String,
    pub radius_km: f64,
    pub refresh_interval_ms: u64,
    pub location_timeout_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            radius_km: DEFAULT_RADIUS_KM,
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            location_timeout_ms: DEFAULT_LOCATION_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl DiscoveryConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base_url()?;

        if !(MIN_RADIUS_KM..=MAX_RADIUS_KM).contains(&self.radius_km) {
            return Err(ConfigError::Radius {
                value: self.radius_km,
                min: MIN_RADIUS_KM,
                max: MAX_RADIUS_KM,
            });
        }

        if self.refresh_interval_ms < MIN_REFRESH_INTERVAL_MS {
            return Err(ConfigError::RefreshInterval {
                value: self.refresh_interval_ms,
                min: MIN_REFRESH_INTERVAL_MS,
            });
        }

        for (name, value) in [
            ("location_timeout_ms", self.location_timeout_ms),
            ("request_timeout_ms", self.request_timeout_ms),
        ] {
            if value == 0 || value > MAX_TIMEOUT_MS {
                return Err(ConfigError::Timeout {
                    name,
                    value,
                    max: MAX_TIMEOUT_MS,
                });
            }
        }

        Ok(())
    }

    pub fn base_url(&self) -> Result<ValidatedUrl, ConfigError> {
        Ok(ValidatedUrl::new(self.api_base_url.as_str())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(DiscoveryConfig::default().validate().is_ok());
    }

    #[test]
    fn test_from_json_partial_uses_defaults() {
        let config =
            DiscoveryConfig::from_json(r#"{"api_base_url": "https://api.vetfinder.app/api"}"#)
                .unwrap();
        assert_eq!(config.api_base_url, "https://api.vetfinder.app/api");
        assert_eq!(config.radius_km, DEFAULT_RADIUS_KM);
        assert_eq!(config.refresh_interval_ms, DEFAULT_REFRESH_INTERVAL_MS);
    }

    #[test]
    fn test_from_json_malformed() {
        assert!(matches!(
            DiscoveryConfig::from_json("{radius_km: 3"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let config = DiscoveryConfig {
            api_base_url: "ftp://vets.example".into(),
            ..DiscoveryConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::BaseUrl(_))));
    }

    #[test]
    fn test_rejects_bad_radius() {
        for radius_km in [0.0, -1.0, f64::NAN, MAX_RADIUS_KM + 1.0] {
            let config = DiscoveryConfig {
                radius_km,
                ..DiscoveryConfig::default()
            };
            assert!(matches!(config.validate(), Err(ConfigError::Radius { .. })));
        }
    }

    #[test]
    fn test_rejects_fast_refresh() {
        let config = DiscoveryConfig {
            refresh_interval_ms: 10,
            ..DiscoveryConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RefreshInterval { .. })
        ));
    }

    #[test]
    fn test_rejects_zero_timeouts() {
        let config = DiscoveryConfig {
            location_timeout_ms: 0,
            ..DiscoveryConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Timeout { name: "location_timeout_ms", .. })
        ));
    }
}
