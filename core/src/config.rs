//! Provider configuration.
//!
//! The host sends a JSON object when it configures the provider. The only
//! setting is the per-request deadline; when the host leaves it unset, the
//! `HTTPREQ_REQUEST_TIMEOUT_MS` environment variable is used, and when that
//! is unset too requests have no deadline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const TIMEOUT_ENV: &str = "HTTPREQ_REQUEST_TIMEOUT_MS";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

impl ProviderConfig {
    /// Parse the host payload. An empty string or `null` is the default
    /// configuration.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let raw = raw.trim();
        if raw.is_empty() || raw == "null" {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(raw)?)
    }

    /// Fill unset fields from the process environment.
    pub fn with_env_fallback(self) -> Result<Self, ConfigError> {
        self.with_fallback(std::env::var(TIMEOUT_ENV).ok().as_deref())
    }

    fn with_fallback(mut self, env_timeout: Option<&str>) -> Result<Self, ConfigError> {
        if self.request_timeout_ms.is_none() {
            if let Some(value) = env_timeout.map(str::trim).filter(|v| !v.is_empty()) {
                let ms = value.parse().map_err(|_| ConfigError::InvalidTimeout {
                    name: TIMEOUT_ENV.to_string(),
                    value: value.to_string(),
                })?;
                self.request_timeout_ms = Some(ms);
            }
        }
        Ok(self)
    }

    /// Deadline applied to each request. Zero means no deadline.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_is_default() {
        assert_eq!(ProviderConfig::from_json("").unwrap(), ProviderConfig::default());
        assert_eq!(ProviderConfig::from_json("null").unwrap(), ProviderConfig::default());
        assert_eq!(ProviderConfig::from_json("{}").unwrap(), ProviderConfig::default());
    }

    #[test]
    fn timeout_is_parsed() {
        let config = ProviderConfig::from_json(r#"{"request_timeout_ms": 1500}"#).unwrap();
        assert_eq!(config.request_timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn zero_timeout_means_none() {
        let config = ProviderConfig::from_json(r#"{"request_timeout_ms": 0}"#).unwrap();
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = ProviderConfig::from_json(r#"{"retries": 3}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn env_fallback_fills_missing_timeout() {
        let config = ProviderConfig::default().with_fallback(Some("250")).unwrap();
        assert_eq!(config.request_timeout_ms, Some(250));
    }

    #[test]
    fn explicit_timeout_wins_over_env() {
        let config = ProviderConfig {
            request_timeout_ms: Some(10),
        }
        .with_fallback(Some("250"))
        .unwrap();
        assert_eq!(config.request_timeout_ms, Some(10));
    }

    #[test]
    fn bad_env_value_is_an_error() {
        let err = ProviderConfig::default().with_fallback(Some("soon")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout { ref value, .. } if value == "soon"));
    }

    #[test]
    fn blank_env_value_is_ignored() {
        let config = ProviderConfig::default().with_fallback(Some("  ")).unwrap();
        assert_eq!(config.request_timeout_ms, None);
    }
}
