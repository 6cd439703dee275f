use std::time::Duration;

use crate::errors::ApiError;

pub const DEFAULT_ENDPOINT: &str = "https://ismp.crpt.ru/api/v3/lk/documents/create";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for the rate-limited document API client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    /// Length of one rate limit window
    pub window: Duration,
    /// Maximum submissions per window
    pub capacity: u32,
    pub endpoint: String,
    pub request_timeout: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(1),
            capacity: 10,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl GateConfig {
    pub fn new(window: Duration, capacity: u32) -> Self {
        Self {
            window,
            capacity,
            ..Default::default()
        }
    }

    /// Reads overrides from the environment, falling back to defaults for
    /// anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let endpoint = std::env::var("DOCUMENT_API_URL").unwrap_or(defaults.endpoint);
        let capacity = std::env::var("DOCUMENT_RATE_LIMIT")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(defaults.capacity);
        let window = std::env::var("DOCUMENT_RATE_WINDOW_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.window);
        let request_timeout = std::env::var("DOCUMENT_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        Self {
            window,
            capacity,
            endpoint,
            request_timeout,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.capacity == 0 {
            return Err(ApiError::InvalidArgument(
                "Request limit must be positive".to_string(),
            ));
        }
        if self.window.is_zero() {
            return Err(ApiError::InvalidArgument(
                "Rate limit window must be positive".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(ApiError::InvalidArgument(
                "Request timeout must be positive".to_string(),
            ));
        }
        if self.endpoint.is_empty() {
            return Err(ApiError::InvalidArgument("Endpoint must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_endpoint() {
        let config = GateConfig::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_limits() {
        assert!(GateConfig::new(Duration::from_secs(1), 0).validate().is_err());
        assert!(GateConfig::new(Duration::ZERO, 5).validate().is_err());
        assert!(GateConfig::default()
            .with_request_timeout(Duration::ZERO)
            .validate()
            .is_err());
        assert!(GateConfig::default().with_endpoint("").validate().is_err());
    }
}
