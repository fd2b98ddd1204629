//! Bridge configuration.
//!
//! Provides the endpoint and reconnect tuning of a [`Bridge`](super::Bridge).
//! Values can come from JSON (camelCase keys) or from the `with_*` methods.
//!
//! # Example
//!
//! ```ignore
//! use room_bridge::BridgeConfig;
//!
//! let config = BridgeConfig::from_json(r#"{"endpoint": "ws://127.0.0.1:9000", "maxAttempts": 3}"#)?;
//! assert_eq!(config.base_delay_ms, 5000);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};
use crate::transport::RetryBudget;

// ============================================================================
// Constants
// ============================================================================

/// Default controller endpoint.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8765";

/// Default linear backoff unit.
pub const DEFAULT_BASE_DELAY_MS: u64 = 5_000;

/// Default backoff ceiling.
pub const DEFAULT_CAP_DELAY_MS: u64 = 30_000;

/// Default automatic reconnect ceiling.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default base for `join_room` links.
pub const DEFAULT_ROOM_URL: &str = "https://drrr.com/room/";

// ============================================================================
// BridgeConfig
// ============================================================================

/// Endpoint and reconnect tuning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Controller WebSocket URL.
    pub endpoint: String,

    /// Linear backoff unit in milliseconds.
    pub base_delay_ms: u64,

    /// Backoff ceiling in milliseconds.
    pub cap_delay_ms: u64,

    /// Automatic reconnect ceiling.
    pub max_attempts: u32,

    /// Room page URL; `join_room` appends `?id=<roomId>`.
    pub room_url: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            cap_delay_ms: DEFAULT_CAP_DELAY_MS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            room_url: DEFAULT_ROOM_URL.to_string(),
        }
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl BridgeConfig {
    /// Creates the default configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON configuration object.
    ///
    /// Missing keys keep their defaults; unknown keys are rejected.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] on malformed JSON or unknown keys
    /// - [`Error::Config`] / [`Error::Url`] if validation fails
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl BridgeConfig {
    /// Sets the controller endpoint.
    #[inline]
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the backoff unit.
    #[inline]
    #[must_use]
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Sets the backoff ceiling.
    #[inline]
    #[must_use]
    pub fn with_cap_delay(mut self, delay: Duration) -> Self {
        self.cap_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Sets the automatic reconnect ceiling.
    #[inline]
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the room page URL.
    #[inline]
    #[must_use]
    pub fn with_room_url(mut self, room_url: impl Into<String>) -> Self {
        self.room_url = room_url.into();
        self
    }
}

// ============================================================================
// Conversion Methods
// ============================================================================

impl BridgeConfig {
    /// Backoff unit as a duration.
    #[inline]
    #[must_use]
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Backoff ceiling as a duration.
    #[inline]
    #[must_use]
    pub fn cap_delay(&self) -> Duration {
        Duration::from_millis(self.cap_delay_ms)
    }

    /// Fresh retry budget from these settings.
    #[must_use]
    pub fn retry_budget(&self) -> RetryBudget {
        RetryBudget::new(self.base_delay(), self.cap_delay(), self.max_attempts)
    }

    /// Parsed controller endpoint.
    ///
    /// # Errors
    ///
    /// - [`Error::Url`] if the endpoint is not a URL
    /// - [`Error::Config`] if the scheme is not `ws` or `wss`
    pub fn endpoint_url(&self) -> Result<Url> {
        let url = Url::parse(&self.endpoint)?;
        match url.scheme() {
            "ws" | "wss" => Ok(url),
            other => Err(Error::config(format!(
                "endpoint must use ws:// or wss://, got {other}://"
            ))),
        }
    }

    /// Parsed room page URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Url`] if the room URL is not a URL.
    pub fn room_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.room_url)?)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        self.endpoint_url()?;
        self.room_url()?;

        if self.base_delay_ms == 0 {
            return Err(Error::config("baseDelayMs must be greater than zero"));
        }

        if self.cap_delay_ms < self.base_delay_ms {
            return Err(Error::config(format!(
                "capDelayMs ({}) must not be below baseDelayMs ({})",
                self.cap_delay_ms, self.base_delay_ms
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::new();
        assert_eq!(config.endpoint, "ws://localhost:8765");
        assert_eq!(config.base_delay(), Duration::from_secs(5));
        assert_eq!(config.cap_delay(), Duration::from_secs(30));
        assert_eq!(config.max_attempts, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config =
            BridgeConfig::from_json(r#"{"endpoint":"ws://127.0.0.1:9000","maxAttempts":3}"#)
                .expect("config");
        assert_eq!(config.endpoint, "ws://127.0.0.1:9000");
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.base_delay_ms, DEFAULT_BASE_DELAY_MS);
    }

    #[test]
    fn test_from_json_rejects_unknown_keys() {
        let err = BridgeConfig::from_json(r#"{"maxAttempt":3}"#).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_rejects_http_endpoint() {
        let config = BridgeConfig::new().with_endpoint("http://localhost:8765");
        assert!(matches!(config.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_rejects_cap_below_base() {
        let config = BridgeConfig::new()
            .with_base_delay(Duration::from_secs(10))
            .with_cap_delay(Duration::from_secs(5));
        assert!(matches!(config.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_rejects_zero_base_delay() {
        let config = BridgeConfig::new().with_base_delay(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_budget_uses_settings() {
        let config = BridgeConfig::new()
            .with_base_delay(Duration::from_millis(200))
            .with_cap_delay(Duration::from_millis(500))
            .with_max_attempts(4);
        let budget = config.retry_budget();
        assert_eq!(budget.delay_for(1), Duration::from_millis(200));
        assert_eq!(budget.delay_for(3), Duration::from_millis(500));
        assert_eq!(budget.max_attempts(), 4);
    }
}
