//! Builder pattern for bridge configuration.
//!
//! Collects the [`BridgeConfig`] and the page collaborators, then spawns the
//! event loop.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use room_bridge::{Bridge, SharedPageState};
//!
//! # async fn example() -> room_bridge::Result<()> {
//! let state = Arc::new(SharedPageState::new());
//! let bridge = Bridge::builder()
//!     .endpoint("ws://localhost:8765")
//!     .max_attempts(5)
//!     .state_provider(state)
//!     .spawn()?;
//!
//! bridge.self_test()?;
//! bridge.shutdown().await;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::error::Result;
use crate::page::{ActionExecutor, PageObserver, PageStateProvider, SharedPageState};
use crate::transport::{Connector, OutboundQueue, TransportManager, WsConnector};

use super::core::{Bridge, BridgeHandle, Controller, Visibility};
use super::dispatcher::CommandDispatcher;
use super::options::BridgeConfig;

// ============================================================================
// BridgeBuilder
// ============================================================================

/// Builder for a [`Bridge`].
///
/// Use [`Bridge::builder()`] to create one.
#[derive(Clone)]
pub struct BridgeBuilder {
    config: BridgeConfig,
    connector: Option<Arc<dyn Connector>>,
    state: Option<Arc<dyn PageStateProvider>>,
    executor: ActionExecutor,
    observer: Option<Arc<dyn PageObserver>>,
    page_loaded: bool,
}

impl Default for BridgeBuilder {
    fn default() -> Self {
        Self {
            config: BridgeConfig::default(),
            connector: None,
            state: None,
            executor: ActionExecutor::new(),
            observer: None,
            page_loaded: true,
        }
    }
}

impl fmt::Debug for BridgeBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeBuilder")
            .field("config", &self.config)
            .field("executor", &self.executor)
            .field("has_observer", &self.observer.is_some())
            .field("page_loaded", &self.page_loaded)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// BridgeBuilder Implementation
// ============================================================================

impl BridgeBuilder {
    /// Creates a builder with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    #[inline]
    #[must_use]
    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the controller endpoint.
    #[inline]
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config = self.config.with_endpoint(endpoint);
        self
    }

    /// Sets the backoff unit.
    #[inline]
    #[must_use]
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.config = self.config.with_base_delay(delay);
        self
    }

    /// Sets the backoff ceiling.
    #[inline]
    #[must_use]
    pub fn cap_delay(mut self, delay: Duration) -> Self {
        self.config = self.config.with_cap_delay(delay);
        self
    }

    /// Sets the automatic reconnect ceiling.
    #[inline]
    #[must_use]
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.config = self.config.with_max_attempts(max_attempts);
        self
    }

    /// Sets the room page URL used by `join_room`.
    #[inline]
    #[must_use]
    pub fn room_url(mut self, room_url: impl Into<String>) -> Self {
        self.config = self.config.with_room_url(room_url);
        self
    }

    /// Sets the connection factory. Defaults to [`WsConnector`].
    #[inline]
    #[must_use]
    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Sets the page state source. Defaults to an empty [`SharedPageState`].
    #[inline]
    #[must_use]
    pub fn state_provider(mut self, state: Arc<dyn PageStateProvider>) -> Self {
        self.state = Some(state);
        self
    }

    /// Sets the send capability chain.
    #[inline]
    #[must_use]
    pub fn executor(mut self, executor: ActionExecutor) -> Self {
        self.executor = executor;
        self
    }

    /// Sets the page change observer.
    #[inline]
    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn PageObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Whether the page has already loaded.
    ///
    /// With `false` the bridge waits for
    /// [`BridgeHandle::page_loaded`] before connecting. Defaults to `true`.
    #[inline]
    #[must_use]
    pub fn page_loaded(mut self, loaded: bool) -> Self {
        self.page_loaded = loaded;
        self
    }

    /// Validates the configuration and spawns the event loop.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`](crate::Error::Config) on invalid settings
    /// - [`Error::Url`](crate::Error::Url) if the endpoint or room URL does not parse
    pub fn spawn(self) -> Result<Bridge> {
        self.config.validate()?;
        let endpoint = self.config.endpoint_url()?;
        let room_url = self.config.room_url()?;

        let connector: Arc<dyn Connector> = match self.connector {
            Some(connector) => connector,
            None => Arc::new(WsConnector),
        };
        let state: Arc<dyn PageStateProvider> = match self.state {
            Some(state) => state,
            None => Arc::new(SharedPageState::new()),
        };

        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let transport =
            TransportManager::new(endpoint, connector, self.config.retry_budget(), event_tx);
        let dispatcher = CommandDispatcher::new(Arc::clone(&state), self.executor, room_url);

        let controller = Controller {
            transport,
            queue: OutboundQueue::new(),
            dispatcher: Arc::new(dispatcher),
            state,
            observer: self.observer,
            inputs: input_rx,
            loopback: input_tx.downgrade(),
            events: event_rx,
            visibility: Visibility::default(),
            started: false,
        };

        debug!(
            endpoint = %self.config.endpoint,
            max_attempts = self.config.max_attempts,
            "Spawning bridge"
        );

        let task = tokio::spawn(controller.run(self.page_loaded));
        Ok(Bridge::new(BridgeHandle::new(input_tx), task))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio_test::{assert_err, assert_ok};

    use crate::error::Error;

    #[test]
    fn test_default_builder() {
        let builder = BridgeBuilder::new();
        assert_eq!(builder.config, BridgeConfig::default());
        assert!(builder.connector.is_none());
        assert!(builder.executor.is_empty());
        assert!(builder.page_loaded);
    }

    #[test]
    fn test_setters_update_config() {
        let builder = BridgeBuilder::new()
            .endpoint("wss://controller.local/bridge")
            .base_delay(Duration::from_millis(250))
            .cap_delay(Duration::from_secs(2))
            .max_attempts(7)
            .room_url("https://example.com/room/");

        assert_eq!(builder.config.endpoint, "wss://controller.local/bridge");
        assert_eq!(builder.config.base_delay_ms, 250);
        assert_eq!(builder.config.cap_delay_ms, 2000);
        assert_eq!(builder.config.max_attempts, 7);
        assert_eq!(builder.config.room_url, "https://example.com/room/");
    }

    #[tokio::test]
    async fn test_spawn_with_defaults() {
        let bridge = assert_ok!(BridgeBuilder::new().page_loaded(false).spawn());
        assert!(bridge.is_running());
        bridge.shutdown().await;
    }

    #[tokio::test]
    async fn test_spawn_rejects_invalid_endpoint() {
        let err = BridgeBuilder::new()
            .endpoint("http://localhost:8765")
            .spawn()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[tokio::test]
    async fn test_spawn_rejects_unparseable_room_url() {
        let err = assert_err!(BridgeBuilder::new().room_url("not a url").spawn());
        assert!(matches!(err, Error::Url(_)));
    }
}
