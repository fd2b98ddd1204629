//! Single logical connection to the controller.
//!
//! [`TransportManager`] owns the connection state, the retry budget and the
//! current link. It never blocks: attempts, retry timers and the frame reader
//! run as spawned tasks that report back through [`TransportEvent`]s tagged
//! with the [`ConnectionId`] they were started under. The bridge event loop
//! feeds those events back in, and anything tagged with an older id than the
//! current one is ignored.
//!
//! # Lifecycle
//!
//! ```text
//!              connect()
//! Disconnected ─────────► Connecting ──Established──► Connected
//!      ▲                      │                          │
//!      │        Failed        │          Closed          │
//!      └──────────────────────┴──────────────────────────┘
//!            (retry after min(base × k, cap) while budget remains)
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::error::Error;
use crate::identifiers::ConnectionId;
use crate::protocol::Envelope;

use super::connector::{Connector, FrameChannel};
use super::queue::Outlet;
use super::retry::RetryBudget;

// ============================================================================
// ConnectionState
// ============================================================================

/// State of the controller connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No link and no attempt in flight.
    #[default]
    Disconnected,
    /// An attempt is in flight.
    Connecting,
    /// Link established.
    Connected,
}

// ============================================================================
// TransportEvent
// ============================================================================

/// Notifications from transport tasks back to the event loop.
#[derive(Debug)]
pub(crate) enum TransportEvent {
    /// An attempt succeeded.
    Established {
        id: ConnectionId,
        channel: FrameChannel,
    },
    /// An attempt failed.
    Failed { id: ConnectionId, error: Error },
    /// Inbound text frame.
    Frame { id: ConnectionId, text: String },
    /// Link closed by the remote side or by an I/O error.
    Closed { id: ConnectionId },
    /// Backoff delay elapsed.
    RetryDue { id: ConnectionId },
}

// ============================================================================
// Link
// ============================================================================

/// Established connection: write side plus the reader task.
struct Link {
    id: ConnectionId,
    outgoing: mpsc::UnboundedSender<String>,
    reader: JoinHandle<()>,
}

impl Link {
    #[inline]
    fn is_ready(&self) -> bool {
        !self.outgoing.is_closed()
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        // Dropping the receiver inside the reader releases the connection.
        self.reader.abort();
    }
}

// ============================================================================
// TransportManager
// ============================================================================

/// Owner of the controller connection.
///
/// Only the bridge event loop holds one, so every mutation happens from a
/// single task.
pub struct TransportManager {
    /// Controller URL.
    endpoint: Url,
    /// Connection factory.
    connector: Arc<dyn Connector>,
    /// Sink for task notifications.
    events: mpsc::UnboundedSender<TransportEvent>,
    /// Current state.
    state: ConnectionState,
    /// Automatic reconnect budget.
    budget: RetryBudget,
    /// Generation of the latest connect() or close().
    current: ConnectionId,
    /// Established link, if any.
    link: Option<Link>,
    /// In-flight attempt or retry timer.
    pending: Option<JoinHandle<()>>,
}

impl TransportManager {
    /// Creates a disconnected manager.
    pub(crate) fn new(
        endpoint: Url,
        connector: Arc<dyn Connector>,
        budget: RetryBudget,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Self {
        Self {
            endpoint,
            connector,
            events,
            state: ConnectionState::Disconnected,
            budget,
            current: ConnectionId::default(),
            link: None,
            pending: None,
        }
    }

    /// Current connection state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Automatic reconnect attempts used since the last success.
    #[inline]
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.budget.attempts()
    }

    /// Id of the established link.
    #[inline]
    #[must_use]
    pub fn connection(&self) -> Option<ConnectionId> {
        self.link.as_ref().map(|link| link.id)
    }

    /// Returns `true` if a frame can be handed off right now.
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state == ConnectionState::Connected && self.link.as_ref().is_some_and(Link::is_ready)
    }

    /// Starts a new connection attempt.
    ///
    /// Any existing link, in-flight attempt or pending retry timer is torn
    /// down first, so at most one connection is ever live.
    pub(crate) fn connect(&mut self) {
        self.release();
        self.current = self.current.next();
        self.state = ConnectionState::Connecting;

        let id = self.current;
        let endpoint = self.endpoint.clone();
        let connector = Arc::clone(&self.connector);
        let events = self.events.clone();

        debug!(%id, %endpoint, "Connecting to controller");

        self.pending = Some(tokio::spawn(async move {
            let event = match connector.connect(&endpoint).await {
                Ok(channel) => TransportEvent::Established { id, channel },
                Err(error) => TransportEvent::Failed { id, error },
            };
            let _ = events.send(event);
        }));
    }

    /// Installs an established connection.
    ///
    /// Returns `false` (and drops the channel) if the attempt was superseded.
    pub(crate) fn on_established(&mut self, id: ConnectionId, channel: FrameChannel) -> bool {
        if id != self.current || self.state != ConnectionState::Connecting {
            debug!(%id, current = %self.current, "Discarding superseded connection");
            return false;
        }

        let FrameChannel {
            outgoing,
            mut incoming,
        } = channel;

        let events = self.events.clone();
        let reader = tokio::spawn(async move {
            while let Some(text) = incoming.recv().await {
                if events.send(TransportEvent::Frame { id, text }).is_err() {
                    return;
                }
            }
            let _ = events.send(TransportEvent::Closed { id });
        });

        self.pending = None;
        self.link = Some(Link {
            id,
            outgoing,
            reader,
        });
        self.state = ConnectionState::Connected;
        self.budget.reset();

        info!(%id, endpoint = %self.endpoint, "Connected to controller");
        true
    }

    /// Returns `true` if an inbound frame from `id` belongs to the live link.
    #[inline]
    #[must_use]
    pub(crate) fn accepts(&self, id: ConnectionId) -> bool {
        self.connection() == Some(id)
    }

    /// Handles a failed attempt or a closed link.
    pub(crate) fn on_lost(&mut self, id: ConnectionId) {
        if id != self.current || self.state == ConnectionState::Disconnected {
            debug!(%id, current = %self.current, "Ignoring stale loss");
            return;
        }

        if self.state == ConnectionState::Connected {
            info!(%id, "Controller connection closed");
        }

        self.link = None;
        self.pending = None;
        self.state = ConnectionState::Disconnected;
        self.schedule_retry();
    }

    /// Handles an elapsed backoff timer.
    pub(crate) fn on_retry_due(&mut self, id: ConnectionId) {
        if id != self.current || self.state != ConnectionState::Disconnected {
            debug!(%id, current = %self.current, "Ignoring superseded retry");
            return;
        }
        self.connect();
    }

    /// Closes the connection and cancels pending retries.
    pub(crate) fn close(&mut self) {
        self.release();
        self.current = self.current.next();
        self.state = ConnectionState::Disconnected;
        debug!("Transport closed");
    }

    /// Hands one envelope to the link.
    ///
    /// Returns `false` without side effects when not ready; hand-off failures
    /// are logged, never propagated.
    pub fn send(&mut self, envelope: &Envelope) -> bool {
        if !self.is_ready() {
            return false;
        }
        let Some(link) = self.link.as_ref() else {
            return false;
        };

        let frame = match envelope.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                warn!(kind = envelope.kind(), error = %e, "Failed to encode envelope");
                return false;
            }
        };

        if link.outgoing.send(frame).is_err() {
            warn!(kind = envelope.kind(), id = %link.id, "Link closed during send");
            return false;
        }

        trace!(kind = envelope.kind(), id = %link.id, "Envelope sent");
        true
    }

    fn schedule_retry(&mut self) {
        let Some(delay) = self.budget.next_delay() else {
            warn!(
                max_attempts = self.budget.max_attempts(),
                "Reconnect attempts exhausted, waiting for an external trigger"
            );
            return;
        };

        let id = self.current;
        let events = self.events.clone();

        debug!(
            attempt = self.budget.attempts(),
            max_attempts = self.budget.max_attempts(),
            delay_ms = delay.as_millis() as u64,
            "Reconnect scheduled"
        );

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(TransportEvent::RetryDue { id });
        }));
    }

    fn release(&mut self) {
        self.link = None;
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }
}

impl Outlet for TransportManager {
    #[inline]
    fn is_ready(&self) -> bool {
        TransportManager::is_ready(self)
    }

    #[inline]
    fn deliver(&mut self, envelope: &Envelope) -> bool {
        self.send(envelope)
    }
}

impl Drop for TransportManager {
    fn drop(&mut self) {
        self.release();
    }
}

// ============================================================================
// Tests
// ============================================================================
