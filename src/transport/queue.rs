//! Ordered outbound buffer.
//!
//! [`OutboundQueue`] holds envelopes while the controller is unreachable and
//! flushes them in order once it is back. Entries leave the queue only after
//! the [`Outlet`] accepted them.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::protocol::Envelope;

// ============================================================================
// Outlet
// ============================================================================

/// Where queued envelopes go.
pub trait Outlet {
    /// Returns `true` if a hand-off may be attempted now.
    fn is_ready(&self) -> bool;

    /// Attempts a hand-off, returning whether it succeeded.
    fn deliver(&mut self, envelope: &Envelope) -> bool;
}

// ============================================================================
// OutboundQueue
// ============================================================================

/// FIFO of envelopes waiting for the controller.
///
/// Unbounded and in-memory only; whatever is left when the bridge stops is
/// discarded.
#[derive(Debug, Default)]
pub struct OutboundQueue {
    entries: VecDeque<Envelope>,
}

impl OutboundQueue {
    /// Creates an empty queue.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of waiting envelopes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is waiting.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sends `envelope` now if possible, otherwise keeps it for the next flush.
    ///
    /// A new envelope never overtakes a backlog: with entries waiting it goes
    /// to the back and the backlog is flushed first.
    pub fn enqueue<O: Outlet + ?Sized>(&mut self, outlet: &mut O, envelope: Envelope) {
        if !outlet.is_ready() {
            trace!(kind = envelope.kind(), queued = self.entries.len() + 1, "Envelope queued");
            self.entries.push_back(envelope);
            return;
        }

        if self.entries.is_empty() {
            if !outlet.deliver(&envelope) {
                self.entries.push_back(envelope);
            }
            return;
        }

        self.entries.push_back(envelope);
        self.flush(outlet);
    }

    /// Sends `envelope` ahead of the backlog.
    ///
    /// Used for the connection announcement; if it cannot go out it becomes
    /// the head of the queue.
    pub fn announce<O: Outlet + ?Sized>(&mut self, outlet: &mut O, envelope: Envelope) {
        if !(outlet.is_ready() && outlet.deliver(&envelope)) {
            self.entries.push_front(envelope);
        }
    }

    /// Delivers waiting envelopes in order.
    ///
    /// Stops at the first failed hand-off, putting that envelope back at the
    /// head. Returns the number delivered.
    pub fn flush<O: Outlet + ?Sized>(&mut self, outlet: &mut O) -> usize {
        let mut delivered = 0;

        while outlet.is_ready() {
            let Some(envelope) = self.entries.pop_front() else {
                break;
            };

            if !outlet.deliver(&envelope) {
                self.entries.push_front(envelope);
                break;
            }
            delivered += 1;
        }

        if delivered > 0 {
            debug!(delivered, remaining = self.entries.len(), "Queue flushed");
        }

        delivered
    }

    /// Removes and returns everything waiting.
    pub fn drain(&mut self) -> Vec<Envelope> {
        self.entries.drain(..).collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
