//! Page change notifications.
//!
//! The bridge does not watch the page. A host-side [`PageObserver`] is handed
//! a [`ChangeNotifier`] at startup and pokes it whenever something that might
//! affect the room snapshot changed; the bridge re-reads the room and sends a
//! `room_update` for every poke.

// ============================================================================
// Imports
// ============================================================================

use tokio::sync::mpsc;

use crate::bridge::core::Input;

// ============================================================================
// PageObserver
// ============================================================================

/// Host component that watches the page for room changes.
pub trait PageObserver: Send + Sync {
    /// Starts watching. Called once, after the page finished loading.
    fn observe(&self, notifier: ChangeNotifier);
}

// ============================================================================
// ChangeNotifier
// ============================================================================

/// Handle used to report "the room may have changed".
///
/// Holds only a weak reference to the bridge, so a lingering observer does
/// not keep a stopped bridge alive.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    inputs: mpsc::WeakUnboundedSender<Input>,
}

impl ChangeNotifier {
    pub(crate) fn new(inputs: mpsc::WeakUnboundedSender<Input>) -> Self {
        Self { inputs }
    }

    /// Reports a change.
    ///
    /// Returns `false` once the bridge has stopped.
    pub fn notify(&self) -> bool {
        self.inputs
            .upgrade()
            .is_some_and(|tx| tx.send(Input::PageChanged).is_ok())
    }
}
