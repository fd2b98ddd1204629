//! Page-side collaborators.
//!
//! The bridge depends on the hosting page only through these interfaces:
//!
//! | Type | Description |
//! |------|-------------|
//! | [`PageStateProvider`] | User and room snapshots |
//! | [`ActionExecutor`] | Prioritized [`SendCapability`] chain for page actions |
//! | [`PageObserver`] | Pushes "room may have changed" notifications |
//!
//! [`SharedPageState`] is a ready-made state provider backed by snapshots the
//! host writes into it.

// ============================================================================
// Submodules
// ============================================================================

/// Page action execution with layered fallbacks.
pub mod action;

/// Page change notifications.
pub mod observer;

/// User and room snapshots.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use action::{ActionExecutor, Delivery, Intent, SendCapability, Tier};
pub use observer::{ChangeNotifier, PageObserver};
pub use state::{PageStateProvider, RoomInfo, SharedPageState, UserInfo};
