//! Room bridge - page-side relay between a chat room page and a controller.
//!
//! This library keeps a WebSocket client connection open to a local
//! controller process, announces the current user and room, executes the
//! controller's commands against the page and pushes room updates back.
//!
//! # Architecture
//!
//! The bridge is a client of the controller:
//!
//! - **Page side (this crate)**: Executes commands, reports room state
//! - **Controller**: Decides what to send, listens on `ws://localhost:8765`
//!
//! Key design principles:
//!
//! - One event loop task owns the connection state, queue and retry budget
//! - Outbound envelopes are delivered in enqueue order, across reconnects
//! - Reconnects back off linearly up to a cap and stop after a ceiling
//! - The page is reached only through traits ([`PageStateProvider`],
//!   [`SendCapability`], [`PageObserver`])
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use room_bridge::{Bridge, Result, RoomInfo, SharedPageState, UserInfo};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let state = Arc::new(SharedPageState::with(
//!         UserInfo::named("alice"),
//!         RoomInfo::default(),
//!     ));
//!
//!     let bridge = Bridge::builder()
//!         .endpoint("ws://localhost:8765")
//!         .state_provider(state.clone())
//!         .spawn()?;
//!
//!     state.update_room(|room| room.name = "lounge".into());
//!     bridge.notify_page_changed()?;
//!
//!     bridge.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`bridge`] | Event loop, handle, builder and dispatcher |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`page`] | Page collaborator traits |
//! | [`protocol`] | Wire envelopes and commands |
//! | [`transport`] | WebSocket transport, queue and backoff |

// ============================================================================
// Modules
// ============================================================================

/// Bridge runtime.
///
/// Use [`Bridge::builder()`] to configure and spawn a bridge.
pub mod bridge;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Page-side collaborators.
pub mod page;

/// Wire protocol types.
///
/// Inbound commands and outbound envelopes exchanged with the controller.
pub mod protocol;

/// WebSocket transport layer.
pub mod transport;

#[cfg(test)]
mod testkit;

// ============================================================================
// Re-exports
// ============================================================================

// Bridge types
pub use bridge::{Bridge, BridgeBuilder, BridgeConfig, BridgeHandle, BridgeStatus, Visibility};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::ConnectionId;

// Page types
pub use page::{
    ActionExecutor, ChangeNotifier, Intent, PageObserver, PageStateProvider, RoomInfo,
    SendCapability, SharedPageState, Tier, UserInfo,
};

// Protocol types
pub use protocol::{Action, Command, Envelope, Response};

// Transport types
pub use transport::{ConnectionState, Connector, WsConnector};
