//! WebSocket protocol message types.
//!
//! This module defines the message format exchanged between the bridge and
//! the controller.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Command` | Controller → Bridge | Requested page action or query |
//! | `Envelope` | Bridge → Controller | Announcement, response, error, update |
//!
//! Each WebSocket text frame carries exactly one JSON message; there is no
//! request id, the `action` echoed in responses is the only correlation.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Inbound command set |
//! | `envelope` | Outbound envelope and response body |

// ============================================================================
// Submodules
// ============================================================================

/// Inbound command definitions.
pub mod command;

/// Outbound envelope types.
pub mod envelope;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{Action, Command};
pub use envelope::{Envelope, Response, now_millis};
