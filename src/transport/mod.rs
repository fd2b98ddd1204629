//! WebSocket transport layer.
//!
//! This module handles communication between the bridge (page side) and the
//! controller process via WebSocket.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Bridge (page)  │                              │  Controller     │
//! │                 │         WebSocket            │                 │
//! │  Transport      │─────────────────────────────►│  WebSocket      │
//! │  Manager        │◄─────────────────────────────│  Server         │
//! │  + Queue        │      localhost:8765          │                 │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `TransportManager::connect` - Spawn an attempt through the `Connector`
//! 2. Established - Reset retry budget, announce, flush `OutboundQueue`
//! 3. Closed or failed - Schedule reconnect after `min(base × k, cap)`
//! 4. Budget exhausted - Wait for an external `connect()`
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connector` | Connection establishment and WebSocket pump |
//! | `manager` | Connection state machine |
//! | `queue` | Ordered outbound buffer |
//! | `retry` | Linear capped backoff budget |

// ============================================================================
// Submodules
// ============================================================================

/// Connection establishment and WebSocket pump.
pub mod connector;

/// Connection state machine.
pub mod manager;

/// Ordered outbound buffer.
pub mod queue;

/// Reconnect budget.
pub mod retry;

// ============================================================================
// Re-exports
// ============================================================================

pub use connector::{Connector, FrameChannel, WsConnector};
pub use manager::{ConnectionState, TransportManager};
pub(crate) use manager::TransportEvent;
pub use queue::{OutboundQueue, Outlet};
pub use retry::RetryBudget;
