//! Bridge runtime.
//!
//! Wires the transport, the outbound queue and the page collaborators into a
//! single event loop.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Bridge`] | Running bridge, owns the event loop task |
//! | [`BridgeHandle`] | Cloneable host-side handle |
//! | [`BridgeBuilder`] | Fluent configuration builder |
//! | [`BridgeConfig`] | Endpoint and reconnect settings |
//! | [`CommandDispatcher`] | Maps controller commands to page calls |
//!
//! # Example
//!
//! ```no_run
//! use room_bridge::{Bridge, Result, Visibility};
//!
//! # async fn example() -> Result<()> {
//! let bridge = Bridge::builder().max_attempts(3).spawn()?;
//!
//! bridge.set_visibility(Visibility::Hidden)?;
//! bridge.set_visibility(Visibility::Visible)?;
//!
//! let status = bridge.status().await?;
//! println!("{:?} with {} queued", status.state, status.queued);
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for bridge configuration.
pub mod builder;

/// Event loop, handle and status types.
pub mod core;

/// Command routing.
pub mod dispatcher;

/// Endpoint and reconnect settings.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::BridgeBuilder;
pub use core::{Bridge, BridgeHandle, BridgeStatus, SELF_TEST_MESSAGE, Visibility};
pub use dispatcher::{CommandDispatcher, UNCONFIRMED_ADVICE};
pub use options::BridgeConfig;
