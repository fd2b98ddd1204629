//! Error types for the room bridge.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use room_bridge::{Bridge, Result};
//!
//! async fn example() -> Result<()> {
//!     let bridge = Bridge::builder().endpoint("ws://localhost:8765").spawn()?;
//!     bridge.self_test()?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants | Handling |
//! |----------|----------|----------|
//! | Configuration | [`Error::Config`], [`Error::Url`] | Returned from builder |
//! | Transport | [`Error::Connection`], [`Error::WebSocket`] | Reconnect with backoff |
//! | Parse | [`Error::Json`], [`Error::Protocol`] | Inbound frame dropped |
//! | Command | [`Error::UnknownCommand`] | `error` envelope |
//! | Action | [`Error::Action`] | `response` with `success: false` |
//! | Lifecycle | [`Error::BridgeStopped`] | Returned from handle |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// None of these are fatal to a running bridge: transport errors feed the
/// reconnect path, parse errors drop the frame, action errors become
/// `success: false` responses.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when bridge configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Connection to the controller failed.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Inbound frame is valid JSON but not a command object.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    /// Command action is not part of the known command set.
    #[error("Unknown command: {action}")]
    UnknownCommand {
        /// The unrecognized action, or `undefined` when absent.
        action: String,
    },

    // ========================================================================
    // Execution Errors
    // ========================================================================
    /// A page action reported failure.
    #[error("Action failed: {message}")]
    Action {
        /// Failure detail from the page.
        message: String,
    },

    /// The bridge event loop is no longer running.
    #[error("Bridge stopped")]
    BridgeStopped,

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parse error.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates an unknown command error.
    #[inline]
    pub fn unknown_command(action: impl Into<String>) -> Self {
        Self::UnknownCommand {
            action: action.into(),
        }
    }

    /// Creates an action failure.
    #[inline]
    pub fn action(message: impl Into<String>) -> Self {
        Self::Action {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a transport-level error.
    ///
    /// These are recovered by the reconnect path and never reach the
    /// command layer.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::WebSocket(_))
    }

    /// Returns `true` if this error came from decoding an inbound frame.
    #[inline]
    #[must_use]
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Json(_) | Self::Protocol { .. })
    }

    /// Failure detail suitable for a `success: false` response.
    ///
    /// Action errors carry the page's own text; everything else uses the
    /// display form.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Action { message } => message.clone(),
            other => other.to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::connection("refused");
        assert_eq!(err.to_string(), "Connection failed: refused");
    }

    #[test]
    fn test_unknown_command_display() {
        let err = Error::unknown_command("frobnicate");
        assert_eq!(err.to_string(), "Unknown command: frobnicate");
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::connection("x").is_connection_error());
        assert!(!Error::config("x").is_connection_error());
        assert!(!Error::action("x").is_connection_error());
    }

    #[test]
    fn test_is_parse_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err();
        assert!(Error::from(json_err).is_parse_error());
        assert!(Error::protocol("not an object").is_parse_error());
        assert!(!Error::BridgeStopped.is_parse_error());
    }

    #[test]
    fn test_detail_keeps_page_text() {
        assert_eq!(Error::action("room is locked").detail(), "room is locked");
        assert_eq!(Error::BridgeStopped.detail(), "Bridge stopped");
    }

    #[test]
    fn test_from_url_error() {
        let err: Error = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, Error::Url(_)));
    }
}
