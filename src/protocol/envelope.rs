//! Outbound envelope types.
//!
//! Every frame the bridge writes to the controller is one serialized
//! [`Envelope`], tagged by its `type` field.
//!
//! # Format
//!
//! ```json
//! {"type": "connected", "timestamp": 1700000000000, "userInfo": {..}, "roomInfo": {..}}
//! {"type": "response", "action": "send_message", "success": true, "data": {..}}
//! {"type": "error", "message": "Unknown command: frobnicate"}
//! {"type": "room_update", "timestamp": 1700000000000, "roomInfo": {..}}
//! {"type": "test", "message": "bridge self-test", "timestamp": 1700000000000}
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::page::{RoomInfo, UserInfo};

use super::Action;

// ============================================================================
// Envelope
// ============================================================================

/// Unit of exchange from bridge to controller.
///
/// Envelopes are built once and never mutated; the queue moves them around
/// whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Envelope {
    /// Sent once per established connection, ahead of any backlog.
    Connected {
        /// Milliseconds since the Unix epoch.
        timestamp: u64,
        /// Identity snapshot.
        #[serde(rename = "userInfo")]
        user_info: UserInfo,
        /// Room snapshot.
        #[serde(rename = "roomInfo")]
        room_info: RoomInfo,
    },

    /// Result of a command.
    Response(Response),

    /// Command with an unrecognized action.
    Error {
        /// Human-readable description naming the action.
        message: String,
    },

    /// Unsolicited room change.
    #[serde(rename = "room_update")]
    StateUpdate {
        /// Milliseconds since the Unix epoch.
        timestamp: u64,
        /// Room snapshot taken after the change.
        #[serde(rename = "roomInfo")]
        room_info: RoomInfo,
    },

    /// Diagnostic self-test.
    Test {
        /// Free text.
        message: String,
        /// Milliseconds since the Unix epoch.
        timestamp: u64,
    },
}

impl Envelope {
    /// Creates a connection announcement stamped now.
    #[must_use]
    pub fn connected(user_info: UserInfo, room_info: RoomInfo) -> Self {
        Self::Connected {
            timestamp: now_millis(),
            user_info,
            room_info,
        }
    }

    /// Creates an `error` envelope.
    #[inline]
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Creates a `room_update` envelope stamped now.
    #[must_use]
    pub fn state_update(room_info: RoomInfo) -> Self {
        Self::StateUpdate {
            timestamp: now_millis(),
            room_info,
        }
    }

    /// Creates a `test` envelope stamped now.
    #[must_use]
    pub fn test(message: impl Into<String>) -> Self {
        Self::Test {
            message: message.into(),
            timestamp: now_millis(),
        }
    }

    /// Wire name of the `type` field.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::Response(_) => "response",
            Self::Error { .. } => "error",
            Self::StateUpdate { .. } => "room_update",
            Self::Test { .. } => "test",
        }
    }

    /// Serializes into one text frame.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if serialization fails.
    pub fn to_frame(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a text frame back into an envelope.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if the frame is not an envelope.
    pub fn from_frame(frame: &str) -> Result<Self> {
        Ok(serde_json::from_str(frame)?)
    }
}

impl From<Response> for Envelope {
    #[inline]
    fn from(response: Response) -> Self {
        Self::Response(response)
    }
}

// ============================================================================
// Response
// ============================================================================

/// Body of a `response` envelope.
///
/// Exactly one of `data`, `message` or `error` is set by the constructors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Command this answers.
    pub action: Action,

    /// Whether the command is considered done.
    pub success: bool,

    /// Structured result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Advisory text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Failure detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    /// Successful response carrying data.
    #[must_use]
    pub fn data(action: Action, data: Value) -> Self {
        Self {
            action,
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }

    /// Successful response carrying an advisory message.
    #[must_use]
    pub fn advice(action: Action, message: impl Into<String>) -> Self {
        Self {
            action,
            success: true,
            data: None,
            message: Some(message.into()),
            error: None,
        }
    }

    /// Failed response carrying the failure detail.
    #[must_use]
    pub fn failure(action: Action, error: impl Into<String>) -> Self {
        Self {
            action,
            success: false,
            data: None,
            message: None,
            error: Some(error.into()),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Milliseconds since the Unix epoch, `0` if the clock is before it.
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_connected_wire_shape() {
        let envelope = Envelope::connected(UserInfo::named("alice"), RoomInfo::default());
        let value: Value = serde_json::from_str(&envelope.to_frame().expect("frame")).expect("json");

        assert_eq!(value["type"], "connected");
        assert_eq!(value["userInfo"]["name"], "alice");
        assert!(value["roomInfo"]["users"].is_array());
        assert!(value["timestamp"].as_u64().expect("timestamp") > 0);
    }

    #[test]
    fn test_state_update_uses_room_update_tag() {
        let envelope = Envelope::state_update(RoomInfo::default());
        let value = serde_json::to_value(&envelope).expect("json");

        assert_eq!(value["type"], "room_update");
        assert_eq!(envelope.kind(), "room_update");
    }

    #[test]
    fn test_response_omits_unset_fields() {
        let envelope: Envelope = Response::failure(Action::SendMusic, "no player").into();
        let value = serde_json::to_value(&envelope).expect("json");

        assert_eq!(
            value,
            json!({
                "type": "response",
                "action": "send_music",
                "success": false,
                "error": "no player"
            })
        );
    }

    #[test]
    fn test_error_envelope_from_frame() {
        let envelope =
            Envelope::from_frame(r#"{"type":"error","message":"Unknown command: x"}"#).expect("parse");
        assert_eq!(envelope, Envelope::error("Unknown command: x"));
    }
}
