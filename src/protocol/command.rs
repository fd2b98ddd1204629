//! Inbound command definitions.
//!
//! Commands arrive from the controller as JSON objects tagged by `action`.
//!
//! # Command Set
//!
//! | Action | Parameters | Handler |
//! |--------|------------|---------|
//! | `send_message` | `message`, `url?`, `to?` | page action chain |
//! | `send_music` | `title`, `url` | page action chain |
//! | `get_user_info` | | page state |
//! | `get_room_info` | | page state |
//! | `join_room` | `roomId` | advisory only |
//!
//! Anything else becomes [`Command::Unknown`].

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

// ============================================================================
// Action
// ============================================================================

/// Name of a known command, echoed in `response` envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Send a chat message.
    SendMessage,
    /// Share a media reference.
    SendMusic,
    /// Query user identity.
    GetUserInfo,
    /// Query room and roster.
    GetRoomInfo,
    /// Ask for the room link.
    JoinRoom,
}

impl Action {
    /// All known actions.
    pub const ALL: [Self; 5] = [
        Self::SendMessage,
        Self::SendMusic,
        Self::GetUserInfo,
        Self::GetRoomInfo,
        Self::JoinRoom,
    ];

    /// Wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SendMessage => "send_message",
            Self::SendMusic => "send_music",
            Self::GetUserInfo => "get_user_info",
            Self::GetRoomInfo => "get_room_info",
            Self::JoinRoom => "join_room",
        }
    }

    /// Looks up an action by wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.as_str() == name)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Command
// ============================================================================

/// A request from the controller.
///
/// Parameter fields accept strings, numbers and booleans (rendered as
/// strings); `null` and missing are both `None`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Command {
    /// Post a chat message.
    SendMessage {
        /// Message text.
        #[serde(default, deserialize_with = "lenient_string")]
        message: Option<String>,
        /// Attached link.
        #[serde(default, deserialize_with = "lenient_string")]
        url: Option<String>,
        /// Direct-message recipient.
        #[serde(default, deserialize_with = "lenient_string")]
        to: Option<String>,
    },

    /// Share a media reference.
    SendMusic {
        /// Track title.
        #[serde(default, deserialize_with = "lenient_string")]
        title: Option<String>,
        /// Track URL.
        #[serde(default, deserialize_with = "lenient_string")]
        url: Option<String>,
    },

    /// Query user identity.
    GetUserInfo,

    /// Query room and roster.
    GetRoomInfo,

    /// Ask for a room link.
    JoinRoom {
        /// Target room id.
        #[serde(rename = "roomId", default, deserialize_with = "lenient_string")]
        room_id: Option<String>,
    },

    /// Any action outside the known set.
    #[serde(skip)]
    Unknown {
        /// The action as sent, `None` if the key was absent or null.
        action: Option<String>,
    },
}

impl Command {
    /// Parses one inbound text frame.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the frame is not JSON, or a known command has
    ///   malformed parameters
    /// - [`Error::Protocol`] if the frame is not a JSON object
    pub fn parse(frame: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(frame)?;

        // Arrays and scalars carry no action to answer for; the caller drops them.
        let Some(object) = value.as_object() else {
            return Err(Error::protocol("command frame is not an object"));
        };

        let action = match object.get("action") {
            None | Some(Value::Null) => None,
            Some(Value::String(name)) => Some(name.clone()),
            Some(other) => Some(other.to_string()),
        };

        if action.as_deref().and_then(Action::from_name).is_none() {
            return Ok(Self::Unknown { action });
        }

        Ok(serde_json::from_value(value)?)
    }

    /// Creates a `send_message` command.
    #[must_use]
    pub fn send_message(message: impl Into<String>) -> Self {
        Self::SendMessage {
            message: Some(message.into()),
            url: None,
            to: None,
        }
    }

    /// Creates a `send_music` command.
    #[must_use]
    pub fn send_music(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self::SendMusic {
            title: Some(title.into()),
            url: Some(url.into()),
        }
    }

    /// Creates a `join_room` command.
    #[must_use]
    pub fn join_room(room_id: impl Into<String>) -> Self {
        Self::JoinRoom {
            room_id: Some(room_id.into()),
        }
    }

    /// The known action, `None` for [`Command::Unknown`].
    #[must_use]
    pub const fn action(&self) -> Option<Action> {
        match self {
            Self::SendMessage { .. } => Some(Action::SendMessage),
            Self::SendMusic { .. } => Some(Action::SendMusic),
            Self::GetUserInfo => Some(Action::GetUserInfo),
            Self::GetRoomInfo => Some(Action::GetRoomInfo),
            Self::JoinRoom { .. } => Some(Action::JoinRoom),
            Self::Unknown { .. } => None,
        }
    }

    /// Returns `true` if answering needs a page call.
    #[inline]
    #[must_use]
    pub const fn acts_on_page(&self) -> bool {
        matches!(self, Self::SendMessage { .. } | Self::SendMusic { .. })
    }

    /// Action name for logging, including unknown ones.
    #[must_use]
    pub fn action_name(&self) -> &str {
        match self {
            Self::Unknown { action } => action.as_deref().unwrap_or("undefined"),
            known => known.action().map(|a| a.as_str()).unwrap_or_default(),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Accepts any scalar as a string parameter.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

// ============================================================================
// Tests
// ============================================================================
