//! Command dispatch.
//!
//! Turns inbound frames into page calls and builds the envelope that answers
//! them. The dispatcher is stateless; the event loop answers snapshot and
//! advisory commands in place and runs page sends on their own task.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::page::{ActionExecutor, Delivery, Intent, PageStateProvider};
use crate::protocol::{Action, Command, Envelope, Response};

// ============================================================================
// Constants
// ============================================================================

/// Advisory text when no page entry point could carry out a send.
///
/// The response still reports `success: true`.
pub const UNCONFIRMED_ADVICE: &str = "Simulated send; delivery not confirmed";

// ============================================================================
// CommandDispatcher
// ============================================================================

/// Routes commands to the page collaborators.
pub struct CommandDispatcher {
    state: Arc<dyn PageStateProvider>,
    executor: ActionExecutor,
    room_url: Url,
}

impl CommandDispatcher {
    /// Creates a dispatcher.
    #[must_use]
    pub fn new(state: Arc<dyn PageStateProvider>, executor: ActionExecutor, room_url: Url) -> Self {
        Self {
            state,
            executor,
            room_url,
        }
    }

    /// Handles one raw inbound frame.
    ///
    /// Returns `None` for frames that cannot be parsed; there is nobody to
    /// address a reply to.
    pub async fn handle(&self, frame: &str) -> Option<Envelope> {
        let command = Self::parse(frame)?;
        Some(self.execute(command).await)
    }

    /// Parses one raw inbound frame, logging and dropping what does not parse.
    #[must_use]
    pub fn parse(frame: &str) -> Option<Command> {
        match Command::parse(frame) {
            Ok(command) => Some(command),
            Err(e) => {
                warn!(error = %e, "Dropping unparseable frame");
                None
            }
        }
    }

    /// Executes a parsed command.
    pub async fn execute(&self, command: Command) -> Envelope {
        debug!(action = command.action_name(), "Handling command");

        match command {
            Command::SendMessage { message, url, to } => {
                let intent = Intent::Message {
                    text: message.unwrap_or_default(),
                    url,
                    to,
                };
                self.deliver(Action::SendMessage, &intent).await
            }

            Command::SendMusic { title, url } => {
                let intent = Intent::Music {
                    title: title.unwrap_or_default(),
                    url: url.unwrap_or_default(),
                };
                self.deliver(Action::SendMusic, &intent).await
            }

            Command::GetUserInfo => snapshot(Action::GetUserInfo, &self.state.user_info().await),

            Command::GetRoomInfo => snapshot(Action::GetRoomInfo, &self.state.room_info().await),

            Command::JoinRoom { room_id } => {
                let link = self.room_link(room_id.as_deref().unwrap_or("undefined"));
                Response::advice(
                    Action::JoinRoom,
                    format!("Please open the room link manually: {link}"),
                )
                .into()
            }

            Command::Unknown { action } => {
                let err = Error::unknown_command(action.as_deref().unwrap_or("undefined"));
                warn!(error = %err, "Rejecting command");
                Envelope::error(err.to_string())
            }
        }
    }

    /// Link to a room page.
    #[must_use]
    pub fn room_link(&self, room_id: &str) -> Url {
        let mut link = self.room_url.clone();
        link.query_pairs_mut().clear().append_pair("id", room_id);
        link
    }

    async fn deliver(&self, action: Action, intent: &Intent) -> Envelope {
        let response = match self.executor.execute(intent).await {
            Delivery::Confirmed(data) => Response::data(action, data),
            Delivery::Via(name) => Response::advice(action, format!("Sent via {name}")),
            Delivery::Failed(detail) => {
                warn!(%action, error = %detail, "Page action failed");
                Response::failure(action, detail)
            }
            Delivery::Unconfirmed => Response::advice(action, UNCONFIRMED_ADVICE),
        };
        response.into()
    }
}

/// Wraps a page snapshot as response data.
fn snapshot<T: Serialize>(action: Action, value: &T) -> Envelope {
    match serde_json::to_value(value) {
        Ok(data) => Response::data(action, data),
        Err(e) => Response::failure(action, e.to_string()),
    }
    .into()
}

// ============================================================================
// Tests
// ============================================================================
