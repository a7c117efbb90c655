//! Wire-level message definitions for the chat WebSocket adapter.
//!
//! Events are closed tagged variants in both directions so the dispatch in
//! the session loop is exhaustiveness-checked; an open map would hide
//! unknown event types until runtime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Presence, StoredMessage, UserId};

/// Close code sent when the connection carried no credential.
pub const CLOSE_MISSING_CREDENTIAL: u16 = 4001;
/// Close code sent when the credential failed verification.
pub const CLOSE_INVALID_CREDENTIAL: u16 = 4002;
/// Close code sent when the user is not a member of the trip.
pub const CLOSE_NOT_A_MEMBER: u16 = 4003;

/// Event received from a connected client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// A chat message. Empty content is accepted at the wire level and
    /// filtered during dispatch.
    Message {
        #[serde(default)]
        content: String,
    },
    /// The client started typing.
    Typing,
    /// The client stopped typing.
    StopTyping,
}

/// Event fanned out to room members.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Roster snapshot sent to a freshly joined connection only.
    OnlineUsers { users: Vec<Presence> },
    /// A member joined the room.
    UserJoined {
        user_id: UserId,
        user_name: String,
        timestamp: DateTime<Utc>,
    },
    /// A member left the room.
    UserLeft {
        user_id: UserId,
        user_name: String,
        timestamp: DateTime<Utc>,
    },
    /// A persisted chat message, broadcast to the whole room including the
    /// sender.
    Message(StoredMessage),
    /// Typing indicator, excluding the sender.
    Typing { user_id: UserId, user_name: String },
    /// Typing indicator cleared, excluding the sender.
    StopTyping { user_id: UserId },
}
