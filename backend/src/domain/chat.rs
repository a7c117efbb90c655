//! Chat message record returned by the message store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{TripId, UserId};

/// A persisted chat message with the sender's metadata attached.
///
/// This is the single source of truth a `message` broadcast carries: every
/// client in the room, the sender included, renders from this record rather
/// than from its own optimistic copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: Uuid,
    pub trip_id: TripId,
    pub sender_id: UserId,
    pub sender_name: Option<String>,
    pub sender_avatar: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
