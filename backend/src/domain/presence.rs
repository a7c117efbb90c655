//! Presence and user read models.
//!
//! A [`Presence`] is the public identity attached to one live chat
//! connection. It exists only for the lifetime of that connection and is
//! never persisted. The field names form part of the wire contract: the
//! `online_users` payload serialises a list of presences verbatim.

use serde::{Deserialize, Serialize};

use super::UserId;

/// Public identity metadata bound to a live connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presence {
    pub user_id: UserId,
    pub user_name: String,
    pub user_avatar: Option<String>,
}

/// Display metadata resolved from the user directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDisplay {
    pub display_name: Option<String>,
    pub email: String,
    pub avatar_url: Option<String>,
}

impl UserDisplay {
    /// Name shown to other room members; falls back to the email address
    /// when no display name is set.
    pub fn presence_name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(self.email.as_str())
    }

    /// Build the presence for a live connection.
    pub fn into_presence(self, user_id: UserId) -> Presence {
        let user_name = self.presence_name().to_owned();
        Presence {
            user_id,
            user_name,
            user_avatar: self.avatar_url,
        }
    }
}

/// Profile signals the suggestion ranker scores against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    /// Interest tags, free-form strings compared case-insensitively.
    pub interests: Vec<String>,
    /// Personality label, e.g. "chill".
    pub personality: Option<String>,
    /// Home location string, e.g. "Austin, TX".
    pub location: Option<String>,
}
