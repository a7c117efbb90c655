//! Domain ports defining the edges of the hexagon.
//!
//! Ports describe how the domain expects to interact with driven adapters
//! (token verification, membership lookups, message persistence, the trip
//! catalogue). Each trait exposes strongly typed errors so adapters map
//! their failures into predictable variants instead of returning
//! `anyhow::Result`.

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;

use super::{RoomId, StoredMessage, TripId, TripRecord, UserDisplay, UserId, UserProfile};

/// Claims extracted from a verified access credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    /// The acting user the credential was issued to.
    pub user_id: UserId,
}

/// Errors surfaced by [`TokenVerifier`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The credential is malformed, expired, or fails signature checks.
    #[error("credential rejected: {message}")]
    Rejected { message: String },
    /// The verifier itself could not run (key material missing, upstream
    /// identity provider down).
    #[error("token verifier unavailable: {message}")]
    Unavailable { message: String },
}

impl TokenError {
    /// Helper for rejected credentials.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Helper for verifier outages.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Errors surfaced by [`MembershipOracle`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MembershipError {
    /// Backing store could not be reached.
    #[error("membership lookup connection failed: {message}")]
    Connection { message: String },
    /// Lookup ran but failed.
    #[error("membership lookup failed: {message}")]
    Query { message: String },
}

impl MembershipError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Errors surfaced by [`MessageStore`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageStoreError {
    /// Backing store could not be reached.
    #[error("message store connection failed: {message}")]
    Connection { message: String },
    /// The write itself failed.
    #[error("message write failed: {message}")]
    Write { message: String },
}

impl MessageStoreError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for write failures.
    pub fn write(message: impl Into<String>) -> Self {
        Self::Write {
            message: message.into(),
        }
    }
}

/// Errors surfaced by [`UserDirectory`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    /// Backing store could not be reached.
    #[error("user directory connection failed: {message}")]
    Connection { message: String },
    /// Lookup ran but failed.
    #[error("user directory lookup failed: {message}")]
    Query { message: String },
}

impl DirectoryError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Errors surfaced by [`TripCatalogue`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogueError {
    /// Backing store could not be reached.
    #[error("trip catalogue connection failed: {message}")]
    Connection { message: String },
    /// Query ran but failed.
    #[error("trip catalogue query failed: {message}")]
    Query { message: String },
}

impl CatalogueError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Validates a bearer credential and returns the claims it carries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify `token` and extract its claims.
    async fn verify(&self, token: &str) -> Result<AccessClaims, TokenError>;
}

/// Answers whether a user belongs to a trip's room.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MembershipOracle: Send + Sync {
    /// True when `user_id` holds a membership record for the trip behind
    /// `room`.
    async fn is_member(&self, user_id: &UserId, room: &RoomId) -> Result<bool, MembershipError>;
}

/// Persists chat messages and returns the stored record with sender
/// metadata resolved.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist one message sent to `room` by `sender`.
    async fn persist(
        &self,
        room: &RoomId,
        sender: &UserId,
        content: &str,
    ) -> Result<StoredMessage, MessageStoreError>;
}

/// Read access to user display metadata and ranking profiles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Display metadata for presence payloads; `None` when the user no
    /// longer exists.
    async fn display(&self, user_id: &UserId) -> Result<Option<UserDisplay>, DirectoryError>;

    /// Profile signals for suggestion ranking; `None` when the user no
    /// longer exists.
    async fn profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, DirectoryError>;
}

/// Read access to the trip catalogue for suggestion ranking.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TripCatalogue: Send + Sync {
    /// Every trip currently known, with member counts resolved.
    async fn list_all(&self) -> Result<Vec<TripRecord>, CatalogueError>;

    /// Identifiers of the trips `user_id` has already joined.
    async fn joined_trip_ids(&self, user_id: &UserId) -> Result<HashSet<TripId>, CatalogueError>;
}
