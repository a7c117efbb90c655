//! In-memory implementations of the data ports.
//!
//! Backs local runs and tests. The real deployment fronts the account and
//! trip services, which own the persistence; this adapter mirrors their
//! read contracts over plain maps guarded by one mutex.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::ports::{
    CatalogueError, DirectoryError, MembershipError, MembershipOracle, MessageStore,
    MessageStoreError, TripCatalogue, UserDirectory,
};
use crate::domain::{RoomId, StoredMessage, TripId, TripRecord, UserDisplay, UserId, UserProfile};

/// Seed data for one user.
#[derive(Debug, Clone)]
pub struct UserSeed {
    pub display: UserDisplay,
    pub profile: UserProfile,
}

/// Seed data for one trip; member counts come from the membership map.
#[derive(Debug, Clone)]
pub struct TripSeed {
    pub id: TripId,
    pub title: Option<String>,
    pub location: Option<String>,
    pub duration: Option<String>,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
    pub vibe: Option<String>,
    pub max_members: Option<u32>,
}

#[derive(Default)]
struct DirectoryInner {
    users: HashMap<UserId, UserSeed>,
    /// Trips in insertion order; the ranker's tie-break follows scan order.
    trips: Vec<TripSeed>,
    members: HashMap<TripId, Vec<UserId>>,
    messages: Vec<StoredMessage>,
}

/// Mutex-guarded in-memory store implementing all four data ports.
#[derive(Default)]
pub struct InMemoryDirectory {
    inner: Mutex<DirectoryInner>,
}

impl InMemoryDirectory {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, DirectoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a user.
    pub fn insert_user(&self, user_id: UserId, seed: UserSeed) {
        self.lock().users.insert(user_id, seed);
    }

    /// Register a trip.
    pub fn insert_trip(&self, seed: TripSeed) {
        self.lock().trips.push(seed);
    }

    /// Record a trip membership.
    pub fn add_member(&self, trip_id: TripId, user_id: UserId) {
        let mut inner = self.lock();
        let members = inner.members.entry(trip_id).or_default();
        if !members.contains(&user_id) {
            members.push(user_id);
        }
    }

    /// Snapshot of every message persisted so far, in arrival order.
    pub fn messages(&self) -> Vec<StoredMessage> {
        self.lock().messages.clone()
    }
}

#[async_trait]
impl MembershipOracle for InMemoryDirectory {
    async fn is_member(&self, user_id: &UserId, room: &RoomId) -> Result<bool, MembershipError> {
        let inner = self.lock();
        Ok(inner
            .members
            .get(&room.trip_id())
            .is_some_and(|members| members.contains(user_id)))
    }
}

#[async_trait]
impl MessageStore for InMemoryDirectory {
    async fn persist(
        &self,
        room: &RoomId,
        sender: &UserId,
        content: &str,
    ) -> Result<StoredMessage, MessageStoreError> {
        let mut inner = self.lock();
        let sender_seed = inner.users.get(sender);
        let message = StoredMessage {
            id: Uuid::new_v4(),
            trip_id: room.trip_id(),
            sender_id: *sender,
            sender_name: sender_seed.map(|seed| seed.display.presence_name().to_owned()),
            sender_avatar: sender_seed.and_then(|seed| seed.display.avatar_url.clone()),
            content: content.to_owned(),
            created_at: Utc::now(),
        };
        inner.messages.push(message.clone());
        Ok(message)
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn display(&self, user_id: &UserId) -> Result<Option<UserDisplay>, DirectoryError> {
        Ok(self
            .lock()
            .users
            .get(user_id)
            .map(|seed| seed.display.clone()))
    }

    async fn profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, DirectoryError> {
        Ok(self
            .lock()
            .users
            .get(user_id)
            .map(|seed| seed.profile.clone()))
    }
}

#[async_trait]
impl TripCatalogue for InMemoryDirectory {
    async fn list_all(&self) -> Result<Vec<TripRecord>, CatalogueError> {
        let inner = self.lock();
        Ok(inner
            .trips
            .iter()
            .map(|seed| {
                let member_count = inner
                    .members
                    .get(&seed.id)
                    .map_or(0, |members| u32::try_from(members.len()).unwrap_or(u32::MAX));
                TripRecord {
                    id: seed.id,
                    title: seed.title.clone(),
                    location: seed.location.clone(),
                    duration: seed.duration.clone(),
                    image_url: seed.image_url.clone(),
                    tags: seed.tags.clone(),
                    vibe: seed.vibe.clone(),
                    max_members: seed.max_members,
                    member_count,
                }
            })
            .collect())
    }

    async fn joined_trip_ids(&self, user_id: &UserId) -> Result<HashSet<TripId>, CatalogueError> {
        let inner = self.lock();
        Ok(inner
            .members
            .iter()
            .filter(|(_, members)| members.contains(user_id))
            .map(|(trip_id, _)| *trip_id)
            .collect())
    }
}
