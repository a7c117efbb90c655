//! Connection registry: the authoritative in-memory directory of who is
//! listening to which trip room, and the sole path for room-scoped fanout.
//!
//! Every live connection owns an unbounded mailbox; fanout pushes events
//! onto sibling mailboxes without awaiting, so all registry operations run
//! under one coarse mutex. Expected cardinality (tens of rooms, dozens of
//! members) makes the single lock the simpler trade against per-room
//! locking.
//!
//! ## Invariants
//! - A connection appears in at most one room's collection.
//! - A connection keys the presence map iff it sits in some room.
//! - A room whose collection empties is removed eagerly; no dangling
//!   entries.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::domain::{Presence, RoomId};

use super::messages::ServerEvent;

/// Opaque identity of one live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Sending half of a connection's outbound mailbox, held by the registry.
///
/// The session task drains the receiving half and writes each event onto
/// the WebSocket. Dropping the receiver makes future sends fail, which the
/// fanout loop tolerates.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    outbound: mpsc::UnboundedSender<ServerEvent>,
}

impl ConnectionHandle {
    /// Create a fresh connection handle plus the mailbox receiver the
    /// owning session drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ServerEvent>) {
        let (outbound, mailbox) = mpsc::unbounded_channel();
        (
            Self {
                id: ConnectionId(Uuid::new_v4()),
                outbound,
            },
            mailbox,
        )
    }

    /// Identity of this connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    fn deliver(&self, event: ServerEvent) -> Result<(), mpsc::error::SendError<ServerEvent>> {
        self.outbound.send(event)
    }
}

#[derive(Default)]
struct RegistryInner {
    /// Room membership in join order; order matters only for iteration.
    rooms: HashMap<RoomId, Vec<ConnectionHandle>>,
    presences: HashMap<ConnectionId, Presence>,
}

/// Process-wide registry of live chat connections.
///
/// Constructed once at startup and injected into the session adapter;
/// tests instantiate isolated registries per case.
#[derive(Default)]
pub struct ConnectionRegistry {
    inner: Mutex<RegistryInner>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        // A poisoning panic cannot leave the maps structurally broken, so
        // recover the guard instead of propagating the poison.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `connection` in `room` (creating the room if absent) and
    /// announce the join to every other member.
    pub fn join(&self, room: &RoomId, connection: ConnectionHandle, presence: Presence) {
        let mut inner = self.lock();
        let joined = ServerEvent::UserJoined {
            user_id: presence.user_id,
            user_name: presence.user_name.clone(),
            timestamp: Utc::now(),
        };
        inner.presences.insert(connection.id(), presence);
        let members = inner.rooms.entry(*room).or_default();
        let exclude = connection.id();
        members.push(connection);
        Self::fanout(members, &joined, Some(exclude));
    }

    /// Remove `connection` from `room`, dropping the room entry when it
    /// empties, and return the presence that was bound to the connection.
    ///
    /// Does not broadcast; the caller decides whether and what to announce,
    /// and the returned `Option` makes a second leave a no-op.
    pub fn leave(&self, room: &RoomId, connection: ConnectionId) -> Option<Presence> {
        let mut inner = self.lock();
        if let Some(members) = inner.rooms.get_mut(room) {
            members.retain(|member| member.id() != connection);
            if members.is_empty() {
                inner.rooms.remove(room);
            }
        }
        inner.presences.remove(&connection)
    }

    /// Deliver `event` to every connection in `room` except `exclude`.
    /// No-op for unknown rooms.
    pub fn broadcast(&self, room: &RoomId, event: &ServerEvent, exclude: Option<ConnectionId>) {
        let inner = self.lock();
        if let Some(members) = inner.rooms.get(room) {
            Self::fanout(members, event, exclude);
        }
    }

    /// Snapshot of the presences currently in `room`; may be stale the
    /// instant after return.
    pub fn roster(&self, room: &RoomId) -> Vec<Presence> {
        let inner = self.lock();
        inner
            .rooms
            .get(room)
            .map(|members| {
                members
                    .iter()
                    .filter_map(|member| inner.presences.get(&member.id()).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Best-effort fanout: a dead sibling must neither abort delivery to
    /// the rest nor surface to the caller, so the send result is inspected
    /// only to log the discard.
    fn fanout(members: &[ConnectionHandle], event: &ServerEvent, exclude: Option<ConnectionId>) {
        for member in members {
            if Some(member.id()) == exclude {
                continue;
            }
            if member.deliver(event.clone()).is_err() {
                debug!(connection = %member.id(), "discarding event for closed connection");
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn contains_room(&self, room: &RoomId) -> bool {
        self.lock().rooms.contains_key(room)
    }

    #[cfg(test)]
    pub(crate) fn tracked_presences(&self) -> usize {
        self.lock().presences.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use rstest::{fixture, rstest};
    use tokio::sync::mpsc::UnboundedReceiver;

    fn presence(name: &str) -> Presence {
        Presence {
            user_id: UserId::new(Uuid::new_v4()),
            user_name: name.to_owned(),
            user_avatar: None,
        }
    }

    #[fixture]
    fn room() -> RoomId {
        RoomId::new(Uuid::new_v4())
    }

    fn drain(mailbox: &mut UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = mailbox.try_recv() {
            events.push(event);
        }
        events
    }

    #[rstest]
    fn join_announces_to_others_but_not_the_joiner(room: RoomId) {
        let registry = ConnectionRegistry::new();
        let (first, mut first_mailbox) = ConnectionHandle::new();
        let (second, mut second_mailbox) = ConnectionHandle::new();

        registry.join(&room, first, presence("Ana"));
        registry.join(&room, second, presence("Ben"));

        let seen = drain(&mut first_mailbox);
        assert_eq!(seen.len(), 1);
        assert!(matches!(
            &seen[0],
            ServerEvent::UserJoined { user_name, .. } if user_name == "Ben"
        ));
        assert!(drain(&mut second_mailbox).is_empty());
    }

    #[rstest]
    fn roster_tracks_join_leave_symmetry(room: RoomId) {
        let registry = ConnectionRegistry::new();
        let (first, _first_mailbox) = ConnectionHandle::new();
        let (second, _second_mailbox) = ConnectionHandle::new();
        let first_id = first.id();

        registry.join(&room, first, presence("Ana"));
        registry.join(&room, second, presence("Ben"));
        assert_eq!(registry.roster(&room).len(), 2);

        let left = registry.leave(&room, first_id);
        assert_eq!(left.map(|p| p.user_name), Some("Ana".to_owned()));
        let roster = registry.roster(&room);
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].user_name, "Ben");
    }

    #[rstest]
    fn last_leave_removes_the_room_entry(room: RoomId) {
        let registry = ConnectionRegistry::new();
        let (only, _mailbox) = ConnectionHandle::new();
        let only_id = only.id();

        registry.join(&room, only, presence("Ana"));
        assert!(registry.contains_room(&room));

        registry.leave(&room, only_id);
        assert!(registry.roster(&room).is_empty());
        assert!(!registry.contains_room(&room));
        assert_eq!(registry.tracked_presences(), 0);
    }

    #[rstest]
    fn leave_is_idempotent(room: RoomId) {
        let registry = ConnectionRegistry::new();
        let (only, _mailbox) = ConnectionHandle::new();
        let only_id = only.id();
        registry.join(&room, only, presence("Ana"));

        assert!(registry.leave(&room, only_id).is_some());
        assert!(registry.leave(&room, only_id).is_none());
    }

    #[rstest]
    fn broadcast_skips_excluded_and_survives_dead_connections(room: RoomId) {
        let registry = ConnectionRegistry::new();
        let (sender, mut sender_mailbox) = ConnectionHandle::new();
        let (dead, dead_mailbox) = ConnectionHandle::new();
        let (live, mut live_mailbox) = ConnectionHandle::new();
        let sender_id = sender.id();

        registry.join(&room, sender, presence("Ana"));
        registry.join(&room, dead, presence("Ben"));
        registry.join(&room, live, presence("Cy"));
        drop(dead_mailbox);
        drain(&mut sender_mailbox);
        drain(&mut live_mailbox);

        let event = ServerEvent::StopTyping {
            user_id: UserId::new(Uuid::nil()),
        };
        registry.broadcast(&room, &event, Some(sender_id));

        assert!(drain(&mut sender_mailbox).is_empty());
        assert_eq!(drain(&mut live_mailbox), vec![event]);
    }

    #[rstest]
    fn broadcast_to_unknown_room_is_a_noop(room: RoomId) {
        let registry = ConnectionRegistry::new();
        registry.broadcast(
            &room,
            &ServerEvent::StopTyping {
                user_id: UserId::new(Uuid::nil()),
            },
            None,
        );
        assert!(registry.roster(&room).is_empty());
    }
}
