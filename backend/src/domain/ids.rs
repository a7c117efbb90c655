//! Identifier newtypes shared across the domain.
//!
//! Identities are opaque UUIDs here; validation happens where the records
//! live (the external persistence collaborators), so these wrappers only
//! guard against mixing identifier kinds at compile time.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
            utoipa::ToSchema,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Wrap an existing UUID.
            pub fn new(value: Uuid) -> Self {
                Self(value)
            }

            /// Borrow the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_id! {
    /// Identity of a registered user.
    UserId
}

uuid_id! {
    /// Identity of a trip entity.
    TripId
}

uuid_id! {
    /// Identity of a trip's chat room. Rooms are 1:1 with trips, so a room
    /// identifier is the trip identifier under a different hat.
    RoomId
}

impl From<TripId> for RoomId {
    fn from(value: TripId) -> Self {
        Self(*value.as_uuid())
    }
}

impl RoomId {
    /// The trip this room belongs to.
    pub fn trip_id(&self) -> TripId {
        TripId::new(self.0)
    }
}
