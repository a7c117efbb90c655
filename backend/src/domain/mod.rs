//! Domain primitives, ports, and services.
//!
//! Purpose: define the transport-agnostic core of the trip-planning
//! backend. Inbound adapters translate HTTP/WebSocket traffic into calls on
//! these types; outbound adapters implement the ports in
//! [`ports`].

pub mod chat;
pub mod error;
pub mod ids;
pub mod ports;
pub mod presence;
pub mod suggestions;
pub mod trip;

pub use self::chat::StoredMessage;
pub use self::error::{DomainError, ErrorCode};
pub use self::ids::{RoomId, TripId, UserId};
pub use self::presence::{Presence, UserDisplay, UserProfile};
pub use self::suggestions::SuggestionService;
pub use self::trip::{DEFAULT_MAX_MEMBERS, TripCard, TripRecord, UNKNOWN_LOCATION, UNTITLED_TRIP};
