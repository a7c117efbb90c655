//! Trip read models used by the suggestion ranker.
//!
//! [`TripRecord`] mirrors what the catalogue collaborator can actually
//! guarantee: integrity-sensitive fields are optional because upstream data
//! may be partial, and the ranker filters such records out before scoring.
//! [`TripCard`] is the presentation row returned to clients, with defensive
//! defaults substituted for anything still absent.

use serde::Serialize;
use utoipa::ToSchema;

use super::TripId;

/// Placeholder title for trips whose title is missing upstream.
pub const UNTITLED_TRIP: &str = "Untitled Trip";
/// Placeholder location for trips whose location is missing upstream.
pub const UNKNOWN_LOCATION: &str = "Unknown Location";
/// Default capacity when a trip record carries none.
pub const DEFAULT_MAX_MEMBERS: u32 = 8;

/// Catalogue snapshot of one trip, as returned by the persistence
/// collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripRecord {
    pub id: TripId,
    pub title: Option<String>,
    pub location: Option<String>,
    pub duration: Option<String>,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
    /// Free-form "vibe" descriptor matched against a user's personality.
    pub vibe: Option<String>,
    pub max_members: Option<u32>,
    /// Current membership count, used as a popularity signal.
    pub member_count: u32,
}

impl TripRecord {
    /// Whether the record carries every field the response contract
    /// requires. Malformed records must never reach clients.
    pub fn is_complete(&self) -> bool {
        let filled = |value: &Option<String>| {
            value
                .as_deref()
                .is_some_and(|text| !text.trim().is_empty())
        };
        filled(&self.title) && filled(&self.location) && self.max_members.is_some()
    }
}

/// Trip row shaped for list responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TripCard {
    pub id: TripId,
    #[schema(example = "Coastal camping weekend")]
    pub title: String,
    #[schema(example = "Austin, TX")]
    pub location: String,
    pub duration: Option<String>,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
    pub member_count: u32,
    pub max_members: u32,
    pub is_member: bool,
}

impl TripCard {
    /// Build a card from a catalogue record, substituting presentation
    /// defaults for absent fields.
    pub fn from_record(record: TripRecord, is_member: bool) -> Self {
        Self {
            id: record.id,
            title: record.title.unwrap_or_else(|| UNTITLED_TRIP.to_owned()),
            location: record
                .location
                .unwrap_or_else(|| UNKNOWN_LOCATION.to_owned()),
            duration: record.duration,
            image_url: record.image_url,
            tags: record.tags,
            member_count: record.member_count,
            max_members: record.max_members.unwrap_or(DEFAULT_MAX_MEMBERS),
            is_member,
        }
    }
}
