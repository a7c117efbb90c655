//! Trip suggestion ranking.
//!
//! Scores every eligible trip for a requesting user against their profile
//! signals and orders the result for presentation. Scoring is additive and
//! intentionally simple: tag overlap dominates, vibe and location matches
//! add fixed boosts, and popularity breaks ties.
//!
//! All string comparisons are case-insensitive. The sort must be stable so
//! equal-score candidates keep catalogue scan order.

use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use super::ports::{CatalogueError, TripCatalogue};
use super::{DomainError, TripCard, TripRecord, UserId, UserProfile};

/// Points per tag shared between the user's interests and the trip's tags.
const TAG_OVERLAP_WEIGHT: i64 = 10;
/// Boost for a bidirectional personality/vibe substring match.
const VIBE_MATCH_WEIGHT: i64 = 15;
/// Boost for a bidirectional home-location/trip-location substring match.
const LOCATION_MATCH_WEIGHT: i64 = 30;
/// Points per current member, a weak popularity tie-break.
const POPULARITY_WEIGHT: i64 = 2;

/// Lowercased profile signals, normalised once per ranking pass.
struct ProfileSignals {
    interests: HashSet<String>,
    personality: String,
    location: String,
}

impl ProfileSignals {
    fn from_profile(profile: &UserProfile) -> Self {
        Self {
            interests: profile
                .interests
                .iter()
                .map(|tag| tag.to_lowercase())
                .collect(),
            personality: profile
                .personality
                .as_deref()
                .unwrap_or_default()
                .to_lowercase(),
            location: profile
                .location
                .as_deref()
                .unwrap_or_default()
                .to_lowercase(),
        }
    }
}

struct ScoredCandidate {
    record: TripRecord,
    score: i64,
}

/// Ranks a user's candidate trips by predicted relevance.
#[derive(Clone)]
pub struct SuggestionService {
    catalogue: Arc<dyn TripCatalogue>,
}

impl SuggestionService {
    /// Create a service over the given catalogue port.
    pub fn new(catalogue: Arc<dyn TripCatalogue>) -> Self {
        Self { catalogue }
    }

    /// Produce up to `limit` trips the user has not joined, ranked by
    /// descending score with catalogue scan order breaking ties.
    pub async fn suggest(
        &self,
        user_id: &UserId,
        profile: &UserProfile,
        limit: usize,
    ) -> Result<Vec<TripCard>, DomainError> {
        let trips = self
            .catalogue
            .list_all()
            .await
            .map_err(map_catalogue_error)?;
        let joined = self
            .catalogue
            .joined_trip_ids(user_id)
            .await
            .map_err(map_catalogue_error)?;

        let signals = ProfileSignals::from_profile(profile);
        let mut candidates: Vec<ScoredCandidate> = trips
            .into_iter()
            .filter(|trip| !joined.contains(&trip.id))
            // Data-integrity filter: partial upstream records never reach
            // the response.
            .filter(TripRecord::is_complete)
            .map(|record| {
                let score = score_trip(&signals, &record);
                ScoredCandidate { record, score }
            })
            .collect();

        // `sort_by_key` is stable, so equal scores preserve scan order.
        candidates.sort_by_key(|candidate| Reverse(candidate.score));
        candidates.truncate(limit);

        debug!(user_id = %user_id, returned = candidates.len(), "ranked trip suggestions");
        Ok(candidates
            .into_iter()
            .map(|candidate| TripCard::from_record(candidate.record, false))
            .collect())
    }
}

fn map_catalogue_error(error: CatalogueError) -> DomainError {
    match error {
        CatalogueError::Connection { message } => {
            DomainError::service_unavailable(format!("trip catalogue unavailable: {message}"))
        }
        CatalogueError::Query { message } => {
            DomainError::internal(format!("trip catalogue error: {message}"))
        }
    }
}

/// Additive relevance score for one eligible trip.
fn score_trip(signals: &ProfileSignals, trip: &TripRecord) -> i64 {
    let mut score = 0;

    let overlap = trip
        .tags
        .iter()
        .map(|tag| tag.to_lowercase())
        .filter(|tag| signals.interests.contains(tag))
        .collect::<HashSet<_>>()
        .len();
    score += i64::try_from(overlap).unwrap_or(i64::MAX) * TAG_OVERLAP_WEIGHT;

    let vibe = trip.vibe.as_deref().unwrap_or_default().to_lowercase();
    if substring_match(&signals.personality, &vibe) {
        score += VIBE_MATCH_WEIGHT;
    }

    let location = trip.location.as_deref().unwrap_or_default().to_lowercase();
    if substring_match(&signals.location, &location) {
        score += LOCATION_MATCH_WEIGHT;
    }

    score += i64::from(trip.member_count) * POPULARITY_WEIGHT;
    score
}

/// Bidirectional substring affinity; both sides must be non-empty.
fn substring_match(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TripId;
    use crate::domain::ports::MockTripCatalogue;
    use rstest::rstest;
    use uuid::Uuid;

    fn trip(
        id: TripId,
        title: &str,
        location: &str,
        tags: &[&str],
        vibe: &str,
        members: u32,
    ) -> TripRecord {
        TripRecord {
            id,
            title: Some(title.to_owned()),
            location: Some(location.to_owned()),
            duration: None,
            image_url: None,
            tags: tags.iter().map(|t| (*t).to_owned()).collect(),
            vibe: (!vibe.is_empty()).then(|| vibe.to_owned()),
            max_members: Some(10),
            member_count: members,
        }
    }

    fn profile() -> UserProfile {
        UserProfile {
            interests: vec!["hiking".into(), "food".into()],
            personality: Some("chill".into()),
            location: Some("austin".into()),
        }
    }

    fn service(trips: Vec<TripRecord>, joined: HashSet<TripId>) -> SuggestionService {
        let mut catalogue = MockTripCatalogue::new();
        catalogue
            .expect_list_all()
            .returning(move || Ok(trips.clone()));
        catalogue
            .expect_joined_trip_ids()
            .returning(move |_| Ok(joined.clone()));
        SuggestionService::new(Arc::new(catalogue))
    }

    fn requester() -> UserId {
        UserId::new(Uuid::new_v4())
    }

    #[rstest]
    #[actix_rt::test]
    async fn matching_trip_outranks_popular_mismatch() {
        let a = TripId::new(Uuid::new_v4());
        let b = TripId::new(Uuid::new_v4());
        // A scores 10 (hiking) + 15 (vibe) + 30 (location) + 10 (5 members).
        // B scores only popularity: 40.
        let trips = vec![
            trip(b, "Tokyo nights", "Tokyo", &[], "intense", 20),
            trip(a, "Hill country hike", "Austin, TX", &["hiking", "culture"], "chill", 5),
        ];
        let cards = service(trips, HashSet::new())
            .suggest(&requester(), &profile(), 10)
            .await
            .expect("ranking succeeds");

        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].id, a);
        assert_eq!(cards[1].id, b);
    }

    #[rstest]
    #[actix_rt::test]
    async fn joined_trips_never_appear() {
        let joined_id = TripId::new(Uuid::new_v4());
        let other = TripId::new(Uuid::new_v4());
        let trips = vec![
            trip(joined_id, "Joined", "Austin", &["hiking"], "chill", 50),
            trip(other, "Other", "Nowhere", &[], "", 0),
        ];
        let cards = service(trips, HashSet::from([joined_id]))
            .suggest(&requester(), &profile(), 10)
            .await
            .expect("ranking succeeds");

        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].id, other);
    }

    #[rstest]
    #[actix_rt::test]
    async fn incomplete_records_are_filtered() {
        let complete = TripId::new(Uuid::new_v4());
        let mut missing_title = trip(TripId::new(Uuid::new_v4()), "x", "Austin", &[], "", 0);
        missing_title.title = None;
        let mut missing_capacity = trip(TripId::new(Uuid::new_v4()), "y", "Austin", &[], "", 0);
        missing_capacity.max_members = None;
        let trips = vec![
            missing_title,
            trip(complete, "Complete", "Austin", &[], "", 0),
            missing_capacity,
        ];
        let cards = service(trips, HashSet::new())
            .suggest(&requester(), &profile(), 10)
            .await
            .expect("ranking succeeds");

        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].id, complete);
    }

    #[rstest]
    #[actix_rt::test]
    async fn equal_scores_keep_scan_order_and_limit_truncates() {
        let ids: Vec<TripId> = (0..4).map(|_| TripId::new(Uuid::new_v4())).collect();
        let trips = ids
            .iter()
            .map(|id| trip(*id, "Same", "Elsewhere", &[], "", 3))
            .collect();
        let cards = service(trips, HashSet::new())
            .suggest(&requester(), &profile(), 3)
            .await
            .expect("ranking succeeds");

        assert_eq!(cards.len(), 3);
        let returned: Vec<TripId> = cards.iter().map(|card| card.id).collect();
        assert_eq!(returned, ids[..3]);
    }

    #[rstest]
    #[case("chill", "chill evenings", true)]
    #[case("chill evenings", "chill", true)]
    #[case("", "chill", false)]
    #[case("chill", "", false)]
    #[case("chill", "intense", false)]
    fn substring_affinity_is_bidirectional(
        #[case] a: &str,
        #[case] b: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(substring_match(a, b), expected);
    }

    #[rstest]
    #[actix_rt::test]
    async fn catalogue_outage_maps_to_service_unavailable() {
        let mut catalogue = MockTripCatalogue::new();
        catalogue
            .expect_list_all()
            .returning(|| Err(CatalogueError::connection("refused")));
        let error = SuggestionService::new(Arc::new(catalogue))
            .suggest(&requester(), &profile(), 10)
            .await
            .expect_err("outage surfaces");
        assert_eq!(error.code(), crate::domain::ErrorCode::ServiceUnavailable);
    }
}
