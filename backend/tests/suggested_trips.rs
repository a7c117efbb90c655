//! End-to-end tests for `GET /api/v1/trips/suggested` over the in-memory
//! adapters, exercising the same application assembly the binary uses.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, test};
use chrono::Duration;
use rstest::rstest;
use serde_json::Value;
use uuid::Uuid;

use backend::Trace;
use backend::domain::{TripId, UserDisplay, UserId, UserProfile};
use backend::outbound::auth::{JwtTokenVerifier, mint_token};
use backend::outbound::memory::{InMemoryDirectory, TripSeed, UserSeed};
use backend::server::{AppState, Ports, configure_app};

const SECRET: &[u8] = b"integration-test-secret";

struct Fixture {
    store: Arc<InMemoryDirectory>,
    state: AppState,
}

fn fixture() -> Fixture {
    let store = Arc::new(InMemoryDirectory::new());
    let state = AppState::new(Ports {
        verifier: Arc::new(JwtTokenVerifier::new(SECRET)),
        membership: Arc::clone(&store) as _,
        messages: Arc::clone(&store) as _,
        directory: Arc::clone(&store) as _,
        catalogue: Arc::clone(&store) as _,
    });
    Fixture { store, state }
}

fn seed_user(store: &InMemoryDirectory) -> UserId {
    let user = UserId::new(Uuid::new_v4());
    store.insert_user(
        user,
        UserSeed {
            display: UserDisplay {
                display_name: Some("Ana".into()),
                email: "ana@example.com".into(),
                avatar_url: None,
            },
            profile: UserProfile {
                interests: vec!["hiking".into(), "food".into()],
                personality: Some("chill".into()),
                location: Some("austin".into()),
            },
        },
    );
    user
}

fn trip(title: &str, location: &str, tags: &[&str], vibe: &str, max: u32) -> TripSeed {
    TripSeed {
        id: TripId::new(Uuid::new_v4()),
        title: Some(title.into()),
        location: Some(location.into()),
        duration: None,
        image_url: None,
        tags: tags.iter().map(|&t| t.into()).collect(),
        vibe: Some(vibe.into()),
        max_members: Some(max),
    }
}

fn fill_members(store: &InMemoryDirectory, trip_id: TripId, count: usize) {
    for _ in 0..count {
        store.add_member(trip_id, UserId::new(Uuid::new_v4()));
    }
}

fn bearer(user: &UserId) -> String {
    let token = mint_token(SECRET, user, Duration::hours(1)).expect("mint token");
    format!("Bearer {token}")
}

#[rstest]
#[actix_rt::test]
async fn ranks_profile_matches_above_popular_strangers() {
    let fx = fixture();
    let user = seed_user(&fx.store);

    // Matches tags, vibe, and location, with 5 members: 10 + 15 + 30 + 10.
    let matched = trip(
        "Hill country camping",
        "Austin, TX",
        &["hiking", "culture"],
        "chill",
        8,
    );
    // No profile overlap, 20 members: 40.
    let popular = trip("Neon nights", "Tokyo", &[], "intense", 30);
    let (matched_id, popular_id) = (matched.id, popular.id);
    fx.store.insert_trip(popular);
    fx.store.insert_trip(matched);
    fill_members(&fx.store, matched_id, 5);
    fill_members(&fx.store, popular_id, 20);

    let app = test::init_service(
        App::new()
            .wrap(Trace)
            .configure(|cfg| configure_app(cfg, &fx.state)),
    )
    .await;
    let req = test::TestRequest::get()
        .uri("/api/v1/trips/suggested")
        .insert_header(("Authorization", bearer(&user)))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = test::read_body_json(res).await;
    let cards = body.as_array().expect("array body");
    assert_eq!(cards.len(), 2);
    assert_eq!(cards[0]["id"], matched_id.to_string());
    assert_eq!(cards[1]["id"], popular_id.to_string());
    assert_eq!(cards[0]["is_member"], false);
}

#[rstest]
#[actix_rt::test]
async fn excludes_joined_trips_and_honours_limit() {
    let fx = fixture();
    let user = seed_user(&fx.store);

    let joined = trip("Already going", "Austin, TX", &["hiking"], "chill", 8);
    let first = trip("Coast walk", "Lisbon", &["hiking"], "chill", 8);
    let second = trip("Night market", "Taipei", &["food"], "chill", 8);
    let joined_id = joined.id;
    let first_id = first.id;
    fx.store.insert_trip(joined);
    fx.store.insert_trip(first);
    fx.store.insert_trip(second);
    fx.store.add_member(joined_id, user);

    let app = test::init_service(
        App::new()
            .wrap(Trace)
            .configure(|cfg| configure_app(cfg, &fx.state)),
    )
    .await;
    let req = test::TestRequest::get()
        .uri("/api/v1/trips/suggested?limit=1")
        .insert_header(("Authorization", bearer(&user)))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = test::read_body_json(res).await;
    let cards = body.as_array().expect("array body");
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0]["id"], first_id.to_string());
}

#[rstest]
#[case::missing_header(None)]
#[case::malformed_token(Some("Bearer not-a-jwt"))]
#[actix_rt::test]
async fn rejects_absent_or_invalid_credentials(#[case] header: Option<&str>) {
    let fx = fixture();
    seed_user(&fx.store);

    let app = test::init_service(
        App::new()
            .wrap(Trace)
            .configure(|cfg| configure_app(cfg, &fx.state)),
    )
    .await;
    let mut req = test::TestRequest::get().uri("/api/v1/trips/suggested");
    if let Some(value) = header {
        req = req.insert_header(("Authorization", value));
    }
    let res = test::call_service(&app, req.to_request()).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["code"], "unauthorized");
    assert!(body["traceId"].is_string());
}

#[rstest]
#[actix_rt::test]
async fn health_probes_report_ready_and_live() {
    let fx = fixture();
    fx.state.health.mark_ready();

    let app = test::init_service(
        App::new()
            .wrap(Trace)
            .configure(|cfg| configure_app(cfg, &fx.state)),
    )
    .await;
    for path in ["/health/ready", "/health/live"] {
        let res =
            test::call_service(&app, test::TestRequest::get().uri(path).to_request()).await;
        assert_eq!(res.status(), StatusCode::OK, "{path}");
    }
}
