//! Backend entry-point: wires REST endpoints, the chat WebSocket, and
//! OpenAPI docs over in-memory port implementations.

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::{App, HttpServer};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use uuid::Uuid;

use backend::Trace;
use backend::domain::{TripId, UserDisplay, UserId, UserProfile};
use backend::outbound::auth::{JwtTokenVerifier, mint_token};
use backend::outbound::memory::{InMemoryDirectory, TripSeed, UserSeed};
use backend::server::{AppState, Ports, configure_app};

/// Trip-planning backend server.
#[derive(Debug, Parser)]
#[command(name = "backend")]
struct Cli {
    /// Socket address to bind.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    bind: SocketAddr,

    /// Seed demo users and trips and log credentials for them.
    #[arg(long)]
    demo: bool,
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let cli = Cli::parse();
    let secret = jwt_secret()?;

    let store = Arc::new(InMemoryDirectory::new());
    if cli.demo {
        seed_demo(&store, &secret);
    }

    let state = AppState::new(Ports {
        verifier: Arc::new(JwtTokenVerifier::new(secret.as_bytes())),
        membership: Arc::clone(&store) as _,
        messages: Arc::clone(&store) as _,
        directory: Arc::clone(&store) as _,
        catalogue: store,
    });
    let health = state.health.clone();

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Trace)
            .configure(|cfg| configure_app(cfg, &state))
    })
    .bind(cli.bind)?;

    // Fail liveness as soon as shutdown starts so load balancers drain us.
    let draining = health.clone();
    actix_web::rt::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            draining.mark_unhealthy();
        }
    });

    health.mark_ready();
    server.run().await
}

/// Resolve the JWT signing secret.
///
/// Order: `JWT_SECRET`, then the file named by `JWT_SECRET_FILE` (default
/// `/var/run/secrets/jwt_secret`). Debug builds, or any build with
/// `JWT_ALLOW_EPHEMERAL=1`, fall back to a generated secret so local runs
/// work without provisioning.
fn jwt_secret() -> std::io::Result<String> {
    if let Ok(secret) = env::var("JWT_SECRET")
        && !secret.is_empty()
    {
        return Ok(secret);
    }

    let path = env::var("JWT_SECRET_FILE").unwrap_or_else(|_| "/var/run/secrets/jwt_secret".into());
    match std::fs::read_to_string(&path) {
        Ok(secret) => Ok(secret.trim().to_owned()),
        Err(e) => {
            let allow_dev = env::var("JWT_ALLOW_EPHEMERAL").ok().as_deref() == Some("1");
            if cfg!(debug_assertions) || allow_dev {
                warn!(path = %path, error = %e, "using ephemeral JWT secret (dev only)");
                Ok(format!(
                    "{}{}",
                    Uuid::new_v4().simple(),
                    Uuid::new_v4().simple()
                ))
            } else {
                Err(std::io::Error::other(format!(
                    "failed to read JWT secret at {path}: {e}"
                )))
            }
        }
    }
}

/// Populate the in-memory store with two users sharing one trip, and log
/// bearer tokens for both so the API and chat can be exercised by hand.
fn seed_demo(store: &InMemoryDirectory, secret: &str) {
    let ana = UserId::new(Uuid::new_v4());
    let ben = UserId::new(Uuid::new_v4());
    store.insert_user(
        ana,
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
    store.insert_user(
        ben,
        UserSeed {
            display: UserDisplay {
                display_name: None,
                email: "ben@example.com".into(),
                avatar_url: None,
            },
            profile: UserProfile::default(),
        },
    );

    let shared = TripSeed {
        id: TripId::new(Uuid::new_v4()),
        title: Some("Hill country camping".into()),
        location: Some("Austin, TX".into()),
        duration: Some("3 days".into()),
        image_url: None,
        tags: vec!["hiking".into(), "camping".into()],
        vibe: Some("chill".into()),
        max_members: Some(8),
    };
    let open = TripSeed {
        id: TripId::new(Uuid::new_v4()),
        title: Some("Tokyo food crawl".into()),
        location: Some("Tokyo".into()),
        duration: Some("5 days".into()),
        image_url: None,
        tags: vec!["food".into()],
        vibe: Some("intense".into()),
        max_members: Some(12),
    };
    let shared_id = shared.id;
    store.insert_trip(shared);
    store.insert_trip(open);
    store.add_member(shared_id, ana);
    store.add_member(shared_id, ben);

    let ttl = chrono::Duration::hours(12);
    for (name, user_id) in [("ana", ana), ("ben", ben)] {
        match mint_token(secret.as_bytes(), &user_id, ttl) {
            Ok(token) => info!(user = name, %user_id, token, "demo credential"),
            Err(e) => warn!(user = name, error = %e, "demo token minting failed"),
        }
    }
    info!(trip_id = %shared_id, "demo trip with both members seeded");
}
