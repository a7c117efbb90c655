//! WebSocket inbound adapter for per-trip chat rooms.
//!
//! Responsibilities:
//! - upgrade `GET /ws/trips/{trip_id}` requests and hand the connection to
//!   a session task
//! - keep WebSocket-specific concerns (framing, close codes, heartbeats)
//!   at the edge of the system
//!
//! The credential travels as a `token` query parameter because browser
//! WebSocket clients cannot set an `Authorization` header on the upgrade
//! request.

use actix_web::web::{self, Payload};
use actix_web::{HttpRequest, HttpResponse, get};
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use crate::domain::RoomId;

mod session;

pub mod messages;
pub mod registry;
pub mod state;

/// Connection-initiation parameters.
#[derive(Debug, Deserialize)]
pub struct ChatQuery {
    /// Bearer credential; absence is detected after the upgrade so the
    /// rejection reaches the client as a close frame.
    token: Option<String>,
}

/// Handle WebSocket upgrade for a trip's chat room.
#[get("/ws/trips/{trip_id}")]
pub async fn chat_entry(
    state: web::Data<state::WsState>,
    path: web::Path<Uuid>,
    query: web::Query<ChatQuery>,
    req: HttpRequest,
    body: Payload,
) -> actix_web::Result<HttpResponse> {
    let room = RoomId::new(path.into_inner());
    let (response, session, stream) = actix_ws::handle(&req, body).inspect_err(|err| {
        error!(room = %room, error = %err, "WebSocket upgrade failed");
    })?;

    actix_web::rt::spawn(session::run_chat_session(
        state.get_ref().clone(),
        room,
        query.into_inner().token,
        session,
        stream,
    ));

    Ok(response)
}
