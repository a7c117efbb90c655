//! Trip API handlers.
//!
//! ```text
//! GET /api/v1/trips/suggested?limit=10
//! Authorization: Bearer <token>
//! ```

use actix_web::http::header::AUTHORIZATION;
use actix_web::{HttpRequest, HttpResponse, get, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::ports::{DirectoryError, TokenError};
use crate::domain::{DomainError, UserId, UserProfile};
use crate::inbound::http::error::ApiResult;
use crate::inbound::http::state::HttpState;

/// Default number of suggestions returned when the client names no limit.
const DEFAULT_SUGGESTION_LIMIT: usize = 10;

/// Query parameters for `GET /api/v1/trips/suggested`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct SuggestedTripsQuery {
    /// Maximum number of trips to return (default 10).
    pub limit: Option<usize>,
}

/// Personalised trip suggestions for the authenticated user.
#[utoipa::path(
    get,
    path = "/api/v1/trips/suggested",
    params(SuggestedTripsQuery),
    responses(
        (status = 200, description = "Ranked trip suggestions", body = [crate::domain::TripCard]),
        (status = 401, description = "Missing or invalid bearer token", body = crate::domain::DomainError),
        (status = 503, description = "Trip catalogue unavailable", body = crate::domain::DomainError)
    ),
    tags = ["trips"],
    operation_id = "suggestedTrips"
)]
#[get("/trips/suggested")]
pub async fn suggested_trips(
    state: web::Data<HttpState>,
    req: HttpRequest,
    query: web::Query<SuggestedTripsQuery>,
) -> ApiResult<HttpResponse> {
    let user_id = authenticate(&state, &req).await?;
    let profile = resolve_profile(&state, &user_id).await?;
    let limit = query.limit.unwrap_or(DEFAULT_SUGGESTION_LIMIT);

    let cards = state.suggestions.suggest(&user_id, &profile, limit).await?;
    Ok(HttpResponse::Ok().json(cards))
}

/// Extract and verify the bearer credential on a request.
async fn authenticate(state: &HttpState, req: &HttpRequest) -> Result<UserId, DomainError> {
    let token = bearer_token(req)
        .ok_or_else(|| DomainError::unauthorized("missing bearer token"))?;
    let claims = state.verifier.verify(token).await.map_err(|error| match error {
        TokenError::Rejected { .. } => DomainError::unauthorized("invalid bearer token"),
        TokenError::Unavailable { message } => {
            DomainError::service_unavailable(format!("token verifier unavailable: {message}"))
        }
    })?;
    Ok(claims.user_id)
}

async fn resolve_profile(state: &HttpState, user_id: &UserId) -> Result<UserProfile, DomainError> {
    state
        .directory
        .profile(user_id)
        .await
        .map_err(|error| match error {
            DirectoryError::Connection { message } => {
                DomainError::service_unavailable(format!("user directory unavailable: {message}"))
            }
            DirectoryError::Query { message } => {
                DomainError::internal(format!("user directory error: {message}"))
            }
        })?
        .ok_or_else(|| DomainError::unauthorized("account no longer exists"))
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
