//! HTTP error payloads and mapping from domain errors.
//!
//! Keeps the domain free of transport concerns by translating
//! [`DomainError`] into Actix responses here.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;

use crate::domain::{DomainError, ErrorCode};
use crate::middleware::trace::TraceId;

/// Standard error envelope returned by HTTP handlers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    code: ErrorCode,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace_id: Option<String>,
}

impl From<DomainError> for ApiError {
    fn from(value: DomainError) -> Self {
        Self {
            code: value.code(),
            message: value.message().to_owned(),
            trace_id: TraceId::current().as_ref().map(ToString::to_string),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ApiError {}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self.code {
            ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Internal details stay in the logs; clients get a stable envelope.
        if matches!(self.code, ErrorCode::InternalError) {
            let redacted = Self {
                code: self.code,
                message: "Internal server error".to_owned(),
                trace_id: self.trace_id.clone(),
            };
            return HttpResponse::build(self.status_code()).json(redacted);
        }
        HttpResponse::build(self.status_code()).json(self)
    }
}

/// Convenience alias for HTTP handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(DomainError::unauthorized("no token"), StatusCode::UNAUTHORIZED)]
    #[case(DomainError::forbidden("not yours"), StatusCode::FORBIDDEN)]
    #[case(DomainError::service_unavailable("down"), StatusCode::SERVICE_UNAVAILABLE)]
    #[case(DomainError::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
    fn maps_domain_codes_to_statuses(#[case] error: DomainError, #[case] expected: StatusCode) {
        assert_eq!(ApiError::from(error).status_code(), expected);
    }

    #[rstest]
    fn redacts_internal_messages() {
        let error = ApiError::from(DomainError::internal("secret pool name leaked"));
        let response = error.error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
