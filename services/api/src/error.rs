//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service, plus the
//! HTTP rejection mapping that turns a `PortError` into a stable
//! `{ error, detail }` JSON body.

use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use interview_core::ports::PortError;
use serde::Serialize;
use utoipa::ToSchema;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// The JSON body returned for every failed request.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    /// Stable machine-readable kind (e.g. "SessionNotFound").
    pub error: String,
    /// Human-readable detail.
    pub detail: String,
}

/// The rejection type used by all REST handlers. Built from a `PortError`
/// so the status mapping lives in exactly one place.
pub struct ApiRejection {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiRejection {
    pub fn new(status: StatusCode, kind: &str, detail: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: kind.to_string(),
                detail: detail.into(),
            },
        }
    }

    pub fn invalid_input(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "InvalidInput", detail)
    }
}

impl From<PortError> for ApiRejection {
    fn from(err: PortError) -> Self {
        let status = match &err {
            PortError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            PortError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            PortError::TurnFailed(_) => StatusCode::BAD_GATEWAY,
            PortError::ParseError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PortError::NoTranscript => StatusCode::CONFLICT,
            PortError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.kind(), err.to_string())
    }
}

impl IntoResponse for ApiRejection {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_errors_map_to_stable_kinds_and_statuses() {
        let cases = [
            (
                PortError::InvalidInput("x".into()),
                StatusCode::BAD_REQUEST,
                "InvalidInput",
            ),
            (
                PortError::SessionNotFound("x".into()),
                StatusCode::NOT_FOUND,
                "SessionNotFound",
            ),
            (
                PortError::TurnFailed("x".into()),
                StatusCode::BAD_GATEWAY,
                "TurnFailed",
            ),
            (
                PortError::ParseError("x".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
                "ParseError",
            ),
            (PortError::NoTranscript, StatusCode::CONFLICT, "NoTranscript"),
        ];
        for (err, status, kind) in cases {
            let rejection = ApiRejection::from(err);
            assert_eq!(rejection.status, status);
            assert_eq!(rejection.body.error, kind);
        }
    }
}
