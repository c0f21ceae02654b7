// HTTP error type.
//
// Store failures are infrastructure errors and map to 500; everything else
// is a problem with the request itself.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use scorebook_core::EventId;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("player number {0} already exists")]
    AlreadyExists(String),

    #[error("no batting record with id {0}")]
    NotFound(EventId),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// JSON body for every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::AlreadyExists(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::AlreadyExists(_) => "already_exists",
            ApiError::NotFound(_) => "not_found",
            ApiError::InvalidInput(_) => "invalid_input",
            ApiError::Store(_) => "store_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Store(e) = &self {
            error!("store error: {e:#}");
        }
        let body = ErrorBody {
            error: self.to_string(),
            code: self.code(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_are_distinct_from_request_errors() {
        let store = ApiError::from(anyhow::anyhow!("disk I/O error"));
        assert_eq!(store.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(store.code(), "store_error");

        let dup = ApiError::AlreadyExists("7".into());
        assert_eq!(dup.status(), StatusCode::CONFLICT);
        assert_eq!(dup.to_string(), "player number 7 already exists");

        assert_eq!(ApiError::NotFound(EventId(3)).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::InvalidInput("bad date".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
