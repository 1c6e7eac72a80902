//! Maps handler failures onto `{"error": ...}` JSON responses.
//!
//! Anything the caller got wrong, including asking for a conversation that
//! does not exist, is a 400. Store and model failures are 500s.

use axum::http::StatusCode;
use axum::response::{ IntoResponse, Response };
use axum::Json;
use log::error;

use crate::agent::AgentError;
use crate::models::chat::ErrorResponse;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Validation(_) | AgentError::NotFound(_) => {
                ApiError::BadRequest(err.to_string())
            }
            AgentError::Store(_) | AgentError::Model(_) => {
                error!("Request failed: {}", err);
                ApiError::Internal(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::StoreError;

    #[test]
    fn not_found_is_a_bad_request() {
        let resp = ApiError::from(AgentError::NotFound(4)).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn store_failures_are_internal() {
        let err = AgentError::Store(StoreError::UnsupportedType("x".into()));
        let resp = ApiError::from(err).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
