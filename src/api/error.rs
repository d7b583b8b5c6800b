use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::warn;

/// Failures at the request boundary. The projection engine itself never fails.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid JSON payload: {0}")]
    InvalidJson(String),

    #[error("Invalid date for {field}: {value:?} (expected YYYY-MM-DD)")]
    InvalidDate { field: String, value: String },

    #[error("Invalid timestamp for {field}: {value:?} (expected RFC 3339)")]
    InvalidTimestamp { field: String, value: String },

    #[error("Duplicate user id: {0}")]
    DuplicateUser(String),

    #[error("Active user {0:?} has no retirement inputs")]
    UnknownActiveUser(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::InvalidJson(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(error = %self, "rejecting projection request");
        let body = Json(json!({
            "error": self.to_string(),
        }));
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
