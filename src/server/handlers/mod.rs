//! HTTP handlers for the server.

pub mod collage;
pub mod images;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::error::CollageError;

/// A failed request: status code plus a JSON `{ success, error }` body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl From<CollageError> for ApiError {
    fn from(err: CollageError) -> Self {
        let status = match &err {
            CollageError::Validation(_) => StatusCode::BAD_REQUEST,
            CollageError::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CollageError::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
            CollageError::Render(_) | CollageError::Encode(_) | CollageError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!(status = self.status.as_u16(), error = %self.message, "request failed");
        }
        let body = Json(json!({ "success": false, "error": self.message }));
        (self.status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Parse an image id from a path or request body.
pub fn parse_id(id: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| ApiError::bad_request(format!("Invalid image id '{}'", id)))
}
