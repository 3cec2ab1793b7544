//! Mapping of store errors onto HTTP responses.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use meal_core::error::AppError;
use serde_json::json;
use tracing::{error, warn};

/// Error returned by every handler.
///
/// - `NotFound`: 404 Not Found
/// - `Validation`: 400 Bad Request
/// - `InvalidData` / `Io`: 500 Internal Server Error, with a generic body
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self.0 {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidData(_) | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::validation(format!(
            "request body is not valid JSON: {}",
            rejection.body_text()
        )))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if self.0.is_client_error() {
            warn!(code = self.0.code(), message = self.0.message(), "request rejected");
            self.0.message().to_string()
        } else {
            error!(code = self.0.code(), message = self.0.message(), "request failed");
            "internal server error".to_string()
        };

        let body = json!({ "error": self.0.code(), "message": message });
        (status, Json(body)).into_response()
    }
}
