use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// ApiError
///
/// Application-level error type for all HTTP handlers. Every variant maps to a
/// single JSON error body of the form `{"detail": "..."}` with the appropriate
/// status code, so clients see one consistent error shape across the public and
/// admin surfaces.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The multipart payload did not contain an `image` file field.
    #[error("No image file provided.")]
    MissingFile,

    /// Input validation failed (image format, file size, phone digits, payload shape).
    #[error("{0}")]
    Validation(String),

    /// The one-image-per-IP rule rejected an upload.
    #[error("You have already uploaded an image. Only one image per IP address is allowed.")]
    DuplicateIpUpload,

    /// The requested record does not exist.
    #[error("Not found.")]
    NotFound,

    /// Missing or invalid credentials on an admin route.
    #[error("Authentication credentials were not provided or are invalid.")]
    Unauthorized,

    /// Valid credentials without the admin role.
    #[error("You do not have permission to perform this action.")]
    Forbidden,

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An object-store failure (upload or delete).
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Convenience type alias for handler return values.
pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ApiError::MissingFile => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::DuplicateIpUpload => (StatusCode::FORBIDDEN, self.to_string()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
            ApiError::Database(e) => {
                // Log the real cause, return a sanitized message to the client.
                tracing::error!(error = ?e, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error.".to_string(),
                )
            }
            ApiError::Storage(msg) => {
                tracing::error!(error = %msg, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error.".to_string(),
                )
            }
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
