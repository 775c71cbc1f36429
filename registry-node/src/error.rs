use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use registry_models::StorageError;
use serde::Serialize;
use tracing::error;

/// Wraps `StorageError` for the HTTP surface, using the hint the core
/// already computes (`as_http_status_hint`) rather than re-deriving a status
/// mapping here (§7 "HTTP-classification hook").
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
struct ProblemDetails {
    title: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Storage(err) => {
                StatusCode::from_u16(err.as_http_status_hint()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(status = ?status, error = ?self, "request failed");
        }

        let body = Json(ProblemDetails { title: self.to_string() });
        (status, body).into_response()
    }
}
