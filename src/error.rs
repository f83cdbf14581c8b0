use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::types::ApiResponse;

/// The primary error type for the application.
///
/// Every variant maps onto an HTTP status that doubles as the envelope `code`,
/// so handlers can return `AppResult<T>` and let `?` do the rest.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A requested resource (log file, directory, user) does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
    /// Bad pagination parameters, path traversal attempts, malformed input.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// The caller is not allowed to perform the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),
    /// A route unit failed to load. Contained by the loader.
    #[error("Failed to load route module {module}: {message}")]
    Load { module: String, message: String },
    /// Filesystem failure that is not a missing file.
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Load { .. } | AppError::Io(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, data) = match self {
            AppError::Internal(e) => {
                let error_id = uuid::Uuid::new_v4();
                tracing::error!(%error_id, "Internal error: {:?}", e);
                (
                    "An internal server error occurred".to_string(),
                    Some(json!({ "error_id": error_id.to_string() })),
                )
            }
            AppError::Io(msg) => {
                tracing::error!("I/O error: {}", msg);
                ("An I/O error occurred".to_string(), Some(json!({ "details": msg })))
            }
            AppError::Load { module, message } => {
                tracing::error!(module = %module, "Route module error: {}", message);
                (format!("Failed to load route module {}", module), None)
            }
            AppError::NotFound(msg) | AppError::InvalidArgument(msg) | AppError::Forbidden(msg) => {
                (msg, None)
            }
        };

        let body = ApiResponse::<serde_json::Value>::error(status.as_u16(), message, data);
        (status, body).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => AppError::NotFound(err.to_string()),
            _ => AppError::Io(format!("{}: {}", err.kind(), err)),
        }
    }
}

/// A type alias for `Result<T, AppError>`, used throughout the application.
pub type AppResult<T> = Result<T, AppError>;

/// Converts an `Option` into a `NotFound` error naming the missing entity.
pub trait OptionExt<T> {
    fn ok_or_not_found(self, entity: &str) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, entity: &str) -> AppResult<T> {
        self.ok_or_else(|| AppError::NotFound(format!("{} not found", entity)))
    }
}
