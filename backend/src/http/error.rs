//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::services::{ExplorerError, PreconditionError};

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Invalid request (validation error)
    BadRequest(String),
    /// Error from the explorer session
    Explorer(ExplorerError),
}

fn explorer_response(err: ExplorerError) -> (StatusCode, ApiError) {
    let message = err.user_message();
    match err {
        ExplorerError::Precondition(
            PreconditionError::UnknownSavedField(_)
            | PreconditionError::UnknownLayer(_)
            | PreconditionError::UnknownLegend(_),
        ) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", message)),
        ExplorerError::Precondition(_) => (
            StatusCode::BAD_REQUEST,
            ApiError::new("PRECONDITION_FAILED", message),
        ),
        ExplorerError::Input(_) | ExplorerError::DateRange(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::new("VALIDATION_ERROR", message),
        ),
        ExplorerError::ParcelNotFound(_) => (
            StatusCode::NOT_FOUND,
            ApiError::new("PARCEL_NOT_FOUND", message),
        ),
        ExplorerError::Remote(e) => (
            StatusCode::BAD_GATEWAY,
            ApiError::new("REMOTE_ERROR", message).with_details(e.to_string()),
        ),
        ExplorerError::Storage(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::new("STORAGE_ERROR", message),
        ),
        ExplorerError::Superseded => (StatusCode::CONFLICT, ApiError::new("SUPERSEDED", message)),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ApiError::new("BAD_REQUEST", msg),
            ),
            AppError::Explorer(e) => explorer_response(e),
        };

        (status, Json(error)).into_response()
    }
}

impl From<ExplorerError> for AppError {
    fn from(err: ExplorerError) -> Self {
        AppError::Explorer(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{Operation, RemoteError};

    #[test]
    fn test_status_codes() {
        let cases = [
            (ExplorerError::Precondition(PreconditionError::MissingAoi), StatusCode::BAD_REQUEST),
            (
                ExplorerError::Precondition(PreconditionError::UnknownLayer("x".into())),
                StatusCode::NOT_FOUND,
            ),
            (ExplorerError::ParcelNotFound("none".into()), StatusCode::NOT_FOUND),
            (
                ExplorerError::Remote(RemoteError::status(Operation::Analyze, 500, None)),
                StatusCode::BAD_GATEWAY,
            ),
            (ExplorerError::Superseded, StatusCode::CONFLICT),
        ];
        for (err, expected) in cases {
            assert_eq!(AppError::from(err).into_response().status(), expected);
        }
    }
}
