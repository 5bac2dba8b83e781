//! Error types for booktrack-server
//!
//! `LibraryError` is the domain taxonomy returned by resolvers, the
//! ingestion pipeline and the report queries. `ApiError` is the HTTP
//! boundary: it logs the failure and renders the `{success, error}`
//! envelope with a matching status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{error, warn};

use crate::services::{CompletionError, OcrError};
use crate::ApiResponse;

/// Domain errors for library operations
#[derive(Debug, Error)]
pub enum LibraryError {
    /// No identity attached to the request
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Requested bookshelf is missing or owned by someone else
    #[error("Invalid bookshelf selected")]
    InvalidSelection,

    /// Relational store read/write failure
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// OCR returned no text annotation
    #[error("No text detected in the image")]
    NoTextDetected,

    /// Completion output was not JSON of the expected shape
    #[error("Malformed extraction: {0}")]
    MalformedExtraction(String),

    /// Cover lookup failure; absorbed by the cover service, never surfaced
    /// from the ingestion pipeline
    #[error("Cover lookup failed: {0}")]
    CoverLookupFailed(String),

    /// OCR adapter failure (network, API, timeout)
    #[error("Text detection failed: {0}")]
    Ocr(#[from] OcrError),

    /// Completion adapter failure (network, API, timeout)
    #[error("Completion request failed: {0}")]
    Completion(#[from] CompletionError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Library(#[from] LibraryError),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Library(LibraryError::Storage(err))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Library(err) => match err {
                LibraryError::NotAuthenticated => StatusCode::UNAUTHORIZED,
                LibraryError::InvalidSelection
                | LibraryError::InvalidInput(_)
                | LibraryError::NoTextDetected => StatusCode::BAD_REQUEST,
                LibraryError::NotFound(_) => StatusCode::NOT_FOUND,
                LibraryError::MalformedExtraction(_)
                | LibraryError::CoverLookupFailed(_)
                | LibraryError::Ocr(_)
                | LibraryError::Completion(_) => StatusCode::BAD_GATEWAY,
                LibraryError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            error!(status = status.as_u16(), error = %message, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %message, "Request rejected");
        }

        (status, Json(ApiResponse::<()>::failure(message))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(LibraryError::NotAuthenticated).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(LibraryError::InvalidSelection).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(LibraryError::MalformedExtraction("x".into())).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(sqlx::Error::RowNotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages_are_human_readable() {
        assert_eq!(
            ApiError::from(LibraryError::InvalidSelection).to_string(),
            "Invalid bookshelf selected"
        );
        assert_eq!(
            ApiError::from(LibraryError::NotAuthenticated).to_string(),
            "Not authenticated"
        );
    }
}
