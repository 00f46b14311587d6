//! # API Errors
//!
//! Mapping from `FolioError` to HTTP responses.
//!
//! | Error | Status |
//! |-------|--------|
//! | `NotFound` | 404, message as `text/plain` |
//! | `InvalidValue` | 400, message as `text/plain` |
//! | anything else | 500, generic body; detail logged |

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use folio_core::FolioError;

/// A `FolioError` on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub FolioError);

impl From<FolioError> for ApiError {
    fn from(error: FolioError) -> Self {
        Self(error)
    }
}

impl ApiError {
    /// HTTP status for the wrapped error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self.0 {
            FolioError::NotFound(_) => StatusCode::NOT_FOUND,
            FolioError::InvalidValue(_) => StatusCode::BAD_REQUEST,
            FolioError::MalformedRow(_)
            | FolioError::StorageError(_)
            | FolioError::SerializationError(_)
            | FolioError::ConfigError(_)
            | FolioError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
            "Internal Server Error".to_string()
        } else {
            tracing::debug!(status = status.as_u16(), error = %self.0, "Request rejected");
            self.0.to_string()
        };

        (status, [(header::CONTENT_TYPE, "text/plain")], body).into_response()
    }
}

// =============================================================================
// TESTS
// =============================================================================
