//! Error types for nbc-server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Missing or expired session (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Conflict (409) - e.g., woreda name already taken
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// nbc-common error
    #[error("Common error: {0}")]
    Common(#[from] nbc_common::Error),
}

impl ApiError {
    /// HTTP status and machine-readable code
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        use nbc_common::Error as E;
        match self {
            ApiError::NotFound(_) | ApiError::Common(E::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND")
            }
            ApiError::BadRequest(_) | ApiError::Common(E::InvalidInput(_)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST")
            }
            ApiError::Unauthorized(_) | ApiError::Common(E::Auth(_)) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED")
            }
            ApiError::Conflict(_) | ApiError::Common(E::Conflict(_)) => {
                (StatusCode::CONFLICT, "CONFLICT")
            }
            ApiError::Common(E::Database(_)) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            ApiError::Common(_) => (StatusCode::INTERNAL_SERVER_ERROR, "COMMON_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// Message shown to the client
    pub fn message(&self) -> String {
        use nbc_common::Error as E;
        match self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Conflict(msg)
            | ApiError::Internal(msg) => msg.clone(),
            ApiError::Common(E::NotFound(msg))
            | ApiError::Common(E::InvalidInput(msg))
            | ApiError::Common(E::Auth(msg))
            | ApiError::Common(E::Conflict(msg)) => msg.clone(),
            ApiError::Common(err) => err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": self.message(),
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_errors_map_to_statuses() {
        let cases = [
            (ApiError::from(nbc_common::Error::NotFound("x".into())), StatusCode::NOT_FOUND),
            (ApiError::from(nbc_common::Error::InvalidInput("x".into())), StatusCode::BAD_REQUEST),
            (ApiError::from(nbc_common::Error::Conflict("x".into())), StatusCode::CONFLICT),
            (ApiError::from(nbc_common::Error::Auth("x".into())), StatusCode::UNAUTHORIZED),
            (ApiError::from(nbc_common::Error::Internal("x".into())), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_and_code().0, status, "{:?}", err);
        }
    }

    #[test]
    fn test_message_strips_variant_prefix() {
        let err = ApiError::from(nbc_common::Error::NotFound("Back check 7 not found".into()));
        assert_eq!(err.message(), "Back check 7 not found");
    }
}
