//! Server startup errors and the HTTP mapping of domain errors.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pitch_core::error::PitchError;
use thiserror::Error;

/// Failures while bringing the server up.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("database connection failed: {0}")]
    Connect(#[from] surrealdb::Error),

    #[error("database setup failed: {0}")]
    Database(#[from] pitch_db::DbError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(std::io::Error),
}

/// A domain error on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub PitchError);

impl From<PitchError> for ApiError {
    fn from(err: PitchError) -> Self {
        Self(err)
    }
}

pub(crate) fn status_and_code(err: &PitchError) -> (StatusCode, &'static str) {
    match err {
        PitchError::Validation { .. } => (StatusCode::BAD_REQUEST, "validation_error"),
        PitchError::NotPublishable { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "not_publishable")
        }
        PitchError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
        PitchError::AlreadyExists { .. } => (StatusCode::CONFLICT, "already_exists"),
        PitchError::Archived { .. } => (StatusCode::CONFLICT, "archived"),
        PitchError::InvalidState { .. } => (StatusCode::CONFLICT, "invalid_state"),
        PitchError::TransactionConflict(_) => (StatusCode::CONFLICT, "transaction_conflict"),
        PitchError::IdentityResolution { .. } | PitchError::AuthenticationFailed { .. } => {
            (StatusCode::UNAUTHORIZED, "authentication_error")
        }
        PitchError::AuthorizationDenied { .. } => (StatusCode::FORBIDDEN, "forbidden"),
        PitchError::Database(_) | PitchError::Crypto(_) | PitchError::Internal(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = status_and_code(&self.0);
        if self.0.is_storage_failure() || status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "Request failed");
        } else {
            tracing::debug!(error = %self.0, "Request rejected");
        }

        let mut body = serde_json::json!({
            "error": {
                "message": self.0.public_message(),
                "type": error_type,
            }
        });
        if let PitchError::NotPublishable { reasons } = &self.0 {
            body["error"]["reasons"] = serde_json::json!(reasons);
        }

        (status, Json(body)).into_response()
    }
}
