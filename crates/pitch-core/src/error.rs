//! Error types for Pitch Like This.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PitchError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Project {project_id} is archived")]
    Archived { project_id: String },

    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    #[error("Campaign is not publishable: {}", reasons.join("; "))]
    NotPublishable { reasons: Vec<String> },

    #[error("Identity resolution failed: {reason}")]
    IdentityResolution { reason: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Authorization denied: {reason}")]
    AuthorizationDenied { reason: String },

    #[error("Transaction conflict: {0}")]
    TransactionConflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type PitchResult<T> = Result<T, PitchError>;

impl PitchError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Message that is safe to show to an end user.
    ///
    /// Precondition failures keep their exact text so the author can act
    /// on them; storage and internal failures collapse to a generic line
    /// (the full error is still available through `Display` for logs).
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation { .. }
            | Self::NotFound { .. }
            | Self::AlreadyExists { .. }
            | Self::InvalidState { .. }
            | Self::NotPublishable { .. }
            | Self::AuthorizationDenied { .. } => self.to_string(),
            Self::Archived { .. } => "This project has been archived and can no longer be changed".into(),
            Self::IdentityResolution { .. } | Self::AuthenticationFailed { .. } => {
                "We could not verify your session. Please reload and try again".into()
            }
            Self::TransactionConflict(_) => {
                "Another change to this project was in progress. Please try again".into()
            }
            Self::Database(_) | Self::Crypto(_) | Self::Internal(_) => {
                "Something went wrong on our side. Please try again later".into()
            }
        }
    }

    /// Whether the failure came from the storage tier rather than from a
    /// precondition the caller can fix.
    pub fn is_storage_failure(&self) -> bool {
        matches!(
            self,
            Self::TransactionConflict(_) | Self::Database(_) | Self::Internal(_)
        )
    }
}
