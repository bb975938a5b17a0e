//! Authentication error types.

use pitch_core::error::PitchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("no session")]
    NoSession,

    #[error("identity provider unavailable: {0}")]
    Provider(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for PitchError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired | AuthError::TokenInvalid(_) | AuthError::NoSession => {
                PitchError::AuthenticationFailed {
                    reason: err.to_string(),
                }
            }
            AuthError::Provider(_) => PitchError::IdentityResolution {
                reason: err.to_string(),
            },
            AuthError::Crypto(msg) => PitchError::Crypto(msg),
        }
    }
}

impl From<PitchError> for AuthError {
    fn from(err: PitchError) -> Self {
        match err {
            PitchError::Crypto(msg) => AuthError::Crypto(msg),
            other => AuthError::Provider(other.to_string()),
        }
    }
}
