//! Authentication configuration.

use serde::Deserialize;

use crate::cookie::DEFAULT_CHUNK_SIZE;

/// Configuration for session issuance and credential cookies.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// PEM-encoded Ed25519 private key for JWT signing.
    pub jwt_private_key_pem: String,
    /// PEM-encoded Ed25519 public key for JWT verification.
    pub jwt_public_key_pem: String,
    /// Access token lifetime in seconds (default: 3600 = 1 hour).
    pub access_token_lifetime_secs: u64,
    /// Refresh token lifetime in seconds (default: 2_592_000 = 30 days).
    pub refresh_token_lifetime_secs: u64,
    /// JWT issuer (`iss` claim).
    pub jwt_issuer: String,
    /// Base name of the server-side credential cookie. Chunks are
    /// named `<cookie_name>.0`, `<cookie_name>.1`, ...
    pub cookie_name: String,
    /// Maximum byte length of a single cookie value.
    pub cookie_chunk_size: usize,
    /// Emit the `Secure` attribute on credential cookies.
    pub cookie_secure: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_private_key_pem: String::new(),
            jwt_public_key_pem: String::new(),
            access_token_lifetime_secs: 3600,
            refresh_token_lifetime_secs: 2_592_000,
            jwt_issuer: "pitch".into(),
            cookie_name: "pitch-auth-token".into(),
            cookie_chunk_size: DEFAULT_CHUNK_SIZE,
            cookie_secure: true,
        }
    }
}
