//! The identity-provider seam.
//!
//! The resolver only needs three things from whoever owns sessions: a
//! server-side-only session read, a client-accessible session read and
//! anonymous sign-in. [`crate::AuthService`] is the built-in provider;
//! tests substitute fakes.

use uuid::Uuid;

use crate::cookie::parse_cookie_header;
use crate::error::AuthError;

/// Transport-level facts about the incoming request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub cookies: Vec<(String, String)>,
    pub bearer_token: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestContext {
    /// Build a context from raw `Cookie` and `Authorization` header values.
    pub fn from_headers(cookie: Option<&str>, authorization: Option<&str>) -> Self {
        Self {
            cookies: cookie.map(parse_cookie_header).unwrap_or_default(),
            bearer_token: authorization
                .and_then(|h| h.strip_prefix("Bearer "))
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            ..Self::default()
        }
    }
}

/// User record as reported by the provider alongside a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderUser {
    pub id: Uuid,
    pub is_anonymous: Option<bool>,
}

/// An existing session found by one of the read tiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSession {
    pub access_token: String,
    pub user: Option<ProviderUser>,
}

/// Credentials minted by a sign-in.
#[derive(Debug, Clone)]
pub struct IssuedCredentials {
    pub identity_id: Uuid,
    pub session_id: Uuid,
    pub access_token: String,
    /// Raw opaque refresh token (returned to the client, stored hashed).
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    /// `Set-Cookie` header values carrying the server-side credential.
    pub set_cookies: Vec<String>,
}

pub trait IdentityProvider: Send + Sync {
    /// Session carried by the credential that in-page script cannot read.
    fn server_session(
        &self,
        ctx: &RequestContext,
    ) -> impl Future<Output = Result<Option<ProviderSession>, AuthError>> + Send;

    /// Session visible to client script (bearer token).
    fn client_session(
        &self,
        ctx: &RequestContext,
    ) -> impl Future<Output = Result<Option<ProviderSession>, AuthError>> + Send;

    /// Create a new anonymous identity and a session for it.
    fn sign_in_anonymously(
        &self,
        ctx: &RequestContext,
    ) -> impl Future<Output = Result<IssuedCredentials, AuthError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_split_into_context() {
        let ctx = RequestContext::from_headers(Some("a=1; b=2"), Some("Bearer tok"));
        assert_eq!(ctx.cookies.len(), 2);
        assert_eq!(ctx.bearer_token.as_deref(), Some("tok"));
    }

    #[test]
    fn non_bearer_authorization_is_ignored() {
        let ctx = RequestContext::from_headers(None, Some("Basic dXNlcjpwYXNz"));
        assert!(ctx.bearer_token.is_none());
        assert!(ctx.cookies.is_empty());
    }
}
