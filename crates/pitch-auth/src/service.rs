//! Authentication service — anonymous sign-in, refresh rotation and
//! sign-out, and the built-in [`IdentityProvider`].

use chrono::{Duration, Utc};
use pitch_core::error::{PitchError, PitchResult};
use pitch_core::models::identity::{CreateIdentity, Identity, IdentityKind};
use pitch_core::models::session::CreateSession;
use pitch_core::repository::{IdentityRepository, SessionRepository};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::cookie::{self, CredentialPayload};
use crate::error::AuthError;
use crate::provider::{
    IdentityProvider, IssuedCredentials, ProviderSession, ProviderUser, RequestContext,
};
use crate::token::{self, AccessTokenClaims};

/// Authentication service.
///
/// Generic over repository implementations so that the auth layer
/// has no dependency on the database crate.
pub struct AuthService<I: IdentityRepository, S: SessionRepository> {
    identity_repo: I,
    session_repo: S,
    config: AuthConfig,
}

impl<I: IdentityRepository, S: SessionRepository> AuthService<I, S> {
    pub fn new(identity_repo: I, session_repo: S, config: AuthConfig) -> Self {
        Self {
            identity_repo,
            session_repo,
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Create a session for `identity` and mint its credentials.
    async fn issue(&self, identity: &Identity, ctx: &RequestContext) -> PitchResult<IssuedCredentials> {
        let raw_refresh = token::generate_refresh_token();
        let token_hash = token::hash_refresh_token(&raw_refresh);
        let expires_at =
            Utc::now() + Duration::seconds(self.config.refresh_token_lifetime_secs as i64);

        let session = self
            .session_repo
            .create(CreateSession {
                identity_id: identity.id,
                token_hash,
                ip_address: ctx.ip_address.clone(),
                user_agent: ctx.user_agent.clone(),
                expires_at,
            })
            .await?;

        let access_token =
            token::issue_access_token(identity.id, identity.kind, session.id, &self.config)?;

        let set_cookies = cookie::set_cookie_headers(
            &self.config,
            &CredentialPayload {
                access_token: access_token.clone(),
                refresh_token: raw_refresh.clone(),
            },
        );

        Ok(IssuedCredentials {
            identity_id: identity.id,
            session_id: session.id,
            access_token,
            refresh_token: raw_refresh,
            expires_in: self.config.access_token_lifetime_secs,
            set_cookies,
        })
    }

    /// Create a new anonymous identity with a fresh session.
    pub async fn create_anonymous(&self, ctx: &RequestContext) -> PitchResult<IssuedCredentials> {
        let identity = self
            .identity_repo
            .create(CreateIdentity {
                kind: IdentityKind::Anonymous,
                email: None,
            })
            .await?;
        self.issue(&identity, ctx).await
    }

    /// Start a session for an identity that already exists (for example
    /// a permanent identity linked by the external sign-in flow).
    pub async fn establish_session(
        &self,
        identity_id: Uuid,
        ctx: &RequestContext,
    ) -> PitchResult<IssuedCredentials> {
        let identity = self.identity_repo.get_by_id(identity_id).await?;
        self.issue(&identity, ctx).await
    }

    /// Rotate a refresh token: consume the old one and issue a new
    /// credential pair for the same identity.
    ///
    /// Each refresh token is single-use: the old session is
    /// invalidated before the new one is created.
    pub async fn refresh(
        &self,
        raw_refresh_token: &str,
        ctx: &RequestContext,
    ) -> PitchResult<IssuedCredentials> {
        let token_hash = token::hash_refresh_token(raw_refresh_token);
        let session = self
            .session_repo
            .get_by_token_hash(&token_hash)
            .await
            .map_err(|e| match e {
                PitchError::NotFound { .. } => {
                    AuthError::TokenInvalid("refresh token not found or already used".into())
                        .into()
                }
                other => other,
            })?;

        if session.is_expired(Utc::now()) {
            let _ = self.session_repo.invalidate(session.id).await;
            return Err(AuthError::TokenExpired.into());
        }

        if !self.session_repo.invalidate(session.id).await? {
            return Err(AuthError::TokenInvalid("refresh token already used".into()).into());
        }

        let identity = self.identity_repo.get_by_id(session.identity_id).await?;
        self.issue(&identity, ctx).await
    }

    /// End the session carried by the request. Returns the
    /// `Set-Cookie` values that clear the credential chunks.
    pub async fn sign_out(&self, ctx: &RequestContext) -> PitchResult<Vec<String>> {
        let payload = cookie::combine_chunks(&self.config.cookie_name, &ctx.cookies)
            .and_then(|raw| CredentialPayload::decode(&raw));

        if let Some(payload) = payload {
            let hash = token::hash_refresh_token(&payload.refresh_token);
            match self.session_repo.get_by_token_hash(&hash).await {
                Ok(session) => {
                    self.session_repo.invalidate(session.id).await?;
                }
                Err(PitchError::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        Ok(cookie::clear_cookie_headers(&self.config, &ctx.cookies))
    }

    /// Revoke every session of an identity. Returns how many were live.
    pub async fn revoke_all_sessions(&self, identity_id: Uuid) -> PitchResult<u64> {
        let revoked = self
            .session_repo
            .invalidate_identity_sessions(identity_id)
            .await?;
        info!(identity_id = %identity_id, revoked, "Sessions revoked");
        Ok(revoked)
    }

    /// Strict check for operations that need a live credential.
    ///
    /// Unlike the session reads, an expired access token is rejected
    /// here. The server-side cookie wins over a bearer token.
    pub fn authenticate(&self, ctx: &RequestContext) -> PitchResult<AccessTokenClaims> {
        let from_cookie = cookie::combine_chunks(&self.config.cookie_name, &ctx.cookies)
            .and_then(|raw| CredentialPayload::decode(&raw))
            .map(|payload| payload.access_token);
        let Some(access_token) = from_cookie.or_else(|| ctx.bearer_token.clone()) else {
            return Err(AuthError::NoSession.into());
        };
        Ok(token::decode_access_token(&access_token, &self.config)?)
    }

    /// Verify a presented access token and attach the identity record.
    ///
    /// A token that fails verification is treated as no session. An
    /// expired one still counts. So does nothing when the identity it
    /// names no longer exists.
    async fn session_from_token(
        &self,
        access_token: String,
    ) -> Result<Option<ProviderSession>, AuthError> {
        let claims = match token::decode_session_token(&access_token, &self.config) {
            Ok(claims) => claims,
            Err(AuthError::TokenInvalid(reason)) => {
                debug!(%reason, "Ignoring unverifiable access token");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let Ok(id) = Uuid::parse_str(&claims.sub) else {
            debug!(sub = %claims.sub, "Access token subject is not an identity id");
            return Ok(None);
        };
        let identity = match self.identity_repo.get_by_id(id).await {
            Ok(identity) => identity,
            Err(PitchError::NotFound { .. }) => {
                debug!(identity_id = %id, "Access token names a missing identity");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let user = Some(ProviderUser {
            id: identity.id,
            is_anonymous: Some(identity.kind.is_anonymous()),
        });
        Ok(Some(ProviderSession { access_token, user }))
    }
}

impl<I: IdentityRepository, S: SessionRepository> IdentityProvider for AuthService<I, S> {
    async fn server_session(
        &self,
        ctx: &RequestContext,
    ) -> Result<Option<ProviderSession>, AuthError> {
        let Some(raw) = cookie::combine_chunks(&self.config.cookie_name, &ctx.cookies) else {
            return Ok(None);
        };
        let Some(payload) = CredentialPayload::decode(&raw) else {
            debug!("Credential cookie present but malformed");
            return Ok(None);
        };
        self.session_from_token(payload.access_token).await
    }

    async fn client_session(
        &self,
        ctx: &RequestContext,
    ) -> Result<Option<ProviderSession>, AuthError> {
        match &ctx.bearer_token {
            Some(token) => self.session_from_token(token.clone()).await,
            None => Ok(None),
        }
    }

    async fn sign_in_anonymously(
        &self,
        ctx: &RequestContext,
    ) -> Result<IssuedCredentials, AuthError> {
        self.create_anonymous(ctx).await.map_err(AuthError::from)
    }
}
