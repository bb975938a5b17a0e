//! Tiered identity resolution.
//!
//! Order of evidence: the server-only credential, then the
//! client-visible session, then (only when both reads succeeded and
//! found nothing) a new anonymous sign-in. A session whose anonymity
//! cannot be determined is reused as anonymous; it never causes a
//! second identity to be created.

use pitch_core::error::{PitchError, PitchResult};
use pitch_core::models::identity::IdentityKind;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::claims::{Anonymity, SessionClaims};
use crate::provider::{IdentityProvider, IssuedCredentials, ProviderSession, RequestContext};

#[derive(Debug, Clone, Copy)]
enum Tier {
    Server,
    Client,
}

impl Tier {
    fn as_str(self) -> &'static str {
        match self {
            Tier::Server => "server",
            Tier::Client => "client",
        }
    }
}

/// The caller's identity, and the credentials to hand back if it was
/// created by this request.
#[derive(Debug, Clone)]
pub struct ResolvedIdentity {
    pub kind: IdentityKind,
    pub identity_id: Uuid,
    pub issued: Option<IssuedCredentials>,
}

impl ResolvedIdentity {
    pub fn was_created(&self) -> bool {
        self.issued.is_some()
    }
}

/// Answer for the session-check endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionCheck {
    pub has_session: bool,
    pub is_anonymous: bool,
    pub user_id: Option<Uuid>,
}

impl SessionCheck {
    fn none() -> Self {
        Self {
            has_session: false,
            is_anonymous: false,
            user_id: None,
        }
    }
}

/// Outcome of a page-view bootstrap. `success` is the only signal the
/// page relies on; failures are logged, never raised.
#[derive(Debug, Clone)]
pub struct SessionBootstrap {
    pub success: bool,
    pub issued: Option<IssuedCredentials>,
}

pub struct IdentityResolver<P: IdentityProvider> {
    provider: P,
}

impl<P: IdentityProvider> IdentityResolver<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Find the caller's existing session through either tier.
    ///
    /// `Ok(None)` means both tiers answered and neither found a session.
    /// Any tier error without a session found elsewhere is returned as
    /// an error: the absence of a session was not established.
    async fn find_session(&self, ctx: &RequestContext) -> PitchResult<Option<(Tier, ProviderSession)>> {
        let mut failures = Vec::new();

        match self.provider.server_session(ctx).await {
            Ok(Some(session)) => return Ok(Some((Tier::Server, session))),
            Ok(None) => {}
            Err(e) => {
                warn!(tier = Tier::Server.as_str(), error = %e, "Session read failed");
                failures.push(format!("server: {e}"));
            }
        }

        match self.provider.client_session(ctx).await {
            Ok(Some(session)) => return Ok(Some((Tier::Client, session))),
            Ok(None) => {}
            Err(e) => {
                warn!(tier = Tier::Client.as_str(), error = %e, "Session read failed");
                failures.push(format!("client: {e}"));
            }
        }

        if failures.is_empty() {
            Ok(None)
        } else {
            Err(PitchError::IdentityResolution {
                reason: failures.join("; "),
            })
        }
    }

    fn identify(tier: Tier, session: &ProviderSession) -> PitchResult<(IdentityKind, Uuid)> {
        let claims = SessionClaims::decode(&session.access_token);
        let user = session.user.as_ref();

        let anonymity = claims
            .anonymity
            .or(Anonymity::from_flag(user.and_then(|u| u.is_anonymous)));
        let subject = claims.subject.or(user.map(|u| u.id));

        let Some(identity_id) = subject else {
            return Err(PitchError::IdentityResolution {
                reason: format!("{} session carries no identity", tier.as_str()),
            });
        };

        let kind = match anonymity {
            Anonymity::Permanent => IdentityKind::Permanent,
            Anonymity::Anonymous => IdentityKind::Anonymous,
            Anonymity::Unknown => {
                debug!(
                    tier = tier.as_str(),
                    identity_id = %identity_id,
                    "Anonymity inconclusive, reusing session as anonymous"
                );
                IdentityKind::Anonymous
            }
        };
        Ok((kind, identity_id))
    }

    /// Return the caller's identity, creating an anonymous one only when
    /// no session exists through either tier.
    pub async fn resolve_or_create(&self, ctx: &RequestContext) -> PitchResult<ResolvedIdentity> {
        if let Some((tier, session)) = self.find_session(ctx).await? {
            let (kind, identity_id) = Self::identify(tier, &session)?;
            debug!(tier = tier.as_str(), identity_id = %identity_id, kind = %kind, "Reusing session");
            return Ok(ResolvedIdentity {
                kind,
                identity_id,
                issued: None,
            });
        }

        let issued = self
            .provider
            .sign_in_anonymously(ctx)
            .await
            .map_err(|e| PitchError::IdentityResolution {
                reason: format!("anonymous sign-in failed: {e}"),
            })?;

        info!(identity_id = %issued.identity_id, "Created anonymous identity");
        Ok(ResolvedIdentity {
            kind: IdentityKind::Anonymous,
            identity_id: issued.identity_id,
            issued: Some(issued),
        })
    }

    /// Page-view bootstrap: make sure the visitor has some session.
    pub async fn ensure_session(&self, ctx: &RequestContext) -> SessionBootstrap {
        match self.resolve_or_create(ctx).await {
            Ok(resolved) => SessionBootstrap {
                success: true,
                issued: resolved.issued,
            },
            Err(e) => {
                warn!(error = %e, "Session bootstrap failed");
                SessionBootstrap {
                    success: false,
                    issued: None,
                }
            }
        }
    }

    /// Read-only session check. Never creates an identity.
    pub async fn check_session(&self, ctx: &RequestContext) -> SessionCheck {
        let found = match self.find_session(ctx).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "Session check failed");
                return SessionCheck::none();
            }
        };
        let Some((tier, session)) = found else {
            return SessionCheck::none();
        };

        match Self::identify(tier, &session) {
            Ok((kind, identity_id)) => SessionCheck {
                has_session: true,
                is_anonymous: kind.is_anonymous(),
                user_id: Some(identity_id),
            },
            Err(_) => SessionCheck {
                has_session: true,
                is_anonymous: true,
                user_id: None,
            },
        }
    }
}
