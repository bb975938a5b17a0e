//! Pitch Auth — session tokens, segmented credential cookies and the
//! tiered identity resolver used by lead capture and page bootstrap.

pub mod claims;
pub mod config;
pub mod cookie;
pub mod error;
pub mod provider;
pub mod resolver;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use provider::{IdentityProvider, IssuedCredentials, ProviderSession, ProviderUser, RequestContext};
pub use resolver::{IdentityResolver, ResolvedIdentity, SessionBootstrap, SessionCheck};
pub use service::AuthService;
pub use token::AccessTokenClaims;
