//! SurrealDB repository implementations.

mod campaign;
mod case_study;
mod client_service;
mod identity;
mod lead;
mod lifecycle;
mod project;
mod session;
mod set;

pub use campaign::SurrealCampaignRepository;
pub use case_study::SurrealCaseStudyRepository;
pub use client_service::SurrealClientServiceRepository;
pub use identity::SurrealIdentityRepository;
pub use lead::SurrealLeadRepository;
pub use lifecycle::SurrealLifecycleRepository;
pub use project::SurrealProjectRepository;
pub use session::SurrealSessionRepository;
pub use set::SurrealRepositories;

use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn parse_uuid(what: &str, raw: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::Decode(format!("invalid {what} UUID: {e}")))
}

fn parse_optional_uuid(what: &str, raw: Option<String>) -> Result<Option<Uuid>, DbError> {
    raw.as_deref().map(|r| parse_uuid(what, r)).transpose()
}
