//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Nothing outside
//! [`LifecycleRepository`] may write `campaign_status`, `is_archived`
//! or `project_url`; the field-level update inputs do not even carry
//! those columns.

use uuid::Uuid;

use crate::error::PitchResult;
use crate::models::{
    campaign::{Campaign, CampaignContent, CreateCampaign, TransitionOutcome, UpdateCampaign},
    case_study::{CaseStudy, CreateCaseStudy, UpdateCaseStudy},
    client_service::{ClientService, CreateClientService},
    identity::{CreateIdentity, Identity},
    lead::{CreateLead, Lead},
    project::{CreateProject, Project, UpdateProject},
    session::{CreateSession, Session},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Projects & campaigns
// ---------------------------------------------------------------------------

pub trait ProjectRepository: Send + Sync {
    fn create(&self, input: CreateProject) -> impl Future<Output = PitchResult<Project>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = PitchResult<Project>> + Send;
    /// Look up a project by its public slug.
    fn get_by_slug(&self, slug: &str) -> impl Future<Output = PitchResult<Project>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateProject,
    ) -> impl Future<Output = PitchResult<Project>> + Send;
    fn list_by_owner(
        &self,
        owner_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = PitchResult<PaginatedResult<Project>>> + Send;
}

pub trait CampaignRepository: Send + Sync {
    /// Create a campaign in DRAFT status.
    fn create(&self, input: CreateCampaign) -> impl Future<Output = PitchResult<Campaign>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = PitchResult<Campaign>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateCampaign,
    ) -> impl Future<Output = PitchResult<Campaign>> + Send;
    fn list_by_project(
        &self,
        project_id: Uuid,
    ) -> impl Future<Output = PitchResult<Vec<Campaign>>> + Send;
    /// The project's ACTIVE campaign, if any.
    fn get_active(
        &self,
        project_id: Uuid,
    ) -> impl Future<Output = PitchResult<Option<Campaign>>> + Send;
    /// Campaign plus its ordered services and their case studies.
    fn get_content(&self, id: Uuid) -> impl Future<Output = PitchResult<CampaignContent>> + Send;
}

/// The only writers of campaign status, archival and public URL.
///
/// Every method runs as one storage-side transaction: the read of the
/// current ACTIVE campaign and the status flips either all commit or
/// none do.
pub trait LifecycleRepository: Send + Sync {
    /// DRAFT → ACTIVE. `new_slug` is used only if the project has no
    /// public URL yet.
    fn publish(
        &self,
        project_id: Uuid,
        campaign_id: Uuid,
        new_slug: Option<String>,
    ) -> impl Future<Output = PitchResult<TransitionOutcome>> + Send;
    /// Pause the current ACTIVE campaign (if any) and activate `target_id`.
    fn switch(
        &self,
        project_id: Uuid,
        target_id: Uuid,
    ) -> impl Future<Output = PitchResult<TransitionOutcome>> + Send;
    /// Set `is_archived` and pause the ACTIVE campaign (if any).
    fn archive(&self, project_id: Uuid) -> impl Future<Output = PitchResult<TransitionOutcome>> + Send;
}

// ---------------------------------------------------------------------------
// Campaign content
// ---------------------------------------------------------------------------

pub trait ClientServiceRepository: Send + Sync {
    /// Append a service at the end of the campaign's ordering.
    fn create(
        &self,
        input: CreateClientService,
    ) -> impl Future<Output = PitchResult<ClientService>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = PitchResult<ClientService>> + Send;
    fn rename(
        &self,
        id: Uuid,
        client_service_name: String,
    ) -> impl Future<Output = PitchResult<ClientService>> + Send;
    /// Delete a service and its case studies, then renumber the
    /// remaining services densely from 1.
    fn delete(&self, id: Uuid) -> impl Future<Output = PitchResult<()>> + Send;
    /// Rewrite the ordering; `ordered_ids` must be a permutation of the
    /// campaign's services.
    fn reorder(
        &self,
        campaign_id: Uuid,
        ordered_ids: Vec<Uuid>,
    ) -> impl Future<Output = PitchResult<Vec<ClientService>>> + Send;
    fn list_by_campaign(
        &self,
        campaign_id: Uuid,
    ) -> impl Future<Output = PitchResult<Vec<ClientService>>> + Send;
}

pub trait CaseStudyRepository: Send + Sync {
    fn create(&self, input: CreateCaseStudy) -> impl Future<Output = PitchResult<CaseStudy>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = PitchResult<CaseStudy>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateCaseStudy,
    ) -> impl Future<Output = PitchResult<CaseStudy>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = PitchResult<()>> + Send;
    fn list_by_service(
        &self,
        client_service_id: Uuid,
    ) -> impl Future<Output = PitchResult<Vec<CaseStudy>>> + Send;
}

// ---------------------------------------------------------------------------
// Leads & identities
// ---------------------------------------------------------------------------

pub trait LeadRepository: Send + Sync {
    fn create(&self, input: CreateLead) -> impl Future<Output = PitchResult<Lead>> + Send;
    fn list_by_campaign(
        &self,
        campaign_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = PitchResult<PaginatedResult<Lead>>> + Send;
}

pub trait IdentityRepository: Send + Sync {
    fn create(&self, input: CreateIdentity) -> impl Future<Output = PitchResult<Identity>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = PitchResult<Identity>> + Send;
}

pub trait SessionRepository: Send + Sync {
    fn create(&self, input: CreateSession) -> impl Future<Output = PitchResult<Session>> + Send;
    fn get_by_token_hash(
        &self,
        token_hash: &str,
    ) -> impl Future<Output = PitchResult<Session>> + Send;
    /// Consume a session. `false` means it was already gone.
    fn invalidate(&self, id: Uuid) -> impl Future<Output = PitchResult<bool>> + Send;
    /// Consume every session of an identity, returning how many there were.
    fn invalidate_identity_sessions(
        &self,
        identity_id: Uuid,
    ) -> impl Future<Output = PitchResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// One handle over every repository the application services need.
pub trait RepositorySet: Send + Sync {
    type Projects: ProjectRepository;
    type Campaigns: CampaignRepository;
    type Lifecycle: LifecycleRepository;
    type Services: ClientServiceRepository;
    type CaseStudies: CaseStudyRepository;
    type Leads: LeadRepository;

    fn projects(&self) -> &Self::Projects;
    fn campaigns(&self) -> &Self::Campaigns;
    fn lifecycle(&self) -> &Self::Lifecycle;
    fn services(&self) -> &Self::Services;
    fn case_studies(&self) -> &Self::CaseStudies;
    fn leads(&self) -> &Self::Leads;
}
