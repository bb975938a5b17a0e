//! Campaign authoring service.
//!
//! Every operation takes the caller's permanent identity and checks it
//! against the project owner before doing anything else. Mutations then
//! pass the archival gate, and field edits additionally require a DRAFT
//! campaign. Status changes only ever go through the lifecycle
//! repository.

use std::sync::Arc;

use pitch_core::error::{PitchError, PitchResult};
use pitch_core::lifecycle::{self, Transition};
use pitch_core::models::campaign::{
    Campaign, CampaignContent, CreateCampaign, TransitionOutcome, UpdateCampaign,
};
use pitch_core::models::case_study::{CaseStudy, CaseStudyFields, CreateCaseStudy, UpdateCaseStudy};
use pitch_core::models::client_service::{ClientService, CreateClientService};
use pitch_core::models::lead::Lead;
use pitch_core::models::project::{CreateProject, Project, UpdateProject};
use pitch_core::repository::{
    CampaignRepository, CaseStudyRepository, ClientServiceRepository, LeadRepository,
    LifecycleRepository, PaginatedResult, Pagination, ProjectRepository, RepositorySet,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::slug;

/// Fresh slugs tried before a publish gives up on slug collisions.
const SLUG_ATTEMPTS: usize = 5;

pub struct CampaignService<R: RepositorySet> {
    pub(crate) repos: Arc<R>,
}

impl<R: RepositorySet> Clone for CampaignService<R> {
    fn clone(&self) -> Self {
        Self {
            repos: Arc::clone(&self.repos),
        }
    }
}

impl<R: RepositorySet> CampaignService<R> {
    pub fn new(repos: Arc<R>) -> Self {
        Self { repos }
    }

    // -----------------------------------------------------------------------
    // Access checks
    // -----------------------------------------------------------------------

    pub(crate) async fn owned_project(&self, owner_id: Uuid, project_id: Uuid) -> PitchResult<Project> {
        let project = self.repos.projects().get_by_id(project_id).await?;
        if project.owner_id != owner_id {
            warn!(project_id = %project_id, caller = %owner_id, "Rejected access to foreign project");
            return Err(PitchError::AuthorizationDenied {
                reason: "you do not own this project".into(),
            });
        }
        Ok(project)
    }

    pub(crate) async fn owned_campaign(
        &self,
        owner_id: Uuid,
        campaign_id: Uuid,
    ) -> PitchResult<(Project, Campaign)> {
        let campaign = self.repos.campaigns().get_by_id(campaign_id).await?;
        let project = self.owned_project(owner_id, campaign.project_id).await?;
        Ok((project, campaign))
    }

    /// Owned, not archived and still DRAFT.
    pub(crate) async fn editable_campaign(
        &self,
        owner_id: Uuid,
        campaign_id: Uuid,
    ) -> PitchResult<Campaign> {
        let (project, campaign) = self.owned_campaign(owner_id, campaign_id).await?;
        lifecycle::ensure_not_archived(&project)?;
        lifecycle::ensure_editable(&campaign)?;
        Ok(campaign)
    }

    /// Campaign of `project_id`; a campaign of another project is
    /// reported as missing.
    async fn campaign_in_project(&self, project: &Project, campaign_id: Uuid) -> PitchResult<Campaign> {
        let campaign = self.repos.campaigns().get_by_id(campaign_id).await?;
        if campaign.project_id != project.id {
            return Err(PitchError::not_found("campaign", campaign_id));
        }
        Ok(campaign)
    }

    async fn editable_service(&self, owner_id: Uuid, service_id: Uuid) -> PitchResult<ClientService> {
        let service = self.repos.services().get_by_id(service_id).await?;
        self.editable_campaign(owner_id, service.campaign_id).await?;
        Ok(service)
    }

    async fn editable_case_study(&self, owner_id: Uuid, case_study_id: Uuid) -> PitchResult<CaseStudy> {
        let case_study = self.repos.case_studies().get_by_id(case_study_id).await?;
        self.editable_service(owner_id, case_study.client_service_id)
            .await?;
        Ok(case_study)
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    pub async fn create_project(&self, owner_id: Uuid, project_name: &str) -> PitchResult<Project> {
        let project = self
            .repos
            .projects()
            .create(CreateProject {
                owner_id,
                project_name: project_name.to_string(),
            })
            .await?;
        info!(project_id = %project.id, owner_id = %owner_id, "Project created");
        Ok(project)
    }

    pub async fn get_project(&self, owner_id: Uuid, project_id: Uuid) -> PitchResult<Project> {
        self.owned_project(owner_id, project_id).await
    }

    pub async fn list_projects(
        &self,
        owner_id: Uuid,
        pagination: Pagination,
    ) -> PitchResult<PaginatedResult<Project>> {
        self.repos.projects().list_by_owner(owner_id, pagination).await
    }

    pub async fn update_project_name(
        &self,
        owner_id: Uuid,
        project_id: Uuid,
        project_name: &str,
    ) -> PitchResult<Project> {
        let project = self.owned_project(owner_id, project_id).await?;
        lifecycle::ensure_not_archived(&project)?;
        self.repos
            .projects()
            .update(
                project_id,
                UpdateProject {
                    project_name: Some(project_name.to_string()),
                },
            )
            .await
    }

    // -----------------------------------------------------------------------
    // Campaigns
    // -----------------------------------------------------------------------

    pub async fn create_campaign(
        &self,
        owner_id: Uuid,
        project_id: Uuid,
        campaign_name: &str,
    ) -> PitchResult<Campaign> {
        let project = self.owned_project(owner_id, project_id).await?;
        lifecycle::ensure_not_archived(&project)?;
        let campaign = self
            .repos
            .campaigns()
            .create(CreateCampaign {
                project_id,
                campaign_name: campaign_name.to_string(),
            })
            .await?;
        info!(project_id = %project_id, campaign_id = %campaign.id, "Campaign created");
        Ok(campaign)
    }

    pub async fn get_campaign(&self, owner_id: Uuid, campaign_id: Uuid) -> PitchResult<Campaign> {
        let (_, campaign) = self.owned_campaign(owner_id, campaign_id).await?;
        Ok(campaign)
    }

    pub async fn list_campaigns(&self, owner_id: Uuid, project_id: Uuid) -> PitchResult<Vec<Campaign>> {
        self.owned_project(owner_id, project_id).await?;
        self.repos.campaigns().list_by_project(project_id).await
    }

    pub async fn get_campaign_content(
        &self,
        owner_id: Uuid,
        campaign_id: Uuid,
    ) -> PitchResult<CampaignContent> {
        self.owned_campaign(owner_id, campaign_id).await?;
        self.repos.campaigns().get_content(campaign_id).await
    }

    /// Partial field update of a DRAFT campaign.
    pub async fn update_campaign(
        &self,
        owner_id: Uuid,
        campaign_id: Uuid,
        input: UpdateCampaign,
    ) -> PitchResult<Campaign> {
        self.editable_campaign(owner_id, campaign_id).await?;
        self.repos.campaigns().update(campaign_id, input).await
    }

    /// Copy a campaign's structure, CTA config, services and case studies
    /// into a new DRAFT of the same project.
    ///
    /// The copy is written step by step; a failure part way leaves an
    /// incomplete DRAFT behind, which the author can edit or ignore.
    pub async fn duplicate_campaign(
        &self,
        owner_id: Uuid,
        campaign_id: Uuid,
        new_name: &str,
    ) -> PitchResult<Campaign> {
        let (project, _) = self.owned_campaign(owner_id, campaign_id).await?;
        lifecycle::ensure_not_archived(&project)?;
        let source = self.repos.campaigns().get_content(campaign_id).await?;

        let copy = self
            .repos
            .campaigns()
            .create(CreateCampaign {
                project_id: project.id,
                campaign_name: new_name.to_string(),
            })
            .await?;
        let structure = &source.campaign.campaign_structure;
        let copy = self
            .repos
            .campaigns()
            .update(
                copy.id,
                UpdateCampaign {
                    campaign_name: None,
                    client_name: Some(structure.client_name.clone()),
                    client_summary: Some(structure.client_summary.clone()),
                    cta_config: Some(source.campaign.cta_config.clone()),
                },
            )
            .await?;

        for entry in source.services {
            let service = self
                .repos
                .services()
                .create(CreateClientService {
                    campaign_id: copy.id,
                    client_service_name: entry.service.client_service_name,
                })
                .await?;
            for case in entry.case_studies {
                self.repos
                    .case_studies()
                    .create(CreateCaseStudy {
                        client_service_id: service.id,
                        fields: CaseStudyFields {
                            case_name: case.case_name,
                            case_summary: case.case_summary,
                            case_duration: case.case_duration,
                            case_highlights: case.case_highlights,
                            case_study_url: case.case_study_url,
                        },
                    })
                    .await?;
            }
        }

        info!(source_id = %campaign_id, campaign_id = %copy.id, "Campaign duplicated");
        Ok(copy)
    }

    // -----------------------------------------------------------------------
    // Services and case studies
    // -----------------------------------------------------------------------

    pub async fn create_service(
        &self,
        owner_id: Uuid,
        campaign_id: Uuid,
        client_service_name: &str,
    ) -> PitchResult<ClientService> {
        self.editable_campaign(owner_id, campaign_id).await?;
        self.repos
            .services()
            .create(CreateClientService {
                campaign_id,
                client_service_name: client_service_name.to_string(),
            })
            .await
    }

    pub async fn rename_service(
        &self,
        owner_id: Uuid,
        service_id: Uuid,
        client_service_name: &str,
    ) -> PitchResult<ClientService> {
        self.editable_service(owner_id, service_id).await?;
        self.repos
            .services()
            .rename(service_id, client_service_name.to_string())
            .await
    }

    pub async fn delete_service(&self, owner_id: Uuid, service_id: Uuid) -> PitchResult<()> {
        self.editable_service(owner_id, service_id).await?;
        self.repos.services().delete(service_id).await
    }

    pub async fn reorder_services(
        &self,
        owner_id: Uuid,
        campaign_id: Uuid,
        ordered_ids: Vec<Uuid>,
    ) -> PitchResult<Vec<ClientService>> {
        self.editable_campaign(owner_id, campaign_id).await?;
        self.repos.services().reorder(campaign_id, ordered_ids).await
    }

    pub async fn create_case_study(
        &self,
        owner_id: Uuid,
        service_id: Uuid,
        fields: CaseStudyFields,
    ) -> PitchResult<CaseStudy> {
        self.editable_service(owner_id, service_id).await?;
        self.repos
            .case_studies()
            .create(CreateCaseStudy {
                client_service_id: service_id,
                fields,
            })
            .await
    }

    pub async fn update_case_study(
        &self,
        owner_id: Uuid,
        case_study_id: Uuid,
        changes: UpdateCaseStudy,
    ) -> PitchResult<CaseStudy> {
        self.editable_case_study(owner_id, case_study_id).await?;
        self.repos.case_studies().update(case_study_id, changes).await
    }

    pub async fn delete_case_study(&self, owner_id: Uuid, case_study_id: Uuid) -> PitchResult<()> {
        self.editable_case_study(owner_id, case_study_id).await?;
        self.repos.case_studies().delete(case_study_id).await
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// DRAFT → ACTIVE, assigning the project's public slug on first
    /// publish.
    ///
    /// Preconditions are checked here so the author gets a precise
    /// reason; the transaction re-checks the ones that can race.
    pub async fn publish(
        &self,
        owner_id: Uuid,
        project_id: Uuid,
        campaign_id: Uuid,
    ) -> PitchResult<TransitionOutcome> {
        let project = self.owned_project(owner_id, project_id).await?;
        let campaign = self.campaign_in_project(&project, campaign_id).await?;
        lifecycle::ensure_not_archived(&project)?;
        lifecycle::next_status(campaign.campaign_status, Transition::Publish)?;

        let content = self.repos.campaigns().get_content(campaign_id).await?;
        lifecycle::ensure_publishable(&content)?;

        if project.project_url.is_some() {
            return self
                .repos
                .lifecycle()
                .publish(project_id, campaign_id, None)
                .await;
        }

        for attempt in 1..=SLUG_ATTEMPTS {
            let candidate = slug::generate(&project.project_name);
            match self
                .repos
                .lifecycle()
                .publish(project_id, campaign_id, Some(candidate.clone()))
                .await
            {
                Err(PitchError::AlreadyExists { entity }) if entity == "project_slug" => {
                    warn!(project_id = %project_id, slug = %candidate, attempt, "Slug taken, retrying");
                }
                other => {
                    if let Ok(outcome) = &other {
                        info!(
                            project_id = %project_id,
                            campaign_id = %campaign_id,
                            project_url = ?outcome.project_url,
                            "Campaign published"
                        );
                    }
                    return other;
                }
            }
        }

        Err(PitchError::Internal(format!(
            "no free public slug after {SLUG_ATTEMPTS} attempts"
        )))
    }

    /// Make `target_id` the project's ACTIVE campaign. Publishability is
    /// not required.
    pub async fn switch(
        &self,
        owner_id: Uuid,
        project_id: Uuid,
        target_id: Uuid,
    ) -> PitchResult<TransitionOutcome> {
        let project = self.owned_project(owner_id, project_id).await?;
        let target = self.campaign_in_project(&project, target_id).await?;
        lifecycle::ensure_not_archived(&project)?;
        lifecycle::next_status(target.campaign_status, Transition::SwitchTarget)?;

        let outcome = self.repos.lifecycle().switch(project_id, target_id).await?;
        info!(project_id = %project_id, campaign_id = %target_id, "Active campaign switched");
        Ok(outcome)
    }

    /// Archive the project. Archiving twice succeeds both times.
    pub async fn archive(&self, owner_id: Uuid, project_id: Uuid) -> PitchResult<TransitionOutcome> {
        self.owned_project(owner_id, project_id).await?;
        let outcome = self.repos.lifecycle().archive(project_id).await?;
        info!(project_id = %project_id, message = %outcome.message, "Project archive requested");
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Leads
    // -----------------------------------------------------------------------

    /// Leads captured on a campaign, newest first. Still readable after
    /// archival.
    pub async fn list_leads(
        &self,
        owner_id: Uuid,
        campaign_id: Uuid,
        pagination: Pagination,
    ) -> PitchResult<PaginatedResult<Lead>> {
        self.owned_campaign(owner_id, campaign_id).await?;
        self.repos
            .leads()
            .list_by_campaign(campaign_id, pagination)
            .await
    }
}
