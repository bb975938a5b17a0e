//! Applying a batch of pending service and case-study mutations.

use std::collections::HashSet;

use pitch_core::batch::{self, PendingMutation, PlaceholderMap};
use pitch_core::error::{PitchError, PitchResult};
use pitch_core::models::case_study::CreateCaseStudy;
use pitch_core::models::client_service::CreateClientService;
use pitch_core::repository::{CaseStudyRepository, ClientServiceRepository, RepositorySet};
use tracing::{debug, info};
use uuid::Uuid;

use crate::campaigns::CampaignService;

/// Services and case studies already known to belong to the batch's
/// campaign.
#[derive(Default)]
struct Membership {
    services: HashSet<Uuid>,
    case_studies: HashSet<Uuid>,
}

impl<R: RepositorySet> CampaignService<R> {
    /// Apply `mutations` to a DRAFT campaign.
    ///
    /// Service creates run first so their placeholder keys can be mapped
    /// to persisted ids before any dependent case-study mutation runs.
    /// Persisted references must belong to `campaign_id`. Mutations are
    /// applied one at a time: on error, the ones already applied stay.
    pub async fn apply_batch(
        &self,
        owner_id: Uuid,
        campaign_id: Uuid,
        mutations: Vec<PendingMutation>,
    ) -> PitchResult<PlaceholderMap> {
        self.editable_campaign(owner_id, campaign_id).await?;
        let plan = batch::plan(mutations)?;
        let total = plan.steps().len();

        let mut map = PlaceholderMap::default();
        let mut known = Membership::default();

        for step in plan.into_steps() {
            match step {
                PendingMutation::CreateService {
                    key,
                    client_service_name,
                } => {
                    let service = self
                        .repos
                        .services()
                        .create(CreateClientService {
                            campaign_id,
                            client_service_name,
                        })
                        .await?;
                    debug!(key = %key, service_id = %service.id, "Placeholder service persisted");
                    known.services.insert(service.id);
                    map.services.insert(key, service.id);
                }
                PendingMutation::RenameService {
                    service,
                    client_service_name,
                } => {
                    let id = map.resolve_service(&service)?;
                    self.check_service(campaign_id, id, &mut known).await?;
                    self.repos.services().rename(id, client_service_name).await?;
                }
                PendingMutation::DeleteService { service } => {
                    let id = map.resolve_service(&service)?;
                    self.check_service(campaign_id, id, &mut known).await?;
                    self.repos.services().delete(id).await?;
                    known.services.remove(&id);
                }
                PendingMutation::CreateCaseStudy {
                    key,
                    service,
                    fields,
                } => {
                    let service_id = map.resolve_service(&service)?;
                    self.check_service(campaign_id, service_id, &mut known)
                        .await?;
                    let case_study = self
                        .repos
                        .case_studies()
                        .create(CreateCaseStudy {
                            client_service_id: service_id,
                            fields,
                        })
                        .await?;
                    debug!(key = %key, case_study_id = %case_study.id, "Placeholder case study persisted");
                    known.case_studies.insert(case_study.id);
                    map.case_studies.insert(key, case_study.id);
                }
                PendingMutation::UpdateCaseStudy {
                    case_study,
                    changes,
                } => {
                    let id = map.resolve_case_study(&case_study)?;
                    self.check_case_study(campaign_id, id, &mut known).await?;
                    self.repos.case_studies().update(id, changes).await?;
                }
                PendingMutation::DeleteCaseStudy { case_study } => {
                    let id = map.resolve_case_study(&case_study)?;
                    self.check_case_study(campaign_id, id, &mut known).await?;
                    self.repos.case_studies().delete(id).await?;
                    known.case_studies.remove(&id);
                }
            }
        }

        info!(
            campaign_id = %campaign_id,
            mutations = total,
            created_services = map.services.len(),
            created_case_studies = map.case_studies.len(),
            "Batch applied"
        );
        Ok(map)
    }

    async fn check_service(
        &self,
        campaign_id: Uuid,
        service_id: Uuid,
        known: &mut Membership,
    ) -> PitchResult<()> {
        if known.services.contains(&service_id) {
            return Ok(());
        }
        let service = self.repos.services().get_by_id(service_id).await?;
        if service.campaign_id != campaign_id {
            return Err(PitchError::not_found("client_service", service_id));
        }
        known.services.insert(service_id);
        Ok(())
    }

    async fn check_case_study(
        &self,
        campaign_id: Uuid,
        case_study_id: Uuid,
        known: &mut Membership,
    ) -> PitchResult<()> {
        if known.case_studies.contains(&case_study_id) {
            return Ok(());
        }
        let case_study = self.repos.case_studies().get_by_id(case_study_id).await?;
        self.check_service(campaign_id, case_study.client_service_id, known)
            .await
            .map_err(|e| match e {
                PitchError::NotFound { .. } => PitchError::not_found("case_study", case_study_id),
                other => other,
            })?;
        known.case_studies.insert(case_study_id);
        Ok(())
    }
}
