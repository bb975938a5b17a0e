//! Lead capture.

use std::sync::Arc;

use pitch_auth::{IdentityProvider, IdentityResolver, IssuedCredentials, RequestContext};
use pitch_core::error::{PitchError, PitchResult};
use pitch_core::models::lead::{CreateLead, Lead, LeadFields};
use pitch_core::repository::{CampaignRepository, LeadRepository, RepositorySet};
use pitch_core::sanitize;
use tracing::{info, warn};
use uuid::Uuid;

/// A stored lead plus any credentials minted for its submitter.
#[derive(Debug)]
pub struct LeadReceipt {
    pub lead: Lead,
    pub issued: Option<IssuedCredentials>,
}

/// A rejected submission.
///
/// Carries the credentials of an identity created before the failure
/// so the caller can still hand them out; a retry then reuses that
/// identity instead of creating another.
#[derive(Debug)]
pub struct LeadFailure {
    pub error: PitchError,
    pub issued: Option<IssuedCredentials>,
}

impl From<PitchError> for LeadFailure {
    fn from(error: PitchError) -> Self {
        Self {
            error,
            issued: None,
        }
    }
}

pub struct LeadCaptureService<R: RepositorySet, P: IdentityProvider> {
    repos: Arc<R>,
    resolver: Arc<IdentityResolver<P>>,
}

impl<R: RepositorySet, P: IdentityProvider> LeadCaptureService<R, P> {
    pub fn new(repos: Arc<R>, resolver: Arc<IdentityResolver<P>>) -> Self {
        Self { repos, resolver }
    }

    /// Validate, sanitize, attribute and store a lead.
    ///
    /// Input problems are reported before the caller's identity is
    /// touched. Identity resolution failure aborts the submission: a
    /// lead is never stored without a submitter.
    pub async fn submit_lead(
        &self,
        ctx: &RequestContext,
        campaign_id: Option<Uuid>,
        fields: &LeadFields,
    ) -> Result<LeadReceipt, LeadFailure> {
        let campaign_id =
            campaign_id.ok_or_else(|| PitchError::validation("campaign_id is required"))?;
        let prepared = sanitize::prepare_lead(fields)?;

        let resolved = self.resolver.resolve_or_create(ctx).await.map_err(|e| {
            warn!(campaign_id = %campaign_id, error = %e, "Lead rejected: no submitter identity");
            e
        })?;
        let identity_id = resolved.identity_id;
        let issued = resolved.issued;

        match self
            .store(prepared.into_create(campaign_id, identity_id))
            .await
        {
            Ok(lead) => {
                info!(
                    lead_id = %lead.id,
                    campaign_id = %campaign_id,
                    identity_id = %identity_id,
                    "Lead captured"
                );
                Ok(LeadReceipt { lead, issued })
            }
            Err(error) => Err(LeadFailure { error, issued }),
        }
    }

    /// The campaign must exist; a dangling id is reported as such rather
    /// than as a rejected insert.
    async fn store(&self, input: CreateLead) -> PitchResult<Lead> {
        self.repos.campaigns().get_by_id(input.campaign_id).await?;
        self.repos.leads().create(input).await
    }
}
