//! Public read path for project pages.

use pitch_core::error::{PitchError, PitchResult};
use pitch_core::models::campaign::CampaignContent;
use pitch_core::repository::{CampaignRepository, ProjectRepository, RepositorySet};
use serde::Serialize;
use tracing::debug;

/// What an anonymous visitor of `/p/{slug}` gets.
///
/// An unknown slug, an archived project and a project without an
/// ACTIVE campaign all produce the same `NotAvailable`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PublicCampaign {
    Available {
        project_name: String,
        content: CampaignContent,
    },
    NotAvailable,
}

impl PublicCampaign {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available { .. })
    }
}

pub async fn public_campaign<R: RepositorySet>(repos: &R, slug: &str) -> PitchResult<PublicCampaign> {
    let project = match repos.projects().get_by_slug(slug).await {
        Ok(project) => project,
        Err(PitchError::NotFound { .. }) => {
            debug!(slug = %slug, "Unknown public slug");
            return Ok(PublicCampaign::NotAvailable);
        }
        Err(e) => return Err(e),
    };
    if project.is_archived {
        return Ok(PublicCampaign::NotAvailable);
    }

    let Some(active) = repos.campaigns().get_active(project.id).await? else {
        return Ok(PublicCampaign::NotAvailable);
    };
    let content = match repos.campaigns().get_content(active.id).await {
        Ok(content) => content,
        Err(PitchError::NotFound { .. }) => return Ok(PublicCampaign::NotAvailable),
        Err(e) => return Err(e),
    };

    Ok(PublicCampaign::Available {
        project_name: project.project_name,
        content,
    })
}
