//! Campaign lifecycle rules.
//!
//! Pure functions only: the transition table, field limits for DRAFT
//! edits, the publishability check and the archival gate. Storage-side
//! enforcement of the same rules lives in the lifecycle transactions of
//! `pitch-db`.

use crate::error::{PitchError, PitchResult};
use crate::models::campaign::{Campaign, CampaignContent, CampaignStatus, UpdateCampaign};
use crate::models::case_study::{CaseStudyFields, UpdateCaseStudy};
use crate::models::project::Project;

pub const MAX_PROJECT_NAME_LEN: usize = 50;
pub const MAX_CAMPAIGN_NAME_LEN: usize = 25;
pub const MAX_CLIENT_NAME_LEN: usize = 25;
pub const MAX_CLIENT_SUMMARY_LEN: usize = 400;
pub const MAX_SERVICE_NAME_LEN: usize = 50;
pub const MAX_CASE_NAME_LEN: usize = 50;
pub const MAX_CASE_SUMMARY_LEN: usize = 400;

/// Events that move a campaign between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// First activation of a DRAFT campaign.
    Publish,
    /// The campaign being switched to.
    SwitchTarget,
    /// The previously ACTIVE campaign during a switch or publish.
    SwitchSource,
    /// The ACTIVE campaign of a project being archived.
    Archive,
}

/// Apply `transition` to `from`, returning the resulting status.
pub fn next_status(from: CampaignStatus, transition: Transition) -> PitchResult<CampaignStatus> {
    use CampaignStatus::*;

    match (transition, from) {
        (Transition::Publish, Draft) => Ok(Active),
        (Transition::Publish, other) => Err(PitchError::invalid_state(format!(
            "only DRAFT campaigns can be published; this campaign is {other}"
        ))),
        (Transition::SwitchTarget, Draft | Paused) => Ok(Active),
        (Transition::SwitchTarget, Active) => Err(PitchError::invalid_state(
            "campaign is already ACTIVE",
        )),
        (Transition::SwitchSource | Transition::Archive, Active) => Ok(Paused),
        (Transition::SwitchSource | Transition::Archive, other) => Err(PitchError::invalid_state(
            format!("only an ACTIVE campaign can be paused; this campaign is {other}"),
        )),
    }
}

/// Archival gate: every mutating campaign operation calls this first.
pub fn ensure_not_archived(project: &Project) -> PitchResult<()> {
    if project.is_archived {
        return Err(PitchError::Archived {
            project_id: project.id.to_string(),
        });
    }
    Ok(())
}

/// Field edits (including services and case studies) are DRAFT-only.
pub fn ensure_editable(campaign: &Campaign) -> PitchResult<()> {
    match campaign.campaign_status {
        CampaignStatus::Draft => Ok(()),
        other => Err(PitchError::invalid_state(format!(
            "campaign is {other}; only DRAFT campaigns can be edited"
        ))),
    }
}

fn bounded(field: &str, value: &str, max: usize, required: bool) -> PitchResult<String> {
    let trimmed = value.trim();
    if required && trimmed.is_empty() {
        return Err(PitchError::validation(format!("{field} must not be empty")));
    }
    if trimmed.chars().count() > max {
        return Err(PitchError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(trimmed.to_string())
}

pub fn validate_project_name(name: &str) -> PitchResult<String> {
    bounded("project_name", name, MAX_PROJECT_NAME_LEN, true)
}

pub fn validate_campaign_name(name: &str) -> PitchResult<String> {
    bounded("campaign_name", name, MAX_CAMPAIGN_NAME_LEN, true)
}

pub fn validate_service_name(name: &str) -> PitchResult<String> {
    bounded("client_service_name", name, MAX_SERVICE_NAME_LEN, true)
}

/// Validate and normalize a partial campaign update.
pub fn validate_update(input: UpdateCampaign) -> PitchResult<UpdateCampaign> {
    if input.is_empty() {
        return Err(PitchError::validation("update contains no fields"));
    }
    Ok(UpdateCampaign {
        campaign_name: input
            .campaign_name
            .as_deref()
            .map(validate_campaign_name)
            .transpose()?,
        client_name: input
            .client_name
            .as_deref()
            .map(|v| bounded("client_name", v, MAX_CLIENT_NAME_LEN, false))
            .transpose()?,
        client_summary: input
            .client_summary
            .as_deref()
            .map(|v| bounded("client_summary", v, MAX_CLIENT_SUMMARY_LEN, false))
            .transpose()?,
        cta_config: input.cta_config,
    })
}

fn validate_url(value: &str) -> PitchResult<String> {
    let trimmed = value.trim();
    if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        Ok(trimmed.to_string())
    } else {
        Err(PitchError::validation(
            "case_study_url must start with http:// or https://",
        ))
    }
}

pub fn validate_case_study(fields: CaseStudyFields) -> PitchResult<CaseStudyFields> {
    Ok(CaseStudyFields {
        case_name: bounded("case_name", &fields.case_name, MAX_CASE_NAME_LEN, true)?,
        case_summary: bounded("case_summary", &fields.case_summary, MAX_CASE_SUMMARY_LEN, false)?,
        case_duration: fields.case_duration.map(|d| d.trim().to_string()),
        case_highlights: fields.case_highlights,
        case_study_url: fields
            .case_study_url
            .filter(|u| !u.trim().is_empty())
            .map(|u| validate_url(&u))
            .transpose()?,
    })
}

pub fn validate_case_study_update(input: UpdateCaseStudy) -> PitchResult<UpdateCaseStudy> {
    Ok(UpdateCaseStudy {
        case_name: input
            .case_name
            .map(|v| bounded("case_name", &v, MAX_CASE_NAME_LEN, true))
            .transpose()?,
        case_summary: input
            .case_summary
            .map(|v| bounded("case_summary", &v, MAX_CASE_SUMMARY_LEN, false))
            .transpose()?,
        case_duration: input.case_duration,
        case_highlights: input.case_highlights,
        case_study_url: match input.case_study_url {
            Some(Some(url)) => Some(Some(validate_url(&url)?)),
            other => other,
        },
    })
}

/// Every unmet publish requirement, in display order. Empty means the
/// campaign is publishable.
pub fn publish_blockers(content: &CampaignContent) -> Vec<String> {
    let mut reasons = Vec::new();
    let structure = &content.campaign.campaign_structure;

    if structure.client_name.trim().is_empty() {
        reasons.push("client name is required".to_string());
    }
    if structure.client_summary.trim().is_empty() {
        reasons.push("client summary is required".to_string());
    }
    if !content.campaign.cta_config.has_any() {
        reasons.push("at least one call-to-action is required".to_string());
    }
    if content.services.is_empty() {
        reasons.push("at least one service is required".to_string());
    }
    for entry in &content.services {
        if entry.case_studies.is_empty() {
            reasons.push(format!(
                "service '{}' needs at least one case study",
                entry.service.client_service_name
            ));
        }
    }

    reasons
}

pub fn is_publishable(content: &CampaignContent) -> bool {
    publish_blockers(content).is_empty()
}

/// Fails with [`PitchError::NotPublishable`] listing every unmet requirement.
pub fn ensure_publishable(content: &CampaignContent) -> PitchResult<()> {
    let reasons = publish_blockers(content);
    if reasons.is_empty() {
        Ok(())
    } else {
        Err(PitchError::NotPublishable { reasons })
    }
}
