//! Campaign domain model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::case_study::CaseStudy;
use crate::models::client_service::ClientService;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignStatus {
    Draft,
    Active,
    Paused,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Active => "ACTIVE",
            Self::Paused => "PAUSED",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(Self::Draft),
            "ACTIVE" => Ok(Self::Active),
            "PAUSED" => Ok(Self::Paused),
            other => Err(format!("unknown campaign status: {other}")),
        }
    }
}

/// Client-facing pitch copy.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CampaignStructure {
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub client_summary: String,
}

/// Calls-to-action shown on the public page. At least one must be set
/// before a campaign can be published.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CtaConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_meeting: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mailto: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl CtaConfig {
    /// True if any call-to-action carries a non-blank value.
    pub fn has_any(&self) -> bool {
        [
            &self.schedule_meeting,
            &self.mailto,
            &self.linkedin,
            &self.phone,
        ]
        .into_iter()
        .flatten()
        .any(|v| !v.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Campaign {
    pub id: Uuid,
    pub project_id: Uuid,
    pub campaign_name: String,
    pub campaign_status: CampaignStatus,
    pub campaign_structure: CampaignStructure,
    pub cta_config: CtaConfig,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCampaign {
    pub project_id: Uuid,
    pub campaign_name: String,
}

/// Partial update of a DRAFT campaign. `None` leaves a field untouched;
/// `cta_config` replaces the whole CTA object when present.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateCampaign {
    pub campaign_name: Option<String>,
    pub client_name: Option<String>,
    pub client_summary: Option<String>,
    pub cta_config: Option<CtaConfig>,
}

impl UpdateCampaign {
    pub fn is_empty(&self) -> bool {
        self.campaign_name.is_none()
            && self.client_name.is_none()
            && self.client_summary.is_none()
            && self.cta_config.is_none()
    }
}

/// A client service together with its case studies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceWithCases {
    pub service: ClientService,
    pub case_studies: Vec<CaseStudy>,
}

/// Everything the public page and the publishability check need.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CampaignContent {
    pub campaign: Campaign,
    /// Ordered by `order_index`.
    pub services: Vec<ServiceWithCases>,
}

/// Result of an atomic Publish / Switch / Archive call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransitionOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            CampaignStatus::Draft,
            CampaignStatus::Active,
            CampaignStatus::Paused,
        ] {
            assert_eq!(status.as_str().parse::<CampaignStatus>().unwrap(), status);
        }
        assert!("LIVE".parse::<CampaignStatus>().is_err());
    }

    #[test]
    fn blank_cta_values_do_not_count() {
        let cta = CtaConfig {
            mailto: Some("   ".into()),
            ..Default::default()
        };
        assert!(!cta.has_any());

        let cta = CtaConfig {
            phone: Some("+1 555 0100".into()),
            ..Default::default()
        };
        assert!(cta.has_any());
    }
}
