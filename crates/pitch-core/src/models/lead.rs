//! Lead domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Lead {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub lead_name: String,
    pub lead_company: String,
    pub lead_email: String,
    pub lead_phone_isd: Option<String>,
    pub lead_phone: Option<String>,
    pub meeting_scheduled: bool,
    /// Identity (anonymous or permanent) that submitted the lead.
    pub submitter_identity_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Raw visitor input, before validation and sanitizing.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LeadFields {
    #[serde(default)]
    pub lead_name: Option<String>,
    #[serde(default)]
    pub lead_company: Option<String>,
    #[serde(default)]
    pub lead_email: Option<String>,
    #[serde(default)]
    pub lead_phone_isd: Option<String>,
    #[serde(default)]
    pub lead_phone: Option<String>,
    #[serde(default)]
    pub meeting_scheduled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLead {
    pub campaign_id: Uuid,
    pub lead_name: String,
    pub lead_company: String,
    pub lead_email: String,
    pub lead_phone_isd: Option<String>,
    pub lead_phone: Option<String>,
    pub meeting_scheduled: bool,
    pub submitter_identity_id: Uuid,
}
