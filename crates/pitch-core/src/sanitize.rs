//! Sanitizing of visitor-supplied text before it is stored or echoed.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{PitchError, PitchResult};
use crate::models::lead::{CreateLead, LeadFields};

static SCRIPT_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)javascript\s*:").expect("valid regex"));

static EVENT_HANDLER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bon[a-z]+\s*=").expect("valid regex"));

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

pub const MAX_LEAD_FIELD_LEN: usize = 200;

/// Trim, drop angle brackets, `javascript:` schemes and inline
/// `on*=` handlers. Repeats until stable so that nested payloads such
/// as `javajavascript:script:` cannot reassemble.
pub fn sanitize_text(input: &str) -> String {
    let mut current: String = input.chars().filter(|c| *c != '<' && *c != '>').collect();
    loop {
        let stripped = SCRIPT_SCHEME.replace_all(&current, "");
        let stripped = EVENT_HANDLER.replace_all(&stripped, "").into_owned();
        if stripped == current {
            break;
        }
        current = stripped;
    }
    current.trim().to_string()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

fn required(field: &str, value: Option<&str>) -> PitchResult<String> {
    let clean = value.map(sanitize_text).unwrap_or_default();
    if clean.is_empty() {
        return Err(PitchError::validation(format!("{field} is required")));
    }
    if clean.chars().count() > MAX_LEAD_FIELD_LEN {
        return Err(PitchError::validation(format!(
            "{field} must be at most {MAX_LEAD_FIELD_LEN} characters"
        )));
    }
    Ok(clean)
}

fn optional(value: Option<&str>) -> Option<String> {
    value.map(sanitize_text).filter(|v| !v.is_empty())
}

/// Validate presence of the required lead fields and sanitize all of
/// them. The submitter identity is filled in later by the capture flow.
pub fn prepare_lead(fields: &LeadFields) -> PitchResult<PreparedLead> {
    let lead_name = required("lead_name", fields.lead_name.as_deref())?;
    let lead_company = required("lead_company", fields.lead_company.as_deref())?;
    let lead_email = required("lead_email", fields.lead_email.as_deref())?;
    if !is_valid_email(&lead_email) {
        return Err(PitchError::validation("lead_email is not a valid address"));
    }
    Ok(PreparedLead {
        lead_name,
        lead_company,
        lead_email,
        lead_phone_isd: optional(fields.lead_phone_isd.as_deref()),
        lead_phone: optional(fields.lead_phone.as_deref()),
        meeting_scheduled: fields.meeting_scheduled,
    })
}

/// Lead fields that passed validation and sanitizing.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedLead {
    pub lead_name: String,
    pub lead_company: String,
    pub lead_email: String,
    pub lead_phone_isd: Option<String>,
    pub lead_phone: Option<String>,
    pub meeting_scheduled: bool,
}

impl PreparedLead {
    pub fn into_create(self, campaign_id: uuid::Uuid, submitter_identity_id: uuid::Uuid) -> CreateLead {
        CreateLead {
            campaign_id,
            lead_name: self.lead_name,
            lead_company: self.lead_company,
            lead_email: self.lead_email,
            lead_phone_isd: self.lead_phone_isd,
            lead_phone: self.lead_phone,
            meeting_scheduled: self.meeting_scheduled,
            submitter_identity_id,
        }
    }
}
