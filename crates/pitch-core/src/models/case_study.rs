//! Case study domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseStudy {
    pub id: Uuid,
    pub client_service_id: Uuid,
    pub case_name: String,
    pub case_summary: String,
    pub case_duration: Option<String>,
    pub case_highlights: Option<String>,
    pub case_study_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Editable fields of a case study.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CaseStudyFields {
    pub case_name: String,
    #[serde(default)]
    pub case_summary: String,
    #[serde(default)]
    pub case_duration: Option<String>,
    #[serde(default)]
    pub case_highlights: Option<String>,
    #[serde(default)]
    pub case_study_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCaseStudy {
    pub client_service_id: Uuid,
    pub fields: CaseStudyFields,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct UpdateCaseStudy {
    pub case_name: Option<String>,
    pub case_summary: Option<String>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub case_duration: Option<Option<String>>,
    pub case_highlights: Option<Option<String>>,
    pub case_study_url: Option<Option<String>>,
}
