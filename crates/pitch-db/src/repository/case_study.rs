//! SurrealDB implementation of [`CaseStudyRepository`].
//!
//! Writes resolve the owning campaign through the service and run
//! behind the same DRAFT guard as service writes.

use chrono::{DateTime, Utc};
use pitch_core::error::{PitchError, PitchResult};
use pitch_core::lifecycle::{validate_case_study, validate_case_study_update};
use pitch_core::models::case_study::{CaseStudy, CreateCaseStudy, UpdateCaseStudy};
use pitch_core::repository::CaseStudyRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;
use crate::transaction::{content_write_error, failed_statements, guarded_script};

#[derive(Debug, SurrealValue)]
struct CaseStudyRow {
    client_service_id: String,
    case_name: String,
    case_summary: String,
    case_duration: Option<String>,
    case_highlights: Option<String>,
    case_study_url: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct CaseStudyRowWithId {
    record_id: String,
    client_service_id: String,
    case_name: String,
    case_summary: String,
    case_duration: Option<String>,
    case_highlights: Option<String>,
    case_study_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl CaseStudyRow {
    fn into_case_study(self, id: Uuid) -> Result<CaseStudy, DbError> {
        Ok(CaseStudy {
            id,
            client_service_id: parse_uuid("client_service", &self.client_service_id)?,
            case_name: self.case_name,
            case_summary: self.case_summary,
            case_duration: self.case_duration,
            case_highlights: self.case_highlights,
            case_study_url: self.case_study_url,
            created_at: self.created_at,
        })
    }
}

impl CaseStudyRowWithId {
    fn try_into_case_study(self) -> Result<CaseStudy, DbError> {
        let id = parse_uuid("case_study", &self.record_id)?;
        CaseStudyRow {
            client_service_id: self.client_service_id,
            case_name: self.case_name,
            case_summary: self.case_summary,
            case_duration: self.case_duration,
            case_highlights: self.case_highlights,
            case_study_url: self.case_study_url,
            created_at: self.created_at,
        }
        .into_case_study(id)
    }
}

/// Case studies belonging to any of `service_ids`, oldest first.
pub(super) async fn list_case_studies_for<C: Connection>(
    db: &Surreal<C>,
    service_ids: Vec<String>,
) -> Result<Vec<CaseStudy>, DbError> {
    if service_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut result = db
        .query(
            "SELECT meta::id(id) AS record_id, * FROM case_study \
             WHERE client_service_id IN $service_ids \
             ORDER BY created_at ASC",
        )
        .bind(("service_ids", service_ids))
        .await?;

    let rows: Vec<CaseStudyRowWithId> = result.take(0)?;
    rows.into_iter().map(|row| row.try_into_case_study()).collect()
}

const CAMPAIGN_OF_SERVICE: &str = "\
LET $service = (SELECT campaign_id FROM type::record('client_service', $client_service_id))[0];
IF $service = NONE { THROW 'pitch:service_not_found' };
LET $target_campaign = $service.campaign_id;";

const CAMPAIGN_OF_CASE_STUDY: &str = "\
LET $study = (SELECT client_service_id FROM type::record('case_study', $id))[0];
IF $study = NONE { THROW 'pitch:case_study_not_found' };
LET $service = (SELECT campaign_id FROM type::record('client_service', $study.client_service_id))[0];
IF $service = NONE { THROW 'pitch:service_not_found' };
LET $target_campaign = $service.campaign_id;";

const CREATE_CASE_STUDY: &str = "\
CREATE type::record('case_study', $id) SET
    client_service_id = $client_service_id,
    case_name = $case_name,
    case_summary = $case_summary,
    case_duration = $case_duration,
    case_highlights = $case_highlights,
    case_study_url = $case_study_url;";

const DELETE_CASE_STUDY: &str = "DELETE type::record('case_study', $id);";

fn case_study_error(code: &str, case_study_id: Uuid, service_id: Option<Uuid>) -> Option<PitchError> {
    match code {
        "case_study_not_found" => Some(PitchError::not_found("case_study", case_study_id)),
        "service_not_found" => Some(PitchError::not_found(
            "client_service",
            service_id.map(|id| id.to_string()).unwrap_or_default(),
        )),
        _ => None,
    }
}

/// SurrealDB implementation of the CaseStudy repository.
#[derive(Clone)]
pub struct SurrealCaseStudyRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCaseStudyRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CaseStudyRepository for SurrealCaseStudyRepository<C> {
    async fn create(&self, input: CreateCaseStudy) -> PitchResult<CaseStudy> {
        let fields = validate_case_study(input.fields)?;
        let id = Uuid::new_v4();

        let response = self
            .db
            .query(guarded_script(CAMPAIGN_OF_SERVICE, CREATE_CASE_STUDY))
            .bind(("id", id.to_string()))
            .bind(("client_service_id", input.client_service_id.to_string()))
            .bind(("case_name", fields.case_name))
            .bind(("case_summary", fields.case_summary))
            .bind(("case_duration", fields.case_duration))
            .bind(("case_highlights", fields.case_highlights))
            .bind(("case_study_url", fields.case_study_url))
            .await
            .map_err(DbError::from)?;

        if let Err(messages) = failed_statements(response) {
            return Err(content_write_error("case_study", messages, |code| {
                case_study_error(code, id, Some(input.client_service_id))
            }));
        }

        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> PitchResult<CaseStudy> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('case_study', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CaseStudyRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "case_study".into(),
            id: id_str,
        })?;

        Ok(row.into_case_study(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateCaseStudy) -> PitchResult<CaseStudy> {
        let input = validate_case_study_update(input)?;

        let mut sets = Vec::new();
        if input.case_name.is_some() {
            sets.push("case_name = $case_name");
        }
        if input.case_summary.is_some() {
            sets.push("case_summary = $case_summary");
        }
        if input.case_duration.is_some() {
            sets.push("case_duration = $case_duration");
        }
        if input.case_highlights.is_some() {
            sets.push("case_highlights = $case_highlights");
        }
        if input.case_study_url.is_some() {
            sets.push("case_study_url = $case_study_url");
        }

        if sets.is_empty() {
            return self.get_by_id(id).await;
        }

        let script = guarded_script(
            CAMPAIGN_OF_CASE_STUDY,
            &format!(
                "UPDATE type::record('case_study', $id) SET {};",
                sets.join(", ")
            ),
        );

        let mut builder = self.db.query(script).bind(("id", id.to_string()));

        if let Some(case_name) = input.case_name {
            builder = builder.bind(("case_name", case_name));
        }
        if let Some(case_summary) = input.case_summary {
            builder = builder.bind(("case_summary", case_summary));
        }
        // Inner `None` clears the field.
        if let Some(case_duration) = input.case_duration {
            builder = builder.bind(("case_duration", case_duration));
        }
        if let Some(case_highlights) = input.case_highlights {
            builder = builder.bind(("case_highlights", case_highlights));
        }
        if let Some(case_study_url) = input.case_study_url {
            builder = builder.bind(("case_study_url", case_study_url));
        }

        let response = builder.await.map_err(DbError::from)?;
        if let Err(messages) = failed_statements(response) {
            return Err(content_write_error("case_study", messages, |code| {
                case_study_error(code, id, None)
            }));
        }

        self.get_by_id(id).await
    }

    async fn delete(&self, id: Uuid) -> PitchResult<()> {
        let response = self
            .db
            .query(guarded_script(CAMPAIGN_OF_CASE_STUDY, DELETE_CASE_STUDY))
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        if let Err(messages) = failed_statements(response) {
            return Err(content_write_error("case_study", messages, |code| {
                case_study_error(code, id, None)
            }));
        }
        Ok(())
    }

    async fn list_by_service(&self, client_service_id: Uuid) -> PitchResult<Vec<CaseStudy>> {
        Ok(list_case_studies_for(&self.db, vec![client_service_id.to_string()]).await?)
    }
}
