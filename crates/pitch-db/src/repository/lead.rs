//! SurrealDB implementation of [`LeadRepository`].

use chrono::{DateTime, Utc};
use pitch_core::error::PitchResult;
use pitch_core::models::lead::{CreateLead, Lead};
use pitch_core::repository::{LeadRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct LeadRow {
    campaign_id: String,
    lead_name: String,
    lead_company: String,
    lead_email: String,
    lead_phone_isd: Option<String>,
    lead_phone: Option<String>,
    meeting_scheduled: bool,
    submitter_identity_id: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct LeadRowWithId {
    record_id: String,
    campaign_id: String,
    lead_name: String,
    lead_company: String,
    lead_email: String,
    lead_phone_isd: Option<String>,
    lead_phone: Option<String>,
    meeting_scheduled: bool,
    submitter_identity_id: String,
    created_at: DateTime<Utc>,
}

impl LeadRow {
    fn into_lead(self, id: Uuid) -> Result<Lead, DbError> {
        Ok(Lead {
            id,
            campaign_id: parse_uuid("campaign", &self.campaign_id)?,
            lead_name: self.lead_name,
            lead_company: self.lead_company,
            lead_email: self.lead_email,
            lead_phone_isd: self.lead_phone_isd,
            lead_phone: self.lead_phone,
            meeting_scheduled: self.meeting_scheduled,
            submitter_identity_id: parse_uuid("identity", &self.submitter_identity_id)?,
            created_at: self.created_at,
        })
    }
}

impl LeadRowWithId {
    fn try_into_lead(self) -> Result<Lead, DbError> {
        let id = parse_uuid("lead", &self.record_id)?;
        LeadRow {
            campaign_id: self.campaign_id,
            lead_name: self.lead_name,
            lead_company: self.lead_company,
            lead_email: self.lead_email,
            lead_phone_isd: self.lead_phone_isd,
            lead_phone: self.lead_phone,
            meeting_scheduled: self.meeting_scheduled,
            submitter_identity_id: self.submitter_identity_id,
            created_at: self.created_at,
        }
        .into_lead(id)
    }
}

/// SurrealDB implementation of the Lead repository.
#[derive(Clone)]
pub struct SurrealLeadRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealLeadRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> LeadRepository for SurrealLeadRepository<C> {
    async fn create(&self, input: CreateLead) -> PitchResult<Lead> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('lead', $id) SET \
                 campaign_id = $campaign_id, \
                 lead_name = $lead_name, \
                 lead_company = $lead_company, \
                 lead_email = $lead_email, \
                 lead_phone_isd = $lead_phone_isd, \
                 lead_phone = $lead_phone, \
                 meeting_scheduled = $meeting_scheduled, \
                 submitter_identity_id = $submitter_identity_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("campaign_id", input.campaign_id.to_string()))
            .bind(("lead_name", input.lead_name))
            .bind(("lead_company", input.lead_company))
            .bind(("lead_email", input.lead_email))
            .bind(("lead_phone_isd", input.lead_phone_isd))
            .bind(("lead_phone", input.lead_phone))
            .bind(("meeting_scheduled", input.meeting_scheduled))
            .bind((
                "submitter_identity_id",
                input.submitter_identity_id.to_string(),
            ))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("lead", e.to_string()))?;

        let rows: Vec<LeadRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "lead".into(),
            id: id_str,
        })?;

        Ok(row.into_lead(id)?)
    }

    async fn list_by_campaign(
        &self,
        campaign_id: Uuid,
        pagination: Pagination,
    ) -> PitchResult<PaginatedResult<Lead>> {
        let campaign_id_str = campaign_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM lead \
                 WHERE campaign_id = $campaign_id GROUP ALL",
            )
            .bind(("campaign_id", campaign_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM lead \
                 WHERE campaign_id = $campaign_id \
                 ORDER BY created_at DESC \
                 LIMIT $limit START $offset",
            )
            .bind(("campaign_id", campaign_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<LeadRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_lead())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
