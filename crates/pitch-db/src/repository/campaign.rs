//! SurrealDB implementation of [`CampaignRepository`].
//!
//! Status is written here exactly once, as `DRAFT` on create. All later
//! status changes go through [`super::SurrealLifecycleRepository`].
//! Creates and edits re-check the archival gate inside their own
//! transaction, and edits also re-check that the campaign is DRAFT.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use pitch_core::error::{PitchError, PitchResult};
use pitch_core::lifecycle::{validate_campaign_name, validate_update};
use pitch_core::models::campaign::{
    Campaign, CampaignContent, CampaignStatus, CampaignStructure, CreateCampaign, CtaConfig,
    ServiceWithCases, UpdateCampaign,
};
use pitch_core::repository::CampaignRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::case_study::list_case_studies_for;
use super::client_service::list_services;
use super::parse_uuid;
use crate::error::DbError;
use crate::transaction::{
    content_write_error, failed_statements, guarded_script, thrown_code, unthrown_failure,
};

/// New campaigns are always DRAFT. The project row is written too so a
/// create cannot commit alongside a concurrent archive.
const CREATE_CAMPAIGN: &str = "\
BEGIN TRANSACTION;
LET $project = (SELECT is_archived FROM type::record('project', $project_id))[0];
IF $project = NONE { THROW 'pitch:project_not_found' };
IF $project.is_archived { THROW 'pitch:archived' };
UPDATE type::record('project', $project_id) SET revision += 1;
CREATE type::record('campaign', $id) SET
    project_id = $project_id,
    campaign_name = $campaign_name,
    campaign_status = 'DRAFT',
    campaign_structure = $campaign_structure,
    cta_config = {};
COMMIT TRANSACTION;
";

#[derive(Debug, SurrealValue)]
struct CampaignRow {
    project_id: String,
    campaign_name: String,
    campaign_status: String,
    campaign_structure: serde_json::Value,
    cta_config: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct CampaignRowWithId {
    record_id: String,
    project_id: String,
    campaign_name: String,
    campaign_status: String,
    campaign_structure: serde_json::Value,
    cta_config: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<CampaignStatus, DbError> {
    s.parse::<CampaignStatus>().map_err(DbError::Decode)
}

impl CampaignRow {
    fn into_campaign(self, id: Uuid) -> Result<Campaign, DbError> {
        let campaign_structure: CampaignStructure =
            serde_json::from_value(self.campaign_structure)
                .map_err(|e| DbError::Decode(format!("campaign_structure: {e}")))?;
        let cta_config: CtaConfig = serde_json::from_value(self.cta_config)
            .map_err(|e| DbError::Decode(format!("cta_config: {e}")))?;
        Ok(Campaign {
            id,
            project_id: parse_uuid("project", &self.project_id)?,
            campaign_name: self.campaign_name,
            campaign_status: parse_status(&self.campaign_status)?,
            campaign_structure,
            cta_config,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl CampaignRowWithId {
    fn try_into_campaign(self) -> Result<Campaign, DbError> {
        let id = parse_uuid("campaign", &self.record_id)?;
        CampaignRow {
            project_id: self.project_id,
            campaign_name: self.campaign_name,
            campaign_status: self.campaign_status,
            campaign_structure: self.campaign_structure,
            cta_config: self.cta_config,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_campaign(id)
    }
}

/// SurrealDB implementation of the Campaign repository.
#[derive(Clone)]
pub struct SurrealCampaignRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCampaignRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CampaignRepository for SurrealCampaignRepository<C> {
    async fn create(&self, input: CreateCampaign) -> PitchResult<Campaign> {
        let campaign_name = validate_campaign_name(&input.campaign_name)?;
        let id = Uuid::new_v4();

        let structure = serde_json::to_value(CampaignStructure::default())
            .map_err(|e| PitchError::Internal(e.to_string()))?;

        let response = self
            .db
            .query(CREATE_CAMPAIGN)
            .bind(("id", id.to_string()))
            .bind(("project_id", input.project_id.to_string()))
            .bind(("campaign_name", campaign_name))
            .bind(("campaign_structure", structure))
            .await
            .map_err(DbError::from)?;

        if let Err(messages) = failed_statements(response) {
            return Err(match thrown_code(&messages).as_deref() {
                Some("project_not_found") => PitchError::not_found("project", input.project_id),
                Some("archived") => PitchError::Archived {
                    project_id: input.project_id.to_string(),
                },
                _ => unthrown_failure("campaign", messages).into(),
            });
        }

        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> PitchResult<Campaign> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('campaign', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CampaignRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "campaign".into(),
            id: id_str,
        })?;

        Ok(row.into_campaign(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateCampaign) -> PitchResult<Campaign> {
        let input = validate_update(input)?;

        let mut sets = Vec::new();
        if input.campaign_name.is_some() {
            sets.push("campaign_name = $campaign_name");
        }
        if input.client_name.is_some() {
            sets.push("campaign_structure.client_name = $client_name");
        }
        if input.client_summary.is_some() {
            sets.push("campaign_structure.client_summary = $client_summary");
        }
        if input.cta_config.is_some() {
            sets.push("cta_config = $cta_config");
        }
        sets.push("updated_at = time::now()");

        let script = guarded_script(
            "LET $target_campaign = $id;",
            &format!(
                "UPDATE type::record('campaign', $id) SET {};",
                sets.join(", ")
            ),
        );

        let mut builder = self.db.query(script).bind(("id", id.to_string()));

        if let Some(campaign_name) = input.campaign_name {
            builder = builder.bind(("campaign_name", campaign_name));
        }
        if let Some(client_name) = input.client_name {
            builder = builder.bind(("client_name", client_name));
        }
        if let Some(client_summary) = input.client_summary {
            builder = builder.bind(("client_summary", client_summary));
        }
        if let Some(cta_config) = input.cta_config {
            let value = serde_json::to_value(cta_config)
                .map_err(|e| PitchError::Internal(e.to_string()))?;
            builder = builder.bind(("cta_config", value));
        }

        let response = builder.await.map_err(DbError::from)?;
        if let Err(messages) = failed_statements(response) {
            return Err(content_write_error("campaign", messages, |_| None));
        }

        self.get_by_id(id).await
    }

    async fn list_by_project(&self, project_id: Uuid) -> PitchResult<Vec<Campaign>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM campaign \
                 WHERE project_id = $project_id \
                 ORDER BY created_at ASC",
            )
            .bind(("project_id", project_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CampaignRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|row| row.try_into_campaign())
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn get_active(&self, project_id: Uuid) -> PitchResult<Option<Campaign>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM campaign \
                 WHERE project_id = $project_id AND campaign_status = 'ACTIVE'",
            )
            .bind(("project_id", project_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CampaignRowWithId> = result.take(0).map_err(DbError::from)?;
        if rows.len() > 1 {
            tracing::error!(
                project_id = %project_id,
                active = rows.len(),
                "More than one ACTIVE campaign found for project"
            );
        }
        Ok(rows
            .into_iter()
            .next()
            .map(|row| row.try_into_campaign())
            .transpose()?)
    }

    async fn get_content(&self, id: Uuid) -> PitchResult<CampaignContent> {
        let campaign = self.get_by_id(id).await?;
        let services = list_services(&self.db, id).await?;

        let service_ids: Vec<String> = services.iter().map(|s| s.id.to_string()).collect();
        let mut by_service: HashMap<Uuid, Vec<_>> = HashMap::new();
        for case in list_case_studies_for(&self.db, service_ids).await? {
            by_service
                .entry(case.client_service_id)
                .or_default()
                .push(case);
        }

        let services = services
            .into_iter()
            .map(|service| ServiceWithCases {
                case_studies: by_service.remove(&service.id).unwrap_or_default(),
                service,
            })
            .collect();

        Ok(CampaignContent { campaign, services })
    }
}
