//! SurrealDB implementation of [`LifecycleRepository`].
//!
//! Each transition is one SurrealQL transaction. The scripts re-check
//! every precondition that depends on stored state and abort with
//! `THROW 'pitch:<code>'`; the codes are mapped back to domain errors
//! here. Every script writes the project row, so two transitions on the
//! same project always touch a common key and cannot both commit on a
//! stale read of the ACTIVE campaign.
//!
//! Publish re-checks publishability against the content it reads, and
//! archive bumps the `revision` of every campaign in the project. Content
//! writes bump the same field, so an edit racing either transition fails
//! one side instead of landing on a live or archived campaign.

use pitch_core::error::{PitchError, PitchResult};
use pitch_core::lifecycle::{Transition, ensure_publishable, next_status};
use pitch_core::models::campaign::{CampaignStatus, TransitionOutcome};
use pitch_core::repository::{CampaignRepository, LifecycleRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::SurrealCampaignRepository;
use crate::error::DbError;
use crate::transaction::{failed_statements, thrown_code, unthrown_failure};

const PUBLISH: &str = "\
BEGIN TRANSACTION;
LET $project = (SELECT * FROM type::record('project', $project_id))[0];
IF $project = NONE { THROW 'pitch:project_not_found' };
IF $project.is_archived { THROW 'pitch:archived' };
LET $campaign = (SELECT * FROM type::record('campaign', $campaign_id))[0];
IF $campaign = NONE OR $campaign.project_id != $project_id {
    THROW 'pitch:campaign_not_found'
};
IF $campaign.campaign_status != 'DRAFT' { THROW 'pitch:not_draft' };
LET $structure = $campaign.campaign_structure ?? {};
LET $services = (SELECT VALUE meta::id(id) FROM client_service WHERE campaign_id = $campaign_id);
LET $covered = array::distinct(
    (SELECT VALUE client_service_id FROM case_study WHERE client_service_id IN $services)
);
IF string::len(string::trim($structure.client_name ?? '')) = 0
    OR string::len(string::trim($structure.client_summary ?? '')) = 0
    OR string::len(string::trim(array::join(object::values($campaign.cta_config ?? {}), ''))) = 0
    OR array::len($services) = 0
    OR array::len($covered) < array::len($services) {
    THROW 'pitch:not_publishable'
};
LET $url = $project.project_url ?? $slug;
IF $url = NONE { THROW 'pitch:slug_required' };
IF $project.project_url = NONE {
    CREATE type::record('project_slug', $slug) SET project_id = $project_id;
};
UPDATE campaign SET campaign_status = 'PAUSED', updated_at = time::now()
    WHERE project_id = $project_id AND campaign_status = 'ACTIVE';
UPDATE type::record('campaign', $campaign_id)
    SET campaign_status = 'ACTIVE', updated_at = time::now();
UPDATE type::record('project', $project_id) SET
    project_url = $url,
    active_campaign_id = $campaign_id,
    updated_at = time::now();
COMMIT TRANSACTION;
";

const SWITCH: &str = "\
BEGIN TRANSACTION;
LET $project = (SELECT * FROM type::record('project', $project_id))[0];
IF $project = NONE { THROW 'pitch:project_not_found' };
IF $project.is_archived { THROW 'pitch:archived' };
LET $target = (SELECT * FROM type::record('campaign', $campaign_id))[0];
IF $target = NONE OR $target.project_id != $project_id {
    THROW 'pitch:campaign_not_found'
};
IF $target.campaign_status = 'ACTIVE' { THROW 'pitch:already_active' };
UPDATE campaign SET campaign_status = 'PAUSED', updated_at = time::now()
    WHERE project_id = $project_id AND campaign_status = 'ACTIVE';
UPDATE type::record('campaign', $campaign_id)
    SET campaign_status = 'ACTIVE', updated_at = time::now();
UPDATE type::record('project', $project_id) SET
    active_campaign_id = $campaign_id,
    updated_at = time::now();
COMMIT TRANSACTION;
";

const ARCHIVE: &str = "\
BEGIN TRANSACTION;
LET $project = (SELECT * FROM type::record('project', $project_id))[0];
IF $project = NONE { THROW 'pitch:project_not_found' };
IF !$project.is_archived {
    UPDATE campaign SET campaign_status = 'PAUSED', updated_at = time::now()
        WHERE project_id = $project_id AND campaign_status = 'ACTIVE';
    UPDATE campaign SET revision += 1 WHERE project_id = $project_id;
    UPDATE type::record('project', $project_id) SET
        is_archived = true,
        active_campaign_id = NONE,
        updated_at = time::now();
};
COMMIT TRANSACTION;
";

#[derive(Debug, SurrealValue)]
struct ProjectStateRow {
    project_url: Option<String>,
    is_archived: bool,
}

#[derive(Debug, SurrealValue)]
struct StatusRow {
    campaign_status: String,
}

/// SurrealDB implementation of the lifecycle transitions.
#[derive(Clone)]
pub struct SurrealLifecycleRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealLifecycleRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn project_state(&self, project_id: Uuid) -> PitchResult<ProjectStateRow> {
        let mut result = self
            .db
            .query("SELECT project_url, is_archived FROM type::record('project', $id)")
            .bind(("id", project_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProjectStateRow> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| PitchError::not_found("project", project_id))
    }

    async fn campaign_status(&self, campaign_id: Uuid) -> PitchResult<CampaignStatus> {
        let mut result = self
            .db
            .query("SELECT campaign_status FROM type::record('campaign', $id)")
            .bind(("id", campaign_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StatusRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| PitchError::not_found("campaign", campaign_id))?;
        row.campaign_status
            .parse()
            .map_err(|e: String| DbError::Decode(e).into())
    }

    /// Turn a thrown code into the matching domain error.
    async fn thrown_error(
        &self,
        code: &str,
        project_id: Uuid,
        campaign_id: Option<Uuid>,
        transition: Transition,
    ) -> PitchError {
        match code {
            "project_not_found" => PitchError::not_found("project", project_id),
            "campaign_not_found" => PitchError::not_found(
                "campaign",
                campaign_id.map(|id| id.to_string()).unwrap_or_default(),
            ),
            "archived" => PitchError::Archived {
                project_id: project_id.to_string(),
            },
            "not_draft" | "already_active" => {
                let Some(campaign_id) = campaign_id else {
                    return PitchError::Internal(format!("unexpected transition code {code}"));
                };
                // Re-read only to phrase the message; the transaction has
                // already been rolled back.
                match self.campaign_status(campaign_id).await {
                    Ok(status) => match next_status(status, transition) {
                        Err(err) => err,
                        Ok(_) => PitchError::TransactionConflict(
                            "campaign status changed during the transition".into(),
                        ),
                    },
                    Err(err) => err,
                }
            }
            "not_publishable" => {
                let Some(campaign_id) = campaign_id else {
                    return PitchError::Internal(format!("unexpected transition code {code}"));
                };
                // Recompute the reasons outside the rolled-back transaction.
                match SurrealCampaignRepository::new(self.db.clone())
                    .get_content(campaign_id)
                    .await
                {
                    Ok(content) => match ensure_publishable(&content) {
                        Err(err) => err,
                        Ok(()) => PitchError::TransactionConflict(
                            "campaign content changed during publish".into(),
                        ),
                    },
                    Err(err) => err,
                }
            }
            "slug_required" => PitchError::invalid_state(
                "project has no public URL yet and no slug was supplied",
            ),
            other => PitchError::Internal(format!("unexpected transition code {other}")),
        }
    }

    async fn run(
        &self,
        script: &'static str,
        project_id: Uuid,
        campaign_id: Option<Uuid>,
        slug: Option<String>,
        transition: Transition,
    ) -> PitchResult<()> {
        let mut builder = self
            .db
            .query(script)
            .bind(("project_id", project_id.to_string()));
        if let Some(campaign_id) = campaign_id {
            builder = builder.bind(("campaign_id", campaign_id.to_string()));
        }
        if matches!(transition, Transition::Publish) {
            builder = builder.bind(("slug", slug));
        }

        let response = builder.await.map_err(DbError::from)?;
        match failed_statements(response) {
            Ok(_) => Ok(()),
            Err(messages) => match thrown_code(&messages) {
                Some(code) => Err(self
                    .thrown_error(&code, project_id, campaign_id, transition)
                    .await),
                None => Err(unthrown_failure("project_slug", messages).into()),
            },
        }
    }
}

impl<C: Connection> LifecycleRepository for SurrealLifecycleRepository<C> {
    async fn publish(
        &self,
        project_id: Uuid,
        campaign_id: Uuid,
        new_slug: Option<String>,
    ) -> PitchResult<TransitionOutcome> {
        self.run(
            PUBLISH,
            project_id,
            Some(campaign_id),
            new_slug,
            Transition::Publish,
        )
        .await?;

        let state = self.project_state(project_id).await?;
        Ok(TransitionOutcome {
            success: true,
            message: "Campaign published".into(),
            project_url: state.project_url,
        })
    }

    async fn switch(&self, project_id: Uuid, target_id: Uuid) -> PitchResult<TransitionOutcome> {
        self.run(
            SWITCH,
            project_id,
            Some(target_id),
            None,
            Transition::SwitchTarget,
        )
        .await?;

        let state = self.project_state(project_id).await?;
        Ok(TransitionOutcome {
            success: true,
            message: "Active campaign switched".into(),
            project_url: state.project_url,
        })
    }

    async fn archive(&self, project_id: Uuid) -> PitchResult<TransitionOutcome> {
        let before = self.project_state(project_id).await?;
        if before.is_archived {
            return Ok(TransitionOutcome {
                success: true,
                message: "Project is already archived".into(),
                project_url: before.project_url,
            });
        }

        self.run(ARCHIVE, project_id, None, None, Transition::Archive)
            .await?;

        Ok(TransitionOutcome {
            success: true,
            message: "Project archived".into(),
            project_url: before.project_url,
        })
    }
}
