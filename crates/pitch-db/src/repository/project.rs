//! SurrealDB implementation of [`ProjectRepository`].

use chrono::{DateTime, Utc};
use pitch_core::error::{PitchError, PitchResult};
use pitch_core::lifecycle::validate_project_name;
use pitch_core::models::project::{CreateProject, Project, UpdateProject};
use pitch_core::repository::{PaginatedResult, Pagination, ProjectRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, parse_optional_uuid, parse_uuid};
use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct ProjectRow {
    owner_id: String,
    project_name: String,
    project_url: Option<String>,
    is_archived: bool,
    active_campaign_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct ProjectRowWithId {
    record_id: String,
    owner_id: String,
    project_name: String,
    project_url: Option<String>,
    is_archived: bool,
    active_campaign_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProjectRow {
    fn into_project(self, id: Uuid) -> Result<Project, DbError> {
        Ok(Project {
            id,
            owner_id: parse_uuid("owner", &self.owner_id)?,
            project_name: self.project_name,
            project_url: self.project_url,
            is_archived: self.is_archived,
            active_campaign_id: parse_optional_uuid("campaign", self.active_campaign_id)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl ProjectRowWithId {
    fn try_into_project(self) -> Result<Project, DbError> {
        let id = parse_uuid("project", &self.record_id)?;
        ProjectRow {
            owner_id: self.owner_id,
            project_name: self.project_name,
            project_url: self.project_url,
            is_archived: self.is_archived,
            active_campaign_id: self.active_campaign_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_project(id)
    }
}

/// SurrealDB implementation of the Project repository.
#[derive(Clone)]
pub struct SurrealProjectRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealProjectRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ProjectRepository for SurrealProjectRepository<C> {
    async fn create(&self, input: CreateProject) -> PitchResult<Project> {
        let project_name = validate_project_name(&input.project_name)?;
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('project', $id) SET \
                 owner_id = $owner_id, \
                 project_name = $project_name, \
                 project_url = NONE, \
                 is_archived = false, \
                 active_campaign_id = NONE",
            )
            .bind(("id", id_str.clone()))
            .bind(("owner_id", input.owner_id.to_string()))
            .bind(("project_name", project_name))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("project", e.to_string()))?;

        let rows: Vec<ProjectRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "project".into(),
            id: id_str,
        })?;

        Ok(row.into_project(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> PitchResult<Project> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('project', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProjectRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "project".into(),
            id: id_str,
        })?;

        Ok(row.into_project(id)?)
    }

    async fn get_by_slug(&self, slug: &str) -> PitchResult<Project> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM project \
                 WHERE project_url = $slug",
            )
            .bind(("slug", slug.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProjectRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "project".into(),
            id: format!("slug={slug}"),
        })?;

        Ok(row.try_into_project()?)
    }

    async fn update(&self, id: Uuid, input: UpdateProject) -> PitchResult<Project> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        let project_name = input
            .project_name
            .as_deref()
            .map(validate_project_name)
            .transpose()?;
        if project_name.is_some() {
            sets.push("project_name = $project_name");
        }
        sets.push("updated_at = time::now()");

        // Archived projects are frozen; the row write also conflicts with
        // a concurrent archive.
        let query = format!(
            "UPDATE type::record('project', $id) SET {} WHERE is_archived = false",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str));
        if let Some(project_name) = project_name {
            builder = builder.bind(("project_name", project_name));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("project", e.to_string()))?;

        let rows: Vec<ProjectRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(row.into_project(id)?),
            None => {
                // Either the record is gone or it is archived.
                let current = self.get_by_id(id).await?;
                Err(PitchError::Archived {
                    project_id: current.id.to_string(),
                })
            }
        }
    }

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        pagination: Pagination,
    ) -> PitchResult<PaginatedResult<Project>> {
        let owner_id_str = owner_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM project \
                 WHERE owner_id = $owner_id GROUP ALL",
            )
            .bind(("owner_id", owner_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM project \
                 WHERE owner_id = $owner_id \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("owner_id", owner_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProjectRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_project())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
