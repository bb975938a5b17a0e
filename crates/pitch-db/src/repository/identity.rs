//! SurrealDB implementation of [`IdentityRepository`].

use chrono::{DateTime, Utc};
use pitch_core::error::PitchResult;
use pitch_core::models::identity::{CreateIdentity, Identity, IdentityKind};
use pitch_core::repository::IdentityRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct IdentityRow {
    kind: String,
    email: Option<String>,
    created_at: DateTime<Utc>,
}

fn parse_kind(kind: &str) -> Result<IdentityKind, DbError> {
    match kind {
        "Anonymous" => Ok(IdentityKind::Anonymous),
        "Permanent" => Ok(IdentityKind::Permanent),
        other => Err(DbError::Decode(format!("unknown identity kind: {other}"))),
    }
}

impl IdentityRow {
    fn into_identity(self, id: Uuid) -> Result<Identity, DbError> {
        Ok(Identity {
            id,
            kind: parse_kind(&self.kind)?,
            email: self.email,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Identity repository.
#[derive(Clone)]
pub struct SurrealIdentityRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealIdentityRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> IdentityRepository for SurrealIdentityRepository<C> {
    async fn create(&self, input: CreateIdentity) -> PitchResult<Identity> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('identity', $id) SET \
                 kind = $kind, \
                 email = $email",
            )
            .bind(("id", id_str.clone()))
            .bind(("kind", input.kind.as_str().to_string()))
            .bind(("email", input.email))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("identity", e.to_string()))?;

        let rows: Vec<IdentityRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "identity".into(),
            id: id_str,
        })?;

        Ok(row.into_identity(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> PitchResult<Identity> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('identity', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<IdentityRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "identity".into(),
            id: id_str,
        })?;

        Ok(row.into_identity(id)?)
    }
}
