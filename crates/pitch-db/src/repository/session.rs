//! SurrealDB implementation of [`SessionRepository`].
//!
//! Sessions back refresh tokens only; access tokens are stateless. A
//! session row is consumed (deleted) on refresh and sign-out, and the
//! delete reports whether the row was still there so a refresh token
//! cannot be spent twice by racing requests.

use chrono::{DateTime, Utc};
use pitch_core::error::PitchResult;
use pitch_core::models::session::{CreateSession, Session};
use pitch_core::repository::SessionRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;

/// `record_id` is only selected by reads; writes already know the id.
#[derive(Debug, SurrealValue)]
struct SessionRow {
    record_id: Option<String>,
    identity_id: String,
    token_hash: String,
    ip_address: Option<String>,
    user_agent: Option<String>,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_session(self, known_id: Option<Uuid>) -> Result<Session, DbError> {
        let id = match (known_id, self.record_id.as_deref()) {
            (Some(id), _) => id,
            (None, Some(raw)) => parse_uuid("session", raw)?,
            (None, None) => {
                return Err(DbError::Decode("session row without id".into()));
            }
        };
        Ok(Session {
            id,
            identity_id: parse_uuid("identity", &self.identity_id)?,
            token_hash: self.token_hash,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            expires_at: self.expires_at,
            created_at: self.created_at,
        })
    }
}

#[derive(Clone)]
pub struct SurrealSessionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSessionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SessionRepository for SurrealSessionRepository<C> {
    async fn create(&self, input: CreateSession) -> PitchResult<Session> {
        let id = Uuid::new_v4();

        let mut result = self
            .db
            .query(
                "CREATE type::record('session', $id) SET \
                 identity_id = $identity_id, \
                 token_hash = $token_hash, \
                 ip_address = $ip_address, \
                 user_agent = $user_agent, \
                 expires_at = $expires_at",
            )
            .bind(("id", id.to_string()))
            .bind(("identity_id", input.identity_id.to_string()))
            .bind(("token_hash", input.token_hash))
            .bind(("ip_address", input.ip_address))
            .bind(("user_agent", input.user_agent))
            .bind(("expires_at", input.expires_at))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_statement("session", e.to_string()))?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "session".into(),
            id: id.to_string(),
        })?;
        Ok(row.into_session(Some(id))?)
    }

    async fn get_by_token_hash(&self, token_hash: &str) -> PitchResult<Session> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM session \
                 WHERE token_hash = $token_hash LIMIT 1",
            )
            .bind(("token_hash", token_hash.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "session".into(),
            // The hash stands in for a credential; keep it out of messages.
            id: "by token hash".into(),
        })?;
        Ok(row.into_session(None)?)
    }

    async fn invalidate(&self, id: Uuid) -> PitchResult<bool> {
        let mut result = self
            .db
            .query("DELETE type::record('session', $id) RETURN BEFORE")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        Ok(!rows.is_empty())
    }

    async fn invalidate_identity_sessions(&self, identity_id: Uuid) -> PitchResult<u64> {
        let mut result = self
            .db
            .query("DELETE session WHERE identity_id = $identity_id RETURN BEFORE")
            .bind(("identity_id", identity_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.len() as u64)
    }
}
