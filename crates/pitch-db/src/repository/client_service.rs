//! SurrealDB implementation of [`ClientServiceRepository`].
//!
//! `order_index` is kept dense (1..=n) per campaign. Every write runs as
//! a single transaction behind the DRAFT guard, so a concurrent writer
//! never observes a gap or a duplicate position and a live campaign's
//! services never change.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use pitch_core::error::{PitchError, PitchResult};
use pitch_core::lifecycle::validate_service_name;
use pitch_core::models::client_service::{ClientService, CreateClientService};
use pitch_core::repository::ClientServiceRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;
use crate::transaction::{content_write_error, failed_statements, guarded_script};

#[derive(Debug, SurrealValue)]
struct ClientServiceRow {
    campaign_id: String,
    client_service_name: String,
    order_index: u32,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ClientServiceRowWithId {
    record_id: String,
    campaign_id: String,
    client_service_name: String,
    order_index: u32,
    created_at: DateTime<Utc>,
}

impl ClientServiceRow {
    fn into_service(self, id: Uuid) -> Result<ClientService, DbError> {
        Ok(ClientService {
            id,
            campaign_id: parse_uuid("campaign", &self.campaign_id)?,
            client_service_name: self.client_service_name,
            order_index: self.order_index,
            created_at: self.created_at,
        })
    }
}

impl ClientServiceRowWithId {
    fn try_into_service(self) -> Result<ClientService, DbError> {
        let id = parse_uuid("client_service", &self.record_id)?;
        ClientServiceRow {
            campaign_id: self.campaign_id,
            client_service_name: self.client_service_name,
            order_index: self.order_index,
            created_at: self.created_at,
        }
        .into_service(id)
    }
}

/// Services of a campaign in display order.
pub(super) async fn list_services<C: Connection>(
    db: &Surreal<C>,
    campaign_id: Uuid,
) -> Result<Vec<ClientService>, DbError> {
    let mut result = db
        .query(
            "SELECT meta::id(id) AS record_id, * FROM client_service \
             WHERE campaign_id = $campaign_id \
             ORDER BY order_index ASC",
        )
        .bind(("campaign_id", campaign_id.to_string()))
        .await?;

    let rows: Vec<ClientServiceRowWithId> = result.take(0)?;
    rows.into_iter().map(|row| row.try_into_service()).collect()
}

// Each script resolves the owning campaign into `$target_campaign`
// and runs behind the DRAFT guard.

const CAMPAIGN_OF_INPUT: &str = "LET $target_campaign = $campaign_id;";

const CAMPAIGN_OF_SERVICE: &str = "\
LET $service = (SELECT campaign_id, order_index FROM type::record('client_service', $id))[0];
IF $service = NONE { THROW 'pitch:service_not_found' };
LET $target_campaign = $service.campaign_id;";

const APPEND_SERVICE: &str = "\
LET $position = array::len(
    (SELECT VALUE id FROM client_service WHERE campaign_id = $campaign_id)
) + 1;
CREATE type::record('client_service', $id) SET
    campaign_id = $campaign_id,
    client_service_name = $client_service_name,
    order_index = $position;";

const RENAME_SERVICE: &str = "\
UPDATE type::record('client_service', $id) SET
    client_service_name = $client_service_name;";

const DELETE_SERVICE: &str = "\
DELETE case_study WHERE client_service_id = $id;
DELETE type::record('client_service', $id);
FOR $row IN (
    SELECT id, order_index FROM client_service
    WHERE campaign_id = $service.campaign_id
      AND order_index > $service.order_index
) {
    UPDATE $row.id SET order_index = $row.order_index - 1;
};";

const REORDER_SERVICES: &str = "\
LET $current = (SELECT VALUE id FROM client_service WHERE campaign_id = $campaign_id);
IF array::len($current) != array::len($entries) { THROW 'pitch:stale_order' };
FOR $entry IN $entries {
    UPDATE type::record('client_service', $entry.id)
        SET order_index = $entry.position
        WHERE campaign_id = $campaign_id;
};";

fn service_not_found(code: &str, id: Uuid) -> Option<PitchError> {
    (code == "service_not_found").then(|| PitchError::not_found("client_service", id))
}

/// SurrealDB implementation of the ClientService repository.
#[derive(Clone)]
pub struct SurrealClientServiceRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealClientServiceRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ClientServiceRepository for SurrealClientServiceRepository<C> {
    async fn create(&self, input: CreateClientService) -> PitchResult<ClientService> {
        let client_service_name = validate_service_name(&input.client_service_name)?;
        let id = Uuid::new_v4();

        let response = self
            .db
            .query(guarded_script(CAMPAIGN_OF_INPUT, APPEND_SERVICE))
            .bind(("id", id.to_string()))
            .bind(("campaign_id", input.campaign_id.to_string()))
            .bind(("client_service_name", client_service_name))
            .await
            .map_err(DbError::from)?;

        if let Err(messages) = failed_statements(response) {
            return Err(content_write_error("client_service", messages, |_| None));
        }

        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> PitchResult<ClientService> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('client_service', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ClientServiceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "client_service".into(),
            id: id_str,
        })?;

        Ok(row.into_service(id)?)
    }

    async fn rename(&self, id: Uuid, client_service_name: String) -> PitchResult<ClientService> {
        let client_service_name = validate_service_name(&client_service_name)?;

        let response = self
            .db
            .query(guarded_script(CAMPAIGN_OF_SERVICE, RENAME_SERVICE))
            .bind(("id", id.to_string()))
            .bind(("client_service_name", client_service_name))
            .await
            .map_err(DbError::from)?;

        if let Err(messages) = failed_statements(response) {
            return Err(content_write_error("client_service", messages, |code| {
                service_not_found(code, id)
            }));
        }

        self.get_by_id(id).await
    }

    async fn delete(&self, id: Uuid) -> PitchResult<()> {
        let response = self
            .db
            .query(guarded_script(CAMPAIGN_OF_SERVICE, DELETE_SERVICE))
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        if let Err(messages) = failed_statements(response) {
            return Err(content_write_error("client_service", messages, |code| {
                service_not_found(code, id)
            }));
        }
        Ok(())
    }

    async fn reorder(
        &self,
        campaign_id: Uuid,
        ordered_ids: Vec<Uuid>,
    ) -> PitchResult<Vec<ClientService>> {
        let current = list_services(&self.db, campaign_id).await?;
        let known: HashSet<Uuid> = current.iter().map(|s| s.id).collect();
        let requested: HashSet<Uuid> = ordered_ids.iter().copied().collect();
        if requested.len() != ordered_ids.len() || requested != known {
            return Err(PitchError::validation(
                "order must list every service of the campaign exactly once",
            ));
        }

        let entries: Vec<serde_json::Value> = ordered_ids
            .iter()
            .enumerate()
            .map(|(idx, id)| {
                serde_json::json!({
                    "id": id.to_string(),
                    "position": idx + 1,
                })
            })
            .collect();

        let response = self
            .db
            .query(guarded_script(CAMPAIGN_OF_INPUT, REORDER_SERVICES))
            .bind(("campaign_id", campaign_id.to_string()))
            .bind(("entries", serde_json::Value::Array(entries)))
            .await
            .map_err(DbError::from)?;

        if let Err(messages) = failed_statements(response) {
            return Err(content_write_error("client_service", messages, |code| {
                (code == "stale_order").then(|| {
                    PitchError::invalid_state(
                        "services changed while reordering; reload and try again",
                    )
                })
            }));
        }

        Ok(list_services(&self.db, campaign_id).await?)
    }

    async fn list_by_campaign(&self, campaign_id: Uuid) -> PitchResult<Vec<ClientService>> {
        Ok(list_services(&self.db, campaign_id).await?)
    }
}
