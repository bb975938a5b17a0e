//! Client service domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientService {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub client_service_name: String,
    /// Dense 1-based position within the campaign.
    pub order_index: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClientService {
    pub campaign_id: Uuid,
    pub client_service_name: String,
}
