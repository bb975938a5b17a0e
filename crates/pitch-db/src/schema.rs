//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode. UUIDs are stored as
//! strings; campaign status is a string with an ASSERT on the three
//! lifecycle values.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Identities (anonymous or permanent)
-- =======================================================================
DEFINE TABLE identity SCHEMAFULL;
DEFINE FIELD kind ON TABLE identity TYPE string \
    ASSERT $value IN ['Anonymous', 'Permanent'];
DEFINE FIELD email ON TABLE identity TYPE option<string>;
DEFINE FIELD created_at ON TABLE identity TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Sessions (refresh tokens, stored hashed)
-- =======================================================================
DEFINE TABLE session SCHEMAFULL;
DEFINE FIELD identity_id ON TABLE session TYPE string;
DEFINE FIELD token_hash ON TABLE session TYPE string;
DEFINE FIELD ip_address ON TABLE session TYPE option<string>;
DEFINE FIELD user_agent ON TABLE session TYPE option<string>;
DEFINE FIELD expires_at ON TABLE session TYPE datetime;
DEFINE FIELD created_at ON TABLE session TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_session_token ON TABLE session \
    COLUMNS token_hash UNIQUE;
DEFINE INDEX idx_session_identity ON TABLE session \
    COLUMNS identity_id;

-- =======================================================================
-- Projects
-- =======================================================================
DEFINE TABLE project SCHEMAFULL;
DEFINE FIELD owner_id ON TABLE project TYPE string;
DEFINE FIELD project_name ON TABLE project TYPE string;
DEFINE FIELD project_url ON TABLE project TYPE option<string>;
DEFINE FIELD is_archived ON TABLE project TYPE bool DEFAULT false;
DEFINE FIELD active_campaign_id ON TABLE project TYPE option<string>;
-- Bumped by writes that must conflict with a concurrent archive.
DEFINE FIELD revision ON TABLE project TYPE int DEFAULT 0;
DEFINE FIELD created_at ON TABLE project TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE project TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_project_owner_name ON TABLE project \
    COLUMNS owner_id, project_name UNIQUE;
DEFINE INDEX idx_project_url ON TABLE project COLUMNS project_url;

-- Public slugs, keyed by the slug itself so that claiming a taken slug
-- fails inside the publish transaction.
DEFINE TABLE project_slug SCHEMAFULL;
DEFINE FIELD project_id ON TABLE project_slug TYPE string;
DEFINE FIELD created_at ON TABLE project_slug TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Campaigns
-- =======================================================================
DEFINE TABLE campaign SCHEMAFULL;
DEFINE FIELD project_id ON TABLE campaign TYPE string;
DEFINE FIELD campaign_name ON TABLE campaign TYPE string;
DEFINE FIELD campaign_status ON TABLE campaign TYPE string \
    ASSERT $value IN ['DRAFT', 'ACTIVE', 'PAUSED'];
DEFINE FIELD campaign_structure ON TABLE campaign TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD cta_config ON TABLE campaign TYPE object FLEXIBLE \
    DEFAULT {};
-- Bumped by every content write and by archive; see DRAFT_GUARD.
DEFINE FIELD revision ON TABLE campaign TYPE int DEFAULT 0;
DEFINE FIELD created_at ON TABLE campaign TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE campaign TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_campaign_project_status ON TABLE campaign \
    COLUMNS project_id, campaign_status;

-- =======================================================================
-- Client services (ordered per campaign)
-- =======================================================================
DEFINE TABLE client_service SCHEMAFULL;
DEFINE FIELD campaign_id ON TABLE client_service TYPE string;
DEFINE FIELD client_service_name ON TABLE client_service TYPE string;
DEFINE FIELD order_index ON TABLE client_service TYPE int \
    ASSERT $value >= 1;
DEFINE FIELD created_at ON TABLE client_service TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_client_service_campaign ON TABLE client_service \
    COLUMNS campaign_id;

-- =======================================================================
-- Case studies
-- =======================================================================
DEFINE TABLE case_study SCHEMAFULL;
DEFINE FIELD client_service_id ON TABLE case_study TYPE string;
DEFINE FIELD case_name ON TABLE case_study TYPE string;
DEFINE FIELD case_summary ON TABLE case_study TYPE string;
DEFINE FIELD case_duration ON TABLE case_study TYPE option<string>;
DEFINE FIELD case_highlights ON TABLE case_study TYPE option<string>;
DEFINE FIELD case_study_url ON TABLE case_study TYPE option<string>;
DEFINE FIELD created_at ON TABLE case_study TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_case_study_service ON TABLE case_study \
    COLUMNS client_service_id;

-- =======================================================================
-- Leads
-- =======================================================================
DEFINE TABLE lead SCHEMAFULL;
DEFINE FIELD campaign_id ON TABLE lead TYPE string;
DEFINE FIELD lead_name ON TABLE lead TYPE string;
DEFINE FIELD lead_company ON TABLE lead TYPE string;
DEFINE FIELD lead_email ON TABLE lead TYPE string;
DEFINE FIELD lead_phone_isd ON TABLE lead TYPE option<string>;
DEFINE FIELD lead_phone ON TABLE lead TYPE option<string>;
DEFINE FIELD meeting_scheduled ON TABLE lead TYPE bool DEFAULT false;
DEFINE FIELD submitter_identity_id ON TABLE lead TYPE string;
DEFINE FIELD created_at ON TABLE lead TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_lead_campaign ON TABLE lead COLUMNS campaign_id;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
