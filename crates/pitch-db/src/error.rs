//! Database-specific error types and conversions.

use pitch_core::error::PitchError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Record already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Malformed row: {0}")]
    Decode(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Transaction conflict: {0}")]
    Conflict(String),
}

impl DbError {
    /// Classify a failed statement by its message.
    pub(crate) fn from_statement(entity: &str, message: String) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("already contains") || lower.contains("already exists") {
            DbError::AlreadyExists {
                entity: entity.into(),
            }
        } else if is_conflict(&lower) {
            DbError::Conflict(message)
        } else {
            DbError::Query(message)
        }
    }
}

pub(crate) fn is_conflict(lower: &str) -> bool {
    lower.contains("conflict") || lower.contains("can be retried")
}

impl From<DbError> for PitchError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => PitchError::NotFound { entity, id },
            DbError::AlreadyExists { entity } => PitchError::AlreadyExists { entity },
            DbError::Conflict(msg) => PitchError::TransactionConflict(msg),
            other => PitchError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_index_violation_is_already_exists() {
        let err = DbError::from_statement(
            "project",
            "Database index `idx_project_owner_name` already contains ['a', 'b']".into(),
        );
        assert!(matches!(err, DbError::AlreadyExists { .. }));
    }

    #[test]
    fn commit_conflict_maps_to_transaction_conflict() {
        let err = DbError::from_statement(
            "campaign",
            "Failed to commit transaction due to a read or write conflict. \
             This transaction can be retried"
                .into(),
        );
        assert!(matches!(
            PitchError::from(err),
            PitchError::TransactionConflict(_)
        ));
    }
}
