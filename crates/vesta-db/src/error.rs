//! Database-specific error types and conversions.
//!
//! State-machine transactions signal precondition failures with
//! `THROW 'conflict: …'`-style sentinels. [`DbError::from_query`]
//! classifies those back into typed errors at the transaction
//! boundary, so store-level details never leak past this crate.

use vesta_core::error::VestaError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Stored row could not be decoded: {0}")]
    Decode(String),
}

/// Sentinel prefixes thrown inside store transactions.
const CONFLICT: &str = "conflict:";
const INVALID_TRANSITION: &str = "invalid_transition:";
const NOT_FOUND: &str = "not_found:";
const UNAVAILABLE: &str = "unavailable:";

impl DbError {
    /// Classify a failed query result.
    ///
    /// Transaction `THROW` messages surface through the driver as
    /// plain error strings; anything carrying one of our sentinel
    /// prefixes becomes the corresponding typed error, everything else
    /// stays a raw database error.
    pub fn from_query(err: surrealdb::Error) -> Self {
        match classify_message(&err.to_string()) {
            Some(classified) => classified,
            None => DbError::Surreal(err),
        }
    }
}

/// Classify an error message carrying a sentinel prefix; `None` when
/// the message is not one of ours.
fn classify_message(msg: &str) -> Option<DbError> {
    if let Some(detail) = tail(msg, CONFLICT) {
        return Some(DbError::Conflict(detail));
    }
    if let Some(detail) = tail(msg, INVALID_TRANSITION) {
        return Some(DbError::InvalidTransition(detail));
    }
    if let Some(entity) = tail(msg, NOT_FOUND) {
        return Some(DbError::NotFound {
            entity,
            id: String::new(),
        });
    }
    if let Some(detail) = tail(msg, UNAVAILABLE) {
        return Some(DbError::Unavailable(detail));
    }

    // Unique-index violations are conflicts too (e.g. duplicate unit
    // numbers), per the error-translation contract.
    if msg.contains("already contains") {
        return Some(DbError::Conflict(msg.to_string()));
    }

    None
}

fn tail(msg: &str, prefix: &str) -> Option<String> {
    msg.find(prefix)
        .map(|at| msg[at + prefix.len()..].trim().to_string())
}

impl From<DbError> for VestaError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => VestaError::NotFound { entity, id },
            DbError::Conflict(message) => VestaError::Conflict { message },
            DbError::InvalidTransition(message) => VestaError::InvalidTransition { message },
            DbError::Unavailable(entity) => VestaError::Unavailable { entity },
            other => VestaError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_classification() {
        match classify_message("An error occurred: conflict: unit already rented") {
            Some(DbError::Conflict(detail)) => assert_eq!(detail, "unit already rented"),
            other => panic!("expected Conflict, got {other:?}"),
        }

        assert!(matches!(
            classify_message("invalid_transition: reservation is already closed"),
            Some(DbError::InvalidTransition(_))
        ));
        assert!(matches!(
            classify_message("unavailable: area"),
            Some(DbError::Unavailable(_))
        ));
        assert!(matches!(
            classify_message("not_found: unit"),
            Some(DbError::NotFound { .. })
        ));
    }

    #[test]
    fn index_violations_become_conflicts() {
        let msg = "Database index `idx_unit_number` already contains '101'";
        assert!(matches!(classify_message(msg), Some(DbError::Conflict(_))));
    }

    #[test]
    fn unclassified_errors_stay_raw() {
        assert!(classify_message("parse error at line 1").is_none());
    }

    #[test]
    fn conversion_to_core_taxonomy() {
        let core: VestaError = DbError::InvalidTransition("already cancelled".into()).into();
        assert!(matches!(core, VestaError::InvalidTransition { .. }));

        let core: VestaError = DbError::Decode("bad uuid".into()).into();
        assert!(matches!(core, VestaError::Database(_)));
    }
}
