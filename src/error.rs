//! # Error Handling
//!
//! Engine-level error types and database error classification shared across
//! the fetch, reconcile, and lifecycle paths. Run bodies propagate
//! `EngineError` internally; the engine converts any escaped error into a
//! failed run record at the boundary.

use thiserror::Error;

use crate::reconcile::ReconcileError;
use crate::session::SessionError;
use crate::sources::{FetchError, RegistryError};

/// Umbrella error for scrape and sweep runs.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Database query or execution failure outside the per-record paths
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Source fetch failed after retries
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Session pool could not produce a usable session
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Reconciliation failed for a whole run (per-record failures are counted
    /// instead)
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// A job referenced a source id that is not registered
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Whether a database error is a unique constraint violation.
///
/// Used by the reconciler to recover when a concurrent writer created the
/// same identity key first: the insert loser re-reads and merges instead of
/// failing the record.
pub fn is_unique_violation(error: &sea_orm::DbErr) -> bool {
    use sea_orm::RuntimeErr;

    const PG_UNIQUE: &str = "23505";
    const SQLITE_DUPLICATE_CODES: &[&str] = &["1555", "2067"];

    let runtime_err = match error {
        sea_orm::DbErr::Query(RuntimeErr::SqlxError(sqlx_err))
        | sea_orm::DbErr::Exec(RuntimeErr::SqlxError(sqlx_err)) => sqlx_err,
        _ => return false,
    };

    let Some(db_error) = runtime_err.as_database_error() else {
        return false;
    };

    if db_error.is_unique_violation() {
        return true;
    }

    match db_error.code() {
        Some(code) => {
            let code_str = code.as_ref();
            code_str == PG_UNIQUE || SQLITE_DUPLICATE_CODES.contains(&code_str)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_sqlx_errors_are_not_unique_violations() {
        let error = sea_orm::DbErr::RecordNotFound("players".to_string());
        assert!(!is_unique_violation(&error));

        let error = sea_orm::DbErr::Custom("duplicate key".to_string());
        assert!(!is_unique_violation(&error));
    }
}
