//! Destinations for generated records.
//!
//! The pipeline only needs two things from a store: how many records it
//! holds, and an unordered bulk insert that reports duplicate keys per record
//! instead of failing the batch.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::db::DatabaseError;
use crate::synth::ContentRecord;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Connectivity, busy or timeout. The run can be resumed later.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(#[source] DatabaseError),

    #[error("Store lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl From<DatabaseError> for StoreError {
    fn from(err: DatabaseError) -> Self {
        if err.is_transient() {
            StoreError::Unavailable(err.to_string())
        } else {
            StoreError::Database(err)
        }
    }
}

/// Result of one unordered bulk insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkInsertOutcome {
    /// Records the store acknowledged as newly written.
    pub inserted: u64,
    /// Slugs that already existed. Not an error.
    pub duplicates: BTreeSet<String>,
}

impl BulkInsertOutcome {
    pub fn duplicate_count(&self) -> u64 {
        self.duplicates.len() as u64
    }
}

pub trait IngestionStore: Send + Sync {
    /// Number of records currently stored.
    fn count(&self) -> Result<u64, StoreError>;

    /// Writes `records` without stopping at duplicate slugs.
    fn bulk_insert(&self, records: &[ContentRecord]) -> Result<BulkInsertOutcome, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_database_errors_are_unavailable() {
        let busy = DatabaseError::Sqlite(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        ));
        let err = StoreError::from(busy);
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_other_database_errors_are_not_recoverable() {
        let err = StoreError::from(DatabaseError::LockPoisoned);
        assert!(matches!(err, StoreError::Database(_)));
        assert!(!err.is_recoverable());
    }
}
