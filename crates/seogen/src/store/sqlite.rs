use std::path::Path;

use chrono::{SecondsFormat, Utc};

use crate::db::{record_repo, Database, RecordFilter, StoredRecord};
use crate::synth::ContentRecord;

use super::{BulkInsertOutcome, IngestionStore, StoreError};

/// SQLite-backed store. Each bulk insert is one transaction.
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(Self::new(Database::open(path)?))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn find_by_slug(&self, slug: &str) -> Result<Option<StoredRecord>, StoreError> {
        Ok(record_repo::find_by_slug(&self.db, slug)?)
    }

    pub fn query(&self, filter: &RecordFilter) -> Result<(Vec<StoredRecord>, u64), StoreError> {
        Ok(record_repo::query(&self.db, filter)?)
    }

    pub fn count_by_value(&self, catalog: &str) -> Result<Vec<(String, u64)>, StoreError> {
        Ok(record_repo::count_by_value(&self.db, catalog)?)
    }

    /// Moves a record to `published`. False when unknown or already published.
    pub fn publish(&self, slug: &str) -> Result<bool, StoreError> {
        Ok(record_repo::publish(&self.db, slug, &now())?)
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl IngestionStore for SqliteStore {
    fn count(&self) -> Result<u64, StoreError> {
        Ok(record_repo::count(&self.db)?)
    }

    fn bulk_insert(&self, records: &[ContentRecord]) -> Result<BulkInsertOutcome, StoreError> {
        let result = record_repo::insert_batch(&self.db, records, &now())?;
        Ok(BulkInsertOutcome {
            inserted: result.inserted,
            duplicates: result.duplicates.into_iter().collect(),
        })
    }
}
