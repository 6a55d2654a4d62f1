use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::synth::ContentRecord;

use super::{BulkInsertOutcome, IngestionStore, StoreError};

#[derive(Default)]
struct MemoryState {
    records: BTreeMap<String, ContentRecord>,
    fail_next_insert: bool,
    /// Remaining successful writes before the store "drops the connection"
    /// in the middle of a batch.
    crash_after: Option<u64>,
}

/// In-process store keyed by slug.
///
/// Besides dry runs it is the test double for the pipeline: it can fail a
/// whole bulk insert or cut one off halfway, keeping the records written so
/// far the way an unordered document-store write does.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Makes the next `bulk_insert` fail before writing anything.
    pub fn fail_next_insert(&self) -> Result<(), StoreError> {
        self.lock()?.fail_next_insert = true;
        Ok(())
    }

    /// Lets `writes` more records through, then fails mid-batch once.
    pub fn crash_after_inserts(&self, writes: u64) -> Result<(), StoreError> {
        self.lock()?.crash_after = Some(writes);
        Ok(())
    }

    /// Stored records in index order.
    pub fn records(&self) -> Result<Vec<ContentRecord>, StoreError> {
        let mut records: Vec<ContentRecord> = self.lock()?.records.values().cloned().collect();
        records.sort_by_key(|r| r.index);
        Ok(records)
    }
}

impl IngestionStore for MemoryStore {
    fn count(&self) -> Result<u64, StoreError> {
        Ok(self.lock()?.records.len() as u64)
    }

    fn bulk_insert(&self, records: &[ContentRecord]) -> Result<BulkInsertOutcome, StoreError> {
        let mut state = self.lock()?;

        if state.fail_next_insert {
            state.fail_next_insert = false;
            return Err(StoreError::Unavailable(
                "connection refused before batch".to_string(),
            ));
        }

        let mut outcome = BulkInsertOutcome::default();
        for record in records {
            if state.records.contains_key(&record.slug) {
                outcome.duplicates.insert(record.slug.clone());
                continue;
            }

            match state.crash_after {
                Some(0) => {
                    state.crash_after = None;
                    return Err(StoreError::Unavailable(format!(
                        "connection lost after {} of {} records",
                        outcome.inserted,
                        records.len()
                    )));
                }
                Some(ref mut remaining) => *remaining -= 1,
                None => {}
            }

            state.records.insert(record.slug.clone(), record.clone());
            outcome.inserted += 1;
        }

        Ok(outcome)
    }
}
