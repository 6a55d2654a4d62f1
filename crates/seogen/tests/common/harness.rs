//! Test harness for isolated test execution.
//!
//! Each `TestHarness` owns a temp directory with its own SQLite database, so
//! tests can run in parallel and reopen the same file to simulate restarts.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tempfile::TempDir;

use seogen::config::Config;
use seogen::db::RecordFilter;
use seogen::pipeline::{BatchDriver, DriverError, NoopProgress, RunSummary};
use seogen::store::{BulkInsertOutcome, IngestionStore, SqliteStore, StoreError};
use seogen::synth::ContentRecord;
use seogen::Database;

pub struct TestHarness {
    temp_dir: TempDir,
    pub db_path: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("data").join("seogen.db");
        Self { temp_dir, db_path }
    }

    /// Opens a fresh handle on the harness database, like a new process would.
    pub fn open_store(&self) -> SqliteStore {
        SqliteStore::open(&self.db_path).expect("Failed to open store")
    }

    pub fn open_database(&self) -> Database {
        Database::open(&self.db_path).expect("Failed to open database")
    }

    /// Runs the driver for `config` against `store`.
    pub fn run(
        &self,
        config: &Config,
        store: Arc<dyn IngestionStore>,
    ) -> Result<RunSummary, DriverError> {
        let driver = BatchDriver::from_config(config, store).expect("Invalid test config");
        driver.run(&NoopProgress)
    }

    /// Runs the driver against a fresh handle on the harness database.
    pub fn run_sqlite(&self, config: &Config) -> Result<RunSummary, DriverError> {
        self.run(config, Arc::new(self.open_store()))
    }

    /// Every stored record in index order.
    pub fn all_records(&self) -> Vec<ContentRecord> {
        let store = self.open_store();
        let (rows, _) = store
            .query(&RecordFilter {
                limit: Some(u32::MAX as u64),
                ..RecordFilter::default()
            })
            .expect("Failed to query records");
        rows.into_iter().map(|r| r.record).collect()
    }

    pub fn all_slugs(&self) -> BTreeSet<String> {
        self.all_records().into_iter().map(|r| r.slug).collect()
    }

    /// Write a config file as JSON or YAML depending on the extension.
    pub fn write_config(&self, filename: &str, config: &Config) -> PathBuf {
        let path = self.temp_dir.path().join(filename);
        let content = if filename.ends_with(".yaml") || filename.ends_with(".yml") {
            serde_yaml::to_string(config).expect("Failed to serialize config")
        } else {
            serde_json::to_string_pretty(config).expect("Failed to serialize config")
        };
        std::fs::write(&path, content).expect("Failed to write config file");
        path
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Wraps a store and fails the `fail_on`-th bulk insert (1-based) once.
pub struct FlakyStore<S> {
    inner: S,
    fail_on: u64,
    calls: AtomicU64,
}

impl<S: IngestionStore> FlakyStore<S> {
    pub fn new(inner: S, fail_on: u64) -> Self {
        Self {
            inner,
            fail_on,
            calls: AtomicU64::new(0),
        }
    }
}

impl<S: IngestionStore> IngestionStore for FlakyStore<S> {
    fn count(&self) -> Result<u64, StoreError> {
        self.inner.count()
    }

    fn bulk_insert(&self, records: &[ContentRecord]) -> Result<BulkInsertOutcome, StoreError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on {
            return Err(StoreError::Unavailable("network partition".to_string()));
        }
        self.inner.bulk_insert(records)
    }
}
