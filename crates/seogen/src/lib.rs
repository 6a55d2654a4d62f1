pub mod config;
pub mod db;
pub mod dimension;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod store;
pub mod synth;
pub mod worker;

pub use config::{load_config, Config};
pub use db::{Database, DatabaseError, RunLease};
pub use dimension::{Catalog, DimensionSpace, DimensionTuple};
pub use error::{ConfigError, Result, SeogenError, WorkerError};
pub use pipeline::{
    BatchDriver, DriverConfig, DriverError, LogProgress, ProgressEvent, ProgressReporter,
    ProgressTracker, RunSummary,
};
pub use store::{BulkInsertOutcome, IngestionStore, MemoryStore, SqliteStore, StoreError};
pub use synth::{ContentRecord, ContentStatus, ContentSynthesizer};
pub use worker::SynthesisPool;
