use thiserror::Error;

use crate::error::WorkerError;
use crate::store::StoreError;

/// Why a generation run stopped early. Every variant carries the record
/// count the store had acknowledged when the run stopped.
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Store failed after {committed} committed records (cursor {cursor}): {source}")]
    Store {
        committed: u64,
        cursor: u64,
        #[source]
        source: StoreError,
    },

    #[error("Synthesis failed after {committed} committed records: {source}")]
    Worker {
        committed: u64,
        #[source]
        source: WorkerError,
    },

    #[error("Generation cancelled after {committed} committed records")]
    Cancelled { committed: u64 },
}

impl DriverError {
    pub fn committed(&self) -> u64 {
        match self {
            DriverError::Store { committed, .. }
            | DriverError::Worker { committed, .. }
            | DriverError::Cancelled { committed } => *committed,
        }
    }

    /// Whether re-running later is expected to make progress.
    pub fn is_recoverable(&self) -> bool {
        match self {
            DriverError::Store { source, .. } => source.is_recoverable(),
            DriverError::Worker { .. } => false,
            DriverError::Cancelled { .. } => true,
        }
    }
}
