//! Resumable batch generation: plan a batch, synthesize it, insert it,
//! report, repeat until the store holds the target count.

pub mod batch;
pub mod config;
pub mod driver;
pub mod error;
pub mod progress;
pub mod tracker;

pub use batch::{BatchPlan, BatchReport};
pub use config::DriverConfig;
pub use driver::{BatchDriver, RunSummary};
pub use error::DriverError;
pub use progress::{
    write_json_lines, BroadcastProgress, FanoutProgress, LeasedProgress, LogProgress, NoopProgress,
    ProgressEvent, ProgressReporter,
};
pub use tracker::{sample, Eta, ProgressSnapshot, ProgressTracker};
