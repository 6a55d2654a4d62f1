use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::config::Config;
use crate::dimension::DimensionSpace;
use crate::error::ConfigError;
use crate::store::IngestionStore;
use crate::synth::{ContentRecord, ContentSynthesizer};
use crate::worker::SynthesisPool;

use super::batch::{BatchPlan, BatchReport};
use super::config::DriverConfig;
use super::error::DriverError;
use super::progress::{ProgressEvent, ProgressReporter};
use super::tracker::ProgressTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DriverState {
    Idle,
    ResumingOffset,
    GeneratingBatch,
    InsertingBatch,
    Reporting,
    Done,
}

/// How a finished run went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Store count when the run started.
    pub resumed_from: u64,
    pub final_count: u64,
    /// Next index that would have been synthesized.
    pub final_cursor: u64,
    pub inserted: u64,
    pub duplicates: u64,
    pub batches: u64,
    pub elapsed: Duration,
}

/// Mutable per-run counters.
struct RunState {
    state: DriverState,
    cursor: u64,
    count: u64,
    inserted: u64,
    duplicates: u64,
    batches: u64,
}

impl RunState {
    fn enter(&mut self, next: DriverState) {
        debug!(from = ?self.state, to = ?next, "Driver state");
        self.state = next;
    }
}

enum Synthesis {
    Sequential,
    Pool(SynthesisPool),
}

/// Fills a store with `target` records, resuming from whatever it holds.
///
/// The cursor is rebuilt from `store.count()` at the start of every run, so a
/// run stopped by a store error, a crash or a cancellation continues where
/// the acknowledged records end.
pub struct BatchDriver {
    config: DriverConfig,
    space: Arc<DimensionSpace>,
    synthesizer: Arc<ContentSynthesizer>,
    store: Arc<dyn IngestionStore>,
    cancel: Arc<AtomicBool>,
}

impl BatchDriver {
    pub fn new(
        config: DriverConfig,
        space: Arc<DimensionSpace>,
        synthesizer: Arc<ContentSynthesizer>,
        store: Arc<dyn IngestionStore>,
    ) -> Self {
        Self {
            config,
            space,
            synthesizer,
            store,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Builds the dimension space, synthesizer and run parameters from a
    /// loaded configuration.
    pub fn from_config(config: &Config, store: Arc<dyn IngestionStore>) -> Result<Self, ConfigError> {
        let space = DimensionSpace::from_config(&config.catalogs)?;
        let synthesizer = ContentSynthesizer::new(&config.templates, &space)?;
        let driver_config = DriverConfig::from_config(&config.generation)?;
        Ok(Self::new(
            driver_config,
            Arc::new(space),
            Arc::new(synthesizer),
            store,
        ))
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn space(&self) -> &DimensionSpace {
        &self.space
    }

    /// Flag checked before each batch and between synthesis and insertion.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn run(&self, progress: &dyn ProgressReporter) -> Result<RunSummary, DriverError> {
        let _run_span = info_span!(
            "generation",
            target_count = self.config.target,
            batch_size = self.config.batch_size,
            workers = self.config.worker_count,
        )
        .entered();

        let started = Instant::now();
        let mut run = RunState {
            state: DriverState::Idle,
            cursor: 0,
            count: 0,
            inserted: 0,
            duplicates: 0,
            batches: 0,
        };

        run.enter(DriverState::ResumingOffset);
        let resumed_from = self.store.count().map_err(|source| {
            let err = DriverError::Store {
                committed: 0,
                cursor: 0,
                source,
            };
            report_failure(progress, &err);
            err
        })?;
        run.cursor = resumed_from;
        run.count = resumed_from;

        let space_size = self.space.size();
        if self.config.target > space_size {
            warn!(
                target_count = self.config.target,
                space_size,
                "Target exceeds the dimension space; tuples will repeat with period {}",
                space_size
            );
        }

        info!(resumed_from, "Resuming from store count");
        progress.report(ProgressEvent::Resumed {
            from: resumed_from,
            target: self.config.target,
            space_size,
        });

        let mut synthesis = if self.config.is_parallel() && resumed_from < self.config.target {
            let pool = SynthesisPool::new(
                Arc::clone(&self.space),
                Arc::clone(&self.synthesizer),
                self.config.worker_count,
            )
            .map_err(|source| {
                let err = DriverError::Worker {
                    committed: resumed_from,
                    source,
                };
                report_failure(progress, &err);
                err
            })?;
            Synthesis::Pool(pool)
        } else {
            Synthesis::Sequential
        };

        let mut tracker = ProgressTracker::new(self.config.target, resumed_from, started);
        let result = self.drive(&mut run, &mut synthesis, &mut tracker, progress);

        if let Synthesis::Pool(pool) = synthesis {
            pool.shutdown();
            pool.wait();
        }

        if let Err(err) = result {
            report_failure(progress, &err);
            return Err(err);
        }

        run.enter(DriverState::Done);
        let summary = RunSummary {
            resumed_from,
            final_count: run.count,
            final_cursor: run.cursor,
            inserted: run.inserted,
            duplicates: run.duplicates,
            batches: run.batches,
            elapsed: started.elapsed(),
        };
        progress.report(ProgressEvent::Completed {
            summary: summary.clone(),
        });
        Ok(summary)
    }

    fn drive(
        &self,
        run: &mut RunState,
        synthesis: &mut Synthesis,
        tracker: &mut ProgressTracker,
        progress: &dyn ProgressReporter,
    ) -> Result<(), DriverError> {
        while let Some(plan) = BatchPlan::next(
            run.batches + 1,
            run.cursor,
            run.count,
            self.config.target,
            self.config.batch_size,
        ) {
            self.check_cancelled(run.count)?;

            let _batch_span = info_span!(
                "batch",
                number = plan.number,
                start = plan.start,
                len = plan.len,
            )
            .entered();

            run.enter(DriverState::GeneratingBatch);
            let records = self.synthesize(synthesis, &plan).map_err(|source| DriverError::Worker {
                committed: run.count,
                source,
            })?;

            self.check_cancelled(run.count)?;

            run.enter(DriverState::InsertingBatch);
            let outcome = self
                .store
                .bulk_insert(&records)
                .map_err(|source| DriverError::Store {
                    committed: run.count,
                    cursor: run.cursor,
                    source,
                })?;

            if !outcome.duplicates.is_empty() {
                debug!(
                    duplicates = outcome.duplicate_count(),
                    "Skipped existing slugs"
                );
            }

            run.cursor = plan.end();
            run.count += outcome.inserted;
            run.inserted += outcome.inserted;
            run.duplicates += outcome.duplicate_count();
            run.batches += 1;

            run.enter(DriverState::Reporting);
            let snapshot = tracker.update(run.count, Instant::now());
            progress.report(ProgressEvent::BatchCommitted {
                batch: BatchReport {
                    number: plan.number,
                    start: plan.start,
                    attempted: plan.len,
                    inserted: outcome.inserted,
                    duplicates: outcome.duplicate_count(),
                },
                snapshot,
            });
        }

        Ok(())
    }

    fn synthesize(
        &self,
        synthesis: &mut Synthesis,
        plan: &BatchPlan,
    ) -> Result<Vec<ContentRecord>, crate::error::WorkerError> {
        match synthesis {
            Synthesis::Pool(pool) => pool.synthesize(plan.start, plan.len),
            Synthesis::Sequential => Ok((plan.start..plan.end())
                .map(|index| {
                    self.synthesizer
                        .synthesize(&self.space.decompose(index), index)
                })
                .collect()),
        }
    }

    fn check_cancelled(&self, committed: u64) -> Result<(), DriverError> {
        if self.cancel.load(Ordering::Relaxed) {
            info!(committed, "Cancellation requested");
            return Err(DriverError::Cancelled { committed });
        }
        Ok(())
    }
}

fn report_failure(progress: &dyn ProgressReporter, err: &DriverError) {
    progress.report(ProgressEvent::Failed {
        committed: err.committed(),
        error: err.to_string(),
    });
}
