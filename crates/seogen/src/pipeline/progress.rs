use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::db::RunLease;

use super::batch::BatchReport;
use super::driver::RunSummary;
use super::tracker::ProgressSnapshot;

/// Events emitted by the batch driver during a run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Resumed {
        from: u64,
        target: u64,
        space_size: u64,
    },
    BatchCommitted {
        batch: BatchReport,
        snapshot: ProgressSnapshot,
    },
    Completed {
        summary: RunSummary,
    },
    Failed {
        committed: u64,
        error: String,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Writes each event as a structured tracing line.
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Resumed {
                from,
                target,
                space_size,
            } => {
                tracing::info!(from, target_count = target, space_size, "Resuming generation");
            }
            ProgressEvent::BatchCommitted { batch, snapshot } => {
                tracing::info!(
                    batch = batch.number,
                    inserted = batch.inserted,
                    duplicates = batch.duplicates,
                    count = snapshot.generated_count,
                    target_count = snapshot.target,
                    rate = %format!("{:.1}", snapshot.rate),
                    percentage = %format!("{:.1}", snapshot.percentage),
                    eta = %snapshot.eta,
                    "Batch committed"
                );
            }
            ProgressEvent::Completed { summary } => {
                tracing::info!(
                    final_count = summary.final_count,
                    inserted = summary.inserted,
                    duplicates = summary.duplicates,
                    batches = summary.batches,
                    elapsed_secs = summary.elapsed.as_secs_f64(),
                    "Generation complete"
                );
            }
            ProgressEvent::Failed { committed, error } => {
                tracing::error!(committed, error = %error, "Generation failed");
            }
        }
    }
}

/// Fans events out to dashboard subscribers.
pub struct BroadcastProgress {
    sender: Arc<broadcast::Sender<ProgressEvent>>,
}

impl BroadcastProgress {
    pub fn new(sender: Arc<broadcast::Sender<ProgressEvent>>) -> Self {
        Self { sender }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self::new(Arc::new(sender))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.sender.subscribe()
    }
}

impl ProgressReporter for BroadcastProgress {
    fn report(&self, event: ProgressEvent) {
        // No subscribers is fine.
        let _ = self.sender.send(event);
    }
}

/// Forwards every event to several reporters in order.
pub struct FanoutProgress {
    reporters: Vec<Box<dyn ProgressReporter>>,
}

impl FanoutProgress {
    pub fn new(reporters: Vec<Box<dyn ProgressReporter>>) -> Self {
        Self { reporters }
    }
}

impl ProgressReporter for FanoutProgress {
    fn report(&self, event: ProgressEvent) {
        for reporter in &self.reporters {
            reporter.report(event.clone());
        }
    }
}

/// Renews a run lease on every committed batch before forwarding the event.
/// A renewal that fails raises the cancel flag, so the driver stops before
/// the next batch instead of running beside a new holder.
pub struct LeasedProgress<'a, R> {
    inner: R,
    lease: &'a RunLease,
    cancel: Arc<AtomicBool>,
}

impl<'a, R: ProgressReporter> LeasedProgress<'a, R> {
    pub fn new(inner: R, lease: &'a RunLease, cancel: Arc<AtomicBool>) -> Self {
        Self {
            inner,
            lease,
            cancel,
        }
    }
}

impl<R: ProgressReporter> ProgressReporter for LeasedProgress<'_, R> {
    fn report(&self, event: ProgressEvent) {
        if matches!(event, ProgressEvent::BatchCommitted { .. }) {
            if let Err(e) = self.lease.renew() {
                tracing::error!(
                    lease = self.lease.name(),
                    error = %e,
                    "Lost run lease, stopping after this batch"
                );
                self.cancel.store(true, Ordering::Relaxed);
            }
        }
        self.inner.report(event);
    }
}

/// Writes each received event to `out` as one JSON object per line until
/// every sender is dropped. Returns the number of lines written.
pub fn write_json_lines<W: Write>(
    mut rx: broadcast::Receiver<ProgressEvent>,
    mut out: W,
) -> io::Result<u64> {
    let mut written = 0;
    loop {
        match rx.blocking_recv() {
            Ok(event) => {
                serde_json::to_writer(&mut out, &event)?;
                out.write_all(b"\n")?;
                out.flush()?;
                written += 1;
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Progress subscriber fell behind");
            }
            Err(RecvError::Closed) => return Ok(written),
        }
    }
}
