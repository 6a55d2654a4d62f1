use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, error, info};

use crate::dimension::DimensionSpace;
use crate::error::WorkerError;
use crate::synth::{ContentRecord, ContentSynthesizer};
use crate::worker::job::{split_range, SynthesisJob, SynthesisResult};

/// Fixed set of threads that synthesize index ranges.
///
/// A batch is split into one contiguous chunk per worker and reassembled in
/// chunk order, so the output is identical to synthesizing sequentially.
pub struct SynthesisPool {
    job_sender: Sender<SynthesisJob>,
    result_receiver: Receiver<SynthesisResult>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl SynthesisPool {
    pub fn new(
        space: Arc<DimensionSpace>,
        synthesizer: Arc<ContentSynthesizer>,
        worker_count: usize,
    ) -> Result<Self, WorkerError> {
        if worker_count == 0 {
            return Err(WorkerError::SpawnFailed(
                "worker_count must be > 0".to_string(),
            ));
        }

        let (job_sender, job_receiver) = bounded::<SynthesisJob>(worker_count * 2);
        let (result_sender, result_receiver) = bounded::<SynthesisResult>(worker_count * 2);
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let job_rx = job_receiver.clone();
            let result_tx = result_sender.clone();
            let shutdown_flag = Arc::clone(&shutdown);
            let space = Arc::clone(&space);
            let synthesizer = Arc::clone(&synthesizer);

            let handle = thread::Builder::new()
                .name(format!("seogen-synth-{}", worker_id))
                .spawn(move || {
                    run_worker(
                        worker_id,
                        job_rx,
                        result_tx,
                        shutdown_flag,
                        &space,
                        &synthesizer,
                    );
                })
                .map_err(|e| WorkerError::SpawnFailed(e.to_string()))?;

            workers.push(handle);
        }

        info!("Started {} synthesis workers", worker_count);

        Ok(Self {
            job_sender,
            result_receiver,
            workers,
            shutdown,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Synthesizes `[start, start + len)` across the workers, in index order.
    pub fn synthesize(&mut self, start: u64, len: u64) -> Result<Vec<ContentRecord>, WorkerError> {
        if self.is_shutdown() {
            return Err(WorkerError::ChannelClosed);
        }

        let jobs = split_range(start, len, self.workers.len());
        let mut chunks: Vec<Option<Vec<ContentRecord>>> = vec![None; jobs.len()];

        for job in &jobs {
            self.job_sender
                .send(*job)
                .map_err(|_| WorkerError::ChannelClosed)?;
        }

        for _ in 0..jobs.len() {
            let result = self
                .result_receiver
                .recv()
                .map_err(|_| WorkerError::ChannelClosed)?;
            let records = result.records.ok_or(WorkerError::Panicked {
                worker_id: result.worker_id,
            })?;
            chunks[result.chunk] = Some(records);
        }

        let mut records = Vec::with_capacity(len as usize);
        for chunk in chunks {
            records.extend(chunk.ok_or(WorkerError::ChannelClosed)?);
        }
        Ok(records)
    }

    pub fn shutdown(&self) {
        info!("Shutting down synthesis pool...");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn wait(self) {
        drop(self.job_sender);

        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Synthesis worker {} panicked: {:?}", i, e);
            } else {
                debug!("Synthesis worker {} finished", i);
            }
        }

        info!("All synthesis workers have stopped");
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

fn run_worker(
    worker_id: usize,
    job_receiver: Receiver<SynthesisJob>,
    result_sender: Sender<SynthesisResult>,
    shutdown: Arc<AtomicBool>,
    space: &DimensionSpace,
    synthesizer: &ContentSynthesizer,
) {
    debug!("Synthesis worker {} started", worker_id);

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!("Synthesis worker {} received shutdown signal", worker_id);
            break;
        }

        match job_receiver.recv_timeout(std::time::Duration::from_millis(100)) {
            Ok(job) => {
                debug!(
                    "Synthesis worker {} chunk {} [{}, {})",
                    worker_id,
                    job.chunk,
                    job.start,
                    job.end()
                );

                let records = panic::catch_unwind(AssertUnwindSafe(|| {
                    (job.start..job.end())
                        .map(|index| synthesizer.synthesize(&space.decompose(index), index))
                        .collect::<Vec<_>>()
                }))
                .ok();

                let result = SynthesisResult {
                    chunk: job.chunk,
                    worker_id,
                    records,
                };
                if let Err(e) = result_sender.send(result) {
                    error!("Synthesis worker {} failed to send result: {}", worker_id, e);
                    break;
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                continue;
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                debug!("Synthesis worker {} job channel disconnected", worker_id);
                break;
            }
        }
    }

    debug!("Synthesis worker {} stopped", worker_id);
}
