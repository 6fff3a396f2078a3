//! Concurrent fan-out of batched nearest-neighbor queries.
//!
//! The dispatcher owns a fixed pool of worker threads, spawned once and
//! reused for every batch. Each query in a batch is pushed onto a shared
//! job channel tagged with its original index; workers pull jobs, run the
//! search against the shared immutable index, and send the result back
//! with its tag, so the dispatcher writes replies straight into the right
//! slot and never reorders.

use crate::error::{GeocodeError, Result};
use crate::kdtree::SpatialIndex;
use crate::types::NearestResult;
use crate::validation::validate_points;
use geo::Point;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How often a waiting batch re-checks the cancellation flag.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(50);

struct Job {
    slot: usize,
    point: Point,
    reply: Sender<(usize, NearestResult)>,
}

/// Runs nearest-neighbor lookups for batches of query points.
///
/// Batches shorter than 2 points, or any batch when the pool size is 1,
/// run inline on the calling thread. Everything else fans out across the
/// worker pool. Results always come back in input order, one per query.
pub struct QueryDispatcher {
    index: Arc<SpatialIndex>,
    worker_count: usize,
    jobs: Option<Sender<Job>>,
    cancelled: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
}

impl QueryDispatcher {
    /// Create a dispatcher over a shared index. Spawns `worker_count`
    /// threads up front; with `worker_count <= 1` no threads are spawned
    /// and every batch runs inline.
    pub fn new(index: Arc<SpatialIndex>, worker_count: usize) -> Self {
        let cancelled = Arc::new(AtomicBool::new(false));

        if worker_count <= 1 {
            return Self {
                index,
                worker_count,
                jobs: None,
                cancelled,
                workers: Vec::new(),
            };
        }

        let (jobs_tx, jobs_rx) = mpsc::channel::<Job>();
        let jobs_rx = Arc::new(Mutex::new(jobs_rx));

        let workers = (0..worker_count)
            .map(|_| {
                let index = Arc::clone(&index);
                let jobs_rx = Arc::clone(&jobs_rx);
                let cancelled = Arc::clone(&cancelled);
                thread::spawn(move || worker_loop(index, jobs_rx, cancelled))
            })
            .collect();

        Self {
            index,
            worker_count,
            jobs: Some(jobs_tx),
            cancelled,
            workers,
        }
    }

    /// Run a batch of lookups, preserving input order and length.
    ///
    /// The whole batch is range-validated up front and rejected wholesale
    /// on the first out-of-range point; no partial results are produced.
    ///
    /// `k` is accepted for call-site compatibility but silently collapses
    /// to 1: only single-nearest-neighbor search is supported.
    pub fn query(&self, batch: &[Point], k: usize) -> Result<Vec<NearestResult>> {
        validate_points(batch)?;

        if k > 1 {
            log::debug!("k={} requested, collapsing to k=1", k);
        }

        if self.cancelled.load(Ordering::SeqCst) {
            return Err(GeocodeError::Cancelled);
        }

        if batch.is_empty() {
            return Ok(Vec::new());
        }

        match &self.jobs {
            Some(jobs) if batch.len() >= 2 => self.query_pooled(jobs, batch),
            _ => Ok(self.query_inline(batch)),
        }
    }

    fn query_inline(&self, batch: &[Point]) -> Vec<NearestResult> {
        batch.iter().map(|p| self.index.nearest(p)).collect()
    }

    fn query_pooled(&self, jobs: &Sender<Job>, batch: &[Point]) -> Result<Vec<NearestResult>> {
        let (reply_tx, reply_rx) = mpsc::channel();

        for (slot, point) in batch.iter().enumerate() {
            let job = Job {
                slot,
                point: *point,
                reply: reply_tx.clone(),
            };
            // Workers drop the job receiver once they observe the flag, so
            // a failed send mid-submission usually means cancellation, not
            // a crashed pool.
            jobs.send(job).map_err(|_| {
                if self.cancelled.load(Ordering::SeqCst) {
                    GeocodeError::Cancelled
                } else {
                    GeocodeError::WorkerPool("job channel closed before dispatch".to_string())
                }
            })?;
        }
        drop(reply_tx);

        let mut results = vec![NearestResult::NO_MATCH; batch.len()];
        let mut filled = 0;

        while filled < batch.len() {
            match reply_rx.recv_timeout(CANCEL_POLL_INTERVAL) {
                Ok((slot, result)) => {
                    results[slot] = result;
                    filled += 1;
                }
                Err(RecvTimeoutError::Timeout) => {
                    if self.cancelled.load(Ordering::SeqCst) {
                        return Err(GeocodeError::Cancelled);
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return if self.cancelled.load(Ordering::SeqCst) {
                        Err(GeocodeError::Cancelled)
                    } else {
                        Err(GeocodeError::WorkerPool(
                            "reply channel disconnected mid-batch".to_string(),
                        ))
                    };
                }
            }
        }

        Ok(results)
    }

    /// Stop workers from pulling further jobs. Lookups already started run
    /// to completion; a batch waiting on results observes the flag and
    /// returns [`GeocodeError::Cancelled`].
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }
}

impl Drop for QueryDispatcher {
    fn drop(&mut self) {
        self.cancel();
        // Closing the job channel wakes idle workers out of recv.
        self.jobs.take();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

fn worker_loop(
    index: Arc<SpatialIndex>,
    jobs: Arc<Mutex<Receiver<Job>>>,
    cancelled: Arc<AtomicBool>,
) {
    loop {
        if cancelled.load(Ordering::SeqCst) {
            break;
        }

        // Hold the lock only for job pickup, never across a search.
        let job = {
            let rx = jobs.lock();
            rx.recv()
        };

        match job {
            Ok(job) => {
                let result = index.nearest(&job.point);
                // A dropped reply receiver just means the batch gave up.
                let _ = job.reply.send((job.slot, result));
            }
            Err(_) => break,
        }
    }
}
