//! Background fetch worker.
//!
//! Requests are executed one at a time, in submission order, on a dedicated
//! thread. Results come back over a channel that the UI loop drains.
//! Requests older than the newest submitted generation are skipped, and a
//! dropped worker abandons whatever is still queued.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};

use super::{execute, ContactSource, FetchRequest, FetchResponse};

pub struct FetchWorker {
    jobs: Option<Sender<FetchRequest>>,
    results: Receiver<FetchResponse>,
    latest: Arc<AtomicU64>,
    stop: Arc<AtomicBool>,
}

impl FetchWorker {
    pub fn spawn(source: Box<dyn ContactSource>) -> Result<Self> {
        let (job_tx, job_rx) = mpsc::channel::<FetchRequest>();
        let (result_tx, result_rx) = mpsc::channel::<FetchResponse>();
        let latest = Arc::new(AtomicU64::new(0));
        let stop = Arc::new(AtomicBool::new(false));

        let worker_latest = Arc::clone(&latest);
        let worker_stop = Arc::clone(&stop);
        thread::Builder::new()
            .name("cbrowse-fetch".to_string())
            .spawn(move || {
                for request in job_rx {
                    if worker_stop.load(Ordering::Acquire) {
                        break;
                    }
                    let newest = worker_latest.load(Ordering::Acquire);
                    if request.generation < newest {
                        tracing::debug!(
                            stale = request.generation,
                            newest,
                            url = %request.url,
                            "skipping superseded request"
                        );
                        continue;
                    }
                    let response = execute(source.as_ref(), request);
                    if worker_stop.load(Ordering::Acquire) || result_tx.send(response).is_err() {
                        break;
                    }
                }
                tracing::debug!("fetch worker stopped");
            })
            .context("failed to spawn fetch worker thread")?;

        Ok(Self {
            jobs: Some(job_tx),
            results: result_rx,
            latest,
            stop,
        })
    }

    pub fn submit(&self, request: FetchRequest) {
        let Some(jobs) = &self.jobs else {
            return;
        };
        self.latest.fetch_max(request.generation, Ordering::AcqRel);
        if jobs.send(request).is_err() {
            tracing::error!("fetch worker is gone; request dropped");
        }
    }

    /// Next completed response, if any, without blocking.
    pub fn try_recv(&self) -> Option<FetchResponse> {
        match self.results.try_recv() {
            Ok(response) => Some(response),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                tracing::error!("fetch worker is gone; no more responses");
                None
            }
        }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<FetchResponse> {
        match self.results.recv_timeout(timeout) {
            Ok(response) => Some(response),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                tracing::error!("fetch worker is gone; no more responses");
                None
            }
        }
    }
}

impl Drop for FetchWorker {
    fn drop(&mut self) {
        // The thread is detached: a fetch in progress finishes on its own and
        // nothing queued behind it runs.
        self.stop.store(true, Ordering::Release);
        self.jobs.take();
    }
}
