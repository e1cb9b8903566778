//! Background job worker
//!
//! Separation runs block for as long as the external process takes. The
//! worker moves that wait onto its own thread so the caller stays free to
//! report progress, and hands the result back through a channel. There is a
//! single worker thread, so at most one external process is ever in flight.

use crate::error::{Result, StemsplitError};
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error};

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Owns the background thread that runs submitted jobs in order
pub struct JobWorker {
    tx: Option<Sender<Task>>,
    handle: Option<JoinHandle<()>>,
}

/// Handle to the result of one submitted job
pub struct JobTicket<T> {
    rx: Receiver<T>,
}

impl JobWorker {
    /// Spawn the worker thread
    pub fn spawn() -> Result<Self> {
        let (tx, rx) = unbounded::<Task>();
        let handle = thread::Builder::new()
            .name("stemsplit-worker".to_string())
            .spawn(move || {
                for task in rx {
                    // A panicking job drops its result sender, which fails only
                    // that ticket; the thread keeps serving the queue
                    if let Err(panic_info) = panic::catch_unwind(AssertUnwindSafe(task)) {
                        error!("Job panicked: {}", panic_message(panic_info.as_ref()));
                    }
                }
                debug!("Job worker drained, exiting");
            })
            .map_err(|e| StemsplitError::WorkerError(format!("failed to spawn worker thread: {}", e)))?;

        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
        })
    }

    /// Queue a job; it runs after everything submitted before it
    pub fn submit<T, F>(&self, job: F) -> Result<JobTicket<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        // Capacity 1: the job sends exactly once and never waits on the caller
        let (result_tx, result_rx) = bounded::<T>(1);
        let task: Task = Box::new(move || {
            // Receiver dropped means the caller gave up on this result
            let _ = result_tx.send(job());
        });

        self.tx
            .as_ref()
            .ok_or_else(|| StemsplitError::WorkerError("worker is shut down".to_string()))?
            .send(task)
            .map_err(|_| StemsplitError::WorkerError("worker thread has exited".to_string()))?;

        Ok(JobTicket { rx: result_rx })
    }
}

impl Drop for JobWorker {
    fn drop(&mut self) {
        // Close the queue so the thread finishes pending jobs and exits
        drop(self.tx.take());

        if let Some(handle) = self.handle.take() {
            if let Err(panic_info) = handle.join() {
                error!("Job worker thread panicked: {}", panic_message(panic_info.as_ref()));
            }
        }
    }
}

fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl<T> JobTicket<T> {
    /// Block until the job finishes
    pub fn wait(self) -> Result<T> {
        self.rx
            .recv()
            .map_err(|_| StemsplitError::WorkerError("job was dropped before completing".to_string()))
    }

    /// Block until the job finishes, calling `on_tick` every `interval`
    pub fn wait_with(self, interval: Duration, mut on_tick: impl FnMut()) -> Result<T> {
        loop {
            match self.rx.recv_timeout(interval) {
                Ok(value) => return Ok(value),
                Err(RecvTimeoutError::Timeout) => on_tick(),
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(StemsplitError::WorkerError(
                        "job was dropped before completing".to_string(),
                    ))
                }
            }
        }
    }
}
