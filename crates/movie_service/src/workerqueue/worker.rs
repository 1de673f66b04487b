//! src/workerqueue/worker.rs
//!
//! A single worker thread.
//!
//! # Serve loop
//! ```text
//!   ┌──────────────────┐  task   ┌─────────┐
//!   │ Idle-Advertising │ ──────► │ Running │
//!   │                  │ ◄────── │         │
//!   └────────┬─────────┘  done   └─────────┘
//!            │ stop
//!            ↓
//!       ┌──────────┐
//!       │ Finished │
//!       └──────────┘
//! ```
//!
//! Both the advertise step and the wait for a task race against the stop
//! signal, so a stop request is honoured even while the worker queue is full.
//! If a task and a stop request are ready at the same time either may win.

use anyhow::{anyhow, bail, Context, Result};
use crossbeam_channel::{bounded, select, Receiver, Sender, TrySendError};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use super::{Work, WorkerHandle};

/// One worker thread that executes at most one task at a time.
///
/// Lifecycle: created idle → [`start`](Self::start) → [`stop`](Self::stop) →
/// [`wait_for_finish`](Self::wait_for_finish). Dropping a started worker
/// stops it and joins its thread.
pub struct Worker {
    id: usize,
    stop_tx: Sender<()>,
    // Moved onto the worker thread by `start`.
    serve: Option<ServeLoop>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Creates an idle worker that will advertise itself on `worker_queue`.
    pub fn new(id: usize, worker_queue: Sender<WorkerHandle>) -> Self {
        let (inbound_tx, inbound_rx) = bounded(0);
        let (stop_tx, stop_rx) = bounded(1);

        Self {
            id,
            stop_tx,
            serve: Some(ServeLoop {
                id,
                inbound_tx,
                inbound_rx,
                worker_queue,
                stop_rx,
            }),
            handle: None,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Spawns the serve loop on a dedicated thread.
    ///
    /// Returns an error if the worker was already started or the thread could
    /// not be spawned.
    pub fn start(&mut self) -> Result<()> {
        let serve = self
            .serve
            .take()
            .ok_or_else(|| anyhow!("worker {} has already been started", self.id))?;

        let handle = thread::Builder::new()
            .name(format!("movie-worker-{}", self.id))
            .spawn(move || serve.run())
            .with_context(|| format!("Failed to spawn worker thread {}", self.id))?;

        tracing::debug!(worker_id = self.id, "worker started");
        self.handle = Some(handle);
        Ok(())
    }

    /// Requests shutdown without waiting for it.
    ///
    /// A task already running is finished first. Repeated calls are no-ops.
    /// Stopping a worker that has not been started yet makes it finish as
    /// soon as it is started.
    pub fn stop(&self) {
        match self.stop_tx.try_send(()) {
            Ok(()) => tracing::debug!(worker_id = self.id, "worker stop requested"),
            Err(TrySendError::Full(())) | Err(TrySendError::Disconnected(())) => {}
        }
    }

    /// Blocks until the serve loop has exited.
    ///
    /// Only meaningful after [`stop`](Self::stop). Errors if the worker was
    /// never started or has already been awaited.
    pub fn wait_for_finish(&mut self) -> Result<()> {
        let Some(handle) = self.handle.take() else {
            if self.serve.is_some() {
                bail!("worker {} was never started", self.id);
            }
            bail!("worker {} has already been awaited", self.id);
        };

        handle
            .join()
            .map_err(|panic| anyhow!("worker {} panicked: {}", self.id, panic_message(&*panic)))
    }

    /// Whether the serve loop has exited. `false` for a worker never started.
    pub fn is_finished(&self) -> bool {
        match &self.handle {
            Some(handle) => handle.is_finished(),
            None => self.serve.is_none(),
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.stop();
            let _ = handle.join();
        }
    }
}

/// State owned by the worker thread.
struct ServeLoop {
    id: usize,
    // Kept to mint a fresh handle on every advertise.
    inbound_tx: Sender<Work>,
    inbound_rx: Receiver<Work>,
    worker_queue: Sender<WorkerHandle>,
    stop_rx: Receiver<()>,
}

impl ServeLoop {
    fn run(self) {
        loop {
            let handle = WorkerHandle::new(self.id, self.inbound_tx.clone());

            select! {
                send(self.worker_queue, handle) -> res => {
                    if res.is_err() {
                        tracing::debug!(worker_id = self.id, "worker queue closed");
                        break;
                    }
                }
                recv(self.stop_rx) -> _ => break,
            }

            select! {
                recv(self.inbound_rx) -> work => match work {
                    Ok(work) => self.execute(work),
                    Err(_) => break,
                },
                recv(self.stop_rx) -> _ => break,
            }
        }

        tracing::debug!(worker_id = self.id, "worker finished");
    }

    fn execute(&self, work: Work) {
        let id = self.id;
        if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(move || work(id))) {
            tracing::error!(
                worker_id = id,
                panic = %panic_message(&*panic),
                "task panicked"
            );
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
