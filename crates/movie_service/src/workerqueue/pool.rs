//! src/workerqueue/pool.rs
//!
//! Fixed-size pool of [`Worker`]s sharing one worker queue.
//!
//! The worker queue is bounded to the pool size. Since every worker has at
//! most one handle outstanding, advertising never blocks in steady state, and
//! the number of idle workers is exactly the number of queued handles.
//!
//! The pool keeps only the receiving end of the worker queue. Once every
//! worker thread has exited the queue disconnects, which is how submitters
//! learn that the pool has shut down.

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::bounded;

use super::{Worker, WorkerQueue};

/// Fixed-size collection of workers plus the shared worker queue.
///
/// Lifecycle: [`new`](Self::new) → [`start_all`](Self::start_all) →
/// [`stop_all`](Self::stop_all) → [`await_all`](Self::await_all).
/// Dropping the pool stops every worker and joins its thread.
pub struct WorkerPool {
    workers: Vec<Worker>,
    worker_queue: WorkerQueue,
}

impl WorkerPool {
    /// Creates `size` idle workers. Nothing runs until [`start_all`](Self::start_all).
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(anyhow!(
                "Cannot create WorkerPool with 0 workers. \
                At least one worker is required to run jobs."
            ));
        }

        let (queue_tx, queue_rx) = bounded(size);
        let workers = (0..size)
            .map(|id| Worker::new(id, queue_tx.clone()))
            .collect();

        Ok(Self {
            workers,
            worker_queue: queue_rx,
        })
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Receiving end of the worker queue, used by submitters to claim an
    /// idle worker.
    pub fn worker_queue(&self) -> WorkerQueue {
        self.worker_queue.clone()
    }

    /// Starts every worker.
    ///
    /// If any worker fails to start, the ones already running are stopped
    /// and joined before the error is returned.
    pub fn start_all(&mut self) -> Result<()> {
        for index in 0..self.workers.len() {
            if let Err(err) = self.workers[index].start() {
                for worker in &self.workers[..index] {
                    worker.stop();
                }
                for worker in &mut self.workers[..index] {
                    let _ = worker.wait_for_finish();
                }
                return Err(err).context("Failed to start worker pool");
            }
        }

        tracing::info!(workers = self.workers.len(), "worker pool started");
        Ok(())
    }

    /// Signals every worker to stop. Does not wait.
    pub fn stop_all(&self) {
        for worker in &self.workers {
            worker.stop();
        }
    }

    /// Waits until every worker has finished.
    pub fn await_all(&mut self) -> Result<()> {
        for worker in &mut self.workers {
            let id = worker.id();
            worker
                .wait_for_finish()
                .with_context(|| format!("Failed to wait for worker {}", id))?;
        }

        tracing::info!(workers = self.workers.len(), "worker pool finished");
        Ok(())
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Signal everyone first so the per-worker joins overlap.
        self.stop_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::TryRecvError;
    use std::collections::HashSet;
    use std::thread;
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn test_pool_rejects_zero_workers() {
        let err = WorkerPool::new(0).err().map(|e| e.to_string());
        assert!(err.is_some_and(|msg| msg.contains("0 workers")));
    }

    #[test]
    fn test_pool_advertises_exactly_size_distinct_workers() -> Result<()> {
        for size in [1, 2, 5] {
            let mut pool = WorkerPool::new(size)?;
            pool.start_all()?;
            let queue = pool.worker_queue();

            let mut ids = HashSet::new();
            for _ in 0..size {
                ids.insert(queue.recv_timeout(TIMEOUT)?.id());
            }
            assert_eq!(ids.len(), size);

            thread::sleep(Duration::from_millis(50));
            assert!(matches!(queue.try_recv(), Err(TryRecvError::Empty)));

            pool.stop_all();
            pool.await_all()?;
        }
        Ok(())
    }

    #[test]
    fn test_concurrent_jobs_occupy_every_worker() -> Result<()> {
        let size = 4;
        let mut pool = WorkerPool::new(size)?;
        pool.start_all()?;
        let queue = pool.worker_queue();

        let (started_tx, started_rx) = bounded(size);
        let (release_tx, release_rx) = bounded::<()>(size);
        for _ in 0..size {
            let handle = queue.recv_timeout(TIMEOUT)?;
            let started_tx = started_tx.clone();
            let release_rx = release_rx.clone();
            handle
                .assign(Box::new(move |id| {
                    let _ = started_tx.send(id);
                    let _ = release_rx.recv();
                }))
                .map_err(|_| anyhow!("worker refused the task"))?;
        }

        // All jobs are running at once, each on its own worker.
        let running: HashSet<usize> = (0..size)
            .map(|_| started_rx.recv_timeout(TIMEOUT))
            .collect::<Result<_, _>>()?;
        assert_eq!(running.len(), size);
        assert!(queue.try_recv().is_err());

        for _ in 0..size {
            release_tx.send(())?;
        }
        for _ in 0..size {
            queue.recv_timeout(TIMEOUT)?;
        }

        pool.stop_all();
        pool.await_all()?;
        Ok(())
    }

    #[test]
    fn test_queue_disconnects_after_shutdown() -> Result<()> {
        let mut pool = WorkerPool::new(2)?;
        pool.start_all()?;
        let queue = pool.worker_queue();

        pool.stop_all();
        pool.await_all()?;

        // Stale handles may remain; they all refuse work.
        while let Ok(handle) = queue.try_recv() {
            assert!(handle.assign(Box::new(|_| {})).is_err());
        }
        assert!(matches!(queue.try_recv(), Err(TryRecvError::Disconnected)));
        Ok(())
    }

    #[test]
    fn test_await_all_twice_fails() -> Result<()> {
        let mut pool = WorkerPool::new(1)?;
        pool.start_all()?;
        pool.stop_all();
        pool.await_all()?;
        assert!(pool.await_all().is_err());
        Ok(())
    }
}
