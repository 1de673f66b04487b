//! src/workerqueue/mod.rs
//!
//! Bounded pool of worker threads with an "advertise-then-wait" handoff.
//!
//! Each worker owns a rendezvous inbound slot. While idle it pushes a
//! [`WorkerHandle`] for that slot into the shared availability channel (the
//! "worker queue") and then waits for either a task on the slot or a stop
//! signal. A submitter claims an idle worker by receiving one handle from the
//! worker queue and assigning it a task.
//!
//! ```text
//!   submitter                worker queue              worker N
//!   ─────────                ────────────              ────────
//!                                 ◄──── advertise(handle N) ───┤
//!   recv() ───────────────────────►                             │
//!   handle.assign(work) ───────── rendezvous ─────────────────► │ run work(N)
//!                                 ◄──── advertise(handle N) ───┤
//! ```
//!
//! # Module Structure
//! - `worker.rs`: single worker thread and its serve loop
//! - `pool.rs`: fixed-size collection of workers sharing one worker queue
//!
//! # Guarantees
//! - At most one handle per worker is outstanding in the worker queue.
//! - Tasks on one worker run strictly sequentially.
//! - A task handed over by [`WorkerHandle::assign`] always runs to completion,
//!   even when the worker is stopped meanwhile.
//! - There is no cancellation and no timeout for a running task.

mod pool;
mod worker;

pub use pool::WorkerPool;
pub use worker::Worker;

use crossbeam_channel::{Receiver, SendError, Sender};
use std::fmt;

/// A unit of work. Receives the id of the worker executing it.
pub type Work = Box<dyn FnOnce(usize) + Send + 'static>;

/// Receiving end of the availability channel, one handle per idle worker.
pub type WorkerQueue = Receiver<WorkerHandle>;

/// "Ready for work" token advertised by an idle worker.
///
/// Holding a handle means the worker is (or was, if it has since been stopped)
/// waiting on its inbound slot. Handles are consumed by [`assign`](Self::assign).
pub struct WorkerHandle {
    id: usize,
    inbound: Sender<Work>,
}

impl WorkerHandle {
    pub(crate) fn new(id: usize, inbound: Sender<Work>) -> Self {
        Self { id, inbound }
    }

    /// Id of the worker that advertised this handle.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Hands `work` to the advertising worker.
    ///
    /// Blocks until the worker takes the task. If the worker stopped after
    /// advertising, the task is given back untouched so it can be routed to
    /// another worker.
    pub fn assign(self, work: Work) -> Result<(), Work> {
        self.inbound.send(work).map_err(|SendError(work)| work)
    }
}

impl fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerHandle").field("id", &self.id).finish()
    }
}
