//! src/dispatch.rs
//!
//! Turns search submissions into tasks and hands them to idle workers.
//!
//! # Submission flow
//! ```text
//!   submit(request, query)
//!        │ recv()          blocks while every worker is busy
//!        ↓
//!   WorkerHandle ── assign(task) ──► worker runs task:
//!                                      search(query)
//!                                      publish(request, response)
//! ```
//!
//! Receiving a handle from the worker queue is the only back-pressure: no
//! submission is buffered beyond the pool size. A handle left behind by a
//! worker that stopped after advertising refuses the task, in which case the
//! task moves on to the next handle.

use anyhow::{anyhow, Result};
use std::sync::Arc;

use crate::model::{Request, SearchResponse};
use crate::publish::MessageQueue;
use crate::search::MovieSearch;
use crate::workerqueue::{Work, WorkerQueue};

/// Accepts search jobs on behalf of the service boundary.
///
/// `submit` is fire-and-forget: the outcome of the job is delivered through
/// the message queue, never returned. An `Err` only means the job could not
/// be handed to any worker (the pool has shut down).
pub trait JobSubmitter: Send + Sync {
    fn submit(&self, request: Request, query: String) -> Result<()>;
}

/// Dispatches search jobs onto a [`WorkerPool`](crate::workerqueue::WorkerPool).
#[derive(Clone)]
pub struct JobDispatcher {
    message_queue: Arc<dyn MessageQueue>,
    client: Arc<dyn MovieSearch>,
    worker_queue: WorkerQueue,
}

impl JobDispatcher {
    pub fn new(
        message_queue: Arc<dyn MessageQueue>,
        client: Arc<dyn MovieSearch>,
        worker_queue: WorkerQueue,
    ) -> Self {
        Self {
            message_queue,
            client,
            worker_queue,
        }
    }

    /// Builds the task for one search. The task owns its request and query.
    fn search_job(&self, request: Request, query: String) -> Work {
        let message_queue = Arc::clone(&self.message_queue);
        let client = Arc::clone(&self.client);

        Box::new(move |worker_id| {
            run_search(client.as_ref(), message_queue.as_ref(), &request, &query, worker_id)
        })
    }

    fn dispatch(&self, mut work: Work) -> Result<usize> {
        loop {
            let handle = self
                .worker_queue
                .recv()
                .map_err(|_| anyhow!("Worker pool has shut down"))?;
            let worker_id = handle.id();

            match handle.assign(work) {
                Ok(()) => return Ok(worker_id),
                Err(returned) => {
                    tracing::debug!(worker_id, "worker stopped after advertising, retrying");
                    work = returned;
                }
            }
        }
    }
}

impl JobSubmitter for JobDispatcher {
    fn submit(&self, request: Request, query: String) -> Result<()> {
        let request_id = request.request_id.clone();
        let work = self.search_job(request, query);
        let worker_id = self.dispatch(work)?;
        tracing::debug!(worker_id, request_id = %request_id, "search job dispatched");
        Ok(())
    }
}

/// Body of a search job: search once, publish exactly once.
///
/// Search failures become error responses. Publish failures are logged and
/// dropped; the submitter has long been acknowledged.
pub(crate) fn run_search(
    client: &dyn MovieSearch,
    message_queue: &dyn MessageQueue,
    request: &Request,
    query: &str,
    worker_id: usize,
) {
    let response = match client.search(query) {
        Ok(movies) => {
            tracing::debug!(
                worker_id,
                request_id = %request.request_id,
                results = movies.len(),
                "search finished"
            );
            SearchResponse::success(request.request_id.clone(), movies)
        }
        Err(error) => {
            tracing::warn!(
                worker_id,
                request_id = %request.request_id,
                error = %format!("{:#}", error),
                "search failed"
            );
            SearchResponse::error(request.request_id.clone(), &error)
        }
    };

    if let Err(error) = message_queue.publish_search_response(request, &response) {
        tracing::error!(
            worker_id,
            request_id = %request.request_id,
            exchange = %request.exchange_name,
            status = %response.meta.status,
            error = %format!("{:#}", error),
            "Cannot publish search response"
        );
    }
}
