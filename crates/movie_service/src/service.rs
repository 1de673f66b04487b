//! src/service.rs
//!
//! Request boundary of the movie service.
//!
//! A search arrives as a query string plus a JSON body carrying the
//! reply-routing [`Request`]. The boundary validates both and answers at once
//! with an [`Acknowledgement`] plus a [`SearchJob`]; the job is submitted only
//! after the acknowledgement has been delivered. Search and delivery errors
//! never reach the caller; they travel through the message queue.

use anyhow::{Context, Result};
use std::fmt;
use std::io::Read;
use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::dispatch::{JobDispatcher, JobSubmitter};
use crate::model::{Acknowledgement, Request};
use crate::publish::MessageQueue;
use crate::search::MovieSearch;
use crate::workerqueue::WorkerPool;

/// Validation failures visible to the synchronous caller.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Query cannot be empty")]
    EmptyQuery,
    #[error("Cannot read request body")]
    ReadBody(#[source] std::io::Error),
    #[error("Cannot decode request body: {0}")]
    MalformedBody(#[source] serde_json::Error),
    #[error("Not implemented")]
    NotImplemented,
}

impl ServiceError {
    /// HTTP status a front end should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::EmptyQuery | ServiceError::MalformedBody(_) => 400,
            ServiceError::ReadBody(_) => 500,
            ServiceError::NotImplemented => 501,
        }
    }
}

/// An acknowledged search waiting to be handed to the workers.
#[must_use = "an acknowledged search does nothing until it is submitted"]
pub struct SearchJob {
    submitter: Arc<dyn JobSubmitter>,
    request: Request,
    query: String,
}

impl fmt::Debug for SearchJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchJob")
            .field("request", &self.request)
            .field("query", &self.query)
            .finish()
    }
}

impl SearchJob {
    /// Dispatches the search. Blocks until a worker takes it.
    ///
    /// An `Err` means no worker will ever run it (the pool has shut down).
    /// The requester has already been acknowledged and gets no result.
    pub fn submit(self) -> Result<()> {
        let request_id = self.request.request_id.clone();
        self.submitter
            .submit(self.request, self.query)
            .with_context(|| format!("Cannot submit search job '{}'", request_id))
    }
}

/// Validates searches, acknowledges them and hands them to a [`JobSubmitter`].
pub struct MovieService {
    config: ServiceConfig,
    submitter: Arc<dyn JobSubmitter>,
    // Present when the service owns its workers.
    pool: Option<WorkerPool>,
}

impl MovieService {
    /// Creates the service with its own worker pool, already started.
    pub fn new(
        config: ServiceConfig,
        client: Arc<dyn MovieSearch>,
        message_queue: Arc<dyn MessageQueue>,
    ) -> Result<Self> {
        config.validate().context("Cannot create service")?;

        let mut pool = WorkerPool::new(config.total_workers)?;
        pool.start_all()?;
        let dispatcher = JobDispatcher::new(message_queue, client, pool.worker_queue());

        Ok(Self {
            config,
            submitter: Arc::new(dispatcher),
            pool: Some(pool),
        })
    }

    /// Creates the service on top of an externally managed submitter.
    pub fn with_submitter(config: ServiceConfig, submitter: Arc<dyn JobSubmitter>) -> Result<Self> {
        config.validate().context("Cannot create service")?;
        Ok(Self {
            config,
            submitter,
            pool: None,
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Validates one movie search and acknowledges it.
    ///
    /// Nothing is dispatched yet: the caller delivers the acknowledgement
    /// first and then calls [`SearchJob::submit`], which blocks while every
    /// worker is busy.
    pub fn search(
        &self,
        query: &str,
        mut body: impl Read,
    ) -> Result<(Acknowledgement, SearchJob), ServiceError> {
        if query.is_empty() {
            return Err(ServiceError::EmptyQuery);
        }

        let mut raw = Vec::new();
        body.read_to_end(&mut raw).map_err(ServiceError::ReadBody)?;
        let request: Request = serde_json::from_slice(&raw).map_err(ServiceError::MalformedBody)?;

        let ack = Acknowledgement::for_search(&request, query);
        let job = SearchJob {
            submitter: Arc::clone(&self.submitter),
            request,
            query: query.to_string(),
        };
        Ok((ack, job))
    }

    /// Full cast lookup for a movie. Not supported yet.
    pub fn full_cast(&self, _movie_id: &str) -> Result<Acknowledgement, ServiceError> {
        Err(ServiceError::NotImplemented)
    }

    /// Stops the workers and waits for running jobs to finish.
    pub fn quit(&mut self) -> Result<()> {
        let Some(mut pool) = self.pool.take() else {
            return Ok(());
        };

        tracing::info!("Stop workers...");
        pool.stop_all();
        tracing::info!("Wait for the workers to quit...");
        pool.await_all()
    }
}
