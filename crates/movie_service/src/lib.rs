//! Movie search service.
//!
//! Searches are acknowledged synchronously and executed asynchronously on a
//! fixed pool of worker threads; results are published to a message queue.
//!
//! - `workerqueue`: worker threads and the pool's availability channel
//! - `dispatch`: builds search jobs and hands them to idle workers
//! - `service`: request validation and acknowledgement
//! - `search` / `publish`: the external capabilities a job calls
//! - `model`, `config`: wire types and settings

pub mod config;
pub mod dispatch;
pub mod model;
pub mod publish;
pub mod search;
pub mod service;
pub mod workerqueue;

pub use config::{ConfigError, ServiceConfig, ServiceConfigBuilder};
pub use dispatch::{JobDispatcher, JobSubmitter};
pub use model::{Acknowledgement, Movie, Ratings, Request, SearchResponse, Status};
pub use publish::{JsonLinesPublisher, MessageQueue};
pub use search::{MovieSearch, RottenTomatoesClient};
pub use service::{MovieService, SearchJob, ServiceError};
pub use workerqueue::{Worker, WorkerHandle, WorkerPool, WorkerQueue};
