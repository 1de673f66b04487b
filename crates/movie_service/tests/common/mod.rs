#![allow(dead_code)]

use anyhow::{anyhow, Result};
use movie_service::{
    JobSubmitter, MessageQueue, Movie, MovieSearch, Ratings, Request, SearchResponse,
};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub const TIMEOUT: Duration = Duration::from_secs(5);

pub fn martian() -> Movie {
    Movie {
        id: "1".to_string(),
        title: "The Martian".to_string(),
        ratings: Ratings {
            critics_rating: "Certified Fresh".to_string(),
            critics_score: 92,
            audience_rating: "Upright".to_string(),
            audience_score: 92,
        },
    }
}

/// Search double returning a fixed outcome and recording queries.
pub struct StaticSearch {
    outcome: std::result::Result<Vec<Movie>, String>,
    pub queries: Mutex<Vec<String>>,
}

impl StaticSearch {
    pub fn returning(movies: Vec<Movie>) -> Self {
        Self {
            outcome: Ok(movies),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

impl MovieSearch for StaticSearch {
    fn search(&self, query: &str) -> Result<Vec<Movie>> {
        self.queries.lock().unwrap().push(query.to_string());
        self.outcome.clone().map_err(|message| anyhow!(message))
    }
}

/// Message queue double recording every publish call.
#[derive(Default)]
pub struct RecordingQueue {
    published: Mutex<Vec<(Request, SearchResponse)>>,
    fail: bool,
}

impl RecordingQueue {
    pub fn failing() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn published(&self) -> Vec<(Request, SearchResponse)> {
        self.published.lock().unwrap().clone()
    }
}

impl MessageQueue for RecordingQueue {
    fn publish_search_response(&self, request: &Request, response: &SearchResponse) -> Result<()> {
        self.published
            .lock()
            .unwrap()
            .push((request.clone(), response.clone()));
        if self.fail {
            return Err(anyhow!("broker unavailable"));
        }
        Ok(())
    }
}

/// Submitter double that only records what it was given.
#[derive(Default)]
pub struct RecordingSubmitter {
    pub submitted: Mutex<Vec<(Request, String)>>,
}

impl RecordingSubmitter {
    pub fn submitted(&self) -> Vec<(Request, String)> {
        self.submitted.lock().unwrap().clone()
    }
}

impl JobSubmitter for RecordingSubmitter {
    fn submit(&self, request: Request, query: String) -> Result<()> {
        self.submitted.lock().unwrap().push((request, query));
        Ok(())
    }
}

/// Search that reports the calling thread and blocks until released.
pub struct GatedSearch {
    started: Sender<String>,
    release: Receiver<()>,
}

impl MovieSearch for GatedSearch {
    fn search(&self, _query: &str) -> Result<Vec<Movie>> {
        let name = thread::current().name().unwrap_or_default().to_string();
        let _ = self.started.send(name);
        let _ = self.release.recv();
        Ok(vec![])
    }
}

pub fn gated() -> (Arc<GatedSearch>, Receiver<String>, Sender<()>) {
    let (started_tx, started_rx) = bounded(64);
    let (release_tx, release_rx) = bounded(64);
    let search = Arc::new(GatedSearch {
        started: started_tx,
        release: release_rx,
    });
    (search, started_rx, release_tx)
}
