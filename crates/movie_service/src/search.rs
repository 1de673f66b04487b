//! src/search.rs
//!
//! Movie search capability consumed by search jobs.
//!
//! [`MovieSearch`] is the seam; [`RottenTomatoesClient`] is the production
//! implementation over the Rotten Tomatoes public movie search API.
//!
//! A successful search with zero matches returns `Ok(vec![])`, which callers
//! must keep distinct from a failed call.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::config::ServiceConfig;
use crate::model::{Movie, Ratings};

/// Looks up movies by free-text query.
///
/// Called from worker threads, so implementations must be `Send + Sync`.
/// Implementations should bound their own latency: a call that never returns
/// holds its worker forever.
pub trait MovieSearch: Send + Sync {
    fn search(&self, query: &str) -> Result<Vec<Movie>>;
}

/// Blocking HTTP client for the Rotten Tomatoes movie search endpoint.
pub struct RottenTomatoesClient {
    http: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl RottenTomatoesClient {
    pub const DEFAULT_BASE_URL: &'static str = "http://api.rottentomatoes.com/api/public/v1.0";

    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        Self::new(&config.search_api_url, &config.search_api_key, config.search_timeout)
    }
}

impl MovieSearch for RottenTomatoesClient {
    // The request URL carries the API key, so it is stripped from every
    // reqwest error before the error can reach a response or a log line.
    fn search(&self, query: &str) -> Result<Vec<Movie>> {
        let response = self
            .http
            .get(format!("{}/movies.json", self.base_url))
            .query(&[("apikey", self.api_key.as_str()), ("q", query)])
            .send()
            .map_err(reqwest::Error::without_url)
            .context("search request failed")?;

        let status = response.status();
        if !status.is_success() {
            bail!("api error, response code: {}", status.as_u16());
        }

        let body: ApiSearchResponse = response
            .json()
            .map_err(reqwest::Error::without_url)
            .context("Cannot decode search response")?;
        Ok(body.into_movies())
    }
}

// Rotten Tomatoes payloads.

#[derive(Debug, Default, Deserialize)]
struct ApiSearchResponse {
    #[serde(default)]
    total: u64,
    #[serde(default)]
    movies: Vec<ApiMovie>,
}

impl ApiSearchResponse {
    fn into_movies(self) -> Vec<Movie> {
        // `total` is unreliable as a count, but zero does mean no matches.
        if self.total == 0 {
            return Vec::new();
        }
        self.movies.into_iter().map(Movie::from).collect()
    }
}

#[derive(Debug, Deserialize)]
struct ApiMovie {
    id: ApiId,
    #[serde(default)]
    title: String,
    #[serde(default)]
    ratings: ApiRatings,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiId {
    Number(u64),
    Text(String),
}

#[derive(Debug, Default, Deserialize)]
struct ApiRatings {
    #[serde(default)]
    critics_rating: String,
    #[serde(default)]
    critics_score: i32,
    #[serde(default)]
    audience_rating: String,
    #[serde(default)]
    audience_score: i32,
}

impl From<ApiMovie> for Movie {
    fn from(movie: ApiMovie) -> Self {
        let id = match movie.id {
            ApiId::Number(id) => id.to_string(),
            ApiId::Text(id) => id,
        };
        Movie {
            id,
            title: movie.title,
            ratings: Ratings {
                critics_rating: movie.ratings.critics_rating,
                critics_score: movie.ratings.critics_score,
                audience_rating: movie.ratings.audience_rating,
                audience_score: movie.ratings.audience_score,
            },
        }
    }
}
