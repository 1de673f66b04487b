//! src/config.rs
//!
//! Configuration for the movie service.
//!
//! Built in code with a builder:
//! ```ignore
//! let config = ServiceConfig::builder()
//!     .search_api_key("KEY")
//!     .total_workers(4)
//!     .build();
//! ```
//!
//! or loaded from a TOML file. Keys missing from the file keep their
//! defaults:
//! ```toml
//! [rottentomatoes]
//! api_key = "..."
//! api_url = "http://api.rottentomatoes.com/api/public/v1.0"
//! timeout_secs = 10
//!
//! [workers]
//! total = 10
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::search::RottenTomatoesClient;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("search API key is required")]
    MissingApiKey,
    #[error("total_workers must be greater than 0")]
    ZeroWorkers,
}

/// Configuration for the movie service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Rotten Tomatoes API key (required)
    pub search_api_key: String,
    /// Base URL of the movie search API
    pub search_api_url: String,
    /// Per-request timeout for the search API. Bounds how long one job can
    /// hold a worker.
    pub search_timeout: Duration,
    /// Number of concurrent search workers (must be > 0)
    pub total_workers: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            search_api_key: String::new(),
            search_api_url: RottenTomatoesClient::DEFAULT_BASE_URL.to_string(),
            search_timeout: Duration::from_secs(10),
            total_workers: 10,
        }
    }
}

impl ServiceConfig {
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    /// Parses TOML on top of the defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(text)?;
        Ok(file.apply(Self::default()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks the settings the service cannot start without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search_api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.total_workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        Ok(())
    }
}

/// Builder for ServiceConfig with method chaining
#[derive(Default)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    pub fn search_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.search_api_key = key.into();
        self
    }

    pub fn search_api_url(mut self, url: impl Into<String>) -> Self {
        self.config.search_api_url = url.into();
        self
    }

    /// Set the search request timeout
    ///
    /// - Too low: slow but healthy searches are reported as errors.
    /// - Too high: a hung API keeps workers busy and stalls submissions.
    pub fn search_timeout(mut self, timeout: Duration) -> Self {
        self.config.search_timeout = timeout;
        self
    }

    /// Set the number of workers
    pub fn total_workers(mut self, workers: usize) -> Self {
        self.config.total_workers = workers;
        self
    }

    pub fn build(self) -> ServiceConfig {
        self.config
    }
}

// On-disk layout. Every key is optional.

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    rottentomatoes: SearchSection,
    #[serde(default)]
    workers: WorkersSection,
}

#[derive(Debug, Default, Deserialize)]
struct SearchSection {
    api_key: Option<String>,
    api_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct WorkersSection {
    total: Option<usize>,
}

impl ConfigFile {
    fn apply(self, mut config: ServiceConfig) -> ServiceConfig {
        if let Some(key) = self.rottentomatoes.api_key {
            config.search_api_key = key;
        }
        if let Some(url) = self.rottentomatoes.api_url {
            config.search_api_url = url;
        }
        if let Some(secs) = self.rottentomatoes.timeout_secs {
            config.search_timeout = Duration::from_secs(secs);
        }
        if let Some(total) = self.workers.total {
            config.total_workers = total;
        }
        config
    }
}
