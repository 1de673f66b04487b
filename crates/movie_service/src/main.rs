use anyhow::{Context, Result};
use clap::Parser;
use movie_service::{JsonLinesPublisher, MovieService, RottenTomatoesClient, ServiceConfig};
use serde::Deserialize;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Movie search service.
///
/// Reads one search per line from stdin as JSON, e.g.
/// `{"q": "martian", "request_id": "1", "exchange_name": "movies", "routing_key": "r"}`,
/// prints the acknowledgement and publishes results as JSON lines on stdout.
#[derive(Debug, Parser)]
#[command(name = "movie-service", version)]
struct Args {
    /// Configuration file
    #[arg(long, default_value = "movie-service.toml")]
    config: PathBuf,

    /// Override the number of workers
    #[arg(long)]
    workers: Option<usize>,

    /// Rotten Tomatoes API key, overrides the config file
    #[arg(long, env = "ROTTENTOMATOES_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Debug, Deserialize)]
struct SearchLine {
    #[serde(default)]
    q: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_writer(io::stderr)
        .init();

    let mut config = if args.config.exists() {
        ServiceConfig::from_file(&args.config)?
    } else {
        tracing::warn!(path = %args.config.display(), "config file not found, using defaults");
        ServiceConfig::default()
    };
    if let Some(workers) = args.workers {
        config.total_workers = workers;
    }
    if let Some(api_key) = args.api_key {
        config.search_api_key = api_key;
    }

    let client = RottenTomatoesClient::from_config(&config)?;
    let publisher = JsonLinesPublisher::new(io::stdout());
    let mut service = MovieService::new(config, Arc::new(client), Arc::new(publisher))?;
    tracing::info!(
        workers = service.config().total_workers,
        "Welcome to Movie Service! Reading searches from stdin"
    );

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("Cannot read stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        let query = match serde_json::from_str::<SearchLine>(&line) {
            Ok(search) => search.q,
            Err(error) => {
                tracing::warn!(error = %error, "Cannot decode search line");
                continue;
            }
        };

        let (ack, job) = match service.search(&query, line.as_bytes()) {
            Ok(accepted) => accepted,
            Err(error) => {
                tracing::warn!(status = error.status_code(), error = %error, "search rejected");
                continue;
            }
        };

        {
            let mut stdout = io::stdout().lock();
            serde_json::to_writer(&mut stdout, &ack)?;
            writeln!(stdout)?;
            stdout.flush()?;
        }

        if let Err(error) = job.submit() {
            tracing::error!(error = %format!("{:#}", error), "search job dropped");
        }
    }

    service.quit()?;
    tracing::info!("Bye-bye");
    Ok(())
}
