//! src/publish.rs
//!
//! Delivery of search results to the message queue.
//!
//! Results are routed by the [`Request`] that came with the search: the
//! exchange name selects the destination and the routing key is passed
//! through to it. Delivery is best effort; callers log failures and move on.

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use std::io::Write;
use std::sync::Mutex;

use crate::model::{Request, SearchResponse};

/// Publishes a search response to the destination named by `request`.
pub trait MessageQueue: Send + Sync {
    fn publish_search_response(&self, request: &Request, response: &SearchResponse) -> Result<()>;
}

/// Envelope written for every published response.
#[derive(Debug, Serialize)]
struct Publication<'a> {
    exchange: &'a str,
    routing_key: &'a str,
    content_type: &'static str,
    body: &'a SearchResponse,
}

/// Writes each publication as one JSON line to `W`.
///
/// Used by the command-line front end to hand results to whatever consumes
/// its standard output (a broker bridge, a log shipper, a test harness).
pub struct JsonLinesPublisher<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesPublisher<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|_| anyhow!("publisher writer lock poisoned"))
    }
}

impl<W: Write + Send> MessageQueue for JsonLinesPublisher<W> {
    fn publish_search_response(&self, request: &Request, response: &SearchResponse) -> Result<()> {
        if request.exchange_name.is_empty() {
            bail!(
                "Cannot publish response for request '{}': exchange name is empty",
                request.request_id
            );
        }

        let publication = Publication {
            exchange: &request.exchange_name,
            routing_key: &request.routing_key,
            content_type: "application/json",
            body: response,
        };
        let line = serde_json::to_string(&publication).context("Cannot encode response body")?;

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| anyhow!("publisher writer lock poisoned"))?;
        writeln!(writer, "{}", line).context("Cannot publish message")?;
        writer.flush().context("Cannot publish message")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Movie;
    use serde_json::{json, Value};

    #[test]
    fn test_publication_is_one_json_line() -> Result<()> {
        let publisher = JsonLinesPublisher::new(Vec::new());
        let request = Request::new("req-1", "movies.exchange", "search.result");
        let response = SearchResponse::success("req-1", vec![Movie::default()]);

        publisher.publish_search_response(&request, &response)?;
        publisher.publish_search_response(&request, &SearchResponse::success("req-1", vec![]))?;

        let output = String::from_utf8(publisher.into_inner()?)?;
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Value = serde_json::from_str(lines[0])?;
        assert_eq!(first["exchange"], json!("movies.exchange"));
        assert_eq!(first["routing_key"], json!("search.result"));
        assert_eq!(first["content_type"], json!("application/json"));
        assert_eq!(first["body"]["meta"]["status"], json!("success"));
        assert_eq!(first["body"]["data"]["movies"].as_array().map(Vec::len), Some(1));
        Ok(())
    }

    #[test]
    fn test_missing_exchange_cannot_be_routed() -> Result<()> {
        let publisher = JsonLinesPublisher::new(Vec::new());
        let request = Request::new("req-9", "", "key");
        let err = publisher
            .publish_search_response(&request, &SearchResponse::success("req-9", vec![]))
            .unwrap_err();
        assert!(err.to_string().contains("exchange name is empty"));
        assert!(publisher.into_inner()?.is_empty());
        Ok(())
    }
}
