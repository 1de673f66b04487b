//! src/model.rs
//!
//! Wire types shared by the service boundary, the search jobs and the
//! message queue.
//!
//! - [`Request`]: reply-routing descriptor posted with a search
//! - [`Acknowledgement`]: synchronous reply to the poster
//! - [`SearchResponse`]: asynchronous result published to the message queue

use serde::{Deserialize, Serialize};
use std::fmt;

/// Correlation descriptor: where and under which id to publish the result.
///
/// Opaque to the dispatcher; passed through unchanged from the submission to
/// the publish call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub request_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub exchange_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub routing_key: String,
}

impl Request {
    pub fn new(
        request_id: impl Into<String>,
        exchange_name: impl Into<String>,
        routing_key: impl Into<String>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            exchange_name: exchange_name.into(),
            routing_key: routing_key.into(),
        }
    }
}

/// Immediate reply to a search submission. Carries no search results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub request_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub method: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub query: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub exchange_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub routing_key: String,
}

impl Acknowledgement {
    pub const SEARCH_METHOD: &'static str = "movies";

    /// Acknowledgement for a movie search, echoing the routing descriptor.
    pub fn for_search(request: &Request, query: &str) -> Self {
        Self {
            request_id: request.request_id.clone(),
            method: Self::SEARCH_METHOD.to_string(),
            query: query.to_string(),
            exchange_name: request.exchange_name.clone(),
            routing_key: request.routing_key.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Success => f.write_str("success"),
            Status::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub request_id: String,
    pub status: Status,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchData {
    // Always an array on the wire, even for errors.
    #[serde(default)]
    pub movies: Vec<Movie>,
}

/// Result of one search job, published to the message queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub meta: Meta,
    pub data: SearchData,
}

impl SearchResponse {
    /// Successful search. `movies` may be empty ("no matches").
    pub fn success(request_id: impl Into<String>, movies: Vec<Movie>) -> Self {
        Self {
            meta: Meta {
                request_id: request_id.into(),
                status: Status::Success,
                error: String::new(),
            },
            data: SearchData { movies },
        }
    }

    /// Failed search. The full error chain becomes the message.
    pub fn error(request_id: impl Into<String>, error: &anyhow::Error) -> Self {
        Self {
            meta: Meta {
                request_id: request_id.into(),
                status: Status::Error,
                error: format!("{:#}", error),
            },
            data: SearchData::default(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.meta.status == Status::Success
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ratings {
    pub critics_rating: String,
    pub critics_score: i32,
    pub audience_rating: String,
    pub audience_score: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    pub id: String,
    pub title: String,
    pub ratings: Ratings,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use serde_json::json;

    fn martian() -> Movie {
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

    #[test]
    fn test_success_response_wire_format() -> Result<()> {
        let response = SearchResponse::success("req-1", vec![martian()]);
        assert_eq!(
            serde_json::to_value(&response)?,
            json!({
                "meta": {"request_id": "req-1", "status": "success"},
                "data": {"movies": [{
                    "id": "1",
                    "title": "The Martian",
                    "ratings": {
                        "criticsRating": "Certified Fresh",
                        "criticsScore": 92,
                        "audienceRating": "Upright",
                        "audienceScore": 92
                    }
                }]}
            })
        );
        Ok(())
    }

    #[test]
    fn test_error_response_has_message_and_no_movies() -> Result<()> {
        let response = SearchResponse::error("req-2", &anyhow!("API is not available"));
        assert!(!response.is_success());
        assert_eq!(
            serde_json::to_value(&response)?,
            json!({
                "meta": {"request_id": "req-2", "status": "error", "error": "API is not available"},
                "data": {"movies": []}
            })
        );
        Ok(())
    }

    #[test]
    fn test_error_response_keeps_context_chain() {
        let err = anyhow!("connection refused").context("search request failed");
        let response = SearchResponse::error("id", &err);
        assert_eq!(response.meta.error, "search request failed: connection refused");
    }

    #[test]
    fn test_request_omits_empty_fields() -> Result<()> {
        let request = Request::new("", "movies", "");
        assert_eq!(serde_json::to_string(&request)?, r#"{"exchange_name":"movies"}"#);

        let parsed: Request = serde_json::from_str(r#"{"request_id":"abc","extra":1}"#)?;
        assert_eq!(parsed, Request::new("abc", "", ""));
        Ok(())
    }

    #[test]
    fn test_acknowledgement_echoes_routing() {
        let request = Request::new("unique-request-id", "ExchangeName", "RoutingKey");
        let ack = Acknowledgement::for_search(&request, "martian");
        assert_eq!(
            ack,
            Acknowledgement {
                request_id: "unique-request-id".to_string(),
                method: "movies".to_string(),
                query: "martian".to_string(),
                exchange_name: "ExchangeName".to_string(),
                routing_key: "RoutingKey".to_string(),
            }
        );
    }
}
