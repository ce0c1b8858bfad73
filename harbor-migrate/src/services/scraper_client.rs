//! Scraping service client
//!
//! The scraping service fetches a listing URL and returns either a
//! structured JSON field map (usually in a `{status, data}` envelope) or the
//! raw page. Its output is untrusted; this client only decides which of the
//! two shapes it is and turns transport failures into [`FetchError`].

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use crate::types::{FetchError, SourceContent};

const USER_AGENT: &str = concat!("harbor-migrate/", env!("CARGO_PKG_VERSION"));

/// Longest scraper error body echoed into an error message
const MAX_ERROR_BODY: usize = 200;

/// Scraping collaborator: URL → raw content
#[async_trait]
pub trait ScrapingService: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<SourceContent, FetchError>;
}

/// HTTP client for the scraping webhook
pub struct HttpScrapingService {
    http_client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpScrapingService {
    /// Create a client for `endpoint` with a request timeout
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http_client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Unreachable(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
            timeout,
        })
    }
}

#[async_trait]
impl ScrapingService for HttpScrapingService {
    async fn fetch(&self, url: &str) -> Result<SourceContent, FetchError> {
        debug!(url = %url, endpoint = %self.endpoint, "Requesting scrape");

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&json!({ "url": url }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout(self.timeout.as_secs())
                } else {
                    FetchError::Unreachable(e.to_string())
                }
            })?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("json"));

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Unreachable(e.to_string()))?;

        if !status.is_success() {
            warn!(url = %url, status = %status, "Scraper rejected request");
            return Err(rejected(status, &body));
        }

        parse_scraper_body(&body, is_json)
    }
}

fn rejected(status: StatusCode, body: &str) -> FetchError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().chars().take(MAX_ERROR_BODY).collect());
    if message.is_empty() {
        FetchError::Rejected(format!("scraper returned {}", status))
    } else {
        FetchError::Rejected(format!("scraper returned {}: {}", status, message))
    }
}

/// Classify a successful scraper body as structured or page content
pub fn parse_scraper_body(body: &str, is_json: bool) -> Result<SourceContent, FetchError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(FetchError::InvalidResponse("empty response".to_string()));
    }

    let looks_like_json = trimmed.starts_with('{') || trimmed.starts_with('[');
    if !is_json && !looks_like_json {
        return Ok(SourceContent::Page(body.to_string()));
    }

    let value: Value = match serde_json::from_str(trimmed) {
        Ok(value) => value,
        Err(e) if is_json => return Err(FetchError::InvalidResponse(e.to_string())),
        Err(_) => return Ok(SourceContent::Page(body.to_string())),
    };

    match (value.get("status").and_then(Value::as_str), value.get("data")) {
        (Some("error"), _) => {
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("scraper reported an error");
            Err(FetchError::Rejected(message.to_string()))
        }
        // Page delivered inside the envelope
        (Some("success"), Some(Value::String(page))) => Ok(SourceContent::Page(page.clone())),
        (Some("success"), Some(Value::Null) | None) => Err(FetchError::InvalidResponse(
            "success envelope without data".to_string(),
        )),
        _ => Ok(SourceContent::Structured(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_is_structured() {
        let content =
            parse_scraper_body(r#"{"status":"success","data":{"brand":"Najad"}}"#, true).unwrap();
        assert!(matches!(content, SourceContent::Structured(_)));
    }

    #[test]
    fn test_error_envelope_is_fetch_error() {
        let result = parse_scraper_body(r#"{"status":"error","message":"blocked"}"#, true);
        assert!(matches!(result, Err(FetchError::Rejected(m)) if m == "blocked"));
    }

    #[test]
    fn test_html_is_page() {
        let content = parse_scraper_body("<html><title>Najad</title></html>", false).unwrap();
        assert_eq!(content.kind(), "page");

        let wrapped =
            parse_scraper_body(r#"{"status":"success","data":"<html></html>"}"#, true).unwrap();
        assert_eq!(wrapped, SourceContent::Page("<html></html>".into()));
    }

    #[test]
    fn test_empty_and_broken_bodies() {
        assert!(matches!(
            parse_scraper_body("  ", true),
            Err(FetchError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_scraper_body("{not json", true),
            Err(FetchError::InvalidResponse(_))
        ));
        // Not declared JSON: treated as page text
        assert!(matches!(
            parse_scraper_body("{not json", false),
            Ok(SourceContent::Page(_))
        ));
    }
}
