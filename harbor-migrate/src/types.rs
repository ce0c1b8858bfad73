//! Core types shared across the migration pipeline
//!
//! - Raw content and the raw field record produced by adapters
//! - Error taxonomy: input and fetch failures are fatal, everything else
//!   degrades the result instead of aborting it

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::classifier::SourceId;

// ============================================================================
// Raw content
// ============================================================================

/// Content returned by the scraping service for one listing URL
///
/// Treated as untrusted: adapters tolerant-parse it.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceContent {
    /// Pre-structured field map (JSON)
    Structured(serde_json::Value),
    /// Raw page content (HTML or plain text)
    Page(String),
}

impl SourceContent {
    pub fn kind(&self) -> &'static str {
        match self {
            SourceContent::Structured(_) => "structured",
            SourceContent::Page(_) => "page",
        }
    }
}

/// Raw fields extracted from one listing by one adapter
///
/// Produced once per migration attempt and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawListingRecord {
    pub source_id: SourceId,
    pub source_url: String,
    pub fetched_at: DateTime<Utc>,
    /// Raw field name → untyped value
    pub raw_fields: BTreeMap<String, serde_json::Value>,
}

impl RawListingRecord {
    pub fn new(
        source_id: SourceId,
        source_url: impl Into<String>,
        raw_fields: BTreeMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            source_id,
            source_url: source_url.into(),
            fetched_at: Utc::now(),
            raw_fields,
        }
    }

    /// Empty-but-valid record (last-resort result of the Generic adapter)
    pub fn empty(source_id: SourceId, source_url: impl Into<String>) -> Self {
        Self::new(source_id, source_url, BTreeMap::new())
    }

    pub fn is_empty(&self) -> bool {
        self.raw_fields.is_empty()
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Caller-supplied URL rejected before any pipeline stage
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Please provide a valid URL to migrate from.")]
    Blank,

    #[error("Invalid URL '{url}': {reason}")]
    Malformed { url: String, reason: String },

    #[error("Unsupported URL scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),
}

/// Source could not be fetched (fatal for that migration)
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Network failure reaching the scraper or the source
    #[error("Source unreachable: {0}")]
    Unreachable(String),

    /// Scraper or source refused the request (non-success status, blocked)
    #[error("Source rejected the request: {0}")]
    Rejected(String),

    /// Deadline expired before content arrived
    #[error("Timed out fetching source after {0}s")]
    Timeout(u64),

    /// Scraper answered with something that is not listing content
    #[error("Invalid scraper response: {0}")]
    InvalidResponse(String),
}

/// Adapter failure
#[derive(Debug, Clone, Error)]
pub enum AdapterError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Content shape not recognized by this adapter
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Per-image failure (counted, never fatal)
#[derive(Debug, Clone, Error)]
pub enum ImageError {
    #[error("Invalid image URL '{0}'")]
    InvalidUrl(String),

    #[error("Image fetch failed: {0}")]
    Fetch(String),

    #[error("Image host returned status {0}")]
    Status(u16),

    #[error("Content type not allowed: {0}")]
    ContentType(String),

    #[error("Image exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("Image fetch timed out after {0}s")]
    Timeout(u64),

    #[error("Image upload failed: {0}")]
    Upload(String),

    #[error("Image migration cancelled")]
    Cancelled,
}

/// User-visible migration failures
#[derive(Debug, Clone, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Pipeline invariant broken (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_record() {
        let record = RawListingRecord::empty(SourceId::Generic, "https://example.org/boat/1");
        assert!(record.is_empty());
        assert_eq!(record.source_id, SourceId::Generic);
    }

    #[test]
    fn test_blank_input_message() {
        assert_eq!(
            InputError::Blank.to_string(),
            "Please provide a valid URL to migrate from."
        );
    }

    #[test]
    fn test_fetch_error_wraps_into_adapter_error() {
        let err: AdapterError = FetchError::Timeout(120).into();
        assert_eq!(err.to_string(), "Timed out fetching source after 120s");
    }
}
