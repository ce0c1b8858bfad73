//! Source Adapters
//!
//! One adapter per known listing source plus a Generic adapter of last
//! resort. An adapter turns the scraper's content into a [`RawListingRecord`];
//! it knows its source's field names and structure but performs no
//! normalization (that is the Field Mapper's job).
//!
//! A `ParseError` from a source adapter is recovered by falling through to
//! the Generic adapter. Only a `FetchError` (blocked or unusable source)
//! propagates.

pub mod boats;
pub mod devalk;
pub mod generic;
pub mod yachtworld;

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::classifier::SourceId;
use crate::types::{AdapterError, FetchError, RawListingRecord, SourceContent};

pub use boats::BoatsAdapter;
pub use devalk::DeValkAdapter;
pub use generic::GenericAdapter;
pub use yachtworld::YachtWorldAdapter;

/// Adapter trait - one implementation per listing source
pub trait SourceAdapter: Send + Sync {
    /// Source this adapter understands
    fn source_id(&self) -> SourceId;

    /// Extract raw fields from scraped content
    ///
    /// # Arguments
    /// * `source_url` - Listing URL the content was fetched from
    /// * `content` - Scraper output (untrusted)
    ///
    /// # Returns
    /// * `Ok(RawListingRecord)` - Raw fields, possibly empty
    /// * `Err(AdapterError::Parse)` - Content shape not recognized
    /// * `Err(AdapterError::Fetch)` - Content shows the source blocked the request
    fn extract(
        &self,
        source_url: &str,
        content: &SourceContent,
    ) -> Result<RawListingRecord, AdapterError>;
}

/// Raw record plus which adapter actually produced it
#[derive(Debug, Clone)]
pub struct AdapterOutcome {
    pub record: RawListingRecord,
    pub adapter: SourceId,
    pub warnings: Vec<String>,
}

/// Read-only adapter registry, built once at startup
#[derive(Clone)]
pub struct AdapterRegistry {
    adapters: BTreeMap<SourceId, Arc<dyn SourceAdapter>>,
    generic: Arc<dyn SourceAdapter>,
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        let generic: Arc<dyn SourceAdapter> = Arc::new(GenericAdapter);
        let mut adapters: BTreeMap<SourceId, Arc<dyn SourceAdapter>> = BTreeMap::new();
        adapters.insert(SourceId::DeValk, Arc::new(DeValkAdapter));
        adapters.insert(SourceId::YachtWorld, Arc::new(YachtWorldAdapter));
        adapters.insert(SourceId::Boats, Arc::new(BoatsAdapter));
        adapters.insert(SourceId::Generic, Arc::clone(&generic));
        Self { adapters, generic }
    }
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adapter for a source (Generic when none is registered)
    pub fn get(&self, source: SourceId) -> Arc<dyn SourceAdapter> {
        self.adapters
            .get(&source)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.generic))
    }

    /// Run the source's adapter, falling through to Generic on a parse error
    pub fn extract(
        &self,
        source: SourceId,
        source_url: &str,
        content: &SourceContent,
    ) -> Result<AdapterOutcome, FetchError> {
        check_blocked(content)?;

        let adapter = self.get(source);
        let mut warnings = Vec::new();

        match adapter.extract(source_url, content) {
            Ok(record) => {
                debug!(source = %source, fields = record.raw_fields.len(), "Adapter extracted raw fields");
                return Ok(AdapterOutcome {
                    record,
                    adapter: adapter.source_id(),
                    warnings,
                });
            }
            Err(AdapterError::Fetch(e)) => return Err(e),
            Err(AdapterError::Parse(reason)) => {
                warn!(source = %source, reason = %reason, "Adapter could not parse content, using generic adapter");
                warnings.push(format!(
                    "{} adapter could not parse content ({}); generic extraction used",
                    source, reason
                ));
            }
        }

        let record = match self.generic.extract(source_url, content) {
            Ok(record) => record,
            Err(AdapterError::Fetch(e)) => return Err(e),
            Err(AdapterError::Parse(reason)) => {
                warnings.push(format!("generic extraction failed: {}", reason));
                RawListingRecord::empty(SourceId::Generic, source_url)
            }
        };

        Ok(AdapterOutcome {
            record,
            adapter: SourceId::Generic,
            warnings,
        })
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Markers of an anti-bot or access-denied page instead of a listing
const BLOCK_MARKERS: &[&str] = &[
    "access denied",
    "attention required",
    "are you a robot",
    "captcha",
    "request blocked",
    "403 forbidden",
];

/// Reject short pages that are block or challenge pages
pub fn check_blocked(content: &SourceContent) -> Result<(), FetchError> {
    if let SourceContent::Page(page) = content {
        if page.len() < 20_000 {
            let lower = page.to_lowercase();
            let title = lower
                .split_once("<title")
                .and_then(|(_, rest)| rest.split_once("</title>"))
                .map(|(t, _)| t)
                .unwrap_or(&lower);
            if let Some(marker) = BLOCK_MARKERS.iter().find(|m| title.contains(*m)) {
                return Err(FetchError::Rejected(format!("source served a '{}' page", marker)));
            }
        }
    }
    Ok(())
}

/// Strip the scraper envelope `{status, data}` if present
pub fn unwrap_envelope(value: &Value) -> Result<&Value, AdapterError> {
    let Some(obj) = value.as_object() else {
        return Ok(value);
    };
    match (obj.get("status").and_then(Value::as_str), obj.get("data")) {
        (Some("success"), Some(data)) if data.is_object() || data.is_array() => Ok(data),
        (Some("error"), _) => {
            let message = obj
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("scraper reported an error");
            Err(AdapterError::Fetch(FetchError::Rejected(message.to_string())))
        }
        _ => Ok(value),
    }
}

/// Flatten nested objects into dotted paths, first key wins
///
/// Arrays are kept whole.
pub fn flatten_into(prefix: &str, value: &Value, out: &mut BTreeMap<String, Value>) {
    match value {
        Value::Object(obj) => {
            for (key, child) in obj {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_into(&path, child, out);
            }
        }
        Value::Null => {}
        other => {
            if !prefix.is_empty() {
                out.entry(prefix.to_string()).or_insert_with(|| other.clone());
            }
        }
    }
}

/// Insert every non-null leaf of a section under its own key, first key wins
pub fn merge_section_leaves(section: &Map<String, Value>, out: &mut BTreeMap<String, Value>) {
    for (key, value) in section {
        match value {
            Value::Object(nested) => merge_section_leaves(nested, out),
            Value::Null => {}
            other => {
                out.entry(key.clone()).or_insert_with(|| other.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unwrap_envelope() {
        let wrapped = json!({"status": "success", "data": {"brand": "Najad"}});
        assert_eq!(unwrap_envelope(&wrapped).unwrap(), &json!({"brand": "Najad"}));

        let plain = json!({"status": "For Sale", "brand": "Najad"});
        assert_eq!(unwrap_envelope(&plain).unwrap(), &plain);

        let failed = json!({"status": "error", "message": "blocked by source"});
        assert!(matches!(
            unwrap_envelope(&failed),
            Err(AdapterError::Fetch(FetchError::Rejected(m))) if m == "blocked by source"
        ));
    }

    #[test]
    fn test_flatten_into_dotted_paths() {
        let mut out = BTreeMap::new();
        flatten_into(
            "",
            &json!({"offers": {"price": 349000, "seller": {"name": "Broker"}}, "image": ["a", "b"]}),
            &mut out,
        );
        assert_eq!(out["offers.price"], json!(349000));
        assert_eq!(out["offers.seller.name"], json!("Broker"));
        assert_eq!(out["image"], json!(["a", "b"]));
    }

    #[test]
    fn test_block_page_is_fetch_error() {
        let page = SourceContent::Page(
            "<html><head><title>Attention Required! | Cloudflare</title></head></html>".into(),
        );
        assert!(matches!(check_blocked(&page), Err(FetchError::Rejected(_))));

        let listing = SourceContent::Page(
            "<html><head><title>Najad 460 for sale</title></head><body>No captcha here</body></html>"
                .into(),
        );
        assert!(check_blocked(&listing).is_ok());
    }

    #[test]
    fn test_parse_error_falls_through_to_generic() {
        let registry = AdapterRegistry::new();
        let content = SourceContent::Structured(json!({"Length": "15 m", "Make": "Najad"}));
        let outcome = registry
            .extract(SourceId::YachtWorld, "https://www.yachtworld.com/yacht/1", &content)
            .unwrap();
        assert_eq!(outcome.adapter, SourceId::Generic);
        assert_eq!(outcome.record.source_id, SourceId::Generic);
        assert_eq!(outcome.record.raw_fields["Make"], json!("Najad"));
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[test]
    fn test_scraper_error_envelope_is_fatal() {
        let registry = AdapterRegistry::new();
        let content =
            SourceContent::Structured(json!({"status": "error", "message": "403 from source"}));
        let result = registry.extract(SourceId::DeValk, "https://www.devalk.nl/x", &content);
        assert!(matches!(result, Err(FetchError::Rejected(_))));
    }
}
