//! De Valk adapter
//!
//! De Valk listings arrive as structured JSON, either flat or grouped into
//! section objects (`key_details`, `general_info`, `machinery`, ...), and
//! possibly wrapped in the scraper envelope. Dimensions are metres, weights
//! tonnes, tanks litres; the mapping table carries those units.

use serde_json::Value;
use std::collections::BTreeMap;

use super::{merge_section_leaves, unwrap_envelope, SourceAdapter};
use crate::classifier::SourceId;
use crate::types::{AdapterError, RawListingRecord, SourceContent};

/// Keys only De Valk payloads use; at least one must be present
const MARKER_KEYS: &[&str] = &[
    "brand",
    "hullMaterial",
    "engineMake",
    "brokerComments",
    "key_details",
    "general_info",
    "machinery",
    "accommodation",
    "rigging",
];

pub struct DeValkAdapter;

impl SourceAdapter for DeValkAdapter {
    fn source_id(&self) -> SourceId {
        SourceId::DeValk
    }

    fn extract(
        &self,
        source_url: &str,
        content: &SourceContent,
    ) -> Result<RawListingRecord, AdapterError> {
        let SourceContent::Structured(value) = content else {
            return Err(AdapterError::Parse("expected structured JSON".to_string()));
        };

        let payload = unwrap_envelope(value)?;
        let Some(obj) = payload.as_object() else {
            return Err(AdapterError::Parse("payload is not an object".to_string()));
        };

        if !MARKER_KEYS.iter().any(|k| obj.contains_key(*k)) {
            return Err(AdapterError::Parse("no De Valk fields present".to_string()));
        }

        let mut raw_fields = BTreeMap::new();

        // Top-level leaves take precedence over section contents
        for (key, value) in obj {
            if !value.is_object() && !value.is_null() {
                raw_fields.insert(key.clone(), value.clone());
            }
        }
        for value in obj.values() {
            if let Value::Object(section) = value {
                merge_section_leaves(section, &mut raw_fields);
            }
        }

        synthesize_engine(&mut raw_fields);

        Ok(RawListingRecord::new(SourceId::DeValk, source_url, raw_fields))
    }
}

/// Combine engineMake / engineType / engineHP into one "engine" description
fn synthesize_engine(raw_fields: &mut BTreeMap<String, Value>) {
    if raw_fields.contains_key("engine") {
        return;
    }

    let part = |key: &str| {
        raw_fields.get(key).and_then(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    };

    let mut parts: Vec<String> = ["engineMake", "engineType"]
        .iter()
        .filter_map(|k| part(*k))
        .collect();
    if let Some(hp) = part("engineHP") {
        parts.push(format!("{} hp", hp));
    }

    if !parts.is_empty() {
        raw_fields.insert("engine".to_string(), Value::String(parts.join(" ")));
    }
}
