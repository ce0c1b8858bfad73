//! YachtWorld adapter
//!
//! YachtWorld payloads carry a `specifications` list of `{label, value}`
//! pairs next to top-level `title`, `price`, `location`, `description` and
//! `images`. Units are imperial.

use serde_json::Value;
use std::collections::BTreeMap;

use super::{flatten_into, unwrap_envelope, SourceAdapter};
use crate::classifier::SourceId;
use crate::types::{AdapterError, RawListingRecord, SourceContent};

const TOP_LEVEL_KEYS: &[&str] = &["title", "price", "location", "description", "images"];

pub struct YachtWorldAdapter;

impl SourceAdapter for YachtWorldAdapter {
    fn source_id(&self) -> SourceId {
        SourceId::YachtWorld
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

        let Some(specs) = obj
            .get("specifications")
            .or_else(|| obj.get("specs"))
            .and_then(Value::as_array)
        else {
            return Err(AdapterError::Parse("missing specifications list".to_string()));
        };

        let mut raw_fields = BTreeMap::new();

        for key in TOP_LEVEL_KEYS {
            if let Some(value) = obj.get(*key).filter(|v| !v.is_null()) {
                raw_fields.insert(key.to_string(), value.clone());
            }
        }

        for spec in specs {
            let label = spec
                .get("label")
                .or_else(|| spec.get("name"))
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|l| !l.is_empty());
            let value = spec.get("value").filter(|v| !v.is_null());
            if let (Some(label), Some(value)) = (label, value) {
                raw_fields
                    .entry(label.to_string())
                    .or_insert_with(|| value.clone());
            }
        }

        // Anything else (seller, engine objects, ...) as dotted paths
        for (key, value) in obj {
            if key == "specifications" || key == "specs" || TOP_LEVEL_KEYS.contains(&key.as_str()) {
                continue;
            }
            flatten_into(key, value, &mut raw_fields);
        }

        Ok(RawListingRecord::new(SourceId::YachtWorld, source_url, raw_fields))
    }
}
