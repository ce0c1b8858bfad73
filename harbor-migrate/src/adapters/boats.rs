//! Boats.com adapter
//!
//! Boats.com exposes listings as schema.org JSON-LD, either delivered
//! directly by the scraper or embedded in the page as
//! `<script type="application/ld+json">`. Specifications come as
//! `additionalProperty` entries with UN/CEFACT unit codes.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::{flatten_into, unwrap_envelope, SourceAdapter};
use crate::classifier::SourceId;
use crate::types::{AdapterError, RawListingRecord, SourceContent};

pub(super) static LD_JSON_SCRIPT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<script[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("valid regex")
});

/// schema.org types that describe a listed vessel
const LISTING_TYPES: &[&str] = &["Boat", "Vehicle", "Product", "IndividualProduct", "Car"];

/// UN/CEFACT common codes → unit suffix understood by the mapper
pub fn unit_for_code(code: &str) -> Option<&'static str> {
    let suffix = match code.trim().to_uppercase().as_str() {
        "MTR" => "m",
        "FOT" => "ft",
        "INH" => "in",
        "CMT" => "cm",
        "KGM" => "kg",
        "LBR" => "lb",
        "TNE" => "t",
        "LTR" => "l",
        "GLL" => "gal",
        _ => return None,
    };
    Some(suffix)
}

pub struct BoatsAdapter;

impl SourceAdapter for BoatsAdapter {
    fn source_id(&self) -> SourceId {
        SourceId::Boats
    }

    fn extract(
        &self,
        source_url: &str,
        content: &SourceContent,
    ) -> Result<RawListingRecord, AdapterError> {
        let listing = match content {
            SourceContent::Structured(value) => find_listing(unwrap_envelope(value)?).cloned(),
            SourceContent::Page(page) => listing_from_page(page),
        }
        .ok_or_else(|| AdapterError::Parse("no schema.org listing object".to_string()))?;

        let mut raw_fields = BTreeMap::new();

        for key in ["brand", "manufacturer"] {
            if let Some(name) = listing.get(key).and_then(name_of) {
                raw_fields.insert(key.to_string(), Value::String(name));
            }
        }

        if let Some(image) = listing.get("image") {
            raw_fields.insert("image".to_string(), image.clone());
        }

        let offers = match listing.get("offers") {
            Some(Value::Array(all)) => all.first(),
            other => other,
        };
        if let Some(Value::Object(offers)) = offers {
            collect_offer(offers, &mut raw_fields);
        }

        if let Some(condition) = listing.get("itemCondition").and_then(Value::as_str) {
            raw_fields.insert(
                "itemCondition".to_string(),
                Value::String(condition_name(condition)),
            );
        }

        if let Some(Value::Array(properties)) = listing.get("additionalProperty") {
            for property in properties {
                if let Some((name, value)) = property_entry(property) {
                    raw_fields.entry(name).or_insert(value);
                }
            }
        }

        for (key, value) in &listing {
            if key.starts_with('@')
                || matches!(
                    key.as_str(),
                    "brand" | "manufacturer" | "image" | "offers" | "itemCondition" | "additionalProperty"
                )
            {
                continue;
            }
            flatten_into(key, value, &mut raw_fields);
        }

        Ok(RawListingRecord::new(SourceId::Boats, source_url, raw_fields))
    }
}

/// Locate the vessel object in a JSON-LD document (object, array or @graph)
fn find_listing(value: &Value) -> Option<&Map<String, Value>> {
    match value {
        Value::Array(items) => items.iter().find_map(find_listing),
        Value::Object(obj) => {
            if is_listing_type(obj.get("@type")) {
                return Some(obj);
            }
            obj.get("@graph").and_then(find_listing)
        }
        _ => None,
    }
}

fn is_listing_type(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(t)) => LISTING_TYPES.contains(&t.as_str()),
        Some(Value::Array(types)) => types
            .iter()
            .any(|t| t.as_str().is_some_and(|t| LISTING_TYPES.contains(&t))),
        _ => false,
    }
}

fn listing_from_page(page: &str) -> Option<Map<String, Value>> {
    LD_JSON_SCRIPT
        .captures_iter(page)
        .filter_map(|caps| serde_json::from_str::<Value>(caps[1].trim()).ok())
        .find_map(|doc| find_listing(&doc).cloned())
}

/// A name from either a plain string or a `{name}` object
fn name_of(value: &Value) -> Option<String> {
    let name = match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => obj.get("name").and_then(Value::as_str).map(str::to_string),
        _ => None,
    };
    name.filter(|s| !s.trim().is_empty())
}

/// "https://schema.org/UsedCondition" → "Used"
fn condition_name(raw: &str) -> String {
    let leaf = raw.rsplit('/').next().unwrap_or(raw);
    leaf.strip_suffix("Condition").unwrap_or(leaf).to_string()
}

fn collect_offer(offers: &Map<String, Value>, raw_fields: &mut BTreeMap<String, Value>) {
    if let Some(price) = offers.get("price").filter(|v| !v.is_null()) {
        raw_fields.insert("offers.price".to_string(), price.clone());
    }
    if let Some(currency) = offers.get("priceCurrency").filter(|v| !v.is_null()) {
        raw_fields.insert("offers.priceCurrency".to_string(), currency.clone());
    }
    if let Some(condition) = offers.get("itemCondition").and_then(Value::as_str) {
        raw_fields.insert(
            "offers.itemCondition".to_string(),
            Value::String(condition_name(condition)),
        );
    }
    if let Some(seller) = offers.get("seller") {
        if let Some(kind) = seller.get("@type").and_then(Value::as_str) {
            let listing_type = if kind == "Person" { "Private" } else { "Broker" };
            raw_fields.insert("offers.seller".to_string(), Value::String(listing_type.into()));
        }
    }

    let address = offers
        .get("availableAtOrFrom")
        .and_then(|place| place.get("address"));
    let location = match address {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Object(addr)) => {
            let parts: Vec<&str> = ["addressLocality", "addressRegion", "addressCountry"]
                .iter()
                .filter_map(|k| addr.get(*k).and_then(Value::as_str))
                .filter(|s| !s.trim().is_empty())
                .collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        _ => None,
    };
    if let Some(location) = location {
        raw_fields.insert("location".to_string(), Value::String(location));
    }
}

/// `{name, value, unitCode}` → ("name", "value unit")
fn property_entry(property: &Value) -> Option<(String, Value)> {
    let name = property.get("name").and_then(Value::as_str)?.trim();
    if name.is_empty() {
        return None;
    }
    let value = property.get("value").filter(|v| !v.is_null())?;

    let unit = property
        .get("unitCode")
        .and_then(Value::as_str)
        .and_then(unit_for_code)
        .map(str::to_string)
        .or_else(|| {
            property
                .get("unitText")
                .and_then(Value::as_str)
                .map(str::to_string)
        });

    let value = match (value, unit) {
        (Value::Number(n), Some(unit)) => Value::String(format!("{} {}", n, unit)),
        (Value::String(s), Some(unit)) => Value::String(format!("{} {}", s.trim(), unit)),
        (other, _) => other.clone(),
    };
    Some((name.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const URL: &str = "https://www.boats.com/sailing-boats/2018-beneteau-oceanis-45-123/";

    fn listing() -> Value {
        json!({
            "@context": "https://schema.org",
            "@type": "Boat",
            "name": "2018 Beneteau Oceanis 45",
            "brand": {"@type": "Brand", "name": "Beneteau"},
            "model": "Oceanis 45",
            "modelDate": "2018",
            "image": ["https://images.boats.com/1.jpg", "https://images.boats.com/2.jpg"],
            "offers": {
                "@type": "Offer",
                "price": 289000,
                "priceCurrency": "EUR",
                "itemCondition": "https://schema.org/UsedCondition",
                "seller": {"@type": "Organization", "name": "Yacht Broker BV"},
                "availableAtOrFrom": {"address": {"addressLocality": "La Rochelle", "addressCountry": "France"}}
            },
            "additionalProperty": [
                {"@type": "PropertyValue", "name": "Length", "value": 13.85, "unitCode": "MTR"},
                {"@type": "PropertyValue", "name": "Displacement", "value": "9.6", "unitCode": "TNE"},
                {"@type": "PropertyValue", "name": "Hull Material", "value": "Fiberglass"}
            ]
        })
    }

    #[test]
    fn test_structured_json_ld() {
        let record = BoatsAdapter
            .extract(URL, &SourceContent::Structured(listing()))
            .unwrap();
        assert_eq!(record.raw_fields["brand"], json!("Beneteau"));
        assert_eq!(record.raw_fields["offers.price"], json!(289000));
        assert_eq!(record.raw_fields["offers.itemCondition"], json!("Used"));
        assert_eq!(record.raw_fields["offers.seller"], json!("Broker"));
        assert_eq!(record.raw_fields["location"], json!("La Rochelle, France"));
        assert_eq!(record.raw_fields["Length"], json!("13.85 m"));
        assert_eq!(record.raw_fields["Displacement"], json!("9.6 t"));
        assert_eq!(record.raw_fields["Hull Material"], json!("Fiberglass"));
        assert_eq!(record.raw_fields["modelDate"], json!("2018"));
        assert!(!record.raw_fields.contains_key("@type"));
    }

    #[test]
    fn test_json_ld_embedded_in_page() {
        let page = format!(
            r#"<html><head><script type="application/ld+json">{{"@type":"WebPage"}}</script>
            <script type="application/ld+json">{}</script></head></html>"#,
            listing()
        );
        let record = BoatsAdapter.extract(URL, &SourceContent::Page(page)).unwrap();
        assert_eq!(record.raw_fields["model"], json!("Oceanis 45"));
    }

    #[test]
    fn test_graph_container() {
        let doc = json!({"@graph": [{"@type": "Organization"}, listing()]});
        let record = BoatsAdapter.extract(URL, &SourceContent::Structured(doc)).unwrap();
        assert_eq!(record.raw_fields["name"], json!("2018 Beneteau Oceanis 45"));
    }

    #[test]
    fn test_no_listing_is_parse_error() {
        let page = SourceContent::Page("<html><body>no structured data</body></html>".into());
        assert!(matches!(
            BoatsAdapter.extract(URL, &page),
            Err(AdapterError::Parse(_))
        ));
    }

    #[test]
    fn test_unit_codes() {
        assert_eq!(unit_for_code("mtr"), Some("m"));
        assert_eq!(unit_for_code("GLL"), Some("gal"));
        assert_eq!(unit_for_code("XYZ"), None);
    }
}
