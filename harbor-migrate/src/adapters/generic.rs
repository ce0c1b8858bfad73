//! Generic adapter
//!
//! Used for unknown sources and as the fallback when a source adapter cannot
//! parse its content. Never fails: structured JSON is flattened into dotted
//! paths, HTML pages are scanned for label/value pairs, headings, meta tags,
//! images and embedded JSON-LD. Whatever it finds is left for the mapper's
//! generic table; an empty record is a valid result.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;

use super::boats::LD_JSON_SCRIPT;
use super::{flatten_into, unwrap_envelope, SourceAdapter};
use crate::classifier::SourceId;
use crate::types::{AdapterError, RawListingRecord, SourceContent};

static TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid regex"));

static HEADLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<h1[^>]*>(.*?)</h1>").expect("valid regex"));

static META_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("valid regex"));

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)\b(name|property|content)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("valid regex")
});

static TABLE_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<tr[^>]*>\s*<t[hd][^>]*>(.*?)</t[hd]>\s*<td[^>]*>(.*?)</td>")
        .expect("valid regex")
});

static DEFINITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<dt[^>]*>(.*?)</dt>\s*<dd[^>]*>(.*?)</dd>").expect("valid regex")
});

static IMG_SRC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<img\b[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#).expect("valid regex")
});

static NON_VISIBLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<head\b.*?</head>|<script\b.*?</script>|<style\b.*?</style>|<!--.*?-->")
        .expect("valid regex")
});

static BLOCK_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(?:p|div|li|tr|h[1-6]|dd|section|article)>").expect("valid regex")
});

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));

static NUMERIC_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&#(x?)([0-9a-fA-F]{1,6});").expect("valid regex"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// "Label: value" or "Label | value" on a line of visible text
static LABEL_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z][A-Za-z0-9 /().#&'-]{0,39}?)\s*[:|]\s*(\S.{0,300}?)\s*$")
        .expect("valid regex")
});

/// Labels longer than this are sentences, not field names
const MAX_LABEL_WORDS: usize = 5;

pub struct GenericAdapter;

impl SourceAdapter for GenericAdapter {
    fn source_id(&self) -> SourceId {
        SourceId::Generic
    }

    fn extract(
        &self,
        source_url: &str,
        content: &SourceContent,
    ) -> Result<RawListingRecord, AdapterError> {
        let raw_fields = match content {
            SourceContent::Structured(value) => {
                let mut raw_fields = BTreeMap::new();
                let payload = unwrap_envelope(value)?;
                if payload.is_object() {
                    flatten_into("", payload, &mut raw_fields);
                }
                raw_fields
            }
            SourceContent::Page(page) => scan_page(page),
        };

        Ok(RawListingRecord::new(SourceId::Generic, source_url, raw_fields))
    }
}

/// Heuristic field extraction from an HTML page, earlier sources win
fn scan_page(page: &str) -> BTreeMap<String, Value> {
    let mut raw_fields = BTreeMap::new();

    // Embedded structured data is the most reliable signal
    for caps in LD_JSON_SCRIPT.captures_iter(page) {
        if let Ok(doc @ Value::Object(_)) = serde_json::from_str::<Value>(caps[1].trim()) {
            flatten_into("", &doc, &mut raw_fields);
        }
    }

    for caps in TABLE_ROW.captures_iter(page) {
        insert_pair(&mut raw_fields, &caps[1], &caps[2]);
    }
    for caps in DEFINITION.captures_iter(page) {
        insert_pair(&mut raw_fields, &caps[1], &caps[2]);
    }

    let visible = visible_text(page);
    for line in visible.lines() {
        if let Some(caps) = LABEL_LINE.captures(line) {
            let value = &caps[2];
            if !value.starts_with("//") {
                insert_pair(&mut raw_fields, &caps[1], value);
            }
        }
    }

    if let Some(title) = TITLE.captures(page).map(|c| clean_text(&c[1])) {
        insert_text(&mut raw_fields, "title", title);
    }
    if let Some(headline) = HEADLINE.captures(page).map(|c| clean_text(&c[1])) {
        insert_text(&mut raw_fields, "headline", headline);
    }

    let mut images = Vec::new();
    for tag in META_TAG.find_iter(page) {
        let (key, content) = meta_attributes(tag.as_str());
        match (key.as_deref(), content) {
            (Some("description" | "og:description"), Some(content)) => {
                insert_text(&mut raw_fields, "meta description", content);
            }
            (Some("og:title"), Some(content)) => {
                insert_text(&mut raw_fields, "title", content);
            }
            (Some("og:image"), Some(content)) => images.push(content),
            _ => {}
        }
    }
    for caps in IMG_SRC.captures_iter(page) {
        images.push(decode_entities(caps[1].trim()));
    }

    let mut seen = Vec::new();
    for image in images {
        if !image.is_empty() && !image.starts_with("data:") && !seen.contains(&image) {
            seen.push(image);
        }
    }
    if !seen.is_empty() {
        raw_fields
            .entry("images".to_string())
            .or_insert_with(|| Value::Array(seen.into_iter().map(Value::String).collect()));
    }

    raw_fields
}

fn insert_pair(raw_fields: &mut BTreeMap<String, Value>, label: &str, value: &str) {
    let label = clean_text(label);
    let label = label.trim_end_matches(':').trim();
    if label.is_empty() || label.split_whitespace().count() > MAX_LABEL_WORDS {
        return;
    }
    insert_text(raw_fields, label, clean_text(value));
}

fn insert_text(raw_fields: &mut BTreeMap<String, Value>, key: &str, value: String) {
    if !value.is_empty() {
        raw_fields
            .entry(key.to_string())
            .or_insert(Value::String(value));
    }
}

/// (name or property, content) of a `<meta>` tag, name lowercased
fn meta_attributes(tag: &str) -> (Option<String>, Option<String>) {
    let mut key = None;
    let mut content = None;
    for caps in ATTRIBUTE.captures_iter(tag) {
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map(|m| decode_entities(m.as_str()).trim().to_string())
            .unwrap_or_default();
        match caps[1].to_ascii_lowercase().as_str() {
            "content" => content = Some(value),
            _ => key = Some(value.to_ascii_lowercase()),
        }
    }
    (key, content.filter(|c| !c.is_empty()))
}

/// Page text with tags removed, one line per block element
fn visible_text(page: &str) -> String {
    let without_code = NON_VISIBLE.replace_all(page, " ");
    let with_breaks = BLOCK_BREAK.replace_all(&without_code, "\n");
    let text = TAG.replace_all(&with_breaks, " ");
    decode_entities(&text)
}

/// Strip markup from a fragment and collapse whitespace
fn clean_text(fragment: &str) -> String {
    let text = TAG.replace_all(fragment, " ");
    let text = decode_entities(&text);
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

fn decode_entities(text: &str) -> String {
    let numeric = NUMERIC_ENTITY.replace_all(text, |caps: &regex::Captures| {
        let radix = if caps[1].is_empty() { 10 } else { 16 };
        u32::from_str_radix(&caps[2], radix)
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default()
    });
    numeric
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&euro;", "€")
        .replace("&pound;", "£")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const URL: &str = "https://www.example-yachts.com/listing/42";

    const PAGE: &str = r#"<html>
<head>
  <title>Najad 460 | Example Yachts</title>
  <meta name="description" content="Well kept Najad 460 cutter &amp; ready to sail">
  <meta property="og:image" content="https://cdn.example.com/main.jpg">
  <style>.price { color: red; }</style>
</head>
<body>
  <h1>Najad <em>460</em></h1>
  <table>
    <tr><th>Builder</th><td>Najad</td></tr>
    <tr><th>Length overall</th><td>14.10&nbsp;m</td></tr>
  </table>
  <dl><dt>Year</dt><dd>2004</dd></dl>
  <div>Price: &euro; 349.000</div>
  <p>This yacht has been maintained by the same yard since she was launched: no expense spared.</p>
  <img src="/images/1.jpg"><img src='https://cdn.example.com/main.jpg'>
  <img src="data:image/gif;base64,R0lGOD">
</body>
</html>"#;

    #[test]
    fn test_structured_content_is_flattened() {
        let content = SourceContent::Structured(json!({
            "status": "success",
            "data": {"Make": "Najad", "dimensions": {"loa": "14.1 m"}}
        }));
        let record = GenericAdapter.extract(URL, &content).unwrap();
        assert_eq!(record.source_id, SourceId::Generic);
        assert_eq!(record.raw_fields["Make"], json!("Najad"));
        assert_eq!(record.raw_fields["dimensions.loa"], json!("14.1 m"));
    }

    #[test]
    fn test_non_object_payload_gives_empty_record() {
        let content = SourceContent::Structured(json!(["not", "a", "listing"]));
        let record = GenericAdapter.extract(URL, &content).unwrap();
        assert!(record.is_empty());
    }

    #[test]
    fn test_page_heuristics() {
        let record = GenericAdapter
            .extract(URL, &SourceContent::Page(PAGE.to_string()))
            .unwrap();
        let fields = &record.raw_fields;
        assert_eq!(fields["title"], json!("Najad 460 | Example Yachts"));
        assert_eq!(fields["headline"], json!("Najad 460"));
        assert_eq!(fields["Builder"], json!("Najad"));
        assert_eq!(fields["Length overall"], json!("14.10 m"));
        assert_eq!(fields["Year"], json!("2004"));
        assert_eq!(fields["Price"], json!("€ 349.000"));
        assert_eq!(
            fields["meta description"],
            json!("Well kept Najad 460 cutter & ready to sail")
        );
        assert_eq!(
            fields["images"],
            json!(["https://cdn.example.com/main.jpg", "/images/1.jpg"])
        );
        // A sentence containing a colon is not a label
        assert!(!fields
            .keys()
            .any(|k| k.starts_with("This yacht")));
    }

    #[test]
    fn test_embedded_json_ld_takes_precedence() {
        let page = r#"<html><head>
            <script type="application/ld+json">{"@type":"Boat","name":"Oceanis 45","model":"Oceanis 45"}</script>
            <title>Listing</title></head><body><div>model: other</div></body></html>"#;
        let record = GenericAdapter
            .extract(URL, &SourceContent::Page(page.to_string()))
            .unwrap();
        assert_eq!(record.raw_fields["model"], json!("Oceanis 45"));
        assert_eq!(record.raw_fields["title"], json!("Listing"));
    }

    #[test]
    fn test_empty_page_is_not_an_error() {
        let record = GenericAdapter
            .extract(URL, &SourceContent::Page(String::new()))
            .unwrap();
        assert!(record.is_empty());
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("A&amp;B &#8364; &#x41;"), "A&B € A");
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }
}
