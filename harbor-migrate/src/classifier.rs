//! Source classification
//!
//! Maps a listing URL to the adapter that understands its source. Patterns are
//! checked against the URL host; the longest matching pattern wins, and equal
//! lengths fall back to declaration order. No match resolves to Generic, so
//! classification never fails.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::InputError;

/// Known listing sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    DeValk,
    YachtWorld,
    Boats,
    Generic,
}

impl SourceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::DeValk => "devalk",
            SourceId::YachtWorld => "yachtworld",
            SourceId::Boats => "boats",
            SourceId::Generic => "generic",
        }
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Built-in (domain pattern, source) table
const BUILTIN_PATTERNS: &[(&str, SourceId)] = &[
    ("devalk.nl", SourceId::DeValk),
    ("devalk.com", SourceId::DeValk),
    ("de-valk", SourceId::DeValk),
    ("yachtworld.com", SourceId::YachtWorld),
    ("yachtworld.co.uk", SourceId::YachtWorld),
    ("boats.com", SourceId::Boats),
];

/// Ordered domain-pattern classifier
#[derive(Debug, Clone)]
pub struct SourceClassifier {
    patterns: Vec<(String, SourceId)>,
}

impl Default for SourceClassifier {
    fn default() -> Self {
        Self::new(
            BUILTIN_PATTERNS
                .iter()
                .map(|(pattern, id)| (pattern.to_string(), *id)),
        )
    }
}

impl SourceClassifier {
    /// Build a classifier from (domain pattern, source) pairs
    ///
    /// A pattern containing a dot matches the host or any subdomain of it; a
    /// pattern without a dot matches any host containing it.
    pub fn new(patterns: impl IntoIterator<Item = (String, SourceId)>) -> Self {
        let mut patterns: Vec<(String, SourceId)> = patterns
            .into_iter()
            .map(|(p, id)| (p.trim().to_lowercase(), id))
            .filter(|(p, _)| !p.is_empty())
            .collect();
        // Stable sort keeps declaration order among equal lengths
        patterns.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self { patterns }
    }

    /// Classify a listing URL
    pub fn classify(&self, url: &str) -> SourceId {
        let host = Url::parse(url.trim())
            .ok()
            .and_then(|u| u.host_str().map(str::to_lowercase));

        let matched = match &host {
            Some(host) => self
                .patterns
                .iter()
                .find(|(pattern, _)| host_matches(host, pattern)),
            // Unparseable input: best-effort substring match
            None => {
                let lower = url.to_lowercase();
                self.patterns
                    .iter()
                    .find(|(pattern, _)| lower.contains(pattern.as_str()))
            }
        };

        let source = matched.map(|(_, id)| *id).unwrap_or(SourceId::Generic);
        debug!(url = %url, source = %source, "Classified listing URL");
        source
    }
}

fn host_matches(host: &str, pattern: &str) -> bool {
    if pattern.contains('.') {
        host == pattern
            || host
                .strip_suffix(pattern)
                .is_some_and(|prefix| prefix.ends_with('.'))
    } else {
        host.contains(pattern)
    }
}

/// Validate a caller-supplied listing URL
///
/// Accepts absolute http(s) URLs with a host.
pub fn parse_listing_url(raw: &str) -> Result<Url, InputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InputError::Blank);
    }

    let url = Url::parse(trimmed).map_err(|e| InputError::Malformed {
        url: trimmed.to_string(),
        reason: e.to_string(),
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(InputError::UnsupportedScheme(url.scheme().to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(InputError::Malformed {
            url: trimmed.to_string(),
            reason: "missing host".to_string(),
        });
    }

    Ok(url)
}
