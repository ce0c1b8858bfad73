//! Field Mapper
//!
//! Converts a raw field map into canonical values using declarative,
//! source-scoped [`FieldMapping`] tables.
//!
//! Raw keys are matched case-insensitively and ignoring punctuation and
//! whitespace, so "Asking Price", "Price (EUR)" and "price" all resolve the
//! same way. A parenthetical in a raw key is read as a unit or currency hint.
//!
//! For scalar fields the first table entry that yields a valid value wins;
//! list fields accumulate across every matching entry. A raw value that fails
//! coercion or range validation marks its field present-but-invalid instead
//! of aborting the mapping.

pub mod tables;
pub mod units;
pub mod validation;
pub mod vocabulary;

use harbor_common::yacht::{CanonicalField, CanonicalValue, FieldKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

use crate::classifier::SourceId;
use crate::record::DraftRecord;
use crate::types::RawListingRecord;
use units::{convert_quantity, detect_currency, parse_number, Dimension, Unit};
use vocabulary::Vocabulary;

// ============================================================================
// Mapping descriptors
// ============================================================================

/// Value transformation applied by one mapping
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    /// Trimmed text, whitespace collapsed
    Passthrough,
    /// Tolerant number (thousands separators, currency symbols)
    Numeric,
    /// Whole count (cabins, berths)
    Integer,
    /// Four-digit build year
    Year,
    /// Quantity converted to the dimension's canonical unit
    UnitConvert(Dimension),
    /// Canonical vocabulary term, "Other" when unmatched
    EnumNormalize(Vocabulary),
    /// ISO currency code from a code or symbol
    CurrencyCode,
    /// List from an array or a delimited string
    TextList,
    /// One "Label: value" list entry labeled from the raw key
    Labeled,
    /// A fixed feature name when the raw value is affirmative
    Feature(&'static str),
}

/// Declarative rule translating one raw field into one canonical field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMapping {
    pub raw_field_path: &'static str,
    pub canonical_field: CanonicalField,
    pub transform: Transform,
    pub required: bool,
    /// Unit of bare numbers for this source
    pub unit: Option<Unit>,
    /// Only applies when the raw label itself declares a unit ("Fuel (l)")
    pub needs_label_unit: bool,
}

impl FieldMapping {
    pub fn new(
        raw_field_path: &'static str,
        canonical_field: CanonicalField,
        transform: Transform,
    ) -> Self {
        Self {
            raw_field_path,
            canonical_field,
            transform,
            required: canonical_field.is_required(),
            unit: None,
            needs_label_unit: false,
        }
    }

    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    pub fn label_unit_only(mut self) -> Self {
        self.needs_label_unit = true;
        self
    }
}

/// Result of applying one mapping to one raw value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOutcome {
    Value(CanonicalValue),
    /// Present but unusable; the reason is reported as a warning
    Invalid(String),
    /// Empty or placeholder value, treated as absent
    NoSignal,
}

/// Output of the mapping stage
#[derive(Debug, Clone, Default)]
pub struct MappingReport {
    pub draft: DraftRecord,
    pub warnings: Vec<String>,
    /// Required fields without a value, for the fallback resolver
    pub missing_required: Vec<CanonicalField>,
}

// ============================================================================
// Raw key index
// ============================================================================

static PARENTHETICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([^)]*)\)|\[([^\]]*)\]").expect("valid regex"));

static YEAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(1[89]\d{2}|20\d{2})\b").expect("valid regex"));

/// Fold a raw key for matching: parentheticals dropped, lowercase, alphanumerics only
pub fn normalize_key(key: &str) -> String {
    PARENTHETICAL
        .replace_all(key, "")
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Unit and currency hints declared by a label ("Length (m)", "Price (EUR)")
fn label_hints(key: &str) -> (Option<Unit>, Option<&'static str>) {
    let mut unit = None;
    let mut currency = None;
    for caps in PARENTHETICAL.captures_iter(key) {
        let inner = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or("");
        unit = unit.or_else(|| Unit::parse(inner));
        currency = currency.or_else(|| detect_currency(inner));
    }
    (unit, currency)
}

/// Path leaves too generic to stand for a field on their own ("seller.type")
const AMBIGUOUS_LEAVES: &[&str] = &[
    "type", "name", "value", "id", "unit", "unitcode", "text", "label", "url", "description",
];

struct RawEntry<'a> {
    key: &'a str,
    value: &'a Value,
    unit_hint: Option<Unit>,
    currency_hint: Option<&'static str>,
}

struct RawIndex<'a> {
    entries: Vec<RawEntry<'a>>,
    by_key: HashMap<String, usize>,
}

impl<'a> RawIndex<'a> {
    fn build(raw_fields: &'a BTreeMap<String, Value>) -> Self {
        let mut entries = Vec::with_capacity(raw_fields.len());
        let mut by_key = HashMap::new();
        let mut aliases = Vec::new();

        for (key, value) in raw_fields {
            let (unit_hint, currency_hint) = label_hints(key);
            let idx = entries.len();
            entries.push(RawEntry {
                key,
                value,
                unit_hint,
                currency_hint,
            });
            by_key.entry(normalize_key(key)).or_insert(idx);
            // Dotted paths are also reachable by a distinctive last segment
            if let Some((_, leaf)) = key.rsplit_once('.') {
                let leaf = normalize_key(leaf);
                if !AMBIGUOUS_LEAVES.contains(&leaf.as_str()) {
                    aliases.push((leaf, idx));
                }
            }
        }

        for (alias, idx) in aliases {
            by_key.entry(alias).or_insert(idx);
        }

        Self { entries, by_key }
    }

    fn lookup(&self, raw_field_path: &str) -> Option<usize> {
        self.by_key.get(&normalize_key(raw_field_path)).copied()
    }
}

// ============================================================================
// Field Mapper
// ============================================================================

/// Maps raw records onto the canonical schema through per-source tables
///
/// Tables are static and shared read-only by every migration.
#[derive(Debug, Clone)]
pub struct FieldMapper {
    tables: BTreeMap<SourceId, &'static [FieldMapping]>,
}

impl Default for FieldMapper {
    fn default() -> Self {
        let tables = [
            SourceId::DeValk,
            SourceId::YachtWorld,
            SourceId::Boats,
            SourceId::Generic,
        ]
        .into_iter()
        .map(|source| (source, tables::table_for(source)))
        .collect();
        Self { tables }
    }
}

impl FieldMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mapping table used for a source
    pub fn table(&self, source: SourceId) -> &'static [FieldMapping] {
        self.tables
            .get(&source)
            .copied()
            .unwrap_or_else(|| tables::table_for(SourceId::Generic))
    }

    /// Map a raw record onto canonical fields
    ///
    /// Never fails: problems surface as invalid fields and warnings.
    pub fn map(&self, record: &RawListingRecord) -> MappingReport {
        let table = self.table(record.source_id);
        let index = RawIndex::build(&record.raw_fields);
        let mut report = MappingReport::default();
        let mut consumed: HashSet<usize> = HashSet::new();
        let mut price_currency: Option<&'static str> = None;

        for mapping in table {
            let Some(idx) = index.lookup(mapping.raw_field_path) else {
                continue;
            };
            let entry = &index.entries[idx];

            if mapping.needs_label_unit {
                let hinted = match (mapping.transform, entry.unit_hint) {
                    (Transform::UnitConvert(dimension), Some(unit)) => {
                        unit.dimension() == dimension
                    }
                    _ => false,
                };
                if !hinted {
                    continue;
                }
            }

            // "Fuel (l)" is a tank size, never a fuel type
            if matches!(mapping.transform, Transform::EnumNormalize(_)) && entry.unit_hint.is_some() {
                continue;
            }

            let field = mapping.canonical_field;
            let is_list = field.kind() == FieldKind::List;

            // First valid value wins for scalars
            if !is_list && report.draft.has_value(field) {
                consumed.insert(idx);
                continue;
            }

            consumed.insert(idx);
            let outcome = apply_transform(mapping, entry);

            match outcome {
                FieldOutcome::Value(CanonicalValue::List(items)) if is_list => {
                    let items = if field == CanonicalField::Images {
                        items.into_iter().filter(|i| looks_like_image_ref(i)).collect()
                    } else {
                        items
                    };
                    report.draft.extend_list(field, items);
                }
                FieldOutcome::Value(value) => match validation::validate(field, &value) {
                    Ok(()) => {
                        if let (Transform::EnumNormalize(_), Some(vocabulary::OTHER)) =
                            (mapping.transform, value.as_text())
                        {
                            report.warnings.push(format!(
                                "{}: '{}' not in vocabulary, recorded as Other",
                                field,
                                display_value(entry.value)
                            ));
                        }
                        if field == CanonicalField::Price {
                            price_currency = entry
                                .currency_hint
                                .or_else(|| raw_text(entry.value).and_then(|t| detect_currency(&t)));
                        }
                        debug!(field = %field, raw_key = entry.key, "Mapped field");
                        report.draft.set_scraped(field, value);
                    }
                    Err(reason) => {
                        warn!(field = %field, raw_key = entry.key, reason = %reason, "Discarding out-of-range value");
                        report.warnings.push(format!("{}: {}", field, reason));
                        report.draft.mark_invalid(field);
                    }
                },
                FieldOutcome::Invalid(reason) => {
                    warn!(field = %field, raw_key = entry.key, reason = %reason, "Discarding invalid value");
                    report.warnings.push(format!("{}: {}", field, reason));
                    if !report.draft.has_value(field) {
                        report.draft.mark_invalid(field);
                    }
                }
                FieldOutcome::NoSignal => {}
            }
        }

        if !report.draft.has_value(CanonicalField::Currency) {
            if let Some(code) = price_currency {
                report
                    .draft
                    .set_scraped(CanonicalField::Currency, CanonicalValue::Text(code.to_string()));
            }
        }

        collect_other_specifications(&index, &consumed, &mut report.draft);

        report.missing_required = report.draft.missing_required();
        debug!(
            source = %record.source_id,
            mapped = report.draft.values().len(),
            missing_required = report.missing_required.len(),
            "Mapping complete"
        );
        report
    }
}

/// Keep unconsumed scalar raw fields as "key: value" lines
fn collect_other_specifications(
    index: &RawIndex<'_>,
    consumed: &HashSet<usize>,
    draft: &mut DraftRecord,
) {
    let mut lines: Vec<String> = draft
        .text(CanonicalField::OtherSpecifications)
        .map(|existing| vec![existing.to_string()])
        .unwrap_or_default();

    for (idx, entry) in index.entries.iter().enumerate() {
        if consumed.contains(&idx) || tables::is_ignored_key(entry.key) {
            continue;
        }
        let scalar = match entry.value {
            Value::String(_) | Value::Number(_) | Value::Bool(_) => raw_text(entry.value),
            _ => None,
        };
        if let Some(text) = scalar.filter(|t| !is_placeholder(t)) {
            lines.push(format!("{}: {}", entry.key, text));
        }
    }

    if !lines.is_empty() {
        draft.set_scraped(
            CanonicalField::OtherSpecifications,
            CanonicalValue::Text(lines.join("\n")),
        );
    }
}

// ============================================================================
// Transforms
// ============================================================================

fn apply_transform(mapping: &FieldMapping, entry: &RawEntry<'_>) -> FieldOutcome {
    if let Transform::TextList = mapping.transform {
        let items = list_items(entry.value);
        return if items.is_empty() {
            FieldOutcome::NoSignal
        } else {
            FieldOutcome::Value(CanonicalValue::List(items))
        };
    }

    let Some(text) = raw_text(entry.value).filter(|t| !is_placeholder(t)) else {
        return FieldOutcome::NoSignal;
    };

    match mapping.transform {
        Transform::Passthrough => FieldOutcome::Value(CanonicalValue::Text(text)),
        Transform::Numeric => match parse_number(&text) {
            Some(n) => FieldOutcome::Value(CanonicalValue::Number(n)),
            None => FieldOutcome::Invalid(format!("'{}' is not numeric", text)),
        },
        Transform::Integer => match parse_number(&text) {
            Some(n) if n >= 0.0 => FieldOutcome::Value(CanonicalValue::Integer(n.trunc() as i64)),
            _ => FieldOutcome::Invalid(format!("'{}' is not a count", text)),
        },
        Transform::Year => {
            let year = YEAR_PATTERN
                .captures(&text)
                .and_then(|c| c[1].parse::<i64>().ok())
                .or_else(|| parse_number(&text).map(|n| n.trunc() as i64));
            match year {
                Some(y) => FieldOutcome::Value(CanonicalValue::Integer(y)),
                None => FieldOutcome::Invalid(format!("'{}' is not a year", text)),
            }
        }
        Transform::UnitConvert(dimension) => {
            let default_unit = entry
                .unit_hint
                .or(mapping.unit)
                .unwrap_or_else(|| dimension.canonical_unit());
            match convert_quantity(&text, dimension, Some(default_unit)) {
                Ok(n) => FieldOutcome::Value(CanonicalValue::Number(round2(n))),
                Err(e) => FieldOutcome::Invalid(format!("'{}': {}", text, e)),
            }
        }
        Transform::EnumNormalize(vocabulary) => {
            let matched = vocabulary.normalize(&text);
            FieldOutcome::Value(CanonicalValue::Text(matched.value.to_string()))
        }
        Transform::CurrencyCode => {
            let trimmed = text.trim();
            let code = detect_currency(trimmed).map(str::to_string).or_else(|| {
                (trimmed.len() == 3 && trimmed.chars().all(|c| c.is_ascii_alphabetic()))
                    .then(|| trimmed.to_uppercase())
            });
            match code {
                Some(code) => FieldOutcome::Value(CanonicalValue::Text(code)),
                None => FieldOutcome::Invalid(format!("'{}' is not a currency", text)),
            }
        }
        Transform::Labeled => {
            let label = humanize_key(entry.key);
            let item = if is_affirmative(&text) {
                label
            } else {
                format!("{}: {}", label, text)
            };
            FieldOutcome::Value(CanonicalValue::List(vec![item]))
        }
        Transform::Feature(name) => {
            if is_negative(&text) {
                FieldOutcome::NoSignal
            } else {
                FieldOutcome::Value(CanonicalValue::List(vec![name.to_string()]))
            }
        }
        Transform::TextList => FieldOutcome::NoSignal,
    }
}

fn round2(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}

/// Scalar text of a raw value; arrays join their scalar items
fn raw_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.split_whitespace().collect::<Vec<_>>().join(" "),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "yes".to_string(),
        Value::Bool(false) => "no".to_string(),
        Value::Array(items) => items
            .iter()
            .filter(|v| !v.is_array() && !v.is_object())
            .filter_map(raw_text)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Null | Value::Object(_) => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn display_value(value: &Value) -> String {
    raw_text(value).unwrap_or_default()
}

/// List items from an array or a delimited string
fn list_items(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Object(obj) => ["url", "src", "contentUrl", "href", "name"]
                    .iter()
                    .find_map(|k| obj.get(*k).and_then(raw_text)),
                other => raw_text(other),
            })
            .filter(|t| !is_placeholder(t))
            .collect(),
        Value::String(s) => s
            .split(['\n', ';', '|', ','])
            .map(str::trim)
            .filter(|t| !t.is_empty() && !is_placeholder(t))
            .map(str::to_string)
            .collect(),
        other => raw_text(other).into_iter().collect(),
    }
}

fn looks_like_image_ref(candidate: &str) -> bool {
    !candidate.is_empty() && !candidate.chars().any(char::is_whitespace)
}

fn is_placeholder(text: &str) -> bool {
    matches!(
        text.trim().to_lowercase().as_str(),
        "" | "-" | "--" | "?" | "n/a" | "na" | "none" | "unknown" | "tbd" | "not available" | "null"
    )
}

fn is_affirmative(text: &str) -> bool {
    matches!(
        text.trim().to_lowercase().as_str(),
        "yes" | "y" | "true" | "ja" | "present" | "included"
    )
}

fn is_negative(text: &str) -> bool {
    matches!(
        text.trim().to_lowercase().as_str(),
        "no" | "n" | "false" | "0" | "nee" | "not included"
    )
}

/// "anchorChain" / "anchor_chain" → "Anchor chain"
pub fn humanize_key(key: &str) -> String {
    let leaf = key.rsplit('.').next().unwrap_or(key);
    let leaf = PARENTHETICAL.replace_all(leaf, "");
    let mut words = String::new();
    let mut prev_lower = false;
    for c in leaf.trim().chars() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !words.ends_with(' ') && !words.is_empty() {
                words.push(' ');
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower {
            words.push(' ');
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        words.extend(c.to_lowercase());
    }
    let words = words.trim();
    let mut chars = words.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
