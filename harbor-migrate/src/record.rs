//! Draft canonical record
//!
//! Per-field state carried between the mapping, scoring and fallback stages.
//! A field holds a value (or not) together with its provenance and
//! confidence; the final [`CanonicalYacht`] is assembled from the draft once
//! every required field has a value.

use harbor_common::yacht::{CanonicalField, CanonicalValue, CanonicalYacht};
use harbor_common::{FieldProvenance, Provenance};
use std::collections::BTreeMap;

/// Confidence of a value extracted from the source and valid
pub const CONFIDENCE_EXTRACTED: f64 = 1.0;
/// Confidence of a field present in the source but failing coercion/validation
pub const CONFIDENCE_INVALID: f64 = 0.5;
/// Confidence of a value supplied by the model knowledge base
pub const CONFIDENCE_MODEL_DB: f64 = 0.7;

/// State of one canonical field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldState {
    /// `None` for present-but-invalid fields (value discarded)
    pub value: Option<CanonicalValue>,
    pub provenance: FieldProvenance,
}

/// Canonical record under construction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftRecord {
    fields: BTreeMap<CanonicalField, FieldState>,
}

impl DraftRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: CanonicalField) -> Option<&FieldState> {
        self.fields.get(&field)
    }

    pub fn value(&self, field: CanonicalField) -> Option<&CanonicalValue> {
        self.fields.get(&field).and_then(|s| s.value.as_ref())
    }

    pub fn text(&self, field: CanonicalField) -> Option<&str> {
        self.value(field).and_then(CanonicalValue::as_text)
    }

    pub fn has_value(&self, field: CanonicalField) -> bool {
        self.value(field).is_some()
    }

    /// Field confidence (0.0 when absent)
    pub fn confidence(&self, field: CanonicalField) -> f64 {
        self.fields
            .get(&field)
            .map(|s| s.provenance.confidence)
            .unwrap_or(0.0)
    }

    pub fn set(&mut self, field: CanonicalField, value: CanonicalValue, provenance: FieldProvenance) {
        self.fields.insert(
            field,
            FieldState {
                value: Some(value),
                provenance,
            },
        );
    }

    /// Record an extracted, valid value
    pub fn set_scraped(&mut self, field: CanonicalField, value: CanonicalValue) {
        self.set(
            field,
            value,
            FieldProvenance::new(Provenance::Scraped, CONFIDENCE_EXTRACTED),
        );
    }

    /// Record a field that was present but failed coercion or validation
    pub fn mark_invalid(&mut self, field: CanonicalField) {
        self.fields.insert(
            field,
            FieldState {
                value: None,
                provenance: FieldProvenance::new(Provenance::Scraped, CONFIDENCE_INVALID),
            },
        );
    }

    /// Append list items, skipping duplicates, preserving first-seen order
    pub fn extend_list(&mut self, field: CanonicalField, items: Vec<String>) {
        if items.is_empty() {
            return;
        }
        let mut merged = self
            .value(field)
            .and_then(CanonicalValue::as_list)
            .map(<[String]>::to_vec)
            .unwrap_or_default();
        for item in items {
            if !merged.contains(&item) {
                merged.push(item);
            }
        }
        self.set_scraped(field, CanonicalValue::List(merged));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CanonicalField, &FieldState)> {
        self.fields.iter()
    }

    /// Required fields that do not yet hold a value
    pub fn missing_required(&self) -> Vec<CanonicalField> {
        CanonicalField::required()
            .filter(|f| !self.has_value(*f))
            .collect()
    }

    /// All populated values
    pub fn values(&self) -> BTreeMap<CanonicalField, CanonicalValue> {
        self.fields
            .iter()
            .filter_map(|(f, s)| s.value.clone().map(|v| (*f, v)))
            .collect()
    }

    /// Provenance of every field the pipeline touched, keyed by schema name
    pub fn provenance(&self) -> BTreeMap<String, FieldProvenance> {
        self.fields
            .iter()
            .map(|(f, s)| (f.as_str().to_string(), s.provenance))
            .collect()
    }

    /// Assemble the canonical record
    ///
    /// # Errors
    /// The first required field still lacking a value.
    pub fn assemble(&self, data_completeness: u8) -> Result<CanonicalYacht, CanonicalField> {
        let mut yacht = CanonicalYacht::assemble(&self.values())?;
        yacht.data_completeness = data_completeness;
        Ok(yacht)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_field_has_zero_confidence() {
        let draft = DraftRecord::new();
        assert_eq!(draft.confidence(CanonicalField::Make), 0.0);
        assert_eq!(draft.missing_required().len(), 10);
    }

    #[test]
    fn test_invalid_field_has_no_value() {
        let mut draft = DraftRecord::new();
        draft.mark_invalid(CanonicalField::Year);
        assert_eq!(draft.confidence(CanonicalField::Year), CONFIDENCE_INVALID);
        assert!(!draft.has_value(CanonicalField::Year));
        assert!(draft.missing_required().contains(&CanonicalField::Year));
    }

    #[test]
    fn test_extend_list_deduplicates() {
        let mut draft = DraftRecord::new();
        draft.extend_list(
            CanonicalField::Images,
            vec!["a.jpg".into(), "b.jpg".into()],
        );
        draft.extend_list(
            CanonicalField::Images,
            vec!["b.jpg".into(), "c.jpg".into()],
        );
        assert_eq!(
            draft.value(CanonicalField::Images),
            Some(&CanonicalValue::List(vec![
                "a.jpg".into(),
                "b.jpg".into(),
                "c.jpg".into()
            ]))
        );
    }

    #[test]
    fn test_provenance_keyed_by_schema_name() {
        let mut draft = DraftRecord::new();
        draft.set_scraped(CanonicalField::BoatType, CanonicalValue::Text("Sailing".into()));
        let provenance = draft.provenance();
        assert_eq!(provenance["boatType"].provenance, Provenance::Scraped);
    }
}
