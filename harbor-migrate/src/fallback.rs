//! Fallback Resolver
//!
//! Guarantees every required field holds a value once mapping is done.
//! Required fields left empty by the mapper (absent or present-but-invalid)
//! are filled from the model knowledge base when the listing's model is
//! known there (`model-db`, confidence 0.7), otherwise from the schema
//! default (`default`). A default keeps the field's prior confidence, so it
//! never raises completeness.
//!
//! A knowledge base match also fills optional fields the listing left empty,
//! even when every required field is already present.

use harbor_common::yacht::{CanonicalField, CanonicalValue};
use harbor_common::{FieldProvenance, Provenance};
use std::sync::Arc;
use tracing::{debug, info};

use crate::knowledge_base::{ModelKnowledgeBase, ModelSpecification};
use crate::mapping::vocabulary::Vocabulary;
use crate::record::{DraftRecord, CONFIDENCE_MODEL_DB};

/// Placeholder for unknown make, model and location
pub const UNKNOWN: &str = "Unknown";
/// Name used when neither make nor model is known
pub const UNTITLED: &str = "Untitled yacht";

/// What the resolver changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FallbackReport {
    /// Knowledge base record that matched, if any
    pub matched_model: Option<String>,
    pub from_model_db: Vec<CanonicalField>,
    pub defaulted: Vec<CanonicalField>,
    pub warnings: Vec<String>,
}

pub struct FallbackResolver {
    knowledge_base: Arc<dyn ModelKnowledgeBase>,
}

impl FallbackResolver {
    pub fn new(knowledge_base: Arc<dyn ModelKnowledgeBase>) -> Self {
        Self { knowledge_base }
    }

    /// Fill every required field that lacks a value
    ///
    /// The knowledge base is consulted whenever the model is known, whether
    /// or not a required field is missing, so adding a field to a listing
    /// never removes model-db values from others.
    pub fn resolve(&self, draft: &mut DraftRecord) -> FallbackReport {
        let mut report = FallbackReport::default();

        if let Some(spec) = self.find_model(draft) {
            info!(model = %spec.model, "Filling missing fields from model knowledge base");
            report.matched_model = Some(spec.model.clone());
            for field in CanonicalField::ALL {
                if draft.has_value(field) {
                    continue;
                }
                if let Some(value) = model_value(spec, field) {
                    draft.set(
                        field,
                        value,
                        FieldProvenance::new(Provenance::ModelDb, CONFIDENCE_MODEL_DB),
                    );
                    report.from_model_db.push(field);
                }
            }
        }

        // Name last: it derives from make and model
        for field in draft.missing_required() {
            if field == CanonicalField::Name {
                continue;
            }
            apply_default(draft, field, default_value(field), &mut report);
        }
        if !draft.has_value(CanonicalField::Name) {
            let name = derived_name(draft);
            apply_default(draft, CanonicalField::Name, CanonicalValue::Text(name), &mut report);
        }

        debug!(
            from_model_db = report.from_model_db.len(),
            defaulted = report.defaulted.len(),
            "Fallback resolution complete"
        );
        report
    }

    /// Knowledge base record for the listing's model, tried bare and with the make
    fn find_model(&self, draft: &DraftRecord) -> Option<&ModelSpecification> {
        let model = draft.text(CanonicalField::Model)?;
        self.knowledge_base.lookup(model).or_else(|| {
            let make = draft.text(CanonicalField::Make)?;
            self.knowledge_base.lookup(&format!("{} {}", make, model))
        })
    }
}

fn apply_default(
    draft: &mut DraftRecord,
    field: CanonicalField,
    value: CanonicalValue,
    report: &mut FallbackReport,
) {
    let prior = draft.confidence(field);
    let message = if prior > 0.0 {
        format!("{} was invalid; default applied", field)
    } else {
        format!("{} not found in listing; default applied", field)
    };
    draft.set(field, value, FieldProvenance::new(Provenance::Default, prior));
    report.defaulted.push(field);
    report.warnings.push(message);
}

/// Documented schema default of a required field
pub fn default_value(field: CanonicalField) -> CanonicalValue {
    match field {
        CanonicalField::Year => CanonicalValue::Integer(0),
        CanonicalField::Price | CanonicalField::Length => CanonicalValue::Number(0.0),
        CanonicalField::ListingType => CanonicalValue::Text("Broker".into()),
        CanonicalField::Condition => CanonicalValue::Text("Used".into()),
        CanonicalField::BoatType => CanonicalValue::Text("Other".into()),
        CanonicalField::Name => CanonicalValue::Text(UNTITLED.into()),
        _ => CanonicalValue::Text(UNKNOWN.into()),
    }
}

/// "{make} {model}" when both were found, otherwise the untitled placeholder
fn derived_name(draft: &DraftRecord) -> String {
    let known = |field| {
        draft
            .get(field)
            .filter(|s| s.provenance.provenance != Provenance::Default)
            .and_then(|s| s.value.as_ref())
            .and_then(CanonicalValue::as_text)
    };
    match (known(CanonicalField::Make), known(CanonicalField::Model)) {
        (Some(make), Some(model)) => {
            if model.to_lowercase().starts_with(&make.to_lowercase()) {
                model.to_string()
            } else {
                format!("{} {}", make, model)
            }
        }
        _ => UNTITLED.to_string(),
    }
}

fn model_value(spec: &ModelSpecification, field: CanonicalField) -> Option<CanonicalValue> {
    let text = |v: &Option<String>| v.clone().map(CanonicalValue::Text);
    let number = |v: Option<f64>| v.filter(|n| *n > 0.0).map(CanonicalValue::Number);
    let count = |v: Option<u32>| v.filter(|n| *n > 0).map(|n| CanonicalValue::Integer(n.into()));
    let vocab = |vocabulary: Vocabulary, v: &Option<String>| {
        let matched = vocabulary.normalize(v.as_deref()?);
        (!matched.is_other()).then(|| CanonicalValue::Text(matched.value.to_string()))
    };

    match field {
        CanonicalField::Make => text(&spec.make),
        CanonicalField::Year => spec.first_built.map(|y| CanonicalValue::Integer(y.into())),
        CanonicalField::Length => number(spec.length_ft),
        CanonicalField::Beam => number(spec.beam_ft),
        CanonicalField::Draft => number(spec.draft_ft),
        CanonicalField::Displacement => number(spec.displacement_lb),
        CanonicalField::FuelCapacity => number(spec.fuel_gal),
        CanonicalField::WaterCapacity => number(spec.water_gal),
        CanonicalField::Cabins => count(spec.cabins),
        CanonicalField::Berths => count(spec.berths),
        CanonicalField::Engine => text(&spec.engine),
        CanonicalField::BoatType => vocab(Vocabulary::BoatType, &spec.boat_type),
        CanonicalField::HullMaterial => vocab(Vocabulary::HullMaterial, &spec.hull_material),
        CanonicalField::KeelType => vocab(Vocabulary::KeelType, &spec.keel_type),
        CanonicalField::RudderType => vocab(Vocabulary::RudderType, &spec.rudder_type),
        CanonicalField::FuelType => vocab(Vocabulary::FuelType, &spec.fuel_type),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge_base::StaticKnowledgeBase;
    use crate::record::CONFIDENCE_INVALID;

    fn resolver() -> FallbackResolver {
        FallbackResolver::new(Arc::new(StaticKnowledgeBase::builtin()))
    }

    fn empty_resolver() -> FallbackResolver {
        FallbackResolver::new(Arc::new(StaticKnowledgeBase::default()))
    }

    #[test]
    fn test_empty_record_gets_defaults() {
        let mut draft = DraftRecord::new();
        let report = empty_resolver().resolve(&mut draft);

        assert!(draft.missing_required().is_empty());
        assert_eq!(report.defaulted.len(), 10);
        assert_eq!(draft.text(CanonicalField::Condition), Some("Used"));
        assert_eq!(draft.text(CanonicalField::ListingType), Some("Broker"));
        assert_eq!(draft.text(CanonicalField::Name), Some(UNTITLED));
        assert_eq!(
            draft.value(CanonicalField::Year),
            Some(&CanonicalValue::Integer(0))
        );
        assert_eq!(draft.confidence(CanonicalField::Make), 0.0);
        assert_eq!(
            draft.get(CanonicalField::Make).unwrap().provenance.provenance,
            Provenance::Default
        );
    }

    #[test]
    fn test_knowledge_base_fills_missing_fields() {
        let mut draft = DraftRecord::new();
        draft.set_scraped(CanonicalField::Make, CanonicalValue::Text("Najad".into()));
        draft.set_scraped(CanonicalField::Model, CanonicalValue::Text("460".into()));

        let report = resolver().resolve(&mut draft);
        assert_eq!(report.matched_model.as_deref(), Some("Najad 460"));

        let length = draft.get(CanonicalField::Length).unwrap();
        assert_eq!(length.value, Some(CanonicalValue::Number(45.77)));
        assert_eq!(length.provenance.provenance, Provenance::ModelDb);
        assert_eq!(length.provenance.confidence, CONFIDENCE_MODEL_DB);

        assert_eq!(draft.text(CanonicalField::BoatType), Some("Sailing"));
        assert_eq!(draft.text(CanonicalField::HullMaterial), Some("Fiberglass"));
        assert_eq!(draft.text(CanonicalField::KeelType), Some("Bulb Keel"));
        assert_eq!(draft.text(CanonicalField::Name), Some("Najad 460"));
        // Scraped make is kept
        assert_eq!(
            draft.get(CanonicalField::Make).unwrap().provenance.provenance,
            Provenance::Scraped
        );
        // Price is not in the knowledge base
        assert_eq!(
            draft.get(CanonicalField::Price).unwrap().provenance.provenance,
            Provenance::Default
        );
    }

    #[test]
    fn test_full_model_name_lookup() {
        let mut draft = DraftRecord::new();
        draft.set_scraped(CanonicalField::Model, CanonicalValue::Text("NAJAD 460".into()));
        resolver().resolve(&mut draft);
        assert_eq!(draft.text(CanonicalField::Make), Some("Najad"));
        assert_eq!(draft.confidence(CanonicalField::Make), CONFIDENCE_MODEL_DB);
        assert_eq!(draft.text(CanonicalField::Name), Some("NAJAD 460"));
    }

    #[test]
    fn test_invalid_field_keeps_half_confidence_under_default() {
        let mut draft = DraftRecord::new();
        draft.mark_invalid(CanonicalField::Year);
        let report = empty_resolver().resolve(&mut draft);
        assert_eq!(draft.confidence(CanonicalField::Year), CONFIDENCE_INVALID);
        assert!(report.warnings.iter().any(|w| w.starts_with("year was invalid")));
    }

    #[test]
    fn test_complete_record_untouched() {
        let mut draft = DraftRecord::new();
        for field in CanonicalField::required() {
            draft.set_scraped(field, default_value(field));
        }
        let before = draft.clone();
        let report = resolver().resolve(&mut draft);
        assert_eq!(report, FallbackReport::default());
        assert_eq!(draft, before);
    }

    #[test]
    fn test_known_model_fills_optionals_when_required_complete() {
        let mut draft = DraftRecord::new();
        for field in CanonicalField::required() {
            draft.set_scraped(field, default_value(field));
        }
        draft.set_scraped(CanonicalField::Make, CanonicalValue::Text("Najad".into()));
        draft.set_scraped(CanonicalField::Model, CanonicalValue::Text("460".into()));
        draft.set_scraped(CanonicalField::Length, CanonicalValue::Number(46.0));

        let report = resolver().resolve(&mut draft);
        assert_eq!(report.matched_model.as_deref(), Some("Najad 460"));
        assert!(report.defaulted.is_empty());
        assert_eq!(draft.confidence(CanonicalField::Beam), CONFIDENCE_MODEL_DB);
        // Scraped required values win over the record
        assert_eq!(
            draft.value(CanonicalField::Length),
            Some(&CanonicalValue::Number(46.0))
        );
    }

    #[test]
    fn test_name_from_make_and_model() {
        let mut draft = DraftRecord::new();
        draft.set_scraped(CanonicalField::Make, CanonicalValue::Text("Contest".into()));
        draft.set_scraped(CanonicalField::Model, CanonicalValue::Text("42CS".into()));
        empty_resolver().resolve(&mut draft);
        assert_eq!(draft.text(CanonicalField::Name), Some("Contest 42CS"));
    }
}
