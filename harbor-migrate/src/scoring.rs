//! Confidence Scorer - weighted data completeness
//!
//! completeness = round(100 · Σ(weight · confidence) / Σ(weight))
//!
//! Core identity, commercial and physical fields carry most of the weight;
//! descriptive and media fields little. Weights sum to 100. Confidence is
//! 1.0 for extracted values, 0.5 for extracted-but-invalid, 0.7 for
//! knowledge-base values and 0.0 for absent fields. Schema defaults add
//! nothing.

use harbor_common::yacht::CanonicalField;

use crate::record::DraftRecord;

/// Weight of a canonical field in the completeness score
pub fn field_weight(field: CanonicalField) -> f64 {
    use CanonicalField::*;
    match field {
        Make | Model | Year | Price | Length => 12.0,
        Name | BoatType => 4.0,
        Location | HullMaterial => 3.0,
        ListingType | Condition | Beam | Draft | Description | Images => 2.0,
        Currency | Displacement | HullShape | BowShape | KeelType | RudderType
        | PropellerType | FuelType | Engine | Cabins | Berths => 1.0,
        FuelCapacity | WaterCapacity | Features | DeckEquipment | CabinEquipment
        | OtherSpecifications => 0.5,
    }
}

/// Sum of all field weights
pub fn total_weight() -> f64 {
    CanonicalField::ALL.iter().map(|f| field_weight(*f)).sum()
}

/// Completeness score (0-100) of a draft record
pub fn completeness(draft: &DraftRecord) -> u8 {
    let total = total_weight();
    if total <= 0.0 {
        return 0;
    }
    let earned: f64 = CanonicalField::ALL
        .iter()
        .map(|f| field_weight(*f) * draft.confidence(*f))
        .sum();
    (100.0 * earned / total).round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use harbor_common::yacht::CanonicalValue;
    use harbor_common::{FieldProvenance, Provenance};

    fn with_core_fields() -> DraftRecord {
        let mut draft = DraftRecord::new();
        draft.set_scraped(CanonicalField::Make, CanonicalValue::Text("Najad".into()));
        draft.set_scraped(CanonicalField::Model, CanonicalValue::Text("460".into()));
        draft.set_scraped(CanonicalField::Year, CanonicalValue::Integer(2004));
        draft.set_scraped(CanonicalField::Price, CanonicalValue::Number(349_000.0));
        draft.set_scraped(CanonicalField::Length, CanonicalValue::Number(45.77));
        draft
    }

    #[test]
    fn test_weights_sum_to_one_hundred() {
        assert!((total_weight() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_core_fields_outweigh_descriptive() {
        assert!(field_weight(CanonicalField::Price) > field_weight(CanonicalField::Description));
        assert!(field_weight(CanonicalField::Length) > field_weight(CanonicalField::Images));
    }

    #[test]
    fn test_empty_record_scores_zero() {
        assert_eq!(completeness(&DraftRecord::new()), 0);
    }

    #[test]
    fn test_core_fields_only() {
        let score = completeness(&with_core_fields());
        assert!(score >= 60 && score < 100, "score {}", score);
    }

    #[test]
    fn test_invalid_counts_half() {
        let mut draft = DraftRecord::new();
        draft.mark_invalid(CanonicalField::Price);
        assert_eq!(completeness(&draft), 6);
    }

    #[test]
    fn test_defaults_add_nothing() {
        let mut draft = with_core_fields();
        let before = completeness(&draft);
        draft.set(
            CanonicalField::Condition,
            CanonicalValue::Text("Used".into()),
            FieldProvenance::new(Provenance::Default, 0.0),
        );
        assert_eq!(completeness(&draft), before);
    }

    #[test]
    fn test_adding_a_valid_field_never_lowers_score() {
        let mut draft = with_core_fields();
        for field in CanonicalField::ALL {
            if draft.has_value(field) {
                continue;
            }
            let before = completeness(&draft);
            draft.set_scraped(field, CanonicalValue::Text("x".into()));
            assert!(completeness(&draft) >= before, "{} lowered the score", field);
        }
        assert_eq!(completeness(&draft), 100);
    }
}
