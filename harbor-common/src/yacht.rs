//! Canonical yacht schema
//!
//! Every listing source is normalized into [`CanonicalYacht`]. Lengths are in
//! feet, weights in pounds and tank volumes in US gallons.
//!
//! Required fields are non-optional in the struct itself, so a record can only
//! be assembled once each of them holds an extracted, knowledge-base or
//! default value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

// ============================================================================
// Canonical fields
// ============================================================================

/// One field of the canonical schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CanonicalField {
    // Identity
    Name,
    Make,
    Model,
    Year,
    // Commercial
    Price,
    Currency,
    ListingType,
    Condition,
    Location,
    // Physical
    Length,
    Beam,
    Draft,
    Displacement,
    BoatType,
    HullMaterial,
    HullShape,
    BowShape,
    KeelType,
    RudderType,
    PropellerType,
    // Machinery & accommodation
    FuelType,
    Engine,
    FuelCapacity,
    WaterCapacity,
    Cabins,
    Berths,
    // Media & descriptive
    Images,
    Description,
    Features,
    DeckEquipment,
    CabinEquipment,
    OtherSpecifications,
}

/// Value shape a canonical field accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Integer,
    List,
}

impl CanonicalField {
    /// Every canonical field, in schema order
    pub const ALL: [CanonicalField; 32] = [
        CanonicalField::Name,
        CanonicalField::Make,
        CanonicalField::Model,
        CanonicalField::Year,
        CanonicalField::Price,
        CanonicalField::Currency,
        CanonicalField::ListingType,
        CanonicalField::Condition,
        CanonicalField::Location,
        CanonicalField::Length,
        CanonicalField::Beam,
        CanonicalField::Draft,
        CanonicalField::Displacement,
        CanonicalField::BoatType,
        CanonicalField::HullMaterial,
        CanonicalField::HullShape,
        CanonicalField::BowShape,
        CanonicalField::KeelType,
        CanonicalField::RudderType,
        CanonicalField::PropellerType,
        CanonicalField::FuelType,
        CanonicalField::Engine,
        CanonicalField::FuelCapacity,
        CanonicalField::WaterCapacity,
        CanonicalField::Cabins,
        CanonicalField::Berths,
        CanonicalField::Images,
        CanonicalField::Description,
        CanonicalField::Features,
        CanonicalField::DeckEquipment,
        CanonicalField::CabinEquipment,
        CanonicalField::OtherSpecifications,
    ];

    /// Schema name (camelCase, as serialized)
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Name => "name",
            CanonicalField::Make => "make",
            CanonicalField::Model => "model",
            CanonicalField::Year => "year",
            CanonicalField::Price => "price",
            CanonicalField::Currency => "currency",
            CanonicalField::ListingType => "listingType",
            CanonicalField::Condition => "condition",
            CanonicalField::Location => "location",
            CanonicalField::Length => "length",
            CanonicalField::Beam => "beam",
            CanonicalField::Draft => "draft",
            CanonicalField::Displacement => "displacement",
            CanonicalField::BoatType => "boatType",
            CanonicalField::HullMaterial => "hullMaterial",
            CanonicalField::HullShape => "hullShape",
            CanonicalField::BowShape => "bowShape",
            CanonicalField::KeelType => "keelType",
            CanonicalField::RudderType => "rudderType",
            CanonicalField::PropellerType => "propellerType",
            CanonicalField::FuelType => "fuelType",
            CanonicalField::Engine => "engine",
            CanonicalField::FuelCapacity => "fuelCapacity",
            CanonicalField::WaterCapacity => "waterCapacity",
            CanonicalField::Cabins => "cabins",
            CanonicalField::Berths => "berths",
            CanonicalField::Images => "images",
            CanonicalField::Description => "description",
            CanonicalField::Features => "features",
            CanonicalField::DeckEquipment => "deckEquipment",
            CanonicalField::CabinEquipment => "cabinEquipment",
            CanonicalField::OtherSpecifications => "otherSpecifications",
        }
    }

    /// UI-critical fields that must hold a value once the pipeline completes
    pub fn is_required(&self) -> bool {
        matches!(
            self,
            CanonicalField::Name
                | CanonicalField::Make
                | CanonicalField::Model
                | CanonicalField::Year
                | CanonicalField::Price
                | CanonicalField::ListingType
                | CanonicalField::Condition
                | CanonicalField::Location
                | CanonicalField::Length
                | CanonicalField::BoatType
        )
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            CanonicalField::Year | CanonicalField::Cabins | CanonicalField::Berths => {
                FieldKind::Integer
            }
            CanonicalField::Price
            | CanonicalField::Length
            | CanonicalField::Beam
            | CanonicalField::Draft
            | CanonicalField::Displacement
            | CanonicalField::FuelCapacity
            | CanonicalField::WaterCapacity => FieldKind::Number,
            CanonicalField::Images
            | CanonicalField::Features
            | CanonicalField::DeckEquipment
            | CanonicalField::CabinEquipment => FieldKind::List,
            _ => FieldKind::Text,
        }
    }

    /// Iterator over required fields
    pub fn required() -> impl Iterator<Item = CanonicalField> {
        Self::ALL.into_iter().filter(|f| f.is_required())
    }
}

impl std::fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized value for one canonical field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CanonicalValue {
    Text(String),
    Number(f64),
    Integer(i64),
    List(Vec<String>),
}

impl CanonicalValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CanonicalValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CanonicalValue::Number(n) => Some(*n),
            CanonicalValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            CanonicalValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            CanonicalValue::List(items) => Some(items),
            _ => None,
        }
    }
}

// ============================================================================
// Provenance
// ============================================================================

/// Mechanism that supplied a canonical field's value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    /// Extracted from the source listing
    #[serde(rename = "scraped")]
    Scraped,
    /// Looked up in the yacht model knowledge base
    #[serde(rename = "model-db")]
    ModelDb,
    /// Documented schema default
    #[serde(rename = "default")]
    Default,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Scraped => "scraped",
            Provenance::ModelDb => "model-db",
            Provenance::Default => "default",
        }
    }
}

/// Provenance and confidence (0.0-1.0) of one canonical field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldProvenance {
    pub provenance: Provenance,
    pub confidence: f64,
}

impl FieldProvenance {
    /// Create with confidence clamped to 0.0-1.0
    pub fn new(provenance: Provenance, confidence: f64) -> Self {
        Self {
            provenance,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

// ============================================================================
// Canonical record
// ============================================================================

/// The canonical yacht record every migration produces
///
/// Numeric required fields use `0` when the source did not state a value and
/// no better value exists (`year = 0`, `price = 0.0` for "price on
/// application", `length = 0.0`); their provenance is then `default`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalYacht {
    // Identity
    pub name: String,
    pub make: String,
    pub model: String,
    pub year: u16,

    // Commercial
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    pub listing_type: String,
    pub condition: String,
    pub location: String,

    // Physical (feet, pounds, US gallons)
    pub length: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beam: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub displacement: Option<f64>,
    pub boat_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hull_material: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hull_shape: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bow_shape: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keel_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rudder_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub propeller_type: Option<String>,

    // Machinery & accommodation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_capacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub water_capacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cabins: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub berths: Option<u32>,

    // Media
    pub images: Vec<String>,

    // Descriptive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub features: BTreeSet<String>,
    pub deck_equipment: Vec<String>,
    pub cabin_equipment: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_specifications: Option<String>,

    /// Weighted completeness score (0-100)
    pub data_completeness: u8,
}

impl CanonicalYacht {
    /// Assemble a record from normalized field values
    ///
    /// # Errors
    /// Returns the first required field without a usable value.
    pub fn assemble(
        values: &BTreeMap<CanonicalField, CanonicalValue>,
    ) -> std::result::Result<Self, CanonicalField> {
        let text = |f: CanonicalField| {
            values
                .get(&f)
                .and_then(CanonicalValue::as_text)
                .map(str::to_string)
        };
        let number = |f: CanonicalField| values.get(&f).and_then(CanonicalValue::as_number);
        let integer = |f: CanonicalField| values.get(&f).and_then(CanonicalValue::as_integer);
        let list = |f: CanonicalField| {
            values
                .get(&f)
                .and_then(CanonicalValue::as_list)
                .map(<[String]>::to_vec)
                .unwrap_or_default()
        };
        let required_text = |f: CanonicalField| text(f).ok_or(f);
        let count = |f: CanonicalField| integer(f).and_then(|n| u32::try_from(n).ok());

        Ok(Self {
            name: required_text(CanonicalField::Name)?,
            make: required_text(CanonicalField::Make)?,
            model: required_text(CanonicalField::Model)?,
            year: integer(CanonicalField::Year)
                .and_then(|y| u16::try_from(y).ok())
                .ok_or(CanonicalField::Year)?,
            price: number(CanonicalField::Price).ok_or(CanonicalField::Price)?,
            currency: text(CanonicalField::Currency),
            listing_type: required_text(CanonicalField::ListingType)?,
            condition: required_text(CanonicalField::Condition)?,
            location: required_text(CanonicalField::Location)?,
            length: number(CanonicalField::Length).ok_or(CanonicalField::Length)?,
            beam: number(CanonicalField::Beam),
            draft: number(CanonicalField::Draft),
            displacement: number(CanonicalField::Displacement),
            boat_type: required_text(CanonicalField::BoatType)?,
            hull_material: text(CanonicalField::HullMaterial),
            hull_shape: text(CanonicalField::HullShape),
            bow_shape: text(CanonicalField::BowShape),
            keel_type: text(CanonicalField::KeelType),
            rudder_type: text(CanonicalField::RudderType),
            propeller_type: text(CanonicalField::PropellerType),
            fuel_type: text(CanonicalField::FuelType),
            engine: text(CanonicalField::Engine),
            fuel_capacity: number(CanonicalField::FuelCapacity),
            water_capacity: number(CanonicalField::WaterCapacity),
            cabins: count(CanonicalField::Cabins),
            berths: count(CanonicalField::Berths),
            images: list(CanonicalField::Images),
            description: text(CanonicalField::Description),
            features: list(CanonicalField::Features).into_iter().collect(),
            deck_equipment: list(CanonicalField::DeckEquipment),
            cabin_equipment: list(CanonicalField::CabinEquipment),
            other_specifications: text(CanonicalField::OtherSpecifications),
            data_completeness: 0,
        })
    }
}

// ============================================================================
// Migration result
// ============================================================================

/// Terminal output of one completed migration
///
/// Only completed migrations produce a `MigrationResult`; a migration that
/// fails returns its error instead (input and fetch failures carry no
/// record). `success` and `error` are part of the serialized shape that
/// listing consumers read, so a completed result always has `success: true`
/// and no `error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_record: Option<CanonicalYacht>,
    pub metadata: MigrationMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MigrationResult {
    /// Result of a migration that ran to completion
    pub fn completed(record: CanonicalYacht, metadata: MigrationMetadata) -> Self {
        Self {
            success: true,
            canonical_record: Some(record),
            metadata,
            error: None,
        }
    }
}

/// Audit information attached to a migration result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationMetadata {
    pub migration_id: Uuid,
    pub source_url: String,
    /// Source the URL was classified as
    pub source: String,
    /// Adapter that actually produced the raw record
    pub adapter: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_type: Option<String>,
    pub data_completeness_percent: u8,
    pub images_found: usize,
    pub images_migrated: usize,
    pub images_failed: usize,
    pub images_skipped: usize,
    pub timed_out: bool,
    /// Per-field provenance keyed by canonical field name
    pub provenance: BTreeMap<String, FieldProvenance>,
    pub warnings: Vec<String>,
    /// Pipeline states visited, in order
    pub states: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl MigrationMetadata {
    /// Metadata for a migration that has just started
    pub fn started(migration_id: Uuid, source_url: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            migration_id,
            source_url: source_url.into(),
            source: String::new(),
            adapter: String::new(),
            listing_type: None,
            data_completeness_percent: 0,
            images_found: 0,
            images_migrated: 0,
            images_failed: 0,
            images_skipped: 0,
            timed_out: false,
            provenance: BTreeMap::new(),
            warnings: Vec::new(),
            states: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required_values() -> BTreeMap<CanonicalField, CanonicalValue> {
        let mut values = BTreeMap::new();
        values.insert(CanonicalField::Name, CanonicalValue::Text("Najad 460".into()));
        values.insert(CanonicalField::Make, CanonicalValue::Text("Najad".into()));
        values.insert(CanonicalField::Model, CanonicalValue::Text("460".into()));
        values.insert(CanonicalField::Year, CanonicalValue::Integer(2004));
        values.insert(CanonicalField::Price, CanonicalValue::Number(349_000.0));
        values.insert(CanonicalField::ListingType, CanonicalValue::Text("Broker".into()));
        values.insert(CanonicalField::Condition, CanonicalValue::Text("Used".into()));
        values.insert(CanonicalField::Location, CanonicalValue::Text("Sweden".into()));
        values.insert(CanonicalField::Length, CanonicalValue::Number(45.77));
        values.insert(CanonicalField::BoatType, CanonicalValue::Text("Sailing".into()));
        values
    }

    #[test]
    fn test_field_names_are_unique() {
        let names: BTreeSet<_> = CanonicalField::ALL.iter().map(|f| f.as_str()).collect();
        assert_eq!(names.len(), CanonicalField::ALL.len());
    }

    #[test]
    fn test_serialized_name_matches_as_str() {
        for field in CanonicalField::ALL {
            let json = serde_json::to_value(field).unwrap();
            assert_eq!(json, serde_json::Value::String(field.as_str().to_string()));
        }
    }

    #[test]
    fn test_assemble_with_required_fields() {
        let yacht = CanonicalYacht::assemble(&required_values()).unwrap();
        assert_eq!(yacht.make, "Najad");
        assert_eq!(yacht.year, 2004);
        assert!(yacht.images.is_empty());
        assert!(yacht.beam.is_none());
    }

    #[test]
    fn test_assemble_reports_missing_required_field() {
        let mut values = required_values();
        values.remove(&CanonicalField::Condition);
        assert_eq!(
            CanonicalYacht::assemble(&values),
            Err(CanonicalField::Condition)
        );
    }

    #[test]
    fn test_features_are_deduplicated() {
        let mut values = required_values();
        values.insert(
            CanonicalField::Features,
            CanonicalValue::List(vec!["Bow thruster".into(), "Bow thruster".into()]),
        );
        let yacht = CanonicalYacht::assemble(&values).unwrap();
        assert_eq!(yacht.features.len(), 1);
    }

    #[test]
    fn test_provenance_serialization() {
        let json = serde_json::to_string(&Provenance::ModelDb).unwrap();
        assert_eq!(json, "\"model-db\"");
        assert_eq!(FieldProvenance::new(Provenance::Scraped, 1.7).confidence, 1.0);
    }

    #[test]
    fn test_completed_result_shape() {
        let yacht = CanonicalYacht::assemble(&required_values()).unwrap();
        let metadata = MigrationMetadata::started(Uuid::new_v4(), "https://www.devalk.nl/x");
        let result = MigrationResult::completed(yacht, metadata);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["canonicalRecord"]["make"], "Najad");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_ten_required_fields() {
        assert_eq!(CanonicalField::required().count(), 10);
    }
}
