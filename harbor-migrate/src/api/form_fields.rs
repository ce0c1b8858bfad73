//! Listing form projection
//!
//! The listing form uses its own field names (`title`, `brand`, `lying`,
//! `material`), a combined `dimensions` string, a separate engine power
//! string and a single equipment list. [`FormFields`] is that view of a
//! [`CanonicalYacht`].

use harbor_common::CanonicalYacht;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Listing status the form starts with
pub const DEFAULT_STATUS: &str = "For Sale";
/// Currency the form assumes when the listing states none
pub const DEFAULT_CURRENCY: &str = "EUR";

const KW_PER_HP: f64 = 0.745_699_872;

/// Engine power inside an engine description ("75 hp", "55 kW", "110 pk")
static ENGINE_POWER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d+(?:[.,]\d+)?)\s*(hp|pk|ps|kw)\b").expect("valid regex")
});

/// Canonical record laid out as the listing form expects it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormFields {
    pub title: String,
    pub brand: String,
    pub model: String,
    pub year: u16,
    pub price: f64,
    pub currency: String,
    pub status: String,
    pub listing_type: String,
    pub condition: String,
    pub lying: String,
    pub boat_type: String,

    /// Feet
    pub length: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beam: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<f64>,
    /// "length x beam x draft ft"
    pub dimensions: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub displacement: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
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

    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    /// "75 HP / 56 KW"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hp_kw: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_capacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub water_capacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cabins: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub berths: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Deck then cabin equipment, duplicates removed
    pub equipment: Vec<String>,
    pub features: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_specifications: Option<String>,
    pub images: Vec<String>,

    pub data_completeness: u8,
}

impl From<CanonicalYacht> for FormFields {
    fn from(yacht: CanonicalYacht) -> Self {
        let dimensions = dimensions(yacht.length, yacht.beam, yacht.draft);
        let (engine, hp_kw) = split_engine_power(yacht.engine.as_deref());

        let mut equipment: Vec<String> = Vec::new();
        for item in yacht.deck_equipment.into_iter().chain(yacht.cabin_equipment) {
            if !equipment.contains(&item) {
                equipment.push(item);
            }
        }

        Self {
            title: yacht.name,
            brand: yacht.make,
            model: yacht.model,
            year: yacht.year,
            price: yacht.price,
            currency: yacht.currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            status: DEFAULT_STATUS.to_string(),
            listing_type: yacht.listing_type,
            condition: yacht.condition,
            lying: yacht.location,
            boat_type: yacht.boat_type,
            length: yacht.length,
            beam: yacht.beam,
            draft: yacht.draft,
            dimensions,
            displacement: yacht.displacement,
            material: yacht.hull_material,
            hull_shape: yacht.hull_shape,
            bow_shape: yacht.bow_shape,
            keel_type: yacht.keel_type,
            rudder_type: yacht.rudder_type,
            propeller_type: yacht.propeller_type,
            engine,
            hp_kw,
            fuel_type: yacht.fuel_type,
            fuel_capacity: yacht.fuel_capacity,
            water_capacity: yacht.water_capacity,
            cabins: yacht.cabins,
            berths: yacht.berths,
            description: yacht.description,
            equipment,
            features: yacht.features.into_iter().collect(),
            other_specifications: yacht.other_specifications,
            images: yacht.images,
            data_completeness: yacht.data_completeness,
        }
    }
}

/// "45.77 x 14.04 x 7.05 ft"; empty when no dimension is known
fn dimensions(length: f64, beam: Option<f64>, draft: Option<f64>) -> String {
    let parts: Vec<String> = [Some(length), beam, draft]
        .into_iter()
        .flatten()
        .filter(|v| *v > 0.0)
        .map(format_number)
        .collect();
    if parts.is_empty() {
        String::new()
    } else {
        format!("{} ft", parts.join(" x "))
    }
}

/// Separate the power rating from an engine description
///
/// Returns the description without the rating and `"<hp> HP / <kw> KW"`,
/// deriving whichever unit the description does not state.
fn split_engine_power(engine: Option<&str>) -> (Option<String>, Option<String>) {
    let Some(engine) = engine else {
        return (None, None);
    };

    let mut hp = None;
    let mut kw = None;
    for caps in ENGINE_POWER.captures_iter(engine) {
        let Ok(value) = caps[1].replace(',', ".").parse::<f64>() else {
            continue;
        };
        if caps[2].eq_ignore_ascii_case("kw") {
            kw = kw.or(Some(value));
        } else {
            hp = hp.or(Some(value));
        }
    }

    let power = match (hp, kw) {
        (None, None) => None,
        (Some(hp), kw) => Some((hp, kw.unwrap_or((hp * KW_PER_HP).round()))),
        (None, Some(kw)) => Some(((kw / KW_PER_HP).round(), kw)),
    }
    .map(|(hp, kw)| format!("{} HP / {} KW", format_number(hp), format_number(kw)));

    let description = ENGINE_POWER
        .replace_all(engine, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let description = (!description.is_empty()).then_some(description);

    (description, power)
}

fn format_number(value: f64) -> String {
    format!("{}", (value * 100.0).round() / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn yacht() -> CanonicalYacht {
        CanonicalYacht {
            name: "Najad 460".into(),
            make: "Najad".into(),
            model: "460".into(),
            year: 2004,
            price: 349_000.0,
            currency: None,
            listing_type: "Broker".into(),
            condition: "Used".into(),
            location: "Stockholm".into(),
            length: 45.77,
            beam: Some(14.04),
            draft: Some(7.05),
            displacement: None,
            boat_type: "Sailing".into(),
            hull_material: Some("Fiberglass".into()),
            hull_shape: None,
            bow_shape: None,
            keel_type: None,
            rudder_type: None,
            propeller_type: None,
            fuel_type: None,
            engine: Some("Volvo Penta D2-75 75 hp".into()),
            fuel_capacity: None,
            water_capacity: None,
            cabins: Some(3),
            berths: Some(8),
            images: vec![],
            description: None,
            features: BTreeSet::from(["Bow thruster".to_string()]),
            deck_equipment: vec!["Anchor: Delta 25kg".into(), "Windlass".into()],
            cabin_equipment: vec!["Heating: Webasto".into(), "Windlass".into()],
            other_specifications: None,
            data_completeness: 80,
        }
    }

    #[test]
    fn test_form_names() {
        let form = FormFields::from(yacht());
        assert_eq!(form.title, "Najad 460");
        assert_eq!(form.brand, "Najad");
        assert_eq!(form.lying, "Stockholm");
        assert_eq!(form.material.as_deref(), Some("Fiberglass"));
        assert_eq!(form.status, DEFAULT_STATUS);
        assert_eq!(form.currency, DEFAULT_CURRENCY);

        let json = serde_json::to_value(&form).unwrap();
        assert!(json.get("hpKw").is_some());
        assert!(json.get("make").is_none());
    }

    #[test]
    fn test_dimensions_string() {
        assert_eq!(FormFields::from(yacht()).dimensions, "45.77 x 14.04 x 7.05 ft");
        assert_eq!(dimensions(49.0, None, None), "49 ft");
        assert_eq!(dimensions(0.0, None, None), "");
    }

    #[test]
    fn test_engine_power_split() {
        let form = FormFields::from(yacht());
        assert_eq!(form.engine.as_deref(), Some("Volvo Penta D2-75"));
        assert_eq!(form.hp_kw.as_deref(), Some("75 HP / 56 KW"));

        let (engine, power) = split_engine_power(Some("Yanmar 4JH 40 kW"));
        assert_eq!(engine.as_deref(), Some("Yanmar 4JH"));
        assert_eq!(power.as_deref(), Some("54 HP / 40 KW"));

        assert_eq!(split_engine_power(Some("Yanmar")), (Some("Yanmar".into()), None));
    }

    #[test]
    fn test_equipment_merged_without_duplicates() {
        let form = FormFields::from(yacht());
        assert_eq!(
            form.equipment,
            ["Anchor: Delta 25kg", "Windlass", "Heating: Webasto"]
        );
        assert_eq!(form.features, ["Bow thruster"]);
    }
}
