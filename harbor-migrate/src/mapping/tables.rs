//! Static per-source mapping tables
//!
//! Each source table is its source-specific entries followed by the generic
//! entries, so source knowledge takes precedence and common labels still
//! resolve. Built once on first use and never mutated.

use harbor_common::yacht::CanonicalField as F;
use once_cell::sync::Lazy;

use super::units::{Dimension, Unit};
use super::vocabulary::Vocabulary as V;
use super::{normalize_key, FieldMapping, Transform as T};
use crate::classifier::SourceId;

/// Raw keys never carried into other specifications
const IGNORED_KEYS: &[&str] = &[
    "url", "link", "href", "id", "status", "source", "sourceurl", "scrapedat", "timestamp",
    "metadata",
];

/// True for bookkeeping keys that carry no listing information
pub fn is_ignored_key(key: &str) -> bool {
    if key.starts_with('@') {
        return true;
    }
    let normalized = normalize_key(key);
    IGNORED_KEYS.contains(&normalized.as_str())
}

fn map(path: &'static str, field: F, transform: T) -> FieldMapping {
    FieldMapping::new(path, field, transform)
}

fn many(paths: &[&'static str], field: F, transform: T) -> Vec<FieldMapping> {
    paths.iter().map(|p| map(*p, field, transform)).collect()
}

fn feature(path: &'static str, name: &'static str) -> FieldMapping {
    map(path, F::Features, T::Feature(name))
}

const LENGTH: T = T::UnitConvert(Dimension::Length);
const WEIGHT: T = T::UnitConvert(Dimension::Weight);
const VOLUME: T = T::UnitConvert(Dimension::Volume);

/// Entries shared by every source, in priority order
fn generic_entries() -> Vec<FieldMapping> {
    let mut t = Vec::new();

    // Identity
    t.extend(many(
        &["name", "yacht name", "boat name", "vessel name", "title", "listing title", "headline"],
        F::Name,
        T::Passthrough,
    ));
    t.extend(many(
        &["make", "brand", "manufacturer", "builder", "shipyard", "yard", "werf"],
        F::Make,
        T::Passthrough,
    ));
    t.extend(many(&["model", "model name"], F::Model, T::Passthrough));
    t.extend(many(
        &["year", "year built", "build year", "built", "model year", "construction year", "bouwjaar"],
        F::Year,
        T::Year,
    ));

    // Commercial
    t.extend(many(
        &["price", "asking price", "sale price", "listing price", "vraagprijs"],
        F::Price,
        T::Numeric,
    ));
    t.extend(many(&["currency", "price currency"], F::Currency, T::CurrencyCode));
    t.extend(many(
        &["listing type", "seller type", "sale type", "listed by"],
        F::ListingType,
        T::EnumNormalize(V::ListingType),
    ));
    t.extend(many(
        &["condition", "boat condition", "new used"],
        F::Condition,
        T::EnumNormalize(V::Condition),
    ));
    t.extend(many(
        &["location", "lying", "berth location", "located in", "boat location", "ligplaats", "city"],
        F::Location,
        T::Passthrough,
    ));

    // Physical
    t.extend(many(
        &["length", "loa", "length overall", "length over all", "overall length", "lengte"],
        F::Length,
        LENGTH,
    ));
    t.extend(many(
        &["beam", "max beam", "width", "breadth", "breedte"],
        F::Beam,
        LENGTH,
    ));
    t.extend(many(
        &["draft", "draught", "max draft", "maximum draft", "draft max", "diepgang"],
        F::Draft,
        LENGTH,
    ));
    t.extend(many(
        &["displacement", "weight", "dry weight", "waterverplaatsing"],
        F::Displacement,
        WEIGHT,
    ));
    t.extend(many(
        &["boat type", "type", "category", "vessel type", "class"],
        F::BoatType,
        T::EnumNormalize(V::BoatType),
    ));
    t.extend(many(
        &["hull material", "material", "hull construction", "construction", "hull"],
        F::HullMaterial,
        T::EnumNormalize(V::HullMaterial),
    ));
    t.extend(many(&["hull shape", "hull type"], F::HullShape, T::EnumNormalize(V::HullShape)));
    t.extend(many(&["bow shape", "bow"], F::BowShape, T::EnumNormalize(V::BowShape)));
    t.extend(many(&["keel type", "keel"], F::KeelType, T::EnumNormalize(V::KeelType)));
    t.extend(many(&["rudder type", "rudder"], F::RudderType, T::EnumNormalize(V::RudderType)));
    t.extend(many(
        &["propeller type", "propeller", "prop"],
        F::PropellerType,
        T::EnumNormalize(V::PropellerType),
    ));

    // Machinery & accommodation
    t.push(map("fuel", F::FuelCapacity, VOLUME).label_unit_only());
    t.push(map("water", F::WaterCapacity, VOLUME).label_unit_only());
    t.extend(many(
        &["fuel type", "fuel", "brandstof"],
        F::FuelType,
        T::EnumNormalize(V::FuelType),
    ));
    t.extend(many(
        &["engine", "engines", "engine make", "engine model", "motor", "propulsion"],
        F::Engine,
        T::Passthrough,
    ));
    t.extend(many(
        &["fuel capacity", "fuel tank", "fuel tanks", "fuel tank capacity", "diesel tank"],
        F::FuelCapacity,
        VOLUME,
    ));
    t.extend(many(
        &[
            "water capacity",
            "water tank",
            "water tanks",
            "fresh water tank",
            "freshwater tank",
            "fresh water tanks",
            "fresh water capacity",
        ],
        F::WaterCapacity,
        VOLUME,
    ));
    t.extend(many(
        &["cabins", "number of cabins", "staterooms", "hutten"],
        F::Cabins,
        T::Integer,
    ));
    t.extend(many(
        &["berths", "sleeps", "number of berths", "bunks", "kooien"],
        F::Berths,
        T::Integer,
    ));

    // Media & descriptive
    t.extend(many(
        &["images", "image", "photos", "pictures", "gallery", "img"],
        F::Images,
        T::TextList,
    ));
    t.extend(many(
        &["description", "summary", "details", "remarks", "broker comments", "meta description"],
        F::Description,
        T::Passthrough,
    ));
    t.extend(many(&["features", "highlights", "options"], F::Features, T::TextList));
    t.extend([
        feature("gps", "GPS"),
        feature("radar", "Radar"),
        feature("autopilot", "Autopilot"),
        feature("chartplotter", "Chartplotter"),
        feature("plotter", "Chartplotter"),
        feature("ais", "AIS"),
        feature("vhf", "VHF"),
        feature("generator", "Generator"),
        feature("bow thruster", "Bow Thruster"),
        feature("stern thruster", "Stern Thruster"),
        feature("watermaker", "Water Maker"),
        feature("water maker", "Water Maker"),
        feature("inverter", "Inverter"),
        feature("solar panels", "Solar Panels"),
    ]);
    t.extend(many(&["deck equipment"], F::DeckEquipment, T::TextList));
    t.extend(many(
        &[
            "anchor",
            "anchor chain",
            "windlass",
            "dinghy",
            "tender",
            "outboard",
            "winches",
            "sprayhood",
            "bimini",
            "cockpit table",
            "deck finish",
            "davits",
            "passerelle",
            "swim platform",
            "bathing platform",
        ],
        F::DeckEquipment,
        T::Labeled,
    ));
    t.extend(many(&["cabin equipment", "accommodation"], F::CabinEquipment, T::TextList));
    t.extend(many(
        &[
            "heating",
            "air conditioning",
            "galley",
            "fridge",
            "refrigerator",
            "freezer",
            "oven",
            "stove",
            "cooker",
            "microwave",
            "shower",
            "toilet",
            "heads",
            "hot water",
        ],
        F::CabinEquipment,
        T::Labeled,
    ));
    t.extend(many(
        &["other specifications", "additional information"],
        F::OtherSpecifications,
        T::Passthrough,
    ));

    t
}

/// De Valk: metric dimensions, tonnes, litres
fn devalk_entries() -> Vec<FieldMapping> {
    let mut t = vec![
        map("title", F::Name, T::Passthrough),
        map("brand", F::Make, T::Passthrough),
        map("type", F::BoatType, T::EnumNormalize(V::BoatType)),
        map("length", F::Length, LENGTH).with_unit(Unit::Meters),
        map("loa", F::Length, LENGTH).with_unit(Unit::Meters),
        map("beam", F::Beam, LENGTH).with_unit(Unit::Meters),
        map("draft", F::Draft, LENGTH).with_unit(Unit::Meters),
        map("displacement", F::Displacement, WEIGHT).with_unit(Unit::Tonnes),
        map("hullMaterial", F::HullMaterial, T::EnumNormalize(V::HullMaterial)),
        map("hullShape", F::HullShape, T::EnumNormalize(V::HullShape)),
        map("keelType", F::KeelType, T::EnumNormalize(V::KeelType)),
        map("rudderType", F::RudderType, T::EnumNormalize(V::RudderType)),
        map("brokerComments", F::Description, T::Passthrough),
    ];
    t.extend(
        ["fuelTank", "fuelTankLitre", "fuelCapacity"]
            .into_iter()
            .map(|p| map(p, F::FuelCapacity, VOLUME).with_unit(Unit::Liters)),
    );
    t.extend(
        ["freshwaterTank", "freshwaterTankLitre", "waterTank", "waterCapacity"]
            .into_iter()
            .map(|p| map(p, F::WaterCapacity, VOLUME).with_unit(Unit::Liters)),
    );
    t
}

/// YachtWorld: imperial units, specification labels
fn yachtworld_entries() -> Vec<FieldMapping> {
    vec![
        map("length overall", F::Length, LENGTH).with_unit(Unit::Feet),
        map("loa", F::Length, LENGTH).with_unit(Unit::Feet),
        map("length", F::Length, LENGTH).with_unit(Unit::Feet),
        map("beam", F::Beam, LENGTH).with_unit(Unit::Feet),
        map("max draft", F::Draft, LENGTH).with_unit(Unit::Feet),
        map("draft", F::Draft, LENGTH).with_unit(Unit::Feet),
        map("displacement", F::Displacement, WEIGHT).with_unit(Unit::Pounds),
        map("fuel tanks", F::FuelCapacity, VOLUME).with_unit(Unit::UsGallons),
        map("fresh water tanks", F::WaterCapacity, VOLUME).with_unit(Unit::UsGallons),
        map("class", F::BoatType, T::EnumNormalize(V::BoatType)),
        map("engine make", F::Engine, T::Passthrough),
        map("seller", F::ListingType, T::EnumNormalize(V::ListingType)),
    ]
}

/// Boats.com: schema.org JSON-LD paths
fn boats_entries() -> Vec<FieldMapping> {
    vec![
        map("name", F::Name, T::Passthrough),
        map("brand", F::Make, T::Passthrough),
        map("manufacturer", F::Make, T::Passthrough),
        map("model", F::Model, T::Passthrough),
        map("modelDate", F::Year, T::Year),
        map("vehicleModelDate", F::Year, T::Year),
        map("productionDate", F::Year, T::Year),
        map("offers.price", F::Price, T::Numeric),
        map("offers.priceCurrency", F::Currency, T::CurrencyCode),
        map("offers.itemCondition", F::Condition, T::EnumNormalize(V::Condition)),
        map("itemCondition", F::Condition, T::EnumNormalize(V::Condition)),
        map("offers.seller", F::ListingType, T::EnumNormalize(V::ListingType)),
        map("category", F::BoatType, T::EnumNormalize(V::BoatType)),
        map("image", F::Images, T::TextList),
    ]
}

fn with_generic(mut specific: Vec<FieldMapping>) -> Vec<FieldMapping> {
    specific.extend(generic_entries());
    specific
}

static DEVALK: Lazy<Vec<FieldMapping>> = Lazy::new(|| with_generic(devalk_entries()));
static YACHTWORLD: Lazy<Vec<FieldMapping>> = Lazy::new(|| with_generic(yachtworld_entries()));
static BOATS: Lazy<Vec<FieldMapping>> = Lazy::new(|| with_generic(boats_entries()));
static GENERIC: Lazy<Vec<FieldMapping>> = Lazy::new(generic_entries);

/// Mapping table for a source
pub fn table_for(source: SourceId) -> &'static [FieldMapping] {
    match source {
        SourceId::DeValk => DEVALK.as_slice(),
        SourceId::YachtWorld => YACHTWORLD.as_slice(),
        SourceId::Boats => BOATS.as_slice(),
        SourceId::Generic => GENERIC.as_slice(),
    }
}
