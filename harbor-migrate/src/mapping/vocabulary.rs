//! Canonical vocabularies for enumerated yacht fields
//!
//! Matching order for a raw value:
//! 1. Canonical term or synonym, after case and punctuation folding
//! 2. Longest canonical term or synonym contained as whole words
//! 3. Closest term by Jaro-Winkler similarity (>= [`FUZZY_THRESHOLD`])
//! 4. The "Other" bucket

use strsim::jaro_winkler;

/// Minimum Jaro-Winkler similarity for a near-miss spelling to match
pub const FUZZY_THRESHOLD: f64 = 0.92;

/// Value used when nothing in the vocabulary matches
pub const OTHER: &str = "Other";

/// Enumerated canonical fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vocabulary {
    BoatType,
    HullMaterial,
    HullShape,
    BowShape,
    KeelType,
    RudderType,
    PropellerType,
    FuelType,
    ListingType,
    Condition,
}

type Terms = &'static [(&'static str, &'static [&'static str])];

const BOAT_TYPES: Terms = &[
    (
        "Sailing",
        &[
            "sail", "sailboat", "sailing yacht", "sailing boat", "sailing vessel", "sloop",
            "ketch", "cutter", "yawl", "schooner", "zeiljacht", "zeilboot", "segelyacht",
            "monohull",
        ],
    ),
    (
        "Motor",
        &[
            "motor yacht", "motorboat", "motor boat", "power", "power boat", "powerboat",
            "trawler", "motorjacht", "motoryacht", "cruiser",
        ],
    ),
    (
        "Catamaran",
        &["cat", "sailing catamaran", "power catamaran", "multihull"],
    ),
    ("Trimaran", &["tri"]),
];

const HULL_MATERIALS: Terms = &[
    (
        "Fiberglass",
        &[
            "grp", "frp", "fibreglass", "fibre glass", "fiber glass", "glass fibre",
            "glass fiber", "glassfibre", "polyester", "gvk", "gelcoat",
        ],
    ),
    ("Aluminum", &["aluminium", "alu", "alloy"]),
    ("Steel", &["staal", "stahl", "stainless steel"]),
    ("Wood", &["wooden", "timber", "mahogany", "teak", "hout", "cold moulded"]),
    (
        "Composite",
        &["carbon", "carbon fibre", "carbon fiber", "epoxy", "kevlar", "sandwich", "foam core"],
    ),
];

const HULL_SHAPES: Terms = &[
    ("Displacement", &["full displacement", "displacement hull"]),
    ("Semi-Displacement", &["semi displacement", "semidisplacement"]),
    ("Planing", &["planing hull", "planning", "deep v"]),
];

const BOW_SHAPES: Terms = &[
    ("Plumb", &["vertical", "straight"]),
    ("Raked", &["rake", "raked stem"]),
    ("Spoon", &["spoon bow"]),
    ("Clipper", &["clipper bow"]),
    ("Reverse/Wave-Piercing", &["reverse", "wave piercing", "inverted"]),
];

const KEEL_TYPES: Terms = &[
    ("Full Keel", &["full", "long keel", "long", "encapsulated", "traditional"]),
    ("Fin Keel", &["fin", "fin keel", "deep fin", "t keel"]),
    ("Winged Keel", &["wing keel", "wing", "winged"]),
    ("Bulb Keel", &["bulb", "fin w bulb", "fin with bulb", "l keel"]),
    (
        "Daggerboard",
        &["daggerboards", "centreboard", "centerboard", "lifting keel", "swing keel"],
    ),
];

const RUDDER_TYPES: Terms = &[
    ("Skeg-Hung", &["skeg", "skeg hung rudder", "semi balanced"]),
    ("Spade", &["spade rudder", "balanced spade", "twin spade"]),
    ("Transom-Hung", &["transom", "outboard rudder", "transom hung rudder"]),
    ("Keel-Hung", &["keel", "keel hung rudder", "full keel rudder"]),
];

const PROPELLER_TYPES: Terms = &[
    ("Fixed-Pitch", &["fixed", "fixed blade", "3 blade fixed", "2 blade fixed"]),
    ("Folding", &["folding prop", "gori", "flexofold"]),
    ("Feathering", &["feathering prop", "max prop", "maxprop", "autoprop", "kiwiprop"]),
    ("Controllable-Pitch", &["controllable pitch", "variable pitch", "cpp", "variprop"]),
];

const FUEL_TYPES: Terms = &[
    ("Diesel", &["diesel fuel", "gasoil"]),
    ("Gasoline", &["petrol", "gas", "benzine", "unleaded"]),
    ("Electric", &["electric motor", "battery", "elektrisch"]),
];

const LISTING_TYPES: Terms = &[
    ("Broker", &["brokerage", "dealer", "yacht broker", "central agency", "agent"]),
    ("Private", &["private sale", "owner", "by owner", "for sale by owner", "fsbo"]),
];

const CONDITIONS: Terms = &[
    ("New", &["brand new", "new build", "unused", "nieuw"]),
    ("Used", &["pre owned", "preowned", "second hand", "secondhand", "brokerage", "gebruikt"]),
];

/// How a raw value was matched
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchKind {
    Exact,
    Synonym,
    Contained,
    Fuzzy(f64),
    Unmatched,
}

/// Result of normalizing a raw value against a vocabulary
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VocabularyMatch {
    pub value: &'static str,
    pub kind: MatchKind,
}

impl VocabularyMatch {
    pub fn is_other(&self) -> bool {
        self.kind == MatchKind::Unmatched
    }
}

impl Vocabulary {
    fn terms(&self) -> Terms {
        match self {
            Vocabulary::BoatType => BOAT_TYPES,
            Vocabulary::HullMaterial => HULL_MATERIALS,
            Vocabulary::HullShape => HULL_SHAPES,
            Vocabulary::BowShape => BOW_SHAPES,
            Vocabulary::KeelType => KEEL_TYPES,
            Vocabulary::RudderType => RUDDER_TYPES,
            Vocabulary::PropellerType => PROPELLER_TYPES,
            Vocabulary::FuelType => FUEL_TYPES,
            Vocabulary::ListingType => LISTING_TYPES,
            Vocabulary::Condition => CONDITIONS,
        }
    }

    /// Canonical values of this vocabulary, excluding "Other"
    pub fn canonical_values(&self) -> impl Iterator<Item = &'static str> {
        self.terms().iter().map(|(canonical, _)| *canonical)
    }

    /// Normalize a raw value into this vocabulary
    ///
    /// Never fails: unmatched input resolves to [`OTHER`].
    pub fn normalize(&self, raw: &str) -> VocabularyMatch {
        let key = fold(raw);
        let terms = self.terms();

        if key.is_empty() {
            return VocabularyMatch {
                value: OTHER,
                kind: MatchKind::Unmatched,
            };
        }

        // Exact canonical or synonym
        for (canonical, synonyms) in terms {
            if fold(canonical) == key {
                return VocabularyMatch {
                    value: *canonical,
                    kind: MatchKind::Exact,
                };
            }
            if synonyms.iter().any(|s| fold(s) == key) {
                return VocabularyMatch {
                    value: *canonical,
                    kind: MatchKind::Synonym,
                };
            }
        }

        // Longest whole-word containment ("Sailing yacht, sloop rigged")
        let padded = format!(" {} ", key);
        let contained = terms
            .iter()
            .flat_map(|(canonical, synonyms)| {
                std::iter::once(*canonical)
                    .chain(synonyms.iter().copied())
                    .map(move |term| (*canonical, fold(term)))
            })
            .filter(|(_, term)| padded.contains(&format!(" {} ", term)))
            .fold(None::<(&'static str, usize)>, |best, (canonical, term)| {
                match best {
                    Some((_, len)) if len >= term.len() => best,
                    _ => Some((canonical, term.len())),
                }
            });
        if let Some((canonical, _)) = contained {
            return VocabularyMatch {
                value: canonical,
                kind: MatchKind::Contained,
            };
        }

        // Near-miss spelling
        let key = key.as_str();
        let fuzzy = terms
            .iter()
            .flat_map(|(canonical, synonyms)| {
                std::iter::once(*canonical)
                    .chain(synonyms.iter().copied())
                    .map(move |term| (*canonical, jaro_winkler(key, &fold(term))))
            })
            .filter(|(_, score)| *score >= FUZZY_THRESHOLD)
            .fold(None::<(&'static str, f64)>, |best, (canonical, score)| match best {
                Some((_, best_score)) if best_score >= score => best,
                _ => Some((canonical, score)),
            });
        if let Some((canonical, score)) = fuzzy {
            return VocabularyMatch {
                value: canonical,
                kind: MatchKind::Fuzzy(score),
            };
        }

        VocabularyMatch {
            value: OTHER,
            kind: MatchKind::Unmatched,
        }
    }
}

/// Lowercase, with every run of non-alphanumerics collapsed to one space
fn fold(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_is_case_insensitive() {
        let m = Vocabulary::HullMaterial.normalize("fiberglass");
        assert_eq!(m.value, "Fiberglass");
        assert_eq!(m.kind, MatchKind::Exact);
        assert_eq!(Vocabulary::Condition.normalize("USED").value, "Used");
    }

    #[test]
    fn test_synonyms() {
        assert_eq!(Vocabulary::HullMaterial.normalize("GRP").value, "Fiberglass");
        assert_eq!(Vocabulary::HullMaterial.normalize("Polyester").value, "Fiberglass");
        assert_eq!(Vocabulary::HullMaterial.normalize("Fibre Glass").value, "Fiberglass");
        assert_eq!(Vocabulary::HullMaterial.normalize("aluminium").value, "Aluminum");
        assert_eq!(Vocabulary::BoatType.normalize("Sailing yacht").value, "Sailing");
        assert_eq!(Vocabulary::BoatType.normalize("sloop").value, "Sailing");
        assert_eq!(Vocabulary::FuelType.normalize("petrol").value, "Gasoline");
    }

    #[test]
    fn test_contained_terms_prefer_longest() {
        let m = Vocabulary::KeelType.normalize("Fin w/ bulb");
        assert_eq!(m.value, "Bulb Keel");
        let m = Vocabulary::RudderType.normalize("Spade rudder");
        assert_eq!(m.value, "Spade");
        let m = Vocabulary::BoatType.normalize("Sailing yacht, sloop rigged");
        assert_eq!(m.value, "Sailing");
        assert_eq!(m.kind, MatchKind::Contained);
    }

    #[test]
    fn test_word_boundaries_respected() {
        // "unused" is a New synonym in its own right, never a "used" hit
        assert_eq!(Vocabulary::Condition.normalize("unused").value, "New");
    }

    #[test]
    fn test_fuzzy_near_miss() {
        let m = Vocabulary::HullMaterial.normalize("Fibreglas");
        assert_eq!(m.value, "Fiberglass");
        assert!(matches!(m.kind, MatchKind::Fuzzy(score) if score >= FUZZY_THRESHOLD));
    }

    #[test]
    fn test_unmatched_goes_to_other() {
        let m = Vocabulary::HullMaterial.normalize("Ferro-cement");
        assert_eq!(m.value, OTHER);
        assert!(m.is_other());
        assert!(Vocabulary::BoatType.normalize("").is_other());
    }

    #[test]
    fn test_canonical_values_listed() {
        let values: Vec<_> = Vocabulary::ListingType.canonical_values().collect();
        assert_eq!(values, vec!["Broker", "Private"]);
    }
}
