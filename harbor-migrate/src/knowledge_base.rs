//! Yacht model knowledge base
//!
//! Read-only lookup of known model specifications, used by the fallback
//! resolver when a listing leaves required fields empty. Built-in records can
//! be extended at startup from a TOML file:
//!
//! ```toml
//! [[model]]
//! model = "Hallberg-Rassy 49"
//! make = "Hallberg-Rassy"
//! length_ft = 49.08
//! boat_type = "Sailing"
//! ```
//!
//! Dimensions are stored in canonical units (feet, pounds, US gallons).
//! Vocabulary values are stored as published and normalized by the resolver.

use harbor_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Published specification of one yacht model
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelSpecification {
    /// Lookup key (e.g. "Najad 460")
    pub model: String,
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub boat_type: Option<String>,
    #[serde(default)]
    pub hull_material: Option<String>,
    #[serde(default)]
    pub keel_type: Option<String>,
    #[serde(default)]
    pub rudder_type: Option<String>,
    #[serde(default)]
    pub engine: Option<String>,
    #[serde(default)]
    pub fuel_type: Option<String>,
    #[serde(default)]
    pub length_ft: Option<f64>,
    #[serde(default)]
    pub beam_ft: Option<f64>,
    #[serde(default)]
    pub draft_ft: Option<f64>,
    #[serde(default)]
    pub displacement_lb: Option<f64>,
    #[serde(default)]
    pub fuel_gal: Option<f64>,
    #[serde(default)]
    pub water_gal: Option<f64>,
    #[serde(default)]
    pub cabins: Option<u32>,
    #[serde(default)]
    pub berths: Option<u32>,
    /// Year the model was first built
    #[serde(default)]
    pub first_built: Option<u16>,
}

/// Knowledge base seam, injected into the fallback resolver
pub trait ModelKnowledgeBase: Send + Sync {
    /// Case-insensitive exact lookup by model name
    fn lookup(&self, model: &str) -> Option<&ModelSpecification>;
}

/// In-memory knowledge base, immutable after construction
#[derive(Debug, Clone, Default)]
pub struct StaticKnowledgeBase {
    records: Vec<ModelSpecification>,
}

#[derive(Debug, Deserialize)]
struct KnowledgeBaseFile {
    #[serde(default, rename = "model")]
    models: Vec<ModelSpecification>,
}

impl StaticKnowledgeBase {
    /// Knowledge base with the given records only
    pub fn with_records(records: Vec<ModelSpecification>) -> Self {
        Self { records }
    }

    /// Built-in model records
    pub fn builtin() -> Self {
        Self::with_records(builtin_records())
    }

    /// Built-in records plus those of an optional TOML file
    ///
    /// File records take precedence over built-in records of the same model.
    ///
    /// # Errors
    /// `Config` when the file exists but cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut kb = Self::builtin();
        let Some(path) = path else {
            return Ok(kb);
        };

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        let extra = Self::parse_toml(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

        info!(
            "Loaded {} model records from {}",
            extra.len(),
            path.display()
        );
        kb.merge(extra);
        Ok(kb)
    }

    fn parse_toml(content: &str) -> std::result::Result<Vec<ModelSpecification>, toml::de::Error> {
        let file: KnowledgeBaseFile = toml::from_str(content)?;
        Ok(file.models)
    }

    fn merge(&mut self, extra: Vec<ModelSpecification>) {
        for record in extra {
            self.records
                .retain(|r| !r.model.eq_ignore_ascii_case(&record.model));
            self.records.push(record);
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ModelKnowledgeBase for StaticKnowledgeBase {
    fn lookup(&self, model: &str) -> Option<&ModelSpecification> {
        let wanted = model.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }
        self.records
            .iter()
            .find(|r| r.model.to_lowercase() == wanted)
    }
}

fn builtin_records() -> Vec<ModelSpecification> {
    vec![
        ModelSpecification {
            model: "Najad 460".into(),
            make: Some("Najad".into()),
            boat_type: Some("Sailing".into()),
            hull_material: Some("Fibre Glass".into()),
            keel_type: Some("Fin w/ bulb".into()),
            rudder_type: Some("Spade rudder".into()),
            engine: Some("Yanmar 4JH4G-HTE 96 hp".into()),
            fuel_type: Some("Diesel".into()),
            length_ft: Some(45.77),
            beam_ft: Some(14.04),
            draft_ft: Some(7.05),
            displacement_lb: Some(34171.0),
            fuel_gal: Some(122.0),
            water_gal: Some(149.0),
            cabins: None,
            berths: Some(8),
            first_built: Some(2000),
        },
        ModelSpecification {
            model: "Hallberg-Rassy 43".into(),
            make: Some("Hallberg-Rassy".into()),
            boat_type: Some("Sailing".into()),
            hull_material: Some("GRP".into()),
            keel_type: Some("Fin keel".into()),
            rudder_type: Some("Skeg hung".into()),
            engine: Some("Volvo Penta D2-75".into()),
            fuel_type: Some("Diesel".into()),
            length_ft: Some(44.62),
            beam_ft: Some(13.78),
            draft_ft: Some(6.73),
            displacement_lb: Some(26455.0),
            fuel_gal: Some(100.0),
            water_gal: Some(185.0),
            cabins: Some(3),
            berths: Some(6),
            first_built: Some(2001),
        },
        ModelSpecification {
            model: "Oceanis 45".into(),
            make: Some("Beneteau".into()),
            boat_type: Some("Sailing".into()),
            hull_material: Some("Fiberglass".into()),
            keel_type: Some("Fin keel".into()),
            rudder_type: Some("Twin spade".into()),
            engine: Some("Yanmar 4JH45 45 hp".into()),
            fuel_type: Some("Diesel".into()),
            length_ft: Some(45.28),
            beam_ft: Some(14.76),
            draft_ft: Some(7.15),
            displacement_lb: Some(21973.0),
            fuel_gal: Some(63.0),
            water_gal: Some(140.0),
            cabins: Some(3),
            berths: Some(6),
            first_built: Some(2011),
        },
        ModelSpecification {
            model: "Lagoon 42".into(),
            make: Some("Lagoon".into()),
            boat_type: Some("Catamaran".into()),
            hull_material: Some("Fiberglass".into()),
            keel_type: None,
            rudder_type: Some("Twin spade".into()),
            engine: Some("2 x Yanmar 57 hp".into()),
            fuel_type: Some("Diesel".into()),
            length_ft: Some(41.99),
            beam_ft: Some(25.26),
            draft_ft: Some(4.1),
            displacement_lb: Some(27778.0),
            fuel_gal: Some(159.0),
            water_gal: Some(79.0),
            cabins: Some(4),
            berths: Some(8),
            first_built: Some(2016),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_lookup_is_case_insensitive_exact() {
        let kb = StaticKnowledgeBase::builtin();
        let najad = kb.lookup("najad 460").unwrap();
        assert_eq!(najad.length_ft, Some(45.77));
        assert_eq!(najad.berths, Some(8));

        assert!(kb.lookup("Najad").is_none());
        assert!(kb.lookup("Najad 460 AC").is_none());
        assert!(kb.lookup("  ").is_none());
    }

    #[test]
    fn test_load_without_file_is_builtin() {
        let kb = StaticKnowledgeBase::load(None).unwrap();
        assert_eq!(kb.len(), builtin_records().len());
    }

    #[test]
    fn test_file_records_extend_and_override() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[[model]]
model = "Contest 42CS"
make = "Contest"
length_ft = 42.5
boat_type = "Sailing"

[[model]]
model = "NAJAD 460"
make = "Najad"
length_ft = 46.0
"#
        )
        .unwrap();

        let kb = StaticKnowledgeBase::load(Some(file.path())).unwrap();
        assert_eq!(kb.len(), builtin_records().len() + 1);
        assert_eq!(kb.lookup("contest 42cs").unwrap().length_ft, Some(42.5));
        assert_eq!(kb.lookup("Najad 460").unwrap().length_ft, Some(46.0));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[[model]]\nlength_ft = \"long\"").unwrap();
        assert!(matches!(
            StaticKnowledgeBase::load(Some(file.path())),
            Err(Error::Config(_))
        ));
    }
}
