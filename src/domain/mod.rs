use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;

/// Sentinel display value for fields the normalizer could not resolve.
pub const UNKNOWN: &str = "Unknown";

/// A candidate equipment mention as handed over by the extraction collaborator.
/// Nothing here is trusted: names are free text, quantity may be missing or
/// garbage, and the confidence score is whatever the caller supplied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEquipmentRecord {
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default)]
    pub model: String,
    /// Parsed leniently: numbers and numeric strings are accepted, anything
    /// else (null, booleans, non-numeric text) deserializes to `None`.
    #[serde(default, deserialize_with = "lenient_quantity")]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub equipment_type: String,
    #[serde(default)]
    pub category: String,
    pub venue: String,
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
    #[serde(default)]
    pub source_document: String,
    #[serde(default)]
    pub confidence_score: f64,
}

/// A reconciled catalog entry. Created by the Record Standardizer, then either
/// absorbed into a sibling by the merger or surviving as a final entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardizedEquipmentRecord {
    /// Deterministic identity key derived from canonical manufacturer, model,
    /// and venue. Duplicate observations of the same entry share this id.
    pub id: String,
    pub manufacturer: String,
    pub model: String,
    /// Accumulator under merges; validity is the Validator's concern.
    pub quantity: i64,
    pub equipment_type: String,
    pub category: String,
    /// Immutable once created; records never migrate between venues.
    pub venue: String,
    pub specifications: BTreeMap<String, String>,
    /// Populated by an optional enrichment step, empty out of the core.
    pub features: Vec<String>,
    pub applications: Vec<String>,
    pub compatibility: Vec<String>,
    pub source_documents: BTreeSet<String>,
    /// Monotonically non-decreasing under merges (max of the inputs).
    pub confidence_score: f64,
    /// Append-only trail of every normalization decision applied.
    pub standardization_notes: Vec<String>,
}

/// Input contract: venue name to ordered raw records for that venue.
pub type ExtractionBatch = BTreeMap<String, Vec<RawEquipmentRecord>>;

/// Read an extraction batch from a JSON file.
pub fn load_batch<P: AsRef<Path>>(path: P) -> Result<ExtractionBatch> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Output contract: venue name to ordered reconciled catalog entries.
pub type VenueCatalog = BTreeMap<String, Vec<StandardizedEquipmentRecord>>;

/// Output contract: venue name to ordered validation issue messages.
pub type ValidationReport = BTreeMap<String, Vec<String>>;

/// The result of one pipeline run: the reconciled catalog plus the
/// validation report, keyed by venue.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CatalogRun {
    pub catalog: VenueCatalog,
    pub report: ValidationReport,
}

fn lenient_quantity<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Some(serde_json::Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}
