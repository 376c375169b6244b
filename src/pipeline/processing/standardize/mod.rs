//! Turns one untrusted `RawEquipmentRecord` into a `StandardizedEquipmentRecord`
//! with canonical fields, a deterministic identity key, and a note for every
//! normalization decision applied. Standardization is total: degenerate
//! records recover to `Unknown` sentinels and the Validator flags them.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{RawEquipmentRecord, StandardizedEquipmentRecord};
use crate::pipeline::processing::normalize::specs::SpecNormalizer;
use crate::pipeline::processing::normalize::FieldNormalizer;
use crate::taxonomy::Taxonomy;

static KEY_NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w]").unwrap());
static KEY_UNDERSCORE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"_+").unwrap());

/// Applies field and specification normalization to individual records.
pub struct RecordStandardizer<'a> {
    fields: FieldNormalizer<'a>,
    specs: SpecNormalizer<'a>,
}

impl<'a> RecordStandardizer<'a> {
    pub fn new(taxonomy: &'a Taxonomy) -> Self {
        Self {
            fields: FieldNormalizer::new(taxonomy),
            specs: SpecNormalizer::new(taxonomy),
        }
    }

    /// Standardize one raw record. Quantity and confidence are copied
    /// verbatim (their validity is the Validator's concern); a missing
    /// quantity surfaces as 0 and empty fields as `Unknown` sentinels so
    /// the Validator flags them.
    pub fn standardize(&self, raw: &RawEquipmentRecord) -> StandardizedEquipmentRecord {
        let mut notes = Vec::new();

        let manufacturer = self.fields.normalize_manufacturer(&raw.manufacturer);
        if manufacturer != raw.manufacturer {
            notes.push(format!(
                "Manufacturer normalized: {} -> {}",
                raw.manufacturer, manufacturer
            ));
        }

        let model = self.fields.normalize_model(&raw.model);
        if model != raw.model {
            notes.push(format!("Model normalized: {} -> {}", raw.model, model));
        }

        let category = self
            .fields
            .normalize_category(&raw.category, &raw.equipment_type);
        if category != raw.category {
            notes.push(format!(
                "Category normalized: {} -> {}",
                raw.category, category
            ));
        }

        let equipment_type = self
            .fields
            .normalize_equipment_type(&raw.equipment_type, &category);
        if equipment_type != raw.equipment_type {
            notes.push(format!(
                "Equipment type normalized: {} -> {}",
                raw.equipment_type, equipment_type
            ));
        }

        let id = identity_key(&manufacturer, &model, &raw.venue);

        StandardizedEquipmentRecord {
            id,
            manufacturer,
            model,
            quantity: raw.quantity.unwrap_or(0),
            equipment_type,
            category,
            venue: raw.venue.clone(),
            specifications: self.specs.normalize_specifications(&raw.specifications),
            features: Vec::new(),
            applications: Vec::new(),
            compatibility: Vec::new(),
            source_documents: BTreeSet::from([raw.source_document.clone()]),
            confidence_score: raw.confidence_score,
            standardization_notes: notes,
        }
    }

    /// Standardize a venue's raw records in order.
    pub fn standardize_batch(
        &self,
        records: &[RawEquipmentRecord],
    ) -> Vec<StandardizedEquipmentRecord> {
        records.iter().map(|raw| self.standardize(raw)).collect()
    }
}

/// Deterministic identity key: lowercase canonical manufacturer, model, and
/// venue joined by underscores, with non-word characters folded to
/// underscores, runs collapsed, and no leading/trailing underscore.
pub fn identity_key(manufacturer: &str, model: &str, venue: &str) -> String {
    let joined = format!("{manufacturer}_{model}_{venue}").to_lowercase();
    let keyed = KEY_NON_WORD.replace_all(&joined, "_");
    let keyed = KEY_UNDERSCORE_RUNS.replace_all(&keyed, "_");
    keyed.trim_matches('_').to_string()
}
