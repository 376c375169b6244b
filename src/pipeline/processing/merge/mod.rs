//! Duplicate folding. Two passes exist: a coarse grouping over raw
//! extraction output, and the identity-key merge over standardized records.
//! Both keep the first occurrence's position; later duplicates only enrich
//! it. Quantity and confidence fold order-independently; specification-key
//! collisions are last-applied-wins, so input order is part of the contract.

use std::collections::HashMap;

use tracing::debug;

use crate::domain::{RawEquipmentRecord, StandardizedEquipmentRecord};

/// Pre-standardization grouping of raw extraction output on lowercased
/// (manufacturer, model, category). Quantities sum, specification maps merge
/// right-biased, confidence takes the maximum.
pub fn group_raw_records(records: Vec<RawEquipmentRecord>) -> Vec<RawEquipmentRecord> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut grouped: Vec<RawEquipmentRecord> = Vec::new();

    for record in records {
        let key = format!(
            "{}_{}_{}",
            record.manufacturer.to_lowercase(),
            record.model.to_lowercase(),
            record.category.to_lowercase()
        );
        match positions.get(&key) {
            Some(&at) => {
                let existing = &mut grouped[at];
                existing.quantity = add_quantities(existing.quantity, record.quantity);
                existing.specifications.extend(record.specifications);
                existing.confidence_score =
                    existing.confidence_score.max(record.confidence_score);
            }
            None => {
                positions.insert(key, grouped.len());
                grouped.push(record);
            }
        }
    }

    grouped
}

/// Post-standardization merge: fold records sharing an identity key into the
/// first occurrence. Quantity accumulates, source documents union, notes
/// concatenate in processing order, confidence never decreases.
pub fn merge_standardized(
    records: Vec<StandardizedEquipmentRecord>,
) -> Vec<StandardizedEquipmentRecord> {
    let incoming = records.len();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<StandardizedEquipmentRecord> = Vec::new();

    for record in records {
        match positions.get(&record.id) {
            Some(&at) => absorb(&mut merged[at], record),
            None => {
                positions.insert(record.id.clone(), merged.len());
                merged.push(record);
            }
        }
    }

    if merged.len() < incoming {
        debug!(
            incoming,
            merged = merged.len(),
            "folded duplicate equipment records"
        );
    }
    merged
}

fn absorb(existing: &mut StandardizedEquipmentRecord, other: StandardizedEquipmentRecord) {
    existing.quantity += other.quantity;
    existing.specifications.extend(other.specifications);
    existing.source_documents.extend(other.source_documents);
    existing.standardization_notes.extend(other.standardization_notes);
    existing.confidence_score = existing.confidence_score.max(other.confidence_score);
}

/// Missing quantities stay missing only when no observation had one.
fn add_quantities(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match (a, b) {
        (None, None) => None,
        _ => Some(a.unwrap_or(0) + b.unwrap_or(0)),
    }
}
