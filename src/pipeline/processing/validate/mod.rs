//! Data-quality scan over a venue's merged records. Diagnostic only: issues
//! are advisory values and the records they describe are never mutated.

use serde::Serialize;

use crate::domain::{StandardizedEquipmentRecord, UNKNOWN};
use crate::taxonomy::{Taxonomy, OTHER_CATEGORY};

/// The kinds of rule violation the validator reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IssueKind {
    MissingManufacturer,
    MissingModel,
    InvalidQuantity,
    InvalidCategory,
    LowConfidence,
}

/// One advisory finding about one record.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub record_id: String,
    pub kind: IssueKind,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Records below this confidence are flagged. Scores are compared as
    /// supplied (never clamped), so out-of-range inputs keep their meaning.
    pub low_confidence_threshold: f64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            low_confidence_threshold: 0.3,
        }
    }
}

pub struct Validator<'a> {
    taxonomy: &'a Taxonomy,
    config: ValidatorConfig,
}

impl<'a> Validator<'a> {
    pub fn new(taxonomy: &'a Taxonomy) -> Self {
        Self::with_config(taxonomy, ValidatorConfig::default())
    }

    pub fn with_config(taxonomy: &'a Taxonomy, config: ValidatorConfig) -> Self {
        Self { taxonomy, config }
    }

    /// Evaluate every rule against every record. Rules are independent; a
    /// single record may trigger several issues.
    pub fn validate(&self, records: &[StandardizedEquipmentRecord]) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for record in records {
            self.check_record(record, &mut issues);
        }
        issues
    }

    fn check_record(&self, record: &StandardizedEquipmentRecord, issues: &mut Vec<ValidationIssue>) {
        if record.manufacturer.is_empty() || record.manufacturer == UNKNOWN {
            issues.push(ValidationIssue {
                record_id: record.id.clone(),
                kind: IssueKind::MissingManufacturer,
                message: format!("Missing manufacturer for item: {}", record.id),
            });
        }

        if record.model.is_empty() || record.model == UNKNOWN {
            issues.push(ValidationIssue {
                record_id: record.id.clone(),
                kind: IssueKind::MissingModel,
                message: format!("Missing model for item: {}", record.id),
            });
        }

        if record.quantity <= 0 {
            issues.push(ValidationIssue {
                record_id: record.id.clone(),
                kind: IssueKind::InvalidQuantity,
                message: format!("Invalid quantity for item: {}", record.id),
            });
        }

        // Unreachable for records produced by the standardizer; guards
        // against callers feeding hand-built data.
        if !self.taxonomy.is_known_category(&record.category) && record.category != OTHER_CATEGORY {
            issues.push(ValidationIssue {
                record_id: record.id.clone(),
                kind: IssueKind::InvalidCategory,
                message: format!(
                    "Invalid category '{}' for item: {}",
                    record.category, record.id
                ),
            });
        }

        if record.confidence_score < self.config.low_confidence_threshold {
            issues.push(ValidationIssue {
                record_id: record.id.clone(),
                kind: IssueKind::LowConfidence,
                message: format!(
                    "Low confidence score ({}) for item: {}",
                    record.confidence_score, record.id
                ),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};

    fn record() -> StandardizedEquipmentRecord {
        StandardizedEquipmentRecord {
            id: "shure_sm58_x".to_string(),
            manufacturer: "Shure".to_string(),
            model: "SM58".to_string(),
            quantity: 4,
            equipment_type: "Microphone".to_string(),
            category: "sound".to_string(),
            venue: "X".to_string(),
            specifications: BTreeMap::new(),
            features: Vec::new(),
            applications: Vec::new(),
            compatibility: Vec::new(),
            source_documents: BTreeSet::new(),
            confidence_score: 0.9,
            standardization_notes: Vec::new(),
        }
    }

    #[test]
    fn clean_record_produces_no_issues() {
        let taxonomy = Taxonomy::builtin();
        let validator = Validator::new(&taxonomy);
        assert!(validator.validate(&[record()]).is_empty());
    }

    #[test]
    fn independent_rules_stack_on_one_record() {
        let taxonomy = Taxonomy::builtin();
        let validator = Validator::new(&taxonomy);

        let mut bad = record();
        bad.manufacturer = UNKNOWN.to_string();
        bad.quantity = 0;
        bad.confidence_score = 0.2;

        let issues = validator.validate(&[bad]);
        assert_eq!(issues.len(), 3);
        assert_eq!(issues[0].kind, IssueKind::MissingManufacturer);
        assert_eq!(issues[1].kind, IssueKind::InvalidQuantity);
        assert_eq!(issues[2].kind, IssueKind::LowConfidence);
        assert_eq!(
            issues[2].message,
            "Low confidence score (0.2) for item: shure_sm58_x"
        );
    }

    #[test]
    fn unknown_model_and_other_category_rules() {
        let taxonomy = Taxonomy::builtin();
        let validator = Validator::new(&taxonomy);

        let mut no_model = record();
        no_model.model = UNKNOWN.to_string();
        let issues = validator.validate(&[no_model]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::MissingModel);

        // "other" is a valid fallback category, not a violation.
        let mut other = record();
        other.category = "other".to_string();
        assert!(validator.validate(&[other]).is_empty());

        let mut invalid = record();
        invalid.category = "rigging".to_string();
        let issues = validator.validate(&[invalid]);
        assert_eq!(issues[0].kind, IssueKind::InvalidCategory);
        assert!(issues[0].message.contains("'rigging'"));
    }

    #[test]
    fn threshold_boundary_is_strictly_less_than() {
        let taxonomy = Taxonomy::builtin();
        let validator = Validator::new(&taxonomy);

        let mut at_threshold = record();
        at_threshold.confidence_score = 0.3;
        assert!(validator.validate(&[at_threshold]).is_empty());

        let mut below = record();
        below.confidence_score = 0.29;
        assert_eq!(validator.validate(&[below]).len(), 1);
    }

    #[test]
    fn negative_confidence_is_flagged_not_clamped() {
        let taxonomy = Taxonomy::builtin();
        let validator = Validator::new(&taxonomy);

        let mut odd = record();
        odd.confidence_score = -0.5;
        let issues = validator.validate(&[odd]);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("-0.5"));
    }
}
