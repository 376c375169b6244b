//! Venue-by-venue orchestration: raw grouping, per-record standardization,
//! identity-key merge, optional enrichment, then validation. Venues are
//! independent; the only shared state is the read-only taxonomy, so callers
//! may process venues concurrently without coordination.

pub mod processing;

use tracing::{info, info_span, warn};

use crate::domain::{
    CatalogRun, ExtractionBatch, RawEquipmentRecord, StandardizedEquipmentRecord,
};
use crate::pipeline::processing::enrich::{Enricher, NoopEnricher};
use crate::pipeline::processing::merge::{group_raw_records, merge_standardized};
use crate::pipeline::processing::standardize::RecordStandardizer;
use crate::pipeline::processing::validate::{ValidationIssue, Validator, ValidatorConfig};
use crate::taxonomy::Taxonomy;

pub struct CatalogPipeline<'a> {
    taxonomy: &'a Taxonomy,
    enricher: Box<dyn Enricher>,
    validator_config: ValidatorConfig,
}

impl<'a> CatalogPipeline<'a> {
    pub fn new(taxonomy: &'a Taxonomy) -> Self {
        Self {
            taxonomy,
            enricher: Box::new(NoopEnricher),
            validator_config: ValidatorConfig::default(),
        }
    }

    pub fn with_enricher(mut self, enricher: Box<dyn Enricher>) -> Self {
        self.enricher = enricher;
        self
    }

    pub fn with_validator_config(mut self, config: ValidatorConfig) -> Self {
        self.validator_config = config;
        self
    }

    /// Run one venue's records through every stage. A failure anywhere in
    /// this venue never touches other venues' results.
    pub fn process_venue(
        &self,
        venue: &str,
        records: Vec<RawEquipmentRecord>,
    ) -> (Vec<StandardizedEquipmentRecord>, Vec<ValidationIssue>) {
        let span = info_span!("process_venue", venue = %venue);
        let _enter = span.enter();

        let raw_count = records.len();
        let grouped = group_raw_records(records);

        let standardizer = RecordStandardizer::new(self.taxonomy);
        let standardized = standardizer.standardize_batch(&grouped);

        let mut merged = merge_standardized(standardized);

        for record in &mut merged {
            // Enrichment is best-effort; a failed lookup leaves the record
            // as the core produced it.
            if let Err(e) = self.enricher.enrich(record) {
                warn!(record_id = %record.id, "enrichment failed: {e}");
            }
        }

        let validator = Validator::with_config(self.taxonomy, self.validator_config.clone());
        let issues = validator.validate(&merged);

        info!(
            raw = raw_count,
            merged = merged.len(),
            issues = issues.len(),
            "venue processed"
        );
        (merged, issues)
    }

    /// Process a whole extraction batch, venue by venue in order.
    pub fn run(&self, batch: ExtractionBatch) -> CatalogRun {
        let mut run = CatalogRun::default();
        for (venue, records) in batch {
            let (merged, issues) = self.process_venue(&venue, records);
            run.report
                .insert(venue.clone(), issues.into_iter().map(|i| i.message).collect());
            run.catalog.insert(venue, merged);
        }

        let total_items: usize = run.catalog.values().map(Vec::len).sum();
        let total_issues: usize = run.report.values().map(Vec::len).sum();
        info!(
            venues = run.catalog.len(),
            equipment_items = total_items,
            validation_issues = total_issues,
            "catalog run complete"
        );
        run
    }
}
