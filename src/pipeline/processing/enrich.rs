//! Optional enrichment of merged catalog entries. The reconciliation core
//! never derives features, applications, or compatibility itself; a host may
//! plug in an enricher (e.g. backed by a product database) at this seam.

use anyhow::Result;

use crate::domain::StandardizedEquipmentRecord;

/// Fills in descriptive fields on a merged record. Enrichment must not touch
/// identity, quantity, provenance, or confidence.
pub trait Enricher: Send + Sync {
    fn enrich(&self, record: &mut StandardizedEquipmentRecord) -> Result<()>;
}

/// Default enricher: leaves every record untouched.
pub struct NoopEnricher;

impl Enricher for NoopEnricher {
    fn enrich(&self, _record: &mut StandardizedEquipmentRecord) -> Result<()> {
        Ok(())
    }
}
