//! Initial registry population
//!
//! Builds the first registry from the whole monitored tree. Intended for a
//! fresh deployment; an existing registry is never touched.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::DeviceRecord;
use crate::ports::{IDeviceRegistry, ILogTree, RegistryBatch};

use super::errors::AuditError;
use super::run_audit::SkippedDevice;

/// Outcome of an initial population
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PopulateSummary {
    pub inserted: usize,
    pub active: usize,
    pub inactive: usize,
    pub skipped: Vec<SkippedDevice>,
}

/// Use case for populating an empty registry
pub struct PopulateUseCase {
    registry: Arc<dyn IDeviceRegistry>,
    log_tree: Arc<dyn ILogTree>,
    inactive_after_days: u32,
}

impl PopulateUseCase {
    pub fn new(
        registry: Arc<dyn IDeviceRegistry>,
        log_tree: Arc<dyn ILogTree>,
        inactive_after_days: u32,
    ) -> Self {
        Self {
            registry,
            log_tree,
            inactive_after_days,
        }
    }

    /// Scan the whole tree and insert one record per discovered device
    ///
    /// No events are emitted during population.
    ///
    /// # Errors
    /// [`AuditError::RegistryNotEmpty`] if any record exists; store and scan
    /// failures abort with nothing written
    pub async fn execute(&self, today: NaiveDate) -> Result<PopulateSummary, AuditError> {
        // Step 1: Refuse a non-empty registry
        let empty = self
            .registry
            .is_empty()
            .await
            .map_err(|e| AuditError::Store(e.context("Failed to inspect registry")))?;
        if !empty {
            return Err(AuditError::RegistryNotEmpty);
        }

        // Step 2: Walk the full tree
        let discovered = self.log_tree.scan_all().await.map_err(AuditError::Scan)?;
        info!(devices = discovered.len(), "Scanned monitored tree");

        // Step 3: Derive records
        let mut summary = PopulateSummary::default();
        let mut batch = RegistryBatch::new();
        for (name, dates) in discovered {
            match DeviceRecord::from_evidence(name.clone(), &dates, today, self.inactive_after_days)
            {
                Ok(record) => {
                    if record.is_inactive() {
                        summary.inactive += 1;
                    } else {
                        summary.active += 1;
                    }
                    batch.insert(record);
                }
                Err(e) => {
                    warn!(device = %name, error = %e, "Skipping device during population");
                    summary.skipped.push(SkippedDevice {
                        device: name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        // Step 4: Commit
        summary.inserted = batch.inserts.len();
        if !batch.is_empty() {
            self.registry
                .commit_batch(&batch)
                .await
                .map_err(|e| AuditError::Store(e.context("Failed to commit initial population")))?;
        }

        info!(
            inserted = summary.inserted,
            active = summary.active,
            inactive = summary.inactive,
            skipped = summary.skipped.len(),
            "Initial population complete"
        );
        Ok(summary)
    }
}
