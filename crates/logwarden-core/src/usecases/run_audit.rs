//! Routine audit use case
//!
//! One pass checks every audited device for a log directory named after
//! today, moves it through the audit state machine, registers devices that
//! appeared on disk since the last pass, and commits all resulting changes
//! at once. Events are only released after the commit succeeds.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{
    day_label, estimate_frequency, parse_date_segment, AuditVerdict, DeviceEvent, DeviceName,
    DeviceRecord, EventCode, Frequency,
};
use crate::ports::{IDeviceRegistry, IEventSink, ILogTree, RegistryBatch};

use super::errors::AuditError;
use super::integrity::assert_no_duplicate_names;

/// Which known devices a pass examines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditMode {
    /// Every active device
    Full,
    /// Only active devices flagged critical
    CriticalOnly,
}

impl AuditMode {
    fn audits(&self, record: &DeviceRecord) -> bool {
        match self {
            AuditMode::Full => !record.is_inactive(),
            AuditMode::CriticalOnly => !record.is_inactive() && record.is_critical(),
        }
    }
}

/// A device left untouched by this pass, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedDevice {
    pub device: DeviceName,
    pub reason: String,
}

/// Counters describing one audit pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditSummary {
    pub audited: usize,
    pub logging: usize,
    pub resumed: usize,
    pub pending: usize,
    pub overdue: usize,
    pub newly_overdue: usize,
    pub newly_inactive: usize,
    pub discovered: usize,
    pub updates: usize,
    pub inserts: usize,
    pub skipped: Vec<SkippedDevice>,
}

impl AuditSummary {
    fn skip(&mut self, device: &DeviceName, reason: impl Into<String>) {
        self.skipped.push(SkippedDevice {
            device: device.clone(),
            reason: reason.into(),
        });
    }
}

/// Use case for one routine audit pass
pub struct RunAuditUseCase {
    registry: Arc<dyn IDeviceRegistry>,
    log_tree: Arc<dyn ILogTree>,
    event_sink: Arc<dyn IEventSink>,
    inactive_after_days: u32,
}

impl RunAuditUseCase {
    /// Creates a new RunAuditUseCase
    ///
    /// # Arguments
    ///
    /// * `registry` - Persistent device records
    /// * `log_tree` - Read-only view of the monitored log tree
    /// * `event_sink` - Receives status events after a successful commit
    /// * `inactive_after_days` - Days without evidence before a device is presumed gone
    pub fn new(
        registry: Arc<dyn IDeviceRegistry>,
        log_tree: Arc<dyn ILogTree>,
        event_sink: Arc<dyn IEventSink>,
        inactive_after_days: u32,
    ) -> Self {
        Self {
            registry,
            log_tree,
            event_sink,
            inactive_after_days,
        }
    }

    /// Runs one audit pass as of `today`
    ///
    /// This method:
    /// 1. Refuses to run if the registry holds duplicate names
    /// 2. Loads every record; all of them count as known for discovery
    /// 3. Audits the selected devices against today's directory
    /// 4. Registers devices present on disk but absent from the registry
    /// 5. Commits all updates and inserts in one batch
    /// 6. Emits the buffered events
    ///
    /// # Errors
    ///
    /// Any registry or scan failure aborts the pass before the commit, so
    /// nothing is written and no status events are emitted.
    pub async fn execute(&self, mode: AuditMode, today: NaiveDate) -> Result<AuditSummary, AuditError> {
        // Step 1: Integrity check
        assert_no_duplicate_names(self.registry.as_ref()).await?;

        // Step 2: Load known devices
        let known = self
            .registry
            .query_all()
            .await
            .map_err(|e| AuditError::Store(e.context("Failed to load device records")))?;

        info!(
            known = known.len(),
            mode = ?mode,
            today = %today,
            "Starting audit pass"
        );

        let mut summary = AuditSummary::default();
        let mut batch = RegistryBatch::new();
        let mut events = Vec::new();

        // Step 3: Audit selected devices
        for record in known.iter().filter(|r| mode.audits(r)) {
            summary.audited += 1;
            self.audit_device(record, today, &mut batch, &mut events, &mut summary)
                .await;
        }

        // Step 4: Discover devices the registry does not know
        let known_names: BTreeSet<DeviceName> = known.iter().map(|r| r.name().clone()).collect();
        let discovered = self
            .log_tree
            .scan_unknown(&known_names)
            .await
            .map_err(AuditError::Scan)?;

        for (name, dates) in discovered {
            if known_names.contains(&name) {
                continue;
            }
            match DeviceRecord::from_evidence(name.clone(), &dates, today, self.inactive_after_days)
            {
                Ok(mut record) => {
                    let verdict = record.assess(
                        dates.contains(&today),
                        today,
                        self.inactive_after_days,
                    );
                    if !record.is_inactive() && verdict == AuditVerdict::Overdue {
                        events.push(DeviceEvent::new(&name, EventCode::Overdue));
                        record.flag_not_logging(today);
                    }
                    if record.is_not_logging() {
                        events.push(DeviceEvent::new(&name, EventCode::NewlyOverdue));
                    }
                    if record.is_inactive() {
                        events.push(DeviceEvent::new(&name, EventCode::NewlyInactive));
                    }
                    events.push(DeviceEvent::new(&name, EventCode::Discovered));
                    info!(device = %name, dates = dates.len(), "Discovered new device");
                    summary.discovered += 1;
                    batch.insert(record);
                }
                Err(e) => {
                    warn!(device = %name, error = %e, "Skipping newly discovered device");
                    summary.skip(&name, e.to_string());
                }
            }
        }

        // Step 5: Commit
        summary.updates = batch.updates.len();
        summary.inserts = batch.inserts.len();
        if batch.is_empty() {
            debug!("Nothing to commit");
        } else {
            self.registry
                .commit_batch(&batch)
                .await
                .map_err(|e| AuditError::Store(e.context("Failed to commit audit batch")))?;
        }

        // Step 6: Release events
        deliver_events(self.event_sink.as_ref(), &events).await;

        info!(
            audited = summary.audited,
            logging = summary.logging,
            resumed = summary.resumed,
            pending = summary.pending,
            overdue = summary.overdue,
            newly_overdue = summary.newly_overdue,
            newly_inactive = summary.newly_inactive,
            discovered = summary.discovered,
            skipped = summary.skipped.len(),
            "Audit pass complete"
        );

        Ok(summary)
    }

    async fn audit_device(
        &self,
        original: &DeviceRecord,
        today: NaiveDate,
        batch: &mut RegistryBatch,
        events: &mut Vec<DeviceEvent>,
        summary: &mut AuditSummary,
    ) {
        let name = original.name();
        let entries = match self.log_tree.entries_of(name).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    device = %name,
                    error = %e,
                    "Cannot list device directory; treating as no evidence today"
                );
                Vec::new()
            }
        };

        let today_label = day_label(today);
        let evidence_today = entries.iter().any(|entry| *entry == today_label);

        let mut record = original.clone();
        match record.assess(evidence_today, today, self.inactive_after_days) {
            AuditVerdict::Logging => {
                record.record_logging(today);
                events.push(DeviceEvent::new(name, EventCode::Logging));
                summary.logging += 1;
            }
            AuditVerdict::Resumed => match recompute_frequency(name, &entries, today) {
                Ok(frequency) => {
                    record.resume_logging(today, frequency);
                    events.push(DeviceEvent::new(name, EventCode::Logging));
                    events.push(DeviceEvent::new(name, EventCode::Resumed));
                    info!(device = %name, frequency = %frequency, "Device resumed logging");
                    summary.resumed += 1;
                }
                Err(reason) => {
                    warn!(device = %name, reason = %reason, "Skipping resumed device");
                    summary.skip(name, reason);
                    return;
                }
            },
            AuditVerdict::Pending => {
                events.push(DeviceEvent::new(name, EventCode::Pending));
                summary.pending += 1;
            }
            AuditVerdict::Overdue => {
                events.push(DeviceEvent::new(name, EventCode::Overdue));
                summary.overdue += 1;
                if record.flag_not_logging(today) {
                    events.push(DeviceEvent::new(name, EventCode::NewlyOverdue));
                    summary.newly_overdue += 1;
                }
            }
            AuditVerdict::NewlyInactive => {
                record.mark_inactive(today);
                events.push(DeviceEvent::new(name, EventCode::NewlyInactive));
                info!(device = %name, last_seen = ?record.last_seen(), "Device presumed inactive");
                summary.newly_inactive += 1;
            }
        }

        if record != *original {
            batch.update(record);
        }
    }
}

/// Re-estimate a device's frequency from the date directories under it
fn recompute_frequency(
    device: &DeviceName,
    entries: &[String],
    today: NaiveDate,
) -> Result<Frequency, String> {
    let mut dates = Vec::new();
    for entry in entries {
        match parse_date_segment(entry) {
            Ok(Some(date)) => dates.push(date),
            Ok(None) => {}
            Err(e) => warn!(device = %device, error = %e, "Ignoring malformed date directory"),
        }
    }
    estimate_frequency(dates, today).map_err(|e| format!("cannot re-estimate frequency: {e}"))
}

/// Hands each event to the sink, logging failed deliveries
pub(crate) async fn deliver_events(sink: &dyn IEventSink, events: &[DeviceEvent]) {
    for event in events {
        if let Err(e) = sink.emit(event).await {
            warn!(
                subject = event.subject(),
                code = event.code().code(),
                error = %e,
                "Failed to deliver event"
            );
        }
    }
}
