//! Device record entity and audit state machine
//!
//! A [`DeviceRecord`] is one monitored device as held by the registry.
//! Status flags are modelled as optional "since" dates, so a flag can never
//! be set without the day it was raised.
//!
//! ## Audit states
//!
//! ```text
//!                 evidence today
//!   OVERDUE-PENDING ───────────────▶ LOGGING
//!        │   ▲                         │
//!        │   └─────── no evidence ─────┘
//!        │ elapsed > frequency
//!        ▼
//!   OVERDUE-FLAGGED ── evidence ──▶ LOGGING (resumed, frequency re-estimated)
//!        │
//!        │ elapsed > inactivity threshold
//!        ▼
//!     INACTIVE (no longer audited)
//! ```

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::frequency::estimate_frequency;
use super::newtypes::{DeviceId, DeviceName, Frequency};

/// Outcome of auditing one known device for one day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditVerdict {
    /// Evidence today, device was already considered logging
    Logging,
    /// Evidence today for a device flagged as not logging
    Resumed,
    /// No evidence today but still inside the expected interval
    Pending,
    /// No evidence and the expected interval has passed
    Overdue,
    /// No evidence for longer than the inactivity threshold
    NewlyInactive,
}

/// A monitored device as stored in the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    id: Option<DeviceId>,
    name: DeviceName,
    first_seen: Option<NaiveDate>,
    last_seen: Option<NaiveDate>,
    frequency: Frequency,
    critical: bool,
    inactive_since: Option<NaiveDate>,
    not_logging_since: Option<NaiveDate>,
}

impl DeviceRecord {
    /// Creates an active, logging, non-critical record with no date evidence
    ///
    /// The record has no id until the registry inserts it.
    pub fn new(name: DeviceName, frequency: Frequency) -> Self {
        Self {
            id: None,
            name,
            first_seen: None,
            last_seen: None,
            frequency,
            critical: false,
            inactive_since: None,
            not_logging_since: None,
        }
    }

    /// Derives a new record from the log days observed on disk
    ///
    /// - no dates: inactive and not logging since `today`, dates unset, daily
    /// - newest date older than `inactive_after_days`: inactive and not
    ///   logging since `today`, daily
    /// - otherwise: active and logging, frequency estimated from the dates
    ///
    /// # Errors
    /// Returns [`DomainError::InconsistentEvidence`] when the estimator rejects
    /// the evidence
    pub fn from_evidence(
        name: DeviceName,
        dates: &BTreeSet<NaiveDate>,
        today: NaiveDate,
        inactive_after_days: u32,
    ) -> Result<Self, DomainError> {
        let (Some(first), Some(last)) = (dates.first().copied(), dates.last().copied()) else {
            return Ok(Self::new(name, Frequency::DAILY)
                .with_inactive_since(Some(today))
                .with_not_logging_since(Some(today)));
        };

        if (today - last).num_days() > i64::from(inactive_after_days) {
            return Ok(Self::new(name, Frequency::DAILY)
                .with_seen(Some(first), Some(last))
                .with_inactive_since(Some(today))
                .with_not_logging_since(Some(today)));
        }

        let frequency = estimate_frequency(dates.iter().copied(), today)?;
        Ok(Self::new(name, frequency).with_seen(Some(first), Some(last)))
    }

    // --- Builders used when restoring stored records ---

    #[must_use]
    pub fn with_id(mut self, id: DeviceId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn with_seen(mut self, first: Option<NaiveDate>, last: Option<NaiveDate>) -> Self {
        self.first_seen = first;
        self.last_seen = last;
        self
    }

    #[must_use]
    pub fn with_critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }

    #[must_use]
    pub fn with_inactive_since(mut self, since: Option<NaiveDate>) -> Self {
        self.inactive_since = since;
        self
    }

    #[must_use]
    pub fn with_not_logging_since(mut self, since: Option<NaiveDate>) -> Self {
        self.not_logging_since = since;
        self
    }

    // --- Getters ---

    pub fn id(&self) -> Option<DeviceId> {
        self.id
    }

    pub fn name(&self) -> &DeviceName {
        &self.name
    }

    pub fn first_seen(&self) -> Option<NaiveDate> {
        self.first_seen
    }

    pub fn last_seen(&self) -> Option<NaiveDate> {
        self.last_seen
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn is_critical(&self) -> bool {
        self.critical
    }

    pub fn is_inactive(&self) -> bool {
        self.inactive_since.is_some()
    }

    pub fn inactive_since(&self) -> Option<NaiveDate> {
        self.inactive_since
    }

    pub fn is_not_logging(&self) -> bool {
        self.not_logging_since.is_some()
    }

    pub fn not_logging_since(&self) -> Option<NaiveDate> {
        self.not_logging_since
    }

    /// Whole days since the last log day; `None` when never seen
    pub fn days_since_last_seen(&self, today: NaiveDate) -> Option<i64> {
        self.last_seen.map(|last| (today - last).num_days())
    }

    // --- Audit state machine ---

    /// Decide what today's audit means for this device
    ///
    /// A device never seen is treated as beyond every threshold.
    pub fn assess(
        &self,
        evidence_today: bool,
        today: NaiveDate,
        inactive_after_days: u32,
    ) -> AuditVerdict {
        if evidence_today {
            return if self.is_not_logging() {
                AuditVerdict::Resumed
            } else {
                AuditVerdict::Logging
            };
        }

        match self.days_since_last_seen(today) {
            Some(elapsed) if elapsed <= self.frequency.days() => AuditVerdict::Pending,
            Some(elapsed) if elapsed <= i64::from(inactive_after_days) => AuditVerdict::Overdue,
            _ => AuditVerdict::NewlyInactive,
        }
    }

    /// Record evidence for `today`
    pub fn record_logging(&mut self, today: NaiveDate) {
        self.last_seen = Some(today);
        if self.first_seen.is_none() {
            self.first_seen = Some(today);
        }
    }

    /// Clear the not-logging flag after fresh evidence, adopting a re-estimated frequency
    pub fn resume_logging(&mut self, today: NaiveDate, frequency: Frequency) {
        self.not_logging_since = None;
        self.frequency = frequency;
        self.record_logging(today);
    }

    /// Flag as not logging; returns true only when the flag was newly raised
    pub fn flag_not_logging(&mut self, today: NaiveDate) -> bool {
        if self.not_logging_since.is_some() {
            return false;
        }
        self.not_logging_since = Some(today);
        true
    }

    /// Presume the device decommissioned as of `today`
    pub fn mark_inactive(&mut self, today: NaiveDate) {
        self.inactive_since = Some(today);
    }

    // --- Operator overrides ---

    pub fn toggle_critical(&mut self) {
        self.critical = !self.critical;
    }

    /// Flip manual inactivity, stamping `today` on deactivation and clearing
    /// the date on reactivation
    pub fn toggle_inactive(&mut self, today: NaiveDate) {
        self.inactive_since = match self.inactive_since {
            Some(_) => None,
            None => Some(today),
        };
    }

    pub fn set_frequency(&mut self, frequency: Frequency) {
        self.frequency = frequency;
    }
}
