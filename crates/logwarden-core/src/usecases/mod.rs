//! Use cases (application services)
//!
//! Each use case orchestrates domain entities through the port traits and
//! owns one commit boundary:
//!
//! - [`RunAuditUseCase`] - Routine audit pass with discovery
//! - [`PopulateUseCase`] - Initial population of an empty registry
//! - [`OverrideUseCase`] - Operator criticality, inactivity and frequency overrides
//! - [`FleetReportUseCase`] - Report of devices needing attention

pub mod errors;
pub mod integrity;
pub mod overrides;
pub mod populate;
pub mod report;
pub mod run_audit;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::AuditError;
pub use integrity::assert_no_duplicate_names;
pub use overrides::{parse_device_list, parse_frequency_list, OverrideOutcome, OverrideUseCase};
pub use populate::{PopulateSummary, PopulateUseCase};
pub use report::{CriticalEntry, FleetReport, FleetReportUseCase};
pub use run_audit::{AuditMode, AuditSummary, RunAuditUseCase, SkippedDevice};
