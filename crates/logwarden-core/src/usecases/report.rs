//! Fleet status report
//!
//! Summarizes every device that needs operator attention: critical
//! devices with their current state, active devices that stopped logging,
//! and devices presumed gone.

use std::fmt::Write as _;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::domain::DeviceName;
use crate::ports::{Activity, IDeviceRegistry};

use super::errors::AuditError;

const RULE: &str = "--------------------------------------------------------";

/// One critical device with its state labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CriticalEntry {
    pub device: DeviceName,
    pub active: bool,
    pub logging: bool,
}

impl CriticalEntry {
    fn line(&self) -> String {
        format!(
            "{} - {} - {}",
            self.device,
            if self.active { "ACTIVE" } else { "INACTIVE" },
            if self.logging { "LOGGING" } else { "NOT LOGGING" },
        )
    }
}

/// Devices needing attention, grouped into disjoint sections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FleetReport {
    pub critical: Vec<CriticalEntry>,
    pub not_logging: Vec<DeviceName>,
    pub inactive: Vec<DeviceName>,
}

impl FleetReport {
    /// Render the report as sectioned plain text under a title line
    pub fn render_text(&self, title: &str) -> String {
        let mut body = format!("\n\n-----==== {title} ====-----\n\n{RULE}\n");

        let critical: Vec<String> = self.critical.iter().map(CriticalEntry::line).collect();
        let not_logging: Vec<String> = self.not_logging.iter().map(ToString::to_string).collect();
        let inactive: Vec<String> = self.inactive.iter().map(ToString::to_string).collect();

        section(
            &mut body,
            "NOT LOGGING",
            "THERE ARE NO DEVICES THAT ARE NOT LOGGING",
            &not_logging,
            false,
        );
        section(
            &mut body,
            "CRITICAL SYSTEMS",
            "THERE ARE NO CRITICAL SYSTEMS",
            &critical,
            true,
        );
        section(
            &mut body,
            "INACTIVE",
            "THERE ARE NO INACTIVE DEVICES",
            &inactive,
            true,
        );
        body.push_str(RULE);
        body.push('\n');
        body
    }
}

fn section(body: &mut String, heading: &str, none: &str, lines: &[String], ruled: bool) {
    if lines.is_empty() {
        let _ = writeln!(body, "{RULE}\n[{none}]");
        return;
    }
    if ruled {
        let _ = writeln!(body, "{RULE}");
    }
    let _ = writeln!(body, "[BEGIN {heading}]\nTotal: {}", lines.len());
    for line in lines {
        let _ = writeln!(body, "{line}");
    }
    let _ = writeln!(body, "[END {heading}]");
}

/// Use case building the fleet report
pub struct FleetReportUseCase {
    registry: Arc<dyn IDeviceRegistry>,
}

impl FleetReportUseCase {
    pub fn new(registry: Arc<dyn IDeviceRegistry>) -> Self {
        Self { registry }
    }

    /// Categorize flagged records
    ///
    /// Critical devices are listed only in the critical section; of the
    /// rest, active devices that are not logging form one section and
    /// inactive devices another.
    pub async fn build(&self) -> Result<FleetReport, AuditError> {
        let store = |e: anyhow::Error| AuditError::Store(e.context("Failed to query registry for report"));

        let critical = self.registry.query_critical().await.map_err(store)?;
        let active = self
            .registry
            .query_by_activity(Activity::Active)
            .await
            .map_err(store)?;
        let inactive = self
            .registry
            .query_by_activity(Activity::Inactive)
            .await
            .map_err(store)?;

        let report = FleetReport {
            critical: critical
                .iter()
                .map(|r| CriticalEntry {
                    device: r.name().clone(),
                    active: !r.is_inactive(),
                    logging: !r.is_not_logging(),
                })
                .collect(),
            not_logging: active
                .iter()
                .filter(|r| !r.is_critical() && r.is_not_logging())
                .map(|r| r.name().clone())
                .collect(),
            inactive: inactive
                .iter()
                .filter(|r| !r.is_critical())
                .map(|r| r.name().clone())
                .collect(),
        };

        info!(
            critical = report.critical.len(),
            not_logging = report.not_logging.len(),
            inactive = report.inactive.len(),
            "Built fleet report"
        );
        Ok(report)
    }
}
