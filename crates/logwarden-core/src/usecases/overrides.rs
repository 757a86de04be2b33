//! Operator overrides
//!
//! Bulk edits driven by operator-supplied device lists: flip criticality,
//! flip manual inactivity, or pin an explicit frequency. Every invocation
//! applies as one batch; names the registry does not know are reported
//! back rather than aborting the batch.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{DeviceName, DeviceRecord, Frequency};
use crate::ports::{IDeviceRegistry, RegistryBatch};

use super::errors::AuditError;
use super::integrity::assert_no_duplicate_names;

// ============================================================================
// List parsing
// ============================================================================

/// Meaningful lines of an override list: trimmed, non-blank, not comments
fn entries(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

fn sanitize(line_no: usize, raw: &str) -> Result<DeviceName, AuditError> {
    DeviceName::sanitized(raw)
        .map_err(|e| AuditError::Input(format!("line {line_no}: {e}")))
}

/// Parse a device list, one name per line
///
/// # Errors
/// [`AuditError::Input`] if a name is unusable after sanitizing or the list
/// holds no names
pub fn parse_device_list(content: &str) -> Result<Vec<DeviceName>, AuditError> {
    let names = entries(content)
        .map(|(line_no, line)| sanitize(line_no, line))
        .collect::<Result<Vec<_>, _>>()?;

    if names.is_empty() {
        return Err(AuditError::Input("device list is empty".to_string()));
    }
    Ok(names)
}

/// Parse a frequency list of `name,days` lines
///
/// # Errors
/// [`AuditError::Input`] for a line without a comma, a frequency that is not
/// a positive integer, an unusable name, or an empty list
pub fn parse_frequency_list(content: &str) -> Result<Vec<(DeviceName, Frequency)>, AuditError> {
    let mut out = Vec::new();
    for (line_no, line) in entries(content) {
        let Some((raw_name, raw_days)) = line.rsplit_once(',') else {
            return Err(AuditError::Input(format!(
                "line {line_no}: expected 'name,days', got '{line}'"
            )));
        };
        let frequency: Frequency = raw_days
            .trim()
            .parse()
            .map_err(|e| AuditError::Input(format!("line {line_no}: {e}")))?;
        out.push((sanitize(line_no, raw_name)?, frequency));
    }

    if out.is_empty() {
        return Err(AuditError::Input("frequency list is empty".to_string()));
    }
    Ok(out)
}

// ============================================================================
// Use case
// ============================================================================

/// Result of one override invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OverrideOutcome {
    /// Devices whose record was changed
    pub updated: Vec<DeviceName>,
    /// Requested names with no registry record
    pub unknown: Vec<DeviceName>,
}

/// Use case for operator overrides
pub struct OverrideUseCase {
    registry: Arc<dyn IDeviceRegistry>,
}

impl OverrideUseCase {
    pub fn new(registry: Arc<dyn IDeviceRegistry>) -> Self {
        Self { registry }
    }

    /// Flip the critical flag of every listed device
    pub async fn toggle_critical(&self, names: &[DeviceName]) -> Result<OverrideOutcome, AuditError> {
        let requests = names.iter().map(|n| (n.clone(), ()));
        self.apply("toggle_critical", requests, |record, ()| {
            record.toggle_critical();
        })
        .await
    }

    /// Flip manual inactivity of every listed device
    ///
    /// Deactivation stamps `today`; reactivation clears the date.
    pub async fn toggle_inactive(
        &self,
        names: &[DeviceName],
        today: NaiveDate,
    ) -> Result<OverrideOutcome, AuditError> {
        let requests = names.iter().map(|n| (n.clone(), ()));
        self.apply("toggle_inactive", requests, |record, ()| {
            record.toggle_inactive(today);
        })
        .await
    }

    /// Overwrite the frequency of every listed device
    pub async fn set_frequency(
        &self,
        requests: &[(DeviceName, Frequency)],
    ) -> Result<OverrideOutcome, AuditError> {
        self.apply("set_frequency", requests.iter().cloned(), |record, frequency| {
            record.set_frequency(frequency);
        })
        .await
    }

    async fn apply<T, I, F>(
        &self,
        operation: &str,
        requests: I,
        mutate: F,
    ) -> Result<OverrideOutcome, AuditError>
    where
        I: IntoIterator<Item = (DeviceName, T)>,
        F: Fn(&mut DeviceRecord, T),
    {
        // Step 1: Integrity check
        assert_no_duplicate_names(self.registry.as_ref()).await?;

        // Step 2: Index current records by name
        let records: BTreeMap<DeviceName, DeviceRecord> = self
            .registry
            .query_all()
            .await
            .map_err(|e| AuditError::Store(e.context("Failed to load device records")))?
            .into_iter()
            .map(|r| (r.name().clone(), r))
            .collect();

        // Step 3: Apply each request once
        let mut outcome = OverrideOutcome::default();
        let mut batch = RegistryBatch::new();
        let mut seen = BTreeSet::new();
        for (name, value) in requests {
            if !seen.insert(name.clone()) {
                warn!(device = %name, operation, "Device listed more than once; applying once");
                continue;
            }
            match records.get(&name) {
                Some(original) => {
                    let mut record = original.clone();
                    mutate(&mut record, value);
                    if record != *original {
                        batch.update(record);
                        outcome.updated.push(name);
                    }
                }
                None => {
                    warn!(device = %name, operation, "Device not found in registry");
                    outcome.unknown.push(name);
                }
            }
        }

        // Step 4: Commit
        if !batch.is_empty() {
            self.registry
                .commit_batch(&batch)
                .await
                .map_err(|e| AuditError::Store(e.context(format!("Failed to commit {operation}"))))?;
        }

        info!(
            operation,
            updated = outcome.updated.len(),
            unknown = outcome.unknown.len(),
            "Override applied"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::testing::{ago, name, today, MockRegistry};

    fn registry() -> Arc<MockRegistry> {
        Arc::new(MockRegistry::new(vec![
            DeviceRecord::new(name("fw01"), Frequency::DAILY),
            DeviceRecord::new(name("sw2"), Frequency::DAILY).with_inactive_since(Some(ago(4))),
            DeviceRecord::new(name("dc/east/ids"), Frequency::DAILY),
        ]))
    }

    // -- parsing --

    #[test]
    fn test_parse_device_list_skips_blanks_and_comments() {
        let names = parse_device_list("# core\nfw01\n\n  sw2  \n# done\n").unwrap();
        assert_eq!(names, vec![name("fw01"), name("sw2")]);
    }

    #[test]
    fn test_parse_device_list_sanitizes_names() {
        let names = parse_device_list("fw01;rm -rf\n/dc/east/ids/\n").unwrap();
        assert_eq!(names, vec![name("fw01rm-rf"), name("dc/east/ids")]);
    }

    #[test]
    fn test_parse_device_list_rejects_empty() {
        let err = parse_device_list("\n# nothing\n").unwrap_err();
        assert!(matches!(err, AuditError::Input(_)));
    }

    #[test]
    fn test_parse_frequency_list() {
        let entries = parse_frequency_list("fw01,7\nsw2, 14\n").unwrap();
        assert_eq!(
            entries,
            vec![
                (name("fw01"), Frequency::new(7).unwrap()),
                (name("sw2"), Frequency::new(14).unwrap()),
            ]
        );
    }

    #[test]
    fn test_parse_frequency_list_rejects_bad_lines() {
        for bad in ["fw01\n", "fw01,0\n", "fw01,-3\n", "fw01,weekly\n", "# only\n"] {
            let err = parse_frequency_list(bad).unwrap_err();
            assert!(matches!(err, AuditError::Input(_)), "accepted {bad:?}");
        }
    }

    // -- use case --

    #[tokio::test]
    async fn test_toggle_critical_reports_unknown_names() {
        let registry = registry();
        let usecase = OverrideUseCase::new(registry.clone());

        let outcome = usecase
            .toggle_critical(&[name("fw01"), name("ghost")])
            .await
            .unwrap();

        assert_eq!(outcome.updated, vec![name("fw01")]);
        assert_eq!(outcome.unknown, vec![name("ghost")]);
        assert!(registry.get("fw01").is_critical());
        assert!(!registry.get("sw2").is_critical());
        assert_eq!(registry.commits().len(), 1);
    }

    #[tokio::test]
    async fn test_repeated_name_toggles_once() {
        let registry = registry();
        let usecase = OverrideUseCase::new(registry.clone());

        usecase
            .toggle_critical(&[name("fw01"), name("fw01")])
            .await
            .unwrap();
        assert!(registry.get("fw01").is_critical());
    }

    #[tokio::test]
    async fn test_toggle_inactive_both_directions() {
        let registry = registry();
        let usecase = OverrideUseCase::new(registry.clone());

        let outcome = usecase
            .toggle_inactive(&[name("fw01"), name("sw2")], today())
            .await
            .unwrap();

        assert_eq!(outcome.updated.len(), 2);
        assert_eq!(registry.get("fw01").inactive_since(), Some(today()));
        assert_eq!(registry.get("sw2").inactive_since(), None);
    }

    #[tokio::test]
    async fn test_set_frequency_skips_unchanged() {
        let registry = registry();
        let usecase = OverrideUseCase::new(registry.clone());

        let outcome = usecase
            .set_frequency(&[
                (name("dc/east/ids"), Frequency::new(7).unwrap()),
                (name("fw01"), Frequency::DAILY),
            ])
            .await
            .unwrap();

        assert_eq!(outcome.updated, vec![name("dc/east/ids")]);
        assert_eq!(registry.get("dc/east/ids").frequency().days(), 7);
    }

    #[tokio::test]
    async fn test_only_unknown_names_commit_nothing() {
        let registry = registry();
        let usecase = OverrideUseCase::new(registry.clone());

        let outcome = usecase.toggle_critical(&[name("ghost")]).await.unwrap();
        assert!(outcome.updated.is_empty());
        assert!(registry.commits().is_empty());
    }

    #[tokio::test]
    async fn test_duplicates_in_registry_abort() {
        let registry = Arc::new(MockRegistry::new(vec![
            DeviceRecord::new(name("fw01"), Frequency::DAILY),
            DeviceRecord::new(name("fw01"), Frequency::DAILY),
        ]));
        let usecase = OverrideUseCase::new(registry.clone());

        let err = usecase.toggle_critical(&[name("fw01")]).await.unwrap_err();
        assert!(matches!(err, AuditError::DuplicateNames(_)));
        assert!(registry.commits().is_empty());
    }
}
