//! In-memory port doubles shared by the use case tests

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use anyhow::bail;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};

use crate::domain::{day_label, DeviceEvent, DeviceId, DeviceName, DeviceRecord, EventCode};
use crate::ports::{Activity, DiscoveryMap, IDeviceRegistry, IEventSink, ILogTree, RegistryBatch};

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
}

pub fn ago(days: i64) -> NaiveDate {
    today() - Duration::days(days)
}

pub fn name(s: &str) -> DeviceName {
    s.parse().unwrap()
}

// ============================================================================
// MockRegistry
// ============================================================================

/// Registry double holding records in a vector
pub struct MockRegistry {
    records: Mutex<Vec<DeviceRecord>>,
    commits: Mutex<Vec<RegistryBatch>>,
    fail_commit: bool,
}

impl MockRegistry {
    pub fn new(records: Vec<DeviceRecord>) -> Self {
        let records = records
            .into_iter()
            .enumerate()
            .map(|(idx, r)| match r.id() {
                Some(_) => r,
                None => r.with_id(DeviceId::new(idx as i64 + 1)),
            })
            .collect();
        Self {
            records: Mutex::new(records),
            commits: Mutex::new(Vec::new()),
            fail_commit: false,
        }
    }

    pub fn failing_commits(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    pub fn records(&self) -> Vec<DeviceRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn get(&self, device: &str) -> DeviceRecord {
        self.records()
            .into_iter()
            .find(|r| r.name().as_str() == device)
            .unwrap_or_else(|| panic!("no record for {device}"))
    }

    pub fn commits(&self) -> Vec<RegistryBatch> {
        self.commits.lock().unwrap().clone()
    }

    fn sorted(&self, keep: impl Fn(&DeviceRecord) -> bool) -> Vec<DeviceRecord> {
        let mut out: Vec<_> = self.records().into_iter().filter(|r| keep(r)).collect();
        out.sort_by(|a, b| a.name().cmp(b.name()));
        out
    }
}

#[async_trait]
impl IDeviceRegistry for MockRegistry {
    async fn query_all(&self) -> anyhow::Result<Vec<DeviceRecord>> {
        Ok(self.sorted(|_| true))
    }

    async fn query_by_activity(&self, activity: Activity) -> anyhow::Result<Vec<DeviceRecord>> {
        Ok(self.sorted(|r| activity.matches(r)))
    }

    async fn query_critical(&self) -> anyhow::Result<Vec<DeviceRecord>> {
        Ok(self.sorted(DeviceRecord::is_critical))
    }

    async fn is_empty(&self) -> anyhow::Result<bool> {
        Ok(self.records.lock().unwrap().is_empty())
    }

    async fn duplicate_names(&self) -> anyhow::Result<Vec<DeviceName>> {
        let mut counts: BTreeMap<DeviceName, usize> = BTreeMap::new();
        for r in self.records.lock().unwrap().iter() {
            *counts.entry(r.name().clone()).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|(name, _)| name)
            .collect())
    }

    async fn commit_batch(&self, batch: &RegistryBatch) -> anyhow::Result<()> {
        if self.fail_commit {
            bail!("database is locked");
        }
        let mut records = self.records.lock().unwrap();
        for update in &batch.updates {
            let slot = records
                .iter_mut()
                .find(|r| r.id() == update.id())
                .expect("update for unknown id");
            *slot = update.clone();
        }
        for insert in &batch.inserts {
            let next = records.iter().filter_map(|r| r.id()).max().map_or(1, |id| id.as_i64() + 1);
            records.push(insert.clone().with_id(DeviceId::new(next)));
        }
        self.commits.lock().unwrap().push(batch.clone());
        Ok(())
    }
}

// ============================================================================
// FakeTree
// ============================================================================

/// Log tree double: each device's directory holds one entry per date
#[derive(Default)]
pub struct FakeTree {
    devices: DiscoveryMap,
    extra_entries: BTreeMap<DeviceName, Vec<String>>,
    unreadable: BTreeSet<DeviceName>,
    scan_fails: bool,
}

impl FakeTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn device(mut self, device: &str, dates: &[NaiveDate]) -> Self {
        self.devices
            .insert(name(device), dates.iter().copied().collect());
        self
    }

    pub fn entry(mut self, device: &str, entry: &str) -> Self {
        self.extra_entries
            .entry(name(device))
            .or_default()
            .push(entry.to_string());
        self
    }

    pub fn unreadable(mut self, device: &str) -> Self {
        self.unreadable.insert(name(device));
        self
    }

    pub fn failing_scans(mut self) -> Self {
        self.scan_fails = true;
        self
    }
}

#[async_trait]
impl ILogTree for FakeTree {
    async fn entries_of(&self, device: &DeviceName) -> anyhow::Result<Vec<String>> {
        if self.unreadable.contains(device) {
            bail!("permission denied");
        }
        let Some(dates) = self.devices.get(device) else {
            bail!("no such directory: {device}");
        };
        let mut entries: Vec<String> = dates.iter().map(|d| day_label(*d)).collect();
        if let Some(extra) = self.extra_entries.get(device) {
            entries.extend(extra.iter().cloned());
        }
        Ok(entries)
    }

    async fn scan_all(&self) -> anyhow::Result<DiscoveryMap> {
        if self.scan_fails {
            bail!("monitored root unreadable");
        }
        Ok(self.devices.clone())
    }

    async fn scan_unknown(&self, known: &BTreeSet<DeviceName>) -> anyhow::Result<DiscoveryMap> {
        if self.scan_fails {
            bail!("monitored root unreadable");
        }
        Ok(self
            .devices
            .iter()
            .filter(|(name, _)| !known.contains(*name))
            .map(|(name, dates)| (name.clone(), dates.clone()))
            .collect())
    }
}

// ============================================================================
// RecordingSink
// ============================================================================

/// Sink double that remembers every event it was handed
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<DeviceEvent>>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records events but reports every delivery as failed
    pub fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn events(&self) -> Vec<DeviceEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Codes emitted for one subject, in order
    pub fn codes_for(&self, subject: &str) -> Vec<u16> {
        self.events()
            .iter()
            .filter(|e| e.subject() == subject)
            .map(|e| e.code().code())
            .collect()
    }

    pub fn count(&self, code: EventCode) -> usize {
        self.events().iter().filter(|e| e.code() == code).count()
    }
}

#[async_trait]
impl IEventSink for RecordingSink {
    async fn emit(&self, event: &DeviceEvent) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(event.clone());
        if self.fail {
            bail!("logger exited with status 1");
        }
        Ok(())
    }
}
