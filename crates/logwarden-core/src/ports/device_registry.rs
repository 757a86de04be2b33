//! Device registry port (driven/secondary port)
//!
//! This module defines the interface for the persistent store of device
//! records: status queries, the duplicate-name integrity check, and the
//! single all-or-nothing batch commit every mutating command ends with.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage errors are adapter-specific.
//! - Records are never deleted; retirement is expressed through the
//!   inactive flag.
//! - Ids are assigned by the store on insert and never reused.

use crate::domain::{DeviceName, DeviceRecord};

// ============================================================================
// Activity filter
// ============================================================================

/// Selects records by their inactive flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Active,
    Inactive,
}

impl Activity {
    /// True when `record` belongs to this selection
    pub fn matches(&self, record: &DeviceRecord) -> bool {
        match self {
            Activity::Active => !record.is_inactive(),
            Activity::Inactive => record.is_inactive(),
        }
    }
}

// ============================================================================
// RegistryBatch
// ============================================================================

/// Mutations proposed by one command, applied together in one commit
///
/// `updates` must carry records that already have an id; `inserts` must
/// carry records without one.
#[derive(Debug, Clone, Default)]
pub struct RegistryBatch {
    pub updates: Vec<DeviceRecord>,
    pub inserts: Vec<DeviceRecord>,
}

impl RegistryBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there is nothing to write
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.inserts.is_empty()
    }

    pub fn update(&mut self, record: DeviceRecord) {
        self.updates.push(record);
    }

    pub fn insert(&mut self, record: DeviceRecord) {
        self.inserts.push(record);
    }
}

// ============================================================================
// IDeviceRegistry trait
// ============================================================================

/// Port trait for device record persistence
///
/// ## Implementation Notes
///
/// - `commit_batch` must apply every update and insert inside a single
///   transaction; on any failure nothing is written.
/// - Query results are ordered by device name.
#[async_trait::async_trait]
pub trait IDeviceRegistry: Send + Sync {
    /// Every record, active or not
    async fn query_all(&self) -> anyhow::Result<Vec<DeviceRecord>>;

    /// Records selected by their inactive flag
    async fn query_by_activity(&self, activity: Activity) -> anyhow::Result<Vec<DeviceRecord>>;

    /// Records flagged critical, active or not
    async fn query_critical(&self) -> anyhow::Result<Vec<DeviceRecord>>;

    /// Returns true when the store holds no records at all
    async fn is_empty(&self) -> anyhow::Result<bool>;

    /// Names held by more than one record
    async fn duplicate_names(&self) -> anyhow::Result<Vec<DeviceName>>;

    /// Applies all updates and inserts in one transaction
    async fn commit_batch(&self, batch: &RegistryBatch) -> anyhow::Result<()>;
}
