//! Log tree port (driven/secondary port)
//!
//! This module defines the read-only view of the monitored directory tree
//! that audits and initial population work from.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because filesystem errors are adapter-specific.
//! - A [`DiscoveryMap`] is built fresh by each walk and handed to the
//!   caller by value.
//! - Excluded devices never appear in any result.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::domain::DeviceName;

/// Device identity to the set of log days observed for it
///
/// A device with an empty set was found on disk with no dated files.
pub type DiscoveryMap = BTreeMap<DeviceName, BTreeSet<NaiveDate>>;

/// Port trait for reading the monitored log tree
#[async_trait::async_trait]
pub trait ILogTree: Send + Sync {
    /// Names of the entries directly under one device's directory
    async fn entries_of(&self, device: &DeviceName) -> anyhow::Result<Vec<String>>;

    /// Walk the entire monitored root
    ///
    /// Used for initial population.
    async fn scan_all(&self) -> anyhow::Result<DiscoveryMap>;

    /// Walk only the parts of the root that may hold devices absent from `known`
    ///
    /// Subtrees of known devices are pruned, and directories that merely
    /// contain known nested devices are never reported themselves.
    async fn scan_unknown(&self, known: &BTreeSet<DeviceName>) -> anyhow::Result<DiscoveryMap>;
}
