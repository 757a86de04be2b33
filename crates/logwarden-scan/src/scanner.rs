//! walkdir-backed implementation of ILogTree
//!
//! Every directory under the walk is classified on its own:
//!
//! - it directly holds files: the path is split at its first date component
//!   and the date is recorded for the device in front of it
//! - it holds day-labelled subdirectories but is itself undated: the path is
//!   registered as a device, possibly with no dates yet
//! - it is a completely empty top-level directory: registered with no dates
//!
//! Anything else is structure (an hour directory, a site grouping nested
//! devices) and is not reported.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use logwarden_core::config::MonitorConfig;
use logwarden_core::domain::{is_day_label, parse_device_path, DeviceName, DevicePath};
use logwarden_core::ports::{DiscoveryMap, ILogTree};

use crate::ScanError;

/// Devices keyed by their raw relative path, before name validation
type RawMap = BTreeMap<String, BTreeSet<NaiveDate>>;

/// What a single directory directly contains
#[derive(Debug, Default)]
struct DirShape {
    has_file: bool,
    has_day_dir: bool,
    empty: bool,
}

/// Scanner over one monitored root
#[derive(Debug, Clone)]
pub struct LogTreeScanner {
    root: PathBuf,
    exclude: Vec<String>,
}

impl LogTreeScanner {
    /// Creates a scanner for `root`, dropping devices whose full path
    /// contains any of the `exclude` substrings
    pub fn new(root: impl Into<PathBuf>, exclude: Vec<String>) -> Self {
        Self {
            root: root.into(),
            exclude,
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(config.root.clone(), config.exclude.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // ------------------------------------------------------------------
    // Blocking walks
    // ------------------------------------------------------------------

    /// Walk the whole root
    pub fn walk_all(&self) -> Result<DiscoveryMap, ScanError> {
        fs::read_dir(&self.root).map_err(|source| ScanError::Unreadable {
            path: self.root.clone(),
            source,
        })?;

        let mut raw = RawMap::new();
        self.walk_into(&self.root, false, &BTreeSet::new(), &mut raw)?;
        Ok(self.finish(raw))
    }

    /// Walk only the top-level directories that may hold devices not in `known`
    ///
    /// Known standard devices are skipped outright. A top-level directory
    /// holding known nested devices is walked with those subtrees pruned,
    /// and is never reported itself.
    pub fn walk_unknown(&self, known: &BTreeSet<DeviceName>) -> Result<DiscoveryMap, ScanError> {
        let standard: BTreeSet<&str> = known
            .iter()
            .filter(|n| n.is_standard())
            .map(DeviceName::as_str)
            .collect();

        let mut pruned = BTreeSet::new();
        let mut parents = BTreeSet::new();
        for name in known.iter().filter(|n| !n.is_standard()) {
            pruned.insert(self.root.join(name.as_str()));
            parents.insert(name.top_level());
        }

        let mut raw = RawMap::new();
        for top in self.top_level_dirs()? {
            if standard.contains(top.as_str()) {
                continue;
            }
            let is_parent = parents.contains(top.as_str());
            if is_parent {
                debug!(dir = %top, "Walking parent of known nested devices");
            }
            self.walk_into(&self.root.join(&top), !is_parent, &pruned, &mut raw)?;
        }

        let mut found = self.finish(raw);
        found.retain(|name, _| !known.contains(name));
        Ok(found)
    }

    /// Names of the entries directly under `device`
    pub fn list_entries(&self, device: &DeviceName) -> Result<Vec<String>, ScanError> {
        let dir = self.root.join(device.as_str());
        let listing = fs::read_dir(&dir).map_err(|source| ScanError::Unreadable {
            path: dir.clone(),
            source,
        })?;

        let mut names = Vec::new();
        for entry in listing {
            let entry = entry.map_err(|source| ScanError::Unreadable {
                path: dir.clone(),
                source,
            })?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    fn top_level_dirs(&self) -> Result<Vec<String>, ScanError> {
        let listing = fs::read_dir(&self.root).map_err(|source| ScanError::Unreadable {
            path: self.root.clone(),
            source,
        })?;

        let mut dirs = Vec::new();
        for entry in listing.flatten() {
            if !entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false) {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => dirs.push(name),
                Err(raw) => warn!(name = ?raw, "Skipping top-level directory with a non UTF-8 name"),
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    fn walk_into(
        &self,
        start: &Path,
        include_start: bool,
        pruned: &BTreeSet<PathBuf>,
        raw: &mut RawMap,
    ) -> Result<(), ScanError> {
        let walker = WalkDir::new(start)
            .min_depth(usize::from(!include_start))
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !(e.file_type().is_dir() && pruned.contains(e.path())));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() > 0 => {
                    warn!(error = %e, "Skipping unreadable part of the log tree");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            if entry.file_type().is_dir() {
                self.classify_dir(entry.path(), raw)?;
            }
        }
        Ok(())
    }

    fn classify_dir(&self, dir: &Path, raw: &mut RawMap) -> Result<(), ScanError> {
        let Ok(rel) = dir.strip_prefix(&self.root) else {
            return Ok(());
        };
        let Some(rel_str) = relative_string(rel) else {
            warn!(path = %dir.display(), "Skipping directory with a non UTF-8 path");
            return Ok(());
        };
        if rel_str.is_empty() {
            return Ok(());
        }

        let shape = match dir_shape(dir) {
            Ok(shape) => shape,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "Skipping unreadable directory");
                return Ok(());
            }
        };
        let top_level = rel.components().count() == 1;
        if !(shape.has_file || shape.has_day_dir || (shape.empty && top_level)) {
            return Ok(());
        }

        match parse_device_path(&rel_str)? {
            DevicePath::Dated { device, date } => {
                if !shape.has_file {
                    return Ok(());
                }
                if device.is_empty() {
                    debug!(path = %rel_str, "Skipping date directory directly under the monitored root");
                } else {
                    raw.entry(device).or_default().insert(date);
                }
            }
            DevicePath::Undated if shape.has_day_dir || shape.empty => {
                raw.entry(rel_str).or_default();
            }
            DevicePath::Undated => {
                debug!(path = %rel_str, "Skipping files outside any date directory");
            }
        }
        Ok(())
    }

    /// Validate names and apply the exclusion list
    fn finish(&self, raw: RawMap) -> DiscoveryMap {
        let mut map = DiscoveryMap::new();
        for (raw_name, dates) in raw {
            if self.is_excluded(&raw_name) {
                debug!(device = %raw_name, "Device excluded by configuration");
                continue;
            }
            match DeviceName::new(raw_name.clone()) {
                Ok(name) => {
                    map.insert(name, dates);
                }
                Err(e) => {
                    warn!(device = %raw_name, error = %e, "Skipping directory with an invalid device name");
                }
            }
        }
        map
    }

    fn is_excluded(&self, device: &str) -> bool {
        let full = self.root.join(device);
        let full = full.to_string_lossy();
        self.exclude
            .iter()
            .any(|pattern| !pattern.is_empty() && full.contains(pattern.as_str()))
    }
}

fn relative_string(rel: &Path) -> Option<String> {
    let parts = rel
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

fn dir_shape(dir: &Path) -> std::io::Result<DirShape> {
    let mut shape = DirShape {
        empty: true,
        ..DirShape::default()
    };
    for child in fs::read_dir(dir)? {
        let child = child?;
        shape.empty = false;
        match child.file_type() {
            Ok(ft) if ft.is_dir() => {
                if child.file_name().to_str().is_some_and(is_day_label) {
                    shape.has_day_dir = true;
                }
            }
            Ok(_) => shape.has_file = true,
            Err(_) => {}
        }
    }
    Ok(shape)
}

// ============================================================================
// ILogTree implementation
// ============================================================================

#[async_trait::async_trait]
impl ILogTree for LogTreeScanner {
    #[instrument(skip(self), fields(device = %device))]
    async fn entries_of(&self, device: &DeviceName) -> anyhow::Result<Vec<String>> {
        let scanner = self.clone();
        let device = device.clone();
        let entries = tokio::task::spawn_blocking(move || scanner.list_entries(&device))
            .await
            .map_err(|e| ScanError::Task(e.to_string()))??;
        Ok(entries)
    }

    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn scan_all(&self) -> anyhow::Result<DiscoveryMap> {
        let scanner = self.clone();
        let found = tokio::task::spawn_blocking(move || scanner.walk_all())
            .await
            .map_err(|e| ScanError::Task(e.to_string()))??;
        info!(devices = found.len(), "Full scan complete");
        Ok(found)
    }

    #[instrument(skip(self, known), fields(root = %self.root.display(), known = known.len()))]
    async fn scan_unknown(&self, known: &BTreeSet<DeviceName>) -> anyhow::Result<DiscoveryMap> {
        let scanner = self.clone();
        let known = known.clone();
        let found = tokio::task::spawn_blocking(move || scanner.walk_unknown(&known))
            .await
            .map_err(|e| ScanError::Task(e.to_string()))??;
        info!(devices = found.len(), "Discovery scan complete");
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"log line\n").unwrap();
    }

    fn mkdir(root: &Path, rel: &str) {
        fs::create_dir_all(root.join(rel)).unwrap();
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn name(s: &str) -> DeviceName {
        s.parse().unwrap()
    }

    fn dates(map: &DiscoveryMap, device: &str) -> Vec<NaiveDate> {
        map.get(&name(device))
            .unwrap_or_else(|| panic!("{device} not found in {map:?}"))
            .iter()
            .copied()
            .collect()
    }

    #[test]
    fn test_standard_devices_collect_dates() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "fw01/2024-06-28/messages.log");
        touch(tmp.path(), "fw01/2024-06-30/messages.log");
        touch(tmp.path(), "fw01/2024-06-30/secure.log");
        touch(tmp.path(), "sw2/2024-06-29/13/syslog.log");

        let map = LogTreeScanner::new(tmp.path(), vec![]).walk_all().unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(dates(&map, "fw01"), vec![d("2024-06-28"), d("2024-06-30")]);
        assert_eq!(dates(&map, "sw2"), vec![d("2024-06-29")]);
    }

    #[test]
    fn test_nested_device_is_registered_without_its_parent() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "site-a/switch03/2024-06-30/syslog.log");
        touch(tmp.path(), "site-a/rack2/ids/2024-06-01/alerts.log");

        let map = LogTreeScanner::new(tmp.path(), vec![]).walk_all().unwrap();

        let names: Vec<&str> = map.keys().map(DeviceName::as_str).collect();
        assert_eq!(names, vec!["site-a/rack2/ids", "site-a/switch03"]);
    }

    #[test]
    fn test_relative_day_labels_register_device_without_dates() {
        let tmp = TempDir::new().unwrap();
        mkdir(tmp.path(), "site-a/ap7/today");
        mkdir(tmp.path(), "site-a/ap7/yesterday");

        let map = LogTreeScanner::new(tmp.path(), vec![]).walk_all().unwrap();

        assert_eq!(map.len(), 1);
        assert!(dates(&map, "site-a/ap7").is_empty());
    }

    #[test]
    fn test_empty_top_level_directory_is_registered() {
        let tmp = TempDir::new().unwrap();
        mkdir(tmp.path(), "newbox");
        mkdir(tmp.path(), "fw01/archive");
        touch(tmp.path(), "fw01/2024-06-30/messages.log");

        let map = LogTreeScanner::new(tmp.path(), vec![]).walk_all().unwrap();

        assert!(dates(&map, "newbox").is_empty());
        assert!(!map.contains_key(&name("fw01/archive")));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_unclassifiable_paths_are_skipped() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "stray/notes.txt");
        touch(tmp.path(), "2024-06-30/orphan.log");
        touch(tmp.path(), "root-file.log");

        let map = LogTreeScanner::new(tmp.path(), vec![]).walk_all().unwrap();
        assert!(map.is_empty(), "unexpected devices: {map:?}");
    }

    #[test]
    fn test_directory_names_are_taken_as_they_are() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "fw01/2024-06-30/m.log");
        touch(tmp.path(), "web_01/2024-06-30/m.log");
        touch(tmp.path(), "rack 7/ids_a/2024-06-29/m.log");

        let scanner = LogTreeScanner::new(tmp.path(), vec![]);
        let map = scanner.walk_all().unwrap();

        let names: Vec<&str> = map.keys().map(DeviceName::as_str).collect();
        assert_eq!(names, vec!["fw01", "rack 7/ids_a", "web_01"]);
        assert_eq!(dates(&map, "web_01"), vec![d("2024-06-30")]);
        assert_eq!(
            scanner.list_entries(&name("rack 7/ids_a")).unwrap(),
            vec!["2024-06-29"]
        );
    }

    #[test]
    fn test_exclusion_matches_substring_of_full_path() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "fw01/2024-06-30/messages.log");
        touch(tmp.path(), "lab-fw02/2024-06-30/messages.log");
        touch(tmp.path(), "site-a/lab/ids/2024-06-30/messages.log");

        let map = LogTreeScanner::new(tmp.path(), vec!["lab-".to_string(), "/lab/".to_string()])
            .walk_all()
            .unwrap();

        let names: Vec<&str> = map.keys().map(DeviceName::as_str).collect();
        assert_eq!(names, vec!["fw01"]);
    }

    #[test]
    fn test_malformed_date_is_fatal() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "fw01/2024-13-40/messages.log");

        let err = LogTreeScanner::new(tmp.path(), vec![]).walk_all().unwrap_err();
        assert!(matches!(err, ScanError::MalformedDate(_)));
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let scanner = LogTreeScanner::new(tmp.path().join("absent"), vec![]);

        assert!(matches!(
            scanner.walk_all(),
            Err(ScanError::Unreadable { .. })
        ));
        assert!(matches!(
            scanner.walk_unknown(&BTreeSet::new()),
            Err(ScanError::Unreadable { .. })
        ));
    }

    #[test]
    fn test_walk_unknown_prunes_known_devices() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "fw01/2024-06-30/messages.log");
        touch(tmp.path(), "site-a/switch03/2024-06-30/syslog.log");
        touch(tmp.path(), "site-a/switch04/2024-06-29/syslog.log");
        touch(tmp.path(), "newdev/2024-06-27/messages.log");
        mkdir(tmp.path(), "bare");

        let known: BTreeSet<DeviceName> = [name("fw01"), name("site-a/switch03")].into();
        let map = LogTreeScanner::new(tmp.path(), vec![])
            .walk_unknown(&known)
            .unwrap();

        let names: Vec<&str> = map.keys().map(DeviceName::as_str).collect();
        assert_eq!(names, vec!["bare", "newdev", "site-a/switch04"]);
        assert_eq!(dates(&map, "newdev"), vec![d("2024-06-27")]);
    }

    #[test]
    fn test_walk_unknown_with_everything_known_finds_nothing() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "fw01/2024-06-30/messages.log");
        touch(tmp.path(), "site-a/switch03/2024-06-30/syslog.log");

        let scanner = LogTreeScanner::new(tmp.path(), vec![]);
        let known: BTreeSet<DeviceName> = scanner.walk_all().unwrap().into_keys().collect();

        assert!(scanner.walk_unknown(&known).unwrap().is_empty());
    }

    #[test]
    fn test_list_entries() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "fw01/2024-06-30/messages.log");
        touch(tmp.path(), "fw01/2024-06-29/messages.log");
        mkdir(tmp.path(), "fw01/current");

        let scanner = LogTreeScanner::new(tmp.path(), vec![]);
        assert_eq!(
            scanner.list_entries(&name("fw01")).unwrap(),
            vec!["2024-06-29", "2024-06-30", "current"]
        );
        assert!(scanner.list_entries(&name("ghost")).is_err());
    }

    #[tokio::test]
    async fn test_port_methods_run_on_blocking_pool() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "fw01/2024-06-30/messages.log");

        let tree: &dyn ILogTree = &LogTreeScanner::new(tmp.path(), vec![]);
        assert_eq!(tree.scan_all().await.unwrap().len(), 1);
        assert_eq!(
            tree.entries_of(&name("fw01")).await.unwrap(),
            vec!["2024-06-30"]
        );
        assert!(tree.entries_of(&name("ghost")).await.is_err());
    }
}
