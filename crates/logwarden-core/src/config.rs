//! Configuration module for Logwarden.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.
//! A loaded [`Config`] is treated as an immutable value and handed to each
//! component at construction time.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for Logwarden.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub monitor: MonitorConfig,
    pub audit: AuditConfig,
    pub registry: RegistryConfig,
    pub events: EventsConfig,
    pub logging: LoggingConfig,
    pub reports: ReportsConfig,
}

/// The monitored log tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Root directory holding one subtree per device.
    pub root: PathBuf,
    /// Substrings; any device whose on-disk path contains one is never audited.
    pub exclude: Vec<String>,
}

/// Audit pass tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Days without evidence after which a device is presumed decommissioned.
    pub inactive_after_days: u32,
}

/// Device registry location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Path to the SQLite database file.
    pub path: PathBuf,
}

/// Outbound status-change events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// When false, events are only written to the operations log.
    pub enabled: bool,
    /// The syslog submission binary that receives each CEF line.
    pub logger_path: PathBuf,
    /// CEF header fields.
    pub cef: CefConfig,
}

/// Header fields stamped on every CEF event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CefConfig {
    pub vendor: String,
    pub product: String,
    pub version: String,
    pub signature_id: String,
    pub name: String,
    /// CEF severity, 0 to 10.
    pub severity: u8,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Directory holding the operations log.
    pub dir: PathBuf,
    /// File name of the operations log inside `dir`.
    pub file_name: String,
}

/// Fleet report output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportsConfig {
    /// Directory where report files are written.
    pub dir: PathBuf,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/logwarden/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("logwarden")
            .join("config.yaml")
    }

    /// Full path of the operations log file.
    pub fn log_file(&self) -> PathBuf {
        self.logging.dir.join(&self.logging.file_name)
    }
}

// ---------------------------------------------------------------------------
// Config::default()
// ---------------------------------------------------------------------------

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join("logwarden")
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/var/log/hosts"),
            exclude: Vec::new(),
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            inactive_after_days: 60,
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: data_dir().join("devices.db"),
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            logger_path: PathBuf::from("/usr/bin/logger"),
            cef: CefConfig::default(),
        }
    }
}

impl Default for CefConfig {
    fn default() -> Self {
        Self {
            vendor: "Logwarden".to_string(),
            product: "logwarden".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            signature_id: "0".to_string(),
            name: "Asset-Logging-Status".to_string(),
            severity: 3,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: data_dir().join("logs"),
            file_name: "logwarden.log".to_string(),
        }
    }
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            dir: data_dir().join("reports"),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"audit.inactive_after_days"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Highest severity accepted in a CEF header.
const MAX_CEF_SEVERITY: u8 = 10;

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- monitor ---
        if !self.monitor.root.is_dir() {
            errors.push(ValidationError {
                field: "monitor.root".into(),
                message: format!("directory does not exist: {}", self.monitor.root.display()),
            });
        }
        if self.monitor.exclude.iter().any(|e| e.trim().is_empty()) {
            errors.push(ValidationError {
                field: "monitor.exclude".into(),
                message: "entries must not be empty (an empty pattern excludes every device)"
                    .into(),
            });
        }

        // --- audit ---
        if self.audit.inactive_after_days == 0 {
            errors.push(ValidationError {
                field: "audit.inactive_after_days".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- registry ---
        if self.registry.path.file_name().is_none() {
            errors.push(ValidationError {
                field: "registry.path".into(),
                message: format!("not a file path: {}", self.registry.path.display()),
            });
        }

        // --- events ---
        if self.events.enabled && !self.events.logger_path.exists() {
            errors.push(ValidationError {
                field: "events.logger_path".into(),
                message: format!(
                    "logger binary not found: {}",
                    self.events.logger_path.display()
                ),
            });
        }
        if self.events.cef.severity > MAX_CEF_SEVERITY {
            errors.push(ValidationError {
                field: "events.cef.severity".into(),
                message: format!("must be in range 0..={MAX_CEF_SEVERITY}"),
            });
        }
        if self.events.cef.vendor.is_empty() || self.events.cef.product.is_empty() {
            errors.push(ValidationError {
                field: "events.cef".into(),
                message: "vendor and product must not be empty".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }
        if self.logging.file_name.is_empty() || self.logging.file_name.contains('/') {
            errors.push(ValidationError {
                field: "logging.file_name".into(),
                message: "must be a plain file name".into(),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use logwarden_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = ConfigBuilder::new()
///     .monitor_root(PathBuf::from("/var/log/hosts"))
///     .inactive_after_days(90)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- monitor ---

    pub fn monitor_root(mut self, root: PathBuf) -> Self {
        self.config.monitor.root = root;
        self
    }

    // --- audit ---

    pub fn inactive_after_days(mut self, days: u32) -> Self {
        self.config.audit.inactive_after_days = days;
        self
    }

    // --- registry ---

    pub fn registry_path(mut self, path: PathBuf) -> Self {
        self.config.registry.path = path;
        self
    }

    // --- events ---

    pub fn events_enabled(mut self, enabled: bool) -> Self {
        self.config.events.enabled = enabled;
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    // -- Defaults --

    #[test]
    fn default_config_has_sensible_values() {
        let cfg = Config::default();
        assert_eq!(cfg.monitor.root, PathBuf::from("/var/log/hosts"));
        assert!(cfg.monitor.exclude.is_empty());
        assert_eq!(cfg.audit.inactive_after_days, 60);
        assert!(cfg.registry.path.ends_with("logwarden/devices.db"));
        assert!(cfg.events.enabled);
        assert_eq!(cfg.events.logger_path, PathBuf::from("/usr/bin/logger"));
        assert_eq!(cfg.events.cef.name, "Asset-Logging-Status");
        assert_eq!(cfg.events.cef.severity, 3);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.logging.file_name, "logwarden.log");
        assert!(cfg.log_file().ends_with("logs/logwarden.log"));
    }

    #[test]
    fn default_config_passes_validation_apart_from_host_paths() {
        let cfg = Config::default();
        let errors = cfg.validate();
        // The monitored root and logger may not exist on a CI machine
        let other: Vec<_> = errors
            .iter()
            .filter(|e| e.field != "monitor.root" && e.field != "events.logger_path")
            .collect();
        assert!(other.is_empty(), "unexpected validation errors: {other:?}");
    }

    // -- Loading --

    #[test]
    fn load_from_yaml_file() {
        let yaml = r#"
monitor:
  root: /srv/logs/hosts
  exclude:
    - lab-
    - decom/
audit:
  inactive_after_days: 45
registry:
  path: /tmp/logwarden-test/devices.db
events:
  enabled: false
  logger_path: /bin/logger
  cef:
    vendor: Acme
    product: fleet-audit
    version: "2.0"
    signature_id: "7"
    name: Asset-Logging-Status
    severity: 5
logging:
  level: debug
  dir: /tmp/logwarden-test/logs
  file_name: ops.log
reports:
  dir: /tmp/logwarden-test/reports
"#;
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(yaml.as_bytes()).unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).expect("load config");
        assert_eq!(cfg.monitor.root, PathBuf::from("/srv/logs/hosts"));
        assert_eq!(cfg.monitor.exclude, vec!["lab-", "decom/"]);
        assert_eq!(cfg.audit.inactive_after_days, 45);
        assert_eq!(
            cfg.registry.path,
            PathBuf::from("/tmp/logwarden-test/devices.db")
        );
        assert!(!cfg.events.enabled);
        assert_eq!(cfg.events.cef.vendor, "Acme");
        assert_eq!(cfg.events.cef.severity, 5);
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(
            cfg.log_file(),
            PathBuf::from("/tmp/logwarden-test/logs/ops.log")
        );
        assert_eq!(cfg.reports.dir, PathBuf::from("/tmp/logwarden-test/reports"));
    }

    #[test]
    fn partial_yaml_falls_back_to_section_defaults() {
        let yaml = "audit:\n  inactive_after_days: 10\n";
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(yaml.as_bytes()).unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).expect("load partial config");
        assert_eq!(cfg.audit.inactive_after_days, 10);
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.events.enabled);
    }

    #[test]
    fn load_returns_error_on_invalid_yaml() {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(b"not: [valid: yaml: {{{").unwrap();
        tmp.flush().unwrap();

        let result = Config::load(tmp.path());
        assert!(result.is_err());
    }

    // -- Validation --

    #[test]
    fn validate_catches_missing_monitor_root() {
        let mut cfg = Config::default();
        cfg.monitor.root = PathBuf::from("/definitely/not/here");
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "monitor.root"));
    }

    #[test]
    fn validate_accepts_existing_monitor_root() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = Config::default();
        cfg.monitor.root = dir.path().to_path_buf();
        let errors = cfg.validate();
        assert!(!errors.iter().any(|e| e.field == "monitor.root"));
    }

    #[test]
    fn validate_catches_empty_exclude_pattern() {
        let mut cfg = Config::default();
        cfg.monitor.exclude = vec!["fw".into(), "  ".into()];
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "monitor.exclude"));
    }

    #[test]
    fn validate_catches_zero_inactivity_threshold() {
        let mut cfg = Config::default();
        cfg.audit.inactive_after_days = 0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "audit.inactive_after_days"));
    }

    #[test]
    fn validate_only_checks_logger_when_events_enabled() {
        let mut cfg = Config::default();
        cfg.events.logger_path = PathBuf::from("/no/such/logger");
        assert!(cfg
            .validate()
            .iter()
            .any(|e| e.field == "events.logger_path"));

        cfg.events.enabled = false;
        assert!(!cfg
            .validate()
            .iter()
            .any(|e| e.field == "events.logger_path"));
    }

    #[test]
    fn validate_catches_out_of_range_severity() {
        let mut cfg = Config::default();
        cfg.events.cef.severity = 11;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "events.cef.severity"));
    }

    #[test]
    fn validate_catches_invalid_log_level() {
        let mut cfg = Config::default();
        cfg.logging.level = "verbose".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "logging.level"));
    }

    #[test]
    fn validate_catches_log_file_name_with_directory() {
        let mut cfg = Config::default();
        cfg.logging.file_name = "nested/ops.log".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "logging.file_name"));
    }

    #[test]
    fn validate_accepts_all_valid_log_levels() {
        for level in VALID_LOG_LEVELS {
            let mut cfg = Config::default();
            cfg.logging.level = level.to_string();
            let errors = cfg.validate();
            assert!(
                !errors.iter().any(|e| e.field == "logging.level"),
                "level '{level}' should be valid"
            );
        }
    }

    // -- Builder --

    #[test]
    fn builder_starts_from_defaults() {
        let cfg = ConfigBuilder::new().build();
        assert_eq!(cfg.audit.inactive_after_days, 60);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn builder_overrides_fields() {
        let cfg = ConfigBuilder::new()
            .monitor_root(PathBuf::from("/custom/root"))
            .inactive_after_days(30)
            .registry_path(PathBuf::from("/tmp/r.db"))
            .events_enabled(false)
            .build();

        assert_eq!(cfg.monitor.root, PathBuf::from("/custom/root"));
        assert_eq!(cfg.audit.inactive_after_days, 30);
        assert_eq!(cfg.registry.path, PathBuf::from("/tmp/r.db"));
        assert!(!cfg.events.enabled);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn builder_build_validated_succeeds_for_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConfigBuilder::new()
            .monitor_root(dir.path().to_path_buf())
            .events_enabled(false)
            .build_validated();
        assert!(result.is_ok(), "{:?}", result.err());
    }

    #[test]
    fn builder_build_validated_fails_for_invalid_config() {
        let result = ConfigBuilder::new()
            .monitor_root(PathBuf::from("/nonexistent/hosts"))
            .inactive_after_days(0)
            .build_validated();
        assert!(result.is_err());
        let errors = result.unwrap_err();
        assert!(errors.len() >= 2);
    }

    // -- default_path --

    #[test]
    fn default_path_ends_with_config_yaml() {
        let p = Config::default_path();
        assert!(p.ends_with("logwarden/config.yaml"));
    }

    #[test]
    fn validation_error_display() {
        let err = ValidationError {
            field: "audit.inactive_after_days".into(),
            message: "must be greater than 0".into(),
        };
        assert_eq!(
            err.to_string(),
            "audit.inactive_after_days: must be greater than 0"
        );
    }
}
