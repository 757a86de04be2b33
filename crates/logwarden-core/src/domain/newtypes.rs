//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for domain identifiers and values.
//! Each newtype ensures data validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// DeviceId
// ============================================================================

/// Store-assigned identifier of a device record
///
/// Assigned by the registry on insert and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(i64);

impl DeviceId {
    /// Wrap a raw store identifier
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner value
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for DeviceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for DeviceId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

// ============================================================================
// DeviceName
// ============================================================================

/// Characters kept when cleaning an operator-supplied name
fn is_list_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '/'
}

/// Unique device identity, a `/`-separated path relative to the monitored root
///
/// A *standard* device is a direct child of the root (`fw01`); an
/// *anomalous* device lives deeper (`site-a/switch03`). Components are
/// taken from the tree as they are, so any UTF-8 directory name is a valid
/// component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceName(String);

impl DeviceName {
    /// Create a new DeviceName
    ///
    /// # Errors
    /// Returns error if the name is empty, absolute, contains an empty,
    /// `.` or `..` component, or contains a control character
    pub fn new(name: String) -> Result<Self, DomainError> {
        if name.is_empty() {
            return Err(DomainError::InvalidDeviceName(
                "Device name cannot be empty".to_string(),
            ));
        }

        if let Some(bad) = name.chars().find(|c| c.is_control()) {
            return Err(DomainError::InvalidDeviceName(format!(
                "Device name contains control character {bad:?}: {name:?}"
            )));
        }

        if name
            .split('/')
            .any(|part| part.is_empty() || part == "." || part == "..")
        {
            return Err(DomainError::InvalidDeviceName(format!(
                "Device name must be a relative path without empty or dot components: {name}"
            )));
        }

        Ok(Self(name))
    }

    /// Strip every character outside `[A-Za-z0-9./-]`, plus leading and
    /// trailing separators, then validate what remains
    ///
    /// Used for operator-supplied lists, which often carry stray whitespace
    /// or quoting.
    ///
    /// # Errors
    /// Returns error if nothing valid remains
    pub fn sanitized(raw: &str) -> Result<Self, DomainError> {
        let cleaned: String = raw.chars().filter(|c| is_list_char(*c)).collect();
        Self::new(cleaned.trim_matches('/').to_string())
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the device is a direct child of the monitored root
    #[must_use]
    pub fn is_standard(&self) -> bool {
        !self.0.contains('/')
    }

    /// The first path component (the top-level directory under the root)
    #[must_use]
    pub fn top_level(&self) -> &str {
        self.0.split('/').next().unwrap_or(&self.0)
    }
}

impl Display for DeviceName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DeviceName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for DeviceName {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<DeviceName> for String {
    fn from(name: DeviceName) -> Self {
        name.0
    }
}

impl AsRef<str> for DeviceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Frequency
// ============================================================================

/// Expected interval between log days, in whole days (always at least 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Frequency(u32);

impl Frequency {
    /// The smallest valid frequency: a device that logs every day
    pub const DAILY: Frequency = Frequency(1);

    /// Create a new Frequency
    ///
    /// # Errors
    /// Returns error if `days` is below 1 or does not fit in 32 bits
    pub fn new(days: i64) -> Result<Self, DomainError> {
        match u32::try_from(days) {
            Ok(d) if d >= 1 => Ok(Self(d)),
            _ => Err(DomainError::InvalidFrequency(days)),
        }
    }

    /// Number of days
    #[must_use]
    pub const fn days(&self) -> i64 {
        self.0 as i64
    }
}

impl Display for Frequency {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Frequency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let days: i64 = s
            .trim()
            .parse()
            .map_err(|_| DomainError::InvalidFrequency(0))?;
        Self::new(days)
    }
}

impl TryFrom<i64> for Frequency {
    type Error = DomainError;

    fn try_from(days: i64) -> Result<Self, Self::Error> {
        Self::new(days)
    }
}

impl From<Frequency> for i64 {
    fn from(freq: Frequency) -> Self {
        freq.days()
    }
}
