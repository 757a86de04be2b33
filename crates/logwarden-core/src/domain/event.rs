//! Device status events
//!
//! Each audit decision is reported downstream as a (subject, code) pair.
//! The numeric codes are part of the external contract and must not change.

use serde::{Deserialize, Serialize};

use super::newtypes::DeviceName;

/// Status-change codes understood by downstream alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCode {
    /// No evidence today and the expected interval has passed
    Overdue,
    /// Evidence for today was found
    Logging,
    /// No evidence today, still inside the expected interval
    Pending,
    /// Device has just been flagged as not logging
    NewlyOverdue,
    /// Device has just been presumed decommissioned
    NewlyInactive,
    /// A not-logging device produced evidence again
    Resumed,
    /// Device found on disk that the registry did not know
    Discovered,
    /// The run failed and nothing was committed
    OperationalError,
}

impl EventCode {
    /// Wire value of the code
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            EventCode::Overdue => 0,
            EventCode::Logging => 1,
            EventCode::Pending => 2,
            EventCode::NewlyOverdue => 3,
            EventCode::NewlyInactive => 4,
            EventCode::Resumed => 5,
            EventCode::Discovered => 6,
            EventCode::OperationalError => 100,
        }
    }

    /// Look up a code by wire value
    #[must_use]
    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(EventCode::Overdue),
            1 => Some(EventCode::Logging),
            2 => Some(EventCode::Pending),
            3 => Some(EventCode::NewlyOverdue),
            4 => Some(EventCode::NewlyInactive),
            5 => Some(EventCode::Resumed),
            6 => Some(EventCode::Discovered),
            100 => Some(EventCode::OperationalError),
            _ => None,
        }
    }
}

impl std::fmt::Display for EventCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventCode::Overdue => "overdue",
            EventCode::Logging => "logging",
            EventCode::Pending => "pending",
            EventCode::NewlyOverdue => "newly_overdue",
            EventCode::NewlyInactive => "newly_inactive",
            EventCode::Resumed => "resumed",
            EventCode::Discovered => "discovered",
            EventCode::OperationalError => "operational_error",
        };
        write!(f, "{}", s)
    }
}

/// One outbound event
///
/// The subject is a device name for status events and a short failure
/// label for [`EventCode::OperationalError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEvent {
    subject: String,
    code: EventCode,
}

impl DeviceEvent {
    /// Event about a device
    #[must_use]
    pub fn new(device: &DeviceName, code: EventCode) -> Self {
        Self {
            subject: device.as_str().to_string(),
            code,
        }
    }

    /// Operational error event carrying a short label instead of a device
    #[must_use]
    pub fn operational_error(label: impl Into<String>) -> Self {
        Self {
            subject: label.into(),
            code: EventCode::OperationalError,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn code(&self) -> EventCode {
        self.code
    }
}
