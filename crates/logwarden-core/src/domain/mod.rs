//! Domain entities and business logic
//!
//! This module contains the core domain types for Logwarden:
//! - Newtypes for type-safe identifiers and validated domain values
//! - Device records and the per-device audit state machine
//! - Device path parsing and logging frequency estimation
//! - Status events and their wire codes
//! - Domain-specific error types

pub mod device;
pub mod device_path;
pub mod errors;
pub mod event;
pub mod frequency;
pub mod newtypes;

// Re-export commonly used types
pub use device::{AuditVerdict, DeviceRecord};
pub use device_path::{
    day_label, is_day_label, parse_date_segment, parse_device_path, DevicePath, DATE_FORMAT,
};
pub use errors::DomainError;
pub use event::{DeviceEvent, EventCode};
pub use frequency::estimate_frequency;
pub use newtypes::*;
