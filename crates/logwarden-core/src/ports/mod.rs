//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IDeviceRegistry`] - Persistent device records with batched commits
//! - [`ILogTree`] - Read-only view of the monitored log directory tree
//! - [`IEventSink`] - Outbound status-change events

pub mod device_registry;
pub mod event_sink;
pub mod log_tree;

pub use device_registry::{Activity, IDeviceRegistry, RegistryBatch};
pub use event_sink::IEventSink;
pub use log_tree::{DiscoveryMap, ILogTree};
