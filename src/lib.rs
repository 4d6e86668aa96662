//! Volume Dispatcher - Multi-backend storage driver façade
//!
//! Presents a single volume/snapshot/instance management API while fanning
//! requests out to one or more independently implemented storage drivers.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              Dispatcher                                 │
//! │   fan-out-and-merge (discovery)  │  single-driver-required (mutations)  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                  Driver Registry (immutable, ordered)                   │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                        StorageDriver contract                           │
//! │  ┌─────────────────────────┐  ┌───────────────────────────────────────┐ │
//! │  │   Memory (simulated)    │  │    Sysfs (host block devices)         │ │
//! │  └─────────────────────────┘  └───────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`controlplane`]: Dispatcher, driver registry and built-in drivers
//! - [`domain`]: Storage entities and the driver port
//! - [`error`]: Error types and handling

pub mod controlplane;
pub mod domain;
pub mod error;

// Re-export commonly used types
pub use controlplane::{
    Dispatcher, DriverConfig, DriverFactory, DriverRegistry, MemoryDriver, MemoryDriverConfig,
    RegistryConfig, SysfsDriver, SysfsDriverConfig,
};

pub use domain::ports::{
    BlockDevice, Instance, NewVolume, Snapshot, StorageDriver, StorageDriverRef, Volume,
    VolumeAttachment,
};

pub use error::{DiscoveryKind, Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
