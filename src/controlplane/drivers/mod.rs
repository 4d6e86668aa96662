//! Storage Drivers
//!
//! Built-in implementations of the storage driver contract:
//! - Memory: simulated block-storage provider
//! - Sysfs: host block device introspection

pub mod memory;
pub mod sysfs;

pub use memory::*;
pub use sysfs::*;

use crate::domain::ports::StorageDriverRef;
use crate::error::{Error, Result};
use std::sync::Arc;

/// Factory for creating storage drivers
pub struct DriverFactory;

impl DriverFactory {
    /// Names accepted by [`DriverFactory::create`]
    pub const KNOWN_DRIVERS: &'static [&'static str] = &["memory", SYSFS_DRIVER_NAME];

    /// Create a driver by name
    pub fn create(name: &str, config: &DriverConfig) -> Result<StorageDriverRef> {
        match name.to_lowercase().as_str() {
            "memory" => Ok(Arc::new(MemoryDriver::new(config.memory.clone()))),
            SYSFS_DRIVER_NAME => Ok(Arc::new(SysfsDriver::new(config.sysfs.clone()))),
            _ => Err(Error::UnknownDriver {
                name: name.to_string(),
            }),
        }
    }
}

/// Combined driver configuration
#[derive(Debug, Clone, Default)]
pub struct DriverConfig {
    pub memory: MemoryDriverConfig,
    pub sysfs: SysfsDriverConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::StorageDriver;
    use assert_matches::assert_matches;

    #[test]
    fn test_create_known_drivers() {
        let config = DriverConfig::default();

        for name in DriverFactory::KNOWN_DRIVERS {
            let driver = DriverFactory::create(name, &config).unwrap();
            assert_eq!(driver.name(), *name);
        }
    }

    #[test]
    fn test_create_is_case_insensitive() {
        let driver = DriverFactory::create("SysFS", &DriverConfig::default()).unwrap();
        assert_eq!(driver.name(), SYSFS_DRIVER_NAME);
    }

    #[test]
    fn test_create_unknown_driver() {
        let err = DriverFactory::create("ec2", &DriverConfig::default())
            .err()
            .unwrap();
        assert_matches!(err, Error::UnknownDriver { name } if name == "ec2");
    }
}
