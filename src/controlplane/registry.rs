//! Driver Registry
//!
//! Immutable, ordered collection of initialized storage drivers. Built once
//! by the process entry point and shared (via `Arc`) with the dispatcher.

use crate::controlplane::drivers::{DriverConfig, DriverFactory};
use crate::domain::ports::{StorageDriver, StorageDriverRef};
use crate::error::{Error, Result};
use tracing::{info, warn};

// =============================================================================
// Registry Configuration
// =============================================================================

/// Which drivers to activate, and how to configure them
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Driver names, in activation order
    pub drivers: Vec<String>,
    pub driver: DriverConfig,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            drivers: vec!["memory".to_string()],
            driver: DriverConfig::default(),
        }
    }
}

impl RegistryConfig {
    /// Build a config from a comma-separated driver list
    pub fn from_driver_list(list: &str, driver: DriverConfig) -> Self {
        Self {
            drivers: Self::parse_driver_list(list),
            driver,
        }
    }

    /// Split a comma-separated list into normalized, de-duplicated names
    pub fn parse_driver_list(list: &str) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for name in list.split(',').map(|n| n.trim().to_lowercase()) {
            if !name.is_empty() && !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

// =============================================================================
// Driver Registry
// =============================================================================

/// Registration-ordered set of active drivers
pub struct DriverRegistry {
    drivers: Vec<(String, StorageDriverRef)>,
}

impl DriverRegistry {
    /// Construct every configured driver.
    ///
    /// Drivers that fail to construct are logged and skipped. Ending up with
    /// no drivers at all is fatal: [`Error::NoDriversInitialized`].
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let mut drivers = Vec::with_capacity(config.drivers.len());

        for name in &config.drivers {
            match DriverFactory::create(name, &config.driver) {
                Ok(driver) => {
                    info!("Registered storage driver: {}", name);
                    drivers.push((name.clone(), driver));
                }
                Err(e) => {
                    warn!("Skipping storage driver {}: {}", name, e);
                }
            }
        }

        if drivers.is_empty() {
            return Err(Error::NoDriversInitialized);
        }

        Ok(Self { drivers })
    }

    /// Wrap already-constructed drivers, keyed by their own names.
    ///
    /// Unlike [`DriverRegistry::new`] this accepts an empty list.
    pub fn from_drivers(drivers: Vec<StorageDriverRef>) -> Self {
        Self {
            drivers: drivers
                .into_iter()
                .map(|d| (d.name().to_string(), d))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    /// Driver names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.drivers.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&StorageDriverRef> {
        self.drivers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, driver)| driver)
    }

    /// Iterate drivers in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StorageDriverRef)> {
        self.drivers
            .iter()
            .map(|(name, driver)| (name.as_str(), driver))
    }
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("drivers", &self.names())
            .finish()
    }
}
