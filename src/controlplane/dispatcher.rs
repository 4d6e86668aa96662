//! Storage Dispatcher
//!
//! Presents one volume/snapshot/instance API over every registered driver.
//!
//! Two dispatch disciplines are used:
//! - Fan-out-and-merge for discovery: every driver is queried concurrently
//!   and results are concatenated in registration order. Any failure fails
//!   the whole call with [`Error::DiscoveryFailed`]; partial results are
//!   dropped.
//! - Single-driver-required for mutations: identifiers only make sense in
//!   one backend's namespace, so more than one registered driver is
//!   rejected with [`Error::MultipleDriversDetected`] before any backend is
//!   called. With no drivers the call is a no-op returning a zero value.

use crate::controlplane::registry::DriverRegistry;
use crate::domain::ports::{
    BlockDevice, Instance, NewVolume, Snapshot, StorageDriver, StorageDriverRef, Volume,
    VolumeAttachment,
};
use crate::error::{DiscoveryKind, Error, Result};
use futures::future::try_join_all;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Treat empty identifiers the same as absent ones
fn non_empty(id: Option<&str>) -> Option<&str> {
    id.filter(|id| !id.is_empty())
}

fn discovery_failed(kind: DiscoveryKind, driver: &str, source: Error) -> Error {
    Error::DiscoveryFailed {
        kind,
        driver: driver.to_string(),
        source: Box::new(source),
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Routes storage operations to the registered drivers
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<DriverRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<DriverRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &DriverRegistry {
        &self.registry
    }

    /// Names of the active drivers, in dispatch order
    pub fn driver_names(&self) -> Vec<&str> {
        self.registry.names()
    }

    // =========================================================================
    // Dispatch Disciplines
    // =========================================================================

    async fn fan_out<'a, T, F, Fut>(&'a self, kind: DiscoveryKind, call: F) -> Result<Vec<T>>
    where
        F: Fn(&'a dyn StorageDriver) -> Fut,
        Fut: Future<Output = Result<Vec<T>>> + 'a,
    {
        let calls = self.registry.iter().map(|(name, driver)| {
            let pending = call(driver.as_ref());
            async move {
                let items = pending
                    .await
                    .map_err(|source| discovery_failed(kind, name, source))?;
                debug!("Driver {} returned {} entries ({:?})", name, items.len(), kind);
                Ok::<_, Error>(items)
            }
        });

        let per_driver = try_join_all(calls).await?;
        Ok(per_driver.into_iter().flatten().collect())
    }

    /// Resolve the one driver a mutating call may use.
    ///
    /// Depends only on registry size, which is fixed after construction.
    fn single_driver(&self, operation: &str) -> Result<Option<(&str, &StorageDriverRef)>> {
        match self.registry.len() {
            0 => {
                debug!("No drivers registered, {} is a no-op", operation);
                Ok(None)
            }
            1 => Ok(self.registry.iter().next()),
            count => {
                warn!("Refusing {} with {} active drivers", operation, count);
                Err(Error::MultipleDriversDetected { count })
            }
        }
    }

    // =========================================================================
    // Discovery (fan-out-and-merge)
    // =========================================================================

    /// Block devices visible to the host, across all drivers
    pub async fn discover_block_devices(&self) -> Result<Vec<BlockDevice>> {
        self.fan_out(DiscoveryKind::BlockDevice, |driver| {
            driver.discover_block_devices()
        })
        .await
    }

    /// One instance description per driver
    pub async fn describe_instances(&self) -> Result<Vec<Instance>> {
        self.fan_out(DiscoveryKind::Instance, |driver| async move {
            driver.describe_instance().await.map(|instance| vec![instance])
        })
        .await
    }

    pub async fn list_volumes(&self, volume_id: Option<&str>) -> Result<Vec<Volume>> {
        let volume_id = non_empty(volume_id);
        self.fan_out(DiscoveryKind::Volume, |driver| driver.list_volumes(volume_id))
            .await
    }

    pub async fn list_snapshots(
        &self,
        volume_id: Option<&str>,
        snapshot_id: Option<&str>,
    ) -> Result<Vec<Snapshot>> {
        let volume_id = non_empty(volume_id);
        let snapshot_id = non_empty(snapshot_id);
        self.fan_out(DiscoveryKind::Snapshot, |driver| {
            driver.list_snapshots(volume_id, snapshot_id)
        })
        .await
    }

    // =========================================================================
    // Mutations (single-driver-required)
    // =========================================================================

    pub async fn create_snapshot(
        &self,
        run_async: bool,
        volume_id: &str,
        description: &str,
    ) -> Result<Vec<Snapshot>> {
        match self.single_driver("create_snapshot")? {
            Some((name, driver)) => {
                info!("Creating snapshot of {} via {}", volume_id, name);
                driver.create_snapshot(run_async, volume_id, description).await
            }
            None => Ok(Vec::new()),
        }
    }

    pub async fn remove_snapshot(&self, snapshot_id: &str) -> Result<()> {
        match self.single_driver("remove_snapshot")? {
            Some((name, driver)) => {
                info!("Removing snapshot {} via {}", snapshot_id, name);
                driver.remove_snapshot(snapshot_id).await
            }
            None => Ok(()),
        }
    }

    pub async fn create_volume(&self, run_async: bool, request: &NewVolume) -> Result<Volume> {
        match self.single_driver("create_volume")? {
            Some((name, driver)) => {
                info!(
                    "Creating {} GB volume (type: {}) via {}",
                    request.size_gb, request.volume_type, name
                );
                driver.create_volume(run_async, request).await
            }
            None => Ok(Volume::default()),
        }
    }

    pub async fn remove_volume(&self, volume_id: &str) -> Result<()> {
        match self.single_driver("remove_volume")? {
            Some((name, driver)) => {
                info!("Removing volume {} via {}", volume_id, name);
                driver.remove_volume(volume_id).await
            }
            None => Ok(()),
        }
    }

    /// Attach a volume, defaulting to the driver's own instance.
    ///
    /// Failing to resolve the instance aborts the attach.
    pub async fn attach_volume(
        &self,
        run_async: bool,
        volume_id: &str,
        instance_id: Option<&str>,
    ) -> Result<Vec<VolumeAttachment>> {
        let (name, driver) = match self.single_driver("attach_volume")? {
            Some(found) => found,
            None => return Ok(Vec::new()),
        };

        let instance_id = match non_empty(instance_id) {
            Some(id) => id.to_string(),
            None => {
                driver
                    .describe_instance()
                    .await
                    .map_err(|source| discovery_failed(DiscoveryKind::Instance, name, source))?
                    .instance_id
            }
        };

        info!("Attaching volume {} to {} via {}", volume_id, instance_id, name);
        driver
            .attach_volume(run_async, volume_id, Some(instance_id.as_str()))
            .await
    }

    /// Detach a volume, defaulting to the driver's own instance.
    ///
    /// Unlike [`Dispatcher::attach_volume`], a failure to resolve the
    /// instance is only logged and the backend is called without an
    /// instance id. This divergence is kept for compatibility with existing
    /// callers and is pinned by a regression test; change it only together
    /// with attach.
    pub async fn detach_volume(
        &self,
        run_async: bool,
        volume_id: &str,
        instance_id: Option<&str>,
    ) -> Result<()> {
        let (name, driver) = match self.single_driver("detach_volume")? {
            Some(found) => found,
            None => return Ok(()),
        };

        let instance_id = match non_empty(instance_id) {
            Some(id) => id.to_string(),
            None => match driver.describe_instance().await {
                Ok(instance) => instance.instance_id,
                Err(e) => {
                    warn!(
                        "{}",
                        discovery_failed(DiscoveryKind::Instance, name, e)
                    );
                    String::new()
                }
            },
        };

        info!("Detaching volume {} via {}", volume_id, name);
        driver
            .detach_volume(run_async, volume_id, non_empty(Some(instance_id.as_str())))
            .await
    }
}
