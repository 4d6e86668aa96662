//! In-memory Block Storage Driver
//!
//! Simulates a cloud block-storage provider inside the process. Volumes,
//! snapshots and attachments live only as long as the driver instance.

use crate::domain::ports::{
    BlockDevice, Instance, NewVolume, Snapshot, StorageDriver, Volume, VolumeAttachment,
};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info};

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the in-memory driver
#[derive(Debug, Clone)]
pub struct MemoryDriverConfig {
    /// Name reported as the provider of every entity
    pub provider_name: String,
    /// Instance id returned by `describe_instance`
    pub instance_id: String,
    pub region: String,
    pub availability_zone: String,
}

impl Default for MemoryDriverConfig {
    fn default() -> Self {
        Self {
            provider_name: "memory".to_string(),
            instance_id: "i-0000000000000001".to_string(),
            region: "local-1".to_string(),
            availability_zone: "local-1a".to_string(),
        }
    }
}

/// Device names handed out on attach, in order
const DEVICE_LETTERS: &str = "fghijklmnop";

const DEFAULT_VOLUME_TYPE: &str = "standard";

// =============================================================================
// Driver State
// =============================================================================

#[derive(Debug, Default)]
struct MemoryState {
    volumes: BTreeMap<String, Volume>,
    snapshots: BTreeMap<String, Snapshot>,
}

impl MemoryState {
    /// Pick the first device name not yet used on `instance_id`
    fn next_device_name(&self, instance_id: &str) -> Option<String> {
        let used: Vec<&str> = self
            .volumes
            .values()
            .flat_map(|v| v.attachments.iter())
            .filter(|a| a.instance_id == instance_id)
            .map(|a| a.device_name.as_str())
            .collect();

        DEVICE_LETTERS
            .chars()
            .map(|c| format!("/dev/xvd{}", c))
            .find(|name| !used.contains(&name.as_str()))
    }
}

// =============================================================================
// Memory Driver
// =============================================================================

/// Simulated block-storage provider
pub struct MemoryDriver {
    config: MemoryDriverConfig,
    state: RwLock<MemoryState>,
    next_id: AtomicU64,
}

impl MemoryDriver {
    /// Create a new in-memory driver
    pub fn new(config: MemoryDriverConfig) -> Self {
        Self {
            config,
            state: RwLock::new(MemoryState::default()),
            next_id: AtomicU64::new(1),
        }
    }

    fn generate_id(&self, prefix: &str) -> String {
        let seq = self.next_id.fetch_add(1, Ordering::Relaxed);
        format!("{}-{:016x}", prefix, seq)
    }

    fn not_found(&self, operation: &str, kind: &str, id: &str) -> Error {
        Error::backend(
            &self.config.provider_name,
            operation,
            format!("{} not found: {}", kind, id),
        )
    }
}

#[async_trait]
impl StorageDriver for MemoryDriver {
    fn name(&self) -> &str {
        &self.config.provider_name
    }

    async fn discover_block_devices(&self) -> Result<Vec<BlockDevice>> {
        let state = self.state.read().await;

        Ok(state
            .volumes
            .values()
            .flat_map(|v| v.attachments.iter())
            .filter(|a| a.instance_id == self.config.instance_id)
            .map(|a| BlockDevice {
                provider_name: self.config.provider_name.clone(),
                instance_id: a.instance_id.clone(),
                volume_id: a.volume_id.clone(),
                device_name: a.device_name.clone(),
                region: self.config.region.clone(),
                status: a.status.clone(),
                network_name: String::new(),
            })
            .collect())
    }

    async fn describe_instance(&self) -> Result<Instance> {
        Ok(Instance {
            provider_name: self.config.provider_name.clone(),
            instance_id: self.config.instance_id.clone(),
            region: self.config.region.clone(),
            name: self.config.instance_id.clone(),
        })
    }

    async fn list_volumes(&self, volume_id: Option<&str>) -> Result<Vec<Volume>> {
        let state = self.state.read().await;

        Ok(match volume_id {
            Some(id) => state.volumes.get(id).cloned().into_iter().collect(),
            None => state.volumes.values().cloned().collect(),
        })
    }

    async fn list_snapshots(
        &self,
        volume_id: Option<&str>,
        snapshot_id: Option<&str>,
    ) -> Result<Vec<Snapshot>> {
        let state = self.state.read().await;

        Ok(state
            .snapshots
            .values()
            .filter(|s| volume_id.map_or(true, |id| s.volume_id == id))
            .filter(|s| snapshot_id.map_or(true, |id| s.snapshot_id == id))
            .cloned()
            .collect())
    }

    async fn create_snapshot(
        &self,
        run_async: bool,
        volume_id: &str,
        description: &str,
    ) -> Result<Vec<Snapshot>> {
        let mut state = self.state.write().await;

        let volume = state
            .volumes
            .get(volume_id)
            .ok_or_else(|| self.not_found("create_snapshot", "volume", volume_id))?;

        let snapshot = Snapshot {
            name: volume.name.clone(),
            volume_id: volume_id.to_string(),
            snapshot_id: self.generate_id("snap"),
            volume_size_gb: volume.size_gb,
            start_time: Some(Utc::now()),
            description: description.to_string(),
            status: if run_async { "pending" } else { "completed" }.to_string(),
        };

        info!(
            "Created snapshot {} of volume {} (async: {})",
            snapshot.snapshot_id, volume_id, run_async
        );

        state
            .snapshots
            .insert(snapshot.snapshot_id.clone(), snapshot.clone());

        Ok(vec![snapshot])
    }

    async fn remove_snapshot(&self, snapshot_id: &str) -> Result<()> {
        let mut state = self.state.write().await;

        if state.snapshots.remove(snapshot_id).is_some() {
            info!("Removed snapshot {}", snapshot_id);
            Ok(())
        } else {
            Err(self.not_found("remove_snapshot", "snapshot", snapshot_id))
        }
    }

    async fn create_volume(&self, run_async: bool, request: &NewVolume) -> Result<Volume> {
        let mut state = self.state.write().await;

        let mut size_gb = request.size_gb;
        if let Some(snapshot_id) = request.snapshot_id.as_deref().filter(|id| !id.is_empty()) {
            let snapshot = state
                .snapshots
                .get(snapshot_id)
                .ok_or_else(|| self.not_found("create_volume", "snapshot", snapshot_id))?;
            // A restored volume can grow but never shrink below its source
            size_gb = size_gb.max(snapshot.volume_size_gb);
        }

        if size_gb <= 0 {
            return Err(Error::backend(
                &self.config.provider_name,
                "create_volume",
                format!("invalid volume size: {} GB", size_gb),
            ));
        }

        let volume_id = self.generate_id("vol");
        let volume_type = if request.volume_type.is_empty() {
            DEFAULT_VOLUME_TYPE.to_string()
        } else {
            request.volume_type.clone()
        };

        let volume = Volume {
            name: volume_id.clone(),
            volume_id: volume_id.clone(),
            availability_zone: self.config.availability_zone.clone(),
            status: if run_async { "creating" } else { "available" }.to_string(),
            volume_type,
            iops: request.iops,
            size_gb,
            network_name: String::new(),
            attachments: Vec::new(),
        };

        info!(
            "Created volume {} ({} GB, type: {}, async: {})",
            volume_id, size_gb, volume.volume_type, run_async
        );

        state.volumes.insert(volume_id, volume.clone());

        Ok(volume)
    }

    async fn remove_volume(&self, volume_id: &str) -> Result<()> {
        let mut state = self.state.write().await;

        let volume = state
            .volumes
            .get(volume_id)
            .ok_or_else(|| self.not_found("remove_volume", "volume", volume_id))?;

        if !volume.attachments.is_empty() {
            return Err(Error::backend(
                &self.config.provider_name,
                "remove_volume",
                format!("volume {} is attached", volume_id),
            ));
        }

        state.volumes.remove(volume_id);
        info!("Removed volume {}", volume_id);

        Ok(())
    }

    async fn attach_volume(
        &self,
        run_async: bool,
        volume_id: &str,
        instance_id: Option<&str>,
    ) -> Result<Vec<VolumeAttachment>> {
        let instance_id = instance_id.unwrap_or(&self.config.instance_id);
        let mut state = self.state.write().await;

        let device_name = state.next_device_name(instance_id).ok_or_else(|| {
            Error::backend(
                &self.config.provider_name,
                "attach_volume",
                format!("no free device names on instance {}", instance_id),
            )
        })?;

        let volume = state
            .volumes
            .get_mut(volume_id)
            .ok_or_else(|| self.not_found("attach_volume", "volume", volume_id))?;

        if let Some(existing) = volume.attachments.first() {
            return Err(Error::backend(
                &self.config.provider_name,
                "attach_volume",
                format!(
                    "volume {} already attached to {}",
                    volume_id, existing.instance_id
                ),
            ));
        }

        let attachment = VolumeAttachment {
            volume_id: volume_id.to_string(),
            instance_id: instance_id.to_string(),
            device_name,
            status: if run_async { "attaching" } else { "attached" }.to_string(),
        };

        volume.status = "in-use".to_string();
        volume.attachments.push(attachment.clone());

        info!(
            "Attached volume {} to {} as {}",
            volume_id, instance_id, attachment.device_name
        );

        Ok(vec![attachment])
    }

    async fn detach_volume(
        &self,
        run_async: bool,
        volume_id: &str,
        instance_id: Option<&str>,
    ) -> Result<()> {
        let mut state = self.state.write().await;

        let volume = state
            .volumes
            .get_mut(volume_id)
            .ok_or_else(|| self.not_found("detach_volume", "volume", volume_id))?;

        let position = volume
            .attachments
            .iter()
            .position(|a| instance_id.map_or(true, |id| a.instance_id == id))
            .ok_or_else(|| {
                Error::backend(
                    &self.config.provider_name,
                    "detach_volume",
                    format!("volume {} is not attached", volume_id),
                )
            })?;

        let attachment = volume.attachments.remove(position);
        if volume.attachments.is_empty() {
            volume.status = "available".to_string();
        }

        debug!(
            "Detached volume {} from {} (async: {})",
            volume_id, attachment.instance_id, run_async
        );

        Ok(())
    }
}
