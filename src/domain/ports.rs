//! Domain Ports - Storage driver capability contract
//!
//! Defines the value types returned by storage backends and the
//! [`StorageDriver`] trait every backend implements. The dispatcher only
//! relays these values; it never merges or mutates entities coming from
//! different drivers.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// =============================================================================
// Discovery Types
// =============================================================================

/// A host-visible raw block device discovered by introspection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDevice {
    /// Driver that reported the device
    pub provider_name: String,
    /// Instance the device is attached to
    pub instance_id: String,
    /// Backing volume, if the backend knows it
    pub volume_id: String,
    /// Device path (e.g., /dev/xvdf)
    pub device_name: String,
    pub region: String,
    pub status: String,
    pub network_name: String,
}

/// Identity of the compute host as seen by one backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub provider_name: String,
    pub instance_id: String,
    pub region: String,
    pub name: String,
}

// =============================================================================
// Volume Types
// =============================================================================

/// Relation between a volume and an instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeAttachment {
    pub volume_id: String,
    pub instance_id: String,
    /// Device path on the instance
    pub device_name: String,
    pub status: String,
}

/// A backend-managed block storage volume
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub name: String,
    pub volume_id: String,
    pub availability_zone: String,
    pub status: String,
    /// Provisioning / performance class
    pub volume_type: String,
    pub iops: i64,
    pub size_gb: i64,
    pub network_name: String,
    pub attachments: Vec<VolumeAttachment>,
}

/// A point-in-time copy of a volume
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub name: String,
    /// Source volume
    pub volume_id: String,
    pub snapshot_id: String,
    pub volume_size_gb: i64,
    pub start_time: Option<DateTime<Utc>>,
    pub description: String,
    pub status: String,
}

/// Parameters for creating a volume
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVolume {
    /// Snapshot to restore from; `None` creates an empty volume
    pub snapshot_id: Option<String>,
    pub volume_type: String,
    pub iops: i64,
    pub size_gb: i64,
}

// =============================================================================
// Storage Driver Port
// =============================================================================

/// Capability contract implemented by every storage backend.
///
/// `run_async` is passed through untouched: `true` asks the backend to
/// return once the request is accepted, `false` once it has reached its
/// terminal state.
#[async_trait]
pub trait StorageDriver: Send + Sync {
    /// Registry name of this driver
    fn name(&self) -> &str;

    /// Discover block devices visible to the host
    async fn discover_block_devices(&self) -> Result<Vec<BlockDevice>>;

    /// Describe the instance this process runs on
    async fn describe_instance(&self) -> Result<Instance>;

    /// List volumes; `None` lists every volume visible to this backend
    async fn list_volumes(&self, volume_id: Option<&str>) -> Result<Vec<Volume>>;

    /// List snapshots, optionally filtered by source volume and snapshot id
    async fn list_snapshots(
        &self,
        volume_id: Option<&str>,
        snapshot_id: Option<&str>,
    ) -> Result<Vec<Snapshot>>;

    async fn create_snapshot(
        &self,
        run_async: bool,
        volume_id: &str,
        description: &str,
    ) -> Result<Vec<Snapshot>>;

    async fn remove_snapshot(&self, snapshot_id: &str) -> Result<()>;

    async fn create_volume(&self, run_async: bool, request: &NewVolume) -> Result<Volume>;

    async fn remove_volume(&self, volume_id: &str) -> Result<()>;

    async fn attach_volume(
        &self,
        run_async: bool,
        volume_id: &str,
        instance_id: Option<&str>,
    ) -> Result<Vec<VolumeAttachment>>;

    async fn detach_volume(
        &self,
        run_async: bool,
        volume_id: &str,
        instance_id: Option<&str>,
    ) -> Result<()>;
}

pub type StorageDriverRef = Arc<dyn StorageDriver>;
