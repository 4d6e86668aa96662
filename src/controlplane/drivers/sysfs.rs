//! Host Introspection Driver
//!
//! Enumerates block devices from sysfs and identifies the instance by
//! hostname. This driver owns no volumes or snapshots; it exists so that
//! discovery can include raw local devices alongside cloud backends.

use crate::domain::ports::{
    BlockDevice, Instance, NewVolume, Snapshot, StorageDriver, Volume, VolumeAttachment,
};
use crate::error::{DiscoveryKind, Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

pub const SYSFS_DRIVER_NAME: &str = "sysfs";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the sysfs driver
#[derive(Debug, Clone)]
pub struct SysfsDriverConfig {
    /// Path to sysfs (overridable for testing)
    pub sysfs_path: PathBuf,
    /// File holding the hostname
    pub hostname_path: PathBuf,
    pub include_loopback: bool,
    pub include_ram: bool,
    pub include_dm: bool,
}

impl Default for SysfsDriverConfig {
    fn default() -> Self {
        Self {
            sysfs_path: PathBuf::from("/sys"),
            hostname_path: PathBuf::from("/proc/sys/kernel/hostname"),
            include_loopback: false,
            include_ram: false,
            include_dm: false,
        }
    }
}

// =============================================================================
// Sysfs Driver
// =============================================================================

pub struct SysfsDriver {
    config: SysfsDriverConfig,
}

impl SysfsDriver {
    pub fn new(config: SysfsDriverConfig) -> Self {
        Self { config }
    }

    fn should_include_device(&self, name: &str) -> bool {
        if !self.config.include_loopback && name.starts_with("loop") {
            return false;
        }
        if !self.config.include_ram && name.starts_with("ram") {
            return false;
        }
        if !self.config.include_dm && name.starts_with("dm-") {
            return false;
        }
        !name.starts_with("zram")
    }

    async fn hostname(&self) -> Option<String> {
        if let Ok(hostname) = fs::read_to_string(&self.config.hostname_path).await {
            let hostname = hostname.trim();
            if !hostname.is_empty() {
                return Some(hostname.to_string());
            }
        }

        std::env::var("HOSTNAME")
            .ok()
            .filter(|h| !h.trim().is_empty())
    }

    async fn read_attr(base_path: &Path, attr: &str) -> Option<String> {
        fs::read_to_string(base_path.join(attr))
            .await
            .ok()
            .map(|s| s.trim().to_string())
    }

    fn unsupported(&self, operation: &str) -> Error {
        Error::backend(SYSFS_DRIVER_NAME, operation, "operation not supported")
    }
}

#[async_trait]
impl StorageDriver for SysfsDriver {
    fn name(&self) -> &str {
        SYSFS_DRIVER_NAME
    }

    async fn discover_block_devices(&self) -> Result<Vec<BlockDevice>> {
        let block_path = self.config.sysfs_path.join("class/block");
        let discovery_error = |e: std::io::Error| {
            Error::discovery(
                DiscoveryKind::BlockDevice,
                SYSFS_DRIVER_NAME,
                format!("failed to read {}: {}", block_path.display(), e),
            )
        };

        let mut entries = fs::read_dir(&block_path).await.map_err(discovery_error)?;
        let instance_id = self.hostname().await.unwrap_or_default();
        let mut devices = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(discovery_error)? {
            let name = entry.file_name().to_string_lossy().to_string();
            let path = entry.path();

            if !self.should_include_device(&name) {
                continue;
            }

            // Partitions carry a "partition" attribute
            if fs::metadata(path.join("partition")).await.is_ok() {
                continue;
            }

            let status = Self::read_attr(&path, "device/state")
                .await
                .unwrap_or_else(|| "unknown".to_string());

            devices.push(BlockDevice {
                provider_name: SYSFS_DRIVER_NAME.to_string(),
                instance_id: instance_id.clone(),
                volume_id: String::new(),
                device_name: format!("/dev/{}", name),
                region: String::new(),
                status,
                network_name: String::new(),
            });
        }

        devices.sort_by(|a, b| a.device_name.cmp(&b.device_name));
        debug!("Found {} block devices under {:?}", devices.len(), block_path);

        Ok(devices)
    }

    async fn describe_instance(&self) -> Result<Instance> {
        let hostname = self.hostname().await.ok_or_else(|| {
            Error::discovery(
                DiscoveryKind::Instance,
                SYSFS_DRIVER_NAME,
                "unable to determine hostname",
            )
        })?;

        Ok(Instance {
            provider_name: SYSFS_DRIVER_NAME.to_string(),
            instance_id: hostname.clone(),
            region: String::new(),
            name: hostname,
        })
    }

    async fn list_volumes(&self, _volume_id: Option<&str>) -> Result<Vec<Volume>> {
        Ok(Vec::new())
    }

    async fn list_snapshots(
        &self,
        _volume_id: Option<&str>,
        _snapshot_id: Option<&str>,
    ) -> Result<Vec<Snapshot>> {
        Ok(Vec::new())
    }

    async fn create_snapshot(
        &self,
        _run_async: bool,
        _volume_id: &str,
        _description: &str,
    ) -> Result<Vec<Snapshot>> {
        Err(self.unsupported("create_snapshot"))
    }

    async fn remove_snapshot(&self, _snapshot_id: &str) -> Result<()> {
        Err(self.unsupported("remove_snapshot"))
    }

    async fn create_volume(&self, _run_async: bool, _request: &NewVolume) -> Result<Volume> {
        Err(self.unsupported("create_volume"))
    }

    async fn remove_volume(&self, _volume_id: &str) -> Result<()> {
        Err(self.unsupported("remove_volume"))
    }

    async fn attach_volume(
        &self,
        _run_async: bool,
        _volume_id: &str,
        _instance_id: Option<&str>,
    ) -> Result<Vec<VolumeAttachment>> {
        Err(self.unsupported("attach_volume"))
    }

    async fn detach_volume(
        &self,
        _run_async: bool,
        _volume_id: &str,
        _instance_id: Option<&str>,
    ) -> Result<()> {
        Err(self.unsupported("detach_volume"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::fs as stdfs;
    use tempfile::TempDir;

    fn fake_sysfs(devices: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        let block = dir.path().join("class/block");
        for name in devices {
            stdfs::create_dir_all(block.join(name).join("device")).unwrap();
        }
        stdfs::write(dir.path().join("hostname"), "node-a\n").unwrap();
        dir
    }

    fn config_for(dir: &TempDir) -> SysfsDriverConfig {
        SysfsDriverConfig {
            sysfs_path: dir.path().to_path_buf(),
            hostname_path: dir.path().join("hostname"),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_discover_skips_virtual_devices_and_partitions() {
        let dir = fake_sysfs(&["sdb", "sda", "sda1", "loop0", "ram0", "dm-0", "nvme0n1"]);
        stdfs::write(dir.path().join("class/block/sda1/partition"), "1\n").unwrap();
        stdfs::write(dir.path().join("class/block/sda/device/state"), "running\n").unwrap();

        let driver = SysfsDriver::new(config_for(&dir));
        let devices = driver.discover_block_devices().await.unwrap();

        let names: Vec<&str> = devices.iter().map(|d| d.device_name.as_str()).collect();
        assert_eq!(names, vec!["/dev/nvme0n1", "/dev/sda", "/dev/sdb"]);
        assert_eq!(devices[1].status, "running");
        assert_eq!(devices[2].status, "unknown");
        assert!(devices.iter().all(|d| d.instance_id == "node-a"));
    }

    #[tokio::test]
    async fn test_discover_without_sysfs_is_discovery_error() {
        let dir = TempDir::new().unwrap();
        let driver = SysfsDriver::new(config_for(&dir));

        let err = driver.discover_block_devices().await.unwrap_err();
        assert_matches!(
            err,
            Error::Discovery {
                kind: DiscoveryKind::BlockDevice,
                ..
            }
        );
    }

    #[tokio::test]
    async fn test_describe_instance_uses_hostname() {
        let dir = fake_sysfs(&[]);
        let driver = SysfsDriver::new(config_for(&dir));

        let instance = driver.describe_instance().await.unwrap();
        assert_eq!(instance.instance_id, "node-a");
        assert_eq!(instance.provider_name, SYSFS_DRIVER_NAME);
    }

    #[tokio::test]
    async fn test_mutations_are_unsupported() {
        let dir = fake_sysfs(&[]);
        let driver = SysfsDriver::new(config_for(&dir));

        let err = driver.remove_volume("vol-1").await.unwrap_err();
        assert_matches!(err, Error::Backend { operation, .. } if operation == "remove_volume");
        assert!(driver.list_volumes(None).await.unwrap().is_empty());
    }
}
