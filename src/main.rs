//! Volume Dispatcher
//!
//! Process entry point: builds the driver registry once from configuration,
//! runs discovery across every active driver and prints the inventory.

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use volume_dispatcher::{
    BlockDevice, Dispatcher, DriverConfig, DriverRegistry, Error, Instance, MemoryDriverConfig,
    RegistryConfig, Snapshot, SysfsDriverConfig, Volume,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Volume Dispatcher - one storage API over many drivers
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Comma-separated storage drivers to activate
    #[arg(long, env = "VOLUME_DISPATCHER_DRIVERS", default_value = "memory")]
    drivers: String,

    /// Path to sysfs for the sysfs driver
    #[arg(long, env = "VOLUME_DISPATCHER_SYSFS_PATH", default_value = "/sys")]
    sysfs_path: PathBuf,

    /// Provider name reported by the memory driver
    #[arg(long, env = "VOLUME_DISPATCHER_PROVIDER_NAME", default_value = "memory")]
    provider_name: String,

    /// Instance id reported by the memory driver
    #[arg(long, env = "VOLUME_DISPATCHER_INSTANCE_ID")]
    instance_id: Option<String>,

    /// Region reported by the memory driver
    #[arg(long, env = "VOLUME_DISPATCHER_REGION")]
    region: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,

    /// Force debug logging
    #[arg(long, env = "VOLUME_DISPATCHER_DEBUG")]
    debug: bool,
}

impl Args {
    fn registry_config(&self) -> RegistryConfig {
        let defaults = MemoryDriverConfig::default();
        let memory = MemoryDriverConfig {
            provider_name: self.provider_name.clone(),
            instance_id: self.instance_id.clone().unwrap_or(defaults.instance_id),
            region: self.region.clone().unwrap_or(defaults.region),
            availability_zone: defaults.availability_zone,
        };
        let sysfs = SysfsDriverConfig {
            sysfs_path: self.sysfs_path.clone(),
            ..Default::default()
        };

        RegistryConfig::from_driver_list(&self.drivers, DriverConfig { memory, sysfs })
    }
}

/// Everything discovery reports, across all drivers
#[derive(Debug, Serialize)]
struct Inventory {
    drivers: Vec<String>,
    instances: Vec<Instance>,
    block_devices: Vec<BlockDevice>,
    volumes: Vec<Volume>,
    snapshots: Vec<Snapshot>,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(&args);

    info!("Starting Volume Dispatcher");
    info!("  Version: {}", volume_dispatcher::VERSION);
    info!("  Drivers: {}", args.drivers);

    let registry = match DriverRegistry::new(&args.registry_config()) {
        Ok(registry) => Arc::new(registry),
        Err(Error::NoDriversInitialized) => {
            error!("No drivers initialized from '{}'", args.drivers);
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("failed to build driver registry"),
    };

    let dispatcher = Dispatcher::new(registry);
    info!("Active drivers: {:?}", dispatcher.driver_names());

    let inventory = Inventory {
        drivers: dispatcher
            .driver_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
        instances: dispatcher.describe_instances().await?,
        block_devices: dispatcher.discover_block_devices().await?,
        volumes: dispatcher.list_volumes(None).await?,
        snapshots: dispatcher.list_snapshots(None, None).await?,
    };

    println!("{}", serde_json::to_string_pretty(&inventory)?);

    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = if args.debug {
        Level::DEBUG
    } else {
        match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // Logs go to stderr so stdout carries only the inventory
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
