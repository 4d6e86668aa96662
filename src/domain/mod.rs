//! Domain layer - Storage entities and the driver port
//!
//! This module defines the trait (port) that storage backends implement,
//! following hexagonal architecture principles.

pub mod ports;

pub use ports::*;
