//! Control Plane Module
//!
//! Builds the driver registry and dispatches volume, snapshot and instance
//! operations across the registered storage drivers.

pub mod dispatcher;
pub mod drivers;
pub mod registry;

pub use dispatcher::*;
pub use drivers::*;
pub use registry::*;
