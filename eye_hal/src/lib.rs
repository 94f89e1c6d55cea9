//! # Spatial Eye HAL Library
//!
//! Hardware Abstraction Layer with pluggable driver architecture.
//!
//! Drivers implement the capability traits defined in
//! `eye_common::hal::driver` and are made available by name through a
//! [`DriverRegistry`].
//!
//! # Module Structure
//!
//! - [`driver_registry`] - Driver factory registration
//! - [`drivers`] - HAL driver implementations
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     eye_hal (single crate)                   │
//! │  ┌──────────────────┐         ┌───────────────────────────┐  │
//! │  │  DriverRegistry  │────────►│  DriverFactory            │  │
//! │  │  (name → fn)     │         │  fn(&HardwareConfig)      │  │
//! │  └──────────────────┘         └─────────────┬─────────────┘  │
//! │                                             │                │
//! │                                             ▼                │
//! │              ┌───────────────┬──────────────┬──────────────┐ │
//! │              │ ElevationAxis │ RotationAxis │ RangingSensor│ │
//! │              └───────────────┴──────────────┴──────────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod driver_registry;
pub mod drivers;

// Re-export key types for convenience
pub use crate::driver_registry::DriverRegistry;
pub use crate::drivers::register_all_drivers;
