//! Spatial Eye Common Library
//!
//! This crate provides the shared vocabulary of the Spatial Eye workspace:
//! scan data types, the hardware capability traits implemented by drivers,
//! and TOML configuration loading.
//!
//! # Module Structure
//!
//! - [`scan`] - Points, scan state and progress snapshots
//! - [`hal`] - Capability traits, driver errors and hardware configuration
//! - [`config`] - Configuration loading traits and the scanner config tree
//! - [`consts`] - Defaults taken from the reference hardware
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use eye_common::prelude::*;
//!
//! let config = ScannerConfig::default();
//! assert!(config.validate().is_ok());
//! ```

pub mod config;
pub mod consts;
pub mod hal;
pub mod prelude;
pub mod scan;
