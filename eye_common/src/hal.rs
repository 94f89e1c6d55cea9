//! Hardware abstraction layer: capability traits and configuration.
//!
//! This module contains the driver-facing contracts of the scanner
//! (elevation axis, rotation axis, ranging sensor) and their parameters.

pub mod config;
pub mod driver;
