//! Prelude module for common re-exports.
//!
//! This module provides convenient re-exports of commonly used types
//! so that consumers can do `use eye_common::prelude::*;` and get
//! the most important types without listing individual paths.
//!
//! # Usage
//!
//! ```rust
//! use eye_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    BatchConfig, ConfigError, ConfigLoader, ScanConfig, ScannerConfig, SharedConfig, StoreConfig,
};
pub use crate::hal::config::HardwareConfig;

// ─── Capabilities ───────────────────────────────────────────────────
pub use crate::hal::driver::{
    DriverFactory, DriverSet, ElevationAxis, HalError, RangingSensor, RotationAxis,
};

// ─── Scan data ──────────────────────────────────────────────────────
pub use crate::scan::{Bounds, Point, Sample, ScanProgress, ScanState};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{FULL_CIRCLE_DEG, SCANNER_SERVICE_NAME};
