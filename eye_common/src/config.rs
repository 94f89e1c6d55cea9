//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load TOML configuration files
//! and defines the scanner configuration tree.
//!
//! # Usage
//!
//! ```rust,no_run
//! use eye_common::config::{load_scanner_config, ConfigError};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = load_scanner_config(Path::new("scanner.toml"))?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```
//!
//! # TOML Layout
//!
//! ```toml
//! [shared]
//! log_level = "debug"
//! service_name = "eye-scanner-lab"
//!
//! [scan]
//! elevation_start = 0.0
//! elevation_end = 180.0
//! elevation_step = 1.0
//! azimuth_increment = 1.0
//! cycles = 90
//!
//! [store]
//! capacity = 100000
//!
//! [batch]
//! size = 10
//! interval_ms = 100
//!
//! [hardware.tof]
//! max_range_mm = 4000.0
//! ```
//!
//! Every section and field is optional; omitted values fall back to the
//! reference hardware defaults in [`crate::consts`].

use crate::consts::{
    AZIMUTH_INCREMENT_DEG, BATCH_INTERVAL_MS, BATCH_SIZE, ELEVATION_END_DEG,
    ELEVATION_START_DEG, ELEVATION_STEP_DEG, END_DWELL_MS, EVICTION_FRACTION, EVICTION_MIN_BLOCK,
    FULL_CIRCLE_DEG, JOIN_TIMEOUT_MS, POLL_INTERVAL_MS, PROGRESS_INTERVAL_DEG,
    SCANNER_SERVICE_NAME, SETTLE_TIME_MS, STORE_CAPACITY,
};
use crate::hal::config::HardwareConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Error type for configuration loading operations.
///
/// This enum represents all possible errors that can occur when loading
/// configuration files.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Represents the verbosity level of logging output.
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Filter directive understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common configuration fields shared by every Spatial Eye binary.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "eye-scanner-01"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

fn default_service_name() -> String {
    SCANNER_SERVICE_NAME.to_string()
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: default_service_name(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - `service_name` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// ─── Scan ───────────────────────────────────────────────────────────

fn default_elevation_start() -> f64 {
    ELEVATION_START_DEG
}
fn default_elevation_end() -> f64 {
    ELEVATION_END_DEG
}
fn default_elevation_step() -> f64 {
    ELEVATION_STEP_DEG
}
fn default_azimuth_increment() -> f64 {
    AZIMUTH_INCREMENT_DEG
}
fn default_settle_time_ms() -> u64 {
    SETTLE_TIME_MS
}
fn default_end_dwell_ms() -> u64 {
    END_DWELL_MS
}
fn default_progress_interval() -> f64 {
    PROGRESS_INTERVAL_DEG
}
fn default_poll_interval_ms() -> u64 {
    POLL_INTERVAL_MS
}
fn default_join_timeout_ms() -> u64 {
    JOIN_TIMEOUT_MS
}

/// Sweep pattern and worker timing (`[scan]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanConfig {
    /// First elevation angle of a forward leg, in degrees from +Z.
    #[serde(default = "default_elevation_start")]
    pub elevation_start: f64,

    /// Last elevation angle of a forward leg.
    #[serde(default = "default_elevation_end")]
    pub elevation_end: f64,

    /// Elevation step between two samples.
    #[serde(default = "default_elevation_step")]
    pub elevation_step: f64,

    /// Azimuth rotation applied after each cycle.
    #[serde(default = "default_azimuth_increment")]
    pub azimuth_increment: f64,

    /// Cycle limit. Defaults to one full azimuth revolution.
    #[serde(default)]
    pub cycles: Option<u32>,

    /// Settle time between an elevation move and the ranging read.
    #[serde(default = "default_settle_time_ms")]
    pub settle_time_ms: u64,

    /// Dwell at the end of each sweep leg.
    #[serde(default = "default_end_dwell_ms")]
    pub end_dwell_ms: u64,

    /// Elevation movement between two progress snapshots.
    #[serde(default = "default_progress_interval")]
    pub progress_interval_deg: f64,

    /// Slice length of every interruptible wait (pause, settle, dwell).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Bounded wait for the worker to exit on reset/close.
    #[serde(default = "default_join_timeout_ms")]
    pub join_timeout_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            elevation_start: ELEVATION_START_DEG,
            elevation_end: ELEVATION_END_DEG,
            elevation_step: ELEVATION_STEP_DEG,
            azimuth_increment: AZIMUTH_INCREMENT_DEG,
            cycles: None,
            settle_time_ms: SETTLE_TIME_MS,
            end_dwell_ms: END_DWELL_MS,
            progress_interval_deg: PROGRESS_INTERVAL_DEG,
            poll_interval_ms: POLL_INTERVAL_MS,
            join_timeout_ms: JOIN_TIMEOUT_MS,
        }
    }
}

impl ScanConfig {
    /// Number of cycles a complete scan performs.
    ///
    /// One full revolution worth of azimuth increments, capped by the
    /// explicit `cycles` limit when set.
    pub fn total_cycles(&self) -> u32 {
        let revolution = if self.azimuth_increment > 0.0 {
            (FULL_CIRCLE_DEG / self.azimuth_increment).ceil() as u32
        } else {
            0
        };
        match self.cycles {
            Some(cycles) if revolution > 0 => cycles.min(revolution),
            Some(cycles) => cycles,
            None => revolution,
        }
    }

    /// Settle time as Duration.
    pub fn settle_time(&self) -> Duration {
        Duration::from_millis(self.settle_time_ms)
    }

    /// End dwell as Duration.
    pub fn end_dwell(&self) -> Duration {
        Duration::from_millis(self.end_dwell_ms)
    }

    /// Poll interval as Duration (never zero).
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Join timeout as Duration.
    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }

    /// Validate the sweep definition.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.elevation_start.is_finite() || !self.elevation_end.is_finite() {
            return Err(ConfigError::ValidationError(
                "scan.elevation_start/elevation_end must be finite".to_string(),
            ));
        }
        if self.elevation_start > self.elevation_end {
            return Err(ConfigError::ValidationError(format!(
                "scan.elevation_start ({}) must not exceed scan.elevation_end ({})",
                self.elevation_start, self.elevation_end
            )));
        }
        if !(self.elevation_step > 0.0) {
            return Err(ConfigError::ValidationError(
                "scan.elevation_step must be greater than 0".to_string(),
            ));
        }
        if !(self.azimuth_increment > 0.0) || self.azimuth_increment > FULL_CIRCLE_DEG {
            return Err(ConfigError::ValidationError(format!(
                "scan.azimuth_increment must be in (0, {FULL_CIRCLE_DEG}]"
            )));
        }
        if self.cycles == Some(0) {
            return Err(ConfigError::ValidationError(
                "scan.cycles must be greater than 0 when set".to_string(),
            ));
        }
        if !(self.progress_interval_deg > 0.0) {
            return Err(ConfigError::ValidationError(
                "scan.progress_interval_deg must be greater than 0".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "scan.poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

// ─── Store ──────────────────────────────────────────────────────────

fn default_capacity() -> usize {
    STORE_CAPACITY
}
fn default_eviction_fraction() -> f64 {
    EVICTION_FRACTION
}
fn default_eviction_min_block() -> usize {
    EVICTION_MIN_BLOCK
}

/// Point store sizing (`[store]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Maximum number of points held.
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Share of the capacity evicted at once when the store is full.
    #[serde(default = "default_eviction_fraction")]
    pub eviction_fraction: f64,

    /// Lower bound of the eviction block.
    #[serde(default = "default_eviction_min_block")]
    pub eviction_min_block: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity: STORE_CAPACITY,
            eviction_fraction: EVICTION_FRACTION,
            eviction_min_block: EVICTION_MIN_BLOCK,
        }
    }
}

impl StoreConfig {
    /// Number of oldest points dropped when the store is full.
    ///
    /// `max(ceil(capacity * eviction_fraction), eviction_min_block)`,
    /// clamped to `[1, capacity]`.
    pub fn eviction_block(&self) -> usize {
        let share = (self.capacity as f64 * self.eviction_fraction).ceil() as usize;
        share
            .max(self.eviction_min_block)
            .min(self.capacity)
            .max(1)
    }

    /// Validate store sizing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ValidationError(
                "store.capacity must be greater than 0".to_string(),
            ));
        }
        if !(self.eviction_fraction > 0.0 && self.eviction_fraction <= 1.0) {
            return Err(ConfigError::ValidationError(format!(
                "store.eviction_fraction must be in (0, 1], got {}",
                self.eviction_fraction
            )));
        }
        Ok(())
    }
}

// ─── Batch ──────────────────────────────────────────────────────────

fn default_batch_size() -> usize {
    BATCH_SIZE
}
fn default_batch_interval_ms() -> u64 {
    BATCH_INTERVAL_MS
}

/// Point batch release policy (`[batch]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchConfig {
    /// Release once this many points are pending.
    #[serde(default = "default_batch_size")]
    pub size: usize,

    /// Release once the oldest pending point is this old.
    #[serde(default = "default_batch_interval_ms")]
    pub interval_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            size: BATCH_SIZE,
            interval_ms: BATCH_INTERVAL_MS,
        }
    }
}

impl BatchConfig {
    /// Batch interval as Duration.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Validate batch policy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size == 0 {
            return Err(ConfigError::ValidationError(
                "batch.size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

// ─── Root ───────────────────────────────────────────────────────────

/// Complete scanner configuration (one TOML file).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScannerConfig {
    /// Logging and identity.
    #[serde(default)]
    pub shared: SharedConfig,

    /// Sweep pattern and worker timing.
    #[serde(default)]
    pub scan: ScanConfig,

    /// Point store sizing.
    #[serde(default)]
    pub store: StoreConfig,

    /// Point batching.
    #[serde(default)]
    pub batch: BatchConfig,

    /// Hardware capability parameters.
    #[serde(default)]
    pub hardware: HardwareConfig,
}

impl ScannerConfig {
    /// Validate every section plus cross-section rules.
    ///
    /// # Validation Rules
    /// 1. Each section validates on its own
    /// 2. The elevation sweep lies within the servo's mechanical range
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.scan.validate()?;
        self.store.validate()?;
        self.batch.validate()?;
        self.hardware
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        let servo = &self.hardware.servo;
        if self.scan.elevation_start < servo.min_angle || self.scan.elevation_end > servo.max_angle
        {
            return Err(ConfigError::ValidationError(format!(
                "elevation sweep [{}, {}] exceeds servo range [{}, {}]",
                self.scan.elevation_start,
                self.scan.elevation_end,
                servo.min_angle,
                servo.max_angle
            )));
        }
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// This trait provides a default implementation that works with any type
/// implementing `serde::de::DeserializeOwned`.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the TOML configuration file
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

/// Load and validate a scanner configuration file.
pub fn load_scanner_config(path: &Path) -> Result<ScannerConfig, ConfigError> {
    let config = ScannerConfig::load(path)?;
    config.validate()?;
    tracing::debug!(
        "Loaded scanner config from {}: {} cycles, capacity {}",
        path.display(),
        config.scan.total_cycles(),
        config.store.capacity
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_log_level_default() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn test_log_level_deserialization() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct TestWrapper {
            level: LogLevel,
        }

        for (raw, expected) in [
            ("trace", LogLevel::Trace),
            ("debug", LogLevel::Debug),
            ("info", LogLevel::Info),
            ("warn", LogLevel::Warn),
            ("error", LogLevel::Error),
        ] {
            let parsed: TestWrapper = toml::from_str(&format!("level = \"{raw}\"")).unwrap();
            assert_eq!(parsed.level, expected);
            assert_eq!(expected.as_directive(), raw);
        }
    }

    #[test]
    fn test_shared_config_validation_empty_service_name() {
        let config = SharedConfig {
            log_level: LogLevel::Info,
            service_name: "".to_string(),
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = ScannerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scan.total_cycles(), 360);
        assert_eq!(config.store.eviction_block(), 1000);
    }

    #[test]
    fn test_total_cycles_rounds_up_partial_increment() {
        let scan = ScanConfig {
            azimuth_increment: 7.0,
            ..Default::default()
        };
        assert_eq!(scan.total_cycles(), 52);

        let scan = ScanConfig {
            cycles: Some(2),
            ..Default::default()
        };
        assert_eq!(scan.total_cycles(), 2);

        let scan = ScanConfig {
            azimuth_increment: 90.0,
            cycles: Some(10),
            ..Default::default()
        };
        assert_eq!(scan.total_cycles(), 4);
    }

    #[test]
    fn test_eviction_block_clamped_to_capacity() {
        let store = StoreConfig {
            capacity: 5,
            ..Default::default()
        };
        assert_eq!(store.eviction_block(), 5);

        let store = StoreConfig {
            capacity: 1_000_000,
            ..Default::default()
        };
        assert_eq!(store.eviction_block(), 10_000);

        let store = StoreConfig {
            capacity: 50,
            eviction_fraction: 0.1,
            eviction_min_block: 1,
        };
        assert_eq!(store.eviction_block(), 5);
    }

    #[test]
    fn test_scan_validation_rejects_inverted_range() {
        let scan = ScanConfig {
            elevation_start: 90.0,
            elevation_end: 10.0,
            ..Default::default()
        };
        assert!(matches!(
            scan.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_scan_validation_rejects_zero_step() {
        let scan = ScanConfig {
            elevation_step: 0.0,
            ..Default::default()
        };
        assert!(scan.validate().is_err());
    }

    #[test]
    fn test_config_loader_file_not_found() {
        let result = ScannerConfig::load(Path::new("/nonexistent/path/scanner.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound)));
    }

    #[test]
    fn test_config_loader_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "invalid toml {{{{").unwrap();

        let result = ScannerConfig::load(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[shared]
log_level = "debug"

[scan]
cycles = 4
settle_time_ms = 0
"#
        )
        .unwrap();
        file.flush().unwrap();

        let config = load_scanner_config(file.path()).unwrap();
        assert_eq!(config.shared.log_level, LogLevel::Debug);
        assert_eq!(config.shared.service_name, SCANNER_SERVICE_NAME);
        assert_eq!(config.scan.total_cycles(), 4);
        assert_eq!(config.scan.settle_time(), Duration::ZERO);
        assert_eq!(config.scan.end_dwell_ms, END_DWELL_MS);
        assert_eq!(config.batch.size, BATCH_SIZE);
    }
}
