//! HAL capability traits and error types.
//!
//! This module defines:
//! - `ElevationAxis` / `RotationAxis` / `RangingSensor` - Capabilities a driver provides
//! - `HalError` enum - Error types for HAL operations
//! - `DriverSet` - One instance of each capability, built by a driver factory
//! - `DriverFactory` type alias - Factory function type

use crate::hal::config::HardwareConfig;
use thiserror::Error;

/// Error types for HAL operations.
#[derive(Debug, Clone, Error)]
pub enum HalError {
    /// Driver initialization failed
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// Capability used before `initialize()` or after `close()`
    #[error("{0} not initialized")]
    NotInitialized(&'static str),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Hardware communication error
    #[error("Hardware communication error: {0}")]
    CommunicationError(String),

    /// Driver not found
    #[error("Driver not found: {0}")]
    DriverNotFound(String),
}

/// Motorized mount sweeping the sensor's vertical angle.
///
/// Angles are degrees from the +Z axis.
///
/// # Lifecycle
///
/// 1. `initialize()` - Acquire the device and move to its start position
/// 2. `move_to()` - Any number of times
/// 3. `close()` - Release the device; idempotent
pub trait ElevationAxis: Send {
    /// Returns the driver's identifier (e.g. "sim-servo").
    fn name(&self) -> &'static str;

    /// Acquire the device.
    ///
    /// # Errors
    /// Return `HalError::InitFailed` if the device cannot be brought up.
    fn initialize(&mut self) -> Result<(), HalError>;

    /// Move to `angle_deg`, clamped to the mechanical range.
    ///
    /// With `smooth` the axis travels one degree at a time; otherwise it
    /// jumps directly. Returns the angle actually commanded.
    fn move_to(&mut self, angle_deg: f64, smooth: bool) -> Result<f64, HalError>;

    /// Last commanded angle.
    fn current_angle(&self) -> f64;

    /// Release the device.
    fn close(&mut self);
}

/// Motorized turntable providing the azimuth angle.
///
/// Angles are degrees from the +X axis, always in `[0, 360)`.
pub trait RotationAxis: Send {
    /// Returns the driver's identifier (e.g. "sim-stepper").
    fn name(&self) -> &'static str;

    /// Acquire the device.
    fn initialize(&mut self) -> Result<(), HalError>;

    /// Rotate by `degrees` and return the new absolute angle in `[0, 360)`.
    fn increment_by(&mut self, degrees: f64) -> Result<f64, HalError>;

    /// Declare the current physical position to be 0°. Does not move.
    fn reset_position(&mut self);

    /// Current absolute angle in `[0, 360)`.
    fn current_angle(&self) -> f64;

    /// Release the device.
    fn close(&mut self);
}

/// Device reporting one-dimensional distance along its boresight.
pub trait RangingSensor: Send {
    /// Returns the driver's identifier (e.g. "sim-tof").
    fn name(&self) -> &'static str;

    /// Acquire the device.
    fn initialize(&mut self) -> Result<(), HalError>;

    /// Read one distance in millimetres.
    ///
    /// Returns `None` for readings outside the valid window and for failed
    /// reads; drivers log the cause and never retry.
    fn read_distance(&mut self) -> Option<f64>;

    /// Release the device.
    fn close(&mut self);
}

/// One instance of each capability, as produced by a driver factory.
pub struct DriverSet {
    /// Elevation axis (servo).
    pub elevation: Box<dyn ElevationAxis>,
    /// Rotation axis (stepper).
    pub rotation: Box<dyn RotationAxis>,
    /// Ranging sensor (time-of-flight).
    pub sensor: Box<dyn RangingSensor>,
}

impl std::fmt::Debug for DriverSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverSet")
            .field("elevation", &self.elevation.name())
            .field("rotation", &self.rotation.name())
            .field("sensor", &self.sensor.name())
            .finish()
    }
}

/// Factory function type for creating a driver set.
pub type DriverFactory = fn(&HardwareConfig) -> DriverSet;
