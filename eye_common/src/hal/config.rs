//! HAL configuration types.
//!
//! This module contains configuration types for the scanner hardware:
//! - `HardwareConfig` - Root of the `[hardware]` table
//! - `ServoConfig` - Elevation axis parameters
//! - `StepperConfig` - Rotation axis parameters
//! - `TofConfig` - Ranging sensor parameters
//! - `SimulationConfig` - Scene and timing of the simulation drivers

use crate::consts::{
    SERVO_MAX_ANGLE_DEG, SERVO_MIN_ANGLE_DEG, SERVO_STEP_DELAY_MS, STEPPER_STEP_DELAY_US,
    STEPPER_STEPS_PER_REVOLUTION, TOF_MAX_RANGE_MM, TOF_MIN_RANGE_MM, TOF_TIMING_BUDGET_US,
};
use crate::hal::driver::HalError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_servo_min() -> f64 {
    SERVO_MIN_ANGLE_DEG
}
fn default_servo_max() -> f64 {
    SERVO_MAX_ANGLE_DEG
}
fn default_servo_step_delay_ms() -> u64 {
    SERVO_STEP_DELAY_MS
}
fn default_steps_per_revolution() -> u32 {
    STEPPER_STEPS_PER_REVOLUTION
}
fn default_stepper_step_delay_us() -> u64 {
    STEPPER_STEP_DELAY_US
}
fn default_tof_min() -> f64 {
    TOF_MIN_RANGE_MM
}
fn default_tof_max() -> f64 {
    TOF_MAX_RANGE_MM
}
fn default_tof_budget_us() -> u64 {
    TOF_TIMING_BUDGET_US
}
fn default_room_half_extent() -> f64 {
    1500.0
}
fn default_floor() -> f64 {
    800.0
}
fn default_ceiling() -> f64 {
    1700.0
}
fn default_time_scale() -> f64 {
    0.1
}

/// Root of the `[hardware]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HardwareConfig {
    /// Elevation servo.
    #[serde(default)]
    pub servo: ServoConfig,

    /// Azimuth stepper.
    #[serde(default)]
    pub stepper: StepperConfig,

    /// Time-of-flight ranging sensor.
    #[serde(default)]
    pub tof: TofConfig,

    /// Simulation scene (only read by the simulation drivers).
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl HardwareConfig {
    /// Validate the hardware configuration.
    ///
    /// # Validation Rules
    /// 1. `servo.min_angle` < `servo.max_angle`
    /// 2. `stepper.steps_per_revolution` > 0
    /// 3. 0 < `tof.min_range_mm` < `tof.max_range_mm`
    /// 4. Simulation room extents > 0, `time_scale` >= 0
    pub fn validate(&self) -> Result<(), HalError> {
        if !(self.servo.min_angle < self.servo.max_angle) {
            return Err(HalError::ConfigError(format!(
                "servo.min_angle ({}) must be below servo.max_angle ({})",
                self.servo.min_angle, self.servo.max_angle
            )));
        }

        if self.stepper.steps_per_revolution == 0 {
            return Err(HalError::ConfigError(
                "stepper.steps_per_revolution must be greater than 0".to_string(),
            ));
        }

        if !(self.tof.min_range_mm > 0.0 && self.tof.min_range_mm < self.tof.max_range_mm) {
            return Err(HalError::ConfigError(format!(
                "tof range [{}, {}] must satisfy 0 < min < max",
                self.tof.min_range_mm, self.tof.max_range_mm
            )));
        }

        let sim = &self.simulation;
        for (name, value) in [
            ("room_half_width_mm", sim.room_half_width_mm),
            ("room_half_depth_mm", sim.room_half_depth_mm),
            ("floor_mm", sim.floor_mm),
            ("ceiling_mm", sim.ceiling_mm),
        ] {
            if !(value > 0.0) {
                return Err(HalError::ConfigError(format!(
                    "simulation.{name} must be greater than 0"
                )));
            }
        }
        if !(sim.time_scale >= 0.0) {
            return Err(HalError::ConfigError(
                "simulation.time_scale must not be negative".to_string(),
            ));
        }

        Ok(())
    }
}

/// Elevation servo parameters (`[hardware.servo]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServoConfig {
    /// Mechanical minimum angle; commands below are clamped.
    #[serde(default = "default_servo_min")]
    pub min_angle: f64,

    /// Mechanical maximum angle; commands above are clamped.
    #[serde(default = "default_servo_max")]
    pub max_angle: f64,

    /// Delay per degree of a smooth move.
    #[serde(default = "default_servo_step_delay_ms")]
    pub step_delay_ms: u64,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            min_angle: SERVO_MIN_ANGLE_DEG,
            max_angle: SERVO_MAX_ANGLE_DEG,
            step_delay_ms: SERVO_STEP_DELAY_MS,
        }
    }
}

impl ServoConfig {
    /// Clamp an angle into the mechanical range.
    #[inline]
    pub fn clamp(&self, angle: f64) -> f64 {
        angle.clamp(self.min_angle, self.max_angle)
    }

    /// Per-degree delay as Duration.
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }
}

/// Azimuth stepper parameters (`[hardware.stepper]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepperConfig {
    /// Steps for one full revolution.
    #[serde(default = "default_steps_per_revolution")]
    pub steps_per_revolution: u32,

    /// Delay between two coil steps.
    #[serde(default = "default_stepper_step_delay_us")]
    pub step_delay_us: u64,
}

impl Default for StepperConfig {
    fn default() -> Self {
        Self {
            steps_per_revolution: STEPPER_STEPS_PER_REVOLUTION,
            step_delay_us: STEPPER_STEP_DELAY_US,
        }
    }
}

impl StepperConfig {
    /// Whole steps needed for a rotation of `degrees`.
    pub fn steps_for(&self, degrees: f64) -> u64 {
        (degrees.abs() * self.steps_per_revolution as f64 / 360.0) as u64
    }

    /// Delay between steps as Duration.
    pub fn step_delay(&self) -> Duration {
        Duration::from_micros(self.step_delay_us)
    }
}

/// Ranging sensor parameters (`[hardware.tof]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TofConfig {
    /// Readings below are reported as invalid.
    #[serde(default = "default_tof_min")]
    pub min_range_mm: f64,

    /// Readings above are reported as invalid.
    #[serde(default = "default_tof_max")]
    pub max_range_mm: f64,

    /// Measurement timing budget.
    #[serde(default = "default_tof_budget_us")]
    pub timing_budget_us: u64,
}

impl Default for TofConfig {
    fn default() -> Self {
        Self {
            min_range_mm: TOF_MIN_RANGE_MM,
            max_range_mm: TOF_MAX_RANGE_MM,
            timing_budget_us: TOF_TIMING_BUDGET_US,
        }
    }
}

impl TofConfig {
    /// True if `distance_mm` lies inside the valid measurement window.
    #[inline]
    pub fn in_range(&self, distance_mm: f64) -> bool {
        distance_mm >= self.min_range_mm && distance_mm <= self.max_range_mm
    }

    /// Timing budget as Duration.
    pub fn timing_budget(&self) -> Duration {
        Duration::from_micros(self.timing_budget_us)
    }
}

/// Simulation scene (`[hardware.simulation]`).
///
/// The simulated sensor sits at the origin of an axis-aligned box room.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    /// Distance from the sensor to the ±X walls.
    #[serde(default = "default_room_half_extent")]
    pub room_half_width_mm: f64,

    /// Distance from the sensor to the ±Y walls.
    #[serde(default = "default_room_half_extent")]
    pub room_half_depth_mm: f64,

    /// Distance from the sensor down to the floor.
    #[serde(default = "default_floor")]
    pub floor_mm: f64,

    /// Distance from the sensor up to the ceiling.
    #[serde(default = "default_ceiling")]
    pub ceiling_mm: f64,

    /// Multiplier applied to every simulated hardware delay (0 = instant).
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            room_half_width_mm: default_room_half_extent(),
            room_half_depth_mm: default_room_half_extent(),
            floor_mm: default_floor(),
            ceiling_mm: default_ceiling(),
            time_scale: default_time_scale(),
        }
    }
}

impl SimulationConfig {
    /// Scale a real hardware delay to simulated time.
    pub fn scaled(&self, real: Duration) -> Duration {
        real.mul_f64(self.time_scale.max(0.0))
    }
}
