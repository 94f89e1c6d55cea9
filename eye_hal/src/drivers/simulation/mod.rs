//! Simulation driver module.
//!
//! This module provides software simulation of the scanner hardware for
//! development and testing without a physical rig.
//!
//! The three simulated devices share one [`SimulatedPose`]: the servo and
//! the stepper write the sensor orientation, the time-of-flight sensor
//! ray-casts along it against the box room described by
//! `[hardware.simulation]`. Readings are deterministic.

mod pose;
mod servo;
mod stepper;
mod tof;

pub use pose::SimulatedPose;
pub use servo::SimulatedServo;
pub use stepper::SimulatedStepper;
pub use tof::SimulatedTof;

use eye_common::hal::config::HardwareConfig;
use eye_common::hal::driver::DriverSet;

/// Registry name of the simulation driver.
pub const DRIVER_NAME: &str = "simulation";

/// Factory function to create a simulated driver set sharing one pose.
pub fn create_driver_set(config: &HardwareConfig) -> DriverSet {
    let pose = SimulatedPose::new();
    DriverSet {
        elevation: Box::new(SimulatedServo::new(
            config.servo.clone(),
            config.simulation.clone(),
            pose.clone(),
        )),
        rotation: Box::new(SimulatedStepper::new(
            config.stepper.clone(),
            config.simulation.clone(),
            pose.clone(),
        )),
        sensor: Box::new(SimulatedTof::new(
            config.tof.clone(),
            config.simulation.clone(),
            pose,
        )),
    }
}
