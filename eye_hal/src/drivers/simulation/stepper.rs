//! Simulated azimuth stepper.

use super::pose::SimulatedPose;
use eye_common::consts::FULL_CIRCLE_DEG;
use eye_common::hal::config::{SimulationConfig, StepperConfig};
use eye_common::hal::driver::{HalError, RotationAxis};
use std::thread;
use tracing::{debug, info};

const NAME: &str = "sim-stepper";

/// Open-loop stepper that only tracks its angle.
///
/// Move time is quantized to whole steps like the real half-step driver.
pub struct SimulatedStepper {
    config: StepperConfig,
    sim: SimulationConfig,
    pose: SimulatedPose,
    initialized: bool,
    current: f64,
}

impl SimulatedStepper {
    /// Create an uninitialized stepper writing into `pose`.
    pub fn new(config: StepperConfig, sim: SimulationConfig, pose: SimulatedPose) -> Self {
        Self {
            config,
            sim,
            pose,
            initialized: false,
            current: 0.0,
        }
    }
}

impl RotationAxis for SimulatedStepper {
    fn name(&self) -> &'static str {
        NAME
    }

    fn initialize(&mut self) -> Result<(), HalError> {
        self.initialized = true;
        info!(
            "Stepper motor running in simulation mode ({} steps/rev)",
            self.config.steps_per_revolution
        );
        Ok(())
    }

    fn increment_by(&mut self, degrees: f64) -> Result<f64, HalError> {
        if !self.initialized {
            return Err(HalError::NotInitialized(NAME));
        }
        if !degrees.is_finite() {
            return Err(HalError::CommunicationError(format!(
                "invalid stepper increment {degrees}"
            )));
        }

        let steps = self.config.steps_for(degrees);
        let delay = self.sim.scaled(self.config.step_delay() * steps as u32);
        if !delay.is_zero() {
            thread::sleep(delay);
        }

        self.current = (self.current + degrees).rem_euclid(FULL_CIRCLE_DEG);
        self.pose.set_azimuth(self.current);
        debug!("Stepper at {:.2}° ({} steps)", self.current, steps);
        Ok(self.current)
    }

    fn reset_position(&mut self) {
        self.current = 0.0;
        self.pose.set_azimuth(0.0);
        info!("Stepper position reset to 0 degrees");
    }

    fn current_angle(&self) -> f64 {
        self.current
    }

    fn close(&mut self) {
        if self.initialized {
            self.initialized = false;
            info!("Stepper coils released");
        }
    }
}
