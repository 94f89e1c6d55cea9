//! Simulated elevation servo.

use super::pose::SimulatedPose;
use eye_common::hal::config::{ServoConfig, SimulationConfig};
use eye_common::hal::driver::{ElevationAxis, HalError};
use std::thread;
use tracing::{debug, info};

const NAME: &str = "sim-servo";

/// Servo that tracks angles without hardware.
///
/// Smooth moves take `step_delay` per degree travelled, scaled by
/// `time_scale`; direct moves are instantaneous.
pub struct SimulatedServo {
    config: ServoConfig,
    sim: SimulationConfig,
    pose: SimulatedPose,
    initialized: bool,
    current: f64,
}

impl SimulatedServo {
    /// Create an uninitialized servo writing into `pose`.
    pub fn new(config: ServoConfig, sim: SimulationConfig, pose: SimulatedPose) -> Self {
        let current = config.min_angle;
        Self {
            config,
            sim,
            pose,
            initialized: false,
            current,
        }
    }

    /// True between `initialize()` and `close()`.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl ElevationAxis for SimulatedServo {
    fn name(&self) -> &'static str {
        NAME
    }

    fn initialize(&mut self) -> Result<(), HalError> {
        self.current = self.config.min_angle;
        self.pose.set_elevation(self.current);
        self.initialized = true;
        info!(
            "Servo controller running in simulation mode (range {}..{}°)",
            self.config.min_angle, self.config.max_angle
        );
        Ok(())
    }

    fn move_to(&mut self, angle_deg: f64, smooth: bool) -> Result<f64, HalError> {
        if !self.initialized {
            return Err(HalError::NotInitialized(NAME));
        }
        if !angle_deg.is_finite() {
            return Err(HalError::CommunicationError(format!(
                "invalid servo angle {angle_deg}"
            )));
        }

        let target = self.config.clamp(angle_deg);
        if smooth {
            let travel = (target - self.current).abs();
            let delay = self.sim.scaled(self.config.step_delay().mul_f64(travel));
            if !delay.is_zero() {
                thread::sleep(delay);
            }
        }

        self.current = target;
        self.pose.set_elevation(target);
        debug!("Servo at {:.1}°", target);
        Ok(target)
    }

    fn current_angle(&self) -> f64 {
        self.current
    }

    fn close(&mut self) {
        if self.initialized {
            self.initialized = false;
            info!("Servo released");
        }
    }
}
