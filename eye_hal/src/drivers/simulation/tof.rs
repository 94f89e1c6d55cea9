//! Simulated time-of-flight sensor.

use super::pose::SimulatedPose;
use eye_common::hal::config::{SimulationConfig, TofConfig};
use eye_common::hal::driver::{HalError, RangingSensor};
use std::thread;
use tracing::{info, trace, warn};

const NAME: &str = "sim-tof";

/// Direction components below this are treated as parallel to a wall.
const PARALLEL_EPS: f64 = 1e-9;

/// Ranging sensor ray-casting the configured box room.
///
/// Readings are rounded to whole millimetres like the real device and
/// take one timing budget (scaled) each.
pub struct SimulatedTof {
    config: TofConfig,
    sim: SimulationConfig,
    pose: SimulatedPose,
    initialized: bool,
}

impl SimulatedTof {
    /// Create an uninitialized sensor reading from `pose`.
    pub fn new(config: TofConfig, sim: SimulationConfig, pose: SimulatedPose) -> Self {
        Self {
            config,
            sim,
            pose,
            initialized: false,
        }
    }

    /// Distance from the origin along `dir` to the first wall, floor or ceiling.
    fn ray_cast(&self, dir: [f64; 3]) -> f64 {
        let planes = [
            (dir[0], self.sim.room_half_width_mm, self.sim.room_half_width_mm),
            (dir[1], self.sim.room_half_depth_mm, self.sim.room_half_depth_mm),
            (dir[2], self.sim.ceiling_mm, self.sim.floor_mm),
        ];

        planes
            .iter()
            .filter_map(|&(component, positive, negative)| {
                if component > PARALLEL_EPS {
                    Some(positive / component)
                } else if component < -PARALLEL_EPS {
                    Some(negative / -component)
                } else {
                    None
                }
            })
            .fold(f64::INFINITY, f64::min)
    }
}

impl RangingSensor for SimulatedTof {
    fn name(&self) -> &'static str {
        NAME
    }

    fn initialize(&mut self) -> Result<(), HalError> {
        self.initialized = true;
        info!(
            "TOF sensor running in simulation mode (room {}x{} mm, window {}..{} mm)",
            2.0 * self.sim.room_half_width_mm,
            2.0 * self.sim.room_half_depth_mm,
            self.config.min_range_mm,
            self.config.max_range_mm
        );
        Ok(())
    }

    fn read_distance(&mut self) -> Option<f64> {
        if !self.initialized {
            warn!("TOF sensor not initialized");
            return None;
        }

        let budget = self.sim.scaled(self.config.timing_budget());
        if !budget.is_zero() {
            thread::sleep(budget);
        }

        let distance = self.ray_cast(self.pose.direction()).round();
        if !self.config.in_range(distance) {
            trace!("TOF reading out of range: {}mm", distance);
            return None;
        }
        Some(distance)
    }

    fn close(&mut self) {
        if self.initialized {
            self.initialized = false;
            info!("TOF sensor closed");
        }
    }
}
