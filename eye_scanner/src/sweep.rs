//! The scan worker's sweep pattern.
//!
//! Each cycle runs a forward elevation leg, dwells, runs the reverse leg,
//! dwells again and then advances the azimuth by one increment. The scan
//! ends after one full revolution or the configured number of cycles.
//!
//! Stop and pause are honoured before every move, so a resumed scan
//! continues with the first position it has not sampled yet.

use crate::batch::PointBatcher;
use crate::engine::Shared;
use crate::rig::Rig;
use eye_common::config::ScanConfig;
use eye_common::consts::FULL_CIRCLE_DEG;
use eye_common::hal::driver::HalError;
use eye_common::scan::Sample;
use std::ops::ControlFlow;
use tracing::{debug, info, trace};

/// Angular tolerance for grid and completion checks.
const ANGLE_EPS: f64 = 1e-9;

/// Elevation sample positions from `start` to `end`, inclusive.
///
/// `end` is always included even when `step` does not divide the range.
pub fn elevation_grid(start: f64, end: f64, step: f64) -> Vec<f64> {
    if !(step > 0.0) || end < start {
        return vec![start];
    }
    let steps = ((end - start) / step + ANGLE_EPS).floor() as usize;
    let mut grid: Vec<f64> = (0..=steps).map(|i| start + i as f64 * step).collect();
    if let Some(&last) = grid.last() {
        if end - last > ANGLE_EPS {
            grid.push(end);
        }
    }
    grid
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Leg {
    Forward,
    Reverse,
}

/// One scan run; borrows the rig for its whole lifetime.
pub(crate) struct Sweep<'a> {
    shared: &'a Shared,
    rig: &'a mut Rig,
    batcher: &'a mut PointBatcher,
    scan: &'a ScanConfig,
    grid: Vec<f64>,
    total_cycles: u32,
    cycle: u32,
    azimuth: f64,
    accumulated_azimuth: f64,
    last_elevation: Option<f64>,
    since_progress: f64,
}

impl<'a> Sweep<'a> {
    pub(crate) fn new(
        shared: &'a Shared,
        rig: &'a mut Rig,
        batcher: &'a mut PointBatcher,
    ) -> Self {
        let scan = &shared.config.scan;
        Self {
            shared,
            rig,
            batcher,
            scan,
            grid: elevation_grid(scan.elevation_start, scan.elevation_end, scan.elevation_step),
            total_cycles: scan.total_cycles(),
            cycle: 0,
            azimuth: 0.0,
            accumulated_azimuth: 0.0,
            last_elevation: None,
            since_progress: 0.0,
        }
    }

    /// Run until complete or stopped. Hardware faults abort the run.
    pub(crate) fn run(mut self) -> Result<(), HalError> {
        // The scan's azimuth frame starts at the current heading.
        self.rig.rotation().reset_position();
        self.shared.set_rotation(0.0, 0);

        info!(
            "Sweeping {} elevation positions per leg, {} cycles",
            self.grid.len(),
            self.total_cycles
        );

        while !self.complete() {
            if self.run_cycle()?.is_break() {
                info!("Scan stopped at cycle {}", self.cycle);
                return Ok(());
            }
        }

        info!("Full scan complete after {} cycles", self.cycle);
        Ok(())
    }

    fn complete(&self) -> bool {
        self.cycle >= self.total_cycles
            || self.accumulated_azimuth >= FULL_CIRCLE_DEG - ANGLE_EPS
    }

    fn run_cycle(&mut self) -> Result<ControlFlow<()>, HalError> {
        let shared = self.shared;
        let signals = &shared.signals;

        if self.run_leg(Leg::Forward)?.is_break() {
            return Ok(ControlFlow::Break(()));
        }
        if signals.sleep(self.scan.end_dwell()).is_break() {
            return Ok(ControlFlow::Break(()));
        }
        if self.run_leg(Leg::Reverse)?.is_break() {
            return Ok(ControlFlow::Break(()));
        }
        if signals.sleep(self.scan.end_dwell()).is_break() {
            return Ok(ControlFlow::Break(()));
        }
        if signals.checkpoint(|| debug!("Scan paused before rotation")).is_break() {
            return Ok(ControlFlow::Break(()));
        }

        self.azimuth = self.rig.rotation().increment_by(self.scan.azimuth_increment)?;
        self.accumulated_azimuth += self.scan.azimuth_increment;
        self.cycle += 1;
        shared.set_rotation(self.azimuth, self.cycle);
        shared.emit_progress();

        debug!(
            "Cycle {}/{} complete, azimuth {:.2}°, {} points",
            self.cycle,
            self.total_cycles,
            self.azimuth,
            shared.store.len()
        );
        Ok(ControlFlow::Continue(()))
    }

    fn run_leg(&mut self, leg: Leg) -> Result<ControlFlow<()>, HalError> {
        let count = self.grid.len();
        for i in 0..count {
            let index = match leg {
                Leg::Forward => i,
                Leg::Reverse => count - 1 - i,
            };
            let angle = self.grid[index];

            let flow = self
                .shared
                .signals
                .checkpoint(|| debug!("Scan paused at elevation {:.1}°", angle));
            if flow.is_break() {
                return Ok(ControlFlow::Break(()));
            }

            if self.sample_at(angle, i == 0)?.is_break() {
                return Ok(ControlFlow::Break(()));
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    /// Move, settle, read and store one sample.
    fn sample_at(&mut self, angle: f64, leg_start: bool) -> Result<ControlFlow<()>, HalError> {
        let elevation = self.rig.elevation().move_to(angle, false)?;
        let moved = self
            .last_elevation
            .map_or(0.0, |last| (elevation - last).abs());
        self.last_elevation = Some(elevation);
        self.shared.set_elevation(elevation);

        if self.shared.signals.sleep(self.scan.settle_time()).is_break() {
            return Ok(ControlFlow::Break(()));
        }

        match self.rig.sensor().read_distance() {
            Some(distance) => {
                let sample = Sample {
                    elevation,
                    azimuth: self.azimuth,
                    distance,
                };
                if let Some(point) = self.shared.store.add_sample(sample) {
                    if let Some(batch) = self.batcher.push(point) {
                        self.shared.emit_points(&batch);
                    }
                }
            }
            None => trace!(
                "No reading at elevation {:.1}°, azimuth {:.2}°",
                elevation, self.azimuth
            ),
        }
        if let Some(batch) = self.batcher.poll() {
            self.shared.emit_points(&batch);
        }

        self.since_progress += moved;
        if leg_start || self.since_progress >= self.scan.progress_interval_deg - ANGLE_EPS {
            self.since_progress = 0.0;
            self.shared.emit_progress();
        }
        Ok(ControlFlow::Continue(()))
    }
}
