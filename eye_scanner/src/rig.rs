//! Scoped ownership of the three scanner capabilities.
//!
//! `initialize()` brings the devices up in order (elevation, rotation,
//! sensor); if one fails, the ones already up are closed again before the
//! error is returned. Dropping the rig closes everything.

use eye_common::hal::driver::{DriverSet, ElevationAxis, HalError, RangingSensor, RotationAxis};
use tracing::{error, info};

/// Elevation axis, rotation axis and ranging sensor of one scanner.
pub struct Rig {
    elevation: Box<dyn ElevationAxis>,
    rotation: Box<dyn RotationAxis>,
    sensor: Box<dyn RangingSensor>,
    initialized: bool,
}

impl Rig {
    /// Take ownership of a driver set; nothing is initialized yet.
    pub fn new(drivers: DriverSet) -> Self {
        Self {
            elevation: drivers.elevation,
            rotation: drivers.rotation,
            sensor: drivers.sensor,
            initialized: false,
        }
    }

    /// True between a successful `initialize()` and `close()`.
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Initialize all devices, rolling back on the first failure.
    pub fn initialize(&mut self) -> Result<(), HalError> {
        if self.initialized {
            return Ok(());
        }

        if let Err(e) = self.elevation.initialize() {
            error!("{} failed to initialize: {}", self.elevation.name(), e);
            return Err(e);
        }
        if let Err(e) = self.rotation.initialize() {
            error!("{} failed to initialize: {}", self.rotation.name(), e);
            self.elevation.close();
            return Err(e);
        }
        if let Err(e) = self.sensor.initialize() {
            error!("{} failed to initialize: {}", self.sensor.name(), e);
            self.rotation.close();
            self.elevation.close();
            return Err(e);
        }

        self.initialized = true;
        info!(
            "Scanner hardware initialized ({}, {}, {})",
            self.elevation.name(),
            self.rotation.name(),
            self.sensor.name()
        );
        Ok(())
    }

    /// Close all devices in reverse order. Idempotent.
    pub fn close(&mut self) {
        if !self.initialized {
            return;
        }
        self.sensor.close();
        self.rotation.close();
        self.elevation.close();
        self.initialized = false;
        info!("Scanner hardware closed");
    }

    /// Move both axes back to the start of the sweep.
    pub fn home(&mut self, elevation_start: f64) -> Result<(), HalError> {
        if !self.initialized {
            return Ok(());
        }
        self.elevation.move_to(elevation_start, true)?;
        self.rotation.reset_position();
        Ok(())
    }

    /// Elevation axis.
    pub fn elevation(&mut self) -> &mut dyn ElevationAxis {
        self.elevation.as_mut()
    }

    /// Rotation axis.
    pub fn rotation(&mut self) -> &mut dyn RotationAxis {
        self.rotation.as_mut()
    }

    /// Ranging sensor.
    pub fn sensor(&mut self) -> &mut dyn RangingSensor {
        self.sensor.as_mut()
    }
}

impl Drop for Rig {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Rig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rig")
            .field("elevation", &self.elevation.name())
            .field("rotation", &self.rotation.name())
            .field("sensor", &self.sensor.name())
            .field("initialized", &self.initialized)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Device counting live initializations; optionally fails to init.
    struct Probe {
        live: Arc<AtomicUsize>,
        up: bool,
        fail: bool,
    }

    impl Probe {
        fn new(live: &Arc<AtomicUsize>, fail: bool) -> Self {
            Self {
                live: live.clone(),
                up: false,
                fail,
            }
        }

        fn init(&mut self) -> Result<(), HalError> {
            if self.fail {
                return Err(HalError::InitFailed("probe".to_string()));
            }
            self.up = true;
            self.live.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn shut(&mut self) {
            if self.up {
                self.up = false;
                self.live.fetch_sub(1, Ordering::SeqCst);
            }
        }
    }

    impl ElevationAxis for Probe {
        fn name(&self) -> &'static str {
            "probe"
        }
        fn initialize(&mut self) -> Result<(), HalError> {
            self.init()
        }
        fn move_to(&mut self, angle_deg: f64, _smooth: bool) -> Result<f64, HalError> {
            Ok(angle_deg)
        }
        fn current_angle(&self) -> f64 {
            0.0
        }
        fn close(&mut self) {
            self.shut()
        }
    }

    impl RotationAxis for Probe {
        fn name(&self) -> &'static str {
            "probe"
        }
        fn initialize(&mut self) -> Result<(), HalError> {
            self.init()
        }
        fn increment_by(&mut self, degrees: f64) -> Result<f64, HalError> {
            Ok(degrees)
        }
        fn reset_position(&mut self) {}
        fn current_angle(&self) -> f64 {
            0.0
        }
        fn close(&mut self) {
            self.shut()
        }
    }

    impl RangingSensor for Probe {
        fn name(&self) -> &'static str {
            "probe"
        }
        fn initialize(&mut self) -> Result<(), HalError> {
            self.init()
        }
        fn read_distance(&mut self) -> Option<f64> {
            None
        }
        fn close(&mut self) {
            self.shut()
        }
    }

    fn rig(live: &Arc<AtomicUsize>, sensor_fails: bool) -> Rig {
        Rig::new(DriverSet {
            elevation: Box::new(Probe::new(live, false)),
            rotation: Box::new(Probe::new(live, false)),
            sensor: Box::new(Probe::new(live, sensor_fails)),
        })
    }

    #[test]
    fn failed_init_rolls_back() {
        let live = Arc::new(AtomicUsize::new(0));
        let mut rig = rig(&live, true);
        assert!(rig.initialize().is_err());
        assert!(!rig.is_initialized());
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn drop_closes_devices() {
        let live = Arc::new(AtomicUsize::new(0));
        {
            let mut rig = rig(&live, false);
            rig.initialize().unwrap();
            assert_eq!(live.load(Ordering::SeqCst), 3);
        }
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn close_is_idempotent() {
        let live = Arc::new(AtomicUsize::new(0));
        let mut rig = rig(&live, false);
        rig.initialize().unwrap();
        rig.close();
        rig.close();
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }
}
