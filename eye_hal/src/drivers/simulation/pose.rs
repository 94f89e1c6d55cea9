//! Sensor orientation shared by the simulated devices.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic f64 wrapper using AtomicU64
#[derive(Debug)]
struct AtomicF64(AtomicU64);

impl AtomicF64 {
    fn new(val: f64) -> Self {
        Self(AtomicU64::new(val.to_bits()))
    }

    fn load(&self, order: Ordering) -> f64 {
        f64::from_bits(self.0.load(order))
    }

    fn store(&self, val: f64, order: Ordering) {
        self.0.store(val.to_bits(), order);
    }
}

#[derive(Debug)]
struct PoseInner {
    elevation: AtomicF64,
    azimuth: AtomicF64,
}

/// Orientation of the simulated sensor, cheap to clone.
///
/// The servo owns the elevation, the stepper owns the azimuth, the
/// ranging sensor only reads.
#[derive(Debug, Clone)]
pub struct SimulatedPose {
    inner: Arc<PoseInner>,
}

impl SimulatedPose {
    /// Pose pointing straight up (elevation 0°, azimuth 0°).
    pub fn new() -> Self {
        Self {
            inner: Arc::new(PoseInner {
                elevation: AtomicF64::new(0.0),
                azimuth: AtomicF64::new(0.0),
            }),
        }
    }

    /// Elevation in degrees from +Z.
    pub fn elevation(&self) -> f64 {
        self.inner.elevation.load(Ordering::Acquire)
    }

    /// Azimuth in degrees from +X.
    pub fn azimuth(&self) -> f64 {
        self.inner.azimuth.load(Ordering::Acquire)
    }

    pub(crate) fn set_elevation(&self, deg: f64) {
        self.inner.elevation.store(deg, Ordering::Release);
    }

    pub(crate) fn set_azimuth(&self, deg: f64) {
        self.inner.azimuth.store(deg, Ordering::Release);
    }

    /// Unit boresight vector.
    pub fn direction(&self) -> [f64; 3] {
        let theta = self.elevation().to_radians();
        let phi = self.azimuth().to_radians();
        [
            theta.sin() * phi.cos(),
            theta.sin() * phi.sin(),
            theta.cos(),
        ]
    }
}

impl Default for SimulatedPose {
    fn default() -> Self {
        Self::new()
    }
}
