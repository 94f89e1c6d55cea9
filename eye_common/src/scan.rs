//! Scan data types shared between the engine and its consumers.
//!
//! Angles follow the physics convention: elevation θ is measured from the
//! +Z axis, azimuth φ from the +X axis in the XY plane. Distances and
//! Cartesian coordinates are millimetres.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw spherical reading taken at one sweep position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Elevation in degrees.
    pub elevation: f64,
    /// Azimuth in degrees.
    pub azimuth: f64,
    /// Distance in millimetres.
    pub distance: f64,
}

/// One point of the cloud. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X in millimetres.
    pub x: f64,
    /// Y in millimetres.
    pub y: f64,
    /// Z in millimetres.
    pub z: f64,
    /// Originating elevation in degrees.
    pub elevation: f64,
    /// Originating azimuth in degrees.
    pub azimuth: f64,
    /// Originating distance in millimetres.
    pub distance: f64,
}

impl Point {
    /// Cartesian coordinates as an array.
    #[inline]
    pub const fn xyz(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// Axis-aligned bounding box of a point set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Per-axis minimum.
    pub min: [f64; 3],
    /// Per-axis maximum.
    pub max: [f64; 3],
}

impl Bounds {
    /// Edge lengths of the box.
    pub fn extent(&self) -> [f64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }
}

/// Scan lifecycle state.
///
/// `Error` is left only through an explicit reset or re-initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanState {
    /// No scan running.
    #[default]
    Idle,
    /// Worker sampling.
    Scanning,
    /// Worker blocked at a sample boundary, axes held.
    Paused,
    /// Stop requested, worker unwinding.
    Stopping,
    /// Initialization or worker fault.
    Error,
}

impl ScanState {
    /// True while a worker owns the scan (Scanning, Paused or Stopping).
    #[inline]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Scanning | Self::Paused | Self::Stopping)
    }

    /// Lowercase name, as used on the wire.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Scanning => "scanning",
            Self::Paused => "paused",
            Self::Stopping => "stopping",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of scan progress.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanProgress {
    /// State at snapshot time.
    pub state: ScanState,
    /// Last commanded elevation.
    pub elevation_angle: f64,
    /// Current azimuth.
    pub azimuth_angle: f64,
    /// Points held by the store.
    pub points_collected: usize,
    /// Completed cycles.
    pub current_cycle: u32,
    /// Cycles of a complete scan.
    pub total_cycles: u32,
    /// `current_cycle / total_cycles * 100`, 0 when `total_cycles` is 0.
    pub progress_percent: f64,
}

impl ScanProgress {
    /// Build a snapshot, deriving `progress_percent`.
    pub fn new(
        state: ScanState,
        elevation_angle: f64,
        azimuth_angle: f64,
        points_collected: usize,
        current_cycle: u32,
        total_cycles: u32,
    ) -> Self {
        let progress_percent = if total_cycles > 0 {
            current_cycle as f64 / total_cycles as f64 * 100.0
        } else {
            0.0
        };
        Self {
            state,
            elevation_angle,
            azimuth_angle,
            points_collected,
            current_cycle,
            total_cycles,
            progress_percent,
        }
    }
}
