//! Capacity-bounded point cloud buffer.
//!
//! Points are kept in insertion order. When an insert would exceed the
//! capacity, the oldest eviction block is dropped first. Reads return
//! independent copies; the lock is never held across listener calls.

use crate::error::ListenerError;
use crate::geometry::{cartesian_to_spherical, spherical_to_cartesian};
use crate::listeners::ListenerRegistry;
use eye_common::config::StoreConfig;
use eye_common::scan::{Bounds, Point, Sample};
use parking_lot::RwLock;
use static_assertions::assert_impl_all;
use std::collections::VecDeque;
use tracing::{trace, warn};

/// Thread-safe point buffer fed by the scan worker.
#[derive(Debug)]
pub struct PointStore {
    capacity: usize,
    eviction_block: usize,
    points: RwLock<VecDeque<Point>>,
    listeners: ListenerRegistry<Point>,
}

assert_impl_all!(PointStore: Send, Sync);

impl PointStore {
    /// Store sized by `config`.
    pub fn new(config: &StoreConfig) -> Self {
        let capacity = config.capacity.max(1);
        Self {
            capacity,
            eviction_block: config.eviction_block(),
            points: RwLock::new(VecDeque::with_capacity(capacity.min(4096))),
            listeners: ListenerRegistry::new("point"),
        }
    }

    /// Maximum number of points held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Points dropped per eviction.
    pub fn eviction_block(&self) -> usize {
        self.eviction_block
    }

    /// Register a per-point listener.
    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&Point) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener);
    }

    /// Convert and store a sample.
    ///
    /// Returns `None` without touching the store when `distance` is not a
    /// positive finite number.
    pub fn add_spherical(&self, elevation: f64, azimuth: f64, distance: f64) -> Option<Point> {
        self.add_sample(Sample {
            elevation,
            azimuth,
            distance,
        })
    }

    /// Convert and store one sensor reading.
    pub fn add_sample(&self, sample: Sample) -> Option<Point> {
        let Sample {
            elevation,
            azimuth,
            distance,
        } = sample;
        if !(distance > 0.0 && distance.is_finite()) {
            trace!(
                "Discarding sample ({:.1}°, {:.1}°) with distance {}",
                elevation, azimuth, distance
            );
            return None;
        }

        let [x, y, z] = spherical_to_cartesian(elevation, azimuth, distance);
        let point = Point {
            x,
            y,
            z,
            elevation,
            azimuth,
            distance,
        };
        self.insert(point);
        Some(point)
    }

    /// Store a point given directly in Cartesian coordinates.
    ///
    /// The spherical fields are derived from the position.
    pub fn add_cartesian(&self, x: f64, y: f64, z: f64) -> Point {
        let (elevation, azimuth, distance) = cartesian_to_spherical(x, y, z);
        let point = Point {
            x,
            y,
            z,
            elevation,
            azimuth,
            distance,
        };
        self.insert(point);
        point
    }

    fn insert(&self, point: Point) {
        {
            let mut points = self.points.write();
            if points.len() >= self.capacity {
                let evict = self.eviction_block.min(points.len());
                points.drain(..evict);
                warn!(
                    "Point store at capacity {}, evicted {} oldest points",
                    self.capacity, evict
                );
            }
            points.push_back(point);
        }
        self.listeners.notify(&point);
    }

    /// Copy of every point, oldest first.
    pub fn points(&self) -> Vec<Point> {
        self.points.read().iter().copied().collect()
    }

    /// Copy of the newest `n` points, oldest first.
    pub fn latest(&self, n: usize) -> Vec<Point> {
        let points = self.points.read();
        let skip = points.len().saturating_sub(n);
        points.iter().skip(skip).copied().collect()
    }

    /// Number of stored points.
    pub fn len(&self) -> usize {
        self.points.read().len()
    }

    /// True if no point is stored.
    pub fn is_empty(&self) -> bool {
        self.points.read().is_empty()
    }

    /// Axis-aligned bounding box, `None` when empty.
    pub fn bounds(&self) -> Option<Bounds> {
        let points = self.points.read();
        let mut iter = points.iter();
        let first = iter.next()?.xyz();
        let (min, max) = iter.fold((first, first), |(mut min, mut max), p| {
            for (axis, value) in p.xyz().into_iter().enumerate() {
                min[axis] = min[axis].min(value);
                max[axis] = max[axis].max(value);
            }
            (min, max)
        });
        Some(Bounds { min, max })
    }

    /// Centroid of all points, `None` when empty.
    pub fn center(&self) -> Option<[f64; 3]> {
        let points = self.points.read();
        if points.is_empty() {
            return None;
        }
        let sum = points.iter().fold([0.0; 3], |mut acc, p| {
            acc[0] += p.x;
            acc[1] += p.y;
            acc[2] += p.z;
            acc
        });
        let n = points.len() as f64;
        Some([sum[0] / n, sum[1] / n, sum[2] / n])
    }

    /// Drop every point.
    pub fn clear(&self) {
        self.points.write().clear();
    }
}

impl Default for PointStore {
    fn default() -> Self {
        Self::new(&StoreConfig::default())
    }
}
