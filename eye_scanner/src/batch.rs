//! Point batching for the point-batch listeners.
//!
//! A batch is released when it reaches `size` points or when its oldest
//! point has waited `interval`, whichever comes first.

use eye_common::config::BatchConfig;
use eye_common::scan::Point;
use std::time::{Duration, Instant};

/// Accumulates points until a release condition holds.
#[derive(Debug)]
pub struct PointBatcher {
    size: usize,
    interval: Duration,
    pending: Vec<Point>,
    opened_at: Option<Instant>,
}

impl PointBatcher {
    /// Batcher following `config`.
    pub fn new(config: &BatchConfig) -> Self {
        let size = config.size.max(1);
        Self {
            size,
            interval: config.interval(),
            pending: Vec::with_capacity(size),
            opened_at: None,
        }
    }

    /// Add a point; returns a full or timed-out batch.
    pub fn push(&mut self, point: Point) -> Option<Vec<Point>> {
        self.push_at(point, Instant::now())
    }

    pub(crate) fn push_at(&mut self, point: Point, now: Instant) -> Option<Vec<Point>> {
        self.opened_at.get_or_insert(now);
        self.pending.push(point);
        if self.pending.len() >= self.size || self.expired_at(now) {
            return self.flush();
        }
        None
    }

    /// Release the pending batch if its interval has elapsed.
    pub fn poll(&mut self) -> Option<Vec<Point>> {
        if self.expired_at(Instant::now()) {
            return self.flush();
        }
        None
    }

    /// Release whatever is pending.
    pub fn flush(&mut self) -> Option<Vec<Point>> {
        self.opened_at = None;
        if self.pending.is_empty() {
            return None;
        }
        Some(std::mem::replace(
            &mut self.pending,
            Vec::with_capacity(self.size),
        ))
    }

    /// Points waiting for release.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn expired_at(&self, now: Instant) -> bool {
        self.opened_at
            .is_some_and(|opened| now.saturating_duration_since(opened) >= self.interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: f64) -> Point {
        Point {
            x,
            y: 0.0,
            z: 0.0,
            elevation: 90.0,
            azimuth: 0.0,
            distance: x,
        }
    }

    fn batcher(size: usize, interval_ms: u64) -> PointBatcher {
        PointBatcher::new(&BatchConfig { size, interval_ms })
    }

    #[test]
    fn releases_on_size() {
        let mut b = batcher(3, 60_000);
        let t0 = Instant::now();
        assert!(b.push_at(point(1.0), t0).is_none());
        assert!(b.push_at(point(2.0), t0).is_none());
        let batch = b.push_at(point(3.0), t0).unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(b.pending(), 0);
    }

    #[test]
    fn releases_on_interval() {
        let mut b = batcher(100, 100);
        let t0 = Instant::now();
        assert!(b.push_at(point(1.0), t0).is_none());
        let batch = b
            .push_at(point(2.0), t0 + Duration::from_millis(150))
            .unwrap();
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn interval_restarts_after_release() {
        let mut b = batcher(2, 100);
        let t0 = Instant::now();
        b.push_at(point(1.0), t0);
        b.push_at(point(2.0), t0);
        let later = t0 + Duration::from_millis(500);
        assert!(b.push_at(point(3.0), later).is_none());
        assert_eq!(b.pending(), 1);
    }

    #[test]
    fn flush_drains_partial_batch() {
        let mut b = batcher(10, 60_000);
        assert!(b.flush().is_none());
        b.push(point(1.0));
        assert_eq!(b.flush().unwrap().len(), 1);
        assert!(b.flush().is_none());
    }

    #[test]
    fn poll_without_points_is_empty() {
        let mut b = batcher(10, 0);
        assert!(b.poll().is_none());
    }
}
