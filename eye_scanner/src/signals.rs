//! Cooperative stop/pause signalling between the engine and its worker.
//!
//! Both flags are level-triggered: setting one twice is the same as once.
//! The worker polls them at every sample boundary and inside every wait.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Stop and pause flags shared with one scan worker.
#[derive(Debug)]
pub struct ScanSignals {
    stop: AtomicBool,
    pause: AtomicBool,
    poll_interval: Duration,
}

impl ScanSignals {
    /// Cleared signals polling every `poll_interval`.
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            stop: AtomicBool::new(false),
            pause: AtomicBool::new(false),
            poll_interval: poll_interval.max(Duration::from_millis(1)),
        }
    }

    /// Request the worker to unwind.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Request the worker to hold at the next sample boundary.
    pub fn request_pause(&self) {
        self.pause.store(true, Ordering::SeqCst);
    }

    /// Let a paused worker continue.
    pub fn clear_pause(&self) {
        self.pause.store(false, Ordering::SeqCst);
    }

    /// Clear both flags before a new scan.
    pub fn reset(&self) {
        self.stop.store(false, Ordering::SeqCst);
        self.pause.store(false, Ordering::SeqCst);
    }

    /// True once a stop was requested.
    #[inline]
    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// True while a pause is requested.
    #[inline]
    pub fn pause_requested(&self) -> bool {
        self.pause.load(Ordering::SeqCst)
    }

    /// Sample boundary: block while paused, break on stop.
    ///
    /// `on_pause` runs once when the worker starts holding.
    pub fn checkpoint(&self, mut on_pause: impl FnMut()) -> ControlFlow<()> {
        let mut announced = false;
        loop {
            if self.stop_requested() {
                return ControlFlow::Break(());
            }
            if !self.pause_requested() {
                return ControlFlow::Continue(());
            }
            if !announced {
                on_pause();
                announced = true;
            }
            thread::sleep(self.poll_interval);
        }
    }

    /// Sleep `duration` in poll-interval slices, breaking early on stop.
    pub fn sleep(&self, duration: Duration) -> ControlFlow<()> {
        let deadline = Instant::now() + duration;
        loop {
            if self.stop_requested() {
                return ControlFlow::Break(());
            }
            let now = Instant::now();
            if now >= deadline {
                return ControlFlow::Continue(());
            }
            thread::sleep(self.poll_interval.min(deadline - now));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn checkpoint_passes_when_clear() {
        let signals = ScanSignals::new(Duration::from_millis(1));
        assert_eq!(signals.checkpoint(|| {}), ControlFlow::Continue(()));
    }

    #[test]
    fn stop_wins_over_pause() {
        let signals = ScanSignals::new(Duration::from_millis(1));
        signals.request_pause();
        signals.request_stop();
        assert_eq!(signals.checkpoint(|| {}), ControlFlow::Break(()));
    }

    #[test]
    fn checkpoint_blocks_until_resume() {
        let signals = Arc::new(ScanSignals::new(Duration::from_millis(1)));
        signals.request_pause();

        let worker = {
            let signals = signals.clone();
            thread::spawn(move || {
                let mut pauses = 0;
                let flow = signals.checkpoint(|| pauses += 1);
                (flow, pauses)
            })
        };

        thread::sleep(Duration::from_millis(30));
        assert!(!worker.is_finished());
        signals.clear_pause();

        let (flow, pauses) = worker.join().unwrap();
        assert_eq!(flow, ControlFlow::Continue(()));
        assert_eq!(pauses, 1);
    }

    #[test]
    fn sleep_breaks_early_on_stop() {
        let signals = Arc::new(ScanSignals::new(Duration::from_millis(1)));
        let stopper = signals.clone();
        let started = Instant::now();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            stopper.request_stop();
        });

        assert_eq!(signals.sleep(Duration::from_secs(10)), ControlFlow::Break(()));
        assert!(started.elapsed() < Duration::from_secs(5));
        handle.join().unwrap();
    }

    #[test]
    fn reset_clears_flags() {
        let signals = ScanSignals::new(Duration::from_millis(1));
        signals.request_stop();
        signals.request_pause();
        signals.reset();
        assert!(!signals.stop_requested());
        assert!(!signals.pause_requested());
    }
}
