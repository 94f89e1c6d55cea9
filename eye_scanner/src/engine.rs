//! Scan engine: lifecycle API, shared state and the worker thread.
//!
//! # Threads and locks
//!
//! Lifecycle calls are `&self` and may come from any thread. At most one
//! worker runs; it holds the [`Rig`] mutex for the whole scan, so `reset`
//! and `close` touch the hardware only after joining it. The state machine
//! lock is released before state listeners run, and no lock is held while
//! any listener runs.

use crate::batch::PointBatcher;
use crate::error::{ListenerError, ScanError};
use crate::listeners::{ListenerRegistry, panic_message};
use crate::point_store::PointStore;
use crate::rig::Rig;
use crate::signals::ScanSignals;
use crate::state::{ScanEvent, ScanStateMachine, TransitionResult};
use crate::sweep::Sweep;
use eye_common::config::ScannerConfig;
use eye_common::hal::driver::DriverSet;
use eye_common::scan::{Point, ScanProgress, ScanState};
use parking_lot::Mutex;
use static_assertions::assert_impl_all;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, error, info, warn};

const WORKER_THREAD_NAME: &str = "eye-scan-worker";

// ─── Shared State ───────────────────────────────────────────────────

/// Last commanded position and cycle counter.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Position {
    pub(crate) elevation: f64,
    pub(crate) azimuth: f64,
    pub(crate) cycle: u32,
}

/// State shared between the engine handle and its worker.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) config: ScannerConfig,
    pub(crate) signals: ScanSignals,
    pub(crate) store: Arc<PointStore>,
    machine: Mutex<ScanStateMachine>,
    position: Mutex<Position>,
    hardware_ready: AtomicBool,
    progress_listeners: ListenerRegistry<ScanProgress>,
    point_listeners: ListenerRegistry<[Point]>,
    state_listeners: ListenerRegistry<ScanState>,
}

impl Shared {
    fn new(config: ScannerConfig) -> Self {
        let store = Arc::new(PointStore::new(&config.store));
        let signals = ScanSignals::new(config.scan.poll_interval());
        Self {
            config,
            signals,
            store,
            machine: Mutex::new(ScanStateMachine::new()),
            position: Mutex::new(Position::default()),
            hardware_ready: AtomicBool::new(false),
            progress_listeners: ListenerRegistry::new("progress"),
            point_listeners: ListenerRegistry::new("points"),
            state_listeners: ListenerRegistry::new("state"),
        }
    }

    pub(crate) fn state(&self) -> ScanState {
        self.machine.lock().state()
    }

    /// Apply `event`; `effect` runs under the state lock on success.
    ///
    /// State listeners are notified after the lock is released.
    fn apply(&self, event: ScanEvent, effect: impl FnOnce(&ScanSignals)) -> TransitionResult {
        let (previous, result) = {
            let mut machine = self.machine.lock();
            let previous = machine.state();
            let result = machine.handle_event(event);
            if matches!(result, TransitionResult::Ok(_)) {
                effect(&self.signals);
            }
            (previous, result)
        };

        if let TransitionResult::Ok(next) = result {
            if next != previous {
                info!("Scanner state: {} → {}", previous, next);
                self.state_listeners.notify(&next);
            }
        }
        result
    }

    pub(crate) fn set_elevation(&self, elevation: f64) {
        self.position.lock().elevation = elevation;
    }

    pub(crate) fn set_rotation(&self, azimuth: f64, cycle: u32) {
        let mut position = self.position.lock();
        position.azimuth = azimuth;
        position.cycle = cycle;
    }

    fn reset_position(&self) {
        *self.position.lock() = Position {
            elevation: self.config.scan.elevation_start,
            ..Position::default()
        };
    }

    pub(crate) fn progress(&self) -> ScanProgress {
        let state = self.state();
        let position = *self.position.lock();
        ScanProgress::new(
            state,
            position.elevation,
            position.azimuth,
            self.store.len(),
            position.cycle,
            self.config.scan.total_cycles(),
        )
    }

    pub(crate) fn emit_progress(&self) {
        self.progress_listeners.notify(&self.progress());
    }

    pub(crate) fn emit_points(&self, batch: &[Point]) {
        debug!("Releasing batch of {} points", batch.len());
        self.point_listeners.notify(batch);
    }
}

// ─── Engine ─────────────────────────────────────────────────────────

/// Scan orchestration engine owning one scanner rig and its point store.
///
/// Construct it with a [`DriverSet`], call [`initialize`](Self::initialize),
/// then drive scans with the lifecycle methods. Dropping the engine stops
/// any scan and closes the hardware.
#[derive(Debug)]
pub struct ScanEngine {
    shared: Arc<Shared>,
    rig: Arc<Mutex<Rig>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

assert_impl_all!(ScanEngine: Send, Sync);

impl ScanEngine {
    /// Engine over `drivers`; the hardware stays uninitialized.
    pub fn new(config: ScannerConfig, drivers: DriverSet) -> Self {
        let shared = Shared::new(config);
        shared.reset_position();
        Self {
            shared: Arc::new(shared),
            rig: Arc::new(Mutex::new(Rig::new(drivers))),
            worker: Mutex::new(None),
        }
    }

    /// Configuration the engine was built with.
    pub fn config(&self) -> &ScannerConfig {
        &self.shared.config
    }

    /// Shared handle to the point store.
    pub fn point_store(&self) -> Arc<PointStore> {
        self.shared.store.clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ScanState {
        self.shared.state()
    }

    /// Snapshot of the scan progress.
    pub fn progress(&self) -> ScanProgress {
        self.shared.progress()
    }

    /// True once the hardware initialized and until `close()`.
    pub fn is_initialized(&self) -> bool {
        self.shared.hardware_ready.load(Ordering::SeqCst)
    }

    /// Register a progress listener.
    pub fn subscribe_progress<F>(&self, listener: F)
    where
        F: Fn(&ScanProgress) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.shared.progress_listeners.subscribe(listener);
    }

    /// Register a point batch listener.
    pub fn subscribe_points<F>(&self, listener: F)
    where
        F: Fn(&[Point]) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.shared.point_listeners.subscribe(listener);
    }

    /// Register a state change listener.
    pub fn subscribe_state<F>(&self, listener: F)
    where
        F: Fn(&ScanState) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.shared.state_listeners.subscribe(listener);
    }

    /// Initialize the hardware.
    ///
    /// On failure the engine enters `Error`. A successful re-initialization
    /// out of `Error` returns the engine to `Idle`.
    pub fn initialize(&self) -> Result<(), ScanError> {
        if self.on_worker_thread() {
            return Err(ScanError::WorkerReentry("initialize"));
        }
        if self.state().is_active() {
            debug!("initialize() during an active scan ignored");
            return Ok(());
        }

        let result = self.rig.lock().initialize();
        match result {
            Ok(()) => {
                self.shared.hardware_ready.store(true, Ordering::SeqCst);
                if self.state() == ScanState::Error {
                    self.shared.apply(ScanEvent::Reset, |_| {});
                }
                info!("Scanner initialized");
                Ok(())
            }
            Err(e) => {
                self.shared.hardware_ready.store(false, Ordering::SeqCst);
                self.shared.apply(ScanEvent::Fault, |_| {});
                Err(ScanError::Initialization(e))
            }
        }
    }

    /// Start a scan in the background.
    ///
    /// Returns `false` and changes nothing unless the engine is `Idle`
    /// with initialized hardware. State listeners see `Scanning` before
    /// this returns and before the worker emits anything.
    pub fn start_scan(&self) -> bool {
        if !self.is_initialized() {
            warn!("Cannot start scan: hardware not initialized");
            return false;
        }

        let previous = {
            let mut slot = self.worker.lock();
            let current = thread::current().id();
            if slot
                .as_ref()
                .is_some_and(|handle| handle.thread().id() == current)
            {
                warn!("Cannot start scan from the scan worker");
                return false;
            }
            let state = self.state();
            if state != ScanState::Idle {
                warn!("Cannot start scan: scanner is {}", state);
                return false;
            }
            slot.take()
        };

        // A previous worker past its final transition only has to return.
        if let Some(handle) = previous {
            reap(handle);
        }

        if let TransitionResult::Rejected(reason) =
            self.shared.apply(ScanEvent::Start, ScanSignals::reset)
        {
            warn!("Cannot start scan: {}", reason);
            return false;
        }

        let mut slot = self.worker.lock();
        // Listeners may have stopped or reset the scan in the meantime.
        if slot.is_some() || !self.state().is_active() {
            debug!("Scan ended before its worker started");
            return false;
        }

        let shared = self.shared.clone();
        let rig = self.rig.clone();
        match thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || worker_main(shared, rig))
        {
            Ok(handle) => {
                *slot = Some(handle);
                info!("Scan started");
                true
            }
            Err(e) => {
                drop(slot);
                error!("Failed to spawn scan worker: {}", e);
                self.shared.apply(ScanEvent::Fault, |_| {});
                false
            }
        }
    }

    /// Ask the worker to stop; the engine passes through `Stopping`.
    pub fn stop_scan(&self) {
        match self.shared.apply(ScanEvent::Stop, ScanSignals::request_stop) {
            TransitionResult::Ok(_) => info!("Stop requested"),
            TransitionResult::Rejected(reason) => debug!("Stop ignored: {}", reason),
        }
    }

    /// Hold the scan at the next sample boundary.
    pub fn pause_scan(&self) {
        match self
            .shared
            .apply(ScanEvent::Pause, ScanSignals::request_pause)
        {
            TransitionResult::Ok(_) => info!("Pause requested"),
            TransitionResult::Rejected(reason) => debug!("Pause ignored: {}", reason),
        }
    }

    /// Continue a paused scan at the next unvisited position.
    pub fn resume_scan(&self) {
        match self.shared.apply(ScanEvent::Resume, ScanSignals::clear_pause) {
            TransitionResult::Ok(_) => info!("Resume requested"),
            TransitionResult::Rejected(reason) => debug!("Resume ignored: {}", reason),
        }
    }

    /// Stop, wait for the worker, clear the store and rehome both axes.
    pub fn reset(&self) -> Result<(), ScanError> {
        if self.on_worker_thread() {
            return Err(ScanError::WorkerReentry("reset"));
        }

        self.stop_scan();
        self.join_worker()?;

        self.shared.store.clear();
        self.shared.reset_position();
        self.shared.signals.reset();

        let homed = self
            .rig
            .lock()
            .home(self.shared.config.scan.elevation_start);
        if let Err(e) = homed {
            error!("Failed to rehome axes: {}", e);
            self.shared.apply(ScanEvent::Fault, |_| {});
            return Err(ScanError::Hardware(e));
        }

        self.shared.apply(ScanEvent::Reset, |_| {});
        info!("Scanner reset");
        Ok(())
    }

    /// Stop any scan and release the hardware.
    pub fn close(&self) -> Result<(), ScanError> {
        if self.on_worker_thread() {
            return Err(ScanError::WorkerReentry("close"));
        }

        self.stop_scan();
        self.join_worker()?;
        self.rig.lock().close();
        self.shared.hardware_ready.store(false, Ordering::SeqCst);
        info!("Scanner closed");
        Ok(())
    }

    fn on_worker_thread(&self) -> bool {
        let current = thread::current().id();
        self.worker
            .lock()
            .as_ref()
            .is_some_and(|handle| handle.thread().id() == current)
    }

    /// Wait for the worker, bounded by `scan.join_timeout_ms`.
    fn join_worker(&self) -> Result<(), ScanError> {
        let Some(handle) = self.worker.lock().take() else {
            return Ok(());
        };

        let scan = &self.shared.config.scan;
        let deadline = Instant::now() + scan.join_timeout();
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                error!(
                    "Scan worker did not stop within {} ms",
                    scan.join_timeout_ms
                );
                *self.worker.lock() = Some(handle);
                return Err(ScanError::ShutdownTimeout(scan.join_timeout_ms));
            }
            thread::sleep(scan.poll_interval());
        }

        handle
            .join()
            .map_err(|payload| ScanError::WorkerPanicked(panic_message(payload.as_ref())))
    }
}

impl Drop for ScanEngine {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Scan engine close on drop failed: {}", e);
        }
    }
}

/// Join a worker that already made its final transition.
fn reap(handle: JoinHandle<()>) {
    if let Err(payload) = handle.join() {
        error!(
            "Previous scan worker panicked: {}",
            panic_message(payload.as_ref())
        );
    }
}

// ─── Worker ─────────────────────────────────────────────────────────

fn worker_main(shared: Arc<Shared>, rig: Arc<Mutex<Rig>>) {
    let mut batcher = PointBatcher::new(&shared.config.batch);
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let mut rig = rig.lock();
        Sweep::new(&shared, &mut rig, &mut batcher).run()
    }));

    if let Some(batch) = batcher.flush() {
        shared.emit_points(&batch);
    }

    match outcome {
        Ok(Ok(())) => {
            shared.apply(ScanEvent::Finish, |_| {});
        }
        Ok(Err(e)) => {
            error!("Error in scan loop: {}", e);
            shared.apply(ScanEvent::Fault, |_| {});
        }
        Err(payload) => {
            error!("Scan worker panicked: {}", panic_message(payload.as_ref()));
            shared.apply(ScanEvent::Fault, |_| {});
        }
    }

    info!("Scan finished. Total points: {}", shared.store.len());
}
