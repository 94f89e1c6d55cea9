//! Scan engine lifecycle tests against recording mock capabilities.

use eye_common::config::ScannerConfig;
use eye_common::hal::driver::{DriverSet, ElevationAxis, HalError, RangingSensor, RotationAxis};
use eye_common::scan::{ScanProgress, ScanState};
use eye_scanner::{ScanEngine, ScanError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

// ─── Mock Capabilities ──────────────────────────────────────────────

#[derive(Debug, Default)]
struct Log {
    moves: Vec<f64>,
    increments: Vec<f64>,
    resets: usize,
    closed: usize,
}

type SharedLog = Arc<Mutex<Log>>;

struct MockServo {
    log: SharedLog,
    angle: f64,
    fail_at: Option<usize>,
    move_time: Duration,
}

impl ElevationAxis for MockServo {
    fn name(&self) -> &'static str {
        "mock-servo"
    }

    fn initialize(&mut self) -> Result<(), HalError> {
        Ok(())
    }

    fn move_to(&mut self, angle_deg: f64, _smooth: bool) -> Result<f64, HalError> {
        thread::sleep(self.move_time);
        let mut log = self.log.lock();
        if self.fail_at == Some(log.moves.len()) {
            self.fail_at = None;
            return Err(HalError::CommunicationError("servo stalled".to_string()));
        }
        log.moves.push(angle_deg);
        self.angle = angle_deg;
        Ok(angle_deg)
    }

    fn current_angle(&self) -> f64 {
        self.angle
    }

    fn close(&mut self) {
        self.log.lock().closed += 1;
    }
}

struct MockStepper {
    log: SharedLog,
    angle: f64,
}

impl RotationAxis for MockStepper {
    fn name(&self) -> &'static str {
        "mock-stepper"
    }

    fn initialize(&mut self) -> Result<(), HalError> {
        Ok(())
    }

    fn increment_by(&mut self, degrees: f64) -> Result<f64, HalError> {
        self.log.lock().increments.push(degrees);
        self.angle = (self.angle + degrees).rem_euclid(360.0);
        Ok(self.angle)
    }

    fn reset_position(&mut self) {
        self.log.lock().resets += 1;
        self.angle = 0.0;
    }

    fn current_angle(&self) -> f64 {
        self.angle
    }

    fn close(&mut self) {
        self.log.lock().closed += 1;
    }
}

struct MockSensor {
    log: SharedLog,
    distance: Option<f64>,
    fail_init: bool,
}

impl RangingSensor for MockSensor {
    fn name(&self) -> &'static str {
        "mock-tof"
    }

    fn initialize(&mut self) -> Result<(), HalError> {
        if self.fail_init {
            return Err(HalError::InitFailed("no ack on i2c".to_string()));
        }
        Ok(())
    }

    fn read_distance(&mut self) -> Option<f64> {
        self.distance
    }

    fn close(&mut self) {
        self.log.lock().closed += 1;
    }
}

#[derive(Default)]
struct RigSetup {
    servo_fail_at: Option<usize>,
    servo_move_time: Duration,
    sensor_fail_init: bool,
    no_readings: bool,
}

fn drivers(log: &SharedLog, setup: RigSetup) -> DriverSet {
    DriverSet {
        elevation: Box::new(MockServo {
            log: log.clone(),
            angle: 0.0,
            fail_at: setup.servo_fail_at,
            move_time: setup.servo_move_time,
        }),
        rotation: Box::new(MockStepper {
            log: log.clone(),
            angle: 0.0,
        }),
        sensor: Box::new(MockSensor {
            log: log.clone(),
            distance: if setup.no_readings { None } else { Some(1000.0) },
            fail_init: setup.sensor_fail_init,
        }),
    }
}

// ─── Helpers ────────────────────────────────────────────────────────

fn fast_config(cycles: Option<u32>) -> ScannerConfig {
    let mut config = ScannerConfig::default();
    config.scan.cycles = cycles;
    config.scan.settle_time_ms = 0;
    config.scan.end_dwell_ms = 0;
    config.scan.poll_interval_ms = 1;
    config.scan.join_timeout_ms = 5000;
    config
}

fn engine_with(config: ScannerConfig, setup: RigSetup) -> (ScanEngine, SharedLog) {
    let log = SharedLog::default();
    let engine = ScanEngine::new(config, drivers(&log, setup));
    (engine, log)
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

fn wait_idle(engine: &ScanEngine) -> bool {
    wait_until(Duration::from_secs(20), || !engine.state().is_active())
}

fn sweep_sequence(start: u32, end: u32) -> Vec<f64> {
    let forward: Vec<f64> = (start..=end).map(f64::from).collect();
    let mut sequence = forward.clone();
    sequence.extend(forward.iter().rev());
    sequence
}

// ─── Lifecycle ──────────────────────────────────────────────────────

#[test]
fn start_requires_initialized_hardware() {
    let (engine, _log) = engine_with(fast_config(Some(1)), RigSetup::default());
    assert!(!engine.start_scan());
    assert_eq!(engine.state(), ScanState::Idle);
}

#[test]
fn second_start_is_rejected_while_scanning() {
    let mut config = fast_config(None);
    config.scan.settle_time_ms = 2;
    let (engine, _log) = engine_with(config, RigSetup::default());
    engine.initialize().unwrap();

    assert!(engine.start_scan());
    assert_eq!(engine.state(), ScanState::Scanning);
    assert!(!engine.start_scan());
    assert_eq!(engine.state(), ScanState::Scanning);

    engine.stop_scan();
    assert!(wait_idle(&engine));
}

#[test]
fn two_cycles_complete_and_return_to_idle() {
    let (engine, log) = engine_with(fast_config(Some(2)), RigSetup::default());
    engine.initialize().unwrap();
    assert!(engine.start_scan());
    assert!(wait_idle(&engine));

    let progress = engine.progress();
    assert_eq!(engine.state(), ScanState::Idle);
    assert_eq!(progress.current_cycle, 2);
    assert_eq!(progress.total_cycles, 2);
    assert_eq!(progress.progress_percent, 100.0);
    assert_eq!(progress.points_collected, 2 * 2 * 181);
    assert_eq!(engine.point_store().len(), 2 * 2 * 181);

    let log = log.lock();
    assert_eq!(log.increments, vec![1.0, 1.0]);
    let mut expected = sweep_sequence(0, 180);
    expected.extend(sweep_sequence(0, 180));
    assert_eq!(log.moves, expected);
}

#[test]
fn points_carry_the_cycle_azimuth() {
    let mut config = fast_config(Some(2));
    config.scan.azimuth_increment = 90.0;
    let (engine, _log) = engine_with(config, RigSetup::default());
    engine.initialize().unwrap();
    assert!(engine.start_scan());
    assert!(wait_idle(&engine));

    let points = engine.point_store().points();
    assert!(points[..362].iter().all(|p| p.azimuth == 0.0));
    assert!(points[362..].iter().all(|p| p.azimuth == 90.0));
    assert_eq!(engine.progress().azimuth_angle, 180.0);
}

#[test]
fn stop_reaches_idle_without_trailing_events() {
    let mut config = fast_config(None);
    config.scan.settle_time_ms = 1;
    let (engine, _log) = engine_with(config, RigSetup::default());
    engine.initialize().unwrap();

    let events = Arc::new(Mutex::new(0usize));
    let states = Arc::new(Mutex::new(Vec::new()));
    {
        let events = events.clone();
        engine.subscribe_points(move |_| {
            *events.lock() += 1;
            Ok(())
        });
    }
    {
        let events = events.clone();
        engine.subscribe_progress(move |_| {
            *events.lock() += 1;
            Ok(())
        });
    }
    {
        let states = states.clone();
        engine.subscribe_state(move |state| {
            states.lock().push(*state);
            Ok(())
        });
    }

    assert!(engine.start_scan());
    thread::sleep(Duration::from_millis(50));
    let stop_issued = Instant::now();
    engine.stop_scan();
    assert!(wait_idle(&engine));
    assert!(stop_issued.elapsed() < Duration::from_secs(2));

    let settled = *events.lock();
    thread::sleep(Duration::from_millis(100));
    assert_eq!(*events.lock(), settled);
    assert_eq!(
        *states.lock(),
        vec![ScanState::Scanning, ScanState::Stopping, ScanState::Idle]
    );
}

#[test]
fn pause_holds_position_and_resume_continues() {
    let mut config = fast_config(Some(1));
    config.scan.settle_time_ms = 1;
    let (engine, log) = engine_with(config, RigSetup::default());
    engine.initialize().unwrap();

    assert!(engine.start_scan());
    thread::sleep(Duration::from_millis(30));
    engine.pause_scan();
    assert_eq!(engine.state(), ScanState::Paused);

    thread::sleep(Duration::from_millis(20));
    let held = log.lock().moves.len();
    thread::sleep(Duration::from_millis(60));
    assert_eq!(log.lock().moves.len(), held, "axes moved while paused");
    assert_eq!(engine.state(), ScanState::Paused);

    engine.resume_scan();
    assert!(wait_idle(&engine));

    assert_eq!(log.lock().moves, sweep_sequence(0, 180));
    assert_eq!(engine.point_store().len(), 362);
}

#[test]
fn stop_while_paused() {
    let mut config = fast_config(None);
    config.scan.settle_time_ms = 1;
    let (engine, _log) = engine_with(config, RigSetup::default());
    engine.initialize().unwrap();

    assert!(engine.start_scan());
    engine.pause_scan();
    engine.stop_scan();
    assert!(wait_idle(&engine));
    assert_eq!(engine.state(), ScanState::Idle);
}

#[test]
fn state_listeners_track_an_immediate_pause() {
    let mut config = fast_config(None);
    config.scan.settle_time_ms = 2;
    let (engine, _log) = engine_with(config, RigSetup::default());
    engine.initialize().unwrap();

    let states = Arc::new(Mutex::new(Vec::new()));
    {
        let states = states.clone();
        engine.subscribe_state(move |state| {
            states.lock().push(*state);
            Ok(())
        });
    }

    for _ in 0..20 {
        states.lock().clear();
        assert!(engine.start_scan());
        engine.pause_scan();
        thread::sleep(Duration::from_millis(30));

        assert_eq!(engine.state(), ScanState::Paused);
        assert_eq!(*states.lock(), vec![ScanState::Scanning, ScanState::Paused]);

        engine.stop_scan();
        assert!(wait_until(Duration::from_secs(5), || {
            states.lock().last() == Some(&ScanState::Idle)
        }));
        assert_eq!(engine.state(), ScanState::Idle);
        assert_eq!(
            *states.lock(),
            vec![
                ScanState::Scanning,
                ScanState::Paused,
                ScanState::Stopping,
                ScanState::Idle
            ]
        );
    }
}

#[test]
fn stuck_worker_reports_shutdown_timeout() {
    let mut config = fast_config(None);
    config.scan.join_timeout_ms = 20;
    let setup = RigSetup {
        servo_move_time: Duration::from_millis(300),
        ..Default::default()
    };
    let (engine, _log) = engine_with(config, setup);
    engine.initialize().unwrap();

    assert!(engine.start_scan());
    thread::sleep(Duration::from_millis(30));
    assert!(matches!(
        engine.reset(),
        Err(ScanError::ShutdownTimeout(20))
    ));
    assert_eq!(engine.state(), ScanState::Stopping);

    // The worker still owns its handle and finishes the move it was in.
    assert!(wait_idle(&engine));
    engine.reset().unwrap();
    assert_eq!(engine.state(), ScanState::Idle);
    assert_eq!(engine.point_store().len(), 0);
    assert!(engine.start_scan());
    engine.stop_scan();
    assert!(wait_idle(&engine));
}

#[test]
fn reset_clears_store_and_rehomes_axes() {
    let mut config = fast_config(None);
    config.scan.settle_time_ms = 1;
    config.scan.elevation_start = 10.0;
    let (engine, log) = engine_with(config, RigSetup::default());
    engine.initialize().unwrap();

    assert!(engine.start_scan());
    assert!(wait_until(Duration::from_secs(5), || {
        engine.point_store().len() > 20
    }));
    engine.reset().unwrap();

    assert_eq!(engine.state(), ScanState::Idle);
    assert_eq!(engine.point_store().len(), 0);
    let progress = engine.progress();
    assert_eq!(progress.current_cycle, 0);
    assert_eq!(progress.azimuth_angle, 0.0);
    assert_eq!(progress.elevation_angle, 10.0);

    let log = log.lock();
    assert_eq!(log.moves.last(), Some(&10.0));
    // One reset when the scan started, one from the rehome.
    assert_eq!(log.resets, 2);
}

#[test]
fn engine_can_scan_again_after_completion() {
    let (engine, _log) = engine_with(fast_config(Some(1)), RigSetup::default());
    engine.initialize().unwrap();

    assert!(engine.start_scan());
    assert!(wait_idle(&engine));
    assert!(engine.start_scan());
    assert!(wait_idle(&engine));
    assert_eq!(engine.point_store().len(), 2 * 362);
}

// ─── Faults ─────────────────────────────────────────────────────────

#[test]
fn hardware_fault_enters_error_and_flushes_points() {
    let mut config = fast_config(Some(1));
    config.batch.size = 10_000;
    config.batch.interval_ms = 60_000;
    let setup = RigSetup {
        servo_fail_at: Some(50),
        ..Default::default()
    };
    let (engine, _log) = engine_with(config, setup);
    engine.initialize().unwrap();

    let delivered = Arc::new(Mutex::new(0usize));
    {
        let delivered = delivered.clone();
        engine.subscribe_points(move |batch| {
            *delivered.lock() += batch.len();
            Ok(())
        });
    }

    assert!(engine.start_scan());
    assert!(wait_until(Duration::from_secs(5), || {
        engine.state() == ScanState::Error
    }));

    assert_eq!(engine.point_store().len(), 50);
    assert!(wait_until(Duration::from_secs(1), || *delivered.lock() == 50));
    assert!(!engine.start_scan());

    engine.reset().unwrap();
    assert_eq!(engine.state(), ScanState::Idle);
    assert!(engine.start_scan());
    engine.stop_scan();
    assert!(wait_idle(&engine));
}

#[test]
fn initialization_failure_enters_error() {
    let setup = RigSetup {
        sensor_fail_init: true,
        ..Default::default()
    };
    let (engine, log) = engine_with(fast_config(Some(1)), setup);

    let result = engine.initialize();
    assert!(matches!(result, Err(ScanError::Initialization(_))));
    assert_eq!(engine.state(), ScanState::Error);
    assert!(!engine.is_initialized());
    assert!(!engine.start_scan());

    // Servo and stepper were rolled back.
    assert_eq!(log.lock().closed, 2);
}

#[test]
fn invalid_readings_are_skipped() {
    let setup = RigSetup {
        no_readings: true,
        ..Default::default()
    };
    let (engine, log) = engine_with(fast_config(Some(1)), setup);
    engine.initialize().unwrap();

    assert!(engine.start_scan());
    assert!(wait_idle(&engine));
    assert_eq!(engine.state(), ScanState::Idle);
    assert_eq!(engine.point_store().len(), 0);
    assert_eq!(log.lock().moves.len(), 362);
}

// ─── Listeners ──────────────────────────────────────────────────────

#[test]
fn progress_every_ten_degrees_and_per_cycle() {
    let (engine, _log) = engine_with(fast_config(Some(1)), RigSetup::default());
    engine.initialize().unwrap();

    let snapshots: Arc<Mutex<Vec<ScanProgress>>> = Arc::default();
    {
        let snapshots = snapshots.clone();
        engine.subscribe_progress(move |progress| {
            snapshots.lock().push(*progress);
            Ok(())
        });
    }

    assert!(engine.start_scan());
    assert!(wait_idle(&engine));

    let snapshots = snapshots.lock();
    let elevations: Vec<f64> = snapshots.iter().map(|p| p.elevation_angle).collect();
    let mut expected: Vec<f64> = (0..=18).map(|i| f64::from(i * 10)).collect();
    expected.extend((0..=18).rev().map(|i| f64::from(i * 10)));
    expected.push(0.0);
    assert_eq!(elevations, expected);

    let last = snapshots.last().unwrap();
    assert_eq!(last.current_cycle, 1);
    assert_eq!(last.points_collected, 362);
}

#[test]
fn faulting_listeners_do_not_affect_the_scan() {
    let (engine, _log) = engine_with(fast_config(Some(1)), RigSetup::default());
    engine.initialize().unwrap();

    engine.subscribe_progress(|_| panic!("progress listener bug"));
    engine.subscribe_points(|_| Err("sink disconnected".into()));
    let received = Arc::new(Mutex::new(0usize));
    {
        let received = received.clone();
        engine.subscribe_points(move |batch| {
            *received.lock() += batch.len();
            Ok(())
        });
    }

    assert!(engine.start_scan());
    assert!(wait_idle(&engine));
    assert_eq!(engine.state(), ScanState::Idle);
    assert_eq!(*received.lock(), 362);
}

#[test]
fn blocking_calls_from_a_listener_are_rejected() {
    let engine = Arc::new(ScanEngine::new(
        fast_config(Some(1)),
        drivers(&SharedLog::default(), RigSetup::default()),
    ));
    engine.initialize().unwrap();

    let outcome: Arc<Mutex<Option<Result<(), ScanError>>>> = Arc::default();
    {
        let weak = Arc::downgrade(&engine);
        let outcome = outcome.clone();
        engine.subscribe_state(move |state| {
            if *state == ScanState::Idle {
                if let Some(engine) = weak.upgrade() {
                    *outcome.lock() = Some(engine.reset());
                }
            }
            Ok(())
        });
    }

    assert!(engine.start_scan());
    assert!(wait_idle(&engine));
    assert!(wait_until(Duration::from_secs(1), || outcome.lock().is_some()));
    assert!(matches!(
        outcome.lock().take(),
        Some(Err(ScanError::WorkerReentry("reset")))
    ));
}

#[test]
fn close_releases_hardware() {
    let (engine, log) = engine_with(fast_config(None), RigSetup::default());
    engine.initialize().unwrap();
    assert!(engine.start_scan());
    engine.close().unwrap();

    assert!(!engine.is_initialized());
    assert!(!engine.state().is_active());
    assert_eq!(log.lock().closed, 3);
    assert!(!engine.start_scan());
}
