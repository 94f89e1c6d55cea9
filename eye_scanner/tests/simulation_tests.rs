//! End-to-end scans against the simulation driver loaded through the registry.

use eye_common::config::load_scanner_config;
use eye_common::scan::ScanState;
use eye_hal::{DriverRegistry, register_all_drivers};
use eye_scanner::ScanEngine;
use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

const SCANNER_TOML: &str = r#"
[shared]
service_name = "eye-sim-test"

[scan]
elevation_step = 5.0
azimuth_increment = 90.0
settle_time_ms = 0
end_dwell_ms = 0
poll_interval_ms = 1

[batch]
size = 16

[hardware.simulation]
room_half_width_mm = 1500.0
room_half_depth_mm = 1500.0
floor_mm = 800.0
ceiling_mm = 1700.0
time_scale = 0.0
"#;

fn simulated_engine() -> ScanEngine {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(SCANNER_TOML.as_bytes()).unwrap();
    file.flush().unwrap();
    let config = load_scanner_config(file.path()).unwrap();

    let mut registry = DriverRegistry::new();
    register_all_drivers(&mut registry);
    let drivers = registry.create("simulation", &config.hardware).unwrap();
    ScanEngine::new(config, drivers)
}

fn wait_idle(engine: &ScanEngine) {
    let deadline = Instant::now() + Duration::from_secs(20);
    while engine.state().is_active() {
        assert!(Instant::now() < deadline, "scan did not finish");
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn full_revolution_stays_inside_the_room() {
    let engine = simulated_engine();
    engine.initialize().unwrap();
    assert!(engine.start_scan());
    wait_idle(&engine);

    assert_eq!(engine.state(), ScanState::Idle);
    let progress = engine.progress();
    assert_eq!(progress.current_cycle, 4);
    assert_eq!(progress.total_cycles, 4);

    // 37 positions per leg, two legs, four cycles; every ray hits a wall.
    let store = engine.point_store();
    assert_eq!(store.len(), 4 * 2 * 37);

    let bounds = store.bounds().unwrap();
    assert!(bounds.min[0] >= -1501.0 && bounds.max[0] <= 1501.0);
    assert!(bounds.min[1] >= -1501.0 && bounds.max[1] <= 1501.0);
    assert!((bounds.max[2] - 1700.0).abs() < 1.0);
    assert!((bounds.min[2] + 800.0).abs() < 1.0);
}

#[test]
fn straight_up_sample_hits_the_ceiling() {
    let engine = simulated_engine();
    engine.initialize().unwrap();
    assert!(engine.start_scan());
    wait_idle(&engine);

    let first = engine.point_store().points()[0];
    assert_eq!(first.elevation, 0.0);
    assert_eq!(first.distance, 1700.0);
    assert!((first.z - 1700.0).abs() < 1e-9);
}

#[test]
fn unknown_driver_is_reported() {
    let mut registry = DriverRegistry::new();
    register_all_drivers(&mut registry);
    let result = registry.create("ethercat", &Default::default());
    assert!(result.is_err());
}
