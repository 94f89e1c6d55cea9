//! System-wide constants for the Spatial Eye workspace.
//!
//! Single source of truth for the reference hardware defaults
//! (MG996-class servo, 28BYJ-48 stepper, VL53L1X time-of-flight sensor).
//! Every serde default in [`crate::config`] and [`crate::hal::config`]
//! resolves to one of these.

/// Canonical service name (used for logging).
pub const SCANNER_SERVICE_NAME: &str = "eye-scanner";

/// Degrees in a full azimuth revolution.
pub const FULL_CIRCLE_DEG: f64 = 360.0;

// ─── Sweep ──────────────────────────────────────────────────────────

/// Elevation sweep start (0° = +Z).
pub const ELEVATION_START_DEG: f64 = 0.0;

/// Elevation sweep end.
pub const ELEVATION_END_DEG: f64 = 180.0;

/// Elevation step between samples.
pub const ELEVATION_STEP_DEG: f64 = 1.0;

/// Azimuth increment applied after every cycle.
pub const AZIMUTH_INCREMENT_DEG: f64 = 1.0;

/// Servo settle time before each ranging read.
pub const SETTLE_TIME_MS: u64 = 30;

/// Dwell at each end of a sweep leg.
pub const END_DWELL_MS: u64 = 500;

/// Elevation movement between two progress snapshots.
pub const PROGRESS_INTERVAL_DEG: f64 = 10.0;

/// Granularity of every interruptible wait inside the worker.
pub const POLL_INTERVAL_MS: u64 = 10;

/// Bounded wait for the worker to exit on reset/close.
pub const JOIN_TIMEOUT_MS: u64 = 5000;

// ─── Point store ────────────────────────────────────────────────────

/// Default point store capacity.
pub const STORE_CAPACITY: usize = 100_000;

/// Default eviction block as a fraction of capacity.
pub const EVICTION_FRACTION: f64 = 0.01;

/// Lower bound for the eviction block (clamped to capacity).
pub const EVICTION_MIN_BLOCK: usize = 1000;

// ─── Batching ───────────────────────────────────────────────────────

/// Points per released batch.
pub const BATCH_SIZE: usize = 10;

/// Maximum age of a pending batch.
pub const BATCH_INTERVAL_MS: u64 = 100;

// ─── Hardware ───────────────────────────────────────────────────────

/// Servo mechanical minimum.
pub const SERVO_MIN_ANGLE_DEG: f64 = 0.0;

/// Servo mechanical maximum.
pub const SERVO_MAX_ANGLE_DEG: f64 = 180.0;

/// Per-degree delay for smooth servo moves.
pub const SERVO_STEP_DELAY_MS: u64 = 50;

/// Stepper full steps per revolution (half-step sequence).
pub const STEPPER_STEPS_PER_REVOLUTION: u32 = 4096;

/// Delay between stepper coil steps.
pub const STEPPER_STEP_DELAY_US: u64 = 2000;

/// Minimum valid ranging distance.
pub const TOF_MIN_RANGE_MM: f64 = 10.0;

/// Maximum valid ranging distance.
pub const TOF_MAX_RANGE_MM: f64 = 4000.0;

/// Ranging timing budget.
pub const TOF_TIMING_BUDGET_US: u64 = 50_000;
