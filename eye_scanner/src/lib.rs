//! # Spatial Eye Scanner Library
//!
//! Scan orchestration for a two-axis time-of-flight scanner: an elevation
//! servo sweeps the sensor up and down while a stepper advances the azimuth
//! once per cycle. Every valid reading becomes a Cartesian point in a
//! capacity-bounded [`PointStore`].
//!
//! ## Components
//!
//! 1. **ScanEngine**: lifecycle API and the single background worker
//! 2. **ScanStateMachine**: Idle / Scanning / Paused / Stopping / Error
//! 3. **Sweep**: the forward/reverse elevation legs and azimuth stepping
//! 4. **PointStore**: thread-safe point buffer with block eviction
//! 5. **Listeners**: progress, point batch and state registries
//!
//! ## Cancellation
//!
//! Stop and pause are level-triggered flags polled at every sample
//! boundary and inside every wait, so a stop takes effect within one poll
//! interval and a pause never moves the axes.

pub mod batch;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod listeners;
pub mod point_store;
pub mod rig;
pub mod signals;
pub mod state;
pub mod sweep;

pub use engine::ScanEngine;
pub use error::{ListenerError, ScanError};
pub use point_store::PointStore;
