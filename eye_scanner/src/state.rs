//! Scan lifecycle state machine module root.

pub mod machine;

pub use machine::{ScanEvent, ScanStateMachine, TransitionResult};
