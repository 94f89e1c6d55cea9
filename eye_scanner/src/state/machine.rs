//! ScanState transitions.
//!
//! Idle → Scanning ⇄ Paused → Stopping → Idle, with Error reachable from
//! anywhere and left only through a reset.

use eye_common::scan::ScanState;

/// Result of a ScanState transition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition succeeded with the new state.
    Ok(ScanState),
    /// Transition rejected with a reason.
    Rejected(&'static str),
}

/// Lifecycle event that can trigger a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanEvent {
    /// `start_scan` accepted, worker about to spawn.
    Start,
    /// `pause_scan`.
    Pause,
    /// `resume_scan`.
    Resume,
    /// `stop_scan`.
    Stop,
    /// Worker left its loop without a fault.
    Finish,
    /// Worker fault or capability initialization failure.
    Fault,
    /// `reset` or successful re-initialization.
    Reset,
}

/// Holder of the current ScanState.
#[derive(Debug, Clone)]
pub struct ScanStateMachine {
    state: ScanState,
}

impl ScanStateMachine {
    /// Create a new state machine in Idle.
    pub const fn new() -> Self {
        Self {
            state: ScanState::Idle,
        }
    }

    /// Current state.
    #[inline]
    pub const fn state(&self) -> ScanState {
        self.state
    }

    /// Attempt a transition given an event.
    ///
    /// Returns `TransitionResult::Ok(new_state)` on success,
    /// `TransitionResult::Rejected(reason)` if the transition is not valid.
    pub fn handle_event(&mut self, event: ScanEvent) -> TransitionResult {
        use ScanEvent::*;
        use ScanState::*;

        let next = match (self.state, event) {
            (Idle, Start) => Scanning,

            (Scanning, Pause) => Paused,
            (Paused, Resume) => Scanning,

            (Scanning | Paused, Stop) => Stopping,

            // Worker exit; a fault already moved us to Error.
            (Scanning | Paused | Stopping, Finish) => Idle,

            (_, Fault) => Error,

            (_, Reset) => Idle,

            _ => {
                return TransitionResult::Rejected(invalid_transition_reason(self.state, event));
            }
        };

        self.state = next;
        TransitionResult::Ok(next)
    }

    /// True if a worker owns the scan.
    #[inline]
    pub const fn is_active(&self) -> bool {
        self.state.is_active()
    }
}

impl Default for ScanStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid_transition_reason(state: ScanState, event: ScanEvent) -> &'static str {
    use ScanEvent::*;
    use ScanState::*;
    match (state, event) {
        (Error, _) => "Error: only Reset allowed",
        (_, Start) => "Start only allowed from Idle",
        (_, Pause) => "Pause only allowed while Scanning",
        (_, Resume) => "Resume only allowed while Paused",
        (_, Stop) => "Stop only allowed while Scanning or Paused",
        (Idle, Finish) => "Idle: no worker to finish",
        _ => "invalid event for current state",
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
