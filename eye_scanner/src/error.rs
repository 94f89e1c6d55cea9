//! Engine error types.

use eye_common::hal::driver::HalError;
use thiserror::Error;

/// Errors surfaced by the scan engine lifecycle.
#[derive(Debug, Error)]
pub enum ScanError {
    /// A capability failed to initialize; the engine is in `Error`.
    #[error("Initialization failed: {0}")]
    Initialization(#[source] HalError),

    /// A capability failed while the scan loop was running.
    #[error("Hardware fault: {0}")]
    Hardware(#[from] HalError),

    /// The scan worker panicked.
    #[error("Scan worker panicked: {0}")]
    WorkerPanicked(String),

    /// The scan worker did not finish within the join timeout.
    #[error("Scan worker did not stop within {0} ms")]
    ShutdownTimeout(u64),

    /// A blocking lifecycle call was issued from the scan worker itself.
    #[error("{0} called from the scan worker thread")]
    WorkerReentry(&'static str),

    /// Hardware is not initialized.
    #[error("Scan hardware not initialized")]
    NotInitialized,
}

/// Error a listener may return; caught and logged by the registry.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;
