//! Ordered observer registries.
//!
//! Listeners run synchronously on the notifying thread in registration
//! order. A listener that returns an error or panics is logged and skipped;
//! the remaining listeners still run.

use crate::error::ListenerError;
use parking_lot::RwLock;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::error;

/// Boxed listener callback.
pub type Listener<T> = Arc<dyn Fn(&T) -> Result<(), ListenerError> + Send + Sync>;

/// Append-only list of listeners for one event kind.
pub struct ListenerRegistry<T: ?Sized> {
    kind: &'static str,
    listeners: RwLock<Vec<Listener<T>>>,
}

impl<T: ?Sized> ListenerRegistry<T> {
    /// Empty registry; `kind` appears in fault logs.
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Append a listener.
    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&T) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.listeners.write().push(Arc::new(listener));
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    /// True if nobody listens.
    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    /// Deliver `event` to every listener; returns how many faulted.
    pub fn notify(&self, event: &T) -> usize {
        // Snapshot so a listener may subscribe without deadlocking.
        let snapshot: Vec<Listener<T>> = self.listeners.read().clone();
        let mut faults = 0;

        for (index, listener) in snapshot.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    faults += 1;
                    error!("{} listener #{} failed: {}", self.kind, index, e);
                }
                Err(payload) => {
                    faults += 1;
                    error!(
                        "{} listener #{} panicked: {}",
                        self.kind,
                        index,
                        panic_message(payload.as_ref())
                    );
                }
            }
        }
        faults
    }
}

impl<T: ?Sized> std::fmt::Debug for ListenerRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("kind", &self.kind)
            .field("listeners", &self.len())
            .finish()
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
