//! Progress reporting and cooperative cancellation.
//!
//! The organizer calls [`ProgressSink::report`] after every file and polls
//! [`ProgressSink::is_cancelled`] before the next one. These two calls are the
//! only points where a caller can observe or stop a run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Receives progress from a running organize operation.
pub trait ProgressSink {
    /// Called after each file with the completed fraction in `(0.0, 1.0]`.
    fn report(&mut self, fraction: f64);

    /// Polled before each file; returning `true` stops the run.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// A sink that ignores progress and never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _fraction: f64) {}
}

/// A cancellation flag that can be shared with another thread.
///
/// Clones share the same flag. Setting it never interrupts a move in flight;
/// the organizer only notices it at the next file.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl ProgressSink for CancelFlag {
    fn report(&mut self, _fraction: f64) {}

    fn is_cancelled(&self) -> bool {
        self.is_set()
    }
}
