//! Cooperative cancellation for in-flight encrypt/decrypt jobs.
//!
//! There is no intrinsic timeout inside the codec; a caller layers one on
//! top by flipping the token from another thread or task after a deadline.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A cheap, cloneable flag checked at state-machine boundaries in
/// [`crate::pipeline`].
///
/// Canceling after a file's header has been written does not roll back the
/// partial output; the caller is expected to delete it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Signal cancellation. Safe to call from any thread, any number of
    /// times.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation has been signalled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
