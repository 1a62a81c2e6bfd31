// Progress reporting and cancellation for aggregation runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

/// Position of an aggregation run within the fetched comment list.
///
/// `total` is the number of comments fetched, before filtering, so the
/// fraction reaches 1.0 even when most comments were skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanProgress {
    /// Comments scanned so far (classified, skipped, or failed).
    pub scanned: usize,
    /// Comments fetched.
    pub total: usize,
}

impl ScanProgress {
    /// Fraction of fetched comments scanned, in [0, 1].
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.scanned as f64 / self.total as f64
    }
}

/// Cooperative cancellation flag, checked between comments.
///
/// Clones share the same flag, so a handle can be kept by whoever needs to
/// stop the run (a web request, a signal handler) while the aggregator polls.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress callback that ignores every event.
pub fn no_progress(_: ScanProgress) {}
