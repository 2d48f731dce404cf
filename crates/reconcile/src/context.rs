//! Progress reporting hooks
//!
//! These traits let the engine report progress without depending on a
//! specific terminal UI.

use crate::error::Error;

/// Progress callback for bulk operations
///
/// Called from worker threads, so implementations must be thread-safe.
pub trait ProgressCallback: Send + Sync {
    /// Called when a batch of `count` items starts
    fn on_batch_start(&self, label: &str, count: usize);

    /// Called after each item, with its error if it failed
    fn on_item_complete(&self, id: &str, error: Option<&Error>);

    /// Called when the batch completes or stops
    fn on_batch_complete(&self);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_batch_start(&self, _label: &str, _count: usize) {}
    fn on_item_complete(&self, _id: &str, _error: Option<&Error>) {}
    fn on_batch_complete(&self) {}
}

/// Progress callback that logs each failed item
pub struct LogProgress;

impl ProgressCallback for LogProgress {
    fn on_batch_start(&self, label: &str, count: usize) {
        log::info!("{label}: {count} items");
    }

    fn on_item_complete(&self, id: &str, error: Option<&Error>) {
        match error {
            Some(e) => log::warn!("{id}: {e}"),
            None => log::debug!("{id}: ok"),
        }
    }

    fn on_batch_complete(&self) {}
}
