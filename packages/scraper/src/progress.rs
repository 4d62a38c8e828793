//! Progress reporting for scrape runs.
//!
//! The pipeline reports one step per project through [`ProgressCallback`];
//! the CLI renders it with `indicatif`, tests pass [`NullProgress`].

use std::sync::Arc;

/// Receives progress updates from the pipeline.
pub trait ProgressCallback: Send + Sync {
    /// Sets the number of projects about to be processed.
    fn set_total(&self, total: u64);

    /// Advances by `delta` projects.
    fn inc(&self, delta: u64);

    /// Shows what is currently being worked on.
    fn set_message(&self, msg: String);

    /// Marks the run as done.
    fn finish(&self, msg: String);
}

/// Discards every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// A shared [`NullProgress`] for callers that do not render progress.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
