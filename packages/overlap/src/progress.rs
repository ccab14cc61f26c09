//! Progress reporting hook for long-running builds.
//!
//! The builder reports through a [`ProgressCallback`] trait object instead
//! of printing, so resolution stays a pure computation: CLIs render bars,
//! tests and library callers pass [`NullProgress`].

use std::sync::Arc;

/// Receiver for progress updates from a running build or ingest.
///
/// Implementations must be `Send + Sync`; the parallel build shares one
/// callback across blocking workers through an `Arc`.
pub trait ProgressCallback: Send + Sync {
    /// Announce the total units of work, when known up front.
    fn set_total(&self, total: u64);

    /// Move to an absolute position.
    fn set_position(&self, pos: u64);

    /// Advance by `delta` units.
    fn inc(&self, delta: u64);

    /// Replace the message shown next to the indicator.
    fn set_message(&self, msg: String);

    /// Complete with a final message.
    fn finish(&self, msg: String);

    /// Complete and remove the indicator.
    fn finish_and_clear(&self);
}

/// A [`ProgressCallback`] that discards every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn set_position(&self, _pos: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
    fn finish_and_clear(&self) {}
}

/// Shared [`NullProgress`] for callers that do not report progress.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
