//! Progress reporting seam.
//!
//! The download manager reports cumulative bytes through these traits; the
//! CLI plugs in an indicatif implementation, tests and `--quiet` use
//! [`NullProgress`].

/// Factory for per-download progress handles.
pub trait ProgressSink {
    /// Begin reporting one download. `total` is the declared length, when
    /// the remote sent one.
    fn start(&self, name: &str, total: Option<u64>) -> Box<dyn ProgressHandle>;
}

/// Live progress for a single download.
pub trait ProgressHandle {
    /// Another `delta` bytes were written to disk.
    fn advance(&mut self, delta: u64);

    /// The download finished (successfully or not).
    fn finish(&mut self);
}

/// Sink that reports nothing.
pub struct NullProgress;

struct NullHandle;

impl ProgressSink for NullProgress {
    fn start(&self, _name: &str, _total: Option<u64>) -> Box<dyn ProgressHandle> {
        Box::new(NullHandle)
    }
}

impl ProgressHandle for NullHandle {
    fn advance(&mut self, _delta: u64) {}

    fn finish(&mut self) {}
}
