//! Per-conversion context: cancellation and progress reporting.

use std::future::Future;
use std::sync::Arc;

use frameforge_common::{Error, Result};
use tokio_util::sync::CancellationToken;

/// Sender for reporting progress from within a pipeline.
///
/// Wraps a callback that receives a progress percentage (0.0 -- 100.0) and
/// the name of the current stage.
pub struct ProgressSender {
    callback: Box<dyn Fn(f32, &str) + Send + Sync>,
}

impl ProgressSender {
    /// Create a new sender from the given callback.
    pub fn new(callback: impl Fn(f32, &str) + Send + Sync + 'static) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Create a no-op sender that discards all progress reports.
    pub fn noop() -> Self {
        Self {
            callback: Box::new(|_, _| {}),
        }
    }

    /// Report progress, clamped to 0-100.
    pub fn send(&self, progress: f32, stage: &str) {
        (self.callback)(progress.clamp(0.0, 100.0), stage);
    }
}

impl std::fmt::Debug for ProgressSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressSender").finish_non_exhaustive()
    }
}

/// Context passed to every pipeline stage.
#[derive(Debug, Clone)]
pub struct ConversionContext {
    /// Checked between frames and raced against every suspension point.
    pub cancellation: CancellationToken,
    /// Channel for reporting progress to the caller.
    pub progress: Arc<ProgressSender>,
}

impl Default for ConversionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionContext {
    pub fn new() -> Self {
        Self {
            cancellation: CancellationToken::new(),
            progress: Arc::new(ProgressSender::noop()),
        }
    }

    /// Builder: attach a cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Builder: attach a progress sender.
    pub fn with_progress(mut self, progress: ProgressSender) -> Self {
        self.progress = Arc::new(progress);
        self
    }

    /// Fail with [`Error::Cancelled`] if cancellation has been requested.
    pub fn check(&self) -> Result<()> {
        if self.cancellation.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Await `fut` unless cancellation fires first.
    ///
    /// On cancellation the future is dropped, releasing whatever it owns.
    pub async fn guard<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;
        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => Err(Error::Cancelled),
            out = fut => out,
        }
    }

    /// Report progress for `stage`.
    pub fn report(&self, progress: f32, stage: &str) {
        self.progress.send(progress, stage);
    }
}
