//! Handle to a scan running on the tokio runtime.

use crate::error::{Result, ScanError};
use crate::progress::{ProgressTracker, ScanHandle};
use crate::request::ScanResult;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A spawned scan.
///
/// Progress can be polled through [`ScanTask::progress`] until the scan
/// stops, after which its entry is gone and `progress` returns `None`.
#[derive(Debug)]
pub struct ScanTask<T> {
    handle: ScanHandle,
    tracker: ProgressTracker,
    decimal_places: u32,
    cancel: CancellationToken,
    join: JoinHandle<ScanResult<T>>,
}

impl<T> ScanTask<T> {
    pub(crate) fn new(
        handle: ScanHandle,
        tracker: ProgressTracker,
        decimal_places: u32,
        cancel: CancellationToken,
        join: JoinHandle<ScanResult<T>>,
    ) -> Self {
        Self {
            handle,
            tracker,
            decimal_places,
            cancel,
            join,
        }
    }

    /// Progress handle of this scan.
    #[must_use]
    pub fn handle(&self) -> ScanHandle {
        self.handle
    }

    /// Rounded completion percentage, or `None` once the scan has stopped.
    #[must_use]
    pub fn progress(&self) -> Option<f64> {
        self.tracker.get_rounded(self.handle, self.decimal_places)
    }

    /// Ask the scan to stop before its next page fetch.
    ///
    /// Batches collected so far are still returned by [`ScanTask::wait`].
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels this scan.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Whether the scan has stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Abort the task outright, discarding its batches.
    pub fn abort(&self) {
        self.join.abort();
    }

    /// Wait for the scan to stop.
    pub async fn wait(self) -> Result<ScanResult<T>> {
        self.join.await.map_err(|e| {
            tracing::error!("Scan task {} failed: {}", self.handle, e);
            ScanError::TaskFailed(e.to_string())
        })
    }
}
