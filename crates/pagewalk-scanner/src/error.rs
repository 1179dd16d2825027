//! Scanner error types.
//!
//! `ScanError` covers invalid scan arguments and spawned scans that could not
//! be joined. Page fetch failures are not scan errors; they read as empty
//! pages (see [`pagewalk_core::SourceError`]).

use thiserror::Error;

/// Reasons a scan is refused or could not be observed to completion.
///
/// Argument errors never surface as `Err` from a scan operation: the scan is
/// reported as "no data" with [`crate::StopReason::Rejected`] carrying the
/// error, and the error is logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// A required identifier was absent or blank
    #[error("no {argument} given")]
    MissingArgument {
        /// Name of the missing argument (e.g. `to_id`)
        argument: &'static str,
    },

    /// A required page number was 0
    #[error("{argument} must be greater than 0, got {value}")]
    InvalidPage {
        /// Name of the page argument (e.g. `from_page`)
        argument: &'static str,
        /// Value that was given
        value: u32,
    },

    /// The spawned scan panicked or was aborted before finishing
    #[error("scan task failed: {0}")]
    TaskFailed(String),
}

/// Result type alias for waiting on scans.
pub type Result<T> = std::result::Result<T, ScanError>;
