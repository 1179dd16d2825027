//! Pagewalk Scanner - bounded-concurrency range scanning over paginated listings.
//!
//! The [`RangeScanner`] retrieves sub-ranges of a listing exposed by a
//! [`pagewalk_core::PageSource`], bounded either by item identifiers or by page
//! numbers. Every page fetch, across all scans sharing a scanner, goes through
//! one FIFO [`ConcurrencyGate`], and so do single documents read with
//! [`RangeScanner::fetch_document`]. Scans started with [`RangeScanner::spawn`]
//! report their completion percentage to a [`ProgressTracker`].
//!
//! # Modules
//!
//! - [`error`] - Argument and task errors
//! - [`gate`] - Resizable FIFO permit pool for page fetches
//! - [`progress`] - Keyed completion percentages with RAII cleanup
//! - [`request`] - Scan requests, stop reasons and results
//! - [`scanner`] - The range scanner and its traversal primitives
//! - [`slicing`] - Cutting a batch at identifier boundaries
//! - [`task`] - Handle to a spawned scan
//!
//! # Example
//!
//! ```rust,ignore
//! use pagewalk_core::Listing;
//! use pagewalk_scanner::RangeScanner;
//!
//! let scanner = RangeScanner::new(source, 2);
//! let result = scanner.scan_till_page(&Listing::gallery("someartist"), 3).await;
//! for item in result.items() {
//!     println!("{:?}", item);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod gate;
pub mod progress;
pub mod request;
pub mod scanner;
pub mod slicing;
pub mod task;

pub use error::{Result, ScanError};
pub use gate::{ConcurrencyGate, GatePermit};
pub use progress::{ProgressTracker, ScanHandle, TrackedProgress};
pub use request::{Batch, ScanRequest, ScanResult, StopReason};
pub use scanner::RangeScanner;
pub use task::ScanTask;
