//! Scan requests and their outcomes.

use crate::error::ScanError;
use pagewalk_core::{ItemId, Timestamp};
use serde::{Deserialize, Serialize};

/// The items of one visited page, possibly sliced to the requested bounds.
pub type Batch<T> = Vec<T>;

/// Which sub-range of a listing to retrieve.
///
/// Identifier bounds are inclusive. Optional page bounds of `None` or `0`
/// fall back to their defaults; required page bounds of `0` and empty
/// identifiers reject the scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ScanRequest {
    /// Everything from `from_page` (default 1) up to and including `to_id`.
    TillId {
        to_id: ItemId,
        #[serde(default)]
        from_page: Option<u32>,
    },
    /// `from_id` and everything after it. `to_page` bounds the search for
    /// `from_id` (exclusive).
    SinceId {
        from_id: ItemId,
        #[serde(default)]
        to_page: Option<u32>,
    },
    /// Items from `from_id` through `to_id`, searching from `from_page`
    /// (default 1) and stopping before `to_page`.
    BetweenIds {
        from_id: ItemId,
        to_id: ItemId,
        #[serde(default)]
        from_page: Option<u32>,
        #[serde(default)]
        to_page: Option<u32>,
    },
    /// Pages `1..=to_page`.
    TillPage { to_page: u32 },
    /// Pages from `from_page` until the listing stops advancing.
    SincePage { from_page: u32 },
    /// Pages `from_page..=to_page`, in either direction.
    BetweenPages { from_page: u32, to_page: u32 },
    /// A single page. Page 0 is read as page 1.
    OnePage { page: u32 },
}

impl ScanRequest {
    /// Short name of the boundary mode, for logs.
    #[must_use]
    pub fn mode(&self) -> &'static str {
        match self {
            Self::TillId { .. } => "till_id",
            Self::SinceId { .. } => "since_id",
            Self::BetweenIds { .. } => "between_ids",
            Self::TillPage { .. } => "till_page",
            Self::SincePage { .. } => "since_page",
            Self::BetweenPages { .. } => "between_pages",
            Self::OnePage { .. } => "one_page",
        }
    }

    /// Check required arguments.
    pub fn validate(&self) -> Result<(), ScanError> {
        match self {
            Self::TillId { to_id, .. } => require_id("to_id", to_id),
            Self::SinceId { from_id, .. } => require_id("from_id", from_id),
            Self::BetweenIds { from_id, to_id, .. } => {
                require_id("from_id", from_id)?;
                require_id("to_id", to_id)
            }
            Self::TillPage { to_page } => require_page("to_page", *to_page),
            Self::SincePage { from_page } => require_page("from_page", *from_page),
            Self::BetweenPages { from_page, to_page } => {
                require_page("from_page", *from_page)?;
                require_page("to_page", *to_page)
            }
            Self::OnePage { .. } => Ok(()),
        }
    }
}

fn require_id(argument: &'static str, id: &ItemId) -> Result<(), ScanError> {
    if id.is_empty() {
        Err(ScanError::MissingArgument { argument })
    } else {
        Ok(())
    }
}

fn require_page(argument: &'static str, value: u32) -> Result<(), ScanError> {
    if value == 0 {
        Err(ScanError::InvalidPage { argument, value })
    } else {
        Ok(())
    }
}

/// Why a scan stopped. Every variant is terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The boundary identifier was found and the batch cut there.
    Truncated,
    /// Two consecutive pages had the same leading item (or both had none).
    Converged,
    /// The page ceiling was reached before anything else stopped the scan.
    PageCeiling,
    /// Every page of an explicit range was visited.
    RangeExhausted,
    /// A single page was fetched.
    SinglePage,
    /// The scan's cancellation token fired.
    Cancelled,
    /// The request was refused before any page was fetched.
    Rejected(ScanError),
}

/// Batches collected by one scan, in visitation order.
#[derive(Debug, Clone)]
pub struct ScanResult<T> {
    /// One batch per page that contributed items
    pub batches: Vec<Batch<T>>,
    /// What ended the scan
    pub stop: StopReason,
    /// Number of page fetches performed
    pub pages_visited: u32,
    /// When the scan started
    pub started_at: Timestamp,
    /// When the scan stopped
    pub finished_at: Timestamp,
}

impl<T> ScanResult<T> {
    pub(crate) fn rejected(error: ScanError) -> Self {
        let now = Timestamp::now();
        Self {
            batches: Vec::new(),
            stop: StopReason::Rejected(error),
            pages_visited: 0,
            started_at: now,
            finished_at: now,
        }
    }

    /// Whether the scan found no data at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Whether the request was refused.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self.stop, StopReason::Rejected(_))
    }

    /// Total number of items over all batches.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.batches.iter().map(Vec::len).sum()
    }

    /// All items in order, across batches.
    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.batches.iter().flatten()
    }

    /// The batches, or `None` when no data was found.
    #[must_use]
    pub fn into_batches(self) -> Option<Vec<Batch<T>>> {
        if self.batches.is_empty() {
            None
        } else {
            Some(self.batches)
        }
    }
}
