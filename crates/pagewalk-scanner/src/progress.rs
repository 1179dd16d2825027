//! Keyed store of scan completion percentages.
//!
//! The tracker is pull-based: scans write values, anyone holding a
//! [`ScanHandle`] may read them at their own cadence. It is a plain keyed
//! store and does not enforce monotonic progress.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

/// Highest number of decimal places honoured when rounding.
const MAX_DECIMAL_PLACES: u32 = 10;

/// Opaque correlation token for one tracked scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanHandle(Uuid);

impl ScanHandle {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ScanHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shared map from scan handle to percentage (0-100).
///
/// Cloning is cheap and clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    entries: Arc<RwLock<HashMap<ScanHandle, f64>>>,
}

impl ProgressTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh handle with progress 0.
    pub fn create(&self) -> ScanHandle {
        let handle = ScanHandle::generate();
        self.write().insert(handle, 0.0);
        handle
    }

    /// Store `value` for `handle`. Returns `false` if the handle is unknown.
    pub fn set(&self, handle: ScanHandle, value: f64) -> bool {
        match self.write().get_mut(&handle) {
            Some(entry) => {
                *entry = value;
                true
            }
            None => false,
        }
    }

    /// Last stored value, or `None` if the handle is unknown.
    #[must_use]
    pub fn get(&self, handle: ScanHandle) -> Option<f64> {
        self.read().get(&handle).copied()
    }

    /// Last stored value rounded to `decimal_places` (capped at 10).
    #[must_use]
    pub fn get_rounded(&self, handle: ScanHandle, decimal_places: u32) -> Option<f64> {
        self.get(handle).map(|value| round_to(value, decimal_places))
    }

    /// Remove the entry. Returns whether it existed.
    pub fn delete(&self, handle: ScanHandle) -> bool {
        self.write().remove(&handle).is_some()
    }

    /// Whether `handle` has an entry.
    #[must_use]
    pub fn contains(&self, handle: ScanHandle) -> bool {
        self.read().contains_key(&handle)
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether no scan is being tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Create an entry that is deleted when the returned guard is dropped.
    pub fn track(&self) -> TrackedProgress {
        TrackedProgress {
            tracker: self.clone(),
            handle: self.create(),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<ScanHandle, f64>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<ScanHandle, f64>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn round_to(value: f64, decimal_places: u32) -> f64 {
    let places = i32::try_from(decimal_places.min(MAX_DECIMAL_PLACES)).unwrap_or(0);
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}

/// Progress entry owned by one running scan.
#[derive(Debug)]
pub struct TrackedProgress {
    tracker: ProgressTracker,
    handle: ScanHandle,
}

impl TrackedProgress {
    /// Handle callers poll with.
    #[must_use]
    pub fn handle(&self) -> ScanHandle {
        self.handle
    }

    /// Store a new percentage.
    pub fn set(&self, value: f64) {
        self.tracker.set(self.handle, value);
    }
}

impl Drop for TrackedProgress {
    fn drop(&mut self) {
        self.tracker.delete(self.handle);
    }
}
