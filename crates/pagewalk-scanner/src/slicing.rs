//! Boundary slicing of a single batch by item identifier.
//!
//! All helpers compare normalized [`ItemId`]s by value and search linearly.
//! A boundary that is not present in the batch leaves that side of the batch
//! open, so a batch containing neither boundary comes back unchanged.

use pagewalk_core::{ItemId, ListingItem};

/// Whether any item of `batch` has identifier `id`.
pub fn contains_id<T: ListingItem>(batch: &[T], id: &ItemId) -> bool {
    batch.iter().any(|item| item.item_id() == *id)
}

/// Keep items up to and including the first occurrence of `to_id`.
pub fn slice_till_id<T: ListingItem>(mut batch: Vec<T>, to_id: &ItemId) -> Vec<T> {
    if let Some(index) = batch.iter().position(|item| item.item_id() == *to_id) {
        batch.truncate(index + 1);
    }
    batch
}

/// Keep items from the last occurrence of `from_id` to the end of the batch.
///
/// Walks the batch from its end, so with repeated identifiers the cut is at
/// the occurrence closest to the end.
pub fn slice_since_id<T: ListingItem>(mut batch: Vec<T>, from_id: &ItemId) -> Vec<T> {
    match batch.iter().rposition(|item| item.item_id() == *from_id) {
        Some(index) => batch.split_off(index),
        None => batch,
    }
}

/// Keep the inclusive range `[from_id, to_id]`.
///
/// A missing `from_id` opens the range at the start of the batch, a missing
/// `to_id` opens it at the end. If `to_id` precedes `from_id` the range is
/// empty.
pub fn slice_between_ids<T: ListingItem>(
    mut batch: Vec<T>,
    from_id: &ItemId,
    to_id: &ItemId,
) -> Vec<T> {
    let mut start = None;
    let mut end = None;
    for (index, item) in batch.iter().enumerate() {
        let id = item.item_id();
        if id == *from_id {
            start = Some(index);
        }
        if id == *to_id {
            end = Some(index);
        }
        if start.is_some() && end.is_some() {
            break;
        }
    }

    if start.is_none() && end.is_none() {
        return batch;
    }

    let start = start.unwrap_or(0);
    let end = end.unwrap_or(batch.len().saturating_sub(1));
    if start > end {
        return Vec::new();
    }

    batch.truncate(end + 1);
    batch.split_off(start)
}
