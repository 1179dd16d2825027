//! Shared types used across pagewalk.
//!
//! This module defines the identifier newtype, the listing identity and the
//! page container that flow between a page source and the scanner.

use crate::source::ListingItem;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Identifier of a listing item, normalized for comparison.
///
/// Source markup prefixes identifiers with `sid-` (submissions) or `jid-`
/// (journals). The prefix is stripped at construction so that `"sid-1234"`
/// and `"1234"` compare equal. Comparison is plain string equality: no
/// numeric ordering is implied.
///
/// An empty `ItemId` stands for "not supplied".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ItemId(String);

impl ItemId {
    /// Create an identifier from a raw value, stripping a known prefix.
    #[must_use]
    pub fn new(raw: impl AsRef<str>) -> Self {
        static PREFIX_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = PREFIX_REGEX.get_or_init(|| Regex::new(r"^(?:sid|jid)-").expect("valid regex"));

        let raw = raw.as_ref().trim();
        Self(regex.replace(raw, "").into_owned())
    }

    /// Get the normalized value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether no identifier was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ItemId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for ItemId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<u64> for ItemId {
    fn from(raw: u64) -> Self {
        Self(raw.to_string())
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

/// Which paginated listing of an owner to read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingKind {
    /// Main gallery
    #[default]
    Gallery,
    /// Scraps folder
    Scraps,
    /// Favorites
    Favorites,
    /// Journal entries
    Journals,
}

impl ListingKind {
    /// All listing kinds, in a stable order.
    pub const ALL: [ListingKind; 4] = [
        ListingKind::Gallery,
        ListingKind::Scraps,
        ListingKind::Favorites,
        ListingKind::Journals,
    ];

    /// URL path segment of the listing root.
    #[must_use]
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Gallery => "gallery",
            Self::Scraps => "scraps",
            Self::Favorites => "favorites",
            Self::Journals => "journals",
        }
    }

    /// Whether pages of this listing are made of submission figures.
    #[must_use]
    pub fn is_submission_listing(&self) -> bool {
        !matches!(self, Self::Journals)
    }
}

impl fmt::Display for ListingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path_segment())
    }
}

/// Identity of one paginated listing: whose, and which kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Listing {
    /// Account name owning the listing
    pub owner: String,
    /// Listing kind
    pub kind: ListingKind,
}

impl Listing {
    /// Create a listing selector.
    #[must_use]
    pub fn new(owner: impl Into<String>, kind: ListingKind) -> Self {
        Self {
            owner: owner.into(),
            kind,
        }
    }

    /// Gallery of `owner`.
    #[must_use]
    pub fn gallery(owner: impl Into<String>) -> Self {
        Self::new(owner, ListingKind::Gallery)
    }

    /// Scraps of `owner`.
    #[must_use]
    pub fn scraps(owner: impl Into<String>) -> Self {
        Self::new(owner, ListingKind::Scraps)
    }

    /// Favorites of `owner`.
    #[must_use]
    pub fn favorites(owner: impl Into<String>) -> Self {
        Self::new(owner, ListingKind::Favorites)
    }

    /// Journals of `owner`.
    #[must_use]
    pub fn journals(owner: impl Into<String>) -> Self {
        Self::new(owner, ListingKind::Journals)
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of '{}'", self.kind, self.owner)
    }
}

/// A single read-only document of the site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "document", rename_all = "snake_case")]
pub enum DocumentRequest {
    /// One page of a listing
    ListingPage {
        /// Listing to read
        listing: Listing,
        /// 1-based page number
        page: u32,
    },
    /// The view page of a submission
    Submission {
        /// Submission identifier
        id: ItemId,
    },
    /// The page of a single journal entry
    Journal {
        /// Journal identifier
        id: ItemId,
    },
    /// The profile page of an account
    User {
        /// Account name
        name: String,
    },
}

impl DocumentRequest {
    /// Page `page` of `listing`.
    #[must_use]
    pub fn listing_page(listing: Listing, page: u32) -> Self {
        Self::ListingPage { listing, page }
    }

    /// View page of submission `id`.
    #[must_use]
    pub fn submission(id: impl AsRef<str>) -> Self {
        Self::Submission { id: ItemId::new(id) }
    }

    /// Page of journal `id`.
    #[must_use]
    pub fn journal(id: impl AsRef<str>) -> Self {
        Self::Journal { id: ItemId::new(id) }
    }

    /// Profile page of `name`.
    #[must_use]
    pub fn user(name: impl Into<String>) -> Self {
        Self::User { name: name.into() }
    }
}

impl fmt::Display for DocumentRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ListingPage { listing, page } => write!(f, "page {page} of {listing}"),
            Self::Submission { id } => write!(f, "submission {id}"),
            Self::Journal { id } => write!(f, "journal {id}"),
            Self::User { name } => write!(f, "user '{name}'"),
        }
    }
}

/// One fetched page of a listing.
///
/// `items` keeps the delivery order of the source (newest first). A page past
/// the end of data is a page with no items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Listing the page belongs to
    pub listing: Listing,
    /// 1-based page number
    pub number: u32,
    /// Items in delivery order
    pub items: Vec<T>,
}

impl<T> Page<T> {
    /// Create a page.
    #[must_use]
    pub fn new(listing: Listing, number: u32, items: Vec<T>) -> Self {
        Self {
            listing,
            number,
            items,
        }
    }

    /// A page without items.
    #[must_use]
    pub fn empty(listing: Listing, number: u32) -> Self {
        Self::new(listing, number, Vec::new())
    }

    /// Whether the page carries no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of items on the page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl<T: ListingItem> Page<T> {
    /// Identifier of the first item, if any.
    #[must_use]
    pub fn leading_id(&self) -> Option<ItemId> {
        self.items.first().map(ListingItem::item_id)
    }
}

/// Wrapper around `chrono::DateTime<Utc>` for consistent timestamp handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp representing the current moment.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Get the inner `DateTime<Utc>`.
    #[must_use]
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Milliseconds elapsed from `earlier` to `self`, zero if `earlier` is later.
    #[must_use]
    pub fn millis_since(&self, earlier: &Timestamp) -> u64 {
        u64::try_from((self.0 - earlier.0).num_milliseconds()).unwrap_or(0)
    }

    /// Format as RFC3339 string.
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Entry(&'static str);

    impl ListingItem for Entry {
        fn item_id(&self) -> ItemId {
            ItemId::new(self.0)
        }
    }

    #[test]
    fn test_item_id_strips_known_prefixes() {
        assert_eq!(ItemId::new("sid-51234").as_str(), "51234");
        assert_eq!(ItemId::new("jid-77").as_str(), "77");
        assert_eq!(ItemId::new("51234").as_str(), "51234");
        assert_eq!(ItemId::new("sid-51234"), ItemId::from(51234_u64));
    }

    #[test]
    fn test_item_id_keeps_unknown_prefixes() {
        assert_eq!(ItemId::new("xid-9").as_str(), "xid-9");
        // Only a leading prefix is stripped
        assert_eq!(ItemId::new("9sid-1").as_str(), "9sid-1");
    }

    #[test]
    fn test_item_id_empty_means_missing() {
        assert!(ItemId::new("").is_empty());
        assert!(ItemId::new("   ").is_empty());
        assert!(ItemId::default().is_empty());
        assert!(!ItemId::new("1").is_empty());
    }

    #[test]
    fn test_item_id_serde_normalizes() {
        let id: ItemId = serde_json::from_str("\"sid-42\"").expect("deserialize item id");
        assert_eq!(id.as_str(), "42");
        let json = serde_json::to_string(&id).expect("serialize item id");
        assert_eq!(json, "\"42\"");
    }

    #[test]
    fn test_listing_kind_segments() {
        let segments: Vec<_> = ListingKind::ALL.iter().map(ListingKind::path_segment).collect();
        assert_eq!(segments, vec!["gallery", "scraps", "favorites", "journals"]);
        assert!(ListingKind::Favorites.is_submission_listing());
        assert!(!ListingKind::Journals.is_submission_listing());
        assert_eq!(ListingKind::default(), ListingKind::Gallery);
    }

    #[test]
    fn test_listing_display() {
        assert_eq!(Listing::scraps("fender").to_string(), "scraps of 'fender'");
    }

    #[test]
    fn test_page_leading_id() {
        let listing = Listing::gallery("fender");
        let page = Page::new(listing.clone(), 1, vec![Entry("sid-3"), Entry("sid-2")]);
        assert_eq!(page.leading_id(), Some(ItemId::new("3")));
        assert_eq!(page.len(), 2);

        let empty: Page<Entry> = Page::empty(listing, 2);
        assert!(empty.is_empty());
        assert_eq!(empty.leading_id(), None);
    }

    #[test]
    fn test_timestamp_millis_since() {
        let earlier = Timestamp::now();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let later = Timestamp::now();
        assert!(later.millis_since(&earlier) >= 5);
        assert_eq!(earlier.millis_since(&later), 0);
    }

    #[test]
    fn test_document_request_normalizes_ids() {
        assert_eq!(
            DocumentRequest::submission("sid-5001"),
            DocumentRequest::Submission {
                id: ItemId::new("5001")
            }
        );
        assert_eq!(DocumentRequest::journal("jid-77").to_string(), "journal 77");
        assert_eq!(
            DocumentRequest::listing_page(Listing::scraps("fender"), 2).to_string(),
            "page 2 of scraps of 'fender'"
        );
    }

    #[test]
    fn test_document_request_serde() {
        let request = DocumentRequest::user("fender");
        let json = serde_json::to_string(&request).expect("serialize request");
        assert_eq!(json, r#"{"document":"user","name":"fender"}"#);

        let decoded: DocumentRequest =
            serde_json::from_str(r#"{"document":"submission","id":"sid-9"}"#).expect("deserialize request");
        assert_eq!(decoded, DocumentRequest::submission("9"));
    }
}
