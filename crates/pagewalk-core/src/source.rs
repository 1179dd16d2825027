//! The seam between the scanner and whatever produces listing pages.

use crate::error::SourceResult;
use crate::types::{DocumentRequest, ItemId, Listing, Page};
use async_trait::async_trait;

/// An item that carries a stable identifier within its listing.
pub trait ListingItem {
    /// Normalized identifier of the item.
    fn item_id(&self) -> ItemId;
}

/// Produces pages of a paginated, newest-first listing.
///
/// Calls must be free of side effects from the scanner's point of view, but
/// repeated calls with the same arguments may legitimately return different
/// content when the listing changes in between.
///
/// A page past the end of data is returned as an empty [`Page`]; a page that
/// could not be fetched at all is an `Err`. Implementations do not need to
/// limit their own concurrency: the scanner acquires a permit before every
/// call.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Item type produced by this source.
    type Item: ListingItem + Clone + Send + Sync + 'static;

    /// Fetch page `number` (1-based) of `listing`.
    async fn fetch_page(&self, listing: &Listing, number: u32) -> SourceResult<Page<Self::Item>>;
}

/// Produces the raw markup of single read-only documents.
///
/// Like [`PageSource`], implementations leave throttling to the caller; the
/// scanner's `fetch_document` holds a gate permit around every call.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetch the document described by `request`.
    async fn fetch_document(&self, request: &DocumentRequest) -> SourceResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;

    #[derive(Debug, Clone, PartialEq)]
    struct Figure(String);

    impl ListingItem for Figure {
        fn item_id(&self) -> ItemId {
            ItemId::new(&self.0)
        }
    }

    struct TwoPages;

    #[async_trait]
    impl PageSource for TwoPages {
        type Item = Figure;

        async fn fetch_page(&self, listing: &Listing, number: u32) -> SourceResult<Page<Figure>> {
            match number {
                0 => Err(SourceError::InvalidRequest("page 0".to_string())),
                1 => Ok(Page::new(
                    listing.clone(),
                    1,
                    vec![Figure("sid-2".to_string()), Figure("sid-1".to_string())],
                )),
                _ => Ok(Page::empty(listing.clone(), number)),
            }
        }
    }

    #[tokio::test]
    async fn test_source_through_trait_object() {
        let source: Box<dyn PageSource<Item = Figure>> = Box::new(TwoPages);
        let listing = Listing::gallery("fender");

        let first = source.fetch_page(&listing, 1).await.expect("page 1");
        assert_eq!(first.leading_id(), Some(ItemId::new("2")));

        let past_end = source.fetch_page(&listing, 2).await.expect("page 2");
        assert!(past_end.is_empty());

        assert!(source.fetch_page(&listing, 0).await.is_err());
    }

    struct Echo;

    #[async_trait]
    impl DocumentSource for Echo {
        async fn fetch_document(&self, request: &DocumentRequest) -> SourceResult<String> {
            match request {
                DocumentRequest::User { name } if name.is_empty() => {
                    Err(SourceError::InvalidRequest("no user given".to_string()))
                }
                other => Ok(format!("<html>{other}</html>")),
            }
        }
    }

    #[tokio::test]
    async fn test_document_source_through_trait_object() {
        let source: Box<dyn DocumentSource> = Box::new(Echo);

        let html = source
            .fetch_document(&DocumentRequest::submission("sid-12"))
            .await
            .expect("submission");
        assert_eq!(html, "<html>submission 12</html>");

        assert!(source.fetch_document(&DocumentRequest::user("")).await.is_err());
    }
}
