//! Listing and document URLs, computed once from the source configuration.

use pagewalk_core::{
    DocumentRequest, ItemId, Listing, ListingKind, SourceConfig, SourceError, SourceResult,
};
use url::Url;

/// Immutable endpoint table.
///
/// Every root ends with a slash, so page URLs are always
/// `root + owner + "/" + page` and document URLs `root + id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: Url,
    gallery: Url,
    scraps: Url,
    favorites: Url,
    journals: Url,
    view: Url,
    journal: Url,
    user: Url,
}

impl Endpoints {
    /// Build the table for `config.domain` over `http` or `https`.
    pub fn new(config: &SourceConfig) -> SourceResult<Self> {
        let scheme = if config.use_https { "https" } else { "http" };
        let domain = config.domain.trim().trim_end_matches('/');
        let base = Url::parse(&format!("{scheme}://{domain}/")).map_err(|e| {
            SourceError::InvalidRequest(format!("invalid domain '{}': {e}", config.domain))
        })?;
        Self::from_base(base)
    }

    /// Build the table under an explicit base URL.
    pub fn from_base(mut base: Url) -> SourceResult<Self> {
        if base.cannot_be_a_base() {
            return Err(SourceError::InvalidRequest(format!(
                "'{base}' cannot be used as a base URL"
            )));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let root = |segment: &str| {
            base.join(&format!("{segment}/"))
                .map_err(|e| SourceError::InvalidRequest(format!("invalid {segment} root: {e}")))
        };

        Ok(Self {
            gallery: root(ListingKind::Gallery.path_segment())?,
            scraps: root(ListingKind::Scraps.path_segment())?,
            favorites: root(ListingKind::Favorites.path_segment())?,
            journals: root(ListingKind::Journals.path_segment())?,
            view: root("view")?,
            journal: root("journal")?,
            user: root("user")?,
            base,
        })
    }

    /// Scheme, host and port every listing lives under.
    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Root URL of a listing kind, with trailing slash.
    #[must_use]
    pub fn listing_root(&self, kind: ListingKind) -> &Url {
        match kind {
            ListingKind::Gallery => &self.gallery,
            ListingKind::Scraps => &self.scraps,
            ListingKind::Favorites => &self.favorites,
            ListingKind::Journals => &self.journals,
        }
    }

    /// URL of page `page` of `listing`.
    pub fn page_url(&self, listing: &Listing, page: u32) -> SourceResult<Url> {
        let owner = listing.owner.trim().trim_end_matches('/');
        if owner.is_empty() {
            return Err(SourceError::InvalidRequest("no owner given".to_string()));
        }
        if page == 0 {
            return Err(SourceError::InvalidRequest(
                "page number must be greater than 0".to_string(),
            ));
        }

        let mut url = self.listing_root(listing.kind).clone();
        url.path_segments_mut()
            .map_err(|()| SourceError::InvalidRequest("listing root has no path".to_string()))?
            .pop_if_empty()
            .push(owner)
            .push(&page.to_string());
        Ok(url)
    }

    /// View page of submission `id`.
    pub fn submission_url(&self, id: &ItemId) -> SourceResult<Url> {
        Self::document_under(&self.view, id.as_str(), "submission id")
    }

    /// Page of journal `id`.
    pub fn journal_url(&self, id: &ItemId) -> SourceResult<Url> {
        Self::document_under(&self.journal, id.as_str(), "journal id")
    }

    /// Profile page of account `name`.
    pub fn user_url(&self, name: &str) -> SourceResult<Url> {
        Self::document_under(&self.user, name.trim().trim_end_matches('/'), "user")
    }

    /// URL of any read-only document.
    pub fn document_url(&self, request: &DocumentRequest) -> SourceResult<Url> {
        match request {
            DocumentRequest::ListingPage { listing, page } => self.page_url(listing, *page),
            DocumentRequest::Submission { id } => self.submission_url(id),
            DocumentRequest::Journal { id } => self.journal_url(id),
            DocumentRequest::User { name } => self.user_url(name),
        }
    }

    fn document_under(root: &Url, segment: &str, what: &str) -> SourceResult<Url> {
        if segment.is_empty() {
            return Err(SourceError::InvalidRequest(format!("no {what} given")));
        }
        let mut url = root.clone();
        url.path_segments_mut()
            .map_err(|()| SourceError::InvalidRequest("document root has no path".to_string()))?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    /// Resolve a link found in a page against the base URL.
    #[must_use]
    pub fn resolve(&self, href: &str) -> Option<Url> {
        self.base.join(href).ok()
    }
}
