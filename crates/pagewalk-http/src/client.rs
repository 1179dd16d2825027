//! `reqwest`-backed [`PageSource`] and [`DocumentSource`].

use crate::endpoints::Endpoints;
use crate::parser::{ListingEntry, ListingParser};
use async_trait::async_trait;
use pagewalk_core::{
    DocumentRequest, DocumentSource, Listing, Page, PageSource, SourceConfig, SourceError,
    SourceResult,
};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Fetches listing pages over HTTP and parses them into [`ListingEntry`] items.
///
/// The source does no throttling of its own. Go through a
/// `RangeScanner` (scans or its `fetch_document`) to share its gate.
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: Client,
    endpoints: Endpoints,
    parser: ListingParser,
}

impl HttpPageSource {
    /// Create a source for the configured domain.
    ///
    /// # Errors
    /// Returns error if the domain is invalid or the HTTP client cannot be created.
    pub fn new(config: &SourceConfig) -> SourceResult<Self> {
        let endpoints = Endpoints::new(config)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                SourceError::InvalidRequest(format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self::with_client(client, endpoints))
    }

    /// Create a source from a prepared client and endpoint table.
    #[must_use]
    pub fn with_client(client: Client, endpoints: Endpoints) -> Self {
        let parser = ListingParser::new(endpoints.base().clone());
        Self {
            client,
            endpoints,
            parser,
        }
    }

    /// The endpoint table requests are built from.
    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    async fn get_html(&self, url: Url) -> SourceResult<String> {
        tracing::debug!("Fetching {}", url);

        let transport = |e: reqwest::Error| SourceError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(transport)
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    type Item = ListingEntry;

    async fn fetch_page(&self, listing: &Listing, number: u32) -> SourceResult<Page<ListingEntry>> {
        let html = self.get_html(self.endpoints.page_url(listing, number)?).await?;
        let items = self.parser.parse(listing.kind, &html);
        if items.is_empty() {
            tracing::debug!("No items found at {} on page {}", listing, number);
        }
        Ok(Page::new(listing.clone(), number, items))
    }
}

#[async_trait]
impl DocumentSource for HttpPageSource {
    async fn fetch_document(&self, request: &DocumentRequest) -> SourceResult<String> {
        let url = self.endpoints.document_url(request)?;
        self.get_html(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_domain() {
        let config = SourceConfig {
            domain: "bad domain".to_string(),
            ..SourceConfig::default()
        };
        assert!(matches!(
            HttpPageSource::new(&config),
            Err(SourceError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_page_fails_before_sending() {
        let source = HttpPageSource::new(&SourceConfig::default()).expect("source");
        let result = source.fetch_page(&Listing::gallery("fender"), 0).await;
        assert!(matches!(result, Err(SourceError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_invalid_document_fails_before_sending() {
        let source = HttpPageSource::new(&SourceConfig::default()).expect("source");
        let result = source.fetch_document(&DocumentRequest::user("")).await;
        assert!(matches!(result, Err(SourceError::InvalidRequest(_))));
    }
}
