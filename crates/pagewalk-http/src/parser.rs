//! Listing page markup to [`ListingEntry`] items.

use pagewalk_core::{ItemId, ListingItem, ListingKind};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use url::Url;

/// One figure of a submission listing or one section of a journal listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingEntry {
    /// The element's `id` attribute as found in the markup (e.g. `sid-1234`)
    pub raw_id: String,
    /// Normalized identifier
    pub id: ItemId,
    /// Caption or heading text, if any
    pub title: Option<String>,
    /// First link of the element, resolved to an absolute URL
    pub link: Option<String>,
    /// Outer HTML of the element
    pub html: String,
}

impl ListingItem for ListingEntry {
    fn item_id(&self) -> ItemId {
        self.id.clone()
    }
}

#[derive(Debug)]
struct Selectors {
    no_images: Selector,
    figure: Selector,
    column_page: Selector,
    section: Selector,
    title: Selector,
    link: Selector,
}

/// Selectors are parsed once per process and shared by every parser.
fn selectors() -> &'static Selectors {
    static SELECTORS: OnceLock<Selectors> = OnceLock::new();
    SELECTORS.get_or_init(|| Selectors {
        no_images: Selector::parse("#no-images").expect("no-images selector"),
        figure: Selector::parse("figure").expect("figure selector"),
        column_page: Selector::parse("#columnpage").expect("columnpage selector"),
        section: Selector::parse("section").expect("section selector"),
        title: Selector::parse("figcaption a, h2").expect("title selector"),
        link: Selector::parse("a[href]").expect("link selector"),
    })
}

/// Extracts listing items from a fetched page.
#[derive(Debug, Clone)]
pub struct ListingParser {
    selectors: &'static Selectors,
    base_url: Url,
}

impl ListingParser {
    /// Create a parser resolving relative links against `base_url`.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            selectors: selectors(),
            base_url,
        }
    }

    /// Items of one page, in document order.
    ///
    /// A page past the end of data yields no items. Elements without an `id`
    /// attribute are skipped.
    #[must_use]
    pub fn parse(&self, kind: ListingKind, html: &str) -> Vec<ListingEntry> {
        let document = Html::parse_document(html);
        if kind.is_submission_listing() {
            self.parse_figures(&document)
        } else {
            self.parse_sections(&document)
        }
    }

    fn parse_figures(&self, document: &Html) -> Vec<ListingEntry> {
        if document.select(&self.selectors.no_images).next().is_some() {
            tracing::debug!("page reports no images");
            return Vec::new();
        }
        document
            .select(&self.selectors.figure)
            .filter_map(|element| self.entry(element))
            .collect()
    }

    fn parse_sections(&self, document: &Html) -> Vec<ListingEntry> {
        let Some(column) = document.select(&self.selectors.column_page).next() else {
            tracing::debug!("page has no journal column");
            return Vec::new();
        };
        column
            .select(&self.selectors.section)
            .filter_map(|element| self.entry(element))
            .collect()
    }

    fn entry(&self, element: ElementRef<'_>) -> Option<ListingEntry> {
        let raw_id = element.value().attr("id")?.trim();
        if raw_id.is_empty() {
            return None;
        }

        let title = element
            .select(&self.selectors.title)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .find(|text| !text.is_empty());

        let link = element
            .select(&self.selectors.link)
            .next()
            .and_then(|el| el.value().attr("href"))
            .and_then(|href| self.base_url.join(href).ok())
            .map(String::from);

        Some(ListingEntry {
            raw_id: raw_id.to_string(),
            id: ItemId::new(raw_id),
            title,
            link,
            html: element.html(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> ListingParser {
        ListingParser::new(Url::parse("https://www.furaffinity.net/").expect("base url"))
    }

    const GALLERY: &str = r#"
        <html><body>
        <section class="gallery">
            <figure id="sid-5001" class="r-general">
                <b><u><a href="/view/5001/"><img src="//t.example/5001.jpg"></a></u></b>
                <figcaption>
                    <p><a href="/view/5001/" title="Harbor at Dusk">Harbor at Dusk</a></p>
                    <p><i>by</i> <a href="/user/fender/">fender</a></p>
                </figcaption>
            </figure>
            <figure id="sid-5000">
                <figcaption><p><a href="/view/5000/">Sketch</a></p></figcaption>
            </figure>
            <figure class="placeholder"></figure>
        </section>
        </body></html>
    "#;

    #[test]
    fn test_parse_gallery_figures() {
        let entries = parser().parse(ListingKind::Gallery, GALLERY);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].raw_id, "sid-5001");
        assert_eq!(entries[0].id, ItemId::new("5001"));
        assert_eq!(entries[0].title.as_deref(), Some("Harbor at Dusk"));
        assert_eq!(
            entries[0].link.as_deref(),
            Some("https://www.furaffinity.net/view/5001/")
        );
        assert!(entries[0].html.starts_with("<figure"));
        assert_eq!(entries[1].item_id(), ItemId::new("sid-5000"));
    }

    #[test]
    fn test_no_images_marker_means_empty_page() {
        let html = r#"<div id="no-images">There are no submissions to list</div>
            <figure id="sid-1"></figure>"#;
        assert!(parser().parse(ListingKind::Scraps, html).is_empty());
    }

    #[test]
    fn test_parse_journal_sections() {
        let html = r#"
            <div id="columnpage">
                <section id="jid-900"><h2>Commissions open</h2><a href="/journal/900/">Read</a></section>
                <section id="jid-899"><h2>Update</h2></section>
            </div>
            <section id="jid-1">outside the column</section>
        "#;
        let entries = parser().parse(ListingKind::Journals, html);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, ItemId::new("900"));
        assert_eq!(entries[0].title.as_deref(), Some("Commissions open"));
        assert_eq!(
            entries[0].link.as_deref(),
            Some("https://www.furaffinity.net/journal/900/")
        );
        assert_eq!(entries[1].link, None);
    }

    #[test]
    fn test_journals_without_column_are_empty() {
        let html = r#"<section id="jid-1"><h2>Stray</h2></section>"#;
        assert!(parser().parse(ListingKind::Journals, html).is_empty());
    }

    #[test]
    fn test_gallery_ignores_journal_markup() {
        let html = r#"<div id="columnpage"><section id="jid-1"></section></div>"#;
        assert!(parser().parse(ListingKind::Favorites, html).is_empty());
    }

    #[test]
    fn test_parsers_share_selectors() {
        let first = parser();
        let second = ListingParser::new(Url::parse("http://127.0.0.1:8080/").expect("base url"));
        assert!(std::ptr::eq(first.selectors, second.selectors));

        // The second parser resolves against its own base
        let entries = second.parse(ListingKind::Gallery, GALLERY);
        assert_eq!(
            entries[1].link.as_deref(),
            Some("http://127.0.0.1:8080/view/5000/")
        );
    }

    #[test]
    fn test_listing_entry_json() {
        let entry = parser()
            .parse(ListingKind::Gallery, GALLERY)
            .into_iter()
            .next()
            .expect("first entry");

        let json = serde_json::to_value(&entry).expect("serialize entry");
        assert_eq!(json["raw_id"], "sid-5001");
        assert_eq!(json["id"], "5001");
        assert_eq!(json["title"], "Harbor at Dusk");

        let decoded: ListingEntry = serde_json::from_value(json).expect("deserialize entry");
        assert_eq!(decoded, entry);
    }

    #[test]
    fn test_listing_entry_id_is_normalized_on_load() {
        let json = r#"{"raw_id":"jid-7","id":"jid-7","title":null,"link":null,"html":"<section></section>"}"#;
        let entry: ListingEntry = serde_json::from_str(json).expect("deserialize entry");
        assert_eq!(entry.item_id(), ItemId::new("7"));
        assert_eq!(entry.id.as_str(), "7");
    }
}
