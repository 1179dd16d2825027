use pagewalk_core::{
    DocumentRequest, DocumentSource, ItemId, Listing, ListingItem, PageSource, SourceConfig,
    SourceError,
};
use pagewalk_http::HttpPageSource;
use pagewalk_scanner::{RangeScanner, StopReason};
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

fn figures(ids: &[u32]) -> String {
    let figures: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<figure id="sid-{id}"><figcaption><p><a href="/view/{id}/">Piece {id}</a></p></figcaption></figure>"#
            )
        })
        .collect();
    format!("<html><body><section class=\"gallery\">{figures}</section></body></html>")
}

fn route(path: &str) -> (u16, String) {
    match path {
        "/gallery/fender/1" => (200, figures(&[30, 29, 28])),
        "/gallery/fender/2" => (200, figures(&[27, 26])),
        "/gallery/fender/3" => (
            200,
            r#"<div id="no-images">There are no submissions to list</div>"#.to_string(),
        ),
        "/journals/fender/1" => (
            200,
            r#"<div id="columnpage"><section id="jid-77"><h2>Stream tonight</h2></section></div>"#
                .to_string(),
        ),
        "/gallery/broken/1" => (500, "oops".to_string()),
        "/view/29" => (200, "<html><h2>Piece 29</h2></html>".to_string()),
        "/journal/77" => (200, "<html><h2>Stream tonight</h2></html>".to_string()),
        "/user/fender" => (200, "<html><h1>fender</h1></html>".to_string()),
        _ => (404, "not found".to_string()),
    }
}

async fn handle_one_connection(socket: &mut TcpStream) -> std::io::Result<()> {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; 1024];
    loop {
        let read = socket.read(&mut chunk).await?;
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);
        if buffer.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }

    let request = String::from_utf8_lossy(&buffer);
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/");
    let (status, body) = route(path);

    let response = format!(
        "HTTP/1.1 {status} X\r\ncontent-type: text/html\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );
    socket.write_all(response.as_bytes()).await?;
    socket.shutdown().await
}

/// Serve the canned pages until the test's runtime shuts down.
async fn serve() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _peer)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let _ = handle_one_connection(&mut socket).await;
            });
        }
    });
    addr
}

fn config(addr: SocketAddr) -> SourceConfig {
    SourceConfig {
        domain: addr.to_string(),
        use_https: false,
        timeout_secs: 5,
        ..SourceConfig::default()
    }
}

#[tokio::test]
async fn test_fetch_gallery_page() {
    let addr = serve().await;
    let source = HttpPageSource::new(&config(addr)).expect("source");

    let page = source
        .fetch_page(&Listing::gallery("fender"), 1)
        .await
        .expect("page 1");

    assert_eq!(page.number, 1);
    assert_eq!(page.len(), 3);
    assert_eq!(page.leading_id(), Some(ItemId::new("30")));
    assert_eq!(page.items[1].title.as_deref(), Some("Piece 29"));
    assert_eq!(
        page.items[1].link.as_deref(),
        Some(format!("http://{addr}/view/29/").as_str())
    );
}

#[tokio::test]
async fn test_no_images_page_is_empty() {
    let addr = serve().await;
    let source = HttpPageSource::new(&config(addr)).expect("source");

    let page = source
        .fetch_page(&Listing::gallery("fender"), 3)
        .await
        .expect("page 3");

    assert!(page.is_empty());
}

#[tokio::test]
async fn test_fetch_journals_page() {
    let addr = serve().await;
    let source = HttpPageSource::new(&config(addr)).expect("source");

    let page = source
        .fetch_page(&Listing::journals("fender"), 1)
        .await
        .expect("journals");

    assert_eq!(page.len(), 1);
    assert_eq!(page.items[0].item_id(), ItemId::new("77"));
    assert_eq!(page.items[0].raw_id, "jid-77");
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let addr = serve().await;
    let source = HttpPageSource::new(&config(addr)).expect("source");

    let result = source.fetch_page(&Listing::gallery("broken"), 1).await;

    match result {
        Err(SourceError::Status { url, status }) => {
            assert_eq!(status, 500);
            assert!(url.ends_with("/gallery/broken/1"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let source = HttpPageSource::new(&config(addr)).expect("source");
    let result = source
        .fetch_document(&DocumentRequest::listing_page(Listing::gallery("fender"), 1))
        .await;

    assert!(matches!(result, Err(SourceError::Transport { .. })));
}

#[tokio::test]
async fn test_scanner_over_http_source() {
    let addr = serve().await;
    let source = HttpPageSource::new(&config(addr)).expect("source");
    let scanner = RangeScanner::new(source, 2);
    let listing = Listing::gallery("fender");

    let all = scanner.scan_since_page(&listing, 1).await;
    assert_eq!(all.stop, StopReason::Converged);
    // Page 3 is empty and page 4 answers 404; two pages without items end the walk
    assert_eq!(all.pages_visited, 4);
    assert_eq!(all.item_count(), 5);

    let till = scanner.scan_till_id(&listing, "sid-27", None).await;
    assert_eq!(till.stop, StopReason::Truncated);
    let ids: Vec<_> = till.items().map(|entry| entry.id.clone()).collect();
    assert_eq!(
        ids,
        ["30", "29", "28", "27"].map(ItemId::new).to_vec()
    );

    // A failing listing reads as no data rather than an error
    let broken = scanner.scan_one_page(&Listing::gallery("broken"), 1).await;
    assert!(broken.is_empty());
    assert_eq!(broken.pages_visited, 1);
}

#[tokio::test]
async fn test_fetch_view_pages() {
    let addr = serve().await;
    let source = HttpPageSource::new(&config(addr)).expect("source");

    let view = source
        .fetch_document(&DocumentRequest::submission("sid-29"))
        .await
        .expect("submission");
    assert!(view.contains("Piece 29"));

    let journal = source
        .fetch_document(&DocumentRequest::journal("77"))
        .await
        .expect("journal");
    assert!(journal.contains("Stream tonight"));

    let missing = source.fetch_document(&DocumentRequest::user("nobody")).await;
    assert!(matches!(
        missing,
        Err(SourceError::Status { status: 404, .. })
    ));
}

#[tokio::test]
async fn test_scanner_fetches_documents_through_gate() {
    let addr = serve().await;
    let source = HttpPageSource::new(&config(addr)).expect("source");
    let scanner = RangeScanner::new(source, 1);

    let profile = scanner
        .fetch_document(&DocumentRequest::user("fender"))
        .await
        .expect("profile");
    assert!(profile.contains("<h1>fender</h1>"));

    let listing = scanner
        .fetch_document(&DocumentRequest::listing_page(Listing::gallery("fender"), 2))
        .await
        .expect("listing page");
    assert!(listing.contains("sid-27"));
    assert_eq!(scanner.gate().outstanding(), 0);
}
