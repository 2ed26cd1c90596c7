//! Integration tests for the harvester
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full harvest cycle end-to-end.

use book_harvester::config::Config;
use book_harvester::crawler::{HttpFetcher, RetryPolicy};
use book_harvester::output::load_corpus;
use book_harvester::storage::{AssetDownloader, ExistingFiles, MAX_FILENAME_BYTES};
use book_harvester::url::SiteUrls;
use book_harvester::{run_crawl, Coordinator, CrawlPlan, HarvestError, PageRange};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, dest: &Path) -> Config {
    let mut config = Config::default();
    config.site.base_url = base_url.to_string();
    config.retry.delay_secs = 0;
    config.output.dest_folder = dest.to_path_buf();
    config
}

fn quick_fetcher() -> (HttpFetcher, RetryPolicy) {
    let fetcher = HttpFetcher::new(&Config::default().http).expect("Failed to build fetcher");
    (fetcher, RetryPolicy::new(3, Duration::ZERO))
}

fn listing_page(hrefs: &[&str]) -> String {
    let thumbnails: String = hrefs
        .iter()
        .map(|href| {
            format!(
                r#"<table class="d_book"><tr><td><div class="bookimage"><a href="{}"><img src="/shots/x.jpg"></a></div></td></tr></table>"#,
                href
            )
        })
        .collect();

    format!(
        r#"<html><body><div id="content">{}<p class="center"><a class="npage" href="/l55/2/">2</a><a class="npage" href="/l55/4/">4</a></p></div></body></html>"#,
        thumbnails
    )
}

fn detail_page(heading: &str, genres: &[&str], comments: &[&str], cover: &str) -> String {
    let genres: String = genres
        .iter()
        .map(|g| format!(r#"<a href="/l1/">{}</a>, "#, g))
        .collect();
    let comments: String = comments
        .iter()
        .map(|c| format!(r#"<div class="texts"><b>reader</b><span class="black">{}</span></div>"#, c))
        .collect();

    format!(
        r##"<html><body><div id="content">
            <h1>{}</h1>
            <div class="bookimage"><a href="#"><img src="{}"></a></div>
            <span class="d_book"><b>Жанр книги:</b> {}</span>
            {}
        </div></body></html>"##,
        heading, cover, genres, comments
    )
}

async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

async fn mount_redirect(server: &MockServer, route: &str, location: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(302).insert_header("location", location))
        .mount(server)
        .await;
}

/// A free local port with nothing listening on it
fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let port = listener.local_addr().expect("No local address").port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

#[tokio::test]
async fn test_full_category_harvest() {
    let mock_server = MockServer::start().await;
    let dest = TempDir::new().expect("Failed to create temp dir");

    mount_html(&mock_server, "/l55/1/", listing_page(&["/b1/", "/b2/"])).await;
    mount_html(
        &mock_server,
        "/b1/",
        detail_page("Foo &nbsp; :: &nbsp; <a href=\"/a1/\">Bar</a>", &["Sci-Fi", "Classic"], &[], "/shots/1.jpg"),
    )
    .await;
    mount_redirect(&mock_server, "/b2/", "/").await;
    mount_html(&mock_server, "/", "<html><body>home</body></html>".to_string()).await;

    Mock::given(method("GET"))
        .and(path("/txt.php"))
        .and(query_param("id", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Once upon a time"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/shots/1.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xD8, 0xFF]))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), dest.path());
    let plan = CrawlPlan::Category {
        category: "l55".to_string(),
        pages: PageRange::clamped(1, 2),
    };

    let outcome = run_crawl(&config, &plan).await.expect("Harvest failed");

    assert_eq!(outcome.books.len(), 1);
    assert_eq!(outcome.report.books_seen, 2);
    assert_eq!(outcome.report.books_saved, 1);
    assert_eq!(outcome.report.books_skipped, 1);

    let corpus = load_corpus(&dest.path().join("books.json")).expect("Failed to read corpus");
    assert_eq!(corpus.len(), 1);

    let book = &corpus[0];
    assert_eq!(book.title, "Foo");
    assert_eq!(book.author, "Bar");
    assert_eq!(book.genres, vec!["Sci-Fi", "Classic"]);
    assert!(book.comments.is_empty());
    assert_eq!(book.source_url, format!("{}/b1/", mock_server.uri()));
    assert_eq!(book.image_url, format!("{}/shots/1.jpg", mock_server.uri()));

    let text_path = book.text_path.as_ref().expect("Missing text path");
    let image_path = book.image_path.as_ref().expect("Missing image path");
    assert_eq!(
        Path::new(text_path),
        dest.path().join("books").join("1. Foo.txt")
    );
    assert_eq!(
        std::fs::read_to_string(text_path).expect("Text not written"),
        "Once upon a time"
    );
    assert_eq!(
        std::fs::read(image_path).expect("Image not written"),
        vec![0xFF, 0xD8, 0xFF]
    );
}

#[tokio::test]
async fn test_id_harvest_keeps_book_when_text_is_missing() {
    let mock_server = MockServer::start().await;
    let dest = TempDir::new().expect("Failed to create temp dir");

    mount_html(
        &mock_server,
        "/b7/",
        detail_page("Алиби :: Агата Кристи", &["Детектив"], &["Отлично"], "/shots/7.jpg"),
    )
    .await;
    mount_redirect(&mock_server, "/txt.php", "/").await;
    mount_html(&mock_server, "/", "<html></html>".to_string()).await;
    Mock::given(method("GET"))
        .and(path("/shots/7.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1, 2, 3]))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), dest.path());
    let coordinator = Coordinator::new(&config).expect("Failed to create coordinator");
    let outcome = coordinator
        .run(&CrawlPlan::Ids {
            ids: PageRange::clamped(7, 8),
        })
        .await
        .expect("Harvest failed");

    assert_eq!(outcome.books.len(), 1);
    let book = &outcome.books[0];
    assert_eq!(book.title, "Алиби");
    assert_eq!(book.author, "Агата Кристи");
    assert_eq!(book.text_path, None);
    assert!(book.image_path.is_some());
    assert_eq!(outcome.report.text_failures, 1);
    assert_eq!(outcome.report.image_failures, 0);
}

#[tokio::test]
async fn test_http_errors_skip_books() {
    let mock_server = MockServer::start().await;
    let dest = TempDir::new().expect("Failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/b1/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b2/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), dest.path());
    config.download.skip_txt = true;
    config.download.skip_imgs = true;

    let coordinator = Coordinator::new(&config).expect("Failed to create coordinator");
    let outcome = coordinator
        .run(&CrawlPlan::Ids {
            ids: PageRange::clamped(1, 3),
        })
        .await
        .expect("Harvest failed");

    assert!(outcome.books.is_empty());
    assert_eq!(outcome.report.books_skipped, 2);
}

#[tokio::test]
async fn test_skip_flags_suppress_downloads() {
    let mock_server = MockServer::start().await;
    let dest = TempDir::new().expect("Failed to create temp dir");

    mount_html(
        &mock_server,
        "/b3/",
        detail_page("Foo :: Bar", &["Drama"], &[], "/shots/3.jpg"),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/txt.php"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/shots/3.jpg"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), dest.path());
    config.download.skip_txt = true;
    config.download.skip_imgs = true;

    let coordinator = Coordinator::new(&config).expect("Failed to create coordinator");
    let outcome = coordinator
        .run(&CrawlPlan::Ids {
            ids: PageRange::clamped(3, 4),
        })
        .await
        .expect("Harvest failed");

    assert_eq!(outcome.books.len(), 1);
    assert_eq!(outcome.books[0].text_path, None);
    assert_eq!(outcome.books[0].image_path, None);
}

#[tokio::test]
async fn test_malformed_page_aborts_run() {
    let mock_server = MockServer::start().await;
    let dest = TempDir::new().expect("Failed to create temp dir");

    mount_html(
        &mock_server,
        "/b1/",
        detail_page("No delimiter here", &["Drama"], &[], "/shots/1.jpg"),
    )
    .await;

    let config = create_test_config(&mock_server.uri(), dest.path());
    let result = run_crawl(
        &config,
        &CrawlPlan::Ids {
            ids: PageRange::clamped(1, 2),
        },
    )
    .await;

    assert!(matches!(result, Err(HarvestError::MalformedPage { .. })));
    assert!(!dest.path().join("books.json").exists());
}

#[tokio::test]
async fn test_unreachable_host_skips_after_retries() {
    let dest = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&closed_port_url(), dest.path());

    let coordinator = Coordinator::new(&config).expect("Failed to create coordinator");
    let outcome = coordinator
        .run(&CrawlPlan::Ids {
            ids: PageRange::clamped(1, 2),
        })
        .await
        .expect("Connection failures must not abort the run");

    assert!(outcome.books.is_empty());
    assert_eq!(outcome.report.books_skipped, 1);
}

#[tokio::test]
async fn test_fetch_classifies_connection_failure_as_transient() {
    let (fetcher, _) = quick_fetcher();
    let url = Url::parse(&format!("{}/b1/", closed_port_url())).unwrap();

    let result = fetcher.fetch(&url, &[]).await;
    assert!(matches!(result, Err(HarvestError::Transient { .. })));
}

#[tokio::test]
async fn test_fetch_detects_redirect_even_when_final_page_is_ok() {
    let mock_server = MockServer::start().await;
    mount_redirect(&mock_server, "/b404/", "/b404").await;
    mount_redirect(&mock_server, "/b404", "/").await;
    mount_html(&mock_server, "/", "<html></html>".to_string()).await;

    let (fetcher, _) = quick_fetcher();
    let url = Url::parse(&format!("{}/b404/", mock_server.uri())).unwrap();

    match fetcher.fetch(&url, &[]).await {
        Err(HarvestError::RedirectDetected { url: first, location }) => {
            assert_eq!(first, format!("{}/b404/", mock_server.uri()));
            assert_eq!(location, format!("{}/", mock_server.uri()));
        }
        other => panic!("expected a redirect, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_stops_at_redirect_limit() {
    let mock_server = MockServer::start().await;
    mount_redirect(&mock_server, "/loop/", "/loop/").await;

    let (fetcher, _) = quick_fetcher();
    let url = Url::parse(&format!("{}/loop/", mock_server.uri())).unwrap();

    let result = fetcher.fetch(&url, &[]).await;
    assert!(matches!(result, Err(HarvestError::RedirectDetected { .. })));
}

#[tokio::test]
async fn test_fetch_sends_query_parameters() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/txt.php"))
        .and(query_param("id", "42"))
        .respond_with(ResponseTemplate::new(200).set_body_string("text of 42"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (fetcher, _) = quick_fetcher();
    let url = Url::parse(&format!("{}/txt.php", mock_server.uri())).unwrap();

    let response = fetcher.fetch(&url, &[("id", "42")]).await.expect("Fetch failed");
    assert_eq!(response.text(), "text of 42");
    assert!(response.redirects.is_empty());
}

#[tokio::test]
async fn test_image_name_comes_from_decoded_path() {
    let mock_server = MockServer::start().await;
    let dest = TempDir::new().expect("Failed to create temp dir");
    Mock::given(method("GET"))
        .and(path_regex(r"^/shots/my(%20| )cover\.png$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![9, 9]))
        .mount(&mock_server)
        .await;

    let (fetcher, retry) = quick_fetcher();
    let downloader = AssetDownloader::new(fetcher, retry, ExistingFiles::Overwrite);
    let url = Url::parse(&format!("{}/shots/my%20cover.png?v=3", mock_server.uri())).unwrap();

    let saved = downloader
        .download_image(&url, &dest.path().join("images"))
        .await
        .expect("Download failed");

    assert_eq!(saved, dest.path().join("images").join("my cover.png"));
    assert_eq!(std::fs::read(&saved).unwrap(), vec![9, 9]);
}

#[tokio::test]
async fn test_text_download_sanitizes_and_overwrites() {
    let mock_server = MockServer::start().await;
    let dest = TempDir::new().expect("Failed to create temp dir");
    Mock::given(method("GET"))
        .and(path("/txt.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("fresh"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let folder = dest.path().join("books");
    std::fs::create_dir_all(&folder).unwrap();
    let expected = folder.join("5. Кто виноват_.txt");
    std::fs::write(&expected, "stale").unwrap();

    let (fetcher, retry) = quick_fetcher();
    let downloader = AssetDownloader::new(fetcher, retry, ExistingFiles::Overwrite);
    let url = Url::parse(&format!("{}/txt.php", mock_server.uri())).unwrap();

    let saved = downloader
        .download_text(&url, &[("id", "5")], "5. Кто виноват?", &folder)
        .await
        .expect("Download failed");

    assert_eq!(saved, expected);
    assert_eq!(std::fs::read_to_string(&saved).unwrap(), "fresh");
}

#[tokio::test]
async fn test_existing_files_can_be_kept() {
    let mock_server = MockServer::start().await;
    let dest = TempDir::new().expect("Failed to create temp dir");
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("fresh"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let folder = dest.path().join("books");
    std::fs::create_dir_all(&folder).unwrap();
    std::fs::write(folder.join("1. Foo.txt"), "kept").unwrap();

    let (fetcher, retry) = quick_fetcher();
    let downloader = AssetDownloader::new(fetcher, retry, ExistingFiles::Skip);
    let url = Url::parse(&format!("{}/txt.php", mock_server.uri())).unwrap();

    let saved = downloader
        .download_text(&url, &[("id", "1")], "1. Foo", &folder)
        .await
        .expect("Download failed");

    assert_eq!(std::fs::read_to_string(saved).unwrap(), "kept");
}

#[tokio::test]
async fn test_listing_without_books_yields_nothing() {
    let mock_server = MockServer::start().await;
    let dest = TempDir::new().expect("Failed to create temp dir");
    mount_html(&mock_server, "/l55/9/", listing_page(&[])).await;

    let config = create_test_config(&mock_server.uri(), dest.path());
    let coordinator = Coordinator::new(&config).expect("Failed to create coordinator");

    let listing = Url::parse(&format!("{}/l55/9/", mock_server.uri())).unwrap();
    let links = coordinator
        .walker()
        .list_book_links(&listing)
        .await
        .expect("Listing failed");
    assert!(links.is_empty());
}

#[tokio::test]
async fn test_missing_listing_page_is_skipped() {
    let mock_server = MockServer::start().await;
    let dest = TempDir::new().expect("Failed to create temp dir");
    Mock::given(method("GET"))
        .and(path("/l55/1/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    mount_html(&mock_server, "/l55/2/", listing_page(&[])).await;

    let config = create_test_config(&mock_server.uri(), dest.path());
    let coordinator = Coordinator::new(&config).expect("Failed to create coordinator");
    let outcome = coordinator
        .run(&CrawlPlan::Category {
            category: "l55".to_string(),
            pages: PageRange::clamped(1, 3),
        })
        .await
        .expect("Harvest failed");

    assert_eq!(outcome.report.pages_skipped, 1);
    assert_eq!(outcome.report.pages_listed, 1);
    assert!(outcome.books.is_empty());
}

#[tokio::test]
async fn test_discover_last_page() {
    let mock_server = MockServer::start().await;
    let dest = TempDir::new().expect("Failed to create temp dir");
    mount_html(&mock_server, "/l55/", listing_page(&["/b1/"])).await;
    mount_html(&mock_server, "/l17/", listing_page(&[]).replace("npage", "other")).await;

    let config = create_test_config(&mock_server.uri(), dest.path());
    let coordinator = Coordinator::new(&config).expect("Failed to create coordinator");

    assert_eq!(
        coordinator
            .walker()
            .discover_last_page("l55")
            .await
            .expect("Discovery failed"),
        4
    );
    assert_eq!(
        coordinator
            .walker()
            .discover_last_page("l17")
            .await
            .expect("Discovery failed"),
        1
    );
}

#[tokio::test]
async fn test_long_title_text_name_fits_filesystem() {
    let mock_server = MockServer::start().await;
    let dest = TempDir::new().expect("Failed to create temp dir");

    // "7. " plus 252 bytes of title is a valid name until ".txt" is added
    let title = "Я".repeat(126);
    mount_html(
        &mock_server,
        "/b7/",
        detail_page(&format!("{} :: Автор", title), &["Роман"], &[], "/shots/7.jpg"),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/txt.php"))
        .and(query_param("id", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_string("long book"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/shots/7.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7]))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), dest.path());
    let outcome = run_crawl(
        &config,
        &CrawlPlan::Ids {
            ids: PageRange::clamped(7, 8),
        },
    )
    .await
    .expect("Harvest failed");

    assert_eq!(outcome.books.len(), 1);
    assert_eq!(outcome.books[0].title, title);

    let text_path = Path::new(outcome.books[0].text_path.as_ref().expect("Missing text path"));
    let file_name = text_path.file_name().unwrap().to_str().unwrap();
    assert!(file_name.len() <= MAX_FILENAME_BYTES);
    assert!(file_name.starts_with("7. Я"));
    assert!(file_name.ends_with(".txt"));
    assert_eq!(std::fs::read_to_string(text_path).unwrap(), "long book");
    assert!(dest.path().join("books.json").exists());
}

#[tokio::test]
async fn test_corrupt_compressed_body_is_retried_then_skipped() {
    let mock_server = MockServer::start().await;
    let dest = TempDir::new().expect("Failed to create temp dir");

    mount_html(
        &mock_server,
        "/b4/",
        detail_page("Foo :: Bar", &["Drama"], &[], "/shots/4.jpg"),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/txt.php"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-encoding", "gzip")
                .set_body_bytes(b"definitely not gzip data".to_vec()),
        )
        .expect(3)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/shots/4.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![4]))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), dest.path());
    let coordinator = Coordinator::new(&config).expect("Failed to create coordinator");
    let outcome = coordinator
        .run(&CrawlPlan::Ids {
            ids: PageRange::clamped(4, 5),
        })
        .await
        .expect("A corrupt body must not abort the run");

    assert_eq!(outcome.books.len(), 1);
    assert_eq!(outcome.books[0].text_path, None);
    assert!(outcome.books[0].image_path.is_some());
    assert_eq!(outcome.report.text_failures, 1);
}

#[tokio::test]
async fn test_coordinator_with_custom_client() {
    let mock_server = MockServer::start().await;
    let dest = TempDir::new().expect("Failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/b5/"))
        .and(header("user-agent", "mirror-check/0.1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(detail_page("Foo :: Bar", &["Drama"], &[], "/shots/5.jpg")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = reqwest::Client::builder()
        .user_agent("mirror-check/0.1")
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to build client");

    let mut config = create_test_config(&mock_server.uri(), dest.path());
    config.download.skip_txt = true;
    config.download.skip_imgs = true;

    let coordinator = Coordinator::with_parts(
        SiteUrls::new(&mock_server.uri()).expect("Invalid base URL"),
        HttpFetcher::with_client(client),
        RetryPolicy::new(1, Duration::ZERO),
        &config,
    );
    let outcome = coordinator
        .run(&CrawlPlan::Ids {
            ids: PageRange::clamped(5, 6),
        })
        .await
        .expect("Harvest failed");

    assert_eq!(outcome.books.len(), 1);
    assert_eq!(outcome.books[0].title, "Foo");
}
