//! Integration tests for the site mapper
//!
//! These tests use wiremock to serve small web sites and run the full
//! fetch, scan, resolve and print cycle end-to-end.

use sitemapper::config::{load_config, Config};
use sitemapper::crawler::{CrawlStats, DEFAULT_TITLE};
use sitemapper::{DocumentId, SiteMap};
use std::io::Write;
use tempfile::NamedTempFile;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a minimal HTML page with the given title and anchors
fn html_page(title: Option<&str>, links: &[&str]) -> String {
    let head = title
        .map(|t| format!("<title>{}</title>", t))
        .unwrap_or_default();
    let anchors: String = links
        .iter()
        .map(|href| format!("<a href=\"{}\">link</a>", href))
        .collect();

    format!(
        "<!DOCTYPE html><html><head>{}</head><body>{}</body></html>",
        head, anchors
    )
}

/// Serves `body` at `route`, expecting exactly `hits` requests
async fn serve(server: &MockServer, route: &str, body: String, hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(body),
        )
        .expect(hits)
        .mount(server)
        .await;
}

/// Runs a crawl off the async runtime, since fetching blocks
async fn produce(config: Config, start: String) -> (SiteMap, CrawlStats) {
    tokio::task::spawn_blocking(move || {
        let mut sitemap = SiteMap::new(config);
        let stats = sitemap.produce_from(&start).expect("Crawl failed");
        (sitemap, stats)
    })
    .await
    .expect("Crawl task panicked")
}

fn render(sitemap: &SiteMap) -> String {
    let mut out = Vec::new();
    sitemap.write_tree(&mut out).expect("Failed to write tree");
    String::from_utf8(out).expect("Tree is not UTF-8")
}

fn id(base: &str, route: &str) -> DocumentId {
    DocumentId::new(format!("{}{}", base, route))
}

#[tokio::test(flavor = "multi_thread")]
async fn test_single_page_without_links() {
    let server = MockServer::start().await;
    serve(&server, "/", html_page(Some("Home"), &[]), 1).await;

    let (sitemap, stats) = produce(Config::default(), server.uri()).await;

    assert_eq!(stats.discovered, 1);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.failed, 0);
    assert_eq!(sitemap.len(), 1);

    let root = sitemap.root().expect("Root should be set");
    let record = sitemap.get(root).expect("Root should have a record");
    assert_eq!(record.title, "Home");
    assert!(record.links.is_empty());
    assert!(record.completed);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cycle_is_fetched_once_per_page() {
    let server = MockServer::start().await;
    let base = server.uri();

    serve(&server, "/", html_page(Some("Home"), &["/about"]), 1).await;
    serve(&server, "/about", html_page(Some("About"), &["/"]), 1).await;

    let (sitemap, stats) = produce(Config::default(), base.clone()).await;

    assert_eq!(stats.discovered, 2);
    assert_eq!(stats.completed, 2);
    assert_eq!(sitemap.len(), 2);

    let home = sitemap.get(&id(&base, "/")).expect("Home missing");
    let about = sitemap.get(&id(&base, "/about")).expect("About missing");
    assert_eq!(home.links, vec![id(&base, "/about")]);
    assert_eq!(about.links, vec![id(&base, "/")]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_duplicate_and_foreign_links() {
    let server = MockServer::start().await;
    let base = server.uri();

    serve(
        &server,
        "/",
        html_page(
            Some("Home"),
            &[
                "/docs",
                "/docs/?page=2#top",
                "https://other.invalid/docs",
                "mailto:admin@example.com",
            ],
        ),
        1,
    )
    .await;
    serve(&server, "/docs", html_page(Some("Docs"), &[]), 1).await;

    let (sitemap, stats) = produce(Config::default(), base.clone()).await;

    assert_eq!(stats.discovered, 2);
    assert_eq!(stats.links_accepted, 2);
    assert_eq!(stats.links_rejected, 2);

    let home = sitemap.get(&id(&base, "/")).expect("Home missing");
    assert_eq!(home.links, vec![id(&base, "/docs"), id(&base, "/docs")]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_page_is_recorded_as_failed() {
    let server = MockServer::start().await;
    let base = server.uri();

    serve(&server, "/", html_page(Some("Home"), &["/gone"]), 1).await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let (sitemap, stats) = produce(Config::default(), base.clone()).await;

    assert_eq!(stats.completed, 2);
    assert_eq!(stats.failed, 1);

    let gone = sitemap.get(&id(&base, "/gone")).expect("Failed page missing");
    assert!(gone.is_failed());
    assert!(gone.completed);
    assert_eq!(gone.title, DEFAULT_TITLE);
    assert!(gone.links.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unreachable_start_still_terminates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (sitemap, stats) = produce(Config::default(), server.uri()).await;

    assert_eq!(stats.discovered, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(sitemap.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_tree_output() {
    let server = MockServer::start().await;
    let base = server.uri();

    serve(&server, "/", html_page(Some("Home"), &["/a", "/b"]), 1).await;
    serve(&server, "/a", html_page(Some("Page A"), &["/b", "/"]), 1).await;
    serve(&server, "/b", html_page(Some("Page B"), &[]), 1).await;

    let (sitemap, _) = produce(Config::default(), base).await;
    let tree = render(&sitemap);

    assert!(tree.starts_with("SITE MAP\n"));
    let body: Vec<&str> = tree.lines().skip_while(|l| !l.starts_with(" - ")).collect();
    assert_eq!(
        body,
        vec![
            " - Home",
            "  - Page A",
            "   - Page B",
            "   * Home",
            "  * Page B",
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_crawl_with_config_file() {
    let server = MockServer::start().await;
    let base = server.uri();

    let pages: Vec<String> = (0..30).map(|i| format!("/p{}", i)).collect();
    let links: Vec<&str> = pages.iter().map(String::as_str).collect();
    serve(&server, "/", html_page(Some("Index"), &links), 1).await;
    for page in &pages {
        serve(&server, page, html_page(None, &["/"]), 1).await;
    }

    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(
        file,
        "[crawler]\nworkers = 2\nresults-buffer = 1\nlink-batch-size = 7\n\n[fetcher]\nuser-agent = \"sitemapper-tests\"\n"
    )
    .expect("Failed to write config");
    let config = load_config(file.path()).expect("Failed to load config");
    assert_eq!(config.crawler.workers, 2);

    let (sitemap, stats) = produce(config, base.clone()).await;

    assert_eq!(stats.discovered, 31);
    assert_eq!(stats.completed, 31);
    assert_eq!(sitemap.len(), 31);

    let index = sitemap.get(&id(&base, "/")).expect("Index missing");
    assert_eq!(index.links.len(), 30);
    assert_eq!(index.links[0], id(&base, "/p0"));

    let untitled = sitemap.get(&id(&base, "/p0")).expect("Page missing");
    assert_eq!(untitled.title, DEFAULT_TITLE);
}
