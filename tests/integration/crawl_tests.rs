//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use seo_crawler::analysis::{ProbeStatus, INVALID_JSON_LD};
use seo_crawler::config::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};
use seo_crawler::output::snapshot;
use seo_crawler::storage::{SqliteStorage, Storage};
use seo_crawler::{Coordinator, CrawlStatus};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing to a database inside `dir`
fn create_test_config(dir: &TempDir) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_pages: 5,
            request_delay_ms: 0,
            page_timeout_secs: 5,
            robots_timeout_secs: 5,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            database_path: dir.path().join("crawl.db").display().to_string(),
            export_path: dir.path().join("analysis.json").display().to_string(),
        },
    }
}

fn create_coordinator(dir: &TempDir) -> Coordinator {
    Coordinator::open(create_test_config(dir), "test-hash").expect("Failed to create coordinator")
}

fn html_page(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body.into())
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, route: &str, body: impl Into<String>) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_page(body))
        .mount(server)
        .await;
}

fn read_records(coordinator: &Coordinator) -> Vec<seo_crawler::CrawlRecord> {
    let storage = coordinator.storage();
    let guard = storage.lock().unwrap();
    guard.read_all().unwrap()
}

#[tokio::test]
async fn test_budget_of_one_persists_only_the_seed() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body><a href="/next">Next</a></body></html>"#,
    )
    .await;

    // Never followed
    Mock::given(method("GET"))
        .and(path("/next"))
        .respond_with(html_page("<html></html>"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(&dir);
    let persisted = coordinator
        .run_crawl(&format!("{}/", base_url), 1)
        .await
        .expect("Crawl should succeed");

    assert_eq!(persisted, 1);
    let records = read_records(&coordinator);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].url, format!("{}/", base_url));

    let analysis = records[0].analysis.as_ref().unwrap();
    assert_eq!(analysis.title.as_deref(), Some("Home"));
    assert_eq!(analysis.http_status, Some(ProbeStatus::Code(200)));
    assert_eq!(analysis.internal_links_count, 1);
    assert!(records[0].raw_document.as_deref().unwrap().contains("<title>Home</title>"));
    assert!(records[0].normalized_document.is_some());
}

#[tokio::test]
async fn test_budget_limits_breadth_first_crawl() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    let links: String = (1..=10)
        .map(|i| format!(r#"<a href="/page{}">Page {}</a>"#, i, i))
        .collect();
    mount_page(&server, "/", format!("<html><body>{}</body></html>", links)).await;

    // The first four links fit the budget: one fetch plus one status probe each
    for i in 1..=4 {
        Mock::given(method("GET"))
            .and(path(format!("/page{}", i)))
            .respond_with(html_page(format!("<html><title>Page {}</title></html>", i)))
            .expect(2)
            .mount(&server)
            .await;
    }
    for i in 5..=10 {
        Mock::given(method("GET"))
            .and(path(format!("/page{}", i)))
            .respond_with(html_page("<html></html>"))
            .expect(0)
            .mount(&server)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(&dir);
    let persisted = coordinator
        .run_crawl(&format!("{}/", base_url), 5)
        .await
        .unwrap();

    assert_eq!(persisted, 5);
    let urls: Vec<String> = read_records(&coordinator)
        .into_iter()
        .map(|r| r.url)
        .collect();
    let mut expected = vec![format!("{}/", base_url)];
    expected.extend((1..=4).map(|i| format!("{}/page{}", base_url, i)));
    assert_eq!(urls, expected);
}

#[tokio::test]
async fn test_links_to_other_authorities_are_never_fetched() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;
    let base_url = server.uri();

    mount_page(
        &server,
        "/",
        format!(
            r#"<html><body><a href="{}/elsewhere">Out</a><a href="/inside">In</a></body></html>"#,
            other.uri()
        ),
    )
    .await;
    mount_page(&server, "/inside", "<html><title>Inside</title></html>").await;

    Mock::given(method("GET"))
        .respond_with(html_page("<html></html>"))
        .expect(0)
        .mount(&other)
        .await;

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(&dir);
    let persisted = coordinator
        .run_crawl(&format!("{}/", base_url), 10)
        .await
        .unwrap();

    assert_eq!(persisted, 2);
    let home = &read_records(&coordinator)[0];
    let analysis = home.analysis.as_ref().unwrap();
    assert_eq!(analysis.internal_links_count, 1);
    assert_eq!(analysis.external_links_count, 1);
}

#[tokio::test]
async fn test_page_analysis_fields() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(
        &server,
        "/",
        r#"<html><head>
            <title>Shop</title>
            <meta name="description" content="Things for sale">
            <meta name="viewport" content="width=device-width, initial-scale=1">
            <link rel="canonical" href="https://shop.example/">
            <script type="application/ld+json">not json</script>
            <script src="/app.js"></script>
        </head><body>
            <h1>Welcome</h1>
            <img src="a.png">
            <img src="b.png" alt="x">
            <div aria-label="promo"></div>
        </body></html>"#,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(&dir);
    coordinator
        .run_crawl(&format!("{}/", base_url), 1)
        .await
        .unwrap();

    let records = read_records(&coordinator);
    let analysis = records[0].analysis.as_ref().unwrap();

    assert_eq!(analysis.meta_description.as_deref(), Some("Things for sale"));
    assert!(analysis.mobile_friendly_meta_tags);
    assert_eq!(analysis.canonical_url.as_deref(), Some("https://shop.example/"));
    assert_eq!(analysis.h1_tags, vec!["Welcome"]);
    assert_eq!(analysis.image_count, 2);
    assert_eq!(analysis.images_without_alt, 1);
    assert_eq!(analysis.wai_aria_attributes_found, 1);
    assert_eq!(analysis.javascript_usage_indicators.external_scripts, 1);
    assert_eq!(analysis.structured_data_scripts.len(), 1);
    assert_eq!(
        analysis.structured_data_scripts[0].error.as_deref(),
        Some(INVALID_JSON_LD)
    );
    assert_eq!(
        analysis.final_url_after_redirects.as_deref(),
        Some(format!("{}/", base_url).as_str())
    );
}

#[tokio::test]
async fn test_missing_robots_still_appends_default_sitemap() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(&server, "/", "<html><title>Home</title></html>").await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(&dir);
    assert_eq!(
        coordinator
            .run_crawl(&format!("{}/", base_url), 1)
            .await
            .unwrap(),
        1
    );

    let records = read_records(&coordinator);
    let analysis = records[0].analysis.as_ref().unwrap();
    assert_eq!(analysis.robots_txt_status, Some(ProbeStatus::Code(404)));
    assert!(analysis.robots_txt_content.is_none());
    assert_eq!(
        analysis.sitemap_links,
        vec![format!("{}/sitemap.xml (Default check)", base_url)]
    );
}

#[tokio::test]
async fn test_robots_sitemaps_are_collected() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(&server, "/", "<html><title>Home</title></html>").await;
    let robots = format!(
        "User-agent: *\nDisallow: /private\nSitemap: {}/sitemap.xml\nsitemap: {}/news.xml\n",
        base_url, base_url
    );
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(robots.clone()))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(&dir);
    coordinator
        .run_crawl(&format!("{}/", base_url), 1)
        .await
        .unwrap();

    let records = read_records(&coordinator);
    let analysis = records[0].analysis.as_ref().unwrap();
    assert_eq!(analysis.robots_txt_status, Some(ProbeStatus::Code(200)));
    assert_eq!(analysis.robots_txt_content.as_deref(), Some(robots.as_str()));
    // The declared /sitemap.xml suppresses the default candidate
    assert_eq!(
        analysis.sitemap_links,
        vec![
            format!("{}/sitemap.xml", base_url),
            format!("{}/news.xml", base_url)
        ]
    );
}

#[tokio::test]
async fn test_failed_fetch_is_skipped() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(
        &server,
        "/",
        r#"<html><body><a href="/missing">Gone</a><a href="/ok">OK</a></body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_page(&server, "/ok", "<html><title>OK</title></html>").await;

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(&dir);
    let persisted = coordinator
        .run_crawl(&format!("{}/", base_url), 10)
        .await
        .unwrap();

    assert_eq!(persisted, 2);
    let urls: Vec<String> = read_records(&coordinator)
        .into_iter()
        .map(|r| r.url)
        .collect();
    assert!(!urls.contains(&format!("{}/missing", base_url)));
    assert!(urls.contains(&format!("{}/ok", base_url)));

    let storage = coordinator.storage();
    let run = storage.lock().unwrap().get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, CrawlStatus::Completed);
    assert_eq!(run.pages_processed, 3);
    assert_eq!(run.pages_persisted, 2);
    assert_eq!(run.config_hash, "test-hash");
}

#[tokio::test]
async fn test_storage_failure_skips_page_and_crawl_continues() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(
        &server,
        "/",
        r#"<html><body><a href="/broken">Broken</a><a href="/ok">OK</a></body></html>"#,
    )
    .await;
    mount_page(&server, "/broken", "<html><title>Broken</title></html>").await;
    mount_page(&server, "/ok", "<html><title>OK</title></html>").await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("crawl.db");
    SqliteStorage::new(&db_path).unwrap();
    let conn = rusqlite::Connection::open(&db_path).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER reject_broken BEFORE INSERT ON crawled_pages
         WHEN NEW.url LIKE '%/broken'
         BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
    )
    .unwrap();
    drop(conn);

    let coordinator = create_coordinator(&dir);
    let persisted = coordinator
        .run_crawl(&format!("{}/", base_url), 10)
        .await
        .unwrap();

    assert_eq!(persisted, 2);
    let urls: Vec<String> = read_records(&coordinator)
        .into_iter()
        .map(|r| r.url)
        .collect();
    assert!(!urls.contains(&format!("{}/broken", base_url)));
    assert!(urls.contains(&format!("{}/ok", base_url)));

    let storage = coordinator.storage();
    let run = storage.lock().unwrap().get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, CrawlStatus::Completed);
    assert_eq!(run.pages_processed, 3);
    assert_eq!(run.pages_persisted, 2);
}

#[tokio::test]
async fn test_recrawl_overwrites_record() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let seed = format!("{}/", base_url);

    mount_page(&server, "/", "<html><title>First</title></html>").await;

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(&dir);
    coordinator.run_crawl(&seed, 1).await.unwrap();

    server.reset().await;
    mount_page(&server, "/", "<html><title>Second</title></html>").await;
    coordinator.run_crawl(&seed, 1).await.unwrap();

    let records = read_records(&coordinator);
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].analysis.as_ref().unwrap().title.as_deref(),
        Some("Second")
    );
}

#[tokio::test]
async fn test_redirect_is_reported_by_status_probe() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    let location = format!("{}/new", base_url);
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", location.as_str()))
        .mount(&server)
        .await;
    mount_page(&server, "/new", "<html><title>New</title></html>").await;

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(&dir);
    coordinator
        .run_crawl(&format!("{}/old", base_url), 1)
        .await
        .unwrap();

    let records = read_records(&coordinator);
    assert_eq!(records[0].url, format!("{}/old", base_url));
    let analysis = records[0].analysis.as_ref().unwrap();
    assert_eq!(analysis.http_status, Some(ProbeStatus::Code(200)));
    assert_eq!(
        analysis.final_url_after_redirects.as_deref(),
        Some(format!("{}/new", base_url).as_str())
    );
    assert_eq!(analysis.title.as_deref(), Some("New"));
}

#[tokio::test]
async fn test_spawned_crawl_reports_status() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(
        &server,
        "/",
        r#"<html><body><a href="/a">A</a><a href="/b">B</a></body></html>"#,
    )
    .await;
    mount_page(&server, "/a", "<html><title>A</title></html>").await;
    mount_page(&server, "/b", "<html><title>B</title></html>").await;

    let dir = TempDir::new().unwrap();
    let coordinator = Arc::new(create_coordinator(&dir));
    let handle = Arc::clone(&coordinator)
        .spawn(&format!("{}/", base_url), 0)
        .unwrap();

    let initial = handle.status();
    assert_eq!(initial.pages_budgeted, 1);
    assert_eq!(initial.url, format!("{}/", base_url));

    let mut updates = handle.subscribe();
    tokio::time::timeout(Duration::from_secs(10), async {
        while !updates.borrow_and_update().status.is_terminal() {
            if updates.changed().await.is_err() {
                break;
            }
        }
    })
    .await
    .expect("Crawl should finish");

    let report = handle.status();
    assert_eq!(report.status, CrawlStatus::Completed);
    assert_eq!(report.pages_processed, 1);
    assert_eq!(report.pages_persisted, 1);
    assert!(report.error.is_none());

    assert_eq!(handle.wait().await.unwrap(), 1);

    let pages = coordinator.snapshot().unwrap();
    assert_eq!(pages.len(), 1);
}

#[tokio::test]
async fn test_invalid_seed_is_rejected_before_crawling() {
    let dir = TempDir::new().unwrap();
    let coordinator = Arc::new(create_coordinator(&dir));

    assert!(Arc::clone(&coordinator).spawn("example.com/page", 3).is_err());
    assert!(Arc::clone(&coordinator).spawn("ftp://example.com/", 3).is_err());

    let storage = coordinator.storage();
    assert!(storage.lock().unwrap().get_latest_run().unwrap().is_none());
}

#[tokio::test]
async fn test_query_and_reset() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    mount_page(&server, "/", "<html><title>Home</title></html>").await;

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(&dir);
    coordinator
        .run_crawl(&format!("{}/", base_url), 1)
        .await
        .unwrap();

    // A second connection sees the committed records
    let reader = SqliteStorage::new(&dir.path().join("crawl.db")).unwrap();
    let pages = snapshot(&reader).unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(
        pages[0].analysis.as_ref().unwrap().title.as_deref(),
        Some("Home")
    );

    assert_eq!(coordinator.clear_records().unwrap(), 1);
    assert_eq!(coordinator.clear_records().unwrap(), 0);
    assert!(snapshot(&reader).unwrap().is_empty());
}
