//! Integration tests for the auditor
//!
//! These tests use wiremock to create mock HTTP servers and run the
//! sitemap resolver and the full audit cycle end-to-end over real HTTP.

use site_scout::config::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};
use site_scout::crawler::{
    crawl, resolve_sitemap, run_audit, Engine, HttpTransport, Seed, SitemapSource,
};
use site_scout::storage::{RecordStatus, RunStatus, SqliteStorage, Storage};
use site_scout::url::Category;
use site_scout::ScoutError;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing to the given database
fn create_test_config(db_path: &str) -> Config {
    Config {
        crawler: CrawlerConfig {
            request_timeout_secs: 5,
            connect_timeout_secs: 2,
            crawl_deadline_secs: 0,
            max_pages: 0,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            database_path: db_path.to_string(),
        },
    }
}

fn test_engine() -> Engine<HttpTransport> {
    let config = create_test_config(":memory:");
    let transport = HttpTransport::new(&config.crawler, &config.user_agent)
        .expect("Failed to build transport");
    Engine::new(transport)
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

fn xml(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "application/xml")
}

async fn mount_get(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn mount_head(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("HEAD"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Mounts a small shop: a sitemap found by probing, two products and a blog
async fn mount_shop(server: &MockServer) {
    let base = server.uri();

    mount_get(server, "/", html("<html><body><p>Welcome</p></body></html>".to_string())).await;
    mount_head(server, "/sitemap.xml", 200).await;
    mount_get(
        server,
        "/sitemap.xml",
        xml(format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
                <url><loc>{base}/products/mug</loc></url>
                <url><loc>{base}/products/mug?variant=42</loc></url>
                <url><loc>{base}/blogs/news</loc></url>
            </urlset>"#
        )),
    )
    .await;

    mount_get(
        server,
        "/products/mug",
        html(format!(
            r#"<html><head>
                <title>Stoneware Mug</title>
                <meta name="description" content="A mug for tea">
            </head><body>
                <h1>Stoneware mug</h1>
                <p>Pour your tea. Green tea or black tea, this mug holds it.</p>
                <a href="/products/teapot">Teapot</a>
                <a href="/blogs/news">News</a>
                <a href="https://cdn.shopify.com/s/files/mug.png">Image</a>
                <a href="https://twitter.com/share?url={base}/products/mug">Share</a>
                <a href="http://other.invalid/elsewhere">Elsewhere</a>
            </body></html>"#
        )),
    )
    .await;

    mount_get(
        server,
        "/blogs/news",
        html(
            r#"<html><head><title>News</title></head><body>
                <p>Tea season is here.</p>
                <a href="/products/mug">Mug</a>
            </body></html>"#
                .to_string(),
        ),
    )
    .await;

    mount_get(
        server,
        "/products/teapot",
        html("<html><body><p>A teapot</p></body></html>".to_string()),
    )
    .await;
}

fn seed_for(server: &MockServer, keywords: &str) -> Seed {
    Seed::new(&format!("{}/", server.uri()), keywords).expect("Failed to build seed")
}

#[tokio::test]
async fn test_sitemap_falls_back_to_robots_txt() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_get(
        &mock_server,
        "/",
        html(r#"<html><body><a href="/about">About</a></body></html>"#.to_string()),
    )
    .await;
    mount_head(&mock_server, "/sitemap.xml", 404).await;
    mount_get(
        &mock_server,
        "/robots.txt",
        ResponseTemplate::new(200).set_body_raw(
            format!("User-agent: *\nDisallow: /cart\nSitemap: {}/s.xml\n", base_url),
            "text/plain",
        ),
    )
    .await;

    let engine = test_engine();
    let homepage = url::Url::parse(&format!("{}/", base_url)).unwrap();
    let resolved = resolve_sitemap(engine.transport(), &homepage)
        .await
        .expect("Sitemap should be resolved from robots.txt");

    assert_eq!(resolved.url, format!("{}/s.xml", base_url));
    assert_eq!(resolved.source, SitemapSource::RobotsTxt);
}

#[tokio::test]
async fn test_sitemap_head_does_not_follow_redirects() {
    let mock_server = MockServer::start().await;

    mount_get(&mock_server, "/", html("<p>home</p>".to_string())).await;
    Mock::given(method("HEAD"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/sitemap_index.xml"))
        .mount(&mock_server)
        .await;
    mount_head(&mock_server, "/sitemap_index.xml", 200).await;

    let engine = test_engine();
    let homepage = url::Url::parse(&format!("{}/", mock_server.uri())).unwrap();
    let resolved = resolve_sitemap(engine.transport(), &homepage).await.unwrap();

    // The redirect itself is not a hit; the second candidate is
    assert_eq!(
        resolved.url,
        format!("{}/sitemap_index.xml", mock_server.uri())
    );
    assert_eq!(resolved.source, SitemapSource::CommonPath);
}

#[tokio::test]
async fn test_no_sitemap_records_zero_pages() {
    let mock_server = MockServer::start().await;
    mount_get(&mock_server, "/", html("<p>Nothing here</p>".to_string())).await;

    let engine = test_engine();
    let mut storage = SqliteStorage::new_in_memory().unwrap();
    let seed = seed_for(&mock_server, "tea");

    let result = run_audit(&engine, &mut storage, "hash", &seed).await;
    assert!(matches!(result, Err(ScoutError::SitemapNotFound { .. })));

    let run = storage.get_latest_run().unwrap().expect("Run should exist");
    assert_eq!(run.status, RunStatus::NoSitemap);
    assert!(run.finished_at.is_some());
    assert_eq!(run.pages_recorded, 0);
    assert_eq!(storage.count_records(run.id).unwrap(), 0);
}

#[tokio::test]
async fn test_full_audit_records_pages() {
    let mock_server = MockServer::start().await;
    mount_shop(&mock_server).await;
    let base_url = mock_server.uri();

    let engine = test_engine();
    let mut storage = SqliteStorage::new_in_memory().unwrap();
    let seed = seed_for(&mock_server, "tea, mug, green tea");

    let outcome = run_audit(&engine, &mut storage, "hash", &seed)
        .await
        .expect("Audit should complete");
    let report = &outcome.report;

    // Seeds first, then links in discovery order; the variant seed is noise
    assert_eq!(
        report.fetched,
        vec![
            format!("{}/products/mug", base_url),
            format!("{}/blogs/news", base_url),
            format!("{}/products/teapot", base_url),
        ]
    );
    assert_eq!(report.seeded, 2);
    assert_eq!(report.recorded, 3);
    assert_eq!(report.out_of_scope, 1);
    assert_eq!(report.fetch_failures, 0);

    let run = storage.get_run(outcome.run_id).unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.pages_recorded, 3);
    assert_eq!(
        run.sitemap_url.as_deref(),
        Some(format!("{}/sitemap.xml", base_url).as_str())
    );

    let mug = storage
        .get_record_by_url(outcome.run_id, &format!("{}/products/mug", base_url))
        .unwrap()
        .expect("Mug page should be recorded");
    assert_eq!(mug.category, Category::Product);
    assert_eq!(mug.meta_title, "Stoneware Mug");
    assert_eq!(mug.meta_description, "A mug for tea");
    assert_eq!(mug.status, RecordStatus::Pending);
    assert_eq!(mug.keywords.get("tea"), Some(&3));
    assert_eq!(mug.keywords.get("mug"), Some(&3));
    assert_eq!(mug.keywords.get("green tea"), Some(&1));

    let news = storage
        .get_record_by_url(outcome.run_id, &format!("{}/blogs/news", base_url))
        .unwrap()
        .unwrap();
    assert_eq!(news.category, Category::Blog);
    assert_eq!(news.meta_description, "No Description");

    let totals = storage.keyword_totals(outcome.run_id).unwrap();
    assert_eq!(totals.get("tea"), Some(&4));
}

#[tokio::test]
async fn test_noise_links_never_requested() {
    let mock_server = MockServer::start().await;
    mount_shop(&mock_server).await;

    let engine = test_engine();
    let mut storage = SqliteStorage::new_in_memory().unwrap();
    let seed = seed_for(&mock_server, "tea");

    run_audit(&engine, &mut storage, "hash", &seed).await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    for request in &requests {
        assert!(
            request.url.query().map_or(true, |q| !q.contains("variant=")),
            "Variant URL was requested: {}",
            request.url
        );
    }

    // Each page is fetched exactly once
    let mug_gets = requests
        .iter()
        .filter(|r| r.method.to_string() == "GET" && r.url.path() == "/products/mug")
        .count();
    assert_eq!(mug_gets, 1);
}

#[tokio::test]
async fn test_crawl_writes_database_file() {
    let mock_server = MockServer::start().await;
    mount_shop(&mock_server).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("audit.db");
    let config = create_test_config(db_path.to_str().unwrap());
    let seed = seed_for(&mock_server, "tea");

    let outcome = crawl(&config, "config-hash", &seed).await.unwrap();
    assert_eq!(outcome.report.recorded, 3);

    // Reopen to read back what the crawl persisted
    let storage = SqliteStorage::new(&db_path).unwrap();
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.id, outcome.run_id);
    assert_eq!(run.config_hash, "config-hash");
    assert_eq!(run.keywords, vec!["tea"]);
    assert_eq!(storage.count_records(run.id).unwrap(), 3);

    let by_category = storage.count_by_category(run.id).unwrap();
    assert_eq!(by_category.get(&Category::Product), Some(&2));
    assert_eq!(by_category.get(&Category::Blog), Some(&1));
}
