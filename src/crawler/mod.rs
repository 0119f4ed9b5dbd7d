//! Crawler module for sitemap-seeded site audits
//!
//! This module contains the core crawling logic, including:
//! - Sitemap resolution with homepage, common-path and robots.txt fallbacks
//! - Link extraction from HTML pages and sitemap documents
//! - Page analysis and keyword profiling
//! - The breadth-first frontier engine that ties them together

mod analyzer;
mod engine;
mod frontier;
mod links;
mod seed;
mod sitemap;
mod transport;

pub use analyzer::{
    analyze, analyze_html, count_keywords, KeywordMatcher, KeywordProfile, PageContent,
    NO_DESCRIPTION, NO_TITLE,
};
pub use engine::{CrawlLimits, CrawlPhase, CrawlReport, Engine};
pub use frontier::Frontier;
pub use links::{
    extract_links, extract_page_links, extract_sitemap_links, fetch_page_links,
    find_sitemap_link, parse_sitemap_locs, resolve_link, try_extract_page_links,
};
pub use seed::{parse_keywords, Seed};
pub use sitemap::{
    extract_sitemap_directive, resolve_sitemap, ResolvedSitemap, SitemapSource,
    COMMON_SITEMAP_PATHS,
};
pub use transport::{build_http_client, FetchedPage, HttpTransport, Transport, TransportError};

use crate::config::Config;
use crate::storage::{RunSink, RunStatus, SqliteStorage, Storage};
use crate::ScoutError;
use std::path::Path;

/// Result of a finished audit run
#[derive(Debug, Clone)]
pub struct AuditOutcome {
    pub run_id: i64,
    pub report: CrawlReport,
}

/// Runs a complete audit against the configured database
///
/// This is the main entry point for starting an audit. It will:
/// 1. Open the database
/// 2. Build the HTTP transport from the config
/// 3. Crawl the site and record every analyzed page
/// 4. Mark the run finished
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `config_hash` - Hash of the config file, stored on the run
/// * `seed` - Homepage and keywords to audit
///
/// # Returns
///
/// * `Ok(AuditOutcome)` - The crawl completed
/// * `Err(ScoutError)` - Setup failed, or no sitemap could be found
pub async fn crawl(
    config: &Config,
    config_hash: &str,
    seed: &Seed,
) -> Result<AuditOutcome, ScoutError> {
    let mut storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let transport = HttpTransport::new(&config.crawler, &config.user_agent)?;
    let engine = Engine::new(transport).with_limits(CrawlLimits::from_config(&config.crawler));

    run_audit(&engine, &mut storage, config_hash, seed).await
}

/// Runs an audit with the given engine and storage
///
/// The run row is finished on every path: `completed` after a crawl,
/// `no_sitemap` when resolution fails and `failed` for any other error.
/// A failure to finish the row is logged; the crawl result is returned as is.
pub async fn run_audit<T, S>(
    engine: &Engine<T>,
    storage: &mut S,
    config_hash: &str,
    seed: &Seed,
) -> Result<AuditOutcome, ScoutError>
where
    T: Transport,
    S: Storage,
{
    let run_id = storage.create_run(
        config_hash,
        seed.homepage_url.as_str(),
        &seed.base_domain,
        &seed.keywords,
    )?;
    tracing::info!("Starting audit run {} for {}", run_id, seed.homepage_url);

    let result = {
        let mut sink = RunSink::new(storage, run_id);
        engine.run(seed, &mut sink).await
    };

    let status = match &result {
        Ok(_) => RunStatus::Completed,
        Err(ScoutError::SitemapNotFound { .. }) => RunStatus::NoSitemap,
        Err(_) => RunStatus::Failed,
    };
    let sitemap_url = match &result {
        Ok(report) => report.sitemap_url.as_deref(),
        Err(_) => None,
    };

    if let Err(e) = storage.finish_run(run_id, status, sitemap_url) {
        tracing::error!(
            "Failed to finish run {} as {}: {}",
            run_id,
            status.to_db_string(),
            e
        );
    }

    result.map(|report| AuditOutcome { run_id, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{RunRecord, SinkRecord, StorageError, StorageResult, StoredRecord};
    use crate::url::Category;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Serves fixed HTML/XML bodies keyed by URL
    #[derive(Default)]
    struct FixedSite {
        pages: HashMap<String, (String, String)>,
    }

    impl FixedSite {
        fn page(mut self, url: &str, content_type: &str, body: &str) -> Self {
            self.pages
                .insert(url.to_string(), (content_type.to_string(), body.to_string()));
            self
        }
    }

    #[async_trait]
    impl Transport for FixedSite {
        async fn fetch(&self, url: &str) -> Result<FetchedPage, TransportError> {
            self.pages
                .get(url)
                .map(|(content_type, body)| FetchedPage {
                    status: 200,
                    content_type: content_type.clone(),
                    body: body.clone(),
                })
                .ok_or_else(|| TransportError::Status {
                    url: url.to_string(),
                    status: 404,
                })
        }

        async fn fetch_head(&self, _url: &str) -> Result<u16, TransportError> {
            Ok(404)
        }
    }

    /// SQLite storage whose `finish_run` always fails
    struct UnfinishableStorage {
        inner: SqliteStorage,
        finish_calls: usize,
    }

    impl Storage for UnfinishableStorage {
        fn create_run(
            &mut self,
            config_hash: &str,
            homepage_url: &str,
            base_domain: &str,
            keywords: &[String],
        ) -> StorageResult<i64> {
            self.inner
                .create_run(config_hash, homepage_url, base_domain, keywords)
        }

        fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
            self.inner.get_run(run_id)
        }

        fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
            self.inner.get_latest_run()
        }

        fn finish_run(
            &mut self,
            _run_id: i64,
            _status: RunStatus,
            _sitemap_url: Option<&str>,
        ) -> StorageResult<()> {
            self.finish_calls += 1;
            Err(StorageError::Database("database is locked".to_string()))
        }

        fn insert_record(&mut self, run_id: i64, record: &SinkRecord) -> StorageResult<i64> {
            self.inner.insert_record(run_id, record)
        }

        fn get_records(&self, run_id: i64) -> StorageResult<Vec<StoredRecord>> {
            self.inner.get_records(run_id)
        }

        fn get_record_by_url(
            &self,
            run_id: i64,
            url: &str,
        ) -> StorageResult<Option<StoredRecord>> {
            self.inner.get_record_by_url(run_id, url)
        }

        fn count_records(&self, run_id: i64) -> StorageResult<u64> {
            self.inner.count_records(run_id)
        }

        fn count_by_category(&self, run_id: i64) -> StorageResult<HashMap<Category, u64>> {
            self.inner.count_by_category(run_id)
        }

        fn keyword_totals(&self, run_id: i64) -> StorageResult<HashMap<String, u64>> {
            self.inner.keyword_totals(run_id)
        }
    }

    fn unfinishable() -> UnfinishableStorage {
        UnfinishableStorage {
            inner: SqliteStorage::new_in_memory().unwrap(),
            finish_calls: 0,
        }
    }

    fn shop() -> FixedSite {
        FixedSite::default()
            .page(
                "https://example.com/",
                "text/html",
                r#"<a href="/sitemap.xml">Sitemap</a>"#,
            )
            .page(
                "https://example.com/sitemap.xml",
                "application/xml",
                "<urlset><url><loc>https://example.com/products/mug</loc></url></urlset>",
            )
            .page(
                "https://example.com/products/mug",
                "text/html",
                "<title>Mug</title><p>tea mug</p>",
            )
    }

    fn seed() -> Seed {
        Seed::new("https://example.com/", "tea").unwrap()
    }

    #[tokio::test]
    async fn test_completed_run_stores_sitemap_and_status() {
        let engine = Engine::new(shop());
        let mut storage = SqliteStorage::new_in_memory().unwrap();

        let outcome = run_audit(&engine, &mut storage, "hash", &seed())
            .await
            .unwrap();

        assert_eq!(outcome.report.recorded, 1);
        let run = storage.get_run(outcome.run_id).unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.pages_recorded, 1);
        assert_eq!(
            run.sitemap_url.as_deref(),
            Some("https://example.com/sitemap.xml")
        );
    }

    #[tokio::test]
    async fn test_finish_failure_keeps_crawl_result() {
        let engine = Engine::new(shop());
        let mut storage = unfinishable();

        let outcome = run_audit(&engine, &mut storage, "hash", &seed())
            .await
            .expect("Crawl result should survive a failed finish");

        assert_eq!(outcome.report.recorded, 1);
        assert_eq!(storage.finish_calls, 1);
        assert_eq!(storage.count_records(outcome.run_id).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_finish_failure_keeps_no_sitemap_error() {
        let site = FixedSite::default().page("https://example.com/", "text/html", "<p>home</p>");
        let engine = Engine::new(site);
        let mut storage = unfinishable();

        let result = run_audit(&engine, &mut storage, "hash", &seed()).await;

        assert!(matches!(result, Err(ScoutError::SitemapNotFound { .. })));
        assert_eq!(storage.finish_calls, 1);
    }
}
