//! Frontier engine - the crawl state machine
//!
//! A run moves through four phases:
//! - `ResolvingSitemap`: locate the sitemap, or end the run with `SitemapNotFound`
//! - `Seeding`: load the sitemap's `<loc>` entries into the frontier
//! - `Draining`: pop URLs breadth-first, expand links, analyze and record pages
//! - `Done`: terminal
//!
//! Everything that can fail for a single URL (fetch, parse, store) is logged
//! and counted in the [`CrawlReport`]; only sitemap resolution is fatal.

use crate::config::CrawlerConfig;
use crate::crawler::analyzer::{analyze_html, KeywordMatcher};
use crate::crawler::frontier::Frontier;
use crate::crawler::links::{extract_sitemap_links, try_extract_page_links};
use crate::crawler::seed::Seed;
use crate::crawler::sitemap::resolve_sitemap;
use crate::crawler::transport::Transport;
use crate::storage::{PageRecord, RecordSink, RecordStatus, SinkRecord};
use crate::url::{classify_category, is_in_scope};
use crate::ScoutError;
use std::time::{Duration, Instant};
use url::Url;

/// Phases of a crawl run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlPhase {
    ResolvingSitemap,
    Seeding { sitemap_url: String },
    Draining,
    Done,
}

/// What happened to a single URL handed to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageOutcome {
    /// Never fetched
    Skipped,
    FetchFailed,
    ParseFailed,
    StoreFailed,
    Recorded,
}

/// Optional bounds on a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlLimits {
    /// Wall-clock budget for the whole run
    pub deadline: Option<Duration>,

    /// Maximum number of pages fetched while draining
    pub max_pages: Option<usize>,
}

impl CrawlLimits {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            deadline: config.deadline(),
            max_pages: config.page_limit(),
        }
    }
}

/// Summary of one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// The sitemap the run was seeded from
    pub sitemap_url: Option<String>,

    /// URLs loaded from the sitemap
    pub seeded: usize,

    /// Distinct URLs ever added to the frontier
    pub discovered: usize,

    /// URLs fetched, in fetch order
    pub fetched: Vec<String>,

    /// Records accepted by the sink
    pub recorded: usize,

    /// URLs discarded by the scope check
    pub out_of_scope: usize,

    pub fetch_failures: usize,
    pub parse_failures: usize,
    pub store_failures: usize,

    /// True when a deadline or page cap ended the run with URLs still queued
    pub stopped_early: bool,
}

/// Drives one crawl from a seed to completion
pub struct Engine<T: Transport> {
    transport: T,
    limits: CrawlLimits,
}

impl<T: Transport> Engine<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            limits: CrawlLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: CrawlLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Runs the crawl
    ///
    /// # Arguments
    ///
    /// * `seed` - Homepage, base domain and keywords for this run
    /// * `sink` - Receives one record per analyzed in-scope page
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The crawl reached `Done`
    /// * `Err(ScoutError::SitemapNotFound)` - No sitemap could be resolved; nothing was fetched or recorded
    pub async fn run(
        &self,
        seed: &Seed,
        sink: &mut dyn RecordSink,
    ) -> Result<CrawlReport, ScoutError> {
        let started = Instant::now();
        let mut report = CrawlReport::default();
        let mut frontier = Frontier::new();
        let mut phase = CrawlPhase::ResolvingSitemap;
        let matcher = KeywordMatcher::new(&seed.keywords);

        loop {
            tracing::debug!("Crawl phase: {:?}", phase);
            phase = match phase {
                CrawlPhase::ResolvingSitemap => {
                    match resolve_sitemap(&self.transport, &seed.homepage_url).await {
                        Some(resolved) => {
                            tracing::info!(
                                "Found sitemap URL: {} (via {:?})",
                                resolved.url,
                                resolved.source
                            );
                            report.sitemap_url = Some(resolved.url.clone());
                            CrawlPhase::Seeding {
                                sitemap_url: resolved.url,
                            }
                        }
                        None => {
                            tracing::error!(
                                "No sitemap URL could be found for {}",
                                seed.homepage_url
                            );
                            return Err(ScoutError::SitemapNotFound {
                                homepage: seed.homepage_url.to_string(),
                            });
                        }
                    }
                }
                CrawlPhase::Seeding { sitemap_url } => {
                    frontier = self.seed_frontier(&sitemap_url).await;
                    report.seeded = frontier.pending();
                    tracing::info!("Seeded frontier with {} URLs", report.seeded);
                    CrawlPhase::Draining
                }
                CrawlPhase::Draining => {
                    self.drain(seed, &matcher, &mut frontier, sink, &mut report, started)
                        .await;
                    CrawlPhase::Done
                }
                CrawlPhase::Done => break,
            };
        }

        report.discovered = frontier.discovered();

        tracing::info!(
            "Crawl completed: {} pages fetched, {} recorded, {} out of scope in {:?}",
            report.fetched.len(),
            report.recorded,
            report.out_of_scope,
            started.elapsed()
        );

        Ok(report)
    }

    /// Fetches the sitemap and builds the initial frontier from its `<loc>` entries
    async fn seed_frontier(&self, sitemap_url: &str) -> Frontier {
        let url = match Url::parse(sitemap_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Invalid sitemap URL {}: {}", sitemap_url, e);
                return Frontier::new();
            }
        };

        match self.transport.fetch(url.as_str()).await {
            Ok(page) => Frontier::with_seeds(extract_sitemap_links(&url, &page.body)),
            Err(e) => {
                tracing::warn!("Failed to fetch sitemap {}: {}", url, e);
                Frontier::new()
            }
        }
    }

    async fn drain(
        &self,
        seed: &Seed,
        matcher: &KeywordMatcher,
        frontier: &mut Frontier,
        sink: &mut dyn RecordSink,
        report: &mut CrawlReport,
        started: Instant,
    ) {
        while let Some(url) = frontier.pop() {
            tracing::debug!("Processing URL: {}", url);

            if !is_in_scope(&url, &seed.base_domain) {
                tracing::debug!("Skipping out-of-scope URL: {}", url);
                report.out_of_scope += 1;
                continue;
            }

            if let Some(reason) = self.limit_reached(report, started) {
                tracing::warn!("Stopping crawl early: {}", reason);
                report.stopped_early = true;
                break;
            }

            let outcome = self.process_url(&url, matcher, frontier, sink, report).await;
            if outcome == PageOutcome::Skipped {
                continue;
            }

            let processed = report.fetched.len();
            if processed % 10 == 0 {
                let rate = processed as f64 / started.elapsed().as_secs_f64().max(f64::EPSILON);
                tracing::info!(
                    "Progress: {} pages processed, {} in frontier, {:.2} pages/sec",
                    processed,
                    frontier.pending(),
                    rate
                );
            }
        }
    }

    fn limit_reached(&self, report: &CrawlReport, started: Instant) -> Option<String> {
        if let Some(max) = self.limits.max_pages {
            if report.fetched.len() >= max {
                return Some(format!("page limit of {} reached", max));
            }
        }
        if let Some(deadline) = self.limits.deadline {
            if started.elapsed() >= deadline {
                return Some(format!("deadline of {:?} exceeded", deadline));
            }
        }
        None
    }

    /// Fetches one in-scope URL, expands the frontier and records the page
    async fn process_url(
        &self,
        url: &str,
        matcher: &KeywordMatcher,
        frontier: &mut Frontier,
        sink: &mut dyn RecordSink,
        report: &mut CrawlReport,
    ) -> PageOutcome {
        let page_url = match Url::parse(url) {
            Ok(u) => u,
            Err(e) => {
                tracing::warn!("Skipping unparseable URL {}: {}", url, e);
                report.parse_failures += 1;
                return PageOutcome::Skipped;
            }
        };

        report.fetched.push(url.to_string());
        let page = match self.transport.fetch(url).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Error fetching {}: {}", url, e);
                report.fetch_failures += 1;
                return PageOutcome::FetchFailed;
            }
        };

        let links = match try_extract_page_links(&page_url, &page) {
            Ok(links) => links,
            Err(e) => {
                tracing::warn!("Failed to parse XML from {}: {}", url, e);
                report.parse_failures += 1;
                return PageOutcome::ParseFailed;
            }
        };
        let added = frontier.discover_all(links);
        tracing::debug!("{} new links from {}", added, url);

        let content = analyze_html(&page.body);
        let record = PageRecord {
            category: classify_category(url),
            url: url.to_string(),
            keyword_counts: matcher.profile(&content.text),
            title: content.title,
            meta_description: content.meta_description,
            status: RecordStatus::Pending,
        };

        match SinkRecord::from_page(&record).and_then(|r| sink.store(&r)) {
            Ok(_) => {
                report.recorded += 1;
                tracing::info!("Recorded {} ({})", url, record.category);
                PageOutcome::Recorded
            }
            Err(e) => {
                tracing::warn!("Failed to insert data for URL {}: {}", url, e);
                report.store_failures += 1;
                PageOutcome::StoreFailed
            }
        }
    }
}
