//! Statistics generation from the audit database
//!
//! This module provides functionality for extracting and displaying
//! audit statistics from the storage layer.

use crate::crawler::CrawlReport;
use crate::storage::{RunRecord, Storage};
use crate::url::Category;
use crate::ScoutError;
use std::collections::HashMap;
use std::fmt::Write;

/// Audit statistics for one run
#[derive(Debug, Clone)]
pub struct AuditStatistics {
    /// The run the statistics describe
    pub run: RunRecord,

    /// Total number of records stored for the run
    pub total_records: u64,

    /// Count of records by category
    pub records_by_category: HashMap<Category, u64>,

    /// Occurrences of each keyword summed over all records
    pub keyword_totals: HashMap<String, u64>,
}

/// Loads statistics for the most recent run
///
/// # Returns
///
/// * `Ok(Some(AuditStatistics))` - Statistics for the latest run
/// * `Ok(None)` - The database holds no runs
/// * `Err(ScoutError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<Option<AuditStatistics>, ScoutError> {
    match storage.get_latest_run()? {
        Some(run) => load_run_statistics(storage, run.id).map(Some),
        None => Ok(None),
    }
}

/// Loads statistics for a specific run
pub fn load_run_statistics(
    storage: &dyn Storage,
    run_id: i64,
) -> Result<AuditStatistics, ScoutError> {
    let run = storage.get_run(run_id)?;
    let total_records = storage.count_records(run_id)?;
    let records_by_category = storage.count_by_category(run_id)?;
    let keyword_totals = storage.keyword_totals(run_id)?;

    Ok(AuditStatistics {
        run,
        total_records,
        records_by_category,
        keyword_totals,
    })
}

/// Renders statistics as operator-facing text
pub fn format_statistics(stats: &AuditStatistics) -> String {
    let mut out = String::new();
    let run = &stats.run;

    let _ = writeln!(out, "=== Audit Statistics (run {}) ===\n", run.id);
    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  Homepage: {}", run.homepage_url);
    let _ = writeln!(out, "  Base domain: {}", run.base_domain);
    let _ = writeln!(
        out,
        "  Sitemap: {}",
        run.sitemap_url.as_deref().unwrap_or("(none)")
    );
    let _ = writeln!(out, "  Status: {}", run.status.to_db_string());
    let _ = writeln!(out, "  Started: {}", run.started_at);
    if let Some(finished) = &run.finished_at {
        let _ = writeln!(out, "  Finished: {}", finished);
    }
    let _ = writeln!(out, "  Pages recorded: {}", stats.total_records);
    let _ = writeln!(out);

    let _ = writeln!(out, "Pages by Category:");
    for category in Category::all() {
        let count = stats.records_by_category.get(&category).copied().unwrap_or(0);
        if count == 0 {
            continue;
        }
        let percentage = (count as f64 / stats.total_records.max(1) as f64) * 100.0;
        let _ = writeln!(out, "  {}: {} ({:.1}%)", category, count, percentage);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Keyword Totals:");
    // Keep the operator's keyword order
    for keyword in &run.keywords {
        let total = stats.keyword_totals.get(keyword).copied().unwrap_or(0);
        let _ = writeln!(out, "  {}: {}", keyword, total);
    }

    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &AuditStatistics) {
    print!("{}", format_statistics(stats));
}

/// Renders the summary of a crawl that just finished
pub fn format_report(run_id: i64, report: &CrawlReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Audit run {} finished", run_id);
    let _ = writeln!(
        out,
        "  Sitemap: {}",
        report.sitemap_url.as_deref().unwrap_or("(none)")
    );
    let _ = writeln!(out, "  Seeded from sitemap: {}", report.seeded);
    let _ = writeln!(out, "  URLs discovered: {}", report.discovered);
    let _ = writeln!(out, "  Pages fetched: {}", report.fetched.len());
    let _ = writeln!(out, "  Pages recorded: {}", report.recorded);
    let _ = writeln!(out, "  Out of scope: {}", report.out_of_scope);

    let failures = report.fetch_failures + report.parse_failures + report.store_failures;
    if failures > 0 {
        let _ = writeln!(
            out,
            "  Failures: {} fetch, {} parse, {} store",
            report.fetch_failures, report.parse_failures, report.store_failures
        );
    }
    if report.stopped_early {
        let _ = writeln!(out, "  Stopped early: limit reached with URLs still queued");
    }

    out
}
