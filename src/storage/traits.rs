//! Storage traits and error types
//!
//! This module defines the sink the crawler writes to and the query
//! interface used to read audit results back.

use crate::storage::{RunRecord, RunStatus, SinkRecord, StoredRecord};
use crate::url::Category;
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Destination for analyzed pages
///
/// The crawler calls `store` at most once per accepted page and never
/// retries; a failure is logged and the crawl moves on.
pub trait RecordSink {
    /// Stores one record, returning its row ID
    fn store(&mut self, record: &SinkRecord) -> StorageResult<i64>;
}

/// Run bookkeeping and result queries
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new audit run
    fn create_run(
        &mut self,
        config_hash: &str,
        homepage_url: &str,
        base_domain: &str,
        keywords: &[String],
    ) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Marks a run finished with a final status and record count
    ///
    /// `sitemap_url` is written in the same update when given; `None`
    /// leaves the stored value untouched.
    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        sitemap_url: Option<&str>,
    ) -> StorageResult<()>;

    // ===== Record Queries =====

    /// Inserts a record for a run
    fn insert_record(&mut self, run_id: i64, record: &SinkRecord) -> StorageResult<i64>;

    /// Gets all records of a run, in insertion order
    fn get_records(&self, run_id: i64) -> StorageResult<Vec<StoredRecord>>;

    /// Gets the latest record for a URL within a run
    fn get_record_by_url(&self, run_id: i64, url: &str) -> StorageResult<Option<StoredRecord>>;

    /// Counts the records of a run
    fn count_records(&self, run_id: i64) -> StorageResult<u64>;

    /// Counts the records of a run per category
    fn count_by_category(&self, run_id: i64) -> StorageResult<HashMap<Category, u64>>;

    /// Sums each keyword's counts over all records of a run
    fn keyword_totals(&self, run_id: i64) -> StorageResult<HashMap<String, u64>>;
}
