//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait
//! and the per-run record sink the crawler writes through.

use crate::crawler::KeywordProfile;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{RecordSink, Storage, StorageError, StorageResult};
use crate::storage::{RecordStatus, RunRecord, RunStatus, SinkRecord, StoredRecord};
use crate::url::Category;
use crate::ScoutError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::Path;

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, homepage_url, base_domain, \
                           keywords, sitemap_url, status, pages_recorded";

const RECORD_COLUMNS: &str =
    "id, run_id, type, url, meta_title, meta_description, keywords, status, recorded_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(ScoutError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, ScoutError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, ScoutError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Returns a sink that writes records into the given run
    pub fn sink_for_run(&mut self, run_id: i64) -> RunSink<'_, Self> {
        RunSink::new(self, run_id)
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    let keywords: String = row.get(6)?;
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        homepage_url: row.get(4)?,
        base_domain: row.get(5)?,
        keywords: serde_json::from_str(&keywords).unwrap_or_default(),
        sitemap_url: row.get(7)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(8)?)
            .unwrap_or(RunStatus::Running),
        pages_recorded: row.get::<_, i64>(9)? as u64,
    })
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<StoredRecord> {
    let url: String = row.get(3)?;
    let raw_type: String = row.get(2)?;
    let raw_keywords: String = row.get(6)?;
    let raw_status: String = row.get(7)?;

    let keywords: KeywordProfile = serde_json::from_str(&raw_keywords).unwrap_or_else(|e| {
        tracing::warn!("Unreadable keyword profile for {}: {}", url, e);
        KeywordProfile::new()
    });

    Ok(StoredRecord {
        id: row.get(0)?,
        run_id: row.get(1)?,
        category: Category::from_label(&raw_type).unwrap_or(Category::Other),
        status: RecordStatus::coerce(&raw_status, &url),
        url,
        meta_title: row.get(4)?,
        meta_description: row.get(5)?,
        keywords,
        recorded_at: row.get(8)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(
        &mut self,
        config_hash: &str,
        homepage_url: &str,
        base_domain: &str,
        keywords: &[String],
    ) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        let keywords = serde_json::to_string(keywords)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, homepage_url, base_domain, keywords, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                now,
                config_hash,
                homepage_url,
                base_domain,
                keywords,
                RunStatus::Running.to_db_string()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let sql = format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS);
        self.conn
            .query_row(&sql, params![run_id], run_from_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let sql = format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS);
        let run = self.conn.query_row(&sql, [], run_from_row).optional()?;
        Ok(run)
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        sitemap_url: Option<&str>,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2,
                 sitemap_url = COALESCE(?4, sitemap_url),
                 pages_recorded = (SELECT COUNT(*) FROM scraped_pages WHERE run_id = ?3)
             WHERE id = ?3",
            params![status.to_db_string(), now, run_id, sitemap_url],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Record Queries =====

    fn insert_record(&mut self, run_id: i64, record: &SinkRecord) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO scraped_pages
                 (run_id, type, url, meta_title, meta_description, keywords, status, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                run_id,
                record.record_type(),
                record.url(),
                record.meta_title(),
                record.meta_description(),
                record.keywords(),
                record.status().to_db_string(),
                now
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_records(&self, run_id: i64) -> StorageResult<Vec<StoredRecord>> {
        let sql = format!(
            "SELECT {} FROM scraped_pages WHERE run_id = ?1 ORDER BY id",
            RECORD_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![run_id], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn get_record_by_url(&self, run_id: i64, url: &str) -> StorageResult<Option<StoredRecord>> {
        let sql = format!(
            "SELECT {} FROM scraped_pages WHERE run_id = ?1 AND url = ?2 ORDER BY id DESC LIMIT 1",
            RECORD_COLUMNS
        );
        let record = self
            .conn
            .query_row(&sql, params![run_id, url], record_from_row)
            .optional()?;
        Ok(record)
    }

    fn count_records(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM scraped_pages WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_by_category(&self, run_id: i64) -> StorageResult<HashMap<Category, u64>> {
        let mut stmt = self.conn.prepare(
            "SELECT type, COUNT(*) FROM scraped_pages WHERE run_id = ?1 GROUP BY type",
        )?;

        let mut counts = HashMap::new();
        let rows = stmt.query_map(params![run_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        for row in rows {
            let (label, count) = row?;
            let category = Category::from_label(&label).unwrap_or(Category::Other);
            *counts.entry(category).or_insert(0) += count as u64;
        }

        Ok(counts)
    }

    fn keyword_totals(&self, run_id: i64) -> StorageResult<HashMap<String, u64>> {
        let mut totals = HashMap::new();
        for record in self.get_records(run_id)? {
            for (keyword, count) in record.keywords {
                *totals.entry(keyword).or_insert(0) += u64::from(count);
            }
        }
        Ok(totals)
    }
}

/// Record sink bound to one run
pub struct RunSink<'a, S: Storage> {
    storage: &'a mut S,
    run_id: i64,
}

impl<'a, S: Storage> RunSink<'a, S> {
    pub fn new(storage: &'a mut S, run_id: i64) -> Self {
        Self { storage, run_id }
    }
}

impl<S: Storage> RecordSink for RunSink<'_, S> {
    fn store(&mut self, record: &SinkRecord) -> StorageResult<i64> {
        self.storage.insert_record(self.run_id, record)
    }
}
