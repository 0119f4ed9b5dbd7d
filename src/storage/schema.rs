//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Site-Scout database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track audit runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    homepage_url TEXT NOT NULL,
    base_domain TEXT NOT NULL,
    keywords TEXT NOT NULL,
    sitemap_url TEXT,
    status TEXT NOT NULL,
    pages_recorded INTEGER NOT NULL DEFAULT 0
);

-- One row per analyzed page
CREATE TABLE IF NOT EXISTS scraped_pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    type TEXT NOT NULL,
    url TEXT NOT NULL,
    meta_title TEXT NOT NULL,
    meta_description TEXT NOT NULL,
    keywords TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'complete')),
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_scraped_pages_run ON scraped_pages(run_id);
CREATE INDEX IF NOT EXISTS idx_scraped_pages_url ON scraped_pages(url);
CREATE INDEX IF NOT EXISTS idx_scraped_pages_type ON scraped_pages(type);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
