//! Storage module for persisting audit results
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Normalizing analyzed pages into sink-ready records
//! - Run tracking, so each audit's records can be queried later

mod schema;
mod sqlite;
mod traits;

pub use sqlite::{RunSink, SqliteStorage};
pub use traits::{RecordSink, Storage, StorageError, StorageResult};

use crate::crawler::KeywordProfile;
use crate::url::Category;

/// Lifecycle status of a stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecordStatus {
    #[default]
    Pending,
    Complete,
}

impl RecordStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Complete => "complete",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "complete" => Some(Self::Complete),
            _ => None,
        }
    }

    /// Maps any raw status onto a valid one
    ///
    /// Values outside {pending, complete} become `Pending` with a warning.
    pub fn coerce(raw: &str, url: &str) -> Self {
        Self::from_db_string(raw).unwrap_or_else(|| {
            tracing::warn!(
                "Invalid status '{}' for URL {}. Setting to 'pending'.",
                raw,
                url
            );
            Self::Pending
        })
    }
}

/// One analyzed, in-scope page
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    pub category: Category,
    pub url: String,
    pub title: String,
    pub meta_description: String,
    pub keyword_counts: KeywordProfile,
    pub status: RecordStatus,
}

/// A record normalized for the sink
///
/// Built once from a [`PageRecord`]; the keyword profile is already
/// serialized to a flat JSON object. Fields are read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkRecord {
    record_type: String,
    url: String,
    meta_title: String,
    meta_description: String,
    keywords: String,
    status: RecordStatus,
}

impl SinkRecord {
    /// Normalizes a page record for storage
    ///
    /// # Returns
    ///
    /// * `Ok(SinkRecord)` - The sink-ready record
    /// * `Err(StorageError)` - The keyword profile could not be serialized
    pub fn from_page(page: &PageRecord) -> StorageResult<Self> {
        let keywords = serde_json::to_string(&page.keyword_counts)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        Ok(Self {
            record_type: page.category.as_str().to_string(),
            url: page.url.clone(),
            meta_title: page.title.clone(),
            meta_description: page.meta_description.clone(),
            keywords,
            status: page.status,
        })
    }

    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn meta_title(&self) -> &str {
        &self.meta_title
    }

    pub fn meta_description(&self) -> &str {
        &self.meta_description
    }

    /// Keyword profile as a JSON object string
    pub fn keywords(&self) -> &str {
        &self.keywords
    }

    pub fn status(&self) -> RecordStatus {
        self.status
    }
}

/// A record read back from the database
#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub id: i64,
    pub run_id: i64,
    pub category: Category,
    pub url: String,
    pub meta_title: String,
    pub meta_description: String,
    pub keywords: KeywordProfile,
    pub status: RecordStatus,
    pub recorded_at: String,
}

/// Represents an audit run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub homepage_url: String,
    pub base_domain: String,
    pub keywords: Vec<String>,
    pub sitemap_url: Option<String>,
    pub status: RunStatus,
    pub pages_recorded: u64,
}

/// Status of an audit run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    NoSitemap,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::NoSitemap => "no_sitemap",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "no_sitemap" => Some(Self::NoSitemap),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
