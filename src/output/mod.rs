//! Output module for reporting audit results
//!
//! This module reads stored runs back out of the database and renders
//! per-category and per-keyword statistics for the operator.

pub mod stats;

pub use stats::{
    format_report, format_statistics, load_run_statistics, load_statistics, print_statistics,
    AuditStatistics,
};
