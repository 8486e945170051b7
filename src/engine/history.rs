// src/engine/history.rs

//! Listing of past runs with their artifact URLs.
//!
//! URLs are derived purely from the run id and the configured prefix; the
//! filesystem is never consulted, so they only resolve once the matching
//! artifacts have actually been produced.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::Result;
use crate::exec::command::REPORT_DIR;
use crate::store::{RunRecord, RunStore};
use crate::types::RunId;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub id: RunId,
    pub ok: bool,
    pub return_code: Option<i32>,
    pub suite_path: String,
    pub created_at: DateTime<Utc>,
    pub allure_index: String,
    pub log_html: String,
    pub report_html: String,
}

impl HistoryEntry {
    pub fn from_record(record: RunRecord, files_url_prefix: &str) -> Self {
        let base = format!("{}/{}", files_url_prefix.trim_end_matches('/'), record.id);
        Self {
            id: record.id,
            ok: record.ok,
            return_code: record.return_code,
            suite_path: record.suite_path,
            created_at: record.created_at,
            allure_index: format!("{base}/{REPORT_DIR}/index.html"),
            log_html: format!("{base}/log.html"),
            report_html: format!("{base}/report.html"),
        }
    }
}

/// The `limit` most recent runs, newest first.
pub fn history(
    runs: &dyn RunStore,
    limit: usize,
    files_url_prefix: &str,
) -> Result<Vec<HistoryEntry>> {
    Ok(runs
        .recent_runs(limit)?
        .into_iter()
        .map(|record| HistoryEntry::from_record(record, files_url_prefix))
        .collect())
}
