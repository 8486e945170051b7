// src/engine/status.rs

//! Two-tier run status lookup.
//!
//! The tracker is consulted first: anything that happened in this process,
//! including runs that finished moments ago, is reported exactly as the
//! tracker last saw it. Only when the tracker has no entry (a run from an
//! earlier process) is a `completed` view synthesised from the durable record.
//!
//! The two sources may briefly disagree within one process: the tracker can
//! already say `completed` while the record write is still in flight.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::engine::tracker::{RunTracker, TrackerEntry};
use crate::errors::{QahubError, Result};
use crate::store::{RunRecord, RunStore};
use crate::types::{RunId, RunStatus};

/// Status view synthesised from a durable record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedStatus {
    pub status: RunStatus,
    pub return_code: Option<i32>,
    pub ok: bool,
    pub suite_path: String,
    pub output_dir: String,
    pub created_at: DateTime<Utc>,
}

impl From<RunRecord> for RecordedStatus {
    fn from(record: RunRecord) -> Self {
        Self {
            status: RunStatus::Completed,
            return_code: record.return_code,
            ok: record.ok,
            suite_path: record.suite_path,
            output_dir: record.output_dir,
            created_at: record.created_at,
        }
    }
}

/// Answer to "what is the status of run N".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatusView {
    Live(TrackerEntry),
    Recorded(RecordedStatus),
}

impl StatusView {
    pub fn status(&self) -> RunStatus {
        match self {
            StatusView::Live(entry) => entry.status,
            StatusView::Recorded(rec) => rec.status,
        }
    }

    pub fn return_code(&self) -> Option<i32> {
        match self {
            StatusView::Live(entry) => entry.return_code,
            StatusView::Recorded(rec) => rec.return_code,
        }
    }

    pub fn ok(&self) -> Option<bool> {
        match self {
            StatusView::Live(entry) => entry.ok,
            StatusView::Recorded(rec) => Some(rec.ok),
        }
    }

    pub fn suite_path(&self) -> &str {
        match self {
            StatusView::Live(entry) => &entry.suite_path,
            StatusView::Recorded(rec) => &rec.suite_path,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, StatusView::Live(_))
    }
}

#[derive(Debug, Clone)]
pub struct StatusResolver {
    tracker: RunTracker,
    runs: Arc<dyn RunStore>,
}

impl StatusResolver {
    pub fn new(tracker: RunTracker, runs: Arc<dyn RunStore>) -> Self {
        Self { tracker, runs }
    }

    pub fn status(&self, id: RunId) -> Result<StatusView> {
        if let Some(entry) = self.tracker.get(id) {
            debug!(run_id = %id, status = %entry.status, "status from tracker");
            return Ok(StatusView::Live(entry));
        }

        match self.runs.get_run(id)? {
            Some(record) => {
                debug!(run_id = %id, "status from record store");
                Ok(StatusView::Recorded(record.into()))
            }
            None => Err(QahubError::not_found("run", id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tracker::MSG_STARTED;
    use crate::store::SqliteStore;

    #[test]
    fn tracker_wins_over_record() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let record = store.insert_placeholder("/s/a.robot").unwrap();
        let tracker = RunTracker::new();
        tracker.register(record.id, TrackerEntry::running("/s/a.robot", MSG_STARTED, None));

        let resolver = StatusResolver::new(tracker, store);
        let view = resolver.status(record.id).unwrap();
        assert!(view.is_live());
        assert_eq!(view.status(), RunStatus::Running);
    }

    #[test]
    fn falls_back_to_record_as_completed() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let record = store.insert_placeholder("/s/a.robot").unwrap();
        store.complete_run(record.id, "/runs/1", 4).unwrap();

        let resolver = StatusResolver::new(RunTracker::new(), store);
        let view = resolver.status(record.id).unwrap();
        assert!(!view.is_live());
        assert_eq!(view.status(), RunStatus::Completed);
        assert_eq!(view.return_code(), Some(4));
        assert_eq!(view.ok(), Some(false));

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["output_dir"], "/runs/1");
        assert!(json.get("created_at").is_some());
    }

    #[test]
    fn unknown_run_is_not_found() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let resolver = StatusResolver::new(RunTracker::new(), store);
        assert!(matches!(
            resolver.status(RunId::new(77)),
            Err(QahubError::NotFound { kind: "run", id: 77 })
        ));
    }
}
