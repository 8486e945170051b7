// src/engine/tracker.rs

//! Live, in-memory view of runs in the current process.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, warn};

use crate::types::{RunId, RunStatus};

pub const MSG_STARTED: &str = "Test execution started";
pub const MSG_EXECUTING: &str = "Running test cases...";

/// Status of one run as last reported by its background task.
///
/// Every transition replaces the whole entry, except `running -> executing`
/// which only updates `status` and `message` in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackerEntry {
    pub status: RunStatus,
    pub suite_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TrackerEntry {
    fn empty(status: RunStatus, suite_path: String) -> Self {
        Self {
            status,
            suite_path,
            start_time: None,
            message: None,
            preset_name: None,
            return_code: None,
            ok: None,
            output_dir: None,
            completion_time: None,
            error: None,
        }
    }

    pub fn running(
        suite_path: impl Into<String>,
        message: impl Into<String>,
        preset_name: Option<String>,
    ) -> Self {
        Self {
            start_time: Some(Utc::now()),
            message: Some(message.into()),
            preset_name,
            ..Self::empty(RunStatus::Running, suite_path.into())
        }
    }

    pub fn completed(
        suite_path: impl Into<String>,
        start_time: Option<DateTime<Utc>>,
        output_dir: impl Into<String>,
        return_code: i32,
    ) -> Self {
        Self {
            start_time,
            return_code: Some(return_code),
            ok: Some(return_code == 0),
            output_dir: Some(output_dir.into()),
            completion_time: Some(Utc::now()),
            ..Self::empty(RunStatus::Completed, suite_path.into())
        }
    }

    pub fn failed(
        suite_path: impl Into<String>,
        start_time: Option<DateTime<Utc>>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            start_time,
            completion_time: Some(Utc::now()),
            error: Some(error.into()),
            ..Self::empty(RunStatus::Error, suite_path.into())
        }
    }
}

/// Process-lifetime map from run identity to its live status.
///
/// Cheap to clone; all clones share the same map. Locking is internal and
/// held only for the duration of a single call. Entries are never evicted.
#[derive(Debug, Clone, Default)]
pub struct RunTracker {
    entries: Arc<RwLock<HashMap<RunId, TrackerEntry>>>,
}

impl RunTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the initial entry for a freshly accepted run.
    ///
    /// Visible to every reader as soon as this returns.
    pub fn register(&self, id: RunId, entry: TrackerEntry) {
        debug!(run_id = %id, status = %entry.status, "tracker: registered");
        if self.entries.write().insert(id, entry).is_some() {
            warn!(run_id = %id, "tracker: run id registered twice; previous entry replaced");
        }
    }

    /// `running -> executing`, mutating the existing entry in place.
    ///
    /// Returns `false` if the run is unknown or no longer `running`.
    pub fn mark_executing(&self, id: RunId) -> bool {
        let mut entries = self.entries.write();
        match entries.get_mut(&id) {
            Some(entry) if entry.status == RunStatus::Running => {
                entry.status = RunStatus::Executing;
                entry.message = Some(MSG_EXECUTING.to_string());
                debug!(run_id = %id, "tracker: executing");
                true
            }
            Some(entry) => {
                warn!(run_id = %id, status = %entry.status, "tracker: cannot mark executing");
                false
            }
            None => {
                warn!(run_id = %id, "tracker: mark_executing for unknown run");
                false
            }
        }
    }

    /// Replace the entry wholesale.
    pub fn transition(&self, id: RunId, entry: TrackerEntry) {
        let mut entries = self.entries.write();
        if let Some(previous) = entries.get(&id) {
            if previous.status.is_terminal() {
                warn!(
                    run_id = %id,
                    from = %previous.status,
                    to = %entry.status,
                    "tracker: overwriting a terminal entry"
                );
            }
        }
        debug!(run_id = %id, status = %entry.status, "tracker: transition");
        entries.insert(id, entry);
    }

    pub fn get(&self, id: RunId) -> Option<TrackerEntry> {
        self.entries.read().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
