// src/store/model.rs

//! Durable record types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{HttpMethod, RunId};

/// Persisted outcome of one suite run.
///
/// Created as a placeholder (`output_dir == ""`, `return_code == None`,
/// `ok == false`) when a run is accepted and completed exactly once when the
/// runner exits. `ok` is true iff `return_code == Some(0)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: RunId,
    pub suite_path: String,
    pub output_dir: String,
    pub return_code: Option<i32>,
    pub ok: bool,
    pub created_at: DateTime<Utc>,
}

impl RunRecord {
    pub fn placeholder(id: RunId, suite_path: impl Into<String>) -> Self {
        Self {
            id,
            suite_path: suite_path.into(),
            output_dir: String::new(),
            return_code: None,
            ok: false,
            created_at: Utc::now(),
        }
    }

    /// Record the runner's exit code. Keeps `ok` in lock-step with it.
    pub fn complete(&mut self, output_dir: impl Into<String>, return_code: i32) {
        self.output_dir = output_dir.into();
        self.return_code = Some(return_code);
        self.ok = return_code == 0;
    }

    pub fn is_placeholder(&self) -> bool {
        self.return_code.is_none() && self.output_dir.is_empty()
    }
}

/// Named, reusable run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunPreset {
    pub id: u64,
    pub name: String,
    pub suite_path: String,
    pub variables: Option<BTreeMap<String, String>>,
    pub extra_args: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

/// Preset fields as stored; the store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetDraft {
    pub name: String,
    pub suite_path: String,
    pub variables: Option<BTreeMap<String, String>>,
    pub extra_args: Option<Vec<String>>,
}

/// A registered HTTP API endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEndpoint {
    pub id: u64,
    pub name: String,
    pub method: HttpMethod,
    pub url: String,
    pub headers: Option<BTreeMap<String, String>>,
    pub body: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewEndpoint {
    pub name: String,
    pub method: HttpMethod,
    pub url: String,
    pub headers: Option<BTreeMap<String, String>>,
    pub body: Option<serde_json::Value>,
}

/// A registered website availability check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebsiteCheck {
    pub id: u64,
    pub url: String,
    pub label: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewCheck {
    pub url: String,
    pub label: Option<String>,
}

/// Fields shared by API and website probe results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub status_code: Option<u16>,
    pub ok: bool,
    pub latency_ms: f64,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRun {
    pub id: u64,
    pub endpoint_id: u64,
    #[serde(flatten)]
    pub outcome: ProbeOutcome,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebsiteRun {
    pub id: u64,
    pub website_id: u64,
    #[serde(flatten)]
    pub outcome: ProbeOutcome,
    pub created_at: DateTime<Utc>,
}
