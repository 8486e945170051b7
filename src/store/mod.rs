// src/store/mod.rs

//! Durable record store.
//!
//! The engine only talks to the traits defined here:
//! - [`RunStore`]: run records (placeholder insert, single completion update)
//! - [`PresetStore`]: named run presets
//! - [`ProbeStore`]: HTTP endpoint / website check definitions and results
//!
//! [`SqliteStore`] implements all three on one SQLite database that several
//! `qahub` processes may share. Every implementation provides its own
//! per-call atomicity; callers never need to lock around it.

use std::fmt::Debug;

use crate::errors::Result;
use crate::types::RunId;

pub mod model;
pub mod sqlite;

pub use model::{
    ApiEndpoint, ApiRun, NewCheck, NewEndpoint, PresetDraft, ProbeOutcome, RunPreset, RunRecord,
    WebsiteCheck, WebsiteRun,
};
pub use sqlite::SqliteStore;

pub trait RunStore: Send + Sync + Debug {
    /// Insert a placeholder record and return it with its freshly assigned id.
    fn insert_placeholder(&self, suite_path: &str) -> Result<RunRecord>;

    /// Fill in the outcome of a run. Fails with `NotFound` for unknown ids.
    fn complete_run(&self, id: RunId, output_dir: &str, return_code: i32) -> Result<RunRecord>;

    fn get_run(&self, id: RunId) -> Result<Option<RunRecord>>;

    /// Up to `limit` records, newest first.
    fn recent_runs(&self, limit: usize) -> Result<Vec<RunRecord>>;
}

pub trait PresetStore: Send + Sync + Debug {
    fn insert_preset(&self, draft: PresetDraft) -> Result<RunPreset>;

    /// All presets, newest first.
    fn list_presets(&self) -> Result<Vec<RunPreset>>;

    fn get_preset(&self, id: u64) -> Result<Option<RunPreset>>;

    /// Returns `false` when no preset had that id.
    fn delete_preset(&self, id: u64) -> Result<bool>;
}

pub trait ProbeStore: Send + Sync + Debug {
    fn insert_endpoint(&self, endpoint: NewEndpoint) -> Result<ApiEndpoint>;
    fn list_endpoints(&self) -> Result<Vec<ApiEndpoint>>;
    fn get_endpoint(&self, id: u64) -> Result<Option<ApiEndpoint>>;
    fn delete_endpoint(&self, id: u64) -> Result<bool>;
    fn record_api_run(&self, endpoint_id: u64, outcome: ProbeOutcome) -> Result<ApiRun>;

    fn insert_check(&self, check: NewCheck) -> Result<WebsiteCheck>;
    fn list_checks(&self) -> Result<Vec<WebsiteCheck>>;
    fn get_check(&self, id: u64) -> Result<Option<WebsiteCheck>>;
    fn delete_check(&self, id: u64) -> Result<bool>;
    fn record_website_run(&self, website_id: u64, outcome: ProbeOutcome) -> Result<WebsiteRun>;
    fn latest_website_run(&self, website_id: u64) -> Result<Option<WebsiteRun>>;
}
