// src/engine/mod.rs

//! Test-run orchestration core.
//!
//! - [`tracker`]: live status of runs in this process
//! - [`launcher`]: where background runs are spawned (optionally bounded)
//! - [`orchestrator`]: accepts runs and drives them to completion
//! - [`status`]: tracker-first, record-second status lookup
//! - [`history`]: recent runs with artifact URLs
//! - [`presets`]: named run configurations

pub mod history;
pub mod launcher;
pub mod orchestrator;
pub mod presets;
pub mod status;
pub mod tracker;

pub use history::{HistoryEntry, history};
pub use launcher::{RunLauncher, StartSignal};
pub use orchestrator::{Orchestrator, RunAccepted, RunRequest, RunTicket};
pub use presets::{NewPreset, create_preset, delete_preset, list_presets};
pub use status::{RecordedStatus, StatusResolver, StatusView};
pub use tracker::{RunTracker, TrackerEntry};
