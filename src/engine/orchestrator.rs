// src/engine/orchestrator.rs

//! End-to-end lifecycle of a suite run.
//!
//! `submit` does the synchronous part (validate, allocate an identity via
//! the record store, register the tracker entry) and hands the rest to a
//! background task. That task executes the suite through the
//! [`SuiteBackend`], then writes the outcome to the record store and the
//! tracker, in that order.
//!
//! Failure paths differ on purpose:
//! - non-zero exit code: record completed with `ok = false`, tracker `completed`
//! - launch / I/O failure: tracker `error`, record left as a placeholder

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::engine::launcher::{RunLauncher, StartSignal};
use crate::engine::status::StatusResolver;
use crate::engine::tracker::{MSG_STARTED, RunTracker, TrackerEntry};
use crate::errors::{QahubError, Result};
use crate::exec::{SuiteBackend, SuiteInvocation};
use crate::fs::FileSystem;
use crate::fs::path::normalize_suite_path;
use crate::store::{PresetStore, RunStore};
use crate::types::{RunId, RunStatus};

/// An ad-hoc run request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunRequest {
    pub suite_path: String,
    pub variables: Option<BTreeMap<String, String>>,
    pub extra_args: Option<Vec<String>>,
}

impl RunRequest {
    pub fn new(suite_path: impl Into<String>) -> Self {
        Self {
            suite_path: suite_path.into(),
            ..Self::default()
        }
    }
}

/// Response returned as soon as a run has been accepted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunAccepted {
    pub run_id: RunId,
    pub status: RunStatus,
    pub message: String,
    pub suite_path: String,
}

/// Handle to an accepted run.
///
/// The background task does not begin until the ticket is released:
/// explicitly, by [`wait`](Self::wait), or by dropping it. Holding the ticket
/// while the accepted response is delivered therefore guarantees the caller
/// sees `running`. Dropping the ticket detaches the task; the run continues.
#[derive(Debug)]
pub struct RunTicket {
    accepted: RunAccepted,
    start: StartSignal,
    handle: JoinHandle<()>,
}

impl RunTicket {
    pub fn run_id(&self) -> RunId {
        self.accepted.run_id
    }

    pub fn accepted(&self) -> &RunAccepted {
        &self.accepted
    }

    pub fn into_accepted(self) -> RunAccepted {
        self.accepted
    }

    /// Let the background task begin. Idempotent.
    pub fn release(&mut self) {
        self.start.fire();
    }

    /// Release the run and keep only its task handle.
    pub fn into_handle(mut self) -> JoinHandle<()> {
        self.release();
        self.handle
    }

    /// Release the run and wait for its background task to finish.
    ///
    /// The outcome itself is observable through the status resolver.
    pub async fn wait(mut self) -> RunAccepted {
        self.release();
        if let Err(e) = self.handle.await {
            error!(run_id = %self.accepted.run_id, error = %e, "background run task failed");
        }
        self.accepted
    }
}

/// Accepts run requests and drives them to completion in the background.
pub struct Orchestrator<B: SuiteBackend + 'static> {
    runs: Arc<dyn RunStore>,
    presets: Arc<dyn PresetStore>,
    tracker: RunTracker,
    backend: Arc<B>,
    fs: Arc<dyn FileSystem>,
    launcher: RunLauncher,
    runs_root: PathBuf,
}

impl<B: SuiteBackend + 'static> std::fmt::Debug for Orchestrator<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("runs_root", &self.runs_root)
            .field("launcher", &self.launcher)
            .field("tracked_runs", &self.tracker.len())
            .finish_non_exhaustive()
    }
}

impl<B: SuiteBackend + 'static> Orchestrator<B> {
    /// Create an orchestrator with a fresh tracker and unbounded launcher.
    pub fn new<S>(store: Arc<S>, backend: B, fs: Arc<dyn FileSystem>, runs_root: PathBuf) -> Self
    where
        S: RunStore + PresetStore + 'static,
    {
        let runs: Arc<dyn RunStore> = store.clone();
        let presets: Arc<dyn PresetStore> = store;
        Self {
            runs,
            presets,
            tracker: RunTracker::new(),
            backend: Arc::new(backend),
            fs,
            launcher: RunLauncher::unbounded(),
            runs_root,
        }
    }

    pub fn with_launcher(mut self, launcher: RunLauncher) -> Self {
        self.launcher = launcher;
        self
    }

    /// Share an existing tracker (e.g. one also handed to other resolvers).
    pub fn with_tracker(mut self, tracker: RunTracker) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn tracker(&self) -> &RunTracker {
        &self.tracker
    }

    pub fn runs_root(&self) -> &Path {
        &self.runs_root
    }

    /// Resolver over this orchestrator's tracker and record store.
    pub fn resolver(&self) -> StatusResolver {
        StatusResolver::new(self.tracker.clone(), Arc::clone(&self.runs))
    }

    /// Where run `id` writes its artifacts.
    pub fn output_dir_for(&self, id: RunId) -> PathBuf {
        self.runs_root.join(id.to_string())
    }

    /// Accept an ad-hoc run request.
    ///
    /// Fails with `Validation` (and creates nothing) when the suite path does
    /// not exist. Must be called from within a Tokio runtime.
    pub fn submit(&self, request: RunRequest) -> Result<RunTicket> {
        let suite_path = normalize_suite_path(&request.suite_path)?;
        self.ensure_suite_exists(&suite_path)?;

        self.start(
            suite_path,
            request.variables.unwrap_or_default(),
            request.extra_args.unwrap_or_default(),
            None,
        )
    }

    /// Accept a run of a stored preset.
    ///
    /// Fails with `NotFound` for unknown presets and `Validation` when the
    /// preset's suite no longer exists.
    pub fn submit_from_preset(&self, preset_id: u64) -> Result<RunTicket> {
        let preset = self
            .presets
            .get_preset(preset_id)?
            .ok_or_else(|| QahubError::not_found("preset", preset_id))?;

        let suite_path = PathBuf::from(&preset.suite_path);
        self.ensure_suite_exists(&suite_path)?;

        self.start(
            suite_path,
            preset.variables.unwrap_or_default(),
            preset.extra_args.unwrap_or_default(),
            Some(preset.name),
        )
    }

    fn ensure_suite_exists(&self, suite_path: &Path) -> Result<()> {
        if self.fs.exists(suite_path) {
            return Ok(());
        }
        warn!(suite = %suite_path.display(), "rejecting run: suite path does not exist");
        Err(QahubError::Validation(format!(
            "suite_path does not exist on server: {}",
            suite_path.display()
        )))
    }

    fn start(
        &self,
        suite_path: PathBuf,
        variables: BTreeMap<String, String>,
        extra_args: Vec<String>,
        preset_name: Option<String>,
    ) -> Result<RunTicket> {
        let suite_str = suite_path.to_string_lossy().into_owned();
        let record = self.runs.insert_placeholder(&suite_str)?;
        let run_id = record.id;

        let message = match &preset_name {
            Some(name) => format!("Preset '{name}' execution started"),
            None => MSG_STARTED.to_string(),
        };
        let entry = TrackerEntry::running(suite_str.clone(), message.clone(), preset_name);
        let start_time = entry.start_time;
        self.tracker.register(run_id, entry);

        let job = RunJob {
            invocation: SuiteInvocation {
                run_id,
                suite_path,
                output_dir: self.output_dir_for(run_id),
                variables,
                extra_args,
            },
            start_time,
            runs: Arc::clone(&self.runs),
            tracker: self.tracker.clone(),
            backend: Arc::clone(&self.backend),
        };
        let (start, handle) = self.launcher.launch(run_id, job.run());

        info!(run_id = %run_id, suite = %suite_str, "run accepted");

        Ok(RunTicket {
            accepted: RunAccepted {
                run_id,
                status: RunStatus::Running,
                message,
                suite_path: suite_str,
            },
            start,
            handle,
        })
    }
}

/// State moved into the background task of one run.
struct RunJob<B: SuiteBackend + 'static> {
    invocation: SuiteInvocation,
    start_time: Option<DateTime<Utc>>,
    runs: Arc<dyn RunStore>,
    tracker: RunTracker,
    backend: Arc<B>,
}

impl<B: SuiteBackend + 'static> RunJob<B> {
    async fn run(self) {
        let run_id = self.invocation.run_id;
        self.tracker.mark_executing(run_id);
        info!(run_id = %run_id, "run executing");

        // The backend runs in its own task so that a panic inside it is
        // reported as a run error instead of leaving the run `executing`.
        let backend = Arc::clone(&self.backend);
        let invocation = self.invocation.clone();
        let outcome = tokio::spawn(async move { backend.execute(invocation).await }).await;

        match outcome {
            Ok(Ok(code)) => self.complete(code),
            Ok(Err(e)) => self.fail(e.to_string()),
            Err(e) => self.fail(format!("suite execution aborted: {e}")),
        }
    }

    fn suite_str(&self) -> String {
        self.invocation.suite_path.to_string_lossy().into_owned()
    }

    fn complete(&self, code: i32) {
        let run_id = self.invocation.run_id;
        let output_dir = self.invocation.output_dir.to_string_lossy().into_owned();

        if let Err(e) = self.runs.complete_run(run_id, &output_dir, code) {
            error!(run_id = %run_id, error = %e, "failed to persist run outcome");
            self.fail(format!("failed to record run outcome: {e}"));
            return;
        }

        self.tracker.transition(
            run_id,
            TrackerEntry::completed(self.suite_str(), self.start_time, output_dir, code),
        );
        info!(run_id = %run_id, exit_code = code, ok = code == 0, "run completed");
    }

    /// Tracker only; the durable record keeps its placeholder shape.
    fn fail(&self, message: String) {
        let run_id = self.invocation.run_id;
        warn!(run_id = %run_id, error = %message, "run failed");
        self.tracker.transition(
            run_id,
            TrackerEntry::failed(self.suite_str(), self.start_time, message),
        );
    }
}
