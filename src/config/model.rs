// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [store]
/// path = "./qahub.db"
///
/// [runs]
/// root = "./data/robot_runs"
/// max_concurrent = 4
///
/// [runner]
/// program = "robot"
///
/// [report]
/// enabled = true
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub store: StoreSection,

    #[serde(default)]
    pub runs: RunsSection,

    #[serde(default)]
    pub runner: RunnerSection,

    #[serde(default)]
    pub report: ReportSection,

    #[serde(default)]
    pub probe: ProbeSection,
}

/// Validated configuration.
///
/// Only constructed through `TryFrom<RawConfigFile>` (see `validate.rs`), so
/// holders can rely on the invariants checked there. Relative paths have been
/// resolved against the working directory.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub store: StoreSection,
    pub runs: RunsSection,
    pub runner: RunnerSection,
    pub report: ReportSection,
    pub probe: ProbeSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            store: raw.store,
            runs: raw.runs,
            runner: raw.runner,
            report: raw.report,
            probe: raw.probe,
        }
    }

    /// `None` when the run concurrency is unbounded.
    pub fn concurrency_limit(&self) -> Option<usize> {
        match self.runs.max_concurrent {
            0 => None,
            n => Some(n),
        }
    }
}

/// `[store]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSection {
    /// SQLite database holding every durable record.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./qahub.db")
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

/// `[runs]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RunsSection {
    /// Each run writes its artifacts to `<root>/<run_id>`.
    #[serde(default = "default_runs_root")]
    pub root: PathBuf,

    /// URL prefix under which `<root>` is served to browsers.
    #[serde(default = "default_files_url_prefix")]
    pub files_url_prefix: String,

    /// How many records the history listing returns.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Maximum number of suites executing at once; `0` means unlimited.
    #[serde(default)]
    pub max_concurrent: usize,
}

fn default_runs_root() -> PathBuf {
    PathBuf::from("./data/robot_runs")
}

fn default_files_url_prefix() -> String {
    "/files/robot_runs".to_string()
}

fn default_history_limit() -> usize {
    100
}

impl Default for RunsSection {
    fn default() -> Self {
        Self {
            root: default_runs_root(),
            files_url_prefix: default_files_url_prefix(),
            history_limit: default_history_limit(),
            max_concurrent: 0,
        }
    }
}

/// `[runner]` section: how the external suite runner is invoked.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerSection {
    #[serde(default = "default_runner_program")]
    pub program: String,

    /// Reporting listener passed via `--listener`.
    #[serde(default = "default_listener")]
    pub listener: String,
}

fn default_runner_program() -> String {
    "robot".to_string()
}

fn default_listener() -> String {
    "allure_robotframework".to_string()
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            program: default_runner_program(),
            listener: default_listener(),
        }
    }
}

/// `[report]` section: best-effort HTML report generation.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportSection {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_report_program")]
    pub program: String,
}

fn default_true() -> bool {
    true
}

fn default_report_program() -> String {
    "allure".to_string()
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            enabled: true,
            program: default_report_program(),
        }
    }
}

/// `[probe]` section: request timeouts for HTTP checks.
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeSection {
    #[serde(default = "default_api_timeout")]
    pub api_timeout_secs: f64,

    #[serde(default = "default_website_timeout")]
    pub website_timeout_secs: f64,
}

fn default_api_timeout() -> f64 {
    15.0
}

fn default_website_timeout() -> f64 {
    8.0
}

impl Default for ProbeSection {
    fn default() -> Self {
        Self {
            api_timeout_secs: default_api_timeout(),
            website_timeout_secs: default_website_timeout(),
        }
    }
}
