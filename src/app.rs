// src/app.rs

//! Wiring of the store, orchestrator and probe service from a config.

use std::sync::Arc;

use tracing::info;

use crate::config::ConfigFile;
use crate::engine::{HistoryEntry, Orchestrator, RunLauncher, StatusResolver, history};
use crate::errors::Result;
use crate::exec::ProcessSuiteBackend;
use crate::fs::{FileSystem, RealFileSystem};
use crate::probe::ProbeService;
use crate::store::{SqliteStore, PresetStore};

/// Everything a command needs, built once per process.
#[derive(Debug)]
pub struct Hub {
    config: ConfigFile,
    store: Arc<SqliteStore>,
    orchestrator: Orchestrator<ProcessSuiteBackend>,
    probes: ProbeService,
}

impl Hub {
    /// Open the record store named in the config and wire everything to it.
    pub fn open(config: ConfigFile) -> Result<Self> {
        let store = Arc::new(SqliteStore::open(&config.store.path)?);
        Self::with_store(config, store)
    }

    pub fn with_store(config: ConfigFile, store: Arc<SqliteStore>) -> Result<Self> {
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let backend = ProcessSuiteBackend::from_config(&config, Arc::clone(&fs));
        let orchestrator = Orchestrator::new(
            Arc::clone(&store),
            backend,
            fs,
            config.runs.root.clone(),
        )
        .with_launcher(RunLauncher::from_limit(config.concurrency_limit()));
        let probes = ProbeService::from_config(store.clone(), &config.probe)?;

        info!(
            runs_root = %config.runs.root.display(),
            runner = %config.runner.program,
            max_concurrent = ?config.concurrency_limit(),
            "hub ready"
        );

        Ok(Self {
            config,
            store,
            orchestrator,
            probes,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn orchestrator(&self) -> &Orchestrator<ProcessSuiteBackend> {
        &self.orchestrator
    }

    pub fn resolver(&self) -> StatusResolver {
        self.orchestrator.resolver()
    }

    pub fn presets(&self) -> &dyn PresetStore {
        self.store.as_ref()
    }

    pub fn probes(&self) -> &ProbeService {
        &self.probes
    }

    /// Most recent runs; `limit` defaults to `[runs].history_limit`.
    pub fn history(&self, limit: Option<usize>) -> Result<Vec<HistoryEntry>> {
        history(
            self.store.as_ref(),
            limit.unwrap_or(self.config.runs.history_limit),
            &self.config.runs.files_url_prefix,
        )
    }
}
