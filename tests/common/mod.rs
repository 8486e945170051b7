#![allow(dead_code, unused_imports)]

use std::path::PathBuf;
use std::sync::Arc;

use qahub::engine::{Orchestrator, RunLauncher, StatusResolver};
use qahub::fs::mock::MockFileSystem;
use qahub::store::SqliteStore;

pub use qahub_test_utils::builders::{ConfigFileBuilder, RunRequestBuilder};
pub use qahub_test_utils::fake_backend::{FakeOutcome, FakeSuiteBackend};
pub use qahub_test_utils::{init_tracing, wait_for_terminal, with_timeout};

pub const SUITE: &str = "/suites/web/login.robot";
pub const RUNS_ROOT: &str = "/data/robot_runs";

/// Orchestrator wired to an in-memory store, a mock filesystem holding
/// [`SUITE`], and a fake backend the test keeps a handle to.
pub struct Harness {
    pub store: Arc<SqliteStore>,
    pub fs: MockFileSystem,
    pub backend: FakeSuiteBackend,
    pub orchestrator: Orchestrator<FakeSuiteBackend>,
}

impl Harness {
    pub fn new(backend: FakeSuiteBackend) -> Self {
        Self::with_launcher(backend, RunLauncher::unbounded())
    }

    pub fn with_launcher(backend: FakeSuiteBackend, launcher: RunLauncher) -> Self {
        init_tracing();
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let fs = MockFileSystem::new();
        fs.add_file(SUITE, "*** Test Cases ***\n");

        let orchestrator = Orchestrator::new(
            Arc::clone(&store),
            backend.clone(),
            Arc::new(fs.clone()),
            PathBuf::from(RUNS_ROOT),
        )
        .with_launcher(launcher);

        Self {
            store,
            fs,
            backend,
            orchestrator,
        }
    }

    pub fn resolver(&self) -> StatusResolver {
        self.orchestrator.resolver()
    }

    /// Add another suite file and return its path.
    pub fn add_suite(&self, name: &str) -> String {
        let path = format!("/suites/{name}.robot");
        self.fs.add_file(&path, "*** Test Cases ***\n");
        path
    }
}
