use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;

use qahub::errors::{QahubError, Result};
use qahub::exec::{SuiteBackend, SuiteInvocation};

/// What the fake backend does for one invocation.
#[derive(Debug, Clone)]
pub enum FakeOutcome {
    Exit(i32),
    LaunchFailure,
    Panic,
}

#[derive(Debug, Default)]
struct Shared {
    script: Mutex<VecDeque<FakeOutcome>>,
    per_suite: Mutex<HashMap<PathBuf, FakeOutcome>>,
    invocations: Mutex<Vec<SuiteInvocation>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

/// A suite backend that never spawns a process:
/// - records every invocation it receives
/// - returns the outcome pinned to the invoked suite, if any
/// - otherwise returns scripted outcomes in order, exit code `0` once the
///   script is empty
/// - optionally holds each run at a gate until the test releases it
///
/// Clones share state, so a test can keep one handle while the orchestrator
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct FakeSuiteBackend {
    shared: Arc<Shared>,
    gate: Option<Arc<Semaphore>>,
}

impl FakeSuiteBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outcomes handed out to successive invocations.
    pub fn with_script(self, outcomes: impl IntoIterator<Item = FakeOutcome>) -> Self {
        self.shared
            .script
            .lock()
            .unwrap()
            .extend(outcomes);
        self
    }

    /// Outcome for every invocation of `suite_path`, regardless of order.
    pub fn with_outcome_for(self, suite_path: impl Into<PathBuf>, outcome: FakeOutcome) -> Self {
        self.shared
            .per_suite
            .lock()
            .unwrap()
            .insert(suite_path.into(), outcome);
        self
    }

    /// Every invocation waits for [`release`](Self::release) before finishing.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    /// Let `n` gated invocations finish.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub fn invocations(&self) -> Vec<SuiteInvocation> {
        self.shared.invocations.lock().unwrap().clone()
    }

    pub fn in_flight(&self) -> usize {
        self.shared.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of invocations that were running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.shared.peak.load(Ordering::SeqCst)
    }

    fn next_outcome(&self, suite_path: &Path) -> FakeOutcome {
        if let Some(outcome) = self.shared.per_suite.lock().unwrap().get(suite_path) {
            return outcome.clone();
        }
        self.shared
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(FakeOutcome::Exit(0))
    }
}

impl SuiteBackend for FakeSuiteBackend {
    fn execute(
        &self,
        invocation: SuiteInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + '_>> {
        Box::pin(async move {
            let suite_path = invocation.suite_path.clone();
            self.shared.invocations.lock().unwrap().push(invocation);
            let now = self.shared.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.shared.peak.fetch_max(now, Ordering::SeqCst);

            if let Some(gate) = &self.gate {
                gate.acquire()
                    .await
                    .expect("gate semaphore is never closed")
                    .forget();
            }

            self.shared.in_flight.fetch_sub(1, Ordering::SeqCst);
            match self.next_outcome(&suite_path) {
                FakeOutcome::Exit(code) => Ok(code),
                FakeOutcome::LaunchFailure => Err(QahubError::Launch {
                    program: "fake-runner".to_string(),
                    source: io::Error::new(io::ErrorKind::NotFound, "no such file or directory"),
                }),
                FakeOutcome::Panic => panic!("fake backend panicked"),
            }
        })
    }
}
