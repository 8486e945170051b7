// src/exec/backend.rs

//! Pluggable suite executor abstraction.
//!
//! The orchestrator talks to a `SuiteBackend` instead of spawning processes
//! itself. Production code uses [`ProcessSuiteBackend`]; tests substitute a
//! fake backend that returns scripted exit codes without touching the OS.

use std::future::Future;
use std::pin::Pin;
use std::process::ExitStatus;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::ConfigFile;
use crate::errors::{QahubError, Result};
use crate::fs::FileSystem;

use super::command::{RunnerCommand, SuiteInvocation};
use super::report::ReportGenerator;

/// Trait abstracting how one suite run is executed.
pub trait SuiteBackend: Send + Sync {
    /// Execute the suite and return the runner's exit code verbatim.
    ///
    /// A non-zero exit code is a normal outcome and must be returned as
    /// `Ok`. `Err` is reserved for failures outside the exit-code channel:
    /// the runner could not be launched (`QahubError::Launch`) or its
    /// artifacts could not be written.
    fn execute(
        &self,
        invocation: SuiteInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + '_>>;
}

/// Runs the suite as an external OS process.
#[derive(Debug, Clone)]
pub struct ProcessSuiteBackend {
    runner: RunnerCommand,
    report: Option<ReportGenerator>,
    fs: Arc<dyn FileSystem>,
}

impl ProcessSuiteBackend {
    pub fn new(
        runner: RunnerCommand,
        report: Option<ReportGenerator>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self { runner, report, fs }
    }

    pub fn from_config(cfg: &ConfigFile, fs: Arc<dyn FileSystem>) -> Self {
        Self::new(
            RunnerCommand::from_config(&cfg.runner),
            ReportGenerator::from_config(&cfg.report),
            fs,
        )
    }

    async fn run(&self, invocation: SuiteInvocation) -> Result<i32> {
        self.fs.create_dir_all(&invocation.output_dir)?;

        info!(
            run_id = %invocation.run_id,
            program = %self.runner.program(),
            suite = %invocation.suite_path.display(),
            output_dir = %invocation.output_dir.display(),
            "starting suite runner"
        );

        let child = self
            .runner
            .command(&invocation)
            .spawn()
            .map_err(|source| QahubError::Launch {
                program: self.runner.program().to_string(),
                source,
            })?;

        let output = child.wait_with_output().await?;

        self.fs
            .write(&invocation.stdout_path(), &output.stdout)?;
        self.fs
            .write(&invocation.stderr_path(), &output.stderr)?;

        let code = exit_code(output.status);
        info!(
            run_id = %invocation.run_id,
            exit_code = code,
            success = output.status.success(),
            "suite runner exited"
        );

        match &self.report {
            Some(report) if self.fs.is_dir(&invocation.results_dir()) => {
                report.generate(&invocation).await;
            }
            Some(_) => {
                debug!(run_id = %invocation.run_id, "no raw results; skipping report");
            }
            None => {}
        }

        Ok(code)
    }
}

/// Exit code as reported to clients. A runner killed by signal `N` reports
/// `-N`; it did run, so this is a failed suite rather than a launch failure.
#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status
        .code()
        .or_else(|| status.signal().map(|sig| -sig))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

impl SuiteBackend for ProcessSuiteBackend {
    fn execute(
        &self,
        invocation: SuiteInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + '_>> {
        Box::pin(self.run(invocation))
    }
}
