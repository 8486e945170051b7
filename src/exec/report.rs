// src/exec/report.rs

//! Best-effort HTML report generation after a suite run.

use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::ReportSection;
use crate::exec::command::SuiteInvocation;

/// Runs `<program> generate <results> -o <report> --clean`.
///
/// Never fails: every problem is logged and otherwise ignored, so it cannot
/// change the outcome of the run it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportGenerator {
    program: String,
}

impl ReportGenerator {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// `None` when report generation is disabled.
    pub fn from_config(report: &ReportSection) -> Option<Self> {
        report.enabled.then(|| Self::new(report.program.clone()))
    }

    /// Returns whether the report tool ran and exited successfully.
    pub async fn generate(&self, invocation: &SuiteInvocation) -> bool {
        let results = invocation.results_dir();
        let report = invocation.report_dir();

        let status = Command::new(&self.program)
            .arg("generate")
            .arg(&results)
            .arg("-o")
            .arg(&report)
            .arg("--clean")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) if status.success() => {
                info!(
                    run_id = %invocation.run_id,
                    report = %report.display(),
                    "report generated"
                );
                true
            }
            Ok(status) => {
                warn!(
                    run_id = %invocation.run_id,
                    program = %self.program,
                    exit_code = status.code().unwrap_or(-1),
                    "report tool exited unsuccessfully"
                );
                false
            }
            Err(e) => {
                debug!(
                    run_id = %invocation.run_id,
                    program = %self.program,
                    error = %e,
                    "report tool unavailable; skipping report"
                );
                false
            }
        }
    }
}
