// src/exec/command.rs

//! Suite runner invocation.
//!
//! Turns a [`SuiteInvocation`] into the concrete command line:
//!
//! ```text
//! <program> -d <output_dir> --listener <listener> [-v KEY:VALUE]... [extra_args]... <suite_path>
//! ```
//!
//! run from the suite's parent directory, with the results directory
//! exported to the reporting listener.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

use crate::config::RunnerSection;
use crate::types::RunId;

/// Raw results written by the reporting listener, under the output dir.
pub const RESULTS_DIR: &str = "allure-results";
/// Generated HTML report, under the output dir.
pub const REPORT_DIR: &str = "allure-report";
/// Environment variable telling the listener where to put raw results.
pub const RESULTS_ENV_VAR: &str = "ALLURE_RESULTS_DIR";

pub const STDOUT_FILE: &str = "stdout.txt";
pub const STDERR_FILE: &str = "stderr.txt";

/// Everything needed to execute one suite run.
#[derive(Debug, Clone, PartialEq)]
pub struct SuiteInvocation {
    pub run_id: RunId,
    pub suite_path: PathBuf,
    pub output_dir: PathBuf,
    pub variables: BTreeMap<String, String>,
    pub extra_args: Vec<String>,
}

impl SuiteInvocation {
    pub fn results_dir(&self) -> PathBuf {
        self.output_dir.join(RESULTS_DIR)
    }

    pub fn report_dir(&self) -> PathBuf {
        self.output_dir.join(REPORT_DIR)
    }

    pub fn stdout_path(&self) -> PathBuf {
        self.output_dir.join(STDOUT_FILE)
    }

    pub fn stderr_path(&self) -> PathBuf {
        self.output_dir.join(STDERR_FILE)
    }

    /// Directory the runner is started in, so suite-relative resources resolve.
    pub fn working_dir(&self) -> Option<&Path> {
        self.suite_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
    }
}

/// How the suite runner program is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerCommand {
    program: String,
    listener: String,
}

impl RunnerCommand {
    pub fn new(program: impl Into<String>, listener: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            listener: listener.into(),
        }
    }

    pub fn from_config(runner: &RunnerSection) -> Self {
        Self::new(runner.program.clone(), runner.listener.clone())
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed to the runner, in order.
    pub fn args(&self, invocation: &SuiteInvocation) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-d".into(),
            invocation.output_dir.clone().into_os_string(),
            "--listener".into(),
            self.listener.clone().into(),
        ];

        for (key, value) in &invocation.variables {
            args.push("-v".into());
            args.push(format!("{key}:{value}").into());
        }

        args.extend(invocation.extra_args.iter().map(OsString::from));
        args.push(invocation.suite_path.clone().into_os_string());
        args
    }

    /// Ready-to-spawn process with captured stdout/stderr.
    pub fn command(&self, invocation: &SuiteInvocation) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args(invocation))
            .env(RESULTS_ENV_VAR, invocation.results_dir())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = invocation.working_dir() {
            cmd.current_dir(dir);
        }

        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation() -> SuiteInvocation {
        let mut variables = BTreeMap::new();
        variables.insert("ENV".to_string(), "staging".to_string());
        variables.insert("BROWSER".to_string(), "firefox".to_string());

        SuiteInvocation {
            run_id: RunId::new(7),
            suite_path: PathBuf::from("/suites/web/login.robot"),
            output_dir: PathBuf::from("/data/runs/7"),
            variables,
            extra_args: vec!["-i".into(), "smoke".into()],
        }
    }

    fn lossy(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn builds_runner_arguments_in_order() {
        let runner = RunnerCommand::new("robot", "allure_robotframework");
        let args = lossy(runner.args(&invocation()));

        assert_eq!(
            args,
            vec![
                "-d",
                "/data/runs/7",
                "--listener",
                "allure_robotframework",
                "-v",
                "BROWSER:firefox",
                "-v",
                "ENV:staging",
                "-i",
                "smoke",
                "/suites/web/login.robot",
            ]
        );
    }

    #[test]
    fn artifact_paths_live_under_output_dir() {
        let inv = invocation();
        assert_eq!(inv.results_dir(), PathBuf::from("/data/runs/7/allure-results"));
        assert_eq!(inv.report_dir(), PathBuf::from("/data/runs/7/allure-report"));
        assert_eq!(inv.stdout_path(), PathBuf::from("/data/runs/7/stdout.txt"));
        assert_eq!(inv.working_dir(), Some(Path::new("/suites/web")));
    }
}
