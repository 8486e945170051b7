// src/exec/mod.rs

//! Suite execution layer.
//!
//! This module is responsible for actually running a test suite with the
//! external runner, using `tokio::process::Command`, and materialising its
//! artifacts under the run's output directory.
//!
//! - [`command`] builds the runner invocation and defines the artifact layout.
//! - [`report`] generates the HTML report from raw results (best-effort).
//! - [`backend`] provides the `SuiteBackend` trait and the process-based
//!   `ProcessSuiteBackend` used in production, which tests replace with a
//!   fake implementation.

pub mod backend;
pub mod command;
pub mod report;

pub use backend::{ProcessSuiteBackend, SuiteBackend};
pub use command::{RunnerCommand, SuiteInvocation};
pub use report::ReportGenerator;
