// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::types::{HttpMethod, RunId};

/// Command-line arguments for `qahub`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "qahub",
    version,
    about = "Run test suites and HTTP checks, and track their outcomes.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Qahub.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `QAHUB_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run a test suite and wait for it to finish.
    Run(RunArgs),

    /// Show the status of a run.
    ///
    /// Live progress (executing, error) is held only by the qahub process
    /// that is running the suite. Queried from another process, a run still
    /// in flight reads as completed with return_code null and ok false until
    /// its record is filled in.
    Status {
        run_id: RunId,
    },

    /// List recent runs, newest first.
    History {
        /// Defaults to `[runs].history_limit`.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Manage and run presets.
    #[command(subcommand)]
    Preset(PresetCommand),

    /// Manage and probe HTTP API endpoints.
    #[command(subcommand)]
    Endpoint(EndpointCommand),

    /// Manage and probe website checks.
    #[command(subcommand)]
    Site(SiteCommand),
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Suite file or directory.
    pub suite: String,

    /// Suite variable as KEY:VALUE (repeatable).
    #[arg(short = 'v', long = "variable", value_name = "KEY:VALUE", value_parser = parse_variable)]
    pub variables: Vec<(String, String)>,

    /// Extra argument passed verbatim to the runner (repeatable).
    #[arg(long = "arg", value_name = "ARG", allow_hyphen_values = true)]
    pub extra_args: Vec<String>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum PresetCommand {
    /// Create a preset.
    Add {
        name: String,
        suite: String,
        #[arg(short = 'v', long = "variable", value_name = "KEY:VALUE", value_parser = parse_variable)]
        variables: Vec<(String, String)>,
        /// Include tests with this tag (repeatable).
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long = "arg", value_name = "ARG", allow_hyphen_values = true)]
        extra_args: Vec<String>,
    },
    List,
    Rm {
        id: u64,
    },
    /// Run a preset and wait for it to finish.
    Run {
        id: u64,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum EndpointCommand {
    Add {
        name: String,
        url: String,
        #[arg(long, default_value = "GET")]
        method: HttpMethod,
        /// Request header as NAME:VALUE (repeatable).
        #[arg(short = 'H', long = "header", value_name = "NAME:VALUE", value_parser = parse_variable)]
        headers: Vec<(String, String)>,
        /// JSON request body.
        #[arg(long, value_parser = parse_json)]
        body: Option<serde_json::Value>,
    },
    List,
    Rm {
        id: u64,
    },
    Run {
        id: u64,
    },
    RunAll,
}

#[derive(Debug, Clone, Subcommand)]
pub enum SiteCommand {
    Add {
        url: String,
        #[arg(long)]
        label: Option<String>,
    },
    List,
    Rm {
        id: u64,
    },
    Run {
        id: u64,
    },
    RunAll,
    /// List checks with their latest result.
    Status,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// `KEY:VALUE`, split at the first colon.
pub fn parse_variable(s: &str) -> Result<(String, String), String> {
    match s.split_once(':') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY:VALUE, got '{s}'")),
    }
}

fn parse_json(s: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(s).map_err(|e| format!("invalid JSON body: {e}"))
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
