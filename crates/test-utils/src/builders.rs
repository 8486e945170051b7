use std::path::Path;

use qahub::config::{ConfigFile, RawConfigFile};
use qahub::engine::RunRequest;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    /// Put the record store and the runs root under `dir`.
    pub fn rooted_at(mut self, dir: &Path) -> Self {
        self.config.store.path = dir.join("qahub.db");
        self.config.runs.root = dir.join("runs");
        self
    }

    pub fn with_runner(mut self, program: &str) -> Self {
        self.config.runner.program = program.to_string();
        self
    }

    pub fn with_report_program(mut self, program: &str) -> Self {
        self.config.report.enabled = true;
        self.config.report.program = program.to_string();
        self
    }

    pub fn without_report(mut self) -> Self {
        self.config.report.enabled = false;
        self
    }

    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.config.runs.max_concurrent = max;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.config.runs.history_limit = limit;
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `RunRequest`.
pub struct RunRequestBuilder {
    request: RunRequest,
}

impl RunRequestBuilder {
    pub fn new(suite_path: impl Into<String>) -> Self {
        Self {
            request: RunRequest::new(suite_path),
        }
    }

    pub fn variable(mut self, key: &str, value: &str) -> Self {
        self.request
            .variables
            .get_or_insert_with(Default::default)
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.request
            .extra_args
            .get_or_insert_with(Vec::new)
            .push(arg.to_string());
        self
    }

    pub fn build(self) -> RunRequest {
        self.request
    }
}
