// src/engine/presets.rs

//! Preset management: create, list, delete.
//!
//! Running a preset goes through [`Orchestrator::submit_from_preset`].
//!
//! [`Orchestrator::submit_from_preset`]: crate::engine::Orchestrator::submit_from_preset

use std::collections::BTreeMap;

use tracing::info;

use crate::errors::{QahubError, Result};
use crate::fs::path::normalize_suite_path;
use crate::store::{PresetDraft, PresetStore, RunPreset};

/// Flag the runner uses to include tests by tag.
pub const TAG_FLAG: &str = "-i";

/// Preset as submitted by a user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewPreset {
    pub name: String,
    pub suite_path: String,
    pub variables: Option<BTreeMap<String, String>>,
    /// Convenience list; each tag becomes `-i <tag>`.
    pub tags: Vec<String>,
    pub extra_args: Vec<String>,
}

/// `-i <tag>` for every non-empty tag, followed by `extra_args` verbatim.
pub fn flatten_args(tags: &[String], extra_args: &[String]) -> Vec<String> {
    let mut args = Vec::with_capacity(tags.len() * 2 + extra_args.len());
    for tag in tags.iter().filter(|t| !t.is_empty()) {
        args.push(TAG_FLAG.to_string());
        args.push(tag.clone());
    }
    args.extend(extra_args.iter().cloned());
    args
}

/// Store a preset. The suite path is normalised but not required to exist yet.
pub fn create_preset(store: &dyn PresetStore, preset: NewPreset) -> Result<RunPreset> {
    if preset.name.trim().is_empty() {
        return Err(QahubError::Validation(
            "preset name must not be empty".to_string(),
        ));
    }

    let suite_path = normalize_suite_path(&preset.suite_path)?;
    let args = flatten_args(&preset.tags, &preset.extra_args);

    let stored = store.insert_preset(PresetDraft {
        name: preset.name,
        suite_path: suite_path.to_string_lossy().into_owned(),
        variables: preset.variables,
        extra_args: (!args.is_empty()).then_some(args),
    })?;

    info!(preset_id = stored.id, name = %stored.name, "preset created");
    Ok(stored)
}

pub fn list_presets(store: &dyn PresetStore) -> Result<Vec<RunPreset>> {
    store.list_presets()
}

pub fn delete_preset(store: &dyn PresetStore, id: u64) -> Result<()> {
    if !store.delete_preset(id)? {
        return Err(QahubError::not_found("preset", id));
    }
    info!(preset_id = id, "preset deleted");
    Ok(())
}
