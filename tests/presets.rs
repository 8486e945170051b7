// tests/presets.rs

mod common;
use crate::common::*;

use std::collections::BTreeMap;
use std::path::PathBuf;

use qahub::engine::{NewPreset, create_preset, delete_preset, list_presets};
use qahub::errors::QahubError;
use qahub::types::RunStatus;

fn smoke_preset(suite_path: &str) -> NewPreset {
    let mut variables = BTreeMap::new();
    variables.insert("ENV".to_string(), "staging".to_string());
    NewPreset {
        name: "smoke".to_string(),
        suite_path: suite_path.to_string(),
        variables: Some(variables),
        tags: vec!["smoke".to_string(), String::new(), "login".to_string()],
        extra_args: vec!["--dryrun".to_string()],
    }
}

#[tokio::test]
async fn preset_run_uses_stored_options_and_its_name() {
    let h = Harness::new(FakeSuiteBackend::new());
    let preset = create_preset(h.store.as_ref(), smoke_preset(SUITE)).unwrap();
    assert_eq!(
        preset.extra_args.clone().unwrap(),
        vec!["-i", "smoke", "-i", "login", "--dryrun"]
    );

    let ticket = h.orchestrator.submit_from_preset(preset.id).unwrap();
    assert_eq!(ticket.accepted().message, "Preset 'smoke' execution started");
    assert_eq!(ticket.accepted().status, RunStatus::Running);

    let id = ticket.run_id();
    let entry = h.orchestrator.tracker().get(id).unwrap();
    assert_eq!(entry.preset_name.as_deref(), Some("smoke"));

    with_timeout(ticket.wait()).await;

    let inv = &h.backend.invocations()[0];
    assert_eq!(inv.suite_path, PathBuf::from(SUITE));
    assert_eq!(inv.extra_args, vec!["-i", "smoke", "-i", "login", "--dryrun"]);
    assert_eq!(inv.variables.get("ENV").map(String::as_str), Some("staging"));
    assert_eq!(h.resolver().status(id).unwrap().status(), RunStatus::Completed);
}

#[tokio::test]
async fn unknown_preset_is_not_found() {
    let h = Harness::new(FakeSuiteBackend::new());
    match h.orchestrator.submit_from_preset(99) {
        Err(QahubError::NotFound { kind, id }) => {
            assert_eq!(kind, "preset");
            assert_eq!(id, 99);
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
    assert!(h.orchestrator.tracker().is_empty());
}

#[tokio::test]
async fn preset_pointing_at_a_vanished_suite_is_rejected() {
    let h = Harness::new(FakeSuiteBackend::new());
    let preset = create_preset(h.store.as_ref(), smoke_preset("/suites/gone.robot")).unwrap();

    assert!(matches!(
        h.orchestrator.submit_from_preset(preset.id),
        Err(QahubError::Validation(_))
    ));
    assert!(h.backend.invocations().is_empty());
}

#[test]
fn presets_can_be_listed_and_deleted() {
    let h = Harness::new(FakeSuiteBackend::new());
    let first = create_preset(h.store.as_ref(), smoke_preset(SUITE)).unwrap();
    let mut nightly = smoke_preset(SUITE);
    nightly.name = "nightly".to_string();
    nightly.tags.clear();
    nightly.extra_args.clear();
    let second = create_preset(h.store.as_ref(), nightly).unwrap();
    assert!(second.extra_args.is_none());

    let names: Vec<_> = list_presets(h.store.as_ref())
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["nightly", "smoke"]);

    delete_preset(h.store.as_ref(), first.id).unwrap();
    assert!(matches!(
        delete_preset(h.store.as_ref(), first.id),
        Err(QahubError::NotFound { .. })
    ));
    assert_eq!(list_presets(h.store.as_ref()).unwrap().len(), 1);
}

#[test]
fn blank_preset_name_is_rejected() {
    let h = Harness::new(FakeSuiteBackend::new());
    let mut preset = smoke_preset(SUITE);
    preset.name = "   ".to_string();
    assert!(matches!(
        create_preset(h.store.as_ref(), preset),
        Err(QahubError::Validation(_))
    ));
}
