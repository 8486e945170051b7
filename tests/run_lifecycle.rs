// tests/run_lifecycle.rs

mod common;
use crate::common::*;

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use qahub::engine::tracker::{MSG_EXECUTING, MSG_STARTED};
use qahub::engine::{RunRequest, RunTracker, StatusResolver};
use qahub::errors::QahubError;
use qahub::store::RunStore;
use qahub::types::{RunId, RunStatus};

#[tokio::test]
async fn submitted_run_is_running_until_the_background_task_starts() {
    let h = Harness::new(FakeSuiteBackend::new());

    let ticket = h.orchestrator.submit(RunRequest::new(SUITE)).unwrap();
    let accepted = ticket.accepted().clone();
    assert_eq!(accepted.status, RunStatus::Running);
    assert_eq!(accepted.message, MSG_STARTED);
    assert_eq!(accepted.suite_path, SUITE);

    // Not released yet: the background task has not been polled.
    let view = h.resolver().status(accepted.run_id).unwrap();
    assert!(view.is_live());
    assert_eq!(view.status(), RunStatus::Running);

    with_timeout(ticket.wait()).await;

    let view = h.resolver().status(accepted.run_id).unwrap();
    assert_eq!(view.status(), RunStatus::Completed);
    assert_eq!(view.return_code(), Some(0));
    assert_eq!(view.ok(), Some(true));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn submit_reports_running_on_a_multi_thread_runtime() {
    let h = Harness::new(FakeSuiteBackend::new());

    for i in 0..200 {
        let ticket = h.orchestrator.submit(RunRequest::new(SUITE)).unwrap();
        let id = ticket.run_id();
        assert_eq!(ticket.accepted().status, RunStatus::Running);
        assert_eq!(h.resolver().status(id).unwrap().status(), RunStatus::Running);

        // Idle workers get every chance to pick the task up; it must stay put.
        if i % 25 == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
            assert_eq!(h.resolver().status(id).unwrap().status(), RunStatus::Running);
            assert!(h.backend.invocations().iter().all(|inv| inv.run_id != id));
        }

        with_timeout(ticket.wait()).await;
        assert_eq!(h.resolver().status(id).unwrap().status(), RunStatus::Completed);
    }
    assert_eq!(h.backend.invocations().len(), 200);
}

#[tokio::test]
async fn executing_is_reported_while_the_suite_runs() {
    let backend = FakeSuiteBackend::new().gated();
    let h = Harness::new(backend.clone());

    let mut ticket = h.orchestrator.submit(RunRequest::new(SUITE)).unwrap();
    let id = ticket.run_id();
    ticket.release();

    with_timeout(async {
        while backend.in_flight() == 0 {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await;

    let entry = h.orchestrator.tracker().get(id).unwrap();
    assert_eq!(entry.status, RunStatus::Executing);
    assert_eq!(entry.message.as_deref(), Some(MSG_EXECUTING));
    assert!(entry.start_time.is_some());

    backend.release(1);
    with_timeout(ticket.wait()).await;
    assert_eq!(h.resolver().status(id).unwrap().status(), RunStatus::Completed);
}

#[tokio::test]
async fn non_zero_exit_completes_the_run_as_failed() {
    let h = Harness::new(FakeSuiteBackend::new().with_script([FakeOutcome::Exit(1)]));

    let ticket = h.orchestrator.submit(RunRequest::new(SUITE)).unwrap();
    let id = ticket.run_id();
    with_timeout(ticket.wait()).await;

    let entry = h.orchestrator.tracker().get(id).unwrap();
    assert_eq!(entry.status, RunStatus::Completed);
    assert_eq!(entry.return_code, Some(1));
    assert_eq!(entry.ok, Some(false));
    assert!(entry.completion_time.is_some());

    let record = h.store.get_run(id).unwrap().unwrap();
    assert_eq!(record.return_code, Some(1));
    assert!(!record.ok);
    assert_eq!(
        PathBuf::from(&record.output_dir),
        PathBuf::from(RUNS_ROOT).join(id.to_string())
    );
}

#[tokio::test]
async fn invocation_carries_request_options() {
    let h = Harness::new(FakeSuiteBackend::new());
    let request = RunRequestBuilder::new(format!("  {SUITE}  "))
        .variable("ENV", "staging")
        .arg("--dryrun")
        .arg("-i")
        .arg("smoke")
        .build();

    let ticket = h.orchestrator.submit(request).unwrap();
    let id = ticket.run_id();
    with_timeout(ticket.wait()).await;

    let invocations = h.backend.invocations();
    assert_eq!(invocations.len(), 1);
    let inv = &invocations[0];
    assert_eq!(inv.run_id, id);
    assert_eq!(inv.suite_path, PathBuf::from(SUITE));
    assert_eq!(inv.output_dir, h.orchestrator.output_dir_for(id));
    assert_eq!(inv.variables.get("ENV").map(String::as_str), Some("staging"));
    assert_eq!(inv.extra_args, vec!["--dryrun", "-i", "smoke"]);
}

#[tokio::test]
async fn concurrent_runs_keep_independent_lifecycles() {
    let suites: Vec<String> = (0..6).map(|i| format!("/suites/s{i}.robot")).collect();
    let mut backend = FakeSuiteBackend::new();
    for (i, suite) in suites.iter().enumerate() {
        backend = backend.with_outcome_for(suite, FakeOutcome::Exit(i as i32));
    }
    let h = Harness::new(backend);
    for suite in &suites {
        h.fs.add_file(suite, "");
    }

    let tickets: Vec<_> = suites
        .iter()
        .map(|s| h.orchestrator.submit(RunRequest::new(s.as_str())).unwrap())
        .collect();

    let ids: Vec<RunId> = tickets.iter().map(|t| t.run_id()).collect();
    let distinct: HashSet<_> = ids.iter().copied().collect();
    assert_eq!(distinct.len(), ids.len());
    assert!(ids.windows(2).all(|w| w[0] < w[1]));

    for ticket in tickets {
        with_timeout(ticket.wait()).await;
    }

    let resolver = h.resolver();
    for (i, (id, suite)) in ids.iter().zip(&suites).enumerate() {
        let view = resolver.status(*id).unwrap();
        assert_eq!(view.status(), RunStatus::Completed);
        assert_eq!(view.suite_path(), suite.as_str());
        assert_eq!(view.return_code(), Some(i as i32));
        assert_eq!(view.ok(), Some(i == 0));
    }
}

#[tokio::test]
async fn missing_suite_is_rejected_without_side_effects() {
    let h = Harness::new(FakeSuiteBackend::new());

    match h.orchestrator.submit(RunRequest::new("/suites/missing.robot")) {
        Err(QahubError::Validation(msg)) => {
            assert!(msg.contains("does not exist"));
            assert!(msg.contains("/suites/missing.robot"));
        }
        other => panic!("expected Validation, got {other:?}"),
    }

    assert!(h.store.recent_runs(10).unwrap().is_empty());
    assert!(h.orchestrator.tracker().is_empty());
    assert!(h.backend.invocations().is_empty());
}

#[tokio::test]
async fn launch_failure_marks_tracker_error_and_leaves_placeholder() {
    let h = Harness::new(FakeSuiteBackend::new().with_script([FakeOutcome::LaunchFailure]));

    let ticket = h.orchestrator.submit(RunRequest::new(SUITE)).unwrap();
    let id = ticket.run_id();
    with_timeout(ticket.wait()).await;

    let entry = h.orchestrator.tracker().get(id).unwrap();
    assert_eq!(entry.status, RunStatus::Error);
    let message = entry.error.unwrap();
    assert!(!message.is_empty());
    assert!(message.contains("failed to launch"));
    assert!(entry.return_code.is_none());

    let record = h.store.get_run(id).unwrap().unwrap();
    assert!(record.is_placeholder());
    assert_eq!(record.output_dir, "");
    assert_eq!(record.return_code, None);
}

#[tokio::test]
async fn backend_panic_is_reported_as_error() {
    let h = Harness::new(FakeSuiteBackend::new().with_script([FakeOutcome::Panic]));

    let ticket = h.orchestrator.submit(RunRequest::new(SUITE)).unwrap();
    let id = ticket.run_id();
    with_timeout(ticket.wait()).await;

    let entry = h.orchestrator.tracker().get(id).unwrap();
    assert_eq!(entry.status, RunStatus::Error);
    assert!(entry.error.unwrap().contains("aborted"));
    assert!(h.store.get_run(id).unwrap().unwrap().is_placeholder());
}

#[tokio::test]
async fn status_survives_a_lost_tracker() {
    let h = Harness::new(FakeSuiteBackend::new().with_script([FakeOutcome::Exit(2)]));

    let ticket = h.orchestrator.submit(RunRequest::new(SUITE)).unwrap();
    let id = ticket.run_id();
    with_timeout(ticket.wait()).await;

    // Same store, fresh process state.
    let restarted = StatusResolver::new(RunTracker::new(), h.store.clone());
    let view = restarted.status(id).unwrap();
    assert!(!view.is_live());
    assert_eq!(view.status(), RunStatus::Completed);
    assert_eq!(view.return_code(), Some(2));
    assert_eq!(view.ok(), Some(false));
    assert_eq!(view.suite_path(), SUITE);
}

#[tokio::test]
async fn interrupted_run_reads_back_as_completed_without_code() {
    let backend = FakeSuiteBackend::new().gated();
    let h = Harness::new(backend.clone());

    let ticket = h.orchestrator.submit(RunRequest::new(SUITE)).unwrap();
    let id = ticket.run_id();

    let restarted = StatusResolver::new(RunTracker::new(), h.store.clone());
    let view = restarted.status(id).unwrap();
    assert_eq!(view.status(), RunStatus::Completed);
    assert_eq!(view.return_code(), None);
    assert_eq!(view.ok(), Some(false));

    backend.release(1);
    with_timeout(ticket.wait()).await;
}

#[tokio::test]
async fn unknown_run_is_not_found() {
    let h = Harness::new(FakeSuiteBackend::new());
    match h.resolver().status(RunId::new(42)) {
        Err(e @ QahubError::NotFound { .. }) => assert!(e.is_client_error()),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn dropped_ticket_does_not_cancel_the_run() {
    let h = Harness::new(FakeSuiteBackend::new());
    let id = h
        .orchestrator
        .submit(RunRequest::new(SUITE))
        .unwrap()
        .into_accepted()
        .run_id;

    wait_for_terminal(&h.resolver(), id).await;
    assert_eq!(h.store.get_run(id).unwrap().unwrap().return_code, Some(0));
}

#[tokio::test]
async fn status_endpoint_shape_is_flat_json() {
    let h = Harness::new(FakeSuiteBackend::new());
    let ticket = h.orchestrator.submit(RunRequest::new(SUITE)).unwrap();
    let id = ticket.run_id();
    with_timeout(ticket.wait()).await;

    let json = serde_json::to_value(h.resolver().status(id).unwrap()).unwrap();
    assert_eq!(json["status"], "completed");
    assert_eq!(json["return_code"], 0);
    assert_eq!(json["ok"], true);
    assert_eq!(json["suite_path"], SUITE);
    assert!(json.get("error").is_none());

    let restarted = StatusResolver::new(RunTracker::new(), Arc::clone(&h.store) as Arc<dyn RunStore>);
    let json = serde_json::to_value(restarted.status(id).unwrap()).unwrap();
    assert_eq!(json["status"], "completed");
    assert_eq!(json["ok"], true);
}
