use std::sync::Arc;
use std::time::Duration;

use sqlrun_core::{Decision, DecisionRequest, RunSummary, SqlRunError};
use tempfile::TempDir;

use super::*;
use crate::runner::RunEvent;
use crate::test_helpers::{FakeDriver, SessionProbe, missing_script, test_params, write_script};

fn controller_with_probe() -> (Controller, Arc<SessionProbe>) {
    let driver = Arc::new(FakeDriver::new());
    let probe = driver.probe();
    (Controller::new(driver), probe)
}

/// Consume every event, answering each decision request with `decide`.
async fn collect_with_decisions(
    handle: &mut RunHandle,
    mut decide: impl FnMut(&DecisionRequest) -> Decision,
) -> Vec<RunEvent> {
    let mut events = Vec::new();
    while let Some(event) = handle.next_event().await {
        if let RunEvent::DecisionRequired(request) = &event {
            handle.respond(decide(request)).unwrap();
        }
        events.push(event);
    }
    events
}

fn decision_request_count(events: &[RunEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, RunEvent::DecisionRequired(_)))
        .count()
}

mod decision_protocol_tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn test_ignore_all_remaining_suppresses_further_prompts() {
        let dir = TempDir::new().unwrap();
        let sources = vec![
            write_script(dir.path(), "s1.sql", "INSERT INTO t VALUES (1);\nFAIL one;"),
            write_script(dir.path(), "s2.sql", "FAIL two;"),
            write_script(dir.path(), "s3.sql", "INSERT INTO t VALUES (3);"),
            write_script(dir.path(), "s4.sql", "FAIL three;\nFAIL four;"),
            write_script(dir.path(), "s5.sql", "INSERT INTO t VALUES (5);"),
        ];

        let (controller, probe) = controller_with_probe();
        let mut handle = controller.start(sources, test_params()).unwrap();

        let events =
            collect_with_decisions(&mut handle, |_| Decision::IgnoreAllRemaining).await;
        let report = handle.wait().await.unwrap();

        // One prompt for the first failure; the sticky flag covers the
        // other three, across script boundaries.
        assert_eq!(decision_request_count(&events), 1);
        assert_eq!(report.summary.error_count, 4);
        assert_eq!(report.summary.success_count, 3);
        assert!(!report.summary.stopped);
        assert_eq!(report.outcomes.len(), 5);
        assert!(report.outcomes.iter().all(|o| !o.stopped_early));
        assert_eq!(probe.close_calls(), 1);
    }

    #[tokio::test]
    async fn test_stop_mid_script_abandons_the_rest() {
        let dir = TempDir::new().unwrap();
        let sources = vec![
            write_script(
                dir.path(),
                "first.sql",
                "INSERT INTO t VALUES (1);\nFAIL here;\nINSERT INTO t VALUES (3);",
            ),
            write_script(dir.path(), "second.sql", "INSERT INTO t VALUES (9);"),
        ];

        let (controller, probe) = controller_with_probe();
        let mut handle = controller.start(sources, test_params()).unwrap();

        let events = collect_with_decisions(&mut handle, |_| Decision::Stop).await;
        let report = handle.wait().await.unwrap();

        assert!(report.summary.stopped);
        assert_eq!(report.summary.success_count, 1);
        assert_eq!(report.summary.error_count, 1);
        assert_eq!(report.outcomes.len(), 1);
        assert!(report.outcomes[0].stopped_early);
        assert_eq!(report.outcomes[0].unit_results.len(), 2);

        // The unit after the failure never ran, and the second script was
        // never picked up.
        assert_eq!(
            probe.executed(),
            vec!["INSERT INTO t VALUES (1)", "FAIL here"]
        );
        assert!(!events.iter().any(
            |e| matches!(e, RunEvent::ScriptStarted { script_name } if script_name == "second.sql")
        ));
        assert_eq!(probe.close_calls(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_script_prompts_with_no_unit() {
        let dir = TempDir::new().unwrap();
        let sources = vec![
            missing_script(dir.path(), "missing.sql"),
            write_script(dir.path(), "good.sql", "INSERT INTO t VALUES (1);"),
        ];

        let (controller, probe) = controller_with_probe();
        let mut handle = controller.start(sources, test_params()).unwrap();

        let mut seen_request = None;
        let events = collect_with_decisions(&mut handle, |request| {
            seen_request = Some(request.clone());
            Decision::Ignore
        })
        .await;
        let report = handle.wait().await.unwrap();

        let request = seen_request.expect("a decision request was raised");
        assert_eq!(request.script_name, "missing.sql");
        assert_eq!(request.failed_unit, None);

        assert!(events.iter().any(|e| matches!(
            e,
            RunEvent::UnitFailed { unit: None, script_name, .. } if script_name == "missing.sql"
        )));

        // Counted exactly once, and the run moved on to the next script.
        assert_eq!(report.summary.error_count, 1);
        assert_eq!(report.summary.success_count, 1);
        assert!(!report.summary.stopped);
        assert_eq!(report.outcomes.len(), 2);
        assert!(report.outcomes[0].read_error.is_some());
        assert!(report.outcomes[0].unit_results.is_empty());
        assert_eq!(probe.close_calls(), 1);
    }

    #[tokio::test]
    async fn test_stop_on_unreadable_script_skips_the_rest() {
        let dir = TempDir::new().unwrap();
        let sources = vec![
            missing_script(dir.path(), "missing.sql"),
            write_script(dir.path(), "never.sql", "INSERT INTO t VALUES (1);"),
        ];

        let (controller, probe) = controller_with_probe();
        let mut handle = controller.start(sources, test_params()).unwrap();

        collect_with_decisions(&mut handle, |_| Decision::Stop).await;
        let report = handle.wait().await.unwrap();

        assert!(report.summary.stopped);
        assert_eq!(report.summary.error_count, 1);
        assert_eq!(report.outcomes.len(), 1);
        assert!(report.outcomes[0].stopped_early);
        assert!(probe.executed().is_empty());
        assert_eq!(probe.close_calls(), 1);
    }
}

mod usage_tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn test_respond_without_outstanding_request_is_a_usage_error() {
        let dir = TempDir::new().unwrap();
        let sources = vec![write_script(dir.path(), "a.sql", "SELECT 1;")];

        let (controller, _probe) = controller_with_probe();
        let mut handle = controller.start(sources, test_params()).unwrap();

        let error = handle.respond(Decision::Ignore).unwrap_err();
        assert!(matches!(error, SqlRunError::Usage(_)));

        collect_with_decisions(&mut handle, |_| panic!("no prompt expected")).await;
        let report = handle.wait().await.unwrap();
        assert_eq!(report.summary.success_count, 1);
    }

    #[tokio::test]
    async fn test_second_start_while_a_run_is_active_is_rejected() {
        let dir = TempDir::new().unwrap();
        let sources = vec![write_script(dir.path(), "a.sql", "FAIL now;")];

        let (controller, _probe) = controller_with_probe();
        let mut handle = controller.start(sources, test_params()).unwrap();

        // Walk to the suspension so the first run is provably unfinished.
        loop {
            match handle.next_event().await.unwrap() {
                RunEvent::DecisionRequired(_) => break,
                _ => {}
            }
        }

        let second = controller.start(Vec::new(), test_params());
        assert!(matches!(second, Err(SqlRunError::Usage(_))));

        handle.respond(Decision::Stop).unwrap();
        let report = handle.wait().await.unwrap();
        assert!(report.summary.stopped);
    }

    #[tokio::test]
    async fn test_start_is_allowed_again_after_the_run_finishes() {
        let dir = TempDir::new().unwrap();
        let sources = vec![write_script(dir.path(), "a.sql", "SELECT 1;")];

        let (controller, _probe) = controller_with_probe();
        let mut handle = controller.start(sources, test_params()).unwrap();
        collect_with_decisions(&mut handle, |_| panic!("no prompt expected")).await;
        handle.wait().await.unwrap();

        let handle = controller.start(Vec::new(), test_params()).unwrap();
        let report = handle.wait().await.unwrap();
        assert_eq!(report.summary, RunSummary::empty());
    }
}

mod cancellation_tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn test_cancel_resolves_an_active_suspension() {
        let dir = TempDir::new().unwrap();
        let sources = vec![
            write_script(dir.path(), "a.sql", "FAIL now;\nINSERT INTO t VALUES (2);"),
            write_script(dir.path(), "b.sql", "INSERT INTO t VALUES (3);"),
        ];

        let (controller, probe) = controller_with_probe();
        let mut handle = controller.start(sources, test_params()).unwrap();

        loop {
            match handle.next_event().await.unwrap() {
                RunEvent::DecisionRequired(_) => break,
                _ => {}
            }
        }

        handle.cancel();
        // The cancel consumed the parked request.
        assert!(matches!(
            handle.respond(Decision::Ignore).unwrap_err(),
            SqlRunError::Usage(_)
        ));

        let report = handle.wait().await.unwrap();
        assert!(report.summary.stopped);
        assert_eq!(report.outcomes.len(), 1);
        assert!(report.outcomes[0].stopped_early);
        assert_eq!(probe.executed(), vec!["FAIL now"]);
        assert_eq!(probe.close_calls(), 1);
    }

    #[tokio::test]
    async fn test_cancel_right_after_start_stops_at_the_first_boundary() {
        let dir = TempDir::new().unwrap();
        let sources = vec![write_script(dir.path(), "a.sql", "SELECT 1;")];

        let (controller, probe) = controller_with_probe();
        let handle = controller.start(sources, test_params()).unwrap();
        handle.cancel();

        let report = handle.wait().await.unwrap();
        assert!(report.summary.stopped);
        assert!(probe.executed().is_empty());
    }

    #[tokio::test]
    async fn test_dropping_the_handle_cancels_a_suspended_run() {
        let dir = TempDir::new().unwrap();
        let sources = vec![write_script(dir.path(), "a.sql", "FAIL now;")];

        let (controller, probe) = controller_with_probe();
        let mut handle = controller.start(sources, test_params()).unwrap();

        loop {
            match handle.next_event().await.unwrap() {
                RunEvent::DecisionRequired(_) => break,
                _ => {}
            }
        }

        drop(handle);

        // The detached task resolves the parked decision as Stop and
        // still closes the session.
        for _ in 0..50 {
            if probe.close_calls() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        assert_eq!(probe.close_calls(), 1);
    }
}
