//! Test: Failure Handling - halting, proceeding and exit status

use crate::helpers::*;

#[tokio::test]
async fn test_failure_halts_and_aborts_remaining_targets() {
    let log = new_log();
    let targets = vec![
        recording_target("Clean", &log),
        failing_target("Compile", &log, "error CS1002: ; expected").depends_on(["Clean"]),
        recording_target("Test", &log).depends_on(["Compile"]),
        recording_target("Lint", &log),
    ];

    let result = run_targets(targets, &["Test", "Lint"], &plain_context()).await;

    assert_run_failed(&result);
    assert_order(&result, &["Clean", "Compile", "Test", "Lint"]);
    assert_succeeded(&result, "Clean");
    assert_failed(&result, "Compile", "CS1002");
    assert_aborted(&result, "Test");
    // unrelated but later in the order
    assert_aborted(&result, "Lint");
    assert_eq!(logged(&log), vec!["Clean", "Compile"]);
}

#[tokio::test]
async fn test_proceed_after_failure_keeps_going() {
    let log = new_log();
    let targets = vec![
        failing_target("Push", &log, "409 Conflict").proceed_after_failure(),
        recording_target("Announce", &log).depends_on(["Push"]),
        recording_target("Cleanup", &log),
    ];

    let result = run_targets(targets, &["Announce", "Cleanup"], &plain_context()).await;

    assert_failed(&result, "Push", "409 Conflict");
    // dependents are evaluated normally, not force-skipped
    assert_succeeded(&result, "Announce");
    assert_succeeded(&result, "Cleanup");
    assert_eq!(logged(&log), vec!["Push", "Announce", "Cleanup"]);

    // the failure still shows in the overall result
    assert_run_failed(&result);
    assert_eq!(result.executed(), vec!["Push", "Announce", "Cleanup"]);
}

#[tokio::test]
async fn test_proceeded_flag_is_recorded() {
    let log = new_log();
    let result = run_targets(
        vec![failing_target("Push", &log, "boom").proceed_after_failure()],
        &["Push"],
        &plain_context(),
    )
    .await;

    match result.status_of("Push") {
        Some(buildgraph::core::TargetStatus::Failed { proceeded, .. }) => assert!(*proceeded),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_all_success_or_skipped_exits_zero() {
    let log = new_log();
    let targets = vec![
        recording_target("Compile", &log),
        recording_target("Pack", &log)
            .depends_on(["Compile"])
            .only_when("never", |_| false),
    ];

    let result = run_targets(targets, &["Pack"], &plain_context()).await;

    assert_eq!(result.exit_code(), 0);
    assert_eq!(result.count("succeeded"), 1);
    assert_eq!(result.count("skipped"), 1);
    assert!(result.finished_at.is_some());
}

#[tokio::test]
async fn test_run_result_serializes_to_json() {
    let log = new_log();
    let result = run_targets(
        vec![
            recording_target("Clean", &log),
            failing_target("Compile", &log, "boom").depends_on(["Clean"]),
        ],
        &["Compile"],
        &plain_context(),
    )
    .await;

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["status"], "failed");
    assert_eq!(json["targets"][0]["status"]["state"], "succeeded");
    assert_eq!(json["targets"][1]["status"]["state"], "failed");
    assert_eq!(json["targets"][1]["status"]["error"], "boom");
}
