//! Test: Skip propagation - guards and contagious skips through hard edges

use crate::helpers::*;
use buildgraph::core::{BuildContext, SkipBehavior};

#[tokio::test]
async fn test_skip_tolerant_target_skips_all_dependents() {
    let log = new_log();
    let targets = vec![
        recording_target("Compile", &log),
        recording_target("Pack", &log)
            .depends_on(["Compile"])
            .only_when("has tool project", |_| false)
            .when_skipped(SkipBehavior::Skip),
        recording_target("Push", &log).depends_on(["Pack"]),
        recording_target("Announce", &log).depends_on(["Push"]),
    ];

    let result = run_targets(targets, &["Announce"], &plain_context()).await;

    assert_run_succeeded(&result);
    assert_succeeded(&result, "Compile");
    assert_skipped(&result, "Pack", "has tool project");
    assert_skipped(&result, "Push", "dependency 'Pack' was skipped");
    assert_skipped(&result, "Announce", "dependency 'Pack' was skipped");
    assert_eq!(logged(&log), vec!["Compile"]);
}

#[tokio::test]
async fn test_forced_skip_does_not_evaluate_dependent_guards() {
    let log = new_log();
    let targets = vec![
        recording_target("Pack", &log)
            .only_when("never", |_| false)
            .when_skipped(SkipBehavior::Skip),
        // would abort the run if it were evaluated
        recording_target("Push", &log)
            .depends_on(["Pack"])
            .requires("api key present", |_| false),
    ];

    let result = run_targets(targets, &["Push"], &plain_context()).await;

    assert_run_succeeded(&result);
    assert_skipped(&result, "Push", "dependency 'Pack' was skipped");
    assert!(result.abort.is_none());
}

#[tokio::test]
async fn test_skip_does_not_touch_unrelated_targets() {
    let log = new_log();
    let targets = vec![
        recording_target("Compile", &log),
        recording_target("Publish", &log)
            .depends_on(["Compile"])
            .requires("server build", |ctx: &BuildContext| !ctx.is_local_build)
            .when_skipped(SkipBehavior::Skip),
        recording_target("Test", &log).depends_on(["Compile"]),
    ];

    let result = run_targets(targets, &["Publish", "Test"], &plain_context()).await;

    assert_run_succeeded(&result);
    assert_skipped(&result, "Publish", "requirement 'server build' not met");
    assert_succeeded(&result, "Test");
    assert_eq!(logged(&log), vec!["Compile", "Test"]);
}

/// Dependencies run before the guard is checked, not after
#[tokio::test]
async fn test_failed_requirement_still_runs_dependencies() {
    let log = new_log();
    let targets = vec![
        recording_target("Compile", &log),
        recording_target("Publish", &log)
            .depends_on(["Compile"])
            .requires("server build on a release branch", |ctx: &BuildContext| {
                !ctx.is_local_build && ctx.is_release_branch()
            })
            .when_skipped(SkipBehavior::Skip),
    ];

    let result = run_targets(targets, &["Publish"], &plain_context()).await;

    assert_run_succeeded(&result);
    assert_succeeded(&result, "Compile");
    assert_skipped(&result, "Publish", "server build on a release branch");
}

#[tokio::test]
async fn test_fail_behavior_predicate_skip_does_not_propagate() {
    let log = new_log();
    let targets = vec![
        recording_target("Docs", &log).only_when("docs enabled", |_| false),
        recording_target("Site", &log).depends_on(["Docs"]),
    ];

    let result = run_targets(targets, &["Site"], &plain_context()).await;

    assert_run_succeeded(&result);
    assert_skipped(&result, "Docs", "docs enabled");
    assert_succeeded(&result, "Site");
}

#[tokio::test]
async fn test_failed_requirement_with_fail_behavior_aborts_run() {
    let log = new_log();
    let targets = vec![
        recording_target("Compile", &log),
        recording_target("Publish", &log)
            .depends_on(["Compile"])
            .requires("server build", |_| false),
        recording_target("Announce", &log).depends_on(["Publish"]),
    ];

    let result = run_targets(targets, &["Announce"], &plain_context()).await;

    assert_run_failed(&result);
    assert_succeeded(&result, "Compile");
    assert_aborted(&result, "Publish");
    assert_aborted(&result, "Announce");

    let abort = result.abort.as_ref().unwrap();
    assert_eq!(abort.target, "Publish");
    assert!(abort.requirement.contains("server build"));
    assert_eq!(logged(&log), vec!["Compile"]);
}
