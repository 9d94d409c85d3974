//! Test: Ordering - dependency resolution, soft constraints and graph errors

use crate::helpers::*;
use buildgraph::core::{GraphError, TargetGraph};
use buildgraph::execution::{ExecutionEngine, SchedulingError};
use std::sync::Arc;

/// The classic chain with Print running before Clean
fn chain(log: &ExecutionLog) -> Vec<buildgraph::core::TargetDefinition> {
    vec![
        recording_target("Print", log).before(["Clean"]),
        recording_target("Clean", log),
        recording_target("Restore", log).depends_on(["Clean"]),
        recording_target("Compile", log).depends_on(["Restore"]),
        recording_target("Test", log).depends_on(["Compile"]),
    ]
}

#[tokio::test]
async fn test_chain_runs_in_dependency_order() {
    let log = new_log();
    let result = run_targets(chain(&log), &["Test"], &plain_context()).await;

    assert_run_succeeded(&result);
    assert_order(&result, &["Clean", "Restore", "Compile", "Test"]);
    assert_eq!(logged(&log), vec!["Clean", "Restore", "Compile", "Test"]);
}

#[tokio::test]
async fn test_soft_predecessor_runs_first_when_included() {
    let log = new_log();
    let mut targets = chain(&log);
    // pull Print in through a hard edge
    targets[4] = recording_target("Test", &log).depends_on(["Compile", "Print"]);

    let result = run_targets(targets, &["Test"], &plain_context()).await;

    assert_run_succeeded(&result);
    assert_eq!(logged(&log), vec!["Print", "Clean", "Restore", "Compile", "Test"]);
}

#[tokio::test]
async fn test_before_and_after_are_both_honored() {
    let log = new_log();
    let targets = vec![
        recording_target("Z", &log),
        recording_target("Y", &log),
        recording_target("X", &log).before(["Y"]).after(["Z"]),
        recording_target("Goal", &log).depends_on(["Y", "X", "Z"]),
    ];

    let result = run_targets(targets, &["Goal"], &plain_context()).await;

    let order = logged(&log);
    let pos = |name: &str| order.iter().position(|n| n == name).unwrap();
    assert!(pos("X") < pos("Y"));
    assert!(pos("Z") < pos("X"));
    assert_eq!(order.last().map(String::as_str), Some("Goal"));
    assert_run_succeeded(&result);
}

#[tokio::test]
async fn test_overlapping_goals_run_each_target_once() {
    let log = new_log();
    let result = run_targets(chain(&log), &["Test", "Compile", "Clean", "Test"], &plain_context()).await;

    assert_run_succeeded(&result);
    assert_eq!(logged(&log), vec!["Clean", "Restore", "Compile", "Test"]);
    assert_eq!(result.goals, vec!["Test", "Compile", "Clean"]);
}

#[tokio::test]
async fn test_mutual_before_fails_before_anything_runs() {
    let log = new_log();
    let graph = TargetGraph::register(vec![
        recording_target("A", &log).before(["B"]),
        recording_target("B", &log).before(["A"]),
    ])
    .unwrap();

    let err = ExecutionEngine::new(Arc::new(graph))
        .run(&["A", "B"], &plain_context())
        .await
        .unwrap_err();

    match err {
        SchedulingError::UnsatisfiableOrdering { constraint, cycle } => {
            assert!(constraint.contains("before"), "constraint: {}", constraint);
            assert_eq!(cycle.len(), 3);
        }
        other => panic!("expected unsatisfiable ordering, got {other:?}"),
    }
    assert!(logged(&log).is_empty());
}

#[test]
fn test_dependency_cycle_is_rejected_at_registration() {
    let log = new_log();
    let err = TargetGraph::register(vec![
        recording_target("A", &log).depends_on(["C"]),
        recording_target("B", &log).depends_on(["A"]),
        recording_target("C", &log).depends_on(["B"]),
    ])
    .unwrap_err();

    match err {
        GraphError::CyclicDependency(cycle) => {
            assert_eq!(cycle.first(), cycle.last());
            for name in ["A", "B", "C"] {
                assert!(cycle.iter().any(|n| n == name), "{name} missing from {cycle:?}");
            }
        }
        other => panic!("expected cycle, got {other:?}"),
    }
    assert!(logged(&log).is_empty());
}

#[test]
fn test_registration_errors_name_the_offender() {
    let log = new_log();

    let err = TargetGraph::register(vec![
        recording_target("Compile", &log),
        recording_target("Compile", &log),
    ])
    .unwrap_err();
    assert_eq!(err, GraphError::DuplicateTarget("Compile".into()));

    let err = TargetGraph::register(vec![recording_target("Pack", &log).after(["Tset"])]).unwrap_err();
    assert!(err.to_string().contains("Tset"));

    let err = TargetGraph::register(vec![recording_target("Pack", &log).before(["Pack"])]).unwrap_err();
    assert!(matches!(err, GraphError::SelfReference { .. }));
}
