//! Test: Standard build - the registered targets against a recording toolchain

use crate::helpers::*;
use buildgraph::build::{standard_graph, COMPILE, PACK, PUBLISH, PUSH, TEST};
use buildgraph::core::{BuildConfig, BuildContext, Configuration, RunResult};
use buildgraph::execution::ExecutionEngine;
use buildgraph::toolchain::ManifestCatalog;
use buildgraph::vcs::RepositoryInfo;
use std::fs;
use std::sync::Arc;

async fn run_standard(goals: &[&str], ctx: &BuildContext) -> RunResult {
    let graph = standard_graph(&BuildConfig::default()).unwrap();
    ExecutionEngine::new(Arc::new(graph))
        .run(goals, ctx)
        .await
        .unwrap()
}

fn server_build_on(branch: &str, ctx: BuildContext) -> BuildContext {
    ctx.with_local_build(false)
        .with_repository(RepositoryInfo::default().with_branch(branch))
}

#[tokio::test]
async fn test_local_test_run() {
    let dir = tempfile::tempdir().unwrap();
    let toolchain = Arc::new(RecordingToolchain::new());
    let ctx = test_context(dir.path(), toolchain.clone(), tool_catalog());

    let result = run_standard(&[TEST], &ctx).await;

    assert_run_succeeded(&result);
    assert_order(&result, &["Print", "Clean", "Restore", "Compile", "Test"]);
    assert_eq!(toolchain.calls(), vec!["restore", "build Debug", "test Debug"]);
    assert!(dir.path().join(".artifacts").is_dir());
    assert!(dir.path().join("TestResults").is_dir());
}

#[tokio::test]
async fn test_default_goal_compiles() {
    let dir = tempfile::tempdir().unwrap();
    let toolchain = Arc::new(RecordingToolchain::new());
    let ctx = test_context(dir.path(), toolchain.clone(), tool_catalog());

    let result = run_standard(&[], &ctx).await;

    assert_run_succeeded(&result);
    assert_eq!(result.goals, vec![COMPILE]);
    assert_order(&result, &["Print", "Clean", "Restore", "Compile"]);
}

#[tokio::test]
async fn test_release_targets_skip_on_local_build() {
    let dir = tempfile::tempdir().unwrap();
    let toolchain = Arc::new(RecordingToolchain::new());
    let ctx = test_context(dir.path(), toolchain.clone(), tool_catalog());

    let result = run_standard(&[PUBLISH, PACK], &ctx).await;

    assert_run_succeeded(&result);
    assert_succeeded(&result, COMPILE);
    assert_skipped(&result, PACK, "server build on a release branch");
    assert_skipped(&result, PUBLISH, "server build on a release branch");
    assert_eq!(toolchain.calls(), vec!["restore", "build Debug"]);
}

#[tokio::test]
async fn test_server_release_build_packs_and_publishes() {
    let dir = tempfile::tempdir().unwrap();
    let toolchain = Arc::new(RecordingToolchain::new());
    let ctx = server_build_on("main", test_context(dir.path(), toolchain.clone(), tool_catalog()));
    assert_eq!(ctx.configuration, Configuration::Release);

    let result = run_standard(&[PUBLISH, PACK], &ctx).await;

    assert_run_succeeded(&result);
    assert_order(
        &result,
        &["Print", "Clean", "Restore", "Compile", "Pack", "Publish"],
    );
    assert_eq!(
        toolchain.calls(),
        vec!["restore", "build Release", "pack Cli", "publish Cli"]
    );

    let archive = dir.path().join("packages/1.2.3/Solution.zip");
    assert!(archive.is_file());
    assert!(result.artifacts().iter().any(|p| **p == archive));
}

#[tokio::test]
async fn test_release_branch_counts_as_release() {
    let dir = tempfile::tempdir().unwrap();
    let toolchain = Arc::new(RecordingToolchain::new());
    let ctx = server_build_on(
        "release/2.0",
        test_context(dir.path(), toolchain.clone(), tool_catalog()),
    );

    let result = run_standard(&[PUBLISH], &ctx).await;

    assert_run_succeeded(&result);
    assert_succeeded(&result, PUBLISH);
}

#[tokio::test]
async fn test_feature_branch_skips_release_targets() {
    let dir = tempfile::tempdir().unwrap();
    let toolchain = Arc::new(RecordingToolchain::new());
    let ctx = server_build_on(
        "feature/login",
        test_context(dir.path(), toolchain.clone(), tool_catalog()),
    );

    let result = run_standard(&[PUBLISH], &ctx).await;

    assert_run_succeeded(&result);
    assert_skipped(&result, PUBLISH, "release branch");
}

#[tokio::test]
async fn test_pack_skips_without_tool_project() {
    let dir = tempfile::tempdir().unwrap();
    let toolchain = Arc::new(RecordingToolchain::new());
    let ctx = server_build_on(
        "main",
        test_context(dir.path(), toolchain.clone(), ManifestCatalog::default()),
    );

    let result = run_standard(&[PACK], &ctx).await;

    assert_run_succeeded(&result);
    assert_skipped(&result, PACK, "PackAsTool");
    assert!(!toolchain.calls().iter().any(|c| c.starts_with("pack")));
}

#[tokio::test]
async fn test_push_requires_api_key() {
    let dir = tempfile::tempdir().unwrap();
    let toolchain = Arc::new(RecordingToolchain::new());
    let ctx = test_context(dir.path(), toolchain.clone(), tool_catalog());

    let result = run_standard(&[PUSH], &ctx).await;

    assert_run_failed(&result);
    assert_failed(&result, PUSH, "NuGet API key");
    assert!(toolchain.calls().is_empty());
}

#[tokio::test]
async fn test_push_sends_versioned_package_to_feed() {
    let dir = tempfile::tempdir().unwrap();
    let packages = dir.path().join("packages/1.2.3");
    fs::create_dir_all(&packages).unwrap();
    fs::write(packages.join("Solution.1.2.3.nupkg"), "nupkg").unwrap();

    let toolchain = Arc::new(RecordingToolchain::new());
    let ctx = test_context(dir.path(), toolchain.clone(), tool_catalog())
        .with_api_key(Some("secret".to_string()));

    let result = run_standard(&[PUSH], &ctx).await;

    assert_run_succeeded(&result);
    assert_eq!(
        toolchain.calls(),
        vec!["push Solution.1.2.3.nupkg -> https://api.nuget.org/v3/index.json"]
    );
}

#[tokio::test]
async fn test_toolchain_failure_halts_build() {
    let dir = tempfile::tempdir().unwrap();
    let toolchain = Arc::new(RecordingToolchain::failing_on("build"));
    let ctx = test_context(dir.path(), toolchain.clone(), tool_catalog());

    let result = run_standard(&[TEST], &ctx).await;

    assert_run_failed(&result);
    assert_failed(&result, COMPILE, "build failed");
    assert_aborted(&result, TEST);
    assert_eq!(toolchain.calls(), vec!["restore", "build Debug"]);
}
