//! Test utility functions for buildgraph
#![allow(dead_code)]

use async_trait::async_trait;
use buildgraph::core::{
    ActionError, ActionOutput, BuildConfig, BuildContext, Configuration, RunResult,
    TargetDefinition, TargetGraph, TargetStatus,
};
use buildgraph::execution::ExecutionEngine;
use buildgraph::toolchain::{ManifestCatalog, ProjectInfo, ToolError, Toolchain};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Shared log of executed target names
pub type ExecutionLog = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> ExecutionLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn logged(log: &ExecutionLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Target whose action appends its name to the log
pub fn recording_target(name: &str, log: &ExecutionLog) -> TargetDefinition {
    let log = log.clone();
    let label = name.to_string();
    TargetDefinition::new(name).executes_fn(move |_| {
        log.lock().unwrap().push(label.clone());
        Ok(ActionOutput::default())
    })
}

/// Target whose action logs its name and then fails
pub fn failing_target(name: &str, log: &ExecutionLog, message: &str) -> TargetDefinition {
    let log = log.clone();
    let label = name.to_string();
    let message = message.to_string();
    TargetDefinition::new(name).executes_fn(move |_| {
        log.lock().unwrap().push(label.clone());
        Err(ActionError::Message(message.clone()))
    })
}

/// Toolchain fake that records every call instead of running tools
#[derive(Default)]
pub struct RecordingToolchain {
    calls: Mutex<Vec<String>>,
    fail_on: Option<String>,
}

impl RecordingToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every call whose operation name matches `operation`
    pub fn failing_on(operation: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_on: Some(operation.to_string()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, operation: &str, detail: &str) -> Result<(), ToolError> {
        let call = if detail.is_empty() {
            operation.to_string()
        } else {
            format!("{} {}", operation, detail)
        };
        self.calls.lock().unwrap().push(call);

        if self.fail_on.as_deref() == Some(operation) {
            return Err(ToolError::Exit {
                program: "dotnet".to_string(),
                code: 1,
                stderr: format!("{} failed", operation),
            });
        }
        Ok(())
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[async_trait]
impl Toolchain for RecordingToolchain {
    async fn restore(&self) -> Result<(), ToolError> {
        self.record("restore", "")
    }

    async fn build(&self, configuration: Configuration) -> Result<(), ToolError> {
        self.record("build", &configuration.to_string())
    }

    async fn test(
        &self,
        configuration: Configuration,
        _results_dir: &Path,
    ) -> Result<Option<PathBuf>, ToolError> {
        self.record("test", &configuration.to_string())?;
        Ok(None)
    }

    async fn pack(
        &self,
        project: &Path,
        _configuration: Configuration,
        output_dir: &Path,
    ) -> Result<PathBuf, ToolError> {
        self.record("pack", &file_stem(project))?;
        fs::create_dir_all(output_dir).unwrap();
        Ok(output_dir.to_path_buf())
    }

    async fn publish(
        &self,
        project: &Path,
        _configuration: Configuration,
        output_dir: &Path,
    ) -> Result<PathBuf, ToolError> {
        self.record("publish", &file_stem(project))?;
        fs::write(output_dir.join("app.dll"), "binary").unwrap();
        Ok(output_dir.to_path_buf())
    }

    async fn push(&self, package: &Path, _api_key: &str, feed_url: &str) -> Result<(), ToolError> {
        let name = package
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.record("push", &format!("{} -> {}", name, feed_url))
    }
}

/// Catalog with one tool project (`Cli`) and one library (`Core`)
pub fn tool_catalog() -> ManifestCatalog {
    ManifestCatalog::from_projects(vec![
        ProjectInfo::new("Cli", "src/Cli/Cli.csproj").with_property("PackAsTool", "true"),
        ProjectInfo::new("Core", "src/Core/Core.csproj"),
    ])
}

/// Local-build context over `root` wired to the given fakes
pub fn test_context(
    root: &Path,
    toolchain: Arc<RecordingToolchain>,
    projects: ManifestCatalog,
) -> BuildContext {
    BuildContext::new(root, BuildConfig::default())
        .with_local_build(true)
        .with_version("1.2.3")
        .with_toolchain(toolchain)
        .with_projects(Arc::new(projects))
}

/// Context for closure-only graphs that never touch the toolchain
pub fn plain_context() -> BuildContext {
    BuildContext::new(".", BuildConfig::default()).with_local_build(true)
}

/// Register the targets and run the goals
pub async fn run_targets(
    targets: Vec<TargetDefinition>,
    goals: &[&str],
    ctx: &BuildContext,
) -> RunResult {
    let graph = TargetGraph::register(targets).expect("graph should be valid");
    ExecutionEngine::new(Arc::new(graph))
        .run(goals, ctx)
        .await
        .expect("goals should resolve")
}

pub fn assert_run_succeeded(result: &RunResult) {
    assert!(
        result.is_success(),
        "Run should succeed, got {:?}: {:#?}",
        result.status,
        result.targets
    );
    assert_eq!(result.exit_code(), 0);
}

pub fn assert_run_failed(result: &RunResult) {
    assert!(!result.is_success(), "Run should fail: {:#?}", result.targets);
    assert_ne!(result.exit_code(), 0);
}

pub fn assert_succeeded(result: &RunResult, name: &str) {
    assert!(
        matches!(result.status_of(name), Some(TargetStatus::Succeeded { .. })),
        "Target '{}' should have succeeded, got {:?}",
        name,
        result.status_of(name)
    );
}

pub fn assert_skipped(result: &RunResult, name: &str, reason_contains: &str) {
    match result.status_of(name) {
        Some(TargetStatus::Skipped { reason, .. }) => assert!(
            reason.contains(reason_contains),
            "Skip reason for '{}' should contain '{}', got '{}'",
            name,
            reason_contains,
            reason
        ),
        other => panic!("Target '{}' should be skipped, got {:?}", name, other),
    }
}

pub fn assert_failed(result: &RunResult, name: &str, error_contains: &str) {
    match result.status_of(name) {
        Some(TargetStatus::Failed { error, .. }) => assert!(
            error.contains(error_contains),
            "Error for '{}' should contain '{}', got '{}'",
            name,
            error_contains,
            error
        ),
        other => panic!("Target '{}' should have failed, got {:?}", name, other),
    }
}

pub fn assert_aborted(result: &RunResult, name: &str) {
    assert!(
        matches!(result.status_of(name), Some(TargetStatus::Aborted { .. })),
        "Target '{}' should be aborted, got {:?}",
        name,
        result.status_of(name)
    );
}

/// Assert the scheduled order of the whole run
pub fn assert_order(result: &RunResult, expected: &[&str]) {
    let actual: Vec<&str> = result.targets.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(actual, expected, "Scheduled order mismatch");
}
