//! CI workflow generation (GitHub Actions)

use crate::core::{BuildConfig, TargetGraph, WorkflowConfig};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Where workflow files go, relative to the build root
pub const WORKFLOWS_DIR: &str = ".github/workflows";

const CHECKOUT_ACTION: &str = "actions/checkout@v4";

const GENERATED_HEADER: &str = "# Generated by `buildgraph generate-ci`; changes are overwritten.\n";

#[derive(Debug, Serialize)]
struct Workflow {
    name: String,
    on: Triggers,
    jobs: BTreeMap<String, Job>,
}

#[derive(Debug, Default, Serialize)]
struct Triggers {
    #[serde(skip_serializing_if = "Option::is_none")]
    push: Option<BranchFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pull_request: Option<BranchFilter>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
struct BranchFilter {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    branches: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    branches_ignore: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct Job {
    name: String,
    runs_on: String,
    steps: Vec<Step>,
}

#[derive(Debug, Default, Serialize)]
struct Step {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uses: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    with: BTreeMap<String, serde_yaml::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    run: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    env: BTreeMap<String, String>,
}

fn triggers(workflow: &WorkflowConfig) -> Triggers {
    let mut triggers = Triggers::default();
    if !workflow.on_pull_request_branches.is_empty() {
        triggers.pull_request = Some(BranchFilter {
            branches: workflow.on_pull_request_branches.clone(),
            ..Default::default()
        });
    }
    if !workflow.on_push_branches_ignore.is_empty() || triggers.pull_request.is_none() {
        triggers.push = Some(BranchFilter {
            branches_ignore: workflow.on_push_branches_ignore.clone(),
            ..Default::default()
        });
    }
    triggers
}

/// Render one workflow to YAML
pub fn render_workflow(workflow: &WorkflowConfig, config: &BuildConfig) -> Result<String> {
    let checkout = Step {
        uses: Some(CHECKOUT_ACTION.to_string()),
        with: BTreeMap::from([(
            "fetch-depth".to_string(),
            serde_yaml::Value::from(workflow.fetch_depth),
        )]),
        ..Default::default()
    };

    let targets = workflow.invoked_targets.join(", ");
    let run = Step {
        name: Some(format!("Run: {}", targets)),
        run: Some(format!(
            "{} {}",
            config.build_command,
            workflow.invoked_targets.join(" ")
        )),
        env: workflow
            .imported_secrets
            .iter()
            .map(|secret| (secret.clone(), format!("${{{{ secrets.{} }}}}", secret)))
            .collect(),
        ..Default::default()
    };

    let job = Job {
        name: workflow.image.clone(),
        runs_on: workflow.image.clone(),
        steps: vec![checkout, run],
    };

    let document = Workflow {
        name: workflow.name.clone(),
        on: triggers(workflow),
        jobs: BTreeMap::from([(workflow.image.clone(), job)]),
    };

    let yaml = serde_yaml::to_string(&document)
        .with_context(|| format!("Failed to render workflow '{}'", workflow.name))?;
    Ok(format!("{}{}", GENERATED_HEADER, yaml))
}

/// Every invoked target must exist in the graph
pub fn validate_workflows(config: &BuildConfig, graph: &TargetGraph) -> Result<()> {
    for workflow in &config.workflows {
        for target in &workflow.invoked_targets {
            if !graph.contains(target) {
                anyhow::bail!(
                    "Workflow '{}' invokes unknown target '{}'",
                    workflow.name,
                    target
                );
            }
        }
    }
    Ok(())
}

/// Write one `<name>.yml` per configured workflow into `dir`
pub fn write_workflows(config: &BuildConfig, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut written = Vec::with_capacity(config.workflows.len());
    for workflow in &config.workflows {
        let path = dir.join(format!("{}.yml", workflow.name));
        let yaml = render_workflow(workflow, config)?;
        fs::write(&path, yaml).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote workflow {}", path.display());
        written.push(path);
    }
    Ok(written)
}
