//! Build configuration from YAML

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// File looked up in the root directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "build.yaml";

/// Top-level build configuration
///
/// Every directory is relative to the build root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Solution name, used for archive names
    pub solution: String,

    /// Directory holding the solution and its projects
    pub source_dir: PathBuf,

    /// Project that gets published
    pub project_dir: PathBuf,

    pub tests_dir: PathBuf,

    pub artifacts_dir: PathBuf,

    pub publish_dir: PathBuf,

    /// Packages land in `<packages_dir>/<version>`
    pub packages_dir: PathBuf,

    pub test_results_dir: PathBuf,

    /// Package identifier used to locate the package to push
    pub package_id: String,

    /// Package feed the Push target uploads to
    pub feed_url: String,

    /// Timeout for a single external tool invocation (in seconds)
    pub tool_timeout_secs: u64,

    /// Target run when no targets are requested
    pub default_target: String,

    /// Command CI workflows invoke to run the build
    pub build_command: String,

    /// CI workflows to generate
    pub workflows: Vec<WorkflowConfig>,
}

/// A generated CI workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub name: String,

    /// Runner image (e.g. `ubuntu-latest`)
    #[serde(default = "default_image")]
    pub image: String,

    /// Push trigger, excluding these branches
    #[serde(default)]
    pub on_push_branches_ignore: Vec<String>,

    /// Pull request trigger for these target branches
    #[serde(default)]
    pub on_pull_request_branches: Vec<String>,

    /// Targets the workflow invokes
    pub invoked_targets: Vec<String>,

    /// Git fetch depth for checkout (0 = full history, needed for versioning)
    #[serde(default)]
    pub fetch_depth: u32,

    /// Secrets exposed to the build as environment variables
    #[serde(default)]
    pub imported_secrets: Vec<String>,
}

fn default_image() -> String {
    "ubuntu-latest".to_string()
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            solution: "Solution".to_string(),
            source_dir: PathBuf::from("src"),
            project_dir: PathBuf::from("src/Cli"),
            tests_dir: PathBuf::from("tests"),
            artifacts_dir: PathBuf::from(".artifacts"),
            publish_dir: PathBuf::from("publish"),
            packages_dir: PathBuf::from("packages"),
            test_results_dir: PathBuf::from("TestResults"),
            package_id: "Solution".to_string(),
            feed_url: "https://api.nuget.org/v3/index.json".to_string(),
            tool_timeout_secs: 3600,
            default_target: "Compile".to_string(),
            build_command: "./build.sh".to_string(),
            workflows: vec![
                WorkflowConfig {
                    name: "continuous".to_string(),
                    image: default_image(),
                    on_push_branches_ignore: vec!["main".to_string(), "master".to_string()],
                    on_pull_request_branches: Vec::new(),
                    invoked_targets: vec!["Test".to_string()],
                    fetch_depth: 0,
                    imported_secrets: Vec::new(),
                },
                WorkflowConfig {
                    name: "merge".to_string(),
                    image: default_image(),
                    on_push_branches_ignore: Vec::new(),
                    on_pull_request_branches: vec!["main".to_string()],
                    invoked_targets: vec!["Publish".to_string(), "Pack".to_string()],
                    fetch_depth: 0,
                    imported_secrets: Vec::new(),
                },
            ],
        }
    }
}

impl BuildConfig {
    /// Load build configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Parse build configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: BuildConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the configuration for a build root
    ///
    /// An explicit path must exist; otherwise `build.yaml` in the root is used
    /// when present, and defaults when not.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let candidate = root.join(DEFAULT_CONFIG_FILE);
                if candidate.is_file() {
                    Self::from_file(candidate)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Validate the build configuration
    pub fn validate(&self) -> Result<()> {
        if self.solution.trim().is_empty() {
            anyhow::bail!("Solution name must not be empty");
        }
        if self.package_id.trim().is_empty() {
            anyhow::bail!("Package id must not be empty");
        }
        if self.default_target.trim().is_empty() {
            anyhow::bail!("Default target must not be empty");
        }
        if !(self.feed_url.starts_with("https://") || self.feed_url.starts_with("http://")) {
            anyhow::bail!("Feed URL must be an http(s) URL: {}", self.feed_url);
        }
        if self.tool_timeout_secs == 0 {
            anyhow::bail!("Tool timeout must be greater than zero");
        }

        let mut seen = HashSet::new();
        for workflow in &self.workflows {
            if !seen.insert(&workflow.name) {
                anyhow::bail!("Duplicate workflow name: {}", workflow.name);
            }
            if workflow.invoked_targets.is_empty() {
                anyhow::bail!("Workflow '{}' invokes no targets", workflow.name);
            }
        }

        Ok(())
    }
}
