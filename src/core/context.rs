//! Build context - the value set threaded into every action and predicate

use crate::core::config::BuildConfig;
use crate::toolchain::project::{ManifestCatalog, ProjectCatalog};
use crate::toolchain::{DotnetToolchain, Toolchain};
use crate::vcs::RepositoryInfo;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Environment variables whose presence marks a CI server build
const SERVER_ENV_VARS: &[&str] = &[
    "CI",
    "GITHUB_ACTIONS",
    "TF_BUILD",
    "JENKINS_URL",
    "GITLAB_CI",
    "TEAMCITY_VERSION",
    "APPVEYOR",
    "BUILDKITE",
];

/// Build configuration to compile with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Configuration {
    Debug,
    Release,
}

impl Configuration {
    /// Debug for local builds, Release on a server
    pub fn default_for(is_local_build: bool) -> Self {
        if is_local_build {
            Configuration::Debug
        } else {
            Configuration::Release
        }
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Configuration::Debug => f.write_str("Debug"),
            Configuration::Release => f.write_str("Release"),
        }
    }
}

/// True unless one of the known CI environment variables is set
pub fn detect_local_build() -> bool {
    is_local_build_with(|name| std::env::var_os(name).is_some())
}

fn is_local_build_with(is_set: impl Fn(&str) -> bool) -> bool {
    !SERVER_ENV_VARS.iter().any(|name| is_set(name))
}

/// Everything actions and predicates may read during a run
///
/// Constructed once per invocation and never mutated by the engine.
#[derive(Clone)]
pub struct BuildContext {
    /// Build root; all configured directories are relative to it
    pub root: PathBuf,

    pub config: BuildConfig,

    pub configuration: Configuration,

    pub is_local_build: bool,

    /// Secret used by the Push target
    pub api_key: Option<String>,

    pub repository: RepositoryInfo,

    /// Derived version used to label artifacts
    pub version: String,

    toolchain: Arc<dyn Toolchain>,

    projects: Arc<dyn ProjectCatalog>,
}

impl BuildContext {
    /// Create a context with the default dotnet toolchain and a manifest
    /// catalog scanned from the source directory
    pub fn new(root: impl Into<PathBuf>, config: BuildConfig) -> Self {
        let root = root.into();
        let is_local_build = detect_local_build();
        let toolchain = DotnetToolchain::new(root.clone(), config.tool_timeout_secs);
        let projects = ManifestCatalog::scan(&root.join(&config.source_dir));

        Self {
            root,
            config,
            configuration: Configuration::default_for(is_local_build),
            is_local_build,
            api_key: None,
            repository: RepositoryInfo::default(),
            version: "0.0.0".to_string(),
            toolchain: Arc::new(toolchain),
            projects: Arc::new(projects),
        }
    }

    /// Override local-build detection; also resets the configuration default
    pub fn with_local_build(mut self, is_local_build: bool) -> Self {
        self.is_local_build = is_local_build;
        self.configuration = Configuration::default_for(is_local_build);
        self
    }

    pub fn with_configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = configuration;
        self
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }

    pub fn with_repository(mut self, repository: RepositoryInfo) -> Self {
        self.repository = repository;
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_toolchain(mut self, toolchain: Arc<dyn Toolchain>) -> Self {
        self.toolchain = toolchain;
        self
    }

    pub fn with_projects(mut self, projects: Arc<dyn ProjectCatalog>) -> Self {
        self.projects = projects;
        self
    }

    pub fn toolchain(&self) -> &dyn Toolchain {
        self.toolchain.as_ref()
    }

    pub fn projects(&self) -> &dyn ProjectCatalog {
        self.projects.as_ref()
    }

    /// On main/master or a release branch
    pub fn is_release_branch(&self) -> bool {
        self.repository.is_on_main_or_master_branch() || self.repository.is_on_release_branch()
    }

    fn resolve(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    pub fn source_dir(&self) -> PathBuf {
        self.resolve(&self.config.source_dir)
    }

    pub fn project_dir(&self) -> PathBuf {
        self.resolve(&self.config.project_dir)
    }

    pub fn tests_dir(&self) -> PathBuf {
        self.resolve(&self.config.tests_dir)
    }

    pub fn artifacts_dir(&self) -> PathBuf {
        self.resolve(&self.config.artifacts_dir)
    }

    pub fn publish_dir(&self) -> PathBuf {
        self.resolve(&self.config.publish_dir)
    }

    pub fn packages_dir(&self) -> PathBuf {
        self.resolve(&self.config.packages_dir)
    }

    pub fn test_results_dir(&self) -> PathBuf {
        self.resolve(&self.config.test_results_dir)
    }

    /// `<packages_dir>/<version>`
    pub fn versioned_packages_dir(&self) -> PathBuf {
        self.packages_dir().join(&self.version)
    }
}

impl fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildContext")
            .field("root", &self.root)
            .field("configuration", &self.configuration)
            .field("is_local_build", &self.is_local_build)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("repository", &self.repository)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}
