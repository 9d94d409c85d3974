//! Toolchain collaborator - restores, compiles, tests, packs and publishes

pub mod project;
pub mod runner;

use crate::artifacts::find_file;
use crate::core::Configuration;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub use project::{Capability, ManifestCatalog, ProjectCatalog, ProjectInfo};
pub use runner::{CommandOutput, CommandRunner, ToolError};

/// File the coverage collector writes into the results directory
pub const COVERAGE_FILE: &str = "coverage.cobertura.xml";

const COVERAGE_SEARCH_DEPTH: usize = 2;

const COVERAGE_EXCLUDED_ATTRIBUTES: &str =
    "Obsolete,GeneratedCodeAttribute,CompilerGeneratedAttribute";

/// Trait for toolchain execution - allows for different implementations
#[async_trait]
pub trait Toolchain: Send + Sync {
    async fn restore(&self) -> Result<(), ToolError>;

    async fn build(&self, configuration: Configuration) -> Result<(), ToolError>;

    /// Run the test suites; returns the coverage report directory when
    /// coverage was collected
    async fn test(
        &self,
        configuration: Configuration,
        results_dir: &Path,
    ) -> Result<Option<PathBuf>, ToolError>;

    /// Pack a project into `output_dir`; returns the directory holding the package
    async fn pack(
        &self,
        project: &Path,
        configuration: Configuration,
        output_dir: &Path,
    ) -> Result<PathBuf, ToolError>;

    /// Publish a project into `output_dir`; returns the output path
    async fn publish(
        &self,
        project: &Path,
        configuration: Configuration,
        output_dir: &Path,
    ) -> Result<PathBuf, ToolError>;

    async fn push(&self, package: &Path, api_key: &str, feed_url: &str) -> Result<(), ToolError>;
}

/// Toolchain backed by the `dotnet` CLI
#[derive(Debug, Clone)]
pub struct DotnetToolchain {
    /// Directory holding the solution; also the working directory
    solution_dir: PathBuf,
    runner: CommandRunner,
    dotnet: String,
    report_generator: String,
}

impl DotnetToolchain {
    pub fn new(solution_dir: impl Into<PathBuf>, timeout_secs: u64) -> Self {
        let solution_dir = solution_dir.into();
        Self {
            runner: CommandRunner::new(solution_dir.clone(), timeout_secs),
            solution_dir,
            dotnet: "dotnet".to_string(),
            report_generator: "reportgenerator".to_string(),
        }
    }

    /// Use a different `dotnet` executable
    pub fn with_dotnet(mut self, path: impl Into<String>) -> Self {
        self.dotnet = path.into();
        self
    }

    pub fn with_report_generator(mut self, path: impl Into<String>) -> Self {
        self.report_generator = path.into();
        self
    }

    pub fn solution_dir(&self) -> &Path {
        &self.solution_dir
    }

    async fn dotnet(&self, args: Vec<String>) -> Result<CommandOutput, ToolError> {
        self.runner.run(&self.dotnet, &args).await
    }
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

/// Arguments shared by every step that consumes a prior build
fn no_rebuild_args(configuration: Configuration) -> Vec<String> {
    vec![
        "--nologo".into(),
        "--no-build".into(),
        "--no-restore".into(),
        "--configuration".into(),
        configuration.to_string(),
    ]
}

#[async_trait]
impl Toolchain for DotnetToolchain {
    async fn restore(&self) -> Result<(), ToolError> {
        self.dotnet(vec![
            "restore".into(),
            path_arg(&self.solution_dir),
            "--force".into(),
        ])
        .await?;
        Ok(())
    }

    async fn build(&self, configuration: Configuration) -> Result<(), ToolError> {
        self.dotnet(vec![
            "build".into(),
            path_arg(&self.solution_dir),
            "--nologo".into(),
            "--no-restore".into(),
            "--configuration".into(),
            configuration.to_string(),
        ])
        .await?;
        Ok(())
    }

    async fn test(
        &self,
        configuration: Configuration,
        results_dir: &Path,
    ) -> Result<Option<PathBuf>, ToolError> {
        let mut args = vec!["test".into(), path_arg(&self.solution_dir)];
        args.extend(no_rebuild_args(configuration));
        args.extend([
            "--collect".into(),
            "XPlat Code Coverage".into(),
            "--results-directory".into(),
            path_arg(results_dir),
            "--".into(),
            format!(
                "DataCollectionRunSettings.DataCollectors.DataCollector.Configuration.ExcludeByAttribute={}",
                COVERAGE_EXCLUDED_ATTRIBUTES
            ),
        ]);
        self.dotnet(args).await?;

        let Some(coverage) = find_file(results_dir, COVERAGE_FILE, COVERAGE_SEARCH_DEPTH) else {
            debug!("No coverage file under {}", results_dir.display());
            return Ok(None);
        };

        let report_dir = results_dir.join("coveragereport");
        info!("Generating coverage report from {}", coverage.display());
        self.runner
            .run(
                &self.report_generator,
                &[
                    format!("-reports:{}", coverage.display()),
                    format!("-targetdir:{}", report_dir.display()),
                ],
            )
            .await?;
        Ok(Some(report_dir))
    }

    async fn pack(
        &self,
        project: &Path,
        configuration: Configuration,
        output_dir: &Path,
    ) -> Result<PathBuf, ToolError> {
        let mut args = vec!["pack".into(), path_arg(project)];
        args.extend(no_rebuild_args(configuration));
        args.extend(["--output".into(), path_arg(output_dir)]);
        self.dotnet(args).await?;
        Ok(output_dir.to_path_buf())
    }

    async fn publish(
        &self,
        project: &Path,
        configuration: Configuration,
        output_dir: &Path,
    ) -> Result<PathBuf, ToolError> {
        let mut args = vec!["publish".into(), path_arg(project)];
        args.extend(no_rebuild_args(configuration));
        args.extend(["--output".into(), path_arg(output_dir)]);
        self.dotnet(args).await?;
        Ok(output_dir.to_path_buf())
    }

    async fn push(&self, package: &Path, api_key: &str, feed_url: &str) -> Result<(), ToolError> {
        let args = vec![
            "nuget".into(),
            "push".into(),
            path_arg(package),
            "--api-key".into(),
            api_key.to_string(),
            "--source".into(),
            feed_url.to_string(),
        ];
        self.runner.run_masked(&self.dotnet, &args, Some(api_key)).await?;
        Ok(())
    }
}
