//! Actions behind the standard targets

use crate::artifacts::{create_or_clean_dir, zip_dir};
use crate::core::{ActionError, ActionOutput, BuildContext, TargetAction};
use crate::toolchain::{Capability, ProjectCatalog};
use async_trait::async_trait;
use tracing::info;

/// Logs the version and repository facts the build runs with
pub struct PrintAction;

#[async_trait]
impl TargetAction for PrintAction {
    async fn run(&self, ctx: &BuildContext) -> Result<ActionOutput, ActionError> {
        let repo = &ctx.repository;
        let show = |value: Option<&str>| value.unwrap_or("<none>").to_string();

        info!("Version = {}", ctx.version);
        info!("Commit = {}", show(repo.commit.as_deref()));
        info!("Branch = {}", show(repo.branch.as_deref()));
        info!("Tags = [{}]", repo.tags.join(", "));

        info!("main branch = {}", repo.is_on_main_branch());
        info!("main/master branch = {}", repo.is_on_main_or_master_branch());
        info!("release/* branch = {}", repo.is_on_release_branch());
        info!("hotfix/* branch = {}", repo.is_on_hotfix_branch());
        info!("feature/* branch = {}", repo.is_on_feature_branch());

        info!("Https URL = {}", show(repo.https_url().as_deref()));
        info!("SSH URL = {}", show(repo.ssh_url().as_deref()));

        Ok(ActionOutput::new().with_message(format!("version {}", ctx.version)))
    }
}

pub struct CleanAction;

#[async_trait]
impl TargetAction for CleanAction {
    async fn run(&self, ctx: &BuildContext) -> Result<ActionOutput, ActionError> {
        let dir = ctx.artifacts_dir();
        create_or_clean_dir(&dir)?;
        Ok(ActionOutput::new().with_artifact(dir))
    }
}

pub struct RestoreAction;

#[async_trait]
impl TargetAction for RestoreAction {
    async fn run(&self, ctx: &BuildContext) -> Result<ActionOutput, ActionError> {
        ctx.toolchain().restore().await?;
        Ok(ActionOutput::new())
    }
}

pub struct CompileAction;

#[async_trait]
impl TargetAction for CompileAction {
    async fn run(&self, ctx: &BuildContext) -> Result<ActionOutput, ActionError> {
        info!("Building version {} ({})", ctx.version, ctx.configuration);
        ctx.toolchain().build(ctx.configuration).await?;
        Ok(ActionOutput::new().with_message(format!("{} build", ctx.configuration)))
    }
}

/// Runs the test suites into a fresh results directory
pub struct TestAction;

#[async_trait]
impl TargetAction for TestAction {
    async fn run(&self, ctx: &BuildContext) -> Result<ActionOutput, ActionError> {
        info!("Tests: {}", ctx.tests_dir().display());

        let results_dir = ctx.test_results_dir();
        create_or_clean_dir(&results_dir)?;

        let report = ctx.toolchain().test(ctx.configuration, &results_dir).await?;
        let output = ActionOutput::new().with_artifact(results_dir);
        Ok(match report {
            Some(report) => output.with_artifact(report),
            None => output.with_message("no coverage collected"),
        })
    }
}

/// Packs every project marked as a tool into `<packages>/<version>`
pub struct PackAction;

#[async_trait]
impl TargetAction for PackAction {
    async fn run(&self, ctx: &BuildContext) -> Result<ActionOutput, ActionError> {
        let tools = ctx.projects().projects_with_capability(Capability::PackAsTool);
        if tools.is_empty() {
            return Err(ActionError::Missing("project with PackAsTool=true".to_string()));
        }

        let output_dir = ctx.versioned_packages_dir();
        let mut output = ActionOutput::new();
        for project in tools {
            info!("Packing {}", project.name);
            let packed = ctx
                .toolchain()
                .pack(&project.path, ctx.configuration, &output_dir)
                .await?;
            output = output.with_artifact(packed);
        }
        Ok(output)
    }
}

/// Pushes the versioned package to the configured feed
pub struct PushAction;

#[async_trait]
impl TargetAction for PushAction {
    async fn run(&self, ctx: &BuildContext) -> Result<ActionOutput, ActionError> {
        let api_key = ctx
            .api_key
            .as_deref()
            .ok_or_else(|| ActionError::Missing("NuGet API key".to_string()))?;

        let package = ctx
            .versioned_packages_dir()
            .join(format!("{}.{}.nupkg", ctx.config.package_id, ctx.version));
        if !package.is_file() {
            return Err(ActionError::Missing(format!("package {}", package.display())));
        }

        info!("Pushing {} to {}", package.display(), ctx.config.feed_url);
        ctx.toolchain()
            .push(&package, api_key, &ctx.config.feed_url)
            .await?;
        Ok(ActionOutput::new().with_artifact(package))
    }
}

/// Publishes the main project and zips the output next to the packages
pub struct PublishAction;

#[async_trait]
impl TargetAction for PublishAction {
    async fn run(&self, ctx: &BuildContext) -> Result<ActionOutput, ActionError> {
        let publish_dir = ctx.publish_dir();
        create_or_clean_dir(&publish_dir)?;

        ctx.toolchain()
            .publish(&ctx.project_dir(), ctx.configuration, &publish_dir)
            .await?;

        let archive = ctx
            .versioned_packages_dir()
            .join(format!("{}.zip", ctx.config.solution));
        let archive = zip_dir(&publish_dir, &archive)?;
        Ok(ActionOutput::new().with_artifact(publish_dir).with_artifact(archive))
    }
}
