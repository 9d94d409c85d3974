//! The standard build: target registry and CI workflow generation

pub mod ci;
pub mod targets;

use crate::core::{BuildConfig, BuildContext, GraphError, SkipBehavior, TargetDefinition, TargetGraph};
use crate::toolchain::{Capability, ProjectCatalog};
use targets::{
    CleanAction, CompileAction, PackAction, PrintAction, PublishAction, PushAction, RestoreAction,
    TestAction,
};

pub const PRINT: &str = "Print";
pub const CLEAN: &str = "Clean";
pub const RESTORE: &str = "Restore";
pub const COMPILE: &str = "Compile";
pub const TEST: &str = "Test";
pub const PACK: &str = "Pack";
pub const PUSH: &str = "Push";
pub const PUBLISH: &str = "Publish";

const SERVER_RELEASE_BUILD: &str = "server build on a release branch";

fn is_server_release_build(ctx: &BuildContext) -> bool {
    !ctx.is_local_build && ctx.is_release_branch()
}

/// The standard targets, in registration order
pub fn standard_targets() -> Vec<TargetDefinition> {
    vec![
        TargetDefinition::new(PRINT)
            .description("Print version and repository information")
            .before([CLEAN])
            .executes(PrintAction),
        TargetDefinition::new(CLEAN)
            .description("Create or clean the artifacts directory")
            .executes(CleanAction),
        TargetDefinition::new(RESTORE)
            .description("Restore packages")
            .after([CLEAN])
            .executes(RestoreAction),
        TargetDefinition::new(COMPILE)
            .description("Build the solution")
            .depends_on([CLEAN, RESTORE, PRINT])
            .after([PRINT])
            .executes(CompileAction),
        TargetDefinition::new(TEST)
            .description("Run tests and collect coverage")
            .depends_on([COMPILE])
            .before([PUBLISH, PACK])
            .executes(TestAction),
        TargetDefinition::new(PACK)
            .description("Pack tool projects")
            .only_when("solution contains a PackAsTool project", |ctx: &BuildContext| {
                ctx.projects().any_with_capability(Capability::PackAsTool)
            })
            .requires(SERVER_RELEASE_BUILD, is_server_release_build)
            .when_skipped(SkipBehavior::Skip)
            .after([TEST])
            .depends_on([COMPILE])
            .executes(PackAction),
        TargetDefinition::new(PUSH)
            .description("Push the package to the feed")
            .executes(PushAction),
        TargetDefinition::new(PUBLISH)
            .description("Publish the main project and zip it")
            .requires(SERVER_RELEASE_BUILD, is_server_release_build)
            .when_skipped(SkipBehavior::Skip)
            .depends_on([COMPILE])
            .executes(PublishAction),
    ]
}

/// Register the standard targets with the configured default goal
pub fn standard_graph(config: &BuildConfig) -> Result<TargetGraph, GraphError> {
    TargetGraph::register(standard_targets())?.with_default_target(&config.default_target)
}
