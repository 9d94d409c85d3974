//! buildgraph - a declarative build-target orchestrator

pub mod artifacts;
pub mod build;
pub mod cli;
pub mod core;
pub mod execution;
pub mod toolchain;
pub mod vcs;

// Re-export commonly used types
pub use core::{
    ActionError, ActionOutput, BuildConfig, BuildContext, Configuration, ExecutionStatus,
    GraphError, RunResult, SkipBehavior, TargetAction, TargetDefinition, TargetGraph,
    TargetStatus,
};
pub use execution::{ExecutionEngine, ExecutionEvent, ExecutionPlan, SchedulingError};
pub use toolchain::{Toolchain, ToolError};
pub use vcs::RepositoryInfo;
