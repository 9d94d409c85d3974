//! Core domain models
//!
//! This module defines the fundamental data structures that represent
//! targets, the validated target graph, the build context and run results.

pub mod config;
pub mod context;
pub mod graph;
pub mod state;
pub mod target;

pub use config::{BuildConfig, WorkflowConfig};
pub use context::{BuildContext, Configuration};
pub use graph::{GraphError, Relation, TargetGraph};
pub use state::{AbortInfo, ExecutionStatus, RunResult, TargetRecord, TargetStatus};
pub use target::{ActionError, ActionOutput, Condition, SkipBehavior, TargetAction, TargetDefinition};
