//! Target domain model

use crate::artifacts::ArtifactError;
use crate::core::context::BuildContext;
use crate::toolchain::ToolError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Error raised by a target action
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error("Missing {0}")]
    Missing(String),

    #[error("{0}")]
    Message(String),
}

/// What a target produced when it executed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutput {
    /// Files or directories produced by the action
    #[serde(default)]
    pub artifacts: Vec<PathBuf>,

    /// Optional short summary for the run report
    #[serde(default)]
    pub message: Option<String>,
}

impl ActionOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_artifact(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifacts.push(path.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// The side-effecting part of a target
///
/// The engine treats an action as an opaque call with a success/failure
/// outcome; everything observable happens inside it.
#[async_trait]
pub trait TargetAction: Send + Sync {
    async fn run(&self, ctx: &BuildContext) -> Result<ActionOutput, ActionError>;
}

/// Adapter turning a synchronous closure into a [`TargetAction`]
pub struct FnAction<F>(F);

#[async_trait]
impl<F> TargetAction for FnAction<F>
where
    F: Fn(&BuildContext) -> Result<ActionOutput, ActionError> + Send + Sync,
{
    async fn run(&self, ctx: &BuildContext) -> Result<ActionOutput, ActionError> {
        (self.0)(ctx)
    }
}

struct NoopAction;

#[async_trait]
impl TargetAction for NoopAction {
    async fn run(&self, _ctx: &BuildContext) -> Result<ActionOutput, ActionError> {
        Ok(ActionOutput::default())
    }
}

/// Predicate over the build context
pub type Predicate = Arc<dyn Fn(&BuildContext) -> bool + Send + Sync>;

/// A named guard condition
///
/// The description is what shows up in skip/abort reasons, so write it the
/// way you'd want to read it in a failed build log.
#[derive(Clone)]
pub struct Condition {
    pub description: String,
    check: Predicate,
}

impl Condition {
    pub fn new<F>(description: impl Into<String>, check: F) -> Self
    where
        F: Fn(&BuildContext) -> bool + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            check: Arc::new(check),
        }
    }

    /// Evaluate the predicate against the context
    pub fn holds(&self, ctx: &BuildContext) -> bool {
        (self.check)(ctx)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Condition").field(&self.description).finish()
    }
}

/// What happens downstream when a target is skipped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkipBehavior {
    /// A failed requirement aborts the run; dependents are evaluated on their own
    #[default]
    Fail,
    /// Skip this target and everything that depends on it
    Skip,
}

/// A single named build step with its constraints, guards and action
#[derive(Clone)]
pub struct TargetDefinition {
    /// Unique target name
    pub name: String,

    /// Optional one-line description for listings
    pub description: Option<String>,

    /// Targets that must be evaluated before this one (hard dependencies)
    pub depends_on: Vec<String>,

    /// Targets this one must precede when both are scheduled
    pub before: Vec<String>,

    /// Targets this one must follow when both are scheduled
    pub after: Vec<String>,

    /// Requirements checked in declaration order
    pub requirements: Vec<Condition>,

    /// Skip the target when this evaluates false
    pub only_when: Option<Condition>,

    pub skip_behavior: SkipBehavior,

    /// Keep evaluating later targets if this target's action fails
    pub proceed_after_failure: bool,

    action: Arc<dyn TargetAction>,
}

impl TargetDefinition {
    /// Start a target definition with no relations and a no-op action
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            depends_on: Vec::new(),
            before: Vec::new(),
            after: Vec::new(),
            requirements: Vec::new(),
            only_when: None,
            skip_behavior: SkipBehavior::default(),
            proceed_after_failure: false,
            action: Arc::new(NoopAction),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn depends_on<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend_unique(&mut self.depends_on, targets);
        self
    }

    pub fn before<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend_unique(&mut self.before, targets);
        self
    }

    pub fn after<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend_unique(&mut self.after, targets);
        self
    }

    pub fn requires<F>(mut self, description: impl Into<String>, check: F) -> Self
    where
        F: Fn(&BuildContext) -> bool + Send + Sync + 'static,
    {
        self.requirements.push(Condition::new(description, check));
        self
    }

    pub fn only_when<F>(mut self, description: impl Into<String>, check: F) -> Self
    where
        F: Fn(&BuildContext) -> bool + Send + Sync + 'static,
    {
        self.only_when = Some(Condition::new(description, check));
        self
    }

    pub fn when_skipped(mut self, behavior: SkipBehavior) -> Self {
        self.skip_behavior = behavior;
        self
    }

    pub fn proceed_after_failure(mut self) -> Self {
        self.proceed_after_failure = true;
        self
    }

    pub fn executes<A: TargetAction + 'static>(mut self, action: A) -> Self {
        self.action = Arc::new(action);
        self
    }

    pub fn executes_fn<F>(self, f: F) -> Self
    where
        F: Fn(&BuildContext) -> Result<ActionOutput, ActionError> + Send + Sync + 'static,
    {
        self.executes(FnAction(f))
    }

    pub fn action(&self) -> &dyn TargetAction {
        self.action.as_ref()
    }
}

impl fmt::Debug for TargetDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetDefinition")
            .field("name", &self.name)
            .field("depends_on", &self.depends_on)
            .field("before", &self.before)
            .field("after", &self.after)
            .field("requirements", &self.requirements)
            .field("only_when", &self.only_when)
            .field("skip_behavior", &self.skip_behavior)
            .field("proceed_after_failure", &self.proceed_after_failure)
            .finish_non_exhaustive()
    }
}

fn extend_unique<I, S>(list: &mut Vec<String>, items: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    for item in items {
        let item = item.into();
        if !list.contains(&item) {
            list.push(item);
        }
    }
}
