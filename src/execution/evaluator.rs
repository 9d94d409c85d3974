//! Condition evaluator - decides whether a target runs, skips or aborts

use crate::core::{BuildContext, SkipBehavior, TargetDefinition};
use tracing::debug;

/// Outcome of evaluating a target's guard conditions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Run,
    Skip { reason: String },
    Abort { reason: String },
}

/// Stateless evaluator for `only_when` and `requires` guards
///
/// Predicates may read external state through the context, but evaluation
/// itself never mutates anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate a target's guards against the context
    pub fn evaluate(&self, target: &TargetDefinition, ctx: &BuildContext) -> Decision {
        if let Some(condition) = &target.only_when {
            if !condition.holds(ctx) {
                debug!("{}: only-when '{}' is false", target.name, condition.description);
                return Decision::Skip {
                    reason: format!("condition '{}' is false", condition.description),
                };
            }
        }

        for requirement in &target.requirements {
            if !requirement.holds(ctx) {
                debug!("{}: requirement '{}' failed", target.name, requirement.description);
                let reason = format!("requirement '{}' not met", requirement.description);
                return match target.skip_behavior {
                    SkipBehavior::Skip => Decision::Skip { reason },
                    SkipBehavior::Fail => Decision::Abort { reason },
                };
            }
        }

        Decision::Run
    }
}
