//! Main execution engine - runs a resolved plan target by target

use crate::{
    core::{AbortInfo, BuildContext, ExecutionStatus, RunResult, SkipBehavior, TargetGraph, TargetStatus},
    execution::{ConditionEvaluator, Decision, ExecutionPlan, ExecutionScheduler, SchedulingError},
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Events that can occur during a run
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted {
        execution_id: Uuid,
        goals: Vec<String>,
        total: usize,
    },
    TargetStarted {
        name: String,
        position: usize,
        total: usize,
    },
    TargetSucceeded {
        name: String,
        duration: Duration,
    },
    TargetFailed {
        name: String,
        error: String,
        proceeding: bool,
    },
    TargetSkipped {
        name: String,
        reason: String,
    },
    TargetAborted {
        name: String,
        reason: String,
    },
    RunFinished {
        execution_id: Uuid,
        status: ExecutionStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(&ExecutionEvent) + Send + Sync>;

/// Sequential execution engine over a validated target graph
///
/// Targets run strictly one at a time in plan order; an action must reach
/// a terminal state before the next target is evaluated.
pub struct ExecutionEngine {
    graph: Arc<TargetGraph>,
    evaluator: ConditionEvaluator,
    event_handlers: Vec<EventHandler>,
}

impl ExecutionEngine {
    pub fn new(graph: Arc<TargetGraph>) -> Self {
        Self {
            graph,
            evaluator: ConditionEvaluator::new(),
            event_handlers: Vec::new(),
        }
    }

    pub fn graph(&self) -> &TargetGraph {
        &self.graph
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(&ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
    }

    fn emit_event(&self, event: ExecutionEvent) {
        for handler in &self.event_handlers {
            handler(&event);
        }
    }

    /// Resolve goals against the engine's graph
    pub fn plan<S: AsRef<str>>(&self, goals: &[S]) -> Result<ExecutionPlan, SchedulingError> {
        ExecutionScheduler::new(&self.graph).resolve_order(goals)
    }

    /// Resolve and execute in one go; scheduling errors abort before anything runs
    pub async fn run<S: AsRef<str>>(
        &self,
        goals: &[S],
        ctx: &BuildContext,
    ) -> Result<RunResult, SchedulingError> {
        let plan = self.plan(goals)?;
        Ok(self.execute(&plan, ctx).await)
    }

    /// Execute a resolved plan
    pub async fn execute(&self, plan: &ExecutionPlan, ctx: &BuildContext) -> RunResult {
        let mut result = RunResult::new(&plan.goals, &plan.order);
        result.start();
        let execution_id = result.execution_id;
        let total = plan.len();

        info!("Starting build {:?} ({} targets, {})", plan.goals, total, execution_id);
        self.emit_event(ExecutionEvent::RunStarted {
            execution_id,
            goals: plan.goals.clone(),
            total,
        });

        // target -> the skipped dependency that forces it to skip
        let mut forced_skips: HashMap<String, String> = HashMap::new();
        let mut halted: Option<String> = None;

        for (position, name) in plan.order.iter().enumerate() {
            if let Some(reason) = &halted {
                self.mark_aborted(&mut result, name, reason.clone());
                continue;
            }

            let Some(target) = self.graph.target(name) else {
                let reason = format!("target '{}' is not registered", name);
                error!("{}", reason);
                self.mark_aborted(&mut result, name, reason);
                halted = Some(format!("run halted at unknown target '{}'", name));
                continue;
            };

            if let Some(cause) = forced_skips.get(name) {
                let reason = format!("dependency '{}' was skipped", cause);
                self.mark_skipped(&mut result, name, reason);
                continue;
            }

            match self.evaluator.evaluate(target, ctx) {
                Decision::Skip { reason } => {
                    self.mark_skipped(&mut result, name, reason);
                    if target.skip_behavior == SkipBehavior::Skip {
                        for dependent in self.graph.transitive_dependents(name) {
                            forced_skips
                                .entry(dependent.to_string())
                                .or_insert_with(|| name.clone());
                        }
                    }
                }
                Decision::Abort { reason } => {
                    error!("{}: {}; aborting run", name, reason);
                    result.abort = Some(AbortInfo {
                        target: name.clone(),
                        requirement: reason.clone(),
                    });
                    self.mark_aborted(&mut result, name, reason);
                    halted = Some(format!("run aborted by '{}'", name));
                }
                Decision::Run => {
                    self.emit_event(ExecutionEvent::TargetStarted {
                        name: name.clone(),
                        position: position + 1,
                        total,
                    });
                    info!("Executing target: {}", name);

                    let started_at = Utc::now();
                    let outcome = target.action().run(ctx).await;
                    let finished_at = Utc::now();

                    match outcome {
                        Ok(output) => {
                            let status = TargetStatus::Succeeded {
                                started_at,
                                finished_at,
                                output,
                            };
                            let duration = status.duration().unwrap_or_default();
                            result.set_status(name, status);
                            self.emit_event(ExecutionEvent::TargetSucceeded {
                                name: name.clone(),
                                duration,
                            });
                        }
                        Err(err) => {
                            let proceeding = target.proceed_after_failure;
                            let message = err.to_string();
                            if proceeding {
                                warn!("Target {} failed, proceeding: {}", name, message);
                            } else {
                                error!("Target {} failed: {}", name, message);
                                halted = Some(format!("target '{}' failed", name));
                            }
                            result.set_status(
                                name,
                                TargetStatus::Failed {
                                    started_at,
                                    finished_at,
                                    error: message.clone(),
                                    proceeded: proceeding,
                                },
                            );
                            self.emit_event(ExecutionEvent::TargetFailed {
                                name: name.clone(),
                                error: message,
                                proceeding,
                            });
                        }
                    }
                }
            }
        }

        result.finish();
        info!("Build finished: {:?} ({})", result.status, execution_id);
        self.emit_event(ExecutionEvent::RunFinished {
            execution_id,
            status: result.status,
        });

        result
    }

    fn mark_skipped(&self, result: &mut RunResult, name: &str, reason: String) {
        warn!("Skipping target {}: {}", name, reason);
        result.set_status(
            name,
            TargetStatus::Skipped {
                reason: reason.clone(),
                at: Utc::now(),
            },
        );
        self.emit_event(ExecutionEvent::TargetSkipped {
            name: name.to_string(),
            reason,
        });
    }

    fn mark_aborted(&self, result: &mut RunResult, name: &str, reason: String) {
        result.set_status(
            name,
            TargetStatus::Aborted {
                reason: reason.clone(),
                at: Utc::now(),
            },
        );
        self.emit_event(ExecutionEvent::TargetAborted {
            name: name.to_string(),
            reason,
        });
    }
}
