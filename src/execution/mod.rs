//! Build execution: scheduling, guard evaluation and the run engine

pub mod engine;
pub mod evaluator;
pub mod scheduler;

pub use engine::{EventHandler, ExecutionEngine, ExecutionEvent};
pub use evaluator::{ConditionEvaluator, Decision};
pub use scheduler::{resolve_order, ExecutionPlan, ExecutionScheduler, SchedulingError};
