//! Execution state models

use crate::core::target::ActionOutput;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Overall run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Run has not started
    Pending,
    /// Run is in progress
    Running,
    /// Every touched target succeeded or was skipped
    Completed,
    /// A target failed or the run was aborted
    Failed,
}

/// State of a single target within a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TargetStatus {
    /// Not evaluated yet
    Pending,
    /// Action ran and succeeded
    Succeeded {
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        output: ActionOutput,
    },
    /// Action ran and failed
    Failed {
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        error: String,
        /// Whether the run kept going afterwards
        proceeded: bool,
    },
    /// Guard condition or a skipped dependency prevented the action from running
    Skipped { reason: String, at: DateTime<Utc> },
    /// Never reached because the run halted
    Aborted { reason: String, at: DateTime<Utc> },
}

impl TargetStatus {
    /// Check if the target is in a terminal state
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TargetStatus::Pending)
    }

    /// Succeeded and Skipped both count as a good outcome for the run
    pub fn is_ok(&self) -> bool {
        matches!(
            self,
            TargetStatus::Succeeded { .. } | TargetStatus::Skipped { .. }
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            TargetStatus::Pending => "pending",
            TargetStatus::Succeeded { .. } => "succeeded",
            TargetStatus::Failed { .. } => "failed",
            TargetStatus::Skipped { .. } => "skipped",
            TargetStatus::Aborted { .. } => "aborted",
        }
    }

    /// Wall-clock time the action took, if it ran
    pub fn duration(&self) -> Option<std::time::Duration> {
        match self {
            TargetStatus::Succeeded {
                started_at,
                finished_at,
                ..
            }
            | TargetStatus::Failed {
                started_at,
                finished_at,
                ..
            } => finished_at.signed_duration_since(*started_at).to_std().ok(),
            _ => None,
        }
    }
}

/// Per-target entry of a run report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRecord {
    pub name: String,
    pub status: TargetStatus,
}

/// Why a run was aborted by a requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbortInfo {
    pub target: String,
    pub requirement: String,
}

/// Aggregate result of one engine invocation
///
/// Created fresh per run. The engine hands it out only after the run has
/// finished, so callers never observe it changing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Unique execution ID
    pub execution_id: Uuid,

    /// Goals the run was started with
    pub goals: Vec<String>,

    pub status: ExecutionStatus,

    pub started_at: DateTime<Utc>,

    pub finished_at: Option<DateTime<Utc>>,

    /// One record per scheduled target, in execution order
    pub targets: Vec<TargetRecord>,

    /// Set when a failed requirement aborted the run
    pub abort: Option<AbortInfo>,
}

impl RunResult {
    /// Create a pending result for the given order of targets
    pub fn new(goals: &[String], order: &[String]) -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            goals: goals.to_vec(),
            status: ExecutionStatus::Pending,
            started_at: Utc::now(),
            finished_at: None,
            targets: order
                .iter()
                .map(|name| TargetRecord {
                    name: name.clone(),
                    status: TargetStatus::Pending,
                })
                .collect(),
            abort: None,
        }
    }

    pub(crate) fn start(&mut self) {
        self.status = ExecutionStatus::Running;
        self.started_at = Utc::now();
    }

    pub(crate) fn set_status(&mut self, name: &str, status: TargetStatus) {
        if let Some(record) = self.targets.iter_mut().find(|r| r.name == name) {
            record.status = status;
        }
    }

    /// Compute the overall status once every target is terminal
    pub(crate) fn finish(&mut self) {
        let ok = self.abort.is_none() && self.targets.iter().all(|r| r.status.is_ok());
        self.status = if ok {
            ExecutionStatus::Completed
        } else {
            ExecutionStatus::Failed
        };
        self.finished_at = Some(Utc::now());
    }

    /// Look up a target's record
    pub fn record(&self, name: &str) -> Option<&TargetRecord> {
        self.targets.iter().find(|r| r.name == name)
    }

    pub fn status_of(&self, name: &str) -> Option<&TargetStatus> {
        self.record(name).map(|r| &r.status)
    }

    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Completed
    }

    /// Process exit code for the run
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    /// Names of targets whose action actually ran, in order
    pub fn executed(&self) -> Vec<&str> {
        self.targets
            .iter()
            .filter(|r| {
                matches!(
                    r.status,
                    TargetStatus::Succeeded { .. } | TargetStatus::Failed { .. }
                )
            })
            .map(|r| r.name.as_str())
            .collect()
    }

    /// Count of targets currently in the given state
    pub fn count(&self, label: &str) -> usize {
        self.targets
            .iter()
            .filter(|r| r.status.label() == label)
            .count()
    }

    /// Artifacts produced by successful targets
    pub fn artifacts(&self) -> Vec<&PathBuf> {
        self.targets
            .iter()
            .filter_map(|r| match &r.status {
                TargetStatus::Succeeded { output, .. } => Some(output.artifacts.iter()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    pub fn duration(&self) -> Option<std::time::Duration> {
        self.finished_at
            .and_then(|end| end.signed_duration_since(self.started_at).to_std().ok())
    }
}
