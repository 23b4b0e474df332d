// ABOUTME: Run attempt audit trail and terminal run outcome types
// ABOUTME: Everything here is created fresh per invocation and immutable after the run ends

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome of one task execution attempt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AttemptOutcome {
    Success,
    Failure,
    Timeout,
}

/// One entry in the append-only audit trail. Attempt numbers start at 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunAttempt {
    pub task: String,
    pub attempt: u32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub outcome: AttemptOutcome,
    pub diagnostic: Option<String>,
}

/// Terminal status of a task within one run. `Cancelled` means the task was
/// never started because an earlier task failed; it is distinct from `Failed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Success,
    Failed,
    Timeout,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TaskStatus::Pending | TaskStatus::Running)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Success => "success",
            TaskStatus::Failed => "failed",
            TaskStatus::Timeout => "timeout",
            TaskStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// Overall result of one pipeline invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RunOutcome {
    Success,
    Failed { task: String, reason: String },
    TimedOut { task: String },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success)
    }

    /// Process exit code mapping: 0 success, 2 failed, 3 timed out. Operator
    /// interrupt maps to 130 at the CLI layer, not here.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::Success => 0,
            RunOutcome::Failed { .. } => 2,
            RunOutcome::TimedOut { .. } => 3,
        }
    }
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunOutcome::Success => write!(f, "success"),
            RunOutcome::Failed { task, reason } => {
                write!(f, "failed at '{task}': {reason}")
            }
            RunOutcome::TimedOut { task } => write!(f, "timed out at '{task}'"),
        }
    }
}

/// Full record of one run: outcome, final per-task statuses in registration
/// order, and the complete attempt audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub pipeline: String,
    pub run_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration: Duration,
    pub outcome: RunOutcome,
    pub statuses: IndexMap<String, TaskStatus>,
    pub attempts: Vec<RunAttempt>,
}

impl RunReport {
    pub fn status(&self, task: &str) -> Option<TaskStatus> {
        self.statuses.get(task).copied()
    }

    pub fn attempts_for(&self, task: &str) -> Vec<&RunAttempt> {
        self.attempts.iter().filter(|a| a.task == task).collect()
    }

    pub fn count_with_status(&self, status: TaskStatus) -> usize {
        self.statuses.values().filter(|s| **s == status).count()
    }

    /// Diagnostic from the last recorded attempt of a task, if any.
    pub fn last_diagnostic(&self, task: &str) -> Option<&str> {
        self.attempts
            .iter()
            .rev()
            .find(|a| a.task == task)
            .and_then(|a| a.diagnostic.as_deref())
    }
}
