// ABOUTME: Error types for the task graph engine
// ABOUTME: Separates construction-time graph errors from run-time task failures

use thiserror::Error;

use crate::gateway::GatewayError;

/// Errors raised while building or validating a task graph. These are fatal
/// at construction and can never occur during a run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("duplicate task name: {name}")]
    DuplicateTask { name: String },

    #[error("task '{task}' depends on unknown task '{upstream}'")]
    UnknownUpstream { task: String, upstream: String },

    #[error("cycle detected involving task '{task}'")]
    CycleDetected { task: String },

    #[error("graph contains no tasks")]
    Empty,

    #[error("graph has no entry task - every task has upstreams")]
    NoSource,

    #[error("graph has multiple entry tasks: {names:?}")]
    MultipleSources { names: Vec<String> },

    #[error("graph has no terminal task - every task has downstreams")]
    NoSink,

    #[error("graph has multiple terminal tasks: {names:?}")]
    MultipleSinks { names: Vec<String> },

    #[error("task '{name}' is not reachable from the entry task")]
    Unreachable { name: String },

    #[error("task '{name}' does not reach the terminal task")]
    DeadEnd { name: String },
}

/// A single task attempt's failure. Both variants consume the task's retry
/// budget; the underlying gateway cause is preserved in the diagnostic.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("{reason}")]
    Failed { reason: String },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl TaskError {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }
}
