// ABOUTME: Transform job runner gateway for submitting and awaiting batch jobs
// ABOUTME: The transform body is external; the orchestrator only submits and waits

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::GatewayError;

/// Specification of one batch transform job. The script referenced by
/// `script_location` owns the input/output schema contract; the orchestrator
/// never interprets it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSpec {
    pub job_name: String,
    pub script_location: String,
    pub worker_type: String,
    pub worker_count: u32,
    #[serde(default)]
    pub arguments: HashMap<String, String>,
}

/// Handle to a submitted job run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub job_name: String,
    pub run_id: String,
}

/// Terminal state of a job run. A hung job is bounded by the owning task's
/// timeout rather than a runner-level deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Succeeded,
    Failed { reason: String },
}

/// Narrow interface over the batch compute service.
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn submit(&self, spec: &JobSpec) -> Result<JobHandle, GatewayError>;

    async fn await_completion(&self, handle: &JobHandle) -> Result<JobState, GatewayError>;
}
