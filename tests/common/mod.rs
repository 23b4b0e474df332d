// ABOUTME: Common utilities and helpers for integration tests
// ABOUTME: Scripted task actions and seeded in-memory pipeline environments

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use landfall::engine::{ActionResult, RunContext, TaskAction, TaskError};
use landfall::gateway::{
    default_curated_columns, MemoryCatalog, MemoryJobRunner, MemoryObjectStore, SAMPLE_RAW_CSV,
};
use landfall::pipeline::{Gateways, PipelineConfig};

/// Action that fails a fixed number of times before succeeding, recording
/// how often it was invoked.
pub struct ScriptedAction {
    failures_before_success: u32,
    delay: Option<Duration>,
    calls: AtomicU32,
}

impl ScriptedAction {
    pub fn succeeding() -> Self {
        Self::failing_times(0)
    }

    pub fn failing_times(failures_before_success: u32) -> Self {
        Self {
            failures_before_success,
            delay: None,
            calls: AtomicU32::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskAction for ScriptedAction {
    async fn run(&self, _ctx: &RunContext) -> ActionResult {
        if let Some(delay) = self.delay {
            sleep(delay).await;
        }
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures_before_success {
            Err(TaskError::failed(format!("induced failure {call}")))
        } else {
            Ok(Some(format!("succeeded on call {call}")))
        }
    }
}

/// In-memory pipeline environment with handles to every gateway.
pub struct OfflineEnv {
    pub gateways: Gateways,
    pub store: Arc<MemoryObjectStore>,
    pub catalog: Arc<MemoryCatalog>,
    pub jobs: Arc<MemoryJobRunner>,
}

/// Build an environment whose transform writes the given curated columns.
/// The raw landing object is not seeded; call [`seed_raw`] for that.
pub fn offline_env_with_columns(config: &PipelineConfig, columns: Vec<String>) -> OfflineEnv {
    let store = Arc::new(MemoryObjectStore::new());
    let catalog = Arc::new(MemoryCatalog::new(Arc::clone(&store)));
    let jobs = Arc::new(MemoryJobRunner::new(
        Arc::clone(&store),
        config.curated_prefix.clone(),
        columns,
    ));

    let gateways = Gateways {
        store: Arc::clone(&store) as _,
        catalog: Arc::clone(&catalog) as _,
        jobs: Arc::clone(&jobs) as _,
    };

    OfflineEnv {
        gateways,
        store,
        catalog,
        jobs,
    }
}

pub fn offline_env(config: &PipelineConfig) -> OfflineEnv {
    offline_env_with_columns(config, default_curated_columns())
}

pub async fn seed_raw(env: &OfflineEnv, config: &PipelineConfig) {
    env.store.put(config.raw_key.clone(), SAMPLE_RAW_CSV).await;
}
