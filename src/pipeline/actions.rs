// ABOUTME: Concrete task actions backing the curation pipeline's graph nodes
// ABOUTME: Each action wraps one gateway call and reports a diagnostic on success

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::engine::{ActionResult, RunContext, TaskAction, TaskError};
use crate::gateway::{
    Catalog, CrawlerConfig, DropOutcome, JobRunner, JobSpec, JobState, ObjectStore,
};
use crate::quality::Predicate;

/// Wraps a quality predicate as a task: a false verdict fails the task
/// (feeding the engine's retry logic); a transport error surfaces unchanged.
pub struct QualityGate {
    predicate: Arc<dyn Predicate>,
}

impl QualityGate {
    pub fn new(predicate: Arc<dyn Predicate>) -> Self {
        Self { predicate }
    }
}

#[async_trait]
impl TaskAction for QualityGate {
    async fn run(&self, _ctx: &RunContext) -> ActionResult {
        let result = self.predicate.evaluate().await?;
        if result.passed {
            info!("Quality gate '{}' passed: {}", result.check, result.detail);
            Ok(Some(result.detail))
        } else {
            Err(TaskError::failed(result.detail))
        }
    }
}

/// Recursively deletes everything under a prefix. An already-empty prefix is
/// a clean no-op, which is what makes re-runs idempotent.
pub struct DeletePrefix {
    store: Arc<dyn ObjectStore>,
    prefix: String,
}

impl DeletePrefix {
    pub fn new(store: Arc<dyn ObjectStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }
}

#[async_trait]
impl TaskAction for DeletePrefix {
    async fn run(&self, _ctx: &RunContext) -> ActionResult {
        let removed = self.store.delete_prefix(&self.prefix).await?;
        info!("Purged {} objects under {}", removed, self.prefix);
        Ok(Some(format!(
            "removed {removed} objects under {}",
            self.prefix
        )))
    }
}

/// Drops the catalog table if present. A missing table is logged and treated
/// as success so a first run needs no manual setup.
pub struct DropTable {
    catalog: Arc<dyn Catalog>,
    database: String,
    table: String,
}

impl DropTable {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        database: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            database: database.into(),
            table: table.into(),
        }
    }
}

#[async_trait]
impl TaskAction for DropTable {
    async fn run(&self, _ctx: &RunContext) -> ActionResult {
        match self.catalog.drop_table(&self.database, &self.table).await? {
            DropOutcome::Dropped => {
                info!("Dropped table {}.{}", self.database, self.table);
                Ok(Some(format!(
                    "dropped table {}.{}",
                    self.database, self.table
                )))
            }
            DropOutcome::NotFound => {
                info!(
                    "Table {}.{} not found - nothing to drop",
                    self.database, self.table
                );
                Ok(Some(format!(
                    "table {}.{} not found, nothing to drop",
                    self.database, self.table
                )))
            }
        }
    }
}

/// Submits the transform job and awaits its terminal state. The owning
/// task's timeout bounds the wait.
pub struct RunJob {
    jobs: Arc<dyn JobRunner>,
    spec: JobSpec,
}

impl RunJob {
    pub fn new(jobs: Arc<dyn JobRunner>, spec: JobSpec) -> Self {
        Self { jobs, spec }
    }
}

#[async_trait]
impl TaskAction for RunJob {
    async fn run(&self, _ctx: &RunContext) -> ActionResult {
        let handle = self.jobs.submit(&self.spec).await?;
        info!(
            "Submitted transform job {} (run {})",
            handle.job_name, handle.run_id
        );

        match self.jobs.await_completion(&handle).await? {
            JobState::Succeeded => Ok(Some(format!(
                "job {} run {} succeeded",
                handle.job_name, handle.run_id
            ))),
            JobState::Failed { reason } => Err(TaskError::failed(format!(
                "job {} run {} failed: {reason}",
                handle.job_name, handle.run_id
            ))),
        }
    }
}

/// Runs the catalog crawler against the curated prefix.
pub struct RunCrawler {
    catalog: Arc<dyn Catalog>,
    config: CrawlerConfig,
}

impl RunCrawler {
    pub fn new(catalog: Arc<dyn Catalog>, config: CrawlerConfig) -> Self {
        Self { catalog, config }
    }
}

#[async_trait]
impl TaskAction for RunCrawler {
    async fn run(&self, _ctx: &RunContext) -> ActionResult {
        self.catalog.run_crawler(&self.config).await?;
        info!(
            "Crawler {} cataloged {}",
            self.config.name, self.config.target_prefix
        );
        Ok(Some(format!(
            "crawler {} cataloged {}",
            self.config.name, self.config.target_prefix
        )))
    }
}

/// Recursively copies one prefix to another.
pub struct SyncPrefix {
    store: Arc<dyn ObjectStore>,
    src_prefix: String,
    dst_prefix: String,
}

impl SyncPrefix {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        src_prefix: impl Into<String>,
        dst_prefix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            src_prefix: src_prefix.into(),
            dst_prefix: dst_prefix.into(),
        }
    }
}

#[async_trait]
impl TaskAction for SyncPrefix {
    async fn run(&self, _ctx: &RunContext) -> ActionResult {
        let copied = self
            .store
            .sync_prefix(&self.src_prefix, &self.dst_prefix)
            .await?;
        info!(
            "Synced {} objects from {} to {}",
            copied, self.src_prefix, self.dst_prefix
        );
        Ok(Some(format!(
            "synced {copied} objects from {} to {}",
            self.src_prefix, self.dst_prefix
        )))
    }
}

/// Deletes a single object. Runs only after cataloging has succeeded, so a
/// failed run can still be retried against the original landing object.
pub struct DeleteObject {
    store: Arc<dyn ObjectStore>,
    key: String,
}

impl DeleteObject {
    pub fn new(store: Arc<dyn ObjectStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }
}

#[async_trait]
impl TaskAction for DeleteObject {
    async fn run(&self, _ctx: &RunContext) -> ActionResult {
        self.store.delete_object(&self.key).await?;
        info!("Deleted raw object {}", self.key);
        Ok(Some(format!("deleted {}", self.key)))
    }
}
