// ABOUTME: Wires the curation pipeline's fixed task graph shape
// ABOUTME: begin, gates, sibling purges, transform, crawl, sync, raw purge, end

use std::collections::HashMap;
use std::sync::Arc;

use crate::engine::{GraphError, RetryPolicy, Task, TaskGraph};
use crate::gateway::{Catalog, CrawlerConfig, JobRunner, JobSpec, ObjectStore};
use crate::quality::{ObjectExists, RequiredColumns};

use super::actions::{
    DeleteObject, DeletePrefix, DropTable, QualityGate, RunCrawler, RunJob, SyncPrefix,
};
use super::config::PipelineConfig;

/// Task names of the curation pipeline, in execution order.
pub mod task_names {
    pub const BEGIN: &str = "begin";
    pub const EXISTENCE_CHECK: &str = "existence-check";
    pub const PURGE_PROCESSED: &str = "purge-processed-prefix";
    pub const PURGE_CATALOG: &str = "purge-catalog-table";
    pub const RUN_TRANSFORM: &str = "run-transform-job";
    pub const RUN_CRAWLER: &str = "run-crawler";
    pub const SYNC_PROCESSED: &str = "sync-to-processed";
    pub const PURGE_RAW: &str = "purge-raw-object";
    pub const SCHEMA_CHECK: &str = "schema-check";
    pub const END: &str = "end";
}

/// The pipeline's external collaborators, shared by every task that needs
/// them. All three are stateless and safe for concurrent use.
#[derive(Clone)]
pub struct Gateways {
    pub store: Arc<dyn ObjectStore>,
    pub catalog: Arc<dyn Catalog>,
    pub jobs: Arc<dyn JobRunner>,
}

/// Build the curation task graph:
///
/// ```text
/// begin -> existence-check -> {purge-processed-prefix, purge-catalog-table}
///       -> run-transform-job -> run-crawler -> sync-to-processed
///       -> purge-raw-object -> schema-check -> end
/// ```
///
/// The two purge tasks are siblings with no edge between them and may run
/// concurrently; both must succeed before the transform becomes eligible.
/// The raw object is purged only downstream of the crawler, so a failed run
/// never loses its source before the catalog holds the curated output.
pub fn curation_pipeline(
    config: &PipelineConfig,
    gateways: &Gateways,
) -> Result<TaskGraph, GraphError> {
    use task_names::*;

    let retry = RetryPolicy::retries(config.retry_budget);
    let timeout = config.task_timeout();

    let existence = ObjectExists::new(Arc::clone(&gateways.store), config.raw_key.clone());
    let schema = RequiredColumns::new(
        Arc::clone(&gateways.catalog),
        config.database.clone(),
        config.table.clone(),
        config.required_columns.clone(),
    );

    let job_spec = JobSpec {
        job_name: config.job_name.clone(),
        script_location: config.script_location.clone(),
        worker_type: config.worker_type.clone(),
        worker_count: config.worker_count,
        arguments: HashMap::from([
            ("--source_key".to_string(), config.raw_key.clone()),
            ("--target_prefix".to_string(), config.curated_prefix.clone()),
        ]),
    };
    let crawler_config = CrawlerConfig {
        name: config.crawler_name.clone(),
        database: config.database.clone(),
        description: "Crawl the curated dataset and catalog it".to_string(),
        role: config.crawler_role.clone(),
        target_prefix: config.curated_prefix.clone(),
    };

    TaskGraph::builder()
        .task(Task::no_op(BEGIN), &[])?
        .task(
            Task::new(EXISTENCE_CHECK, Arc::new(QualityGate::new(Arc::new(existence))))
                .with_retry(retry.clone())
                .with_timeout(timeout),
            &[BEGIN],
        )?
        .task(
            Task::new(
                PURGE_PROCESSED,
                Arc::new(DeletePrefix::new(
                    Arc::clone(&gateways.store),
                    config.processed_prefix.clone(),
                )),
            )
            .with_retry(retry.clone())
            .with_timeout(timeout),
            &[EXISTENCE_CHECK],
        )?
        .task(
            Task::new(
                PURGE_CATALOG,
                Arc::new(DropTable::new(
                    Arc::clone(&gateways.catalog),
                    config.database.clone(),
                    config.table.clone(),
                )),
            )
            .with_retry(retry.clone())
            .with_timeout(timeout),
            &[EXISTENCE_CHECK],
        )?
        .task(
            Task::new(
                RUN_TRANSFORM,
                Arc::new(RunJob::new(Arc::clone(&gateways.jobs), job_spec)),
            )
            .with_retry(retry.clone())
            .with_timeout(config.job_timeout()),
            &[PURGE_PROCESSED, PURGE_CATALOG],
        )?
        .task(
            Task::new(
                RUN_CRAWLER,
                Arc::new(RunCrawler::new(
                    Arc::clone(&gateways.catalog),
                    crawler_config,
                )),
            )
            .with_retry(retry.clone())
            .with_timeout(timeout),
            &[RUN_TRANSFORM],
        )?
        .task(
            Task::new(
                SYNC_PROCESSED,
                Arc::new(SyncPrefix::new(
                    Arc::clone(&gateways.store),
                    config.landing_prefix.clone(),
                    config.processed_prefix.clone(),
                )),
            )
            .with_retry(retry.clone())
            .with_timeout(timeout),
            &[RUN_CRAWLER],
        )?
        .task(
            Task::new(
                PURGE_RAW,
                Arc::new(DeleteObject::new(
                    Arc::clone(&gateways.store),
                    config.raw_key.clone(),
                )),
            )
            .with_retry(retry.clone())
            .with_timeout(timeout),
            &[SYNC_PROCESSED],
        )?
        .task(
            Task::new(SCHEMA_CHECK, Arc::new(QualityGate::new(Arc::new(schema))))
                .with_retry(retry)
                .with_timeout(timeout),
            &[PURGE_RAW],
        )?
        .task(Task::no_op(END), &[SCHEMA_CHECK])?
        .build()
}
