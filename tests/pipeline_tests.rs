// ABOUTME: End-to-end tests for the curation pipeline definition
// ABOUTME: Covers the happy path, idempotent re-runs, gate failures, and retries

use landfall::engine::{AttemptOutcome, Engine, RunContext, RunOutcome, TaskStatus};
use landfall::pipeline::{curation_pipeline, task_names::*, PipelineConfig, RunOverrides};

mod common;
use common::{offline_env, offline_env_with_columns, seed_raw};

fn fast_config() -> PipelineConfig {
    PipelineConfig {
        retry_budget: 0,
        task_timeout_secs: 5,
        job_timeout_secs: 5,
        ..PipelineConfig::default()
    }
}

#[tokio::test]
async fn test_full_pipeline_succeeds_and_cleans_up() {
    let config = fast_config();
    let env = offline_env(&config);
    seed_raw(&env, &config).await;

    let graph = curation_pipeline(&config, &env.gateways).unwrap();
    let report = Engine::new().run(&graph, RunContext::new("curation")).await;

    assert_eq!(report.outcome, RunOutcome::Success);
    for task in [
        BEGIN,
        EXISTENCE_CHECK,
        PURGE_PROCESSED,
        PURGE_CATALOG,
        RUN_TRANSFORM,
        RUN_CRAWLER,
        SYNC_PROCESSED,
        PURGE_RAW,
        SCHEMA_CHECK,
        END,
    ] {
        assert_eq!(report.status(task), Some(TaskStatus::Success), "task {task}");
    }

    // Raw landing object is gone, curated and processed data exist, and the
    // catalog holds the crawled table.
    assert!(env.store.get(&config.raw_key).await.is_none());
    assert!(!env
        .store
        .keys_with_prefix(&config.curated_prefix)
        .await
        .is_empty());
    assert!(!env
        .store
        .keys_with_prefix(&config.processed_prefix)
        .await
        .is_empty());
    assert!(env.catalog.has_table(&config.database, &config.table).await);

    // The audit trail respects every edge of the chain.
    for (upstream, downstream) in [
        (EXISTENCE_CHECK, PURGE_PROCESSED),
        (PURGE_PROCESSED, RUN_TRANSFORM),
        (PURGE_CATALOG, RUN_TRANSFORM),
        (RUN_CRAWLER, SYNC_PROCESSED),
        (SYNC_PROCESSED, PURGE_RAW),
    ] {
        let up_end = report.attempts_for(upstream).last().unwrap().end_time;
        let down_start = report.attempts_for(downstream).first().unwrap().start_time;
        assert!(up_end <= down_start, "edge ({upstream}, {downstream})");
    }
}

#[tokio::test]
async fn test_rerun_against_leftover_state_is_idempotent() {
    let config = fast_config();
    let env = offline_env(&config);
    seed_raw(&env, &config).await;

    let graph = curation_pipeline(&config, &env.gateways).unwrap();

    let first = Engine::new().run(&graph, RunContext::new("curation")).await;
    assert_eq!(first.outcome, RunOutcome::Success);

    // Leftovers from the first run: processed objects, curated objects, and
    // the catalog table all still exist. Re-land the raw object and re-run.
    assert!(env.catalog.has_table(&config.database, &config.table).await);
    seed_raw(&env, &config).await;

    let second = Engine::new().run(&graph, RunContext::new("curation")).await;
    assert_eq!(second.outcome, first.outcome);
    assert_eq!(second.count_with_status(TaskStatus::Success), 10);

    // The second run's purge-catalog actually dropped the leftover table.
    assert!(second
        .last_diagnostic(PURGE_CATALOG)
        .unwrap()
        .contains("dropped table"));
}

#[tokio::test]
async fn test_first_run_drop_of_missing_table_is_nonfatal() {
    let config = fast_config();
    let env = offline_env(&config);
    seed_raw(&env, &config).await;

    let graph = curation_pipeline(&config, &env.gateways).unwrap();
    let report = Engine::new().run(&graph, RunContext::new("curation")).await;

    assert_eq!(report.outcome, RunOutcome::Success);
    assert!(report
        .last_diagnostic(PURGE_CATALOG)
        .unwrap()
        .contains("nothing to drop"));
}

#[tokio::test]
async fn test_missing_raw_object_fails_at_existence_check() {
    let config = fast_config();
    let env = offline_env(&config);
    // Raw object deliberately not seeded.

    let graph = curation_pipeline(&config, &env.gateways).unwrap();
    let report = Engine::new().run(&graph, RunContext::new("curation")).await;

    assert!(matches!(
        &report.outcome,
        RunOutcome::Failed { task, reason }
            if task == EXISTENCE_CHECK && reason.contains("object not found")
    ));

    assert_eq!(report.status(BEGIN), Some(TaskStatus::Success));
    assert_eq!(report.status(EXISTENCE_CHECK), Some(TaskStatus::Failed));
    for task in [
        PURGE_PROCESSED,
        PURGE_CATALOG,
        RUN_TRANSFORM,
        RUN_CRAWLER,
        SYNC_PROCESSED,
        PURGE_RAW,
        SCHEMA_CHECK,
        END,
    ] {
        assert_eq!(
            report.status(task),
            Some(TaskStatus::Cancelled),
            "task {task}"
        );
        assert!(report.attempts_for(task).is_empty(), "task {task}");
    }
}

#[tokio::test]
async fn test_missing_required_columns_fail_schema_check() {
    let config = fast_config();
    let env = offline_env_with_columns(&config, vec!["postalcode".to_string()]);
    seed_raw(&env, &config).await;

    let graph = curation_pipeline(&config, &env.gateways).unwrap();
    let report = Engine::new().run(&graph, RunContext::new("curation")).await;

    assert!(matches!(
        &report.outcome,
        RunOutcome::Failed { task, reason }
            if task == SCHEMA_CHECK
                && reason.contains("Latitude")
                && reason.contains("Longitude")
    ));
    assert_eq!(report.status(END), Some(TaskStatus::Cancelled));

    // Everything up to the gate still ran; the raw object is already gone.
    assert_eq!(report.status(PURGE_RAW), Some(TaskStatus::Success));
}

#[tokio::test]
async fn test_failed_transform_job_fails_the_run() {
    let config = fast_config();
    let env = offline_env(&config);
    seed_raw(&env, &config).await;
    env.jobs.inject_run_failure("executor lost").await;

    let graph = curation_pipeline(&config, &env.gateways).unwrap();
    let report = Engine::new().run(&graph, RunContext::new("curation")).await;

    assert!(matches!(
        &report.outcome,
        RunOutcome::Failed { task, reason }
            if task == RUN_TRANSFORM && reason.contains("executor lost")
    ));

    // The raw landing object survives a failed run, so it can be retried.
    assert!(env.store.get(&config.raw_key).await.is_some());
    assert_eq!(report.status(PURGE_RAW), Some(TaskStatus::Cancelled));
}

#[tokio::test]
async fn test_transport_failure_is_retried_with_cause_preserved() {
    let config = PipelineConfig {
        retry_budget: 1,
        ..fast_config()
    };
    let env = offline_env(&config);
    seed_raw(&env, &config).await;
    env.store.inject_failure("connection reset by peer").await;

    let graph = curation_pipeline(&config, &env.gateways).unwrap();
    let report = Engine::new().run(&graph, RunContext::new("curation")).await;

    // The injected failure hits the existence check's first attempt; the
    // retry succeeds and the run completes.
    assert_eq!(report.outcome, RunOutcome::Success);

    let attempts = report.attempts_for(EXISTENCE_CHECK);
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0].outcome, AttemptOutcome::Failure);
    assert!(attempts[0]
        .diagnostic
        .as_deref()
        .unwrap()
        .contains("connection reset by peer"));
    assert_eq!(attempts[1].outcome, AttemptOutcome::Success);
}

#[tokio::test]
async fn test_worker_overrides_reach_the_job_spec() {
    let config = fast_config().with_overrides(&RunOverrides {
        worker_type: Some("G.2X".to_string()),
        worker_count: Some(8),
        timeout_secs: None,
        max_concurrent: None,
    });
    let env = offline_env(&config);
    seed_raw(&env, &config).await;

    let graph = curation_pipeline(&config, &env.gateways).unwrap();
    let report = Engine::new().run(&graph, RunContext::new("curation")).await;
    assert_eq!(report.outcome, RunOutcome::Success);

    let specs = env.jobs.submitted_specs().await;
    assert_eq!(specs.len(), 1);
    assert_eq!(specs[0].worker_type, "G.2X");
    assert_eq!(specs[0].worker_count, 8);
    assert_eq!(specs[0].job_name, config.job_name);
}
