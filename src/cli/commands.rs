// ABOUTME: Command implementations for the landfall CLI
// ABOUTME: Handles the run and validate commands against a simulated environment

use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::engine::{Engine, RunContext, TaskStatus};
use crate::gateway::{
    default_curated_columns, MemoryCatalog, MemoryJobRunner, MemoryObjectStore, SAMPLE_RAW_CSV,
};
use crate::pipeline::{curation_pipeline, Gateways, PipelineConfig, RunOverrides};

use super::config::AppConfig;

/// Execute a pipeline run and map its outcome to a process exit code.
pub async fn run_pipeline(
    pipeline_id: &str,
    overrides: RunOverrides,
    output: Option<PathBuf>,
    app_config: &AppConfig,
) -> Result<u8> {
    let config = app_config
        .pipeline(pipeline_id)
        .ok_or_else(|| anyhow!("unknown pipeline: {pipeline_id}"))?
        .with_overrides(&overrides);

    info!("Starting pipeline: {pipeline_id}");

    let gateways = simulated_gateways(&config).await;
    let graph = curation_pipeline(&config, &gateways)
        .map_err(|e| anyhow!("invalid pipeline definition: {e}"))?;

    let mut engine = Engine::new();
    if let Some(cap) = overrides
        .max_concurrent
        .or(app_config.max_concurrent_tasks)
    {
        engine = engine.with_max_concurrent(cap);
    }

    let ctx = RunContext::new(pipeline_id);
    let report = tokio::select! {
        report = engine.run(&graph, ctx) => report,
        _ = tokio::signal::ctrl_c() => {
            warn!("Run interrupted by operator");
            return Ok(130);
        }
    };

    println!(
        "Pipeline '{}' (run {}) finished: {}",
        report.pipeline, report.run_id, report.outcome
    );
    for (task, status) in &report.statuses {
        println!("  Task '{}': {}", task, status);
        if *status == TaskStatus::Failed || *status == TaskStatus::Timeout {
            if let Some(diagnostic) = report.last_diagnostic(task) {
                println!("    Diagnostic: {diagnostic}");
            }
        }
    }
    println!("  Attempts recorded: {}", report.attempts.len());

    if let Some(output_path) = output {
        let json_content = serde_json::to_string_pretty(&report)?;
        std::fs::write(&output_path, json_content)?;
        info!("Run report written to: {}", output_path.display());
    }

    Ok(report.outcome.exit_code())
}

/// Validate a pipeline definition and print its execution plan.
pub async fn validate_pipeline(pipeline_id: &str, app_config: &AppConfig) -> Result<u8> {
    let config = app_config
        .pipeline(pipeline_id)
        .ok_or_else(|| anyhow!("unknown pipeline: {pipeline_id}"))?;

    let gateways = simulated_gateways(config).await;
    let graph = curation_pipeline(config, &gateways)
        .map_err(|e| anyhow!("invalid pipeline definition: {e}"))?;

    println!("✓ Pipeline '{}' is valid", pipeline_id);
    println!("  Tasks: {}", graph.len());
    println!("  Execution plan:");
    for name in graph.topo_order() {
        let upstreams = graph.upstreams(name);
        if upstreams.is_empty() {
            println!("    {name}");
        } else {
            println!("    {name}  (after: {})", upstreams.join(", "));
        }
    }

    Ok(0)
}

/// Offline collaborators: an in-memory object store seeded with the raw
/// landing object, a catalog crawling it, and a job runner replaying the
/// curated output schema.
async fn simulated_gateways(config: &PipelineConfig) -> Gateways {
    let store = Arc::new(MemoryObjectStore::new());
    store.put(config.raw_key.clone(), SAMPLE_RAW_CSV).await;

    let catalog = Arc::new(MemoryCatalog::new(Arc::clone(&store)));
    let jobs = Arc::new(MemoryJobRunner::new(
        Arc::clone(&store),
        config.curated_prefix.clone(),
        default_curated_columns(),
    ));

    Gateways {
        store,
        catalog,
        jobs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_pipeline_succeeds_offline() {
        let app_config = AppConfig::default();
        let code = run_pipeline(
            super::super::config::DEFAULT_PIPELINE,
            RunOverrides::default(),
            None,
            &app_config,
        )
        .await
        .unwrap();

        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_unknown_pipeline_is_an_error() {
        let app_config = AppConfig::default();
        let result = run_pipeline(
            "no-such-pipeline",
            RunOverrides::default(),
            None,
            &app_config,
        )
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_validate_prints_plan() {
        let app_config = AppConfig::default();
        let code = validate_pipeline(super::super::config::DEFAULT_PIPELINE, &app_config)
            .await
            .unwrap();
        assert_eq!(code, 0);
    }
}
