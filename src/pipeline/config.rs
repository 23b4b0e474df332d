// ABOUTME: Immutable pipeline configuration and per-invocation overrides
// ABOUTME: Replaces baked-in constants with an explicit struct passed to the builder

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Everything the curation pipeline needs to know about its environment.
/// Constructed once, passed into the pipeline builder, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Raw landing object checked by the existence gate and deleted after
    /// cataloging succeeds.
    pub raw_key: String,
    /// Prefix synced into the processed prefix after cataloging.
    pub landing_prefix: String,
    /// Prefix purged before the transform and refilled by the sync step.
    pub processed_prefix: String,
    /// Prefix the transform writes to and the crawler catalogs.
    pub curated_prefix: String,

    pub database: String,
    pub table: String,
    pub crawler_name: String,
    pub crawler_role: String,

    pub job_name: String,
    pub script_location: String,
    pub worker_type: String,
    pub worker_count: u32,

    /// Columns the schema gate requires, in the dataset's original casing.
    pub required_columns: Vec<String>,

    /// Retry budget applied to every task (budget N means N+1 attempts).
    pub retry_budget: u32,
    pub task_timeout_secs: u64,
    /// The transform job gets its own, longer deadline.
    pub job_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_key: "landing-zone/childcare_centres.csv".to_string(),
            landing_prefix: "landing-zone/".to_string(),
            processed_prefix: "processed-data/".to_string(),
            curated_prefix: "curated-data/".to_string(),
            database: "curated_data".to_string(),
            table: "curated_data".to_string(),
            crawler_name: "catalog-curated-data".to_string(),
            crawler_role: "pipeline-crawler".to_string(),
            job_name: "childcare-transform".to_string(),
            script_location: "scripts/childcare_transform.py".to_string(),
            worker_type: "G.1X".to_string(),
            worker_count: 4,
            required_columns: vec!["Latitude".to_string(), "Longitude".to_string()],
            retry_budget: 1,
            task_timeout_secs: 300,
            job_timeout_secs: 600,
        }
    }
}

impl PipelineConfig {
    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout_secs)
    }

    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }

    /// Apply per-invocation overrides, leaving this config untouched.
    pub fn with_overrides(&self, overrides: &RunOverrides) -> Self {
        let mut config = self.clone();
        if let Some(ref worker_type) = overrides.worker_type {
            config.worker_type = worker_type.clone();
        }
        if let Some(worker_count) = overrides.worker_count {
            config.worker_count = worker_count;
        }
        if let Some(timeout_secs) = overrides.timeout_secs {
            config.job_timeout_secs = timeout_secs;
        }
        config
    }
}

/// Optional parameter overrides for a single run invocation.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub worker_type: Option<String>,
    pub worker_count: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub max_concurrent: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_leave_original_untouched() {
        let base = PipelineConfig::default();
        let overrides = RunOverrides {
            worker_type: Some("G.2X".to_string()),
            worker_count: Some(8),
            timeout_secs: Some(120),
            max_concurrent: None,
        };

        let applied = base.with_overrides(&overrides);

        assert_eq!(applied.worker_type, "G.2X");
        assert_eq!(applied.worker_count, 8);
        assert_eq!(applied.job_timeout_secs, 120);

        assert_eq!(base.worker_type, "G.1X");
        assert_eq!(base.worker_count, 4);
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: PipelineConfig =
            serde_yaml::from_str("raw_key: landing/centres.csv\nretry_budget: 3\n").unwrap();

        assert_eq!(config.raw_key, "landing/centres.csv");
        assert_eq!(config.retry_budget, 3);
        assert_eq!(config.database, "curated_data");
    }
}
