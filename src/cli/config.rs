// ABOUTME: Application configuration for the landfall CLI
// ABOUTME: Loads pipeline definitions and logging settings from file and environment

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::pipeline::PipelineConfig;

pub const DEFAULT_PIPELINE: &str = "childcare-centres";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Cap on concurrently running tasks; `None` leaves the engine bounded
    /// only by the graph's natural fan-out.
    pub max_concurrent_tasks: Option<usize>,

    pub logging: LoggingConfig,

    pub pipelines: HashMap<String, PipelineConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut pipelines = HashMap::new();
        pipelines.insert(DEFAULT_PIPELINE.to_string(), PipelineConfig::default());

        Self {
            max_concurrent_tasks: None,
            logging: LoggingConfig::default(),
            pipelines,
        }
    }
}

impl AppConfig {
    /// Load configuration from the given path or the standard locations,
    /// falling back to defaults when no file exists.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => Some(p),
            None => Self::find_config_file(),
        };

        let mut config = match config_path {
            Some(p) if p.exists() => {
                let contents = std::fs::read_to_string(&p)?;
                serde_yaml::from_str(&contents)?
            }
            _ => Self::default(),
        };

        // A config file without pipelines still gets the built-in one.
        config
            .pipelines
            .entry(DEFAULT_PIPELINE.to_string())
            .or_default();

        config.merge_env();
        Ok(config)
    }

    /// Find a configuration file in the standard locations.
    fn find_config_file() -> Option<PathBuf> {
        let candidates = [
            PathBuf::from("landfall.yaml"),
            PathBuf::from("landfall.yml"),
            PathBuf::from(".landfall.yaml"),
        ];
        for candidate in candidates {
            if candidate.exists() {
                return Some(candidate);
            }
        }

        if let Some(home_dir) = dirs::home_dir() {
            let home_config = home_dir.join(".landfall").join("config.yaml");
            if home_config.exists() {
                return Some(home_config);
            }
        }

        None
    }

    /// Merge settings from environment variables.
    fn merge_env(&mut self) {
        if let Ok(level) = std::env::var("LANDFALL_LOG") {
            self.logging.level = level;
        }
        if let Ok(cap) = std::env::var("LANDFALL_MAX_CONCURRENT") {
            if let Ok(cap) = cap.parse() {
                self.max_concurrent_tasks = Some(cap);
            }
        }
    }

    pub fn pipeline(&self, id: &str) -> Option<&PipelineConfig> {
        self.pipelines.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_carries_builtin_pipeline() {
        let config = AppConfig::default();
        assert!(config.pipeline(DEFAULT_PIPELINE).is_some());
        assert!(config.pipeline("unknown").is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("landfall.yaml");

        let config_content = r#"
max_concurrent_tasks: 2
logging:
  level: debug
  format: compact
pipelines:
  custom:
    raw_key: landing/custom.csv
    retry_budget: 2
"#;
        fs::write(&config_path, config_content).unwrap();

        let config = AppConfig::load(Some(config_path)).unwrap();
        assert_eq!(config.max_concurrent_tasks, Some(2));
        assert_eq!(config.logging.level, "debug");

        let custom = config.pipeline("custom").unwrap();
        assert_eq!(custom.raw_key, "landing/custom.csv");
        assert_eq!(custom.retry_budget, 2);

        // The built-in pipeline survives alongside file-defined ones.
        assert!(config.pipeline(DEFAULT_PIPELINE).is_some());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load(Some(PathBuf::from("/nonexistent/landfall.yaml"))).unwrap();
        assert!(config.pipeline(DEFAULT_PIPELINE).is_some());
    }
}
