// ABOUTME: Main application orchestration for the landfall CLI
// ABOUTME: Coordinates between CLI arguments, configuration, and command execution

use std::process::ExitCode;

use anyhow::Result;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use super::commands;
use super::{AppConfig, Args, Commands};

pub struct App {
    config: AppConfig,
}

impl App {
    /// Create a new application instance
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Create application from command line arguments
    pub fn from_args(args: &Args) -> Result<Self> {
        let config = AppConfig::load(args.config.clone())?;
        Ok(Self::new(config))
    }

    /// Initialize logging based on configuration
    pub fn init_logging(&self, verbose: bool, no_color: bool) -> Result<()> {
        let log_level = if verbose {
            "debug"
        } else {
            &self.config.logging.level
        };

        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

        match self.config.logging.format.as_str() {
            "compact" => {
                tracing_subscriber::fmt()
                    .compact()
                    .with_env_filter(env_filter)
                    .with_ansi(!no_color)
                    .with_target(false)
                    .init();
            }
            _ => {
                tracing_subscriber::fmt()
                    .with_env_filter(env_filter)
                    .with_ansi(!no_color)
                    .with_target(false)
                    .init();
            }
        }

        debug!("Logging initialized with level: {}", log_level);
        Ok(())
    }

    /// Run the application with parsed arguments
    pub async fn run(&self, args: Args) -> Result<ExitCode> {
        self.init_logging(args.verbose, args.no_color)?;

        info!("Starting landfall v{}", env!("CARGO_PKG_VERSION"));
        debug!("Configuration loaded from: {:?}", args.config);

        let overrides = args.run_overrides();

        let code = match args.command {
            Commands::Run {
                pipeline, output, ..
            } => commands::run_pipeline(&pipeline, overrides, output, &self.config).await?,

            Commands::Validate { pipeline } => {
                commands::validate_pipeline(&pipeline, &self.config).await?
            }
        };

        Ok(ExitCode::from(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_app_creation() {
        let config = AppConfig::default();
        let app = App::new(config);
        assert!(app.config.max_concurrent_tasks.is_none());
    }

    #[test]
    fn test_config_file_feeds_app() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("landfall.yaml");

        let config_content = r#"
max_concurrent_tasks: 8
logging:
  level: debug
  format: compact
"#;
        fs::write(&config_path, config_content).unwrap();

        let config = AppConfig::load(Some(config_path)).unwrap();
        let app = App::new(config);
        assert_eq!(app.config.max_concurrent_tasks, Some(8));
        assert_eq!(app.config.logging.format, "compact");
    }
}
