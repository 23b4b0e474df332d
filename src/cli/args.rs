// ABOUTME: Command line argument definitions and parsing using Clap
// ABOUTME: Defines the main CLI structure and subcommands for landfall

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::pipeline::RunOverrides;

#[derive(Parser)]
#[command(name = "landfall")]
#[command(about = "Staged data pipeline orchestrator with quality gates and idempotent re-runs")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Path to configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Disable colored output")]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute a pipeline run against a simulated environment
    Run {
        #[arg(help = "Pipeline identifier", default_value = "childcare-centres")]
        pipeline: String,

        #[arg(long, help = "Override the transform job's worker type")]
        worker_type: Option<String>,

        #[arg(long, help = "Override the transform job's worker count")]
        workers: Option<u32>,

        #[arg(long, help = "Override the transform job's timeout in seconds")]
        timeout_secs: Option<u64>,

        #[arg(long, help = "Maximum number of concurrently running tasks")]
        max_concurrent: Option<usize>,

        #[arg(short, long, help = "Write the full run report as JSON to this file")]
        output: Option<PathBuf>,
    },

    /// Validate a pipeline definition and print its execution plan
    Validate {
        #[arg(help = "Pipeline identifier", default_value = "childcare-centres")]
        pipeline: String,
    },
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Collect the run overrides carried by a `run` invocation.
    pub fn run_overrides(&self) -> RunOverrides {
        match &self.command {
            Commands::Run {
                worker_type,
                workers,
                timeout_secs,
                max_concurrent,
                ..
            } => RunOverrides {
                worker_type: worker_type.clone(),
                worker_count: *workers,
                timeout_secs: *timeout_secs,
                max_concurrent: *max_concurrent,
            },
            _ => RunOverrides::default(),
        }
    }
}
