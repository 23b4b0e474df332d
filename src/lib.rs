// ABOUTME: Main library module for the landfall pipeline orchestrator
// ABOUTME: Exports all core modules and provides the public API

pub mod cli;
pub mod engine;
pub mod gateway;
pub mod pipeline;
pub mod quality;

// Re-export commonly used types
pub use engine::{Engine, RunContext, RunOutcome, RunReport, Task, TaskGraph, TaskStatus};
pub use gateway::{Catalog, JobRunner, ObjectStore};
pub use pipeline::{curation_pipeline, Gateways, PipelineConfig, RunOverrides};
pub use quality::{Predicate, QualityCheckResult};

// Error handling
pub type Result<T> = anyhow::Result<T>;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
