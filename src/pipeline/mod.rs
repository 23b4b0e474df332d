// ABOUTME: Pipeline definition module wiring the curation task graph
// ABOUTME: Configuration, concrete task actions, and the fixed graph shape

pub mod actions;
pub mod config;
pub mod definition;

pub use config::{PipelineConfig, RunOverrides};
pub use definition::{curation_pipeline, task_names, Gateways};
