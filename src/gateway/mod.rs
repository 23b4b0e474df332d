// ABOUTME: Gateway traits for the pipeline's external collaborators
// ABOUTME: Object storage, data catalog, and transform job runner interface seams

pub mod catalog;
pub mod memory;
pub mod object_store;
pub mod transform;

pub use catalog::{Catalog, CrawlerConfig, DropOutcome, QueryResult};
pub use memory::{
    default_curated_columns, MemoryCatalog, MemoryJobRunner, MemoryObjectStore, SAMPLE_RAW_CSV,
};
pub use object_store::ObjectStore;
pub use transform::{JobHandle, JobRunner, JobSpec, JobState};

use thiserror::Error;

/// Transport-level failure of an external service call. Distinct from a
/// quality check that evaluates to false, which is a normal result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("object store request failed: {message}")]
    Storage { message: String },

    #[error("catalog request failed: {message}")]
    Catalog { message: String },

    #[error("query failed: {message}")]
    Query { message: String },

    #[error("job runner request failed: {message}")]
    Job { message: String },
}

impl GatewayError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog {
            message: message.into(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    pub fn job(message: impl Into<String>) -> Self {
        Self::Job {
            message: message.into(),
        }
    }
}
