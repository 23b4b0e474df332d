// ABOUTME: Quality gate predicates and their pass/fail results
// ABOUTME: A failed predicate is a normal result; only transport failures are errors

pub mod existence;
pub mod schema;

pub use existence::ObjectExists;
pub use schema::RequiredColumns;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::gateway::GatewayError;

/// Read-only snapshot of one quality check evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QualityCheckResult {
    pub check: String,
    pub passed: bool,
    pub detail: String,
}

impl QualityCheckResult {
    pub fn pass(check: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            passed: true,
            detail: detail.into(),
        }
    }

    pub fn fail(check: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            passed: false,
            detail: detail.into(),
        }
    }
}

/// A named validation predicate. Implementations evaluate against external
/// state and report pass/fail; they never treat a false verdict as an error.
#[async_trait]
pub trait Predicate: Send + Sync {
    fn name(&self) -> &str;

    async fn evaluate(&self) -> Result<QualityCheckResult, GatewayError>;
}
