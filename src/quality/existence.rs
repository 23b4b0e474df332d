// ABOUTME: Existence predicate checking that an object is present at a key
// ABOUTME: Guards the transform against running on an absent landing object

use std::sync::Arc;

use async_trait::async_trait;

use super::{Predicate, QualityCheckResult};
use crate::gateway::{GatewayError, ObjectStore};

/// Passes when an object exists at the given key.
pub struct ObjectExists {
    store: Arc<dyn ObjectStore>,
    key: String,
}

impl ObjectExists {
    pub fn new(store: Arc<dyn ObjectStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }
}

#[async_trait]
impl Predicate for ObjectExists {
    fn name(&self) -> &str {
        "object-exists"
    }

    async fn evaluate(&self) -> Result<QualityCheckResult, GatewayError> {
        if self.store.exists(&self.key).await? {
            Ok(QualityCheckResult::pass(
                self.name(),
                format!("object found at {}", self.key),
            ))
        } else {
            Ok(QualityCheckResult::fail(
                self.name(),
                format!("object not found at {}", self.key),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MemoryObjectStore;

    #[tokio::test]
    async fn test_present_object_passes() {
        let store = Arc::new(MemoryObjectStore::new());
        store.put("landing-zone/data.csv", "body").await;

        let predicate = ObjectExists::new(store, "landing-zone/data.csv");
        let result = predicate.evaluate().await.unwrap();

        assert!(result.passed);
        assert!(result.detail.contains("landing-zone/data.csv"));
    }

    #[tokio::test]
    async fn test_absent_object_fails_without_error() {
        let store = Arc::new(MemoryObjectStore::new());

        let predicate = ObjectExists::new(store, "landing-zone/data.csv");
        let result = predicate.evaluate().await.unwrap();

        assert!(!result.passed);
        assert!(result.detail.contains("object not found"));
    }

    #[tokio::test]
    async fn test_transport_failure_surfaces_as_error() {
        let store = Arc::new(MemoryObjectStore::new());
        store.inject_failure("connection refused").await;

        let predicate = ObjectExists::new(store, "landing-zone/data.csv");
        let err = predicate.evaluate().await.unwrap_err();

        assert!(err.to_string().contains("connection refused"));
    }
}
