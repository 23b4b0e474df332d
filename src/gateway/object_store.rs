// ABOUTME: Object store gateway trait for existence checks, sync, and deletes
// ABOUTME: Implementations are stateless clients safe for concurrent use

use async_trait::async_trait;

use super::GatewayError;

/// Narrow interface over an object store scoped to a single bucket. Keys and
/// prefixes are plain strings; the concrete client is out of scope.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Whether an object exists at the exact key.
    async fn exists(&self, key: &str) -> Result<bool, GatewayError>;

    /// Recursively copy every object under `src_prefix` to `dst_prefix`,
    /// returning how many objects were copied.
    async fn sync_prefix(&self, src_prefix: &str, dst_prefix: &str)
        -> Result<usize, GatewayError>;

    /// Recursively delete every object under `prefix`, returning how many
    /// objects were removed. Deleting an empty prefix is not an error.
    async fn delete_prefix(&self, prefix: &str) -> Result<usize, GatewayError>;

    /// Delete a single object. Deleting a missing key is not an error.
    async fn delete_object(&self, key: &str) -> Result<(), GatewayError>;
}
