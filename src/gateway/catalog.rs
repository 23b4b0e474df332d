// ABOUTME: Data catalog gateway trait for table drops, crawls, and queries
// ABOUTME: Dropping a missing table is a normal outcome, never an error

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::GatewayError;

/// What a `drop_table` call actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    Dropped,
    NotFound,
}

/// Configuration handed to the catalog crawler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    pub name: String,
    pub database: String,
    pub description: String,
    pub role: String,
    pub target_prefix: String,
}

/// Tabular result of a catalog query.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Narrow interface over the data catalog and its query engine.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Drop a table if it exists. A missing table reports
    /// [`DropOutcome::NotFound`] and is not an error.
    async fn drop_table(&self, database: &str, table: &str)
        -> Result<DropOutcome, GatewayError>;

    /// Run the crawler to (re)catalog data under the configured prefix,
    /// returning once the crawl completes.
    async fn run_crawler(&self, config: &CrawlerConfig) -> Result<(), GatewayError>;

    /// Execute a query and fetch the full result set.
    async fn run_query(&self, sql: &str) -> Result<QueryResult, GatewayError>;
}
