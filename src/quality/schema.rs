// ABOUTME: Schema predicate checking a catalog table for required columns
// ABOUTME: Comparison is case-insensitive to match catalog identifier folding

use std::sync::Arc;

use async_trait::async_trait;

use super::{Predicate, QualityCheckResult};
use crate::gateway::{Catalog, GatewayError};

/// Passes when the catalog table exposes every required column. Column names
/// are compared lower-cased; catalogs fold identifiers to lower case, while
/// the required set is written in the dataset's original casing.
pub struct RequiredColumns {
    catalog: Arc<dyn Catalog>,
    database: String,
    table: String,
    required: Vec<String>,
}

impl RequiredColumns {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        database: impl Into<String>,
        table: impl Into<String>,
        required: Vec<String>,
    ) -> Self {
        Self {
            catalog,
            database: database.into(),
            table: table.into(),
            required,
        }
    }
}

#[async_trait]
impl Predicate for RequiredColumns {
    fn name(&self) -> &str {
        "required-columns"
    }

    async fn evaluate(&self) -> Result<QualityCheckResult, GatewayError> {
        let sql = format!(
            r#"SELECT * FROM "{}"."{}" LIMIT 10"#,
            self.database, self.table
        );
        let result = self.catalog.run_query(&sql).await?;

        let present: Vec<String> = result
            .columns
            .iter()
            .map(|c| c.to_lowercase())
            .collect();
        let missing: Vec<&str> = self
            .required
            .iter()
            .filter(|c| !present.contains(&c.to_lowercase()))
            .map(String::as_str)
            .collect();

        if missing.is_empty() {
            Ok(QualityCheckResult::pass(
                self.name(),
                format!(
                    "table {}.{} has all required columns: {}",
                    self.database,
                    self.table,
                    self.required.join(", ")
                ),
            ))
        } else {
            Ok(QualityCheckResult::fail(
                self.name(),
                format!(
                    "table {}.{} is missing columns: {}",
                    self.database,
                    self.table,
                    missing.join(", ")
                ),
            ))
        }
    }
}
