// ABOUTME: In-memory gateway implementations backing the test suite and offline runs
// ABOUTME: The job runner replays the curated output schema of the childcare transform

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use super::catalog::{Catalog, CrawlerConfig, DropOutcome, QueryResult};
use super::object_store::ObjectStore;
use super::transform::{JobHandle, JobRunner, JobSpec, JobState};
use super::GatewayError;

/// Column set the curated childcare dataset carries after the transform:
/// administrative columns dropped, postal code truncated and renamed, and
/// coordinates extracted from the nested geometry field.
pub fn default_curated_columns() -> Vec<String> {
    [
        "loc_id",
        "loc_name",
        "auspice",
        "address",
        "PostalCode",
        "Longitude",
        "Latitude",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// A small raw landing object for seeding offline runs.
pub const SAMPLE_RAW_CSV: &str = "\
LOC_ID,LOC_NAME,AUSPICE,ADDRESS,PCODE,ward,PHONE,run_date,geometry
1014,Alexander Muir Early Learning Centre,Non Profit Agency,108 Gladstone Ave,M6J 3K9,9,416-393-1730,2024-04-12,geom-blob-1
1123,Broadlands Child Care Centre,Non Profit Agency,19 Castlegrove Blvd,M3A 1K9,16,416-395-2570,2024-04-12,geom-blob-2
1402,Cherry Tree Licensed Child Care,Commercial Agency,145 Front St E,M5A 1E3,13,416-363-9394,2024-04-12,geom-blob-3
";

/// Object store over a map of key to bytes, scoped to one logical bucket.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
    fail_next: Mutex<Option<String>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, key: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.objects.write().await.insert(key.into(), body.into());
    }

    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(key).cloned()
    }

    pub async fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.objects
            .read()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    /// Make the next call on this store fail with a transport error.
    pub async fn inject_failure(&self, message: impl Into<String>) {
        *self.fail_next.lock().await = Some(message.into());
    }

    async fn check_injected(&self) -> Result<(), GatewayError> {
        match self.fail_next.lock().await.take() {
            Some(message) => Err(GatewayError::storage(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn exists(&self, key: &str) -> Result<bool, GatewayError> {
        self.check_injected().await?;
        Ok(self.objects.read().await.contains_key(key))
    }

    async fn sync_prefix(
        &self,
        src_prefix: &str,
        dst_prefix: &str,
    ) -> Result<usize, GatewayError> {
        self.check_injected().await?;
        let mut objects = self.objects.write().await;
        let to_copy: Vec<(String, Vec<u8>)> = objects
            .range(src_prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(src_prefix))
            .map(|(k, v)| {
                let suffix = &k[src_prefix.len()..];
                (format!("{dst_prefix}{suffix}"), v.clone())
            })
            .collect();
        let copied = to_copy.len();
        for (key, body) in to_copy {
            objects.insert(key, body);
        }
        Ok(copied)
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize, GatewayError> {
        self.check_injected().await?;
        let mut objects = self.objects.write().await;
        let doomed: Vec<String> = objects
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        for key in &doomed {
            objects.remove(key);
        }
        Ok(doomed.len())
    }

    async fn delete_object(&self, key: &str) -> Result<(), GatewayError> {
        self.check_injected().await?;
        self.objects.write().await.remove(key);
        Ok(())
    }
}

struct TableData {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Catalog whose crawler infers a table schema from CSV objects in the
/// linked object store. Identifiers are lower-cased the way real catalog
/// crawlers normalize them; the table name is derived from the crawled
/// prefix's trailing path segment.
pub struct MemoryCatalog {
    store: Arc<MemoryObjectStore>,
    tables: RwLock<HashMap<(String, String), TableData>>,
    fail_next: Mutex<Option<String>>,
}

impl MemoryCatalog {
    pub fn new(store: Arc<MemoryObjectStore>) -> Self {
        Self {
            store,
            tables: RwLock::new(HashMap::new()),
            fail_next: Mutex::new(None),
        }
    }

    /// Make the next call on this catalog fail with a transport error.
    pub async fn inject_failure(&self, message: impl Into<String>) {
        *self.fail_next.lock().await = Some(message.into());
    }

    pub async fn has_table(&self, database: &str, table: &str) -> bool {
        self.tables
            .read()
            .await
            .contains_key(&(database.to_string(), table.to_string()))
    }

    /// Install a table directly, bypassing the crawler. Test seam.
    pub async fn install_table(
        &self,
        database: &str,
        table: &str,
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    ) {
        self.tables.write().await.insert(
            (database.to_string(), table.to_string()),
            TableData { columns, rows },
        );
    }

    async fn check_injected(&self) -> Option<String> {
        self.fail_next.lock().await.take()
    }
}

fn table_name_from_prefix(prefix: &str) -> String {
    let segment = prefix
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(prefix);
    segment
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn parse_csv_object(body: &[u8]) -> Option<(Vec<String>, Vec<Vec<String>>)> {
    let text = String::from_utf8_lossy(body);
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header = lines.next()?;
    let columns: Vec<String> = header
        .split(',')
        .map(|c| c.trim().to_lowercase())
        .collect();
    let rows = lines
        .map(|line| line.split(',').map(|v| v.trim().to_string()).collect())
        .collect();
    Some((columns, rows))
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn drop_table(
        &self,
        database: &str,
        table: &str,
    ) -> Result<DropOutcome, GatewayError> {
        if let Some(message) = self.check_injected().await {
            return Err(GatewayError::catalog(message));
        }
        let removed = self
            .tables
            .write()
            .await
            .remove(&(database.to_string(), table.to_string()));
        Ok(match removed {
            Some(_) => DropOutcome::Dropped,
            None => DropOutcome::NotFound,
        })
    }

    async fn run_crawler(&self, config: &CrawlerConfig) -> Result<(), GatewayError> {
        if let Some(message) = self.check_injected().await {
            return Err(GatewayError::catalog(message));
        }

        let keys = self.store.keys_with_prefix(&config.target_prefix).await;
        let Some(first) = keys.first() else {
            // Nothing under the prefix: the crawl completes without
            // cataloging a table, matching crawler behavior on empty paths.
            return Ok(());
        };
        let body = self
            .store
            .get(first)
            .await
            .ok_or_else(|| GatewayError::catalog(format!("object vanished: {first}")))?;
        let (columns, rows) = parse_csv_object(&body)
            .ok_or_else(|| GatewayError::catalog(format!("unparseable object: {first}")))?;

        let table = table_name_from_prefix(&config.target_prefix);
        self.tables.write().await.insert(
            (config.database.clone(), table),
            TableData { columns, rows },
        );
        Ok(())
    }

    async fn run_query(&self, sql: &str) -> Result<QueryResult, GatewayError> {
        if let Some(message) = self.check_injected().await {
            return Err(GatewayError::query(message));
        }

        // Understands exactly the quoted form the schema gate emits:
        // SELECT * FROM "database"."table" LIMIT n
        let quoted: Vec<&str> = sql.split('"').collect();
        let (database, table) = match quoted.as_slice() {
            [_, database, _, table, _] => (database.to_string(), table.to_string()),
            _ => return Err(GatewayError::query(format!("malformed query: {sql}"))),
        };

        let tables = self.tables.read().await;
        let data = tables
            .get(&(database.clone(), table.clone()))
            .ok_or_else(|| {
                GatewayError::query(format!("table not found: {database}.{table}"))
            })?;
        Ok(QueryResult {
            columns: data.columns.clone(),
            rows: data.rows.iter().take(10).cloned().collect(),
        })
    }
}

/// Job runner that simulates the childcare transform: it clears the output
/// prefix and writes a curated CSV with the configured column set, so the
/// downstream crawler and schema gate work against real objects.
pub struct MemoryJobRunner {
    store: Arc<MemoryObjectStore>,
    output_prefix: String,
    output_columns: Vec<String>,
    submitted: Mutex<Vec<JobSpec>>,
    fail_submit: Mutex<Option<String>>,
    fail_run: Mutex<Option<String>>,
}

impl MemoryJobRunner {
    pub fn new(
        store: Arc<MemoryObjectStore>,
        output_prefix: impl Into<String>,
        output_columns: Vec<String>,
    ) -> Self {
        Self {
            store,
            output_prefix: output_prefix.into(),
            output_columns,
            submitted: Mutex::new(Vec::new()),
            fail_submit: Mutex::new(None),
            fail_run: Mutex::new(None),
        }
    }

    /// Make the next submit call fail with a transport error.
    pub async fn inject_submit_failure(&self, message: impl Into<String>) {
        *self.fail_submit.lock().await = Some(message.into());
    }

    /// Make the next job run end in [`JobState::Failed`].
    pub async fn inject_run_failure(&self, reason: impl Into<String>) {
        *self.fail_run.lock().await = Some(reason.into());
    }

    pub async fn submitted_specs(&self) -> Vec<JobSpec> {
        self.submitted.lock().await.clone()
    }
}

#[async_trait]
impl JobRunner for MemoryJobRunner {
    async fn submit(&self, spec: &JobSpec) -> Result<JobHandle, GatewayError> {
        if let Some(message) = self.fail_submit.lock().await.take() {
            return Err(GatewayError::job(message));
        }
        self.submitted.lock().await.push(spec.clone());
        Ok(JobHandle {
            job_name: spec.job_name.clone(),
            run_id: uuid::Uuid::new_v4().to_string(),
        })
    }

    async fn await_completion(&self, handle: &JobHandle) -> Result<JobState, GatewayError> {
        if let Some(reason) = self.fail_run.lock().await.take() {
            return Ok(JobState::Failed { reason });
        }

        let _ = self.store.delete_prefix(&self.output_prefix).await;

        let mut body = self.output_columns.join(",");
        body.push('\n');
        for row in 0..3 {
            let values: Vec<String> = self
                .output_columns
                .iter()
                .map(|c| format!("{}_{row}", c.to_lowercase()))
                .collect();
            body.push_str(&values.join(","));
            body.push('\n');
        }

        let key = format!("{}part-00000.csv", self.output_prefix);
        self.store.put(key, body.into_bytes()).await;

        let _ = handle;
        Ok(JobState::Succeeded)
    }
}
