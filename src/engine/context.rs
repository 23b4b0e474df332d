// ABOUTME: Run context passed to every task action
// ABOUTME: Carries run identity and resolved parameters, nothing mutable

use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// Immutable context for one pipeline invocation. Created fresh per run;
/// tasks can read it but the engine owns all run state exclusively.
#[derive(Debug, Clone)]
pub struct RunContext {
    pipeline: String,
    run_id: String,
    started_at: DateTime<Utc>,
    params: HashMap<String, String>,
}

impl RunContext {
    pub fn new(pipeline: impl Into<String>) -> Self {
        Self {
            pipeline: pipeline.into(),
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            params: HashMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn pipeline(&self) -> &str {
        &self.pipeline
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}
