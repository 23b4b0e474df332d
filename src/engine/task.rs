// ABOUTME: Task identity, the action seam, and per-task retry policy
// ABOUTME: Tasks are immutable once registered into a graph

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::context::RunContext;
use super::error::TaskError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Outcome of a single action invocation: success with an optional
/// diagnostic payload, or a failure that consumes retry budget.
pub type ActionResult = Result<Option<String>, TaskError>;

/// The unit of orchestrated work. Implementations must be safe to invoke
/// again on retry; the engine treats each invocation as a blocking unit.
#[async_trait]
pub trait TaskAction: Send + Sync {
    async fn run(&self, ctx: &RunContext) -> ActionResult;
}

/// A named task with its action, retry budget, and timeout.
#[derive(Clone)]
pub struct Task {
    name: String,
    action: Arc<dyn TaskAction>,
    retry: RetryPolicy,
    timeout: Duration,
}

impl Task {
    pub fn new(name: impl Into<String>, action: Arc<dyn TaskAction>) -> Self {
        Self {
            name: name.into(),
            action,
            retry: RetryPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// A synchronization point that always succeeds instantly. Used for the
    /// `begin` and `end` tasks of a pipeline.
    pub fn no_op(name: impl Into<String>) -> Self {
        Self::from_fn(name, || async { Ok(None) })
    }

    /// Build a task from an async closure. Mostly useful in tests.
    pub fn from_fn<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ActionResult> + Send + 'static,
    {
        Self::new(name, Arc::new(FnAction(f)))
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn action(&self) -> Arc<dyn TaskAction> {
        Arc::clone(&self.action)
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("retry", &self.retry)
            .field("timeout", &self.timeout)
            .finish()
    }
}

struct FnAction<F>(F);

#[async_trait]
impl<F, Fut> TaskAction for FnAction<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = ActionResult> + Send,
{
    async fn run(&self, _ctx: &RunContext) -> ActionResult {
        (self.0)().await
    }
}

/// Per-task retry policy. A budget of N means at most N+1 attempts; the
/// budget applies to failures only, never to timeouts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            initial_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Delay to wait before the given attempt number (attempts start at 1,
    /// so the first delay is the one before attempt 2).
    pub fn delay_before(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(2);
        let millis = (self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi(exponent as i32)) as u64;
        Duration::from_millis(millis)
    }
}
