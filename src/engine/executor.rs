// ABOUTME: Run loop for the task graph engine
// ABOUTME: Drives eligibility by upstream success, retries, timeouts, and cooperative drain

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use indexmap::IndexMap;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, instrument, warn};

use super::context::RunContext;
use super::graph::TaskGraph;
use super::result::{AttemptOutcome, RunAttempt, RunOutcome, RunReport, TaskStatus};
use super::task::{RetryPolicy, TaskAction};

/// Executes a validated [`TaskGraph`]. The engine owns all run state
/// exclusively; tasks only report their outcome back.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    max_concurrent: Option<usize>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap how many eligible tasks may execute simultaneously. Unbounded by
    /// default, beyond the graph's natural fan-out.
    pub fn with_max_concurrent(mut self, cap: usize) -> Self {
        self.max_concurrent = Some(cap.max(1));
        self
    }

    /// Execute the graph to completion or first fatal task. A task becomes
    /// eligible only once every upstream reached success; on a fatal task
    /// the engine cancels everything not yet started and lets in-flight
    /// branches drain to their own terminal outcome before returning.
    #[instrument(skip_all, fields(pipeline = %ctx.pipeline(), run_id = %ctx.run_id()))]
    pub async fn run(&self, graph: &TaskGraph, ctx: RunContext) -> RunReport {
        let run_start = Utc::now();
        let clock = std::time::Instant::now();
        let ctx = Arc::new(ctx);
        let semaphore = self.max_concurrent.map(|cap| Arc::new(Semaphore::new(cap)));

        info!(
            "Starting pipeline run: {} ({} tasks)",
            ctx.pipeline(),
            graph.len()
        );

        let mut statuses: IndexMap<String, TaskStatus> = graph
            .tasks()
            .map(|t| (t.name().to_string(), TaskStatus::Pending))
            .collect();
        let mut indegree: HashMap<String, usize> = graph
            .tasks()
            .map(|t| (t.name().to_string(), graph.in_degree(t.name())))
            .collect();
        let mut ready: VecDeque<String> = indegree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(name, _)| name.clone())
            .collect();

        let mut attempts: Vec<RunAttempt> = Vec::new();
        let mut fatal: Option<Fatal> = None;
        let mut running: JoinSet<TaskRun> = JoinSet::new();

        loop {
            if fatal.is_none() {
                while let Some(name) = ready.pop_front() {
                    let task = graph.task(&name).expect("task registered in graph");
                    statuses.insert(name.clone(), TaskStatus::Running);
                    running.spawn(execute_task(
                        name,
                        task.action(),
                        task.retry().clone(),
                        task.timeout(),
                        semaphore.clone(),
                        Arc::clone(&ctx),
                    ));
                }
            }

            let Some(joined) = running.join_next().await else {
                break;
            };
            let task_run = match joined {
                Ok(task_run) => task_run,
                Err(err) => {
                    error!("Task execution panicked: {err}");
                    if fatal.is_none() {
                        fatal = Some(Fatal {
                            task: "unknown".to_string(),
                            status: TaskStatus::Failed,
                            reason: format!("task panicked: {err}"),
                        });
                        ready.clear();
                    }
                    continue;
                }
            };

            let last_diagnostic = task_run
                .attempts
                .last()
                .and_then(|a| a.diagnostic.clone());
            statuses.insert(task_run.name.clone(), task_run.status);
            attempts.extend(task_run.attempts);

            match task_run.status {
                TaskStatus::Success => {
                    if fatal.is_none() {
                        for downstream in graph.downstreams(&task_run.name) {
                            let degree = indegree
                                .get_mut(downstream)
                                .expect("downstream registered in graph");
                            *degree -= 1;
                            if *degree == 0 {
                                ready.push_back(downstream.to_string());
                            }
                        }
                    }
                }
                TaskStatus::Failed | TaskStatus::Timeout => {
                    // First fatal task wins; later failures on draining
                    // branches keep their status but don't change the outcome.
                    if fatal.is_none() {
                        warn!(
                            "Task '{}' is fatal - cancelling tasks not yet started, draining running branches",
                            task_run.name
                        );
                        fatal = Some(Fatal {
                            task: task_run.name.clone(),
                            status: task_run.status,
                            reason: last_diagnostic
                                .unwrap_or_else(|| "task failed".to_string()),
                        });
                        ready.clear();
                    }
                }
                _ => {}
            }
        }

        for status in statuses.values_mut() {
            if *status == TaskStatus::Pending {
                *status = TaskStatus::Cancelled;
            }
        }

        let outcome = match fatal {
            None => RunOutcome::Success,
            Some(Fatal {
                task,
                status: TaskStatus::Timeout,
                ..
            }) => RunOutcome::TimedOut { task },
            Some(Fatal { task, reason, .. }) => RunOutcome::Failed { task, reason },
        };

        info!("Pipeline run finished: {outcome}");

        RunReport {
            pipeline: ctx.pipeline().to_string(),
            run_id: ctx.run_id().to_string(),
            start_time: run_start,
            end_time: Utc::now(),
            duration: clock.elapsed(),
            outcome,
            statuses,
            attempts,
        }
    }
}

struct Fatal {
    task: String,
    status: TaskStatus,
    reason: String,
}

struct TaskRun {
    name: String,
    status: TaskStatus,
    attempts: Vec<RunAttempt>,
}

async fn execute_task(
    name: String,
    action: Arc<dyn TaskAction>,
    retry: RetryPolicy,
    task_timeout: Duration,
    semaphore: Option<Arc<Semaphore>>,
    ctx: Arc<RunContext>,
) -> TaskRun {
    let _permit = match semaphore {
        Some(sem) => Some(sem.acquire_owned().await.expect("semaphore closed")),
        None => None,
    };

    let max_attempts = retry.max_retries + 1;
    let mut attempts = Vec::new();
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let start_time = Utc::now();
        debug!("Executing task {} (attempt {}/{})", name, attempt, max_attempts);

        match timeout(task_timeout, action.run(&ctx)).await {
            Ok(Ok(diagnostic)) => {
                attempts.push(RunAttempt {
                    task: name.clone(),
                    attempt,
                    start_time,
                    end_time: Utc::now(),
                    outcome: AttemptOutcome::Success,
                    diagnostic,
                });
                info!("Task {} succeeded on attempt {}", name, attempt);
                return TaskRun {
                    name,
                    status: TaskStatus::Success,
                    attempts,
                };
            }
            Ok(Err(err)) => {
                let reason = err.to_string();
                attempts.push(RunAttempt {
                    task: name.clone(),
                    attempt,
                    start_time,
                    end_time: Utc::now(),
                    outcome: AttemptOutcome::Failure,
                    diagnostic: Some(reason.clone()),
                });

                if attempt >= max_attempts {
                    error!("Task {} failed after {} attempts: {}", name, attempt, reason);
                    return TaskRun {
                        name,
                        status: TaskStatus::Failed,
                        attempts,
                    };
                }

                let delay = retry.delay_before(attempt + 1);
                warn!(
                    "Task {} failed on attempt {}: {} - retrying in {:?}",
                    name, attempt, reason, delay
                );
                sleep(delay).await;
            }
            Err(_) => {
                // Timeout is immediately fatal for the task; the retry
                // budget applies to failures only.
                attempts.push(RunAttempt {
                    task: name.clone(),
                    attempt,
                    start_time,
                    end_time: Utc::now(),
                    outcome: AttemptOutcome::Timeout,
                    diagnostic: Some(format!("exceeded timeout of {task_timeout:?}")),
                });
                error!("Task {} timed out after {:?}", name, task_timeout);
                return TaskRun {
                    name,
                    status: TaskStatus::Timeout,
                    attempts,
                };
            }
        }
    }
}
