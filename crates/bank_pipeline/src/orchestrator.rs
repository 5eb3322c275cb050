//! In-process DAG runner.
//!
//! Tasks run layer by layer; tasks sharing a layer run concurrently. Each
//! attempt is bounded by the task's execution timeout and retryable failures
//! are reattempted after a fixed delay. A task whose upstream did not succeed
//! is never started.
//!
//! A timeout drops the attempt's future but cannot stop blocking work it has
//! already handed off (for example a `LocalFsObjectStore` write running on
//! `spawn_blocking`). A timed-out load may therefore still commit its part
//! after the retry has committed one, leaving the same rows twice. Delivery
//! is at-least-once.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use bank_core::pipeline::{PipelineSpec, TaskSpec};
use bank_core::{TaskError, ValidationError};
use chrono::{DateTime, NaiveDate, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::tasks::TaskExecutor;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Succeeded,
    Failed,
    /// Not started because a dependency did not succeed.
    UpstreamFailed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskFailure {
    pub code: String,
    pub message: String,
}

impl From<&TaskError> for TaskFailure {
    fn from(error: &TaskError) -> Self {
        Self {
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskReport {
    pub task_id: String,
    pub state: TaskState,
    pub attempts: u32,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_written: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TaskFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: String,
    pub pipeline_id: String,
    pub run_date: NaiveDate,
    pub spec_fingerprint: String,
    pub state: RunState,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// In declaration order.
    pub tasks: Vec<TaskReport>,
}

impl RunReport {
    pub fn task(&self, task_id: &str) -> Option<&TaskReport> {
        self.tasks.iter().find(|task| task.task_id == task_id)
    }

    pub fn succeeded(&self) -> bool {
        self.state == RunState::Succeeded
    }
}

pub fn run_id(pipeline_id: &str, run_date: NaiveDate) -> String {
    format!("{pipeline_id}__{}", run_date.format("%Y-%m-%d"))
}

pub struct PipelineRunner {
    spec: PipelineSpec,
    executor: Arc<dyn TaskExecutor>,
}

impl PipelineRunner {
    /// Rejects specs that fail validation so `run` can rely on a sound graph.
    pub fn new(spec: PipelineSpec, executor: Arc<dyn TaskExecutor>) -> Result<Self, ValidationError> {
        spec.validate()?;
        Ok(Self { spec, executor })
    }

    pub fn spec(&self) -> &PipelineSpec {
        &self.spec
    }

    pub async fn run(&self, run_date: NaiveDate) -> Result<RunReport, ValidationError> {
        let run_id = run_id(&self.spec.pipeline_id, run_date);
        let started_at = Utc::now();
        let layers = self.spec.execution_layers()?;

        tracing::info!(
            component = "pipeline_runner",
            event = "run_started",
            run_id = %run_id,
            pipeline_id = %self.spec.pipeline_id,
            run_date = %run_date,
            layers = layers.len(),
        );

        let mut reports: HashMap<String, TaskReport> = HashMap::new();
        for layer in layers {
            let mut runnable = Vec::new();
            for task in layer {
                let unmet: Vec<String> = task
                    .depends_on
                    .iter()
                    .filter(|dependency| {
                        reports.get(dependency.as_str()).map(|report| report.state)
                            != Some(TaskState::Succeeded)
                    })
                    .cloned()
                    .collect();

                if unmet.is_empty() {
                    runnable.push(task);
                } else {
                    let error = TaskError::DependencyNotMet {
                        task_id: task.task_id.clone(),
                        unmet,
                    };
                    tracing::warn!(
                        component = "pipeline_runner",
                        event = "task_skipped",
                        run_id = %run_id,
                        task_id = %task.task_id,
                        error = %error,
                    );
                    reports.insert(
                        task.task_id.clone(),
                        TaskReport {
                            task_id: task.task_id.clone(),
                            state: TaskState::UpstreamFailed,
                            attempts: 0,
                            duration_ms: 0,
                            rows_written: None,
                            error: Some(TaskFailure::from(&error)),
                        },
                    );
                }
            }

            let finished = join_all(
                runnable
                    .into_iter()
                    .map(|task| self.run_task(&run_id, task, run_date)),
            )
            .await;
            for report in finished {
                reports.insert(report.task_id.clone(), report);
            }
        }

        let tasks: Vec<TaskReport> = self
            .spec
            .tasks
            .iter()
            .filter_map(|task| reports.remove(&task.task_id))
            .collect();
        let state = if tasks.iter().all(|task| task.state == TaskState::Succeeded) {
            RunState::Succeeded
        } else {
            RunState::Failed
        };
        let finished_at = Utc::now();

        if state == RunState::Succeeded {
            tracing::info!(
                component = "pipeline_runner",
                event = "run_succeeded",
                run_id = %run_id,
                duration_ms = (finished_at - started_at).num_milliseconds(),
            );
        } else {
            tracing::error!(
                component = "pipeline_runner",
                event = "run_failed",
                run_id = %run_id,
                failed_tasks = ?tasks
                    .iter()
                    .filter(|task| task.state != TaskState::Succeeded)
                    .map(|task| task.task_id.as_str())
                    .collect::<Vec<_>>(),
            );
        }

        Ok(RunReport {
            run_id,
            pipeline_id: self.spec.pipeline_id.clone(),
            run_date,
            spec_fingerprint: self.spec.fingerprint(),
            state,
            started_at,
            finished_at,
            tasks,
        })
    }

    async fn run_task(&self, run_id: &str, task: &TaskSpec, run_date: NaiveDate) -> TaskReport {
        let policy = self.spec.retry_policy_for(task);
        let started = Instant::now();
        let mut attempts = 0;

        loop {
            attempts += 1;
            tracing::info!(
                component = "pipeline_runner",
                event = "task_attempt_started",
                run_id = %run_id,
                task_id = %task.task_id,
                attempt = attempts,
                max_attempts = policy.max_attempts(),
            );

            let result = match tokio::time::timeout(
                policy.execution_timeout(),
                self.executor.execute(task, run_date),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(TaskError::TimedOut {
                    task_id: task.task_id.clone(),
                    timeout_secs: policy.execution_timeout_secs,
                }),
            };

            match result {
                Ok(outcome) => {
                    tracing::info!(
                        component = "pipeline_runner",
                        event = "task_succeeded",
                        run_id = %run_id,
                        task_id = %task.task_id,
                        attempt = attempts,
                        destination = %outcome.destination,
                        rows_written = outcome.rows_written,
                    );
                    return TaskReport {
                        task_id: task.task_id.clone(),
                        state: TaskState::Succeeded,
                        attempts,
                        duration_ms: started.elapsed().as_millis() as u64,
                        rows_written: Some(outcome.rows_written),
                        error: None,
                    };
                }
                Err(error) if error.is_retryable() && attempts < policy.max_attempts() => {
                    tracing::warn!(
                        component = "pipeline_runner",
                        event = "task_attempt_failed",
                        run_id = %run_id,
                        task_id = %task.task_id,
                        attempt = attempts,
                        code = error.code(),
                        error = %error,
                        retry_in_secs = policy.retry_delay_secs,
                    );
                    tokio::time::sleep(policy.retry_delay()).await;
                }
                Err(error) => {
                    tracing::error!(
                        component = "pipeline_runner",
                        event = "task_failed",
                        run_id = %run_id,
                        task_id = %task.task_id,
                        attempts,
                        code = error.code(),
                        error = %error,
                    );
                    return TaskReport {
                        task_id: task.task_id.clone(),
                        state: TaskState::Failed,
                        attempts,
                        duration_ms: started.elapsed().as_millis() as u64,
                        rows_written: None,
                        error: Some(TaskFailure::from(&error)),
                    };
                }
            }
        }
    }
}
