//! Declarative definition of the transfer/load pipeline.
//!
//! The task graph, per-task retry/timeout policy and the cron schedule are
//! plain data so any scheduler can consume them; `bank_pipeline` ships the
//! in-process runner.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ValidationError;
use crate::schedule::CronSchedule;
use crate::storage_keys::EntityKind;
use crate::warehouse::{banking_join_query, JoinQuery, TableRef, WriteDisposition};

pub const PIPELINE_SPEC_SCHEMA_VERSION: &str = "v1";
pub const DEFAULT_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 60;
pub const DEFAULT_EXECUTION_TIMEOUT_SECS: u64 = 600;

/// Fixed-delay retry: no backoff growth, no jitter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub retry_delay_secs: u64,
    pub execution_timeout_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            retry_delay_secs: DEFAULT_RETRY_DELAY_SECS,
            execution_timeout_secs: DEFAULT_EXECUTION_TIMEOUT_SECS,
        }
    }
}

impl RetryPolicy {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn execution_timeout(&self) -> Duration {
        Duration::from_secs(self.execution_timeout_secs)
    }

    /// Total attempts including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskAction {
    LoadObject {
        entity: EntityKind,
        destination: TableRef,
        #[serde(default)]
        write_disposition: WriteDisposition,
    },
    Query {
        query: JoinQuery,
        destination: TableRef,
        #[serde(default)]
        write_disposition: WriteDisposition,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskSpec {
    pub task_id: String,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryPolicy>,
    pub action: TaskAction,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineSpec {
    pub pipeline_id: String,
    #[serde(default)]
    pub description: String,
    pub schedule: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub default_retry: RetryPolicy,
    pub tasks: Vec<TaskSpec>,
}

impl PipelineSpec {
    pub fn from_json(text: &str) -> Result<Self, ValidationError> {
        let spec: Self = serde_json::from_str(text)
            .map_err(|error| ValidationError::new(format!("Malformed pipeline spec: {error}")))?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.pipeline_id.trim().is_empty() {
            return Err(ValidationError::new("pipeline_id cannot be empty"));
        }

        self.cron()?;

        if self.tasks.is_empty() {
            return Err(ValidationError::new("pipeline must declare at least one task"));
        }

        let mut seen = BTreeSet::new();
        for task in &self.tasks {
            if task.task_id.trim().is_empty() {
                return Err(ValidationError::new("task_id cannot be empty"));
            }
            if !seen.insert(task.task_id.as_str()) {
                return Err(ValidationError::new(format!(
                    "duplicate task_id '{}'",
                    task.task_id
                )));
            }
            let policy = self.retry_policy_for(task);
            if policy.execution_timeout_secs == 0 {
                return Err(ValidationError::new(format!(
                    "task '{}' execution_timeout_secs must be positive",
                    task.task_id
                )));
            }
        }

        for task in &self.tasks {
            for dependency in &task.depends_on {
                if dependency == &task.task_id {
                    return Err(ValidationError::new(format!(
                        "task '{}' cannot depend on itself",
                        task.task_id
                    )));
                }
                if !seen.contains(dependency.as_str()) {
                    return Err(ValidationError::new(format!(
                        "task '{}' depends on unknown task '{dependency}'",
                        task.task_id
                    )));
                }
            }
        }

        self.execution_layers().map(|_| ())
    }

    pub fn cron(&self) -> Result<CronSchedule, ValidationError> {
        CronSchedule::parse(&self.schedule)
    }

    pub fn task(&self, task_id: &str) -> Option<&TaskSpec> {
        self.tasks.iter().find(|task| task.task_id == task_id)
    }

    pub fn retry_policy_for(&self, task: &TaskSpec) -> RetryPolicy {
        task.retry.unwrap_or(self.default_retry)
    }

    /// Topological layers; tasks within a layer have no dependency on each
    /// other and keep declaration order.
    pub fn execution_layers(&self) -> Result<Vec<Vec<&TaskSpec>>, ValidationError> {
        let mut remaining: BTreeMap<&str, usize> = self
            .tasks
            .iter()
            .map(|task| (task.task_id.as_str(), task.depends_on.len()))
            .collect();
        let mut done: BTreeSet<&str> = BTreeSet::new();
        let mut layers = Vec::new();

        while done.len() < self.tasks.len() {
            let layer: Vec<&TaskSpec> = self
                .tasks
                .iter()
                .filter(|task| !done.contains(task.task_id.as_str()))
                .filter(|task| remaining.get(task.task_id.as_str()) == Some(&0))
                .collect();

            if layer.is_empty() {
                return Err(ValidationError::new(
                    "pipeline task graph contains a dependency cycle",
                ));
            }

            for task in &layer {
                done.insert(task.task_id.as_str());
            }
            for task in &self.tasks {
                if done.contains(task.task_id.as_str()) {
                    continue;
                }
                let unmet = task
                    .depends_on
                    .iter()
                    .filter(|dependency| !done.contains(dependency.as_str()))
                    .count();
                remaining.insert(task.task_id.as_str(), unmet);
            }
            layers.push(layer);
        }

        Ok(layers)
    }

    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(
            serde_json::to_string(self).expect("serialization of pipeline spec should not fail"),
        );
        format!("{:x}", hasher.finalize())
    }
}

/// Warehouse naming for the raw and transformed zones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WarehouseLayout {
    pub project: String,
    pub raw_dataset: String,
    pub transformed_dataset: String,
    pub accounts_table: String,
    pub customers_table: String,
    pub joined_table: String,
}

impl Default for WarehouseLayout {
    fn default() -> Self {
        Self {
            project: "bank-data".to_string(),
            raw_dataset: "Raw_Dataset".to_string(),
            transformed_dataset: "Transformed_dataset".to_string(),
            accounts_table: "accounts".to_string(),
            customers_table: "customer".to_string(),
            joined_table: "cust_acc".to_string(),
        }
    }
}

impl WarehouseLayout {
    pub fn accounts(&self) -> TableRef {
        TableRef::new(&self.project, &self.raw_dataset, &self.accounts_table)
    }

    pub fn customers(&self) -> TableRef {
        TableRef::new(&self.project, &self.raw_dataset, &self.customers_table)
    }

    pub fn joined(&self) -> TableRef {
        TableRef::new(&self.project, &self.transformed_dataset, &self.joined_table)
    }
}

pub const LOAD_ACCOUNTS_TASK: &str = "load_accounts_csv";
pub const LOAD_CUSTOMERS_TASK: &str = "load_customer_csv";
pub const JOIN_TASK: &str = "insert_query_job";

/// Two parallel raw-zone loads gated into one join, daily at 05:00.
pub fn banking_pipeline_spec(layout: &WarehouseLayout) -> PipelineSpec {
    PipelineSpec {
        pipeline_id: "gcs_to_bigquery_pipeline".to_string(),
        description: "Load banking csv snapshots into the warehouse and join them".to_string(),
        schedule: "0 5 * * *".to_string(),
        tags: vec![
            "object-store".to_string(),
            "warehouse".to_string(),
            "banking".to_string(),
        ],
        default_retry: RetryPolicy::default(),
        tasks: vec![
            TaskSpec {
                task_id: LOAD_ACCOUNTS_TASK.to_string(),
                depends_on: Vec::new(),
                retry: None,
                action: TaskAction::LoadObject {
                    entity: EntityKind::Accounts,
                    destination: layout.accounts(),
                    write_disposition: WriteDisposition::Append,
                },
            },
            TaskSpec {
                task_id: LOAD_CUSTOMERS_TASK.to_string(),
                depends_on: Vec::new(),
                retry: None,
                action: TaskAction::LoadObject {
                    entity: EntityKind::Customers,
                    destination: layout.customers(),
                    write_disposition: WriteDisposition::Append,
                },
            },
            TaskSpec {
                task_id: JOIN_TASK.to_string(),
                depends_on: vec![LOAD_ACCOUNTS_TASK.to_string(), LOAD_CUSTOMERS_TASK.to_string()],
                retry: None,
                action: TaskAction::Query {
                    query: banking_join_query(layout.accounts(), layout.customers()),
                    destination: layout.joined(),
                    write_disposition: WriteDisposition::Append,
                },
            },
        ],
    }
}
