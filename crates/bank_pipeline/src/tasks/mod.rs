//! Executes one declarative task against a warehouse.

pub mod join;
pub mod load;

use std::sync::Arc;

use async_trait::async_trait;
use bank_core::pipeline::{TaskAction, TaskSpec};
use bank_core::warehouse::{JobOutcome, Warehouse};
use bank_core::TaskError;
use chrono::NaiveDate;

/// Runs a single attempt of a task. Retries and timeouts belong to the caller.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn execute(&self, task: &TaskSpec, run_date: NaiveDate)
        -> Result<JobOutcome, TaskError>;
}

/// Where the generator published its objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingLocation {
    pub bucket: String,
    pub root_prefix: String,
}

pub struct WarehouseTaskExecutor {
    warehouse: Arc<dyn Warehouse>,
    staging: StagingLocation,
}

impl WarehouseTaskExecutor {
    pub fn new(warehouse: Arc<dyn Warehouse>, staging: StagingLocation) -> Self {
        Self { warehouse, staging }
    }
}

#[async_trait]
impl TaskExecutor for WarehouseTaskExecutor {
    async fn execute(
        &self,
        task: &TaskSpec,
        run_date: NaiveDate,
    ) -> Result<JobOutcome, TaskError> {
        match &task.action {
            TaskAction::LoadObject {
                entity,
                destination,
                write_disposition,
            } => {
                let job = load::build_load_job(
                    &self.staging,
                    *entity,
                    destination,
                    *write_disposition,
                    run_date,
                );
                tracing::debug!(
                    component = "task_executor",
                    event = "load_job_submitted",
                    task_id = %task.task_id,
                    sources = ?job.source_objects,
                    destination = %job.destination,
                );
                self.warehouse.run_load_job(&job).await
            }
            TaskAction::Query {
                query,
                destination,
                write_disposition,
            } => {
                let job = join::build_query_job(query, destination, *write_disposition);
                tracing::debug!(
                    component = "task_executor",
                    event = "query_job_submitted",
                    task_id = %task.task_id,
                    destination = %job.destination,
                    sql = %job.query.to_sql(),
                );
                self.warehouse.run_query_job(&job).await
            }
        }
    }
}
