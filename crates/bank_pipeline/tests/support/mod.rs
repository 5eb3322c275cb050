#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bank_core::object_store::InMemoryObjectStore;
use bank_core::pipeline::{TaskAction, TaskSpec};
use bank_core::warehouse::JobOutcome;
use bank_core::TaskError;
use bank_datagen::{generate_dataset, publish_dataset, AccountsPerCustomer, Dataset, GeneratorContext, RecordCount};
use bank_pipeline::tasks::{StagingLocation, TaskExecutor};
use chrono::NaiveDate;

pub fn run_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, 14).expect("valid date")
}

pub fn staging() -> StagingLocation {
    StagingLocation {
        bucket: "bank-staging".to_string(),
        root_prefix: "bank_data".to_string(),
    }
}

pub fn dataset(count: usize) -> Dataset {
    generate_dataset(
        &GeneratorContext::new(3, run_date()),
        RecordCount::new(count),
        AccountsPerCustomer::One,
    )
    .expect("generation should succeed")
}

pub async fn published_store(count: usize) -> (Arc<InMemoryObjectStore>, Dataset) {
    let store = Arc::new(InMemoryObjectStore::new());
    let dataset = dataset(count);
    publish_dataset(store.as_ref(), &staging().root_prefix, run_date(), &dataset)
        .await
        .expect("publish should succeed");
    (store, dataset)
}

#[derive(Debug, Clone)]
pub enum Step {
    Succeed(usize),
    Fail(TaskError),
    /// Sleeps for the given duration before succeeding.
    SlowSucceed(Duration),
    Hang,
    /// Spawns side work that outlives the attempt, then hangs.
    DetachedWorkThenHang(Duration),
}

/// Replays a per-task script of outcomes and records every attempt.
#[derive(Default)]
pub struct ScriptedExecutor {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    attempts: Mutex<Vec<String>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: AtomicUsize,
    detached_completed: Arc<AtomicUsize>,
}

struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, task_id: &str, steps: Vec<Step>) -> Self {
        self.scripts
            .lock()
            .expect("script lock")
            .insert(task_id.to_string(), steps.into());
        self
    }

    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().expect("attempt lock").clone()
    }

    pub fn attempts_for(&self, task_id: &str) -> usize {
        self.attempts().iter().filter(|id| *id == task_id).count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn detached_completed(&self) -> usize {
        self.detached_completed.load(Ordering::SeqCst)
    }
}

fn destination(task: &TaskSpec) -> bank_core::warehouse::TableRef {
    match &task.action {
        TaskAction::LoadObject { destination, .. } | TaskAction::Query { destination, .. } => {
            destination.clone()
        }
    }
}

#[async_trait]
impl TaskExecutor for ScriptedExecutor {
    async fn execute(
        &self,
        task: &TaskSpec,
        _run_date: NaiveDate,
    ) -> Result<JobOutcome, TaskError> {
        self.attempts
            .lock()
            .expect("attempt lock")
            .push(task.task_id.clone());
        let step = self
            .scripts
            .lock()
            .expect("script lock")
            .get_mut(&task.task_id)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Step::Succeed(0));

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlight(self.in_flight.clone());

        // Yield so sibling tasks in the same layer can overlap.
        tokio::time::sleep(Duration::from_millis(10)).await;

        match step {
            Step::Succeed(rows_written) => Ok(JobOutcome {
                destination: destination(task),
                rows_written,
            }),
            Step::Fail(error) => Err(error),
            Step::SlowSucceed(duration) => {
                tokio::time::sleep(duration).await;
                Ok(JobOutcome {
                    destination: destination(task),
                    rows_written: 0,
                })
            }
            Step::Hang => std::future::pending().await,
            Step::DetachedWorkThenHang(delay) => {
                let completed = self.detached_completed.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    completed.fetch_add(1, Ordering::SeqCst);
                });
                std::future::pending().await
            }
        }
    }
}
