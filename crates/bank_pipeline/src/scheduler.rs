//! Cron-driven loop that fires the pipeline once per scheduled instant.

use std::sync::Arc;

use bank_core::schedule::CronSchedule;
use bank_core::ValidationError;
use chrono::{DateTime, NaiveDate, Utc};

use crate::orchestrator::{PipelineRunner, RunReport};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Each fire uses its own UTC calendar day as the run date.
pub fn run_date_for(fire_time: DateTime<Utc>) -> NaiveDate {
    fire_time.date_naive()
}

pub struct Scheduler {
    cron: CronSchedule,
    clock: Arc<dyn Clock>,
}

impl Scheduler {
    pub fn new(cron: CronSchedule, clock: Arc<dyn Clock>) -> Self {
        Self { cron, clock }
    }

    pub fn for_runner(runner: &PipelineRunner) -> Result<Self, ValidationError> {
        Ok(Self::new(runner.spec().cron()?, Arc::new(SystemClock)))
    }

    pub fn next_fire(&self) -> Option<DateTime<Utc>> {
        self.cron.next_after(self.clock.now())
    }

    /// Sleeps until each fire time and runs the pipeline, stopping after
    /// `max_runs` fires when set. A failed run does not stop the loop.
    pub async fn run<F>(
        &self,
        runner: &PipelineRunner,
        max_runs: Option<usize>,
        mut on_report: F,
    ) -> Result<usize, ValidationError>
    where
        F: FnMut(&RunReport),
    {
        let mut completed = 0;
        while max_runs.map_or(true, |limit| completed < limit) {
            let now = self.clock.now();
            let Some(fire_time) = self.cron.next_after(now) else {
                tracing::warn!(
                    component = "scheduler",
                    event = "schedule_exhausted",
                    schedule = %self.cron,
                );
                break;
            };

            let wait = (fire_time - now).to_std().unwrap_or_default();
            tracing::info!(
                component = "scheduler",
                event = "waiting_for_fire",
                schedule = %self.cron,
                fire_time = %fire_time.to_rfc3339(),
                wait_secs = wait.as_secs(),
            );
            tokio::time::sleep(wait).await;

            let report = runner.run(run_date_for(fire_time)).await?;
            on_report(&report);
            completed += 1;
        }

        Ok(completed)
    }
}
