//! Runtime integration for the banking transfer/load pipeline.
//!
//! This crate owns the pieces that touch the outside world: the S3 object
//! store adapter, the parquet-backed local warehouse, the load and join
//! tasks, the DAG runner with per-task retry and timeout, the cron loop,
//! tracing setup and command-line configuration. Domain types live in
//! `bank_core`; record generation lives in `bank_datagen`.

pub mod adapters;
pub mod config;
pub mod orchestrator;
pub mod scheduler;
pub mod tasks;
pub mod telemetry;
pub mod warehouse;

pub use orchestrator::{PipelineRunner, RunReport, RunState, TaskReport, TaskState};
pub use tasks::{TaskExecutor, WarehouseTaskExecutor};
pub use warehouse::local::LocalWarehouse;
