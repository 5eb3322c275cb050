use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use bank_core::csv_codec::write_rows;
use bank_core::pipeline::{banking_pipeline_spec, PipelineSpec};
use bank_core::warehouse::{TableRef, Warehouse};
use bank_pipeline::config::{parse_run_date, StoreArgs, WarehouseArgs};
use bank_pipeline::scheduler::Scheduler;
use bank_pipeline::tasks::WarehouseTaskExecutor;
use bank_pipeline::telemetry::init_tracing;
use bank_pipeline::{LocalWarehouse, PipelineRunner, RunReport};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};

/// Load the published banking objects into the warehouse and join them.
#[derive(Debug, Parser)]
#[command(name = "bank_pipeline", version)]
struct Cli {
    /// JSON pipeline definition; the built-in banking pipeline when omitted.
    #[arg(long, env = "BANK_PIPELINE_SPEC", global = true)]
    spec_file: Option<PathBuf>,

    #[arg(long, env = "BANK_LOG_JSON", global = true)]
    log_json: bool,

    #[command(flatten)]
    store: StoreArgs,

    #[command(flatten)]
    warehouse: WarehouseArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run every task once for a single run date.
    RunOnce {
        #[arg(long, env = "BANK_RUN_DATE", value_parser = parse_run_date)]
        run_date: Option<NaiveDate>,
        /// Also write the JSON run report to this file.
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Run on the pipeline's cron schedule until interrupted.
    Schedule {
        #[arg(long)]
        max_runs: Option<usize>,
    },
    /// Print the effective pipeline definition as JSON.
    PrintSpec,
    /// Dump a warehouse table as CSV.
    ExportTable {
        /// `project.dataset.table`
        #[arg(long)]
        table: String,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn load_spec(cli: &Cli) -> anyhow::Result<PipelineSpec> {
    match &cli.spec_file {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            PipelineSpec::from_json(&text)
                .with_context(|| format!("invalid pipeline spec {}", path.display()))
        }
        None => Ok(banking_pipeline_spec(&cli.warehouse.layout()?)),
    }
}

async fn build_warehouse(cli: &Cli) -> anyhow::Result<Arc<LocalWarehouse>> {
    let staging = cli
        .store
        .build_store()
        .await
        .context("invalid store configuration")?;
    let storage = cli.warehouse.storage(&staging);
    Ok(Arc::new(
        LocalWarehouse::new(staging, storage).with_source_bucket(cli.store.staging_location().bucket),
    ))
}

async fn build_runner(cli: &Cli) -> anyhow::Result<PipelineRunner> {
    let spec = load_spec(cli)?;
    let warehouse = build_warehouse(cli).await?;
    let executor = WarehouseTaskExecutor::new(warehouse, cli.store.staging_location());
    Ok(PipelineRunner::new(spec, Arc::new(executor))?)
}

fn write_report(report: &RunReport, path: Option<&PathBuf>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    if let Some(path) = path {
        std::fs::write(path, &json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
    }
    println!("{json}");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json)?;

    match &cli.command {
        Command::RunOnce { run_date, report } => {
            let runner = build_runner(&cli).await?;
            let run_date = run_date.unwrap_or_else(|| Utc::now().date_naive());
            let run_report = runner.run(run_date).await?;
            write_report(&run_report, report.as_ref())?;
            if !run_report.succeeded() {
                anyhow::bail!("pipeline run {} failed", run_report.run_id);
            }
        }
        Command::Schedule { max_runs } => {
            let runner = build_runner(&cli).await?;
            let scheduler = Scheduler::for_runner(&runner)?;
            let schedule = scheduler.run(&runner, *max_runs, |report| {
                if let Err(error) = write_report(report, None) {
                    tracing::error!(
                        component = "bank_pipeline",
                        event = "report_write_failed",
                        error = %error,
                    );
                }
            });
            tokio::select! {
                completed = schedule => {
                    let completed = completed?;
                    tracing::info!(component = "bank_pipeline", event = "schedule_finished", runs = completed);
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!(component = "bank_pipeline", event = "schedule_interrupted");
                }
            }
        }
        Command::PrintSpec => {
            let spec = load_spec(&cli)?;
            spec.validate()?;
            println!("{}", serde_json::to_string_pretty(&spec)?);
        }
        Command::ExportTable { table, output } => {
            let table = TableRef::parse(table)?;
            let warehouse = build_warehouse(&cli).await?;
            let snapshot = warehouse.read_table(&table).await?;
            let columns = snapshot.schema.column_names();
            let body = write_rows(&columns, &snapshot.rows)?;
            match output {
                Some(path) => std::fs::write(path, body)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => {
                    use std::io::Write;
                    std::io::stdout().write_all(&body)?;
                }
            }
            tracing::info!(
                component = "bank_pipeline",
                event = "table_exported",
                table = %table,
                rows = snapshot.rows.len(),
            );
        }
    }

    Ok(())
}
