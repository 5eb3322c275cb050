use std::sync::Arc;

use anyhow::Context;
use bank_core::object_store::{InMemoryObjectStore, ObjectStore};
use bank_datagen::{
    generate_dataset, publish_dataset, AccountsPerCustomer, GeneratorContext, RecordCount,
};
use bank_pipeline::config::{parse_run_date, StoreArgs};
use bank_pipeline::telemetry::init_tracing;
use chrono::{NaiveDate, Utc};
use clap::Parser;

/// Generate synthetic customers and accounts and publish them as CSV.
#[derive(Debug, Parser)]
#[command(name = "generate_bank_data", version)]
struct Cli {
    /// Number of customers; one account is generated per customer by default.
    #[arg(long, env = "BANK_CUSTOMER_COUNT", default_value = "50", allow_hyphen_values = true)]
    count: String,

    /// Random seed; a clock-derived seed is used and logged when omitted.
    #[arg(long, env = "BANK_SEED")]
    seed: Option<u64>,

    /// Calendar date stamped into object keys; defaults to today (UTC).
    #[arg(long, env = "BANK_RUN_DATE", value_parser = parse_run_date)]
    run_date: Option<NaiveDate>,

    /// Draw between --min-accounts and --max-accounts accounts per customer.
    #[arg(long, requires = "max_accounts")]
    min_accounts: Option<usize>,

    #[arg(long, requires = "min_accounts")]
    max_accounts: Option<usize>,

    /// Generate and serialize without writing to the configured store.
    #[arg(long)]
    dry_run: bool,

    #[arg(long, env = "BANK_LOG_JSON")]
    log_json: bool,

    #[command(flatten)]
    store: StoreArgs,
}

impl Cli {
    fn policy(&self) -> AccountsPerCustomer {
        match (self.min_accounts, self.max_accounts) {
            (Some(min), Some(max)) => AccountsPerCustomer::Between { min, max },
            _ => AccountsPerCustomer::One,
        }
    }
}

fn clock_seed() -> u64 {
    let now = Utc::now();
    (now.timestamp() as u64).wrapping_mul(1_000_000_000) ^ u64::from(now.timestamp_subsec_nanos())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json)?;

    let count: RecordCount = cli.count.parse().context("invalid --count")?;
    let run_date = cli.run_date.unwrap_or_else(|| Utc::now().date_naive());
    let seed = cli.seed.unwrap_or_else(clock_seed);
    let ctx = GeneratorContext::new(seed, run_date);

    let dataset = generate_dataset(&ctx, count, cli.policy()).context("generation failed")?;

    let store: Arc<dyn ObjectStore> = if cli.dry_run {
        Arc::new(InMemoryObjectStore::new())
    } else {
        cli.store
            .build_store()
            .await
            .context("invalid store configuration")?
    };

    let published = publish_dataset(store.as_ref(), &cli.store.root_prefix, run_date, &dataset)
        .await
        .context("failed to publish dataset")?;

    tracing::info!(
        component = "generate_bank_data",
        event = "run_completed",
        seed,
        run_date = %run_date,
        dry_run = cli.dry_run,
        bucket = %cli.store.bucket,
        customers_key = %published.customers_key,
        accounts_key = %published.accounts_key,
        customers_bytes = published.customers_bytes,
        accounts_bytes = published.accounts_bytes,
    );
    Ok(())
}
