use std::time::Instant;

use bank_core::csv_codec::{write_table, CONTENT_TYPE};
use bank_core::object_store::ObjectStore;
use bank_core::storage_keys::{entity_object_key, EntityKind};
use bank_core::TableRecord;
use chrono::NaiveDate;

use crate::error::GeneratorError;
use crate::generator::Dataset;

/// Keys and sizes of the two objects written for one run date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedObjects {
    pub customers_key: String,
    pub accounts_key: String,
    pub customers_bytes: usize,
    pub accounts_bytes: usize,
}

async fn publish_table<S, T>(
    store: &S,
    root_prefix: &str,
    entity: EntityKind,
    run_date: NaiveDate,
    rows: &[T],
) -> Result<(String, usize), GeneratorError>
where
    S: ObjectStore + ?Sized,
    T: TableRecord,
{
    let key = entity_object_key(root_prefix, entity, run_date);
    let body = write_table(rows)?;
    let started = Instant::now();
    store.put_object(&key, &body, CONTENT_TYPE).await?;

    tracing::info!(
        component = "publisher",
        event = "object_written",
        entity = ?entity,
        key = %key,
        rows = rows.len(),
        bytes = body.len(),
        duration_ms = started.elapsed().as_millis() as u64,
    );
    Ok((key, body.len()))
}

/// Writes customers first, then accounts. Same-day runs overwrite the same
/// keys; a failed upload leaves any previously published object in place.
pub async fn publish_dataset<S>(
    store: &S,
    root_prefix: &str,
    run_date: NaiveDate,
    dataset: &Dataset,
) -> Result<PublishedObjects, GeneratorError>
where
    S: ObjectStore + ?Sized,
{
    let (customers_key, customers_bytes) = publish_table(
        store,
        root_prefix,
        EntityKind::Customers,
        run_date,
        &dataset.customers,
    )
    .await?;
    let (accounts_key, accounts_bytes) = publish_table(
        store,
        root_prefix,
        EntityKind::Accounts,
        run_date,
        &dataset.accounts,
    )
    .await?;

    Ok(PublishedObjects {
        customers_key,
        accounts_key,
        customers_bytes,
        accounts_bytes,
    })
}
