use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bank_core::csv_codec::read_raw;
use bank_core::object_store::ObjectStore;
use bank_core::schema::{CellValue, Row, TableSchema};
use bank_core::storage_keys::{
    parse_part_index, warehouse_part_key, warehouse_schema_key, warehouse_table_prefix,
};
use bank_core::warehouse::{
    JobOutcome, JoinQuery, LoadJobSpec, QueryJobSpec, TableRef, TableSnapshot, Warehouse,
    WriteDisposition,
};
use bank_core::{SchemaViolation, StoreError, TaskError};
use tokio::sync::Mutex;

use super::columnar::{batch_to_rows, decode_parquet, encode_parquet, rows_to_batch, ColumnarError};

const SCHEMA_CONTENT_TYPE: &str = "application/json";
const PARQUET_CONTENT_TYPE: &str = "application/vnd.apache.parquet";

/// Warehouse whose tables are append-only sequences of parquet parts.
///
/// Source objects are read from `source`; table data lives under
/// `warehouse/<dataset>/<table>/` in `storage`. A table exists once its
/// `_schema.json` object has been written. Commits are serialized so part
/// numbers never collide.
///
/// `source` is bound to one bucket. With [`LocalWarehouse::with_source_bucket`]
/// a load job naming any other bucket is rejected; without it the job's
/// bucket is not checked.
pub struct LocalWarehouse {
    source: Arc<dyn ObjectStore>,
    source_bucket: Option<String>,
    storage: Arc<dyn ObjectStore>,
    commit_lock: Mutex<()>,
}

fn storage_failure(table: &TableRef, error: ColumnarError) -> TaskError {
    TaskError::TransientTransferFailure(format!("table {table} storage error: {error}"))
}

impl LocalWarehouse {
    pub fn new(source: Arc<dyn ObjectStore>, storage: Arc<dyn ObjectStore>) -> Self {
        Self {
            source,
            source_bucket: None,
            storage,
            commit_lock: Mutex::new(()),
        }
    }

    pub fn with_source_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.source_bucket = Some(bucket.into());
        self
    }

    /// Source objects and tables share one store.
    pub fn single_store(store: Arc<dyn ObjectStore>) -> Self {
        Self::new(store.clone(), store)
    }

    async fn table_schema(&self, table: &TableRef) -> Result<Option<TableSchema>, TaskError> {
        let key = warehouse_schema_key(&table.dataset, &table.table);
        match self.storage.get_object(&key).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map(Some).map_err(|error| {
                TaskError::TransientTransferFailure(format!(
                    "table {table} has an unreadable schema: {error}"
                ))
            }),
            Err(StoreError::NotFound { .. }) => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    async fn part_keys(&self, table: &TableRef) -> Result<Vec<(usize, String)>, TaskError> {
        let prefix = warehouse_table_prefix(&table.dataset, &table.table);
        let mut parts: Vec<(usize, String)> = self
            .storage
            .list_objects(&prefix)
            .await?
            .into_iter()
            .filter_map(|key| parse_part_index(&key).map(|index| (index, key)))
            .collect();
        parts.sort();
        Ok(parts)
    }

    async fn commit(
        &self,
        table: &TableRef,
        schema: &TableSchema,
        rows: Vec<Row>,
        disposition: WriteDisposition,
    ) -> Result<JobOutcome, TaskError> {
        let _guard = self.commit_lock.lock().await;

        let existing_schema = self.table_schema(table).await?;
        if disposition == WriteDisposition::Append {
            if let Some(existing) = &existing_schema {
                if existing != schema {
                    return Err(SchemaViolation::HeaderMismatch {
                        object: table.to_string(),
                        expected: existing.fields.iter().map(|f| f.name.clone()).collect(),
                        found: schema.fields.iter().map(|f| f.name.clone()).collect(),
                    }
                    .into());
                }
            }
        }

        let mut parts = self.part_keys(table).await?;
        if disposition == WriteDisposition::Truncate {
            for (_, key) in &parts {
                self.storage.delete_object(key).await?;
            }
            parts.clear();
        }

        if existing_schema.as_ref() != Some(schema) {
            let body = serde_json::to_vec_pretty(schema).map_err(|error| {
                TaskError::TransientTransferFailure(format!(
                    "failed to encode schema for {table}: {error}"
                ))
            })?;
            self.storage
                .put_object(
                    &warehouse_schema_key(&table.dataset, &table.table),
                    &body,
                    SCHEMA_CONTENT_TYPE,
                )
                .await?;
        }

        let rows_written = rows.len();
        if !rows.is_empty() {
            let next_part = parts.last().map(|(index, _)| index + 1).unwrap_or(0);
            let batch = rows_to_batch(schema, &rows).map_err(|e| storage_failure(table, e))?;
            let body = encode_parquet(&batch).map_err(|e| storage_failure(table, e))?;
            self.storage
                .put_object(
                    &warehouse_part_key(&table.dataset, &table.table, next_part),
                    &body,
                    PARQUET_CONTENT_TYPE,
                )
                .await?;
        }

        tracing::info!(
            component = "local_warehouse",
            event = "table_committed",
            table = %table,
            rows = rows_written,
            disposition = ?disposition,
        );

        Ok(JobOutcome {
            destination: table.clone(),
            rows_written,
        })
    }

    async fn parse_source_object(
        &self,
        object: &str,
        job: &LoadJobSpec,
    ) -> Result<Vec<Row>, TaskError> {
        let bytes = self.source.get_object(object).await?;
        let raw = read_raw(&bytes).map_err(|error| SchemaViolation::Malformed {
            object: object.to_string(),
            message: error.to_string(),
        })?;

        // The csv reader consumes the first line as a header; with no leading
        // rows to skip that line is data.
        let mut lines = Vec::with_capacity(raw.records.len() + 1);
        if job.skip_leading_rows == 0 {
            lines.push(raw.header);
        } else {
            job.schema.validate_header(object, &raw.header)?;
        }
        lines.extend(raw.records);

        let skipped = job.skip_leading_rows.saturating_sub(1);
        lines
            .iter()
            .enumerate()
            .skip(skipped)
            .map(|(index, values)| {
                let line_number = index + job.skip_leading_rows.min(1) + 1;
                job.schema
                    .parse_row(object, line_number, values)
                    .map_err(TaskError::from)
            })
            .collect()
    }
}

/// Output rows of an inner equality join, in left-table order.
fn join_rows(
    query: &JoinQuery,
    left: &TableSnapshot,
    right: &TableSnapshot,
) -> Result<(TableSchema, Vec<Row>), TaskError> {
    let column_index = |snapshot: &TableSnapshot, table: &TableRef, column: &str| {
        snapshot.schema.column_index(column).ok_or_else(|| {
            TaskError::InvalidArgument(format!("column {column} does not exist in {table}"))
        })
    };

    let left_key = column_index(left, &query.left, &query.join_key)?;
    let right_key = column_index(right, &query.right, &query.join_key)?;
    let left_projection = query
        .left_columns
        .iter()
        .map(|column| column_index(left, &query.left, column))
        .collect::<Result<Vec<_>, _>>()?;
    let right_projection = query
        .right_columns
        .iter()
        .map(|column| column_index(right, &query.right, column))
        .collect::<Result<Vec<_>, _>>()?;

    let schema = TableSchema::new(
        left_projection
            .iter()
            .map(|&index| left.schema.fields[index].clone())
            .chain(
                right_projection
                    .iter()
                    .map(|&index| right.schema.fields[index].clone()),
            )
            .collect(),
    );

    // NULL keys never compare equal.
    let mut right_by_key: HashMap<&CellValue, Vec<&Row>> = HashMap::new();
    for row in &right.rows {
        let key = &row[right_key];
        if *key != CellValue::Null {
            right_by_key.entry(key).or_default().push(row);
        }
    }

    let mut rows: Vec<Row> = Vec::new();
    for left_row in &left.rows {
        let Some(matches) = right_by_key.get(&left_row[left_key]) else {
            continue;
        };
        for right_row in matches {
            rows.push(
                left_projection
                    .iter()
                    .map(|&index| left_row[index].clone())
                    .chain(right_projection.iter().map(|&index| right_row[index].clone()))
                    .collect(),
            );
        }
    }

    Ok((schema, rows))
}

#[async_trait]
impl Warehouse for LocalWarehouse {
    async fn run_load_job(&self, job: &LoadJobSpec) -> Result<JobOutcome, TaskError> {
        if job.source_objects.is_empty() {
            return Err(TaskError::InvalidArgument(format!(
                "load job for {} lists no source objects",
                job.destination
            )));
        }
        if let Some(bucket) = &self.source_bucket {
            if job.source_bucket != *bucket {
                return Err(TaskError::InvalidArgument(format!(
                    "load job for {} reads bucket '{}' but this warehouse sources from '{bucket}'",
                    job.destination, job.source_bucket
                )));
            }
        }

        // Every object is validated before anything is committed.
        let mut rows = Vec::new();
        for object in &job.source_objects {
            rows.extend(self.parse_source_object(object, job).await?);
        }

        self.commit(&job.destination, &job.schema, rows, job.write_disposition)
            .await
    }

    async fn run_query_job(&self, job: &QueryJobSpec) -> Result<JobOutcome, TaskError> {
        let left = self.read_table(&job.query.left).await?;
        let right = self.read_table(&job.query.right).await?;
        let (schema, rows) = join_rows(&job.query, &left, &right)?;

        for (index, row) in rows.iter().enumerate() {
            schema.check_row(&job.destination.to_string(), index + 1, row)?;
        }

        self.commit(&job.destination, &schema, rows, job.write_disposition)
            .await
    }

    async fn read_table(&self, table: &TableRef) -> Result<TableSnapshot, TaskError> {
        let schema = self
            .table_schema(table)
            .await?
            .ok_or_else(|| TaskError::TableNotFound {
                table: table.to_string(),
            })?;

        let mut rows = Vec::new();
        for (_, key) in self.part_keys(table).await? {
            let bytes = self.storage.get_object(&key).await?;
            for batch in decode_parquet(bytes).map_err(|e| storage_failure(table, e))? {
                rows.extend(batch_to_rows(&schema, &batch).map_err(|e| storage_failure(table, e))?);
            }
        }

        Ok(TableSnapshot { schema, rows })
    }
}
