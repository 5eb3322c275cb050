use bank_core::schema::{account_schema, customer_schema, TableSchema};
use bank_core::storage_keys::{entity_object_key, EntityKind};
use bank_core::warehouse::{LoadJobSpec, TableRef, WriteDisposition};
use chrono::NaiveDate;

use super::StagingLocation;

pub fn entity_schema(entity: EntityKind) -> TableSchema {
    match entity {
        EntityKind::Accounts => account_schema(),
        EntityKind::Customers => customer_schema(),
    }
}

/// Load job for the object published on `run_date`; the header row is skipped.
pub fn build_load_job(
    staging: &StagingLocation,
    entity: EntityKind,
    destination: &TableRef,
    write_disposition: WriteDisposition,
    run_date: NaiveDate,
) -> LoadJobSpec {
    LoadJobSpec {
        source_bucket: staging.bucket.clone(),
        source_objects: vec![entity_object_key(&staging.root_prefix, entity, run_date)],
        destination: destination.clone(),
        schema: entity_schema(entity),
        write_disposition,
        skip_leading_rows: 1,
    }
}

#[cfg(test)]
mod tests {
    use bank_core::schema::ColumnType;

    use super::*;

    #[test]
    fn accounts_job_reads_date_stamped_object() {
        let staging = StagingLocation {
            bucket: "bank-staging".to_string(),
            root_prefix: "bank_data".to_string(),
        };
        let destination = TableRef::new("bank-data", "Raw_Dataset", "accounts");
        let job = build_load_job(
            &staging,
            EntityKind::Accounts,
            &destination,
            WriteDisposition::Append,
            NaiveDate::from_ymd_opt(2026, 2, 14).expect("valid date"),
        );

        assert_eq!(
            job.source_objects,
            vec!["bank_data/accounts_data/2026-02-14/accounts.csv"]
        );
        assert_eq!(job.source_bucket, "bank-staging");
        assert_eq!(job.skip_leading_rows, 1);
        let types: Vec<ColumnType> = job.schema.fields.iter().map(|f| f.column_type).collect();
        assert_eq!(
            types,
            vec![
                ColumnType::String,
                ColumnType::String,
                ColumnType::String,
                ColumnType::Date,
                ColumnType::String,
                ColumnType::String,
            ]
        );
    }

    #[test]
    fn customers_schema_has_nine_columns_with_integer_score() {
        let schema = entity_schema(EntityKind::Customers);
        assert_eq!(schema.len(), 9);
        assert_eq!(
            schema.field("Credit_Score").map(|f| f.column_type),
            Some(ColumnType::Int64)
        );
    }
}
