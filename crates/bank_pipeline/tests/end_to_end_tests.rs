mod support;

use std::collections::HashMap;
use std::sync::Arc;

use bank_core::csv_codec::write_rows;
use bank_core::object_store::{LocalFsObjectStore, ObjectStore};
use bank_core::pipeline::{banking_pipeline_spec, WarehouseLayout};
use bank_core::records::CUST_ACC_COLUMNS;
use bank_core::schema::CellValue;
use bank_core::warehouse::Warehouse;
use bank_datagen::publish_dataset;
use bank_pipeline::{LocalWarehouse, PipelineRunner, WarehouseTaskExecutor};
use support::{run_date, staging};

async fn run_pipeline(store: Arc<dyn ObjectStore>) -> (Arc<LocalWarehouse>, bank_pipeline::RunReport) {
    let warehouse =
        Arc::new(LocalWarehouse::single_store(store).with_source_bucket(staging().bucket));
    let runner = PipelineRunner::new(
        banking_pipeline_spec(&WarehouseLayout::default()),
        Arc::new(WarehouseTaskExecutor::new(warehouse.clone(), staging())),
    )
    .expect("built-in spec is valid");
    let report = runner.run(run_date()).await.expect("run completes");
    (warehouse, report)
}

#[tokio::test]
async fn generated_dataset_flows_into_joined_table() {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let store: Arc<dyn ObjectStore> = Arc::new(LocalFsObjectStore::new(temp_dir.path()));
    let dataset = support::dataset(25);
    publish_dataset(store.as_ref(), &staging().root_prefix, run_date(), &dataset)
        .await
        .expect("publish should succeed");

    let (warehouse, report) = run_pipeline(store.clone()).await;
    assert!(report.succeeded(), "run failed: {report:?}");

    let joined = warehouse
        .read_table(&WarehouseLayout::default().joined())
        .await
        .expect("joined table exists");
    assert_eq!(joined.schema.column_names(), CUST_ACC_COLUMNS.to_vec());
    assert_eq!(joined.rows.len(), 25);

    let customers_by_id: HashMap<&str, _> = dataset
        .customers
        .iter()
        .map(|customer| (customer.customer_id.as_str(), customer))
        .collect();
    for (row, account) in joined.rows.iter().zip(&dataset.accounts) {
        assert_eq!(row[0], CellValue::String(account.account_id.clone()));
        assert_eq!(row[3], CellValue::Date(account.opening_date));
        let customer = customers_by_id[account.customer_id.as_str()];
        assert_eq!(row[6], CellValue::String(customer.name.clone()));
        assert_eq!(row[7], CellValue::Int64(customer.credit_score));
        assert_eq!(row[9], CellValue::Date(customer.date_of_birth));
    }

    let csv = write_rows(&joined.schema.column_names(), &joined.rows).expect("csv export");
    let text = String::from_utf8(csv).expect("utf-8");
    assert_eq!(text.lines().count(), 26);
    assert!(temp_dir
        .path()
        .join("warehouse/Transformed_dataset/cust_acc/part-00000.parquet")
        .exists());
}

#[tokio::test]
async fn rerunning_same_day_appends_raw_loads() {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let store: Arc<dyn ObjectStore> = Arc::new(LocalFsObjectStore::new(temp_dir.path()));
    let dataset = support::dataset(10);
    publish_dataset(store.as_ref(), &staging().root_prefix, run_date(), &dataset)
        .await
        .expect("publish should succeed");

    let (_, first) = run_pipeline(store.clone()).await;
    let (warehouse, second) = run_pipeline(store.clone()).await;
    assert!(first.succeeded() && second.succeeded());

    let layout = WarehouseLayout::default();
    let accounts = warehouse
        .read_table(&layout.accounts())
        .await
        .expect("accounts table exists");
    assert_eq!(accounts.rows.len(), 20);

    // Second join sees every account twice and every customer twice.
    let joined = warehouse
        .read_table(&layout.joined())
        .await
        .expect("joined table exists");
    assert_eq!(joined.rows.len(), 10 + 20 * 2);
}
